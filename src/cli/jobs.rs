use comfy_table::{Cell, Color, Table};

use crate::db::get_connection;
use crate::error::Result;
use crate::models::ImportJob;
use crate::settings::get_data_dir;

pub fn run(limit: i64) -> Result<()> {
    let conn = get_connection(&get_data_dir().join("lohnkosten.db"))?;
    let mut stmt = conn.prepare(
        "SELECT id, source_type, period, original_filename, status, error_message, currency, created_at
         FROM imports ORDER BY id DESC LIMIT ?1",
    )?;
    let jobs: Vec<ImportJob> = stmt
        .query_map([limit], |r| {
            Ok(ImportJob {
                id: r.get(0)?,
                source_type: r.get(1)?,
                period: r.get(2)?,
                original_filename: r.get(3)?,
                status: r.get(4)?,
                error_message: r.get(5)?,
                currency: r.get(6)?,
                created_at: r.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Period", "Format", "File", "Status", "Imported at"]);
    for job in jobs {
        let status_color = match job.status.as_str() {
            "ok" => Color::Green,
            "error" => Color::Red,
            _ => Color::Yellow,
        };
        let status = match &job.error_message {
            Some(msg) => format!("{} ({msg})", job.status),
            None => job.status.clone(),
        };
        table.add_row(vec![
            Cell::new(job.id),
            Cell::new(job.period),
            Cell::new(job.source_type),
            Cell::new(job.original_filename),
            Cell::new(status).fg(status_color),
            Cell::new(job.created_at),
        ]);
    }
    println!("Import jobs\n{table}");
    Ok(())
}
