use std::path::PathBuf;

use colored::Colorize;

use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::euro;
use crate::importer::Importer;
use crate::settings::get_data_dir;

pub fn run(file: &str, format: Option<&str>) -> Result<()> {
    let file_path = PathBuf::from(file);
    let data_dir = get_data_dir();
    let mut conn = get_connection(&data_dir.join("lohnkosten.db"))?;

    let original_filename = file_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file)
        .to_string();

    let importer = Importer::with_default_formats();
    let job = match format {
        Some(id) => importer.import_file_as(&mut conn, &file_path, &original_filename, id)?,
        None => importer.import_file(&mut conn, &file_path, &original_filename)?,
    };

    let (rows, total): (i64, f64) = conn.query_row(
        "SELECT count(*), coalesce(sum(total_cost), 0) FROM employee_costs WHERE import_id = ?1",
        [job.id],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?;

    println!(
        "{} imported {} as {} for period {}",
        "ok".green().bold(),
        job.original_filename,
        job.source_type,
        job.period
    );
    println!("{rows} rows, total cost {}", euro(total));
    Ok(())
}
