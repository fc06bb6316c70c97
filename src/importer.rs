use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Transaction};

use crate::error::{LohnkostenError, Result};
use crate::formats::{ParsedCsv, Registry, MIN_CONFIDENCE};
use crate::models::{ExtractedRow, ImportJob};
use crate::period;
use crate::table;

/// Drives one import start to finish: load, period extraction,
/// format detection, parsing, transactional persistence. Owns the
/// format registry; no global state.
pub struct Importer {
    registry: Registry,
}

impl Importer {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn with_default_formats() -> Self {
        Self::new(Registry::with_default_formats())
    }

    /// Import a file, auto-detecting its format.
    pub fn import_file(
        &self,
        conn: &mut Connection,
        file_path: &Path,
        original_filename: &str,
    ) -> Result<ImportJob> {
        self.run(conn, file_path, original_filename, None)
    }

    /// Import a file as a specific format, bypassing detection.
    pub fn import_file_as(
        &self,
        conn: &mut Connection,
        file_path: &Path,
        original_filename: &str,
        format_id: &str,
    ) -> Result<ImportJob> {
        self.run(conn, file_path, original_filename, Some(format_id))
    }

    fn run(
        &self,
        conn: &mut Connection,
        file_path: &Path,
        original_filename: &str,
        format_id: Option<&str>,
    ) -> Result<ImportJob> {
        let (banner, table) = table::load_table(file_path)?;

        // No period, no import: the period is part of the job identity,
        // so this fails before any database state is touched.
        let period = period::extract_from_banner(&banner)
            .ok_or_else(|| LohnkostenError::PeriodNotFound(banner.trim().to_string()))?;

        let parser = match format_id {
            Some(id) => self.registry.get_by_format_id(id)?,
            None => {
                let detection = self.registry.detect_best(&table, MIN_CONFIDENCE)?;
                self.registry.get_by_format_id(detection.chosen.format_id)?
            }
        };

        let mut parsed = parser.parse(&table);
        parsed.period = period.clone();
        for row in &mut parsed.rows {
            row.period = period.clone();
        }

        persist(conn, &parsed, original_filename)
    }
}

/// Persist one parsed file as a single unit of work.
///
/// Any prior import for the same (source_type, period) is deleted first,
/// cost rows cascading with it: a re-upload fully replaces, never merges.
/// If row persistence fails, the row writes are rolled back but the job
/// row is still committed with status "error" as an audit record, and
/// the failure propagates to the caller.
fn persist(conn: &mut Connection, parsed: &ParsedCsv, filename: &str) -> Result<ImportJob> {
    let mut tx = conn.transaction()?;

    tx.execute(
        "DELETE FROM imports WHERE source_type = ?1 AND period = ?2",
        rusqlite::params![parsed.format_id, parsed.period],
    )?;
    tx.execute(
        "INSERT INTO imports (source_type, period, original_filename, status) VALUES (?1, ?2, ?3, 'processing')",
        rusqlite::params![parsed.format_id, parsed.period, filename],
    )?;
    let job_id = tx.last_insert_rowid();

    match insert_rows(&mut tx, job_id, &parsed.rows) {
        Ok(()) => {
            tx.execute("UPDATE imports SET status = 'ok' WHERE id = ?1", [job_id])?;
            tx.commit()?;
            get_job(conn, job_id)
        }
        Err(e) => {
            tx.execute(
                "UPDATE imports SET status = 'error', error_message = ?1 WHERE id = ?2",
                rusqlite::params![e.to_string(), job_id],
            )?;
            tx.commit()?;
            Err(e)
        }
    }
}

/// Inserts all cost rows inside a savepoint so a failure rolls back the
/// rows and employee upserts without losing the enclosing job row.
fn insert_rows(tx: &mut Transaction, job_id: i64, rows: &[ExtractedRow]) -> Result<()> {
    let sp = tx.savepoint()?;
    for row in rows {
        let employee_id = upsert_employee(&sp, row)?;
        insert_cost(&sp, job_id, employee_id, row)?;
    }
    sp.commit()?;
    Ok(())
}

/// Create the employee on first sight; later imports overwrite the name
/// fields (names are not versioned, last write wins).
fn upsert_employee(conn: &Connection, row: &ExtractedRow) -> Result<i64> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM employees WHERE external_id = ?1",
            [&row.external_employee_id],
            |r| r.get(0),
        )
        .optional()?;

    match existing {
        Some(id) => {
            conn.execute(
                "UPDATE employees SET first_name = ?1, last_name = ?2 WHERE id = ?3",
                rusqlite::params![row.first_name, row.last_name, id],
            )?;
            Ok(id)
        }
        None => {
            conn.execute(
                "INSERT INTO employees (external_id, first_name, last_name) VALUES (?1, ?2, ?3)",
                rusqlite::params![row.external_employee_id, row.first_name, row.last_name],
            )?;
            Ok(conn.last_insert_rowid())
        }
    }
}

fn insert_cost(conn: &Connection, job_id: i64, employee_id: i64, row: &ExtractedRow) -> Result<()> {
    let a = &row.amounts;
    conn.execute(
        "INSERT INTO employee_costs (
            import_id, employee_id, period,
            gross_amount, ag_bav_amount, subsidy_amount, net_amount,
            sv_ag_amount, umlage_amount, reimb_kk_amount, flat_tax_amount,
            reimb_ba_amount, reimb_ifsg_amount, total_cost_wo_reimb, total_cost,
            currency
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        rusqlite::params![
            job_id,
            employee_id,
            row.period,
            a.gross_amount,
            a.ag_bav_amount,
            a.subsidy_amount,
            a.net_amount,
            a.sv_ag_amount,
            a.umlage_amount,
            a.reimb_kk_amount,
            a.flat_tax_amount,
            a.reimb_ba_amount,
            a.reimb_ifsg_amount,
            a.total_cost_wo_reimb,
            a.total_cost,
            row.currency,
        ],
    )?;
    Ok(())
}

pub fn get_job(conn: &Connection, job_id: i64) -> Result<ImportJob> {
    let job = conn.query_row(
        "SELECT id, source_type, period, original_filename, status, error_message, currency, created_at
         FROM imports WHERE id = ?1",
        [job_id],
        |r| {
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
        },
    )?;
    Ok(job)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn write_datev_csv(dir: &Path, name: &str, banner: &str, body: &[&str]) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut content = String::new();
        content.push_str(banner);
        content.push('\n');
        for line in body {
            content.push_str(line);
            content.push('\n');
        }
        std::fs::write(&path, content.as_bytes()).unwrap();
        path
    }

    fn costs_for_period(conn: &Connection, period: &str) -> Vec<(String, f64)> {
        let mut stmt = conn
            .prepare(
                "SELECT e.external_id, c.gross_amount FROM employee_costs c
                 JOIN employees e ON e.id = c.employee_id
                 WHERE c.period = ?1 ORDER BY e.external_id",
            )
            .unwrap();
        stmt.query_map([period], |r| Ok((r.get(0)?, r.get(1)?)))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_import_end_to_end() {
        let (dir, mut conn) = test_db();
        let path = write_datev_csv(
            dir.path(),
            "lohn.csv",
            "A;B;C;Jan 26",
            &[
                "Pers.-Nr.;Nachname;Vorname;Gesamtbrutto;Gesamtkosten",
                "1001;Muster;Max;3.000,00;3.750,00",
            ],
        );
        let importer = Importer::with_default_formats();
        let job = importer.import_file(&mut conn, &path, "lohn.csv").unwrap();

        assert_eq!(job.status, "ok");
        assert_eq!(job.period, "2026-01");
        assert_eq!(job.source_type, "datev_payroll_v1");
        assert_eq!(job.original_filename, "lohn.csv");
        assert_eq!(job.currency, "EUR");

        let costs = costs_for_period(&conn, "2026-01");
        assert_eq!(costs, vec![("1001".to_string(), 3000.0)]);
    }

    #[test]
    fn test_reimport_replaces_period_data() {
        let (dir, mut conn) = test_db();
        let importer = Importer::with_default_formats();

        let first = write_datev_csv(
            dir.path(),
            "jan.csv",
            "A;B;C;01.2026",
            &[
                "Pers.-Nr.;Nachname;Vorname;Gesamtbrutto",
                "1001;Muster;Max;3.000,00",
                "1002;Beispiel;Erika;2.500,00",
            ],
        );
        importer.import_file(&mut conn, &first, "jan.csv").unwrap();

        // Corrected re-upload for the same period: one employee, new amount.
        let second = write_datev_csv(
            dir.path(),
            "jan_fix.csv",
            "A;B;C;01.2026",
            &[
                "Pers.-Nr.;Nachname;Vorname;Gesamtbrutto",
                "1001;Muster;Max;3.100,00",
            ],
        );
        let job = importer.import_file(&mut conn, &second, "jan_fix.csv").unwrap();
        assert_eq!(job.status, "ok");

        let jobs: i64 = conn
            .query_row(
                "SELECT count(*) FROM imports WHERE source_type = 'datev_payroll_v1' AND period = '2026-01'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(jobs, 1);

        let costs = costs_for_period(&conn, "2026-01");
        assert_eq!(costs, vec![("1001".to_string(), 3100.0)]);
    }

    #[test]
    fn test_reimport_overwrites_employee_names() {
        let (dir, mut conn) = test_db();
        let importer = Importer::with_default_formats();

        let first = write_datev_csv(
            dir.path(),
            "jan.csv",
            "A;B;C;01.2026",
            &["Pers.-Nr.;Nachname;Vorname", "1001;Mustre;Max"],
        );
        importer.import_file(&mut conn, &first, "jan.csv").unwrap();

        let second = write_datev_csv(
            dir.path(),
            "feb.csv",
            "A;B;C;02.2026",
            &["Pers.-Nr.;Nachname;Vorname", "1001;Muster;Max"],
        );
        importer.import_file(&mut conn, &second, "feb.csv").unwrap();

        let (count, last_name): (i64, String) = conn
            .query_row(
                "SELECT count(*), max(last_name) FROM employees WHERE external_id = '1001'",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(last_name, "Muster");
    }

    #[test]
    fn test_import_skips_summary_rows() {
        let (dir, mut conn) = test_db();
        let path = write_datev_csv(
            dir.path(),
            "lohn.csv",
            "A;B;C;01.2026",
            &[
                "Pers.-Nr.;Nachname;Vorname;Gesamtbrutto",
                "1001;Muster;Max;3.000,00",
                "Summen;;;5.500,00",
            ],
        );
        let importer = Importer::with_default_formats();
        importer.import_file(&mut conn, &path, "lohn.csv").unwrap();

        let count: i64 = conn
            .query_row("SELECT count(*) FROM employee_costs", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_missing_period_aborts_before_any_write() {
        let (dir, mut conn) = test_db();
        let path = write_datev_csv(
            dir.path(),
            "lohn.csv",
            "A;B;C;kein Monat",
            &["Pers.-Nr.;Nachname;Vorname", "1001;Muster;Max"],
        );
        let importer = Importer::with_default_formats();
        let err = importer.import_file(&mut conn, &path, "lohn.csv").unwrap_err();
        assert!(matches!(err, LohnkostenError::PeriodNotFound(_)));

        let jobs: i64 = conn.query_row("SELECT count(*) FROM imports", [], |r| r.get(0)).unwrap();
        assert_eq!(jobs, 0);
    }

    #[test]
    fn test_unrecognized_layout_aborts_before_any_write() {
        let (dir, mut conn) = test_db();
        let path = write_datev_csv(
            dir.path(),
            "konto.csv",
            "A;B;C;01.2026",
            &["Datum;Betrag;Verwendungszweck", "01.01.2026;-50,00;Miete"],
        );
        let importer = Importer::with_default_formats();
        let err = importer.import_file(&mut conn, &path, "konto.csv").unwrap_err();
        assert!(matches!(err, LohnkostenError::NoSuitableFormat { .. }));

        let jobs: i64 = conn.query_row("SELECT count(*) FROM imports", [], |r| r.get(0)).unwrap();
        assert_eq!(jobs, 0);
    }

    #[test]
    fn test_forced_unknown_format() {
        let (dir, mut conn) = test_db();
        let path = write_datev_csv(
            dir.path(),
            "lohn.csv",
            "A;B;C;01.2026",
            &["Pers.-Nr.;Nachname;Vorname", "1001;Muster;Max"],
        );
        let importer = Importer::with_default_formats();
        let err = importer
            .import_file_as(&mut conn, &path, "lohn.csv", "sage_hr_v2")
            .unwrap_err();
        assert!(matches!(err, LohnkostenError::UnknownFormat(_)));
    }

    #[test]
    fn test_forced_format_bypasses_detection() {
        let (dir, mut conn) = test_db();
        // Header misses "Vorname", so detection would refuse it; forcing
        // the format still imports what it can resolve.
        let path = write_datev_csv(
            dir.path(),
            "lohn.csv",
            "A;B;C;01.2026",
            &["Pers.-Nr.;Nachname;Gesamtbrutto", "1001;Muster;3.000,00"],
        );
        let importer = Importer::with_default_formats();
        let job = importer
            .import_file_as(&mut conn, &path, "lohn.csv", "datev_payroll_v1")
            .unwrap();
        assert_eq!(job.status, "ok");
        let costs = costs_for_period(&conn, "2026-01");
        assert_eq!(costs, vec![("1001".to_string(), 3000.0)]);
    }

    #[test]
    fn test_persistence_failure_records_error_job() {
        let (dir, mut conn) = test_db();
        // Sabotage row persistence; the job row must still be committed
        // as an audit record while the row writes roll back.
        conn.execute_batch("DROP TABLE employee_costs;").unwrap();

        let path = write_datev_csv(
            dir.path(),
            "lohn.csv",
            "A;B;C;01.2026",
            &["Pers.-Nr.;Nachname;Vorname;Gesamtbrutto", "1001;Muster;Max;3.000,00"],
        );
        let importer = Importer::with_default_formats();
        let err = importer.import_file(&mut conn, &path, "lohn.csv").unwrap_err();
        assert!(matches!(err, LohnkostenError::Db(_)));

        let (status, message): (String, Option<String>) = conn
            .query_row(
                "SELECT status, error_message FROM imports WHERE source_type = 'datev_payroll_v1' AND period = '2026-01'",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(status, "error");
        assert!(message.unwrap().contains("employee_costs"));

        // The employee upsert from the failed attempt was rolled back.
        let employees: i64 = conn
            .query_row("SELECT count(*) FROM employees", [], |r| r.get(0))
            .unwrap();
        assert_eq!(employees, 0);
    }

    #[test]
    fn test_import_decodes_latin1_names() {
        let (dir, mut conn) = test_db();
        let mut bytes = b"A;B;C;M".to_vec();
        bytes.push(0xE4); // ä in latin1
        bytes.extend_from_slice(b"r 26\nPers.-Nr.;Nachname;Vorname;Gesamtbrutto\n1001;M");
        bytes.push(0xFC); // ü
        bytes.extend_from_slice(b"ller;J\xF6rg;2.000,00\n");
        let path = dir.path().join("latin1.csv");
        std::fs::write(&path, &bytes).unwrap();

        let importer = Importer::with_default_formats();
        let job = importer.import_file(&mut conn, &path, "latin1.csv").unwrap();
        assert_eq!(job.period, "2026-03");

        let (first, last): (String, String) = conn
            .query_row(
                "SELECT first_name, last_name FROM employees WHERE external_id = '1001'",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(first, "Jörg");
        assert_eq!(last, "Müller");
    }
}
