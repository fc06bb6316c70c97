use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS employees (
    id INTEGER PRIMARY KEY,
    external_id TEXT NOT NULL UNIQUE,
    first_name TEXT NOT NULL DEFAULT '',
    last_name TEXT NOT NULL DEFAULT '',
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    source_type TEXT NOT NULL,
    period TEXT NOT NULL,
    original_filename TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    error_message TEXT,
    currency TEXT NOT NULL DEFAULT 'EUR',
    created_at TEXT DEFAULT (datetime('now')),
    UNIQUE (source_type, period)
);

CREATE TABLE IF NOT EXISTS employee_costs (
    id INTEGER PRIMARY KEY,
    import_id INTEGER NOT NULL,
    employee_id INTEGER NOT NULL,
    period TEXT NOT NULL,
    gross_amount REAL NOT NULL DEFAULT 0,
    ag_bav_amount REAL NOT NULL DEFAULT 0,
    subsidy_amount REAL NOT NULL DEFAULT 0,
    net_amount REAL NOT NULL DEFAULT 0,
    sv_ag_amount REAL NOT NULL DEFAULT 0,
    umlage_amount REAL NOT NULL DEFAULT 0,
    reimb_kk_amount REAL NOT NULL DEFAULT 0,
    flat_tax_amount REAL NOT NULL DEFAULT 0,
    reimb_ba_amount REAL NOT NULL DEFAULT 0,
    reimb_ifsg_amount REAL NOT NULL DEFAULT 0,
    total_cost_wo_reimb REAL NOT NULL DEFAULT 0,
    total_cost REAL NOT NULL DEFAULT 0,
    currency TEXT NOT NULL DEFAULT 'EUR',
    FOREIGN KEY (import_id) REFERENCES imports(id) ON DELETE CASCADE,
    FOREIGN KEY (employee_id) REFERENCES employees(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS ix_employee_costs_import ON employee_costs(import_id);
CREATE INDEX IF NOT EXISTS ix_employee_costs_employee_period ON employee_costs(employee_id, period);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
