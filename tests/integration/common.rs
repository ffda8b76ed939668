//! Shared fixtures for integration tests.

use rust_xlsxwriter::Workbook;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tempfile::TempDir;

/// A temp workspace with a query directory and a SQLite sales database.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("queryfolder")).unwrap();
        Self { dir }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn query_dir(&self) -> PathBuf {
        self.path("queryfolder")
    }

    pub fn add_query(&self, name: &str, sql: &str) {
        std::fs::write(self.query_dir().join(name), sql).unwrap();
    }

    pub fn database_url(&self) -> String {
        format!("sqlite://{}", self.path("sales.db").display())
    }

    /// Creates `Orders` with three orders for customers 101, 102 and 103.
    pub async fn seed_orders(&self) {
        let options = SqliteConnectOptions::from_str(&self.database_url())
            .unwrap()
            .create_if_missing(true);
        let mut conn = options.connect().await.unwrap();
        for statement in [
            "CREATE TABLE Orders (OrderId INTEGER, CustomerId TEXT, Total REAL)",
            "INSERT INTO Orders VALUES (1, '101', 9.5), (2, '102', 20.0), (3, '103', 7.25)",
        ] {
            sqlx::query(statement).execute(&mut conn).await.unwrap();
        }
        conn.close().await.unwrap();
    }
}

/// Writes a one-sheet workbook with a string header row and numeric cells.
pub fn write_numbers(path: &Path, header: &str, values: &[f64]) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, header).unwrap();
    for (i, value) in values.iter().enumerate() {
        sheet.write_number(i as u32 + 1, 0, *value).unwrap();
    }
    workbook.save(path).unwrap();
}

/// Opens an existing SQLite file for assertions.
pub async fn open_sqlite(path: &Path) -> SqliteConnection {
    SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(false)
        .connect()
        .await
        .unwrap()
}
