//! Extract export integration tests.

use super::common::{open_sqlite, Workspace};
use pretty_assertions::assert_eq;
use rust_xlsxwriter::Workbook;
use sheetquery::extract::ExtractExporter;
use sqlx::Connection;

#[tokio::test]
async fn test_export_mixed_spreadsheet_as_text() {
    let ws = Workspace::new();
    let source = ws.path("mixed.xlsx");

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Name").unwrap();
    sheet.write_string(0, 1, "Amount").unwrap();
    sheet.write_string(0, 2, "Active").unwrap();
    sheet.write_string(1, 0, "O'Brien").unwrap();
    sheet.write_number(1, 1, 12.5).unwrap();
    sheet.write_boolean(1, 2, true).unwrap();
    sheet.write_string(2, 0, "Lee").unwrap();
    sheet.write_number(2, 1, 40.0).unwrap();
    workbook.save(&source).unwrap();

    let output = ws.path("mixed.extract");
    let summary = ExtractExporter::new().run(&source, &output).await.unwrap();
    assert_eq!(summary.column_count, 3);
    assert_eq!(summary.row_count, 2);

    let mut conn = open_sqlite(&output).await;
    let rows: Vec<(String, String, Option<String>)> =
        sqlx::query_as(r#"SELECT "Name", "Amount", "Active" FROM "Extract" ORDER BY rowid"#)
            .fetch_all(&mut conn)
            .await
            .unwrap();
    assert_eq!(
        rows,
        vec![
            ("O'Brien".to_string(), "12.5".to_string(), Some("true".to_string())),
            ("Lee".to_string(), "40".to_string(), None),
        ]
    );
    conn.close().await.unwrap();
}
