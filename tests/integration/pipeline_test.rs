//! End-to-end query pipeline tests against SQLite.

use super::common::{open_sqlite, write_numbers, Workspace};
use pretty_assertions::assert_eq;
use sheetquery::config::ConnectionConfig;
use sheetquery::db::Value;
use sheetquery::error::SheetQueryError;
use sheetquery::extract::ExtractExporter;
use sheetquery::query::{QueryRequest, QueryRunner, QueryStore, SubstitutionMode};
use sheetquery::sheet;
use sqlx::Connection;

fn request(ws: &Workspace, column: &str, query: &str) -> QueryRequest {
    QueryRequest {
        input_path: ws.path("customers.xlsx"),
        column: column.to_string(),
        query_name: query.to_string(),
        output_path: ws.path("out/orders.xlsx"),
        in_clause_column: column.to_string(),
    }
}

fn runner(ws: &Workspace) -> QueryRunner {
    QueryRunner::new(QueryStore::new(ws.query_dir()))
}

fn connection(ws: &Workspace) -> ConnectionConfig {
    ConnectionConfig::from_connection_string(&ws.database_url()).unwrap()
}

#[tokio::test]
async fn test_query_to_spreadsheet_and_extract() {
    let ws = Workspace::new();
    ws.seed_orders().await;
    ws.add_query(
        "orders.sql",
        "SELECT OrderId, CustomerId FROM Orders WHERE CustomerId IN () ORDER BY OrderId",
    );
    write_numbers(&ws.path("customers.xlsx"), "CustomerId", &[101.0, 102.0]);

    let summary = runner(&ws)
        .run(&request(&ws, "CustomerId", "orders.sql"), &connection(&ws))
        .await
        .unwrap();

    assert_eq!(
        summary.sql,
        "SELECT OrderId, CustomerId FROM Orders WHERE CustomerId IN ('101', '102') ORDER BY OrderId"
    );
    assert!(summary.substituted);
    assert_eq!(summary.value_count, 2);
    assert_eq!(summary.row_count, 2);

    let output = sheet::read_table(&ws.path("out/orders.xlsx")).unwrap();
    assert_eq!(output.columns, vec!["OrderId", "CustomerId"]);
    assert_eq!(
        output.rows,
        vec![
            vec![Value::Int(1), Value::from("101")],
            vec![Value::Int(2), Value::from("102")],
        ]
    );

    let extract_path = ws.path("orders.extract");
    let extract = ExtractExporter::new()
        .run(&summary.output_path, &extract_path)
        .await
        .unwrap();
    assert_eq!(extract.row_count, 2);

    let mut conn = open_sqlite(&extract_path).await;
    let rows: Vec<(String, String)> =
        sqlx::query_as(r#"SELECT "OrderId", "CustomerId" FROM "Extract" ORDER BY rowid"#)
            .fetch_all(&mut conn)
            .await
            .unwrap();
    assert_eq!(
        rows,
        vec![
            ("1".to_string(), "101".to_string()),
            ("2".to_string(), "102".to_string()),
        ]
    );
    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_missing_column_touches_nothing() {
    let ws = Workspace::new();
    ws.add_query("orders.sql", "SELECT * FROM Orders WHERE CustomerId IN ()");
    write_numbers(&ws.path("customers.xlsx"), "CustomerId", &[101.0]);

    let err = runner(&ws)
        .run(&request(&ws, "AccountId", "orders.sql"), &connection(&ws))
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Column 'AccountId' not found in the Excel sheet."
    );
    assert!(!ws.path("sales.db").exists());
    assert!(!ws.path("out/orders.xlsx").exists());
}

#[tokio::test]
async fn test_empty_column() {
    let ws = Workspace::new();
    ws.add_query("orders.sql", "SELECT * FROM Orders WHERE CustomerId IN ()");
    write_numbers(&ws.path("customers.xlsx"), "CustomerId", &[]);

    let err = runner(&ws)
        .run(&request(&ws, "CustomerId", "orders.sql"), &connection(&ws))
        .await
        .unwrap_err();

    assert!(matches!(err, SheetQueryError::EmptyColumn { .. }));
    assert!(!ws.path("out/orders.xlsx").exists());
}

#[tokio::test]
async fn test_missing_query_file() {
    let ws = Workspace::new();
    write_numbers(&ws.path("customers.xlsx"), "CustomerId", &[101.0]);

    let err = runner(&ws)
        .run(&request(&ws, "CustomerId", "absent.sql"), &connection(&ws))
        .await
        .unwrap_err();

    assert!(matches!(err, SheetQueryError::QueryFileNotFound { .. }));
}

#[tokio::test]
async fn test_template_without_placeholder_runs_unchanged() {
    let ws = Workspace::new();
    ws.seed_orders().await;
    ws.add_query("count.sql", "SELECT COUNT(*) AS n FROM Orders");
    write_numbers(&ws.path("customers.xlsx"), "CustomerId", &[101.0]);

    let summary = runner(&ws)
        .run(&request(&ws, "CustomerId", "count.sql"), &connection(&ws))
        .await
        .unwrap();

    assert!(!summary.substituted);
    assert_eq!(summary.sql, "SELECT COUNT(*) AS n FROM Orders");

    let output = sheet::read_table(&summary.output_path).unwrap();
    assert_eq!(output.rows, vec![vec![Value::Int(3)]]);
}

#[tokio::test]
async fn test_strict_mode_rejects_template_without_placeholder() {
    let ws = Workspace::new();
    ws.seed_orders().await;
    ws.add_query("count.sql", "SELECT COUNT(*) AS n FROM Orders");
    write_numbers(&ws.path("customers.xlsx"), "CustomerId", &[101.0]);

    let err = runner(&ws)
        .with_mode(SubstitutionMode::Strict)
        .run(&request(&ws, "CustomerId", "count.sql"), &connection(&ws))
        .await
        .unwrap_err();

    assert!(matches!(err, SheetQueryError::PatternNotFound { .. }));
    assert!(!ws.path("out/orders.xlsx").exists());
}

#[tokio::test]
async fn test_query_error_leaves_no_output() {
    let ws = Workspace::new();
    ws.seed_orders().await;
    ws.add_query("bad.sql", "SELECT * FROM Invoices WHERE CustomerId IN ()");
    write_numbers(&ws.path("customers.xlsx"), "CustomerId", &[101.0]);

    let err = runner(&ws)
        .run(&request(&ws, "CustomerId", "bad.sql"), &connection(&ws))
        .await
        .unwrap_err();

    assert!(matches!(err, SheetQueryError::QueryExecution(_)));
    assert!(!ws.path("out/orders.xlsx").exists());
}

#[tokio::test]
async fn test_repeated_placeholder_is_filled_everywhere() {
    let ws = Workspace::new();
    ws.seed_orders().await;
    ws.add_query(
        "union.sql",
        "SELECT OrderId FROM Orders WHERE CustomerId IN () \
         UNION ALL SELECT OrderId * 10 FROM Orders WHERE CustomerId IN () \
         ORDER BY 1",
    );
    write_numbers(&ws.path("customers.xlsx"), "CustomerId", &[102.0]);

    let summary = runner(&ws)
        .run(&request(&ws, "CustomerId", "union.sql"), &connection(&ws))
        .await
        .unwrap();

    assert!(!summary.sql.contains("IN ()"));
    let output = sheet::read_table(&summary.output_path).unwrap();
    assert_eq!(output.rows, vec![vec![Value::Int(2)], vec![Value::Int(20)]]);
}
