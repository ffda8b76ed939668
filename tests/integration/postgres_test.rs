//! PostgreSQL pipeline tests.
//!
//! Skipped unless DATABASE_URL points at a reachable PostgreSQL database.

use super::common::{write_numbers, Workspace};
use pretty_assertions::assert_eq;
use sheetquery::config::{ConnectionConfig, DATABASE_URL_ENV};
use sheetquery::db::{DatabaseBackend, DatabaseClient, PostgresClient, Value};
use sheetquery::error::SheetQueryError;
use sheetquery::query::{QueryRequest, QueryRunner, QueryStore};
use sheetquery::sheet;

/// Helper to get the test connection from the environment.
fn get_test_connection() -> Option<ConnectionConfig> {
    let url = std::env::var(DATABASE_URL_ENV).ok()?;
    let config = ConnectionConfig::from_connection_string(&url).ok()?;
    matches!(config.backend(), Ok(DatabaseBackend::Postgres)).then_some(config)
}

#[tokio::test]
async fn test_execute_simple_select() {
    let Some(config) = get_test_connection() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let mut client = PostgresClient::connect(&config).await.unwrap();

    let result = client
        .execute_query("SELECT 1::int4 AS num, 'hello' AS greeting")
        .await
        .unwrap();

    assert_eq!(result.column_names(), vec!["num", "greeting"]);
    assert_eq!(result.rows, vec![vec![Value::Int(1), Value::from("hello")]]);

    Box::new(client).close().await.unwrap();
}

#[tokio::test]
async fn test_decimal_uuid_and_json_are_kept_as_text() {
    let Some(config) = get_test_connection() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let mut client = PostgresClient::connect(&config).await.unwrap();

    let result = client
        .execute_query(
            "SELECT 1.50::numeric AS amount, \
                    'a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11'::uuid AS id, \
                    '{\"k\": 1}'::jsonb AS doc, \
                    '1 day 02:00:00'::interval AS wait, \
                    ARRAY[1, 2]::int4[] AS ids, \
                    NULL::numeric AS missing",
        )
        .await
        .unwrap();

    assert_eq!(
        result.rows,
        vec![vec![
            Value::from("1.50"),
            Value::from("a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11"),
            Value::from(r#"{"k":1}"#),
            Value::from("1 day 02:00:00"),
            Value::from("{1,2}"),
            Value::Null,
        ]]
    );

    Box::new(client).close().await.unwrap();
}

#[tokio::test]
async fn test_unsupported_type_is_an_error() {
    let Some(config) = get_test_connection() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let mut client = PostgresClient::connect(&config).await.unwrap();

    let err = client
        .execute_query("SELECT '10.0.0.1'::inet AS addr")
        .await
        .unwrap_err();

    assert!(matches!(err, SheetQueryError::QueryExecution(_)));
    assert!(err.to_string().contains("unsupported column type INET"));

    Box::new(client).close().await.unwrap();
}

#[tokio::test]
async fn test_runner_against_postgres() {
    let Some(config) = get_test_connection() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let ws = Workspace::new();
    ws.add_query(
        "ids.sql",
        "SELECT id FROM (VALUES ('101'), ('102'), ('103')) AS t(id) \
         WHERE id IN () ORDER BY id",
    );
    write_numbers(&ws.path("customers.xlsx"), "id", &[101.0, 103.0]);

    let request = QueryRequest {
        input_path: ws.path("customers.xlsx"),
        column: "id".to_string(),
        query_name: "ids.sql".to_string(),
        output_path: ws.path("ids.xlsx"),
        in_clause_column: "id".to_string(),
    };
    let summary = QueryRunner::new(QueryStore::new(ws.query_dir()))
        .run(&request, &config)
        .await
        .unwrap();

    assert_eq!(summary.row_count, 2);
    let output = sheet::read_table(&summary.output_path).unwrap();
    assert_eq!(
        output.rows,
        vec![vec![Value::from("101")], vec![Value::from("103")]]
    );
}
