use config::shared::{IntoConnectOptions, PgConnectionConfig};
use sqlx::postgres::{PgArguments, PgConnectOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Column, ConnectOptions, PgConnection, Postgres, Row as _, TypeInfo};
use tracing::debug;

use crate::bail;
use crate::error::{ErrorKind, FanoutResult};
use crate::source::{Connection, DataStore, Row, Value};

/// [`DataStore`] backed by a Postgres database.
///
/// Each call to [`DataStore::connect`] opens a dedicated connection; nothing is pooled.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    options: PgConnectOptions,
}

impl PostgresStore {
    /// Creates a store that connects with the given configuration.
    pub fn new(config: &PgConnectionConfig) -> Self {
        Self {
            options: config.with_db(),
        }
    }
}

impl DataStore for PostgresStore {
    type Connection = PostgresConnection;

    fn name() -> &'static str {
        "postgres"
    }

    async fn connect(&self) -> FanoutResult<PostgresConnection> {
        let connection = self.options.connect().await?;
        debug!("opened postgres connection");

        Ok(PostgresConnection { connection })
    }
}

/// Connection handed out by [`PostgresStore`].
///
/// Dropping it without calling [`Connection::close`] still closes the socket, only without the
/// graceful termination message.
#[derive(Debug)]
pub struct PostgresConnection {
    connection: PgConnection,
}

impl Connection for PostgresConnection {
    async fn execute(&mut self, query: &str, params: &[Value]) -> FanoutResult<Vec<Row>> {
        let mut statement = sqlx::query(query);
        for param in params {
            statement = bind_value(statement, param);
        }

        let pg_rows = statement.fetch_all(&mut self.connection).await?;

        pg_rows.iter().map(decode_row).collect()
    }

    async fn close(self) -> FanoutResult<()> {
        sqlx::Connection::close(self.connection).await?;
        debug!("closed postgres connection");

        Ok(())
    }
}

fn bind_value<'q>(
    statement: Query<'q, Postgres, PgArguments>,
    value: &Value,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::Null => statement.bind(Option::<String>::None),
        Value::Int(value) => statement.bind(*value),
        Value::Float(value) => statement.bind(*value),
        Value::Text(value) => statement.bind(value.clone()),
    }
}

fn decode_row(pg_row: &PgRow) -> FanoutResult<Row> {
    let values = (0..pg_row.columns().len())
        .map(|index| decode_value(pg_row, index))
        .collect::<FanoutResult<Vec<_>>>()?;

    Ok(Row::new(values))
}

fn decode_value(pg_row: &PgRow, index: usize) -> FanoutResult<Value> {
    let column = &pg_row.columns()[index];

    let value = match column.type_info().name() {
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => pg_row
            .try_get::<Option<String>, _>(index)?
            .map(Value::Text),
        "INT2" => pg_row
            .try_get::<Option<i16>, _>(index)?
            .map(|value| Value::Int(value.into())),
        "INT4" => pg_row
            .try_get::<Option<i32>, _>(index)?
            .map(|value| Value::Int(value.into())),
        "INT8" => pg_row.try_get::<Option<i64>, _>(index)?.map(Value::Int),
        "FLOAT4" => pg_row
            .try_get::<Option<f32>, _>(index)?
            .map(|value| Value::Float(value.into())),
        "FLOAT8" => pg_row.try_get::<Option<f64>, _>(index)?.map(Value::Float),
        other => bail!(
            ErrorKind::InvalidData,
            "Unsupported column type",
            format!("column `{}` has unsupported type {other}", column.name())
        ),
    };

    Ok(value.unwrap_or(Value::Null))
}
