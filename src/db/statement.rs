//! Prepared statements.

use serde_json::{Map, Number, Value};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqliteRow};
use sqlx::{Column, Row, Sqlite, TypeInfo, ValueRef};

use crate::db::{DbError, RunMeta, RunResult, SqlValue};

/// A statement with its positional parameters, executed by one of
/// [`Statement::first`], [`Statement::all`] or [`Statement::run`].
#[derive(Debug)]
pub struct Statement<'a> {
    pool: &'a SqlitePool,
    sql: String,
    params: Vec<SqlValue>,
}

impl<'a> Statement<'a> {
    pub(crate) fn new(pool: &'a SqlitePool, sql: &str) -> Self {
        Self {
            pool,
            sql: sql.to_string(),
            params: Vec::new(),
        }
    }

    /// Bind the next `?` placeholder.
    pub fn bind(mut self, value: impl Into<SqlValue>) -> Self {
        self.params.push(value.into());
        self
    }

    /// The first row, if any.
    pub async fn first(self) -> Result<Option<Map<String, Value>>, DbError> {
        let row = bind_all(sqlx::query(&self.sql), &self.params)
            .fetch_optional(self.pool)
            .await?;
        row.as_ref().map(row_to_json).transpose()
    }

    pub async fn all(self) -> Result<Vec<Map<String, Value>>, DbError> {
        let rows = bind_all(sqlx::query(&self.sql), &self.params)
            .fetch_all(self.pool)
            .await?;
        rows.iter().map(row_to_json).collect()
    }

    pub async fn run(self) -> Result<RunResult, DbError> {
        let result = bind_all(sqlx::query(&self.sql), &self.params)
            .execute(self.pool)
            .await?;
        Ok(RunResult {
            success: true,
            meta: RunMeta {
                last_row_id: result.last_insert_rowid(),
                changes: result.rows_affected(),
            },
        })
    }
}

fn bind_all<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &'q [SqlValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Integer(v) => query.bind(*v),
            SqlValue::Real(v) => query.bind(*v),
            SqlValue::Text(v) => query.bind(v.as_str()),
        };
    }
    query
}

fn row_to_json(row: &SqliteRow) -> Result<Map<String, Value>, DbError> {
    let mut object = Map::new();
    for column in row.columns() {
        let index = column.ordinal();
        let raw = row.try_get_raw(index)?;

        let value = if raw.is_null() {
            Value::Null
        } else {
            let storage = raw.type_info().name().to_string();
            match storage.as_str() {
                "INTEGER" => Value::from(row.try_get_unchecked::<i64, _>(index)?),
                "REAL" => Number::from_f64(row.try_get_unchecked::<f64, _>(index)?)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
                "BLOB" => {
                    let bytes = row.try_get_unchecked::<Vec<u8>, _>(index)?;
                    Value::String(String::from_utf8_lossy(&bytes).into_owned())
                }
                _ => Value::String(row.try_get_unchecked::<String, _>(index)?),
            }
        };
        object.insert(column.name().to_string(), value);
    }
    Ok(object)
}
