use async_trait::async_trait;
use chrono::Utc;
use queuebot_core::brain::{Parameter, ParameterStore, ParameterType};
use queuebot_core::errors::StoreError;
use sqlx::{sqlite::SqliteRow, Row};

use crate::DbPool;

/// Parameter store over the `parameter` table. `SecureString` values are kept
/// as written; the type is recorded but nothing is encrypted at rest.
pub struct SqlParameterStore {
    pool: DbPool,
}

impl SqlParameterStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn db_error(error: sqlx::Error) -> StoreError {
    StoreError::Backend(error.to_string())
}

fn parameter_from_row(row: SqliteRow) -> Result<Parameter, StoreError> {
    let type_raw: String = row.try_get("parameter_type").map_err(db_error)?;
    Ok(Parameter {
        name: row.try_get("name").map_err(db_error)?,
        value: row.try_get("value").map_err(db_error)?,
        parameter_type: type_raw.parse::<ParameterType>()?,
    })
}

#[async_trait]
impl ParameterStore for SqlParameterStore {
    async fn get_parameter(
        &self,
        name: &str,
        _with_decryption: bool,
    ) -> Result<Option<Parameter>, StoreError> {
        let row = sqlx::query(
            "SELECT name, value, parameter_type
             FROM parameter
             WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(parameter_from_row).transpose()
    }

    async fn put_parameter(
        &self,
        name: &str,
        value: &str,
        parameter_type: ParameterType,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO parameter (name, value, parameter_type, version, updated_at)
             VALUES (?, ?, ?, 1, ?)
             ON CONFLICT(name) DO UPDATE SET
                value = excluded.value,
                parameter_type = excluded.parameter_type,
                version = parameter.version + 1,
                updated_at = excluded.updated_at",
        )
        .bind(name)
        .bind(value)
        .bind(parameter_type.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn get_parameters_by_path(
        &self,
        path: &str,
        max_results: usize,
    ) -> Result<Vec<Parameter>, StoreError> {
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let limit = i64::try_from(max_results).unwrap_or(i64::MAX);

        let rows = sqlx::query(
            "SELECT name, value, parameter_type
             FROM parameter
             WHERE substr(name, 1, length(?1)) = ?1 AND length(name) > length(?1)
             ORDER BY name
             LIMIT ?2",
        )
        .bind(&prefix)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(parameter_from_row).collect()
    }
}
