//! SQL access for each entity.
//!
//! Every function takes the connection of the caller's transaction. Store
//! errors are classified here; callers only ever see [`AppError`] variants.

pub mod data_metas;
pub mod data_points;
pub mod datas;
pub mod metas;
pub mod users;

use sqlx::error::ErrorKind;

use crate::error::AppError;

/// Classifies an insert/update failure of `entity`.
pub(crate) fn write_error(err: sqlx::Error, entity: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        tracing::debug!("{} write rejected by store: {}", entity, db_err.message());
        match db_err.kind() {
            ErrorKind::UniqueViolation => return AppError::Conflict(format!("{} already exists", entity)),
            ErrorKind::ForeignKeyViolation => {
                return AppError::Conflict(format!("{} references a record that does not exist", entity))
            }
            ErrorKind::CheckViolation => return AppError::Conflict(format!("{} has an unsupported type", entity)),
            ErrorKind::NotNullViolation => {
                return AppError::Validation(format!("{} is missing a required field", entity))
            }
            _ => {}
        }
    }
    AppError::from(err)
}

/// Classifies a delete failure of `entity`; restrict-on-delete surfaces as a conflict.
pub(crate) fn delete_error(err: sqlx::Error, entity: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if let ErrorKind::ForeignKeyViolation = db_err.kind() {
            tracing::debug!("{} delete restricted: {}", entity, db_err.message());
            return AppError::Conflict(format!("Cannot delete {}: it is still referenced by other records", entity));
        }
    }
    AppError::from(err)
}

/// Decodes a JSON value column.
pub(crate) fn parse_value(raw: &str) -> Result<serde_json::Value, AppError> {
    serde_json::from_str(raw).map_err(|e| AppError::Internal(anyhow::anyhow!("corrupt stored value {:?}: {}", raw, e)))
}
