//! Business operations on top of the repositories.
//!
//! Each operation opens one transaction on the pool, performs its parent
//! checks and writes through it, and commits on success. Dropping the
//! transaction on an early `?` return rolls it back.

pub mod data_metas;
pub mod data_points;
pub mod datas;
pub mod metas;
pub mod users;

pub use data_metas::DataMetaService;
pub use data_points::DataPointService;
pub use datas::DataService;
pub use metas::MetaService;
pub use users::UserService;

use crate::error::{AppError, AppResult};

/// Rejects blank required text fields.
pub(crate) fn require_text(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}
