//! sqlx 错误映射

use shelf_errors::AppError;

/// 唯一约束冲突
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

/// 将 sqlx 错误转换为 `AppError`
pub fn map_db_error(err: sqlx::Error) -> AppError {
    if is_unique_violation(&err) {
        return AppError::conflict("Unique constraint violated");
    }
    match err {
        sqlx::Error::RowNotFound => AppError::not_found("Row not found"),
        other => AppError::database(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(matches!(
            map_db_error(sqlx::Error::RowNotFound),
            AppError::NotFound(_)
        ));
    }

    #[test]
    fn test_other_errors_map_to_database() {
        assert!(!is_unique_violation(&sqlx::Error::PoolTimedOut));
        assert!(matches!(
            map_db_error(sqlx::Error::PoolTimedOut),
            AppError::Database(_)
        ));
    }
}
