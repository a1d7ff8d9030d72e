use crate::error::AppError;
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use std::path::{Path, PathBuf};

const DEFAULT_DB_FILENAME: &str = "versus-board.db";
const DB_PATH_ENV: &str = "VERSUS_BOARD_DB";

pub fn resolve_db_path(override_path: Option<&Path>) -> PathBuf {
    if let Some(path) = override_path {
        return path.to_path_buf();
    }

    std::env::var(DB_PATH_ENV)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILENAME))
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn initialize_pool_from_path(path: &Path) -> Result<SqlitePool, AppError> {
    let connect_options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePool::connect_with(connect_options).await?;
    run_migrations(&pool).await?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_db_path() -> PathBuf {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system clock should be after unix epoch")
            .as_nanos();

        std::env::temp_dir().join(format!("versus-board-{timestamp}.db"))
    }

    #[test]
    fn explicit_path_wins_over_defaults() {
        let explicit = PathBuf::from("/tmp/custom.db");
        assert_eq!(resolve_db_path(Some(&explicit)), explicit);
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let db_path = unique_db_path();

        let pool = initialize_pool_from_path(&db_path)
            .await
            .expect("pool initialization should succeed");

        run_migrations(&pool)
            .await
            .expect("running migrations multiple times should succeed");

        let journal_rows =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM purchase_journal")
                .fetch_one(&pool)
                .await
                .expect("purchase_journal table must exist and be queryable");

        assert_eq!(journal_rows, 0);

        drop(pool);
        let _ = std::fs::remove_file(db_path);
    }
}
