// Database connection and pool management
// This module handles SQLite database connections using sqlx

use anyhow::Result;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::path::Path;

pub struct DatabaseConnection {
    pool: SqlitePool,
}

impl DatabaseConnection {
    pub async fn new(database_url: &str) -> Result<Self> {
        // Create database file directory if it doesn't exist
        let db_path = if database_url.starts_with("sqlite://") {
            database_url.trim_start_matches("sqlite://")
        } else if database_url.starts_with("sqlite:") {
            database_url.trim_start_matches("sqlite:")
        } else {
            database_url
        };

        if db_path != ":memory:" {
            if let Some(parent) = Path::new(db_path).parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            // Ensure the database file exists by creating it if necessary
            if !Path::new(db_path).exists() {
                std::fs::File::create(db_path)?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        let create_characters_sql = r#"
            CREATE TABLE IF NOT EXISTS characters (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                birth_year TEXT NOT NULL,
                eye_color TEXT NOT NULL,
                gender TEXT NOT NULL,
                hair_color TEXT NOT NULL,
                mass TEXT NOT NULL,
                skin_color TEXT NOT NULL,
                homeworld_name TEXT NOT NULL,
                films TEXT NOT NULL DEFAULT '',
                species TEXT NOT NULL DEFAULT '',
                starships TEXT NOT NULL DEFAULT '',
                vehicles TEXT NOT NULL DEFAULT '',
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
        "#;

        // Read-path acceleration only; the primary key is the sole
        // uniqueness constraint
        let create_name_index_sql =
            "CREATE INDEX IF NOT EXISTS idx_characters_name ON characters (name)";
        let create_homeworld_index_sql =
            "CREATE INDEX IF NOT EXISTS idx_characters_homeworld ON characters (homeworld_name)";

        sqlx::query(create_characters_sql).execute(&self.pool).await?;
        sqlx::query(create_name_index_sql).execute(&self.pool).await?;
        sqlx::query(create_homeworld_index_sql).execute(&self.pool).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_database_connection() -> Result<()> {
        let temp_dir = tempdir()?;
        let db_path = temp_dir.path().join("test.db");
        let database_url = format!("sqlite:{}", db_path.to_string_lossy());

        let db = DatabaseConnection::new(&database_url).await?;
        assert!(!db.pool().is_closed());

        Ok(())
    }

    #[tokio::test]
    async fn test_database_migration() -> Result<()> {
        let temp_dir = tempdir()?;
        let db_path = temp_dir.path().join("test_migration.db");
        let database_url = format!("sqlite:{}", db_path.display());

        let db = DatabaseConnection::new(&database_url).await?;
        db.migrate().await?;

        let result =
            sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name='characters'")
                .fetch_optional(db.pool())
                .await?;
        assert!(result.is_some());

        // Migration is re-runnable
        db.migrate().await?;
        Ok(())
    }
}
