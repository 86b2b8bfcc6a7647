use anyhow::{Context, Result};
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement};

const MIGRATIONS: &[(&str, &str)] = &[
    ("001_create_accounts_table", include_str!("../migrations/001_create_accounts_table.sql")),
    ("002_create_documents_table", include_str!("../migrations/002_create_documents_table.sql")),
];

/// Run database migrations for the postgres backend
pub async fn run_migrations(db: &DatabaseConnection) -> Result<()> {
    for (name, sql) in MIGRATIONS {
        tracing::info!("Running migration: {}", name);

        for statement in sql.split(';') {
            let trimmed = statement.trim();
            if trimmed.is_empty() {
                continue;
            }

            if let Err(e) = db
                .execute(Statement::from_string(DatabaseBackend::Postgres, trimmed.to_string()))
                .await
            {
                // Re-running against an initialized database is fine
                let error_msg = e.to_string().to_lowercase();
                if error_msg.contains("duplicate") || error_msg.contains("already exists") {
                    tracing::warn!("Migration statement skipped (already exists): {}", trimmed);
                } else {
                    return Err(e).context(format!("Failed to execute migration: {}", name));
                }
            }
        }

        tracing::info!("Migration completed: {}", name);
    }

    tracing::info!("All migrations completed successfully");
    Ok(())
}
