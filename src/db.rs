use migration::Migrator;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbBackend, Statement};
use sea_orm_migration::MigratorTrait;

const SQLITE_PRAGMAS: [&str; 3] =
    ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL", "PRAGMA foreign_keys=ON"];

pub async fn connect(database_url: &str) -> anyhow::Result<DatabaseConnection> {
    let db = Database::connect(database_url).await?;

    if db.get_database_backend() == DbBackend::Sqlite {
        for pragma in SQLITE_PRAGMAS {
            db.execute(Statement::from_string(DbBackend::Sqlite, pragma)).await?;
        }
    }

    Ok(db)
}

pub async fn connect_and_migrate(database_url: &str) -> anyhow::Result<DatabaseConnection> {
    let db = connect(database_url).await?;
    Migrator::up(&db, None).await?;
    tracing::debug!("migrations applied");
    Ok(db)
}

/// Drops every table and re-runs all migrations.
pub async fn reset(db: &DatabaseConnection) -> anyhow::Result<()> {
    Migrator::fresh(db).await?;
    tracing::info!("database recreated");
    Ok(())
}
