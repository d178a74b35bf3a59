use std::sync::Arc;

use engine::{SqlAuthProvider, SqlStore};
use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "pocketbook={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let database = settings.database();
    if database == Database::Memory {
        tracing::warn!("using an in-memory database, data is lost on exit");
    }
    let db = parse_database(&database).await?;

    let engine = engine::Engine::builder()
        .store(Arc::new(SqlStore::new(db.clone())))
        .build()
        .await?;
    let auth = Arc::new(SqlAuthProvider::new(db));

    let addr = format!("{}:{}", settings.server.bind, settings.server.port);
    server::run(engine, auth, &addr).await?;

    Ok(())
}

async fn parse_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
