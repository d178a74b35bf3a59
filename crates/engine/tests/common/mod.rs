#![allow(dead_code)]

use std::sync::Arc;

use api_types::pagination::PaginationParams;
use sea_orm::{Database, DatabaseConnection};
use serde_json::Value;

use engine::{Engine, MemoryStore, SqlStore};
use migration::MigratorTrait;

pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";

pub async fn migrated_db(url: &str) -> DatabaseConnection {
    let db = Database::connect(url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db
}

pub async fn sql_engine() -> Engine {
    let db = migrated_db("sqlite::memory:").await;
    Engine::builder()
        .store(Arc::new(SqlStore::new(db)))
        .build()
        .await
        .unwrap()
}

/// Engine over a file database, so the pool really runs several connections.
pub async fn file_engine() -> (Engine, std::path::PathBuf) {
    let root =
        std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("engine_{}.db", uuid::Uuid::new_v4()));
    let db = migrated_db(&format!("sqlite:{}?mode=rwc", path.display())).await;
    let engine = Engine::builder()
        .store(Arc::new(SqlStore::new(db)))
        .build()
        .await
        .unwrap();
    (engine, path)
}

pub async fn memory_engine() -> Engine {
    Engine::builder()
        .store(Arc::new(MemoryStore::new()))
        .build()
        .await
        .unwrap()
}

/// Both store backends, labelled for assertion messages.
pub async fn engines() -> Vec<(&'static str, Engine)> {
    vec![("sql", sql_engine().await), ("memory", memory_engine().await)]
}

pub fn params(value: Value) -> PaginationParams {
    serde_json::from_value(value).unwrap()
}
