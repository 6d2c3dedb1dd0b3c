//! Shelf Identity Service

use shelf_bootstrap::{ServiceConfig, StorageMode, run};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // --in-memory: 不连接数据库，重启后数据丢失
    let storage = if std::env::args().any(|arg| arg == "--in-memory") {
        StorageMode::InMemory
    } else {
        StorageMode::Postgres
    };

    run(
        ServiceConfig::default().with_storage(storage),
        shelf_identity::build_router,
    )
    .await
}
