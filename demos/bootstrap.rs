use anyhow::Result;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla_sessions::{create_table_with_time_series_compaction, ensure_keyspace};
use std::env;
use tracing::info;

// Run with RUST_LOG=debug to see which compaction strategy the cluster accepted:
// RUST_LOG=debug cargo run --example bootstrap
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let uri = env::var("SCYLLA_URI").unwrap_or_else(|_| "127.0.0.1:9042".to_string());
    let keyspace = env::var("KEYSPACE").unwrap_or_else(|_| "examples_ks".to_string());
    info!("Connecting to {}", uri);

    let session: Session = SessionBuilder::new().known_node(uri).build().await?;

    // Safe to run on every startup.
    for _ in 0..2 {
        ensure_keyspace(&session, &keyspace).await?;
        create_table_with_time_series_compaction(
            &session,
            &format!(
                "create table if not exists {}.gauge_value (gauge_name varchar, \
                 capture_time timestamp, value double, primary key (gauge_name, capture_time))",
                keyspace
            ),
        )
        .await?;
    }

    info!("Schema of {} is in place", keyspace);
    Ok(())
}
