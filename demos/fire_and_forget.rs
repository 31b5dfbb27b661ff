use anyhow::Result;
use futures::future::join_all;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla_sessions::{
    create_table_with_time_series_compaction, ensure_keyspace, execute_async_with_on_failure,
    BoundStatement,
};
use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let uri = env::var("SCYLLA_URI").unwrap_or_else(|_| "127.0.0.1:9042".to_string());
    info!("Connecting to {}", uri);

    let session: Arc<Session> = Arc::new(SessionBuilder::new().known_node(uri).build().await?);
    ensure_keyspace(&*session, "examples_ks").await?;
    create_table_with_time_series_compaction(
        &*session,
        "create table if not exists examples_ks.fire_and_forget (id int, capture_time bigint, \
         payload text, primary key (id, capture_time))",
    )
    .await?;

    let prepared = session
        .prepare(
            "insert into examples_ks.fire_and_forget (id, capture_time, payload) values (?, ?, ?)",
        )
        .await?;

    let failed = Arc::new(AtomicUsize::new(0));
    let mut writes = Vec::new();
    for i in 0..100_i32 {
        let failed = failed.clone();
        let write = execute_async_with_on_failure(
            &session,
            BoundStatement::new(prepared.clone(), (i, i64::from(i) * 1000, "payload")),
            move || {
                failed.fetch_add(1, Ordering::Relaxed);
            },
        );
        writes.push(write.result());
    }

    // Not required for the failure action to run; only to report before exiting.
    join_all(writes).await;
    info!("{} of 100 writes failed", failed.load(Ordering::Relaxed));

    Ok(())
}
