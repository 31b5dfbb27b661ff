use std::collections::HashMap;

use scylla_sessions::{create_table_with_time_series_compaction, ensure_keyspace};

use crate::utils::{create_new_session, setup_tracing, unique_keyspace_name};

#[tokio::test]
async fn keyspace_creation_is_idempotent() {
    setup_tracing();
    let session = create_new_session().await;
    let ks = unique_keyspace_name();

    ensure_keyspace(&session, &ks).await.unwrap();
    ensure_keyspace(&session, &ks).await.unwrap();

    session.refresh_metadata().await.unwrap();
    assert!(session
        .get_cluster_state()
        .get_keyspace(&ks)
        .is_some());
}

#[tokio::test]
async fn table_is_created_with_a_time_series_strategy() {
    setup_tracing();
    let session = create_new_session().await;
    let ks = unique_keyspace_name();
    ensure_keyspace(&session, &ks).await.unwrap();

    let create_table = format!(
        "create table if not exists {}.gauge_value (gauge_name varchar, capture_time timestamp, \
         value double, primary key (gauge_name, capture_time))",
        ks
    );
    create_table_with_time_series_compaction(&session, &create_table)
        .await
        .unwrap();

    let (compaction,) = session
        .query_unpaged(
            "SELECT compaction FROM system_schema.tables WHERE keyspace_name = ? AND table_name = ?",
            (ks.as_str(), "gauge_value"),
        )
        .await
        .unwrap()
        .into_rows_result()
        .unwrap()
        .single_row::<(HashMap<String, String>,)>()
        .unwrap();
    let class = compaction.get("class").unwrap();
    assert!(
        class.ends_with("TimeWindowCompactionStrategy")
            || class.ends_with("DateTieredCompactionStrategy"),
        "unexpected compaction class {}",
        class
    );
}
