// Properties of the emitted event stream: envelope shape, routing, id and
// position uniqueness, and rate accuracy

mod common;

use common::{id_of, position_of, producer, RecordingPublisher};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

fn is_upper_hex_16(value: &str) -> bool {
    value.len() == 16 && value.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
}

#[tokio::test]
async fn test_db2_single_worker_scenario() {
    let publisher = Arc::new(RecordingPublisher::default());
    let producer = producer(&publisher, "db2", 2, 1);

    producer.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(1_200)).await;
    producer.stop().await;

    let events = publisher.events();
    assert!(events.len() >= 2, "only {} events", events.len());

    let tables: Vec<&str> = events
        .iter()
        .map(|e| e.body["source"]["table"].as_str().unwrap())
        .collect();
    for (i, table) in tables.iter().enumerate() {
        let expected = if i % 2 == 0 { "PRODUCTS" } else { "INVENTORY" };
        assert_eq!(*table, expected);
    }

    for event in &events {
        let body = &event.body;
        let source = &body["source"];

        assert_eq!(body["op"], "c");
        assert!(body["before"].is_null());
        assert_eq!(body["ts_ms"], source["ts_ms"]);
        assert_eq!(source["connector"], "db2");
        assert_eq!(source["name"], "db2-source");
        assert_eq!(source["db"], "TESTDB");
        assert_eq!(source["schema"], "DB2INST1");
        assert_eq!(source["snapshot"], "false");
        assert!(source.get("scn").is_none());
        assert!(is_upper_hex_16(source["lsn"].as_str().unwrap()));
        assert_eq!(event.key, id_of(body).to_string());

        match source["table"].as_str().unwrap() {
            "PRODUCTS" => {
                assert_eq!(event.topic, "db2-cdc-products");
                assert!(body["after"]["price"].as_f64().unwrap() >= 5.0);
            }
            _ => {
                assert_eq!(event.topic, "db2-cdc-inventory");
                assert!(body["after"]["product_id"].as_u64().unwrap() >= 1);
            }
        }
    }

    assert_eq!(id_of(&events[0].body), 1);
    if events.len() >= 3 {
        assert_eq!(id_of(&events[2].body), 2);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_multi_worker_ids_and_positions_are_unique() {
    let publisher = Arc::new(RecordingPublisher::default());
    let producer = producer(&publisher, "both", 800, 4);

    producer.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    producer.stop().await;

    let events = publisher.events();
    assert!(events.len() > 50, "only {} events", events.len());

    let mut ids = HashSet::new();
    let mut positions = HashSet::new();
    let mut tables = HashSet::new();

    for event in &events {
        let source = &event.body["source"];
        let table = source["table"].as_str().unwrap().to_string();
        let system = source["connector"].as_str().unwrap().to_string();

        assert!(ids.insert((table.clone(), id_of(&event.body))), "duplicate id in {}", table);
        assert!(
            positions.insert((system.clone(), position_of(&event.body))),
            "duplicate {} position",
            system
        );
        tables.insert(table);
    }

    assert_eq!(tables.len(), 4);

    let snapshot = producer.snapshot();
    let total_ids = snapshot.sequences.customers
        + snapshot.sequences.orders
        + snapshot.sequences.products
        + snapshot.sequences.inventory;
    assert_eq!(total_ids, events.len() as u64);

    let oracle_events = events
        .iter()
        .filter(|e| e.body["source"]["connector"] == "oracle")
        .count() as u64;
    assert_eq!(snapshot.positions.oracle_scn, 1_700_000_000_000 + oracle_events);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_emission_rate_tracks_target() {
    let publisher = Arc::new(RecordingPublisher::default());
    let producer = producer(&publisher, "both", 200, 2);

    producer.start().await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    producer.stop().await;

    let count = publisher.len();
    assert!(
        (140..=260).contains(&count),
        "expected about 200 events in one second, got {}",
        count
    );
}

#[tokio::test]
async fn test_oracle_mode_emits_only_oracle_tables() {
    let publisher = Arc::new(RecordingPublisher::default());
    let producer = producer(&publisher, "oracle", 100, 1);

    producer.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    producer.stop().await;

    let events = publisher.events();
    assert!(!events.is_empty());

    let mut last_scn = 0;
    for event in &events {
        let source = &event.body["source"];
        assert_eq!(source["connector"], "oracle");
        assert_eq!(source["db"], "ORCL");
        assert!(source["txId"].as_str().unwrap().starts_with("tx-"));
        assert!(["CUSTOMERS", "ORDERS"].contains(&source["table"].as_str().unwrap()));

        // one worker, so publish order is position order
        let scn = position_of(&event.body);
        assert!(scn > last_scn);
        last_scn = scn;
    }
}
