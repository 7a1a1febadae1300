//! Bundled z-move data and timing of concurrent lookups.

mod common;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pokedex_cache::{Config, PokeService};
use serde_json::json;

use common::{ability_doc, FakeApi, API};

fn service_with_z_moves(path: PathBuf) -> PokeService {
    let config = Config {
        api_base: API.to_string(),
        z_moves_path: path,
        ..Config::default()
    };
    PokeService::new(&config, Arc::new(FakeApi::new()))
}

#[tokio::test]
async fn z_moves_load_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zmoves.json");
    std::fs::write(
        &path,
        json!([
            { "name": "Breakneck Blitz", "type": "normal" },
            { "name": "Gigavolt Havoc", "type": "electric" }
        ])
        .to_string(),
    )
    .unwrap();
    let service = service_with_z_moves(path.clone());

    assert_eq!(service.generic_z_moves().await.len(), 2);

    std::fs::remove_file(&path).unwrap();
    assert_eq!(service.generic_z_moves().await.len(), 2);

    let stats = service
        .cache_stats()
        .into_iter()
        .find(|stats| stats.kind == "z-moves")
        .expect("z-move cache");
    assert_eq!((stats.len, stats.hits, stats.misses), (1, 1, 1));
}

#[tokio::test]
async fn missing_z_move_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_with_z_moves(dir.path().join("absent.json"));

    assert!(service.generic_z_moves().await.is_empty());
}

#[tokio::test]
async fn malformed_z_move_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "[{ \"name\": ").unwrap();
    let not_a_list = dir.path().join("object.json");
    std::fs::write(&not_a_list, "{ \"name\": \"Gigavolt Havoc\" }").unwrap();

    assert!(service_with_z_moves(broken).generic_z_moves().await.is_empty());
    assert!(service_with_z_moves(not_a_list)
        .generic_z_moves()
        .await
        .is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fan_out_overlaps_slow_lookups() {
    let api = Arc::new(FakeApi::with_delay(Duration::from_millis(100)));
    let names: Vec<String> = (0..10).map(|i| format!("ability-{i}")).collect();
    for name in &names {
        api.serve(&format!("ability/{name}/"), ability_doc(name, "Does something."));
    }
    let service = common::service(api.clone());

    let started = Instant::now();
    let abilities = service.fetch_many_abilities(&names, None).await;
    let elapsed = started.elapsed();

    assert_eq!(abilities.len(), 10);
    assert_eq!(api.total_calls(), 10);
    // Ten sequential lookups would take at least a full second.
    assert!(elapsed < Duration::from_millis(900), "took {elapsed:?}");
}
