//! In-memory PokeAPI for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pokedex_cache::{Config, PokeService, RemoteError, Transport};
use serde_json::{json, Value};

pub const API: &str = "https://pokeapi.test/api/v2";

/// Serves canned documents by URL and counts every request.
#[derive(Default)]
pub struct FakeApi {
    documents: Mutex<HashMap<String, Value>>,
    calls: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
    delay: Option<Duration>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn serve(&self, path: &str, document: Value) {
        self.documents
            .lock()
            .unwrap()
            .insert(url(path), document);
    }

    pub fn calls(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(&url(path))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeApi {
    async fn get_json(&self, url: &str) -> Result<Value, RemoteError> {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self
            .calls
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_insert(0) += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let document = self.documents.lock().unwrap().get(url).cloned();
        document.ok_or_else(|| RemoteError::status(404, url))
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, RemoteError> {
        Err(RemoteError::status(404, url))
    }
}

pub fn url(path: &str) -> String {
    if path.starts_with("http") {
        path.to_string()
    } else {
        format!("{API}/{path}")
    }
}

pub fn service(api: Arc<FakeApi>) -> PokeService {
    let config = Config {
        api_base: API.to_string(),
        ..Config::default()
    };
    PokeService::new(&config, api)
}

fn named(name: &str, kind: &str, id: u32) -> Value {
    json!({ "name": name, "url": format!("{API}/{kind}/{id}/") })
}

fn lang(code: &str) -> Value {
    json!({ "name": code, "url": format!("{API}/language/{code}/") })
}

pub fn pokemon_doc(id: u32, name: &str, abilities: &[&str], moves: &[&str]) -> Value {
    json!({
        "id": id,
        "name": name,
        "height": 4,
        "weight": 60,
        "types": [{ "slot": 1, "type": named("electric", "type", 13) }],
        "stats": [
            { "base_stat": 35, "stat": named("hp", "stat", 1) },
            { "base_stat": 55, "stat": named("attack", "stat", 2) },
            { "base_stat": 90, "stat": named("speed", "stat", 6) }
        ],
        "abilities": abilities
            .iter()
            .enumerate()
            .map(|(i, a)| json!({ "ability": named(a, "ability", i as u32 + 1) }))
            .collect::<Vec<_>>(),
        "moves": moves
            .iter()
            .enumerate()
            .map(|(i, m)| json!({ "move": named(m, "move", i as u32 + 1) }))
            .collect::<Vec<_>>(),
        "sprites": { "front_default": format!("https://sprites.test/{id}.png") }
    })
}

pub fn species_doc(id: u32, name: &str, chain_id: u32, varieties: &[(&str, bool)]) -> Value {
    json!({
        "id": id,
        "name": name,
        "flavor_text_entries": [
            { "flavor_text": "It stores\nelectricity.", "language": lang("en") }
        ],
        "genera": [{ "genus": "Mouse Pokémon", "language": lang("en") }],
        "evolution_chain": { "url": format!("{API}/evolution-chain/{chain_id}/") },
        "varieties": varieties
            .iter()
            .map(|(variety, is_default)| json!({
                "is_default": is_default,
                "pokemon": { "name": variety, "url": format!("{API}/pokemon/{variety}/") }
            }))
            .collect::<Vec<_>>()
    })
}

pub fn ability_doc(name: &str, effect: &str) -> Value {
    json!({
        "name": name,
        "effect_entries": [{ "effect": effect, "short_effect": effect, "language": lang("en") }]
    })
}

pub fn move_doc(id: u32, name: &str, effect: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "accuracy": 100,
        "power": 40,
        "pp": 30,
        "type": named("electric", "type", 13),
        "damage_class": named("special", "move-damage-class", 3),
        "effect_entries": [{ "effect": effect, "short_effect": effect, "language": lang("en") }]
    })
}

pub fn chain_doc(id: u32, stages: &[&str]) -> Value {
    let mut link: Option<Value> = None;
    for (i, stage) in stages.iter().enumerate().rev() {
        let evolves_to: Vec<Value> = link.take().into_iter().collect();
        link = Some(json!({
            "species": named(stage, "pokemon-species", i as u32 + 1),
            "evolves_to": evolves_to
        }));
    }
    json!({ "id": id, "chain": link.unwrap_or(Value::Null) })
}

pub fn list_doc(names: &[&str]) -> Value {
    json!({
        "count": names.len(),
        "results": names
            .iter()
            .enumerate()
            .map(|(i, name)| named(name, "pokemon", i as u32 + 1))
            .collect::<Vec<_>>()
    })
}
