//! The shared lookup service.
//!
//! [`PokeService`] owns the remote client and one [`Memo`] per lookup kind.
//! It is cheap to clone; clones share the same caches, which live as long as
//! the last handle. Expected failures (not found, upstream unreachable,
//! malformed documents) are logged and surface as `None` or an empty list.

use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;

use crate::cache::{CacheStats, Memo};
use crate::client::{RemoteClient, Transport};
use crate::config::Config;
use crate::error::LookupError;
use crate::fanout::fan_out;
use crate::model::{
    AbilityInfo, EvolutionNode, MoveInfo, MoveRef, PokemonDetail, PokemonListPage, PokemonProfile,
    PokemonSummary, RosterPage, SpeciesInfo, Variety,
};
use crate::normalize::{
    form_label, list_count, normalize_ability, normalize_evolution_chain, normalize_move,
    normalize_pokemon, normalize_pokemon_list, normalize_species,
};
use crate::stats::compute_stat_ranges;
use crate::translate::{translate_or_original, Translator};

const SEARCH_MIN_CHARS: usize = 2;
const SEARCH_MAX_RESULTS: usize = 10;

struct Caches {
    list: Memo<(u32, u32), PokemonListPage>,
    roster: Memo<(), Vec<PokemonSummary>>,
    pokemon: Memo<String, PokemonDetail>,
    species: Memo<String, SpeciesInfo>,
    ability: Memo<String, AbilityInfo>,
    moves: Memo<String, MoveInfo>,
    evolution: Memo<String, EvolutionNode>,
    varieties: Memo<String, Vec<Variety>>,
    z_moves: Memo<(), Vec<Value>>,
}

impl Caches {
    fn new(config: &Config) -> Self {
        let caps = &config.capacities;
        Self {
            list: Memo::new("list", caps.list),
            roster: Memo::new("roster", caps.roster),
            pokemon: Memo::new("pokemon", caps.pokemon),
            species: Memo::new("species", caps.species),
            ability: Memo::new("ability", caps.ability),
            moves: Memo::new("move", caps.moves),
            evolution: Memo::new("evolution", caps.evolution),
            varieties: Memo::new("varieties", caps.varieties),
            z_moves: Memo::new("z-moves", caps.static_data),
        }
    }
}

struct Inner {
    client: RemoteClient,
    caches: Caches,
    workers: usize,
    species_language: String,
    translate_source: String,
    translate_target: String,
    z_moves_path: PathBuf,
}

#[derive(Clone)]
pub struct PokeService {
    inner: Arc<Inner>,
}

impl PokeService {
    pub fn new(config: &Config, transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(Inner {
                client: RemoteClient::new(config.api_base.clone(), transport),
                caches: Caches::new(config),
                workers: config.workers,
                species_language: config.species_language.clone(),
                translate_source: config.translate_source.clone(),
                translate_target: config.translate_target.clone(),
                z_moves_path: config.z_moves_path.clone(),
            }),
        }
    }

    pub async fn pokemon_list(&self, limit: u32, offset: u32) -> Option<PokemonListPage> {
        let client = &self.inner.client;
        let result = self
            .inner
            .caches
            .list
            .get_or_try_fetch((limit, offset), || async move {
                let raw = client
                    .fetch(&format!("pokemon?limit={limit}&offset={offset}"))
                    .await?;
                Ok::<_, LookupError>(normalize_pokemon_list(&raw)?)
            })
            .await;
        absent_on_error("pokemon list", &format!("{limit}@{offset}"), result)
    }

    /// Every Pokemon resource, in API order. Sized by a `limit=1` probe.
    pub async fn all_pokemon(&self) -> Option<Vec<PokemonSummary>> {
        let client = &self.inner.client;
        let result = self
            .inner
            .caches
            .roster
            .get_or_try_fetch((), || async move {
                let probe = client.fetch("pokemon?limit=1").await?;
                let count = list_count(&probe)?;
                let raw = client.fetch(&format!("pokemon?limit={count}")).await?;
                Ok::<_, LookupError>(normalize_pokemon_list(&raw)?.results)
            })
            .await;
        absent_on_error("roster", "all", result)
    }

    /// One 1-based page of the full roster. Page 0 is read as page 1.
    pub async fn roster_page(&self, page: usize, per_page: usize) -> RosterPage {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let roster = self.all_pokemon().await.unwrap_or_default();
        let total = roster.len();
        let items = roster
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .collect();
        RosterPage {
            items,
            page,
            total,
            total_pages: total.div_ceil(per_page),
        }
    }

    /// Name-substring or exact-id search over the roster.
    pub async fn search_roster(&self, query: &str) -> Vec<PokemonSummary> {
        let query = query.trim().to_lowercase();
        if query.chars().count() < SEARCH_MIN_CHARS {
            return Vec::new();
        }
        let Some(roster) = self.all_pokemon().await else {
            return Vec::new();
        };
        roster
            .into_iter()
            .filter(|entry| entry.name.contains(&query) || entry.id == query)
            .take(SEARCH_MAX_RESULTS)
            .collect()
    }

    pub async fn pokemon(&self, name_or_id: &str) -> Option<PokemonDetail> {
        let client = &self.inner.client;
        let result = self
            .inner
            .caches
            .pokemon
            .get_or_try_fetch(name_or_id.to_string(), || async move {
                let raw = client.fetch(&format!("pokemon/{name_or_id}/")).await?;
                Ok::<_, LookupError>(normalize_pokemon(&raw)?)
            })
            .await;
        absent_on_error("pokemon", name_or_id, result)
    }

    pub async fn species(&self, name_or_id: &str) -> Option<SpeciesInfo> {
        let client = &self.inner.client;
        let language = self.inner.species_language.as_str();
        let result = self
            .inner
            .caches
            .species
            .get_or_try_fetch(name_or_id.to_string(), || async move {
                let raw = client
                    .fetch(&format!("pokemon-species/{name_or_id}/"))
                    .await?;
                Ok::<_, LookupError>(normalize_species(&raw, language)?)
            })
            .await;
        absent_on_error("species", name_or_id, result)
    }

    /// `chain_url` is the absolute URL embedded in a species document.
    pub async fn evolution_chain(&self, chain_url: &str) -> Option<EvolutionNode> {
        let client = &self.inner.client;
        let result = self
            .inner
            .caches
            .evolution
            .get_or_try_fetch(chain_url.to_string(), || async move {
                let raw = client.fetch(chain_url).await?;
                Ok::<_, LookupError>(normalize_evolution_chain(&raw)?)
            })
            .await;
        absent_on_error("evolution chain", chain_url, result)
    }

    pub async fn ability(&self, name: &str) -> Option<AbilityInfo> {
        let client = &self.inner.client;
        let result = self
            .inner
            .caches
            .ability
            .get_or_try_fetch(name.to_string(), || async move {
                let raw = client.fetch(&format!("ability/{name}/")).await?;
                Ok::<_, LookupError>(normalize_ability(&raw)?)
            })
            .await;
        absent_on_error("ability", name, result)
    }

    pub async fn move_info(&self, name_or_id: &str) -> Option<MoveInfo> {
        let client = &self.inner.client;
        let result = self
            .inner
            .caches
            .moves
            .get_or_try_fetch(name_or_id.to_string(), || async move {
                let raw = client.fetch(&format!("move/{name_or_id}/")).await?;
                Ok::<_, LookupError>(normalize_move(&raw)?)
            })
            .await;
        absent_on_error("move", name_or_id, result)
    }

    /// Non-default forms of a species, each with a readable label.
    /// Forms whose detail lookup fails are skipped.
    pub async fn varieties(&self, species_name_or_id: &str) -> Vec<Variety> {
        let result = self
            .inner
            .caches
            .varieties
            .get_or_try_fetch(species_name_or_id.to_string(), || async move {
                let species = self.species(species_name_or_id).await.ok_or(())?;
                let mut varieties = Vec::new();
                for variety in species.varieties.iter().filter(|v| !v.is_default) {
                    if let Some(detail) = self.pokemon(&variety.name).await {
                        varieties.push(Variety {
                            form_name: form_label(&species.name, &variety.name),
                            detail,
                        });
                    }
                }
                Ok::<_, ()>(varieties)
            })
            .await;
        // A missing species was already logged and is left uncached.
        result.unwrap_or_default()
    }

    /// Abilities looked up concurrently, in completion order. A failed
    /// lookup yields the unavailable placeholder so every requested name
    /// appears once in the result.
    pub async fn fetch_many_abilities(
        &self,
        names: &[String],
        translator: Option<Arc<dyn Translator>>,
    ) -> Vec<AbilityInfo> {
        fan_out(names.to_vec(), self.inner.workers, |name| {
            let service = self.clone();
            let translator = translator.clone();
            async move {
                let mut info = service
                    .ability(&name)
                    .await
                    .unwrap_or_else(|| AbilityInfo::unavailable(&name));
                if let Some(translator) = translator {
                    info.description = service
                        .translate_text(translator.as_ref(), &info.description)
                        .await;
                }
                Some(info)
            }
        })
        .await
    }

    /// Moves looked up concurrently, in completion order. Failed lookups are
    /// dropped.
    pub async fn fetch_many_moves(
        &self,
        moves: &[MoveRef],
        translator: Option<Arc<dyn Translator>>,
    ) -> Vec<MoveInfo> {
        let names: Vec<String> = moves.iter().map(|m| m.name.clone()).collect();
        fan_out(names, self.inner.workers, |name| {
            let service = self.clone();
            let translator = translator.clone();
            async move {
                let mut info = service.move_info(&name).await?;
                if let Some(translator) = translator {
                    info.effect = service
                        .translate_text(translator.as_ref(), &info.effect)
                        .await;
                }
                Some(info)
            }
        })
        .await
    }

    pub async fn translate_text(&self, translator: &dyn Translator, text: &str) -> String {
        translate_or_original(
            translator,
            text,
            &self.inner.translate_source,
            &self.inner.translate_target,
        )
        .await
    }

    /// Everything a detail page shows. Only a missing Pokemon makes the
    /// whole profile absent; other sections are left empty.
    pub async fn profile(
        &self,
        name_or_id: &str,
        translator: Option<Arc<dyn Translator>>,
    ) -> Option<PokemonProfile> {
        let detail = self.pokemon(name_or_id).await?;
        let stat_ranges = compute_stat_ranges(&detail.stats);

        let mut species = self.species(&detail.id.to_string()).await;
        let mut evolution = None;
        let mut varieties = Vec::new();
        if let Some(species) = species.as_mut() {
            if let Some(url) = &species.evolution_chain_url {
                evolution = self.evolution_chain(url).await;
            }
            if let Some(translator) = &translator {
                if let Some(text) = species.flavor_text.take() {
                    let translated = self.translate_text(translator.as_ref(), &text).await;
                    species.flavor_text = Some(translated);
                }
            }
            varieties = self.varieties(&species.id.to_string()).await;
        }

        let abilities = self
            .fetch_many_abilities(&detail.abilities, translator)
            .await;

        Some(PokemonProfile {
            detail,
            stat_ranges,
            species,
            evolution,
            abilities,
            varieties,
        })
    }

    /// Generic Z-move definitions from the bundled JSON file. A missing or
    /// malformed file gives an empty list.
    pub async fn generic_z_moves(&self) -> Vec<Value> {
        let path = self.inner.z_moves_path.as_path();
        let result = self
            .inner
            .caches
            .z_moves
            .get_or_try_fetch((), || async move {
                Ok::<_, Infallible>(load_z_moves(path).await)
            })
            .await;
        match result {
            Ok(moves) => moves,
            Err(never) => match never {},
        }
    }

    pub fn cache_stats(&self) -> Vec<CacheStats> {
        let caches = &self.inner.caches;
        vec![
            caches.list.stats(),
            caches.roster.stats(),
            caches.pokemon.stats(),
            caches.species.stats(),
            caches.ability.stats(),
            caches.moves.stats(),
            caches.evolution.stats(),
            caches.varieties.stats(),
            caches.z_moves.stats(),
        ]
    }
}

async fn load_z_moves(path: &std::path::Path) -> Vec<Value> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) => {
            log::error!("z-move file {} unreadable: {err}", path.display());
            return Vec::new();
        }
    };
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Array(moves)) => {
            log::info!("loaded {} generic z-moves from {}", moves.len(), path.display());
            moves
        }
        Ok(_) => {
            log::error!("z-move file {} is not a JSON array", path.display());
            Vec::new()
        }
        Err(err) => {
            log::error!("z-move file {} malformed: {err}", path.display());
            Vec::new()
        }
    }
}

fn absent_on_error<T>(kind: &str, key: &str, result: Result<T, LookupError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(LookupError::Remote(err)) if err.is_not_found() => {
            log::info!("{kind} {key} not found");
            None
        }
        Err(err) => {
            log::warn!("{kind} {key} unavailable: {err}");
            None
        }
    }
}
