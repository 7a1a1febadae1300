//! Mapping from raw PokeAPI documents to the internal records.
//!
//! Every function here is pure. Optional pieces of a document (sprites,
//! flavor text, effect entries) fall back to `None` or the unavailable
//! sentinel; only missing required fields produce a [`NormalizeError`].

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::NormalizeError;
use crate::model::{
    AbilityInfo, EvolutionNode, MoveInfo, MoveRef, PokemonDetail, PokemonListPage, PokemonSummary,
    SpeciesInfo, Sprites, VarietyRef, DESCRIPTION_UNAVAILABLE,
};

const SPRITE_BASE: &str = "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon";
const FALLBACK_LANGUAGE: &str = "en";

#[derive(Clone, Debug, Deserialize)]
struct NamedResource {
    name: String,
    url: String,
}

#[derive(Clone, Debug, Deserialize)]
struct ListResponse {
    count: u32,
    results: Vec<NamedResource>,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonResponse {
    id: u32,
    name: String,
    height: u32,
    weight: u32,
    types: Vec<PokemonTypeSlot>,
    stats: Vec<PokemonStatSlot>,
    abilities: Vec<PokemonAbilitySlot>,
    #[serde(default)]
    moves: Vec<PokemonMoveSlot>,
    #[serde(default)]
    sprites: Value,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonTypeSlot {
    #[serde(rename = "type")]
    type_info: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonStatSlot {
    base_stat: u32,
    stat: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonAbilitySlot {
    ability: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonMoveSlot {
    #[serde(rename = "move")]
    move_info: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonSpeciesResponse {
    id: u32,
    name: String,
    #[serde(default)]
    flavor_text_entries: Vec<FlavorTextEntry>,
    #[serde(default)]
    genera: Vec<GenusEntry>,
    evolution_chain: Option<ApiResource>,
    #[serde(default)]
    varieties: Vec<VarietySlot>,
}

#[derive(Clone, Debug, Deserialize)]
struct ApiResource {
    url: String,
}

#[derive(Clone, Debug, Deserialize)]
struct FlavorTextEntry {
    flavor_text: String,
    language: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
struct GenusEntry {
    genus: String,
    language: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
struct VarietySlot {
    is_default: bool,
    pokemon: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
struct AbilityResponse {
    name: String,
    #[serde(default)]
    effect_entries: Vec<EffectEntry>,
}

#[derive(Clone, Debug, Deserialize)]
struct MoveResponse {
    id: u32,
    name: String,
    accuracy: Option<u32>,
    power: Option<u32>,
    pp: Option<u32>,
    #[serde(rename = "type")]
    type_info: NamedResource,
    damage_class: Option<NamedResource>,
    #[serde(default)]
    effect_entries: Vec<EffectEntry>,
}

#[derive(Clone, Debug, Deserialize)]
struct EffectEntry {
    #[serde(default)]
    short_effect: String,
    language: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
struct EvolutionChainResponse {
    chain: ChainLink,
}

#[derive(Clone, Debug, Deserialize)]
struct ChainLink {
    species: NamedResource,
    #[serde(default)]
    evolves_to: Vec<ChainLink>,
}

fn parse<T: DeserializeOwned>(kind: &'static str, raw: &Value) -> Result<T, NormalizeError> {
    T::deserialize(raw).map_err(|source| NormalizeError::Shape { kind, source })
}

pub fn normalize_pokemon(raw: &Value) -> Result<PokemonDetail, NormalizeError> {
    let response: PokemonResponse = parse("pokemon", raw)?;

    let types = response
        .types
        .into_iter()
        .map(|slot| slot.type_info.name)
        .collect();
    let stats = response
        .stats
        .into_iter()
        .map(|slot| (slot.stat.name, slot.base_stat))
        .collect();
    let abilities = response
        .abilities
        .into_iter()
        .map(|slot| slot.ability.name)
        .collect();
    let moves = response
        .moves
        .into_iter()
        .map(|slot| MoveRef {
            name: slot.move_info.name,
            url: slot.move_info.url,
        })
        .collect();

    Ok(PokemonDetail {
        id: response.id,
        name: response.name,
        height: response.height,
        weight: response.weight,
        types,
        stats,
        abilities,
        moves,
        sprites: select_sprites(&response.sprites),
    })
}

fn select_sprites(sprites: &Value) -> Sprites {
    Sprites {
        front_default: pointer_string(sprites, "/front_default"),
        front_shiny: pointer_string(sprites, "/front_shiny"),
        back_default: pointer_string(sprites, "/back_default"),
        back_shiny: pointer_string(sprites, "/back_shiny"),
        artwork_default: pointer_string(sprites, "/other/official-artwork/front_default"),
        artwork_shiny: pointer_string(sprites, "/other/official-artwork/front_shiny"),
        dream_world: pointer_string(sprites, "/other/dream_world/front_default"),
    }
}

pub fn normalize_species(raw: &Value, language: &str) -> Result<SpeciesInfo, NormalizeError> {
    let response: PokemonSpeciesResponse = parse("species", raw)?;

    let flavor_text = pick_localized(&response.flavor_text_entries, language, |entry| {
        (&entry.language.name, &entry.flavor_text)
    })
    .map(|text| sanitize_text(text));
    let genus = pick_localized(&response.genera, language, |entry| {
        (&entry.language.name, &entry.genus)
    })
    .cloned();
    let varieties = response
        .varieties
        .into_iter()
        .map(|slot| VarietyRef {
            is_default: slot.is_default,
            name: slot.pokemon.name,
            url: slot.pokemon.url,
        })
        .collect();

    Ok(SpeciesInfo {
        id: response.id,
        name: response.name,
        flavor_text,
        evolution_chain_url: response.evolution_chain.map(|chain| chain.url),
        genus,
        varieties,
    })
}

/// First entry in `language`, else the first English entry, in document order.
fn pick_localized<'a, T>(
    entries: &'a [T],
    language: &str,
    fields: impl Fn(&'a T) -> (&'a String, &'a String),
) -> Option<&'a String> {
    let find = |wanted: &str| {
        entries
            .iter()
            .map(&fields)
            .find(|(lang, _)| lang.as_str() == wanted)
            .map(|(_, text)| text)
    };
    find(language).or_else(|| find(FALLBACK_LANGUAGE))
}

pub fn normalize_ability(raw: &Value) -> Result<AbilityInfo, NormalizeError> {
    let response: AbilityResponse = parse("ability", raw)?;
    Ok(AbilityInfo {
        name: response.name,
        description: effect_text(&response.effect_entries),
    })
}

pub fn normalize_move(raw: &Value) -> Result<MoveInfo, NormalizeError> {
    let response: MoveResponse = parse("move", raw)?;
    Ok(MoveInfo {
        id: response.id,
        name: response.name,
        accuracy: response.accuracy,
        power: response.power,
        pp: response.pp,
        type_name: response.type_info.name,
        damage_class: response.damage_class.map(|class| class.name),
        effect: effect_text(&response.effect_entries),
    })
}

pub fn normalize_evolution_chain(raw: &Value) -> Result<EvolutionNode, NormalizeError> {
    let response: EvolutionChainResponse = parse("evolution-chain", raw)?;
    Ok(build_node(response.chain))
}

fn build_node(link: ChainLink) -> EvolutionNode {
    EvolutionNode {
        species: link.species.name,
        url: link.species.url,
        evolves_to: link.evolves_to.into_iter().map(build_node).collect(),
    }
}

pub fn normalize_pokemon_list(raw: &Value) -> Result<PokemonListPage, NormalizeError> {
    let response: ListResponse = parse("pokemon list", raw)?;
    Ok(PokemonListPage {
        count: response.count,
        results: response
            .results
            .into_iter()
            .map(|entry| summary_from_resource(entry.name, entry.url))
            .collect(),
    })
}

/// Only the `count` field of a listing, used to size the full roster request.
pub fn list_count(raw: &Value) -> Result<u32, NormalizeError> {
    #[derive(Deserialize)]
    struct CountOnly {
        count: u32,
    }
    parse::<CountOnly>("pokemon list", raw).map(|response| response.count)
}

pub fn summary_from_resource(name: String, url: String) -> PokemonSummary {
    let id = resource_id(&url).unwrap_or_default().to_string();
    let sprite_url = format!("{SPRITE_BASE}/{id}.png");
    PokemonSummary {
        id,
        name,
        url,
        sprite_url,
    }
}

/// Trailing numeric segment of a resource URL such as `.../pokemon/25/`.
pub fn resource_id(url: &str) -> Option<&str> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
}

/// Readable label for a non-default form, e.g. `charizard-mega-x` under
/// `charizard` becomes `Mega X`.
pub fn form_label(base_name: &str, variety_name: &str) -> String {
    let remainder = if base_name.is_empty() {
        variety_name.to_string()
    } else {
        variety_name.replace(base_name, "")
    };
    let label = remainder
        .replace('-', " ")
        .split_whitespace()
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ");
    if label.is_empty() {
        "Alternative Form".to_string()
    } else {
        label
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn sanitize_text(text: &str) -> String {
    text.replace('\n', " ").replace('\u{000C}', " ")
}

fn effect_text(entries: &[EffectEntry]) -> String {
    entries
        .iter()
        .find(|entry| entry.language.name == FALLBACK_LANGUAGE)
        .map(|entry| sanitize_text(&entry.short_effect))
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| DESCRIPTION_UNAVAILABLE.to_string())
}

fn pointer_string(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(|val| val.as_str())
        .map(|s| s.to_string())
}
