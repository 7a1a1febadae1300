use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::stats::StatRange;

/// Placeholder for abilities and moves without an English effect entry.
/// Never passed to a translator.
pub const DESCRIPTION_UNAVAILABLE: &str = "Description unavailable";

pub fn is_description_available(text: &str) -> bool {
    !text.is_empty() && text != DESCRIPTION_UNAVAILABLE
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonSummary {
    pub id: String,
    pub name: String,
    pub url: String,
    pub sprite_url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonListPage {
    pub count: u32,
    pub results: Vec<PokemonSummary>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterPage {
    pub items: Vec<PokemonSummary>,
    pub page: usize,
    pub total: usize,
    pub total_pages: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRef {
    pub name: String,
    pub url: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprites {
    pub front_default: Option<String>,
    pub front_shiny: Option<String>,
    pub back_default: Option<String>,
    pub back_shiny: Option<String>,
    pub artwork_default: Option<String>,
    pub artwork_shiny: Option<String>,
    pub dream_world: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonDetail {
    pub id: u32,
    pub name: String,
    pub height: u32,
    pub weight: u32,
    pub types: Vec<String>,
    pub stats: BTreeMap<String, u32>,
    pub abilities: Vec<String>,
    pub moves: Vec<MoveRef>,
    pub sprites: Sprites,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarietyRef {
    pub is_default: bool,
    pub name: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesInfo {
    pub id: u32,
    pub name: String,
    pub flavor_text: Option<String>,
    pub evolution_chain_url: Option<String>,
    pub genus: Option<String>,
    pub varieties: Vec<VarietyRef>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityInfo {
    pub name: String,
    pub description: String,
}

impl AbilityInfo {
    pub fn unavailable(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: DESCRIPTION_UNAVAILABLE.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveInfo {
    pub id: u32,
    pub name: String,
    pub accuracy: Option<u32>,
    pub power: Option<u32>,
    pub pp: Option<u32>,
    pub type_name: String,
    pub damage_class: Option<String>,
    pub effect: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionNode {
    pub species: String,
    pub url: String,
    pub evolves_to: Vec<EvolutionNode>,
}

impl EvolutionNode {
    /// Number of stages on the longest path from this node.
    pub fn depth(&self) -> usize {
        1 + self
            .evolves_to
            .iter()
            .map(EvolutionNode::depth)
            .max()
            .unwrap_or(0)
    }

    pub fn node_count(&self) -> usize {
        1 + self
            .evolves_to
            .iter()
            .map(EvolutionNode::node_count)
            .sum::<usize>()
    }

    /// Species names in depth-first order, root first.
    pub fn species_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.node_count());
        collect_names(self, &mut names);
        names
    }
}

fn collect_names(node: &EvolutionNode, names: &mut Vec<String>) {
    names.push(node.species.clone());
    for next in &node.evolves_to {
        collect_names(next, names);
    }
}

/// A non-default form of a species with its readable label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variety {
    pub form_name: String,
    #[serde(flatten)]
    pub detail: PokemonDetail,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PokemonProfile {
    pub detail: PokemonDetail,
    pub stat_ranges: BTreeMap<String, StatRange>,
    pub species: Option<SpeciesInfo>,
    pub evolution: Option<EvolutionNode>,
    pub abilities: Vec<AbilityInfo>,
    pub varieties: Vec<Variety>,
}
