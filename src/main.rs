use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;

use pokedex_cache::agent::{agent_for, ask_agent, Provider};
use pokedex_cache::fanout::fan_out;
use pokedex_cache::model::MoveRef;
use pokedex_cache::sprites::{prefetch_sprites, DEFAULT_DOWNLOAD_DELAY};
use pokedex_cache::stats::compute_stat_ranges;
use pokedex_cache::store::{LocalPokemonRecord, LocalStore};
use pokedex_cache::translate::{CachedTranslator, GoogleTranslator, Translator};
use pokedex_cache::{Config, HttpTransport, PokeService, Transport};

#[derive(Parser, Debug)]
#[command(name = "pokedex")]
#[command(about = "Cached PokeAPI lookups, translation and a Pokemon assistant")]
struct Args {
    /// Override the API base URL
    #[arg(long)]
    api_base: Option<String>,
    /// Concurrent lookups for batch commands
    #[arg(long)]
    workers: Option<usize>,
    /// Preferred flavor-text language (falls back to English)
    #[arg(long)]
    language: Option<String>,
    /// Translate English descriptions (best effort)
    #[arg(long)]
    translate: bool,
    #[arg(long)]
    db: Option<PathBuf>,
    /// Log cache occupancy and hit counts when the command finishes
    #[arg(long)]
    cache_stats: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// One page of the raw listing endpoint
    List {
        #[arg(long, default_value_t = 20)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// A page of the full roster
    Roster {
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 70)]
        per_page: usize,
    },
    Search { query: String },
    /// Full profile: detail, stats, species, evolution, abilities, forms
    Show { name_or_id: String },
    Species { name_or_id: String },
    Evolution { name_or_id: String },
    Ability { name: String },
    Move { name_or_id: String },
    /// Every ability of a Pokemon, fetched concurrently
    Abilities { name_or_id: String },
    /// Every move of a Pokemon, fetched concurrently
    Moves { name_or_id: String },
    Varieties { name_or_id: String },
    Stats { name_or_id: String },
    Zmoves {
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Ask the Pokemon assistant
    Ask {
        prompt: String,
        #[arg(long, value_enum, default_value = "gemini")]
        provider: Provider,
        #[arg(long, default_value = "gemini-2.0-flash-lite")]
        model: String,
        #[arg(long, default_value_t = 1024)]
        max_tokens: u32,
    },
    /// Look up a record in the offline store
    Local { term: String },
    /// Fill the offline store with ids 1..=limit
    Seed {
        #[arg(long, default_value_t = 151)]
        limit: u32,
    },
    /// Download sprites for every stored record
    PrefetchSprites {
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn runtime_config(args: &Args) -> Config {
    let mut config = Config::default().with_env_overrides();
    if let Some(base) = &args.api_base {
        config.api_base = base.trim_end_matches('/').to_string();
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(language) = &args.language {
        config.species_language = language.clone();
    }
    if let Some(db) = &args.db {
        config.db_path = db.clone();
    }
    config
}

async fn run(args: Args) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = runtime_config(&args);
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(config.request_timeout)?);
    let service = PokeService::new(&config, transport.clone());
    let translator: Option<Arc<dyn Translator>> = if args.translate {
        let google = GoogleTranslator::new(config.request_timeout)?;
        Some(Arc::new(CachedTranslator::new(
            google,
            config.capacities.translation,
        )))
    } else {
        None
    };

    let outcome = execute(args.command, &config, &service, transport, translator).await;
    if args.cache_stats {
        for stats in service.cache_stats() {
            log::info!(
                "{} cache: {}/{} entries, {} hits, {} misses",
                stats.kind,
                stats.len,
                stats.capacity,
                stats.hits,
                stats.misses
            );
        }
    }
    outcome
}

async fn execute(
    command: Command,
    config: &Config,
    service: &PokeService,
    transport: Arc<dyn Transport>,
    translator: Option<Arc<dyn Translator>>,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match command {
        Command::List { limit, offset } => {
            found(service.pokemon_list(limit, offset).await, "Listing")
        }
        Command::Roster { page, per_page } => {
            print_json(&service.roster_page(page, per_page).await)
        }
        Command::Search { query } => print_json(&service.search_roster(&query).await),
        Command::Show { name_or_id } => {
            found(service.profile(&name_or_id, translator).await, "Pokémon")
        }
        Command::Species { name_or_id } => {
            let Some(mut species) = service.species(&name_or_id).await else {
                return not_found("Species");
            };
            if let Some(translator) = &translator {
                if let Some(text) = species.flavor_text.take() {
                    let translated = service.translate_text(translator.as_ref(), &text).await;
                    species.flavor_text = Some(translated);
                }
            }
            print_json(&species)
        }
        Command::Evolution { name_or_id } => {
            let chain_url = service
                .species(&name_or_id)
                .await
                .and_then(|species| species.evolution_chain_url);
            let Some(chain_url) = chain_url else {
                return not_found("Evolution chain");
            };
            found(service.evolution_chain(&chain_url).await, "Evolution chain")
        }
        Command::Ability { name } => {
            let Some(mut ability) = service.ability(&name).await else {
                return not_found("Ability");
            };
            if let Some(translator) = &translator {
                ability.description = service
                    .translate_text(translator.as_ref(), &ability.description)
                    .await;
            }
            print_json(&ability)
        }
        Command::Move { name_or_id } => {
            let Some(mut info) = service.move_info(&name_or_id).await else {
                return not_found("Move");
            };
            if let Some(translator) = &translator {
                info.effect = service.translate_text(translator.as_ref(), &info.effect).await;
            }
            print_json(&info)
        }
        Command::Abilities { name_or_id } => {
            let Some(detail) = service.pokemon(&name_or_id).await else {
                return not_found("Pokémon");
            };
            print_json(&service.fetch_many_abilities(&detail.abilities, translator).await)
        }
        Command::Moves { name_or_id } => {
            let Some(detail) = service.pokemon(&name_or_id).await else {
                return not_found("Pokémon");
            };
            let moves: Vec<MoveRef> = detail.moves;
            print_json(&service.fetch_many_moves(&moves, translator).await)
        }
        Command::Varieties { name_or_id } => print_json(&service.varieties(&name_or_id).await),
        Command::Stats { name_or_id } => {
            let Some(detail) = service.pokemon(&name_or_id).await else {
                return not_found("Pokémon");
            };
            print_json(&compute_stat_ranges(&detail.stats))
        }
        Command::Zmoves { file } => {
            let moves = match file {
                Some(path) => {
                    let mut config = config.clone();
                    config.z_moves_path = path;
                    PokeService::new(&config, transport).generic_z_moves().await
                }
                None => service.generic_z_moves().await,
            };
            print_json(&moves)
        }
        Command::Ask {
            prompt,
            provider,
            model,
            max_tokens,
        } => {
            let agent = agent_for(
                provider,
                model,
                std::env::var("GEMINI_API_KEY").ok(),
                std::env::var("OLLAMA_BASE_URL").ok(),
                max_tokens,
            )?;
            println!("{}", ask_agent(agent.as_ref(), &prompt).await);
            Ok(ExitCode::SUCCESS)
        }
        Command::Local { term } => {
            let store = LocalStore::open(&config.db_path)?;
            found(store.find(&term)?, "Pokémon")
        }
        Command::Seed { limit } => {
            let store = LocalStore::open(&config.db_path)?;
            let records = fan_out(1..=limit, config.workers, |id| {
                let service = service.clone();
                async move {
                    let key = id.to_string();
                    let detail = service.pokemon(&key).await?;
                    let species = service.species(&key).await;
                    Some(LocalPokemonRecord::from_remote(&detail, species.as_ref()))
                }
            })
            .await;
            for record in &records {
                store.upsert(record)?;
            }
            log::info!(
                "seeded {} of {limit} records into {}",
                records.len(),
                config.db_path.display()
            );
            print_json(&store.count()?)
        }
        Command::PrefetchSprites { dir } => {
            let store = LocalStore::open(&config.db_path)?;
            let dir = dir.unwrap_or_else(|| config.sprites_dir.clone());
            let report =
                prefetch_sprites(&store, transport.as_ref(), &dir, DEFAULT_DOWNLOAD_DELAY).await?;
            print_json(&report)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<ExitCode, Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(ExitCode::SUCCESS)
}

fn found<T: Serialize>(
    value: Option<T>,
    what: &str,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match value {
        Some(value) => print_json(&value),
        None => not_found(what),
    }
}

fn not_found(what: &str) -> Result<ExitCode, Box<dyn std::error::Error>> {
    eprintln!("{what} not found");
    Ok(ExitCode::FAILURE)
}
