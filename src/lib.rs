//! Pokedex cache - a memoizing fetch layer over PokeAPI.
//!
//! The library exposes the service object used by the CLI and by any other
//! front end, plus the translation, assistant and offline store helpers.

pub mod agent;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod fanout;
pub mod model;
pub mod normalize;
pub mod service;
pub mod sprites;
pub mod stats;
pub mod store;
pub mod translate;

pub use client::{HttpTransport, RemoteClient, Transport};
pub use config::{CacheCapacities, Config};
pub use error::{LookupError, NormalizeError, RemoteError, StoreError};
pub use service::PokeService;
