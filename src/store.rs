//! SQLite table of flattened Pokemon records for offline use.
//!
//! The table is filled by a separate seeding step. Read paths never write,
//! apart from recording where a sprite was saved on disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::model::{PokemonDetail, SpeciesInfo};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS pokemons (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    types TEXT NOT NULL,       -- JSON array
    base_stats TEXT NOT NULL,  -- JSON object
    sprite_url TEXT,
    sprite_path_local TEXT,
    description TEXT
);

CREATE INDEX IF NOT EXISTS idx_pokemons_name ON pokemons(name COLLATE NOCASE);
"#;

const COLUMNS: &str = "id, name, types, base_stats, sprite_url, sprite_path_local, description";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalPokemonRecord {
    pub id: i64,
    pub name: String,
    pub types: Vec<String>,
    pub base_stats: BTreeMap<String, u32>,
    pub description: Option<String>,
    pub sprite_url: Option<String>,
    pub sprite_path: Option<PathBuf>,
}

/// Where a front end should load a sprite from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpriteSource {
    Local(PathBuf),
    Remote(String),
}

impl LocalPokemonRecord {
    pub fn from_remote(detail: &PokemonDetail, species: Option<&SpeciesInfo>) -> Self {
        Self {
            id: i64::from(detail.id),
            name: detail.name.clone(),
            types: detail.types.clone(),
            base_stats: detail.stats.clone(),
            description: species.and_then(|s| s.flavor_text.clone()),
            sprite_url: detail.sprites.front_default.clone(),
            sprite_path: None,
        }
    }

    /// The downloaded file when it still exists, otherwise the remote URL.
    /// Relative paths are resolved against `base_dir`.
    pub fn sprite_source(&self, base_dir: &Path) -> Option<SpriteSource> {
        if let Some(path) = &self.sprite_path {
            let full = if path.is_absolute() {
                path.clone()
            } else {
                base_dir.join(path)
            };
            if full.exists() {
                return Some(SpriteSource::Local(full));
            }
        }
        self.sprite_url.clone().map(SpriteSource::Remote)
    }
}

pub struct LocalStore {
    conn: Connection,
}

impl LocalStore {
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn upsert(&self, record: &LocalPokemonRecord) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO pokemons (id, name, types, base_stats, sprite_url, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                types = excluded.types,
                base_stats = excluded.base_stats,
                sprite_url = excluded.sprite_url,
                description = excluded.description",
            params![
                record.id,
                record.name,
                serde_json::to_string(&record.types)?,
                serde_json::to_string(&record.base_stats)?,
                record.sprite_url,
                record.description,
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, id: i64) -> StoreResult<Option<LocalPokemonRecord>> {
        let sql = format!("SELECT {COLUMNS} FROM pokemons WHERE id = ?1");
        let raw = self
            .conn
            .query_row(&sql, params![id], RawRow::from_row)
            .optional()?;
        raw.map(RawRow::into_record).transpose()
    }

    /// All-digit terms are ids; anything else is a case-insensitive name.
    pub fn find(&self, term: &str) -> StoreResult<Option<LocalPokemonRecord>> {
        let term = term.trim();
        if !term.is_empty() && term.chars().all(|c| c.is_ascii_digit()) {
            return match term.parse::<i64>() {
                Ok(id) => self.get(id),
                Err(_) => Ok(None),
            };
        }
        let sql = format!("SELECT {COLUMNS} FROM pokemons WHERE LOWER(name) = LOWER(?1)");
        let raw = self
            .conn
            .query_row(&sql, params![term], RawRow::from_row)
            .optional()?;
        raw.map(RawRow::into_record).transpose()
    }

    pub fn all(&self) -> StoreResult<Vec<LocalPokemonRecord>> {
        let sql = format!("SELECT {COLUMNS} FROM pokemons ORDER BY id ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], RawRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RawRow::into_record).collect()
    }

    /// Lowercased names in id order, for autocomplete.
    pub fn names(&self) -> StoreResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM pokemons ORDER BY id ASC")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names.into_iter().map(|name| name.to_lowercase()).collect())
    }

    pub fn count(&self) -> StoreResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM pokemons", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Returns whether a row was updated.
    pub fn set_sprite_path(&self, id: i64, path: &Path) -> StoreResult<bool> {
        let updated = self.conn.execute(
            "UPDATE pokemons SET sprite_path_local = ?1 WHERE id = ?2",
            params![path.to_string_lossy().into_owned(), id],
        )?;
        Ok(updated > 0)
    }
}

struct RawRow {
    id: i64,
    name: String,
    types: String,
    base_stats: String,
    sprite_url: Option<String>,
    sprite_path: Option<String>,
    description: Option<String>,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            types: row.get(2)?,
            base_stats: row.get(3)?,
            sprite_url: row.get(4)?,
            sprite_path: row.get(5)?,
            description: row.get(6)?,
        })
    }

    fn into_record(self) -> StoreResult<LocalPokemonRecord> {
        Ok(LocalPokemonRecord {
            id: self.id,
            name: self.name,
            types: serde_json::from_str(&self.types)?,
            base_stats: serde_json::from_str(&self.base_stats)?,
            description: self.description,
            sprite_url: self.sprite_url,
            sprite_path: self.sprite_path.map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(id: i64, name: &str) -> LocalPokemonRecord {
        LocalPokemonRecord {
            id,
            name: name.to_string(),
            types: vec!["electric".to_string()],
            base_stats: [("hp".to_string(), 35), ("speed".to_string(), 90)]
                .into_iter()
                .collect(),
            description: Some("It keeps its tail raised.".to_string()),
            sprite_url: Some(format!("https://example.test/{id}.png")),
            sprite_path: None,
        }
    }

    #[test]
    fn roundtrips_json_columns() {
        let store = LocalStore::open_in_memory().unwrap();
        let pikachu = record(25, "Pikachu");
        store.upsert(&pikachu).unwrap();
        assert_eq!(store.get(25).unwrap(), Some(pikachu));
        assert_eq!(store.get(26).unwrap(), None);
    }

    #[test]
    fn find_by_id_or_name() {
        let store = LocalStore::open_in_memory().unwrap();
        store.upsert(&record(25, "Pikachu")).unwrap();
        store.upsert(&record(26, "Raichu")).unwrap();

        assert_eq!(store.find("25").unwrap().map(|r| r.name), Some("Pikachu".to_string()));
        assert_eq!(store.find(" raichu ").unwrap().map(|r| r.id), Some(26));
        assert_eq!(store.find("pikachu' OR '1'='1").unwrap(), None);
        assert_eq!(store.find("999999999999999999999").unwrap(), None);
    }

    #[test]
    fn lists_in_id_order() {
        let store = LocalStore::open_in_memory().unwrap();
        store.upsert(&record(26, "Raichu")).unwrap();
        store.upsert(&record(25, "Pikachu")).unwrap();
        let ids: Vec<i64> = store.all().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![25, 26]);
        assert_eq!(store.names().unwrap(), vec!["pikachu", "raichu"]);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn sprite_path_survives_reseed() {
        let store = LocalStore::open_in_memory().unwrap();
        store.upsert(&record(25, "Pikachu")).unwrap();
        assert!(store.set_sprite_path(25, Path::new("sprites/25.png")).unwrap());
        assert!(!store.set_sprite_path(99, Path::new("sprites/99.png")).unwrap());

        store.upsert(&record(25, "Pikachu")).unwrap();
        assert_eq!(
            store.get(25).unwrap().and_then(|r| r.sprite_path),
            Some(PathBuf::from("sprites/25.png"))
        );
    }

    #[test]
    fn sprite_source_prefers_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut pikachu = record(25, "Pikachu");
        pikachu.sprite_path = Some(PathBuf::from("25.png"));
        assert_eq!(
            pikachu.sprite_source(dir.path()),
            Some(SpriteSource::Remote("https://example.test/25.png".to_string()))
        );

        std::fs::write(dir.path().join("25.png"), b"png").unwrap();
        assert_eq!(
            pikachu.sprite_source(dir.path()),
            Some(SpriteSource::Local(dir.path().join("25.png")))
        );
    }
}
