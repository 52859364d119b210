// 🕘 Search History - last 5 successful lookups per document type
//
// Most recent first, one entry per key. Persisted as a JSON array in the
// kv_store table so the list survives between runs.

use crate::db;
use crate::documents::RegistryNumber;
use crate::entities::Address;
use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub const MAX_ENTRIES: usize = 5;
pub const CEP_HISTORY_KEY: &str = "cep-history";
pub const CNPJ_HISTORY_KEY: &str = "cnpj-history";

/// Something that can be remembered in a search history
pub trait HistoryEntry: Serialize + DeserializeOwned + Clone {
    /// kv_store key holding the list
    const STORAGE_KEY: &'static str;

    /// Entries with the same key replace each other
    fn history_key(&self) -> String;
}

/// Postal-code lookups remember the whole address
impl HistoryEntry for Address {
    const STORAGE_KEY: &'static str = CEP_HISTORY_KEY;

    fn history_key(&self) -> String {
        self.cep_digits()
    }
}

/// Registry-number lookups remember only the digits
impl HistoryEntry for RegistryNumber {
    const STORAGE_KEY: &'static str = CNPJ_HISTORY_KEY;

    fn history_key(&self) -> String {
        self.digits().to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHistory<T> {
    entries: Vec<T>,
}

impl<T> Default for SearchHistory<T> {
    fn default() -> Self {
        SearchHistory {
            entries: Vec::new(),
        }
    }
}

impl<T: HistoryEntry> SearchHistory<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a stored list, re-applying dedupe and the cap
    pub fn from_entries(entries: Vec<T>) -> Self {
        let mut history = Self::new();
        for entry in entries.into_iter().rev() {
            history.record(entry);
        }
        history
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn most_recent(&self) -> Option<&T> {
        self.entries.first()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.history_key() == key)
    }

    /// Move `entry` to the front, dropping any older entry with its key
    pub fn record(&mut self, entry: T) {
        let key = entry.history_key();
        self.entries.retain(|e| e.history_key() != key);
        self.entries.insert(0, entry);
        self.entries.truncate(MAX_ENTRIES);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    /// Stored list, or an empty history when nothing (or garbage) is stored
    pub fn load(conn: &Connection) -> Result<Self> {
        let raw = match db::kv_get(conn, T::STORAGE_KEY)? {
            Some(raw) => raw,
            None => return Ok(Self::new()),
        };

        match serde_json::from_str::<Vec<T>>(&raw) {
            Ok(entries) => Ok(Self::from_entries(entries)),
            Err(e) => {
                tracing::warn!(key = T::STORAGE_KEY, error = %e, "discarding unreadable history");
                Ok(Self::new())
            }
        }
    }

    pub fn save(&self, conn: &Connection) -> Result<()> {
        let json = serde_json::to_string(&self.entries)
            .with_context(|| format!("Failed to serialize {}", T::STORAGE_KEY))?;
        db::kv_put(conn, T::STORAGE_KEY, &json)
    }

    /// Empty the list and remove it from storage
    pub fn clear_stored(&mut self, conn: &Connection) -> Result<()> {
        self.clear();
        db::kv_delete(conn, T::STORAGE_KEY)?;
        Ok(())
    }
}

/// Load, record, save
pub fn remember<T: HistoryEntry>(conn: &Connection, entry: T) -> Result<SearchHistory<T>> {
    let mut history = SearchHistory::<T>::load(conn)?;
    history.record(entry);
    history.save(conn)?;
    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;
    use crate::documents::registry_number;

    fn address(cep: &str, city: &str) -> Address {
        Address {
            cep: cep.to_string(),
            city: city.to_string(),
            ..Default::default()
        }
    }

    fn cnpj(raw: &str) -> RegistryNumber {
        registry_number::validate(raw).unwrap()
    }

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_most_recent_first_and_deduplicated() {
        let mut history = SearchHistory::new();
        history.record(address("01310100", "São Paulo"));
        history.record(address("70040010", "Brasília"));
        history.record(address("01310100", "São Paulo (again)"));

        let keys: Vec<String> = history.entries().iter().map(|a| a.history_key()).collect();
        assert_eq!(keys, vec!["01310100", "70040010"]);
        assert_eq!(history.most_recent().unwrap().city, "São Paulo (again)");
    }

    #[test]
    fn test_capped_at_five() {
        let mut history = SearchHistory::new();
        for i in 0..7 {
            history.record(address(&format!("0000000{}", i), "X"));
        }

        assert_eq!(history.len(), MAX_ENTRIES);
        assert_eq!(history.most_recent().unwrap().cep, "00000006");
        assert!(!history.contains_key("00000000"));
        assert!(!history.contains_key("00000001"));
        assert!(history.contains_key("00000002"));
    }

    #[test]
    fn test_formatted_and_clean_keys_collide() {
        let mut history = SearchHistory::new();
        history.record(address("01310-100", "A"));
        history.record(address("01310100", "B"));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_persistence_round_trip() {
        let conn = memory_db();

        let history = remember(&conn, cnpj("11.222.333/0001-81")).unwrap();
        assert_eq!(history.len(), 1);
        remember(&conn, cnpj("00000000000191")).unwrap();
        remember(&conn, cnpj("11222333000181")).unwrap();

        let stored = db::kv_get(&conn, CNPJ_HISTORY_KEY).unwrap().unwrap();
        assert_eq!(stored, r#"["11222333000181","00000000000191"]"#);

        let loaded = SearchHistory::<RegistryNumber>::load(&conn).unwrap();
        assert_eq!(loaded.entries()[0].digits(), "11222333000181");
    }

    #[test]
    fn test_address_history_stores_full_record() {
        let conn = memory_db();
        remember(&conn, address("01310100", "São Paulo")).unwrap();

        let loaded = SearchHistory::<Address>::load(&conn).unwrap();
        assert_eq!(loaded.entries()[0].city, "São Paulo");
        assert!(db::kv_get(&conn, CEP_HISTORY_KEY).unwrap().unwrap().contains("São Paulo"));
    }

    #[test]
    fn test_unreadable_history_loads_empty() {
        let conn = memory_db();
        db::kv_put(&conn, CNPJ_HISTORY_KEY, "not json").unwrap();
        assert!(SearchHistory::<RegistryNumber>::load(&conn).unwrap().is_empty());

        // One invalid number poisons the list, which is discarded as a whole
        db::kv_put(&conn, CNPJ_HISTORY_KEY, r#"["11111111111111"]"#).unwrap();
        assert!(SearchHistory::<RegistryNumber>::load(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_clear_stored() {
        let conn = memory_db();
        let mut history = remember(&conn, cnpj("00000000000191")).unwrap();
        history.clear_stored(&conn).unwrap();

        assert!(history.is_empty());
        assert_eq!(db::kv_get(&conn, CNPJ_HISTORY_KEY).unwrap(), None);
    }

    #[test]
    fn test_from_entries_keeps_order() {
        let history = SearchHistory::from_entries(vec![
            cnpj("11222333000181"),
            cnpj("00000000000191"),
            cnpj("11222333000181"),
        ]);
        let keys: Vec<&str> = history.entries().iter().map(|c| c.digits()).collect();
        assert_eq!(keys, vec!["11222333000181", "00000000000191"]);
    }
}
