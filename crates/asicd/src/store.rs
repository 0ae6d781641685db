//! Durable state store.
//!
//! The daemon is the only writer of persisted switch state. The layout
//! mirrors the external KV schema: per switch one object-state table
//! (`ASIC_STATE`) mapping serialized keys to attribute field maps, the two
//! identifier hashes (`VIDTORID`, `RIDTOVID`), the discovered-default
//! handles (`HIDDEN`) and the cold-boot VID set (`COLDVIDS`). A pending
//! temporary view lives under the same schema with a `TEMP_` table prefix.

use std::collections::HashMap;
use std::sync::Mutex;

use asic_model::{IdMap, ModelError, ObjectId};
use asic_view::{AsicView, ViewError};

/// Object state table name.
pub const ASIC_STATE: &str = "ASIC_STATE";
/// VID to RID hash name.
pub const VIDTORID: &str = "VIDTORID";
/// RID to VID hash name.
pub const RIDTOVID: &str = "RIDTOVID";
/// Discovered default handles, keyed by switch attribute name.
pub const HIDDEN: &str = "HIDDEN";
/// Cold-boot VID set.
pub const COLDVIDS: &str = "COLDVIDS";
/// Prefix of the temporary-view tables during a two-phase apply.
pub const TEMP_PREFIX: &str = "TEMP_";

/// Abstract durable store: tables of keys carrying field/value maps.
pub trait StateStore: Send + Sync {
    /// Replace the full field map of one key.
    fn put(&self, table: &str, key: &str, fields: Vec<(String, String)>);

    /// Set a single field of one key, creating the key if absent.
    fn put_field(&self, table: &str, key: &str, field: &str, value: &str);

    /// Read the field map of one key.
    fn get(&self, table: &str, key: &str) -> Option<Vec<(String, String)>>;

    /// Delete one key.
    fn del(&self, table: &str, key: &str);

    /// All keys of a table.
    fn keys(&self, table: &str) -> Vec<String>;

    /// Full dump of a table.
    fn dump(&self, table: &str) -> Vec<(String, Vec<(String, String)>)>;

    /// Drop a table entirely.
    fn clear(&self, table: &str);
}

/// In-memory store used by tests and the standalone daemon profile.
#[derive(Debug, Default)]
pub struct MemStore {
    tables: Mutex<HashMap<String, HashMap<String, Vec<(String, String)>>>>,
}

impl MemStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemStore {
    fn put(&self, table: &str, key: &str, fields: Vec<(String, String)>) {
        let mut tables = self.tables.lock().unwrap();
        tables
            .entry(table.to_string())
            .or_default()
            .insert(key.to_string(), fields);
    }

    fn put_field(&self, table: &str, key: &str, field: &str, value: &str) {
        let mut tables = self.tables.lock().unwrap();
        let fields = tables
            .entry(table.to_string())
            .or_default()
            .entry(key.to_string())
            .or_default();
        match fields.iter_mut().find(|(name, _)| name == field) {
            Some((_, slot)) => *slot = value.to_string(),
            None => fields.push((field.to_string(), value.to_string())),
        }
    }

    fn get(&self, table: &str, key: &str) -> Option<Vec<(String, String)>> {
        self.tables.lock().unwrap().get(table)?.get(key).cloned()
    }

    fn del(&self, table: &str, key: &str) {
        if let Some(t) = self.tables.lock().unwrap().get_mut(table) {
            t.remove(key);
        }
    }

    fn keys(&self, table: &str) -> Vec<String> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn dump(&self, table: &str) -> Vec<(String, Vec<(String, String)>)> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .map(|t| t.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    fn clear(&self, table: &str) {
        self.tables.lock().unwrap().remove(table);
    }
}

/// Persist a view's objects into an object-state table, replacing its
/// previous contents.
pub fn save_view(store: &dyn StateStore, table: &str, view: &AsicView) {
    store.clear(table);
    for (key, fields) in view.to_records() {
        store.put(table, &key, fields);
    }
}

/// Hydrate a view from an object-state table.
pub fn load_view(store: &dyn StateStore, table: &str) -> Result<AsicView, ViewError> {
    AsicView::from_records(store.dump(table))
}

/// Persist the identifier map into both hashes.
pub fn save_id_map(store: &dyn StateStore, prefix: &str, map: &IdMap) {
    let vid_table = format!("{prefix}{VIDTORID}");
    let rid_table = format!("{prefix}{RIDTOVID}");
    store.clear(&vid_table);
    store.clear(&rid_table);
    for (vid, rid) in map.iter() {
        store.put_field(&vid_table, &vid.to_string(), "rid", &rid.to_string());
        store.put_field(&rid_table, &rid.to_string(), "vid", &vid.to_string());
    }
}

/// Load the identifier map, verifying both hashes are mutual inverses.
/// Any inconsistency is fatal for startup.
pub fn load_id_map(store: &dyn StateStore, prefix: &str) -> Result<IdMap, ModelError> {
    let vid_table = format!("{prefix}{VIDTORID}");
    let rid_table = format!("{prefix}{RIDTOVID}");

    let parse_pairs = |table: &str| -> Result<Vec<(ObjectId, ObjectId)>, ModelError> {
        store
            .dump(table)
            .into_iter()
            .map(|(key, fields)| {
                let value = fields
                    .first()
                    .map(|(_, v)| v.clone())
                    .unwrap_or_default();
                Ok((key.parse()?, value.parse()?))
            })
            .collect()
    };

    let map = IdMap::from_pairs(parse_pairs(&vid_table)?)?;
    map.verify_inverse(parse_pairs(&rid_table)?)?;
    Ok(map)
}

/// Persist the cold-boot VID set.
pub fn save_cold_vids<'a>(store: &dyn StateStore, vids: impl IntoIterator<Item = &'a ObjectId>) {
    store.clear(COLDVIDS);
    for vid in vids {
        store.put_field(COLDVIDS, &vid.to_string(), "present", "1");
    }
}

/// Load the cold-boot VID set.
pub fn load_cold_vids(store: &dyn StateStore) -> Result<Vec<ObjectId>, ModelError> {
    store
        .keys(COLDVIDS)
        .into_iter()
        .map(|key| key.parse())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use asic_model::ObjectType;

    #[test]
    fn test_put_get_roundtrip() {
        let store = MemStore::new();
        store.put(
            ASIC_STATE,
            "SAI_OBJECT_TYPE_PORT:oid:0x1",
            vec![("SAI_PORT_ATTR_SPEED".to_string(), "40000".to_string())],
        );
        let fields = store.get(ASIC_STATE, "SAI_OBJECT_TYPE_PORT:oid:0x1").unwrap();
        assert_eq!(fields.len(), 1);
        assert!(store.get(ASIC_STATE, "missing").is_none());
    }

    #[test]
    fn test_put_field_updates_in_place() {
        let store = MemStore::new();
        store.put_field(ASIC_STATE, "k", "f", "1");
        store.put_field(ASIC_STATE, "k", "f", "2");
        store.put_field(ASIC_STATE, "k", "g", "3");
        let fields = store.get(ASIC_STATE, "k").unwrap();
        assert_eq!(fields.len(), 2);
        assert!(fields.contains(&("f".to_string(), "2".to_string())));
    }

    #[test]
    fn test_id_map_persistence_roundtrip() {
        let store = MemStore::new();
        let vid = ObjectId::encode(0, ObjectType::Port, 1).unwrap();
        let rid = ObjectId(0x1_0000_0001);
        let map = IdMap::from_pairs([(vid, rid)]).unwrap();

        save_id_map(&store, "", &map);
        let loaded = load_id_map(&store, "").unwrap();
        assert_eq!(loaded.rid(vid), Some(rid));
        assert_eq!(loaded.vid(rid), Some(vid));
    }

    #[test]
    fn test_inconsistent_id_hashes_rejected() {
        let store = MemStore::new();
        let vid = ObjectId::encode(0, ObjectType::Port, 1).unwrap();
        store.put_field(VIDTORID, &vid.to_string(), "rid", "oid:0x99");
        // Reverse hash points somewhere else entirely.
        store.put_field(RIDTOVID, "oid:0x99", "vid", "oid:0x123");
        assert!(load_id_map(&store, "").is_err());
    }

    #[test]
    fn test_cold_vids_roundtrip() {
        let store = MemStore::new();
        let vids = vec![
            ObjectId::encode(0, ObjectType::Port, 1).unwrap(),
            ObjectId::encode(0, ObjectType::Queue, 7).unwrap(),
        ];
        save_cold_vids(&store, &vids);
        let mut loaded = load_cold_vids(&store).unwrap();
        loaded.sort();
        let mut expected = vids.clone();
        expected.sort();
        assert_eq!(loaded, expected);
    }
}
