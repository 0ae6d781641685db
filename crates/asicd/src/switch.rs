//! Per-switch bookkeeping: the discovery snapshot, the hidden default
//! handles and the cold-boot VID set.

use std::collections::{HashMap, HashSet};

use tracing::info;

use asic_driver::{Driver, DriverError};
use asic_model::{IdMap, ModelError, ObjectId, Rid, Vid, VidAllocator};
use asic_view::ViewError;

use crate::discovery::{self, Discovery};
use crate::store::{self, StateStore, ASIC_STATE, HIDDEN};

/// Switch attribute names whose discovered values are persisted as hidden
/// handles.
const HIDDEN_ATTRS: &[&str] = &[
    "SAI_SWITCH_ATTR_CPU_PORT",
    "SAI_SWITCH_ATTR_DEFAULT_VIRTUAL_ROUTER_ID",
    "SAI_SWITCH_ATTR_DEFAULT_TRAP_GROUP",
    "SAI_SWITCH_ATTR_DEFAULT_STP_INST_ID",
    "SAI_SWITCH_ATTR_DEFAULT_VLAN_ID",
];

/// Errors raised during switch bring-up.
#[derive(Debug, thiserror::Error)]
pub enum SwitchError {
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    View(#[from] ViewError),

    #[error("switch state error: {0}")]
    State(String),
}

/// One initialised switch as seen by the daemon.
#[derive(Debug)]
pub struct SaiSwitch {
    switch_rid: Rid,
    discovery: Discovery,
    hidden: HashMap<&'static str, Rid>,
    cold_vids: HashSet<Vid>,
}

impl SaiSwitch {
    /// Initialise the driver and walk the default objects. No persisted
    /// state is touched; follow with [`SaiSwitch::seed_cold`] on a cold
    /// boot or a hard reinit on a warm one.
    pub fn probe(driver: &dyn Driver) -> Result<SaiSwitch, SwitchError> {
        let switch_rid = driver.initialize()?;
        let discovery = discovery::discover(driver, switch_rid)?;

        let registry = asic_meta::Registry::global();
        let mut hidden = HashMap::new();
        if let Some(defaults) = discovery.default_oid_map.get(&switch_rid) {
            for name in HIDDEN_ATTRS {
                let id = registry
                    .by_name(name)
                    .map_err(|e| SwitchError::State(e.to_string()))?
                    .1
                    .id;
                if let Some((_, value)) = defaults.iter().find(|(a, _)| *a == id) {
                    if let asic_model::AttrValue::Oid(rid) = value {
                        hidden.insert(*name, *rid);
                    }
                }
            }
        }

        Ok(SaiSwitch {
            switch_rid,
            discovery,
            hidden,
            cold_vids: HashSet::new(),
        })
    }

    /// Cold boot: assign a fresh VID to every discovered object, mirror
    /// placeholder records into the object-state table and persist the
    /// identifier hashes, hidden handles and the cold-boot VID set.
    pub fn seed_cold(
        &mut self,
        driver: &dyn Driver,
        store: &dyn StateStore,
        allocator: &mut VidAllocator,
    ) -> Result<IdMap, SwitchError> {
        let mut id_map = IdMap::new();

        for &rid in &self.discovery.discovered {
            let ot = driver.object_type_of(rid)?;
            let vid = allocator.allocate(ot)?;
            id_map.bind(vid, rid)?;
            // Placeholder record so later view loads see the object.
            store.put(
                ASIC_STATE,
                &format!("{}:{vid}", ot.name()),
                vec![("NULL".to_string(), "NULL".to_string())],
            );
            self.cold_vids.insert(vid);
        }

        for (name, rid) in &self.hidden {
            store.put_field(HIDDEN, name, "rid", &rid.to_string());
        }
        store::save_cold_vids(store, &self.cold_vids);
        store::save_id_map(store, "", &id_map);

        info!(
            objects = self.cold_vids.len(),
            "cold boot state seeded from discovery"
        );
        Ok(id_map)
    }

    /// Warm start: adopt the cold-boot VID set persisted by the original
    /// cold boot.
    pub fn load_cold_vids(&mut self, store: &dyn StateStore) -> Result<(), SwitchError> {
        self.cold_vids = store::load_cold_vids(store)?.into_iter().collect();
        Ok(())
    }

    /// The switch RID, root of the discovery walk.
    #[must_use]
    pub fn switch_rid(&self) -> Rid {
        self.switch_rid
    }

    /// The discovery snapshot.
    #[must_use]
    pub fn discovery(&self) -> &Discovery {
        &self.discovery
    }

    /// Whether a RID was materialised by the driver at init.
    #[must_use]
    pub fn is_discovered(&self, rid: Rid) -> bool {
        self.discovery.contains(rid)
    }

    /// A discovered default handle by switch attribute name.
    #[must_use]
    pub fn hidden(&self, attr_name: &str) -> Option<Rid> {
        self.hidden.get(attr_name).copied()
    }

    /// The cold-boot VID set; these objects are non-removable.
    #[must_use]
    pub fn cold_vids(&self) -> &HashSet<ObjectId> {
        &self.cold_vids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asic_driver::vs::VirtualSwitch;
    use asic_model::ObjectType;
    use crate::store::MemStore;

    #[test]
    fn test_probe_collects_hidden_handles() {
        let driver = VirtualSwitch::new();
        let switch = SaiSwitch::probe(&driver).unwrap();
        for name in HIDDEN_ATTRS {
            assert!(switch.hidden(name).is_some(), "{name} missing");
        }
        assert_eq!(
            driver.object_type_of(switch.switch_rid()).unwrap(),
            ObjectType::Switch
        );
    }

    #[test]
    fn test_seed_cold_persists_consistent_state() {
        let driver = VirtualSwitch::new();
        let store = MemStore::new();
        let mut allocator = VidAllocator::new(0);
        let mut switch = SaiSwitch::probe(&driver).unwrap();
        let id_map = switch.seed_cold(&driver, &store, &mut allocator).unwrap();

        // One record and one binding per discovered object.
        assert_eq!(id_map.len(), switch.discovery().discovered.len());
        assert_eq!(store.keys(ASIC_STATE).len(), id_map.len());

        // The persisted hashes reload as a verified bijection.
        let reloaded = store::load_id_map(&store, "").unwrap();
        assert_eq!(reloaded.len(), id_map.len());

        // Every vid decodes to the type of the object it maps to.
        for (vid, rid) in id_map.iter() {
            assert_eq!(
                vid.object_type().unwrap(),
                driver.object_type_of(rid).unwrap()
            );
            assert!(switch.cold_vids().contains(&vid));
        }

        // The persisted view loads cleanly.
        let view = store::load_view(&store, ASIC_STATE).unwrap();
        assert_eq!(view.len(), id_map.len());
    }
}
