//! Hard reinit: replay a persisted view against a freshly initialised
//! driver.
//!
//! Runs on cold process start when a fully populated persisted view
//! exists. Objects that the fresh driver materialised itself (the
//! discovered default set, whose RIDs are stable across restarts) are not
//! recreated; they only receive SETs for persisted attributes that differ
//! from the freshly discovered values. Everything else is created in
//! dependency order by translating VIDs recursively, default routes before
//! more specific ones.
//!
//! A failure aborts the whole process after dumping the offending object's
//! attribute list; partial recovery is not attempted.

use std::collections::{HashMap, HashSet};

use tracing::{error, info};

use asic_driver::{Attr, Driver, DriverError};
use asic_meta::{MetaError, Mutability, Registry};
use asic_model::{EntryKey, IdMap, ModelError, ObjectId, ObjectType, Rid, Vid};
use asic_view::ViewError;

use crate::discovery::MAX_OID_LIST;
use crate::store::{self, StateStore, ASIC_STATE};
use crate::switch::SaiSwitch;

/// Errors aborting a hard reinit.
#[derive(Debug, thiserror::Error)]
pub enum ReinitError {
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Meta(#[from] MetaError),

    #[error(transparent)]
    View(#[from] ViewError),

    #[error("inconsistent persisted state: {0}")]
    State(String),
}

/// Replay the persisted view. Returns the re-established identifier map,
/// which is also written back to the store.
pub fn hard_reinit(
    driver: &dyn Driver,
    store: &dyn StateStore,
    switch: &SaiSwitch,
) -> Result<IdMap, ReinitError> {
    let old_map = store::load_id_map(store, "")?;

    let mut oid_records: HashMap<Vid, (ObjectType, Vec<(String, String)>)> = HashMap::new();
    let mut entry_records: Vec<(ObjectType, String, Vec<(String, String)>)> = Vec::new();

    for (key, fields) in store.dump(ASIC_STATE) {
        let (type_name, id) = key
            .split_once(':')
            .ok_or_else(|| ReinitError::State(format!("malformed key {key:?}")))?;
        let ot = ObjectType::from_name(type_name)?;
        if ot.is_entry() {
            entry_records.push((ot, id.to_string(), fields));
        } else {
            let vid: Vid = id.parse()?;
            oid_records.insert(vid, (ot, fields));
        }
    }

    let mut ctx = Replay {
        driver,
        switch,
        old_map,
        oid_records,
        translated: IdMap::new(),
        in_progress: HashSet::new(),
    };

    // Oid objects in deterministic order; dependencies resolve through
    // recursion regardless of the sweep order.
    let mut vids: Vec<Vid> = ctx.oid_records.keys().copied().collect();
    vids.sort();
    for vid in vids {
        ctx.translate_vid(vid)?;
    }

    // Entries: fdbs and neighbors first, then the remaining kinds, then
    // routes with every default route ahead of the specific ones.
    let entry_order = |ot: ObjectType| match ot {
        ObjectType::FdbEntry => 0,
        ObjectType::NeighborEntry => 1,
        ObjectType::RouteEntry => 4,
        _ => 2,
    };
    let is_default_route = |ot: ObjectType, id: &str| -> Result<bool, ReinitError> {
        if ot != ObjectType::RouteEntry {
            return Ok(false);
        }
        match EntryKey::from_canon(ot, id)? {
            EntryKey::Route { dest, .. } => Ok(dest.is_default()),
            _ => Ok(false),
        }
    };
    let mut ordered: Vec<(u8, ObjectType, String, Vec<(String, String)>)> = Vec::new();
    for (ot, id, fields) in entry_records {
        let rank = if is_default_route(ot, &id)? {
            3
        } else {
            entry_order(ot)
        };
        ordered.push((rank, ot, id, fields));
    }
    ordered.sort_by(|a, b| (a.0, &a.2).cmp(&(b.0, &b.2)));
    for (_, ot, id, fields) in ordered {
        ctx.replay_entry(ot, &id, fields)?;
    }

    // Every historical binding must have been translated.
    for (vid, _) in ctx.old_map.iter() {
        if ctx.translated.rid(vid).is_none() {
            return Err(ReinitError::State(format!(
                "vid {vid} from the persisted map was not translated"
            )));
        }
    }

    store::save_id_map(store, "", &ctx.translated);
    info!(objects = ctx.translated.len(), "hard reinit complete");
    Ok(ctx.translated)
}

struct Replay<'a> {
    driver: &'a dyn Driver,
    switch: &'a SaiSwitch,
    old_map: IdMap,
    oid_records: HashMap<Vid, (ObjectType, Vec<(String, String)>)>,
    translated: IdMap,
    in_progress: HashSet<Vid>,
}

impl Replay<'_> {
    /// Parse and translate the persisted attributes of one record,
    /// creating referenced objects first. Read-only attributes and the
    /// placeholder sentinel are dropped.
    fn build_attrs(&mut self, fields: &[(String, String)]) -> Result<Vec<Attr>, ReinitError> {
        let registry = Registry::global();
        let mut attrs = Vec::new();
        for (name, value) in fields {
            if name == "NULL" {
                continue;
            }
            let meta = registry.by_name(name)?.1;
            if meta.is_read_only() {
                continue;
            }
            let mut value = meta.deserialize_value(value)?;
            value.map_oids(|vid| self.translate_vid(vid))?;
            attrs.push(Attr::new(meta, value));
        }
        Ok(attrs)
    }

    fn dump_failed(&self, what: &str, attrs: &[Attr]) {
        error!(object = what, "replay failed, attribute dump follows");
        for attr in attrs {
            error!(
                attr = attr.meta.name,
                value = %attr.meta.serialize_value(&attr.value),
                "failed object attribute"
            );
        }
    }

    /// Translate one VID into a live RID, creating the object if the
    /// driver did not materialise it itself.
    fn translate_vid(&mut self, vid: Vid) -> Result<Rid, ReinitError> {
        if vid.is_null() {
            return Ok(ObjectId::NULL);
        }
        if let Some(rid) = self.translated.rid(vid) {
            return Ok(rid);
        }
        if !self.in_progress.insert(vid) {
            return Err(ReinitError::State(format!(
                "reference cycle through vid {vid}"
            )));
        }

        let (ot, fields) = self
            .oid_records
            .get(&vid)
            .cloned()
            .ok_or_else(|| ReinitError::State(format!("vid {vid} has no persisted record")))?;
        let old_rid = self
            .old_map
            .rid(vid)
            .ok_or_else(|| ReinitError::State(format!("vid {vid} missing from persisted map")))?;

        let attrs = self.build_attrs(&fields)?;

        let rid = if self.switch.is_discovered(old_rid) {
            self.refresh_discovered(old_rid, &attrs)?;
            old_rid
        } else if ot == ObjectType::TrapGroup {
            self.create_trap_group(&attrs)?
        } else {
            match self.driver.create(ot, &attrs) {
                Ok(rid) => rid,
                Err(err) => {
                    self.dump_failed(&format!("{}:{vid}", ot.name()), &attrs);
                    return Err(err.into());
                }
            }
        };

        self.translated.bind(vid, rid)?;
        self.in_progress.remove(&vid);
        Ok(rid)
    }

    /// Driver-materialised object: issue SETs only for persisted values
    /// that differ from what the fresh driver reports.
    fn refresh_discovered(&self, rid: Rid, attrs: &[Attr]) -> Result<(), ReinitError> {
        for attr in attrs {
            if attr.meta.mutability != Mutability::CreateAndSet {
                continue;
            }
            let live = self
                .driver
                .get(rid, &[attr.meta.id], MAX_OID_LIST)
                .ok()
                .and_then(|mut v| v.pop().map(|a| a.value));
            if live.as_ref() == Some(&attr.value) {
                continue;
            }
            self.driver.set(rid, attr)?;
        }
        Ok(())
    }

    /// Vendor quirk: a trap group must be created with its queue attribute
    /// alone, every other attribute applied one by one afterwards.
    fn create_trap_group(&self, attrs: &[Attr]) -> Result<Rid, ReinitError> {
        let queue = attrs
            .iter()
            .find(|a| a.meta.name == "SAI_HOSTIF_TRAP_GROUP_ATTR_QUEUE")
            .cloned()
            .ok_or_else(|| {
                ReinitError::State("trap group record is missing its queue attribute".to_string())
            })?;
        let rid = self.driver.create(ObjectType::TrapGroup, &[queue.clone()])?;
        for attr in attrs {
            if attr.meta.id == queue.meta.id {
                continue;
            }
            if attr.meta.mutability != Mutability::CreateAndSet {
                continue;
            }
            self.driver.set(rid, attr)?;
        }
        Ok(rid)
    }

    /// Recreate one structured entry with its key and attributes
    /// translated.
    fn replay_entry(
        &mut self,
        ot: ObjectType,
        id: &str,
        fields: Vec<(String, String)>,
    ) -> Result<(), ReinitError> {
        let mut key = EntryKey::from_canon(ot, id)?;
        key.map_oids(|vid| self.translate_vid(vid))?;
        let attrs = self.build_attrs(&fields)?;
        if let Err(err) = self.driver.create_entry(&key, &attrs) {
            self.dump_failed(&format!("{}:{id}", ot.name()), &attrs);
            return Err(err.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asic_driver::vs::{VirtualSwitch, DEFAULT_PORT_SPEED};
    use asic_model::{AttrValue, VidAllocator};
    use crate::store::MemStore;

    fn attr_meta(name: &str) -> &'static asic_meta::AttrMeta {
        Registry::global().by_name(name).unwrap().1
    }

    /// Cold boot into a fresh store; returns the store and the seed map.
    fn cold_boot(store: &MemStore) -> IdMap {
        let driver = VirtualSwitch::new();
        let mut allocator = VidAllocator::new(0);
        let mut switch = SaiSwitch::probe(&driver).unwrap();
        switch.seed_cold(&driver, store, &mut allocator).unwrap()
    }

    fn find_vid(map: &IdMap, driver: &VirtualSwitch, ot: ObjectType) -> (Vid, Rid) {
        map.iter()
            .find(|(_, rid)| driver.object_type_of(*rid).unwrap() == ot)
            .unwrap()
    }

    #[test]
    fn test_reinit_reuses_discovered_rids_and_applies_diffs() {
        let store = MemStore::new();
        let seed_map = cold_boot(&store);

        // Persist a speed differing from the discovered default on one
        // front-panel port.
        let probe = VirtualSwitch::new();
        probe.initialize().unwrap();
        let (port_vid, port_rid) = seed_map
            .iter()
            .find(|(_, rid)| {
                probe.object_type_of(*rid).unwrap() == ObjectType::Port
                    && probe
                        .get(*rid, &[attr_meta("SAI_PORT_ATTR_HW_LANE_LIST").id], 64)
                        .is_ok()
            })
            .unwrap();
        store.put_field(
            ASIC_STATE,
            &format!("{}:{port_vid}", ObjectType::Port.name()),
            "SAI_PORT_ATTR_SPEED",
            "40000",
        );

        // Fresh driver, same deterministic rid sequence.
        let driver = VirtualSwitch::new();
        let mut switch = SaiSwitch::probe(&driver).unwrap();
        switch.load_cold_vids(&store).unwrap();

        let new_map = hard_reinit(&driver, &store, &switch).unwrap();

        // Same bindings as before: nothing was created.
        assert_eq!(new_map.len(), seed_map.len());
        for (vid, rid) in seed_map.iter() {
            assert_eq!(new_map.rid(vid), Some(rid));
        }

        // The differing speed was applied, other ports kept the default.
        let speed = driver
            .get(port_rid, &[attr_meta("SAI_PORT_ATTR_SPEED").id], 16)
            .unwrap();
        assert_eq!(speed[0].value, AttrValue::U32(40000));
        let (_, other_port_rid) = new_map
            .iter()
            .find(|(_, rid)| {
                *rid != port_rid && driver.object_type_of(*rid).unwrap() == ObjectType::Port
            })
            .unwrap();
        if let Ok(other) = driver.get(other_port_rid, &[attr_meta("SAI_PORT_ATTR_SPEED").id], 16)
        {
            assert_eq!(other[0].value, AttrValue::U32(DEFAULT_PORT_SPEED));
        }
    }

    #[test]
    fn test_reinit_creates_persisted_objects_and_routes() {
        let store = MemStore::new();
        let mut seed_map = cold_boot(&store);

        let probe = VirtualSwitch::new();
        probe.initialize().unwrap();
        let (switch_vid, _) = find_vid(&seed_map, &probe, ObjectType::Switch);
        let (vr_vid, _) = find_vid(&seed_map, &probe, ObjectType::VirtualRouter);

        // A non-default virtual router persisted from the previous life,
        // bound to a rid the fresh driver will not recognise.
        let new_vr_vid = ObjectId::encode(0, ObjectType::VirtualRouter, 100).unwrap();
        seed_map.bind(new_vr_vid, ObjectId(0xdddd)).unwrap();
        store::save_id_map(&store, "", &seed_map);
        store.put(
            ASIC_STATE,
            &format!("{}:{new_vr_vid}", ObjectType::VirtualRouter.name()),
            vec![(
                "SAI_VIRTUAL_ROUTER_ATTR_ADMIN_V4_STATE".to_string(),
                "false".to_string(),
            )],
        );

        // A default route and a specific route on the default VR.
        let default_route = EntryKey::Route {
            switch_id: switch_vid,
            vr_id: vr_vid,
            dest: "0.0.0.0/0".parse().unwrap(),
        };
        let specific_route = EntryKey::Route {
            switch_id: switch_vid,
            vr_id: vr_vid,
            dest: "10.0.0.0/24".parse().unwrap(),
        };
        for key in [&default_route, &specific_route] {
            store.put(
                ASIC_STATE,
                &format!("{}:{}", ObjectType::RouteEntry.name(), key.to_canon()),
                vec![(
                    "SAI_ROUTE_ENTRY_ATTR_PACKET_ACTION".to_string(),
                    "SAI_PACKET_ACTION_FORWARD".to_string(),
                )],
            );
        }

        let driver = VirtualSwitch::new();
        let mut switch = SaiSwitch::probe(&driver).unwrap();
        switch.load_cold_vids(&store).unwrap();
        let new_map = hard_reinit(&driver, &store, &switch).unwrap();

        // The new VR was created under a fresh rid.
        let new_vr_rid = new_map.rid(new_vr_vid).unwrap();
        assert_ne!(new_vr_rid, ObjectId(0xdddd));
        assert_eq!(
            driver.object_type_of(new_vr_rid).unwrap(),
            ObjectType::VirtualRouter
        );
        let state = driver
            .get(
                new_vr_rid,
                &[attr_meta("SAI_VIRTUAL_ROUTER_ATTR_ADMIN_V4_STATE").id],
                16,
            )
            .unwrap();
        assert_eq!(state[0].value, AttrValue::Bool(false));

        // Both routes exist with their keys translated to rids.
        for key in [&default_route, &specific_route] {
            let mut driver_key = key.clone();
            driver_key
                .map_oids(|vid| new_map.rid(vid).ok_or(()))
                .unwrap();
            driver
                .get_entry(
                    &driver_key,
                    &[attr_meta("SAI_ROUTE_ENTRY_ATTR_PACKET_ACTION").id],
                )
                .unwrap();
        }
    }

    #[test]
    fn test_reinit_trap_group_created_with_queue_first() {
        let store = MemStore::new();
        let mut seed_map = cold_boot(&store);

        let tg_vid = ObjectId::encode(0, ObjectType::TrapGroup, 50).unwrap();
        seed_map.bind(tg_vid, ObjectId(0xeeee)).unwrap();
        store::save_id_map(&store, "", &seed_map);
        store.put(
            ASIC_STATE,
            &format!("{}:{tg_vid}", ObjectType::TrapGroup.name()),
            vec![
                (
                    "SAI_HOSTIF_TRAP_GROUP_ATTR_QUEUE".to_string(),
                    "3".to_string(),
                ),
                (
                    "SAI_HOSTIF_TRAP_GROUP_ATTR_ADMIN_STATE".to_string(),
                    "false".to_string(),
                ),
            ],
        );

        let driver = VirtualSwitch::new();
        let mut switch = SaiSwitch::probe(&driver).unwrap();
        switch.load_cold_vids(&store).unwrap();
        let new_map = hard_reinit(&driver, &store, &switch).unwrap();

        let rid = new_map.rid(tg_vid).unwrap();
        let got = driver
            .get(
                rid,
                &[
                    attr_meta("SAI_HOSTIF_TRAP_GROUP_ATTR_QUEUE").id,
                    attr_meta("SAI_HOSTIF_TRAP_GROUP_ATTR_ADMIN_STATE").id,
                ],
                16,
            )
            .unwrap();
        assert_eq!(got[0].value, AttrValue::U32(3));
        assert_eq!(got[1].value, AttrValue::Bool(false));
    }

    #[test]
    fn test_reinit_fails_on_missing_record() {
        let store = MemStore::new();
        let mut seed_map = cold_boot(&store);

        // A binding with no backing record.
        let ghost = ObjectId::encode(0, ObjectType::Policer, 9).unwrap();
        seed_map.bind(ghost, ObjectId(0xabcd)).unwrap();
        store::save_id_map(&store, "", &seed_map);

        let driver = VirtualSwitch::new();
        let mut switch = SaiSwitch::probe(&driver).unwrap();
        switch.load_cold_vids(&store).unwrap();
        assert!(matches!(
            hard_reinit(&driver, &store, &switch),
            Err(ReinitError::State(_))
        ));
    }
}
