//! The in-process virtual switch.
//!
//! A software stand-in for a vendor driver, faithful enough for the
//! reconciliation engine: switch init materialises the same default object
//! set a hardware switch would (cpu port, front-panel ports with queues,
//! priority groups and a scheduler group, default vlan with members,
//! default virtual router, trap group and stp instance), and the generic
//! create/remove/set/get calls validate against attribute metadata.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::{debug, info};

use asic_meta::{AttrId, DefaultPolicy, Mutability, Registry};
use asic_model::{AttrValue, EntryKey, Mac, ObjectId, ObjectType, Rid};

use crate::{Attr, Driver, DriverError};

/// Number of front-panel ports.
pub const PORT_COUNT: usize = 32;
/// Serdes lanes per port.
pub const LANES_PER_PORT: u32 = 4;
/// Queues created per port (in + out).
pub const QUEUES_PER_PORT: usize = 20;
/// Ingress priority groups per port.
pub const PRIORITY_GROUPS_PER_PORT: usize = 8;
/// Default front-panel port speed.
pub const DEFAULT_PORT_SPEED: u32 = 10000;

#[derive(Debug, Clone)]
struct VsObject {
    object_type: ObjectType,
    attrs: Vec<(AttrId, AttrValue)>,
}

impl VsObject {
    fn get(&self, id: AttrId) -> Option<&AttrValue> {
        self.attrs.iter().find(|(a, _)| *a == id).map(|(_, v)| v)
    }

    fn put(&mut self, id: AttrId, value: AttrValue) {
        match self.attrs.iter_mut().find(|(a, _)| *a == id) {
            Some((_, slot)) => *slot = value,
            None => self.attrs.push((id, value)),
        }
    }
}

/// The virtual switch backend.
///
/// Thread-safe; the daemon shares one instance between the event loop and
/// the counter poller.
pub struct VirtualSwitch {
    objects: DashMap<Rid, VsObject>,
    entries: DashMap<String, (EntryKey, Vec<(AttrId, AttrValue)>)>,
    counters: DashMap<(Rid, String), u64>,
    next_rid: AtomicU64,
}

impl Default for VirtualSwitch {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualSwitch {
    /// Create an uninitialised virtual switch.
    #[must_use]
    pub fn new() -> Self {
        Self {
            objects: DashMap::new(),
            entries: DashMap::new(),
            counters: DashMap::new(),
            // Real ids start high so they are visually distinct from vids
            // in logs.
            next_rid: AtomicU64::new(0x1_0000_0001),
        }
    }

    fn mint_rid(&self) -> Rid {
        ObjectId(self.next_rid.fetch_add(1, Ordering::Relaxed))
    }

    /// Insert an object bypassing metadata checks; used during switch init
    /// to seed read-only attributes.
    fn seed(&self, object_type: ObjectType, attrs: Vec<(AttrId, AttrValue)>) -> Rid {
        let rid = self.mint_rid();
        self.objects.insert(rid, VsObject { object_type, attrs });
        rid
    }

    fn seed_attr(&self, rid: Rid, name: &str, value: AttrValue) {
        let meta = Registry::global().by_name(name).expect("builtin attr").1;
        if let Some(mut obj) = self.objects.get_mut(&rid) {
            obj.put(meta.id, value);
        }
    }

    fn attr_id(name: &str) -> AttrId {
        Registry::global().by_name(name).expect("builtin attr").1.id
    }

    /// Build the default object set of a freshly initialised switch.
    fn populate_defaults(&self) -> Rid {
        let switch_rid = self.seed(
            ObjectType::Switch,
            vec![(
                Self::attr_id("SAI_SWITCH_ATTR_INIT_SWITCH"),
                AttrValue::Bool(true),
            )],
        );

        // CPU port has no lanes.
        let cpu_rid = self.seed(
            ObjectType::Port,
            vec![(Self::attr_id("SAI_PORT_ATTR_TYPE"), AttrValue::I32(1))],
        );

        let mut port_rids = Vec::with_capacity(PORT_COUNT);
        for port in 0..PORT_COUNT {
            let base = port as u32 * LANES_PER_PORT;
            let lanes: Vec<u32> = (base..base + LANES_PER_PORT).collect();
            let port_rid = self.seed(
                ObjectType::Port,
                vec![
                    (Self::attr_id("SAI_PORT_ATTR_TYPE"), AttrValue::I32(0)),
                    (
                        Self::attr_id("SAI_PORT_ATTR_HW_LANE_LIST"),
                        AttrValue::U32List(lanes),
                    ),
                    (
                        Self::attr_id("SAI_PORT_ATTR_SPEED"),
                        AttrValue::U32(DEFAULT_PORT_SPEED),
                    ),
                    (Self::attr_id("SAI_PORT_ATTR_OPER_STATUS"), AttrValue::I32(2)),
                ],
            );
            port_rids.push(port_rid);

            // Queues.
            let mut queue_rids = Vec::with_capacity(QUEUES_PER_PORT);
            for idx in 0..QUEUES_PER_PORT {
                let queue_rid = self.seed(
                    ObjectType::Queue,
                    vec![
                        (Self::attr_id("SAI_QUEUE_ATTR_TYPE"), AttrValue::I32(0)),
                        (
                            Self::attr_id("SAI_QUEUE_ATTR_INDEX"),
                            AttrValue::U8(idx as u8),
                        ),
                    ],
                );
                queue_rids.push(queue_rid);
            }
            self.seed_attr(
                port_rid,
                "SAI_PORT_ATTR_QOS_NUMBER_OF_QUEUES",
                AttrValue::U32(QUEUES_PER_PORT as u32),
            );
            self.seed_attr(
                port_rid,
                "SAI_PORT_ATTR_QOS_QUEUE_LIST",
                AttrValue::OidList(queue_rids.clone()),
            );

            // Ingress priority groups.
            let mut pg_rids = Vec::with_capacity(PRIORITY_GROUPS_PER_PORT);
            for idx in 0..PRIORITY_GROUPS_PER_PORT {
                let pg_rid = self.seed(
                    ObjectType::PriorityGroup,
                    vec![
                        (
                            Self::attr_id("SAI_INGRESS_PRIORITY_GROUP_ATTR_INDEX"),
                            AttrValue::U8(idx as u8),
                        ),
                        (
                            Self::attr_id("SAI_INGRESS_PRIORITY_GROUP_ATTR_PORT"),
                            AttrValue::Oid(port_rid),
                        ),
                    ],
                );
                pg_rids.push(pg_rid);
            }
            self.seed_attr(
                port_rid,
                "SAI_PORT_ATTR_NUMBER_OF_INGRESS_PRIORITY_GROUPS",
                AttrValue::U32(PRIORITY_GROUPS_PER_PORT as u32),
            );
            self.seed_attr(
                port_rid,
                "SAI_PORT_ATTR_INGRESS_PRIORITY_GROUP_LIST",
                AttrValue::OidList(pg_rids),
            );

            // One root scheduler group per port with the queues as
            // children.
            let sg_rid = self.seed(
                ObjectType::SchedulerGroup,
                vec![
                    (
                        Self::attr_id("SAI_SCHEDULER_GROUP_ATTR_PORT_ID"),
                        AttrValue::Oid(port_rid),
                    ),
                    (
                        Self::attr_id("SAI_SCHEDULER_GROUP_ATTR_LEVEL"),
                        AttrValue::U8(0),
                    ),
                    (
                        Self::attr_id("SAI_SCHEDULER_GROUP_ATTR_CHILD_COUNT"),
                        AttrValue::U32(QUEUES_PER_PORT as u32),
                    ),
                    (
                        Self::attr_id("SAI_SCHEDULER_GROUP_ATTR_CHILD_LIST"),
                        AttrValue::OidList(queue_rids),
                    ),
                ],
            );
            self.seed_attr(
                port_rid,
                "SAI_PORT_ATTR_QOS_SCHEDULER_GROUP_LIST",
                AttrValue::OidList(vec![sg_rid]),
            );
        }

        // Default vlan with one member per port.
        let vlan_rid = self.seed(
            ObjectType::Vlan,
            vec![(Self::attr_id("SAI_VLAN_ATTR_VLAN_ID"), AttrValue::U16(1))],
        );
        let mut member_rids = Vec::with_capacity(PORT_COUNT);
        for &port_rid in &port_rids {
            let member_rid = self.seed(
                ObjectType::VlanMember,
                vec![
                    (
                        Self::attr_id("SAI_VLAN_MEMBER_ATTR_VLAN_ID"),
                        AttrValue::Oid(vlan_rid),
                    ),
                    (
                        Self::attr_id("SAI_VLAN_MEMBER_ATTR_PORT_ID"),
                        AttrValue::Oid(port_rid),
                    ),
                ],
            );
            member_rids.push(member_rid);
        }
        self.seed_attr(
            vlan_rid,
            "SAI_VLAN_ATTR_MEMBER_LIST",
            AttrValue::OidList(member_rids),
        );

        let vr_rid = self.seed(
            ObjectType::VirtualRouter,
            vec![(
                Self::attr_id("SAI_VIRTUAL_ROUTER_ATTR_SRC_MAC_ADDRESS"),
                AttrValue::Mac(Mac([0x02, 0x00, 0x00, 0x00, 0x00, 0x01])),
            )],
        );
        let trap_group_rid = self.seed(
            ObjectType::TrapGroup,
            vec![(
                Self::attr_id("SAI_HOSTIF_TRAP_GROUP_ATTR_QUEUE"),
                AttrValue::U32(0),
            )],
        );
        let stp_rid = self.seed(ObjectType::Stp, Vec::new());

        // Wire the switch-level read-only attributes.
        self.seed_attr(switch_rid, "SAI_SWITCH_ATTR_CPU_PORT", AttrValue::Oid(cpu_rid));
        self.seed_attr(
            switch_rid,
            "SAI_SWITCH_ATTR_PORT_NUMBER",
            AttrValue::U32(PORT_COUNT as u32),
        );
        self.seed_attr(
            switch_rid,
            "SAI_SWITCH_ATTR_PORT_LIST",
            AttrValue::OidList(port_rids),
        );
        self.seed_attr(
            switch_rid,
            "SAI_SWITCH_ATTR_DEFAULT_VIRTUAL_ROUTER_ID",
            AttrValue::Oid(vr_rid),
        );
        self.seed_attr(
            switch_rid,
            "SAI_SWITCH_ATTR_DEFAULT_TRAP_GROUP",
            AttrValue::Oid(trap_group_rid),
        );
        self.seed_attr(
            switch_rid,
            "SAI_SWITCH_ATTR_DEFAULT_STP_INST_ID",
            AttrValue::Oid(stp_rid),
        );
        self.seed_attr(
            switch_rid,
            "SAI_SWITCH_ATTR_DEFAULT_VLAN_ID",
            AttrValue::Oid(vlan_rid),
        );
        self.seed_attr(
            switch_rid,
            "SAI_SWITCH_ATTR_SRC_MAC_ADDRESS",
            AttrValue::Mac(Mac([0x02, 0x00, 0x00, 0x00, 0x00, 0x01])),
        );

        info!(
            objects = self.objects.len(),
            "virtual switch defaults populated"
        );
        switch_rid
    }

    /// Validate one attribute against metadata and the live object table.
    ///
    /// Unlike view-side validation this resolves referenced ids through the
    /// driver's own table; a RID carries no type information of its own.
    fn check_attr(&self, attr: &Attr) -> Result<(), DriverError> {
        if attr.value.kind() != attr.meta.kind {
            return Err(DriverError::MetadataViolation(format!(
                "attribute {} expects {:?}, got {:?}",
                attr.meta.name,
                attr.meta.kind,
                attr.value.kind()
            )));
        }
        if attr.meta.kind.holds_oids() {
            for rid in attr.value.oids() {
                if rid.is_null() {
                    continue;
                }
                let referenced = self.object_type_of(rid)?;
                if !attr.meta.allowed_types.contains(&referenced) {
                    return Err(DriverError::MetadataViolation(format!(
                        "attribute {} may not reference {referenced}",
                        attr.meta.name
                    )));
                }
            }
        }
        Ok(())
    }

    fn check_create_attrs(
        &self,
        object_type: ObjectType,
        attrs: &[Attr],
    ) -> Result<(), DriverError> {
        let registry = Registry::global();
        let mut seen = Vec::new();
        for attr in attrs {
            if seen.contains(&attr.meta.id) {
                return Err(DriverError::InvalidArgument(format!(
                    "duplicate attribute {} on create",
                    attr.meta.name
                )));
            }
            seen.push(attr.meta.id);
            if attr.meta.mutability == Mutability::ReadOnly {
                return Err(DriverError::InvalidArgument(format!(
                    "attribute {} is read-only",
                    attr.meta.name
                )));
            }
            self.check_attr(attr)?;
        }
        for meta in registry.attrs_of(object_type) {
            if meta.mandatory_on_create && !seen.contains(&meta.id) {
                return Err(DriverError::InvalidArgument(format!(
                    "mandatory attribute {} missing on create",
                    meta.name
                )));
            }
        }
        Ok(())
    }
}

impl Driver for VirtualSwitch {
    fn initialize(&self) -> Result<Rid, DriverError> {
        if !self.objects.is_empty() {
            return Err(DriverError::Internal(
                "switch already initialised".to_string(),
            ));
        }
        Ok(self.populate_defaults())
    }

    fn object_type_of(&self, rid: Rid) -> Result<ObjectType, DriverError> {
        self.objects
            .get(&rid)
            .map(|o| o.object_type)
            .ok_or_else(|| DriverError::NotFound(format!("rid {rid}")))
    }

    fn create(&self, object_type: ObjectType, attrs: &[Attr]) -> Result<Rid, DriverError> {
        if object_type.is_entry() {
            return Err(DriverError::InvalidArgument(format!(
                "{object_type} must be created through create_entry"
            )));
        }
        self.check_create_attrs(object_type, attrs)?;
        let rid = self.mint_rid();
        self.objects.insert(
            rid,
            VsObject {
                object_type,
                attrs: attrs.iter().map(|a| (a.meta.id, a.value.clone())).collect(),
            },
        );
        debug!(%rid, %object_type, "created");
        Ok(rid)
    }

    fn remove(&self, rid: Rid) -> Result<(), DriverError> {
        if self.objects.remove(&rid).is_none() {
            return Err(DriverError::NotFound(format!("rid {rid}")));
        }
        debug!(%rid, "removed");
        Ok(())
    }

    fn set(&self, rid: Rid, attr: &Attr) -> Result<(), DriverError> {
        let mut object = self
            .objects
            .get_mut(&rid)
            .ok_or_else(|| DriverError::NotFound(format!("rid {rid}")))?;
        match attr.meta.mutability {
            Mutability::CreateAndSet => {}
            Mutability::CreateOnly => {
                return Err(DriverError::InvalidArgument(format!(
                    "attribute {} is create-only",
                    attr.meta.name
                )));
            }
            Mutability::ReadOnly => {
                return Err(DriverError::InvalidArgument(format!(
                    "attribute {} is read-only",
                    attr.meta.name
                )));
            }
        }
        self.check_attr(attr)?;
        object.put(attr.meta.id, attr.value.clone());
        Ok(())
    }

    fn get(&self, rid: Rid, ids: &[AttrId], max_list: usize) -> Result<Vec<Attr>, DriverError> {
        let object = self
            .objects
            .get(&rid)
            .ok_or_else(|| DriverError::NotFound(format!("rid {rid}")))?;
        let registry = Registry::global();
        let mut out = Vec::with_capacity(ids.len());
        for &id in ids {
            let meta = registry
                .get(object.object_type, id)
                .map_err(|e| DriverError::InvalidArgument(e.to_string()))?;
            let value = match object.get(id) {
                Some(v) => v.clone(),
                None => match &meta.default {
                    DefaultPolicy::Value(v) => v.clone(),
                    DefaultPolicy::NullOid => AttrValue::Oid(ObjectId::NULL),
                    DefaultPolicy::EmptyList => meta
                        .resettable_default()
                        .ok_or_else(|| DriverError::NotSupported(meta.name.to_string()))?,
                    _ => {
                        return Err(DriverError::NotSupported(format!(
                            "attribute {} not present on {rid}",
                            meta.name
                        )));
                    }
                },
            };
            if let AttrValue::OidList(list) = &value {
                if list.len() > max_list {
                    return Err(DriverError::BufferOverflow {
                        required: list.len(),
                    });
                }
            }
            out.push(Attr::new(meta, value));
        }
        Ok(out)
    }

    fn create_entry(&self, key: &EntryKey, attrs: &[Attr]) -> Result<(), DriverError> {
        self.check_create_attrs(key.object_type(), attrs)?;
        for rid in key.oids() {
            if !rid.is_null() && !self.objects.contains_key(&rid) {
                return Err(DriverError::NotFound(format!(
                    "entry key references unknown rid {rid}"
                )));
            }
        }
        let canon = key.to_canon();
        if self.entries.contains_key(&canon) {
            return Err(DriverError::ItemExists(canon));
        }
        self.entries.insert(
            canon,
            (
                key.clone(),
                attrs.iter().map(|a| (a.meta.id, a.value.clone())).collect(),
            ),
        );
        Ok(())
    }

    fn remove_entry(&self, key: &EntryKey) -> Result<(), DriverError> {
        if self.entries.remove(&key.to_canon()).is_none() {
            return Err(DriverError::NotFound(key.to_canon()));
        }
        Ok(())
    }

    fn set_entry(&self, key: &EntryKey, attr: &Attr) -> Result<(), DriverError> {
        let mut entry = self
            .entries
            .get_mut(&key.to_canon())
            .ok_or_else(|| DriverError::NotFound(key.to_canon()))?;
        if attr.meta.mutability != Mutability::CreateAndSet {
            return Err(DriverError::InvalidArgument(format!(
                "attribute {} is not settable",
                attr.meta.name
            )));
        }
        let attrs = &mut entry.value_mut().1;
        match attrs.iter_mut().find(|(id, _)| *id == attr.meta.id) {
            Some((_, slot)) => *slot = attr.value.clone(),
            None => attrs.push((attr.meta.id, attr.value.clone())),
        }
        Ok(())
    }

    fn get_entry(&self, key: &EntryKey, ids: &[AttrId]) -> Result<Vec<Attr>, DriverError> {
        let entry = self
            .entries
            .get(&key.to_canon())
            .ok_or_else(|| DriverError::NotFound(key.to_canon()))?;
        let registry = Registry::global();
        let mut out = Vec::with_capacity(ids.len());
        for &id in ids {
            let meta = registry
                .get(key.object_type(), id)
                .map_err(|e| DriverError::InvalidArgument(e.to_string()))?;
            let value = entry
                .1
                .iter()
                .find(|(a, _)| *a == id)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| DriverError::NotFound(meta.name.to_string()))?;
            out.push(Attr::new(meta, value));
        }
        Ok(out)
    }

    fn stats(&self, rid: Rid, counters: &[&str]) -> Result<Vec<u64>, DriverError> {
        if !self.objects.contains_key(&rid) {
            return Err(DriverError::NotFound(format!("rid {rid}")));
        }
        Ok(counters
            .iter()
            .map(|name| {
                self.counters
                    .get(&(rid, (*name).to_string()))
                    .map(|v| *v)
                    .unwrap_or(0)
            })
            .collect())
    }
}

impl VirtualSwitch {
    /// Bump a counter; test hook standing in for traffic.
    pub fn bump_counter(&self, rid: Rid, name: &str, delta: u64) {
        *self
            .counters
            .entry((rid, name.to_string()))
            .or_insert(0) += delta;
    }
}
