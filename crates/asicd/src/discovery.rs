//! ASIC discovery: enumerate every driver-created object reachable from
//! the switch handle.
//!
//! Runs right after switch init, before anything else touches the driver.
//! The walk follows single-oid and oid-list attributes depth-first with a
//! visited set, records the default value of every followed oid attribute,
//! and honors a data-driven skip list of attributes known to misbehave on
//! some vendors.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use asic_meta::{AttrId, DefaultPolicy, Registry};
use asic_model::{AttrValue, ObjectType, Rid, ValueKind};

use asic_driver::{Driver, DriverError};

/// Upper bound for list GETs during discovery. Chosen so no attribute in
/// the supported vendor set overflows it; an overflowing attribute is
/// logged and skipped.
pub const MAX_OID_LIST: usize = 1024;

/// Attributes excluded from the walk, as data: some crash certain drivers,
/// some are trivially redundant (a bridge-port's referent is its
/// containing port).
const SKIP_LIST: &[(ObjectType, &str)] = &[
    (ObjectType::Stp, "SAI_STP_ATTR_VLAN_LIST"),
    (ObjectType::Vlan, "SAI_VLAN_ATTR_STP_INSTANCE"),
];

/// Result of a discovery walk.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Every reachable RID, in first-visit order (the root first).
    pub discovered: Vec<Rid>,
    /// For each visited object, the oid attribute values observed at
    /// discovery time.
    pub default_oid_map: HashMap<Rid, Vec<(AttrId, AttrValue)>>,
}

impl Discovery {
    /// Whether a RID was seen during the walk.
    #[must_use]
    pub fn contains(&self, rid: Rid) -> bool {
        self.discovered.contains(&rid)
    }
}

fn is_skipped(ot: ObjectType, name: &str) -> bool {
    SKIP_LIST.iter().any(|(t, n)| *t == ot && *n == name)
}

/// Walk the object graph from `root` (the switch RID).
pub fn discover(driver: &dyn Driver, root: Rid) -> Result<Discovery, DriverError> {
    let registry = Registry::global();
    let mut result = Discovery::default();
    let mut seen: HashSet<Rid> = HashSet::new();
    let mut stack = vec![root];

    while let Some(rid) = stack.pop() {
        if rid.is_null() || !seen.insert(rid) {
            continue;
        }
        let ot = driver.object_type_of(rid)?;
        result.discovered.push(rid);
        debug!(%rid, %ot, "discovered");

        for meta in registry.attrs_of(ot) {
            if !matches!(meta.kind, ValueKind::Oid | ValueKind::OidList) {
                continue;
            }
            if is_skipped(ot, meta.name) {
                continue;
            }
            // Attributes defaulting to null or to the empty list carry
            // nothing right after init.
            if matches!(meta.default, DefaultPolicy::NullOid | DefaultPolicy::EmptyList) {
                continue;
            }

            let attrs = match driver.get(rid, &[meta.id], MAX_OID_LIST) {
                Ok(attrs) => attrs,
                Err(DriverError::BufferOverflow { required }) => {
                    warn!(
                        attr = meta.name,
                        required, "oid list exceeds discovery buffer, skipping"
                    );
                    continue;
                }
                Err(err) => {
                    debug!(attr = meta.name, %rid, %err, "attribute not readable, skipping");
                    continue;
                }
            };
            let Some(attr) = attrs.into_iter().next() else {
                continue;
            };

            result
                .default_oid_map
                .entry(rid)
                .or_default()
                .push((meta.id, attr.value.clone()));

            match attr.value {
                AttrValue::Oid(oid) => stack.push(oid),
                AttrValue::OidList(list) => stack.extend(list),
                _ => {}
            }
        }
    }

    info!(objects = result.discovered.len(), "discovery complete");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use asic_driver::vs::{self, VirtualSwitch};

    #[test]
    fn test_discovery_enumerates_defaults() {
        let driver = VirtualSwitch::new();
        let switch_rid = driver.initialize().unwrap();
        let discovery = discover(&driver, switch_rid).unwrap();

        // switch + cpu port + ports + queues + priority groups +
        // scheduler groups + vlan + members + vr + trap group + stp
        let expected = 1
            + 1
            + vs::PORT_COUNT
            + vs::PORT_COUNT * vs::QUEUES_PER_PORT
            + vs::PORT_COUNT * vs::PRIORITY_GROUPS_PER_PORT
            + vs::PORT_COUNT
            + 1
            + vs::PORT_COUNT
            + 1
            + 1
            + 1;
        assert_eq!(discovery.discovered.len(), expected);
        assert_eq!(discovery.discovered[0], switch_rid);
        assert!(discovery.contains(switch_rid));

        // Per-type census.
        let mut by_type: HashMap<ObjectType, usize> = HashMap::new();
        for &rid in &discovery.discovered {
            *by_type.entry(driver.object_type_of(rid).unwrap()).or_default() += 1;
        }
        assert_eq!(by_type[&ObjectType::Port], vs::PORT_COUNT + 1);
        assert_eq!(by_type[&ObjectType::Queue], vs::PORT_COUNT * vs::QUEUES_PER_PORT);
        assert_eq!(by_type[&ObjectType::VirtualRouter], 1);
        assert_eq!(by_type[&ObjectType::TrapGroup], 1);
        assert_eq!(by_type[&ObjectType::Vlan], 1);
    }

    #[test]
    fn test_discovery_records_default_oids() {
        let driver = VirtualSwitch::new();
        let switch_rid = driver.initialize().unwrap();
        let discovery = discover(&driver, switch_rid).unwrap();

        let switch_defaults = &discovery.default_oid_map[&switch_rid];
        let cpu_attr = Registry::global()
            .by_name("SAI_SWITCH_ATTR_CPU_PORT")
            .unwrap()
            .1;
        assert!(switch_defaults.iter().any(|(id, _)| *id == cpu_attr.id));
    }

    #[test]
    fn test_discovery_is_memoised() {
        let driver = VirtualSwitch::new();
        let switch_rid = driver.initialize().unwrap();
        let discovery = discover(&driver, switch_rid).unwrap();

        let mut unique: HashSet<Rid> = HashSet::new();
        for &rid in &discovery.discovered {
            assert!(unique.insert(rid), "rid {rid} visited twice");
        }
    }
}
