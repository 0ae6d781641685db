//! The view-transition diff engine.
//!
//! Walks the temporary view in dependency order, decides per object whether
//! to keep, update, recreate or create it, and emits the ordered operation
//! stream. Afterwards, current-view objects without a counterpart are
//! removed in reverse dependency order.
//!
//! Object graphs are cyclic in general, so the walk is an explicit
//! work-stack loop with an on-stack set rather than recursion.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info, warn};

use asic_meta::AttrMeta;
use asic_model::{ObjectId, ObjectType};
use asic_view::{AsicView, ObjIdx, ObjectStatus};

use crate::candidate::{self, equal_attribute};
use crate::error::ApplyError;
use crate::ops::ViewOp;

/// Reconciliation settings.
#[derive(Debug, Clone, Default)]
pub struct ApplyConfig {
    /// Seed for the random tie-break; fixed seeds give reproducible runs.
    pub seed: u64,
    /// Current-view VIDs of discovered defaults (cold-boot set). These are
    /// never removed; irreconcilable ones are brought toward defaults and
    /// adopted.
    pub non_removable: HashSet<ObjectId>,
}

/// Type-ordered first sweep. Dependencies are enforced by the work stack
/// regardless, this order just keeps the op stream close to the natural
/// bring-up sequence. A second sweep over every type catches stragglers.
const PROCESS_ORDER: &[ObjectType] = &[
    ObjectType::Port,
    ObjectType::Switch,
    ObjectType::Vlan,
    ObjectType::VlanMember,
    ObjectType::HostIf,
    ObjectType::VirtualRouter,
    ObjectType::RouterInterface,
    ObjectType::NextHop,
    ObjectType::NextHopGroup,
    ObjectType::BufferPool,
    ObjectType::BufferProfile,
    ObjectType::PriorityGroup,
    ObjectType::Queue,
    ObjectType::Wred,
    ObjectType::Scheduler,
    ObjectType::SchedulerGroup,
    ObjectType::QosMap,
    ObjectType::Policer,
    ObjectType::TrapGroup,
    ObjectType::Trap,
    ObjectType::Stp,
    ObjectType::AclTable,
    ObjectType::AclEntry,
    ObjectType::NeighborEntry,
    ObjectType::RouteEntry,
    ObjectType::FdbEntry,
    ObjectType::InsegEntry,
    ObjectType::L2mcEntry,
    ObjectType::IpmcEntry,
    ObjectType::McastFdbEntry,
    ObjectType::NatEntry,
];

/// Diff the temporary view against the current view.
///
/// On success every temporary object is `Final`, every current object is
/// `Final` or `Removed`, and the returned operations transform the ASIC
/// from the current state to the temporary state in an order where every
/// create precedes the operations referencing it and every remove follows
/// them.
pub fn apply_view_transition(
    current: &mut AsicView,
    temp: &mut AsicView,
    config: &ApplyConfig,
) -> Result<Vec<ViewOp>, ApplyError> {
    let mut engine = Engine {
        current,
        temp,
        config,
        rng: StdRng::seed_from_u64(config.seed),
        ops: Vec::new(),
    };

    engine.match_oids()?;
    engine.check_preconditions()?;

    for &ot in PROCESS_ORDER {
        for t_idx in engine.temp.objects_of_type(ot) {
            engine.process(t_idx)?;
        }
    }
    for ot in ObjectType::ALL {
        for t_idx in engine.temp.objects_of_type(ot) {
            engine.process(t_idx)?;
        }
    }

    engine.sweep_orphans()?;
    engine.check_all_processed()?;

    info!(ops = engine.ops.len(), "view transition computed");
    Ok(engine.ops)
}

struct Engine<'a> {
    current: &'a mut AsicView,
    temp: &'a mut AsicView,
    config: &'a ApplyConfig,
    rng: StdRng,
    ops: Vec<ViewOp>,
}

impl Engine<'_> {
    /// Pair every temporary oid object whose VID also exists in the current
    /// view (ports and other objects that survived the agent restart with
    /// their ids intact). RIDs are copied into the temporary map.
    fn match_oids(&mut self) -> Result<(), ApplyError> {
        let temp_oids: Vec<(ObjIdx, ObjectId)> = self
            .temp
            .indices()
            .filter_map(|idx| self.temp.object(idx).vid().map(|vid| (idx, vid)))
            .collect();

        let mut matched = 0usize;
        for (t_idx, vid) in temp_oids {
            let Some(c_idx) = self.current.find_by_vid(vid) else {
                continue;
            };
            let rid = self.current.id_map.rid(vid).ok_or_else(|| {
                ApplyError::Internal(format!("current vid {vid} has no rid binding"))
            })?;
            self.temp.id_map.bind(vid, rid)?;
            self.temp.object_mut(t_idx).set_status(ObjectStatus::Matched);
            self.current.object_mut(c_idx).set_status(ObjectStatus::Matched);
            matched += 1;
        }
        debug!(matched, "matched identical vids across views");
        Ok(())
    }

    /// Hard preconditions: exactly one switch on each side, every
    /// temporary port matched.
    fn check_preconditions(&self) -> Result<(), ApplyError> {
        for (view, name) in [(&*self.current, "current"), (&*self.temp, "temporary")] {
            let switches = view.objects_of_type(ObjectType::Switch).len();
            if switches != 1 {
                return Err(ApplyError::Precondition(format!(
                    "{name} view has {switches} switch objects, expected exactly 1"
                )));
            }
        }
        for idx in self.temp.objects_of_type(ObjectType::Port) {
            let port = self.temp.object(idx);
            if port.status() != ObjectStatus::Matched {
                return Err(ApplyError::Precondition(format!(
                    "port {} is not matched; port ids must survive restarts",
                    port.canon_id()
                )));
            }
        }
        Ok(())
    }

    /// Process one temporary object and everything it references, deepest
    /// first.
    fn process(&mut self, root: ObjIdx) -> Result<(), ApplyError> {
        let mut stack = vec![root];
        let mut on_stack: HashSet<ObjIdx> = HashSet::from([root]);

        while let Some(&top) = stack.last() {
            if self.temp.object(top).status() == ObjectStatus::Final {
                stack.pop();
                on_stack.remove(&top);
                continue;
            }

            let mut pending = Vec::new();
            for vid in self.temp.object(top).references() {
                let dep = self.temp.find_by_vid(vid).ok_or_else(|| {
                    ApplyError::Internal(format!(
                        "object {} references vid {vid} absent from temporary view",
                        self.temp.object(top).canon_id()
                    ))
                })?;
                if self.temp.object(dep).status() != ObjectStatus::Final
                    && !on_stack.contains(&dep)
                {
                    pending.push(dep);
                }
            }

            if pending.is_empty() {
                stack.pop();
                on_stack.remove(&top);
                self.finalize(top)?;
            } else {
                for dep in pending {
                    on_stack.insert(dep);
                    stack.push(dep);
                }
            }
        }
        Ok(())
    }

    /// Decide the fate of one temporary object whose references are all
    /// processed.
    fn finalize(&mut self, t_idx: ObjIdx) -> Result<(), ApplyError> {
        if self.temp.object(t_idx).status() == ObjectStatus::Final {
            return Ok(());
        }

        let best = candidate::best_match(self.current, self.temp, t_idx, &mut self.rng)?;
        match best {
            None => {
                debug!(
                    object = %self.temp.object(t_idx).canon_id(),
                    "no candidate, creating"
                );
                self.emit_create(t_idx);
                Ok(())
            }
            Some(c_idx) => self.reconcile(t_idx, c_idx),
        }
    }

    /// Emit a CREATE for a temporary object with every writable attribute.
    fn emit_create(&mut self, t_idx: ObjIdx) {
        let t_obj = self.temp.object(t_idx);
        let attrs: Vec<(String, String)> = t_obj
            .attrs()
            .iter()
            .filter(|a| !a.meta().is_read_only())
            .map(|a| (a.name().to_string(), a.canon().to_string()))
            .collect();
        self.ops.push(ViewOp::Create {
            object_type: t_obj.object_type(),
            key: t_obj.key().clone(),
            attrs,
        });
        self.temp.object_mut(t_idx).set_status(ObjectStatus::Final);
    }

    /// Reconcile a matched pair: keep, update via SET, or remove and
    /// recreate.
    fn reconcile(&mut self, t_idx: ObjIdx, c_idx: ObjIdx) -> Result<(), ApplyError> {
        #[derive(Debug)]
        struct Plan {
            sets: Vec<(String, String)>,
            blockers: Vec<&'static str>,
        }

        let plan = {
            let t_obj = self.temp.object(t_idx);
            let c_obj = self.current.object(c_idx);
            let mut plan = Plan {
                sets: Vec::new(),
                blockers: Vec::new(),
            };

            // First pass: attributes desired by the temporary object.
            for attr in t_obj.attrs() {
                let meta: &'static AttrMeta = attr.meta();
                if meta.is_read_only() {
                    continue;
                }
                if equal_attribute(self.current, self.temp, c_obj, t_obj, meta)? {
                    continue;
                }
                if (meta.is_create_only() || meta.is_key) && c_obj.has_attr(meta.id) {
                    plan.blockers.push(meta.name);
                } else if meta.is_create_only() {
                    // Absent on the current object and not settable later.
                    plan.blockers.push(meta.name);
                } else {
                    plan.sets.push((meta.name.to_string(), attr.canon().to_string()));
                }
            }

            // Second pass: attributes set on the current object that the
            // temporary object does not want.
            for attr in c_obj.attrs() {
                let meta: &'static AttrMeta = attr.meta();
                if t_obj.has_attr(meta.id) || meta.is_read_only() {
                    continue;
                }
                match meta.resettable_default() {
                    Some(default) => {
                        let canon = meta.serialize_value(&default);
                        if canon != attr.canon() {
                            plan.sets.push((meta.name.to_string(), canon));
                        }
                    }
                    None => plan.blockers.push(meta.name),
                }
            }
            plan
        };

        if plan.blockers.is_empty() {
            for attr in plan.sets {
                self.emit_set(t_idx, attr);
            }
            self.bind_pair(t_idx, c_idx)?;
            return Ok(());
        }

        if self.is_non_removable(c_idx) {
            // Discovered defaults cannot be removed. Bring what is settable
            // toward the desired state and adopt the object as matched.
            warn!(
                object = %self.current.object(c_idx).canon_id(),
                blockers = ?plan.blockers,
                "non-removable default cannot be recreated, applying settable attributes only"
            );
            for attr in plan.sets {
                self.emit_set(t_idx, attr);
            }
            self.bind_pair(t_idx, c_idx)?;
            return Ok(());
        }

        debug!(
            object = %self.current.object(c_idx).canon_id(),
            blockers = ?plan.blockers,
            "irreconcilable attributes, removing and recreating"
        );
        self.remove_subtree(c_idx)?;
        // A vid matched earlier now names an object that will be recreated;
        // its old rid binding no longer holds.
        if let Some(t_vid) = self.temp.object(t_idx).vid() {
            self.temp.id_map.unbind(t_vid);
        }
        self.emit_create(t_idx);
        Ok(())
    }

    fn emit_set(&mut self, t_idx: ObjIdx, attr: (String, String)) {
        let t_obj = self.temp.object(t_idx);
        self.ops.push(ViewOp::Set {
            object_type: t_obj.object_type(),
            key: t_obj.key().clone(),
            attr,
        });
    }

    /// Copy the current object's RID onto the temporary VID and mark both
    /// objects final.
    fn bind_pair(&mut self, t_idx: ObjIdx, c_idx: ObjIdx) -> Result<(), ApplyError> {
        if let (Some(t_vid), Some(c_vid)) = (
            self.temp.object(t_idx).vid(),
            self.current.object(c_idx).vid(),
        ) {
            let rid = self.current.id_map.rid(c_vid).ok_or_else(|| {
                ApplyError::Internal(format!("current vid {c_vid} has no rid binding"))
            })?;
            self.temp.id_map.bind(t_vid, rid)?;
        }
        self.temp.object_mut(t_idx).set_status(ObjectStatus::Final);
        self.current.object_mut(c_idx).set_status(ObjectStatus::Final);
        Ok(())
    }

    fn is_non_removable(&self, c_idx: ObjIdx) -> bool {
        self.current
            .object(c_idx)
            .vid()
            .map(|vid| self.config.non_removable.contains(&vid))
            .unwrap_or(false)
    }

    /// Remove a current-view object together with every current-view
    /// object still referencing it, dependents first.
    fn remove_subtree(&mut self, c_idx: ObjIdx) -> Result<(), ApplyError> {
        // Mark before walking so reference cycles terminate.
        self.current.object_mut(c_idx).set_status(ObjectStatus::Removed);

        if let Some(vid) = self.current.object(c_idx).vid() {
            let dependents: Vec<ObjIdx> = self
                .current
                .indices()
                .filter(|&idx| idx != c_idx)
                .filter(|&idx| self.current.object(idx).status() != ObjectStatus::Removed)
                .filter(|&idx| self.current.object(idx).references().contains(&vid))
                .collect();
            for dep in dependents {
                let status = self.current.object(dep).status();
                if status != ObjectStatus::NotProcessed {
                    let c_obj = self.current.object(c_idx);
                    error!(
                        object = %c_obj.canon_id(),
                        dependent = %self.current.object(dep).canon_id(),
                        "cannot remove object still referenced by a processed object"
                    );
                    return Err(ApplyError::Unreconcilable {
                        object: c_obj.canon_id(),
                        reason: "still referenced by a processed object".to_string(),
                    });
                }
                self.remove_subtree(dep)?;
            }
        }

        let c_obj = self.current.object(c_idx);
        self.ops.push(ViewOp::Remove {
            object_type: c_obj.object_type(),
            key: c_obj.key().clone(),
        });
        Ok(())
    }

    /// Remove every current-view object without a counterpart, referrers
    /// before referees. Non-removable defaults are adopted instead.
    fn sweep_orphans(&mut self) -> Result<(), ApplyError> {
        let mut orphans: Vec<ObjIdx> = self
            .current
            .indices()
            .filter(|&idx| self.current.object(idx).status() == ObjectStatus::NotProcessed)
            .collect();

        orphans.retain(|&idx| {
            if self.is_non_removable(idx) {
                debug!(
                    object = %self.current.object(idx).canon_id(),
                    "orphaned default left in place"
                );
                self.current.object_mut(idx).set_status(ObjectStatus::Final);
                false
            } else {
                true
            }
        });

        while !orphans.is_empty() {
            let vids: Vec<Option<ObjectId>> = orphans
                .iter()
                .map(|&idx| self.current.object(idx).vid())
                .collect();

            // An orphan is removable once no remaining orphan references it.
            let removable: Vec<usize> = (0..orphans.len())
                .filter(|&pos| {
                    let Some(vid) = vids[pos] else {
                        return true;
                    };
                    !orphans.iter().enumerate().any(|(other, &o_idx)| {
                        other != pos && self.current.object(o_idx).references().contains(&vid)
                    })
                })
                .collect();

            if removable.is_empty() {
                warn!(
                    remaining = orphans.len(),
                    "reference cycle among orphans, removing in arbitrary order"
                );
                for &idx in &orphans {
                    self.emit_remove_orphan(idx);
                }
                break;
            }

            let mut removed_positions = HashSet::new();
            for &pos in &removable {
                self.emit_remove_orphan(orphans[pos]);
                removed_positions.insert(pos);
            }
            orphans = orphans
                .into_iter()
                .enumerate()
                .filter(|(pos, _)| !removed_positions.contains(pos))
                .map(|(_, idx)| idx)
                .collect();
        }
        Ok(())
    }

    fn emit_remove_orphan(&mut self, c_idx: ObjIdx) {
        let c_obj = self.current.object(c_idx);
        self.ops.push(ViewOp::Remove {
            object_type: c_obj.object_type(),
            key: c_obj.key().clone(),
        });
        self.current.object_mut(c_idx).set_status(ObjectStatus::Removed);
    }

    /// Final status audit: every temporary object `Final`, every current
    /// object `Final` or `Removed`.
    fn check_all_processed(&self) -> Result<(), ApplyError> {
        let mut failures = 0usize;
        for idx in self.temp.indices() {
            let obj = self.temp.object(idx);
            if obj.status() != ObjectStatus::Final {
                error!(
                    object = %obj.canon_id(),
                    status = ?obj.status(),
                    attrs = %obj.dump_attrs(),
                    "temporary object was not processed"
                );
                failures += 1;
            }
        }
        for idx in self.current.indices() {
            let obj = self.current.object(idx);
            if !matches!(obj.status(), ObjectStatus::Final | ObjectStatus::Removed) {
                error!(
                    object = %obj.canon_id(),
                    status = ?obj.status(),
                    attrs = %obj.dump_attrs(),
                    "current object was not processed"
                );
                failures += 1;
            }
        }
        if failures > 0 {
            return Err(ApplyError::Internal(format!(
                "{failures} objects were not processed"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use asic_meta::Registry;
    use asic_model::{AttrValue, EntryKey};
    use asic_view::{ObjectKey, SaiAttr, SaiObject};

    fn vid(ot: ObjectType, n: u64) -> ObjectId {
        ObjectId::encode(0, ot, n).unwrap()
    }

    fn meta(name: &str) -> &'static AttrMeta {
        Registry::global().by_name(name).unwrap().1
    }

    fn oid_object(ot: ObjectType, n: u64, attrs: &[(&str, AttrValue)]) -> SaiObject {
        let mut obj = SaiObject::new_oid(vid(ot, n)).unwrap();
        for (name, value) in attrs {
            obj.set_attr(SaiAttr::new(meta(name), value.clone())).unwrap();
        }
        obj
    }

    /// A minimal cold-boot baseline: switch, one port, default VR, with
    /// RIDs bound on the current side. Returns (current, temp) sharing the
    /// same VIDs for the baseline objects.
    fn baseline() -> (AsicView, AsicView) {
        let mut current = AsicView::new();
        let mut temp = AsicView::new();

        let objects = [
            oid_object(ObjectType::Switch, 1, &[]),
            oid_object(
                ObjectType::Port,
                1,
                &[
                    ("SAI_PORT_ATTR_HW_LANE_LIST", AttrValue::U32List(vec![0, 1, 2, 3])),
                    ("SAI_PORT_ATTR_SPEED", AttrValue::U32(10000)),
                ],
            ),
            oid_object(ObjectType::VirtualRouter, 1, &[]),
        ];
        for (i, obj) in objects.iter().enumerate() {
            current.insert(obj.clone()).unwrap();
            temp.insert(obj.clone()).unwrap();
            let v = obj.vid().unwrap();
            current.id_map.bind(v, ObjectId(0x1000 + i as u64)).unwrap();
        }
        (current, temp)
    }

    fn run(
        current: &mut AsicView,
        temp: &mut AsicView,
        config: &ApplyConfig,
    ) -> Vec<ViewOp> {
        apply_view_transition(current, temp, config).unwrap()
    }

    fn op_position(ops: &[ViewOp], pred: impl Fn(&ViewOp) -> bool) -> usize {
        ops.iter().position(pred).expect("op not found")
    }

    #[test]
    fn test_identical_views_emit_zero_ops() {
        let (mut current, mut temp) = baseline();
        let ops = run(&mut current, &mut temp, &ApplyConfig::default());
        assert!(ops.is_empty(), "expected no ops, got {ops:?}");
    }

    #[test]
    fn test_port_speed_change_emits_single_set() {
        let (mut current, mut temp) = baseline();
        let port_vid = vid(ObjectType::Port, 1);
        let t_port = temp.find_by_vid(port_vid).unwrap();
        temp.object_mut(t_port)
            .set_attr(SaiAttr::new(meta("SAI_PORT_ATTR_SPEED"), AttrValue::U32(40000)))
            .unwrap();

        let ops = run(&mut current, &mut temp, &ApplyConfig::default());
        assert_eq!(ops.len(), 1);
        match &ops[0] {
            ViewOp::Set { object_type, key, attr } => {
                assert_eq!(*object_type, ObjectType::Port);
                assert_eq!(*key, ObjectKey::Oid(port_vid));
                assert_eq!(attr.0, "SAI_PORT_ATTR_SPEED");
                assert_eq!(attr.1, "40000");
            }
            other => panic!("expected set, got {other:?}"),
        }
    }

    #[test]
    fn test_new_route_creates_next_hop_then_route() {
        let (mut current, mut temp) = baseline();

        // Router interface present on both sides.
        let rif = oid_object(
            ObjectType::RouterInterface,
            1,
            &[
                (
                    "SAI_ROUTER_INTERFACE_ATTR_VIRTUAL_ROUTER_ID",
                    AttrValue::Oid(vid(ObjectType::VirtualRouter, 1)),
                ),
                ("SAI_ROUTER_INTERFACE_ATTR_TYPE", AttrValue::I32(0)),
                (
                    "SAI_ROUTER_INTERFACE_ATTR_PORT_ID",
                    AttrValue::Oid(vid(ObjectType::Port, 1)),
                ),
            ],
        );
        current.insert(rif.clone()).unwrap();
        temp.insert(rif.clone()).unwrap();
        current
            .id_map
            .bind(rif.vid().unwrap(), ObjectId(0x2000))
            .unwrap();

        // Temporary view adds a next hop and a route using it.
        let nh_vid = vid(ObjectType::NextHop, 1);
        temp.insert(oid_object(
            ObjectType::NextHop,
            1,
            &[
                ("SAI_NEXT_HOP_ATTR_TYPE", AttrValue::I32(0)),
                (
                    "SAI_NEXT_HOP_ATTR_IP",
                    AttrValue::IpAddress("10.0.0.1".parse().unwrap()),
                ),
                (
                    "SAI_NEXT_HOP_ATTR_ROUTER_INTERFACE_ID",
                    AttrValue::Oid(rif.vid().unwrap()),
                ),
            ],
        ))
        .unwrap();
        let mut route = SaiObject::new_entry(EntryKey::Route {
            switch_id: vid(ObjectType::Switch, 1),
            vr_id: vid(ObjectType::VirtualRouter, 1),
            dest: "10.0.0.0/24".parse().unwrap(),
        });
        route
            .set_attr(SaiAttr::new(
                meta("SAI_ROUTE_ENTRY_ATTR_NEXT_HOP_ID"),
                AttrValue::Oid(nh_vid),
            ))
            .unwrap();
        route
            .set_attr(SaiAttr::new(
                meta("SAI_ROUTE_ENTRY_ATTR_PACKET_ACTION"),
                AttrValue::I32(1),
            ))
            .unwrap();
        temp.insert(route).unwrap();

        let ops = run(&mut current, &mut temp, &ApplyConfig::default());

        assert_eq!(ops.len(), 2, "expected two creates, got {ops:?}");
        assert!(!ops.iter().any(|op| matches!(op, ViewOp::Remove { .. })));
        let nh_pos = op_position(&ops, |op| {
            matches!(op, ViewOp::Create { object_type, .. } if *object_type == ObjectType::NextHop)
        });
        let route_pos = op_position(&ops, |op| {
            matches!(op, ViewOp::Create { object_type, .. } if *object_type == ObjectType::RouteEntry)
        });
        assert!(nh_pos < route_pos, "next hop must be created before route");
    }

    #[test]
    fn test_route_next_hop_swap_is_single_set() {
        let (mut current, mut temp) = baseline();

        let rif = oid_object(
            ObjectType::RouterInterface,
            1,
            &[
                (
                    "SAI_ROUTER_INTERFACE_ATTR_VIRTUAL_ROUTER_ID",
                    AttrValue::Oid(vid(ObjectType::VirtualRouter, 1)),
                ),
                ("SAI_ROUTER_INTERFACE_ATTR_TYPE", AttrValue::I32(0)),
                (
                    "SAI_ROUTER_INTERFACE_ATTR_PORT_ID",
                    AttrValue::Oid(vid(ObjectType::Port, 1)),
                ),
            ],
        );
        current.insert(rif.clone()).unwrap();
        temp.insert(rif.clone()).unwrap();
        current
            .id_map
            .bind(rif.vid().unwrap(), ObjectId(0x2000))
            .unwrap();

        // Two next hops, both present on both sides.
        for (n, ip) in [(1u64, "10.0.0.1"), (2u64, "10.0.0.2")] {
            let nh = oid_object(
                ObjectType::NextHop,
                n,
                &[
                    ("SAI_NEXT_HOP_ATTR_TYPE", AttrValue::I32(0)),
                    ("SAI_NEXT_HOP_ATTR_IP", AttrValue::IpAddress(ip.parse().unwrap())),
                    (
                        "SAI_NEXT_HOP_ATTR_ROUTER_INTERFACE_ID",
                        AttrValue::Oid(rif.vid().unwrap()),
                    ),
                ],
            );
            current.insert(nh.clone()).unwrap();
            temp.insert(nh.clone()).unwrap();
            current
                .id_map
                .bind(nh.vid().unwrap(), ObjectId(0x3000 + n))
                .unwrap();
        }

        let route_key = EntryKey::Route {
            switch_id: vid(ObjectType::Switch, 1),
            vr_id: vid(ObjectType::VirtualRouter, 1),
            dest: "10.0.0.0/24".parse().unwrap(),
        };
        let mut c_route = SaiObject::new_entry(route_key.clone());
        c_route
            .set_attr(SaiAttr::new(
                meta("SAI_ROUTE_ENTRY_ATTR_NEXT_HOP_ID"),
                AttrValue::Oid(vid(ObjectType::NextHop, 1)),
            ))
            .unwrap();
        current.insert(c_route).unwrap();

        let mut t_route = SaiObject::new_entry(route_key);
        t_route
            .set_attr(SaiAttr::new(
                meta("SAI_ROUTE_ENTRY_ATTR_NEXT_HOP_ID"),
                AttrValue::Oid(vid(ObjectType::NextHop, 2)),
            ))
            .unwrap();
        temp.insert(t_route).unwrap();

        let ops = run(&mut current, &mut temp, &ApplyConfig::default());
        assert_eq!(ops.len(), 1, "expected a single set, got {ops:?}");
        match &ops[0] {
            ViewOp::Set { object_type, attr, .. } => {
                assert_eq!(*object_type, ObjectType::RouteEntry);
                assert_eq!(attr.0, "SAI_ROUTE_ENTRY_ATTR_NEXT_HOP_ID");
            }
            other => panic!("expected set, got {other:?}"),
        }
    }

    #[test]
    fn test_second_run_after_apply_emits_zero_ops() {
        // Run the next-hop swap, then rebuild the current view as the
        // applied result and diff again: nothing should remain.
        let (mut current, mut temp) = baseline();
        let port_vid = vid(ObjectType::Port, 1);
        let t_port = temp.find_by_vid(port_vid).unwrap();
        temp.object_mut(t_port)
            .set_attr(SaiAttr::new(meta("SAI_PORT_ATTR_SPEED"), AttrValue::U32(40000)))
            .unwrap();
        let ops = run(&mut current, &mut temp, &ApplyConfig::default());
        assert_eq!(ops.len(), 1);

        // The applied state: temp records plus the id bindings accumulated
        // during the run.
        let mut applied = AsicView::from_records(temp.to_records()).unwrap();
        for (v, r) in temp.id_map.iter() {
            applied.id_map.bind(v, r).unwrap();
        }
        let mut temp_again = AsicView::from_records(temp.to_records()).unwrap();

        let ops = run(&mut applied, &mut temp_again, &ApplyConfig::default());
        assert!(ops.is_empty(), "second run must be a no-op, got {ops:?}");
    }

    #[test]
    fn test_create_only_difference_replaces_object_graph() {
        let (mut current, mut temp) = baseline();

        // Current: ingress buffer pool with a profile on top.
        current
            .insert(oid_object(
                ObjectType::BufferPool,
                1,
                &[
                    ("SAI_BUFFER_POOL_ATTR_TYPE", AttrValue::I32(0)),
                    ("SAI_BUFFER_POOL_ATTR_SIZE", AttrValue::U64(4096)),
                ],
            ))
            .unwrap();
        current
            .insert(oid_object(
                ObjectType::BufferProfile,
                1,
                &[
                    (
                        "SAI_BUFFER_PROFILE_ATTR_POOL_ID",
                        AttrValue::Oid(vid(ObjectType::BufferPool, 1)),
                    ),
                    ("SAI_BUFFER_PROFILE_ATTR_BUFFER_SIZE", AttrValue::U64(64)),
                ],
            ))
            .unwrap();
        current
            .id_map
            .bind(vid(ObjectType::BufferPool, 1), ObjectId(0x4001))
            .unwrap();
        current
            .id_map
            .bind(vid(ObjectType::BufferProfile, 1), ObjectId(0x4002))
            .unwrap();

        // Temporary: same shape but the pool TYPE (create-only) differs.
        temp.insert(oid_object(
            ObjectType::BufferPool,
            30,
            &[
                ("SAI_BUFFER_POOL_ATTR_TYPE", AttrValue::I32(1)),
                ("SAI_BUFFER_POOL_ATTR_SIZE", AttrValue::U64(4096)),
            ],
        ))
        .unwrap();
        temp.insert(oid_object(
            ObjectType::BufferProfile,
            31,
            &[
                (
                    "SAI_BUFFER_PROFILE_ATTR_POOL_ID",
                    AttrValue::Oid(vid(ObjectType::BufferPool, 30)),
                ),
                ("SAI_BUFFER_PROFILE_ATTR_BUFFER_SIZE", AttrValue::U64(64)),
            ],
        ))
        .unwrap();

        let ops = run(&mut current, &mut temp, &ApplyConfig::default());

        // New pool and profile created; old profile removed before old pool.
        let create_pool = op_position(&ops, |op| {
            matches!(op, ViewOp::Create { object_type, .. } if *object_type == ObjectType::BufferPool)
        });
        let create_profile = op_position(&ops, |op| {
            matches!(op, ViewOp::Create { object_type, .. } if *object_type == ObjectType::BufferProfile)
        });
        let remove_profile = op_position(&ops, |op| {
            matches!(op, ViewOp::Remove { object_type, .. } if *object_type == ObjectType::BufferProfile)
        });
        let remove_pool = op_position(&ops, |op| {
            matches!(op, ViewOp::Remove { object_type, .. } if *object_type == ObjectType::BufferPool)
        });
        assert!(create_pool < create_profile);
        assert!(remove_profile < remove_pool, "dependent removed first");
    }

    #[test]
    fn test_matched_object_with_differing_create_only_is_recreated() {
        let (mut current, mut temp) = baseline();

        // Host interface matched by VID but its create-only NAME differs.
        let mut name_a = [0u8; asic_model::CHAR_DATA_LEN];
        name_a[..4].copy_from_slice(b"eth0");
        let mut name_b = [0u8; asic_model::CHAR_DATA_LEN];
        name_b[..4].copy_from_slice(b"eth1");

        let hostif = |name: [u8; asic_model::CHAR_DATA_LEN]| {
            oid_object(
                ObjectType::HostIf,
                1,
                &[
                    ("SAI_HOSTIF_ATTR_TYPE", AttrValue::I32(0)),
                    ("SAI_HOSTIF_ATTR_NAME", AttrValue::CharData(name)),
                ],
            )
        };
        current.insert(hostif(name_a)).unwrap();
        temp.insert(hostif(name_b)).unwrap();
        current
            .id_map
            .bind(vid(ObjectType::HostIf, 1), ObjectId(0x5000))
            .unwrap();

        let ops = run(&mut current, &mut temp, &ApplyConfig::default());
        let remove = op_position(&ops, |op| {
            matches!(op, ViewOp::Remove { object_type, .. } if *object_type == ObjectType::HostIf)
        });
        let create = op_position(&ops, |op| {
            matches!(op, ViewOp::Create { object_type, .. } if *object_type == ObjectType::HostIf)
        });
        assert!(remove < create, "old object must be removed before recreate");
    }

    #[test]
    fn test_non_removable_default_is_adopted_with_sets_only() {
        let (mut current, mut temp) = baseline();
        let port_vid = vid(ObjectType::Port, 1);

        // Temporary port differs in create-only lanes and in speed.
        let t_port = temp.find_by_vid(port_vid).unwrap();
        temp.object_mut(t_port)
            .set_attr(SaiAttr::new(
                meta("SAI_PORT_ATTR_HW_LANE_LIST"),
                AttrValue::U32List(vec![4, 5, 6, 7]),
            ))
            .unwrap();
        temp.object_mut(t_port)
            .set_attr(SaiAttr::new(meta("SAI_PORT_ATTR_SPEED"), AttrValue::U32(40000)))
            .unwrap();

        let config = ApplyConfig {
            seed: 0,
            non_removable: HashSet::from([port_vid]),
        };
        let ops = run(&mut current, &mut temp, &config);

        assert!(
            !ops.iter().any(|op| matches!(op, ViewOp::Remove { .. })),
            "non-removable port must not be removed: {ops:?}"
        );
        assert!(
            !ops.iter().any(|op| matches!(op, ViewOp::Create { .. })),
            "non-removable port must not be recreated: {ops:?}"
        );
        assert!(ops.iter().any(|op| matches!(
            op,
            ViewOp::Set { attr, .. } if attr.0 == "SAI_PORT_ATTR_SPEED"
        )));
    }

    #[test]
    fn test_orphans_removed_in_reverse_dependency_order() {
        let (mut current, mut temp) = baseline();

        // Current-only chain: scheduler group -> scheduler.
        current
            .insert(oid_object(ObjectType::Scheduler, 1, &[]))
            .unwrap();
        current
            .insert(oid_object(
                ObjectType::SchedulerGroup,
                1,
                &[
                    (
                        "SAI_SCHEDULER_GROUP_ATTR_PORT_ID",
                        AttrValue::Oid(vid(ObjectType::Port, 1)),
                    ),
                    ("SAI_SCHEDULER_GROUP_ATTR_LEVEL", AttrValue::U8(0)),
                    (
                        "SAI_SCHEDULER_GROUP_ATTR_SCHEDULER_PROFILE_ID",
                        AttrValue::Oid(vid(ObjectType::Scheduler, 1)),
                    ),
                ],
            ))
            .unwrap();
        current
            .id_map
            .bind(vid(ObjectType::Scheduler, 1), ObjectId(0x6001))
            .unwrap();
        current
            .id_map
            .bind(vid(ObjectType::SchedulerGroup, 1), ObjectId(0x6002))
            .unwrap();

        let ops = run(&mut current, &mut temp, &ApplyConfig::default());
        let remove_group = op_position(&ops, |op| {
            matches!(op, ViewOp::Remove { object_type, .. } if *object_type == ObjectType::SchedulerGroup)
        });
        let remove_sched = op_position(&ops, |op| {
            matches!(op, ViewOp::Remove { object_type, .. } if *object_type == ObjectType::Scheduler)
        });
        assert!(remove_group < remove_sched, "referrer removed before referee");
    }

    #[test]
    fn test_orphaned_default_is_left_in_place() {
        let (mut current, mut temp) = baseline();

        let queue_vid = vid(ObjectType::Queue, 1);
        current
            .insert(oid_object(
                ObjectType::Queue,
                1,
                &[("SAI_QUEUE_ATTR_INDEX", AttrValue::U8(0))],
            ))
            .unwrap();
        current.id_map.bind(queue_vid, ObjectId(0x7001)).unwrap();

        let config = ApplyConfig {
            seed: 0,
            non_removable: HashSet::from([queue_vid]),
        };
        let ops = run(&mut current, &mut temp, &config);
        assert!(
            ops.is_empty(),
            "orphaned default must not produce ops: {ops:?}"
        );
        let q_idx = current.find_by_vid(queue_vid).unwrap();
        assert_eq!(current.object(q_idx).status(), ObjectStatus::Final);
    }

    #[test]
    fn test_mismatched_switch_count_is_fatal() {
        let (mut current, mut temp) = baseline();
        temp.insert(oid_object(ObjectType::Switch, 2, &[])).unwrap();
        let err = apply_view_transition(&mut current, &mut temp, &ApplyConfig::default());
        assert!(matches!(err, Err(ApplyError::Precondition(_))));
    }

    #[test]
    fn test_unmatched_port_is_fatal() {
        let (mut current, mut temp) = baseline();
        temp.insert(oid_object(
            ObjectType::Port,
            9,
            &[("SAI_PORT_ATTR_SPEED", AttrValue::U32(10000))],
        ))
        .unwrap();
        let err = apply_view_transition(&mut current, &mut temp, &ApplyConfig::default());
        assert!(matches!(err, Err(ApplyError::Precondition(_))));
    }
}
