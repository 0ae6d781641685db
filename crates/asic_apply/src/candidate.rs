//! Best-candidate selection: pairing a temporary-view object with its
//! continuation in the current view.
//!
//! Strategy order:
//!
//! 1. same-VID shortcut for objects already `Matched` by `match_oids`,
//! 2. exact key translation for structured entries and the key-attributed
//!    oid types (vlan, trap) plus the singleton switch,
//! 3. generic attribute-equivalence scoring with create-only
//!    disqualification, a per-type heuristic tie-break and a seeded random
//!    fallback.
//!
//! Selection never mutates either view.

use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, info, warn};

use asic_meta::{AttrMeta, Registry};
use asic_model::{ObjectId, ObjectType, ValueKind};
use asic_view::{AsicView, ObjIdx, ObjectStatus, SaiObject};

use crate::error::ApplyError;

/// Compare two oid slots (or slot lists) by lifting both sides through the
/// identity maps.
///
/// Lists are equal when they have the same length and every position pairs
/// either two nulls or two VIDs resolving to the same RID. A temporary VID
/// without a RID belongs to an object that will only be created later, so
/// it cannot equal anything existing. Order matters; permuted lists compare
/// unequal.
pub(crate) fn equal_oid_lists(
    current: &AsicView,
    temp: &AsicView,
    current_list: &[ObjectId],
    temp_list: &[ObjectId],
) -> Result<bool, ApplyError> {
    if current_list.len() != temp_list.len() {
        return Ok(false);
    }
    for (cv, tv) in current_list.iter().zip(temp_list) {
        if cv.is_null() && tv.is_null() {
            continue;
        }
        if cv.is_null() || tv.is_null() {
            return Ok(false);
        }
        if cv.object_type()? != tv.object_type()? {
            return Ok(false);
        }
        let Some(temp_rid) = temp.id_map.rid(*tv) else {
            debug!(vid = %tv, "temporary vid has no rid yet, lists unequal");
            return Ok(false);
        };
        let Some(current_rid) = current.id_map.rid(*cv) else {
            return Err(ApplyError::Internal(format!(
                "current vid {cv} exists but has no rid"
            )));
        };
        if temp_rid != current_rid {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Whether one attribute holds an equal value on both objects.
///
/// Canonical-string equality decides for every non-oid kind. Oid-valued
/// kinds get a second chance through RID lifting, since different VIDs may
/// name the same ASIC object. Pointer attributes are opaque and always
/// compare equal when present on both sides.
pub(crate) fn equal_attribute(
    current: &AsicView,
    temp: &AsicView,
    c_obj: &SaiObject,
    t_obj: &SaiObject,
    meta: &'static AttrMeta,
) -> Result<bool, ApplyError> {
    let (Some(ca), Some(ta)) = (c_obj.attr(meta.id), t_obj.attr(meta.id)) else {
        return Ok(false);
    };
    if meta.kind == ValueKind::Pointer {
        return Ok(true);
    }
    if ca.canon() == ta.canon() {
        return Ok(true);
    }
    if !meta.kind.holds_oids() {
        return Ok(false);
    }
    // Disabled ACL payloads serialize as "disabled" and were caught by the
    // string comparison; only enabled payloads carry ids worth lifting.
    let c_oids = ca.value().oids();
    let t_oids = ta.value().oids();
    equal_oid_lists(current, temp, &c_oids, &t_oids)
}

/// Result of scoring one current-view candidate.
#[derive(Debug, Clone, Copy)]
struct ScoredCandidate {
    idx: ObjIdx,
    equal_attrs: usize,
}

/// Child objects of `child_type` in `view` that reference `root_vid`
/// through a writable oid attribute which admits the root's type.
fn referencing_children(
    view: &AsicView,
    root_vid: ObjectId,
    root_type: ObjectType,
    child_type: ObjectType,
) -> Vec<ObjIdx> {
    let registry = Registry::global();
    let taking_attrs: Vec<_> = registry
        .attrs_of(child_type)
        .iter()
        .filter(|m| !m.is_read_only() && m.allowed_types.contains(&root_type))
        .map(|m| m.id)
        .collect();
    if taking_attrs.is_empty() {
        return Vec::new();
    }
    view.objects_of_type(child_type)
        .into_iter()
        .filter(|&idx| {
            let obj = view.object(idx);
            taking_attrs.iter().any(|&id| {
                obj.attr(id)
                    .map(|a| a.value().oids().contains(&root_vid))
                    .unwrap_or(false)
            })
        })
        .collect()
}

/// RIDs of every already-matched object reachable from a buffer pool
/// through its buffer profiles into queues, priority groups and ports.
fn matched_dependents_of_pool(view: &AsicView, pool_idx: ObjIdx) -> Vec<ObjectId> {
    let pool = view.object(pool_idx);
    let Some(pool_vid) = pool.vid() else {
        return Vec::new();
    };
    let mut rids = Vec::new();
    let profiles = referencing_children(
        view,
        pool_vid,
        ObjectType::BufferPool,
        ObjectType::BufferProfile,
    );
    for profile_idx in profiles {
        let Some(profile_vid) = view.object(profile_idx).vid() else {
            continue;
        };
        for child_type in [
            ObjectType::Queue,
            ObjectType::PriorityGroup,
            ObjectType::Port,
        ] {
            for dep_idx in
                referencing_children(view, profile_vid, ObjectType::BufferProfile, child_type)
            {
                let dep = view.object(dep_idx);
                if dep.status() != ObjectStatus::Matched {
                    continue;
                }
                if let Some(rid) = dep.vid().and_then(|v| view.id_map.rid(v)) {
                    rids.push(rid);
                }
            }
        }
    }
    rids
}

/// Tie-break among equally scored buffer pools: prefer the candidate whose
/// matched transitive dependents overlap most with the temporary object's.
fn buffer_pool_heuristic(
    current: &AsicView,
    temp: &AsicView,
    t_idx: ObjIdx,
    tied: &[ScoredCandidate],
) -> Option<ObjIdx> {
    let temp_rids = matched_dependents_of_pool(temp, t_idx);
    if temp_rids.is_empty() {
        return None;
    }
    let mut best: Option<(usize, ObjIdx)> = None;
    for candidate in tied {
        let current_rids = matched_dependents_of_pool(current, candidate.idx);
        let overlap = current_rids
            .iter()
            .filter(|rid| temp_rids.contains(rid))
            .count();
        if overlap > 0 && best.map(|(b, _)| overlap > b).unwrap_or(true) {
            best = Some((overlap, candidate.idx));
        }
    }
    best.map(|(_, idx)| idx)
}

/// Pick uniformly at random among tied candidates. The rng is seeded from
/// configuration so test runs are reproducible.
fn random_candidate(rng: &mut StdRng, tied: &[ScoredCandidate]) -> ObjIdx {
    let pick = rng.gen_range(0..tied.len());
    tied[pick].idx
}

/// Generic scoring path over unprocessed current-view objects of the same
/// type.
fn generic_best_match(
    current: &AsicView,
    temp: &AsicView,
    t_idx: ObjIdx,
    rng: &mut StdRng,
) -> Result<Option<ObjIdx>, ApplyError> {
    let t_obj = temp.object(t_idx);
    let candidates = current.unprocessed_of_type(t_obj.object_type());

    let mut scored = Vec::new();
    'candidates: for c_idx in candidates {
        let c_obj = current.object(c_idx);
        let mut equal_attrs = 0usize;
        for attr in t_obj.attrs() {
            if equal_attribute(current, temp, c_obj, t_obj, attr.meta())? {
                equal_attrs += 1;
            } else if attr.meta().is_create_only() && c_obj.has_attr(attr.id()) {
                // A differing create-only attribute can never be updated in
                // place; this candidate is unusable.
                continue 'candidates;
            }
        }
        scored.push(ScoredCandidate {
            idx: c_idx,
            equal_attrs,
        });
    }

    if scored.is_empty() {
        return Ok(None);
    }
    if scored.len() == 1 {
        return Ok(Some(scored[0].idx));
    }

    scored.sort_by(|a, b| b.equal_attrs.cmp(&a.equal_attrs));
    if scored[0].equal_attrs > scored[1].equal_attrs {
        return Ok(Some(scored[0].idx));
    }

    let top = scored[0].equal_attrs;
    let tied: Vec<ScoredCandidate> = scored
        .into_iter()
        .filter(|c| c.equal_attrs == top)
        .collect();

    if t_obj.object_type() == ObjectType::BufferPool {
        if let Some(idx) = buffer_pool_heuristic(current, temp, t_idx, &tied) {
            info!(
                object = %t_obj.canon_id(),
                candidate = %current.object(idx).canon_id(),
                "heuristic chose candidate"
            );
            return Ok(Some(idx));
        }
    }

    let idx = random_candidate(rng, &tied);
    warn!(
        object = %t_obj.canon_id(),
        candidate = %current.object(idx).canon_id(),
        pool = tied.len(),
        "random candidate selected"
    );
    Ok(Some(idx))
}

/// Key translation path for structured entries: rewrite every VID embedded
/// in the key through temp-RID then current-VID, and look the translated
/// key up directly.
fn entry_best_match(
    current: &AsicView,
    temp: &AsicView,
    t_idx: ObjIdx,
) -> Result<Option<ObjIdx>, ApplyError> {
    let t_obj = temp.object(t_idx);
    let mut key = t_obj
        .entry_key()
        .ok_or_else(|| ApplyError::Internal(format!("{} is not an entry", t_obj.canon_id())))?
        .clone();

    // A referenced object without a RID will be created later, so the
    // translated key cannot exist in the current view.
    let mut translatable = true;
    key.map_oids(|vid| {
        let Some(rid) = temp.id_map.rid(vid) else {
            translatable = false;
            return Ok::<_, ApplyError>(vid);
        };
        let Some(current_vid) = current.id_map.vid(rid) else {
            return Err(ApplyError::Internal(format!(
                "rid {rid} known to temp view but absent from current map"
            )));
        };
        Ok(current_vid)
    })?;
    if !translatable {
        return Ok(None);
    }

    match current.find_entry(&key) {
        None => Ok(None),
        Some(c_idx) => {
            let c_obj = current.object(c_idx);
            if c_obj.status() != ObjectStatus::NotProcessed {
                return Err(ApplyError::Internal(format!(
                    "entry {} found in current view but already processed",
                    c_obj.canon_id()
                )));
            }
            Ok(Some(c_idx))
        }
    }
}

/// Exact-key path for oid types whose identity is a key attribute (vlan id,
/// trap type).
fn key_attr_best_match(
    current: &AsicView,
    temp: &AsicView,
    t_idx: ObjIdx,
) -> Result<Option<ObjIdx>, ApplyError> {
    let t_obj = temp.object(t_idx);
    let registry = Registry::global();
    let key_metas: Vec<_> = registry
        .attrs_of(t_obj.object_type())
        .iter()
        .filter(|m| m.is_key)
        .collect();

    for c_idx in current.unprocessed_of_type(t_obj.object_type()) {
        let c_obj = current.object(c_idx);
        let mut all_equal = true;
        for meta in &key_metas {
            if !equal_attribute(current, temp, c_obj, t_obj, *meta)? {
                all_equal = false;
                break;
            }
        }
        if all_equal {
            return Ok(Some(c_idx));
        }
    }
    Ok(None)
}

/// The singleton switch: both views carry exactly one (checked up front),
/// match it unconditionally.
fn switch_best_match(current: &AsicView) -> Result<Option<ObjIdx>, ApplyError> {
    let switches = current.objects_of_type(ObjectType::Switch);
    match switches.first() {
        Some(&idx) if current.object(idx).status() == ObjectStatus::NotProcessed => Ok(Some(idx)),
        Some(&idx) => {
            // Already matched through the VID shortcut.
            Ok(Some(idx))
        }
        None => Ok(None),
    }
}

/// Select the best current-view candidate for a temporary object.
pub fn best_match(
    current: &AsicView,
    temp: &AsicView,
    t_idx: ObjIdx,
    rng: &mut StdRng,
) -> Result<Option<ObjIdx>, ApplyError> {
    let t_obj = temp.object(t_idx);

    // Same-VID shortcut: match_oids already paired this object.
    if let Some(vid) = t_obj.vid() {
        if t_obj.status() == ObjectStatus::Matched {
            let idx = current.find_by_vid(vid).ok_or_else(|| {
                ApplyError::Internal(format!("matched vid {vid} missing from current view"))
            })?;
            return Ok(Some(idx));
        }
    }

    match t_obj.object_type() {
        ot if ot.is_entry() => entry_best_match(current, temp, t_idx),
        ObjectType::Switch => switch_best_match(current),
        ObjectType::Vlan | ObjectType::Trap => key_attr_best_match(current, temp, t_idx),
        _ => generic_best_match(current, temp, t_idx, rng),
    }
}
