//! Execution of a reconciliation op stream against the driver.
//!
//! Operations leave the diff engine carrying VIDs; translation happens
//! here, at execution time, once the RIDs of earlier creates are known.
//! Create and set operations resolve through the temporary view's map
//! (which accumulates bindings as creates return), removes through the
//! current view's map.
//!
//! Execution stops at the first failing operation; the offending object's
//! full attribute set is dumped before the error propagates, and already
//! executed operations are not rolled back.

use tracing::{debug, error, info};

use asic_apply::ViewOp;
use asic_driver::{Attr, Driver, DriverError};
use asic_meta::{MetaError, Registry};
use asic_model::{EntryKey, IdMap, ModelError, ObjectId, ObjectType};
use asic_view::{AsicView, ObjectKey};

/// Errors aborting op-stream execution.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Meta(#[from] MetaError),

    #[error("vid {0} has no rid binding at execution time")]
    MissingBinding(ObjectId),
}

fn translate(map: &IdMap, vid: ObjectId) -> Result<ObjectId, ExecError> {
    map.rid(vid).ok_or(ExecError::MissingBinding(vid))
}

fn build_attr(
    object_type: ObjectType,
    name: &str,
    canon: &str,
    map: &IdMap,
) -> Result<Attr, ExecError> {
    let registry = Registry::global();
    let (owner, meta) = registry.by_name(name)?;
    debug_assert_eq!(owner, object_type);
    let mut value = meta.deserialize_value(canon)?;
    value.map_oids(|vid| translate(map, vid))?;
    Ok(Attr::new(meta, value))
}

fn entry_key_for_driver(key: &EntryKey, map: &IdMap) -> Result<EntryKey, ExecError> {
    let mut key = key.clone();
    key.map_oids(|vid| translate(map, vid))?;
    Ok(key)
}

/// Log the failing operation's object with its full attribute set, the
/// same diagnostic hard reinit emits on a failed replay.
fn dump_failed(view: &AsicView, object_type: ObjectType, key: &ObjectKey) {
    let what = format!("{}:{}", object_type.name(), key.canon());
    match view.find_by_canon(&key.canon()) {
        Some(idx) => error!(
            object = %what,
            attrs = %view.object(idx).dump_attrs(),
            "apply failed, offending object attributes follow"
        ),
        None => error!(object = %what, "apply failed, object not present in view"),
    }
}

fn execute_op(
    driver: &dyn Driver,
    op: &ViewOp,
    current: &AsicView,
    temp: &mut AsicView,
) -> Result<(), ExecError> {
    match op {
        ViewOp::Create {
            object_type,
            key: ObjectKey::Oid(vid),
            attrs,
        } => {
            let driver_attrs: Vec<Attr> = attrs
                .iter()
                .map(|(name, canon)| build_attr(*object_type, name, canon, &temp.id_map))
                .collect::<Result<_, _>>()?;
            let rid = driver.create(*object_type, &driver_attrs)?;
            temp.id_map.bind(*vid, rid)?;
            debug!(%vid, %rid, %object_type, "created");
        }
        ViewOp::Create {
            object_type,
            key: ObjectKey::Entry(key),
            attrs,
        } => {
            let driver_attrs: Vec<Attr> = attrs
                .iter()
                .map(|(name, canon)| build_attr(*object_type, name, canon, &temp.id_map))
                .collect::<Result<_, _>>()?;
            let driver_key = entry_key_for_driver(key, &temp.id_map)?;
            driver.create_entry(&driver_key, &driver_attrs)?;
        }
        ViewOp::Set {
            object_type,
            key: ObjectKey::Oid(vid),
            attr,
        } => {
            let attr = build_attr(*object_type, &attr.0, &attr.1, &temp.id_map)?;
            let rid = translate(&temp.id_map, *vid)?;
            driver.set(rid, &attr)?;
        }
        ViewOp::Set {
            object_type,
            key: ObjectKey::Entry(key),
            attr,
        } => {
            let attr = build_attr(*object_type, &attr.0, &attr.1, &temp.id_map)?;
            let driver_key = entry_key_for_driver(key, &temp.id_map)?;
            driver.set_entry(&driver_key, &attr)?;
        }
        ViewOp::Remove {
            key: ObjectKey::Oid(vid),
            ..
        } => {
            let rid = translate(&current.id_map, *vid)?;
            driver.remove(rid)?;
        }
        ViewOp::Remove {
            key: ObjectKey::Entry(key),
            ..
        } => {
            let driver_key = entry_key_for_driver(key, &current.id_map)?;
            driver.remove_entry(&driver_key)?;
        }
    }
    Ok(())
}

/// Apply the op stream in order. Newly created oid objects are bound into
/// the temporary view's identifier map as their RIDs come back.
pub fn execute(
    driver: &dyn Driver,
    ops: &[ViewOp],
    current: &AsicView,
    temp: &mut AsicView,
) -> Result<(), ExecError> {
    for op in ops {
        if let Err(err) = execute_op(driver, op, current, temp) {
            // Removes act on the current view, everything else on the
            // temporary one.
            let view = match op {
                ViewOp::Remove { .. } => current,
                _ => &*temp,
            };
            dump_failed(view, op.object_type(), op.key());
            return Err(err);
        }
    }
    info!(ops = ops.len(), "op stream executed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use asic_driver::VirtualSwitch;
    use asic_model::AttrValue;
    use asic_view::{SaiAttr, SaiObject};

    fn meta(name: &str) -> &'static asic_meta::AttrMeta {
        Registry::global().by_name(name).unwrap().1
    }

    #[test]
    fn test_execute_binds_created_rids_in_order() {
        let driver = VirtualSwitch::new();
        driver.initialize().unwrap();

        let current = AsicView::new();
        let mut temp = AsicView::new();
        let pool_vid = ObjectId::encode(0, ObjectType::BufferPool, 1).unwrap();
        let profile_vid = ObjectId::encode(0, ObjectType::BufferProfile, 1).unwrap();
        let mut pool = SaiObject::new_oid(pool_vid).unwrap();
        pool.set_attr(SaiAttr::new(meta("SAI_BUFFER_POOL_ATTR_TYPE"), AttrValue::I32(0)))
            .unwrap();
        pool.set_attr(SaiAttr::new(meta("SAI_BUFFER_POOL_ATTR_SIZE"), AttrValue::U64(4096)))
            .unwrap();
        temp.insert(pool).unwrap();
        let mut profile = SaiObject::new_oid(profile_vid).unwrap();
        profile
            .set_attr(SaiAttr::new(
                meta("SAI_BUFFER_PROFILE_ATTR_POOL_ID"),
                AttrValue::Oid(pool_vid),
            ))
            .unwrap();
        profile
            .set_attr(SaiAttr::new(
                meta("SAI_BUFFER_PROFILE_ATTR_BUFFER_SIZE"),
                AttrValue::U64(64),
            ))
            .unwrap();
        temp.insert(profile).unwrap();

        let ops = vec![
            ViewOp::Create {
                object_type: ObjectType::BufferPool,
                key: ObjectKey::Oid(pool_vid),
                attrs: vec![
                    ("SAI_BUFFER_POOL_ATTR_TYPE".to_string(), "SAI_BUFFER_POOL_TYPE_INGRESS".to_string()),
                    ("SAI_BUFFER_POOL_ATTR_SIZE".to_string(), "4096".to_string()),
                ],
            },
            ViewOp::Create {
                object_type: ObjectType::BufferProfile,
                key: ObjectKey::Oid(profile_vid),
                attrs: vec![
                    ("SAI_BUFFER_PROFILE_ATTR_POOL_ID".to_string(), pool_vid.to_string()),
                    ("SAI_BUFFER_PROFILE_ATTR_BUFFER_SIZE".to_string(), "64".to_string()),
                ],
            },
        ];
        execute(&driver, &ops, &current, &mut temp).unwrap();

        let pool_rid = temp.id_map.rid(pool_vid).unwrap();
        let profile_rid = temp.id_map.rid(profile_vid).unwrap();
        assert_eq!(driver.object_type_of(pool_rid).unwrap(), ObjectType::BufferPool);
        let got = driver
            .get(profile_rid, &[meta("SAI_BUFFER_PROFILE_ATTR_POOL_ID").id], 16)
            .unwrap();
        assert_eq!(got[0].value, AttrValue::Oid(pool_rid));
    }

    #[test]
    fn test_execute_stops_at_first_failure() {
        let driver = VirtualSwitch::new();
        driver.initialize().unwrap();

        let current = AsicView::new();
        let mut temp = AsicView::new();
        let profile_vid = ObjectId::encode(0, ObjectType::BufferProfile, 1).unwrap();
        let pool_vid = ObjectId::encode(0, ObjectType::BufferPool, 1).unwrap();
        let mut profile = SaiObject::new_oid(profile_vid).unwrap();
        profile
            .set_attr(SaiAttr::new(
                meta("SAI_BUFFER_PROFILE_ATTR_POOL_ID"),
                AttrValue::Oid(pool_vid),
            ))
            .unwrap();
        temp.insert(profile).unwrap();

        // The referenced pool was never created, so its vid has no rid and
        // the create must fail before reaching the driver.
        let ops = vec![ViewOp::Create {
            object_type: ObjectType::BufferProfile,
            key: ObjectKey::Oid(profile_vid),
            attrs: vec![(
                "SAI_BUFFER_PROFILE_ATTR_POOL_ID".to_string(),
                pool_vid.to_string(),
            )],
        }];
        let err = execute(&driver, &ops, &current, &mut temp);
        assert!(matches!(err, Err(ExecError::MissingBinding(vid)) if vid == pool_vid));
        assert!(temp.id_map.rid(profile_vid).is_none());
    }
}
