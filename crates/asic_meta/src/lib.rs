//! # asic_meta
//!
//! Runtime attribute metadata: for every object type and attribute id, the
//! value kind, mutability flags, default-value policy and the set of object
//! types an oid-valued attribute may reference.
//!
//! The registry plays the same role a schema plays for dynamically typed
//! storage: views validate and deserialize incoming attributes against it,
//! the diff engine consults it to decide whether a difference is settable,
//! and discovery uses it to know which attributes to walk.

mod tables;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use asic_model::{AttrValue, ModelError, ObjectType, ValueKind};

/// A per-object-type attribute identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct AttrId(pub u32);

/// How an attribute may change over the object lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutability {
    /// Settable only at create time; a difference forces remove + create.
    CreateOnly,
    /// Settable at create time and later via SET.
    CreateAndSet,
    /// Never written by the orchestrator; refreshed on GET.
    ReadOnly,
}

/// Default-value policy for an attribute missing from the desired state.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultPolicy {
    /// No default; the attribute cannot be reset once set.
    None,
    /// A concrete default value.
    Value(AttrValue),
    /// The empty list.
    EmptyList,
    /// The null object id.
    NullOid,
    /// Assigned internally by the switch at init (default VR mac, default
    /// trap group and similar); not expressible as a constant.
    SwitchInternal,
}

/// Metadata for one attribute of one object type.
#[derive(Debug, Clone)]
pub struct AttrMeta {
    pub id: AttrId,
    /// Canonical attribute name, e.g. `SAI_PORT_ATTR_SPEED`.
    pub name: &'static str,
    pub kind: ValueKind,
    pub mutability: Mutability,
    /// Part of the object's identity; cannot be updated in place.
    pub is_key: bool,
    pub mandatory_on_create: bool,
    pub default: DefaultPolicy,
    /// Object types a non-null oid value may reference. Empty for non-oid
    /// kinds.
    pub allowed_types: Vec<ObjectType>,
    /// Symbolic names for enum-valued attributes, indexed by value.
    pub enum_names: Option<&'static [&'static str]>,
}

impl AttrMeta {
    /// Whether this attribute may never appear in a diff.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.mutability == Mutability::ReadOnly
    }

    /// Whether a differing value forces remove + create.
    #[must_use]
    pub fn is_create_only(&self) -> bool {
        self.mutability == Mutability::CreateOnly
    }

    /// Whether the attribute has a concrete default it can be reset to.
    ///
    /// Mandatory-on-create attributes are excluded: even with a declared
    /// default they cannot be "unset" on a live object.
    #[must_use]
    pub fn resettable_default(&self) -> Option<AttrValue> {
        if self.mandatory_on_create {
            return None;
        }
        match &self.default {
            DefaultPolicy::Value(v) => Some(v.clone()),
            DefaultPolicy::EmptyList => match self.kind {
                ValueKind::U8List => Some(AttrValue::U8List(Vec::new())),
                ValueKind::U16List => Some(AttrValue::U16List(Vec::new())),
                ValueKind::U32List => Some(AttrValue::U32List(Vec::new())),
                ValueKind::I32List => Some(AttrValue::I32List(Vec::new())),
                ValueKind::VlanList => Some(AttrValue::VlanList(Vec::new())),
                ValueKind::OidList => Some(AttrValue::OidList(Vec::new())),
                ValueKind::QosMapList => Some(AttrValue::QosMapList(Vec::new())),
                _ => None,
            },
            DefaultPolicy::NullOid => Some(AttrValue::Oid(asic_model::ObjectId::NULL)),
            DefaultPolicy::None | DefaultPolicy::SwitchInternal => None,
        }
    }

    /// Serialize a value of this attribute to its canonical string,
    /// using symbolic enum names where declared.
    #[must_use]
    pub fn serialize_value(&self, value: &AttrValue) -> String {
        if let (Some(names), AttrValue::I32(v)) = (self.enum_names, value) {
            if let Ok(idx) = usize::try_from(*v) {
                if let Some(name) = names.get(idx) {
                    return (*name).to_string();
                }
            }
        }
        value.to_canon()
    }

    /// Parse a canonical string into a typed value of this attribute,
    /// accepting symbolic enum names.
    pub fn deserialize_value(&self, s: &str) -> Result<AttrValue, ModelError> {
        if let Some(names) = self.enum_names {
            if let Some(idx) = names.iter().position(|n| *n == s) {
                return Ok(AttrValue::I32(idx as i32));
            }
        }
        AttrValue::from_canon(self.kind, s)
    }
}

/// The full metadata registry: per-object-type attribute tables plus a
/// global name index.
#[derive(Debug)]
pub struct Registry {
    attrs: HashMap<ObjectType, Vec<AttrMeta>>,
    by_name: HashMap<&'static str, (ObjectType, AttrId)>,
}

/// Errors raised when looking up or validating against the registry.
#[derive(Debug, thiserror::Error)]
pub enum MetaError {
    #[error("object type {0} has no attribute id {1:?}")]
    UnknownAttr(ObjectType, AttrId),

    #[error("unknown attribute name: {0}")]
    UnknownAttrName(String),

    #[error("attribute {name} expects {expected:?}, got {actual:?}")]
    KindMismatch {
        name: &'static str,
        expected: ValueKind,
        actual: ValueKind,
    },

    #[error("attribute {name} may not reference {referenced}")]
    DisallowedReference {
        name: &'static str,
        referenced: ObjectType,
    },
}

impl Registry {
    pub(crate) fn from_tables(tables: Vec<(ObjectType, Vec<AttrMeta>)>) -> Self {
        let mut attrs = HashMap::new();
        let mut by_name = HashMap::new();
        for (ot, table) in tables {
            for meta in &table {
                by_name.insert(meta.name, (ot, meta.id));
            }
            attrs.insert(ot, table);
        }
        Self { attrs, by_name }
    }

    /// The built-in registry instance.
    #[must_use]
    pub fn global() -> &'static Registry {
        use std::sync::OnceLock;
        static REGISTRY: OnceLock<Registry> = OnceLock::new();
        REGISTRY.get_or_init(tables::builtin)
    }

    /// Metadata for one attribute.
    pub fn get(&self, ot: ObjectType, id: AttrId) -> Result<&AttrMeta, MetaError> {
        self.attrs
            .get(&ot)
            .and_then(|table| table.iter().find(|m| m.id == id))
            .ok_or(MetaError::UnknownAttr(ot, id))
    }

    /// Resolve an attribute by its canonical name.
    pub fn by_name(&self, name: &str) -> Result<(ObjectType, &AttrMeta), MetaError> {
        let (ot, id) = self
            .by_name
            .get(name)
            .copied()
            .ok_or_else(|| MetaError::UnknownAttrName(name.to_string()))?;
        Ok((ot, self.get(ot, id)?))
    }

    /// All attributes of an object type, in table order.
    #[must_use]
    pub fn attrs_of(&self, ot: ObjectType) -> &[AttrMeta] {
        self.attrs.get(&ot).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Validate that `value` is acceptable for the attribute: the kind must
    /// match and every referenced oid must decode to an allowed type.
    pub fn check_value(
        &self,
        ot: ObjectType,
        id: AttrId,
        value: &AttrValue,
    ) -> Result<(), MetaError> {
        let meta = self.get(ot, id)?;
        if value.kind() != meta.kind {
            return Err(MetaError::KindMismatch {
                name: meta.name,
                expected: meta.kind,
                actual: value.kind(),
            });
        }
        if meta.kind.holds_oids() {
            for oid in value.oids() {
                let referenced = oid.object_type().map_err(|_| {
                    MetaError::DisallowedReference {
                        name: meta.name,
                        referenced: ObjectType::Null,
                    }
                })?;
                if referenced != ObjectType::Null && !meta.allowed_types.contains(&referenced) {
                    return Err(MetaError::DisallowedReference {
                        name: meta.name,
                        referenced,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asic_model::ObjectId;

    #[test]
    fn test_global_registry_has_core_types() {
        let reg = Registry::global();
        assert!(!reg.attrs_of(ObjectType::Port).is_empty());
        assert!(!reg.attrs_of(ObjectType::RouteEntry).is_empty());
        assert!(!reg.attrs_of(ObjectType::Switch).is_empty());
    }

    #[test]
    fn test_name_lookup() {
        let reg = Registry::global();
        let (ot, meta) = reg.by_name("SAI_PORT_ATTR_SPEED").unwrap();
        assert_eq!(ot, ObjectType::Port);
        assert_eq!(meta.kind, ValueKind::U32);
        assert!(reg.by_name("SAI_PORT_ATTR_NO_SUCH").is_err());
    }

    #[test]
    fn test_enum_symbolic_serialization() {
        let reg = Registry::global();
        let (_, meta) = reg.by_name("SAI_ROUTE_ENTRY_ATTR_PACKET_ACTION").unwrap();
        let forward = meta.deserialize_value("SAI_PACKET_ACTION_FORWARD").unwrap();
        assert_eq!(meta.serialize_value(&forward), "SAI_PACKET_ACTION_FORWARD");

        // Out-of-range values fall back to decimal.
        let odd = AttrValue::I32(99);
        assert_eq!(meta.serialize_value(&odd), "99");
        assert_eq!(meta.deserialize_value("99").unwrap(), odd);
    }

    #[test]
    fn test_check_value_kind_mismatch() {
        let reg = Registry::global();
        let (ot, meta) = reg.by_name("SAI_PORT_ATTR_SPEED").unwrap();
        let err = reg.check_value(ot, meta.id, &AttrValue::Bool(true));
        assert!(matches!(err, Err(MetaError::KindMismatch { .. })));
    }

    #[test]
    fn test_check_value_reference_type() {
        let reg = Registry::global();
        let (ot, meta) = reg.by_name("SAI_ROUTE_ENTRY_ATTR_NEXT_HOP_ID").unwrap();

        let nh = ObjectId::encode(0, ObjectType::NextHop, 1).unwrap();
        reg.check_value(ot, meta.id, &AttrValue::Oid(nh)).unwrap();

        let vlan = ObjectId::encode(0, ObjectType::Vlan, 1).unwrap();
        let err = reg.check_value(ot, meta.id, &AttrValue::Oid(vlan));
        assert!(matches!(err, Err(MetaError::DisallowedReference { .. })));

        // Null references are always permitted.
        reg.check_value(ot, meta.id, &AttrValue::Oid(ObjectId::NULL))
            .unwrap();
    }

    #[test]
    fn test_key_attrs_are_create_only() {
        let reg = Registry::global();
        for ot in ObjectType::ALL {
            for meta in reg.attrs_of(ot) {
                if meta.is_key {
                    assert!(
                        meta.is_create_only(),
                        "{} is a key but not create-only",
                        meta.name
                    );
                }
            }
        }
    }

    #[test]
    fn test_read_only_attrs_have_no_default() {
        let reg = Registry::global();
        for ot in ObjectType::ALL {
            for meta in reg.attrs_of(ot) {
                if meta.is_read_only() {
                    assert!(
                        meta.resettable_default().is_none(),
                        "{} is read-only but resettable",
                        meta.name
                    );
                }
            }
        }
    }
}
