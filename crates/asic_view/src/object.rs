//! Objects and attributes as stored in a view.

use asic_meta::{AttrId, AttrMeta, Registry};
use asic_model::{AttrValue, EntryKey, ModelError, ObjectId, ObjectType};

use crate::error::ViewError;

/// Processing status of an object during reconciliation.
///
/// Transitions are monotonic: `NotProcessed` objects either get `Matched`
/// and then `Final`, go straight to `Final` (created), or end up `Removed`
/// (current-view objects with no counterpart).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectStatus {
    /// Not looked at yet.
    #[default]
    NotProcessed,
    /// Paired with a counterpart in the other view; attributes may still
    /// differ.
    Matched,
    /// Fully processed; all required operations were emitted.
    Final,
    /// Scheduled for removal from the ASIC.
    Removed,
}

/// Identity of an object inside a view.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectKey {
    /// An oid object, addressed by VID.
    Oid(ObjectId),
    /// A structured entry, addressed by its key tuple.
    Entry(EntryKey),
}

impl ObjectKey {
    /// The canonical serialized id (`oid:0x…` or the JSON key form).
    #[must_use]
    pub fn canon(&self) -> String {
        match self {
            ObjectKey::Oid(oid) => oid.to_string(),
            ObjectKey::Entry(key) => key.to_canon(),
        }
    }
}

/// One attribute on an object: the typed value plus the canonical string it
/// arrived as.
///
/// The canonical form is kept so equality comparisons during matching never
/// re-serialize.
#[derive(Debug, Clone)]
pub struct SaiAttr {
    meta: &'static AttrMeta,
    value: AttrValue,
    canon: String,
}

impl SaiAttr {
    /// Build from a typed value; the canonical form is computed once.
    #[must_use]
    pub fn new(meta: &'static AttrMeta, value: AttrValue) -> SaiAttr {
        let canon = meta.serialize_value(&value);
        SaiAttr { meta, value, canon }
    }

    /// Build from the wire form, deserializing through metadata.
    pub fn from_canon(meta: &'static AttrMeta, canon: &str) -> Result<SaiAttr, ModelError> {
        let value = meta.deserialize_value(canon)?;
        Ok(SaiAttr {
            meta,
            value,
            canon: canon.to_string(),
        })
    }

    #[must_use]
    pub fn id(&self) -> AttrId {
        self.meta.id
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.meta.name
    }

    #[must_use]
    pub fn meta(&self) -> &'static AttrMeta {
        self.meta
    }

    #[must_use]
    pub fn value(&self) -> &AttrValue {
        &self.value
    }

    /// The canonical string form.
    #[must_use]
    pub fn canon(&self) -> &str {
        &self.canon
    }

    /// Object ids referenced by the value.
    #[must_use]
    pub fn oids(&self) -> Vec<ObjectId> {
        self.value.oids()
    }
}

/// One object in a view.
#[derive(Debug, Clone)]
pub struct SaiObject {
    object_type: ObjectType,
    key: ObjectKey,
    attrs: Vec<SaiAttr>,
    status: ObjectStatus,
}

impl SaiObject {
    /// Create an oid object with no attributes.
    pub fn new_oid(vid: ObjectId) -> Result<SaiObject, ViewError> {
        let object_type = vid.object_type()?;
        Ok(SaiObject {
            object_type,
            key: ObjectKey::Oid(vid),
            attrs: Vec::new(),
            status: ObjectStatus::NotProcessed,
        })
    }

    /// Create a structured entry with no attributes.
    #[must_use]
    pub fn new_entry(key: EntryKey) -> SaiObject {
        SaiObject {
            object_type: key.object_type(),
            key: ObjectKey::Entry(key),
            attrs: Vec::new(),
            status: ObjectStatus::NotProcessed,
        }
    }

    #[must_use]
    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    #[must_use]
    pub fn key(&self) -> &ObjectKey {
        &self.key
    }

    /// The VID, for oid objects.
    #[must_use]
    pub fn vid(&self) -> Option<ObjectId> {
        match &self.key {
            ObjectKey::Oid(vid) => Some(*vid),
            ObjectKey::Entry(_) => None,
        }
    }

    /// The structured key, for entries.
    #[must_use]
    pub fn entry_key(&self) -> Option<&EntryKey> {
        match &self.key {
            ObjectKey::Oid(_) => None,
            ObjectKey::Entry(key) => Some(key),
        }
    }

    /// The canonical serialized id.
    #[must_use]
    pub fn canon_id(&self) -> String {
        self.key.canon()
    }

    #[must_use]
    pub fn status(&self) -> ObjectStatus {
        self.status
    }

    pub fn set_status(&mut self, status: ObjectStatus) {
        self.status = status;
    }

    /// Add or replace an attribute. The attribute must belong to this
    /// object's type.
    pub fn set_attr(&mut self, attr: SaiAttr) -> Result<(), ViewError> {
        let registry = Registry::global();
        let (owner, _) = registry.by_name(attr.name())?;
        if owner != self.object_type {
            return Err(ViewError::ForeignAttribute {
                attr: attr.name().to_string(),
                expected: owner,
                actual: self.object_type,
            });
        }
        match self.attrs.iter_mut().find(|a| a.id() == attr.id()) {
            Some(slot) => *slot = attr,
            None => self.attrs.push(attr),
        }
        Ok(())
    }

    /// Remove an attribute, returning it if present.
    pub fn remove_attr(&mut self, id: AttrId) -> Option<SaiAttr> {
        let pos = self.attrs.iter().position(|a| a.id() == id)?;
        Some(self.attrs.remove(pos))
    }

    #[must_use]
    pub fn attr(&self, id: AttrId) -> Option<&SaiAttr> {
        self.attrs.iter().find(|a| a.id() == id)
    }

    #[must_use]
    pub fn has_attr(&self, id: AttrId) -> bool {
        self.attr(id).is_some()
    }

    /// Attributes in insertion order.
    #[must_use]
    pub fn attrs(&self) -> &[SaiAttr] {
        &self.attrs
    }

    /// Every VID this object references: oid-valued attributes plus, for
    /// entries, the ids embedded in the structured key. Nulls excluded.
    #[must_use]
    pub fn references(&self) -> Vec<ObjectId> {
        let mut refs = Vec::new();
        if let ObjectKey::Entry(key) = &self.key {
            refs.extend(key.oids());
        }
        for attr in &self.attrs {
            refs.extend(attr.oids());
        }
        refs.retain(|oid| !oid.is_null());
        refs
    }

    /// Dump every attribute as `name=value` lines, used by fatal-error
    /// diagnostics.
    #[must_use]
    pub fn dump_attrs(&self) -> String {
        let mut out = String::new();
        for attr in &self.attrs {
            out.push_str(attr.name());
            out.push('=');
            out.push_str(attr.canon());
            out.push('\n');
        }
        out
    }
}
