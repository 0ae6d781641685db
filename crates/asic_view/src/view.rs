//! The view container: flat object arena plus lookup indexes.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use asic_meta::Registry;
use asic_model::{EntryKey, IdMap, ObjectId, ObjectType};

use crate::error::ViewError;
use crate::object::{ObjectKey, ObjectStatus, SaiAttr, SaiObject};

/// Stable handle of an object inside one view.
pub type ObjIdx = usize;

/// A full ASIC object graph: either the state currently programmed (current
/// view) or the desired state (temporary view).
///
/// Objects are stored in an arena and addressed by index; the indexes by
/// type, canonical id and VID are maintained on insert. Objects are never
/// physically removed during reconciliation, they are marked
/// [`ObjectStatus::Removed`].
#[derive(Debug, Default)]
pub struct AsicView {
    objects: Vec<SaiObject>,
    by_canon: HashMap<String, ObjIdx>,
    by_vid: HashMap<ObjectId, ObjIdx>,
    by_type: BTreeMap<ObjectType, Vec<ObjIdx>>,
    /// VID ↔ RID bindings known to this view.
    pub id_map: IdMap,
}

impl AsicView {
    /// Create an empty view.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hydrate a view from persisted `(key, fields)` pairs.
    ///
    /// `key` follows the record grammar `"<OBJECT_TYPE>:<serialized-id>"`.
    /// The sentinel field `NULL=NULL` represents an object without
    /// attributes and is skipped. Attribute names resolve through the
    /// metadata registry and values deserialize through their metadata.
    pub fn from_records<I, F>(records: I) -> Result<AsicView, ViewError>
    where
        I: IntoIterator<Item = (String, F)>,
        F: IntoIterator<Item = (String, String)>,
    {
        let registry = Registry::global();
        let mut view = AsicView::new();

        for (key, fields) in records {
            let (type_name, id) = key
                .split_once(':')
                .ok_or_else(|| ViewError::ObjectNotFound(key.clone()))?;
            let object_type = ObjectType::from_name(type_name)?;

            let mut object = if object_type.is_entry() {
                SaiObject::new_entry(EntryKey::from_canon(object_type, id)?)
            } else {
                let vid: ObjectId = id.parse()?;
                let object = SaiObject::new_oid(vid)?;
                if object.object_type() != object_type {
                    return Err(ViewError::VidTypeMismatch {
                        vid: vid.to_string(),
                        decoded: object.object_type(),
                        actual: object_type,
                    });
                }
                object
            };

            for (name, value) in fields {
                if name == "NULL" {
                    continue;
                }
                let (_, meta) = registry.by_name(&name)?;
                object.set_attr(SaiAttr::from_canon(meta, &value)?)?;
            }

            view.insert(object)?;
        }

        debug!(objects = view.len(), "view hydrated");
        Ok(view)
    }

    /// Insert an object, indexing it. Duplicate canonical ids are rejected.
    pub fn insert(&mut self, object: SaiObject) -> Result<ObjIdx, ViewError> {
        let canon = object.canon_id();
        if self.by_canon.contains_key(&canon) {
            return Err(ViewError::DuplicateObject(canon));
        }
        let idx = self.objects.len();
        if let Some(vid) = object.vid() {
            self.by_vid.insert(vid, idx);
        }
        self.by_type.entry(object.object_type()).or_default().push(idx);
        self.by_canon.insert(canon, idx);
        self.objects.push(object);
        Ok(idx)
    }

    /// Number of objects (all statuses).
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the view holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    #[must_use]
    pub fn object(&self, idx: ObjIdx) -> &SaiObject {
        &self.objects[idx]
    }

    pub fn object_mut(&mut self, idx: ObjIdx) -> &mut SaiObject {
        &mut self.objects[idx]
    }

    /// Every object index, in insertion order.
    pub fn indices(&self) -> impl Iterator<Item = ObjIdx> + '_ {
        0..self.objects.len()
    }

    /// Find an object by canonical serialized id.
    #[must_use]
    pub fn find_by_canon(&self, canon: &str) -> Option<ObjIdx> {
        self.by_canon.get(canon).copied()
    }

    /// Find an oid object by VID.
    #[must_use]
    pub fn find_by_vid(&self, vid: ObjectId) -> Option<ObjIdx> {
        self.by_vid.get(&vid).copied()
    }

    /// Find a structured entry by key (O(1) via the canonical form).
    #[must_use]
    pub fn find_entry(&self, key: &EntryKey) -> Option<ObjIdx> {
        self.find_by_canon(&key.to_canon())
    }

    /// Objects of one type, in stable insertion order.
    #[must_use]
    pub fn objects_of_type(&self, ot: ObjectType) -> Vec<ObjIdx> {
        self.by_type.get(&ot).cloned().unwrap_or_default()
    }

    /// Objects of one type still in `NotProcessed`.
    #[must_use]
    pub fn unprocessed_of_type(&self, ot: ObjectType) -> Vec<ObjIdx> {
        self.objects_of_type(ot)
            .into_iter()
            .filter(|&idx| self.objects[idx].status() == ObjectStatus::NotProcessed)
            .collect()
    }

    /// Indices of every object not yet in the given status.
    #[must_use]
    pub fn not_in_status(&self, status: ObjectStatus) -> Vec<ObjIdx> {
        self.indices()
            .filter(|&idx| self.objects[idx].status() != status)
            .collect()
    }

    /// Validate the structural invariants:
    ///
    /// 1. every oid object's VID decodes to its own type,
    /// 2. every referenced VID exists in this view and its type is allowed
    ///    by the referencing attribute's metadata.
    pub fn validate(&self) -> Result<(), ViewError> {
        let registry = Registry::global();
        for object in &self.objects {
            if let Some(vid) = object.vid() {
                let decoded = vid.object_type()?;
                if decoded != object.object_type() {
                    return Err(ViewError::VidTypeMismatch {
                        vid: vid.to_string(),
                        decoded,
                        actual: object.object_type(),
                    });
                }
            }
            for attr in object.attrs() {
                for oid in attr.oids() {
                    if self.find_by_vid(oid).is_none() {
                        return Err(ViewError::DanglingReference {
                            object: object.canon_id(),
                            attr: attr.name().to_string(),
                            vid: oid.to_string(),
                        });
                    }
                    registry.check_value(object.object_type(), attr.id(), attr.value())?;
                }
            }
            if let Some(key) = object.entry_key() {
                for oid in key.oids() {
                    if !oid.is_null() && self.find_by_vid(oid).is_none() {
                        return Err(ViewError::DanglingReference {
                            object: object.canon_id(),
                            attr: "<key>".to_string(),
                            vid: oid.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Serialize every object back to `(key, fields)` pairs, the exact
    /// shape [`AsicView::from_records`] consumes. Attribute-less objects
    /// yield the `NULL=NULL` sentinel field.
    #[must_use]
    pub fn to_records(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.objects
            .iter()
            .map(|object| {
                let key = format!("{}:{}", object.object_type().name(), object.canon_id());
                let fields: Vec<(String, String)> = if object.attrs().is_empty() {
                    vec![("NULL".to_string(), "NULL".to_string())]
                } else {
                    object
                        .attrs()
                        .iter()
                        .map(|a| (a.name().to_string(), a.canon().to_string()))
                        .collect()
                };
                (key, fields)
            })
            .collect()
    }
}
