//! The emitted operation stream.

use asic_model::ObjectType;
use asic_view::ObjectKey;

/// One operation of the reconciliation output, in execution order.
///
/// Attribute values are canonical strings still carrying **temporary-view
/// VIDs**; the executor translates them to RIDs at execution time, once the
/// RIDs of earlier creates are known. `Create` and `Set` keys are
/// temporary-view keys; `Remove` keys are current-view keys.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewOp {
    Create {
        object_type: ObjectType,
        key: ObjectKey,
        attrs: Vec<(String, String)>,
    },
    Set {
        object_type: ObjectType,
        key: ObjectKey,
        attr: (String, String),
    },
    Remove {
        object_type: ObjectType,
        key: ObjectKey,
    },
}

impl ViewOp {
    /// The object type this operation touches.
    #[must_use]
    pub fn object_type(&self) -> ObjectType {
        match self {
            ViewOp::Create { object_type, .. }
            | ViewOp::Set { object_type, .. }
            | ViewOp::Remove { object_type, .. } => *object_type,
        }
    }

    /// The object key this operation touches.
    #[must_use]
    pub fn key(&self) -> &ObjectKey {
        match self {
            ViewOp::Create { key, .. } | ViewOp::Set { key, .. } | ViewOp::Remove { key, .. } => {
                key
            }
        }
    }
}
