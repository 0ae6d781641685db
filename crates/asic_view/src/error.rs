//! View-layer error types.

use asic_meta::MetaError;
use asic_model::{ModelError, ObjectType};

/// Errors raised while building or validating a view.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    /// Two objects share one canonical id.
    #[error("duplicate object {0}")]
    DuplicateObject(String),

    /// An object id was looked up but is not present.
    #[error("object {0} not found in view")]
    ObjectNotFound(String),

    /// An attribute name resolved to a different object type than its
    /// carrier.
    #[error("attribute {attr} belongs to {expected}, object is {actual}")]
    ForeignAttribute {
        attr: String,
        expected: ObjectType,
        actual: ObjectType,
    },

    /// A VID decodes to a type other than its owner's.
    #[error("vid {vid} decodes to {decoded}, object is {actual}")]
    VidTypeMismatch {
        vid: String,
        decoded: ObjectType,
        actual: ObjectType,
    },

    /// An oid attribute references a VID absent from the view.
    #[error("object {object} attribute {attr} references missing vid {vid}")]
    DanglingReference {
        object: String,
        attr: String,
        vid: String,
    },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Meta(#[from] MetaError),
}
