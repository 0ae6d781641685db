//! # asic_driver
//!
//! The seam between the reconciliation engine and a vendor SAI driver: a
//! per-object-type dispatch trait plus the in-process virtual switch used
//! by tests and the default daemon profile.
//!
//! Everything crossing this boundary speaks RIDs; the identity layer has
//! already translated VIDs away.

pub mod vs;

use asic_meta::{AttrId, AttrMeta};
use asic_model::{AttrValue, EntryKey, ObjectType, Rid};

pub use vs::VirtualSwitch;

/// One attribute crossing the driver boundary.
#[derive(Debug, Clone)]
pub struct Attr {
    pub meta: &'static AttrMeta,
    pub value: AttrValue,
}

impl Attr {
    #[must_use]
    pub fn new(meta: &'static AttrMeta, value: AttrValue) -> Attr {
        Attr { meta, value }
    }
}

/// Driver status codes, mirroring the SAI status set the engine cares
/// about.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Unknown attribute, duplicate attribute on create, malformed list.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Object or attribute not present.
    #[error("not found: {0}")]
    NotFound(String),

    /// Create targets an existing key.
    #[error("item exists: {0}")]
    ItemExists(String),

    /// A GET list buffer was too small; carries the required count so the
    /// caller may retry.
    #[error("buffer overflow, {required} elements required")]
    BufferOverflow { required: usize },

    /// The driver does not support this attribute.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// The operation combination is not implemented.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// An attribute value violates its declared constraints.
    #[error("metadata violation: {0}")]
    MetadataViolation(String),

    /// A driver-internal invariant broke.
    #[error("internal driver error: {0}")]
    Internal(String),
}

impl DriverError {
    /// The SAI-style status name, used on response records.
    #[must_use]
    pub fn status_name(&self) -> &'static str {
        match self {
            DriverError::InvalidArgument(_) => "SAI_STATUS_INVALID_PARAMETER",
            DriverError::NotFound(_) => "SAI_STATUS_ITEM_NOT_FOUND",
            DriverError::ItemExists(_) => "SAI_STATUS_ITEM_ALREADY_EXISTS",
            DriverError::BufferOverflow { .. } => "SAI_STATUS_BUFFER_OVERFLOW",
            DriverError::NotSupported(_) => "SAI_STATUS_NOT_SUPPORTED",
            DriverError::NotImplemented(_) => "SAI_STATUS_NOT_IMPLEMENTED",
            DriverError::MetadataViolation(_) => "SAI_STATUS_FAILURE",
            DriverError::Internal(_) => "SAI_STATUS_FAILURE",
        }
    }
}

/// The status name of a successful call.
pub const STATUS_SUCCESS: &str = "SAI_STATUS_SUCCESS";

/// Generic per-object-type dispatch into a vendor driver.
///
/// Oid objects are addressed by RID; structured entries carry their key
/// with every referenced id already translated to a RID.
pub trait Driver: Send + Sync {
    /// Initialize the switch, creating the driver defaults. Returns the
    /// switch RID, the discovery root.
    fn initialize(&self) -> Result<Rid, DriverError>;

    /// The object type behind a RID.
    fn object_type_of(&self, rid: Rid) -> Result<ObjectType, DriverError>;

    fn create(&self, object_type: ObjectType, attrs: &[Attr]) -> Result<Rid, DriverError>;

    fn remove(&self, rid: Rid) -> Result<(), DriverError>;

    fn set(&self, rid: Rid, attr: &Attr) -> Result<(), DriverError>;

    /// Fetch attributes by id. List-valued results longer than `max_list`
    /// fail with [`DriverError::BufferOverflow`].
    fn get(&self, rid: Rid, ids: &[AttrId], max_list: usize) -> Result<Vec<Attr>, DriverError>;

    fn create_entry(&self, key: &EntryKey, attrs: &[Attr]) -> Result<(), DriverError>;

    fn remove_entry(&self, key: &EntryKey) -> Result<(), DriverError>;

    fn set_entry(&self, key: &EntryKey, attr: &Attr) -> Result<(), DriverError>;

    fn get_entry(&self, key: &EntryKey, ids: &[AttrId]) -> Result<Vec<Attr>, DriverError>;

    /// Read statistics counters for an object.
    fn stats(&self, rid: Rid, counters: &[&str]) -> Result<Vec<u64>, DriverError>;
}
