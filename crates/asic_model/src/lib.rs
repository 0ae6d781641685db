//! # asic_model
//!
//! Core data model for the ASIC reconciliation engine: object identifiers,
//! the object-type enumeration, attribute values, structured entry keys and
//! their canonical string forms.
//!
//! The canonical string form is load-bearing: two attribute values (or two
//! entry keys) are considered equal at the diff level exactly when their
//! canonical strings are equal, so `serialize` and `deserialize` must be
//! total inverses for every value this crate can represent.

pub mod entry;
pub mod error;
pub mod object_type;
pub mod oid;
pub mod value;

pub use entry::EntryKey;
pub use error::ModelError;
pub use object_type::ObjectType;
pub use oid::{IdMap, ObjectId, Rid, Vid, VidAllocator};
pub use value::{
    AclAction, AclData, AclField, AttrValue, IpPrefix, Mac, QosMapItem, ValueKind, CHAR_DATA_LEN,
};
