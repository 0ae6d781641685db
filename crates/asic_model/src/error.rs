//! Model-layer error types.

use crate::object_type::ObjectType;

/// Errors produced while encoding, decoding or validating model data.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// An object id carried an object-type byte outside the known set.
    #[error("invalid object type byte {0:#x} in object id")]
    InvalidObjectTypeByte(u8),

    /// An object-type name could not be resolved.
    #[error("unknown object type name: {0}")]
    UnknownObjectType(String),

    /// The per-type counter reached its 48-bit limit.
    #[error("object id counter overflow for {0}")]
    CounterOverflow(ObjectType),

    /// A canonical string could not be parsed back into a value.
    #[error("failed to parse {what} from {input:?}")]
    Parse {
        /// What was being parsed (value kind or key name).
        what: &'static str,
        /// The offending input.
        input: String,
    },

    /// The persisted VID/RID hashes are not mutual inverses.
    #[error("identifier maps are inconsistent: {0}")]
    InconsistentIdMap(String),

    /// An id was bound twice to different counterparts.
    #[error("duplicate identifier binding: {0}")]
    DuplicateBinding(String),
}
