//! # asic_view
//!
//! In-memory typed object graph. A view holds every object programmed on
//! (or desired for) one switch: oid objects addressed by VID and structured
//! entries addressed by their canonical key, each carrying an attribute map
//! and a processing status used by the reconciliation engine.
//!
//! Object graphs are cyclic in general, so objects live in a flat arena and
//! all references between them go through VIDs, never through Rust
//! references.

mod error;
mod object;
mod view;

pub use error::ViewError;
pub use object::{ObjectKey, ObjectStatus, SaiAttr, SaiObject};
pub use view::{AsicView, ObjIdx};
