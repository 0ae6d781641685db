//! # asic_apply
//!
//! The view-reconciliation core. Given the current view (what is programmed
//! on the ASIC) and a temporary view (what should be programmed), produce
//! the minimal ordered stream of create/remove/set operations that
//! transforms one into the other while keeping every intermediate state
//! consistent.
//!
//! The three stages:
//!
//! 1. `match_oids` pairs objects whose VIDs are identical in both views
//!    (ports and other cold-boot survivors) and checks the hard
//!    preconditions.
//! 2. For every temporary object, in dependency order, a best current-view
//!    candidate is selected ([`candidate`]) and the object is either kept,
//!    updated via SET, removed and recreated, or created fresh
//!    ([`transition`]).
//! 3. Current-view objects with no counterpart are removed in reverse
//!    dependency order; discovered defaults are adopted instead.

pub mod candidate;
mod error;
mod ops;
pub mod transition;

pub use error::ApplyError;
pub use ops::ViewOp;
pub use transition::{apply_view_transition, ApplyConfig};
