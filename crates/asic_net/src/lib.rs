//! # asic_net
//!
//! Transport layer between the redirection library (producer side) and the
//! consumer daemon. Every ASIC operation crosses the process boundary as a
//! [`Record`]: a typed key, a list of canonical field/value strings and an
//! operation tag. Records are encoded as named MessagePack and published on
//! the NATS subjects declared in [`subjects`].

pub mod codec;
pub mod connection;
pub mod error;
pub mod record;
pub mod subjects;

pub use codec::{decode, encode};
pub use connection::NatsConnection;
pub use error::NetError;
pub use record::{BulkErrorMode, BulkRecord, Record, RecordOp};
