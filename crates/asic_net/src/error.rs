//! Network-layer error types.

/// Errors that can occur during transport operations.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// Failed to encode a record to MessagePack.
    #[error("failed to encode record: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Failed to decode a record from MessagePack.
    #[error("failed to decode record: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// A record key or field did not follow the record grammar.
    #[error("malformed record: {0}")]
    Malformed(String),

    /// NATS subscription error.
    #[error("NATS subscribe error: {0}")]
    Subscribe(#[from] async_nats::SubscribeError),

    /// NATS publish error.
    #[error("NATS publish error: {0}")]
    Publish(#[from] async_nats::PublishError),

    /// NATS connection error.
    #[error("NATS connection error: {0}")]
    Connect(#[from] async_nats::ConnectError),
}
