/// Failure reported by a [`DeviceMemory`](super::DeviceMemory) backend.
///
/// Every variant is fatal for the resource being created. Callers do not retry;
/// retrying an allocation without first releasing other resources is not expected
/// to succeed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// The device cannot satisfy the requested allocation size.
    #[error("out of device memory for `{label}`: requested {requested} bytes, limit {limit}")]
    OutOfMemory {
        label: &'static str,
        requested: u64,
        limit: u64,
    },

    /// The requested usage/location combination is not available on this backend.
    #[error("unsupported memory for `{label}`: {reason}")]
    UnsupportedMemory {
        label: &'static str,
        reason: &'static str,
    },

    /// The allocation exists but could not be mapped into host address space.
    #[error("failed to map `{label}`: {reason}")]
    MapFailed { label: &'static str, reason: String },
}
