use crate::device::DeviceError;

/// Failure constructing a [`Scene`](super::Scene).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// A device resource the scene cannot exist without could not be created.
    #[error("failed to create {what}")]
    ResourceAllocation {
        what: &'static str,
        #[source]
        source: DeviceError,
    },
}
