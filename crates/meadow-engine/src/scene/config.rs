use crate::time::ClockConfig;

/// How the time block tolerates the GPU reading while the host writes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum StalenessPolicy {
    /// One slot, rewritten in place every frame.
    ///
    /// Shader work still in flight from the previous frame may observe the new
    /// value or the old one. Acceptable for continuous, slowly varying time values;
    /// the render loop's fence discipline decides which one it sees.
    #[default]
    TolerateStale,

    /// One slot per frame in flight, written round-robin.
    ///
    /// Work from frame `n` keeps reading its own slot until frame
    /// `n + frames_in_flight` overwrites it. Consumers must bind the offset from
    /// [`Scene::time_binding`](super::Scene::time_binding).
    Ring { frames_in_flight: u32 },
}

/// Device-resident time block configuration.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TimeBlockConfig {
    /// Debug label of the device buffer.
    pub label: &'static str,

    /// Pad each slot from 8 to 16 bytes.
    ///
    /// Needed by binding models that size uniform blocks in 16-byte units.
    /// The padding is zero-filled.
    pub pad_to_alignment: bool,

    pub staleness: StalenessPolicy,

    /// Alignment between ring slots (wgpu: `min_uniform_buffer_offset_alignment`).
    ///
    /// Must be a power of two of at least 4, even though a single slot never
    /// uses it.
    pub offset_alignment: u64,
}

impl Default for TimeBlockConfig {
    fn default() -> Self {
        Self {
            label: "meadow time block",
            pad_to_alignment: false,
            staleness: StalenessPolicy::TolerateStale,
            offset_alignment: 256,
        }
    }
}

/// Scene configuration.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct SceneConfig {
    pub time_block: TimeBlockConfig,
    pub clock: ClockConfig,
}
