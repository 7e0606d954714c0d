use bytemuck::{Pod, Zeroable};

/// Simulation time published to shader stages.
///
/// Layout matches the shader-side struct: offset 0 `delta_time`, offset 4
/// `total_time`, 8 bytes, native endianness.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct TimeState {
    /// Seconds elapsed since the previous update.
    pub delta_time: f32,
    /// Seconds elapsed since the scene was constructed.
    pub total_time: f32,
}

impl TimeState {
    /// Size of the published layout in bytes.
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    pub const ZERO: Self = Self {
        delta_time: 0.0,
        total_time: 0.0,
    };

    #[inline]
    pub const fn new(delta_time: f32, total_time: f32) -> Self {
        Self {
            delta_time,
            total_time,
        }
    }

    /// Bytes exactly as they are written into the device block.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.delta_time.is_finite() && self.total_time.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_two_packed_f32() {
        assert_eq!(TimeState::SIZE, 8);
        assert_eq!(std::mem::align_of::<TimeState>(), 4);
        assert_eq!(std::mem::offset_of!(TimeState, delta_time), 0);
        assert_eq!(std::mem::offset_of!(TimeState, total_time), 4);
    }

    #[test]
    fn bytes_are_native_endian_fields() {
        let t = TimeState::new(0.25, 3.5);
        let bytes = t.as_bytes();
        assert_eq!(&bytes[0..4], &0.25f32.to_ne_bytes());
        assert_eq!(&bytes[4..8], &3.5f32.to_ne_bytes());
    }
}
