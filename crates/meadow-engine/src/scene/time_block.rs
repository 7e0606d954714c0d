use crate::device::{BufferRequest, DeviceError, DeviceMemory, MappedBuffer};
use crate::time::TimeState;

use super::{StalenessPolicy, TimeBlockConfig};

/// Alignment used when `pad_to_alignment` is set.
const PADDED_SLOT_ALIGNMENT: u64 = 16;

const MIN_OFFSET_ALIGNMENT: u64 = 4;

/// Byte layout of the time block.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TimeBlockLayout {
    slot_size: u64,
    slot_stride: u64,
    slots: u32,
    total_size: u64,
}

impl TimeBlockLayout {
    /// Computes the layout for `config`.
    ///
    /// `offset_alignment` must be a power of two of at least 4, the granularity
    /// of buffer writes and dynamic offsets. A layout whose size does not fit in
    /// a `u64` is rejected instead of wrapping.
    pub fn from_config(config: &TimeBlockConfig) -> Result<Self, DeviceError> {
        let alignment = config.offset_alignment;
        if alignment < MIN_OFFSET_ALIGNMENT || !alignment.is_power_of_two() {
            return Err(DeviceError::UnsupportedMemory {
                label: config.label,
                reason: "slot offset alignment must be a power of two of at least 4",
            });
        }

        let overflow = || DeviceError::UnsupportedMemory {
            label: config.label,
            reason: "time block layout exceeds the addressable size",
        };

        let slot_size = if config.pad_to_alignment {
            TimeState::SIZE.next_multiple_of(PADDED_SLOT_ALIGNMENT)
        } else {
            TimeState::SIZE
        };

        let slots = match config.staleness {
            StalenessPolicy::TolerateStale => 1,
            StalenessPolicy::Ring { frames_in_flight } => frames_in_flight.max(1),
        };

        let slot_stride = if slots > 1 {
            slot_size.checked_next_multiple_of(alignment).ok_or_else(overflow)?
        } else {
            slot_size
        };
        let total_size = slot_stride.checked_mul(u64::from(slots)).ok_or_else(overflow)?;

        Ok(Self {
            slot_size,
            slot_stride,
            slots,
            total_size,
        })
    }

    /// Bytes covered by one shader binding.
    #[inline]
    pub fn slot_size(&self) -> u64 {
        self.slot_size
    }

    /// Distance between consecutive slot offsets.
    #[inline]
    pub fn slot_stride(&self) -> u64 {
        self.slot_stride
    }

    #[inline]
    pub fn slots(&self) -> u32 {
        self.slots
    }

    #[inline]
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    #[inline]
    pub fn slot_offset(&self, slot: u32) -> u64 {
        debug_assert!(slot < self.slots, "slot {slot} out of range ({} slots)", self.slots);
        self.slot_stride * u64::from(slot)
    }
}

/// Where shader work should read the current time from.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TimeBinding<'a, B> {
    pub buffer: &'a B,
    /// Byte offset of the slot written by the latest publish.
    pub offset: u64,
    /// Binding size in bytes.
    pub size: u64,
}

/// Device-resident, persistently mapped copy of the scene's [`TimeState`].
///
/// Mapped once at construction and released on drop. Every publish copies the
/// state's bytes verbatim into the current slot and flushes exactly that range.
/// No value validation happens here; producing non-finite times is a clock bug.
#[derive(Debug)]
pub struct TimeBlock<D: DeviceMemory> {
    mapped: MappedBuffer<D>,
    layout: TimeBlockLayout,
    current_slot: u32,
    publishes: u64,
}

impl<D: DeviceMemory> TimeBlock<D> {
    /// Allocates and maps the block, zero-filling every slot.
    pub fn new(device: D, config: &TimeBlockConfig) -> Result<Self, DeviceError> {
        let layout = TimeBlockLayout::from_config(config)?;

        let request = BufferRequest::uniform(config.label, layout.total_size())
            .with_binding_size(layout.slot_size());

        let mut mapped = MappedBuffer::new(device, &request)?;
        mapped.fill(0);

        log::debug!(
            "time block `{}`: {} slot(s) of {} bytes, stride {}",
            config.label,
            layout.slots(),
            layout.slot_size(),
            layout.slot_stride()
        );

        Ok(Self {
            mapped,
            layout,
            current_slot: 0,
            publishes: 0,
        })
    }

    /// Writes `time` into the next slot.
    pub fn publish(&mut self, time: TimeState) {
        debug_assert!(time.is_finite(), "publishing non-finite time {time:?}");

        let slot = (self.publishes % u64::from(self.layout.slots())) as u32;
        let offset = self.layout.slot_offset(slot);

        self.mapped.write(offset, time.as_bytes());
        self.current_slot = slot;
        self.publishes += 1;

        log::trace!("published {time:?} to slot {slot} (+{offset})");
    }

    /// Device-side buffer handle.
    #[inline]
    pub fn buffer(&self) -> &D::Buffer {
        self.mapped.buffer()
    }

    /// Binding for the most recently written slot (slot 0 before any publish).
    pub fn binding(&self) -> TimeBinding<'_, D::Buffer> {
        TimeBinding {
            buffer: self.mapped.buffer(),
            offset: self.layout.slot_offset(self.current_slot),
            size: self.layout.slot_size(),
        }
    }

    /// Number of publishes since construction.
    #[inline]
    pub fn publishes(&self) -> u64 {
        self.publishes
    }

    /// Host view of the whole mapped block.
    #[inline]
    pub fn mapped_bytes(&self) -> &[u8] {
        self.mapped.as_bytes()
    }

    /// Host view of one slot, padding included.
    pub fn slot_bytes(&self, slot: u32) -> &[u8] {
        let start = self.layout.slot_offset(slot) as usize;
        &self.mapped.as_bytes()[start..start + self.layout.slot_size() as usize]
    }
}
