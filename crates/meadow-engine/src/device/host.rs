use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::ptr::NonNull;
use std::rc::Rc;

use super::{BufferRequest, DeviceError, DeviceMemory};

/// Buffer handle issued by [`HostMemory`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct HostBuffer {
    id: u64,
    size: u64,
}

impl HostBuffer {
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Memory handle issued by [`HostMemory`].
#[derive(Debug, Eq, PartialEq)]
pub struct HostAllocation {
    id: u64,
}

/// Lifetime counters for a [`HostMemory`] instance.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct HostMemoryStats {
    pub allocations: u64,
    pub frees: u64,
    pub maps: u64,
    pub unmaps: u64,
    pub flushes: u64,
    pub live_allocations: usize,
    pub live_mappings: usize,
}

#[derive(Debug, Default)]
struct Ledger {
    next_id: u64,
    budget: Option<u64>,
    in_use: u64,
    allocations: HashMap<u64, Vec<u8>>,
    mapped: HashSet<u64>,
    fail_next_map: Option<String>,
    stats: HostMemoryStats,
}

/// Host-coherent memory backend.
///
/// Allocations are plain zero-initialized host memory, so flushes are no-ops and
/// mapped writes are immediately visible through [`HostMemory::contents`]. Used for
/// CPU-only runs and for tests that need to inspect published bytes or the
/// allocate/map/unmap/free sequence.
///
/// Clones share one ledger.
#[derive(Debug, Clone, Default)]
pub struct HostMemory {
    ledger: Rc<RefCell<Ledger>>,
}

impl HostMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend that refuses allocations once `budget` bytes are live.
    pub fn with_budget(budget: u64) -> Self {
        let host = Self::new();
        host.ledger.borrow_mut().budget = Some(budget);
        host
    }

    /// Makes the next `map_memory` call fail with `reason`.
    pub fn fail_next_map(&self, reason: impl Into<String>) {
        self.ledger.borrow_mut().fail_next_map = Some(reason.into());
    }

    /// Copy of the bytes currently backing `buffer`.
    ///
    /// Returns an empty vector for freed buffers.
    pub fn contents(&self, buffer: &HostBuffer) -> Vec<u8> {
        self.ledger
            .borrow()
            .allocations
            .get(&buffer.id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn stats(&self) -> HostMemoryStats {
        let ledger = self.ledger.borrow();
        HostMemoryStats {
            live_allocations: ledger.allocations.len(),
            live_mappings: ledger.mapped.len(),
            ..ledger.stats
        }
    }
}

// SAFETY: mapped pointers address the heap storage of a `Vec` that is neither
// resized nor dropped until `free`, and `free` is only reached after `unmap_memory`
// through `MappedBuffer`. The ledger never writes to mapped storage.
unsafe impl DeviceMemory for HostMemory {
    type Buffer = HostBuffer;
    type Memory = HostAllocation;

    fn allocate_buffer(
        &self,
        request: &BufferRequest,
    ) -> Result<(HostBuffer, HostAllocation), DeviceError> {
        let mut ledger = self.ledger.borrow_mut();

        if let Some(budget) = ledger.budget {
            let available = budget.saturating_sub(ledger.in_use);
            if request.size > available {
                return Err(DeviceError::OutOfMemory {
                    label: request.label,
                    requested: request.size,
                    limit: available,
                });
            }
        }

        let len = usize::try_from(request.size).map_err(|_| DeviceError::OutOfMemory {
            label: request.label,
            requested: request.size,
            limit: usize::MAX as u64,
        })?;

        let id = ledger.next_id;
        ledger.next_id += 1;
        ledger.in_use += request.size;
        ledger.allocations.insert(id, vec![0; len]);
        ledger.stats.allocations += 1;

        log::trace!("host allocation #{id} `{}` ({} bytes)", request.label, request.size);

        Ok((HostBuffer { id, size: request.size }, HostAllocation { id }))
    }

    fn map_memory(&self, memory: &mut HostAllocation) -> Result<NonNull<u8>, DeviceError> {
        let mut ledger = self.ledger.borrow_mut();

        if let Some(reason) = ledger.fail_next_map.take() {
            return Err(DeviceError::MapFailed { label: "host allocation", reason });
        }

        let Ledger {
            allocations,
            mapped,
            stats,
            ..
        } = &mut *ledger;

        let bytes = allocations
            .get_mut(&memory.id)
            .ok_or_else(|| DeviceError::MapFailed {
                label: "host allocation",
                reason: format!("allocation #{} was freed", memory.id),
            })?;

        debug_assert!(!mapped.contains(&memory.id), "allocation mapped twice");

        let ptr = NonNull::new(bytes.as_mut_ptr()).ok_or_else(|| DeviceError::MapFailed {
            label: "host allocation",
            reason: "null storage".to_string(),
        })?;

        mapped.insert(memory.id);
        stats.maps += 1;

        Ok(ptr)
    }

    fn flush(&self, _buffer: &HostBuffer, _memory: &HostAllocation, _offset: u64, _bytes: &[u8]) {
        // Coherent: writes are already visible.
        self.ledger.borrow_mut().stats.flushes += 1;
    }

    fn unmap_memory(&self, memory: &mut HostAllocation) {
        let mut ledger = self.ledger.borrow_mut();
        let was_mapped = ledger.mapped.remove(&memory.id);
        debug_assert!(was_mapped, "unmapping allocation that is not mapped");
        ledger.stats.unmaps += 1;
    }

    fn free(&self, buffer: HostBuffer, memory: HostAllocation) {
        debug_assert_eq!(buffer.id, memory.id);

        let mut ledger = self.ledger.borrow_mut();
        debug_assert!(!ledger.mapped.contains(&memory.id), "freeing mapped allocation");

        if ledger.allocations.remove(&memory.id).is_some() {
            ledger.in_use = ledger.in_use.saturating_sub(buffer.size);
        }
        ledger.stats.frees += 1;
    }
}
