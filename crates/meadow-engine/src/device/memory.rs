use std::fmt;
use std::ptr::NonNull;

use super::DeviceError;

/// How shader stages consume a buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BufferUsage {
    /// Small fixed-layout, read-only shader input.
    Uniform,
}

/// Parameters for [`DeviceMemory::allocate_buffer`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BufferRequest {
    /// Debug label forwarded to the backend and used in errors.
    pub label: &'static str,
    /// Size of the whole allocation in bytes.
    pub size: u64,
    /// Largest range a single shader binding will cover.
    ///
    /// Equals `size` unless the buffer is split into independently bound slots.
    pub binding_size: u64,
    pub usage: BufferUsage,
    /// Memory must be writable from the host.
    pub host_visible: bool,
    /// Memory must be readable from shader stages.
    pub device_readable: bool,
}

impl BufferRequest {
    /// Host-writable, device-readable uniform buffer of `size` bytes.
    pub const fn uniform(label: &'static str, size: u64) -> Self {
        Self {
            label,
            size,
            binding_size: size,
            usage: BufferUsage::Uniform,
            host_visible: true,
            device_readable: true,
        }
    }

    pub const fn with_binding_size(mut self, binding_size: u64) -> Self {
        self.binding_size = binding_size;
        self
    }
}

/// Device/context collaborator owning buffer memory.
///
/// The lifecycle of a buffer is strictly:
/// `allocate_buffer` -> `map_memory` -> (`flush`)* -> `unmap_memory` -> `free`.
/// [`MappedBuffer`](super::MappedBuffer) drives this sequence and guarantees the
/// tail runs on every exit path.
///
/// Handles are expected to be cheap to clone (wgpu device/queue handles, `Rc`
/// ledgers); a resource keeps its own clone for teardown.
///
/// # Safety
///
/// The pointer returned by `map_memory` must be valid for reads and writes of
/// the full `size` passed to `allocate_buffer`, must stay valid (and must not
/// move) until `unmap_memory` is called for the same memory, and must not be
/// accessed by the implementation in the meantime except inside `flush`.
pub unsafe trait DeviceMemory: Clone {
    /// Device-side buffer handle bound into shader work.
    type Buffer: fmt::Debug;
    /// Backing allocation that gets mapped into host address space.
    type Memory: fmt::Debug;

    /// Creates a buffer and its backing memory.
    fn allocate_buffer(
        &self,
        request: &BufferRequest,
    ) -> Result<(Self::Buffer, Self::Memory), DeviceError>;

    /// Establishes the host mapping for the whole allocation.
    fn map_memory(&self, memory: &mut Self::Memory) -> Result<NonNull<u8>, DeviceError>;

    /// Makes host writes to `bytes` (located at `offset` in the mapping) visible to
    /// the device.
    ///
    /// Host-coherent backends implement this as a no-op.
    fn flush(&self, buffer: &Self::Buffer, memory: &Self::Memory, offset: u64, bytes: &[u8]);

    /// Releases the host mapping. The pointer from `map_memory` becomes dangling.
    fn unmap_memory(&self, memory: &mut Self::Memory);

    /// Frees the buffer and its memory.
    fn free(&self, buffer: Self::Buffer, memory: Self::Memory);
}
