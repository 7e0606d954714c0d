use std::mem::ManuallyDrop;
use std::ptr::NonNull;

use super::{BufferRequest, DeviceError, DeviceMemory};

/// A device buffer mapped into host address space for its whole lifetime.
///
/// Mapping happens once in [`MappedBuffer::new`]; unmapping and freeing happen
/// once in `Drop`. If mapping fails after a successful allocation, the allocation
/// is freed before the error is returned.
///
/// Dropping this value while GPU work still references the buffer is a caller
/// error; no wait is performed here.
///
/// The mapped pointer makes this type `!Send` and `!Sync`: a mapped buffer is
/// written from the thread that created it.
pub struct MappedBuffer<D: DeviceMemory> {
    device: D,
    label: &'static str,
    size: u64,
    buffer: ManuallyDrop<D::Buffer>,
    memory: ManuallyDrop<D::Memory>,
    ptr: NonNull<u8>,
}

impl<D: DeviceMemory> MappedBuffer<D> {
    /// Allocates `request` on `device` and maps it.
    pub fn new(device: D, request: &BufferRequest) -> Result<Self, DeviceError> {
        let (buffer, mut memory) = device.allocate_buffer(request)?;

        let ptr = match device.map_memory(&mut memory) {
            Ok(ptr) => ptr,
            Err(err) => {
                log::warn!("mapping `{}` failed; releasing allocation", request.label);
                device.free(buffer, memory);
                return Err(err);
            }
        };

        log::debug!(
            "mapped buffer `{}` ({} bytes, {:?})",
            request.label,
            request.size,
            request.usage
        );

        Ok(Self {
            device,
            label: request.label,
            size: request.size,
            buffer: ManuallyDrop::new(buffer),
            memory: ManuallyDrop::new(memory),
            ptr,
        })
    }

    /// Device-side handle for binding into shader work.
    #[inline]
    pub fn buffer(&self) -> &D::Buffer {
        &self.buffer
    }

    /// Size of the mapping in bytes.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Copies `bytes` into the mapping at `offset` and flushes that range.
    ///
    /// # Panics
    /// Panics if the range does not fit inside the mapping.
    pub fn write(&mut self, offset: u64, bytes: &[u8]) {
        let start = self.checked_range(offset, bytes.len());

        // SAFETY: `checked_range` keeps the destination inside the mapping, which
        // stays valid until `Drop`. `bytes` cannot alias it: the mapping is only
        // reachable through `&mut self` / `&self`.
        unsafe {
            let dst = self.ptr.as_ptr().add(start);
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), dst, bytes.len());
        }

        self.flush_range(offset, bytes.len());
    }

    /// Sets every byte of the mapping to `value` and flushes it.
    pub fn fill(&mut self, value: u8) {
        let len = self.len();

        // SAFETY: the mapping is valid for `len` bytes until `Drop`.
        unsafe {
            std::ptr::write_bytes(self.ptr.as_ptr(), value, len);
        }

        self.flush_range(0, len);
    }

    /// Host view of the mapped bytes.
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: the mapping is valid for `len` bytes until `Drop` and is only
        // written through `&mut self`.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len()) }
    }

    fn flush_range(&self, offset: u64, len: usize) {
        let start = self.checked_range(offset, len);
        let written = &self.as_bytes()[start..start + len];
        self.device.flush(&self.buffer, &self.memory, offset, written);
    }

    fn checked_range(&self, offset: u64, len: usize) -> usize {
        let end = offset.checked_add(len as u64);
        assert!(
            end.is_some_and(|end| end <= self.size),
            "write of {len} bytes at offset {offset} exceeds mapping `{}` ({} bytes)",
            self.label,
            self.size
        );
        offset as usize
    }

    fn len(&self) -> usize {
        self.size as usize
    }
}

impl<D: DeviceMemory> Drop for MappedBuffer<D> {
    fn drop(&mut self) {
        // SAFETY: both fields are taken exactly once, here, and never read again.
        let (buffer, mut memory) =
            unsafe { (ManuallyDrop::take(&mut self.buffer), ManuallyDrop::take(&mut self.memory)) };

        self.device.unmap_memory(&mut memory);
        self.device.free(buffer, memory);

        log::debug!("released buffer `{}`", self.label);
    }
}

impl<D: DeviceMemory> std::fmt::Debug for MappedBuffer<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedBuffer")
            .field("label", &self.label)
            .field("size", &self.size)
            .field("buffer", &*self.buffer)
            .finish_non_exhaustive()
    }
}
