use std::ptr::NonNull;

use super::{BufferRequest, BufferUsage, DeviceError, DeviceMemory};

/// Host-side staging range standing in for a persistent mapping.
///
/// wgpu does not allow a buffer to stay mapped while shaders read it, so the
/// mapping is a host allocation of the same size and every flushed range is
/// forwarded with `Queue::write_buffer`. Writes become visible to the next
/// submission on the queue.
#[derive(Debug)]
pub struct WgpuStaging {
    bytes: Vec<u8>,
}

/// [`DeviceMemory`] backed by a wgpu device and queue.
#[derive(Debug, Clone)]
pub struct WgpuMemory {
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl WgpuMemory {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }

    /// Smallest offset alignment allowed between independently bound uniform slots.
    pub fn uniform_offset_alignment(&self) -> u64 {
        u64::from(self.device.limits().min_uniform_buffer_offset_alignment)
    }
}

/// Rejects requests this backend cannot serve on a device with `limits`.
fn check_request(request: &BufferRequest, limits: &wgpu::Limits) -> Result<(), DeviceError> {
    if !request.host_visible {
        return Err(DeviceError::UnsupportedMemory {
            label: request.label,
            reason: "wgpu buffers written per frame must be host-visible",
        });
    }
    if !request.device_readable {
        return Err(DeviceError::UnsupportedMemory {
            label: request.label,
            reason: "uniform buffers are always device-readable",
        });
    }

    let max_size = limits.max_buffer_size;
    if request.size > max_size {
        return Err(DeviceError::OutOfMemory {
            label: request.label,
            requested: request.size,
            limit: max_size,
        });
    }

    let max_binding = match request.usage {
        BufferUsage::Uniform => u64::from(limits.max_uniform_buffer_binding_size),
    };
    if request.binding_size > max_binding {
        return Err(DeviceError::OutOfMemory {
            label: request.label,
            requested: request.binding_size,
            limit: max_binding,
        });
    }

    Ok(())
}

// SAFETY: the mapped pointer addresses the heap storage of `WgpuStaging::bytes`,
// which is never resized and lives until `free`. `flush` only reads the slice it
// is handed.
unsafe impl DeviceMemory for WgpuMemory {
    type Buffer = wgpu::Buffer;
    type Memory = WgpuStaging;

    fn allocate_buffer(
        &self,
        request: &BufferRequest,
    ) -> Result<(wgpu::Buffer, WgpuStaging), DeviceError> {
        check_request(request, &self.device.limits())?;

        let len = usize::try_from(request.size).map_err(|_| DeviceError::OutOfMemory {
            label: request.label,
            requested: request.size,
            limit: usize::MAX as u64,
        })?;

        let usage = match request.usage {
            BufferUsage::Uniform => wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        };

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(request.label),
            size: request.size,
            usage,
            mapped_at_creation: false,
        });

        Ok((buffer, WgpuStaging { bytes: vec![0; len] }))
    }

    fn map_memory(&self, memory: &mut WgpuStaging) -> Result<NonNull<u8>, DeviceError> {
        NonNull::new(memory.bytes.as_mut_ptr()).ok_or_else(|| DeviceError::MapFailed {
            label: "wgpu staging",
            reason: "empty staging range".to_string(),
        })
    }

    fn flush(&self, buffer: &wgpu::Buffer, _memory: &WgpuStaging, offset: u64, bytes: &[u8]) {
        // write_buffer requires 4-byte aligned offsets and sizes; everything this
        // crate publishes is made of f32 values.
        debug_assert!(offset % wgpu::COPY_BUFFER_ALIGNMENT == 0);
        debug_assert!(bytes.len() as u64 % wgpu::COPY_BUFFER_ALIGNMENT == 0);

        self.queue.write_buffer(buffer, offset, bytes);
    }

    fn unmap_memory(&self, _memory: &mut WgpuStaging) {}

    fn free(&self, buffer: wgpu::Buffer, memory: WgpuStaging) {
        buffer.destroy();
        drop(memory);
    }
}
