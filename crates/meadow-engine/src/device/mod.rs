//! GPU device + buffer memory management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue without a surface
//! - the allocate/map/flush/unmap/free contract scenes allocate through
//! - persistently mapped buffers that release themselves on drop

mod context;
mod error;
mod host;
mod init;
mod mapping;
mod memory;
mod wgpu_memory;

pub use context::Gpu;
pub use error::DeviceError;
pub use host::{HostAllocation, HostBuffer, HostMemory, HostMemoryStats};
pub use init::GpuInit;
pub use mapping::MappedBuffer;
pub use memory::{BufferRequest, BufferUsage, DeviceMemory};
pub use wgpu_memory::{WgpuMemory, WgpuStaging};
