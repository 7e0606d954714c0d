use std::collections::HashMap;
use std::num::NonZeroU64;

use anyhow::{Context, Result};

use meadow_engine::device::WgpuMemory;
use meadow_engine::scene::{Arena, Handle, Scene, TimeBinding};
use meadow_engine::time::TimeState;

use crate::entities::{BladeField, Model};

const WORKGROUP_SIZE: u32 = 64;

/// Compute pass animating every registered blade field from the scene time block.
///
/// The time block is bound with a dynamic offset so the same bind groups serve
/// single-slot and ring layouts.
pub struct BladeSway {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_groups: HashMap<Handle<BladeField>, wgpu::BindGroup>,
}

impl BladeSway {
    pub fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("meadow blade sway shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/blades.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("meadow blade sway bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: NonZeroU64::new(TimeState::SIZE),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("meadow blade sway pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("meadow blade sway pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Self {
            pipeline,
            bind_group_layout,
            bind_groups: HashMap::new(),
        }
    }

    /// Builds bind groups for every blade field registered in `scene`.
    ///
    /// Call after setup; the time buffer never changes for a scene's lifetime.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        scene: &Scene<WgpuMemory, Model, BladeField>,
        blades: &Arena<BladeField>,
    ) {
        let time = scene.time_binding();

        for (handle, field) in scene.resolve_blades(blades) {
            if self.bind_groups.contains_key(&handle) {
                continue;
            }

            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&field.name),
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer: time.buffer,
                            offset: 0,
                            size: NonZeroU64::new(time.size),
                        }),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: field.blades.as_entire_binding(),
                    },
                ],
            });

            self.bind_groups.insert(handle, bind_group);
        }

        log::debug!("blade sway prepared for {} field(s)", self.bind_groups.len());
    }

    /// Records one dispatch per blade field, in registration order.
    pub fn record(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        time: TimeBinding<'_, wgpu::Buffer>,
        scene: &Scene<WgpuMemory, Model, BladeField>,
        blades: &Arena<BladeField>,
    ) -> Result<()> {
        let offset = dynamic_offset(time.offset)?;

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("meadow blade sway pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);

        for (handle, field) in scene.resolve_blades(blades) {
            let Some(bind_group) = self.bind_groups.get(&handle) else { continue };
            pass.set_bind_group(0, bind_group, &[offset]);
            pass.dispatch_workgroups(field.count.div_ceil(WORKGROUP_SIZE), 1, 1);
        }

        Ok(())
    }
}

/// Dynamic offsets are 32-bit in wgpu.
fn dynamic_offset(offset: u64) -> Result<u32> {
    u32::try_from(offset)
        .with_context(|| format!("time slot offset {offset} does not fit a dynamic offset"))
}
