use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

/// Static geometry. Registered with the scene; drawn by a surface renderer when
/// one is attached.
pub struct Model {
    pub name: String,
    pub vertices: wgpu::Buffer,
    pub vertex_count: u32,
}

impl Model {
    /// Flat ground quad of `extent` units, as two triangles.
    pub fn ground(device: &wgpu::Device, name: impl Into<String>, extent: f32) -> Self {
        let e = extent * 0.5;
        #[rustfmt::skip]
        let positions: [[f32; 3]; 6] = [
            [-e, 0.0, -e], [ e, 0.0, -e], [ e, 0.0,  e],
            [-e, 0.0, -e], [ e, 0.0,  e], [-e, 0.0,  e],
        ];

        let name = name.into();
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&name),
            contents: bytemuck::cast_slice(&positions),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            name,
            vertices,
            vertex_count: positions.len() as u32,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct BladeGpu {
    root: [f32; 4],
    tip: [f32; 4],
}

/// A field of procedurally animated blades living in a storage buffer.
pub struct BladeField {
    pub name: String,
    pub blades: wgpu::Buffer,
    pub count: u32,
}

impl BladeField {
    /// Square patch of `count` blades centred at `origin` (x, z).
    pub fn patch(
        device: &wgpu::Device,
        name: impl Into<String>,
        origin: [f32; 2],
        count: u32,
    ) -> Self {
        let count = count.max(1);
        let side = (count as f32).sqrt().ceil().max(1.0) as u32;
        let spacing = 0.1;

        let data: Vec<BladeGpu> = (0..count)
            .map(|i| {
                let x = origin[0] + (i % side) as f32 * spacing;
                let z = origin[1] + (i / side) as f32 * spacing;
                // Cheap deterministic variation per blade.
                let h = 0.4 + ((i.wrapping_mul(2_654_435_761) >> 24) as f32 / 255.0) * 0.6;
                let stiffness = 0.5 + ((i.wrapping_mul(40_503) >> 8) & 0xff) as f32 / 255.0;
                BladeGpu {
                    root: [x, 0.0, z, h],
                    tip: [x, h, z, stiffness],
                }
            })
            .collect();

        let name = name.into();
        let blades = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&name),
            contents: bytemuck::cast_slice(&data),
            usage: wgpu::BufferUsages::STORAGE,
        });

        Self { name, blades, count }
    }
}
