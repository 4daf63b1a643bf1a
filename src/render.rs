//! GPU upload and drawing of point clouds.
//!
//! A [`PointCloudBuffers`] owns everything one cloud needs on the GPU: a
//! per-point vertex buffer, the uploaded sprite and a small uniform with the
//! cloud's model matrix and material parameters. Drawing expands every point
//! into a quad, see [`crate::pipelines::points`].

use std::mem;

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        Vertex,
        instance::Instance,
        material::{Color, ColorMap},
        scene_graph::{Renderable, SceneNode},
        texture::{Texture, sprite_layout},
    },
    sampler::PointCloud,
};

/// Vertices drawn per point.
pub const QUAD_VERTICES: u32 = 6;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointRaw {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex for PointRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<PointRaw>() as wgpu::BufferAddress,
            // one point per instance, the quad corners come from the vertex index
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new(view: cgmath::Matrix4<f32>, proj: cgmath::Matrix4<f32>) -> Self {
        Self {
            view: view.into(),
            proj: proj.into(),
        }
    }
}

pub fn camera_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("camera_bind_group_layout"),
    })
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointsUniform {
    pub model: [[f32; 4]; 4],
    pub size: f32,
    pub alpha_test: f32,
    pub vertex_colors: f32,
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding: f32,
}

impl PointsUniform {
    pub fn new(cloud: &PointCloud, transform: &Instance) -> Self {
        Self {
            model: transform.to_raw().model,
            size: cloud.material.size,
            alpha_test: cloud.material.alpha_test,
            vertex_colors: if cloud.material.vertex_colors { 1.0 } else { 0.0 },
            _padding: 0.0,
        }
    }
}

pub fn points_uniform_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("points_bind_group_layout"),
    })
}

/// Interleaves a cloud's positions and colours for the vertex buffer.
pub fn point_vertices(cloud: &PointCloud) -> Vec<PointRaw> {
    cloud
        .points()
        .map(|(position, color)| PointRaw { position, color })
        .collect()
}

pub struct PointCloudBuffers {
    vertices: wgpu::Buffer,
    uniform: wgpu::Buffer,
    uniform_group: wgpu::BindGroup,
    sprite_group: wgpu::BindGroup,
    count: u32,
}

impl PointCloudBuffers {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        cloud: &PointCloud,
        transform: &Instance,
    ) -> anyhow::Result<Self> {
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Point Vertex Buffer"),
            contents: bytemuck::cast_slice(&point_vertices(cloud)),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Points Uniform Buffer"),
            contents: bytemuck::cast_slice(&[PointsUniform::new(cloud, transform)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let uniform_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &points_uniform_layout(device),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            }],
            label: Some("points_bind_group"),
        });

        // without an alpha map every fragment passes the alpha test
        let alpha_map = cloud
            .material
            .alpha_map
            .clone()
            .unwrap_or(ColorMap::Flat(Color::WHITE));
        let sprite = Texture::from_color_map(device, queue, &alpha_map, true)?;
        let sprite_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &sprite_layout(device),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&sprite.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sprite.sampler),
                },
            ],
            label: Some("sprite_bind_group"),
        });

        Ok(Self {
            vertices,
            uniform,
            uniform_group,
            sprite_group,
            count: cloud.len() as u32,
        })
    }

    /// Uploads every point cloud below `root`, each with its world transform.
    pub fn from_scene(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        root: &SceneNode,
    ) -> anyhow::Result<Vec<Self>> {
        let mut out = Vec::new();
        upload_node(device, queue, root, &Instance::default(), &mut out)?;
        Ok(out)
    }

    pub fn update_transform(&self, queue: &wgpu::Queue, cloud: &PointCloud, transform: &Instance) {
        queue.write_buffer(
            &self.uniform,
            0,
            bytemuck::cast_slice(&[PointsUniform::new(cloud, transform)]),
        );
    }

    pub fn len(&self) -> u32 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn draw<'a>(
        &'a self,
        render_pass: &mut wgpu::RenderPass<'a>,
        pipeline: &'a wgpu::RenderPipeline,
        camera_bind_group: &'a wgpu::BindGroup,
    ) {
        if self.is_empty() {
            return;
        }
        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, camera_bind_group, &[]);
        render_pass.set_bind_group(1, &self.sprite_group, &[]);
        render_pass.set_bind_group(2, &self.uniform_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertices.slice(..));
        render_pass.draw(0..QUAD_VERTICES, 0..self.count);
    }
}

fn upload_node(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    node: &SceneNode,
    parent: &Instance,
    out: &mut Vec<PointCloudBuffers>,
) -> anyhow::Result<()> {
    let world = parent * &node.local;
    for renderable in &node.renderables {
        if let Renderable::Points(cloud) = renderable {
            out.push(PointCloudBuffers::new(device, queue, cloud, &world)?);
        }
    }
    for child in &node.children {
        upload_node(device, queue, child, &world, out)?;
    }
    Ok(())
}
