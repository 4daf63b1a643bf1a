use crate::{
    data_structures::{
        Vertex,
        material::{Blending, PointsMaterial},
        texture::{Texture, sprite_layout},
    },
    pipelines::basic::{RasterOptions, mk_render_pipeline},
    render::{PointRaw, points_uniform_layout},
};

/// Blend state for a points material. Additive blending brightens where points overlap.
pub fn points_blend(material: &PointsMaterial) -> wgpu::BlendState {
    match material.blending {
        Blending::Additive => wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        },
        Blending::Normal => wgpu::BlendState::ALPHA_BLENDING,
    }
}

/**
 * Pipeline for point clouds.
 *
 * Bind groups: camera at 0, the sprite alpha map at 1 and the per-cloud
 * uniform at 2. Every point is expanded into a camera-facing quad, so draw
 * calls use six vertices per point instance.
 */
pub fn mk_points_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    material: &PointsMaterial,
) -> wgpu::RenderPipeline {
    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Points Pipeline Layout"),
        bind_group_layouts: &[
            Some(camera_bind_group_layout),
            Some(&sprite_layout(device)),
            Some(&points_uniform_layout(device)),
        ],
        immediate_size: 0,
    });

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Points Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("points.wgsl").into()),
    };

    mk_render_pipeline(
        device,
        &render_pipeline_layout,
        color_format,
        Some(points_blend(material)),
        Some(Texture::DEPTH_FORMAT),
        &[PointRaw::desc()],
        shader,
        RasterOptions {
            depth_write: material.depth_write,
            cull_mode: None,
            topology: wgpu::PrimitiveTopology::TriangleList,
        },
    )
}
