//! GPU textures and texture creation utilities.
//!
//! This module provides [`Texture`], a wrapper around WGPU texture resources,
//! plus the CPU-side generator for the soft circular sprite point clouds use
//! as alpha map when no particle image is available.

use anyhow::*;
use image::GenericImageView;

use crate::data_structures::material::{Color, ColorMap};

/// A GPU texture with a view and sampler.
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Upload a decoded image.
    ///
    /// # Arguments
    ///
    /// * `label` is used as a debug label for the GPU resource
    /// * `is_linear` selects `Rgba8Unorm` (alpha masks, normal maps) over sRGB
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &image::DynamicImage,
        label: Option<&str>,
        is_linear: bool,
    ) -> Result<Self> {
        let dimensions = img.dimensions();
        if dimensions.0 == 0 || dimensions.1 == 0 {
            bail!("texture {:?} has no pixels", label);
        }
        let rgba = img.to_rgba8();
        Ok(Self::from_rgba(device, queue, &rgba, dimensions, label, is_linear))
    }

    /// A 1x1 texture of a single colour, used for flat fallbacks.
    pub fn from_color(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color: Color,
        label: Option<&str>,
    ) -> Self {
        Self::from_rgba(device, queue, &color.to_rgba8(), (1, 1), label, true)
    }

    /// Uploads whatever a texture slot ended up holding.
    pub fn from_color_map(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        map: &ColorMap,
        is_linear: bool,
    ) -> Result<Self> {
        match map {
            ColorMap::Texture(texture) => {
                let (width, height) = texture.image.dimensions();
                if width == 0 || height == 0 {
                    bail!("texture {} has no pixels", texture.name);
                }
                Ok(Self::from_rgba(
                    device,
                    queue,
                    texture.image.as_raw(),
                    (width, height),
                    Some(&texture.name),
                    is_linear,
                ))
            }
            ColorMap::Flat(color) => Ok(Self::from_color(device, queue, *color, Some("flat colour"))),
        }
    }

    fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: &[u8],
        dimensions: (u32, u32),
        label: Option<&str>,
        is_linear: bool,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 1,
        };
        let format = if is_linear {
            wgpu::TextureFormat::Rgba8Unorm
        } else {
            wgpu::TextureFormat::Rgba8UnormSrgb
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * dimensions.0),
                rows_per_image: Some(dimensions.1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = create_sprite_sampler(device);

        Self {
            texture,
            view,
            sampler,
        }
    }
}

/// Sprites must not bleed across their border, so clamp instead of repeat.
pub fn create_sprite_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

pub fn sprite_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("sprite_bind_group_layout"),
    })
}

/// A disc that fades smoothly from white at the centre to black at the rim.
///
/// The mask is stored as grey level (and mirrored into alpha), so it reads
/// the same as a greyscale particle image. It is exactly zero outside the
/// disc, so an alpha test slightly above zero removes the square corners of
/// each sprite.
pub fn soft_circle_sprite(size: u32) -> image::RgbaImage {
    let size = size.max(2);
    let centre = (size as f32 - 1.0) * 0.5;
    image::RgbaImage::from_fn(size, size, |x, y| {
        let dx = (x as f32 - centre) / centre;
        let dy = (y as f32 - centre) / centre;
        let distance = (dx * dx + dy * dy).sqrt();
        let falloff = (1.0 - distance).clamp(0.0, 1.0);
        // smoothstep keeps the rim soft
        let mask = falloff * falloff * (3.0 - 2.0 * falloff);
        let level = (mask * 255.0).round() as u8;
        image::Rgba([level, level, level, level])
    })
}
