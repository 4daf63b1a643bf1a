use std::sync::Arc;

use anyhow::{Context, anyhow, bail};
use cgmath::{Quaternion, Vector3};

use crate::{
    animation::{AnimationClip, Interpolation, Keyframes, Track},
    data_structures::{
        instance::Instance,
        material::{Color, ColorMap, Material},
        mesh::{Mesh, MeshData},
        scene_graph::{Renderable, SceneNode},
    },
    error::LoadWarning,
    resources::{
        decompress::{CompressedPrimitive, DRACO_EXTENSION, DecoderConfig, MeshDecompressor},
        source::{AssetSource, Progress, resolve_relative},
        texture::decode_image,
    },
};

/**
 * This module contains all logic for loading models, textures and raw bytes from external files.
 */
pub mod decompress;
pub mod source;
pub mod texture;

/// Everything decoded from one model file.
#[derive(Clone, Debug)]
pub struct DecodedScene {
    /// A generated group holding the scene's top-level nodes.
    pub root: SceneNode,
    pub clips: Vec<AnimationClip>,
    pub warnings: Vec<LoadWarning>,
}

/// Turns glTF/GLB bytes into a [`SceneNode`] tree and animation clips.
#[derive(Clone, Default)]
pub struct GltfDecoder {
    config: DecoderConfig,
    decompressor: Option<Arc<dyn MeshDecompressor>>,
}

impl GltfDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            decompressor: None,
        }
    }

    /// Attaches a codec for compressed primitives.
    pub fn with_decompressor(mut self, decompressor: Arc<dyn MeshDecompressor>) -> Self {
        self.decompressor = Some(decompressor);
        self
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    fn parse(&self, bytes: &[u8]) -> anyhow::Result<gltf::Gltf> {
        match gltf::Gltf::from_slice(bytes) {
            Ok(gltf) => Ok(gltf),
            Err(e) if self.decompressor.is_some() => {
                // validation rejects documents that require the compression extension
                let gltf = gltf::Gltf::from_slice_without_validation(bytes).map_err(|_| e)?;
                if gltf.extensions_required().any(|ext| ext == DRACO_EXTENSION) {
                    Ok(gltf)
                } else {
                    bail!("invalid glTF document")
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// `url` is only used to resolve relative buffer and image uris.
    pub async fn decode<S: AssetSource>(
        &self,
        source: &S,
        url: &str,
        bytes: &[u8],
    ) -> anyhow::Result<DecodedScene> {
        let gltf = self.parse(bytes)?;
        let mut warnings = Vec::new();

        // Load buffers
        let mut buffer_data: Vec<Vec<u8>> = Vec::new();
        for buffer in gltf.buffers() {
            match buffer.source() {
                gltf::buffer::Source::Bin => {
                    let blob = gltf
                        .blob
                        .as_deref()
                        .ok_or_else(|| anyhow!("buffer {} refers to a missing binary chunk", buffer.index()))?;
                    buffer_data.push(blob.into());
                }
                gltf::buffer::Source::Uri(uri) => {
                    if uri.starts_with("data:") {
                        bail!("embedded data uris are not supported (buffer {})", buffer.index());
                    }
                    let buffer_url = resolve_relative(url, uri);
                    let bin = source
                        .fetch(&buffer_url, &mut |_: Progress| {})
                        .await
                        .with_context(|| format!("missing buffer {buffer_url}"))?;
                    buffer_data.push(bin);
                }
            }
            if buffer_data[buffer.index()].len() < buffer.length() {
                bail!(
                    "buffer {} holds {} bytes, expected {}",
                    buffer.index(),
                    buffer_data[buffer.index()].len(),
                    buffer.length()
                );
            }
        }

        let clips = read_animations(&gltf, &buffer_data);

        // Load materials; textures that fail fall back to the base colour
        let mut materials = Vec::new();
        for material in gltf.materials() {
            let pbr = material.pbr_metallic_roughness();
            let [r, g, b, _] = pbr.base_color_factor();
            let color = Color::rgb(r, g, b);
            let map = match pbr.base_color_texture() {
                Some(info) => {
                    let image = info.texture().source();
                    let result = match image.source() {
                        gltf::image::Source::View { view, mime_type } => view_bytes(&view, &buffer_data)
                            .and_then(|bytes| {
                                decode_image(
                                    bytes,
                                    image.name().unwrap_or(url),
                                    mime_type.split('/').last(),
                                )
                            }),
                        gltf::image::Source::Uri { uri, mime_type } => {
                            let image_url = resolve_relative(url, uri);
                            match source.fetch(&image_url, &mut |_: Progress| {}).await {
                                Ok(bytes) => decode_image(
                                    &bytes,
                                    &image_url,
                                    mime_type.and_then(|mt| mt.split('/').last()),
                                ),
                                Err(e) => Err(e),
                            }
                        }
                    };
                    match result {
                        Ok(texture) => Some(ColorMap::Texture(texture)),
                        Err(e) => {
                            let name = image.name().unwrap_or("base colour").to_string();
                            log::warn!("Texture {name} of {url} unavailable: {e:#}");
                            warnings.push(LoadWarning::TextureFallback {
                                url: name,
                                reason: format!("{e:#}"),
                            });
                            Some(ColorMap::Flat(color))
                        }
                    }
                }
                None => None,
            };
            materials.push(Material::Standard {
                color,
                map,
                metalness: pbr.metallic_factor(),
                roughness: pbr.roughness_factor(),
            });
        }

        let scene = gltf
            .default_scene()
            .or_else(|| gltf.scenes().next())
            .ok_or_else(|| anyhow!("document contains no scene"))?;
        let ctx = NodeContext {
            buffers: &buffer_data,
            materials: &materials,
            decompressor: self.decompressor.as_deref(),
            config: &self.config,
            document: &gltf,
        };
        let mut children = Vec::new();
        for node in scene.nodes() {
            children.push(to_scene_node(&node, &ctx, &mut warnings)?);
        }
        let root = SceneNode::group(scene.name().unwrap_or("Scene"), children);

        Ok(DecodedScene {
            root,
            clips,
            warnings,
        })
    }
}

fn view_bytes<'a>(view: &gltf::buffer::View, buffers: &'a [Vec<u8>]) -> anyhow::Result<&'a [u8]> {
    let buffer = buffers
        .get(view.buffer().index())
        .ok_or_else(|| anyhow!("buffer view {} has no buffer", view.index()))?;
    buffer
        .get(view.offset()..view.offset() + view.length())
        .ok_or_else(|| anyhow!("buffer view {} is out of bounds", view.index()))
}

fn read_animations(gltf: &gltf::Gltf, buffer_data: &[Vec<u8>]) -> Vec<AnimationClip> {
    let mut clips = Vec::new();
    for (idx, animation) in gltf.animations().enumerate() {
        let mut tracks = Vec::new();
        for channel in animation.channels() {
            let reader = channel.reader(|buffer| buffer_data.get(buffer.index()).map(Vec::as_slice));
            let timestamps: Vec<f32> = match reader.read_inputs() {
                Some(inputs) => inputs.collect(),
                None => {
                    log::warn!("No timestamps found in channel {}", channel.index());
                    continue;
                }
            };
            let interpolation = match channel.sampler().interpolation() {
                gltf::animation::Interpolation::Linear => Interpolation::Linear,
                gltf::animation::Interpolation::Step => Interpolation::Step,
                gltf::animation::Interpolation::CubicSpline => Interpolation::CubicSpline,
            };
            let keyframes = match reader.read_outputs() {
                Some(gltf::animation::util::ReadOutputs::Translations(translation)) => {
                    Keyframes::Translation(key_values(
                        translation.map(Vector3::from).collect(),
                        interpolation,
                    ))
                }
                Some(gltf::animation::util::ReadOutputs::Rotations(rotation)) => {
                    Keyframes::Rotation(key_values(
                        rotation
                            .into_f32()
                            .map(|[x, y, z, w]| Quaternion::new(w, x, y, z))
                            .collect(),
                        interpolation,
                    ))
                }
                Some(gltf::animation::util::ReadOutputs::Scales(scales)) => {
                    Keyframes::Scale(key_values(scales.map(Vector3::from).collect(), interpolation))
                }
                Some(gltf::animation::util::ReadOutputs::MorphTargetWeights(weights)) => {
                    Keyframes::MorphWeights(weights.into_f32().collect())
                }
                None => {
                    log::warn!("No keyframes found in channel {}", channel.index());
                    continue;
                }
            };
            tracks.push(Track {
                target: channel.target().node().index(),
                timestamps,
                keyframes,
                interpolation,
            });
        }
        let name = animation
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("animation_{idx}"));
        clips.push(AnimationClip::new(name, tracks));
    }
    clips
}

/// Cubic spline outputs are stored as (in-tangent, value, out-tangent) triples.
fn key_values<T: Copy>(values: Vec<T>, interpolation: Interpolation) -> Vec<T> {
    match interpolation {
        Interpolation::CubicSpline => values.chunks_exact(3).map(|triple| triple[1]).collect(),
        Interpolation::Linear | Interpolation::Step => values,
    }
}

struct NodeContext<'a> {
    buffers: &'a [Vec<u8>],
    materials: &'a [Material],
    decompressor: Option<&'a dyn MeshDecompressor>,
    config: &'a DecoderConfig,
    document: &'a gltf::Document,
}

fn to_scene_node(
    node: &gltf::scene::Node,
    ctx: &NodeContext,
    warnings: &mut Vec<LoadWarning>,
) -> anyhow::Result<SceneNode> {
    let (translation, [x, y, z, w], scale) = node.transform().decomposed();
    let mut scene_node = SceneNode {
        name: node
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("node_{}", node.index())),
        source_index: Some(node.index()),
        local: Instance {
            position: translation.into(),
            rotation: Quaternion::new(w, x, y, z),
            scale: scale.into(),
        },
        renderables: Vec::new(),
        children: Vec::new(),
    };

    if let Some(mesh) = node.mesh() {
        let mesh_name = mesh
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh_{}", mesh.index()));
        for (index, primitive) in mesh.primitives().enumerate() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                warnings.push(LoadWarning::SkippedPrimitive {
                    mesh: mesh_name.clone(),
                    index,
                    reason: format!("unsupported mode {:?}", primitive.mode()),
                });
                continue;
            }
            let geometry = match primitive.extension_value(DRACO_EXTENSION) {
                Some(extension) => {
                    let attribute = |name: &str| {
                        extension
                            .get("attributes")
                            .and_then(|attributes| attributes.get(name))
                            .and_then(|v| v.as_u64())
                    };
                    let compressed = CompressedAttributes {
                        buffer_view: extension.get("bufferView").and_then(|v| v.as_u64()),
                        position: attribute("POSITION"),
                        normal: attribute("NORMAL"),
                    };
                    decompress(&mesh_name, compressed, ctx)?
                }
                None => {
                    let reader = primitive.reader(|buffer| ctx.buffers.get(buffer.index()).map(Vec::as_slice));
                    let Some(positions) = reader.read_positions() else {
                        warnings.push(LoadWarning::SkippedPrimitive {
                            mesh: mesh_name.clone(),
                            index,
                            reason: "no positions".to_string(),
                        });
                        continue;
                    };
                    let positions: Vec<[f32; 3]> = positions.collect();
                    let normals: Vec<[f32; 3]> = reader
                        .read_normals()
                        .map(|normals| normals.collect())
                        .unwrap_or_default();
                    let indices = reader
                        .read_indices()
                        .map(|indices| indices.into_u32().collect::<Vec<u32>>());
                    MeshData::new(positions, normals, indices)
                }
            };
            let material = primitive
                .material()
                .index()
                .and_then(|idx| ctx.materials.get(idx))
                .cloned()
                .unwrap_or_default();
            let name = if index == 0 {
                mesh_name.clone()
            } else {
                format!("{mesh_name}_{index}")
            };
            scene_node.renderables.push(Renderable::Mesh(Mesh {
                name,
                geometry,
                material,
            }));
        }
    }

    for child in node.children() {
        let child_node = to_scene_node(&child, ctx, warnings)?;
        scene_node.add_child(child_node);
    }

    Ok(scene_node)
}

struct CompressedAttributes {
    buffer_view: Option<u64>,
    position: Option<u64>,
    normal: Option<u64>,
}

fn decompress(
    mesh_name: &str,
    compressed: CompressedAttributes,
    ctx: &NodeContext,
) -> anyhow::Result<MeshData> {
    let decompressor = ctx.decompressor.ok_or_else(|| {
        anyhow!("mesh {mesh_name} is compressed with {DRACO_EXTENSION} but no decompressor is attached")
    })?;
    let view_index = compressed
        .buffer_view
        .ok_or_else(|| anyhow!("mesh {mesh_name} has no compressed buffer view"))?;
    let view = ctx
        .document
        .views()
        .nth(view_index as usize)
        .ok_or_else(|| anyhow!("compressed buffer view {view_index} does not exist"))?;
    decompressor
        .decompress(CompressedPrimitive {
            mesh: mesh_name,
            data: view_bytes(&view, ctx.buffers)?,
            position_attribute: compressed.position,
            normal_attribute: compressed.normal,
            decoder_path: &ctx.config.decoder_path,
        })
        .with_context(|| format!("could not decompress mesh {mesh_name}"))
}
