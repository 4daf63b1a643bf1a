#![allow(dead_code)]

use futures::channel::oneshot;
use model_ngin::{
    AssetSource, MemorySource, Progress,
    data_structures::mesh::MeshData,
};
use parking_lot::Mutex;

const GLB_MAGIC: u32 = 0x4654_6C67;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

/// Packs a JSON document and a binary chunk into a GLB container.
pub(crate) fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
    let mut json = json.as_bytes().to_vec();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    let mut bin = bin.to_vec();
    while bin.len() % 4 != 0 {
        bin.push(0);
    }
    let total = 12 + 8 + json.len() + 8 + bin.len();

    let mut out = Vec::with_capacity(total);
    out.extend(GLB_MAGIC.to_le_bytes());
    out.extend(2u32.to_le_bytes());
    out.extend((total as u32).to_le_bytes());
    out.extend((json.len() as u32).to_le_bytes());
    out.extend(CHUNK_JSON.to_le_bytes());
    out.extend(json);
    out.extend((bin.len() as u32).to_le_bytes());
    out.extend(CHUNK_BIN.to_le_bytes());
    out.extend(bin);
    out
}

fn floats(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// One right triangle in the XY plane named `Tri`. When `animated`, a clip
/// called `slide` moves it from x = 0 to x = 2 over one second.
pub(crate) fn triangle_glb(animated: bool) -> Vec<u8> {
    let mut bin = floats(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    bin.extend(floats(&[0.0, 1.0]));
    bin.extend(floats(&[0.0, 0.0, 0.0, 2.0, 0.0, 0.0]));

    let animations = if animated {
        r#","animations": [{
            "name": "slide",
            "channels": [{ "sampler": 0, "target": { "node": 0, "path": "translation" } }],
            "samplers": [{ "input": 1, "output": 2, "interpolation": "LINEAR" }]
        }]"#
    } else {
        ""
    };
    let json = format!(
        r#"{{
        "asset": {{ "version": "2.0" }},
        "scene": 0,
        "scenes": [{{ "name": "Scene", "nodes": [0] }}],
        "nodes": [{{ "name": "Tri", "mesh": 0 }}],
        "meshes": [{{ "name": "tri", "primitives": [{{ "attributes": {{ "POSITION": 0 }} }}] }}],
        "buffers": [{{ "byteLength": 68 }}],
        "bufferViews": [
            {{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }},
            {{ "buffer": 0, "byteOffset": 36, "byteLength": 8 }},
            {{ "buffer": 0, "byteOffset": 44, "byteLength": 24 }}
        ],
        "accessors": [
            {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
               "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] }},
            {{ "bufferView": 1, "componentType": 5126, "count": 2, "type": "SCALAR",
               "min": [0.0], "max": [1.0] }},
            {{ "bufferView": 2, "componentType": 5126, "count": 2, "type": "VEC3" }}
        ]{animations}
    }}"#
    );
    glb(&json, &bin)
}

/// Two empty nodes `A` and `B`, each driven by its own one second clip.
/// Both clips carry the exporter default name `Take 001`; `A` slides to
/// x = 2, `B` rises to y = 4.
pub(crate) fn two_clip_glb() -> Vec<u8> {
    let mut bin = floats(&[0.0, 1.0]);
    bin.extend(floats(&[0.0, 0.0, 0.0, 2.0, 0.0, 0.0]));
    bin.extend(floats(&[0.0, 0.0, 0.0, 0.0, 4.0, 0.0]));

    let json = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "name": "Pair", "nodes": [0, 1] }],
        "nodes": [{ "name": "A" }, { "name": "B" }],
        "buffers": [{ "byteLength": 56 }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 8 },
            { "buffer": 0, "byteOffset": 8, "byteLength": 24 },
            { "buffer": 0, "byteOffset": 32, "byteLength": 24 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 2, "type": "SCALAR",
              "min": [0.0], "max": [1.0] },
            { "bufferView": 1, "componentType": 5126, "count": 2, "type": "VEC3" },
            { "bufferView": 2, "componentType": 5126, "count": 2, "type": "VEC3" }
        ],
        "animations": [
            {
                "name": "Take 001",
                "channels": [{ "sampler": 0, "target": { "node": 0, "path": "translation" } }],
                "samplers": [{ "input": 0, "output": 1, "interpolation": "LINEAR" }]
            },
            {
                "name": "Take 001",
                "channels": [{ "sampler": 0, "target": { "node": 1, "path": "translation" } }],
                "samplers": [{ "input": 0, "output": 2, "interpolation": "LINEAR" }]
            }
        ]
    }"#;
    glb(json, &bin)
}

/// A JSON glTF with a single empty node: no meshes and no animations.
pub(crate) fn empty_gltf() -> Vec<u8> {
    br#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "name": "Empty", "nodes": [0] }],
        "nodes": [{ "name": "Anchor", "translation": [0.0, 1.0, 0.0] }]
    }"#
    .to_vec()
}

/// A triangle mesh whose base colour texture points at a file nobody serves.
pub(crate) fn textured_triangle_gltf() -> Vec<u8> {
    br#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "name": "Tri", "mesh": 0 }],
        "meshes": [{ "name": "tri", "primitives": [{ "attributes": { "POSITION": 0 }, "material": 0 }] }],
        "materials": [{
            "name": "wood",
            "pbrMetallicRoughness": {
                "baseColorFactor": [0.5, 0.25, 0.0, 1.0],
                "baseColorTexture": { "index": 0 }
            }
        }],
        "textures": [{ "source": 0 }],
        "images": [{ "name": "wood", "uri": "wood.png" }],
        "buffers": [{ "uri": "tri.bin", "byteLength": 36 }],
        "bufferViews": [{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }],
        "accessors": [{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                        "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] }]
    }"#
    .to_vec()
}

pub(crate) fn triangle_bin() -> Vec<u8> {
    floats(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0])
}

/// Unit cube from -0.5 to 0.5, twelve triangles.
pub(crate) fn unit_cube() -> MeshData {
    model_ngin::data_structures::primitives::box_geometry(1.0, 1.0, 1.0)
        .expect("unit cube is valid")
}

pub(crate) fn png_bytes(image: &image::RgbaImage) -> Vec<u8> {
    let mut out = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut out, image::ImageFormat::Png)
        .expect("encoding a png in memory");
    out.into_inner()
}

/// Holds every fetch until the gate is opened (or its sender dropped).
pub(crate) struct GatedSource {
    inner: MemorySource,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl GatedSource {
    pub(crate) fn new(inner: MemorySource) -> (Self, oneshot::Sender<()>) {
        let (open, gate) = oneshot::channel();
        (
            Self {
                inner,
                gate: Mutex::new(Some(gate)),
            },
            open,
        )
    }
}

impl AssetSource for GatedSource {
    async fn fetch(
        &self,
        url: &str,
        progress: &mut dyn FnMut(Progress),
    ) -> anyhow::Result<Vec<u8>> {
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.inner.fetch(url, progress).await
    }
}
