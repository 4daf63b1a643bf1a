//! Hook for compressed mesh data inside glTF files.
//!
//! Primitives stored with `KHR_draco_mesh_compression` carry their geometry in
//! a single compressed buffer view. The codec itself is not part of this crate:
//! callers attach a [`MeshDecompressor`] to the decoder, configured with the
//! path its codec resources live under.

use crate::data_structures::mesh::MeshData;

pub const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Location of the codec resources, relative to the asset root.
    pub decoder_path: String,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            decoder_path: "draco/".to_string(),
        }
    }
}

/// One compressed primitive as found in the document.
#[derive(Debug)]
pub struct CompressedPrimitive<'a> {
    pub mesh: &'a str,
    pub data: &'a [u8],
    /// Attribute ids inside the compressed stream.
    pub position_attribute: Option<u64>,
    pub normal_attribute: Option<u64>,
    pub decoder_path: &'a str,
}

pub trait MeshDecompressor {
    fn decompress(&self, primitive: CompressedPrimitive<'_>) -> anyhow::Result<MeshData>;
}
