//! Loader configuration.

use std::path::PathBuf;

use crate::{resources::decompress::DecoderConfig, sampler::DEFAULT_POINT_COUNT};

pub const ASSET_ROOT_ENV: &str = "MODEL_NGIN_ASSET_ROOT";
pub const DECODER_PATH_ENV: &str = "MODEL_NGIN_DECODER_PATH";

/// Paths and defaults shared by every load of a [`crate::loader::ModelLoader`].
#[derive(Clone, Debug, PartialEq)]
pub struct LoaderConfig {
    /// Root directory for [`crate::resources::source::FileSource`].
    pub asset_root: PathBuf,
    pub decoder: DecoderConfig,
    /// Matcap used when a request swaps materials without naming a texture.
    pub default_matcap: String,
    /// Point sprite used when a request does not name one.
    pub default_particle: String,
    pub point_count: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            asset_root: std::path::Path::new("./").join("assets"),
            decoder: DecoderConfig::default(),
            default_matcap: "mat.png".to_string(),
            default_particle: "10.png".to_string(),
            point_count: DEFAULT_POINT_COUNT,
        }
    }
}

impl LoaderConfig {
    /// Defaults, overridden by `MODEL_NGIN_ASSET_ROOT` and `MODEL_NGIN_DECODER_PATH`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(root) = std::env::var(ASSET_ROOT_ENV) {
            config.asset_root = PathBuf::from(root);
        }
        if let Ok(path) = std::env::var(DECODER_PATH_ENV) {
            config.decoder.decoder_path = path;
        }
        log::debug!("Loader configuration: {:?}", config);
        config
    }
}
