use std::sync::Arc;

use anyhow::Context;

use crate::{
    data_structures::material::{Color, ColorMap, ImageTexture},
    error::{LoadWarning, Outcome},
    resources::source::{AssetSource, Progress},
};

/// Directory below the asset root that holds loose textures.
pub const TEXTURE_DIR: &str = "textures";

/// `textures/<file_name>`
pub fn texture_url(file_name: &str) -> String {
    format!("{}/{}", TEXTURE_DIR, file_name.trim_start_matches('/'))
}

/// Decodes image bytes, using the file extension as a format hint when there is one.
pub fn decode_image(bytes: &[u8], name: &str, format: Option<&str>) -> anyhow::Result<ImageTexture> {
    let hint = format.and_then(image::ImageFormat::from_extension).or_else(|| {
        std::path::Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(image::ImageFormat::from_extension)
    });
    let img = match hint {
        Some(fmt) => image::load_from_memory_with_format(bytes, fmt)
            .or_else(|_| image::load_from_memory(bytes)),
        None => image::load_from_memory(bytes),
    }
    .with_context(|| format!("could not decode image {name}"))?;
    Ok(ImageTexture {
        name: name.to_string(),
        image: Arc::new(img.to_rgba8()),
    })
}

pub async fn load_image<S: AssetSource>(source: &S, url: &str) -> anyhow::Result<ImageTexture> {
    let bytes = source
        .fetch(url, &mut |progress: Progress| {
            if let Some(percent) = progress.percent() {
                log::trace!("Loading texture {url}: {percent:.0}%");
            }
        })
        .await?;
    decode_image(&bytes, url, None)
}

/// Loads a texture, substituting `fallback` if it cannot be fetched or decoded.
///
/// A missing texture never fails the caller; the substitution is logged and
/// reported as a [`LoadWarning::TextureFallback`].
pub async fn load_color_map<S: AssetSource>(
    source: &S,
    url: &str,
    fallback: Color,
) -> Outcome<ColorMap> {
    log::debug!("Attempting to load texture: {url}");
    match load_image(source, url).await {
        Ok(texture) => {
            log::debug!("Successfully loaded texture: {url}");
            Outcome::clean(ColorMap::Texture(texture))
        }
        Err(e) => {
            log::warn!("Error loading texture {url}, using a flat colour instead: {e:#}");
            Outcome::with_warnings(
                ColorMap::Flat(fallback),
                vec![LoadWarning::TextureFallback {
                    url: url.to_string(),
                    reason: format!("{e:#}"),
                }],
            )
        }
    }
}
