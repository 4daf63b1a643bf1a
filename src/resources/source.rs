//! Where asset bytes come from.
//!
//! Natively assets are read below an asset root on disk; on the web they are
//! fetched relative to the page origin. Both report progress as
//! `(loaded, total)` byte pairs while reading.

use std::{collections::HashMap, future::Future, path::PathBuf};

use anyhow::anyhow;

/// Bytes read so far out of the expected total (if the source knows it).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub loaded: u64,
    pub total: Option<u64>,
}

impl Progress {
    /// Completion in percent, or `None` while the total is unknown.
    pub fn percent(&self) -> Option<f64> {
        match self.total {
            Some(0) => Some(100.0),
            Some(total) => Some(self.loaded as f64 / total as f64 * 100.0),
            None => None,
        }
    }
}

/// Fetches raw asset bytes by url.
pub trait AssetSource {
    fn fetch(
        &self,
        url: &str,
        progress: &mut dyn FnMut(Progress),
    ) -> impl Future<Output = anyhow::Result<Vec<u8>>>;
}

fn normalize(url: &str) -> &str {
    url.trim_start_matches("./").trim_start_matches('/')
}

/// Reads assets below `root` (by default `./assets`).
#[derive(Clone, Debug)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

impl Default for FileSource {
    fn default() -> Self {
        Self::new(std::path::Path::new("./").join("assets"))
    }
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow!("no window available"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow!("page origin unavailable"))?;
    let base = reqwest::Url::parse(&format!("{}/", origin))?;
    Ok(base.join(file_name)?)
}

#[cfg(not(target_arch = "wasm32"))]
const CHUNK_SIZE: usize = 64 * 1024;

impl AssetSource for FileSource {
    async fn fetch(
        &self,
        url: &str,
        progress: &mut dyn FnMut(Progress),
    ) -> anyhow::Result<Vec<u8>> {
        #[cfg(target_arch = "wasm32")]
        let data = {
            let url = format_url(normalize(url))?;
            let response = reqwest::get(url).await?.error_for_status()?;
            let total = response.content_length();
            let data = response.bytes().await?.to_vec();
            progress(Progress {
                loaded: data.len() as u64,
                total,
            });
            data
        };
        #[cfg(not(target_arch = "wasm32"))]
        let data = {
            use tokio::io::AsyncReadExt;

            let path = self.root.join(normalize(url));
            let mut file = tokio::fs::File::open(&path)
                .await
                .map_err(|e| anyhow!("{}: {e}", path.display()))?;
            let total = file.metadata().await?.len();
            let mut data = Vec::with_capacity(total as usize);
            let mut chunk = vec![0u8; CHUNK_SIZE];
            loop {
                let read = file.read(&mut chunk).await?;
                if read == 0 {
                    break;
                }
                data.extend_from_slice(&chunk[..read]);
                progress(Progress {
                    loaded: data.len() as u64,
                    total: Some(total),
                });
            }
            data
        };

        Ok(data)
    }
}

/// Serves assets from memory, e.g. bundled with `include_bytes!`.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    assets: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: &str, bytes: impl Into<Vec<u8>>) {
        self.assets.insert(normalize(url).to_string(), bytes.into());
    }

    pub fn with(mut self, url: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(url, bytes);
        self
    }
}

impl AssetSource for MemorySource {
    async fn fetch(
        &self,
        url: &str,
        progress: &mut dyn FnMut(Progress),
    ) -> anyhow::Result<Vec<u8>> {
        let bytes = self
            .assets
            .get(normalize(url))
            .cloned()
            .ok_or_else(|| anyhow!("asset '{url}' not found"))?;
        let total = bytes.len() as u64;
        progress(Progress {
            loaded: total,
            total: Some(total),
        });
        Ok(bytes)
    }
}

/// Resolves `uri` relative to the directory of `base`.
pub fn resolve_relative(base: &str, uri: &str) -> String {
    match base.rfind('/') {
        Some(idx) if !uri.starts_with('/') => format!("{}/{}", &base[..idx], uri),
        _ => uri.to_string(),
    }
}
