//! Asynchronous model loading.
//!
//! A [`LoadRequest`] describes one model: where it lives, how it is placed and
//! what should happen once it is ready. [`ModelLoader::configure`] turns the
//! request into a [`LoaderHandle`] without doing any I/O, and
//! [`ModelLoader::load`] returns a future that fetches and decodes the file.
//! The caller decides how that future is driven (spawned on the web, awaited
//! or blocked on natively); the loader never drives itself.
//!
//! # Lifecycle
//!
//! ```text
//! Configured ──load──▶ Loading ──▶ Loaded
//!     │                   ├──────▶ Failed
//!     └──────cancel───────┴──────▶ Cancelled
//! ```
//!
//! Loaded, Failed and Cancelled are terminal. A second `load` on the same
//! handle is rejected, and cancelling a running load suppresses its
//! completion callback and animation registration.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use cgmath::Vector3;
use parking_lot::Mutex;

use crate::{
    animation::{mixer::AnimationMixer, scheduler::SharedScheduler},
    config::LoaderConfig,
    data_structures::{
        instance::Instance,
        material::{Color, ColorMap, ImageTexture, Material, PointsMaterial},
        scene_graph::{NodeRef, Renderable, SceneNode},
        texture::soft_circle_sprite,
    },
    error::{LoadError, LoadWarning, Outcome},
    resources::{
        DecodedScene, GltfDecoder,
        decompress::MeshDecompressor,
        source::{AssetSource, FileSource, Progress},
        texture::{load_color_map, load_image},
    },
    sampler::{PointCloud, default_palette},
};

/// Identifies one handle, and with it the animation player of its model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(u64);

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

impl HandleId {
    fn next() -> Self {
        Self(NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    Configured,
    Loading,
    Loaded,
    Failed,
    Cancelled,
}

impl LoadState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            LoadState::Loaded | LoadState::Failed | LoadState::Cancelled
        )
    }
}

pub type LoadCallback = Box<dyn FnOnce(NodeRef)>;
pub type ProgressCallback = Box<dyn FnMut(Progress)>;

/// Everything needed to load and place one model.
///
/// The request is moved into the loader by [`ModelLoader::configure`], so it
/// cannot change while the load is in flight.
pub struct LoadRequest {
    pub name: String,
    pub url: String,
    pub scale: Vector3<f32>,
    pub position: Vector3<f32>,
    /// XYZ Euler angles in radians.
    pub rotation: Vector3<f32>,
    /// Swap every material of the model for a matcap.
    pub replace_materials: bool,
    pub matcap_url: Option<String>,
    pub particle_url: Option<String>,
    on_progress: Option<ProgressCallback>,
    callback: Option<LoadCallback>,
}

impl LoadRequest {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            scale: Vector3::new(1.0, 1.0, 1.0),
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            replace_materials: false,
            matcap_url: None,
            particle_url: None,
            on_progress: None,
            callback: None,
        }
    }

    pub fn scale(mut self, scale: impl Into<Vector3<f32>>) -> Self {
        self.scale = scale.into();
        self
    }

    pub fn position(mut self, position: impl Into<Vector3<f32>>) -> Self {
        self.position = position.into();
        self
    }

    pub fn rotation(mut self, rotation: impl Into<Vector3<f32>>) -> Self {
        self.rotation = rotation.into();
        self
    }

    /// Swap all materials for a matcap, optionally with a specific texture.
    pub fn replace_materials(mut self, matcap_url: Option<&str>) -> Self {
        self.replace_materials = true;
        self.matcap_url = matcap_url.map(str::to_string);
        self
    }

    pub fn particle(mut self, particle_url: impl Into<String>) -> Self {
        self.particle_url = Some(particle_url.into());
        self
    }

    /// Observe `(loaded, total)` progress. Without an observer progress is logged.
    pub fn on_progress(mut self, observer: impl FnMut(Progress) + 'static) -> Self {
        self.on_progress = Some(Box::new(observer));
        self
    }

    /// Called once with the finished node, only if the load succeeds.
    pub fn on_loaded(mut self, callback: impl FnOnce(NodeRef) + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    fn transform(&self) -> Instance {
        Instance::from_parts(self.position, self.rotation, self.scale)
    }
}

impl std::fmt::Debug for LoadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadRequest")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("scale", &self.scale)
            .field("position", &self.position)
            .field("rotation", &self.rotation)
            .field("replace_materials", &self.replace_materials)
            .field("matcap_url", &self.matcap_url)
            .field("particle_url", &self.particle_url)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

struct HandleInner {
    id: HandleId,
    name: String,
    url: String,
    state: Mutex<LoadState>,
    node: Mutex<Option<NodeRef>>,
    request: Mutex<Option<LoadRequest>>,
}

/// Shared view of one configured load. Clones refer to the same load.
#[derive(Clone)]
pub struct LoaderHandle {
    inner: Arc<HandleInner>,
}

impl LoaderHandle {
    fn new(request: LoadRequest) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                id: HandleId::next(),
                name: request.name.clone(),
                url: request.url.clone(),
                state: Mutex::new(LoadState::Configured),
                node: Mutex::new(None),
                request: Mutex::new(Some(request)),
            }),
        }
    }

    pub fn id(&self) -> HandleId {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn state(&self) -> LoadState {
        *self.inner.state.lock()
    }

    /// The loaded node, once the handle reached `Loaded`.
    pub fn node(&self) -> Option<NodeRef> {
        self.inner.node.lock().clone()
    }

    /// Cancels a load that has not completed yet.
    ///
    /// Returns `false` if the handle is already in a terminal state.
    pub fn cancel(&self) -> bool {
        let mut state = self.inner.state.lock();
        match *state {
            LoadState::Configured | LoadState::Loading => {
                log::info!("Cancelling load of {} model", self.inner.name);
                *state = LoadState::Cancelled;
                // nothing will ever call back into the request now
                self.inner.request.lock().take();
                true
            }
            LoadState::Loaded | LoadState::Failed | LoadState::Cancelled => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == LoadState::Cancelled
    }

    /// `Configured → Loading`, handing out the request.
    fn begin(&self) -> Result<LoadRequest, LoadError> {
        let mut state = self.inner.state.lock();
        let request = match *state {
            LoadState::Configured => self.inner.request.lock().take(),
            _ => None,
        };
        match request {
            Some(request) => {
                *state = LoadState::Loading;
                Ok(request)
            }
            None => Err(LoadError::InvalidState {
                name: self.inner.name.clone(),
                state: *state,
            }),
        }
    }

    /// `Loading → Failed`. A cancelled load reports the cancellation instead.
    fn fail(&self, error: LoadError) -> LoadError {
        let mut state = self.inner.state.lock();
        match *state {
            LoadState::Loading => {
                *state = LoadState::Failed;
                error
            }
            _ => LoadError::Cancelled(self.inner.name.clone()),
        }
    }

    /// `Loading → Loaded`. Returns `false` if the load was cancelled meanwhile.
    fn complete(&self, node: NodeRef) -> bool {
        let mut state = self.inner.state.lock();
        if *state != LoadState::Loading {
            return false;
        }
        *state = LoadState::Loaded;
        *self.inner.node.lock() = Some(node);
        true
    }
}

impl std::fmt::Debug for LoaderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderHandle")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .finish()
    }
}

/// Loads models from an [`AssetSource`].
pub struct ModelLoader<S> {
    source: S,
    decoder: GltfDecoder,
    config: LoaderConfig,
}

impl ModelLoader<FileSource> {
    /// Reads from the configured asset root on disk (or the page origin on the web).
    pub fn from_config(config: LoaderConfig) -> Self {
        Self::with_config(FileSource::new(config.asset_root.clone()), config)
    }
}

impl<S: AssetSource> ModelLoader<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, LoaderConfig::default())
    }

    pub fn with_config(source: S, config: LoaderConfig) -> Self {
        Self {
            source,
            decoder: GltfDecoder::new(config.decoder.clone()),
            config,
        }
    }

    /// Attaches a codec for compressed meshes.
    pub fn with_decompressor(mut self, decompressor: Arc<dyn MeshDecompressor>) -> Self {
        self.decoder = self.decoder.with_decompressor(decompressor);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Stores the request; no I/O happens until [`Self::load`].
    pub fn configure(&self, request: LoadRequest) -> Result<LoaderHandle, LoadError> {
        if request.url.trim().is_empty() {
            return Err(LoadError::MissingUrl(request.name));
        }
        Ok(LoaderHandle::new(request))
    }

    /// Fetches, decodes and places the model of `handle`.
    ///
    /// On success the root node carries the requested transform, every
    /// embedded clip plays in a loop on a mixer registered with `scheduler`
    /// under the handle's id, and the request's callback has been called.
    pub async fn load(
        &self,
        handle: &LoaderHandle,
        scheduler: &SharedScheduler,
    ) -> Result<Outcome<NodeRef>, LoadError> {
        let mut request = handle.begin()?;
        log::info!("Starting to load model: {}", request.url);

        let DecodedScene {
            mut root,
            clips,
            mut warnings,
        } = match self.fetch_and_decode(&mut request).await {
            Ok(decoded) => decoded,
            Err(e) => return Err(handle.fail(e)),
        };
        log::info!("{} model loaded successfully", request.name);

        root.local = request.transform();
        log::debug!(
            "Applied scale {:?} and position {:?} to {}",
            request.scale,
            request.position,
            request.name
        );

        if request.replace_materials {
            let url = request
                .matcap_url
                .clone()
                .unwrap_or_else(|| self.config.default_matcap.clone());
            let matcap = load_color_map(&self.source, &url, Color::WHITE)
                .await
                .collect_into(&mut warnings);
            root.set_material_all(&Material::Matcap { matcap });
        }

        let node = root.into_ref();
        if !handle.complete(node.clone()) {
            log::info!("Load of {} model was cancelled, discarding it", request.name);
            return Err(LoadError::Cancelled(request.name));
        }

        if !clips.is_empty() {
            log::info!("Found {} animations in {}", clips.len(), request.name);
            let mut mixer = AnimationMixer::new(node.clone());
            for clip in clips {
                log::info!("Playing animation: {}", clip.name);
                mixer.clip_action(clip).play();
            }
            scheduler.lock().insert(handle.id(), mixer);
        }

        if let Some(callback) = request.callback.take() {
            log::debug!("Calling callback of {} model", request.name);
            callback(node.clone());
        }
        Ok(Outcome::with_warnings(node, warnings))
    }

    /// Loads the model of `handle` as point clouds: every mesh is replaced by
    /// points sampled from its surface, grouped under one root.
    ///
    /// Animations are not played on point clouds.
    pub async fn load_points(&self, handle: &LoaderHandle) -> Result<Outcome<NodeRef>, LoadError> {
        let mut request = handle.begin()?;
        log::info!("Starting to load model {} as points", request.url);

        let decoded = match self.fetch_and_decode(&mut request).await {
            Ok(decoded) => decoded,
            Err(e) => return Err(handle.fail(e)),
        };
        let mut warnings = decoded.warnings;

        let particle_url = request
            .particle_url
            .clone()
            .unwrap_or_else(|| self.config.default_particle.clone());
        let sprite = self.load_sprite(&particle_url).await.collect_into(&mut warnings);
        let material = PointsMaterial::default().with_alpha_map(sprite);
        let palette = default_palette();

        let mut rng = rand::thread_rng();
        let mut clouds = Vec::new();
        for mesh in decoded.root.meshes() {
            match PointCloud::sample_with(
                &mesh.geometry,
                self.config.point_count,
                &palette,
                material.clone(),
                &mut rng,
            ) {
                Ok(cloud) => {
                    let mut node = SceneNode::new(format!("{}_points", mesh.name));
                    node.renderables.push(Renderable::Points(cloud));
                    clouds.push(node);
                }
                Err(e) => {
                    log::warn!("Skipping point cloud for mesh {}: {e}", mesh.name);
                    warnings.push(LoadWarning::SkippedPointCloud {
                        mesh: mesh.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let mut group = SceneNode::group(format!("{}_points", request.name), clouds);
        group.local = request.transform();

        let node = group.into_ref();
        if !handle.complete(node.clone()) {
            return Err(LoadError::Cancelled(request.name));
        }
        if let Some(callback) = request.callback.take() {
            callback(node.clone());
        }
        Ok(Outcome::with_warnings(node, warnings))
    }

    /// Drives several loads concurrently; results keep the order of `handles`.
    pub async fn load_all(
        &self,
        handles: &[LoaderHandle],
        scheduler: &SharedScheduler,
    ) -> Vec<Result<Outcome<NodeRef>, LoadError>> {
        futures::future::join_all(handles.iter().map(|handle| self.load(handle, scheduler))).await
    }

    async fn fetch_and_decode(&self, request: &mut LoadRequest) -> Result<DecodedScene, LoadError> {
        let name = request.name.clone();
        let observer = &mut request.on_progress;
        let mut report = |progress: Progress| match observer.as_mut() {
            Some(observer) => observer(progress),
            None => {
                if let Some(percent) = progress.percent() {
                    log::info!("Loading {name} model... {percent:.2}%");
                }
            }
        };

        let bytes = match self.source.fetch(&request.url, &mut report).await {
            Ok(bytes) => bytes,
            Err(reason) => {
                log::error!("Error loading {name} model: {reason:#}");
                log::error!("URL attempted: {}", request.url);
                return Err(LoadError::Fetch {
                    url: request.url.clone(),
                    reason,
                });
            }
        };

        self.decoder
            .decode(&self.source, &request.url, &bytes)
            .await
            .map_err(|reason| {
                log::error!("Error decoding {name} model: {reason:#}");
                log::error!("URL attempted: {}", request.url);
                LoadError::Decode {
                    url: request.url.clone(),
                    reason,
                }
            })
    }

    async fn load_sprite(&self, url: &str) -> Outcome<ColorMap> {
        match load_image(&self.source, url).await {
            Ok(texture) => Outcome::clean(ColorMap::Texture(texture)),
            Err(e) => {
                log::warn!("Particle sprite {url} unavailable, generating one: {e:#}");
                Outcome::with_warnings(
                    ColorMap::Texture(ImageTexture {
                        name: "soft circle".to_string(),
                        image: Arc::new(soft_circle_sprite(64)),
                    }),
                    vec![LoadWarning::TextureFallback {
                        url: url.to_string(),
                        reason: format!("{e:#}"),
                    }],
                )
            }
        }
    }
}
