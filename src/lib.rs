//! model-ngin
//!
//! Loading and animating glTF models for small teaching scenes, native and
//! on the web. A model is configured once, loaded asynchronously, placed with
//! a scale, position and rotation, and its embedded animations keep playing
//! through a shared scheduler that the frame loop ticks. Models can also be
//! turned into point clouds sampled from their surfaces.
//!
//! High-level modules
//! - `loader`: load requests, handles and the asynchronous model loader
//! - `animation`: clips, mixers and the scheduler that advances them
//! - `resources`: asset sources, glTF decoding and texture loading
//! - `sampler`: uniform surface sampling of meshes into point clouds
//! - `data_structures`: scene graph, meshes, materials, primitives and textures
//! - `pipelines` and `render`: GPU pipelines and buffers for point clouds
//! - `config` and `error`: loader configuration and error types
//!
//! ```no_run
//! use model_ngin::{AnimationScheduler, LoadRequest, ModelLoader, LoaderConfig};
//!
//! # async fn run() -> Result<(), model_ngin::LoadError> {
//! let loader = ModelLoader::from_config(LoaderConfig::from_env());
//! let scheduler = AnimationScheduler::shared();
//! let handle = loader.configure(
//!     LoadRequest::new("dog", "models/dog.glb")
//!         .scale([2.0, 2.0, 2.0])
//!         .position([0.0, -0.5, 3.0]),
//! )?;
//! let loaded = loader.load(&handle, &scheduler).await?;
//! println!("{} nodes", loaded.value.lock().node_count());
//! # Ok(())
//! # }
//! ```

pub mod animation;
pub mod config;
pub mod data_structures;
pub mod error;
pub mod loader;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod sampler;

// Re-exports commonly used types for convenience in downstream code.
pub use animation::{
    AnimationClip,
    mixer::{AnimationMixer, LoopMode},
    scheduler::{AnimationScheduler, FrameClock, SharedScheduler},
};
pub use cgmath;
pub use config::LoaderConfig;
pub use data_structures::scene_graph::{NodeRef, SceneNode};
pub use error::{LoadError, LoadWarning, Outcome, SampleError};
pub use loader::{HandleId, LoadRequest, LoadState, LoaderHandle, ModelLoader};
pub use resources::source::{AssetSource, FileSource, MemorySource, Progress};
pub use sampler::PointCloud;
pub use wgpu;

/// Installs the platform logger. Safe to call more than once.
pub fn init_logger() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            log::debug!("Logger already initialised: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        let _ = console_log::init_with_level(log::Level::Info);
    }
}
