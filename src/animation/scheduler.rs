//! The per-frame owner of every active animation player.
//!
//! Each successful load of an animated model inserts one mixer keyed by the
//! id of its loader handle. The frame driver calls
//! [`AnimationScheduler::update`] once per frame; when a model leaves the
//! scene the caller removes its mixer again.

use std::sync::Arc;

use instant::{Duration, Instant};
use parking_lot::Mutex;

use crate::{animation::mixer::AnimationMixer, loader::HandleId};

/// Scheduler shared between the frame driver and running loads.
pub type SharedScheduler = Arc<Mutex<AnimationScheduler>>;

#[derive(Debug, Default)]
pub struct AnimationScheduler {
    // insertion order is update order
    mixers: Vec<(HandleId, AnimationMixer)>,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedScheduler {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Registers `mixer` for `id`, returning the mixer it replaced.
    pub fn insert(&mut self, id: HandleId, mixer: AnimationMixer) -> Option<AnimationMixer> {
        match self.mixers.iter_mut().find(|(key, _)| *key == id) {
            Some((_, existing)) => Some(std::mem::replace(existing, mixer)),
            None => {
                self.mixers.push((id, mixer));
                None
            }
        }
    }

    pub fn remove(&mut self, id: HandleId) -> Option<AnimationMixer> {
        let idx = self.mixers.iter().position(|(key, _)| *key == id)?;
        Some(self.mixers.remove(idx).1)
    }

    pub fn contains(&self, id: HandleId) -> bool {
        self.mixers.iter().any(|(key, _)| *key == id)
    }

    pub fn get(&self, id: HandleId) -> Option<&AnimationMixer> {
        self.mixers
            .iter()
            .find(|(key, _)| *key == id)
            .map(|(_, mixer)| mixer)
    }

    pub fn get_mut(&mut self, id: HandleId) -> Option<&mut AnimationMixer> {
        self.mixers
            .iter_mut()
            .find(|(key, _)| *key == id)
            .map(|(_, mixer)| mixer)
    }

    pub fn ids(&self) -> impl Iterator<Item = HandleId> + '_ {
        self.mixers.iter().map(|(id, _)| *id)
    }

    pub fn len(&self) -> usize {
        self.mixers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mixers.is_empty()
    }

    /// Advances every mixer by `dt`.
    pub fn update(&mut self, dt: Duration) {
        for (_, mixer) in self.mixers.iter_mut() {
            mixer.update(dt);
        }
    }
}

/// Measures the time between frames for the frame driver.
#[derive(Debug)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
        }
    }

    /// Time since the previous `tick` (or since creation).
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let dt = now.duration_since(self.last);
        self.last = now;
        dt
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
