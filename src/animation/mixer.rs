//! Animation player bound to one loaded node tree.

use std::sync::Arc;

use instant::Duration;

use crate::{
    animation::{AnimationClip, Pose},
    data_structures::scene_graph::{NodeRef, SceneNode},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// Wrap back to the start after the last key.
    #[default]
    Repeat,
    /// Hold the last key and stop.
    Once,
}

/// Playback state of one clip.
#[derive(Clone, Debug)]
pub struct AnimationAction {
    clip: Arc<AnimationClip>,
    time: f32,
    playing: bool,
    pub loop_mode: LoopMode,
    pub time_scale: f32,
}

impl AnimationAction {
    fn new(clip: Arc<AnimationClip>) -> Self {
        Self {
            clip,
            time: 0.0,
            playing: false,
            loop_mode: LoopMode::default(),
            time_scale: 1.0,
        }
    }

    pub fn play(&mut self) -> &mut Self {
        self.playing = true;
        self
    }

    /// Stops and rewinds.
    pub fn stop(&mut self) -> &mut Self {
        self.playing = false;
        self.time = 0.0;
        self
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    fn advance(&mut self, dt: f32) {
        if !self.playing {
            return;
        }
        let duration = self.clip.duration;
        self.time += dt * self.time_scale;
        if duration <= 0.0 {
            self.time = 0.0;
            return;
        }
        match self.loop_mode {
            LoopMode::Repeat => self.time = self.time.rem_euclid(duration),
            LoopMode::Once => {
                if self.time >= duration {
                    self.time = duration;
                    self.playing = false;
                }
            }
        }
    }
}

/// Plays any number of clips on the node tree below `root`.
///
/// Clips play concurrently; when two clips drive the same channel of the same
/// node, the one added later wins.
pub struct AnimationMixer {
    root: NodeRef,
    actions: Vec<AnimationAction>,
}

impl AnimationMixer {
    pub fn new(root: NodeRef) -> Self {
        Self {
            root,
            actions: Vec::new(),
        }
    }

    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    /// The action for `clip`, created on first use.
    ///
    /// Actions are matched by the whole clip, so two different clips that
    /// share a name each get their own action.
    pub fn clip_action(&mut self, clip: AnimationClip) -> &mut AnimationAction {
        let idx = match self
            .actions
            .iter()
            .position(|action| *action.clip == clip)
        {
            Some(idx) => idx,
            None => {
                self.actions.push(AnimationAction::new(Arc::new(clip)));
                self.actions.len() - 1
            }
        };
        &mut self.actions[idx]
    }

    /// The first action whose clip is called `name`.
    pub fn action(&self, name: &str) -> Option<&AnimationAction> {
        self.actions.iter().find(|action| action.clip.name == name)
    }

    pub fn actions(&self) -> &[AnimationAction] {
        &self.actions
    }

    pub fn is_playing(&self) -> bool {
        self.actions.iter().any(AnimationAction::is_playing)
    }

    /// Advances every playing action by `dt` and poses the node tree.
    pub fn update(&mut self, dt: Duration) {
        let dt = dt.as_secs_f32();
        let mut poses = Vec::new();
        for action in self.actions.iter_mut() {
            let was_playing = action.playing;
            action.advance(dt);
            // a `Once` action that just finished still applies its last key
            if was_playing {
                poses.extend(action.clip.sample(action.time));
            }
        }
        if poses.is_empty() {
            return;
        }
        let mut root = self.root.lock();
        for (target, pose) in poses {
            match root.find_by_source_mut(target) {
                Some(node) => apply_pose(node, pose),
                None => log::debug!("animation target {target} is not part of this model"),
            }
        }
    }
}

fn apply_pose(node: &mut SceneNode, pose: Pose) {
    match pose {
        Pose::Translation(position) => node.local.position = position,
        Pose::Rotation(rotation) => node.local.rotation = rotation,
        Pose::Scale(scale) => node.local.scale = scale,
    }
}

impl std::fmt::Debug for AnimationMixer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationMixer")
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}
