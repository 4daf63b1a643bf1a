//! Keyframed animation clips and their playback.
//!
//! - [`AnimationClip`] is a named set of tracks decoded from a model file
//! - [`mixer::AnimationMixer`] plays clips on one loaded node tree
//! - [`scheduler::AnimationScheduler`] owns every active mixer and advances
//!   them once per frame

use cgmath::{InnerSpace, Quaternion, Vector3, VectorSpace};

pub mod mixer;
pub mod scheduler;

#[derive(Clone, Debug, PartialEq)]
pub enum Keyframes {
    Translation(Vec<Vector3<f32>>),
    Rotation(Vec<Quaternion<f32>>),
    Scale(Vec<Vector3<f32>>),
    /// Morph target weights, `timestamps.len() * targets` values.
    MorphWeights(Vec<f32>),
}

impl Keyframes {
    pub fn len(&self) -> usize {
        match self {
            Keyframes::Translation(v) => v.len(),
            Keyframes::Rotation(v) => v.len(),
            Keyframes::Scale(v) => v.len(),
            Keyframes::MorphWeights(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Interpolation {
    #[default]
    Linear,
    Step,
    /// Only the key values are used; tangents are dropped when decoding.
    CubicSpline,
}

/// The value of one channel at one point in time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Pose {
    Translation(Vector3<f32>),
    Rotation(Quaternion<f32>),
    Scale(Vector3<f32>),
}

/// One animated channel of one node.
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    /// Index of the target node in the source document.
    pub target: usize,
    pub timestamps: Vec<f32>,
    pub keyframes: Keyframes,
    pub interpolation: Interpolation,
}

impl Track {
    /// Samples the track at `time`, clamping to the first and last key.
    ///
    /// Morph weights have no node transform to drive and yield `None`, as do
    /// tracks without keys.
    pub fn sample(&self, time: f32) -> Option<Pose> {
        let keys = self.timestamps.len().min(self.keyframes.len());
        if keys == 0 {
            return None;
        }
        let (lo, hi, t) = self.bracket(time, keys);
        match &self.keyframes {
            Keyframes::Translation(values) => {
                Some(Pose::Translation(values[lo].lerp(values[hi], t)))
            }
            Keyframes::Scale(values) => Some(Pose::Scale(values[lo].lerp(values[hi], t))),
            Keyframes::Rotation(values) => {
                let (a, b) = (values[lo], values[hi]);
                let rotation = if lo == hi || t == 0.0 {
                    a
                } else {
                    a.slerp(b, t)
                };
                Some(Pose::Rotation(rotation.normalize()))
            }
            Keyframes::MorphWeights(_) => None,
        }
    }

    /// Surrounding key indices and the blend factor between them.
    fn bracket(&self, time: f32, keys: usize) -> (usize, usize, f32) {
        let times = &self.timestamps[..keys];
        if time <= times[0] {
            return (0, 0, 0.0);
        }
        if time >= times[keys - 1] {
            return (keys - 1, keys - 1, 0.0);
        }
        let hi = times.partition_point(|&k| k <= time);
        let lo = hi - 1;
        let span = times[hi] - times[lo];
        let t = if span > 0.0 {
            (time - times[lo]) / span
        } else {
            0.0
        };
        match self.interpolation {
            Interpolation::Step => (lo, lo, 0.0),
            Interpolation::Linear | Interpolation::CubicSpline => (lo, hi, t),
        }
    }

    pub fn duration(&self) -> f32 {
        self.timestamps.last().copied().unwrap_or(0.0)
    }
}

/// A named animation: every track that shared the same animation in the file.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub tracks: Vec<Track>,
    pub duration: f32,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, tracks: Vec<Track>) -> Self {
        let duration = tracks.iter().map(Track::duration).fold(0.0, f32::max);
        Self {
            name: name.into(),
            tracks,
            duration,
        }
    }

    /// `(target, pose)` for every track at `time`.
    pub fn sample(&self, time: f32) -> Vec<(usize, Pose)> {
        self.tracks
            .iter()
            .filter_map(|track| track.sample(time).map(|pose| (track.target, pose)))
            .collect()
    }
}
