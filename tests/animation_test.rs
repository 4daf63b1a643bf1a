use std::time::Duration;

use cgmath::{InnerSpace, Quaternion, Rotation3, Vector3};
use model_ngin::{
    AnimationClip, AnimationMixer, AnimationScheduler, LoadRequest, LoopMode, MemorySource,
    ModelLoader, SceneNode,
    animation::{Interpolation, Keyframes, Pose, Track},
};

fn slide(target: usize) -> AnimationClip {
    AnimationClip::new(
        "slide",
        vec![Track {
            target,
            timestamps: vec![0.0, 1.0, 2.0],
            keyframes: Keyframes::Translation(vec![
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(1.0, 3.0, 0.0),
            ]),
            interpolation: Interpolation::Linear,
        }],
    )
}

fn model() -> SceneNode {
    let mut child = SceneNode::new("child");
    child.source_index = Some(4);
    SceneNode::group("root", vec![child])
}

fn child_position(mixer: &AnimationMixer) -> Vector3<f32> {
    mixer.root().lock().find_by_source(4).unwrap().local.position
}

#[test]
fn track_clamps_and_interpolates() {
    let clip = slide(0);
    let track = &clip.tracks[0];
    assert_eq!(clip.duration, 2.0);
    assert_eq!(track.sample(-1.0), Some(Pose::Translation(Vector3::new(0.0, 0.0, 0.0))));
    assert_eq!(track.sample(0.5), Some(Pose::Translation(Vector3::new(0.5, 0.0, 0.0))));
    assert_eq!(track.sample(1.5), Some(Pose::Translation(Vector3::new(1.0, 1.5, 0.0))));
    assert_eq!(track.sample(9.0), Some(Pose::Translation(Vector3::new(1.0, 3.0, 0.0))));
}

#[test]
fn step_tracks_hold_the_previous_key() {
    let track = Track {
        target: 0,
        timestamps: vec![0.0, 1.0],
        keyframes: Keyframes::Scale(vec![Vector3::new(1.0, 1.0, 1.0), Vector3::new(2.0, 2.0, 2.0)]),
        interpolation: Interpolation::Step,
    };
    assert_eq!(track.sample(0.99), Some(Pose::Scale(Vector3::new(1.0, 1.0, 1.0))));
    assert_eq!(track.sample(1.0), Some(Pose::Scale(Vector3::new(2.0, 2.0, 2.0))));
}

#[test]
fn rotations_stay_normalized() {
    let track = Track {
        target: 0,
        timestamps: vec![0.0, 1.0],
        keyframes: Keyframes::Rotation(vec![
            Quaternion::from_angle_y(cgmath::Deg(0.0)),
            Quaternion::from_angle_y(cgmath::Deg(90.0)),
        ]),
        interpolation: Interpolation::Linear,
    };
    let Some(Pose::Rotation(rotation)) = track.sample(0.5) else {
        panic!("expected a rotation");
    };
    assert!((rotation.magnitude() - 1.0).abs() < 1e-5);
    let expected = Quaternion::from_angle_y(cgmath::Deg(45.0));
    assert!((rotation.dot(expected).abs() - 1.0).abs() < 1e-4);
}

#[test]
fn morph_weights_do_not_pose_nodes() {
    let track = Track {
        target: 0,
        timestamps: vec![0.0],
        keyframes: Keyframes::MorphWeights(vec![0.3]),
        interpolation: Interpolation::Linear,
    };
    assert_eq!(track.sample(0.0), None);
}

#[test]
fn mixer_loops_repeating_actions() {
    let mut mixer = AnimationMixer::new(model().into_ref());
    mixer.clip_action(slide(4)).play();

    mixer.update(Duration::from_millis(500));
    assert_eq!(child_position(&mixer), Vector3::new(0.5, 0.0, 0.0));

    mixer.update(Duration::from_millis(2000));
    assert_eq!(mixer.action("slide").unwrap().time(), 0.5);
    assert_eq!(child_position(&mixer), Vector3::new(0.5, 0.0, 0.0));
    assert!(mixer.is_playing());
}

#[test]
fn once_actions_stop_on_their_last_key() {
    let mut mixer = AnimationMixer::new(model().into_ref());
    let action = mixer.clip_action(slide(4));
    action.loop_mode = LoopMode::Once;
    action.play();

    mixer.update(Duration::from_secs(5));
    assert!(!mixer.is_playing());
    assert_eq!(child_position(&mixer), Vector3::new(1.0, 3.0, 0.0));
}

#[test]
fn clip_actions_are_reused_for_the_same_clip() {
    let mut mixer = AnimationMixer::new(model().into_ref());
    mixer.clip_action(slide(4)).play();
    mixer.clip_action(slide(4));
    assert_eq!(mixer.actions().len(), 1);

    let action = mixer.clip_action(slide(4));
    action.stop();
    assert!(!action.is_playing());
    assert_eq!(action.time(), 0.0);
}

fn renamed(mut clip: AnimationClip, name: &str) -> AnimationClip {
    clip.name = name.to_string();
    clip
}

#[test]
fn clips_sharing_a_name_play_side_by_side() {
    let mut first = SceneNode::new("first");
    first.source_index = Some(1);
    let mut second = SceneNode::new("second");
    second.source_index = Some(2);
    let mut mixer = AnimationMixer::new(SceneNode::group("root", vec![first, second]).into_ref());

    mixer.clip_action(renamed(slide(1), "Take 001")).play();
    mixer.clip_action(renamed(slide(2), "Take 001")).play();
    assert_eq!(mixer.actions().len(), 2);

    mixer.update(Duration::from_millis(500));
    let root = mixer.root().lock();
    assert_eq!(root.find_by_source(1).unwrap().local.position, Vector3::new(0.5, 0.0, 0.0));
    assert_eq!(root.find_by_source(2).unwrap().local.position, Vector3::new(0.5, 0.0, 0.0));
}

#[test]
fn unknown_targets_are_ignored() {
    let mut mixer = AnimationMixer::new(model().into_ref());
    mixer.clip_action(slide(99)).play();
    mixer.update(Duration::from_millis(500));
    assert_eq!(child_position(&mixer), Vector3::new(0.0, 0.0, 0.0));
}

#[tokio::test]
async fn scheduler_drives_and_forgets_mixers() {
    let loader = ModelLoader::new(MemorySource::new());
    let first = loader.configure(LoadRequest::new("a", "a.glb")).unwrap();
    let second = loader.configure(LoadRequest::new("b", "b.glb")).unwrap();

    let mut scheduler = AnimationScheduler::new();
    let mut mixer = AnimationMixer::new(model().into_ref());
    mixer.clip_action(slide(4)).play();
    assert!(scheduler.insert(first.id(), mixer).is_none());
    scheduler.insert(second.id(), AnimationMixer::new(model().into_ref()));
    assert_eq!(scheduler.len(), 2);

    scheduler.update(Duration::from_millis(250));
    let moved = child_position(scheduler.get(first.id()).unwrap());
    assert_eq!(moved, Vector3::new(0.25, 0.0, 0.0));

    let removed = scheduler.remove(first.id()).unwrap();
    assert!(!scheduler.contains(first.id()));
    assert!(scheduler.remove(first.id()).is_none());

    // a removed mixer no longer advances
    scheduler.update(Duration::from_millis(250));
    assert_eq!(child_position(&removed), Vector3::new(0.25, 0.0, 0.0));
    assert_eq!(scheduler.ids().collect::<Vec<_>>(), vec![second.id()]);
}

#[test]
fn replacing_a_mixer_returns_the_old_one() {
    let loader = ModelLoader::new(MemorySource::new());
    let handle = loader.configure(LoadRequest::new("a", "a.glb")).unwrap();
    let mut scheduler = AnimationScheduler::new();
    scheduler.insert(handle.id(), AnimationMixer::new(model().into_ref()));
    let old = scheduler.insert(handle.id(), AnimationMixer::new(model().into_ref()));
    assert!(old.is_some());
    assert_eq!(scheduler.len(), 1);
}

#[test]
fn frame_clock_measures_between_ticks() {
    let mut clock = model_ngin::FrameClock::new();
    std::thread::sleep(Duration::from_millis(5));
    let first = clock.tick();
    assert!(first >= Duration::from_millis(5));
    let second = clock.tick();
    assert!(second < first + Duration::from_millis(100));
    assert!(clock.elapsed() >= first);
}
