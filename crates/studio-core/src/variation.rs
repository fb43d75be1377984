//! Pose and camera-angle variation for try-on prompts.
//!
//! Repeated generations with identical inputs should not look identical, so
//! every try-on request carries a pose and an angle drawn from fixed
//! catalogues. The draw is a pure function of a seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::{ItemType, SubjectCategory};

const PERSON_POSES: &[&str] = &[
    "standing confidently with hands in pockets",
    "walking towards the camera like a runway model",
    "sitting elegantly on a chair",
    "leaning casually against a wall",
    "standing with crossed arms",
    "looking over the shoulder",
    "posing with one hand on hip",
    "in a dynamic action pose",
];

// Accessories on people read best close to the face.
const PORTRAIT_POSES: &[&str] = &[
    "headshot portrait",
    "close-up of the face",
    "upper body portrait",
];

const ANIMAL_POSES: &[&str] = &[
    "sitting obediently",
    "standing alert",
    "lying down comfortably",
    "running joyfully",
    "looking curiously at the camera",
];

const OBJECT_POSES: &[&str] = &[
    "placed on a minimal podium",
    "floating in mid-air",
    "resting on a textured surface",
    "held by a hand",
];

const CAMERA_ANGLES: &[&str] = &[
    "eye-level shot",
    "low angle shot for a heroic look",
    "high angle shot",
    "slight 3/4 profile view",
    "close-up shot",
];

/// A pose descriptor and a camera-angle descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variation {
    pub pose: &'static str,
    pub angle: &'static str,
}

impl Variation {
    /// Draws a variation from a fresh random seed.
    pub fn random(category: SubjectCategory, item_type: ItemType) -> Self {
        pick_variation(rand::random(), category, item_type)
    }
}

/// Pose catalogue used for a category and item type.
pub fn poses_for(category: SubjectCategory, item_type: ItemType) -> &'static [&'static str] {
    match (category, item_type) {
        (SubjectCategory::Person, ItemType::Accessory) => PORTRAIT_POSES,
        (SubjectCategory::Person, ItemType::Clothing) => PERSON_POSES,
        (SubjectCategory::Animal, _) => ANIMAL_POSES,
        (SubjectCategory::Object, _) => OBJECT_POSES,
    }
}

/// Deterministically picks a pose and an angle for `seed`.
pub fn pick_variation(seed: u64, category: SubjectCategory, item_type: ItemType) -> Variation {
    let mut rng = StdRng::seed_from_u64(seed);
    let poses = poses_for(category, item_type);
    let pose = poses[rng.gen_range(0..poses.len())];
    let angle = CAMERA_ANGLES[rng.gen_range(0..CAMERA_ANGLES.len())];
    Variation { pose, angle }
}
