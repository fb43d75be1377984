//! Instruction text sent to the image-generation service.

use crate::model::{ItemType, SubjectCategory};
use crate::variation::Variation;

/// Output aspect ratio requested from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectRatio {
    Square,
    Portrait,
    Wide,
}

impl AspectRatio {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait => "3:4",
            Self::Wide => "16:9",
        }
    }
}

const BASE_INSTRUCTION: &str = "Generate a photorealistic image. The first image is the Subject. \
The second image is the Item to be worn/applied.";

/// Prompt for generating an isolated item image from a description.
pub fn item_prompt(description: &str) -> String {
    format!(
        "Generate a high-quality, isolated flat-lay image of a clothing item or accessory. \
         Description: {}. The background should be simple or white.",
        description.trim()
    )
}

/// Prompt for compositing the item onto the subject.
pub fn try_on_prompt(category: SubjectCategory, item_type: ItemType, variation: &Variation) -> String {
    let (subject, action, details) = match (category, item_type) {
        (SubjectCategory::Animal, _) => (
            "An animal (keep breed/fur exactly).",
            "The animal is wearing the item.",
            "Cinematic lighting, realistic fur texture.",
        ),
        (SubjectCategory::Object, _) => (
            "An object.",
            "The object is wrapped in or styled with the item/material.",
            "Product photography, studio lighting, 4k.",
        ),
        (SubjectCategory::Person, ItemType::Accessory) => (
            "A person (maintain facial features/identity).",
            "The person is wearing the accessory (e.g., glasses on eyes, hat on head, \
             necklace on neck).",
            "Fashion photography, high detail, sharp focus.",
        ),
        (SubjectCategory::Person, ItemType::Clothing) => (
            "A person (maintain facial features/identity).",
            "The person is wearing the clothing outfit. Fit it naturally to the body.",
            "Fashion photography, professional lighting, realistic fabric texture.",
        ),
    };

    format!(
        "{BASE_INSTRUCTION}\nSubject: {subject}\nAction: {action}\nPose: {pose}.\n\
         Camera: {angle}.\nDetails: {details}",
        pose = variation.pose,
        angle = variation.angle,
    )
}

/// Prompt for a three-view turnaround sheet.
pub fn turnaround_prompt(category: SubjectCategory) -> String {
    format!(
        "Generate a character sheet with 3 distinct full-body views of the same {category} \
         wearing the provided clothing.\n\
         Arranged horizontally in this order:\n\
         1. Front View\n\
         2. Side View (Profile)\n\
         3. Back View\n\
         Ensure consistent lighting, white background, and exact same outfit across all three views.\n\
         High resolution, photorealistic fashion photography style."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variation::pick_variation;

    #[test]
    fn test_try_on_prompt_varies_by_category() {
        let variation = pick_variation(7, SubjectCategory::Animal, ItemType::Clothing);
        let prompt = try_on_prompt(SubjectCategory::Animal, ItemType::Clothing, &variation);
        assert!(prompt.contains("animal"));
        assert!(prompt.contains(variation.pose));
        assert!(prompt.contains(variation.angle));
    }

    #[test]
    fn test_person_accessory_prompt() {
        let variation = pick_variation(1, SubjectCategory::Person, ItemType::Accessory);
        let prompt = try_on_prompt(SubjectCategory::Person, ItemType::Accessory, &variation);
        assert!(prompt.contains("wearing the accessory"));
        assert!(!prompt.contains("clothing outfit"));
    }

    #[test]
    fn test_turnaround_prompt_names_views() {
        let prompt = turnaround_prompt(SubjectCategory::Object);
        assert!(prompt.contains("same object"));
        assert!(prompt.contains("Front View"));
        assert!(prompt.contains("Back View"));
    }

    #[test]
    fn test_item_prompt_trims_description() {
        assert!(item_prompt("  red wool scarf ").contains("Description: red wool scarf."));
    }
}
