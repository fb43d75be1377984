//! Built-in preset images.
//!
//! Presets are listed after custom uploads and can never be deleted.

use crate::image::{ImageId, StoredImage};
use crate::model::{ItemType, SubjectCategory};

const PRESET_PEOPLE: &[&str] = &[
    "https://images.unsplash.com/photo-1534528741775-53994a69daeb?auto=format&fit=crop&q=80&w=1000",
    "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?auto=format&fit=crop&q=80&w=1000",
    "https://images.unsplash.com/photo-1500648767791-00dcc994a43e?auto=format&fit=crop&q=80&w=1000",
    "https://images.unsplash.com/photo-1438761681033-6461ffad8d80?auto=format&fit=crop&q=80&w=1000",
    "https://images.unsplash.com/photo-1506794778202-cad84cf45f1d?auto=format&fit=crop&q=80&w=1000",
    "https://images.unsplash.com/photo-1544005313-94ddf0286df2?auto=format&fit=crop&q=80&w=1000",
];

const PRESET_ANIMALS: &[&str] = &[
    "https://images.unsplash.com/photo-1543466835-00a7907e9de1?auto=format&fit=crop&q=80&w=1000",
    "https://images.unsplash.com/photo-1514888286974-6c03e2ca1dba?auto=format&fit=crop&q=80&w=1000",
    "https://images.unsplash.com/photo-1533738363-b7f9aef128ce?auto=format&fit=crop&q=80&w=1000",
];

const PRESET_OBJECTS: &[&str] = &[
    "https://images.unsplash.com/photo-1505740420928-5e560c06d30e?auto=format&fit=crop&q=80&w=1000",
    "https://images.unsplash.com/photo-1584917865442-de89df76afd3?auto=format&fit=crop&q=80&w=1000",
    "https://images.unsplash.com/photo-1516961642265-531546e84af2?auto=format&fit=crop&q=80&w=1000",
];

const PRESET_CLOTHING: &[&str] = &[
    // jacket
    "https://images.unsplash.com/photo-1551028919-ac66e6a39d44?auto=format&fit=crop&q=80&w=600",
    // shirts
    "https://images.unsplash.com/photo-1596755094514-f87e34085b2c?auto=format&fit=crop&q=80&w=600",
    "https://images.unsplash.com/photo-1582552966597-90f08923303b?auto=format&fit=crop&q=80&w=600",
    "https://images.unsplash.com/photo-1602810318383-e386cc2a3ccf?auto=format&fit=crop&q=80&w=600",
    "https://images.unsplash.com/photo-1578932750294-f5075e85f44a?auto=format&fit=crop&q=80&w=600",
    // dress
    "https://images.unsplash.com/photo-1560243563-062bfc001d68?auto=format&fit=crop&q=80&w=600",
];

const PRESET_ACCESSORIES: &[&str] = &[
    // hats
    "https://images.unsplash.com/photo-1533055640609-24b498dfd74c?auto=format&fit=crop&q=80&w=600",
    "https://images.unsplash.com/photo-1514327605140-1802e96251e9?auto=format&fit=crop&q=80&w=600",
    "https://images.unsplash.com/photo-1582748153413-4043b2361623?auto=format&fit=crop&q=80&w=600",
    // glasses
    "https://images.unsplash.com/photo-1572244164289-991a7267da27?auto=format&fit=crop&q=80&w=600",
    "https://images.unsplash.com/photo-1511499767150-a48a237f0083?auto=format&fit=crop&q=80&w=600",
    // jewelry
    "https://images.unsplash.com/photo-1599643478518-17488fbbcd75?auto=format&fit=crop&q=80&w=600",
    "https://images.unsplash.com/photo-1605100804763-247f67b3557e?auto=format&fit=crop&q=80&w=600",
    // bags
    "https://images.unsplash.com/photo-1553062407-98eeb64c6a62?auto=format&fit=crop&q=80&w=600",
    "https://images.unsplash.com/photo-1584917865442-de89df76afd3?auto=format&fit=crop&q=80&w=600",
    "https://images.unsplash.com/photo-1565026057447-bc04a9491211?auto=format&fit=crop&q=80&w=600",
    // belt, wallet, scarf
    "https://images.unsplash.com/photo-1624222247344-550fb60583dc?auto=format&fit=crop&q=80&w=600",
    "https://images.unsplash.com/photo-1627123424574-1837526ae418?auto=format&fit=crop&q=80&w=600",
    "https://images.unsplash.com/photo-1520908695049-a6b1f1d5e0a6?auto=format&fit=crop&q=80&w=600",
];

fn build(collection: &str, urls: &[&str]) -> Vec<StoredImage> {
    urls.iter()
        .enumerate()
        .map(|(index, url)| StoredImage::with_id(ImageId::preset(collection, index), *url))
        .collect()
}

/// Preset subjects for a category.
pub fn preset_subjects(category: SubjectCategory) -> Vec<StoredImage> {
    match category {
        SubjectCategory::Person => build("person", PRESET_PEOPLE),
        SubjectCategory::Animal => build("animal", PRESET_ANIMALS),
        SubjectCategory::Object => build("object", PRESET_OBJECTS),
    }
}

/// Preset clothing or accessories.
pub fn preset_items(item_type: ItemType) -> Vec<StoredImage> {
    match item_type {
        ItemType::Clothing => build("clothing", PRESET_CLOTHING),
        ItemType::Accessory => build("accessory", PRESET_ACCESSORIES),
    }
}
