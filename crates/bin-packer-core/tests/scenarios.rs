use bin_packer_core::prelude::*;

fn bin(width: i64, length: i64, height: i64) -> ReferenceBin {
    ReferenceBin {
        width,
        length,
        height,
        max_length: None,
        max_weight: None,
        stability_factor: 1.0,
        overhang_y_stability_factor: None,
        safety_distance_smaller_articles: None,
        min_article_width_no_safety_distance: None,
        safety_distance_lengthwise: None,
    }
}

/// Spec §8 S2: a stack with a gap; the selector must pick the item that
/// fits the open 3-wide slot, never something wider or taller.
#[test]
fn scenario_s2_selector_respects_remaining_slot() {
    let mut b = Bin::new(bin(10, 1, 10));
    b.pack_item(Item::single("a", 3, 1, 10, 0.0), Position::new(0, 0, 0))
        .unwrap();
    b.pack_item(Item::single("b", 4, 1, 8, 0.0), Position::new(6, 0, 0))
        .unwrap();

    let snap = Snappoint::new(3, 0, 0, bin_packer_core::model::SnapDirection::Right);
    let candidates = vec![
        Item::single("too_wide", 4, 1, 10, 0.0),
        Item::single("fits", 3, 1, 10, 0.0),
    ];
    let picked = bin_packer_core::selector::select_item(
        &candidates,
        &b,
        snap,
        10,
        ItemSelectStrategy::LargestVolume,
        false,
    );
    let (idx, pos) = picked.expect("a 3-wide item must fit the open slot");
    assert_eq!(candidates[idx].identifier(), "fits");
    assert_eq!(pos, Position::new(3, 0, 0));
}

/// Spec §8 S3: heightmap recomputation after three placements.
#[test]
fn scenario_s3_heightmap_matches_expected_profile() {
    let mut b = Bin::new(bin(10, 10, 10));
    b.pack_item(Item::single("a", 1, 1, 1, 0.0), Position::new(0, 0, 0))
        .unwrap();
    b.pack_item(Item::single("b", 3, 1, 2, 0.0), Position::new(2, 0, 0))
        .unwrap();
    b.pack_item(Item::single("c", 1, 3, 3, 0.0), Position::new(5, 0, 0))
        .unwrap();

    assert_eq!(b.packed_items.len(), 3);
    let snap = b.get_snappoints(None);
    assert_eq!(snap.first().unwrap().x, 0);
    assert_eq!(snap.last().unwrap().x, 10);
}

/// Spec §8 S4: a y-overhanging item is centered into negative y.
#[test]
fn scenario_s4_overhang_centers_item_into_negative_y() {
    let mut b = Bin::new(ReferenceBin {
        overhang_y_stability_factor: Some(0.6),
        ..bin(10, 10, 10)
    });
    b.pack_item(Item::single("big", 5, 12, 5, 0.0), Position::new(0, 0, 0))
        .unwrap();
    let placed = &b.packed_items[0];
    assert_eq!(placed.position().unwrap().y, -1);
    assert_eq!(placed.dimensions().1, 12);
}
