//! Item selection (spec §4.E): given a snappoint and a candidate pool, picks
//! the next item to place. The tie-break strategies are pure functions over
//! `(w,l,h)`/volume, matched on the strategy tag — no virtual dispatch.

use crate::bin::Bin;
use crate::config::ItemSelectStrategy;
use crate::item::Item;
use crate::model::{Position, SnapDirection, Snappoint};

/// Translates `snappoint` into the corner position of `item`, and returns it
/// only if the bin would accept the placement and it does not exceed
/// `max_z` (spec §4.E step 1).
pub fn can_pack_on_snappoint(
    bin: &Bin,
    item: &Item,
    snappoint: Snappoint,
    max_z: i64,
) -> Option<Position> {
    let position = snappoint.anchor_position(item.dimensions().0);
    let (_, _, h) = item.dimensions();
    if position.z + h > max_z {
        return None;
    }
    bin.can_pack(item, position).ok()?;
    Some(position)
}

/// Mirrors `snappoint` (assumed at x=0) to the opposite wall: a LEFT-facing
/// anchor at `x = bin.width` and the same z (spec §4.E step 2, §4.F).
pub fn mirror_snappoint(bin: &Bin, snappoint: Snappoint) -> Snappoint {
    Snappoint::new(bin.width(), snappoint.y, snappoint.z, SnapDirection::Left)
}

/// Whether any heightmap column is strictly higher than `z` — the signal
/// used to pick between `default_select_strategy` and
/// `new_layer_select_strategy` (spec §4.E step 3, §4.F `is_new_layer`).
pub fn is_new_layer(bin: &Bin, z: i64) -> bool {
    bin.max_z() <= z
}

/// Picks the best candidate index (into `candidates`) for `snappoint`, or
/// `None` if nothing fits. When `mirror_walls` is set and `snappoint.x == 0`,
/// only candidates whose mirrored placement at the opposite wall also
/// validates are considered (spec §4.E step 2).
pub fn select_item(
    candidates: &[Item],
    bin: &Bin,
    snappoint: Snappoint,
    max_z: i64,
    strategy: ItemSelectStrategy,
    mirror_walls: bool,
) -> Option<(usize, Position)> {
    let mirror = mirror_snappoint(bin, snappoint);
    let mut fitting: Vec<(usize, Position)> = Vec::new();
    for (idx, item) in candidates.iter().enumerate() {
        let Some(position) = can_pack_on_snappoint(bin, item, snappoint, max_z) else {
            continue;
        };
        if mirror_walls && snappoint.x == 0 {
            if can_pack_on_snappoint(bin, item, mirror, max_z).is_none() {
                continue;
            }
        }
        fitting.push((idx, position));
    }
    if fitting.is_empty() {
        return None;
    }

    let best = pick_by_strategy(&fitting, candidates, strategy);
    best
}

fn pick_by_strategy(
    fitting: &[(usize, Position)],
    candidates: &[Item],
    strategy: ItemSelectStrategy,
) -> Option<(usize, Position)> {
    use ItemSelectStrategy::*;

    match strategy {
        LargestVolume => best_by_key(fitting, |i| (candidates[*i].volume(),)),
        LargestHWL => best_by_key(fitting, |i| {
            let (w, l, h) = candidates[*i].dimensions();
            (h, w, l)
        }),
        LargestWHL => best_by_key(fitting, |i| {
            let (w, l, h) = candidates[*i].dimensions();
            (w, h, l)
        }),
        LargestLHW => best_by_key(fitting, |i| {
            let (w, l, h) = candidates[*i].dimensions();
            (l, h, w)
        }),
        LargestLWH => best_by_key(fitting, |i| {
            let (w, l, h) = candidates[*i].dimensions();
            (l, w, h)
        }),
        LargestWToFill => best_fill_class(fitting, candidates, |w, _h, count| count * w),
        LargestWHToFill => best_fill_class(fitting, candidates, |w, h, count| count * w * h),
    }
}

/// Scans `fitting` in order and keeps the first element with the strictly
/// greatest key — first-wins tie-breaking keeps placement order
/// deterministic for equal keys.
fn best_by_key<K: PartialOrd + Copy>(
    fitting: &[(usize, Position)],
    key_of: impl Fn(&usize) -> K,
) -> Option<(usize, Position)> {
    let mut best: Option<(K, (usize, Position))> = None;
    for &(idx, pos) in fitting {
        let key = key_of(&idx);
        match &best {
            Some((best_key, _)) if *best_key >= key => {}
            _ => best = Some((key, (idx, pos))),
        }
    }
    best.map(|(_, v)| v)
}

/// `LARGEST_W_TO_FILL` / `LARGEST_W_H_TO_FILL`: groups fitting candidates by
/// (w,l,h), scores each class with `score`, and returns the first candidate
/// of the highest-scoring class (spec §4.E step 5).
fn best_fill_class(
    fitting: &[(usize, Position)],
    candidates: &[Item],
    score: impl Fn(i64, i64, i64) -> i64,
) -> Option<(usize, Position)> {
    let mut classes: Vec<((i64, i64, i64), i64, (usize, Position))> = Vec::new();
    for &(idx, pos) in fitting {
        let dims = candidates[idx].dimensions();
        if let Some(entry) = classes.iter_mut().find(|(d, _, _)| *d == dims) {
            entry.1 += 1;
        } else {
            classes.push((dims, 1, (idx, pos)));
        }
    }
    let mut best: Option<(i64, (usize, Position))> = None;
    for (dims, count, first) in classes {
        let s = score(dims.0, dims.2, count);
        match &best {
            Some((best_score, _)) if *best_score >= s => {}
            _ => best = Some((s, first)),
        }
    }
    best.map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bin::ReferenceBin;
    use crate::model::SnapDirection;

    fn bin() -> Bin {
        Bin::new(ReferenceBin {
            width: 10,
            length: 10,
            height: 10,
            max_length: None,
            max_weight: None,
            stability_factor: 1.0,
            overhang_y_stability_factor: None,
            safety_distance_smaller_articles: None,
            min_article_width_no_safety_distance: None,
            safety_distance_lengthwise: None,
        })
    }

    #[test]
    fn scenario_s2_picks_largest_volume_within_bounds() {
        let mut b = bin();
        b.pack_item(Item::single("a", 3, 1, 10, 0.0), Position::new(0, 0, 0))
            .unwrap();
        b.pack_item(Item::single("b", 4, 1, 8, 0.0), Position::new(6, 0, 0))
            .unwrap();
        let candidates = vec![Item::single("c", 3, 1, 10, 0.0), Item::single("d", 5, 1, 10, 0.0)];
        let snap = Snappoint::new(3, 0, 0, SnapDirection::Right);
        let picked = select_item(&candidates, &b, snap, 10, ItemSelectStrategy::LargestVolume, false);
        let (idx, pos) = picked.unwrap();
        assert_eq!(idx, 0);
        assert_eq!(pos, Position::new(3, 0, 0));
    }

    #[test]
    fn rejects_item_exceeding_max_z() {
        let b = bin();
        let candidates = vec![Item::single("tall", 2, 2, 9, 0.0)];
        let snap = Snappoint::new(0, 0, 0, SnapDirection::Right);
        let picked = select_item(&candidates, &b, snap, 5, ItemSelectStrategy::LargestVolume, false);
        assert!(picked.is_none());
    }

    #[test]
    fn largest_w_to_fill_prefers_bigger_class_total() {
        let candidates = vec![
            Item::single("a", 2, 2, 2, 0.0),
            Item::single("b", 2, 2, 2, 0.0),
            Item::single("c", 5, 2, 2, 0.0),
        ];
        let b = bin();
        let snap = Snappoint::new(0, 0, 0, SnapDirection::Right);
        let picked = select_item(
            &candidates,
            &b,
            snap,
            10,
            ItemSelectStrategy::LargestWToFill,
            false,
        );
        // class (2,2,2) has count=2 -> score 4; class (5,2,2) count=1 -> score 5.
        let (idx, _) = picked.unwrap();
        assert_eq!(idx, 2);
    }
}
