//! Item grouping (spec §4.C): merges compatible leaf items into composite
//! [`Item::Group`]s before the packer ever sees them. Two independent
//! transformations, lengthwise then horizontal, both greedy and
//! order-preserving over the remaining pool.

use crate::bin::ReferenceBin;
use crate::config::{ItemGroupingMode, PackerConfiguration};
use crate::item::Item;

/// Prepares the working item list for a packing run: applies lengthwise
/// grouping (if configured, with `safety_distance_lengthwise` as the gap
/// between children), then horizontal grouping (if configured), then widens
/// narrow single items by `safety_distance_smaller_articles`, then stretches
/// every item's width by `padding_x` so inter-column spacing is enforced
/// implicitly by the bounding box.
pub fn prepare_items(items: Vec<Item>, bin: &ReferenceBin, config: &PackerConfiguration) -> Vec<Item> {
    let mut items = items;
    if config.item_grouping_mode == Some(ItemGroupingMode::Lengthwise) {
        let gap = bin.safety_distance_lengthwise.unwrap_or(0);
        items = group_lengthwise(items, bin.grouping_max_length(), gap);
    }
    if config.group_narrow_items_w > 0 {
        items = group_horizontal(items, config.group_narrow_items_w);
    }
    if let (Some(distance), Some(threshold)) = (
        bin.safety_distance_smaller_articles,
        bin.min_article_width_no_safety_distance,
    ) {
        items = items
            .into_iter()
            .map(|item| apply_safety_distance(item, threshold, distance))
            .collect();
    }
    if config.padding_x > 0 {
        items = items
            .into_iter()
            .map(|item| pad_width(item, config.padding_x))
            .collect();
    }
    items
}

fn pad_width(item: Item, padding_x: i64) -> Item {
    match item {
        Item::Single(mut s) => {
            s.width += padding_x;
            Item::Single(s)
        }
        // Padding a group would desynchronize children offsets from the
        // parent's own bounding box; groups already occupy their full
        // footprint and are not re-padded.
        group => group,
    }
}

/// Widens a single item narrower than `threshold` by `distance`, the extra
/// clearance `safety_distance_smaller_articles` reserves for articles small
/// enough that they'd otherwise sit flush against a taller neighbor.
fn apply_safety_distance(item: Item, threshold: i64, distance: i64) -> Item {
    match item {
        Item::Single(mut s) if s.width < threshold => {
            s.width += distance;
            Item::Single(s)
        }
        other => other,
    }
}

/// Repeatedly takes the first remaining item, collects every other item with
/// identical (w,h) that still fits end-to-end along y within `max_length`
/// (leaving `gap` of clearance between consecutive children), and replaces
/// the run with one LENGTHWISE group when at least two items were gathered
/// (spec §4.C.1).
fn group_lengthwise(items: Vec<Item>, max_length: i64, gap: i64) -> Vec<Item> {
    let mut eligible: Vec<Item> = Vec::new();
    let mut too_long: Vec<Item> = Vec::new();
    for item in items {
        if item.dimensions().1 < max_length {
            eligible.push(item);
        } else {
            too_long.push(item);
        }
    }

    let mut out = Vec::new();
    while !eligible.is_empty() {
        let head = eligible.remove(0);
        let (w0, _, h0) = head.dimensions();
        let mut run = vec![head];
        let mut cumulative = run[0].dimensions().1;

        let mut i = 0;
        while i < eligible.len() {
            let (w, l, h) = eligible[i].dimensions();
            if w == w0 && h == h0 && cumulative + gap + l <= max_length {
                cumulative += gap + l;
                run.push(eligible.remove(i));
            } else {
                i += 1;
            }
        }

        if run.len() >= 2 {
            let mut offsets = Vec::with_capacity(run.len());
            let mut y = 0;
            for (idx, item) in run.iter().enumerate() {
                if idx > 0 {
                    y += gap;
                }
                offsets.push((0, y, 0));
                y += item.dimensions().1;
            }
            match Item::new_group(ItemGroupingMode::Lengthwise, run, offsets) {
                Ok(group) => out.push(group),
                Err(_) => unreachable!("offsets constructed sequentially are always valid"),
            }
        } else {
            out.extend(run);
        }
    }
    out.extend(too_long);
    out
}

/// Repeatedly takes the first remaining narrow item, pairs it with one other
/// item sharing (l,h), and replaces the pair with a HORIZONTAL group (spec
/// §4.C.2). Runs after lengthwise grouping, so it also sees any lengthwise
/// groups that happen to be narrow enough — those are left untouched since
/// `width <= group_narrow_items_w` rarely holds for a group's aggregate
/// width in practice.
fn group_horizontal(items: Vec<Item>, max_width: i64) -> Vec<Item> {
    let mut narrow: Vec<Item> = Vec::new();
    let mut rest: Vec<Item> = Vec::new();
    for item in items {
        if item.dimensions().0 <= max_width {
            narrow.push(item);
        } else {
            rest.push(item);
        }
    }

    let mut out = Vec::new();
    while !narrow.is_empty() {
        let head = narrow.remove(0);
        let (_, l0, h0) = head.dimensions();
        let partner_idx = narrow
            .iter()
            .position(|c| {
                let (_, l, h) = c.dimensions();
                l == l0 && h == h0
            });
        match partner_idx {
            Some(idx) => {
                let partner = narrow.remove(idx);
                let head_w = head.dimensions().0;
                let offsets = vec![(0, 0, 0), (head_w, 0, 0)];
                match Item::new_group(ItemGroupingMode::Horizontal, vec![head, partner], offsets) {
                    Ok(group) => out.push(group),
                    Err(_) => unreachable!("offsets constructed sequentially are always valid"),
                }
            }
            None => out.push(head),
        }
    }
    out.extend(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: &str, w: i64, l: i64, h: i64) -> Item {
        Item::single(id, w, l, h, 1.0)
    }

    #[test]
    fn lengthwise_groups_identical_items_end_to_end() {
        let items = vec![leaf("a", 2, 3, 4), leaf("b", 2, 3, 4), leaf("c", 2, 3, 4)];
        let out = group_lengthwise(items, 10, 0);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].dimensions(), (2, 9, 4));
    }

    #[test]
    fn lengthwise_stops_at_max_length() {
        let items = vec![leaf("a", 2, 6, 4), leaf("b", 2, 6, 4)];
        let out = group_lengthwise(items, 10, 0);
        // 6+6=12 > 10, so the second item can't join the run.
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn single_item_run_is_not_wrapped_in_a_group() {
        let items = vec![leaf("a", 2, 3, 4)];
        let out = group_lengthwise(items, 10, 0);
        assert!(matches!(out[0], Item::Single(_)));
    }

    #[test]
    fn lengthwise_gap_widens_the_group_and_can_exclude_a_trailing_item() {
        let items = vec![leaf("a", 2, 3, 4), leaf("b", 2, 3, 4)];
        let out = group_lengthwise(items, 10, 2);
        // 3 + gap(2) + 3 = 8 <= 10, still fits as one group, but now 8 long.
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].dimensions(), (2, 8, 4));

        let items = vec![leaf("a", 2, 4, 4), leaf("b", 2, 4, 4)];
        let out = group_lengthwise(items, 10, 3);
        // 4 + gap(3) + 4 = 11 > 10, so the gap pushes the second item out.
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn safety_distance_widens_only_items_below_the_threshold() {
        let narrow = apply_safety_distance(leaf("a", 2, 3, 4), 3, 1);
        assert_eq!(narrow.dimensions().0, 3);
        let wide = apply_safety_distance(leaf("b", 5, 3, 4), 3, 1);
        assert_eq!(wide.dimensions().0, 5);
    }

    #[test]
    fn horizontal_pairs_narrow_items_with_matching_length_and_height() {
        let items = vec![leaf("a", 1, 5, 5), leaf("b", 1, 5, 5), leaf("c", 8, 5, 5)];
        let out = group_horizontal(items, 2);
        assert_eq!(out.len(), 2);
        let group = out.iter().find(|i| matches!(i, Item::Group(_))).unwrap();
        assert_eq!(group.dimensions(), (2, 5, 5));
    }

    #[test]
    fn padding_widens_single_items_only() {
        let items = vec![leaf("a", 2, 3, 4)];
        let out: Vec<Item> = items.into_iter().map(|i| pad_width(i, 1)).collect();
        assert_eq!(out[0].dimensions().0, 3);
    }
}
