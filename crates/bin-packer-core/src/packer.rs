//! The layered packer (spec §4.F): the top-level greedy loop that drives a
//! bin to completion, one reference bin at a time, opening a new layer
//! whenever the current one runs out of fitting snappoints.

use std::collections::HashSet;

use tracing::{debug, instrument, trace};

use crate::bin::{Bin, ReferenceBin};
use crate::config::PackerConfiguration;
use crate::grouping::prepare_items;
use crate::item::Item;
use crate::model::{Position, SnapDirection, Snappoint};
use crate::selector::{can_pack_on_snappoint, is_new_layer, mirror_snappoint, select_item};

/// The outcome of packing one order against one list of reference bins:
/// every bin that ended up non-empty, plus whatever never found a home.
#[derive(Debug, Clone, PartialEq)]
pub struct PackingVariant {
    pub bins: Vec<Bin>,
    pub unpacked_items: Vec<Item>,
}

/// Packs `items` into a sequence of bins built from `reference_bins`, in
/// order, under `config`. Reference bins are consumed one at a time; any
/// items left over after the last one are returned as residue (spec §4.F).
#[instrument(skip_all, fields(reference_bins = reference_bins.len(), items = items.len()))]
pub fn pack_order(
    reference_bins: &[ReferenceBin],
    items: Vec<Item>,
    config: &PackerConfiguration,
) -> PackingVariant {
    let mut bins = Vec::new();
    let mut remaining = items;

    for reference in reference_bins {
        if remaining.is_empty() {
            break;
        }
        let prepared = prepare_items(remaining, reference, config);
        let mut bin = Bin::new(reference.clone());
        let leftover = pack_one_bin(&mut bin, prepared, config);
        if !bin.packed_items.is_empty() {
            bins.push(bin);
        }
        remaining = leftover;
    }

    debug!(bins = bins.len(), unpacked = remaining.len(), "packing complete");
    PackingVariant {
        bins,
        unpacked_items: remaining,
    }
}

/// Fills a single bin with as many of `items` as fit, returning whatever
/// does not (spec §4.F pseudocode).
fn pack_one_bin(bin: &mut Bin, items: Vec<Item>, config: &PackerConfiguration) -> Vec<Item> {
    let mut items_to_pack = items;
    let mut ignored: HashSet<(i64, i64, bool)> = HashSet::new();
    let mut layer_z_max = bin.height();
    let mut direction = SnapDirection::Right;

    loop {
        if items_to_pack.is_empty() {
            break;
        }
        let is_new = layer_z_max == bin.height();

        let mut snappoints: Vec<Snappoint> = bin
            .get_snappoints(None)
            .into_iter()
            .filter(|p| !ignored.contains(&snap_key(p)) && p.z < layer_z_max)
            .collect();

        if snappoints.len() < 2 {
            if is_new {
                break;
            }
            if config.remove_gaps {
                bin.remove_gaps();
            }
            layer_z_max = bin.height();
            ignored.clear();
            direction = SnapDirection::Right;
            continue;
        }

        if is_new {
            snappoints.sort_by_key(|p| p.x);
            if snappoints[0].x != 0 {
                break;
            }
        } else {
            snappoints.sort_by_key(|p| (p.z, p.x));
        }

        let left = snappoints.iter().find(|p| p.direction == SnapDirection::Right).copied();
        let right = snappoints.iter().find(|p| p.direction == SnapDirection::Left).copied();
        let primary = if direction == SnapDirection::Right { left } else { right };
        let Some(anchor) = primary else {
            // No snappoint of the preferred direction remains this round;
            // nothing to anchor on, so stop making progress on this layer.
            if is_new {
                break;
            }
            if config.remove_gaps {
                bin.remove_gaps();
            }
            layer_z_max = bin.height();
            ignored.clear();
            direction = SnapDirection::Right;
            continue;
        };

        let allowed_max_z = if config.allow_item_exceeds_layer {
            bin.height()
        } else {
            layer_z_max
        };

        let strategy = if is_new_layer(bin, anchor.z) {
            config.new_layer_select_strategy
        } else {
            config.default_select_strategy
        };

        let candidates = reserve_for_mirror(&items_to_pack, bin, anchor, config);
        let picked = select_item(&candidates, bin, anchor, allowed_max_z, strategy, config.mirror_walls)
            .or_else(|| {
                let other = if direction == SnapDirection::Right { right } else { left };
                other.and_then(|alt| {
                    select_item(&candidates, bin, alt, allowed_max_z, strategy, config.mirror_walls)
                })
            });

        let Some((candidate_idx, position)) = picked else {
            ignored.insert(snap_key(&anchor));
            if let Some(r) = right {
                ignored.insert(snap_key(&r));
            }
            if let Some(l) = left {
                ignored.insert(snap_key(&l));
            }
            continue;
        };

        let real_idx = candidate_index(&items_to_pack, &candidates, candidate_idx);
        let item = items_to_pack[real_idx].clone();
        let volume = item.volume();
        trace!(item = %item.identifier(), ?position, "placing item");
        if bin.pack_item(item, position).is_err() {
            continue;
        }
        items_to_pack.remove(real_idx);

        layer_z_max = bin.max_z();
        ignored.clear();

        if config.mirror_walls && anchor.x == 0 {
            try_mirror(bin, &mut items_to_pack, anchor, allowed_max_z);
        }

        if bin.volume() > 0 && (volume as f64) / (bin.volume() as f64) >= config.direction_change_min_volume {
            direction = direction.toggle();
        }
    }

    items_to_pack
}

fn snap_key(p: &Snappoint) -> (i64, i64, bool) {
    (p.x, p.z, matches!(p.direction, SnapDirection::Left))
}

/// When `mirror_walls` is active and only two items with identical
/// dimensions remain, checks whether doubling the candidate's width would
/// still fit in the open layer; if not, both are excluded from this pick so
/// they survive for the next layer (spec §4.F step 4).
fn reserve_for_mirror(
    items: &[Item],
    bin: &Bin,
    anchor: Snappoint,
    config: &PackerConfiguration,
) -> Vec<Item> {
    if !config.mirror_walls || anchor.x != 0 || items.len() != 2 {
        return items.to_vec();
    }
    let (d0, d1) = (items[0].dimensions(), items[1].dimensions());
    if d0 != d1 {
        return items.to_vec();
    }
    let doubled_width = d0.0 * 2;
    if doubled_width > bin.width() {
        return Vec::new();
    }
    items.to_vec()
}

/// Maps an index into a (possibly reserved) candidate list back into the
/// original `items_to_pack` list by matching on the picked item's identity.
fn candidate_index(items_to_pack: &[Item], candidates: &[Item], candidate_idx: usize) -> usize {
    let picked = &candidates[candidate_idx];
    items_to_pack
        .iter()
        .position(|i| i == picked)
        .unwrap_or(candidate_idx)
}

/// Attempts to place a twin of the just-placed item at the mirrored wall
/// (spec §4.F: `mirror_walls`).
fn try_mirror(bin: &mut Bin, items_to_pack: &mut Vec<Item>, anchor: Snappoint, max_z: i64) {
    let last = match bin.packed_items.last() {
        Some(i) => i.clone(),
        None => return,
    };
    let dims = last.dimensions();
    let mirror = mirror_snappoint(bin, anchor);
    let Some(twin_idx) = items_to_pack.iter().position(|i| i.dimensions() == dims) else {
        return;
    };
    let twin = &items_to_pack[twin_idx];
    if can_pack_on_snappoint(bin, twin, mirror, max_z).is_some() {
        let twin = items_to_pack.remove(twin_idx);
        let position = mirror.anchor_position(twin.dimensions().0);
        let _ = bin.pack_item(twin, position);
    }
}
