//! Packing evaluator (spec §4.G): scores a completed [`PackingVariant`] on
//! four weighted metrics and ranks a batch of variants produced by different
//! configurations, de-duplicating ones that happen to be structurally
//! identical.

use tracing::debug;

use crate::bin::Bin;
use crate::config::{PackerConfiguration, PackingEvaluationWeights};
use crate::item::SingleItem;
use crate::packer::PackingVariant;

/// The four named sub-metrics behind a variant's or bin's score, alongside
/// the weighted `total` that ranking actually sorts by (spec §4.G
/// supplement — see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PackingScore {
    pub item_distribution: f64,
    pub item_stacking: f64,
    pub item_grouping: f64,
    pub utilized_space: f64,
    pub total: f64,
}

/// One de-duplicated variant plus its score and every configuration that
/// produced it.
#[derive(Debug, Clone)]
pub struct EvaluatedVariant {
    pub variant: PackingVariant,
    pub score: PackingScore,
    pub configs: Vec<PackerConfiguration>,
}

/// Scores every `(variant, config)` pair, merging variants that are
/// structurally equal (same bins, same unpacked residue) into one entry
/// carrying all of the configs that produced it. Sorted by descending total.
pub fn evaluate(
    variants: Vec<(PackingVariant, PackerConfiguration)>,
    weights: &PackingEvaluationWeights,
) -> Vec<EvaluatedVariant> {
    let mut out: Vec<EvaluatedVariant> = Vec::new();
    for (variant, config) in variants {
        if let Some(existing) = out.iter_mut().find(|e| e.variant == variant) {
            existing.configs.push(config);
            continue;
        }
        let score = score_variant(&variant, weights);
        out.push(EvaluatedVariant {
            variant,
            score,
            configs: vec![config],
        });
    }
    out.sort_by(|a, b| {
        b.score
            .total
            .partial_cmp(&a.score.total)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    debug!(variants = out.len(), "evaluation complete");
    out
}

/// The mean of each bin's score, metric by metric (spec §4.G).
pub fn score_variant(variant: &PackingVariant, weights: &PackingEvaluationWeights) -> PackingScore {
    if variant.bins.is_empty() {
        return PackingScore::default();
    }
    let scores: Vec<PackingScore> = variant.bins.iter().map(|b| score_bin(b, weights)).collect();
    let n = scores.len() as f64;
    PackingScore {
        item_distribution: scores.iter().map(|s| s.item_distribution).sum::<f64>() / n,
        item_stacking: scores.iter().map(|s| s.item_stacking).sum::<f64>() / n,
        item_grouping: scores.iter().map(|s| s.item_grouping).sum::<f64>() / n,
        utilized_space: scores.iter().map(|s| s.utilized_space).sum::<f64>() / n,
        total: scores.iter().map(|s| s.total).sum::<f64>() / n,
    }
}

/// Weighted sum of the four per-bin metrics, normalized by the sum of
/// weights (spec §4.G). Metrics operate on the bin's fully flattened leaf
/// items: distribution and stacking are physical properties of the concrete
/// boxes, not of the virtual group wrapper (see DESIGN.md).
pub fn score_bin(bin: &Bin, weights: &PackingEvaluationWeights) -> PackingScore {
    let leaves: Vec<SingleItem> = bin.packed_items.iter().flat_map(|i| i.flatten()).collect();
    if leaves.is_empty() {
        return PackingScore::default();
    }

    let total_weight = weights.total();
    if total_weight <= 0.0 {
        return PackingScore::default();
    }

    let distribution = item_distribution(bin, &leaves);
    let stacking = item_stacking(&leaves);
    let grouping = item_grouping(&leaves);
    let utilized = utilized_space(bin);

    let total = (weights.item_distribution * distribution
        + weights.item_stacking * stacking
        + weights.item_grouping * grouping
        + weights.utilized_space * utilized)
        / total_weight;

    PackingScore {
        item_distribution: distribution,
        item_stacking: stacking,
        item_grouping: grouping,
        utilized_space: utilized,
        total,
    }
}

fn item_distribution(bin: &Bin, leaves: &[SingleItem]) -> f64 {
    let used_volume = bin.get_used_volume(false) as f64;
    if used_volume == 0.0 {
        return 0.0;
    }
    let width = bin.width() as f64;
    let half_width = width / 2.0;
    let mean: f64 = leaves
        .iter()
        .map(|item| {
            let p = item.position.expect("bin only holds packed items");
            let x = p.x as f64;
            let w = item.width as f64;
            let wall_distance = x.min(width - x - w);
            let score = 1.0 - wall_distance / half_width;
            score * (item.volume() as f64) / used_volume
        })
        .sum::<f64>()
        / leaves.len() as f64;
    mean
}

/// Whether `below`'s (x,y) footprint overlaps `above`'s by at least half of
/// `above`'s width and half of `above`'s length — the threshold that counts
/// as meaningful support rather than an incidental corner touch.
fn footprint_overlaps_half(above: &SingleItem, below: &SingleItem) -> bool {
    let (ax, ay, aw, al) = (
        above.position.unwrap().x,
        above.position.unwrap().y,
        above.width,
        above.length,
    );
    let (bx, by, bw, bl) = (
        below.position.unwrap().x,
        below.position.unwrap().y,
        below.width,
        below.length,
    );
    let overlap_x = (ax + aw).min(bx + bw) - ax.max(bx);
    let overlap_y = (ay + al).min(by + bl) - ay.max(by);
    overlap_x as f64 >= aw as f64 / 2.0 && overlap_y as f64 >= al as f64 / 2.0
}

fn item_stacking(leaves: &[SingleItem]) -> f64 {
    let mean: f64 = leaves
        .iter()
        .map(|item| {
            let top_z = item.position.unwrap().z;
            let below: Vec<&SingleItem> = leaves
                .iter()
                .filter(|other| {
                    other.position.unwrap().z + other.height <= top_z && footprint_overlaps_half(item, other)
                })
                .collect();
            if below.is_empty() {
                return 1.0;
            }
            let smaller = below.iter().filter(|b| b.volume() < item.volume()).count();
            1.0 - (smaller as f64) / (below.len() as f64)
        })
        .sum::<f64>()
        / leaves.len() as f64;
    mean
}

fn item_grouping(leaves: &[SingleItem]) -> f64 {
    let mut partitions: Vec<Vec<&SingleItem>> = Vec::new();
    for item in leaves {
        let dims = (item.width, item.length, item.height);
        match partitions.iter_mut().find(|p| {
            let d = (p[0].width, p[0].length, p[0].height);
            d == dims
        }) {
            Some(p) => p.push(item),
            None => partitions.push(vec![item]),
        }
    }

    let grouped: Vec<&Vec<&SingleItem>> = partitions.iter().filter(|p| p.len() >= 2).collect();
    if grouped.is_empty() {
        return 1.0;
    }

    let group_means: Vec<f64> = grouped
        .iter()
        .map(|group| {
            let divisor = ((group.len() as i64 - 1).max(1)).min(4) as f64;
            let per_item: f64 = group
                .iter()
                .map(|item| {
                    let p = item.position.unwrap();
                    let neighbors = group
                        .iter()
                        .filter(|other| {
                            if std::ptr::eq(**other, *item) {
                                return false;
                            }
                            let q = other.position.unwrap();
                            let (dx, dy, dz) = (q.x - p.x, q.y - p.y, q.z - p.z);
                            (dx, dy, dz) == (item.width, 0, 0)
                                || (dx, dy, dz) == (0, item.length, 0)
                                || (dx, dy, dz) == (0, 0, item.height)
                                || (dx, dy, dz) == (-item.width, 0, 0)
                                || (dx, dy, dz) == (0, -item.length, 0)
                                || (dx, dy, dz) == (0, 0, -item.height)
                        })
                        .count();
                    (neighbors as f64) / divisor
                })
                .sum::<f64>()
                / group.len() as f64;
            per_item
        })
        .collect();

    group_means.iter().sum::<f64>() / group_means.len() as f64
}

fn utilized_space(bin: &Bin) -> f64 {
    if bin.volume() == 0 {
        return 0.0;
    }
    bin.get_used_volume(false) as f64 / bin.volume() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bin::ReferenceBin;
    use crate::item::Item;
    use crate::model::Position;

    fn bin_with(items: Vec<(Item, Position)>) -> Bin {
        let mut bin = Bin::new(ReferenceBin {
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
        });
        for (item, pos) in items {
            bin.pack_item(item, pos).unwrap();
        }
        bin
    }

    #[test]
    fn empty_bin_scores_zero() {
        let bin = Bin::new(ReferenceBin {
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
        });
        assert_eq!(score_bin(&bin, &PackingEvaluationWeights::default()).total, 0.0);
    }

    #[test]
    fn item_against_wall_scores_higher_distribution_than_centered() {
        let against_wall = bin_with(vec![(Item::single("a", 2, 2, 2, 1.0), Position::new(0, 0, 0))]);
        let centered = bin_with(vec![(Item::single("a", 2, 2, 2, 1.0), Position::new(4, 0, 0))]);
        let weights = PackingEvaluationWeights {
            item_distribution: 1.0,
            item_stacking: 0.0,
            item_grouping: 0.0,
            utilized_space: 0.0,
        };
        assert!(score_bin(&against_wall, &weights).total > score_bin(&centered, &weights).total);
    }

    #[test]
    fn utilized_space_is_volume_ratio() {
        let bin = bin_with(vec![(Item::single("a", 5, 5, 5, 1.0), Position::new(0, 0, 0))]);
        let weights = PackingEvaluationWeights {
            item_distribution: 0.0,
            item_stacking: 0.0,
            item_grouping: 0.0,
            utilized_space: 1.0,
        };
        assert!((score_bin(&bin, &weights).total - 0.125).abs() < 1e-9);
    }

    #[test]
    fn evaluate_merges_structurally_identical_variants() {
        let variant = PackingVariant {
            bins: vec![bin_with(vec![(Item::single("a", 2, 2, 2, 1.0), Position::new(0, 0, 0))])],
            unpacked_items: vec![],
        };
        let config_a = PackerConfiguration::default();
        let mut config_b = PackerConfiguration::default();
        config_b.padding_x = 1;
        let out = evaluate(
            vec![(variant.clone(), config_a), (variant, config_b)],
            &PackingEvaluationWeights::default(),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].configs.len(), 2);
    }
}
