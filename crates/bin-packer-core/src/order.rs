//! Order pipeline (spec §6): the JSON-compatible input/output records and
//! the end-to-end entry point gluing validation, grouping, packing and
//! evaluation together. Everything above this module is a pure library;
//! this is the one place that knows about the wire schema.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::bin::ReferenceBin;
use crate::config::PackerConfiguration;
use crate::error::{EngineError, ValidationError};
use crate::item::Item;
use crate::model::Article;
use crate::packer::{self, PackingVariant};

/// The physical envelope and quota for the bins a single order packs into
/// (spec §6 `Order.colli_details`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColliDetails {
    pub width: i64,
    pub length: i64,
    pub height: i64,
    pub max_collis: u32,
    #[serde(default)]
    pub max_length: Option<i64>,
    #[serde(default)]
    pub max_weight: Option<f64>,
    #[serde(default)]
    pub safety_distance_smaller_articles: Option<i64>,
    #[serde(default)]
    pub min_article_width_no_safety_distance: Option<i64>,
    #[serde(default)]
    pub safety_distance_lengthwise: Option<i64>,
}

/// An order to be packed (spec §6 `Order`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub order_id: String,
    pub articles: Vec<Article>,
    #[serde(default)]
    pub supplies: Option<Vec<Article>>,
    #[serde(default)]
    pub colli_details: Option<ColliDetails>,
}

/// Input to the orchestrating layer that runs the engine `num_variants`
/// times under different configurations (spec §6 `VariantsRequest`). The
/// core itself only ever packs one `(order, config)` pair at a time via
/// [`pack`]; producing several variants and ranking them is the caller's
/// responsibility (spec §2).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariantsRequest {
    pub order: Order,
    #[serde(default)]
    pub num_variants: Option<u32>,
    #[serde(default)]
    pub config: Option<PackerConfiguration>,
}

/// Checks every static constraint on `order` before it reaches the packer:
/// non-empty, positive article dimensions, positive amounts, non-negative
/// weight, and articles that fit the declared bin envelope (spec §6, §7).
pub fn validate_order(order: &Order) -> Result<(), ValidationError> {
    if order.articles.is_empty() {
        return Err(ValidationError::EmptyOrder);
    }
    let details = order
        .colli_details
        .as_ref()
        .ok_or(ValidationError::NoReferenceBins)?;
    if details.max_collis < 1 {
        return Err(ValidationError::NoReferenceBins);
    }
    let max_length = details.max_length.unwrap_or(details.length);

    for article in &order.articles {
        if article.width <= 0 || article.length <= 0 || article.height <= 0 {
            return Err(ValidationError::NonPositiveDimensions {
                id: article.id.clone(),
                width: article.width,
                length: article.length,
                height: article.height,
            });
        }
        if article.amount < 1 {
            return Err(ValidationError::ZeroAmount {
                id: article.id.clone(),
                amount: article.amount,
            });
        }
        if article.weight < 0.0 {
            return Err(ValidationError::NegativeWeight {
                id: article.id.clone(),
                weight: article.weight,
            });
        }
        if article.width > details.width || article.length > max_length || article.height > details.height {
            return Err(ValidationError::ArticleExceedsBin {
                id: article.id.clone(),
                width: article.width,
                length: article.length,
                height: article.height,
                bin_width: details.width,
                bin_length: max_length,
                bin_height: details.height,
            });
        }
    }
    Ok(())
}

fn reference_bin_from(details: &ColliDetails, config: &PackerConfiguration) -> ReferenceBin {
    ReferenceBin {
        width: details.width,
        length: details.length,
        height: details.height,
        max_length: details.max_length,
        max_weight: details.max_weight,
        stability_factor: config.bin_stability_factor,
        overhang_y_stability_factor: config.overhang_y_stability_factor,
        safety_distance_smaller_articles: details.safety_distance_smaller_articles,
        min_article_width_no_safety_distance: details.min_article_width_no_safety_distance,
        safety_distance_lengthwise: details.safety_distance_lengthwise,
    }
}

/// Expands every article's `amount` into that many leaf [`Item::Single`]
/// instances, each carrying the article's own id (spec §3: an article is an
/// input descriptor only, items are the placeable unit).
pub fn expand_articles(order: &Order) -> Vec<Item> {
    order
        .articles
        .iter()
        .flat_map(|article| {
            (0..article.amount).map(|_| {
                Item::single(article.id.clone(), article.width, article.length, article.height, article.weight)
            })
        })
        .collect()
}

/// The full pipeline for one `(order, config)` pair: validates the order,
/// validates the configuration, expands and groups the articles, and runs
/// the layered packer against `colli_details.max_collis` identical
/// reference bins (spec §2, §6).
#[instrument(skip_all, fields(order_id = %order.order_id))]
pub fn pack(order: &Order, config: &PackerConfiguration) -> Result<PackingVariant, EngineError> {
    validate_order(order)?;
    config.validate()?;
    let details = order.colli_details.as_ref().expect("validated above");
    let reference = reference_bin_from(details, config);
    let bins: Vec<ReferenceBin> = std::iter::repeat(reference).take(details.max_collis as usize).collect();
    let items = expand_articles(order);
    Ok(packer::pack_order(&bins, items, config))
}

/// One leaf placement in the output schema (spec §6 `PackedOrder.positions`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PositionRecord {
    pub article_id: String,
    pub x: i64,
    pub y: i64,
    pub z: i64,
    pub rotation: i32,
    pub centerpoint_x: f64,
    pub centerpoint_y: f64,
    pub centerpoint_z: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColliDimension {
    pub width: i64,
    pub length: i64,
    pub height: i64,
}

/// One filled bin in the output schema (spec §6 `Colli`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Colli {
    pub colli: usize,
    pub colli_total: usize,
    pub colli_dimension: ColliDimension,
    pub positions: Vec<PositionRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackedOrder {
    pub order_id: String,
    pub articles: Vec<Article>,
    pub packing_variants: Vec<Vec<Colli>>,
}

fn variant_to_collis(variant: &PackingVariant) -> Vec<Colli> {
    let total = variant.bins.len();
    variant
        .bins
        .iter()
        .enumerate()
        .map(|(idx, bin)| {
            let positions = bin
                .packed_items
                .iter()
                .flat_map(|item| item.flatten())
                .map(|leaf| {
                    let p = leaf.position.expect("bin only holds packed items");
                    PositionRecord {
                        article_id: leaf.identifier.clone(),
                        x: p.x,
                        y: p.y,
                        z: p.z,
                        rotation: p.rotation,
                        centerpoint_x: p.x as f64 + leaf.width as f64 / 2.0,
                        centerpoint_y: p.y as f64 + leaf.length as f64 / 2.0,
                        centerpoint_z: p.z as f64 + leaf.height as f64 / 2.0,
                    }
                })
                .collect();
            Colli {
                colli: idx + 1,
                colli_total: total,
                colli_dimension: ColliDimension {
                    width: bin.width(),
                    length: bin.length(),
                    height: bin.height(),
                },
                positions,
            }
        })
        .collect()
}

/// Assembles the wire-format output for a batch of variants produced for
/// `order` (spec §6 `PackedOrder`).
pub fn to_packed_order(order: &Order, variants: &[PackingVariant]) -> PackedOrder {
    PackedOrder {
        order_id: order.order_id.clone(),
        articles: order.articles.clone(),
        packing_variants: variants.iter().map(variant_to_collis).collect(),
    }
}
