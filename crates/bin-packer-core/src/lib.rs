//! Core library for a 3D cuboid bin-packing engine.
//!
//! - Geometry: a heightmap-backed [`bin::Bin`] validates containment,
//!   non-overlap, stability and y-overhang on every placement.
//! - Heuristic: [`packer::pack_order`] drives a wall-building layered loop,
//!   picking items with a configurable [`config::ItemSelectStrategy`] and
//!   merging compatible items via [`grouping`] first.
//! - Scoring: [`evaluator::evaluate`] ranks a batch of variants on four
//!   weighted metrics.
//! - Wire format: [`order`] is the only module that knows about JSON input
//!   and output records.
//!
//! Quick example:
//! ```
//! use bin_packer_core::prelude::*;
//!
//! let order = Order {
//!     order_id: "o1".into(),
//!     articles: vec![Article { id: "a".into(), width: 5, length: 5, height: 5, weight: 1.0, amount: 2 }],
//!     supplies: None,
//!     colli_details: Some(ColliDetails {
//!         width: 10, length: 10, height: 10, max_collis: 1,
//!         max_length: None, max_weight: None,
//!         safety_distance_smaller_articles: None,
//!         min_article_width_no_safety_distance: None,
//!         safety_distance_lengthwise: None,
//!     }),
//! };
//! let variant = pack(&order, &PackerConfiguration::default()).unwrap();
//! assert!(variant.unpacked_items.is_empty());
//! ```

pub mod bin;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod grouping;
pub mod item;
pub mod model;
pub mod order;
pub mod packer;
pub mod selector;

pub use error::*;
pub use model::*;

/// Convenience prelude bringing the primary API into scope.
pub mod prelude {
    pub use crate::bin::{Bin, ReferenceBin};
    pub use crate::config::{ItemGroupingMode, ItemSelectStrategy, PackerConfiguration, PackingEvaluationWeights};
    pub use crate::error::{ConfigurationError, EngineError, PlacementRejected, RejectReason, Result, ValidationError};
    pub use crate::evaluator::{evaluate, score_bin, score_variant, EvaluatedVariant, PackingScore};
    pub use crate::item::{GroupedItem, Item, SingleItem};
    pub use crate::model::{Article, Position, SnapDirection, Snappoint};
    pub use crate::order::{
        pack, to_packed_order, validate_order, Colli, ColliDetails, ColliDimension, Order, PackedOrder,
        PositionRecord, VariantsRequest,
    };
    pub use crate::packer::PackingVariant;
}
