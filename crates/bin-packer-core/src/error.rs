//! Error taxonomy (spec §7): values, not exceptions. `PlacementRejected` is
//! an expected control signal the packer loop retries around, not a failure
//! bubbled to the caller — only [`ValidationError`] and
//! [`ConfigurationError`] ever leave the engine.

use thiserror::Error;

/// Why a `can_pack`/`pack_item` call rejected a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The item already has a position.
    AlreadyPacked,
    /// The item's footprint does not fit inside the bin's envelope.
    OutOfBounds,
    /// The footprint overlaps an already-placed item.
    Occupied,
    /// Too few width-columns rest on a matching-height support.
    Unstable,
    /// The item's y-overhang exceeds what `overhang_y_stability_factor` allows.
    OverhangUnstable,
    /// `remove_item` was called on an item that is not topmost in every
    /// footprint column.
    NotOnTop,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RejectReason::AlreadyPacked => "item already packed",
            RejectReason::OutOfBounds => "out of bounds of the bin (containment condition)",
            RejectReason::Occupied => "position is already occupied (non-overlapping condition)",
            RejectReason::Unstable => "position is not stable (stability condition)",
            RejectReason::OverhangUnstable => "item overhangs the bin and is not stable (overhang condition)",
            RejectReason::NotOnTop => "item can not be removed because it is not on top",
        };
        f.write_str(s)
    }
}

/// A rejected placement attempt, carrying enough context for logs and the
/// unpacked-items diagnostic string (spec §6 `PackedOrder`, §7).
#[derive(Debug, Clone, Error)]
#[error("{item_id}: {reason}")]
pub struct PlacementRejected {
    pub item_id: String,
    pub reason: RejectReason,
}

impl PlacementRejected {
    pub fn new(item_id: impl Into<String>, reason: RejectReason) -> Self {
        Self {
            item_id: item_id.into(),
            reason,
        }
    }
}

/// Input violates a static constraint. Raised at the validation boundary;
/// the packing core itself assumes validated input.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("order must have at least one article")]
    EmptyOrder,
    #[error("article '{id}' has non-positive dimensions ({width}x{length}x{height})")]
    NonPositiveDimensions {
        id: String,
        width: i64,
        length: i64,
        height: i64,
    },
    #[error("article '{id}' has amount {amount}, must be >= 1")]
    ZeroAmount { id: String, amount: u32 },
    #[error("article '{id}' has negative weight {weight}")]
    NegativeWeight { id: String, weight: f64 },
    #[error(
        "article '{id}' ({width}x{length}x{height}) exceeds bin envelope ({bin_width}x{bin_length}x{bin_height})"
    )]
    ArticleExceedsBin {
        id: String,
        width: i64,
        length: i64,
        height: i64,
        bin_width: i64,
        bin_length: i64,
        bin_height: i64,
    },
    #[error("no reference bins provided")]
    NoReferenceBins,
}

/// A programmer error: a selector strategy that was never wired up, or a
/// `GroupedItem` built with inconsistent children.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("invalid packer configuration: {0}")]
    InvalidConfig(String),
    #[error("grouped item constructed with inconsistent or overlapping offsets")]
    InconsistentGroup,
    #[error("item select strategy not implemented: {0:?}")]
    StrategyNotImplemented(crate::config::ItemSelectStrategy),
}

/// Top-level engine error. `ValidationError`/`ConfigurationError` surface to
/// the caller; `PlacementRejected` never escapes the packer loop.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
