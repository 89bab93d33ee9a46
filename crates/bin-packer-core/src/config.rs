//! Packer configuration: the tunable knobs that drive a single packing run
//! (spec §3 `PackerConfiguration`). Validation happens once at the call
//! boundary via [`PackerConfiguration::validate`], never inside the packing
//! loop (spec §9).

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ConfigurationError;

/// Tie-breaking strategy used by the item selector (spec §4.E).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemSelectStrategy {
    LargestVolume,
    LargestHWL,
    LargestWHL,
    LargestLHW,
    LargestLWH,
    LargestWToFill,
    LargestWHToFill,
}

impl FromStr for ItemSelectStrategy {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "largest_volume" => Ok(Self::LargestVolume),
            "largest_h_w_l" => Ok(Self::LargestHWL),
            "largest_w_h_l" => Ok(Self::LargestWHL),
            "largest_l_h_w" => Ok(Self::LargestLHW),
            "largest_l_w_h" => Ok(Self::LargestLWH),
            "largest_w_to_fill" => Ok(Self::LargestWToFill),
            "largest_w_h_to_fill" => Ok(Self::LargestWHToFill),
            _ => Err(()),
        }
    }
}

/// How several [`crate::item::Item`]s may be merged into one logical
/// super-item before packing (spec §4.C). Only `Lengthwise` is reachable via
/// [`PackerConfiguration`] today; `Horizontal`/`Vertical` exist on
/// [`crate::item::Item::new_group`] for callers that construct groups
/// directly, but are not wired to this enum (spec §9 open question).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ItemGroupingMode {
    Lengthwise,
    Horizontal,
    Vertical,
}

impl FromStr for ItemGroupingMode {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lengthwise" => Ok(Self::Lengthwise),
            "horizontal" => Ok(Self::Horizontal),
            "vertical" => Ok(Self::Vertical),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackerConfiguration {
    #[serde(default = "default_strategy")]
    pub default_select_strategy: ItemSelectStrategy,
    #[serde(default = "default_strategy")]
    pub new_layer_select_strategy: ItemSelectStrategy,
    #[serde(default = "default_direction_change_min_volume")]
    pub direction_change_min_volume: f64,
    #[serde(default = "default_stability_factor")]
    pub bin_stability_factor: f64,
    #[serde(default)]
    pub allow_item_exceeds_layer: bool,
    #[serde(default)]
    pub mirror_walls: bool,
    #[serde(default)]
    pub padding_x: i64,
    #[serde(default)]
    pub overhang_y_stability_factor: Option<f64>,
    #[serde(default)]
    pub remove_gaps: bool,
    #[serde(default)]
    pub item_grouping_mode: Option<ItemGroupingMode>,
    #[serde(default)]
    pub group_narrow_items_w: i64,
}

fn default_strategy() -> ItemSelectStrategy {
    ItemSelectStrategy::LargestHWL
}
fn default_direction_change_min_volume() -> f64 {
    1.0
}
fn default_stability_factor() -> f64 {
    1.0
}

impl Default for PackerConfiguration {
    fn default() -> Self {
        Self {
            default_select_strategy: default_strategy(),
            new_layer_select_strategy: default_strategy(),
            direction_change_min_volume: default_direction_change_min_volume(),
            bin_stability_factor: default_stability_factor(),
            allow_item_exceeds_layer: false,
            mirror_walls: false,
            padding_x: 0,
            overhang_y_stability_factor: None,
            remove_gaps: false,
            item_grouping_mode: None,
            group_narrow_items_w: 0,
        }
    }
}

impl PackerConfiguration {
    /// Validates that every field is within its documented domain.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(0.0..=1.0).contains(&self.direction_change_min_volume) {
            return Err(ConfigurationError::InvalidConfig(format!(
                "direction_change_min_volume must be in [0,1], got {}",
                self.direction_change_min_volume
            )));
        }
        if !(0.0..=1.0).contains(&self.bin_stability_factor) {
            return Err(ConfigurationError::InvalidConfig(format!(
                "bin_stability_factor must be in [0,1], got {}",
                self.bin_stability_factor
            )));
        }
        if self.padding_x < 0 {
            return Err(ConfigurationError::InvalidConfig(format!(
                "padding_x must be >= 0, got {}",
                self.padding_x
            )));
        }
        if self.group_narrow_items_w < 0 {
            return Err(ConfigurationError::InvalidConfig(format!(
                "group_narrow_items_w must be >= 0, got {}",
                self.group_narrow_items_w
            )));
        }
        if let Some(f) = self.overhang_y_stability_factor {
            if !(0.5..1.0).contains(&f) {
                return Err(ConfigurationError::InvalidConfig(format!(
                    "overhang_y_stability_factor must be in [0.5,1), got {f}"
                )));
            }
        }
        Ok(())
    }

    pub fn builder() -> PackerConfigurationBuilder {
        PackerConfigurationBuilder::new()
    }
}

/// Fluent builder for [`PackerConfiguration`].
#[derive(Debug, Default, Clone)]
pub struct PackerConfigurationBuilder {
    cfg: PackerConfiguration,
}

impl PackerConfigurationBuilder {
    pub fn new() -> Self {
        Self {
            cfg: PackerConfiguration::default(),
        }
    }
    pub fn default_select_strategy(mut self, v: ItemSelectStrategy) -> Self {
        self.cfg.default_select_strategy = v;
        self
    }
    pub fn new_layer_select_strategy(mut self, v: ItemSelectStrategy) -> Self {
        self.cfg.new_layer_select_strategy = v;
        self
    }
    pub fn direction_change_min_volume(mut self, v: f64) -> Self {
        self.cfg.direction_change_min_volume = v;
        self
    }
    pub fn bin_stability_factor(mut self, v: f64) -> Self {
        self.cfg.bin_stability_factor = v;
        self
    }
    pub fn allow_item_exceeds_layer(mut self, v: bool) -> Self {
        self.cfg.allow_item_exceeds_layer = v;
        self
    }
    pub fn mirror_walls(mut self, v: bool) -> Self {
        self.cfg.mirror_walls = v;
        self
    }
    pub fn padding_x(mut self, v: i64) -> Self {
        self.cfg.padding_x = v;
        self
    }
    pub fn overhang_y_stability_factor(mut self, v: Option<f64>) -> Self {
        self.cfg.overhang_y_stability_factor = v;
        self
    }
    pub fn remove_gaps(mut self, v: bool) -> Self {
        self.cfg.remove_gaps = v;
        self
    }
    pub fn item_grouping_mode(mut self, v: Option<ItemGroupingMode>) -> Self {
        self.cfg.item_grouping_mode = v;
        self
    }
    pub fn group_narrow_items_w(mut self, v: i64) -> Self {
        self.cfg.group_narrow_items_w = v;
        self
    }
    pub fn build(self) -> PackerConfiguration {
        self.cfg
    }
}

/// Per-metric weights for [`crate::evaluator`] (spec §4.G resolves the
/// weighted sum's weights as a caller-supplied, not hard-coded, parameter —
/// see DESIGN.md).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PackingEvaluationWeights {
    pub item_distribution: f64,
    pub item_stacking: f64,
    pub item_grouping: f64,
    pub utilized_space: f64,
}

impl Default for PackingEvaluationWeights {
    fn default() -> Self {
        Self {
            item_distribution: 1.0,
            item_stacking: 1.0,
            item_grouping: 1.0,
            utilized_space: 1.0,
        }
    }
}

impl PackingEvaluationWeights {
    pub fn total(&self) -> f64 {
        self.item_distribution + self.item_stacking + self.item_grouping + self.utilized_space
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(PackerConfiguration::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_overhang_factor() {
        let cfg = PackerConfiguration::builder()
            .overhang_y_stability_factor(Some(0.3))
            .build();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_negative_padding() {
        let cfg = PackerConfiguration::builder().padding_x(-1).build();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn strategy_from_str_roundtrips() {
        assert_eq!(
            "largest_w_h_l".parse::<ItemSelectStrategy>(),
            Ok(ItemSelectStrategy::LargestWHL)
        );
    }
}
