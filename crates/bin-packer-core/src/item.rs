//! Item polymorphism (spec §3, §4.A, §9): a leaf `Single` item or a
//! composite `Group` bundling several items into one placement unit. A sum
//! type dispatched by tag, not inheritance — `flatten`, `pack`,
//! `max_overhang_y` and `dimensions` are the only operations a caller needs.

use serde::{Deserialize, Serialize};

use crate::config::ItemGroupingMode;
use crate::error::ConfigurationError;
use crate::model::Position;

/// A concrete placeable cuboid: either a leaf [`Item::Single`] or a
/// composite [`Item::Group`].
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Single(SingleItem),
    Group(GroupedItem),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleItem {
    pub identifier: String,
    pub width: i64,
    pub length: i64,
    pub height: i64,
    pub weight: f64,
    pub position: Option<Position>,
}

impl SingleItem {
    pub fn volume(&self) -> i64 {
        self.width * self.length * self.height
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupedItem {
    pub grouping_mode: ItemGroupingMode,
    pub children: Vec<Item>,
    pub offsets: Vec<(i64, i64, i64)>,
    pub position: Option<Position>,
    width: i64,
    length: i64,
    height: i64,
    weight: f64,
}

impl Item {
    pub fn single(identifier: impl Into<String>, width: i64, length: i64, height: i64, weight: f64) -> Self {
        Item::Single(SingleItem {
            identifier: identifier.into(),
            width,
            length,
            height,
            weight,
            position: None,
        })
    }

    /// Builds a `LENGTHWISE` or `HORIZONTAL` group from explicit per-child
    /// offsets, rejecting overlapping offsets (spec §4.A). `VERTICAL` groups
    /// use [`Item::new_vertical_group`] since their offsets are always
    /// derived, never supplied.
    pub fn new_group(
        mode: ItemGroupingMode,
        children: Vec<Item>,
        offsets: Vec<(i64, i64, i64)>,
    ) -> Result<Self, ConfigurationError> {
        if children.is_empty() || children.len() != offsets.len() {
            return Err(ConfigurationError::InconsistentGroup);
        }
        match mode {
            ItemGroupingMode::Lengthwise => {
                let (w0, h0) = {
                    let (w, _, h) = children[0].dimensions();
                    (w, h)
                };
                for c in &children {
                    let (w, _, h) = c.dimensions();
                    if w != w0 || h != h0 {
                        return Err(ConfigurationError::InconsistentGroup);
                    }
                }
                let mut by_y: Vec<(i64, i64)> = children
                    .iter()
                    .zip(offsets.iter())
                    .map(|(c, o)| {
                        if o.0 != 0 || o.2 != 0 {
                            (i64::MIN, 0)
                        } else {
                            (o.1, c.dimensions().1)
                        }
                    })
                    .collect();
                by_y.sort_by_key(|(y, _)| *y);
                let mut prev_end = i64::MIN;
                for (y, len) in &by_y {
                    if *y == i64::MIN || *y < prev_end {
                        return Err(ConfigurationError::InconsistentGroup);
                    }
                    prev_end = y + len;
                }
                let length = by_y
                    .iter()
                    .map(|(y, len)| y + len)
                    .max()
                    .unwrap_or(0)
                    - by_y.iter().map(|(y, _)| *y).min().unwrap_or(0);
                let weight = children.iter().map(|c| c.weight()).sum();
                Ok(Item::Group(GroupedItem {
                    grouping_mode: mode,
                    children,
                    offsets,
                    position: None,
                    width: w0,
                    length,
                    height: h0,
                    weight,
                }))
            }
            ItemGroupingMode::Horizontal => {
                let h0 = children[0].dimensions().2;
                for c in &children {
                    if c.dimensions().2 != h0 {
                        return Err(ConfigurationError::InconsistentGroup);
                    }
                }
                let mut by_x: Vec<(i64, i64)> = children
                    .iter()
                    .zip(offsets.iter())
                    .map(|(c, o)| {
                        if o.1 != 0 || o.2 != 0 {
                            (i64::MIN, 0)
                        } else {
                            (o.0, c.dimensions().0)
                        }
                    })
                    .collect();
                by_x.sort_by_key(|(x, _)| *x);
                let mut prev_end = i64::MIN;
                for (x, w) in &by_x {
                    if *x == i64::MIN || *x < prev_end {
                        return Err(ConfigurationError::InconsistentGroup);
                    }
                    prev_end = x + w;
                }
                let width = by_x
                    .iter()
                    .map(|(x, w)| x + w)
                    .max()
                    .unwrap_or(0)
                    - by_x.iter().map(|(x, _)| *x).min().unwrap_or(0);
                let length = children.iter().map(|c| c.dimensions().1).max().unwrap_or(0);
                let weight = children.iter().map(|c| c.weight()).sum();
                Ok(Item::Group(GroupedItem {
                    grouping_mode: mode,
                    children,
                    offsets,
                    position: None,
                    width,
                    length,
                    height: h0,
                    weight,
                }))
            }
            ItemGroupingMode::Vertical => Err(ConfigurationError::InconsistentGroup),
        }
    }

    /// Builds a `VERTICAL` group stacking children by ascending width, with
    /// offsets derived rather than supplied (spec §9: reachable only for
    /// callers constructing groups directly, not via [`crate::config`]).
    pub fn new_vertical_group(mut children: Vec<Item>) -> Result<Self, ConfigurationError> {
        if children.is_empty() {
            return Err(ConfigurationError::InconsistentGroup);
        }
        let w0 = children[0].dimensions().0;
        for c in &children {
            if c.dimensions().0 != w0 {
                return Err(ConfigurationError::InconsistentGroup);
            }
        }
        children.sort_by_key(|c| c.dimensions().0);
        let mut offsets = Vec::with_capacity(children.len());
        let mut z = 0i64;
        for c in &children {
            offsets.push((0, 0, z));
            z += c.dimensions().2;
        }
        let length = children.iter().map(|c| c.dimensions().1).max().unwrap_or(0);
        let height = z;
        let weight = children.iter().map(|c| c.weight()).sum();
        Ok(Item::Group(GroupedItem {
            grouping_mode: ItemGroupingMode::Vertical,
            children,
            offsets,
            position: None,
            width: w0,
            length,
            height,
            weight,
        }))
    }

    pub fn identifier(&self) -> String {
        match self {
            Item::Single(s) => s.identifier.clone(),
            Item::Group(g) => format!(
                "ItemGroup({:?}): {} items {:?}",
                g.grouping_mode,
                g.children.len(),
                (g.width, g.length, g.height)
            ),
        }
    }

    pub fn dimensions(&self) -> (i64, i64, i64) {
        match self {
            Item::Single(s) => (s.width, s.length, s.height),
            Item::Group(g) => (g.width, g.length, g.height),
        }
    }

    pub fn weight(&self) -> f64 {
        match self {
            Item::Single(s) => s.weight,
            Item::Group(g) => g.weight,
        }
    }

    pub fn volume(&self) -> i64 {
        let (w, l, h) = self.dimensions();
        w * l * h
    }

    pub fn surface(&self) -> i64 {
        let (w, l, _) = self.dimensions();
        w * l
    }

    pub fn position(&self) -> Option<Position> {
        match self {
            Item::Single(s) => s.position,
            Item::Group(g) => g.position,
        }
    }

    pub fn is_packed(&self) -> bool {
        self.position().is_some()
    }

    /// The item's centerpoint, valid only once packed.
    pub fn centerpoint(&self) -> Option<(f64, f64, f64)> {
        let p = self.position()?;
        let (w, l, h) = self.dimensions();
        Some((
            p.x as f64 + w as f64 / 2.0,
            p.y as f64 + l as f64 / 2.0,
            p.z as f64 + h as f64 / 2.0,
        ))
    }

    /// `floor(length * (1 - s))`, the maximum y-overhang this item tolerates
    /// under overhang-stability factor `s` (spec §3).
    pub fn max_overhang_y(&self, s: f64) -> i64 {
        match self {
            Item::Single(single) => ((single.length as f64) * (1.0 - s)).floor() as i64,
            Item::Group(g) => g
                .children
                .iter()
                .map(|c| c.max_overhang_y(s))
                .min()
                .unwrap_or(0),
        }
    }

    /// Sets this item's (and, recursively, its children's) position.
    pub fn pack(&mut self, position: Option<Position>) {
        match self {
            Item::Single(s) => s.position = position,
            Item::Group(g) => {
                g.position = position;
                if let Some(p) = position {
                    for (child, (dx, dy, dz)) in g.children.iter_mut().zip(g.offsets.iter()) {
                        child.pack(Some(p.offset(*dx, *dy, *dz)));
                    }
                } else {
                    for child in g.children.iter_mut() {
                        child.pack(None);
                    }
                }
            }
        }
    }

    /// All leaf items contained in this item, recursively.
    pub fn flatten(&self) -> Vec<SingleItem> {
        match self {
            Item::Single(s) => vec![s.clone()],
            Item::Group(g) => g.children.iter().flat_map(|c| c.flatten()).collect(),
        }
    }

    /// Shifts `position.y` by `delta` in place — used by [`crate::bin::Bin`]
    /// to center a y-overhanging item around the bin's y-axis.
    pub fn shift_y(&mut self, delta: i64) {
        let shifted = self.position().map(|p| Position {
            y: p.y + delta,
            ..p
        });
        self.pack(shifted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: &str, w: i64, l: i64, h: i64) -> Item {
        Item::single(id, w, l, h, 1.0)
    }

    #[test]
    fn single_item_flatten_is_itself() {
        let item = leaf("a", 2, 3, 4);
        assert_eq!(item.flatten().len(), 1);
        assert_eq!(item.volume(), 24);
    }

    #[test]
    fn lengthwise_group_rejects_overlapping_offsets() {
        let children = vec![leaf("a", 2, 3, 4), leaf("b", 2, 3, 4)];
        let offsets = vec![(0, 0, 0), (0, 2, 0)]; // overlap: second starts before first ends
        let result = Item::new_group(ItemGroupingMode::Lengthwise, children, offsets);
        assert!(result.is_err());
    }

    #[test]
    fn lengthwise_group_accepts_sequential_offsets() {
        let children = vec![leaf("a", 2, 3, 4), leaf("b", 2, 5, 4)];
        let offsets = vec![(0, 0, 0), (0, 3, 0)];
        let group = Item::new_group(ItemGroupingMode::Lengthwise, children, offsets).unwrap();
        assert_eq!(group.dimensions(), (2, 8, 4));
    }

    #[test]
    fn pack_group_propagates_offsets_to_children() {
        let children = vec![leaf("a", 2, 3, 4), leaf("b", 2, 5, 4)];
        let offsets = vec![(0, 0, 0), (0, 3, 0)];
        let mut group = Item::new_group(ItemGroupingMode::Lengthwise, children, offsets).unwrap();
        group.pack(Some(Position::new(10, 20, 0)));
        let flat = group.flatten();
        assert_eq!(flat[0].position, Some(Position::new(10, 20, 0)));
        assert_eq!(flat[1].position, Some(Position::new(10, 23, 0)));
    }

    #[test]
    fn group_weight_is_sum_of_children() {
        let children = vec![leaf("a", 1, 1, 1), leaf("b", 1, 1, 1)];
        let offsets = vec![(0, 0, 0), (0, 1, 0)];
        let group = Item::new_group(ItemGroupingMode::Lengthwise, children, offsets).unwrap();
        assert_eq!(group.weight(), 2.0);
    }
}
