//! The closed catalog of arrangements.
//!
//! A [`Catalog`] is an immutable id → [`ArrangementSpec`] table, built once
//! and passed by reference to the selector and the compositor. Nothing mutates
//! it after construction; lookups are pure.
//!
//! ## Standard catalog
//!
//! | Id | Kind | Slots |
//! |---|---|---|
//! | `1x1` `2x1` `1x2` `2x2` `3x1` `1x3` `2x3` `3x2` | grid (`rows`x`cols`) | rows × cols |
//! | `hero-side` | custom | 4 |
//! | `corner-grid` | custom | 5 |
//! | `banner-split` | custom | 3 |
//! | `spotlight` | custom | 4 |
//! | `l-shape` | custom | 5 |

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("Invalid layout: '{0}' is not a known arrangement")]
    InvalidLayout(String),
}

/// Non-rectangular arrangements with their own subdivision math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CustomShape {
    /// One large hero image with the rest stacked beside it.
    HeroSide,
    /// Main + two stacked, 2×2, or center column between corners, by count.
    CornerGrid,
    /// Full-width banner over a row of equal splits.
    BannerSplit,
    /// Magazine main + side column, or a two-column grid for 4+.
    Spotlight,
    /// Main image wrapped by a right column and a bottom row.
    LShape,
}

impl CustomShape {
    pub const ALL: [CustomShape; 5] = [
        CustomShape::HeroSide,
        CustomShape::CornerGrid,
        CustomShape::BannerSplit,
        CustomShape::Spotlight,
        CustomShape::LShape,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CustomShape::HeroSide => "hero-side",
            CustomShape::CornerGrid => "corner-grid",
            CustomShape::BannerSplit => "banner-split",
            CustomShape::Spotlight => "spotlight",
            CustomShape::LShape => "l-shape",
        }
    }

    pub fn max_images(self) -> usize {
        match self {
            CustomShape::HeroSide => 4,
            CustomShape::CornerGrid => 5,
            CustomShape::BannerSplit => 3,
            CustomShape::Spotlight => 4,
            CustomShape::LShape => 5,
        }
    }
}

impl fmt::Display for CustomShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ArrangementKind {
    Grid { rows: u32, cols: u32 },
    Custom { shape: CustomShape },
}

/// One entry of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArrangementSpec {
    pub id: String,
    #[serde(flatten)]
    pub kind: ArrangementKind,
    pub max_images: usize,
}

impl ArrangementSpec {
    /// A `rows`x`cols` grid; `max_images` is always `rows * cols`.
    pub fn grid(rows: u32, cols: u32) -> Self {
        Self {
            id: format!("{rows}x{cols}"),
            kind: ArrangementKind::Grid { rows, cols },
            max_images: (rows * cols) as usize,
        }
    }

    pub fn custom(shape: CustomShape) -> Self {
        Self {
            id: shape.name().to_string(),
            kind: ArrangementKind::Custom { shape },
            max_images: shape.max_images(),
        }
    }

    pub fn is_grid(&self) -> bool {
        matches!(self.kind, ArrangementKind::Grid { .. })
    }
}

/// Immutable arrangement table.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: BTreeMap<String, ArrangementSpec>,
}

impl Catalog {
    /// The built-in grid and custom-shape arrangements.
    pub fn standard() -> Self {
        let grids = [(1, 1), (2, 1), (1, 2), (2, 2), (3, 1), (1, 3), (2, 3), (3, 2)];
        let specs = grids
            .into_iter()
            .map(|(r, c)| ArrangementSpec::grid(r, c))
            .chain(CustomShape::ALL.into_iter().map(ArrangementSpec::custom));
        Self::from_specs(specs)
    }

    pub fn from_specs(specs: impl IntoIterator<Item = ArrangementSpec>) -> Self {
        Self {
            entries: specs.into_iter().map(|s| (s.id.clone(), s)).collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&ArrangementSpec> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Lookup that fails with [`LayoutError::InvalidLayout`] naming the id.
    pub fn require(&self, id: &str) -> Result<&ArrangementSpec, LayoutError> {
        self.get(id)
            .ok_or_else(|| LayoutError::InvalidLayout(id.to_string()))
    }

    /// Entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ArrangementSpec> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// How the caller wants the arrangement chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutMode {
    Auto,
    Named(String),
}

impl LayoutMode {
    /// Parse a user-supplied mode.
    ///
    /// `auto` (or empty) selects automatically; `2-split` and `3-split` are
    /// aliases for `1x2` and `1x3`; anything else is taken as a catalog id
    /// and checked later by [`LayoutMode::resolve`].
    pub fn parse(mode: &str) -> Self {
        match mode.trim() {
            "" | "auto" => LayoutMode::Auto,
            "2-split" => LayoutMode::Named("1x2".to_string()),
            "3-split" => LayoutMode::Named("1x3".to_string()),
            other => LayoutMode::Named(other.to_ascii_lowercase()),
        }
    }

    /// Catalog entry for a named mode; `None` for [`LayoutMode::Auto`].
    pub fn resolve<'a>(
        &self,
        catalog: &'a Catalog,
    ) -> Result<Option<&'a ArrangementSpec>, LayoutError> {
        match self {
            LayoutMode::Auto => Ok(None),
            LayoutMode::Named(id) => catalog.require(id).map(Some),
        }
    }
}
