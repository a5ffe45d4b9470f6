// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shapes and their content identity.

use core::hash::{BuildHasher, Hash, Hasher};

use foldhash::fast::FixedState;
use skrifa::instance::{LocationRef, Size};
use skrifa::outline::{DrawSettings, OutlinePen};
use skrifa::{FontRef, GlyphId, MetadataProvider};

use crate::kurbo::{BezPath, PathEl, Point, Rect, Shape as _};
use crate::peniko::{Fill, FontData};

/// Fixed seed, so identities are reproducible between runs.
const IDENTITY_SEED: u64 = 0x5eed_5a9e_a71a_5000;

/// Domain separators so a path and a glyph can never produce the same identity by accident.
const PATH_DOMAIN: u8 = 1;
const GLYPH_DOMAIN: u8 = 2;

/// Stable content identity of a shape's unstyled, untransformed fill geometry.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ShapeId(pub u64);

/// How the geometry of a shape is painted.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum ShapeStyle {
    /// A simple fill of the interior.
    Fill,
    /// A stroke of the outline with the given width.
    Stroke {
        /// Stroke width in shape units.
        width: f64,
    },
}

/// An owned fill geometry together with the properties that decide how it can be drawn.
#[derive(Clone, Debug)]
pub struct Shape {
    path: BezPath,
    bounds: Rect,
    fill: Fill,
    style: ShapeStyle,
    inverse_fill: bool,
    id: Option<ShapeId>,
}

impl Shape {
    /// Creates a non-zero filled shape whose identity is derived from its geometry.
    pub fn new(path: BezPath) -> Self {
        Self::with_fill(path, Fill::NonZero)
    }

    /// Creates a filled shape with the given fill rule and geometry-derived identity.
    pub fn with_fill(path: BezPath, fill: Fill) -> Self {
        let id = path_identity(&path, fill);
        Self {
            bounds: path.bounding_box(),
            path,
            fill,
            style: ShapeStyle::Fill,
            inverse_fill: false,
            id: Some(id),
        }
    }

    /// Creates a shape without a content identity.
    ///
    /// Such shapes can't be reused between draws and are never cached.
    pub fn volatile(path: BezPath) -> Self {
        Self {
            bounds: path.bounding_box(),
            path,
            fill: Fill::NonZero,
            style: ShapeStyle::Fill,
            inverse_fill: false,
            id: None,
        }
    }

    /// Creates a shape from the unscaled outline of a glyph, in font units with y pointing down.
    ///
    /// The identity is derived from the font blob, the index within the collection, and the
    /// glyph id, so it's stable without hashing the outline. Returns `None` if the font can't be
    /// read or the glyph has no outline.
    pub fn from_glyph(font: &FontData, glyph_id: u32) -> Option<Self> {
        let font_ref = FontRef::from_index(font.data.as_ref(), font.index).ok()?;
        let outline = font_ref.outline_glyphs().get(GlyphId::new(glyph_id))?;

        let mut pen = FlippedOutline::default();
        outline
            .draw(
                DrawSettings::unhinted(Size::unscaled(), LocationRef::default()),
                &mut pen,
            )
            .ok()?;

        let mut hasher = FixedState::with_seed(IDENTITY_SEED).build_hasher();
        GLYPH_DOMAIN.hash(&mut hasher);
        font.data.id().hash(&mut hasher);
        font.index.hash(&mut hasher);
        glyph_id.hash(&mut hasher);

        Some(Self {
            bounds: pen.path.bounding_box(),
            path: pen.path,
            fill: Fill::NonZero,
            style: ShapeStyle::Fill,
            inverse_fill: false,
            id: Some(ShapeId(hasher.finish())),
        })
    }

    /// Returns this shape with the given style.
    #[must_use]
    pub fn styled(mut self, style: ShapeStyle) -> Self {
        self.style = style;
        self
    }

    /// Returns this shape with the inverse-fill flag set.
    #[must_use]
    pub fn inverse_filled(mut self, inverse: bool) -> Self {
        self.inverse_fill = inverse;
        self
    }

    /// The fill geometry.
    #[inline]
    pub fn path(&self) -> &BezPath {
        &self.path
    }

    /// The untransformed bounds of the fill geometry.
    #[inline]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// The bounds including the area covered by the style (e.g. half the stroke width).
    pub fn styled_bounds(&self) -> Rect {
        match self.style {
            ShapeStyle::Fill => self.bounds,
            ShapeStyle::Stroke { width } => {
                let half = 0.5 * width.abs();
                self.bounds.inflate(half, half)
            }
        }
    }

    /// The fill rule.
    #[inline]
    pub fn fill(&self) -> Fill {
        self.fill
    }

    /// The paint style.
    #[inline]
    pub fn style(&self) -> ShapeStyle {
        self.style
    }

    /// Whether the shape is a simple, non-inverse fill.
    #[inline]
    pub fn is_simple_fill(&self) -> bool {
        self.style == ShapeStyle::Fill
    }

    /// Whether the exterior instead of the interior is filled.
    #[inline]
    pub fn is_inverse_filled(&self) -> bool {
        self.inverse_fill
    }

    /// The content identity, if this shape has one.
    #[inline]
    pub fn id(&self) -> Option<ShapeId> {
        self.id
    }
}

fn path_identity(path: &BezPath, fill: Fill) -> ShapeId {
    let mut hasher = FixedState::with_seed(IDENTITY_SEED).build_hasher();
    PATH_DOMAIN.hash(&mut hasher);
    let fill_tag: u8 = match fill {
        Fill::NonZero => 0,
        Fill::EvenOdd => 1,
    };
    fill_tag.hash(&mut hasher);
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => hash_points(&mut hasher, 0, &[p]),
            PathEl::LineTo(p) => hash_points(&mut hasher, 1, &[p]),
            PathEl::QuadTo(p1, p2) => hash_points(&mut hasher, 2, &[p1, p2]),
            PathEl::CurveTo(p1, p2, p3) => hash_points(&mut hasher, 3, &[p1, p2, p3]),
            PathEl::ClosePath => 4_u8.hash(&mut hasher),
        }
    }
    ShapeId(hasher.finish())
}

fn hash_points(hasher: &mut impl Hasher, tag: u8, points: &[Point]) {
    tag.hash(hasher);
    for p in points {
        crate::math::canonical_bits(p.x).hash(hasher);
        crate::math::canonical_bits(p.y).hash(hasher);
    }
}

/// Outline pen that flips the y axis from font space (y up) to shape space (y down).
#[derive(Default)]
struct FlippedOutline {
    path: BezPath,
}

impl OutlinePen for FlippedOutline {
    fn move_to(&mut self, x: f32, y: f32) {
        self.path.move_to((x, -y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.path.line_to((x, -y));
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        self.path.quad_to((cx0, -cy0), (x, -y));
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.path.curve_to((cx0, -cy0), (cx1, -cy1), (x, -y));
    }

    fn close(&mut self) {
        self.path.close_path();
    }
}
