//! The environment the engine computes values against.

use crate::dom::{Document, NodeId};
use crate::value::Value;

/// Viewer/platform inputs to value computation.
///
/// The engine owns a boxed context; embedders implement this to supply
/// viewport geometry, resolution, and platform lookups.
pub trait CssContext {
    /// Resolve a system color keyword, e.g. `windowtext`. Unknown names
    /// fall back to black.
    fn system_color(&self, name: &str) -> Value;

    /// The next lighter weight available for a font at `weight`.
    fn lighter_font_weight(&self, weight: f32) -> f32;

    /// The next bolder weight available for a font at `weight`.
    fn bolder_font_weight(&self, weight: f32) -> f32;

    /// Millimeters per user-space pixel.
    fn pixel_to_millimeter(&self) -> f32;

    /// The pixel size of `font-size: medium`.
    fn medium_font_size(&self) -> f32;

    /// Containing block width for `node`, for horizontal percentages.
    /// Nested viewports give different elements different answers.
    fn block_width(&self, doc: &Document, node: NodeId) -> f32;

    /// Containing block height for `node`, for vertical percentages.
    fn block_height(&self, doc: &Document, node: NodeId) -> f32;
}

/// A fixed-geometry context with CSS-typical defaults: 96 dpi, 9px
/// medium font, simple one-step weight laddering.
#[derive(Debug, Clone)]
pub struct StaticContext {
    pub pixel_to_mm: f32,
    pub medium_font_size: f32,
    pub block_width: f32,
    pub block_height: f32,
}

impl Default for StaticContext {
    fn default() -> Self {
        StaticContext {
            pixel_to_mm: 0.264_583_32,
            medium_font_size: 9.0,
            block_width: 400.0,
            block_height: 400.0,
        }
    }
}

impl CssContext for StaticContext {
    fn system_color(&self, _name: &str) -> Value {
        Value::rgb(0.0, 0.0, 0.0)
    }

    fn lighter_font_weight(&self, weight: f32) -> f32 {
        (weight - 100.0).max(100.0)
    }

    fn bolder_font_weight(&self, weight: f32) -> f32 {
        (weight + 100.0).min(900.0)
    }

    fn pixel_to_millimeter(&self) -> f32 {
        self.pixel_to_mm
    }

    fn medium_font_size(&self) -> f32 {
        self.medium_font_size
    }

    fn block_width(&self, _doc: &Document, _node: NodeId) -> f32 {
        self.block_width
    }

    fn block_height(&self, _doc: &Document, _node: NodeId) -> f32 {
        self.block_height
    }
}
