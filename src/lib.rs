//! # cascara
//!
//! A CSS cascade and computed-value engine for SVG documents.
//!
//! ## Features
//!
//! - Typed, immutable property values with unit conversion and
//!   percentage resolution
//! - An explicit [`PropertyRegistry`] with dense indices, inheritance
//!   flags, and per-property value managers
//! - Stylesheet parsing (style rules, `@media`, `@import`, `@font-face`)
//!   with lenient CSS error recovery
//! - Full cascade resolution across user-agent, user, and author origins,
//!   including presentation attributes and inline `style`
//! - Cached per-element [`StyleMap`]s with fine-grained invalidation and
//!   synchronous change events
//!
//! ## Quick Start
//!
//! ```
//! use cascara::{CssEngine, Document, Origin, PropertyRegistry, StaticContext, StyleSheet, Value};
//!
//! let mut doc = Document::new();
//! let svg = doc.create_element("svg");
//! let rect = doc.create_element("rect");
//! doc.append_child(svg, rect);
//!
//! let registry = PropertyRegistry::svg();
//! let sheet = StyleSheet::parse(&registry, "rect { stroke-width: 2em; font-size: 10px; }");
//!
//! let mut engine = CssEngine::new(registry, Box::new(StaticContext::default()), "screen");
//! engine.add_stylesheet(Origin::Author, sheet);
//!
//! let width = engine.registry().index_of("stroke-width").unwrap();
//! assert_eq!(engine.computed_value(&doc, rect, None, width), Value::number(20.0));
//! ```
//!
//! The engine recomputes styles when told about document mutations
//! ([`CssEngine::attribute_changed`], [`CssEngine::invalidate`]) and
//! reports the affected properties to registered listeners.

pub mod context;
pub mod declaration;
pub mod dom;
pub mod engine;
pub mod error;
pub mod event;
pub mod property;
pub mod selector;
pub mod style_map;
pub mod stylesheet;
pub mod value;

pub use context::{CssContext, StaticContext};
pub use declaration::{Declaration, StyleDeclaration};
pub use dom::{Document, NodeId};
pub use engine::CssEngine;
pub use error::{Error, Result};
pub use event::{ListenerId, StyleChangeEvent};
pub use property::{PropertyDescriptor, PropertyRegistry};
pub use selector::{ElementRef, PseudoElement, Specificity, SvgSelectors};
pub use style_map::{Flags, StyleMap};
pub use stylesheet::{
    media_matches, parse_property_value, parse_style_attribute, FontFaceRule, ImportRule,
    MediaRule, Origin, Rule, StyleRule, StyleSheet,
};
pub use value::{Orientation, RectValue, RgbColor, Separator, ToCss, Unit, Value, ValueManager};
