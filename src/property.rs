//! The property registry.
//!
//! A [`PropertyRegistry`] is an immutable table of property descriptors with
//! dense indices. Engines, style maps, and declarations all speak in these
//! indices; names are resolved once at parse time. Registries are built
//! explicitly, there are no global tables, and a map built against one
//! registry must never be read through another.

use std::collections::HashMap;

use cssparser::Parser;

use crate::error::{Error, Result};
use crate::value::{Orientation, Separator, Value, ValueManager};

/// Everything the engine needs to know about one property.
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    /// Canonical lowercase property name.
    pub name: &'static str,
    /// Whether unset slots take the parent's computed value.
    pub inherited: bool,
    /// The value used when nothing cascades and the property is not
    /// inherited, and the substitute for cyclic dependencies.
    pub initial: Value,
    pub manager: ValueManager,
}

/// Dense, index-stable table of registered properties.
pub struct PropertyRegistry {
    descriptors: Vec<PropertyDescriptor>,
    by_name: HashMap<&'static str, usize>,
}

impl PropertyRegistry {
    /// Build a registry from an explicit descriptor list. Indices follow
    /// the list order.
    pub fn new(descriptors: Vec<PropertyDescriptor>) -> Self {
        let by_name = descriptors
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name, i))
            .collect();
        PropertyRegistry {
            descriptors,
            by_name,
        }
    }

    /// The registry covering the SVG styling properties.
    pub fn svg() -> Self {
        let descriptors = vec![
            PropertyDescriptor {
                name: "clip",
                inherited: false,
                initial: Value::ident("auto"),
                manager: ValueManager::Rect,
            },
            PropertyDescriptor {
                name: "color",
                inherited: true,
                initial: Value::rgb(0.0, 0.0, 0.0),
                manager: ValueManager::Color,
            },
            PropertyDescriptor {
                name: "display",
                inherited: false,
                initial: Value::ident("inline"),
                manager: ValueManager::Identifier {
                    keywords: &[
                        "inline",
                        "block",
                        "list-item",
                        "run-in",
                        "compact",
                        "marker",
                        "table",
                        "inline-table",
                        "table-row-group",
                        "table-header-group",
                        "table-footer-group",
                        "table-row",
                        "table-column-group",
                        "table-column",
                        "table-cell",
                        "table-caption",
                        "none",
                    ],
                },
            },
            PropertyDescriptor {
                name: "fill",
                inherited: true,
                initial: Value::rgb(0.0, 0.0, 0.0),
                manager: ValueManager::Paint,
            },
            PropertyDescriptor {
                name: "fill-opacity",
                inherited: true,
                initial: Value::number(1.0),
                manager: ValueManager::Opacity,
            },
            PropertyDescriptor {
                name: "font-family",
                inherited: true,
                initial: Value::List(Separator::Comma, vec![Value::ident("sans-serif")]),
                manager: ValueManager::FontFamily,
            },
            PropertyDescriptor {
                name: "font-size",
                inherited: true,
                initial: Value::ident("medium"),
                manager: ValueManager::FontSize,
            },
            PropertyDescriptor {
                name: "font-style",
                inherited: true,
                initial: Value::ident("normal"),
                manager: ValueManager::Identifier {
                    keywords: &["normal", "italic", "oblique"],
                },
            },
            PropertyDescriptor {
                name: "font-weight",
                inherited: true,
                initial: Value::ident("normal"),
                manager: ValueManager::FontWeight,
            },
            PropertyDescriptor {
                name: "line-height",
                inherited: true,
                initial: Value::ident("normal"),
                manager: ValueManager::LineHeight,
            },
            PropertyDescriptor {
                name: "marker-end",
                inherited: true,
                initial: Value::ident("none"),
                manager: ValueManager::Uri,
            },
            PropertyDescriptor {
                name: "marker-mid",
                inherited: true,
                initial: Value::ident("none"),
                manager: ValueManager::Uri,
            },
            PropertyDescriptor {
                name: "marker-start",
                inherited: true,
                initial: Value::ident("none"),
                manager: ValueManager::Uri,
            },
            PropertyDescriptor {
                name: "opacity",
                inherited: false,
                initial: Value::number(1.0),
                manager: ValueManager::Opacity,
            },
            PropertyDescriptor {
                name: "stroke",
                inherited: true,
                initial: Value::ident("none"),
                manager: ValueManager::Paint,
            },
            PropertyDescriptor {
                name: "stroke-linecap",
                inherited: true,
                initial: Value::ident("butt"),
                manager: ValueManager::Identifier {
                    keywords: &["butt", "round", "square"],
                },
            },
            PropertyDescriptor {
                name: "stroke-linejoin",
                inherited: true,
                initial: Value::ident("miter"),
                manager: ValueManager::Identifier {
                    keywords: &["miter", "round", "bevel"],
                },
            },
            PropertyDescriptor {
                name: "stroke-opacity",
                inherited: true,
                initial: Value::number(1.0),
                manager: ValueManager::Opacity,
            },
            PropertyDescriptor {
                name: "stroke-width",
                inherited: true,
                initial: Value::number(1.0),
                manager: ValueManager::Length {
                    orientation: Orientation::Both,
                },
            },
            PropertyDescriptor {
                name: "text-anchor",
                inherited: true,
                initial: Value::ident("start"),
                manager: ValueManager::Identifier {
                    keywords: &["start", "middle", "end"],
                },
            },
            PropertyDescriptor {
                name: "visibility",
                inherited: true,
                initial: Value::ident("visible"),
                manager: ValueManager::Identifier {
                    keywords: &["visible", "hidden", "collapse"],
                },
            },
        ];
        PropertyRegistry::new(descriptors)
    }

    /// The dense index of `name`, or [`Error::UnknownProperty`].
    pub fn index_of(&self, name: &str) -> Result<usize> {
        let lower = name.to_ascii_lowercase();
        self.by_name
            .get(lower.as_str())
            .copied()
            .ok_or_else(|| Error::UnknownProperty(lower))
    }

    pub fn descriptor(&self, index: usize) -> &PropertyDescriptor {
        &self.descriptors[index]
    }

    pub fn is_inherited(&self, index: usize) -> bool {
        self.descriptors[index].inherited
    }

    pub fn initial_value(&self, index: usize) -> &Value {
        &self.descriptors[index].initial
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// True if `name` is a shorthand this registry expands.
    pub fn is_shorthand(&self, name: &str) -> bool {
        matches!(name.to_ascii_lowercase().as_str(), "font" | "marker")
    }

    /// Expand a shorthand declaration into longhand `(index, Value)` pairs.
    ///
    /// Shorthands own no slot; they exist only at parse time and the
    /// expansion joins the cascade as ordinary declarations.
    pub fn parse_shorthand(
        &self,
        name: &str,
        input: &mut Parser<'_, '_>,
    ) -> Result<Vec<(usize, Value)>> {
        match name.to_ascii_lowercase().as_str() {
            "font" => self.parse_font_shorthand(input),
            "marker" => self.parse_marker_shorthand(input),
            other => Err(Error::UnknownProperty(other.to_string())),
        }
    }

    /// `marker: none | url(...)` sets all three marker longhands.
    fn parse_marker_shorthand(&self, input: &mut Parser<'_, '_>) -> Result<Vec<(usize, Value)>> {
        let value = ValueManager::Uri.parse("marker", input)?;
        Ok(["marker-start", "marker-mid", "marker-end"]
            .iter()
            .map(|n| (self.by_name[n], value.clone()))
            .collect())
    }

    /// `font: [style || weight]? size [/ line-height]? family`.
    ///
    /// Omitted components reset to their initial values, per the CSS2
    /// shorthand contract.
    fn parse_font_shorthand(&self, input: &mut Parser<'_, '_>) -> Result<Vec<(usize, Value)>> {
        let style_idx = self.by_name["font-style"];
        let weight_idx = self.by_name["font-weight"];
        let size_idx = self.by_name["font-size"];
        let line_height_idx = self.by_name["line-height"];
        let family_idx = self.by_name["font-family"];

        let mut style = None;
        let mut weight = None;

        // Leading style/weight keywords, any order. "normal" is ambiguous
        // and satisfies whichever component is still unset.
        loop {
            let ident = input.try_parse(|i| i.expect_ident_cloned());
            let Ok(ident) = ident else { break };
            let lower = ident.to_ascii_lowercase();
            match lower.as_str() {
                "italic" | "oblique" if style.is_none() => style = Some(Value::Ident(lower)),
                "bold" | "bolder" | "lighter" if weight.is_none() => {
                    weight = Some(Value::Ident(lower));
                }
                "normal" if style.is_none() => style = Some(Value::Ident(lower)),
                "normal" if weight.is_none() => weight = Some(Value::Ident(lower)),
                // Not a style/weight keyword; it must be the size keyword,
                // so hand it to the size parser by rewinding.
                _ => {
                    let size = parse_font_size_keyword(&lower)?;
                    return self.finish_font_shorthand(
                        input,
                        style,
                        weight,
                        size,
                        (style_idx, weight_idx, size_idx, line_height_idx, family_idx),
                    );
                }
            }
        }

        // Numeric weight sits between the keywords and the size. The
        // weight parser only accepts the nine multiples of 100, so a
        // dimension or keyword size token rewinds cleanly.
        if weight.is_none() {
            if let Ok(v) = input.try_parse(|i| {
                ValueManager::FontWeight
                    .parse("font", i)
                    .map_err(|_| i.new_custom_error::<(), ()>(()))
            }) {
                weight = Some(v);
            }
        }

        let size = ValueManager::FontSize.parse("font", input)?;
        self.finish_font_shorthand(
            input,
            style,
            weight,
            size,
            (style_idx, weight_idx, size_idx, line_height_idx, family_idx),
        )
    }

    fn finish_font_shorthand(
        &self,
        input: &mut Parser<'_, '_>,
        style: Option<Value>,
        weight: Option<Value>,
        size: Value,
        indices: (usize, usize, usize, usize, usize),
    ) -> Result<Vec<(usize, Value)>> {
        let (style_idx, weight_idx, size_idx, line_height_idx, family_idx) = indices;

        let line_height = if input.try_parse(|i| i.expect_delim('/')).is_ok() {
            ValueManager::LineHeight.parse("font", input)?
        } else {
            self.initial_value(line_height_idx).clone()
        };
        let family = ValueManager::FontFamily.parse("font", input)?;

        Ok(vec![
            (
                style_idx,
                style.unwrap_or_else(|| self.initial_value(style_idx).clone()),
            ),
            (
                weight_idx,
                weight.unwrap_or_else(|| self.initial_value(weight_idx).clone()),
            ),
            (size_idx, size),
            (line_height_idx, line_height),
            (family_idx, family),
        ])
    }
}

fn parse_font_size_keyword(lower: &str) -> Result<Value> {
    const KEYWORDS: &[&str] = &[
        "xx-small", "x-small", "small", "medium", "large", "x-large", "xx-large", "larger",
        "smaller",
    ];
    if KEYWORDS.contains(&lower) {
        Ok(Value::Ident(lower.to_string()))
    } else {
        Err(Error::syntax("font", format!("unexpected '{}'", lower)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{ToCss, Unit};

    fn expand(registry: &PropertyRegistry, name: &str, css: &str) -> Result<Vec<(usize, Value)>> {
        let mut input = cssparser::ParserInput::new(css);
        let mut parser = Parser::new(&mut input);
        registry.parse_shorthand(name, &mut parser)
    }

    #[test]
    fn test_registry_lookup() {
        let registry = PropertyRegistry::svg();
        let fill = registry.index_of("fill").unwrap();
        assert_eq!(registry.descriptor(fill).name, "fill");
        assert!(registry.is_inherited(fill));
        assert!(!registry.is_inherited(registry.index_of("opacity").unwrap()));
        assert_eq!(registry.index_of("FILL").unwrap(), fill);
        assert!(matches!(
            registry.index_of("bogus"),
            Err(Error::UnknownProperty(_))
        ));
    }

    #[test]
    fn test_indices_are_dense_and_named() {
        let registry = PropertyRegistry::svg();
        for i in 0..registry.len() {
            assert_eq!(registry.index_of(registry.descriptor(i).name).unwrap(), i);
        }
    }

    #[test]
    fn test_marker_shorthand() {
        let registry = PropertyRegistry::svg();
        let pairs = expand(&registry, "marker", "url(#arrow)").unwrap();
        assert_eq!(pairs.len(), 3);
        for (index, value) in &pairs {
            assert!(registry.descriptor(*index).name.starts_with("marker-"));
            assert_eq!(value, &Value::Uri("#arrow".into()));
        }
    }

    #[test]
    fn test_font_shorthand_full() {
        let registry = PropertyRegistry::svg();
        let pairs = expand(&registry, "font", "italic bold 12px/1.5 serif").unwrap();
        let get = |name: &str| {
            let idx = registry.index_of(name).unwrap();
            pairs.iter().find(|(i, _)| *i == idx).unwrap().1.clone()
        };
        assert_eq!(get("font-style"), Value::ident("italic"));
        assert_eq!(get("font-weight"), Value::ident("bold"));
        assert_eq!(get("font-size"), Value::Number(Unit::Px, 12.0));
        assert_eq!(get("line-height"), Value::number(1.5));
        assert_eq!(get("font-family").to_css_string(), "serif");
    }

    #[test]
    fn test_font_shorthand_resets_omitted() {
        let registry = PropertyRegistry::svg();
        let pairs = expand(&registry, "font", "10pt sans-serif").unwrap();
        let get = |name: &str| {
            let idx = registry.index_of(name).unwrap();
            pairs.iter().find(|(i, _)| *i == idx).unwrap().1.clone()
        };
        assert_eq!(get("font-style"), Value::ident("normal"));
        assert_eq!(get("font-weight"), Value::ident("normal"));
        assert_eq!(get("line-height"), Value::ident("normal"));
    }

    #[test]
    fn test_font_shorthand_size_keyword() {
        let registry = PropertyRegistry::svg();
        let pairs = expand(&registry, "font", "medium monospace").unwrap();
        let size_idx = registry.index_of("font-size").unwrap();
        let size = &pairs.iter().find(|(i, _)| *i == size_idx).unwrap().1;
        assert_eq!(size, &Value::ident("medium"));
    }

    #[test]
    fn test_font_shorthand_requires_family() {
        let registry = PropertyRegistry::svg();
        assert!(expand(&registry, "font", "12px").is_err());
    }
}
