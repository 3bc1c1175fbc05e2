//! Typed, immutable CSS property values.
//!
//! A [`Value`] is a tagged variant over the primitive and composite value
//! forms the cascade works with. Values never change after construction;
//! computation always produces a new `Value`.

pub mod compute;
pub mod manager;

use std::fmt::Write;

use crate::error::{Error, Result};

pub use compute::Orientation;
pub use manager::ValueManager;

/// Serialization to canonical CSS text.
pub trait ToCss {
    /// Write this value as CSS to the buffer.
    fn to_css(&self, buf: &mut String);

    /// Convert to a CSS string (convenience method).
    fn to_css_string(&self) -> String {
        let mut buf = String::new();
        self.to_css(&mut buf);
        buf
    }
}

/// CSS unit for numeric values.
///
/// `None` is the unitless number, which is also the result type of all unit
/// computation: a computed length is a plain number of user-space pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    None,
    Percent,
    Px,
    Cm,
    Mm,
    In,
    Pt,
    Pc,
    Em,
    Ex,
    Deg,
    Rad,
    Grad,
    S,
    Ms,
    Hz,
    KHz,
}

impl Unit {
    /// The canonical suffix for this unit.
    pub fn as_str(self) -> &'static str {
        match self {
            Unit::None => "",
            Unit::Percent => "%",
            Unit::Px => "px",
            Unit::Cm => "cm",
            Unit::Mm => "mm",
            Unit::In => "in",
            Unit::Pt => "pt",
            Unit::Pc => "pc",
            Unit::Em => "em",
            Unit::Ex => "ex",
            Unit::Deg => "deg",
            Unit::Rad => "rad",
            Unit::Grad => "grad",
            Unit::S => "s",
            Unit::Ms => "ms",
            Unit::Hz => "hz",
            Unit::KHz => "khz",
        }
    }

    /// Parse a dimension suffix as written in a stylesheet.
    pub fn from_suffix(s: &str) -> Option<Self> {
        Some(match s.to_ascii_lowercase().as_str() {
            "%" => Unit::Percent,
            "px" => Unit::Px,
            "cm" => Unit::Cm,
            "mm" => Unit::Mm,
            "in" => Unit::In,
            "pt" => Unit::Pt,
            "pc" => Unit::Pc,
            "em" => Unit::Em,
            "ex" => Unit::Ex,
            "deg" => Unit::Deg,
            "rad" => Unit::Rad,
            "grad" => Unit::Grad,
            "s" => Unit::S,
            "ms" => Unit::Ms,
            "hz" => Unit::Hz,
            "khz" => Unit::KHz,
            _ => return None,
        })
    }

    /// True for units already expressed in user-space pixels.
    pub fn is_computed(self) -> bool {
        matches!(self, Unit::None | Unit::Px)
    }
}

/// An RGB color with immutable component values.
///
/// Components are `Number` values, either unitless (0-255) or percentages.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbColor {
    pub red: Value,
    pub green: Value,
    pub blue: Value,
}

/// A `rect()` value with immutable edge components.
#[derive(Debug, Clone, PartialEq)]
pub struct RectValue {
    pub top: Value,
    pub right: Value,
    pub bottom: Value,
    pub left: Value,
}

/// Separator of a list value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    Comma,
    Space,
}

/// A CSS property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A number with a unit (`Unit::None` for plain numbers).
    Number(Unit, f32),
    /// An identifier keyword, lowercased at parse time.
    Ident(String),
    /// A quoted string.
    StringLit(String),
    /// A `url(...)` reference.
    Uri(String),
    /// An `rgb(...)` color.
    Rgb(Box<RgbColor>),
    /// A `rect(...)` value.
    Rect(Box<RectValue>),
    /// An ordered list of values.
    List(Separator, Vec<Value>),
    /// The `inherit` sentinel: use the ancestor's computed value.
    Inherit,
}

impl Value {
    /// A unitless number.
    pub fn number(v: f32) -> Self {
        Value::Number(Unit::None, v)
    }

    /// An identifier value. Identifiers are stored lowercased.
    pub fn ident(s: &str) -> Self {
        Value::Ident(s.to_ascii_lowercase())
    }

    /// An opaque RGB color from 0-255 components.
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Value::Rgb(Box::new(RgbColor {
            red: Value::number(r),
            green: Value::number(g),
            blue: Value::number(b),
        }))
    }

    fn variant_name(&self) -> &'static str {
        match self {
            Value::Number(..) => "number",
            Value::Ident(_) => "identifier",
            Value::StringLit(_) => "string",
            Value::Uri(_) => "uri",
            Value::Rgb(_) => "color",
            Value::Rect(_) => "rect",
            Value::List(..) => "list",
            Value::Inherit => "inherit",
        }
    }

    /// The unit of a numeric value, or an error for other variants.
    pub fn unit(&self) -> Result<Unit> {
        match self {
            Value::Number(unit, _) => Ok(*unit),
            other => Err(Error::UnsupportedConversion {
                expected: "number",
                actual: other.variant_name(),
            }),
        }
    }

    /// The float of a numeric value, or an error for other variants.
    pub fn as_float(&self) -> Result<f32> {
        match self {
            Value::Number(_, v) => Ok(*v),
            other => Err(Error::UnsupportedConversion {
                expected: "number",
                actual: other.variant_name(),
            }),
        }
    }

    /// The text of an identifier value.
    pub fn as_ident(&self) -> Result<&str> {
        match self {
            Value::Ident(s) => Ok(s),
            other => Err(Error::UnsupportedConversion {
                expected: "identifier",
                actual: other.variant_name(),
            }),
        }
    }

    /// The target of a URI value.
    pub fn as_uri(&self) -> Result<&str> {
        match self {
            Value::Uri(s) => Ok(s),
            other => Err(Error::UnsupportedConversion {
                expected: "uri",
                actual: other.variant_name(),
            }),
        }
    }

    /// The components of a color value.
    pub fn as_rgb(&self) -> Result<&RgbColor> {
        match self {
            Value::Rgb(c) => Ok(c),
            other => Err(Error::UnsupportedConversion {
                expected: "color",
                actual: other.variant_name(),
            }),
        }
    }

    /// The components of a rect value.
    pub fn as_rect(&self) -> Result<&RectValue> {
        match self {
            Value::Rect(r) => Ok(r),
            other => Err(Error::UnsupportedConversion {
                expected: "rect",
                actual: other.variant_name(),
            }),
        }
    }

    /// True if this value is an identifier equal to `keyword`.
    pub fn is_ident(&self, keyword: &str) -> bool {
        matches!(self, Value::Ident(s) if s == keyword)
    }
}

impl ToCss for Value {
    fn to_css(&self, buf: &mut String) {
        match self {
            Value::Number(unit, v) => {
                write!(buf, "{}{}", v, unit.as_str()).unwrap();
            }
            Value::Ident(s) => buf.push_str(s),
            Value::StringLit(s) => {
                buf.push('\'');
                buf.push_str(s);
                buf.push('\'');
            }
            Value::Uri(s) => {
                buf.push_str("url(");
                buf.push_str(s);
                buf.push(')');
            }
            Value::Rgb(c) => {
                buf.push_str("rgb(");
                c.red.to_css(buf);
                buf.push_str(", ");
                c.green.to_css(buf);
                buf.push_str(", ");
                c.blue.to_css(buf);
                buf.push(')');
            }
            Value::Rect(r) => {
                buf.push_str("rect(");
                r.top.to_css(buf);
                buf.push_str(", ");
                r.right.to_css(buf);
                buf.push_str(", ");
                r.bottom.to_css(buf);
                buf.push_str(", ");
                r.left.to_css(buf);
                buf.push(')');
            }
            Value::List(sep, items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        buf.push_str(match sep {
                            Separator::Comma => ", ",
                            Separator::Space => " ",
                        });
                    }
                    item.to_css(buf);
                }
            }
            Value::Inherit => buf.push_str("inherit"),
        }
    }
}
