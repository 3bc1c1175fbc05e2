//! Per-property value managers.
//!
//! A manager describes how one property's values are parsed from CSS syntax
//! and which context its computation consults. Managers are a tagged variant
//! dispatched by explicit match; the computation half lives in the engine,
//! which owns the recursion needed for font-size and parent lookups.

use cssparser::{Parser, Token};

use super::compute::Orientation;
use super::{RectValue, RgbColor, Separator, Unit, Value};
use crate::error::{Error, Result};

/// Parsing/computation behavior for one registered property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueManager {
    /// A fixed keyword set; anything else is a syntax error.
    Identifier { keywords: &'static [&'static str] },
    /// A unit-aware length, percentages resolved by orientation.
    Length { orientation: Orientation },
    /// `font-size`: lengths plus the absolute/relative size keywords;
    /// em/ex and percentages resolve against the parent font size.
    FontSize,
    /// `font-weight`: 100-900, `normal`/`bold`, and the parent-relative
    /// `bolder`/`lighter` keywords.
    FontWeight,
    /// A color: named, `#hex`, or `rgb()`.
    Color,
    /// A paint server reference: `none`, `currentColor`, color, or URI.
    Paint,
    /// A `rect(top, right, bottom, left)` value, or `auto`.
    Rect,
    /// A number clamped to [0, 1] at computation time.
    Opacity,
    /// `none` or a `url(...)` reference.
    Uri,
    /// A comma-separated font family list.
    FontFamily,
    /// `line-height`: `normal`, a bare multiplier, or a length.
    LineHeight,
}

impl ValueManager {
    /// Parse one declaration value for `property`.
    ///
    /// All managers accept the `inherit` keyword. A failed parse yields a
    /// [`Error::Syntax`] naming the property and the offending token; the
    /// caller decides whether to skip the declaration or abort.
    pub fn parse(&self, property: &str, input: &mut Parser<'_, '_>) -> Result<Value> {
        if input
            .try_parse(|i| i.expect_ident_matching("inherit"))
            .is_ok()
        {
            return Ok(Value::Inherit);
        }
        match self {
            ValueManager::Identifier { keywords } => parse_keyword(property, input, keywords),
            ValueManager::Length { .. } => parse_number_like(property, input),
            ValueManager::FontSize => parse_font_size(property, input),
            ValueManager::FontWeight => parse_font_weight(property, input),
            ValueManager::Color => parse_color(property, input),
            ValueManager::Paint => parse_paint(property, input),
            ValueManager::Rect => parse_rect(property, input),
            ValueManager::Opacity => parse_opacity(property, input),
            ValueManager::Uri => parse_uri(property, input),
            ValueManager::FontFamily => parse_font_family(property, input),
            ValueManager::LineHeight => parse_line_height(property, input),
        }
    }

    /// The percentage orientation this manager resolves against.
    pub(crate) fn orientation(&self) -> Orientation {
        match self {
            ValueManager::Length { orientation } => *orientation,
            _ => Orientation::Both,
        }
    }
}

fn bad_token(property: &str, token: &Token<'_>) -> Error {
    let text = cssparser::ToCss::to_css_string(token);
    Error::syntax(property, format!("unexpected token '{}'", text))
}

fn premature_end(property: &str) -> Error {
    Error::syntax(property, "unexpected end of value")
}

/// Parse a number, dimension, or percentage into a `Value::Number`.
fn parse_number_like(property: &str, input: &mut Parser<'_, '_>) -> Result<Value> {
    let token = match input.next() {
        Ok(t) => t.clone(),
        Err(_) => return Err(premature_end(property)),
    };
    match token {
        Token::Number { value, .. } => Ok(Value::number(value)),
        Token::Percentage { unit_value, .. } => {
            Ok(Value::Number(Unit::Percent, unit_value * 100.0))
        }
        Token::Dimension {
            value, ref unit, ..
        } => match Unit::from_suffix(unit.as_ref()) {
            Some(u) => Ok(Value::Number(u, value)),
            None => Err(Error::syntax(
                property,
                format!("unknown unit '{}'", unit.as_ref()),
            )),
        },
        ref t => Err(bad_token(property, t)),
    }
}

fn parse_keyword(
    property: &str,
    input: &mut Parser<'_, '_>,
    keywords: &[&'static str],
) -> Result<Value> {
    let token = match input.next() {
        Ok(t) => t.clone(),
        Err(_) => return Err(premature_end(property)),
    };
    if let Token::Ident(ref s) = token {
        let lower = s.to_ascii_lowercase();
        if let Some(k) = keywords.iter().find(|k| **k == lower) {
            return Ok(Value::Ident((*k).to_string()));
        }
        return Err(Error::syntax(
            property,
            format!("invalid identifier '{}'", lower),
        ));
    }
    Err(bad_token(property, &token))
}

const FONT_SIZE_KEYWORDS: &[&str] = &[
    "xx-small", "x-small", "small", "medium", "large", "x-large", "xx-large", "larger", "smaller",
];

fn parse_font_size(property: &str, input: &mut Parser<'_, '_>) -> Result<Value> {
    if let Ok(ident) = input.try_parse(|i| i.expect_ident_cloned()) {
        let lower = ident.to_ascii_lowercase();
        if FONT_SIZE_KEYWORDS.contains(&lower.as_str()) {
            return Ok(Value::Ident(lower));
        }
        return Err(Error::syntax(
            property,
            format!("invalid identifier '{}'", lower),
        ));
    }
    parse_number_like(property, input)
}

fn parse_font_weight(property: &str, input: &mut Parser<'_, '_>) -> Result<Value> {
    if let Ok(ident) = input.try_parse(|i| i.expect_ident_cloned()) {
        let lower = ident.to_ascii_lowercase();
        return match lower.as_str() {
            "normal" | "bold" | "bolder" | "lighter" => Ok(Value::Ident(lower)),
            _ => Err(Error::syntax(
                property,
                format!("invalid identifier '{}'", lower),
            )),
        };
    }
    let token = match input.next() {
        Ok(t) => t.clone(),
        Err(_) => return Err(premature_end(property)),
    };
    if let Token::Number {
        int_value: Some(v), ..
    } = token
    {
        if (100..=900).contains(&v) && v % 100 == 0 {
            return Ok(Value::number(v as f32));
        }
        return Err(Error::syntax(property, format!("invalid weight {}", v)));
    }
    Err(bad_token(property, &token))
}

fn parse_opacity(property: &str, input: &mut Parser<'_, '_>) -> Result<Value> {
    let token = match input.next() {
        Ok(t) => t.clone(),
        Err(_) => return Err(premature_end(property)),
    };
    match token {
        Token::Number { value, .. } => Ok(Value::number(value)),
        Token::Percentage { unit_value, .. } => {
            Ok(Value::Number(Unit::Percent, unit_value * 100.0))
        }
        ref t => Err(bad_token(property, t)),
    }
}

fn parse_line_height(property: &str, input: &mut Parser<'_, '_>) -> Result<Value> {
    if input
        .try_parse(|i| i.expect_ident_matching("normal"))
        .is_ok()
    {
        return Ok(Value::ident("normal"));
    }
    parse_number_like(property, input)
}

// The CSS2 named colors plus the handful of SVG names that show up in
// practice. Everything else is resolved as a system color at compute time.
const NAMED_COLORS: &[(&str, [f32; 3])] = &[
    ("aqua", [0.0, 255.0, 255.0]),
    ("black", [0.0, 0.0, 0.0]),
    ("blue", [0.0, 0.0, 255.0]),
    ("cyan", [0.0, 255.0, 255.0]),
    ("fuchsia", [255.0, 0.0, 255.0]),
    ("gray", [128.0, 128.0, 128.0]),
    ("green", [0.0, 128.0, 0.0]),
    ("grey", [128.0, 128.0, 128.0]),
    ("lime", [0.0, 255.0, 0.0]),
    ("magenta", [255.0, 0.0, 255.0]),
    ("maroon", [128.0, 0.0, 0.0]),
    ("navy", [0.0, 0.0, 128.0]),
    ("olive", [128.0, 128.0, 0.0]),
    ("orange", [255.0, 165.0, 0.0]),
    ("purple", [128.0, 0.0, 128.0]),
    ("red", [255.0, 0.0, 0.0]),
    ("silver", [192.0, 192.0, 192.0]),
    ("teal", [0.0, 128.0, 128.0]),
    ("white", [255.0, 255.0, 255.0]),
    ("yellow", [255.0, 255.0, 0.0]),
];

pub(crate) fn named_color(name: &str) -> Option<Value> {
    NAMED_COLORS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, [r, g, b])| Value::rgb(*r, *g, *b))
}

fn parse_color(property: &str, input: &mut Parser<'_, '_>) -> Result<Value> {
    if let Ok(ident) = input.try_parse(|i| i.expect_ident_cloned()) {
        let lower = ident.to_ascii_lowercase();
        if let Some(color) = named_color(&lower) {
            return Ok(color);
        }
        // Unrecognized identifiers are kept for system-color resolution.
        return Ok(Value::Ident(lower));
    }

    // Hex colors arrive as hash tokens; check the variant inside try_parse
    // so the position resets when it is something else.
    if let Ok(hash) = input.try_parse(|i| -> std::result::Result<_, cssparser::ParseError<'_, ()>> {
        match i.next()? {
            Token::IDHash(h) | Token::Hash(h) => Ok(h.clone()),
            _ => Err(i.new_custom_error(())),
        }
    }) {
        return parse_hex_color(property, hash.as_ref());
    }

    parse_rgb_function(property, input)
}

fn parse_hex_color(property: &str, hex: &str) -> Result<Value> {
    // Hash tokens carry arbitrary ident names; the byte slicing below is
    // only valid for ASCII, and nothing else can be a hex digit anyway.
    if !hex.is_ascii() {
        return Err(Error::syntax(property, format!("invalid color '#{}'", hex)));
    }
    let component = |s: &str| u8::from_str_radix(s, 16).ok();
    let rgb = match hex.len() {
        3 => {
            let r = component(&hex[0..1]).map(|v| v * 17);
            let g = component(&hex[1..2]).map(|v| v * 17);
            let b = component(&hex[2..3]).map(|v| v * 17);
            r.zip(g).zip(b)
        }
        6 => {
            let r = component(&hex[0..2]);
            let g = component(&hex[2..4]);
            let b = component(&hex[4..6]);
            r.zip(g).zip(b)
        }
        _ => None,
    };
    match rgb {
        Some(((r, g), b)) => Ok(Value::rgb(f32::from(r), f32::from(g), f32::from(b))),
        None => Err(Error::syntax(property, format!("invalid color '#{}'", hex))),
    }
}

fn parse_rgb_function(property: &str, input: &mut Parser<'_, '_>) -> Result<Value> {
    if input
        .try_parse(|i| i.expect_function_matching("rgb"))
        .is_err()
    {
        return Err(Error::syntax(property, "expected color"));
    }
    // A malformed rgb() argument list is structurally broken, not a value
    // typo, so the error is surfaced instead of a silent skip.
    let components = parse_comma_separated_numbers(property, input)?;
    if components.len() != 3 {
        return Err(Error::syntax(
            property,
            format!("rgb() takes 3 arguments, got {}", components.len()),
        ));
    }
    let mut it = components.into_iter();
    Ok(Value::Rgb(Box::new(RgbColor {
        red: it.next().unwrap(),
        green: it.next().unwrap(),
        blue: it.next().unwrap(),
    })))
}

/// Collect the comma-separated number/percentage arguments of the current
/// function token.
fn parse_comma_separated_numbers(
    property: &str,
    input: &mut Parser<'_, '_>,
) -> Result<Vec<Value>> {
    let property = property.to_string();
    input
        .parse_nested_block(|nested| -> std::result::Result<_, cssparser::ParseError<'_, Error>> {
            let mut components = Vec::new();
            loop {
                let location = nested.current_source_location();
                match nested.next() {
                    Ok(Token::Number { value, .. }) => components.push(Value::number(*value)),
                    Ok(Token::Percentage { unit_value, .. }) => {
                        components.push(Value::Number(Unit::Percent, unit_value * 100.0));
                    }
                    Ok(t) => {
                        let err = bad_token(&property, t);
                        return Err(location.new_custom_error(err));
                    }
                    Err(_) => break,
                }
                if nested.try_parse(|i| i.expect_comma()).is_err() {
                    break;
                }
            }
            Ok(components)
        })
        .map_err(|e| match e.kind {
            cssparser::ParseErrorKind::Custom(err) => err,
            _ => Error::syntax(&property, "malformed argument list"),
        })
}

fn parse_paint(property: &str, input: &mut Parser<'_, '_>) -> Result<Value> {
    if let Ok(url) = input.try_parse(|i| i.expect_url()) {
        return Ok(Value::Uri(url.as_ref().to_string()));
    }
    if let Ok(ident) = input.try_parse(|i| i.expect_ident_cloned()) {
        let lower = ident.to_ascii_lowercase();
        if lower == "none" || lower == "currentcolor" {
            return Ok(Value::Ident(lower));
        }
        if let Some(color) = named_color(&lower) {
            return Ok(color);
        }
        return Ok(Value::Ident(lower));
    }
    parse_color(property, input)
}

fn parse_uri(property: &str, input: &mut Parser<'_, '_>) -> Result<Value> {
    if input.try_parse(|i| i.expect_ident_matching("none")).is_ok() {
        return Ok(Value::ident("none"));
    }
    match input.try_parse(|i| i.expect_url()) {
        Ok(url) => Ok(Value::Uri(url.as_ref().to_string())),
        Err(_) => Err(Error::syntax(property, "expected 'none' or url()")),
    }
}

fn parse_rect(property: &str, input: &mut Parser<'_, '_>) -> Result<Value> {
    if input.try_parse(|i| i.expect_ident_matching("auto")).is_ok() {
        return Ok(Value::ident("auto"));
    }
    if input
        .try_parse(|i| i.expect_function_matching("rect"))
        .is_err()
    {
        return Err(Error::syntax(property, "expected 'auto' or rect()"));
    }
    let property_owned = property.to_string();
    let edges = input
        .parse_nested_block(|nested| -> std::result::Result<_, cssparser::ParseError<'_, Error>> {
            let mut edges = Vec::new();
            loop {
                if nested.is_exhausted() {
                    break;
                }
                let location = nested.current_source_location();
                let edge = if nested
                    .try_parse(|i| i.expect_ident_matching("auto"))
                    .is_ok()
                {
                    Value::ident("auto")
                } else {
                    parse_number_like(&property_owned, nested)
                        .map_err(|err| location.new_custom_error(err))?
                };
                edges.push(edge);
                if nested.try_parse(|i| i.expect_comma()).is_err() {
                    break;
                }
            }
            Ok(edges)
        })
        .map_err(|e| match e.kind {
            cssparser::ParseErrorKind::Custom(err) => err,
            _ => Error::syntax(property, "malformed rect()"),
        })?;
    // Exactly four edges, or the whole declaration is rejected.
    if edges.len() != 4 {
        return Err(Error::syntax(
            property,
            format!("rect() takes 4 components, got {}", edges.len()),
        ));
    }
    let mut it = edges.into_iter();
    Ok(Value::Rect(Box::new(RectValue {
        top: it.next().unwrap(),
        right: it.next().unwrap(),
        bottom: it.next().unwrap(),
        left: it.next().unwrap(),
    })))
}

fn parse_font_family(property: &str, input: &mut Parser<'_, '_>) -> Result<Value> {
    let mut families = Vec::new();
    loop {
        if let Ok(s) = input.try_parse(|i| i.expect_string_cloned()) {
            families.push(Value::StringLit(s.as_ref().to_string()));
        } else if let Ok(first) = input.try_parse(|i| i.expect_ident_cloned()) {
            // Unquoted names may span several identifiers.
            let mut name = first.as_ref().to_string();
            while let Ok(next) = input.try_parse(|i| i.expect_ident_cloned()) {
                name.push(' ');
                name.push_str(next.as_ref());
            }
            families.push(Value::Ident(name));
        } else {
            break;
        }
        if input.try_parse(|i| i.expect_comma()).is_err() {
            break;
        }
    }
    if families.is_empty() {
        return Err(Error::syntax(property, "expected font family list"));
    }
    Ok(Value::List(Separator::Comma, families))
}
