//! Stylesheet model and CSS parsing.
//!
//! Parsing is lenient per CSS error handling: a malformed declaration or
//! rule is logged and skipped while the rest of the sheet survives. Rules
//! keep their source order; the cascade depends on it.

use cssparser::{
    AtRuleParser, ParseError, Parser, ParserInput, QualifiedRuleParser, RuleBodyItemParser,
    RuleBodyParser, StyleSheetParser,
};
use selectors::parser::Selector;

use crate::declaration::StyleDeclaration;
use crate::error::{Error, Result};
use crate::property::PropertyRegistry;
use crate::selector::SvgSelectors;
use crate::value::Value;

/// Cascade origin of a stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Origin {
    UserAgent = 0,
    User = 1,
    Author = 2,
}

/// A selector list with one declaration block.
#[derive(Debug, Clone)]
pub struct StyleRule {
    pub selectors: Vec<Selector<SvgSelectors>>,
    pub declarations: StyleDeclaration,
}

/// An `@media` block. Applies when the medium name matches.
#[derive(Debug, Clone)]
pub struct MediaRule {
    pub media: Vec<String>,
    pub rules: Vec<Rule>,
}

/// An `@import` reference. The engine resolves and loads the target;
/// this rule only records it.
#[derive(Debug, Clone)]
pub struct ImportRule {
    pub uri: String,
    pub media: Vec<String>,
}

/// An `@font-face` block, kept as raw descriptor pairs since its
/// descriptors are not registry properties.
#[derive(Debug, Clone, Default)]
pub struct FontFaceRule {
    pub descriptors: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub enum Rule {
    Style(StyleRule),
    Media(MediaRule),
    Import(ImportRule),
    FontFace(FontFaceRule),
}

/// A parsed stylesheet.
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    pub rules: Vec<Rule>,
    /// Media list from the sheet's own context (e.g. the owner element's
    /// `media` attribute or the importing rule). Empty means all media.
    pub media: Vec<String>,
    pub title: Option<String>,
    pub alternate: bool,
    /// Index of the importing sheet within the engine's per-origin list,
    /// for sheets loaded through `@import`. Non-owning.
    pub parent: Option<usize>,
}

impl StyleSheet {
    /// Parse a stylesheet. Unparseable rules are skipped.
    pub fn parse(registry: &PropertyRegistry, css: &str) -> Self {
        let mut input = ParserInput::new(css);
        let mut parser = Parser::new(&mut input);
        let mut rules = Vec::new();

        let mut rule_parser = TopLevelRuleParser {
            registry,
            rules: &mut rules,
        };
        for result in StyleSheetParser::new(&mut parser, &mut rule_parser) {
            if let Err((error, text)) = result {
                log::warn!("skipping rule '{}': {:?}", text.trim(), error.kind);
            }
        }

        StyleSheet {
            rules,
            ..StyleSheet::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// All `@import` references, in source order, including those nested
    /// under matching `@media` blocks.
    pub fn imports(&self, medium: &str) -> Vec<&ImportRule> {
        fn walk<'a>(rules: &'a [Rule], medium: &str, out: &mut Vec<&'a ImportRule>) {
            for rule in rules {
                match rule {
                    Rule::Import(import) if media_matches(&import.media, medium) => {
                        out.push(import);
                    }
                    Rule::Media(media) if media_matches(&media.media, medium) => {
                        walk(&media.rules, medium, out);
                    }
                    _ => {}
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.rules, medium, &mut out);
        out
    }
}

/// Whether a media list applies to `medium`. An empty list and the `all`
/// medium always apply.
pub fn media_matches(media: &[String], medium: &str) -> bool {
    media.is_empty()
        || media
            .iter()
            .any(|m| m.eq_ignore_ascii_case("all") || m.eq_ignore_ascii_case(medium))
}

/// Parse the body of an inline `style` attribute.
pub fn parse_style_attribute(registry: &PropertyRegistry, css: &str) -> StyleDeclaration {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut declarations = StyleDeclaration::new();
    let mut decl_parser = DeclarationListParser {
        registry,
        declarations: &mut declarations,
    };
    for result in RuleBodyParser::new(&mut parser, &mut decl_parser) {
        if let Err((error, text)) = result {
            log::warn!("skipping declaration '{}': {:?}", text.trim(), error.kind);
        }
    }
    declarations
}

/// Parse a single property value as written in a presentation attribute.
pub fn parse_property_value(registry: &PropertyRegistry, name: &str, text: &str) -> Result<Value> {
    let index = registry.index_of(name)?;
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    let value = registry.descriptor(index).manager.parse(name, &mut parser)?;
    if parser.expect_exhausted().is_err() {
        return Err(Error::syntax(name, "trailing tokens"));
    }
    Ok(value)
}

struct TopLevelRuleParser<'a> {
    registry: &'a PropertyRegistry,
    rules: &'a mut Vec<Rule>,
}

enum AtRulePrelude {
    Media(Vec<String>),
    Import(String, Vec<String>),
    FontFace,
}

impl<'i> AtRuleParser<'i> for TopLevelRuleParser<'_> {
    type Prelude = AtRulePrelude;
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        name: cssparser::CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> std::result::Result<Self::Prelude, ParseError<'i, Self::Error>> {
        parse_at_rule_prelude(&name, input)
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &cssparser::ParserState,
        input: &mut Parser<'i, 't>,
    ) -> std::result::Result<Self::AtRule, ParseError<'i, Self::Error>> {
        if let Some(rule) = parse_at_rule_block(self.registry, prelude, input)? {
            self.rules.push(rule);
        }
        Ok(())
    }

    fn rule_without_block(
        &mut self,
        prelude: Self::Prelude,
        _start: &cssparser::ParserState,
    ) -> std::result::Result<Self::AtRule, ()> {
        match prelude {
            AtRulePrelude::Import(uri, media) => {
                self.rules.push(Rule::Import(ImportRule { uri, media }));
                Ok(())
            }
            _ => Err(()),
        }
    }
}

impl<'i> QualifiedRuleParser<'i> for TopLevelRuleParser<'_> {
    type Prelude = Vec<Selector<SvgSelectors>>;
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> std::result::Result<Self::Prelude, ParseError<'i, Self::Error>> {
        parse_selector_list(input)
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &cssparser::ParserState,
        input: &mut Parser<'i, 't>,
    ) -> std::result::Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        self.rules
            .push(parse_style_rule_block(self.registry, prelude, input));
        Ok(())
    }
}

/// Rule parser for the inside of an `@media` block. Same grammar as the
/// top level minus `@import`.
struct NestedRuleParser<'a> {
    registry: &'a PropertyRegistry,
    rules: &'a mut Vec<Rule>,
}

impl<'i> AtRuleParser<'i> for NestedRuleParser<'_> {
    type Prelude = AtRulePrelude;
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        name: cssparser::CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> std::result::Result<Self::Prelude, ParseError<'i, Self::Error>> {
        if name.eq_ignore_ascii_case("import") {
            return Err(input.new_custom_error(()));
        }
        parse_at_rule_prelude(&name, input)
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &cssparser::ParserState,
        input: &mut Parser<'i, 't>,
    ) -> std::result::Result<Self::AtRule, ParseError<'i, Self::Error>> {
        if let Some(rule) = parse_at_rule_block(self.registry, prelude, input)? {
            self.rules.push(rule);
        }
        Ok(())
    }
}

impl<'i> QualifiedRuleParser<'i> for NestedRuleParser<'_> {
    type Prelude = Vec<Selector<SvgSelectors>>;
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> std::result::Result<Self::Prelude, ParseError<'i, Self::Error>> {
        parse_selector_list(input)
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &cssparser::ParserState,
        input: &mut Parser<'i, 't>,
    ) -> std::result::Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        self.rules
            .push(parse_style_rule_block(self.registry, prelude, input));
        Ok(())
    }
}

impl<'i> cssparser::DeclarationParser<'i> for NestedRuleParser<'_> {
    type Declaration = ();
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        _name: cssparser::CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _start: &cssparser::ParserState,
    ) -> std::result::Result<Self::Declaration, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> RuleBodyItemParser<'i, (), ()> for NestedRuleParser<'_> {
    fn parse_declarations(&self) -> bool {
        false
    }
    fn parse_qualified(&self) -> bool {
        true
    }
}

fn parse_at_rule_prelude<'i>(
    name: &str,
    input: &mut Parser<'i, '_>,
) -> std::result::Result<AtRulePrelude, ParseError<'i, ()>> {
    if name.eq_ignore_ascii_case("media") {
        return Ok(AtRulePrelude::Media(parse_media_list(input)));
    }
    if name.eq_ignore_ascii_case("import") {
        let uri = input
            .try_parse(|i| i.expect_url_or_string())
            .map_err(|_| input.new_custom_error(()))?
            .as_ref()
            .to_string();
        return Ok(AtRulePrelude::Import(uri, parse_media_list(input)));
    }
    if name.eq_ignore_ascii_case("font-face") {
        return Ok(AtRulePrelude::FontFace);
    }
    // Unknown at-rules are skipped by the caller's recovery.
    Err(input.new_custom_error(()))
}

fn parse_at_rule_block<'i>(
    registry: &PropertyRegistry,
    prelude: AtRulePrelude,
    input: &mut Parser<'i, '_>,
) -> std::result::Result<Option<Rule>, ParseError<'i, ()>> {
    match prelude {
        AtRulePrelude::Media(media) => {
            let mut rules = Vec::new();
            let mut nested = NestedRuleParser {
                registry,
                rules: &mut rules,
            };
            for result in RuleBodyParser::new(input, &mut nested) {
                if let Err((error, text)) = result {
                    log::warn!("skipping rule '{}': {:?}", text.trim(), error.kind);
                }
            }
            Ok(Some(Rule::Media(MediaRule { media, rules })))
        }
        AtRulePrelude::FontFace => Ok(Some(Rule::FontFace(parse_font_face_block(input)))),
        // @import takes no block.
        AtRulePrelude::Import(..) => Err(input.new_custom_error(())),
    }
}

/// Parse a comma-separated medium name list, e.g. `screen, print`.
fn parse_media_list(input: &mut Parser<'_, '_>) -> Vec<String> {
    let mut media = Vec::new();
    while let Ok(name) = input.try_parse(|i| i.expect_ident_cloned()) {
        media.push(name.to_ascii_lowercase());
        if input.try_parse(|i| i.expect_comma()).is_err() {
            break;
        }
    }
    media
}

fn parse_selector_list<'i>(
    parser: &mut Parser<'i, '_>,
) -> std::result::Result<Vec<Selector<SvgSelectors>>, ParseError<'i, ()>> {
    let location = parser.current_source_location();
    let selectors = selectors::parser::SelectorList::parse(
        &SvgSelectors,
        parser,
        selectors::parser::ParseRelative::No,
    )
    .map_err(|_| location.new_custom_error(()))?;
    Ok(selectors.slice().to_vec())
}

fn parse_style_rule_block(
    registry: &PropertyRegistry,
    selectors: Vec<Selector<SvgSelectors>>,
    input: &mut Parser<'_, '_>,
) -> Rule {
    let mut declarations = StyleDeclaration::new();
    let mut decl_parser = DeclarationListParser {
        registry,
        declarations: &mut declarations,
    };
    for result in RuleBodyParser::new(input, &mut decl_parser) {
        if let Err((error, text)) = result {
            log::warn!("skipping declaration '{}': {:?}", text.trim(), error.kind);
        }
    }
    Rule::Style(StyleRule {
        selectors,
        declarations,
    })
}

/// Collect `@font-face` descriptors as raw name/value text.
fn parse_font_face_block(input: &mut Parser<'_, '_>) -> FontFaceRule {
    let mut rule = FontFaceRule::default();
    let mut parser = FontFaceDeclarationParser {
        descriptors: &mut rule.descriptors,
    };
    for result in RuleBodyParser::new(input, &mut parser) {
        let _ = result;
    }
    rule
}

struct FontFaceDeclarationParser<'a> {
    descriptors: &'a mut Vec<(String, String)>,
}

impl<'i> cssparser::DeclarationParser<'i> for FontFaceDeclarationParser<'_> {
    type Declaration = ();
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: cssparser::CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _start: &cssparser::ParserState,
    ) -> std::result::Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let start = input.position();
        while input.next().is_ok() {}
        let text = input.slice_from(start).trim().to_string();
        self.descriptors.push((name.to_ascii_lowercase(), text));
        Ok(())
    }
}

impl<'i> cssparser::AtRuleParser<'i> for FontFaceDeclarationParser<'_> {
    type Prelude = ();
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        _name: cssparser::CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> std::result::Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> cssparser::QualifiedRuleParser<'i> for FontFaceDeclarationParser<'_> {
    type Prelude = ();
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> std::result::Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> RuleBodyItemParser<'i, (), ()> for FontFaceDeclarationParser<'_> {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}

struct DeclarationListParser<'a> {
    registry: &'a PropertyRegistry,
    declarations: &'a mut StyleDeclaration,
}

impl<'i> cssparser::DeclarationParser<'i> for DeclarationListParser<'_> {
    type Declaration = ();
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: cssparser::CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _start: &cssparser::ParserState,
    ) -> std::result::Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let parsed = if self.registry.is_shorthand(&name) {
            self.registry.parse_shorthand(&name, input)
        } else {
            match self.registry.index_of(&name) {
                Ok(index) => self
                    .registry
                    .descriptor(index)
                    .manager
                    .parse(&name, input)
                    .map(|value| vec![(index, value)]),
                Err(e) => Err(e),
            }
        };
        match parsed {
            Ok(pairs) => {
                let important = input.try_parse(cssparser::parse_important).is_ok();
                if input.expect_exhausted().is_err() {
                    log::warn!("skipping '{}': trailing tokens", name);
                    while input.next().is_ok() {}
                    return Ok(());
                }
                for (index, value) in pairs {
                    self.declarations.append(index, value, important);
                }
            }
            Err(e) => {
                log::warn!("skipping declaration: {}", e);
                while input.next().is_ok() {}
            }
        }
        Ok(())
    }
}

impl<'i> cssparser::AtRuleParser<'i> for DeclarationListParser<'_> {
    type Prelude = ();
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        _name: cssparser::CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> std::result::Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> cssparser::QualifiedRuleParser<'i> for DeclarationListParser<'_> {
    type Prelude = ();
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> std::result::Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> RuleBodyItemParser<'i, (), ()> for DeclarationListParser<'_> {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Unit, Value};

    fn registry() -> PropertyRegistry {
        PropertyRegistry::svg()
    }

    #[test]
    fn test_parse_style_rules_in_order() {
        let reg = registry();
        let sheet = StyleSheet::parse(&reg, "rect { fill: red; } circle { fill: blue; }");
        assert_eq!(sheet.rules.len(), 2);
        let Rule::Style(rule) = &sheet.rules[0] else {
            panic!("expected style rule");
        };
        let fill = reg.index_of("fill").unwrap();
        assert_eq!(
            rule.declarations.get_property(fill).unwrap().value,
            Value::rgb(255.0, 0.0, 0.0)
        );
    }

    #[test]
    fn test_important_flag() {
        let reg = registry();
        let sheet = StyleSheet::parse(&reg, "rect { opacity: 0.5 !important; }");
        let Rule::Style(rule) = &sheet.rules[0] else {
            panic!("expected style rule");
        };
        let opacity = reg.index_of("opacity").unwrap();
        assert!(rule.declarations.get_property(opacity).unwrap().important);
    }

    #[test]
    fn test_malformed_declaration_skipped() {
        let reg = registry();
        let sheet = StyleSheet::parse(
            &reg,
            "rect { visibility: 42px; stroke-width: 3; unknown-prop: 1; color: #\u{20ac}; }",
        );
        let Rule::Style(rule) = &sheet.rules[0] else {
            panic!("expected style rule");
        };
        assert_eq!(rule.declarations.len(), 1);
        let width = reg.index_of("stroke-width").unwrap();
        assert_eq!(rule.declarations.get_property(width).unwrap().value, Value::number(3.0));
    }

    #[test]
    fn test_malformed_rect_skipped_rest_survives() {
        let reg = registry();
        let sheet = StyleSheet::parse(
            &reg,
            "rect { clip: rect(1px, 2px, 3px); fill: none; }",
        );
        let Rule::Style(rule) = &sheet.rules[0] else {
            panic!("expected style rule");
        };
        assert!(rule.declarations.get_property(reg.index_of("clip").unwrap()).is_none());
        assert!(rule.declarations.get_property(reg.index_of("fill").unwrap()).is_some());
    }

    #[test]
    fn test_shorthand_expansion_in_rule() {
        let reg = registry();
        let sheet = StyleSheet::parse(&reg, "text { font: bold 12px serif; }");
        let Rule::Style(rule) = &sheet.rules[0] else {
            panic!("expected style rule");
        };
        // style, weight, size, line-height, family
        assert_eq!(rule.declarations.len(), 5);
        let size = reg.index_of("font-size").unwrap();
        assert_eq!(
            rule.declarations.get_property(size).unwrap().value,
            Value::Number(Unit::Px, 12.0)
        );
    }

    #[test]
    fn test_media_rule() {
        let reg = registry();
        let sheet = StyleSheet::parse(
            &reg,
            "@media print, screen { rect { fill: none; } } @media aural { rect { fill: red; } }",
        );
        assert_eq!(sheet.rules.len(), 2);
        let Rule::Media(media) = &sheet.rules[0] else {
            panic!("expected media rule");
        };
        assert_eq!(media.media, vec!["print", "screen"]);
        assert_eq!(media.rules.len(), 1);
        assert!(media_matches(&media.media, "screen"));
        assert!(!media_matches(&media.media, "aural"));
        assert!(media_matches(&[], "anything"));
        assert!(media_matches(&["all".to_string()], "screen"));
    }

    #[test]
    fn test_import_rule() {
        let reg = registry();
        let sheet = StyleSheet::parse(
            &reg,
            "@import url('common.css') print; @import 'extra.css'; rect { fill: red; }",
        );
        assert_eq!(sheet.rules.len(), 3);
        let Rule::Import(import) = &sheet.rules[0] else {
            panic!("expected import rule");
        };
        assert_eq!(import.uri, "common.css");
        assert_eq!(import.media, vec!["print"]);
        assert_eq!(sheet.imports("print").len(), 2);
        assert_eq!(sheet.imports("screen").len(), 1);
    }

    #[test]
    fn test_font_face_descriptors() {
        let reg = registry();
        let sheet = StyleSheet::parse(
            &reg,
            "@font-face { font-family: 'Custom'; src: url(custom.woff); }",
        );
        let Rule::FontFace(ff) = &sheet.rules[0] else {
            panic!("expected font-face rule");
        };
        assert_eq!(ff.descriptors.len(), 2);
        assert_eq!(ff.descriptors[0].0, "font-family");
        assert_eq!(ff.descriptors[1], ("src".to_string(), "url(custom.woff)".to_string()));
    }

    #[test]
    fn test_broken_rule_recovery() {
        let reg = registry();
        let sheet = StyleSheet::parse(
            &reg,
            "rect { fill: red; 42 } ???bad??? { x } circle { fill: blue; }",
        );
        // The broken middle rule disappears; its neighbors survive.
        assert_eq!(sheet.rules.len(), 2);
    }

    #[test]
    fn test_style_attribute_parsing() {
        let reg = registry();
        let decls = parse_style_attribute(&reg, "fill: red; stroke-width: 2px");
        assert_eq!(decls.len(), 2);
        let width = reg.index_of("stroke-width").unwrap();
        assert_eq!(
            decls.get_property(width).unwrap().value,
            Value::Number(Unit::Px, 2.0)
        );
    }

    #[test]
    fn test_presentation_value_parsing() {
        let reg = registry();
        assert_eq!(
            parse_property_value(&reg, "fill", "red").unwrap(),
            Value::rgb(255.0, 0.0, 0.0)
        );
        assert!(parse_property_value(&reg, "fill", "red green").is_err());
        assert!(parse_property_value(&reg, "bogus", "red").is_err());
    }
}
