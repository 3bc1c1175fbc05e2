//! selectors crate integration for the arena document.
//!
//! Defines the crate's `SelectorImpl`, the string wrapper types it needs,
//! and [`ElementRef`], the `selectors::Element` view over a
//! [`Document`](crate::dom::Document) node.

use std::fmt;

use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::context::MatchingContext;
use selectors::matching::ElementSelectorFlags;
use selectors::parser::SelectorParseErrorKind;
use selectors::{OpaqueElement, SelectorImpl};

use crate::dom::{Document, NodeId};

/// Our selector implementation for the selectors crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgSelectors;

/// Identifier string type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct IdentStr(pub String);

impl precomputed_hash::PrecomputedHash for IdentStr {
    fn precomputed_hash(&self) -> u32 {
        let mut h: u32 = 0;
        for byte in self.0.bytes() {
            h = h.wrapping_mul(31).wrapping_add(byte as u32);
        }
        h
    }
}

impl AsRef<str> for IdentStr {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for IdentStr {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl<'a> From<&'a str> for IdentStr {
    fn from(s: &'a str) -> Self {
        Self(s.to_string())
    }
}

impl cssparser::ToCss for IdentStr {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(&self.0)
    }
}

/// Local name wrapper that implements ToCss.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CssLocalName(pub String);

impl precomputed_hash::PrecomputedHash for CssLocalName {
    fn precomputed_hash(&self) -> u32 {
        IdentStr(self.0.clone()).precomputed_hash()
    }
}

impl cssparser::ToCss for CssLocalName {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(&self.0)
    }
}

impl From<String> for CssLocalName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl<'a> From<&'a str> for CssLocalName {
    fn from(s: &'a str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for CssLocalName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Namespace wrapper that implements ToCss.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CssNamespace(pub String);

impl precomputed_hash::PrecomputedHash for CssNamespace {
    fn precomputed_hash(&self) -> u32 {
        IdentStr(self.0.clone()).precomputed_hash()
    }
}

impl cssparser::ToCss for CssNamespace {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(&self.0)
    }
}

impl From<String> for CssNamespace {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl<'a> From<&'a str> for CssNamespace {
    fn from(s: &'a str) -> Self {
        Self(s.to_string())
    }
}

impl<'i> selectors::parser::Parser<'i> for SvgSelectors {
    type Impl = SvgSelectors;
    type Error = SelectorParseErrorKind<'i>;

    fn parse_pseudo_element(
        &self,
        location: cssparser::SourceLocation,
        name: cssparser::CowRcStr<'i>,
    ) -> Result<PseudoElement, cssparser::ParseError<'i, Self::Error>> {
        match name.to_ascii_lowercase().as_str() {
            "first-line" => Ok(PseudoElement::FirstLine),
            "first-letter" => Ok(PseudoElement::FirstLetter),
            _ => Err(location.new_custom_error(
                SelectorParseErrorKind::UnsupportedPseudoClassOrElement(name),
            )),
        }
    }
}

/// Pseudo-elements a rule may target. A style map cache entry is keyed by
/// `(node, Option<PseudoElement>)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PseudoElement {
    FirstLine,
    FirstLetter,
}

impl cssparser::ToCss for PseudoElement {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        match self {
            PseudoElement::FirstLine => dest.write_str("::first-line"),
            PseudoElement::FirstLetter => dest.write_str("::first-letter"),
        }
    }
}

impl selectors::parser::PseudoElement for PseudoElement {
    type Impl = SvgSelectors;

    fn accepts_state_pseudo_classes(&self) -> bool {
        false
    }

    fn valid_after_slotted(&self) -> bool {
        false
    }
}

/// Non-TS pseudo-class type. Only `:link` matches in a static document;
/// the user-action states parse but never match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NonTSPseudoClass {
    Link,
    Visited,
    Hover,
    Active,
    Focus,
}

impl selectors::parser::NonTSPseudoClass for NonTSPseudoClass {
    type Impl = SvgSelectors;

    fn is_active_or_hover(&self) -> bool {
        matches!(self, Self::Hover | Self::Active)
    }

    fn is_user_action_state(&self) -> bool {
        matches!(self, Self::Hover | Self::Active | Self::Focus)
    }
}

impl cssparser::ToCss for NonTSPseudoClass {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        match self {
            Self::Link => dest.write_str(":link"),
            Self::Visited => dest.write_str(":visited"),
            Self::Hover => dest.write_str(":hover"),
            Self::Active => dest.write_str(":active"),
            Self::Focus => dest.write_str(":focus"),
        }
    }
}

impl SelectorImpl for SvgSelectors {
    type ExtraMatchingData<'a> = ();
    type AttrValue = IdentStr;
    type Identifier = IdentStr;
    type LocalName = CssLocalName;
    type NamespaceUrl = CssNamespace;
    type NamespacePrefix = IdentStr;
    type BorrowedLocalName = CssLocalName;
    type BorrowedNamespaceUrl = CssNamespace;
    type NonTSPseudoClass = NonTSPseudoClass;
    type PseudoElement = PseudoElement;
}

/// Specificity unpacked from the selectors crate's packed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity {
    pub ids: u32,
    pub classes: u32,
    pub elements: u32,
}

impl Specificity {
    pub fn from_packed(spec: u32) -> Self {
        Specificity {
            ids: (spec >> 20) & 0x3FF,
            classes: (spec >> 10) & 0x3FF,
            elements: spec & 0x3FF,
        }
    }
}

/// Reference to a document element for selector matching.
///
/// `pseudo` names the pseudo-element being styled when rules are matched
/// in `MatchingMode::ForStatelessPseudoElement`; it is `None` for the
/// element's own style.
#[derive(Clone, Copy)]
pub struct ElementRef<'a> {
    pub doc: &'a Document,
    pub id: NodeId,
    pub pseudo: Option<PseudoElement>,
}

impl<'a> ElementRef<'a> {
    pub fn new(doc: &'a Document, id: NodeId) -> Self {
        Self {
            doc,
            id,
            pseudo: None,
        }
    }

    pub fn with_pseudo(doc: &'a Document, id: NodeId, pseudo: Option<PseudoElement>) -> Self {
        Self { doc, id, pseudo }
    }
}

impl fmt::Debug for ElementRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementRef")
            .field("id", &self.id)
            .field("name", &self.doc.node(self.id).name)
            .finish()
    }
}

impl<'a> selectors::Element for ElementRef<'a> {
    type Impl = SvgSelectors;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(self)
    }

    fn parent_element(&self) -> Option<Self> {
        self.doc.parent(self.id).map(|p| Self::new(self.doc, p))
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        self.doc
            .prev_sibling(self.id)
            .map(|s| Self::new(self.doc, s))
    }

    fn next_sibling_element(&self) -> Option<Self> {
        self.doc
            .next_sibling(self.id)
            .map(|s| Self::new(self.doc, s))
    }

    fn first_element_child(&self) -> Option<Self> {
        self.doc
            .children(self.id)
            .first()
            .map(|&c| Self::new(self.doc, c))
    }

    fn is_html_element_in_html_document(&self) -> bool {
        false
    }

    fn has_local_name(&self, name: &CssLocalName) -> bool {
        self.doc.node(self.id).name == name.0
    }

    fn has_namespace(&self, _ns: &CssNamespace) -> bool {
        // The arena holds a single-namespace document.
        true
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.doc.node(self.id).name == other.doc.node(other.id).name
    }

    fn attr_matches(
        &self,
        _ns: &NamespaceConstraint<&CssNamespace>,
        local_name: &CssLocalName,
        operation: &AttrSelectorOperation<&IdentStr>,
    ) -> bool {
        match self.doc.attribute(self.id, &local_name.0) {
            Some(value) => operation.eval_str(value),
            None => false,
        }
    }

    fn match_non_ts_pseudo_class(
        &self,
        pc: &NonTSPseudoClass,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        match pc {
            NonTSPseudoClass::Link => self.is_link(),
            // User-action states never match in a static document.
            _ => false,
        }
    }

    fn match_pseudo_element(
        &self,
        pe: &PseudoElement,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        self.pseudo == Some(*pe)
    }

    fn is_link(&self) -> bool {
        let node = self.doc.node(self.id);
        node.name == "a"
            && (node.attribute("href").is_some() || node.attribute("xlink:href").is_some())
    }

    fn is_html_slot_element(&self) -> bool {
        false
    }

    fn has_id(&self, id: &IdentStr, case_sensitivity: CaseSensitivity) -> bool {
        match self.doc.id_attribute(self.id) {
            Some(elem_id) => case_sensitivity.eq(elem_id.as_bytes(), id.0.as_bytes()),
            None => false,
        }
    }

    fn has_class(&self, name: &IdentStr, case_sensitivity: CaseSensitivity) -> bool {
        self.doc
            .classes(self.id)
            .any(|c| case_sensitivity.eq(c.as_bytes(), name.0.as_bytes()))
    }

    fn imported_part(&self, _name: &IdentStr) -> Option<IdentStr> {
        None
    }

    fn is_part(&self, _name: &IdentStr) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        self.doc.children(self.id).is_empty()
    }

    fn is_root(&self) -> bool {
        self.doc.parent(self.id).is_none()
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn add_element_unique_hashes(&self, _filter: &mut selectors::bloom::BloomFilter) -> bool {
        false
    }

    fn has_custom_state(&self, _name: &IdentStr) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use selectors::context::SelectorCaches;

    use super::*;

    fn parse_selector(
        s: &str,
    ) -> Result<
        selectors::parser::Selector<SvgSelectors>,
        cssparser::ParseError<'_, SelectorParseErrorKind<'_>>,
    > {
        let mut parser_input = cssparser::ParserInput::new(s);
        let mut parser = cssparser::Parser::new(&mut parser_input);
        selectors::parser::Selector::parse(&SvgSelectors, &mut parser)
    }

    fn matches_selector(
        elem: ElementRef<'_>,
        selector: &selectors::parser::Selector<SvgSelectors>,
    ) -> bool {
        let mut caches = SelectorCaches::default();
        let mut context = MatchingContext::new(
            selectors::matching::MatchingMode::Normal,
            None,
            &mut caches,
            selectors::context::QuirksMode::NoQuirks,
            selectors::matching::NeedsSelectorFlags::No,
            selectors::matching::MatchingForInvalidation::No,
        );
        selectors::matching::matches_selector(selector, 0, None, &elem, &mut context)
    }

    fn fixture() -> (Document, NodeId) {
        let mut doc = Document::new();
        let svg = doc.create_element("svg");
        let g = doc.create_element("g");
        let rect = doc.create_element("rect");
        doc.set_attribute(g, "class", "axis");
        doc.set_attribute(rect, "id", "frame");
        doc.set_attribute(rect, "class", "grid major");
        doc.append_child(svg, g);
        doc.append_child(g, rect);
        (doc, rect)
    }

    #[test]
    fn test_tag_selector() {
        let (doc, rect) = fixture();
        let elem = ElementRef::new(&doc, rect);
        assert!(matches_selector(elem, &parse_selector("rect").unwrap()));
        assert!(!matches_selector(elem, &parse_selector("circle").unwrap()));
    }

    #[test]
    fn test_class_and_id_selectors() {
        let (doc, rect) = fixture();
        let elem = ElementRef::new(&doc, rect);
        assert!(matches_selector(elem, &parse_selector(".grid").unwrap()));
        assert!(matches_selector(elem, &parse_selector(".major").unwrap()));
        assert!(matches_selector(elem, &parse_selector("#frame").unwrap()));
        assert!(matches_selector(
            elem,
            &parse_selector("rect#frame.grid").unwrap()
        ));
        assert!(!matches_selector(elem, &parse_selector(".minor").unwrap()));
    }

    #[test]
    fn test_descendant_and_child_selectors() {
        let (doc, rect) = fixture();
        let elem = ElementRef::new(&doc, rect);
        assert!(matches_selector(elem, &parse_selector("svg rect").unwrap()));
        assert!(matches_selector(
            elem,
            &parse_selector("g.axis > rect").unwrap()
        ));
        assert!(!matches_selector(
            elem,
            &parse_selector("svg > rect").unwrap()
        ));
    }

    #[test]
    fn test_attribute_selector() {
        let (doc, rect) = fixture();
        let elem = ElementRef::new(&doc, rect);
        assert!(matches_selector(
            elem,
            &parse_selector("rect[id=frame]").unwrap()
        ));
        assert!(matches_selector(
            elem,
            &parse_selector("[class~=major]").unwrap()
        ));
        assert!(!matches_selector(
            elem,
            &parse_selector("[id=other]").unwrap()
        ));
    }

    #[test]
    fn test_specificity_unpacking() {
        let selector = parse_selector("g.axis rect#frame").unwrap();
        let spec = Specificity::from_packed(selector.specificity());
        assert_eq!(spec.ids, 1);
        assert_eq!(spec.classes, 1);
        assert_eq!(spec.elements, 2);
    }

    #[test]
    fn test_pseudo_element_parses() {
        assert!(parse_selector("text::first-line").is_ok());
        assert!(parse_selector("text::first-letter").is_ok());
        assert!(parse_selector("text::marker-fish").is_err());
    }
}
