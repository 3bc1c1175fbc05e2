//! The cascade engine.
//!
//! [`CssEngine`] owns the registry, the per-origin stylesheet lists, the
//! computed-style cache, and the listener list. Style maps are computed
//! lazily per (element, pseudo-element) pair and invalidated as a unit;
//! the engine never mutates a cached map in place.

use std::collections::{HashMap, HashSet};

use selectors::context::{MatchingContext, MatchingMode, QuirksMode, SelectorCaches};
use selectors::matching::{matches_selector, MatchingForInvalidation, NeedsSelectorFlags};

use crate::context::CssContext;
use crate::dom::{Document, NodeId};
use crate::error::Result;
use crate::event::{ListenerFn, ListenerId, Listeners, StyleChangeEvent};
use crate::property::PropertyRegistry;
use crate::selector::{ElementRef, PseudoElement};
use crate::style_map::{Flags, StyleMap};
use crate::stylesheet::{
    media_matches, parse_property_value, parse_style_attribute, Origin, Rule, StyleSheet,
};
use crate::value::compute::{absolute_to_pixels, percentage_basis};
use crate::value::{Orientation, Unit, Value, ValueManager};

/// One declaration that survived selector matching, tagged with its
/// cascade position.
struct MatchedDecl {
    index: usize,
    value: Value,
    important: bool,
    /// Origin/importance bucket: UA < user-normal < author-normal <
    /// author-important < user-important. UA `!important` stays in the
    /// UA bucket.
    bucket: u8,
    /// Position within the author buckets: presentation attributes,
    /// then rules, then inline style.
    sub: u8,
    /// Packed specificity from the selectors crate; zero for
    /// presentation attributes and inline style.
    specificity: u32,
    order: u32,
}

fn bucket_of(origin: Origin, important: bool) -> u8 {
    match (origin, important) {
        (Origin::UserAgent, _) => 0,
        (Origin::User, false) => 1,
        (Origin::Author, false) => 2,
        (Origin::Author, true) => 3,
        (Origin::User, true) => 4,
    }
}

const SUB_PRESENTATION: u8 = 0;
const SUB_RULES: u8 = 1;
const SUB_INLINE: u8 = 2;

type CacheKey = (NodeId, Option<PseudoElement>);

/// CSS cascade and computed-value engine for one document.
///
/// Single-threaded by design; listeners run synchronously on the
/// mutating thread.
pub struct CssEngine {
    registry: PropertyRegistry,
    context: Box<dyn CssContext>,
    medium: String,
    ua_sheets: Vec<StyleSheet>,
    user_sheets: Vec<StyleSheet>,
    author_sheets: Vec<StyleSheet>,
    /// `@import` targets the embedder has loaded, keyed by resolved URI.
    loaded_imports: HashMap<String, StyleSheet>,
    cache: HashMap<CacheKey, StyleMap>,
    listeners: Listeners,
    font_size_index: Option<usize>,
    font_weight_index: Option<usize>,
    color_index: Option<usize>,
}

impl CssEngine {
    pub fn new(registry: PropertyRegistry, context: Box<dyn CssContext>, medium: &str) -> Self {
        let font_size_index = registry.index_of("font-size").ok();
        let font_weight_index = registry.index_of("font-weight").ok();
        let color_index = registry.index_of("color").ok();
        CssEngine {
            registry,
            context,
            medium: medium.to_ascii_lowercase(),
            ua_sheets: Vec::new(),
            user_sheets: Vec::new(),
            author_sheets: Vec::new(),
            loaded_imports: HashMap::new(),
            cache: HashMap::new(),
            listeners: Listeners::default(),
            font_size_index,
            font_weight_index,
            color_index,
        }
    }

    pub fn registry(&self) -> &PropertyRegistry {
        &self.registry
    }

    pub fn medium(&self) -> &str {
        &self.medium
    }

    /// Add a stylesheet to an origin list, returning its index there.
    /// Any cached style is discarded.
    pub fn add_stylesheet(&mut self, origin: Origin, sheet: StyleSheet) -> usize {
        self.cache.clear();
        let sheets = self.sheets_mut(origin);
        sheets.push(sheet);
        sheets.len() - 1
    }

    pub fn clear_author_stylesheets(&mut self) {
        self.cache.clear();
        self.author_sheets.clear();
    }

    fn sheets_mut(&mut self, origin: Origin) -> &mut Vec<StyleSheet> {
        match origin {
            Origin::UserAgent => &mut self.ua_sheets,
            Origin::User => &mut self.user_sheets,
            Origin::Author => &mut self.author_sheets,
        }
    }

    fn sheets(&self, origin: Origin) -> &[StyleSheet] {
        match origin {
            Origin::UserAgent => &self.ua_sheets,
            Origin::User => &self.user_sheets,
            Origin::Author => &self.author_sheets,
        }
    }

    /// Resolve `@import` references in `origin`'s sheets through the
    /// embedder's loader. An unavailable target is logged and the import
    /// degrades to a no-op; everything else keeps working.
    pub fn load_imports<F>(&mut self, origin: Origin, mut loader: F)
    where
        F: FnMut(&str) -> Result<String>,
    {
        self.cache.clear();
        let mut pending: Vec<(String, Option<usize>)> = Vec::new();
        for (i, sheet) in self.sheets(origin).iter().enumerate() {
            for import in sheet.imports(&self.medium) {
                pending.push((import.uri.clone(), Some(i)));
            }
        }
        while let Some((uri, parent)) = pending.pop() {
            if self.loaded_imports.contains_key(&uri) {
                continue;
            }
            match loader(&uri) {
                Ok(css) => {
                    let mut sheet = StyleSheet::parse(&self.registry, &css);
                    sheet.parent = parent;
                    for import in sheet.imports(&self.medium) {
                        pending.push((import.uri.clone(), parent));
                    }
                    self.loaded_imports.insert(uri, sheet);
                }
                Err(e) => {
                    log::warn!("could not load '{}': {}", uri, e);
                }
            }
        }
    }

    pub fn add_listener(&mut self, listener: ListenerFn) -> ListenerId {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// The computed style map for an (element, pseudo-element) pair,
    /// computing and caching it on first query.
    pub fn style_map(
        &mut self,
        doc: &Document,
        node: NodeId,
        pseudo: Option<PseudoElement>,
    ) -> &StyleMap {
        self.ensure(doc, node, pseudo);
        &self.cache[&(node, pseudo)]
    }

    /// The computed value of one property slot.
    pub fn computed_value(
        &mut self,
        doc: &Document,
        node: NodeId,
        pseudo: Option<PseudoElement>,
        index: usize,
    ) -> Value {
        self.style_map(doc, node, pseudo).value(index).clone()
    }

    /// Recompute `node`'s style, notify listeners of any change, and
    /// propagate through cached descendant maps that depend on it.
    pub fn invalidate(&mut self, doc: &Document, node: NodeId) {
        self.drop_pseudo_maps(node);
        let Some(old) = self.cache.remove(&(node, None)) else {
            return;
        };
        self.ensure(doc, node, None);
        let changed = old.diff(&self.cache[&(node, None)]);
        if changed.is_empty() {
            return;
        }
        self.listeners.dispatch(&StyleChangeEvent {
            node,
            properties: changed.clone(),
        });
        for child in doc.children(node).to_vec() {
            self.propagate(doc, child, &changed);
        }
    }

    /// React to an attribute mutation on `node`.
    ///
    /// Selector-bearing attributes (`class`, `id`) can change which rules
    /// match anywhere in the subtree, so its maps are dropped for lazy
    /// recomputation. Style-bearing attributes recompute eagerly so
    /// listeners fire.
    pub fn attribute_changed(&mut self, doc: &Document, node: NodeId, name: &str) {
        match name {
            "class" | "id" => self.drop_subtree(doc, node),
            "style" => self.invalidate(doc, node),
            _ if self.registry.index_of(name).is_ok() => self.invalidate(doc, node),
            _ => {}
        }
    }

    /// Drop all style state for a removed subtree.
    pub fn element_removed(&mut self, doc: &Document, node: NodeId) {
        self.drop_subtree(doc, node);
    }

    fn drop_pseudo_maps(&mut self, node: NodeId) {
        self.cache.remove(&(node, Some(PseudoElement::FirstLine)));
        self.cache.remove(&(node, Some(PseudoElement::FirstLetter)));
    }

    fn drop_subtree(&mut self, doc: &Document, node: NodeId) {
        self.cache.remove(&(node, None));
        self.drop_pseudo_maps(node);
        for descendant in doc.descendants(node) {
            self.cache.remove(&(descendant, None));
            self.drop_pseudo_maps(descendant);
        }
    }

    fn propagate(&mut self, doc: &Document, node: NodeId, parent_changed: &[usize]) {
        let Some(map) = self.cache.get(&(node, None)) else {
            // Not cached here, but a cached map deeper down may still
            // inherit through this element.
            for child in doc.children(node).to_vec() {
                self.propagate(doc, child, parent_changed);
            }
            return;
        };

        let inherits_changed = parent_changed
            .iter()
            .any(|&i| map.flags(i).contains(Flags::INHERITED));
        let parent_font_changed = parent_changed
            .iter()
            .any(|&i| Some(i) == self.font_size_index || Some(i) == self.font_weight_index);
        let depends = inherits_changed
            || (parent_font_changed && map.any_flagged(Flags::PARENT_RELATIVE))
            || (parent_changed.iter().any(|&i| Some(i) == self.font_size_index)
                && map.any_flagged(Flags::FONT_SIZE_RELATIVE))
            || (parent_changed.iter().any(|&i| Some(i) == self.color_index)
                && map.any_flagged(Flags::COLOR_RELATIVE));
        if !depends {
            return;
        }

        let old = self.cache.remove(&(node, None)).unwrap();
        self.drop_pseudo_maps(node);
        self.ensure(doc, node, None);
        let changed = old.diff(&self.cache[&(node, None)]);
        if changed.is_empty() {
            return;
        }
        self.listeners.dispatch(&StyleChangeEvent {
            node,
            properties: changed.clone(),
        });
        for child in doc.children(node).to_vec() {
            self.propagate(doc, child, &changed);
        }
    }

    /// Make sure maps exist for `node`'s ancestor chain, then for the
    /// requested pair. Parents are computed first so inheritance reads
    /// finished maps.
    fn ensure(&mut self, doc: &Document, node: NodeId, pseudo: Option<PseudoElement>) {
        let mut chain = Vec::new();
        let mut current = Some(node);
        while let Some(n) = current {
            chain.push(n);
            current = doc.parent(n);
        }
        for &n in chain.iter().rev() {
            if !self.cache.contains_key(&(n, None)) {
                let map = self.build_map(doc, n, None);
                self.cache.insert((n, None), map);
            }
        }
        if pseudo.is_some() && !self.cache.contains_key(&(node, pseudo)) {
            let map = self.build_map(doc, node, pseudo);
            self.cache.insert((node, pseudo), map);
        }
    }

    /// Run the full cascade for one (element, pseudo-element) pair.
    fn build_map(&self, doc: &Document, node: NodeId, pseudo: Option<PseudoElement>) -> StyleMap {
        let len = self.registry.len();
        let mut matched: Vec<MatchedDecl> = Vec::new();
        let mut order: u32 = 0;

        // Presentation attributes and the inline style attribute apply to
        // the element itself, never to its pseudo-elements.
        if pseudo.is_none() {
            for (name, text) in doc.node(node).attributes() {
                if matches!(name, "id" | "class" | "style") {
                    continue;
                }
                if self.registry.index_of(name).is_err() {
                    continue;
                }
                match parse_property_value(&self.registry, name, text) {
                    Ok(value) => {
                        matched.push(MatchedDecl {
                            index: self.registry.index_of(name).unwrap(),
                            value,
                            important: false,
                            bucket: bucket_of(Origin::Author, false),
                            sub: SUB_PRESENTATION,
                            specificity: 0,
                            order,
                        });
                        order += 1;
                    }
                    Err(e) => log::warn!("ignoring presentation attribute: {}", e),
                }
            }
        }

        let element = ElementRef::with_pseudo(doc, node, pseudo);
        let mut caches = SelectorCaches::default();
        let mode = if pseudo.is_some() {
            MatchingMode::ForStatelessPseudoElement
        } else {
            MatchingMode::Normal
        };
        let mut matching = MatchingContext::new(
            mode,
            None,
            &mut caches,
            QuirksMode::NoQuirks,
            NeedsSelectorFlags::No,
            MatchingForInvalidation::No,
        );

        for origin in [Origin::UserAgent, Origin::User, Origin::Author] {
            for sheet in self.sheets(origin) {
                if !media_matches(&sheet.media, &self.medium) {
                    continue;
                }
                let mut visited = HashSet::new();
                self.collect_rules(
                    &sheet.rules,
                    origin,
                    &element,
                    pseudo,
                    &mut matching,
                    &mut matched,
                    &mut order,
                    &mut visited,
                );
            }
        }

        if pseudo.is_none() {
            if let Some(css) = doc.inline_style(node) {
                for decl in &parse_style_attribute(&self.registry, css) {
                    matched.push(MatchedDecl {
                        index: decl.index,
                        value: decl.value.clone(),
                        important: decl.important,
                        bucket: bucket_of(Origin::Author, decl.important),
                        sub: SUB_INLINE,
                        specificity: 0,
                        order,
                    });
                    order += 1;
                }
            }
        }

        matched.sort_unstable_by_key(|d| (d.bucket, d.sub, d.specificity, d.order));

        // Last writer wins after the sort.
        let mut winners: Vec<Option<(Value, bool)>> = vec![None; len];
        for decl in matched {
            winners[decl.index] = Some((decl.value, decl.important));
        }

        // For a pseudo-element, unset slots inherit from the element's
        // own map; for an element, from the parent's.
        let parent_key = if pseudo.is_some() {
            Some((node, None))
        } else {
            doc.parent(node).map(|p| (p, None))
        };
        let parent_map = parent_key.and_then(|k| self.cache.get(&k));

        let mut builder = MapBuilder {
            registry: &self.registry,
            context: self.context.as_ref(),
            doc,
            node,
            parent_map,
            font_size_index: self.font_size_index,
            font_weight_index: self.font_weight_index,
            color_index: self.color_index,
            map: StyleMap::new(len),
            state: vec![SlotState::Raw; len],
        };

        for (index, winner) in winners.into_iter().enumerate() {
            match winner {
                Some((Value::Inherit, important)) => {
                    builder.inherit_slot(index, important);
                }
                Some((value, important)) => {
                    builder.map.set_value(index, value);
                    if important {
                        builder.map.set_flags(index, Flags::IMPORTANT);
                    }
                }
                None => {
                    if self.registry.is_inherited(index) && parent_map.is_some() {
                        builder.inherit_slot(index, false);
                    } else {
                        builder
                            .map
                            .set_value(index, self.registry.initial_value(index).clone());
                    }
                }
            }
        }

        for index in 0..len {
            builder.compute_slot(index);
        }
        builder.map
    }

    #[allow(clippy::too_many_arguments)]
    fn collect_rules<'a>(
        &'a self,
        rules: &'a [Rule],
        origin: Origin,
        element: &ElementRef<'_>,
        pseudo: Option<PseudoElement>,
        matching: &mut MatchingContext<'_, crate::selector::SvgSelectors>,
        matched: &mut Vec<MatchedDecl>,
        order: &mut u32,
        visited: &mut HashSet<&'a str>,
    ) {
        for rule in rules {
            match rule {
                Rule::Style(style) => {
                    for selector in &style.selectors {
                        if selector.has_pseudo_element() != pseudo.is_some() {
                            continue;
                        }
                        if !matches_selector(selector, 0, None, element, matching) {
                            continue;
                        }
                        let specificity = selector.specificity();
                        for decl in &style.declarations {
                            matched.push(MatchedDecl {
                                index: decl.index,
                                value: decl.value.clone(),
                                important: decl.important,
                                bucket: bucket_of(origin, decl.important),
                                sub: SUB_RULES,
                                specificity,
                                order: *order,
                            });
                            *order += 1;
                        }
                    }
                }
                Rule::Media(media) => {
                    if media_matches(&media.media, &self.medium) {
                        self.collect_rules(
                            &media.rules,
                            origin,
                            element,
                            pseudo,
                            matching,
                            matched,
                            order,
                            visited,
                        );
                    }
                }
                Rule::Import(import) => {
                    if !media_matches(&import.media, &self.medium) {
                        continue;
                    }
                    if let Some((uri, sheet)) = self.loaded_imports.get_key_value(import.uri.as_str())
                    {
                        if visited.insert(uri.as_str()) {
                            self.collect_rules(
                                &sheet.rules,
                                origin,
                                element,
                                pseudo,
                                matching,
                                matched,
                                order,
                                visited,
                            );
                        }
                    }
                }
                Rule::FontFace(_) => {}
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Raw,
    InProgress,
    Done,
}

/// One in-flight cascade pass. Holds the map being filled plus the
/// per-slot memoization state that makes value dependencies (em against
/// font-size, currentColor against color) terminate.
struct MapBuilder<'a> {
    registry: &'a PropertyRegistry,
    context: &'a dyn CssContext,
    doc: &'a Document,
    node: NodeId,
    parent_map: Option<&'a StyleMap>,
    font_size_index: Option<usize>,
    font_weight_index: Option<usize>,
    color_index: Option<usize>,
    map: StyleMap,
    state: Vec<SlotState>,
}

impl MapBuilder<'_> {
    /// Copy the parent's computed value into a slot. At the root the
    /// registered initial value stands in and computes normally.
    fn inherit_slot(&mut self, index: usize, important: bool) {
        match self.parent_map {
            Some(parent) => {
                self.map.set_value(index, parent.value(index).clone());
                let mut flags = Flags::INHERITED | Flags::COMPUTED;
                if important {
                    flags.insert(Flags::IMPORTANT);
                }
                self.map.set_flags(index, flags);
                self.state[index] = SlotState::Done;
            }
            None => {
                self.map
                    .set_value(index, self.registry.initial_value(index).clone());
                if important {
                    self.map.set_flags(index, Flags::IMPORTANT);
                }
            }
        }
    }

    /// Compute one slot, memoized. Re-entry means the value depends on
    /// itself; the registered initial value substitutes and the cascade
    /// carries on.
    fn compute_slot(&mut self, index: usize) -> Value {
        match self.state[index] {
            SlotState::Done => return self.map.value(index).clone(),
            SlotState::InProgress => {
                log::warn!(
                    "cyclic value dependency while computing '{}', using initial value",
                    self.registry.descriptor(index).name
                );
                return self.registry.initial_value(index).clone();
            }
            SlotState::Raw => {}
        }
        self.state[index] = SlotState::InProgress;
        let raw = self.map.value(index).clone();
        let computed = self.compute_value(index, raw);
        self.map.set_value(index, computed.clone());
        self.map.set_flags(index, Flags::COMPUTED);
        self.state[index] = SlotState::Done;
        computed
    }

    fn compute_value(&mut self, index: usize, raw: Value) -> Value {
        match self.registry.descriptor(index).manager {
            ValueManager::Identifier { .. } | ValueManager::Uri | ValueManager::FontFamily => raw,
            ValueManager::Length { orientation } => self.compute_length(index, raw, orientation),
            ValueManager::FontSize => self.compute_font_size(index, raw),
            ValueManager::FontWeight => self.compute_font_weight(index, raw),
            ValueManager::Color => self.compute_color(raw),
            ValueManager::Paint => self.compute_paint(index, raw),
            ValueManager::Rect => self.compute_rect(index, raw),
            ValueManager::Opacity => compute_opacity(raw),
            ValueManager::LineHeight => self.compute_line_height(index, raw),
        }
    }

    /// This element's computed font-size in pixels.
    fn own_font_size(&mut self) -> f32 {
        match self.font_size_index {
            Some(i) => self
                .compute_slot(i)
                .as_float()
                .unwrap_or_else(|_| self.context.medium_font_size()),
            None => self.context.medium_font_size(),
        }
    }

    /// The parent's computed font-size, medium at the root.
    fn parent_font_size(&self) -> f32 {
        self.font_size_index
            .and_then(|i| self.parent_map.map(|p| p.value(i).clone()))
            .and_then(|v| v.as_float().ok())
            .unwrap_or_else(|| self.context.medium_font_size())
    }

    fn parent_font_weight(&self) -> f32 {
        self.font_weight_index
            .and_then(|i| self.parent_map.map(|p| p.value(i).clone()))
            .and_then(|v| v.as_float().ok())
            .unwrap_or(400.0)
    }

    fn length_to_pixels(
        &mut self,
        index: usize,
        unit: Unit,
        v: f32,
        orientation: Orientation,
    ) -> Value {
        if let Some(px) = absolute_to_pixels(unit, v, self.context.pixel_to_millimeter()) {
            return Value::number(px);
        }
        match unit {
            Unit::Em => {
                let fs = self.own_font_size();
                self.map.set_flags(index, Flags::FONT_SIZE_RELATIVE);
                Value::number(v * fs)
            }
            Unit::Ex => {
                let fs = self.own_font_size();
                self.map.set_flags(index, Flags::FONT_SIZE_RELATIVE);
                Value::number(v * fs * 0.5)
            }
            Unit::Percent => {
                let flags = match orientation {
                    Orientation::Horizontal => Flags::BLOCK_WIDTH_RELATIVE,
                    Orientation::Vertical => Flags::BLOCK_HEIGHT_RELATIVE,
                    Orientation::Both => {
                        Flags::BLOCK_WIDTH_RELATIVE | Flags::BLOCK_HEIGHT_RELATIVE
                    }
                };
                self.map.set_flags(index, flags);
                let basis = percentage_basis(
                    orientation,
                    self.context.block_width(self.doc, self.node),
                    self.context.block_height(self.doc, self.node),
                );
                Value::number(v / 100.0 * basis)
            }
            // Angle/time/frequency units carry no cascade context.
            _ => Value::Number(unit, v),
        }
    }

    fn compute_length(&mut self, index: usize, raw: Value, orientation: Orientation) -> Value {
        match raw {
            Value::Number(unit, v) => self.length_to_pixels(index, unit, v, orientation),
            other => other,
        }
    }

    fn compute_font_size(&mut self, index: usize, raw: Value) -> Value {
        const ABSOLUTE_SIZES: &[&str] = &[
            "xx-small", "x-small", "small", "medium", "large", "x-large", "xx-large",
        ];
        let medium = self.context.medium_font_size();
        match raw {
            Value::Ident(keyword) => {
                if let Some(pos) = ABSOLUTE_SIZES.iter().position(|k| *k == keyword) {
                    // medium sits at index 3; each step scales by 1.2.
                    return Value::number(medium * 1.2f32.powi(pos as i32 - 3));
                }
                match keyword.as_str() {
                    "larger" => {
                        self.map.set_flags(index, Flags::PARENT_RELATIVE);
                        Value::number(self.parent_font_size() * 1.2)
                    }
                    "smaller" => {
                        self.map.set_flags(index, Flags::PARENT_RELATIVE);
                        Value::number(self.parent_font_size() / 1.2)
                    }
                    _ => Value::Ident(keyword),
                }
            }
            Value::Number(unit, v) => {
                if let Some(px) =
                    absolute_to_pixels(unit, v, self.context.pixel_to_millimeter())
                {
                    return Value::number(px);
                }
                // Relative units resolve against the parent, not the
                // element's own size.
                match unit {
                    Unit::Em => {
                        self.map.set_flags(index, Flags::PARENT_RELATIVE);
                        Value::number(v * self.parent_font_size())
                    }
                    Unit::Ex => {
                        self.map.set_flags(index, Flags::PARENT_RELATIVE);
                        Value::number(v * self.parent_font_size() * 0.5)
                    }
                    Unit::Percent => {
                        self.map.set_flags(index, Flags::PARENT_RELATIVE);
                        Value::number(v / 100.0 * self.parent_font_size())
                    }
                    _ => Value::Number(unit, v),
                }
            }
            other => other,
        }
    }

    fn compute_font_weight(&mut self, index: usize, raw: Value) -> Value {
        match raw {
            Value::Ident(keyword) => match keyword.as_str() {
                "normal" => Value::number(400.0),
                "bold" => Value::number(700.0),
                "bolder" => {
                    self.map.set_flags(index, Flags::PARENT_RELATIVE);
                    Value::number(self.context.bolder_font_weight(self.parent_font_weight()))
                }
                "lighter" => {
                    self.map.set_flags(index, Flags::PARENT_RELATIVE);
                    Value::number(self.context.lighter_font_weight(self.parent_font_weight()))
                }
                _ => Value::Ident(keyword),
            },
            other => other,
        }
    }

    fn compute_color(&mut self, raw: Value) -> Value {
        match raw {
            // Identifiers left by the parser are system color keywords.
            Value::Ident(name) => self.context.system_color(&name),
            other => other,
        }
    }

    fn compute_paint(&mut self, index: usize, raw: Value) -> Value {
        match raw {
            Value::Ident(name) => match name.as_str() {
                "none" => Value::ident("none"),
                "currentcolor" => {
                    self.map.set_flags(index, Flags::COLOR_RELATIVE);
                    match self.color_index {
                        Some(color) => self.compute_slot(color),
                        None => self.context.system_color("windowtext"),
                    }
                }
                _ => self.context.system_color(&name),
            },
            other => other,
        }
    }

    fn compute_rect(&mut self, index: usize, raw: Value) -> Value {
        let Value::Rect(rect) = raw else {
            return raw;
        };
        let mut edge = |value: Value, orientation: Orientation| match value {
            Value::Number(unit, v) => self.length_to_pixels(index, unit, v, orientation),
            other => other,
        };
        let top = edge(rect.top, Orientation::Vertical);
        let right = edge(rect.right, Orientation::Horizontal);
        let bottom = edge(rect.bottom, Orientation::Vertical);
        let left = edge(rect.left, Orientation::Horizontal);
        Value::Rect(Box::new(crate::value::RectValue {
            top,
            right,
            bottom,
            left,
        }))
    }

    fn compute_line_height(&mut self, index: usize, raw: Value) -> Value {
        match raw {
            Value::Number(Unit::None, v) => Value::number(v),
            Value::Number(Unit::Percent, v) => {
                let fs = self.own_font_size();
                self.map.set_flags(index, Flags::FONT_SIZE_RELATIVE);
                Value::number(v / 100.0 * fs)
            }
            Value::Number(unit, v) => self.length_to_pixels(index, unit, v, Orientation::Both),
            other => other,
        }
    }
}

fn compute_opacity(raw: Value) -> Value {
    match raw {
        Value::Number(Unit::None, v) => Value::number(v.clamp(0.0, 1.0)),
        Value::Number(Unit::Percent, v) => Value::number((v / 100.0).clamp(0.0, 1.0)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StaticContext;
    use crate::property::PropertyDescriptor;

    fn engine() -> CssEngine {
        CssEngine::new(
            PropertyRegistry::svg(),
            Box::new(StaticContext::default()),
            "screen",
        )
    }

    fn single_node() -> (Document, NodeId) {
        let mut doc = Document::new();
        let svg = doc.create_element("svg");
        (doc, svg)
    }

    #[test]
    fn test_initial_values_at_root() {
        let mut engine = engine();
        let (doc, svg) = single_node();
        let fill = engine.registry().index_of("fill").unwrap();
        let width = engine.registry().index_of("stroke-width").unwrap();
        assert_eq!(
            engine.computed_value(&doc, svg, None, fill),
            Value::rgb(0.0, 0.0, 0.0)
        );
        assert_eq!(
            engine.computed_value(&doc, svg, None, width),
            Value::number(1.0)
        );
    }

    #[test]
    fn test_map_is_cached() {
        let mut engine = engine();
        let (doc, svg) = single_node();
        engine.style_map(&doc, svg, None);
        assert!(engine.cache.contains_key(&(svg, None)));
        let fill = engine.registry().index_of("fill").unwrap();
        let first = engine.computed_value(&doc, svg, None, fill);
        let second = engine.computed_value(&doc, svg, None, fill);
        assert_eq!(first, second);
    }

    #[test]
    fn test_em_resolves_against_own_font_size() {
        let mut engine = engine();
        let (doc, svg) = single_node();
        let sheet = StyleSheet::parse(
            engine.registry(),
            "svg { font-size: 10px; stroke-width: 2em; }",
        );
        engine.add_stylesheet(Origin::Author, sheet);
        let width = engine.registry().index_of("stroke-width").unwrap();
        assert_eq!(
            engine.computed_value(&doc, svg, None, width),
            Value::number(20.0)
        );
        let map = engine.style_map(&doc, svg, None);
        assert!(map.flags(width).contains(Flags::FONT_SIZE_RELATIVE));
    }

    #[test]
    fn test_font_size_em_resolves_against_parent() {
        let mut engine = engine();
        let mut doc = Document::new();
        let svg = doc.create_element("svg");
        let text = doc.create_element("text");
        doc.append_child(svg, text);
        let sheet = StyleSheet::parse(
            engine.registry(),
            "svg { font-size: 20px; } text { font-size: 2em; }",
        );
        engine.add_stylesheet(Origin::Author, sheet);
        let fs = engine.registry().index_of("font-size").unwrap();
        assert_eq!(engine.computed_value(&doc, text, None, fs), Value::number(40.0));
        let map = engine.style_map(&doc, text, None);
        assert!(map.flags(fs).contains(Flags::PARENT_RELATIVE));
    }

    #[test]
    fn test_font_size_keywords_scale_from_medium() {
        let mut engine = engine();
        let (doc, svg) = single_node();
        let sheet = StyleSheet::parse(engine.registry(), "svg { font-size: large; }");
        engine.add_stylesheet(Origin::Author, sheet);
        let fs = engine.registry().index_of("font-size").unwrap();
        let computed = engine.computed_value(&doc, svg, None, fs);
        assert!((computed.as_float().unwrap() - 9.0 * 1.2).abs() < 1e-4);
    }

    #[test]
    fn test_current_color_copies_computed_color() {
        let mut engine = engine();
        let (doc, svg) = single_node();
        let sheet = StyleSheet::parse(
            engine.registry(),
            "svg { color: rgb(10, 20, 30); fill: currentColor; }",
        );
        engine.add_stylesheet(Origin::Author, sheet);
        let fill = engine.registry().index_of("fill").unwrap();
        assert_eq!(
            engine.computed_value(&doc, svg, None, fill),
            Value::rgb(10.0, 20.0, 30.0)
        );
        let map = engine.style_map(&doc, svg, None);
        assert!(map.flags(fill).contains(Flags::COLOR_RELATIVE));
    }

    #[test]
    fn test_bolder_steps_from_parent_weight() {
        let mut engine = engine();
        let mut doc = Document::new();
        let svg = doc.create_element("svg");
        let text = doc.create_element("text");
        doc.append_child(svg, text);
        let sheet = StyleSheet::parse(
            engine.registry(),
            "svg { font-weight: 300; } text { font-weight: bolder; }",
        );
        engine.add_stylesheet(Origin::Author, sheet);
        let weight = engine.registry().index_of("font-weight").unwrap();
        assert_eq!(
            engine.computed_value(&doc, text, None, weight),
            Value::number(400.0)
        );
    }

    #[test]
    fn test_cyclic_dependency_substitutes_initial() {
        // A registry where font-size is a plain length lets an em value
        // depend on the slot being computed.
        let registry = PropertyRegistry::new(vec![PropertyDescriptor {
            name: "font-size",
            inherited: true,
            initial: Value::number(16.0),
            manager: ValueManager::Length {
                orientation: Orientation::Both,
            },
        }]);
        let mut engine = CssEngine::new(registry, Box::new(StaticContext::default()), "screen");
        let (doc, svg) = single_node();
        let sheet = StyleSheet::parse(engine.registry(), "svg { font-size: 2em; }");
        engine.add_stylesheet(Origin::Author, sheet);
        let fs = engine.registry().index_of("font-size").unwrap();
        // The self-reference resolves against the initial 16px.
        assert_eq!(engine.computed_value(&doc, svg, None, fs), Value::number(32.0));
    }

    #[test]
    fn test_pseudo_element_map() {
        let mut engine = engine();
        let (doc, svg) = single_node();
        let sheet = StyleSheet::parse(
            engine.registry(),
            "svg { fill: red; } svg::first-line { fill: blue; }",
        );
        engine.add_stylesheet(Origin::Author, sheet);
        let fill = engine.registry().index_of("fill").unwrap();
        assert_eq!(
            engine.computed_value(&doc, svg, None, fill),
            Value::rgb(255.0, 0.0, 0.0)
        );
        assert_eq!(
            engine.computed_value(&doc, svg, Some(PseudoElement::FirstLine), fill),
            Value::rgb(0.0, 0.0, 255.0)
        );
        // Unset slots inherit from the element itself.
        let color = engine.registry().index_of("color").unwrap();
        assert_eq!(
            engine.computed_value(&doc, svg, Some(PseudoElement::FirstLine), color),
            Value::rgb(0.0, 0.0, 0.0)
        );
    }

    #[test]
    fn test_stylesheet_mutation_clears_cache() {
        let mut engine = engine();
        let (doc, svg) = single_node();
        engine.style_map(&doc, svg, None);
        assert!(!engine.cache.is_empty());
        engine.add_stylesheet(
            Origin::Author,
            StyleSheet::parse(engine.registry(), "svg { fill: none; }"),
        );
        assert!(engine.cache.is_empty());
    }

    #[test]
    fn test_imported_rules_precede_importer() {
        let mut engine = engine();
        let (doc, svg) = single_node();
        let sheet = StyleSheet::parse(
            engine.registry(),
            "@import url(base.css); svg { stroke-width: 3; }",
        );
        engine.add_stylesheet(Origin::Author, sheet);
        engine.load_imports(Origin::Author, |uri| {
            assert_eq!(uri, "base.css");
            Ok("svg { stroke-width: 7; fill: none; }".to_string())
        });
        let width = engine.registry().index_of("stroke-width").unwrap();
        let fill = engine.registry().index_of("fill").unwrap();
        // The importing sheet's own rule wins on order.
        assert_eq!(engine.computed_value(&doc, svg, None, width), Value::number(3.0));
        assert_eq!(
            engine.computed_value(&doc, svg, None, fill),
            Value::ident("none")
        );
    }

    #[test]
    fn test_missing_import_degrades() {
        let mut engine = engine();
        let (doc, svg) = single_node();
        let sheet = StyleSheet::parse(
            engine.registry(),
            "@import url(gone.css); svg { stroke-width: 3; }",
        );
        engine.add_stylesheet(Origin::Author, sheet);
        engine.load_imports(Origin::Author, |uri| {
            Err(crate::error::Error::ResourceUnavailable(uri.to_string()))
        });
        let width = engine.registry().index_of("stroke-width").unwrap();
        assert_eq!(engine.computed_value(&doc, svg, None, width), Value::number(3.0));
    }
}
