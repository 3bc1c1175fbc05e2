//! Per-element computed style storage.
//!
//! A [`StyleMap`] holds one value slot per registered property plus a word
//! of flags per slot. Maps are built once by a cascade pass and then only
//! read; invalidation discards the whole map instead of mutating it.

use crate::value::Value;

/// Per-slot state bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags(u16);

impl Flags {
    /// The winning declaration carried `!important`.
    pub const IMPORTANT: Flags = Flags(1 << 0);
    /// The slot holds a computed value, not a raw cascaded one.
    pub const COMPUTED: Flags = Flags(1 << 1);
    /// The slot's value came from the parent map.
    pub const INHERITED: Flags = Flags(1 << 2);
    /// Computation consulted the parent's value of the same property.
    pub const PARENT_RELATIVE: Flags = Flags(1 << 3);
    /// Computation consulted this element's font-size.
    pub const FONT_SIZE_RELATIVE: Flags = Flags(1 << 4);
    /// Computation consulted this element's line-height.
    pub const LINE_HEIGHT_RELATIVE: Flags = Flags(1 << 5);
    /// Computation consulted this element's color.
    pub const COLOR_RELATIVE: Flags = Flags(1 << 6);
    /// Computation consulted the containing block width.
    pub const BLOCK_WIDTH_RELATIVE: Flags = Flags(1 << 7);
    /// Computation consulted the containing block height.
    pub const BLOCK_HEIGHT_RELATIVE: Flags = Flags(1 << 8);

    pub fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Flags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Flags) {
        self.0 &= !other.0;
    }

    pub fn intersects(self, other: Flags) -> bool {
        self.0 & other.0 != 0
    }
}

impl std::ops::BitOr for Flags {
    type Output = Flags;
    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

/// Computed (or mid-cascade) style of one (element, pseudo-element) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleMap {
    values: Vec<Value>,
    flags: Vec<Flags>,
}

impl StyleMap {
    /// An empty map sized for a registry of `len` properties. Slots start
    /// as unitless zero until the cascade fills them.
    pub fn new(len: usize) -> Self {
        StyleMap {
            values: vec![Value::number(0.0); len],
            flags: vec![Flags::default(); len],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, index: usize) -> &Value {
        &self.values[index]
    }

    pub fn set_value(&mut self, index: usize, value: Value) {
        self.values[index] = value;
    }

    pub fn flags(&self, index: usize) -> Flags {
        self.flags[index]
    }

    pub fn set_flags(&mut self, index: usize, flags: Flags) {
        self.flags[index].insert(flags);
    }

    pub fn clear_flags(&mut self, index: usize, flags: Flags) {
        self.flags[index].remove(flags);
    }

    pub fn is_important(&self, index: usize) -> bool {
        self.flags[index].contains(Flags::IMPORTANT)
    }

    pub fn is_computed(&self, index: usize) -> bool {
        self.flags[index].contains(Flags::COMPUTED)
    }

    /// True if any slot carries one of `flags`.
    pub fn any_flagged(&self, flags: Flags) -> bool {
        self.flags.iter().any(|f| f.intersects(flags))
    }

    /// Indices whose computed value differs between the two maps.
    pub fn diff(&self, other: &StyleMap) -> Vec<usize> {
        debug_assert_eq!(self.len(), other.len());
        (0..self.len())
            .filter(|&i| self.values[i] != other.values[i])
            .collect()
    }
}
