//! Ordered declaration lists.
//!
//! A [`StyleDeclaration`] is the parsed body of a rule or inline `style`
//! attribute: `(property index, value, important)` triples in source order.
//! Later triples for the same property win at equal cascade priority, so
//! order is preserved exactly as written.

use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub index: usize,
    pub value: Value,
    pub important: bool,
}

/// An ordered list of declarations against one property registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleDeclaration {
    declarations: Vec<Declaration>,
}

impl StyleDeclaration {
    pub fn new() -> Self {
        StyleDeclaration {
            declarations: Vec::new(),
        }
    }

    /// Append a declaration, keeping any earlier entry for the same
    /// property. Duplicates are resolved by the cascade, not here.
    pub fn append(&mut self, index: usize, value: Value, important: bool) {
        self.declarations.push(Declaration {
            index,
            value,
            important,
        });
    }

    /// The declaration at list position `pos`.
    pub fn get(&self, pos: usize) -> Option<&Declaration> {
        self.declarations.get(pos)
    }

    /// Remove the declaration at list position `pos`, shifting later
    /// entries down.
    pub fn remove(&mut self, pos: usize) -> Option<Declaration> {
        if pos < self.declarations.len() {
            Some(self.declarations.remove(pos))
        } else {
            None
        }
    }

    /// The last declaration for property `index`, mirroring what the
    /// cascade would pick from this list alone.
    pub fn get_property(&self, index: usize) -> Option<&Declaration> {
        self.declarations.iter().rev().find(|d| d.index == index)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }
}

impl<'a> IntoIterator for &'a StyleDeclaration {
    type Item = &'a Declaration;
    type IntoIter = std::slice::Iter<'a, Declaration>;

    fn into_iter(self) -> Self::IntoIter {
        self.declarations.iter()
    }
}
