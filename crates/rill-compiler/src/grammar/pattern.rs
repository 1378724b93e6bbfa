//! Production patterns.

use std::fmt;

use crate::lexer::TokenId;

use super::lookahead::LookAheadSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PatternId(pub u16);

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Grammar symbol referenced by an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    Token(TokenId),
    Production(PatternId),
}

/// Symbol with a repetition range.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub symbol: Symbol,
    pub min: u32,
    /// `None` is unbounded.
    pub max: Option<u32>,
    pub(crate) look_ahead: Option<LookAheadSet>,
}

impl Element {
    pub fn token(id: TokenId) -> Self {
        Self::new(Symbol::Token(id))
    }

    pub fn production(id: PatternId) -> Self {
        Self::new(Symbol::Production(id))
    }

    fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            min: 1,
            max: Some(1),
            look_ahead: None,
        }
    }

    pub fn repeat(mut self, min: u32, max: Option<u32>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn optional(self) -> Self {
        self.repeat(0, Some(1))
    }

    pub fn zero_or_more(self) -> Self {
        self.repeat(0, None)
    }

    pub fn one_or_more(self) -> Self {
        self.repeat(1, None)
    }

    pub fn is_fixed(&self) -> bool {
        self.max == Some(self.min)
    }

    pub fn look_ahead(&self) -> Option<&LookAheadSet> {
        self.look_ahead.as_ref()
    }

    /// Whether `count` further repetitions are allowed.
    pub(crate) fn allows(&self, count: u32) -> bool {
        self.max.is_none_or(|max| count < max)
    }
}

/// Ordered element sequence.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Alternative {
    pub elements: Vec<Element>,
    pub(crate) look_ahead: Option<LookAheadSet>,
}

impl Alternative {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, element: Element) -> Self {
        self.elements.push(element);
        self
    }

    pub fn token(self, id: TokenId) -> Self {
        self.then(Element::token(id))
    }

    pub fn production(self, id: PatternId) -> Self {
        self.then(Element::production(id))
    }

    /// All elements optional: the alternative accepts empty input.
    pub fn matches_empty(&self) -> bool {
        self.elements.iter().all(|e| e.min == 0)
    }

    /// First element is the owning production itself.
    pub fn is_left_recursive(&self, owner: PatternId) -> bool {
        self.elements
            .first()
            .is_some_and(|e| e.symbol == Symbol::Production(owner))
    }

    pub fn look_ahead(&self) -> Option<&LookAheadSet> {
        self.look_ahead.as_ref()
    }
}

/// Named rule with ordered alternatives.
#[derive(Clone, Debug, PartialEq)]
pub struct ProductionPattern {
    pub id: PatternId,
    pub name: String,
    /// Elided from the parse tree; its children are spliced into the parent.
    pub synthetic: bool,
    pub alternatives: Vec<Alternative>,
    pub(crate) default_alt: Option<usize>,
    pub(crate) look_ahead: Option<LookAheadSet>,
}

impl ProductionPattern {
    pub fn new(id: PatternId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            synthetic: false,
            alternatives: Vec::new(),
            default_alt: None,
            look_ahead: None,
        }
    }

    pub fn synthetic(id: PatternId, name: impl Into<String>) -> Self {
        Self {
            synthetic: true,
            ..Self::new(id, name)
        }
    }

    pub fn alt(mut self, alternative: Alternative) -> Self {
        self.alternatives.push(alternative);
        self
    }

    /// Alternative chosen when the others' look-ahead does not match.
    pub fn default_alternative(&self) -> Option<usize> {
        self.default_alt
    }

    pub fn look_ahead(&self) -> Option<&LookAheadSet> {
        self.look_ahead.as_ref()
    }
}
