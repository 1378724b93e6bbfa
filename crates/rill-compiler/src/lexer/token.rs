//! Token arena.
//!
//! Every token the tokenizer produces, ignored ones included, is appended to a
//! `TokenList` and linked to its neighbours by index.

use std::fmt;
use std::ops::Range;

use super::pattern::TokenId;

/// 1-based source position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TokenIndex(pub u32);

impl TokenIndex {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub id: TokenId,
    pub image: String,
    pub start: Position,
    /// Position just past the last character.
    pub end: Position,
    /// Byte range in the source.
    pub span: Range<usize>,
    prev: Option<TokenIndex>,
    next: Option<TokenIndex>,
}

impl Token {
    pub fn new(id: TokenId, image: String, start: Position, end: Position, span: Range<usize>) -> Self {
        Self {
            id,
            image,
            start,
            end,
            span,
            prev: None,
            next: None,
        }
    }

    pub fn prev(&self) -> Option<TokenIndex> {
        self.prev
    }

    pub fn next(&self) -> Option<TokenIndex> {
        self.next
    }

    /// Image shortened for error messages.
    pub fn short_image(&self) -> String {
        const MAX: usize = 25;
        let first_line = self.image.lines().next().unwrap_or_default();
        if first_line.chars().count() > MAX || first_line.len() < self.image.len() {
            let cut: String = first_line.chars().take(MAX).collect();
            format!("{cut}...")
        } else {
            self.image.clone()
        }
    }
}

/// Doubly-linked tokens stored contiguously.
#[derive(Clone, Debug, Default)]
pub struct TokenList {
    tokens: Vec<Token>,
    first: Option<TokenIndex>,
    last: Option<TokenIndex>,
}

impl TokenList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append and link after the current last token.
    pub fn push(&mut self, mut token: Token) -> TokenIndex {
        let idx = TokenIndex(self.tokens.len() as u32);
        token.prev = self.last;
        token.next = None;
        if let Some(last) = self.last {
            self.tokens[last.index()].next = Some(idx);
        } else {
            self.first = Some(idx);
        }
        self.last = Some(idx);
        self.tokens.push(token);
        idx
    }

    /// Detach a token from the chain. It stays addressable by index.
    pub fn unlink(&mut self, idx: TokenIndex) {
        let Some(token) = self.tokens.get_mut(idx.index()) else {
            return;
        };
        let (prev, next) = (token.prev.take(), token.next.take());
        match prev {
            Some(p) => self.tokens[p.index()].next = next,
            None if self.first == Some(idx) => self.first = next,
            None => {}
        }
        match next {
            Some(n) => self.tokens[n.index()].prev = prev,
            None if self.last == Some(idx) => self.last = prev,
            None => {}
        }
    }

    pub fn get(&self, idx: TokenIndex) -> Option<&Token> {
        self.tokens.get(idx.index())
    }

    pub fn first(&self) -> Option<TokenIndex> {
        self.first
    }

    pub fn last(&self) -> Option<TokenIndex> {
        self.last
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
        self.first = None;
        self.last = None;
    }

    /// Linked tokens in chain order.
    pub fn iter(&self) -> impl Iterator<Item = &Token> + '_ {
        let mut cursor = self.first;
        std::iter::from_fn(move || {
            let token = self.get(cursor?)?;
            cursor = token.next;
            Some(token)
        })
    }
}

impl std::ops::Index<TokenIndex> for TokenList {
    type Output = Token;

    fn index(&self, idx: TokenIndex) -> &Token {
        &self.tokens[idx.index()]
    }
}
