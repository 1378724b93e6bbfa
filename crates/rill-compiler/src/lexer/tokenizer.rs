//! Tokenizer driving the three matchers.
//!
//! Exact patterns go to the string DFA, regex patterns to the NFA when they
//! fit its subset and to the regex fallback otherwise. Every matcher runs at
//! each position and `TokenMatch` keeps the winner.

use std::io;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::grammar::{GrammarError, GrammarErrorKind, ParseError, ParseErrorKind, ParseLog};

use super::nfa::Nfa;
use super::pattern::{PatternKind, TokenId, TokenPattern};
use super::reader::ReaderBuffer;
use super::regex::RegexMatcher;
use super::string_dfa::StringDfa;
use super::token::{Position, Token, TokenIndex, TokenList};

/// Best match seen so far at one position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenMatch {
    pub length: usize,
    pub id: Option<TokenId>,
}

impl TokenMatch {
    /// Take a strictly longer match, or an equally long one from a lower id.
    pub fn update(&mut self, length: usize, id: TokenId) {
        if length == 0 {
            return;
        }
        let better = length > self.length
            || (length == self.length && self.id.is_none_or(|current| id < current));
        if better {
            self.length = length;
            self.id = Some(id);
        }
    }
}

/// Prepared token patterns. Immutable once `prepare` has run.
#[derive(Clone, Debug)]
pub struct Tokenizer {
    patterns: IndexMap<TokenId, TokenPattern>,
    strings: StringDfa,
    nfa: Nfa,
    fallback_patterns: Vec<(TokenId, String)>,
    fallback: Option<RegexMatcher>,
    ignore_case: bool,
}

impl Tokenizer {
    pub fn new(ignore_case: bool) -> Self {
        Self {
            patterns: IndexMap::new(),
            strings: StringDfa::new(ignore_case),
            nfa: Nfa::new(ignore_case),
            fallback_patterns: Vec::new(),
            fallback: None,
            ignore_case,
        }
    }

    pub fn add_pattern(&mut self, pattern: TokenPattern) -> Result<(), GrammarError> {
        if self.patterns.contains_key(&pattern.id) {
            return Err(GrammarError::new(
                GrammarErrorKind::InvalidToken,
                &pattern.name,
                format!("duplicate token id {}", pattern.id.0),
            ));
        }
        if pattern.pattern.is_empty() {
            return Err(GrammarError::new(
                GrammarErrorKind::InvalidToken,
                &pattern.name,
                "empty pattern",
            ));
        }

        match pattern.kind {
            PatternKind::Exact => self.strings.add(&pattern.pattern, pattern.id),
            PatternKind::Regex => {
                if let Err(reason) = self.nfa.add(&pattern.pattern, pattern.id) {
                    trace!(token = %pattern.name, %reason, "regex pattern routed to fallback");
                    self.fallback_patterns
                        .push((pattern.id, pattern.pattern.clone()));
                    self.fallback = None;
                }
            }
        }
        self.patterns.insert(pattern.id, pattern);
        Ok(())
    }

    /// Compile the regex fallback. Must run before tokenizing.
    #[tracing::instrument(level = "debug", skip_all, fields(fallback = self.fallback_patterns.len()))]
    pub fn prepare(&mut self) -> Result<(), GrammarError> {
        if self.fallback_patterns.is_empty() || self.fallback.is_some() {
            return Ok(());
        }
        let matcher = RegexMatcher::build(&self.fallback_patterns, self.ignore_case).map_err(|e| {
            let name = self
                .fallback_patterns
                .iter()
                .find(|(_, p)| *p == e.pattern)
                .and_then(|(id, _)| self.patterns.get(id))
                .map_or_else(|| e.pattern.clone(), |p| p.name.clone());
            GrammarError::new(GrammarErrorKind::InvalidToken, &name, e.detail)
        })?;
        self.fallback = Some(matcher);
        debug!("tokenizer prepared");
        Ok(())
    }

    pub fn pattern(&self, id: TokenId) -> Option<&TokenPattern> {
        self.patterns.get(&id)
    }

    pub fn patterns(&self) -> impl Iterator<Item = &TokenPattern> {
        self.patterns.values()
    }

    /// Quoted literal or `<NAME>` for use in expected-token lists.
    pub fn describe(&self, id: TokenId) -> String {
        self.pattern(id)
            .map_or_else(|| format!("<{id}>"), TokenPattern::describe)
    }

    pub fn stream(&self, source: ReaderBuffer) -> TokenStream<'_> {
        TokenStream {
            tokenizer: self,
            buffer: source,
            tokens: TokenList::new(),
        }
    }

    /// All non-ignored tokens of `source`; lexical errors are collected.
    pub fn tokens(&self, source: ReaderBuffer) -> Result<Vec<Token>, ParseLog> {
        let mut stream = self.stream(source);
        let mut out = Vec::new();
        let mut log = ParseLog::default();
        loop {
            match stream.next() {
                Ok(Some(idx)) => out.push(stream.token(idx).clone()),
                Ok(None) => break,
                Err(e) => log.push(e),
            }
        }
        if log.is_empty() { Ok(out) } else { Err(log) }
    }

    fn match_at(&self, buffer: &mut ReaderBuffer) -> io::Result<TokenMatch> {
        let mut m = TokenMatch::default();
        if !self.strings.is_empty()
            && let Some((id, len)) = self.strings.match_longest(buffer)?
        {
            m.update(len, id);
        }
        if !self.nfa.is_empty()
            && let Some((id, len)) = self.nfa.match_longest(buffer)?
        {
            m.update(len, id);
        }
        if let Some(fallback) = &self.fallback
            && let Some((id, len)) = fallback.match_longest(buffer)?
        {
            m.update(len, id);
        }
        Ok(m)
    }
}

/// Tokenizing state for one source.
#[derive(Debug)]
pub struct TokenStream<'t> {
    tokenizer: &'t Tokenizer,
    buffer: ReaderBuffer,
    tokens: TokenList,
}

impl<'t> TokenStream<'t> {
    /// Restart on a new source, keeping the prepared patterns.
    pub fn reset(&mut self, source: ReaderBuffer) {
        self.buffer = source;
        self.tokens.clear();
    }

    pub fn tokenizer(&self) -> &'t Tokenizer {
        self.tokenizer
    }

    /// Next non-ignored token, or `None` at end of input.
    ///
    /// An unmatched character is consumed before its error is returned, so
    /// calling again continues after it.
    pub fn next(&mut self) -> Result<Option<TokenIndex>, ParseError> {
        loop {
            let start = self.position();
            let offset = self.buffer.offset();
            let m = self
                .tokenizer
                .match_at(&mut self.buffer)
                .map_err(|e| self.io_error(e))?;

            let Some(id) = m.id else {
                let Some(c) = self.buffer.peek(0).map_err(|e| self.io_error(e))? else {
                    return Ok(None);
                };
                self.buffer.read(1).map_err(|e| self.io_error(e))?;
                return Err(ParseError::new(
                    ParseErrorKind::UnexpectedChar,
                    c.to_string(),
                    start,
                    offset..self.buffer.offset(),
                ));
            };

            let image = self
                .buffer
                .read(m.length)
                .map_err(|e| self.io_error(e))?;
            let span = offset..self.buffer.offset();
            let idx = self
                .tokens
                .push(Token::new(id, image, start, self.position(), span.clone()));

            let Some(pattern) = self.tokenizer.pattern(id) else {
                return Err(ParseError::new(
                    ParseErrorKind::Internal,
                    format!("matched unregistered token {id}"),
                    start,
                    span,
                ));
            };
            if let Some(message) = &pattern.error {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidToken,
                    message.clone(),
                    start,
                    span,
                ));
            }
            if !pattern.ignore {
                return Ok(Some(idx));
            }
        }
    }

    pub fn token(&self, idx: TokenIndex) -> &Token {
        &self.tokens[idx]
    }

    /// Every token produced so far, ignored ones included.
    pub fn tokens(&self) -> &TokenList {
        &self.tokens
    }

    /// Position of the next unread character.
    pub fn position(&self) -> Position {
        Position::new(self.buffer.line(), self.buffer.column())
    }

    pub fn offset(&self) -> usize {
        self.buffer.offset()
    }

    fn io_error(&self, e: io::Error) -> ParseError {
        let offset = self.buffer.offset();
        ParseError::new(ParseErrorKind::Io, e.to_string(), self.position(), offset..offset)
    }
}
