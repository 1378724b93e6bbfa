//! Grammar assembly and the recursive-descent parser.
//!
//! `GrammarBuilder` collects token and production patterns, `prepare`
//! validates them and computes look-ahead, yielding an immutable `Grammar`.
//! Each `Grammar::parse` call runs a fresh `Parser` over one source.
//!
//! Error recovery: a failed element logs its error, skips one token and
//! retries. Errors found within the next three matched tokens are assumed to
//! be follow-ups and are not logged.

use std::collections::VecDeque;
use std::fmt::Write as _;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::lexer::{ReaderBuffer, TokenId, TokenIndex, TokenPattern, TokenStream, Tokenizer};

use super::analysis::Analysis;
use super::error::{GrammarError, GrammarErrorKind, ParseError, ParseErrorKind, ParseLog};
use super::lookahead::LookAheadSet;
use super::node::{Analyzer, Node, NodeKind};
use super::pattern::{Element, PatternId, ProductionPattern, Symbol};

/// Tokens matched after an error before errors are logged again.
const RECOVERY_TOKENS: i32 = 3;

/// Why a parse produced no tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseFailure<E> {
    Syntax(ParseLog),
    Analysis(E),
}

/// Unwinds the parser: a recoverable syntax error or an analyzer failure.
#[derive(Debug)]
enum Interrupt<E> {
    Parse(ParseError),
    Fatal(E),
}

impl<E> From<ParseError> for Interrupt<E> {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

#[derive(Debug)]
pub struct GrammarBuilder {
    tokenizer: Tokenizer,
    patterns: IndexMap<PatternId, ProductionPattern>,
    start: Option<PatternId>,
}

impl GrammarBuilder {
    pub fn new(ignore_case: bool) -> Self {
        Self {
            tokenizer: Tokenizer::new(ignore_case),
            patterns: IndexMap::new(),
            start: None,
        }
    }

    pub fn add_token(&mut self, pattern: TokenPattern) -> Result<(), GrammarError> {
        self.tokenizer.add_pattern(pattern)
    }

    /// Register a production. The first one registered is the default start.
    pub fn add_production(&mut self, pattern: ProductionPattern) -> Result<(), GrammarError> {
        let invalid = |detail: String| {
            GrammarError::new(GrammarErrorKind::InvalidProduction, &pattern.name, detail)
        };
        if self.patterns.contains_key(&pattern.id) {
            return Err(invalid(format!("duplicate production id {}", pattern.id)));
        }
        if pattern.alternatives.is_empty() {
            return Err(invalid("no alternatives".to_string()));
        }
        for (i, alt) in pattern.alternatives.iter().enumerate() {
            if alt.elements.is_empty() || alt.matches_empty() {
                return Err(invalid(format!("alternative {} matches empty input", i + 1)));
            }
            if alt.is_left_recursive(pattern.id) {
                return Err(invalid(format!("alternative {} is left recursive", i + 1)));
            }
            if alt
                .elements
                .iter()
                .any(|e| e.max.is_some_and(|max| max == 0 || max < e.min))
            {
                return Err(invalid(format!(
                    "alternative {} has an invalid repetition",
                    i + 1
                )));
            }
        }
        self.start.get_or_insert(pattern.id);
        self.patterns.insert(pattern.id, pattern);
        Ok(())
    }

    pub fn start(&mut self, id: PatternId) {
        self.start = Some(id);
    }

    /// Validate references and compute look-ahead for every production.
    #[tracing::instrument(level = "debug", skip_all, fields(productions = self.patterns.len()))]
    pub fn prepare(mut self) -> Result<Grammar, GrammarError> {
        self.tokenizer.prepare()?;

        let Some(start) = self.start else {
            return Err(GrammarError::new(
                GrammarErrorKind::InvalidParser,
                "",
                "no productions",
            ));
        };
        if !self.patterns.contains_key(&start) {
            return Err(GrammarError::new(
                GrammarErrorKind::InvalidParser,
                "",
                format!("start production {start} is undefined"),
            ));
        }
        self.check_references()?;

        let mut computed = Vec::with_capacity(self.patterns.len());
        {
            let analysis = Analysis::new(&self.patterns, &self.tokenizer);
            for pattern in self.patterns.values() {
                computed.push((pattern.id, analysis.calculate(pattern)?));
            }
        }
        for (id, la) in computed {
            let Some(pattern) = self.patterns.get_mut(&id) else {
                continue;
            };
            for (alt, set) in pattern.alternatives.iter_mut().zip(la.alternatives) {
                alt.look_ahead = Some(set);
            }
            for (alt, pos, set) in la.elements {
                pattern.alternatives[alt].elements[pos].look_ahead = Some(set);
            }
            pattern.default_alt = la.default_alt;
            pattern.look_ahead = Some(la.union);
        }

        debug!("grammar prepared");
        Ok(Grammar {
            tokenizer: self.tokenizer,
            patterns: self.patterns,
            start,
        })
    }

    fn check_references(&self) -> Result<(), GrammarError> {
        for pattern in self.patterns.values() {
            for elem in pattern.alternatives.iter().flat_map(|a| &a.elements) {
                let missing = match elem.symbol {
                    Symbol::Token(id) => self
                        .tokenizer
                        .pattern(id)
                        .is_none()
                        .then(|| format!("undefined token {id}")),
                    Symbol::Production(id) => (!self.patterns.contains_key(&id))
                        .then(|| format!("undefined production {id}")),
                };
                if let Some(detail) = missing {
                    return Err(GrammarError::new(
                        GrammarErrorKind::InvalidProduction,
                        &pattern.name,
                        detail,
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Prepared grammar. Shareable across threads; each parse has its own state.
#[derive(Debug)]
pub struct Grammar {
    tokenizer: Tokenizer,
    patterns: IndexMap<PatternId, ProductionPattern>,
    start: PatternId,
}

impl Grammar {
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn pattern(&self, id: PatternId) -> Option<&ProductionPattern> {
        self.patterns.get(&id)
    }

    pub fn patterns(&self) -> impl Iterator<Item = &ProductionPattern> {
        self.patterns.values()
    }

    pub fn start(&self) -> PatternId {
        self.start
    }

    /// Parse `source` from the start production.
    ///
    /// All syntax errors are collected before failing. `Ok(None)` means the
    /// analyzer dropped the root.
    pub fn parse<A: Analyzer>(
        &self,
        source: ReaderBuffer,
        analyzer: &mut A,
    ) -> Result<Option<Node<A::Value>>, ParseFailure<A::Error>> {
        let mut parser = Parser {
            grammar: self,
            stream: self.tokenizer.stream(source),
            queue: VecDeque::new(),
            log: ParseLog::default(),
            recovery: -1,
            analyzer,
        };
        parser.run()
    }

    /// Indented tree dump, one node per line.
    pub fn format_tree<V>(&self, node: &Node<V>) -> String {
        let mut out = String::new();
        self.write_node(&mut out, node, 0);
        out
    }

    fn write_node<V>(&self, out: &mut String, node: &Node<V>, depth: usize) {
        let indent = "  ".repeat(depth);
        match node.kind() {
            NodeKind::Token { id, image } => {
                let name = self
                    .tokenizer
                    .pattern(*id)
                    .map_or_else(|| id.to_string(), |p| p.name.clone());
                let _ = writeln!(out, "{indent}{name} {image:?}");
            }
            NodeKind::Production(id) => {
                let name = self
                    .pattern(*id)
                    .map_or_else(|| id.to_string(), |p| p.name.clone());
                let _ = writeln!(out, "{indent}{name}");
            }
        }
        for child in node.children() {
            self.write_node(out, child, depth + 1);
        }
    }
}

struct Parser<'g, 'a, A: Analyzer> {
    grammar: &'g Grammar,
    stream: TokenStream<'g>,
    /// Tokens peeked but not yet consumed.
    queue: VecDeque<TokenIndex>,
    log: ParseLog,
    /// -1 before the first error; otherwise tokens left until errors are logged again.
    recovery: i32,
    analyzer: &'a mut A,
}

type Step<T, E> = Result<T, Interrupt<E>>;

impl<A: Analyzer> Parser<'_, '_, A> {
    fn run(&mut self) -> Result<Option<Node<A::Value>>, ParseFailure<A::Error>> {
        match self.parse_start() {
            Ok(node) if self.log.is_empty() => Ok(node),
            Ok(_) => Err(ParseFailure::Syntax(std::mem::take(&mut self.log))),
            Err(Interrupt::Parse(e)) => {
                self.add_error(e, true);
                Err(ParseFailure::Syntax(std::mem::take(&mut self.log)))
            }
            Err(Interrupt::Fatal(e)) => Err(ParseFailure::Analysis(e)),
        }
    }

    fn parse_start(&mut self) -> Step<Option<Node<A::Value>>, A::Error> {
        let node = self.parse_pattern(self.grammar.start)?;
        if let Some(idx) = self.peek(0) {
            let token = self.stream.token(idx);
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedToken,
                token.short_image(),
                token.start,
                token.span.clone(),
            )
            .with_expected(vec!["<EOF>".to_string()])
            .into());
        }
        Ok(node)
    }

    fn parse_pattern(&mut self, id: PatternId) -> Step<Option<Node<A::Value>>, A::Error> {
        let grammar = self.grammar;
        let Some(pattern) = grammar.pattern(id) else {
            return Err(self.internal(format!("undefined production {id}")).into());
        };
        let default = pattern.default_alt;
        for (i, alt) in pattern.alternatives.iter().enumerate() {
            if Some(i) != default && self.is_next_set(alt.look_ahead.as_ref()) {
                return self.parse_alternative(pattern, i);
            }
        }
        if let Some(d) = default
            && self.is_next_set(pattern.alternatives[d].look_ahead.as_ref())
        {
            return self.parse_alternative(pattern, d);
        }

        let longest = pattern
            .alternatives
            .iter()
            .filter_map(|a| a.look_ahead.as_ref())
            .map(LookAheadSet::max_length)
            .max()
            .unwrap_or(1);
        let mut union = LookAheadSet::new(longest);
        for set in pattern.alternatives.iter().filter_map(|a| a.look_ahead.as_ref()) {
            union.add_all(set);
        }
        Err(self.unexpected(union))
    }

    fn parse_alternative(
        &mut self,
        pattern: &'_ ProductionPattern,
        index: usize,
    ) -> Step<Option<Node<A::Value>>, A::Error> {
        let (start, offset) = match self.peek(0) {
            Some(idx) => {
                let token = self.stream.token(idx);
                (token.start, token.span.start)
            }
            None => (self.stream.position(), self.stream.offset()),
        };
        let mut node = Node::production(pattern.id, start, offset);
        self.enter(&mut node, pattern.synthetic)?;

        let elements = &pattern.alternatives[index].elements;
        let mut i = 0;
        while let Some(elem) = elements.get(i) {
            match self.parse_element(&mut node, elem) {
                Ok(()) => i += 1,
                Err(Interrupt::Parse(e)) => {
                    self.add_error(e, true);
                    self.next_token()?;
                }
                Err(fatal) => return Err(fatal),
            }
        }
        self.exit(node, pattern.synthetic)
    }

    fn parse_element(&mut self, node: &mut Node<A::Value>, elem: &Element) -> Step<(), A::Error> {
        let mut count = 0;
        while elem.allows(count) && (count < elem.min || self.is_next_element(elem)) {
            match elem.symbol {
                Symbol::Token(id) => {
                    let idx = self.next_token_of(id)?;
                    let token = self.stream.token(idx);
                    let mut child =
                        Node::token(token.id, token.image.clone(), token.start, token.span.clone());
                    self.enter(&mut child, false)?;
                    let child = self.exit(child, false)?;
                    self.add_node(node, child)?;
                }
                Symbol::Production(id) => {
                    let child = self.parse_pattern(id)?;
                    self.add_node(node, child)?;
                }
            }
            count += 1;
        }
        Ok(())
    }

    fn is_next_element(&mut self, elem: &Element) -> bool {
        if let Some(set) = &elem.look_ahead {
            return self.is_next_set(Some(set));
        }
        match elem.symbol {
            Symbol::Token(id) => self.peek(0).is_some_and(|idx| self.stream.token(idx).id == id),
            Symbol::Production(id) => {
                let grammar = self.grammar;
                self.is_next_set(grammar.pattern(id).and_then(ProductionPattern::look_ahead))
            }
        }
    }

    fn is_next_set(&mut self, set: Option<&LookAheadSet>) -> bool {
        let Some(set) = set else {
            return false;
        };
        let upcoming = self.upcoming(set.longest().max(1));
        set.is_next(&upcoming)
    }

    /// Error for input matching none of `set`, naming the expected tokens.
    ///
    /// Tokens that still fit a prefix of `set` are consumed first so the
    /// error points at the first one that does not.
    fn unexpected(&mut self, mut set: LookAheadSet) -> Interrupt<A::Error> {
        while set.is_next_prefix(&self.upcoming(1), 1) {
            let idx = match self.next_token() {
                Ok(idx) => idx,
                Err(e) => return e,
            };
            set = set.create_next_set(self.stream.token(idx).id);
        }

        let grammar = self.grammar;
        let tokenizer = grammar.tokenizer();
        let expected: Vec<String> = set
            .initial_tokens()
            .into_iter()
            .map(|t| tokenizer.describe(t))
            .collect();
        match self.next_token() {
            Ok(idx) => {
                let token = self.stream.token(idx);
                ParseError::new(
                    ParseErrorKind::UnexpectedToken,
                    token.short_image(),
                    token.start,
                    token.span.clone(),
                )
                .with_expected(expected)
                .into()
            }
            Err(Interrupt::Parse(e)) => Interrupt::Parse(e.with_expected(expected)),
            Err(fatal) => fatal,
        }
    }

    fn enter(&mut self, node: &mut Node<A::Value>, synthetic: bool) -> Step<(), A::Error> {
        if synthetic || self.recovery >= 0 {
            return Ok(());
        }
        self.analyzer.enter(node).map_err(Interrupt::Fatal)
    }

    fn exit(&mut self, node: Node<A::Value>, synthetic: bool) -> Step<Option<Node<A::Value>>, A::Error> {
        if synthetic || self.recovery >= 0 {
            return Ok(Some(node));
        }
        self.analyzer.exit(node).map_err(Interrupt::Fatal)
    }

    /// Attach `child`, splicing in the children of synthetic productions.
    fn add_node(&mut self, parent: &mut Node<A::Value>, child: Option<Node<A::Value>>) -> Step<(), A::Error> {
        let Some(mut child) = child else {
            return Ok(());
        };
        let synthetic = child
            .pattern_id()
            .and_then(|id| self.grammar.pattern(id))
            .is_some_and(|p| p.synthetic);
        if synthetic {
            for grandchild in child.take_children() {
                self.add_node(parent, Some(grandchild))?;
            }
            return Ok(());
        }
        if self.recovery >= 0 {
            parent.add_child(child);
            return Ok(());
        }
        self.analyzer.child(parent, child).map_err(Interrupt::Fatal)
    }

    fn add_error(&mut self, error: ParseError, recovery: bool) {
        if self.recovery <= 0 {
            trace!(%error, "syntax error");
            self.log.push(error);
        }
        if recovery {
            self.recovery = RECOVERY_TOKENS;
        }
    }

    /// Token `steps` ahead of the cursor, tokenizing as needed.
    fn peek(&mut self, steps: usize) -> Option<TokenIndex> {
        while self.queue.len() <= steps {
            match self.stream.next() {
                Ok(Some(idx)) => self.queue.push_back(idx),
                Ok(None) => return None,
                Err(e) => self.add_error(e, true),
            }
        }
        self.queue.get(steps).copied()
    }

    fn upcoming(&mut self, count: usize) -> Vec<TokenId> {
        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            match self.peek(i) {
                Some(idx) => out.push(self.stream.token(idx).id),
                None => break,
            }
        }
        out
    }

    fn next_token(&mut self) -> Step<TokenIndex, A::Error> {
        match self.peek(0) {
            Some(_) => self.queue.pop_front().ok_or_else(|| self.eof().into()),
            None => Err(self.eof().into()),
        }
    }

    fn next_token_of(&mut self, id: TokenId) -> Step<TokenIndex, A::Error> {
        let expected = vec![self.grammar.tokenizer().describe(id)];
        let Some(idx) = self.peek(0) else {
            return Err(self.eof().with_expected(expected).into());
        };
        let token = self.stream.token(idx);
        if token.id != id {
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedToken,
                token.short_image(),
                token.start,
                token.span.clone(),
            )
            .with_expected(expected)
            .into());
        }
        if self.recovery > 0 {
            self.recovery -= 1;
        }
        self.queue.pop_front();
        Ok(idx)
    }

    fn eof(&self) -> ParseError {
        let offset = self.stream.offset();
        ParseError::new(
            ParseErrorKind::UnexpectedEof,
            "",
            self.stream.position(),
            offset..offset,
        )
    }

    fn internal(&self, message: String) -> ParseError {
        let offset = self.stream.offset();
        ParseError::new(ParseErrorKind::Internal, message, self.stream.position(), offset..offset)
    }
}
