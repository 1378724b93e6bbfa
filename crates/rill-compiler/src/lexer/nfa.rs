//! Restricted regular expressions compiled to a Thompson NFA.
//!
//! Supported: literals, `.`, classes with ranges and negation, `\d \D \s \S
//! \w \W`, control and hex escapes, groups, alternation and the greedy
//! quantifiers `? * + {m} {m,} {m,n}`. Anything else is rejected with
//! `Unsupported` and the tokenizer hands the pattern to the regex fallback.

use std::io;

use super::pattern::TokenId;
use super::reader::ReaderBuffer;
use super::string_dfa::case_variants;

/// Upper bound on `{m,n}` counts; larger repetitions go to the fallback.
const MAX_REPEAT: u32 = 256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported construct at {position}: {reason}")]
pub struct Unsupported {
    pub position: usize,
    pub reason: &'static str,
}

#[derive(Clone, Debug, PartialEq)]
enum Ast {
    Empty,
    Char(char),
    Any,
    Class(CharClass),
    Concat(Vec<Ast>),
    Alt(Vec<Ast>),
    Repeat {
        node: Box<Ast>,
        min: u32,
        max: Option<u32>,
    },
}

#[derive(Clone, Debug, PartialEq)]
enum ClassItem {
    Range(char, char),
    /// Payload is "negated".
    Digit(bool),
    Space(bool),
    Word(bool),
}

impl ClassItem {
    fn matches(&self, c: char) -> bool {
        match *self {
            ClassItem::Range(lo, hi) => lo <= c && c <= hi,
            ClassItem::Digit(neg) => c.is_ascii_digit() != neg,
            ClassItem::Space(neg) => matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c') != neg,
            ClassItem::Word(neg) => (c.is_alphanumeric() || c == '_') != neg,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct CharClass {
    negated: bool,
    items: Vec<ClassItem>,
}

impl CharClass {
    fn matches(&self, c: char, ignore_case: bool) -> bool {
        let hit = case_variants(c, ignore_case)
            .into_iter()
            .any(|v| self.items.iter().any(|item| item.matches(v)));
        hit != self.negated
    }
}

enum Escaped {
    Char(char),
    Item(ClassItem),
}

struct RegexParser {
    chars: Vec<char>,
    pos: usize,
}

impl RegexParser {
    fn parse(pattern: &str) -> Result<Ast, Unsupported> {
        let mut parser = Self {
            chars: pattern.chars().collect(),
            pos: 0,
        };
        let ast = parser.alternation()?;
        if parser.pos < parser.chars.len() {
            return Err(parser.unsupported("unbalanced `)`"));
        }
        Ok(ast)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn unsupported(&self, reason: &'static str) -> Unsupported {
        Unsupported {
            position: self.pos,
            reason,
        }
    }

    fn alternation(&mut self) -> Result<Ast, Unsupported> {
        let mut alts = vec![self.concat()?];
        while self.eat('|') {
            alts.push(self.concat()?);
        }
        Ok(if alts.len() == 1 {
            alts.pop().unwrap_or(Ast::Empty)
        } else {
            Ast::Alt(alts)
        })
    }

    fn concat(&mut self) -> Result<Ast, Unsupported> {
        let mut items = Vec::new();
        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            items.push(self.repeat()?);
        }
        Ok(match items.len() {
            0 => Ast::Empty,
            1 => items.pop().unwrap_or(Ast::Empty),
            _ => Ast::Concat(items),
        })
    }

    fn repeat(&mut self) -> Result<Ast, Unsupported> {
        let atom = self.atom()?;
        let (min, max) = match self.peek() {
            Some('?') => (0, Some(1)),
            Some('*') => (0, None),
            Some('+') => (1, None),
            Some('{') => self.bounds()?,
            _ => return Ok(atom),
        };
        // The quantifier char, or the closing brace of `{m,n}`.
        self.pos += 1;
        if matches!(self.peek(), Some('?' | '+')) {
            return Err(self.unsupported("lazy or possessive quantifier"));
        }
        Ok(Ast::Repeat {
            node: Box::new(atom),
            min,
            max,
        })
    }

    /// `{m}`, `{m,}` or `{m,n}`. Leaves the position on the closing brace.
    fn bounds(&mut self) -> Result<(u32, Option<u32>), Unsupported> {
        self.pos += 1;
        let min = self
            .number()
            .ok_or_else(|| self.unsupported("malformed repetition"))?;
        let max = if self.eat(',') {
            if self.peek() == Some('}') {
                None
            } else {
                Some(
                    self.number()
                        .ok_or_else(|| self.unsupported("malformed repetition"))?,
                )
            }
        } else {
            Some(min)
        };
        if self.peek() != Some('}') {
            return Err(self.unsupported("malformed repetition"));
        }
        if max.is_some_and(|m| m < min) || max.unwrap_or(min) > MAX_REPEAT {
            return Err(self.unsupported("repetition bounds"));
        }
        Ok((min, max))
    }

    fn number(&mut self) -> Option<u32> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return None;
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        digits.parse().ok()
    }

    fn atom(&mut self) -> Result<Ast, Unsupported> {
        let Some(c) = self.next() else {
            return Err(self.unsupported("unexpected end of pattern"));
        };
        match c {
            '(' => {
                if self.peek() == Some('?') {
                    return Err(self.unsupported("group options"));
                }
                let inner = self.alternation()?;
                if !self.eat(')') {
                    return Err(self.unsupported("unterminated group"));
                }
                Ok(inner)
            }
            '[' => self.class(),
            '.' => Ok(Ast::Any),
            '\\' => Ok(match self.escape()? {
                Escaped::Char(c) => Ast::Char(c),
                Escaped::Item(item) => Ast::Class(CharClass {
                    negated: false,
                    items: vec![item],
                }),
            }),
            '^' | '$' => Err(self.unsupported("anchor")),
            '*' | '+' | '?' | '{' => Err(self.unsupported("quantifier without operand")),
            c => Ok(Ast::Char(c)),
        }
    }

    fn escape(&mut self) -> Result<Escaped, Unsupported> {
        let Some(c) = self.next() else {
            return Err(self.unsupported("trailing backslash"));
        };
        Ok(match c {
            'd' => Escaped::Item(ClassItem::Digit(false)),
            'D' => Escaped::Item(ClassItem::Digit(true)),
            's' => Escaped::Item(ClassItem::Space(false)),
            'S' => Escaped::Item(ClassItem::Space(true)),
            'w' => Escaped::Item(ClassItem::Word(false)),
            'W' => Escaped::Item(ClassItem::Word(true)),
            't' => Escaped::Char('\t'),
            'n' => Escaped::Char('\n'),
            'r' => Escaped::Char('\r'),
            'f' => Escaped::Char('\x0c'),
            'v' => Escaped::Char('\x0b'),
            'e' => Escaped::Char('\x1b'),
            'a' => Escaped::Char('\x07'),
            'x' => Escaped::Char(self.hex(2)?),
            'u' => Escaped::Char(self.hex(4)?),
            c if c.is_ascii_alphanumeric() => return Err(self.unsupported("escape sequence")),
            c => Escaped::Char(c),
        })
    }

    fn hex(&mut self, digits: usize) -> Result<char, Unsupported> {
        let end = self.pos + digits;
        if end > self.chars.len() {
            return Err(self.unsupported("truncated hex escape"));
        }
        let text: String = self.chars[self.pos..end].iter().collect();
        let value =
            u32::from_str_radix(&text, 16).map_err(|_| self.unsupported("invalid hex escape"))?;
        self.pos = end;
        char::from_u32(value).ok_or_else(|| self.unsupported("invalid hex escape"))
    }

    fn class(&mut self) -> Result<Ast, Unsupported> {
        let negated = self.eat('^');
        let mut items = Vec::new();
        let mut first = true;
        loop {
            let Some(c) = self.next() else {
                return Err(self.unsupported("unterminated class"));
            };
            if c == ']' && !first {
                break;
            }
            first = false;

            let lo = if c == '\\' {
                match self.escape()? {
                    Escaped::Char(c) => c,
                    Escaped::Item(item) => {
                        items.push(item);
                        continue;
                    }
                }
            } else {
                c
            };

            let is_range = self.peek() == Some('-')
                && self.chars.get(self.pos + 1).is_some_and(|&n| n != ']');
            if !is_range {
                items.push(ClassItem::Range(lo, lo));
                continue;
            }
            self.pos += 1;
            let hi = match self.next() {
                Some('\\') => match self.escape()? {
                    Escaped::Char(c) => c,
                    Escaped::Item(_) => return Err(self.unsupported("class in range")),
                },
                Some(c) => c,
                None => return Err(self.unsupported("unterminated class")),
            };
            if hi < lo {
                return Err(self.unsupported("reversed range"));
            }
            items.push(ClassItem::Range(lo, hi));
        }
        Ok(Ast::Class(CharClass { negated, items }))
    }
}

#[derive(Clone, Debug)]
enum NState {
    Char(char, u32),
    Any(u32),
    Class(usize, u32),
    /// Epsilon fan-out.
    Split(Vec<u32>),
    Match(TokenId),
}

/// Many patterns sharing one state table, simulated together.
#[derive(Clone, Debug)]
pub struct Nfa {
    states: Vec<NState>,
    classes: Vec<CharClass>,
    starts: Vec<u32>,
    /// Pattern indices whose first character may be this ASCII char.
    first_ascii: Vec<Vec<usize>>,
    first_non_ascii: Vec<usize>,
    ignore_case: bool,
}

impl Nfa {
    pub fn new(ignore_case: bool) -> Self {
        Self {
            states: Vec::new(),
            classes: Vec::new(),
            starts: Vec::new(),
            first_ascii: vec![Vec::new(); 128],
            first_non_ascii: Vec::new(),
            ignore_case,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Compile and add `pattern`. Nothing is added when it is rejected.
    pub fn add(&mut self, pattern: &str, id: TokenId) -> Result<(), Unsupported> {
        let ast = RegexParser::parse(pattern)?;
        let accept = self.push(NState::Match(id));
        let start = self.compile(&ast, accept);
        let index = self.starts.len();
        self.starts.push(start);

        let mut initial = Vec::new();
        self.closure(start, &mut initial, &mut vec![false; self.states.len()]);
        for b in 0u8..128 {
            let c = b as char;
            if initial.iter().any(|&s| self.consumes(s, c)) {
                self.first_ascii[b as usize].push(index);
            }
        }
        if initial.iter().any(|&s| self.may_consume_non_ascii(s)) {
            self.first_non_ascii.push(index);
        }
        Ok(())
    }

    /// Longest match over all patterns; equal lengths go to the lowest id.
    pub fn match_longest(&self, buffer: &mut ReaderBuffer) -> io::Result<Option<(TokenId, usize)>> {
        let Some(first) = buffer.peek(0)? else {
            return Ok(None);
        };
        let candidates = if first.is_ascii() {
            &self.first_ascii[first as usize]
        } else {
            &self.first_non_ascii
        };
        if candidates.is_empty() {
            return Ok(None);
        }

        let mut seen = vec![false; self.states.len()];
        let mut current = Vec::new();
        for &p in candidates {
            self.closure(self.starts[p], &mut current, &mut seen);
        }

        let mut best = None;
        let mut len = 0;
        loop {
            if len > 0 {
                let accepted = current
                    .iter()
                    .filter_map(|&s| match self.states[s as usize] {
                        NState::Match(id) => Some(id),
                        _ => None,
                    })
                    .min();
                if let Some(id) = accepted {
                    best = Some((id, len));
                }
            }
            let Some(c) = buffer.peek(len)? else {
                break;
            };

            seen.fill(false);
            let mut next = Vec::new();
            for &s in &current {
                if let Some(target) = self.transition(s, c) {
                    self.closure(target, &mut next, &mut seen);
                }
            }
            if next.is_empty() {
                break;
            }
            current = next;
            len += 1;
        }
        Ok(best)
    }

    fn push(&mut self, state: NState) -> u32 {
        self.states.push(state);
        (self.states.len() - 1) as u32
    }

    /// Build `ast` so that completing it continues at `next`; returns the entry state.
    fn compile(&mut self, ast: &Ast, next: u32) -> u32 {
        match ast {
            Ast::Empty => next,
            Ast::Char(c) => self.push(NState::Char(*c, next)),
            Ast::Any => self.push(NState::Any(next)),
            Ast::Class(class) => {
                self.classes.push(class.clone());
                let idx = self.classes.len() - 1;
                self.push(NState::Class(idx, next))
            }
            Ast::Concat(items) => items
                .iter()
                .rev()
                .fold(next, |rest, item| self.compile(item, rest)),
            Ast::Alt(alts) => {
                let starts = alts.iter().map(|a| self.compile(a, next)).collect();
                self.push(NState::Split(starts))
            }
            Ast::Repeat { node, min, max } => {
                let mut entry = match max {
                    None => {
                        let looped = self.push(NState::Split(Vec::new()));
                        let body = self.compile(node, looped);
                        self.states[looped as usize] = NState::Split(vec![body, next]);
                        looped
                    }
                    Some(max) => {
                        let mut rest = next;
                        for _ in *min..*max {
                            let body = self.compile(node, rest);
                            rest = self.push(NState::Split(vec![body, rest]));
                        }
                        rest
                    }
                };
                for _ in 0..*min {
                    entry = self.compile(node, entry);
                }
                entry
            }
        }
    }

    fn closure(&self, state: u32, out: &mut Vec<u32>, seen: &mut [bool]) {
        if seen[state as usize] {
            return;
        }
        seen[state as usize] = true;
        match &self.states[state as usize] {
            NState::Split(targets) => {
                for &t in targets {
                    self.closure(t, out, seen);
                }
            }
            _ => out.push(state),
        }
    }

    fn consumes(&self, state: u32, c: char) -> bool {
        self.transition(state, c).is_some()
    }

    fn transition(&self, state: u32, c: char) -> Option<u32> {
        match self.states[state as usize] {
            NState::Char(expected, next) => {
                let hit = expected == c
                    || (self.ignore_case && case_variants(expected, true).contains(&c));
                hit.then_some(next)
            }
            NState::Any(next) => (c != '\n').then_some(next),
            NState::Class(idx, next) => self.classes[idx]
                .matches(c, self.ignore_case)
                .then_some(next),
            NState::Split(_) | NState::Match(_) => None,
        }
    }

    fn may_consume_non_ascii(&self, state: u32) -> bool {
        match self.states[state as usize] {
            NState::Char(c, _) => case_variants(c, self.ignore_case)
                .iter()
                .any(|v| !v.is_ascii()),
            NState::Any(_) | NState::Class(..) => true,
            NState::Split(_) | NState::Match(_) => false,
        }
    }
}
