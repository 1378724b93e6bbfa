//! Look-ahead sets: bounded sets of token sequences.
//!
//! A sequence tagged `repeat` came from a repetition or a recursive
//! production and stands for infinitely many longer inputs. Sets holding one
//! can never be resolved by looking further ahead.

use std::fmt;

use crate::lexer::{TokenId, Tokenizer};

/// Token sequence. Equality ignores the repeat tag.
#[derive(Clone, Debug, Default)]
pub struct Sequence {
    repeat: bool,
    tokens: Vec<TokenId>,
}

impl PartialEq for Sequence {
    fn eq(&self, other: &Self) -> bool {
        self.tokens == other.tokens
    }
}

impl Eq for Sequence {}

impl Sequence {
    pub fn new(repeat: bool, tokens: Vec<TokenId>) -> Self {
        Self { repeat, tokens }
    }

    pub fn single(token: TokenId) -> Self {
        Self::new(false, vec![token])
    }

    /// First `len` tokens of `other`.
    fn truncated(len: usize, other: &Sequence) -> Self {
        Self {
            repeat: other.repeat,
            tokens: other.tokens[..len.min(other.tokens.len())].to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn is_repetitive(&self) -> bool {
        self.repeat
    }

    pub fn tokens(&self) -> &[TokenId] {
        &self.tokens
    }

    pub fn first(&self) -> Option<TokenId> {
        self.tokens.first().copied()
    }

    pub fn starts_with(&self, prefix: &Sequence) -> bool {
        self.tokens.starts_with(&prefix.tokens)
    }

    /// Whether the upcoming tokens begin with this sequence.
    pub fn is_next(&self, upcoming: &[TokenId]) -> bool {
        upcoming.starts_with(&self.tokens)
    }

    /// Whether the first `len` tokens of this sequence are upcoming.
    pub fn is_next_prefix(&self, upcoming: &[TokenId], len: usize) -> bool {
        let n = len.min(self.tokens.len());
        upcoming.starts_with(&self.tokens[..n])
    }

    /// This sequence followed by `other`, cut at `len` tokens.
    fn concat(&self, len: usize, other: &Sequence) -> Self {
        let mut out = Sequence::truncated(len, self);
        out.repeat |= other.repeat;
        let room = len.saturating_sub(self.tokens.len());
        out.tokens
            .extend_from_slice(&other.tokens[..room.min(other.tokens.len())]);
        out
    }

    /// Drop the first `start` tokens.
    fn subsequence(&self, start: usize) -> Self {
        Self {
            repeat: self.repeat,
            tokens: self.tokens[start.min(self.tokens.len())..].to_vec(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LookAheadSet {
    max_length: usize,
    elements: Vec<Sequence>,
}

impl LookAheadSet {
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length,
            elements: Vec::new(),
        }
    }

    pub fn with(max_length: usize, other: &LookAheadSet) -> Self {
        let mut set = Self::new(max_length);
        set.add_all(other);
        set
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn sequences(&self) -> &[Sequence] {
        &self.elements
    }

    /// Length of the shortest sequence, 0 for an empty set.
    pub fn min_length(&self) -> usize {
        self.elements.iter().map(Sequence::len).min().unwrap_or(0)
    }

    /// Length of the longest sequence, 0 for an empty set.
    pub fn longest(&self) -> usize {
        self.elements.iter().map(Sequence::len).max().unwrap_or(0)
    }

    /// Distinct first tokens, in insertion order.
    pub fn initial_tokens(&self) -> Vec<TokenId> {
        let mut out = Vec::new();
        for id in self.elements.iter().filter_map(Sequence::first) {
            if !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }

    pub fn is_repetitive(&self) -> bool {
        self.elements.iter().any(Sequence::is_repetitive)
    }

    pub fn is_next(&self, upcoming: &[TokenId]) -> bool {
        self.elements.iter().any(|s| s.is_next(upcoming))
    }

    pub fn is_next_prefix(&self, upcoming: &[TokenId], len: usize) -> bool {
        self.elements.iter().any(|s| s.is_next_prefix(upcoming, len))
    }

    /// Some sequence of `self` is a prefix of, or prefixed by, one in `other`.
    pub fn is_overlap(&self, other: &LookAheadSet) -> bool {
        self.elements.iter().any(|s| other.overlaps(s))
    }

    fn overlaps(&self, seq: &Sequence) -> bool {
        self.elements
            .iter()
            .any(|e| seq.starts_with(e) || e.starts_with(seq))
    }

    /// Some sequence of `self` is also in `other`.
    pub fn has_intersection(&self, other: &LookAheadSet) -> bool {
        self.elements.iter().any(|s| other.contains(s))
    }

    pub fn contains(&self, seq: &Sequence) -> bool {
        self.find(seq).is_some()
    }

    fn find(&self, seq: &Sequence) -> Option<&Sequence> {
        self.elements.iter().find(|e| *e == seq)
    }

    pub fn add_token(&mut self, token: TokenId) {
        self.add(Sequence::single(token));
    }

    /// Add `seq` cut to the maximum length, unless already present.
    pub fn add(&mut self, seq: Sequence) {
        let seq = if seq.len() > self.max_length {
            Sequence::truncated(self.max_length, &seq)
        } else {
            seq
        };
        if !self.contains(&seq) {
            self.elements.push(seq);
        }
    }

    pub fn add_all(&mut self, other: &LookAheadSet) {
        for seq in &other.elements {
            self.add(seq.clone());
        }
    }

    pub fn add_empty(&mut self) {
        self.add(Sequence::default());
    }

    pub fn remove_all(&mut self, other: &LookAheadSet) {
        self.elements.retain(|s| !other.contains(s));
    }

    /// Remainders of the sequences starting with `token`.
    pub fn create_next_set(&self, token: TokenId) -> LookAheadSet {
        let mut out = LookAheadSet::new(self.max_length.saturating_sub(1));
        for seq in &self.elements {
            if seq.first() == Some(token) {
                out.add(seq.subsequence(1));
            }
        }
        out
    }

    /// Sequences in both sets. When `self`'s copy is repetitive the other
    /// operand's copy is kept.
    pub fn create_intersection(&self, other: &LookAheadSet) -> LookAheadSet {
        let mut out = LookAheadSet::new(self.max_length);
        for seq in &self.elements {
            let Some(found) = other.find(seq) else {
                continue;
            };
            if seq.is_repetitive() {
                out.add(found.clone());
            } else {
                out.add(seq.clone());
            }
        }
        out
    }

    /// Every sequence of `self` followed by every sequence of `other`.
    pub fn create_combination(&self, other: &LookAheadSet) -> LookAheadSet {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        let mut out = LookAheadSet::new(self.max_length);
        for first in &self.elements {
            if first.len() >= self.max_length {
                out.add(first.clone());
            } else if first.is_empty() {
                out.add_all(other);
            } else {
                for second in &other.elements {
                    out.add(first.concat(self.max_length, second));
                }
            }
        }
        out
    }

    /// Sequences of `self` overlapping some sequence of `other`.
    pub fn create_overlaps(&self, other: &LookAheadSet) -> LookAheadSet {
        let mut out = LookAheadSet::new(self.max_length);
        for seq in &self.elements {
            if other.overlaps(seq) {
                out.add(seq.clone());
            }
        }
        out
    }

    /// Remainders of `self`'s sequences after each prefix found in `other`.
    pub fn create_filter(&self, other: &LookAheadSet) -> LookAheadSet {
        if self.is_empty() || other.is_empty() {
            return self.clone();
        }
        let mut out = LookAheadSet::new(self.max_length);
        for first in &self.elements {
            for second in &other.elements {
                if first.starts_with(second) {
                    out.add(first.subsequence(second.len()));
                }
            }
        }
        out
    }

    /// Same sequences, all tagged repetitive.
    pub fn create_repetitive(&self) -> LookAheadSet {
        let mut out = LookAheadSet::new(self.max_length);
        for seq in &self.elements {
            let mut seq = seq.clone();
            seq.repeat = true;
            out.add(seq);
        }
        out
    }

    /// Render with token descriptions, one sequence per line.
    pub fn describe(&self, tokenizer: &Tokenizer) -> String {
        self.elements
            .iter()
            .map(|seq| {
                let tokens: Vec<String> = seq.tokens.iter().map(|&t| tokenizer.describe(t)).collect();
                let suffix = if seq.repeat { " ..." } else { "" };
                format!("{}{suffix}", tokens.join(" "))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for LookAheadSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, seq) in self.elements.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let tokens: Vec<String> = seq.tokens.iter().map(|t| t.0.to_string()).collect();
            write!(f, "[{}]", tokens.join(" "))?;
            if seq.repeat {
                f.write_str("*")?;
            }
        }
        f.write_str("}")
    }
}
