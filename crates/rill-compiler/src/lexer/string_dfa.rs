//! Deterministic automaton for exact-text patterns.
//!
//! The first character is dispatched through a 128-entry ASCII table, with a
//! sorted side table for non-ASCII starts. Every later state keeps a sorted
//! transition list searched by binary search.

use std::io;

use super::pattern::TokenId;
use super::reader::ReaderBuffer;

#[derive(Clone, Debug, Default)]
struct State {
    /// Sorted by character.
    transitions: Vec<(char, u32)>,
    accept: Option<TokenId>,
}

#[derive(Clone, Debug)]
pub struct StringDfa {
    ascii: Box<[Option<u32>; 128]>,
    /// Sorted by character.
    non_ascii: Vec<(char, u32)>,
    states: Vec<State>,
    ignore_case: bool,
}

impl StringDfa {
    pub fn new(ignore_case: bool) -> Self {
        Self {
            ascii: Box::new([None; 128]),
            non_ascii: Vec::new(),
            states: Vec::new(),
            ignore_case,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Register `text`. An existing acceptance by a lower id is kept.
    pub fn add(&mut self, text: &str, id: TokenId) {
        let mut chars = text.chars();
        let Some(first) = chars.next() else {
            return;
        };

        let variants = case_variants(first, self.ignore_case);
        let mut state = match variants.iter().find_map(|&c| self.root(c)) {
            Some(s) => s,
            None => self.new_state(),
        };
        for &c in &variants {
            self.set_root(c, state);
        }

        for c in chars {
            let variants = case_variants(c, self.ignore_case);
            let next = match variants.iter().find_map(|&v| self.step(state, v)) {
                Some(s) => s,
                None => self.new_state(),
            };
            for &v in &variants {
                set_sorted(&mut self.states[state as usize].transitions, v, next);
            }
            state = next;
        }

        let accept = &mut self.states[state as usize].accept;
        *accept = Some(accept.map_or(id, |existing| existing.min(id)));
    }

    /// Longest registered text at the buffer's current position.
    pub fn match_longest(&self, buffer: &mut ReaderBuffer) -> io::Result<Option<(TokenId, usize)>> {
        let Some(first) = buffer.peek(0)? else {
            return Ok(None);
        };
        let Some(mut state) = self.root(first) else {
            return Ok(None);
        };

        let mut best = None;
        let mut len = 1;
        loop {
            if let Some(id) = self.states[state as usize].accept {
                best = Some((id, len));
            }
            let Some(c) = buffer.peek(len)? else {
                break;
            };
            match self.step(state, c) {
                Some(next) => {
                    state = next;
                    len += 1;
                }
                None => break,
            }
        }
        Ok(best)
    }

    fn root(&self, c: char) -> Option<u32> {
        if c.is_ascii() {
            self.ascii[c as usize]
        } else {
            lookup(&self.non_ascii, c)
        }
    }

    fn set_root(&mut self, c: char, state: u32) {
        if c.is_ascii() {
            self.ascii[c as usize] = Some(state);
        } else {
            set_sorted(&mut self.non_ascii, c, state);
        }
    }

    fn step(&self, state: u32, c: char) -> Option<u32> {
        lookup(&self.states[state as usize].transitions, c)
    }

    fn new_state(&mut self) -> u32 {
        self.states.push(State::default());
        (self.states.len() - 1) as u32
    }
}

fn lookup(table: &[(char, u32)], c: char) -> Option<u32> {
    table
        .binary_search_by_key(&c, |&(k, _)| k)
        .ok()
        .map(|i| table[i].1)
}

fn set_sorted(table: &mut Vec<(char, u32)>, c: char, state: u32) {
    match table.binary_search_by_key(&c, |&(k, _)| k) {
        Ok(i) => table[i].1 = state,
        Err(i) => table.insert(i, (c, state)),
    }
}

/// `c` plus its single-character case mappings.
pub(crate) fn case_variants(c: char, ignore_case: bool) -> Vec<char> {
    let mut out = vec![c];
    if !ignore_case {
        return out;
    }
    for mapped in [single(c.to_lowercase()), single(c.to_uppercase())]
        .into_iter()
        .flatten()
    {
        if !out.contains(&mapped) {
            out.push(mapped);
        }
    }
    out
}

fn single(mut chars: impl Iterator<Item = char>) -> Option<char> {
    let first = chars.next()?;
    chars.next().is_none().then_some(first)
}
