//! Fallback matcher for patterns outside the NFA subset.
//!
//! All fallback patterns are compiled into one anchored multi-pattern dense
//! DFA reporting every match (`MatchKind::All`). The DFA is stepped a byte at
//! a time over characters peeked from the reader buffer; match states lag one
//! byte behind the input, so a match state seen on the first byte of a
//! character means a match ending just before that character.

use std::io;

use regex_automata::dfa::{Automaton, StartKind, dense};
use regex_automata::util::primitives::StateID;
use regex_automata::util::syntax;
use regex_automata::{Anchored, Input, MatchKind};

use super::pattern::TokenId;
use super::reader::ReaderBuffer;

/// Pattern that the regex engine refused, with its error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexBuildError {
    pub pattern: String,
    pub detail: String,
}

#[derive(Clone, Debug)]
pub struct RegexMatcher {
    dfa: dense::DFA<Vec<u32>>,
    /// Token id per DFA pattern index.
    ids: Vec<TokenId>,
}

impl RegexMatcher {
    pub fn build(patterns: &[(TokenId, String)], ignore_case: bool) -> Result<Self, RegexBuildError> {
        let sources: Vec<&str> = patterns.iter().map(|(_, p)| p.as_str()).collect();
        let dfa = builder(ignore_case).build_many(&sources).map_err(|e| {
            // Name the offending pattern rather than the whole batch.
            let culprit = sources
                .iter()
                .find(|p| builder(ignore_case).build(p).is_err())
                .map_or_else(|| sources.join(" | "), |p| p.to_string());
            RegexBuildError {
                pattern: culprit,
                detail: e.to_string(),
            }
        })?;
        Ok(Self {
            dfa,
            ids: patterns.iter().map(|(id, _)| *id).collect(),
        })
    }

    /// Longest match at the buffer's position; equal lengths go to the lowest id.
    pub fn match_longest(&self, buffer: &mut ReaderBuffer) -> io::Result<Option<(TokenId, usize)>> {
        let input = Input::new("").anchored(Anchored::Yes);
        let Ok(mut state) = self.dfa.start_state_forward(&input) else {
            return Ok(None);
        };

        let mut best = None;
        let mut len = 0;
        let mut utf8 = [0u8; 4];
        loop {
            let Some(c) = buffer.peek(len)? else {
                state = self.dfa.next_eoi_state(state);
                self.record(state, len, &mut best);
                break;
            };
            for (i, &byte) in c.encode_utf8(&mut utf8).as_bytes().iter().enumerate() {
                state = self.dfa.next_state(state, byte);
                if i == 0 {
                    self.record(state, len, &mut best);
                }
                if self.dfa.is_dead_state(state) || self.dfa.is_quit_state(state) {
                    return Ok(best);
                }
            }
            len += 1;
        }
        Ok(best)
    }

    fn record(&self, state: StateID, len: usize, best: &mut Option<(TokenId, usize)>) {
        if len == 0 || !self.dfa.is_match_state(state) {
            return;
        }
        let id = (0..self.dfa.match_len(state))
            .map(|i| self.ids[self.dfa.match_pattern(state, i).as_usize()])
            .min();
        if let Some(id) = id {
            *best = Some((id, len));
        }
    }
}

fn builder(ignore_case: bool) -> dense::Builder {
    let mut builder = dense::Builder::new();
    builder
        .configure(
            dense::DFA::config()
                .match_kind(MatchKind::All)
                .start_kind(StartKind::Anchored),
        )
        .syntax(syntax::Config::new().case_insensitive(ignore_case));
    builder
}
