//! Look-ahead computation.
//!
//! Every production starts with one-token look-ahead per alternative.
//! Alternatives whose sets intersect are recomputed one token longer,
//! filtered by the accumulated conflicts, until the conflicts vanish. An
//! alternative that stays in conflict becomes the production's default; a
//! second one is an inherent ambiguity. The same procedure decides, at each
//! optional or repeated element, between continuing the element and moving
//! on to the rest of the alternative.

use indexmap::IndexMap;
use tracing::trace;

use crate::lexer::Tokenizer;

use super::error::{GrammarError, GrammarErrorKind};
use super::lookahead::LookAheadSet;
use super::pattern::{Alternative, Element, PatternId, ProductionPattern, Symbol};

/// Productions being expanded, with the look-ahead length they were entered at.
#[derive(Debug, Default)]
struct CallStack {
    entries: Vec<(PatternId, usize)>,
}

impl CallStack {
    fn contains(&self, id: PatternId) -> bool {
        self.entries.iter().any(|&(p, _)| p == id)
    }

    fn contains_at(&self, id: PatternId, length: usize) -> bool {
        self.entries.contains(&(id, length))
    }

    fn push(&mut self, id: PatternId, length: usize) {
        self.entries.push((id, length));
    }

    fn pop(&mut self) {
        self.entries.pop();
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Computed look-ahead of one production.
#[derive(Debug)]
pub(crate) struct PatternLookAhead {
    pub alternatives: Vec<LookAheadSet>,
    pub default_alt: Option<usize>,
    pub union: LookAheadSet,
    /// `(alternative, element, set)` for elements needing more than the default check.
    pub elements: Vec<(usize, usize, LookAheadSet)>,
}

pub(crate) struct Analysis<'g> {
    patterns: &'g IndexMap<PatternId, ProductionPattern>,
    tokenizer: &'g Tokenizer,
}

impl<'g> Analysis<'g> {
    pub fn new(patterns: &'g IndexMap<PatternId, ProductionPattern>, tokenizer: &'g Tokenizer) -> Self {
        Self {
            patterns,
            tokenizer,
        }
    }

    pub fn calculate(&self, pattern: &ProductionPattern) -> Result<PatternLookAhead, GrammarError> {
        let mut stack = CallStack::default();
        stack.push(pattern.id, 1);

        let mut union = LookAheadSet::new(1);
        let mut alternatives = Vec::with_capacity(pattern.alternatives.len());
        for alt in &pattern.alternatives {
            let set = self.find_alternative(alt, 1, 0, &mut stack, None)?;
            union.add_all(&set);
            alternatives.push(set);
        }

        let mut default_alt = None;
        let mut previous = LookAheadSet::new(0);
        let mut length = 1;
        let mut conflicts = self.find_conflicts(pattern, &alternatives, length)?;
        while !conflicts.is_empty() {
            length += 1;
            trace!(pattern = %pattern.name, length, "look-ahead conflict, extending");
            stack.clear();
            stack.push(pattern.id, length);
            conflicts.add_all(&previous);
            for (i, alt) in pattern.alternatives.iter().enumerate() {
                if alternatives[i].has_intersection(&conflicts) {
                    alternatives[i] =
                        self.find_alternative(alt, length, 0, &mut stack, Some(&conflicts))?;
                }
                if alternatives[i].has_intersection(&conflicts) {
                    match default_alt {
                        None => default_alt = Some(i),
                        Some(d) if d != i => {
                            let overlap = alternatives[i].create_intersection(&conflicts);
                            return Err(self.ambiguity(pattern, None, &overlap));
                        }
                        Some(_) => {}
                    }
                }
            }
            previous = conflicts;
            conflicts = self.find_conflicts(pattern, &alternatives, length)?;
        }

        let mut elements = Vec::new();
        for (i, alt) in pattern.alternatives.iter().enumerate() {
            for (pos, set) in self.calculate_elements(pattern, alt)? {
                elements.push((i, pos, set));
            }
        }

        Ok(PatternLookAhead {
            alternatives,
            default_alt,
            union,
            elements,
        })
    }

    /// Look-ahead for optional and repeated elements that conflict with what follows them.
    fn calculate_elements(
        &self,
        pattern: &ProductionPattern,
        alt: &Alternative,
    ) -> Result<Vec<(usize, LookAheadSet)>, GrammarError> {
        let mut out = Vec::new();
        for (pos, elem) in alt.elements.iter().enumerate() {
            if elem.is_fixed() {
                continue;
            }
            let location = format!("at position {}", pos + 1);
            let mut first = self.find_element(elem, 1, &mut CallStack::default(), None)?;
            let mut follow = self.find_alternative(alt, 1, pos + 1, &mut CallStack::default(), None)?;
            let mut conflicts = self.find_pair_conflicts(pattern, &location, &first, &follow)?;

            let mut previous = LookAheadSet::new(0);
            let mut length = 1;
            let mut resolved = None;
            while !conflicts.is_empty() {
                length += 1;
                conflicts.add_all(&previous);
                first = self.find_element(elem, length, &mut CallStack::default(), Some(&conflicts))?;
                follow = self.find_alternative(
                    alt,
                    length,
                    pos + 1,
                    &mut CallStack::default(),
                    Some(&conflicts),
                )?;
                first = first.create_combination(&follow);
                resolved = Some(first.clone());
                if first.has_intersection(&conflicts) {
                    let overlap = first.create_intersection(&conflicts);
                    return Err(self.ambiguity(pattern, Some(&location), &overlap));
                }
                previous = conflicts;
                conflicts = self.find_pair_conflicts(pattern, &location, &first, &follow)?;
            }
            if let Some(set) = resolved {
                out.push((pos, set));
            }
        }
        Ok(out)
    }

    /// Element look-ahead, including its repetitions when they matter to `filter`.
    fn find_element(
        &self,
        elem: &Element,
        length: usize,
        stack: &mut CallStack,
        filter: Option<&LookAheadSet>,
    ) -> Result<LookAheadSet, GrammarError> {
        let mut first = self.find_element_once(elem, length, stack, filter)?;
        let mut result = LookAheadSet::with(length, &first);
        let Some(filter) = filter else {
            return Ok(result);
        };
        if !filter.is_overlap(&result) {
            return Ok(result);
        }

        if elem.max.is_none() {
            first = first.create_repetitive();
        }
        let max = elem.max.map_or(length, |m| (m as usize).min(length));
        for _ in 1..max {
            first = first.create_overlaps(filter);
            if first.is_empty() || first.min_length() >= length {
                break;
            }
            let narrowed = filter.create_filter(&first);
            let follow = self.find_element_once(elem, length, stack, Some(&narrowed))?;
            first = first.create_combination(&follow);
            result.add_all(&first);
        }
        Ok(result)
    }

    /// Look-ahead of a single occurrence of `elem`.
    fn find_element_once(
        &self,
        elem: &Element,
        length: usize,
        stack: &mut CallStack,
        filter: Option<&LookAheadSet>,
    ) -> Result<LookAheadSet, GrammarError> {
        match elem.symbol {
            Symbol::Token(id) => {
                let mut set = LookAheadSet::new(length);
                set.add_token(id);
                Ok(set)
            }
            Symbol::Production(id) => {
                let pattern = self.pattern(id)?;
                let set = self.find_pattern(pattern, length, stack, filter)?;
                Ok(if stack.contains(id) {
                    set.create_repetitive()
                } else {
                    set
                })
            }
        }
    }

    fn find_pattern(
        &self,
        pattern: &ProductionPattern,
        length: usize,
        stack: &mut CallStack,
        filter: Option<&LookAheadSet>,
    ) -> Result<LookAheadSet, GrammarError> {
        if stack.contains_at(pattern.id, length) {
            return Err(GrammarError::new(
                GrammarErrorKind::InfiniteLoop,
                &pattern.name,
                format!("revisited at look-ahead length {length}"),
            ));
        }
        stack.push(pattern.id, length);
        let mut result = LookAheadSet::new(length);
        for alt in &pattern.alternatives {
            let set = self.find_alternative(alt, length, 0, stack, filter)?;
            result.add_all(&set);
        }
        stack.pop();
        Ok(result)
    }

    /// Look-ahead of `alt` from element `pos` onwards.
    fn find_alternative(
        &self,
        alt: &Alternative,
        length: usize,
        pos: usize,
        stack: &mut CallStack,
        filter: Option<&LookAheadSet>,
    ) -> Result<LookAheadSet, GrammarError> {
        let Some(elem) = alt.elements.get(pos).filter(|_| length > 0) else {
            return Ok(LookAheadSet::new(0));
        };

        let mut first = self.find_element(elem, length, stack, filter)?;
        if elem.min == 0 {
            first.add_empty();
        }

        match filter {
            None => {
                let remaining = length.saturating_sub(first.min_length());
                if remaining > 0 {
                    let follow = self.find_alternative(alt, remaining, pos + 1, stack, None)?;
                    first = first.create_combination(&follow);
                }
            }
            Some(filter) if filter.is_overlap(&first) => {
                let overlaps = first.create_overlaps(filter);
                let remaining = length.saturating_sub(overlaps.min_length());
                let narrowed = filter.create_filter(&overlaps);
                let follow = self.find_alternative(alt, remaining, pos + 1, stack, Some(&narrowed))?;
                first.remove_all(&overlaps);
                first.add_all(&overlaps.create_combination(&follow));
            }
            Some(_) => {}
        }
        Ok(first)
    }

    /// Pairwise intersections of the alternatives' sets.
    fn find_conflicts(
        &self,
        pattern: &ProductionPattern,
        alternatives: &[LookAheadSet],
        max_length: usize,
    ) -> Result<LookAheadSet, GrammarError> {
        let mut result = LookAheadSet::new(max_length);
        for (i, a) in alternatives.iter().enumerate() {
            for b in &alternatives[..i] {
                result.add_all(&a.create_intersection(b));
            }
        }
        if result.is_repetitive() {
            return Err(self.ambiguity(pattern, None, &result));
        }
        Ok(result)
    }

    fn find_pair_conflicts(
        &self,
        pattern: &ProductionPattern,
        location: &str,
        a: &LookAheadSet,
        b: &LookAheadSet,
    ) -> Result<LookAheadSet, GrammarError> {
        let result = a.create_intersection(b);
        if result.is_repetitive() {
            return Err(self.ambiguity(pattern, Some(location), &result));
        }
        Ok(result)
    }

    fn ambiguity(
        &self,
        pattern: &ProductionPattern,
        location: Option<&str>,
        set: &LookAheadSet,
    ) -> GrammarError {
        let tokens: Vec<String> = set
            .initial_tokens()
            .into_iter()
            .map(|t| self.tokenizer.describe(t))
            .collect();
        let mut detail = String::new();
        if let Some(location) = location {
            detail.push_str(location);
            detail.push_str(", ");
        }
        detail.push_str("alternatives starting with ");
        detail.push_str(&tokens.join(" or "));
        GrammarError::new(GrammarErrorKind::InherentAmbiguity, &pattern.name, detail)
    }

    fn pattern(&self, id: PatternId) -> Result<&'g ProductionPattern, GrammarError> {
        self.patterns.get(&id).ok_or_else(|| {
            GrammarError::new(
                GrammarErrorKind::InvalidProduction,
                &id.to_string(),
                "undefined production",
            )
        })
    }
}
