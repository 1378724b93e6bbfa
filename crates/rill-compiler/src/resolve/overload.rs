//! Overload resolution.
//!
//! Each argument is scored with `implicit_score`; a candidate's score is the
//! average over its arguments and the lowest score wins. Equal scores prefer
//! a candidate that does not pack trailing arguments into an array.

use std::sync::Arc;

use rill_core::{MemberDescriptor, Ty, implicit_score};

use super::{Binder, Site};
use crate::diagnostics::{SemanticError, SemanticErrorKind};
use crate::elements::Element;

#[derive(Debug, Clone)]
pub struct Candidate {
    pub member: Arc<MemberDescriptor>,
}

impl Candidate {
    pub fn new(member: Arc<MemberDescriptor>) -> Self {
        Self { member }
    }

    fn same_signature(&self, other: &Candidate) -> bool {
        let (a, b) = (&self.member, &other.member);
        a.params == b.params && a.rest == b.rest && a.extension == b.extension
    }
}

/// How arguments map onto a candidate's parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Form {
    /// One argument per parameter; a rest parameter takes an array argument.
    Normal,
    /// Surplus arguments are packed into the rest array.
    Expanded,
}

#[derive(Debug)]
struct Applicable {
    index: usize,
    form: Form,
    score: f64,
}

/// A chosen overload with converted arguments.
#[derive(Debug)]
pub struct BoundCall {
    pub member: Arc<MemberDescriptor>,
    pub args: Vec<Element>,
    pub rest: Option<(Ty, Vec<Element>)>,
}

impl Binder<'_> {
    fn score_form(&self, member: &MemberDescriptor, args: &[&Ty], form: Form) -> Option<f64> {
        let catalog = self.catalog();
        let fixed = member.params.len();
        let mut total: u64 = 0;
        match (form, &member.rest) {
            (Form::Normal, None) => {
                if args.len() != fixed {
                    return None;
                }
                for (arg, param) in args.iter().zip(&member.params) {
                    total += u64::from(implicit_score(catalog, arg, param)?);
                }
            }
            (Form::Normal, Some(element)) => {
                if args.len() != fixed + 1 {
                    return None;
                }
                for (arg, param) in args.iter().zip(&member.params) {
                    total += u64::from(implicit_score(catalog, arg, param)?);
                }
                let array = Ty::array_of(element.clone());
                total += u64::from(implicit_score(catalog, args[fixed], &array)?);
            }
            (Form::Expanded, Some(element)) => {
                if args.len() < fixed {
                    return None;
                }
                for (i, arg) in args.iter().enumerate() {
                    let param = member.params.get(i).unwrap_or(element);
                    total += u64::from(implicit_score(catalog, arg, param)?);
                }
            }
            (Form::Expanded, None) => return None,
        }
        if args.is_empty() {
            return Some(0.0);
        }
        Some(total as f64 / args.len() as f64)
    }

    /// Pick one of `candidates` for `args`, then convert the arguments.
    ///
    /// `receiver` is the implicit first argument of extension candidates.
    pub fn resolve_overload(
        &self,
        name: &str,
        candidates: Vec<Candidate>,
        receiver: Option<&Element>,
        args: Vec<Element>,
        site: &Site,
    ) -> Result<BoundCall, SemanticError> {
        let mut unique: Vec<Candidate> = Vec::with_capacity(candidates.len());
        for c in candidates {
            if !unique.iter().any(|u| u.same_signature(&c)) {
                unique.push(c);
            }
        }

        let mut applicable: Vec<Applicable> = Vec::new();
        for (index, candidate) in unique.iter().enumerate() {
            let member = &candidate.member;
            let mut types: Vec<&Ty> = Vec::with_capacity(args.len() + 1);
            if member.extension {
                let Some(r) = receiver else { continue };
                types.push(&r.ty);
            }
            types.extend(args.iter().map(|a| &a.ty));

            let form = [Form::Normal, Form::Expanded]
                .into_iter()
                .find_map(|form| self.score_form(member, &types, form).map(|s| (form, s)));
            if let Some((form, score)) = form {
                applicable.push(Applicable { index, form, score });
            }
        }

        let Some(best) = applicable.iter().map(|a| a.score).reduce(f64::min) else {
            let types: Vec<String> = args
                .iter()
                .map(|a| format!("`{}`", self.type_name(&a.ty)))
                .collect();
            return Err(site.error(
                SemanticErrorKind::TypeMismatch,
                format!(
                    "no overload of `{name}` accepts arguments ({})",
                    types.join(", ")
                ),
            ));
        };

        let mut tied: Vec<&Applicable> = applicable.iter().filter(|a| a.score == best).collect();
        if tied.len() > 1 {
            let plain: Vec<&Applicable> = tied
                .iter()
                .copied()
                .filter(|a| unique[a.index].member.rest.is_none())
                .collect();
            if !plain.is_empty() {
                tied = plain;
            }
        }
        if tied.len() > 1 {
            return Err(site.error(
                SemanticErrorKind::AmbiguousMatch,
                format!("call to `{name}` matches {} overloads", tied.len()),
            ));
        }

        let chosen = tied[0];
        let member = Arc::clone(&unique[chosen.index].member);
        let mut all: Vec<Element> = Vec::with_capacity(args.len() + 1);
        if member.extension
            && let Some(r) = receiver
        {
            all.push(r.clone());
        }
        all.extend(args);
        self.bind_arguments(member, all, chosen.form)
    }

    fn bind_arguments(
        &self,
        member: Arc<MemberDescriptor>,
        args: Vec<Element>,
        form: Form,
    ) -> Result<BoundCall, SemanticError> {
        let fixed = member.params.len();
        let mut bound = Vec::with_capacity(fixed + 1);
        let mut surplus = Vec::new();
        for (i, arg) in args.into_iter().enumerate() {
            match (member.params.get(i), &member.rest, form) {
                (Some(param), _, _) => bound.push(self.convert(arg, param)?),
                (None, Some(element), Form::Normal) => {
                    bound.push(self.convert(arg, &Ty::array_of(element.clone()))?)
                }
                (None, Some(element), Form::Expanded) => surplus.push(self.convert(arg, element)?),
                (None, None, _) => {}
            }
        }
        let rest = match (&member.rest, form) {
            (Some(element), Form::Expanded) => Some((element.clone(), surplus)),
            _ => None,
        };
        Ok(BoundCall {
            member,
            args: bound,
            rest,
        })
    }
}
