//! Typing rules: operators, conversions, overloads and member lookup.
//!
//! `Binder` is the state shared by the rules while one expression is built:
//! the scope it binds against and the locals it has allocated so far.

mod conversions;
mod members;
mod operators;
mod overload;

#[cfg(test)]
mod resolve_tests;

use std::ops::Range;
use std::sync::Arc;

use rill_bytecode::LocalId;
use rill_core::{MemberDescriptor, MemberKind, TypeCatalog, Ty};

use crate::diagnostics::{SemanticError, SemanticErrorKind};
use crate::lexer::Position;
use crate::options::CompileOptions;
use crate::scope::Scope;

pub use conversions::builtin_type;
pub use members::Chain;
pub use overload::Candidate;

/// Source location of the construct being typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub span: Range<usize>,
    pub start: Position,
}

impl Site {
    pub fn new(span: Range<usize>, start: Position) -> Self {
        Self { span, start }
    }

    pub fn error(&self, kind: SemanticErrorKind, detail: impl AsRef<str>) -> SemanticError {
        SemanticError::new(kind, Some(detail.as_ref()), self.span.clone(), self.start)
    }
}

pub struct Binder<'s> {
    scope: &'s Scope,
    locals: Vec<Ty>,
}

impl<'s> Binder<'s> {
    pub fn new(scope: &'s Scope) -> Self {
        Self {
            scope,
            locals: Vec::new(),
        }
    }

    pub fn scope(&self) -> &'s Scope {
        self.scope
    }

    pub fn catalog(&self) -> &'s dyn TypeCatalog {
        self.scope.catalog()
    }

    pub fn options(&self) -> &'s CompileOptions {
        self.scope.compile_options()
    }

    fn ignore_case(&self) -> bool {
        !self.options().case_sensitive
    }

    pub fn type_name(&self, ty: &Ty) -> String {
        self.catalog().type_name(ty)
    }

    pub fn alloc_local(&mut self, ty: Ty) -> LocalId {
        let id = LocalId(self.locals.len() as u16);
        self.locals.push(ty);
        id
    }

    pub fn into_locals(self) -> Vec<Ty> {
        self.locals
    }

    /// Members of `owner` visible from the expression.
    ///
    /// An empty lookup stays empty; a lookup where every hit is
    /// inaccessible is `AccessDenied`.
    fn visible_members(
        &self,
        owner: &Ty,
        name: &str,
        kinds: &[MemberKind],
        site: &Site,
    ) -> Result<Vec<Arc<MemberDescriptor>>, SemanticError> {
        let found = self
            .catalog()
            .find_members(owner, name, kinds, self.ignore_case());
        if found.is_empty() {
            return Ok(found);
        }
        let from = self.scope.owner_type();
        let visible: Vec<_> = found
            .into_iter()
            .filter(|m| self.catalog().is_accessible(m, from))
            .collect();
        if visible.is_empty() {
            return Err(site.error(SemanticErrorKind::AccessDenied, name));
        }
        Ok(visible)
    }
}
