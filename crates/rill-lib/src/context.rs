//! Compile-time environment shared by many expressions.

use std::sync::Arc;

use rill_compiler::{CompileOptions, ExpressionCompiler, Scope};
use rill_core::{HostCatalog, Ty, TypeCatalog};

use crate::Result;
use crate::expression::Expression;

/// Host catalog, declared variables, owner type, imports and options.
///
/// Cloning is cheap; clones share the catalog and the prepared-grammar cache.
#[derive(Clone)]
pub struct ExpressionContext {
    catalog: Arc<dyn TypeCatalog>,
    scope: Scope,
    compiler: Arc<ExpressionCompiler>,
}

impl Default for ExpressionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionContext {
    /// Context over the builtin catalog (`Math`, `String` members).
    pub fn new() -> Self {
        Self::with_catalog(Arc::new(HostCatalog::with_builtins()))
    }

    pub fn with_catalog(catalog: Arc<dyn TypeCatalog>) -> Self {
        Self {
            scope: Scope::new(Arc::clone(&catalog)),
            catalog,
            compiler: Arc::new(ExpressionCompiler::new()),
        }
    }

    /// Share a compiler, and its grammar cache, with other contexts.
    pub fn compiler(mut self, compiler: Arc<ExpressionCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn options(mut self, options: CompileOptions) -> Self {
        self.scope = self.scope.options(options);
        self
    }

    pub fn variable(mut self, name: impl Into<String>, ty: Ty) -> Self {
        self.scope = self.scope.variable(name, ty);
        self
    }

    /// Instance members of `ty` resolve unqualified; evaluation then needs
    /// an owner value.
    pub fn owner(mut self, ty: Ty) -> Self {
        self.scope = self.scope.owner(ty);
        self
    }

    pub fn import(mut self, ty: Ty) -> Self {
        self.scope = self.scope.import(ty);
        self
    }

    pub fn import_as(mut self, ty: Ty, namespace: impl Into<String>) -> Self {
        self.scope = self.scope.import_as(ty, namespace);
        self
    }

    /// Results are implicitly converted to `ty`.
    pub fn result_type(mut self, ty: Ty) -> Self {
        self.scope = self.scope.result_type(ty);
        self
    }

    pub fn catalog(&self) -> &Arc<dyn TypeCatalog> {
        &self.catalog
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn shared_compiler(&self) -> &Arc<ExpressionCompiler> {
        &self.compiler
    }

    /// Catalog type by dotted name, honoring the case-sensitivity option.
    pub fn find_type(&self, dotted_name: &str) -> Option<Ty> {
        let ignore_case = !self.scope.compile_options().case_sensitive;
        self.catalog.find_type(dotted_name, ignore_case)
    }

    pub fn compile(&self, source: &str) -> Result<Expression> {
        let program = self.compiler.compile(source, &self.scope)?;
        tracing::debug!(
            bytes = program.code().len(),
            variables = program.variables().len(),
            "expression compiled"
        );
        Ok(Expression::new(
            source,
            program,
            Arc::clone(&self.catalog),
            self.scope.compile_options().case_sensitive,
        ))
    }
}

impl std::fmt::Debug for ExpressionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpressionContext")
            .field("scope", &self.scope)
            .field("compiler", &self.compiler)
            .finish_non_exhaustive()
    }
}
