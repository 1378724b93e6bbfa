//! Names visible to one compiled expression.

use std::sync::Arc;

use indexmap::IndexMap;
use rill_core::{TypeCatalog, Ty};

use crate::options::CompileOptions;

/// A host type whose static members are visible unqualified, or under
/// `namespace.` when one is given.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Import {
    pub ty: Ty,
    pub namespace: Option<String>,
}

/// Everything an expression can bind to: typed variables, the owner object
/// and its members, imported static members, and the host catalog.
#[derive(Clone)]
pub struct Scope {
    catalog: Arc<dyn TypeCatalog>,
    options: CompileOptions,
    variables: IndexMap<String, Ty>,
    owner: Option<Ty>,
    imports: Vec<Import>,
    result_type: Option<Ty>,
}

impl Scope {
    pub fn new(catalog: Arc<dyn TypeCatalog>) -> Self {
        Self {
            catalog,
            options: CompileOptions::default(),
            variables: IndexMap::new(),
            owner: None,
            imports: Vec::new(),
            result_type: None,
        }
    }

    pub fn options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn variable(mut self, name: impl Into<String>, ty: Ty) -> Self {
        self.variables.insert(name.into(), ty);
        self
    }

    /// Instance members of `ty` resolve without qualification.
    pub fn owner(mut self, ty: Ty) -> Self {
        self.owner = Some(ty);
        self
    }

    pub fn import(mut self, ty: Ty) -> Self {
        self.imports.push(Import {
            ty,
            namespace: None,
        });
        self
    }

    pub fn import_as(mut self, ty: Ty, namespace: impl Into<String>) -> Self {
        self.imports.push(Import {
            ty,
            namespace: Some(namespace.into()),
        });
        self
    }

    /// The expression result is implicitly converted to `ty`.
    pub fn result_type(mut self, ty: Ty) -> Self {
        self.result_type = Some(ty);
        self
    }

    pub fn catalog(&self) -> &dyn TypeCatalog {
        self.catalog.as_ref()
    }

    pub fn compile_options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn variables(&self) -> impl Iterator<Item = (&str, &Ty)> {
        self.variables.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Declared name and type of a variable, honoring case sensitivity.
    /// `None` when nothing or more than one declaration matches.
    pub fn find_variable(&self, name: &str) -> Option<(&str, &Ty)> {
        match self.matching_variables(name).as_slice() {
            [single] => Some(*single),
            _ => None,
        }
    }

    /// Every declaration `name` refers to. Without case sensitivity,
    /// `Total` and `total` both match `TOTAL`.
    pub fn matching_variables(&self, name: &str) -> Vec<(&str, &Ty)> {
        if self.options.case_sensitive {
            return self
                .variables
                .get_key_value(name)
                .map(|(k, v)| (k.as_str(), v))
                .into_iter()
                .collect();
        }
        self.variables
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(k, v)| (k.as_str(), v))
            .collect()
    }

    pub fn owner_type(&self) -> Option<&Ty> {
        self.owner.as_ref()
    }

    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    pub fn expected_type(&self) -> Option<&Ty> {
        self.result_type.as_ref()
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("options", &self.options)
            .field("variables", &self.variables)
            .field("owner", &self.owner)
            .field("imports", &self.imports)
            .field("result_type", &self.result_type)
            .finish_non_exhaustive()
    }
}
