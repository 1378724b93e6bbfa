//! Variable bindings for one or more evaluations.

use indexmap::IndexMap;
use rill_bytecode::Program;
use rill_core::{TypeCatalog, Value};

use crate::{Error, Result};

/// Values by variable name.
///
/// Names are matched exactly first, then ASCII case-insensitively unless the
/// expression was compiled case-sensitive. Unbound variables only fail when
/// evaluation actually reads them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VariableValues {
    values: IndexMap<String, Value>,
}

impl VariableValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.set(name, value);
        self
    }

    /// Bind `name`, returning the value it replaces.
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn lookup(&self, name: &str, case_sensitive: bool) -> Option<&Value> {
        if let Some(v) = self.values.get(name) {
            return Some(v);
        }
        if case_sensitive {
            return None;
        }
        self.values
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Values in the order of the program's variable slots.
    pub(crate) fn bind(
        &self,
        program: &Program,
        catalog: &dyn TypeCatalog,
        case_sensitive: bool,
    ) -> Result<Vec<Option<Value>>> {
        let mut bound = Vec::with_capacity(program.variables().len());
        for slot in program.variables() {
            let Some(value) = self.lookup(&slot.name, case_sensitive) else {
                bound.push(None);
                continue;
            };
            let actual = value.runtime_type();
            if !catalog.is_assignable(&actual, &slot.ty) {
                return Err(Error::VariableType {
                    name: slot.name.clone(),
                    expected: catalog.type_name(&slot.ty),
                    actual: catalog.type_name(&actual),
                });
            }
            bound.push(Some(value.clone()));
        }
        Ok(bound)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for VariableValues {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
