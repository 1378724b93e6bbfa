//! Name and member-chain resolution.
//!
//! A dotted chain is resolved left to right. Each step yields a value, a
//! type (whose static members come next) or a namespace prefix still waiting
//! for a type or import to complete it.

use std::sync::Arc;

use rill_core::{MemberDescriptor, MemberKind, Ty};

use super::overload::{BoundCall, Candidate};
use super::{Binder, Site, builtin_type};
use crate::diagnostics::{SemanticError, SemanticErrorKind};
use crate::elements::{Element, ElementKind, IndexKind, Receiver};
use crate::scope::Import;

const VALUE_MEMBERS: &[MemberKind] = &[MemberKind::Field, MemberKind::Property];
const METHODS: &[MemberKind] = &[MemberKind::Method];
const INDEXERS: &[MemberKind] = &[MemberKind::Property, MemberKind::Method];

#[derive(Debug, Clone)]
pub enum Chain {
    Value(Element),
    Type { ty: Ty, site: Site },
    Namespace { name: String, site: Site },
}

impl Chain {
    fn site(&self) -> Site {
        match self {
            Chain::Value(e) => Site::new(e.span.clone(), e.start),
            Chain::Type { site, .. } | Chain::Namespace { site, .. } => site.clone(),
        }
    }
}

fn value_member(receiver: Receiver, member: Arc<MemberDescriptor>, site: &Site) -> Element {
    let ty = member.return_ty.clone();
    Element::new(
        ElementKind::Member { receiver, member },
        ty,
        site.span.clone(),
        site.start,
    )
}

fn call(receiver: Receiver, bound: BoundCall, site: &Site) -> Element {
    let ty = bound.member.return_ty.clone();
    Element::new(
        ElementKind::Call {
            receiver,
            member: bound.member,
            args: bound.args,
            rest: bound.rest,
        },
        ty,
        site.span.clone(),
        site.start,
    )
}

/// Members declared on the most derived type that has any. A derived
/// member hides base members of the same name.
fn nearest(mut found: Vec<Arc<MemberDescriptor>>) -> Vec<Arc<MemberDescriptor>> {
    if let Some(declaring) = found.first().map(|m| m.declaring.clone()) {
        found.retain(|m| m.declaring == declaring);
    }
    found
}

fn owner_receiver(member: &MemberDescriptor) -> Receiver {
    if member.is_static {
        Receiver::None
    } else {
        Receiver::Owner
    }
}

impl Binder<'_> {
    fn names_match(&self, a: &str, b: &str) -> bool {
        if self.ignore_case() {
            a.eq_ignore_ascii_case(b)
        } else {
            a == b
        }
    }

    /// Unqualified imports, or imports under `namespace`.
    fn visible_imports(&self, namespace: Option<&str>) -> impl Iterator<Item = &'_ Import> {
        self.scope()
            .imports()
            .iter()
            .filter(move |import| match (namespace, import.namespace.as_deref()) {
                (None, None) => true,
                (Some(wanted), Some(ns)) => self.names_match(wanted, ns),
                _ => false,
            })
    }

    /// Static methods of the visible imports.
    fn imported_statics(
        &self,
        namespace: Option<&str>,
        name: &str,
        site: &Site,
    ) -> Result<Vec<Arc<MemberDescriptor>>, SemanticError> {
        let mut out = Vec::new();
        for import in self.visible_imports(namespace) {
            out.extend(
                self.visible_members(&import.ty, name, METHODS, site)?
                    .into_iter()
                    .filter(|m| m.is_static && !m.extension),
            );
        }
        Ok(out)
    }

    /// The static field or property `name` among the visible imports.
    fn imported_static_value(
        &self,
        namespace: Option<&str>,
        name: &str,
        site: &Site,
    ) -> Result<Option<Arc<MemberDescriptor>>, SemanticError> {
        let mut found = Vec::new();
        for import in self.visible_imports(namespace) {
            let statics: Vec<_> = self
                .visible_members(&import.ty, name, VALUE_MEMBERS, site)?
                .into_iter()
                .filter(|m| m.is_static && !m.extension)
                .collect();
            found.extend(nearest(statics));
        }
        self.single_value(found, name, site)
    }

    /// At most one field or property; several distinct ones are ambiguous.
    fn single_value(
        &self,
        found: Vec<Arc<MemberDescriptor>>,
        name: &str,
        site: &Site,
    ) -> Result<Option<Arc<MemberDescriptor>>, SemanticError> {
        let mut unique: Vec<Arc<MemberDescriptor>> = Vec::new();
        for member in found {
            if !unique.iter().any(|m| Arc::ptr_eq(m, &member)) {
                unique.push(member);
            }
        }
        if unique.len() > 1 {
            let names: Vec<String> = unique
                .iter()
                .map(|m| format!("`{}.{}`", self.type_name(&m.declaring), m.name))
                .collect();
            return Err(site.error(
                SemanticErrorKind::AmbiguousMatch,
                format!("`{name}` matches {}", names.join(", ")),
            ));
        }
        Ok(unique.pop())
    }

    fn extension_methods(
        &self,
        name: &str,
        site: &Site,
    ) -> Result<Vec<Arc<MemberDescriptor>>, SemanticError> {
        let mut out = Vec::new();
        for import in self.scope().imports() {
            out.extend(
                self.visible_members(&import.ty, name, METHODS, site)?
                    .into_iter()
                    .filter(|m| m.extension),
            );
        }
        Ok(out)
    }

    fn find_type(&self, dotted: &str) -> Option<Ty> {
        let builtin = (!dotted.contains('.')).then(|| builtin_type(dotted)).flatten();
        builtin.or_else(|| self.catalog().find_type(dotted, self.ignore_case()))
    }

    /// First identifier of a chain, with `args` when it is a call.
    pub fn resolve_root(
        &self,
        name: &str,
        args: Option<Vec<Element>>,
        site: &Site,
    ) -> Result<Chain, SemanticError> {
        let owner = self.scope().owner_type();

        if let Some(args) = args {
            let mut candidates: Vec<Candidate> = Vec::new();
            if let Some(owner) = owner {
                candidates.extend(
                    self.visible_members(owner, name, METHODS, site)?
                        .into_iter()
                        .map(Candidate::new),
                );
            }
            candidates.extend(
                self.imported_statics(None, name, site)?
                    .into_iter()
                    .map(Candidate::new),
            );
            if candidates.is_empty() {
                return Err(site.error(SemanticErrorKind::UndefinedFunction, name));
            }
            let bound = self.resolve_overload(name, candidates, None, args, site)?;
            let receiver = owner_receiver(&bound.member);
            return Ok(Chain::Value(call(receiver, bound, site)));
        }

        match self.scope().matching_variables(name).as_slice() {
            [] => {}
            [(declared, ty)] => {
                return Ok(Chain::Value(Element::new(
                    ElementKind::Variable(declared.to_string()),
                    (*ty).clone(),
                    site.span.clone(),
                    site.start,
                )));
            }
            several => {
                let names: Vec<String> = several.iter().map(|(n, _)| format!("`{n}`")).collect();
                return Err(site.error(
                    SemanticErrorKind::AmbiguousMatch,
                    format!("`{name}` matches variables {}", names.join(", ")),
                ));
            }
        }

        if let Some(owner) = owner {
            let found = nearest(self.visible_members(owner, name, VALUE_MEMBERS, site)?);
            if let Some(member) = self.single_value(found, name, site)? {
                let receiver = owner_receiver(&member);
                return Ok(Chain::Value(value_member(receiver, member, site)));
            }
        }

        if let Some(member) = self.imported_static_value(None, name, site)? {
            return Ok(Chain::Value(value_member(Receiver::None, member, site)));
        }

        if let Some(ty) = self.find_type(name) {
            return Ok(Chain::Type {
                ty,
                site: site.clone(),
            });
        }

        Ok(Chain::Namespace {
            name: name.to_string(),
            site: site.clone(),
        })
    }

    /// `chain.name` or `chain.name(args)`. `site` spans the whole chain so far.
    pub fn resolve_member(
        &self,
        chain: Chain,
        name: &str,
        args: Option<Vec<Element>>,
        site: &Site,
    ) -> Result<Chain, SemanticError> {
        match chain {
            Chain::Value(target) => self.instance_member(target, name, args, site),
            Chain::Type { ty, .. } => self.static_member(&ty, name, args, site),
            Chain::Namespace { name: prefix, .. } => {
                let dotted = format!("{prefix}.{name}");
                if args.is_none()
                    && let Some(ty) = self.catalog().find_type(&dotted, self.ignore_case())
                {
                    return Ok(Chain::Type {
                        ty,
                        site: site.clone(),
                    });
                }
                match args {
                    Some(args) => {
                        let candidates: Vec<Candidate> = self
                            .imported_statics(Some(&prefix), name, site)?
                            .into_iter()
                            .map(Candidate::new)
                            .collect();
                        if candidates.is_empty() {
                            return Err(site.error(SemanticErrorKind::UndefinedFunction, dotted));
                        }
                        let bound = self.resolve_overload(&dotted, candidates, None, args, site)?;
                        Ok(Chain::Value(call(Receiver::None, bound, site)))
                    }
                    None => {
                        if let Some(member) =
                            self.imported_static_value(Some(&prefix), name, site)?
                        {
                            return Ok(Chain::Value(value_member(Receiver::None, member, site)));
                        }
                        Ok(Chain::Namespace {
                            name: dotted,
                            site: site.clone(),
                        })
                    }
                }
            }
        }
    }

    fn undefined_member(&self, owner: &Ty, name: &str, site: &Site) -> SemanticError {
        site.error(
            SemanticErrorKind::UndefinedMember,
            format!("`{name}` on type `{}`", self.type_name(owner)),
        )
    }

    fn instance_member(
        &self,
        target: Element,
        name: &str,
        args: Option<Vec<Element>>,
        site: &Site,
    ) -> Result<Chain, SemanticError> {
        let owner = target.ty.clone();
        match args {
            None => {
                let found: Vec<_> = self
                    .visible_members(&owner, name, VALUE_MEMBERS, site)?
                    .into_iter()
                    .filter(|m| !m.is_static)
                    .collect();
                let member = self
                    .single_value(nearest(found), name, site)?
                    .ok_or_else(|| self.undefined_member(&owner, name, site))?;
                Ok(Chain::Value(value_member(
                    Receiver::Value(Box::new(target)),
                    member,
                    site,
                )))
            }
            Some(args) => {
                let mut candidates: Vec<Candidate> = self
                    .visible_members(&owner, name, METHODS, site)?
                    .into_iter()
                    .filter(|m| !m.is_static)
                    .map(Candidate::new)
                    .collect();
                candidates.extend(
                    self.extension_methods(name, site)?
                        .into_iter()
                        .map(Candidate::new),
                );
                if candidates.is_empty() {
                    return Err(self.undefined_member(&owner, name, site));
                }
                let bound = self.resolve_overload(name, candidates, Some(&target), args, site)?;
                let receiver = if bound.member.extension {
                    Receiver::None
                } else {
                    Receiver::Value(Box::new(target))
                };
                Ok(Chain::Value(call(receiver, bound, site)))
            }
        }
    }

    fn static_member(
        &self,
        owner: &Ty,
        name: &str,
        args: Option<Vec<Element>>,
        site: &Site,
    ) -> Result<Chain, SemanticError> {
        match args {
            None => {
                let found: Vec<_> = self
                    .visible_members(owner, name, VALUE_MEMBERS, site)?
                    .into_iter()
                    .filter(|m| m.is_static)
                    .collect();
                let member = self
                    .single_value(nearest(found), name, site)?
                    .ok_or_else(|| self.undefined_member(owner, name, site))?;
                Ok(Chain::Value(value_member(Receiver::None, member, site)))
            }
            Some(args) => {
                let candidates: Vec<Candidate> = self
                    .visible_members(owner, name, METHODS, site)?
                    .into_iter()
                    .filter(|m| m.is_static)
                    .map(Candidate::new)
                    .collect();
                if candidates.is_empty() {
                    return Err(self.undefined_member(owner, name, site));
                }
                let bound = self.resolve_overload(name, candidates, None, args, site)?;
                Ok(Chain::Value(call(Receiver::None, bound, site)))
            }
        }
    }

    /// `chain[args]`.
    pub fn resolve_index(
        &self,
        chain: Chain,
        mut args: Vec<Element>,
        site: &Site,
    ) -> Result<Chain, SemanticError> {
        let target = self.finish_chain(chain)?;
        let ty = target.ty.clone();

        if let Some(element) = ty.array_element().cloned() {
            return self.single_index(target, &mut args, element, IndexKind::Array, site);
        }
        if ty.is_string() {
            return self.single_index(target, &mut args, Ty::CHAR, IndexKind::Chars, site);
        }

        let candidates: Vec<Candidate> = self
            .visible_members(&ty, "Item", INDEXERS, site)?
            .into_iter()
            .filter(|m| !m.is_static && !m.params.is_empty())
            .map(Candidate::new)
            .collect();
        if candidates.is_empty() {
            return Err(site.error(
                SemanticErrorKind::OperationNotDefined,
                format!("`[]` is not defined for type `{}`", self.type_name(&ty)),
            ));
        }
        let bound = self.resolve_overload("Item", candidates, None, args, site)?;
        Ok(Chain::Value(call(
            Receiver::Value(Box::new(target)),
            bound,
            site,
        )))
    }

    fn single_index(
        &self,
        target: Element,
        args: &mut Vec<Element>,
        result: Ty,
        kind: IndexKind,
        site: &Site,
    ) -> Result<Chain, SemanticError> {
        if args.len() != 1 {
            return Err(site.error(
                SemanticErrorKind::TypeMismatch,
                format!(
                    "`{}` takes exactly one index, found {}",
                    self.type_name(&target.ty),
                    args.len()
                ),
            ));
        }
        let index = self.convert(args.remove(0), &Ty::I32)?;
        Ok(Chain::Value(Element::new(
            ElementKind::Index {
                target: Box::new(target),
                index: Box::new(index),
                kind,
            },
            result,
            site.span.clone(),
            site.start,
        )))
    }

    /// The value a completed chain denotes.
    pub fn finish_chain(&self, chain: Chain) -> Result<Element, SemanticError> {
        let site = chain.site();
        match chain {
            Chain::Value(e) => Ok(e),
            Chain::Type { ty, .. } => Err(site.error(
                SemanticErrorKind::TypeMismatch,
                format!("type `{}` cannot be used as a value", self.type_name(&ty)),
            )),
            Chain::Namespace { name, .. } => {
                Err(site.error(SemanticErrorKind::UndefinedIdentifier, name))
            }
        }
    }
}
