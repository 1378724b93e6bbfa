//! Host type catalog.
//!
//! The compiler never reflects over host code. Everything it can bind to
//! (types, fields, properties, methods, operators) is described here and
//! looked up through the `TypeCatalog` trait.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::types::{HostTypeId, PrimitiveKind, Ty};
use crate::value::Value;

/// Error raised by host member invocation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct HostError(pub String);

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Callable body of a host member.
///
/// Receives the receiver (for instance members, and for extension methods the
/// bound first argument is passed in `args` instead) and the argument values,
/// already converted to the parameter types. Rest arguments arrive packed as a
/// single `Value::Array`.
pub type Invoker = Arc<dyn Fn(Option<&Value>, &[Value]) -> Result<Value, HostError> + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Method,
    Field,
    Property,
    /// Static operator method, named after the operator (`Addition`, `Explicit`, ...).
    Operator,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Accessibility {
    #[default]
    Public,
    Internal,
    Private,
}

/// A bindable member of a host type.
pub struct MemberDescriptor {
    pub name: String,
    pub kind: MemberKind,
    pub declaring: Ty,
    pub is_static: bool,
    pub params: Vec<Ty>,
    /// Element type of a trailing variadic parameter.
    pub rest: Option<Ty>,
    /// First parameter binds the call's implicit receiver.
    pub extension: bool,
    pub return_ty: Ty,
    pub access: Accessibility,
    invoker: Invoker,
}

impl MemberDescriptor {
    pub fn method(name: impl Into<String>, declaring: Ty) -> MemberBuilder {
        MemberBuilder::new(name.into(), MemberKind::Method, declaring)
    }

    pub fn field(name: impl Into<String>, declaring: Ty, ty: Ty) -> MemberBuilder {
        MemberBuilder::new(name.into(), MemberKind::Field, declaring).returns(ty)
    }

    pub fn property(name: impl Into<String>, declaring: Ty, ty: Ty) -> MemberBuilder {
        MemberBuilder::new(name.into(), MemberKind::Property, declaring).returns(ty)
    }

    /// Operators are always static.
    pub fn operator(name: impl Into<String>, declaring: Ty) -> MemberBuilder {
        MemberBuilder::new(name.into(), MemberKind::Operator, declaring).static_member()
    }

    pub fn invoke(&self, receiver: Option<&Value>, args: &[Value]) -> Result<Value, HostError> {
        (self.invoker)(receiver, args)
    }

    /// Whether surplus arguments are packed into a trailing array.
    pub fn is_variadic(&self) -> bool {
        self.rest.is_some()
    }

    pub fn is_value_member(&self) -> bool {
        matches!(self.kind, MemberKind::Field | MemberKind::Property)
    }
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("declaring", &self.declaring)
            .field("is_static", &self.is_static)
            .field("params", &self.params)
            .field("rest", &self.rest)
            .field("extension", &self.extension)
            .field("return_ty", &self.return_ty)
            .field("access", &self.access)
            .finish_non_exhaustive()
    }
}

/// Builder for `MemberDescriptor`.
pub struct MemberBuilder {
    name: String,
    kind: MemberKind,
    declaring: Ty,
    is_static: bool,
    params: Vec<Ty>,
    rest: Option<Ty>,
    extension: bool,
    return_ty: Ty,
    access: Accessibility,
    invoker: Option<Invoker>,
}

impl MemberBuilder {
    fn new(name: String, kind: MemberKind, declaring: Ty) -> Self {
        Self {
            name,
            kind,
            declaring,
            is_static: false,
            params: Vec::new(),
            rest: None,
            extension: false,
            return_ty: Ty::Object,
            access: Accessibility::Public,
            invoker: None,
        }
    }

    pub fn static_member(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn param(mut self, ty: Ty) -> Self {
        self.params.push(ty);
        self
    }

    pub fn params(mut self, tys: impl IntoIterator<Item = Ty>) -> Self {
        self.params.extend(tys);
        self
    }

    pub fn rest(mut self, element: Ty) -> Self {
        self.rest = Some(element);
        self
    }

    /// Static method whose first parameter receives the call's receiver.
    pub fn extension(mut self) -> Self {
        self.extension = true;
        self.is_static = true;
        self
    }

    pub fn returns(mut self, ty: Ty) -> Self {
        self.return_ty = ty;
        self
    }

    pub fn access(mut self, access: Accessibility) -> Self {
        self.access = access;
        self
    }

    pub fn invoke<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value, HostError> + Send + Sync + 'static,
    {
        self.invoker = Some(Arc::new(f));
        self
    }

    pub fn build(self) -> MemberDescriptor {
        let name = self.name.clone();
        let invoker = self.invoker.unwrap_or_else(|| {
            Arc::new(move |_, _| Err(HostError(format!("member `{name}` has no body"))))
        });
        MemberDescriptor {
            name: self.name,
            kind: self.kind,
            declaring: self.declaring,
            is_static: self.is_static,
            params: self.params,
            rest: self.rest,
            extension: self.extension,
            return_ty: self.return_ty,
            access: self.access,
            invoker,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostTypeKind {
    Class { sealed: bool },
    Struct,
    Interface,
    Enum { underlying: PrimitiveKind },
}

/// How `in` probes a collection type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CollectionShape {
    /// `Contains(element)`.
    Sequence { element: Ty },
    /// `ContainsKey(key)`.
    Dictionary { key: Ty, value: Ty },
    /// Non-generic collection, `Contains(Object)`.
    Untyped,
}

impl CollectionShape {
    pub fn contains_method(&self) -> &'static str {
        match self {
            Self::Dictionary { .. } => "ContainsKey",
            Self::Sequence { .. } | Self::Untyped => "Contains",
        }
    }

    pub fn probe_type(&self) -> Ty {
        match self {
            Self::Sequence { element } => element.clone(),
            Self::Dictionary { key, .. } => key.clone(),
            Self::Untyped => Ty::Object,
        }
    }
}

/// Descriptor of a host type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostType {
    /// Dotted full name, e.g. `Geometry.Point`.
    pub name: String,
    pub kind: HostTypeKind,
    /// Direct base class. `None` means `Object` for classes.
    pub base: Option<Ty>,
    pub interfaces: Vec<Ty>,
    pub collection: Option<CollectionShape>,
}

impl HostType {
    fn new(name: impl Into<String>, kind: HostTypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            base: None,
            interfaces: Vec::new(),
            collection: None,
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, HostTypeKind::Class { sealed: false })
    }

    pub fn sealed_class(name: impl Into<String>) -> Self {
        Self::new(name, HostTypeKind::Class { sealed: true })
    }

    pub fn structure(name: impl Into<String>) -> Self {
        Self::new(name, HostTypeKind::Struct)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, HostTypeKind::Interface)
    }

    pub fn enumeration(name: impl Into<String>, underlying: PrimitiveKind) -> Self {
        Self::new(name, HostTypeKind::Enum { underlying })
    }

    pub fn base(mut self, base: Ty) -> Self {
        self.base = Some(base);
        self
    }

    pub fn implements(mut self, interface: Ty) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn collection(mut self, shape: CollectionShape) -> Self {
        self.collection = Some(shape);
        self
    }

    /// Short name: last dotted segment.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

/// Type and member lookup consumed by the compiler.
///
/// Implementors provide the four required lookups; the classification
/// helpers are derived from them.
pub trait TypeCatalog: Send + Sync {
    /// Resolve a dotted host type name.
    fn find_type(&self, dotted_name: &str, ignore_case: bool) -> Option<Ty>;

    fn describe(&self, id: HostTypeId) -> Option<&HostType>;

    /// Members named `name` of one of `kinds`, declared on `owner` or inherited.
    ///
    /// Most-derived declarations come first.
    fn find_members(
        &self,
        owner: &Ty,
        name: &str,
        kinds: &[MemberKind],
        ignore_case: bool,
    ) -> Vec<Arc<MemberDescriptor>>;

    /// Whether `member` may be bound from an expression whose owner is `from`.
    fn is_accessible(&self, member: &MemberDescriptor, from: Option<&Ty>) -> bool;

    fn type_name(&self, ty: &Ty) -> String {
        match ty {
            Ty::Host(id) => self
                .describe(*id)
                .map_or_else(|| ty.to_string(), |t| t.name.clone()),
            Ty::Array(element) => format!("{}[]", self.type_name(element)),
            _ => ty.to_string(),
        }
    }

    fn host_kind(&self, ty: &Ty) -> Option<&HostTypeKind> {
        ty.host_id().and_then(|id| self.describe(id)).map(|t| &t.kind)
    }

    fn enum_underlying(&self, ty: &Ty) -> Option<PrimitiveKind> {
        match self.host_kind(ty) {
            Some(HostTypeKind::Enum { underlying }) => Some(*underlying),
            _ => None,
        }
    }

    fn is_enum(&self, ty: &Ty) -> bool {
        self.enum_underlying(ty).is_some()
    }

    fn is_interface(&self, ty: &Ty) -> bool {
        matches!(self.host_kind(ty), Some(HostTypeKind::Interface))
    }

    /// Value types box when converted to `Object` or an interface.
    fn is_value_type(&self, ty: &Ty) -> bool {
        match ty {
            Ty::Primitive(_) | Ty::DateTime | Ty::TimeSpan => true,
            Ty::Host(_) => matches!(
                self.host_kind(ty),
                Some(HostTypeKind::Struct | HostTypeKind::Enum { .. })
            ),
            Ty::String | Ty::Object | Ty::Null | Ty::Array(_) => false,
        }
    }

    fn is_reference_type(&self, ty: &Ty) -> bool {
        !matches!(ty, Ty::Null) && !self.is_value_type(ty)
    }

    fn is_class(&self, ty: &Ty) -> bool {
        match ty {
            Ty::String | Ty::Object | Ty::Array(_) => true,
            Ty::Host(_) => matches!(self.host_kind(ty), Some(HostTypeKind::Class { .. })),
            _ => false,
        }
    }

    fn is_sealed(&self, ty: &Ty) -> bool {
        match ty {
            Ty::String | Ty::Array(_) => true,
            Ty::Object => false,
            Ty::Host(_) => match self.host_kind(ty) {
                Some(HostTypeKind::Class { sealed }) => *sealed,
                Some(HostTypeKind::Interface) => false,
                _ => true,
            },
            _ => true,
        }
    }

    /// Direct base type. `Object` has none.
    fn base_type(&self, ty: &Ty) -> Option<Ty> {
        match ty {
            Ty::Object | Ty::Null => None,
            Ty::Host(id) => match self.describe(*id) {
                Some(HostType {
                    kind: HostTypeKind::Interface,
                    ..
                }) => None,
                Some(t) => Some(t.base.clone().unwrap_or(Ty::Object)),
                None => Some(Ty::Object),
            },
            _ => Some(Ty::Object),
        }
    }

    /// All interfaces of `ty`, including inherited ones and interface ancestors.
    fn interfaces(&self, ty: &Ty) -> Vec<Ty> {
        let mut out: Vec<Ty> = Vec::new();
        let mut pending: Vec<Ty> = Vec::new();
        let mut current = Some(ty.clone());
        while let Some(t) = current {
            if let Some(host) = t.host_id().and_then(|id| self.describe(id)) {
                pending.extend(host.interfaces.iter().cloned());
            }
            current = self.base_type(&t);
        }
        while let Some(iface) = pending.pop() {
            if out.contains(&iface) {
                continue;
            }
            if let Some(host) = iface.host_id().and_then(|id| self.describe(id)) {
                pending.extend(host.interfaces.iter().cloned());
            }
            out.push(iface);
        }
        out
    }

    fn implements(&self, ty: &Ty, interface: &Ty) -> bool {
        self.interfaces(ty).contains(interface)
    }

    /// Base-chain steps from `from` to `to`, when `to` is an ancestor.
    fn inheritance_distance(&self, from: &Ty, to: &Ty) -> Option<u32> {
        let mut steps = 0;
        let mut current = Some(from.clone());
        while let Some(t) = current {
            if &t == to {
                return Some(steps);
            }
            steps += 1;
            current = self.base_type(&t);
        }
        None
    }

    fn is_base_of(&self, base: &Ty, derived: &Ty) -> bool {
        base != derived && self.inheritance_distance(derived, base).is_some()
    }

    /// Reference, boxing and null conversions that need no user operator.
    fn is_assignable(&self, from: &Ty, to: &Ty) -> bool {
        if from == to {
            return true;
        }
        if matches!(from, Ty::Null) {
            return self.is_reference_type(to);
        }
        if matches!(to, Ty::Object) {
            return true;
        }
        if self.is_interface(to) {
            return self.implements(from, to);
        }
        if let (Ty::Array(fe), Ty::Array(te)) = (from, to) {
            return self.is_reference_type(fe)
                && self.is_reference_type(te)
                && self.is_assignable(fe, te);
        }
        if self.is_reference_type(from) && self.is_class(to) {
            return self.is_base_of(to, from);
        }
        false
    }

    fn collection_shape(&self, ty: &Ty) -> Option<CollectionShape> {
        let own = ty
            .host_id()
            .and_then(|id| self.describe(id))
            .and_then(|t| t.collection.clone());
        if own.is_some() {
            return own;
        }
        self.base_type(ty)
            .filter(|b| !matches!(b, Ty::Object))
            .and_then(|b| self.collection_shape(&b))
    }
}

/// In-memory catalog assembled with `HostCatalogBuilder`.
#[derive(Default)]
pub struct HostCatalog {
    types: Vec<HostType>,
    by_name: IndexMap<String, HostTypeId>,
    members: IndexMap<Ty, Vec<Arc<MemberDescriptor>>>,
    allow_internal: bool,
}

impl HostCatalog {
    pub fn builder() -> HostCatalogBuilder {
        HostCatalogBuilder::default()
    }

    /// Catalog holding only the builtin `Math` and `String` members.
    pub fn with_builtins() -> Self {
        Self::builder().builtins().build()
    }

    pub fn types(&self) -> impl Iterator<Item = (HostTypeId, &HostType)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, t)| (HostTypeId(i as u32), t))
    }

    fn declared(&self, owner: &Ty) -> &[Arc<MemberDescriptor>] {
        self.members.get(owner).map_or(&[], Vec::as_slice)
    }
}

impl fmt::Debug for HostCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostCatalog")
            .field("types", &self.types.len())
            .field("members", &self.members.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}

impl TypeCatalog for HostCatalog {
    fn find_type(&self, dotted_name: &str, ignore_case: bool) -> Option<Ty> {
        if let Some(id) = self.by_name.get(dotted_name) {
            return Some(Ty::Host(*id));
        }
        if !ignore_case {
            return None;
        }
        self.by_name
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(dotted_name))
            .map(|(_, id)| Ty::Host(*id))
    }

    fn describe(&self, id: HostTypeId) -> Option<&HostType> {
        self.types.get(id.index())
    }

    fn find_members(
        &self,
        owner: &Ty,
        name: &str,
        kinds: &[MemberKind],
        ignore_case: bool,
    ) -> Vec<Arc<MemberDescriptor>> {
        let matches_name = |m: &MemberDescriptor| {
            if ignore_case {
                m.name.eq_ignore_ascii_case(name)
            } else {
                m.name == name
            }
        };

        let mut out = Vec::new();
        let mut current = Some(owner.clone());
        while let Some(ty) = current {
            out.extend(
                self.declared(&ty)
                    .iter()
                    .filter(|m| kinds.contains(&m.kind) && matches_name(m))
                    .cloned(),
            );
            current = self.base_type(&ty);
        }
        // Interface members are visible through interface-typed receivers.
        if self.is_interface(owner) {
            for iface in self.interfaces(owner) {
                out.extend(
                    self.declared(&iface)
                        .iter()
                        .filter(|m| kinds.contains(&m.kind) && matches_name(m))
                        .cloned(),
                );
            }
        }
        out
    }

    fn is_accessible(&self, member: &MemberDescriptor, from: Option<&Ty>) -> bool {
        match member.access {
            Accessibility::Public => true,
            Accessibility::Internal => self.allow_internal,
            Accessibility::Private => from == Some(&member.declaring),
        }
    }
}

/// Builder for `HostCatalog`.
#[derive(Default)]
pub struct HostCatalogBuilder {
    catalog: HostCatalog,
}

impl HostCatalogBuilder {
    /// Register builtin `Math` and `String` members.
    pub fn builtins(mut self) -> Self {
        crate::builtins::register(&mut self);
        self
    }

    /// Let expressions bind `Internal` members.
    pub fn allow_internal(mut self, value: bool) -> Self {
        self.catalog.allow_internal = value;
        self
    }

    /// Register a type; re-registering a name returns the existing id.
    pub fn add_type(&mut self, ty: HostType) -> Ty {
        if let Some(id) = self.catalog.by_name.get(&ty.name) {
            return Ty::Host(*id);
        }
        let id = HostTypeId(self.catalog.types.len() as u32);
        self.catalog.by_name.insert(ty.name.clone(), id);
        self.catalog.types.push(ty);
        Ty::Host(id)
    }

    /// Register an enum type and one static field per member.
    pub fn add_enum(
        &mut self,
        name: impl Into<String>,
        underlying: PrimitiveKind,
        members: &[(&str, i64)],
    ) -> Ty {
        let ty = self.add_type(HostType::enumeration(name, underlying));
        let Some(id) = ty.host_id() else {
            return ty;
        };
        for &(member, value) in members {
            self.add_member(
                MemberDescriptor::field(member, ty.clone(), ty.clone())
                    .static_member()
                    .invoke(move |_, _| Ok(Value::enum_value(id, value)))
                    .build(),
            );
        }
        ty
    }

    pub fn add_member(&mut self, member: MemberDescriptor) -> Arc<MemberDescriptor> {
        let member = Arc::new(member);
        self.catalog
            .members
            .entry(member.declaring.clone())
            .or_default()
            .push(Arc::clone(&member));
        member
    }

    pub fn build(self) -> HostCatalog {
        self.catalog
    }
}
