#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core data model for the rill expression compiler.
//!
//! Four layers, leaf to root:
//! - **Types** (`Ty`, `PrimitiveKind`): static types seen by the compiler
//! - **Promotion**: binary numeric promotion and implicit-conversion scoring
//! - **Catalog** (`TypeCatalog`, `HostCatalog`): host types and members the
//!   compiler binds against
//! - **Values** (`Value`, `HostObject`): runtime values flowing through the VM

mod builtins;
mod catalog;
mod colors;
mod promotion;
mod types;
mod value;

#[cfg(test)]
mod promotion_tests;
#[cfg(test)]
mod types_tests;
#[cfg(test)]
mod value_tests;

pub use catalog::{
    Accessibility, CollectionShape, HostCatalog, HostCatalogBuilder, HostError, HostType,
    HostTypeKind, Invoker, MemberBuilder, MemberDescriptor, MemberKind, TypeCatalog,
};
pub use colors::{Colors, Paint};
pub use promotion::{
    ConversionScore, binary_promotion, find_implicit_operator, implicit_numeric, implicit_score,
    numeric_rank, unary_promotion,
};
pub use types::{HostTypeId, PrimitiveKind, Ty};
pub use value::{ArrayValue, EnumValue, HostObject, Value};
