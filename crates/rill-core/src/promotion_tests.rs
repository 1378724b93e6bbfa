use proptest::prelude::*;

use crate::{
    ConversionScore, HostCatalog, HostCatalogBuilder, HostType, MemberDescriptor, PrimitiveKind,
    Ty, binary_promotion, implicit_numeric, implicit_score, unary_promotion,
};

use PrimitiveKind::*;

fn any_kind() -> impl Strategy<Value = PrimitiveKind> {
    proptest::sample::select(PrimitiveKind::ALL.to_vec())
}

proptest! {
    #[test]
    fn promotion_is_symmetric(a in any_kind(), b in any_kind()) {
        prop_assert_eq!(binary_promotion(a, b), binary_promotion(b, a));
    }

    #[test]
    fn promotion_result_is_reachable_from_both(a in any_kind(), b in any_kind()) {
        if let Some(r) = binary_promotion(a, b) {
            prop_assert!(implicit_numeric(a, r));
            prop_assert!(implicit_numeric(b, r));
        }
    }
}

#[test]
fn small_kinds_promote_to_int32() {
    assert_eq!(binary_promotion(Byte, SByte), Some(Int32));
    assert_eq!(binary_promotion(Char, Int16), Some(Int32));
    assert_eq!(binary_promotion(Int32, Int32), Some(Int32));
}

#[test]
fn mixed_sign_widens() {
    assert_eq!(binary_promotion(Int32, UInt32), Some(Int64));
    assert_eq!(binary_promotion(UInt32, UInt32), Some(UInt32));
    assert_eq!(binary_promotion(UInt64, UInt32), Some(UInt64));
}

#[test]
fn uint64_with_signed_is_undefined() {
    assert_eq!(binary_promotion(UInt64, Int32), None);
    assert_eq!(binary_promotion(Int64, UInt64), None);
    assert_eq!(binary_promotion(UInt64, Double), Some(Double));
}

#[test]
fn boolean_never_promotes() {
    assert_eq!(binary_promotion(Boolean, Int32), None);
    assert_eq!(unary_promotion(Boolean), None);
}

#[test]
fn unary_promotion_of_small_kinds() {
    assert_eq!(unary_promotion(Byte), Some(Int32));
    assert_eq!(unary_promotion(Char), Some(Int32));
    assert_eq!(unary_promotion(UInt32), Some(UInt32));
    assert_eq!(unary_promotion(Single), Some(Single));
}

#[test]
fn narrowing_is_not_implicit() {
    assert!(!implicit_numeric(Int64, Int32));
    assert!(!implicit_numeric(Double, Single));
    assert!(!implicit_numeric(Int32, Char));
    assert!(implicit_numeric(Char, UInt16));
}

#[test]
fn widening_scores_grow_with_distance() {
    let catalog = HostCatalog::default();
    let identical = implicit_score(&catalog, &Ty::I32, &Ty::I32);
    let to_long = implicit_score(&catalog, &Ty::I32, &Ty::I64);
    let to_double = implicit_score(&catalog, &Ty::I32, &Ty::F64);

    assert_eq!(identical, Some(ConversionScore::IDENTICAL));
    assert!(to_long < to_double);
    assert_eq!(implicit_score(&catalog, &Ty::F64, &Ty::I32), None);
}

#[test]
fn null_scores_only_reference_targets() {
    let catalog = HostCatalog::default();
    assert!(implicit_score(&catalog, &Ty::Null, &Ty::String).is_some());
    assert_eq!(implicit_score(&catalog, &Ty::Null, &Ty::I32), None);
}

#[test]
fn inheritance_costs_more_than_interfaces() {
    let mut b = HostCatalogBuilder::default();
    let shape = b.add_type(HostType::interface("IShape"));
    let base = b.add_type(HostType::class("Base"));
    let derived = b.add_type(HostType::class("Derived").base(base.clone()).implements(shape.clone()));
    let catalog = b.build();

    let via_interface = implicit_score(&catalog, &derived, &shape);
    let via_base = implicit_score(&catalog, &derived, &base);
    assert_eq!(via_interface, Some(ConversionScore::INTERFACE));
    assert_eq!(via_base, Some(ConversionScore::INHERITANCE_STEP));
    assert_eq!(implicit_score(&catalog, &base, &derived), None);
}

#[test]
fn user_implicit_operator_is_cheapest_non_identity() {
    let mut b = HostCatalogBuilder::default();
    let money = b.add_type(HostType::structure("Money"));
    b.add_member(
        MemberDescriptor::operator("Implicit", money.clone())
            .param(money.clone())
            .returns(Ty::F64)
            .build(),
    );
    let catalog = b.build();

    assert_eq!(
        implicit_score(&catalog, &money, &Ty::F64),
        Some(ConversionScore::USER_OPERATOR)
    );
    assert_eq!(implicit_score(&catalog, &money, &Ty::I32), None);
}
