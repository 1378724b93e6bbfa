use std::sync::Arc;

use pretty_assertions::assert_eq;
use rill_bytecode::{Instruction, LocalId};
use rill_core::{
    Accessibility, HostCatalogBuilder, HostType, MemberDescriptor, PrimitiveKind, Ty, TypeCatalog,
    Value,
};

use super::{Binder, Chain, Site};
use crate::diagnostics::SemanticErrorKind;
use crate::elements::{
    ArithmeticCode, ArithmeticOp, CompareCode, CompareOp, Conversion, Element, ElementKind,
    InTarget, LogicalOp, NegateCode, Receiver, ShiftOp,
};
use crate::lexer::Position;
use crate::options::CompileOptions;
use crate::scope::Scope;

fn site() -> Site {
    Site::new(0..1, Position::new(1, 1))
}

fn lit(value: Value) -> Element {
    Element::literal(value, false, 0..1, Position::new(1, 1))
}

fn var(scope: &Scope, name: &str) -> Element {
    let binder = Binder::new(scope);
    let chain = binder.resolve_root(name, None, &site()).unwrap();
    binder.finish_chain(chain).unwrap()
}

fn builtins() -> Scope {
    let mut b = HostCatalogBuilder::default().builtins();
    let color = b.add_enum("Color", PrimitiveKind::Int32, &[("Red", 0), ("Green", 1)]);
    let point = b.add_type(HostType::class("Point"));
    b.add_member(
        MemberDescriptor::property("X", point.clone(), Ty::I32)
            .invoke(|_, _| Ok(Value::I32(0)))
            .build(),
    );
    b.add_member(
        MemberDescriptor::field("secret", point.clone(), Ty::I32)
            .access(Accessibility::Private)
            .build(),
    );
    let catalog = b.build();
    let math = catalog.find_type("Math", false).unwrap();
    Scope::new(Arc::new(catalog))
        .variable("x", Ty::I32)
        .variable("d", Ty::F64)
        .variable("s", Ty::String)
        .variable("u", Ty::U32)
        .variable("big", Ty::U64)
        .variable("flag", Ty::BOOL)
        .variable("c", color)
        .variable("p", point)
        .import(math)
}

#[test]
fn arithmetic_promotes_both_operands() {
    let scope = builtins();
    let b = Binder::new(&scope);
    let e = b
        .arithmetic(ArithmeticOp::Add, var(&scope, "x"), var(&scope, "d"), &site())
        .unwrap();
    assert_eq!(e.ty, Ty::F64);
    let ElementKind::Arithmetic { left, right, code, .. } = &e.kind else {
        panic!("expected arithmetic, got {}", e.kind.name());
    };
    assert!(matches!(code, ArithmeticCode::Primitive(Instruction::Add)));
    assert!(matches!(
        left.kind,
        ElementKind::Cast {
            conversion: Conversion::Numeric {
                to: PrimitiveKind::Double,
                ..
            },
            ..
        }
    ));
    assert!(matches!(right.kind, ElementKind::Variable(_)));
}

#[test]
fn checked_arithmetic_uses_overflow_instructions() {
    let scope = builtins().options(CompileOptions {
        checked: true,
        ..CompileOptions::default()
    });
    let b = Binder::new(&scope);
    let e = b
        .arithmetic(ArithmeticOp::Mul, var(&scope, "u"), var(&scope, "u"), &site())
        .unwrap();
    assert_eq!(e.ty, Ty::U32);
    assert!(matches!(
        e.kind,
        ElementKind::Arithmetic {
            code: ArithmeticCode::Primitive(Instruction::MulOvfUn),
            ..
        }
    ));
}

#[test]
fn plus_with_a_string_concatenates() {
    let scope = builtins();
    let b = Binder::new(&scope);
    let e = b
        .arithmetic(ArithmeticOp::Add, var(&scope, "s"), lit(Value::I32(1)), &site())
        .unwrap();
    assert_eq!(e.ty, Ty::String);
    assert!(matches!(
        e.kind,
        ElementKind::Arithmetic {
            code: ArithmeticCode::Primitive(Instruction::Concat),
            ..
        }
    ));
}

#[test]
fn arithmetic_on_booleans_is_not_defined() {
    let scope = builtins();
    let b = Binder::new(&scope);
    let err = b
        .arithmetic(ArithmeticOp::Sub, var(&scope, "flag"), lit(Value::I32(1)), &site())
        .unwrap_err();
    assert_eq!(err.kind, SemanticErrorKind::OperationNotDefined);
    assert_eq!(
        err.message,
        "operation `-` is not defined for types `Boolean` and `Int32`"
    );
}

#[test]
fn literal_exponent_unrolls() {
    let scope = builtins();
    let b = Binder::new(&scope);
    let e = b
        .arithmetic(ArithmeticOp::Power, var(&scope, "x"), lit(Value::I32(3)), &site())
        .unwrap();
    assert_eq!(e.ty, Ty::I32);
    assert!(matches!(
        e.kind,
        ElementKind::Arithmetic {
            code: ArithmeticCode::Unrolled {
                kind: PrimitiveKind::Int32,
                exponent: 3,
                mul: Instruction::Mul,
            },
            ..
        }
    ));
}

#[test]
fn large_literal_exponent_keeps_the_integer_kind() {
    let scope = builtins();
    let b = Binder::new(&scope);
    for exponent in [64, 65, 1_000_000] {
        let e = b
            .arithmetic(
                ArithmeticOp::Power,
                var(&scope, "x"),
                lit(Value::I32(exponent)),
                &site(),
            )
            .unwrap();
        assert_eq!(e.ty, Ty::I32);
        assert!(matches!(
            e.kind,
            ElementKind::Arithmetic {
                code: ArithmeticCode::Unrolled { exponent: n, .. },
                ..
            } if n == exponent as u32
        ));
    }
}

#[test]
fn variable_exponent_is_double_pow() {
    let scope = builtins();
    let b = Binder::new(&scope);
    let e = b
        .arithmetic(ArithmeticOp::Power, var(&scope, "x"), var(&scope, "x"), &site())
        .unwrap();
    assert_eq!(e.ty, Ty::F64);
    assert!(matches!(
        e.kind,
        ElementKind::Arithmetic {
            code: ArithmeticCode::Primitive(Instruction::Pow),
            ..
        }
    ));

    let e = b
        .arithmetic(ArithmeticOp::Power, var(&scope, "x"), lit(Value::I32(65)), &site())
        .unwrap();
    assert_eq!(e.ty, Ty::F64);
}

#[test]
fn ordering_of_reals_uses_unordered_negation() {
    let scope = builtins();
    let b = Binder::new(&scope);
    let e = b
        .compare(CompareOp::Le, var(&scope, "d"), lit(Value::I32(1)), &site())
        .unwrap();
    assert_eq!(e.ty, Ty::BOOL);
    assert!(matches!(
        e.kind,
        ElementKind::Compare {
            code: CompareCode::Primitive {
                instr: Instruction::CgtUn,
                negate: true
            },
            ..
        }
    ));
}

#[test]
fn booleans_only_compare_for_equality() {
    let scope = builtins();
    let b = Binder::new(&scope);
    assert!(
        b.compare(CompareOp::Ne, var(&scope, "flag"), lit(Value::Bool(true)), &site())
            .is_ok()
    );
    let err = b
        .compare(CompareOp::Lt, var(&scope, "flag"), lit(Value::Bool(true)), &site())
        .unwrap_err();
    assert_eq!(err.kind, SemanticErrorKind::OperationNotDefined);
}

#[test]
fn string_equality_with_null() {
    let scope = builtins();
    let b = Binder::new(&scope);
    let e = b
        .compare(CompareOp::Ne, var(&scope, "s"), lit(Value::Null), &site())
        .unwrap();
    let ElementKind::Compare { code, .. } = &e.kind else {
        panic!("expected comparison");
    };
    assert!(matches!(
        code,
        CompareCode::Primitive {
            instr: Instruction::StrEq(_),
            negate: true
        }
    ));
}

#[test]
fn enum_comparison_goes_through_underlying() {
    let scope = builtins();
    let b = Binder::new(&scope);
    let e = b
        .compare(CompareOp::Gt, var(&scope, "c"), var(&scope, "c"), &site())
        .unwrap();
    let ElementKind::Compare { left, .. } = &e.kind else {
        panic!("expected comparison");
    };
    assert_eq!(left.ty, Ty::I32);
    assert!(matches!(
        left.kind,
        ElementKind::Cast {
            conversion: Conversion::FromEnum(PrimitiveKind::Int32),
            ..
        }
    ));
}

#[test]
fn shift_count_narrows_to_int32() {
    let scope = builtins().variable("n", Ty::I64);
    let b = Binder::new(&scope);
    let e = b
        .shift(ShiftOp::Right, var(&scope, "u"), var(&scope, "n"), &site())
        .unwrap();
    assert_eq!(e.ty, Ty::U32);
    let ElementKind::Shift { right, instr, .. } = &e.kind else {
        panic!("expected shift");
    };
    assert_eq!(*instr, Instruction::ShrUn);
    assert_eq!(right.ty, Ty::I32);
}

#[test]
fn negation_widens_uint32_and_rejects_uint64() {
    let scope = builtins();
    let b = Binder::new(&scope);
    let e = b.negate(var(&scope, "u"), &site()).unwrap();
    assert_eq!(e.ty, Ty::I64);

    let err = b.negate(var(&scope, "big"), &site()).unwrap_err();
    assert_eq!(err.kind, SemanticErrorKind::OperationNotDefined);
    assert_eq!(err.message, "operation `-` is not defined for type `UInt64`");
}

#[test]
fn checked_negation_subtracts_from_zero() {
    let scope = builtins().options(CompileOptions {
        checked: true,
        ..CompileOptions::default()
    });
    let b = Binder::new(&scope);
    let e = b.negate(var(&scope, "x"), &site()).unwrap();
    assert!(matches!(
        e.kind,
        ElementKind::Negate {
            code: NegateCode::CheckedZero(PrimitiveKind::Int32),
            ..
        }
    ));
}

#[test]
fn logical_operators_short_circuit_only_on_booleans() {
    let scope = builtins();
    let b = Binder::new(&scope);
    let e = b
        .logical(
            LogicalOp::And,
            var(&scope, "flag"),
            lit(Value::Bool(false)),
            &site(),
        )
        .unwrap();
    assert!(matches!(
        e.kind,
        ElementKind::Logical {
            short_circuit: true,
            ..
        }
    ));

    let e = b
        .logical(
            LogicalOp::Or,
            var(&scope, "x"),
            var(&scope, "u"),
            &site(),
        )
        .unwrap();
    assert_eq!(e.ty, Ty::I64);
    assert!(matches!(
        e.kind,
        ElementKind::Logical {
            short_circuit: false,
            ..
        }
    ));
}

#[test]
fn conditional_requires_boolean_condition() {
    let scope = builtins();
    let b = Binder::new(&scope);
    let err = b
        .conditional(
            var(&scope, "x"),
            lit(Value::I32(1)),
            lit(Value::I32(2)),
            &site(),
        )
        .unwrap_err();
    assert_eq!(err.kind, SemanticErrorKind::TypeMismatch);
    assert_eq!(
        err.message,
        "type mismatch: condition must be `Boolean`, found `Int32`"
    );
}

#[test]
fn conditional_widens_to_common_type() {
    let scope = builtins();
    let b = Binder::new(&scope);
    let e = b
        .conditional(
            var(&scope, "flag"),
            lit(Value::I32(1)),
            var(&scope, "d"),
            &site(),
        )
        .unwrap();
    assert_eq!(e.ty, Ty::F64);

    let err = b
        .conditional(var(&scope, "flag"), var(&scope, "s"), var(&scope, "x"), &site())
        .unwrap_err();
    assert_eq!(
        err.message,
        "type mismatch: branches `String` and `Int32` have no common type"
    );
}

#[test]
fn in_list_allocates_a_local() {
    let scope = builtins();
    let mut b = Binder::new(&scope);
    let e = b
        .in_list(
            var(&scope, "x"),
            vec![lit(Value::I32(1)), lit(Value::I64(2))],
            &site(),
        )
        .unwrap();
    let ElementKind::In {
        target: InTarget::List { local, comparisons },
        ..
    } = &e.kind
    else {
        panic!("expected list membership");
    };
    assert_eq!(*local, LocalId(0));
    assert_eq!(comparisons.len(), 2);
    assert_eq!(b.into_locals(), vec![Ty::I32]);
}

#[test]
fn in_array_converts_the_probe() {
    let scope = builtins().variable("xs", Ty::array_of(Ty::F64));
    let b = Binder::new(&scope);
    let e = b
        .in_collection(var(&scope, "x"), var(&scope, "xs"), &site())
        .unwrap();
    let ElementKind::In { probe, target } = &e.kind else {
        panic!("expected membership");
    };
    assert_eq!(probe.ty, Ty::F64);
    assert!(matches!(target, InTarget::Array(_)));

    let err = b
        .in_collection(var(&scope, "x"), var(&scope, "s"), &site())
        .unwrap_err();
    assert_eq!(err.message, "type mismatch: `String` is not a collection");
}

#[test]
fn variables_resolve_case_insensitively_by_default() {
    let scope = builtins();
    let e = var(&scope, "FLAG");
    assert!(matches!(&e.kind, ElementKind::Variable(name) if name == "flag"));

    let strict = builtins().options(CompileOptions {
        case_sensitive: true,
        ..CompileOptions::default()
    });
    let b = Binder::new(&strict);
    let chain = b.resolve_root("FLAG", None, &site()).unwrap();
    let err = b.finish_chain(chain).unwrap_err();
    assert_eq!(err.kind, SemanticErrorKind::UndefinedIdentifier);
    assert_eq!(err.message, "`FLAG` is not defined");
}

#[test]
fn imported_overloads_pick_the_closest_match() {
    let scope = builtins();
    let b = Binder::new(&scope);

    let chain = b
        .resolve_root("abs", Some(vec![lit(Value::I32(-3))]), &site())
        .unwrap();
    let e = b.finish_chain(chain).unwrap();
    assert_eq!(e.ty, Ty::I32);

    let chain = b
        .resolve_root(
            "Max",
            Some(vec![lit(Value::I32(1)), lit(Value::F64(2.0))]),
            &site(),
        )
        .unwrap();
    let e = b.finish_chain(chain).unwrap();
    assert_eq!(e.ty, Ty::F64);
    let ElementKind::Call { receiver, args, .. } = &e.kind else {
        panic!("expected call");
    };
    assert!(matches!(receiver, Receiver::None));
    assert_eq!(args[0].ty, Ty::F64);
}

#[test]
fn unknown_function_is_reported() {
    let scope = builtins();
    let b = Binder::new(&scope);
    let err = b
        .resolve_root("frobnicate", Some(vec![]), &site())
        .unwrap_err();
    assert_eq!(err.kind, SemanticErrorKind::UndefinedFunction);
    assert_eq!(err.message, "no function named `frobnicate`");
}

#[test]
fn no_overload_accepts_the_arguments() {
    let scope = builtins();
    let b = Binder::new(&scope);
    let err = b
        .resolve_root("Sqrt", Some(vec![lit(Value::string("four"))]), &site())
        .unwrap_err();
    assert_eq!(err.kind, SemanticErrorKind::TypeMismatch);
    assert_eq!(
        err.message,
        "type mismatch: no overload of `Sqrt` accepts arguments (`String`)"
    );
}

#[test]
fn variadic_call_packs_surplus_arguments() {
    let scope = builtins();
    let b = Binder::new(&scope);
    let chain = b.resolve_root("String", None, &site()).unwrap();
    assert!(matches!(chain, Chain::Type { ty: Ty::String, .. }));
    let chain = b
        .resolve_member(
            chain,
            "Concat",
            Some(vec![lit(Value::I32(1)), lit(Value::string("a"))]),
            &site(),
        )
        .unwrap();
    let e = b.finish_chain(chain).unwrap();
    let ElementKind::Call { args, rest, .. } = &e.kind else {
        panic!("expected call");
    };
    assert!(args.is_empty());
    let (element, items) = rest.as_ref().unwrap();
    assert_eq!(element, &Ty::Object);
    assert_eq!(items.len(), 2);
    assert!(matches!(
        items[0].kind,
        ElementKind::Cast {
            conversion: Conversion::Box(_),
            ..
        }
    ));
}

#[test]
fn instance_members_and_access() {
    let scope = builtins();
    let b = Binder::new(&scope);
    let chain = b.resolve_root("p", None, &site()).unwrap();
    let chain = b.resolve_member(chain, "x", None, &site()).unwrap();
    let e = b.finish_chain(chain).unwrap();
    assert_eq!(e.ty, Ty::I32);
    assert!(matches!(
        &e.kind,
        ElementKind::Member {
            receiver: Receiver::Value(_),
            ..
        }
    ));

    let chain = b.resolve_root("p", None, &site()).unwrap();
    let err = b.resolve_member(chain, "secret", None, &site()).unwrap_err();
    assert_eq!(err.kind, SemanticErrorKind::AccessDenied);

    let chain = b.resolve_root("p", None, &site()).unwrap();
    let err = b.resolve_member(chain, "Y", None, &site()).unwrap_err();
    assert_eq!(err.message, "undefined member: `Y` on type `Point`");
}

#[test]
fn private_members_are_visible_from_their_owner() {
    let scope = builtins();
    let point = scope.catalog().find_type("Point", false).unwrap();
    let scope = scope.owner(point);
    let b = Binder::new(&scope);
    let chain = b.resolve_root("secret", None, &site()).unwrap();
    let e = b.finish_chain(chain).unwrap();
    assert!(matches!(
        &e.kind,
        ElementKind::Member {
            receiver: Receiver::Owner,
            ..
        }
    ));
}

#[test]
fn string_indexing_yields_chars() {
    let scope = builtins();
    let b = Binder::new(&scope);
    let chain = b.resolve_root("s", None, &site()).unwrap();
    let chain = b
        .resolve_index(chain, vec![lit(Value::I32(0))], &site())
        .unwrap();
    let e = b.finish_chain(chain).unwrap();
    assert_eq!(e.ty, Ty::CHAR);

    let chain = b.resolve_root("x", None, &site()).unwrap();
    let err = b
        .resolve_index(chain, vec![lit(Value::I32(0))], &site())
        .unwrap_err();
    assert_eq!(err.message, "operation `[]` is not defined for type `Int32`");
}

#[test]
fn type_used_as_value() {
    let scope = builtins();
    let b = Binder::new(&scope);
    let chain = b.resolve_root("Math", None, &site()).unwrap();
    let err = b.finish_chain(chain).unwrap_err();
    assert_eq!(
        err.message,
        "type mismatch: type `Math` cannot be used as a value"
    );
}

#[test]
fn enum_members_through_the_type() {
    let scope = builtins();
    let b = Binder::new(&scope);
    let chain = b.resolve_root("Color", None, &site()).unwrap();
    let chain = b.resolve_member(chain, "Green", None, &site()).unwrap();
    let e = b.finish_chain(chain).unwrap();
    assert_eq!(scope.catalog().type_name(&e.ty), "Color");
}

#[test]
fn explicit_casts() {
    let scope = builtins();
    let b = Binder::new(&scope);

    let e = b.cast(var(&scope, "d"), Ty::I32, &site()).unwrap();
    assert!(matches!(
        e.kind,
        ElementKind::Cast {
            conversion: Conversion::Numeric {
                to: PrimitiveKind::Int32,
                checked: false,
                ..
            },
            ..
        }
    ));

    let color = scope.catalog().find_type("Color", false).unwrap();
    let e = b.cast(var(&scope, "x"), color, &site()).unwrap();
    assert!(matches!(
        e.kind,
        ElementKind::Cast {
            conversion: Conversion::ToEnum { .. },
            ..
        }
    ));

    let err = b.cast(var(&scope, "s"), Ty::I32, &site()).unwrap_err();
    assert_eq!(err.kind, SemanticErrorKind::InvalidExplicitCast);
    assert_eq!(err.message, "cannot cast `String` to `Int32`");
}

#[test]
fn unboxing_from_object() {
    let scope = builtins().variable("o", Ty::Object);
    let b = Binder::new(&scope);
    let e = b.cast(var(&scope, "o"), Ty::F64, &site()).unwrap();
    assert!(matches!(
        e.kind,
        ElementKind::Cast {
            conversion: Conversion::Unbox(Ty::F64),
            ..
        }
    ));
}

#[test]
fn type_names_resolve_aliases_and_arrays() {
    let scope = builtins();
    let b = Binder::new(&scope);
    assert_eq!(b.resolve_type_name("Int", false, &site()).unwrap(), Ty::I32);
    assert_eq!(
        b.resolve_type_name("double", true, &site()).unwrap(),
        Ty::array_of(Ty::F64)
    );
    let err = b
        .resolve_type_name("Geometry.Shape", false, &site())
        .unwrap_err();
    assert_eq!(err.message, "`Geometry.Shape` is not a known type");
}

fn constant(name: &str, declaring: &Ty, value: i32) -> MemberDescriptor {
    MemberDescriptor::field(name, declaring.clone(), Ty::I32)
        .static_member()
        .invoke(move |_, _| Ok(Value::I32(value)))
        .build()
}

#[test]
fn same_static_value_in_two_imports_is_ambiguous() {
    let mut b = HostCatalogBuilder::default().builtins();
    let first = b.add_type(HostType::class("First"));
    let second = b.add_type(HostType::class("Second"));
    b.add_member(constant("Limit", &first, 1));
    b.add_member(constant("Limit", &second, 2));
    b.add_member(constant("Only", &second, 3));
    let scope = Scope::new(Arc::new(b.build()))
        .import(first)
        .import(second);
    let binder = Binder::new(&scope);

    let err = binder.resolve_root("Limit", None, &site()).unwrap_err();
    assert_eq!(err.kind, SemanticErrorKind::AmbiguousMatch);
    assert_eq!(
        err.message,
        "ambiguous match: `Limit` matches `First.Limit`, `Second.Limit`"
    );

    let chain = binder.resolve_root("Only", None, &site()).unwrap();
    assert_eq!(binder.finish_chain(chain).unwrap().ty, Ty::I32);
}

#[test]
fn members_differing_only_in_case_are_ambiguous_without_case_sensitivity() {
    let mut b = HostCatalogBuilder::default().builtins();
    let limits = b.add_type(HostType::class("Limits"));
    b.add_member(constant("Max", &limits, 1));
    b.add_member(constant("MAX", &limits, 2));
    let catalog = Arc::new(b.build());

    let scope = Scope::new(catalog.clone()).import(limits.clone());
    let binder = Binder::new(&scope);
    let chain = binder.resolve_root("Limits", None, &site()).unwrap();
    let err = binder
        .resolve_member(chain, "max", None, &site())
        .unwrap_err();
    assert_eq!(err.kind, SemanticErrorKind::AmbiguousMatch);
    let err = binder.resolve_root("Max", None, &site()).unwrap_err();
    assert_eq!(err.kind, SemanticErrorKind::AmbiguousMatch);

    let strict = Scope::new(catalog)
        .import(limits)
        .options(CompileOptions::new().case_sensitive(true));
    let binder = Binder::new(&strict);
    let chain = binder.resolve_root("Limits", None, &site()).unwrap();
    let chain = binder.resolve_member(chain, "MAX", None, &site()).unwrap();
    let e = binder.finish_chain(chain).unwrap();
    let ElementKind::Member { member, .. } = &e.kind else {
        panic!("expected member, got {}", e.kind.name());
    };
    assert_eq!(member.name, "MAX");
}

#[test]
fn instance_and_owner_members_differing_only_in_case_are_ambiguous() {
    let mut b = HostCatalogBuilder::default().builtins();
    let order = b.add_type(HostType::class("Order"));
    b.add_member(MemberDescriptor::property("Total", order.clone(), Ty::I32).build());
    b.add_member(MemberDescriptor::field("total", order.clone(), Ty::I32).build());
    let scope = Scope::new(Arc::new(b.build()))
        .variable("o", order.clone())
        .owner(order);
    let binder = Binder::new(&scope);

    let chain = binder.resolve_root("o", None, &site()).unwrap();
    let err = binder
        .resolve_member(chain, "TOTAL", None, &site())
        .unwrap_err();
    assert_eq!(err.kind, SemanticErrorKind::AmbiguousMatch);

    let err = binder.resolve_root("Total", None, &site()).unwrap_err();
    assert_eq!(err.kind, SemanticErrorKind::AmbiguousMatch);
}

#[test]
fn derived_members_hide_base_members_of_the_same_name() {
    let mut b = HostCatalogBuilder::default().builtins();
    let shape = b.add_type(HostType::class("Shape"));
    let square = b.add_type(HostType::class("Square").base(shape.clone()));
    b.add_member(MemberDescriptor::property("Area", shape, Ty::F64).build());
    b.add_member(MemberDescriptor::property("Area", square.clone(), Ty::I32).build());
    let scope = Scope::new(Arc::new(b.build())).variable("sq", square);
    let binder = Binder::new(&scope);

    let chain = binder.resolve_root("sq", None, &site()).unwrap();
    let chain = binder.resolve_member(chain, "Area", None, &site()).unwrap();
    assert_eq!(binder.finish_chain(chain).unwrap().ty, Ty::I32);
}

#[test]
fn variables_differing_only_in_case_are_ambiguous_without_case_sensitivity() {
    let scope = builtins().variable("Flag", Ty::I32);
    assert!(scope.find_variable("FLAG").is_none());
    let binder = Binder::new(&scope);
    let err = binder.resolve_root("FLAG", None, &site()).unwrap_err();
    assert_eq!(err.kind, SemanticErrorKind::AmbiguousMatch);
    assert_eq!(
        err.message,
        "ambiguous match: `FLAG` matches variables `flag`, `Flag`"
    );

    let strict = builtins()
        .variable("Flag", Ty::I32)
        .options(CompileOptions::new().case_sensitive(true));
    assert_eq!(strict.find_variable("Flag").map(|(_, ty)| ty), Some(&Ty::I32));
    assert_eq!(strict.find_variable("flag").map(|(_, ty)| ty), Some(&Ty::BOOL));
    assert!(strict.find_variable("FLAG").is_none());
}
