use chrono::{NaiveDate, TimeDelta};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rill_bytecode::StringComparison;
use rill_core::{PrimitiveKind, Value};

use super::error::RuntimeError;
use super::ops::{
    Arith, Bitwise, arithmetic, bitwise, compare, convert, negate, shift, string_equals,
};

#[test]
fn unchecked_integral_arithmetic_wraps() {
    assert_eq!(
        arithmetic(Arith::Add, false, Value::I32(i32::MAX), Value::I32(1)),
        Ok(Value::I32(i32::MIN))
    );
    assert_eq!(
        arithmetic(Arith::Sub, false, Value::U32(0), Value::U32(1)),
        Ok(Value::U32(u32::MAX))
    );
}

#[test]
fn checked_integral_arithmetic_overflows() {
    assert_eq!(
        arithmetic(Arith::Mul, true, Value::I64(i64::MAX), Value::I64(2)),
        Err(RuntimeError::Overflow)
    );
    assert_eq!(
        arithmetic(Arith::Sub, true, Value::U64(0), Value::U64(1)),
        Err(RuntimeError::Overflow)
    );
    assert_eq!(
        arithmetic(Arith::Add, true, Value::I32(40), Value::I32(2)),
        Ok(Value::I32(42))
    );
}

#[test]
fn integral_division() {
    assert_eq!(
        arithmetic(Arith::Div, false, Value::I32(7), Value::I32(2)),
        Ok(Value::I32(3))
    );
    assert_eq!(
        arithmetic(Arith::Rem, false, Value::I32(-7), Value::I32(2)),
        Ok(Value::I32(-1))
    );
    assert_eq!(
        arithmetic(Arith::Div, false, Value::I32(1), Value::I32(0)),
        Err(RuntimeError::DivideByZero)
    );
    assert_eq!(
        arithmetic(Arith::Div, false, Value::I32(i32::MIN), Value::I32(-1)),
        Err(RuntimeError::Overflow)
    );
}

#[test]
fn real_division_by_zero_is_infinite() {
    assert_eq!(
        arithmetic(Arith::Div, false, Value::F64(1.0), Value::F64(0.0)),
        Ok(Value::F64(f64::INFINITY))
    );
}

#[test]
fn mismatched_operands_are_invalid() {
    let err = arithmetic(Arith::Add, false, Value::I32(1), Value::I64(1)).unwrap_err();
    assert_eq!(
        err,
        RuntimeError::InvalidProgram("`+` applied to `Int32` and `Int64`".into())
    );
}

#[test]
fn temporal_arithmetic() {
    let day = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let next = NaiveDate::from_ymd_opt(2024, 3, 2)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    assert_eq!(
        arithmetic(Arith::Sub, false, Value::DateTime(next), Value::DateTime(day)),
        Ok(Value::TimeSpan(TimeDelta::hours(36)))
    );
    assert_eq!(
        arithmetic(Arith::Add, false, Value::DateTime(day), Value::TimeSpan(TimeDelta::hours(36))),
        Ok(Value::DateTime(next))
    );
    assert_eq!(
        negate(Value::TimeSpan(TimeDelta::seconds(5))),
        Ok(Value::TimeSpan(TimeDelta::seconds(-5)))
    );
}

#[test]
fn shift_counts_are_masked() {
    assert_eq!(shift(true, Value::I32(1), Value::I32(33)), Ok(Value::I32(2)));
    assert_eq!(shift(false, Value::I32(-8), Value::I32(1)), Ok(Value::I32(-4)));
    assert_eq!(
        shift(false, Value::U32(0x8000_0000), Value::I32(31)),
        Ok(Value::U32(1))
    );
    assert_eq!(shift(true, Value::I64(1), Value::I32(40)), Ok(Value::I64(1 << 40)));
}

#[test]
fn bitwise_on_booleans_is_logical() {
    assert_eq!(
        bitwise(Bitwise::Xor, Value::Bool(true), Value::Bool(true)),
        Ok(Value::Bool(false))
    );
    assert_eq!(
        bitwise(Bitwise::And, Value::I32(0b1100), Value::I32(0b1010)),
        Ok(Value::I32(0b1000))
    );
}

#[test]
fn nan_is_unordered() {
    assert_eq!(compare(&Value::F64(f64::NAN), &Value::F64(1.0)), Ok(None));
    assert_eq!(
        compare(&Value::string("a"), &Value::string("b")),
        Ok(Some(std::cmp::Ordering::Less))
    );
}

#[test]
fn string_equality_modes() {
    let (a, b) = (Value::string("Straße"), Value::string("STRASSE"));
    assert_eq!(string_equals(&a, &b, StringComparison::IgnoreCase), Ok(false));
    let (a, b) = (Value::string("Hello"), Value::string("hELLO"));
    assert_eq!(string_equals(&a, &b, StringComparison::Ordinal), Ok(false));
    assert_eq!(string_equals(&a, &b, StringComparison::IgnoreCase), Ok(true));
    assert_eq!(string_equals(&Value::Null, &b, StringComparison::Ordinal), Ok(false));
    assert_eq!(
        string_equals(&Value::Null, &Value::Null, StringComparison::Ordinal),
        Ok(true)
    );
}

#[test]
fn unchecked_conversions_truncate() {
    assert_eq!(
        convert(Value::I32(300), PrimitiveKind::Byte, false),
        Ok(Value::U8(44))
    );
    assert_eq!(
        convert(Value::F64(-2.9), PrimitiveKind::Int32, false),
        Ok(Value::I32(-2))
    );
    assert_eq!(
        convert(Value::I32(65), PrimitiveKind::Char, false),
        Ok(Value::Char('A'))
    );
    assert_eq!(
        convert(Value::Char('A'), PrimitiveKind::Double, false),
        Ok(Value::F64(65.0))
    );
}

#[test]
fn checked_conversions_overflow() {
    assert_eq!(
        convert(Value::I32(300), PrimitiveKind::Byte, true),
        Err(RuntimeError::Overflow)
    );
    assert_eq!(
        convert(Value::I32(-1), PrimitiveKind::UInt64, true),
        Err(RuntimeError::Overflow)
    );
    assert_eq!(
        convert(Value::F64(f64::NAN), PrimitiveKind::Int32, true),
        Err(RuntimeError::Overflow)
    );
    assert_eq!(
        convert(Value::F64(1e10), PrimitiveKind::Int32, true),
        Err(RuntimeError::Overflow)
    );
    assert_eq!(
        convert(Value::F64(12.75), PrimitiveKind::Int16, true),
        Ok(Value::I16(12))
    );
}

#[test]
fn booleans_do_not_convert() {
    assert_eq!(
        convert(Value::I32(1), PrimitiveKind::Boolean, false),
        Err(RuntimeError::InvalidCast {
            from: "Int32".into(),
            to: "Boolean".into()
        })
    );
}

proptest! {
    #[test]
    fn checked_add_matches_wide_arithmetic(a: i32, b: i32) {
        let wide = a as i64 + b as i64;
        let r = arithmetic(Arith::Add, true, Value::I32(a), Value::I32(b));
        match i32::try_from(wide) {
            Ok(v) => prop_assert_eq!(r, Ok(Value::I32(v))),
            Err(_) => prop_assert_eq!(r, Err(RuntimeError::Overflow)),
        }
    }

    #[test]
    fn checked_round_trip_through_int64(v: i32) {
        let wide = convert(Value::I32(v), PrimitiveKind::Int64, true).unwrap();
        prop_assert_eq!(convert(wide, PrimitiveKind::Int32, true), Ok(Value::I32(v)));
    }
}
