use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rill_core::{Colors, PrimitiveKind, Ty, Value};
use rill_vm::{ExecLimits, RuntimeError, Verbosity};

use crate::{CompileOptions, Error, Expression, ExpressionContext, VariableValues};

#[test]
fn exposes_source_types_and_variables() {
    let context = ExpressionContext::new()
        .variable("a", Ty::I32)
        .variable("unused", Ty::String)
        .variable("b", Ty::F64);
    let expression = context.compile("b * a").unwrap();

    assert_eq!(expression.source(), "b * a");
    assert_eq!(expression.result_type(), &Ty::F64);
    let vars: Vec<(&str, &Ty)> = expression.variables().collect();
    assert_eq!(vars, [("b", &Ty::F64), ("a", &Ty::I32)]);
}

#[test]
fn trace_records_each_instruction() {
    let expression = ExpressionContext::new().compile("1 + 2").unwrap();
    let traced = expression.trace(
        &VariableValues::new(),
        None,
        Verbosity::Default,
        Colors::OFF,
    );
    assert_eq!(traced.result.unwrap(), Value::I32(3));
    assert_eq!(
        traced.lines,
        [
            "0000  LdI4      1  -> 1",
            "0005  LdI4      2  -> 2",
            "0010  Add  -> 3",
            "0011  Ret  => 3",
        ]
    );
}

#[test]
fn trace_keeps_lines_up_to_the_failure() {
    let context = ExpressionContext::new().variable("x", Ty::I32);
    let expression = context.compile("10 / x").unwrap();
    let values = VariableValues::new().with("x", Value::I32(0));
    let traced = expression.trace(&values, None, Verbosity::Default, Colors::OFF);
    assert!(matches!(
        traced.result,
        Err(Error::Runtime(RuntimeError::DivideByZero))
    ));
    assert_eq!(traced.lines.len(), 2);
}

#[test]
fn dump_names_variables_and_members() {
    let context = ExpressionContext::new().variable("name", Ty::String);
    let expression = context.compile("name.Length").unwrap();
    let text = expression.dump(Colors::OFF);
    assert!(text.contains("LdVar"));
    assert!(text.contains("; name"));
    assert!(text.contains("String.Length"));
}

#[test]
fn stack_limit_applies_per_expression() {
    let expression = ExpressionContext::new()
        .compile("1 + 2")
        .unwrap()
        .limits(ExecLimits::new().max_stack(1));
    let err = expression.evaluate(&VariableValues::new()).unwrap_err();
    assert!(matches!(
        err,
        Error::Runtime(RuntimeError::StackLimitExceeded(1))
    ));
}

#[test]
fn expressions_evaluate_concurrently() {
    let context = ExpressionContext::new().variable("n", Ty::I64);
    let expression = Arc::new(context.compile("n * n + 1").unwrap());

    let handles: Vec<_> = (0..8i64)
        .map(|n| {
            let expression = Arc::clone(&expression);
            thread::spawn(move || {
                let values = VariableValues::new().with("n", Value::I64(n));
                expression.evaluate(&values).unwrap()
            })
        })
        .collect();

    for (n, handle) in handles.into_iter().enumerate() {
        let n = n as i64;
        assert_eq!(handle.join().unwrap(), Value::I64(n * n + 1));
    }
}

#[test]
fn contexts_compile_concurrently() {
    let context = ExpressionContext::new();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let context = context.clone();
            thread::spawn(move || {
                context
                    .compile(&format!("{i} * 10"))
                    .unwrap()
                    .evaluate(&VariableValues::new())
                    .unwrap()
            })
        })
        .collect();
    let results: Vec<Value> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(
        results,
        [Value::I32(0), Value::I32(10), Value::I32(20), Value::I32(30)]
    );
    assert_eq!(context.shared_compiler().cached_grammars(), 1);
}

fn outcome(expression: &Expression, base: i32) -> Result<Value, String> {
    let values = VariableValues::new().with("b", Value::I32(base));
    expression.evaluate(&values).map_err(|e| e.to_string())
}

fn repeated_multiplication(exponent: u32) -> String {
    match exponent {
        0 => "1".to_string(),
        _ => vec!["b"; exponent as usize].join(" * "),
    }
}

proptest! {
    #[test]
    fn literal_power_matches_repeated_multiplication(
        base in -2_000i32..2_000,
        exponent in 0u32..=8,
        checked: bool,
    ) {
        let context = ExpressionContext::new()
            .options(CompileOptions::new().checked(checked))
            .variable("b", Ty::I32);
        let power = context.compile(&format!("b ^ {exponent}")).unwrap();
        let manual = context.compile(&repeated_multiplication(exponent)).unwrap();
        prop_assert_eq!(outcome(&power, base), outcome(&manual, base));
    }
}

proptest! {
    #[test]
    fn large_literal_powers_stay_integral(
        base in -3i32..=3,
        exponent in 0u32..=200,
        checked: bool,
    ) {
        let context = ExpressionContext::new()
            .options(CompileOptions::new().checked(checked))
            .variable("b", Ty::I32);
        let power = context.compile(&format!("b ^ {exponent}")).unwrap();
        prop_assert_eq!(power.result_type(), &Ty::I32);
        let expected = match base.checked_pow(exponent) {
            Some(v) => Ok(Value::I32(v)),
            None if checked => Err(Error::Runtime(RuntimeError::Overflow).to_string()),
            None => Ok(Value::I32(base.wrapping_pow(exponent))),
        };
        prop_assert_eq!(outcome(&power, base), expected);
    }
}

fn round_trip(
    outer: &str,
    inner: &str,
    ty: Ty,
    value: &Value,
    checked: bool,
) -> Result<Value, String> {
    let context = ExpressionContext::new()
        .options(CompileOptions::new().checked(checked))
        .variable("x", ty);
    let expression = context
        .compile(&format!("cast(cast(x, {inner}), {outer})"))
        .map_err(|e| e.to_string())?;
    let values = VariableValues::new().with("x", value.clone());
    expression.evaluate(&values).map_err(|e| e.to_string())
}

proptest! {
    #[test]
    fn casts_through_a_wider_type_round_trip(
        byte: u8,
        short: i16,
        int: i32,
        uint: u32,
        float in -1.0e30f32..1.0e30f32,
        checked: bool,
    ) {
        let cases = [
            ("byte", "int", Ty::Primitive(PrimitiveKind::Byte), Value::U8(byte)),
            ("short", "long", Ty::Primitive(PrimitiveKind::Int16), Value::I16(short)),
            ("int", "double", Ty::I32, Value::I32(int)),
            ("uint", "ulong", Ty::U32, Value::U32(uint)),
            ("float", "double", Ty::F32, Value::F32(float)),
        ];
        for (outer, inner, ty, value) in cases {
            prop_assert_eq!(round_trip(outer, inner, ty, &value, checked), Ok(value));
        }
    }
}
