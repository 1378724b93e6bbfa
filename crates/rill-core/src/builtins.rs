//! Builtin `Math` type and `String` members.

use std::sync::Arc;

use crate::catalog::{HostCatalogBuilder, HostError, HostType, MemberDescriptor};
use crate::types::Ty;
use crate::value::Value;

pub(crate) fn register(b: &mut HostCatalogBuilder) {
    register_math(b);
    register_string(b);
}

fn f64_arg(args: &[Value], i: usize) -> Result<f64, HostError> {
    args.get(i)
        .and_then(Value::as_f64)
        .ok_or_else(|| HostError::new(format!("argument {i} is not numeric")))
}

fn i32_arg(args: &[Value], i: usize) -> Result<i32, HostError> {
    match args.get(i) {
        Some(Value::I32(v)) => Ok(*v),
        _ => Err(HostError::new(format!("argument {i} is not an Int32"))),
    }
}

fn i64_arg(args: &[Value], i: usize) -> Result<i64, HostError> {
    match args.get(i) {
        Some(Value::I64(v)) => Ok(*v),
        _ => Err(HostError::new(format!("argument {i} is not an Int64"))),
    }
}

fn receiver_str(receiver: Option<&Value>) -> Result<&str, HostError> {
    receiver
        .and_then(Value::as_str)
        .ok_or_else(|| HostError::new("receiver is not a string"))
}

fn str_arg(args: &[Value], i: usize) -> Result<&str, HostError> {
    args.get(i)
        .and_then(Value::as_str)
        .ok_or_else(|| HostError::new(format!("argument {i} is not a string")))
}

fn register_math(b: &mut HostCatalogBuilder) {
    let math = b.add_type(HostType::sealed_class("Math"));

    let unary = |b: &mut HostCatalogBuilder, name: &str, f: fn(f64) -> f64| {
        b.add_member(
            MemberDescriptor::method(name, math.clone())
                .static_member()
                .param(Ty::F64)
                .returns(Ty::F64)
                .invoke(move |_, args| Ok(Value::F64(f(f64_arg(args, 0)?))))
                .build(),
        );
    };
    unary(b, "Sqrt", f64::sqrt);
    unary(b, "Floor", f64::floor);
    unary(b, "Ceiling", f64::ceil);
    unary(b, "Round", round_half_even);
    unary(b, "Abs", f64::abs);
    unary(b, "Sin", f64::sin);
    unary(b, "Cos", f64::cos);
    unary(b, "Log10", f64::log10);

    b.add_member(
        MemberDescriptor::method("Abs", math.clone())
            .static_member()
            .param(Ty::I32)
            .returns(Ty::I32)
            .invoke(|_, args| {
                i32_arg(args, 0)?
                    .checked_abs()
                    .map(Value::I32)
                    .ok_or_else(|| HostError::new("negating the minimum Int32 value overflows"))
            })
            .build(),
    );
    b.add_member(
        MemberDescriptor::method("Abs", math.clone())
            .static_member()
            .param(Ty::I64)
            .returns(Ty::I64)
            .invoke(|_, args| {
                i64_arg(args, 0)?
                    .checked_abs()
                    .map(Value::I64)
                    .ok_or_else(|| HostError::new("negating the minimum Int64 value overflows"))
            })
            .build(),
    );

    for (name, pick_max) in [("Max", true), ("Min", false)] {
        b.add_member(
            MemberDescriptor::method(name, math.clone())
                .static_member()
                .params([Ty::I32, Ty::I32])
                .returns(Ty::I32)
                .invoke(move |_, args| {
                    let (x, y) = (i32_arg(args, 0)?, i32_arg(args, 1)?);
                    Ok(Value::I32(if pick_max { x.max(y) } else { x.min(y) }))
                })
                .build(),
        );
        b.add_member(
            MemberDescriptor::method(name, math.clone())
                .static_member()
                .params([Ty::F64, Ty::F64])
                .returns(Ty::F64)
                .invoke(move |_, args| {
                    let (x, y) = (f64_arg(args, 0)?, f64_arg(args, 1)?);
                    Ok(Value::F64(if pick_max { x.max(y) } else { x.min(y) }))
                })
                .build(),
        );
    }

    b.add_member(
        MemberDescriptor::method("Pow", math.clone())
            .static_member()
            .params([Ty::F64, Ty::F64])
            .returns(Ty::F64)
            .invoke(|_, args| Ok(Value::F64(f64_arg(args, 0)?.powf(f64_arg(args, 1)?))))
            .build(),
    );
    b.add_member(
        MemberDescriptor::method("Round", math.clone())
            .static_member()
            .params([Ty::F64, Ty::I32])
            .returns(Ty::F64)
            .invoke(|_, args| {
                let digits = i32_arg(args, 1)?;
                if !(0..=15).contains(&digits) {
                    return Err(HostError::new("rounding digits must be between 0 and 15"));
                }
                let scale = 10f64.powi(digits);
                Ok(Value::F64(round_half_even(f64_arg(args, 0)? * scale) / scale))
            })
            .build(),
    );

    for (name, value) in [("PI", std::f64::consts::PI), ("E", std::f64::consts::E)] {
        b.add_member(
            MemberDescriptor::field(name, math.clone(), Ty::F64)
                .static_member()
                .invoke(move |_, _| Ok(Value::F64(value)))
                .build(),
        );
    }
}

/// Banker's rounding, the host default for `Round`.
fn round_half_even(x: f64) -> f64 {
    let r = x.round();
    if (x - x.trunc()).abs() == 0.5 && r % 2.0 != 0.0 {
        r - x.signum()
    } else {
        r
    }
}

fn char_range(s: &str, start: i32, len: Option<i32>) -> Result<String, HostError> {
    let count = s.chars().count() as i64;
    let start = start as i64;
    let len = len.map_or(count - start, |l| l as i64);
    if start < 0 || len < 0 || start + len > count {
        return Err(HostError::new("index and length must refer to a location within the string"));
    }
    Ok(s.chars().skip(start as usize).take(len as usize).collect())
}

fn register_string(b: &mut HostCatalogBuilder) {
    let string = Ty::String;

    b.add_member(
        MemberDescriptor::property("Length", string.clone(), Ty::I32)
            .invoke(|recv, _| Ok(Value::I32(receiver_str(recv)?.chars().count() as i32)))
            .build(),
    );

    let mapping = |b: &mut HostCatalogBuilder, name: &str, f: fn(&str) -> String| {
        b.add_member(
            MemberDescriptor::method(name, string.clone())
                .returns(Ty::String)
                .invoke(move |recv, _| Ok(Value::string(f(receiver_str(recv)?))))
                .build(),
        );
    };
    mapping(b, "ToUpper", str::to_uppercase);
    mapping(b, "ToLower", str::to_lowercase);
    mapping(b, "Trim", |s| s.trim().to_string());

    let predicate = |b: &mut HostCatalogBuilder, name: &str, f: fn(&str, &str) -> bool| {
        b.add_member(
            MemberDescriptor::method(name, string.clone())
                .param(Ty::String)
                .returns(Ty::BOOL)
                .invoke(move |recv, args| Ok(Value::Bool(f(receiver_str(recv)?, str_arg(args, 0)?))))
                .build(),
        );
    };
    predicate(b, "Contains", |s, p| s.contains(p));
    predicate(b, "StartsWith", |s, p| s.starts_with(p));
    predicate(b, "EndsWith", |s, p| s.ends_with(p));

    b.add_member(
        MemberDescriptor::method("IndexOf", string.clone())
            .param(Ty::String)
            .returns(Ty::I32)
            .invoke(|recv, args| {
                let s = receiver_str(recv)?;
                let found = s
                    .find(str_arg(args, 0)?)
                    .map_or(-1, |byte| s[..byte].chars().count() as i32);
                Ok(Value::I32(found))
            })
            .build(),
    );
    b.add_member(
        MemberDescriptor::method("Substring", string.clone())
            .param(Ty::I32)
            .returns(Ty::String)
            .invoke(|recv, args| {
                char_range(receiver_str(recv)?, i32_arg(args, 0)?, None).map(Value::string)
            })
            .build(),
    );
    b.add_member(
        MemberDescriptor::method("Substring", string.clone())
            .params([Ty::I32, Ty::I32])
            .returns(Ty::String)
            .invoke(|recv, args| {
                char_range(receiver_str(recv)?, i32_arg(args, 0)?, Some(i32_arg(args, 1)?))
                    .map(Value::string)
            })
            .build(),
    );

    b.add_member(
        MemberDescriptor::method("Concat", string.clone())
            .static_member()
            .rest(Ty::Object)
            .returns(Ty::String)
            .invoke(|_, args| {
                let mut out = String::new();
                for arg in args {
                    match arg {
                        Value::Array(items) => {
                            items.items.iter().for_each(|v| out.push_str(&v.to_string()))
                        }
                        other => out.push_str(&other.to_string()),
                    }
                }
                Ok(Value::String(Arc::from(out)))
            })
            .build(),
    );
}
