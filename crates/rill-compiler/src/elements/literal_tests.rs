use chrono::{NaiveDate, TimeDelta};
use pretty_assertions::assert_eq;
use rill_core::{PrimitiveKind, Value};

use super::literal::*;

fn int(image: &str) -> Value {
    parse_integer(image, false).unwrap().0
}

#[test]
fn unsuffixed_integers_take_first_fitting_kind() {
    assert_eq!(int("42"), Value::I32(42));
    assert_eq!(int("2147483647"), Value::I32(i32::MAX));
    assert_eq!(int("2147483648"), Value::U32(2_147_483_648));
    assert_eq!(int("4294967296"), Value::I64(4_294_967_296));
    assert_eq!(int("9223372036854775808"), Value::U64(1 << 63));
}

#[test]
fn integer_suffixes() {
    assert_eq!(int("1u"), Value::U32(1));
    assert_eq!(int("1U"), Value::U32(1));
    assert_eq!(int("4294967296u"), Value::U64(4_294_967_296));
    assert_eq!(int("1l"), Value::I64(1));
    assert_eq!(int("9223372036854775808l"), Value::U64(1 << 63));
    assert_eq!(int("1ul"), Value::U64(1));
    assert_eq!(int("1LU"), Value::U64(1));
    assert!(!parse_integer("1", false).unwrap().1);
    assert!(!parse_integer("1L", false).unwrap().1);
    assert!(parse_integer("1u", false).unwrap().1);
    assert!(parse_integer("1UL", false).unwrap().1);
    assert!(parse_hex("0xffu").unwrap().1);
}

#[test]
fn integer_overflow() {
    let err = parse_integer("18446744073709551616", false).unwrap_err();
    assert_eq!(err, LiteralError::Overflow("18446744073709551616".to_string()));
    assert_eq!(
        err.to_string(),
        "constant `18446744073709551616` is out of range"
    );
}

#[test]
fn integers_as_doubles_only_when_unsuffixed() {
    assert_eq!(parse_integer("3", true).unwrap().0, Value::F64(3.0));
    assert_eq!(parse_integer("3u", true).unwrap().0, Value::U32(3));
}

#[test]
fn hex_literals() {
    assert_eq!(parse_hex("0xff").unwrap().0, Value::I32(255));
    assert_eq!(parse_hex("0XFF").unwrap().0, Value::I32(255));
    assert_eq!(parse_hex("0xffffffff").unwrap().0, Value::U32(u32::MAX));
    assert_eq!(parse_hex("0xffl").unwrap().0, Value::I64(255));
    assert_eq!(parse_hex("0xffffffffffffffff").unwrap().0, Value::U64(u64::MAX));
    assert!(parse_hex("0x10000000000000000").is_err());
}

#[test]
fn real_literals() {
    let d = PrimitiveKind::Double;
    assert_eq!(parse_real("1.5", '.', d).unwrap(), Value::F64(1.5));
    assert_eq!(parse_real(".5f", '.', d).unwrap(), Value::F32(0.5));
    assert_eq!(parse_real("1.5e3D", '.', d).unwrap(), Value::F64(1500.0));
    assert_eq!(
        parse_real("2.25", '.', PrimitiveKind::Single).unwrap(),
        Value::F32(2.25)
    );
    assert_eq!(parse_real("1,25", ',', d).unwrap(), Value::F64(1.25));
}

#[test]
fn real_overflow() {
    let err = parse_real("9.9e999", '.', PrimitiveKind::Double).unwrap_err();
    assert!(matches!(err, LiteralError::Overflow(_)));
    let err = parse_real("1.0e39f", '.', PrimitiveKind::Double).unwrap_err();
    assert!(matches!(err, LiteralError::Overflow(_)));
}

#[test]
fn string_escapes() {
    assert_eq!(
        parse_string(r#""a\tb\n\"q\" \\ A""#).unwrap(),
        Value::string("a\tb\n\"q\" \\ A")
    );
    assert_eq!(parse_string(r#""""#).unwrap(), Value::string(""));
}

#[test]
fn bad_escapes() {
    assert_eq!(
        parse_string(r#""\q""#).unwrap_err().to_string(),
        r"unrecognized escape sequence `\q`"
    );
    assert_eq!(
        parse_string(r#""\ud800""#).unwrap_err().to_string(),
        r"`\ud800` is not a scalar value"
    );
    assert_eq!(
        parse_string(r#""\u12""#).unwrap_err().to_string(),
        r"invalid escape `\u12`"
    );
}

#[test]
fn char_literals() {
    assert_eq!(parse_char("'c'").unwrap(), Value::Char('c'));
    assert_eq!(parse_char(r"'\''").unwrap(), Value::Char('\''));
    assert_eq!(parse_char(r"'é'").unwrap(), Value::Char('é'));
}

#[test]
fn date_literals() {
    let midnight = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    assert_eq!(
        parse_date_time("#2024-01-02#", "%Y-%m-%d").unwrap(),
        Value::DateTime(midnight)
    );

    let with_time = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(13, 4, 5)
        .unwrap();
    assert_eq!(
        parse_date_time("#2024-01-02 13:04:05#", "%Y-%m-%d").unwrap(),
        Value::DateTime(with_time)
    );
    assert_eq!(
        parse_date_time("#02/01/2024#", "%d/%m/%Y").unwrap(),
        Value::DateTime(midnight)
    );
}

#[test]
fn invalid_date() {
    assert_eq!(
        parse_date_time("#tomorrow#", "%Y-%m-%d")
            .unwrap_err()
            .to_string(),
        "`tomorrow` is not a valid date"
    );
}

#[test]
fn time_span_literals() {
    assert_eq!(
        parse_time_span("##1:30#").unwrap(),
        Value::TimeSpan(TimeDelta::minutes(90))
    );
    assert_eq!(
        parse_time_span("##2.03:04:05#").unwrap(),
        Value::TimeSpan(
            TimeDelta::days(2) + TimeDelta::hours(3) + TimeDelta::minutes(4) + TimeDelta::seconds(5)
        )
    );
    assert_eq!(
        parse_time_span("##0:00:01.5#").unwrap(),
        Value::TimeSpan(TimeDelta::milliseconds(1500))
    );
}

#[test]
fn time_span_components_are_bounded() {
    assert!(matches!(
        parse_time_span("##24:00#"),
        Err(LiteralError::InvalidFormat(_))
    ));
    assert!(matches!(
        parse_time_span("##1:60#"),
        Err(LiteralError::InvalidFormat(_))
    ));
}
