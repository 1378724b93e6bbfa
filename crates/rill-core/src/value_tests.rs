use chrono::{NaiveDate, TimeDelta};
use pretty_assertions::assert_eq;

use crate::{Colors, Paint, PrimitiveKind, Ty, Value};

#[test]
fn display_follows_host_to_string() {
    assert_eq!(Value::Bool(true).to_string(), "True");
    assert_eq!(Value::Null.to_string(), "");
    assert_eq!(Value::F64(2.5).to_string(), "2.5");
    assert_eq!(Value::Char('x').to_string(), "x");
}

#[test]
fn display_date_time() {
    let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(13, 5, 0)
        .unwrap();
    assert_eq!(Value::DateTime(dt).to_string(), "2024-03-01 13:05:00");
}

#[test]
fn display_time_span() {
    let span = TimeDelta::days(1) + TimeDelta::hours(2) + TimeDelta::minutes(3);
    assert_eq!(Value::TimeSpan(span).to_string(), "1.02:03:00");

    let negative = -TimeDelta::minutes(90);
    assert_eq!(Value::TimeSpan(negative).to_string(), "-01:30:00");

    let fractional = TimeDelta::seconds(5) + TimeDelta::milliseconds(250);
    assert_eq!(Value::TimeSpan(fractional).to_string(), "00:00:05.2500000");
}

#[test]
fn kind_and_runtime_type() {
    assert_eq!(Value::U16(1).kind(), Some(PrimitiveKind::UInt16));
    assert_eq!(Value::string("a").kind(), None);
    assert_eq!(Value::string("a").runtime_type(), Ty::String);
    assert_eq!(
        Value::array(Ty::I32, vec![Value::I32(1)]).runtime_type(),
        Ty::array_of(Ty::I32)
    );
}

#[test]
fn integral_widening() {
    assert_eq!(Value::U64(u64::MAX).as_i128(), Some(u64::MAX as i128));
    assert_eq!(Value::Char('A').as_i128(), Some(65));
    assert_eq!(Value::F64(1.0).as_i128(), None);
    assert_eq!(Value::I8(-3).as_f64(), Some(-3.0));
}

#[test]
fn equality_is_kind_sensitive() {
    assert_eq!(Value::I32(1), Value::I32(1));
    assert_ne!(Value::I32(1), Value::I64(1));
    assert_ne!(Value::F64(f64::NAN), Value::F64(f64::NAN));
}

#[test]
fn array_display_and_format() {
    let arr = Value::array(Ty::String, vec![Value::string("a"), Value::Null]);
    assert_eq!(arr.to_string(), "[a, ]");
    assert_eq!(arr.format(Colors::OFF), r#"["a", null]"#);
}

#[test]
fn colored_format_paints_by_role() {
    let arr = Value::array(Ty::Object, vec![Value::string("a"), Value::I32(7), Value::Null]);
    assert_eq!(
        arr.format(Colors::ON),
        "\x1b[2m[\x1b[0m\x1b[32m\"a\"\x1b[0m\x1b[2m, \x1b[0m\x1b[36m7\x1b[0m\x1b[2m, \x1b[0m\x1b[2mnull\x1b[0m\x1b[2m]\x1b[0m"
    );
    assert_eq!(Value::Bool(true).format(Colors::ON), "\x1b[36mTrue\x1b[0m");
    assert_eq!(Colors::OFF.paint(Paint::Opcode, "Add"), "Add");
    assert_eq!(Colors::new(true).paint(Paint::Section, "[code]"), "\x1b[1;34m[code]\x1b[0m");
}

#[test]
fn serializes_as_sequence() {
    let arr = Value::array(Ty::I32, vec![Value::I32(1), Value::Null, Value::Bool(false)]);
    insta::assert_yaml_snapshot!(arr, @r"
    - 1
    - ~
    - false
    ");
}
