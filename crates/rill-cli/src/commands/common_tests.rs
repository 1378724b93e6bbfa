use std::path::PathBuf;

use rill::{ExpressionContext, Ty, Value};

use super::common::{CliError, CompileInput, SourceInput, VariableSpec, resolve_type};

fn input(source: &str, vars: &[&str]) -> CompileInput {
    CompileInput {
        source: SourceInput {
            text: Some(source.to_string()),
            file: None,
        },
        vars: vars.iter().map(|v| v.to_string()).collect(),
        checked: false,
        ignore_case_strings: false,
        case_sensitive: false,
        decimal_separator: '.',
        argument_separator: ',',
        integers_as_doubles: false,
        result_type: None,
    }
}

#[test]
fn variable_spec_with_and_without_value() {
    let spec = VariableSpec::parse("x:int=5").unwrap();
    assert_eq!(spec.name, "x");
    assert_eq!(spec.ty, "int");
    assert_eq!(spec.value.as_deref(), Some("5"));

    let spec = VariableSpec::parse(" name : string ").unwrap();
    assert_eq!(spec.name, "name");
    assert_eq!(spec.ty, "string");
    assert_eq!(spec.value, None);

    let spec = VariableSpec::parse("s:string=a=b").unwrap();
    assert_eq!(spec.value.as_deref(), Some("a=b"));
}

#[test]
fn variable_spec_errors() {
    let reason = |spec: &str| match VariableSpec::parse(spec) {
        Err(CliError::InvalidVariable { reason, .. }) => reason,
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(reason("x=5"), "expected NAME:TYPE");
    assert_eq!(reason(":int"), "missing name");
    assert_eq!(reason("x:"), "missing type");
}

#[test]
fn resolves_builtin_catalog_and_array_types() {
    let context = ExpressionContext::new();
    assert_eq!(resolve_type(&context, "int").unwrap(), Ty::I32);
    assert_eq!(
        resolve_type(&context, "string[]").unwrap(),
        Ty::array_of(Ty::String)
    );
    assert_eq!(
        resolve_type(&context, "math").unwrap(),
        context.find_type("Math").unwrap()
    );
    assert!(matches!(
        resolve_type(&context, "Widget"),
        Err(CliError::UnknownType(name)) if name == "Widget"
    ));
}

#[test]
fn prepare_declares_and_binds() {
    let (context, values) = input("x", &["x:int=5", "s:string=hi", "d:double"])
        .prepare()
        .unwrap();
    assert_eq!(values.get("x"), Some(&Value::I32(5)));
    assert_eq!(values.get("s"), Some(&Value::string("hi")));
    assert_eq!(values.get("d"), None);
    assert!(context.scope().find_variable("d").is_some());
}

#[test]
fn prepare_rejects_values_that_do_not_convert() {
    let err = input("x", &["x:int=abc"]).prepare().unwrap_err();
    assert!(matches!(
        err,
        CliError::InvalidVariable { ref spec, .. } if spec == "int=abc"
    ));
}

#[test]
fn empty_source_is_an_error() {
    let source = SourceInput {
        text: Some("   ".to_string()),
        file: None,
    };
    assert!(matches!(source.load(), Err(CliError::EmptyExpression)));
}

#[test]
fn missing_file_reports_the_path() {
    let source = SourceInput {
        text: None,
        file: Some(PathBuf::from("/nonexistent/expr.rill")),
    };
    let err = source.load().unwrap_err();
    assert!(matches!(err, CliError::Read { .. }));
    assert_eq!(err.exit_code(), 1);
    assert!(err.render().starts_with("error: cannot read `/nonexistent/expr.rill`"));
}
