use std::sync::Arc;

use pretty_assertions::assert_eq;
use rill_bytecode::Instruction;
use rill_core::{HostCatalog, Ty};

use crate::{CompileOptions, Error, ExpressionCompiler, Scope, SemanticErrorKind};

fn scope() -> Scope {
    Scope::new(Arc::new(HostCatalog::with_builtins()))
        .variable("a", Ty::I32)
        .variable("name", Ty::String)
}

fn listing(source: &str, scope: &Scope) -> Vec<Instruction> {
    let program = ExpressionCompiler::new().compile(source, scope).unwrap();
    program.instructions().map(|r| r.unwrap().1).collect()
}

#[test]
fn multiplication_binds_tighter() {
    assert_eq!(
        listing("1 + 2 * 3", &scope()),
        [
            Instruction::LdI4(1),
            Instruction::LdI4(2),
            Instruction::LdI4(3),
            Instruction::Mul,
            Instruction::Add,
            Instruction::Ret,
        ]
    );
}

#[test]
fn variables_load_through_the_table() {
    let compiler = ExpressionCompiler::new();
    let program = compiler.compile("a - 1", &scope()).unwrap();
    assert_eq!(program.result_type(), &Ty::I32);
    assert_eq!(program.variables().len(), 1);
    assert_eq!(program.variables()[0].name, "a");
}

#[test]
fn result_type_is_converted() {
    let scope = scope().result_type(Ty::F64);
    let program = ExpressionCompiler::new().compile("a", &scope).unwrap();
    assert_eq!(program.result_type(), &Ty::F64);
}

#[test]
fn grammar_is_cached_per_separator_pair() {
    let compiler = ExpressionCompiler::new();
    compiler.compile("1", &scope()).unwrap();
    compiler.compile("2", &scope()).unwrap();
    assert_eq!(compiler.cached_grammars(), 1);

    let european = CompileOptions::new()
        .decimal_separator(',')
        .argument_separator(';');
    let scope = scope().options(european);
    let program = compiler.compile("1,5 * 2", &scope).unwrap();
    assert_eq!(program.result_type(), &Ty::F64);
    assert_eq!(compiler.cached_grammars(), 2);
}

#[test]
fn syntax_errors_are_collected() {
    let err = ExpressionCompiler::new()
        .compile("1 +", &scope())
        .unwrap_err();
    let Error::Syntax(log) = &err else {
        panic!("expected a syntax error, got {err:?}");
    };
    assert!(!log.is_empty());
    assert!(!err.diagnostics().is_empty());
}

#[test]
fn semantic_error_carries_position() {
    let err = ExpressionCompiler::new()
        .compile("a + nope", &scope())
        .unwrap_err();
    let Error::Semantic(e) = &err else {
        panic!("expected a semantic error, got {err:?}");
    };
    assert_eq!(e.kind, SemanticErrorKind::UndefinedIdentifier);
    assert_eq!(e.message, "`nope` is not defined");
    assert_eq!(e.span, 4..8);
    assert_eq!(e.position.column, 5);

    let diagnostics = err.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert!(err.render("a + nope").contains("`nope` is not defined"));
}

#[test]
fn analyze_stops_before_emission() {
    let analyzed = ExpressionCompiler::new()
        .analyze("name + a", &scope())
        .unwrap();
    assert_eq!(analyzed.root.ty, Ty::String);
    assert!(analyzed.locals.is_empty());
}

#[test]
fn tokenize_skips_whitespace() {
    let tokens = ExpressionCompiler::new()
        .tokenize("a + 12", &CompileOptions::default())
        .unwrap();
    let images: Vec<&str> = tokens.iter().map(|t| t.image.as_str()).collect();
    assert_eq!(images, ["a", "+", "12"]);
}

#[test]
fn parse_tree_names_productions() {
    let tree = ExpressionCompiler::new()
        .parse_tree("a + 1", &CompileOptions::default())
        .unwrap();
    assert!(tree.starts_with("Expression"));
    assert!(tree.contains("IDENTIFIER"));
}

#[test]
fn compiler_is_shared_across_threads() {
    let compiler = Arc::new(ExpressionCompiler::new());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let compiler = Arc::clone(&compiler);
            std::thread::spawn(move || {
                let source = format!("a * {i}");
                compiler.compile(&source, &scope()).unwrap().result_type().clone()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), Ty::I32);
    }
    assert_eq!(compiler.cached_grammars(), 1);
}
