//! End-to-end parser tests over multi-statement programs.

use gibbon_parser::{ExprKind, ParseErrorKind, StmtKind, parse};

#[test]
fn test_recursive_program_round_trips_through_display() {
    let source = r#"
        let fib = fn(n) {
            if (n < 2) { return n; }
            fib(n - 1) + fib(n - 2)
        };
        puts(fib(10));
    "#;
    let program = parse(source).expect("parse failed");
    assert_eq!(program.statements.len(), 2);
    assert_eq!(
        program.to_string(),
        "let fib = fn fib(n) { if (n < 2) { return n; } (fib((n - 1)) + fib((n - 2))) };puts(fib(10))"
    );
}

#[test]
fn test_closure_program_shape() {
    let program = parse("let adder = fn(a) { fn(b) { a + b } }; adder(1)(2)").unwrap();
    let StmtKind::Expr(call) = &program.statements[1].kind else {
        panic!("expected expression statement");
    };
    let ExprKind::Call { callee, arguments } = &call.kind else {
        panic!("expected call");
    };
    assert_eq!(arguments.len(), 1);
    assert!(matches!(callee.kind, ExprKind::Call { .. }));
}

#[test]
fn test_nested_collections() {
    let program = parse(r#"let data = {"xs": [1, 2, [3]], "m": {true: "t"}}; data["xs"][2][0]"#).unwrap();
    assert_eq!(
        program.to_string(),
        r#"let data = {"xs": [1, 2, [3]], "m": {true: "t"}};(((data["xs"])[2])[0])"#
    );
}

#[test]
fn test_error_reports_first_fault_only() {
    let err = parse("let a = 1;\nlet = 2;\nlet b = ;").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnexpectedToken);
    assert_eq!(err.position.line, 2);
}

#[test]
fn test_else_requires_block() {
    let err = parse("if (true) { 1 } else 2").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnexpectedToken);
    assert_eq!(err.position.column, 22);
}
