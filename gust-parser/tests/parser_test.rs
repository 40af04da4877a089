// gust-parser - Parser tests
// Copyright (c) 2026 The Gust Authors. MIT licensed.

use gust_parser::{Node, Parser};

fn parse(src: &str) -> Vec<Node> {
    Parser::parse_str(src).expect("parse error")
}

fn parse_one(src: &str) -> Node {
    let mut program = parse(src);
    assert_eq!(program.len(), 1, "expected exactly one form");
    program.remove(0)
}

// =============================================================================
// Atoms and composites
// =============================================================================

#[test]
fn literals() {
    assert_eq!(parse_one("42"), Node::Number(42.0));
    assert_eq!(parse_one("-2"), Node::Number(-2.0));
    assert_eq!(parse_one("3.5"), Node::Number(3.5));
    assert_eq!(parse_one("true"), Node::Boolean(true));
    assert_eq!(parse_one("'hi'"), Node::Str("'hi'".to_string()));
}

#[test]
fn single_expression_parens_unwrap() {
    assert_eq!(parse_one("(7)"), Node::Number(7.0));
    assert_eq!(parse_one("((7))"), Node::Number(7.0));
}

#[test]
fn operator_expression() {
    assert_eq!(
        parse_one("(- x 1)"),
        Node::Expr(vec![
            Node::Operator("-".to_string()),
            Node::Identifier("x".to_string()),
            Node::Number(1.0),
        ])
    );
}

#[test]
fn let_form_stays_generic() {
    assert_eq!(
        parse_one("(let x:int 3)"),
        Node::Expr(vec![
            Node::Identifier("let".to_string()),
            Node::TypeAnnotation {
                name: "x".to_string(),
                ty: "int".to_string(),
            },
            Node::Number(3.0),
        ])
    );
}

#[test]
fn call_syntax_attaches_arguments() {
    assert_eq!(
        parse_one("(double(7))"),
        Node::Expr(vec![
            Node::Identifier("double".to_string()),
            Node::Number(7.0),
        ])
    );
    assert_eq!(
        parse_one("(add(1 2))"),
        Node::Expr(vec![
            Node::Identifier("add".to_string()),
            Node::Number(1.0),
            Node::Number(2.0),
        ])
    );
}

#[test]
fn call_syntax_requires_adjacency() {
    // `f(g x)` attaches both as arguments; `f (g x)` is juxtaposition and
    // keeps the inner form nested.
    assert_eq!(
        parse_one("(f(g x))"),
        Node::Expr(vec![
            Node::Identifier("f".to_string()),
            Node::Identifier("g".to_string()),
            Node::Identifier("x".to_string()),
        ])
    );
    assert_eq!(
        parse_one("(f (g x))"),
        Node::Expr(vec![
            Node::Identifier("f".to_string()),
            Node::Expr(vec![
                Node::Identifier("g".to_string()),
                Node::Identifier("x".to_string()),
            ]),
        ])
    );
}

#[test]
fn call_inside_operator_expression() {
    assert_eq!(
        parse_one("(* x factorial(- x 1))"),
        Node::Expr(vec![
            Node::Operator("*".to_string()),
            Node::Identifier("x".to_string()),
            Node::Expr(vec![
                Node::Identifier("factorial".to_string()),
                Node::Expr(vec![
                    Node::Operator("-".to_string()),
                    Node::Identifier("x".to_string()),
                    Node::Number(1.0),
                ]),
            ]),
        ])
    );
}

// =============================================================================
// Reserved forms
// =============================================================================

#[test]
fn function_definition() {
    let node = parse_one("(def add (x:int y:int) (ret (+ x y)))");
    match node {
        Node::FunctionDef {
            name,
            params,
            return_type,
            body,
        } => {
            assert_eq!(name, "add");
            assert_eq!(params.len(), 2);
            assert_eq!(params[0].param_name(), Some("x"));
            assert_eq!(return_type, None);
            assert_eq!(body.len(), 1);
            assert!(matches!(body[0], Node::Return(_)));
        }
        other => panic!("expected a function definition, got {:?}", other),
    }
}

#[test]
fn function_definition_with_return_type() {
    match parse_one("(def half (x:int) -> int (ret (/ x 2)))") {
        Node::FunctionDef { return_type, .. } => {
            assert_eq!(return_type.as_deref(), Some("int"));
        }
        other => panic!("expected a function definition, got {:?}", other),
    }
}

#[test]
fn if_with_and_without_else() {
    match parse_one("(if (= x 0) (ret 1) else (ret 2))") {
        Node::If { alt, .. } => assert!(alt.is_some()),
        other => panic!("expected if, got {:?}", other),
    }
    match parse_one("(if (> x 1) (print x))") {
        Node::If { alt, .. } => assert!(alt.is_none()),
        other => panic!("expected if, got {:?}", other),
    }
}

#[test]
fn nested_if_else_binds_to_the_outer_if() {
    match parse_one("(if (< x 3) (if (> x 1) (print 'a')) else (print 'b'))") {
        Node::If { then, alt, .. } => {
            assert!(matches!(*then, Node::If { alt: None, .. }));
            assert!(alt.is_some());
        }
        other => panic!("expected if, got {:?}", other),
    }
}

// =============================================================================
// Lambdas, map and filter
// =============================================================================

#[test]
fn lambda_expression() {
    match parse_one("((x:int) -> (* x 2))") {
        Node::Lambda { params, body } => {
            assert_eq!(params.len(), 1);
            assert_eq!(params[0].param_name(), Some("x"));
            assert!(matches!(*body, Node::Expr(_)));
        }
        other => panic!("expected a lambda, got {:?}", other),
    }
}

#[test]
fn multi_parameter_lambda() {
    match parse_one("((x:int y:int) -> (+ x y))") {
        Node::Lambda { params, .. } => assert_eq!(params.len(), 2),
        other => panic!("expected a lambda, got {:?}", other),
    }
}

#[test]
fn lambda_call_with_arguments() {
    match parse_one("(((x:int) -> (* x 2)) (7))") {
        Node::LambdaCall { args, .. } => assert_eq!(args, vec![Node::Number(7.0)]),
        other => panic!("expected a lambda call, got {:?}", other),
    }
    match parse_one("(((x:int y:int) -> (+ x y)) (1 2))") {
        Node::LambdaCall { args, .. } => assert_eq!(args.len(), 2),
        other => panic!("expected a lambda call, got {:?}", other),
    }
}

#[test]
fn map_spreads_its_argument_list() {
    match parse_one("(map ((x:int) -> (* x 2)) (1 2 3 4 5))") {
        Node::MapExpr { args, .. } => assert_eq!(args.len(), 5),
        other => panic!("expected map, got {:?}", other),
    }
}

#[test]
fn map_with_identifier_lambda_recovers_the_argument_list() {
    match parse_one("(map f (1 2 3))") {
        Node::MapExpr { lambda, args } => {
            assert_eq!(*lambda, Node::Identifier("f".to_string()));
            assert_eq!(args.len(), 3);
        }
        other => panic!("expected map, got {:?}", other),
    }
}

#[test]
fn filter_expression() {
    match parse_one("(filter ((x:int) -> (> x 2)) (1 2 3))") {
        Node::FilterExpr { lambda, args } => {
            assert!(matches!(*lambda, Node::Lambda { .. }));
            assert_eq!(args.len(), 3);
        }
        other => panic!("expected filter, got {:?}", other),
    }
}

#[test]
fn identifier_before_a_lambda_stands_alone() {
    // `f` must not swallow the lambda's parameter list as call arguments.
    assert_eq!(
        parse_one("(let f ((x:int y:int) -> (+ x y)))"),
        Node::Expr(vec![
            Node::Identifier("let".to_string()),
            Node::Identifier("f".to_string()),
            Node::Lambda {
                params: vec![
                    Node::TypeAnnotation {
                        name: "x".to_string(),
                        ty: "int".to_string(),
                    },
                    Node::TypeAnnotation {
                        name: "y".to_string(),
                        ty: "int".to_string(),
                    },
                ],
                body: Box::new(Node::Expr(vec![
                    Node::Operator("+".to_string()),
                    Node::Identifier("x".to_string()),
                    Node::Identifier("y".to_string()),
                ])),
            },
        ])
    );
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn unbalanced_parens_fail() {
    assert!(Parser::parse_str("(print 1").is_err());
}

#[test]
fn def_requires_a_parameter_list() {
    assert!(Parser::parse_str("(def f (ret 1))").is_err());
}

#[test]
fn def_requires_a_body() {
    assert!(Parser::parse_str("(def f (x:int))").is_err());
}

#[test]
fn error_positions_are_reported() {
    let err = Parser::parse_str("(def 5 (x:int) (ret x))").unwrap_err();
    assert!(err.line >= 1);
    assert!(err.to_string().contains("Parse error"));
}
