// gust-vm - Closure and capture tests
// Copyright (c) 2026 The Gust Authors. MIT licensed.

//! Capture semantics: values are snapshotted at lambda creation time and the
//! snapshot stays alive after the defining scope has been exited.

mod common;

use common::{run, run_vm};

#[test]
fn lambda_captures_an_enclosing_binding() {
    assert_eq!(
        run("(let n:int 10) (print (map ((x:int) -> (+ x n)) (1 2 3)))"),
        "[11 12 13]\n"
    );
}

#[test]
fn capture_survives_the_defining_scope() {
    // `make` returns a lambda that closes over its parameter; by the time
    // the lambda runs, make's frame is long gone.
    assert_eq!(
        run("(def make (n:int) (ret ((y:int) -> (+ n y)))) (print (map (make(5)) (1 2 3)))"),
        "[6 7 8]\n"
    );
}

#[test]
fn captures_are_snapshots_of_distinct_calls() {
    // Two closures from two calls hold different snapshots.
    assert_eq!(
        run("(def make (n:int) (ret ((y:int) -> (* n y)))) (print (map (make(2)) (1 2))) (print (map (make(10)) (1 2)))"),
        "[2 4]\n[10 20]\n"
    );
}

#[test]
fn lambda_parameters_shadow_captured_names() {
    assert_eq!(
        run("(let x:int 100) (print (map ((x:int) -> (* x 2)) (1 2 3)))"),
        "[2 4 6]\n"
    );
}

#[test]
fn lambda_calls_a_global_function() {
    assert_eq!(
        run("(def double (x:int) (ret (* x 2))) (print (map ((x:int) -> (double x)) (1 2 3)))"),
        "[2 4 6]\n"
    );
}

#[test]
fn nested_lambda_invocation() {
    // The inner lambda is created and called during the outer lambda's
    // bounded run.
    assert_eq!(
        run("(print (((x:int) -> (((y:int) -> (+ y 1)) (x))) (41)))"),
        "42\n"
    );
}

#[test]
fn filter_with_a_captured_threshold() {
    assert_eq!(
        run("(let limit:int 2) (print (filter ((x:int) -> (> x limit)) (1 2 3 4)))"),
        "[3 4]\n"
    );
}

#[test]
fn map_result_feeds_print_and_leaves_nothing_behind() {
    let (vm, output) = run_vm(
        "(def make (n:int) (ret ((y:int) -> (+ n y)))) (print (map (make(1)) (1 2 3 4 5)))",
    );
    assert_eq!(output, "[2 3 4 5 6]\n");
    assert_eq!(vm.stack_depth(), 0);
}

#[test]
fn map_with_a_lambda_held_in_a_variable() {
    assert_eq!(
        run("(let f ((x:int) -> (* x x))) (print (map f (1 2 3)))"),
        "[1 4 9]\n"
    );
}

#[test]
fn lambda_value_renders_with_its_arity() {
    assert_eq!(
        run("(let f ((x:int y:int) -> (+ x y))) (print f)"),
        "#<lambda/2>\n"
    );
}
