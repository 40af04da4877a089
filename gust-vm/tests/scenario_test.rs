// gust-vm - End-to-end scenario tests
// Copyright (c) 2026 The Gust Authors. MIT licensed.

//! Complete pipeline tests: source text through the parser, compiler and VM,
//! asserting exact printed output.

mod common;

use common::{run, run_vm};

// =============================================================================
// Literals and arithmetic
// =============================================================================

#[test]
fn let_and_subtraction() {
    assert_eq!(run("(let x:int 3) (print (- x 1))"), "2\n");
}

#[test]
fn arithmetic_operators() {
    assert_eq!(run("(print (+ 2 3))"), "5\n");
    assert_eq!(run("(print (* 6 7))"), "42\n");
    assert_eq!(run("(print (/ 9 2))"), "4.5\n");
    assert_eq!(run("(print (- 1 4))"), "-3\n");
}

#[test]
fn comparisons_print_booleans() {
    assert_eq!(run("(print (> 3 1))"), "true\n");
    assert_eq!(run("(print (< 3 1))"), "false\n");
    assert_eq!(run("(print (= 2 2))"), "true\n");
    assert_eq!(run("(print (? 2 2))"), "false\n");
    assert_eq!(run("(print (? 'a' 'b'))"), "true\n");
}

#[test]
fn string_literals_print_bare() {
    assert_eq!(run("(print 'hello world')"), "hello world\n");
}

#[test]
fn untyped_let_binding() {
    assert_eq!(run("(let x 10) (print x)"), "10\n");
}

// =============================================================================
// Functions
// =============================================================================

#[test]
fn single_parameter_function() {
    assert_eq!(
        run("(def double (x:int) (ret (* x 2))) (print (double(7)))"),
        "14\n"
    );
}

#[test]
fn two_parameter_function() {
    assert_eq!(
        run("(def add (x:int y:int) (ret (+ x y))) (print (add(1 2)))"),
        "3\n"
    );
}

#[test]
fn recursive_factorial() {
    assert_eq!(
        run("(def factorial (x:int) (if (= x 0) (ret 1) else (ret (* x factorial(- x 1))))) (print (factorial(5)))"),
        "120\n"
    );
}

#[test]
fn function_arguments_evaluate_left_to_right() {
    assert_eq!(
        run("(def sub (x:int y:int) (ret (- x y))) (print (sub(10 4)))"),
        "6\n"
    );
}

#[test]
fn function_body_without_explicit_return() {
    // A trailing RETURN is appended; the body's last value is returned.
    assert_eq!(
        run("(def last (x:int) (+ x 1)) (print (last(2)))"),
        "3\n"
    );
}

#[test]
fn multi_expression_function_body() {
    assert_eq!(
        run("(def loud (x:int) (print x) (ret (* x 10))) (print (loud(3)))"),
        "3\n30\n"
    );
}

#[test]
fn functions_call_functions() {
    assert_eq!(
        run("(def inc (x:int) (ret (+ x 1))) (def twice (x:int) (ret (inc (inc x)))) (print (twice(5)))"),
        "7\n"
    );
}

#[test]
fn function_definition_with_return_type() {
    assert_eq!(
        run("(def half (x:int) -> int (ret (/ x 2))) (print (half(8)))"),
        "4\n"
    );
}

#[test]
fn recursive_fibonacci() {
    assert_eq!(
        run("(def fib (n:int) (if (< n 2) (ret n) else (ret (+ fib(- n 1) fib(- n 2))))) (print (fib(10)))"),
        "55\n"
    );
}

#[test]
fn parameter_shadows_a_global_binding() {
    assert_eq!(
        run("(let x:int 1) (def f (x:int) (ret x)) (print (f(9))) (print x)"),
        "9\n1\n"
    );
}

#[test]
fn nested_function_definition() {
    // The inner function is installed while the outer body runs and is
    // scoped to it at compile time.
    assert_eq!(
        run("(def outer (x:int) (def inner (y:int) (ret (* y y))) (ret (inner x))) (print (outer(3)))"),
        "9\n"
    );
}

// =============================================================================
// Conditionals
// =============================================================================

#[test]
fn if_without_else() {
    assert_eq!(run("(if (> 2 1) (print 'yes'))"), "yes\n");
}

#[test]
fn false_if_without_else_scans_to_the_next_else_marker() {
    // The false branch scans for an ELSE marker; with none ahead the scan
    // reaches the end of the stream and execution stops there.
    assert_eq!(run("(if (< 2 1) (print 'no')) (print 'after')"), "");
    // A later else marker catches the scan instead.
    assert_eq!(
        run("(if (< 2 1) (print 'no')) (if (= 1 2) (print 'a') else (print 'b'))"),
        "b\n"
    );
}

#[test]
fn if_with_else() {
    assert_eq!(run("(if (= 1 2) (print 'then') else (print 'else'))"), "else\n");
}

#[test]
fn nested_if_scan_semantics() {
    // The inner if has no else; its false branch scans forward to the
    // outer else marker and falls into the else block.
    assert_eq!(
        run("(let x:int -2) (if (< x 3) (if (> x 1) (print 'x is greater than 1 and less than 3')) else (if (= x -2) (print 'x equals -2') else (print 'x is greater than 3')))"),
        "x equals -2\n"
    );
}

#[test]
fn nested_if_taken_branch() {
    assert_eq!(
        run("(let x:int 2) (if (< x 3) (if (> x 1) (print 'x is greater than 1 and less than 3')) else (print 'not reached'))"),
        "x is greater than 1 and less than 3\n"
    );
}

#[test]
fn string_equality_drives_branching() {
    assert_eq!(
        run("(let name 'ada') (if (= name 'ada') (print 'hi') else (print 'bye'))"),
        "hi\n"
    );
    assert_eq!(
        run("(let name 'bob') (if (= name 'ada') (print 'hi') else (print 'bye'))"),
        "bye\n"
    );
}

// =============================================================================
// Lambdas, map and filter
// =============================================================================

#[test]
fn map_doubles_a_list() {
    assert_eq!(
        run("(print (map ((x:int) -> (* x 2)) (1 2 3 4 5)))"),
        "[2 4 6 8 10]\n"
    );
}

#[test]
fn filter_preserves_input_order() {
    assert_eq!(
        run("(print (filter ((x:int) -> (> x 2)) (1 2 3 4)))"),
        "[3 4]\n"
    );
    assert_eq!(
        run("(print (filter ((x:int) -> (< x 0)) (1 2 3)))"),
        "[]\n"
    );
}

#[test]
fn inline_lambda_call() {
    assert_eq!(run("(print (((x:int) -> (* x 3)) (7)))"), "21\n");
}

#[test]
fn two_parameter_lambda_call() {
    assert_eq!(run("(print (((x:int y:int) -> (- x y)) (9 4)))"), "5\n");
}

#[test]
fn map_over_strings() {
    assert_eq!(
        run("(print (map ((s:str) -> s) ('a' 'b' 'c')))"),
        "[a b c]\n"
    );
}

// =============================================================================
// Stack discipline
// =============================================================================

#[test]
fn value_stack_is_empty_after_function_calls() {
    let (vm, output) = run_vm(
        "(def add (x:int y:int) (ret (+ x y))) (print (add(1 2))) (print (add(3 4)))",
    );
    assert_eq!(output, "3\n7\n");
    assert_eq!(vm.stack_depth(), 0);
}

#[test]
fn value_stack_is_empty_after_lambda_calls() {
    let (vm, output) = run_vm("(print (map ((x:int) -> (+ x 1)) (1 2 3)))");
    assert_eq!(output, "[2 3 4]\n");
    assert_eq!(vm.stack_depth(), 0);
}

#[test]
fn unconsumed_top_level_value_stays_on_the_stack() {
    // A bare expression statement leaves its value; nothing consumes it.
    let (vm, _) = run_vm("(+ 1 2)");
    assert_eq!(vm.stack_depth(), 1);
}
