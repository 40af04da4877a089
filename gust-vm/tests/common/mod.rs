// gust-vm - Shared test helpers
// Copyright (c) 2026 The Gust Authors. MIT licensed.

#![allow(dead_code)]

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use gust_parser::Parser;
use gust_vm::{CompileError, Compiler, Program, RuntimeError, Vm};

/// An output sink the test can read back after the VM has consumed it.
#[derive(Clone, Default)]
pub struct SharedOutput(Rc<RefCell<Vec<u8>>>);

impl SharedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("output is not UTF-8")
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Parse and compile, panicking on failure.
pub fn compile(src: &str) -> Program {
    let ast = Parser::parse_str(src).expect("parse error");
    Compiler::new().compile(&ast).expect("compile error")
}

/// Parse and compile, expecting a compile error.
pub fn compile_err(src: &str) -> CompileError {
    let ast = Parser::parse_str(src).expect("parse error");
    Compiler::new()
        .compile(&ast)
        .err()
        .expect("expected a compile error")
}

/// Run a program to completion and return its printed output.
pub fn run(src: &str) -> String {
    let (_, output) = run_vm(src);
    output
}

/// Run a program to completion; return the finished VM and its output.
pub fn run_vm(src: &str) -> (Vm, String) {
    let output = SharedOutput::new();
    let mut vm = Vm::with_output(compile(src), Box::new(output.clone()));
    vm.run().expect("runtime error");
    (vm, output.text())
}

/// Run a program, expecting a runtime error.
pub fn run_err(src: &str) -> RuntimeError {
    let output = SharedOutput::new();
    let mut vm = Vm::with_output(compile(src), Box::new(output.clone()));
    vm.run().err().expect("expected a runtime error")
}
