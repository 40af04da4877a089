// gust-vm - Bytecode compiler and virtual machine for the Gust programming language
// Copyright (c) 2026 The Gust Authors. MIT licensed.

//! Bytecode compiler: transforms the Gust AST into a byte stream, then
//! decodes it into the instruction list the VM executes.
//!
//! Compilation is a single walk over the AST. Forward jumps over function
//! and lambda bodies are emitted as placeholders and patched once the body's
//! byte span is known; the patch converts the span into an instruction count
//! using the decoder's framing rules.

pub mod captures;
pub mod codegen;

use std::fmt;

use crate::bytecode::BytecodeError;

pub use codegen::{Compiler, Program};

/// Error during compilation.
#[derive(Debug, Clone)]
pub enum CompileError {
    /// An empty composite expression.
    EmptyExpression,
    /// An identifier that resolves to no enclosing scope.
    UndefinedIdentifier(String),
    /// A reserved form with the wrong shape.
    MalformedForm {
        form: &'static str,
        message: String,
    },
    /// An operator symbol outside the supported set.
    UnknownOperator(String),
    /// A reserved form that is recognised but not wired through.
    UnsupportedForm(&'static str),
    /// Operand emission or the final decode pass failed.
    Bytecode(BytecodeError),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::EmptyExpression => write!(f, "empty expression"),
            CompileError::UndefinedIdentifier(name) => {
                write!(f, "undefined identifier '{}'", name)
            }
            CompileError::MalformedForm { form, message } => {
                write!(f, "malformed '{}' form: {}", form, message)
            }
            CompileError::UnknownOperator(op) => write!(f, "unknown operator '{}'", op),
            CompileError::UnsupportedForm(form) => {
                write!(f, "'{}' is not supported", form)
            }
            CompileError::Bytecode(e) => write!(f, "bytecode error: {}", e),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<BytecodeError> for CompileError {
    fn from(e: BytecodeError) -> Self {
        CompileError::Bytecode(e)
    }
}

/// Result type for compilation.
pub type Result<T> = std::result::Result<T, CompileError>;
