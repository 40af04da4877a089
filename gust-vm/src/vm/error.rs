// gust-vm - Bytecode compiler and virtual machine for the Gust programming language
// Copyright (c) 2026 The Gust Authors. MIT licensed.

//! Runtime errors for the VM.

use std::fmt;

use crate::bytecode::BytecodeError;

/// Runtime error during VM execution.
#[derive(Debug, Clone)]
pub enum RuntimeError {
    /// An instruction needed more values than the stack holds.
    StackUnderflow { op: &'static str },
    /// An operand value of the wrong type.
    TypeMismatch {
        op: &'static str,
        expected: &'static str,
        got: String,
    },
    /// Division by zero.
    DivisionByZero,
    /// A variable name that resolves to no active frame.
    UndefinedVariable(String),
    /// A second DEFINE_VARIABLE for a name already bound in the frame.
    ImmutableRebinding(String),
    /// CALL_FUNCTION for a name with no installed metadata.
    FunctionNotDefined(String),
    /// Fewer values on the stack than the call needs.
    NotEnoughArguments {
        function: String,
        expected: usize,
        got: usize,
    },
    /// A lambda invoked with the wrong number of arguments.
    LambdaArityMismatch { expected: usize, got: usize },
    /// A lambda body finished without leaving a result.
    LambdaNoResult,
    /// RETURN with no call-stack entry to return to.
    EmptyCallStack,
    /// A jump past the end of the instruction list.
    InvalidJumpTarget { pc: usize, target: usize },
    /// A byte address with no entry in the offset map.
    UnknownAddress { op: &'static str, address: usize },
    /// An instruction whose decoded operands have the wrong shape.
    MalformedOperand { op: &'static str },
    /// The output sink failed.
    Output(String),
    /// The instruction stream itself is malformed.
    Bytecode(BytecodeError),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::StackUnderflow { op } => {
                write!(f, "stack underflow in {}", op)
            }
            RuntimeError::TypeMismatch { op, expected, got } => {
                write!(f, "type mismatch in {}: expected {}, got {}", op, expected, got)
            }
            RuntimeError::DivisionByZero => write!(f, "division by zero"),
            RuntimeError::UndefinedVariable(name) => {
                write!(f, "undefined variable '{}'", name)
            }
            RuntimeError::ImmutableRebinding(name) => {
                write!(f, "immutable rebinding of variable '{}'", name)
            }
            RuntimeError::FunctionNotDefined(name) => {
                write!(f, "function '{}' is not defined", name)
            }
            RuntimeError::NotEnoughArguments {
                function,
                expected,
                got,
            } => write!(
                f,
                "not enough arguments on the stack for '{}': expected {}, got {}",
                function, expected, got
            ),
            RuntimeError::LambdaArityMismatch { expected, got } => {
                write!(
                    f,
                    "lambda arity mismatch: expected {} arguments, got {}",
                    expected, got
                )
            }
            RuntimeError::LambdaNoResult => {
                write!(f, "lambda did not return a value")
            }
            RuntimeError::EmptyCallStack => write!(f, "call stack is empty on return"),
            RuntimeError::InvalidJumpTarget { pc, target } => {
                write!(f, "invalid jump target {} at pc {}", target, pc)
            }
            RuntimeError::UnknownAddress { op, address } => {
                write!(f, "byte address {} in {} maps to no instruction", address, op)
            }
            RuntimeError::MalformedOperand { op } => {
                write!(f, "malformed operand for {}", op)
            }
            RuntimeError::Output(message) => write!(f, "output error: {}", message),
            RuntimeError::Bytecode(e) => write!(f, "bytecode error: {}", e),
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<BytecodeError> for RuntimeError {
    fn from(e: BytecodeError) -> Self {
        RuntimeError::Bytecode(e)
    }
}

/// Result type for VM operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;
