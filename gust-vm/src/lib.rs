// gust-vm - Bytecode compiler and virtual machine for the Gust programming language
// Copyright (c) 2026 The Gust Authors. MIT licensed.

//! # gust-vm
//!
//! Bytecode compiler and stack-based virtual machine for Gust.
//!
//! The pipeline: the AST from `gust-parser` is compiled into a byte stream of
//! variable-length instructions, decoded into typed records plus a byte→index
//! offset map, and executed by the VM. See the `compiler` module for the
//! emission rules and `vm` for the execution model.

pub mod bytecode;
pub mod compiler;
pub mod symbols;
pub mod value;
pub mod vm;

pub use bytecode::{decode, encode, BytecodeError, CodeBuffer, Instruction, Op, Operand};
pub use compiler::{CompileError, Compiler, Program};
pub use symbols::{Symbol, SymbolKind, SymbolTable};
pub use value::{LambdaFn, Value};
pub use vm::{RuntimeError, Vm};
