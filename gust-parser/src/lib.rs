// gust-parser - Lexer and parser for the Gust programming language
// Copyright (c) 2026 The Gust Authors. MIT licensed.

//! # gust-parser
//!
//! Lexer and parser for the Gust programming language.
//! Produces `Node` AST trees from source code strings.

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::Node;
pub use lexer::{Lexer, LexerError, Token};
pub use parser::{ParseError, Parser};
