// gust-parser - AST definitions for Gust
// Copyright (c) 2026 The Gust Authors. MIT licensed.

//! Abstract syntax tree produced by the parser.
//!
//! The compiler dispatches on these node kinds; composite expressions are an
//! ordered sequence whose head position determines the meaning (operator
//! application, function call, reserved form).

use std::fmt;

/// A node in the Gust AST.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A bare identifier reference.
    Identifier(String),
    /// Numeric literal. All Gust numbers are IEEE-754 binary64.
    Number(f64),
    /// Boolean literal.
    Boolean(bool),
    /// String literal, raw and quote-wrapped as written in the source.
    Str(String),
    /// One of `+ - * / > < = ?`.
    Operator(String),
    /// `name:type` — a variable or parameter with its declared type.
    TypeAnnotation { name: String, ty: String },
    /// `(if cond then)` or `(if cond then else alt)`.
    If {
        cond: Box<Node>,
        then: Box<Node>,
        alt: Option<Box<Node>>,
    },
    /// `(def name (params) [-> type] body...)`.
    FunctionDef {
        name: String,
        params: Vec<Node>,
        return_type: Option<String>,
        body: Vec<Node>,
    },
    /// `(ret value)`.
    Return(Box<Node>),
    /// `((params) -> body)`.
    Lambda { params: Vec<Node>, body: Box<Node> },
    /// A lambda expression applied to arguments in head position.
    LambdaCall { lambda: Box<Node>, args: Vec<Node> },
    /// `(map lambda-expr args)`.
    MapExpr { lambda: Box<Node>, args: Vec<Node> },
    /// `(filter lambda-expr args)`.
    FilterExpr { lambda: Box<Node>, args: Vec<Node> },
    /// Generic ordered composite expression.
    Expr(Vec<Node>),
}

impl Node {
    /// The annotated name of a parameter node (`TypeAnnotation` or a plain
    /// `Identifier`); `None` for anything else.
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Node::TypeAnnotation { name, .. } => Some(name),
            Node::Identifier(name) => Some(name),
            _ => None,
        }
    }

    /// Short description of the node kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Identifier(_) => "identifier",
            Node::Number(_) => "number",
            Node::Boolean(_) => "boolean",
            Node::Str(_) => "string",
            Node::Operator(_) => "operator",
            Node::TypeAnnotation { .. } => "type annotation",
            Node::If { .. } => "if statement",
            Node::FunctionDef { .. } => "function definition",
            Node::Return(_) => "return statement",
            Node::Lambda { .. } => "lambda expression",
            Node::LambdaCall { .. } => "lambda call",
            Node::MapExpr { .. } => "map expression",
            Node::FilterExpr { .. } => "filter expression",
            Node::Expr(_) => "expression",
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Identifier(name) => write!(f, "{}", name),
            Node::Number(n) => write!(f, "{}", n),
            Node::Boolean(b) => write!(f, "{}", b),
            Node::Str(s) => write!(f, "{}", s),
            Node::Operator(op) => write!(f, "{}", op),
            Node::TypeAnnotation { name, ty } => write!(f, "{}:{}", name, ty),
            Node::If { cond, then, alt } => {
                write!(f, "(if {} {}", cond, then)?;
                if let Some(alt) = alt {
                    write!(f, " else {}", alt)?;
                }
                write!(f, ")")
            }
            Node::FunctionDef { name, params, .. } => {
                write!(f, "(def {} (", name)?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") ...)")
            }
            Node::Return(value) => write!(f, "(ret {})", value),
            Node::Lambda { params, body } => {
                write!(f, "((")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") -> {})", body)
            }
            Node::LambdaCall { lambda, args } => {
                write!(f, "({}", lambda)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                write!(f, ")")
            }
            Node::MapExpr { lambda, args } => {
                write!(f, "(map {}", lambda)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                write!(f, ")")
            }
            Node::FilterExpr { lambda, args } => {
                write!(f, "(filter {}", lambda)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                write!(f, ")")
            }
            Node::Expr(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}
