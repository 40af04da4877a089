// gust-vm - Bytecode compiler and virtual machine for the Gust programming language
// Copyright (c) 2026 The Gust Authors. MIT licensed.

//! Runtime values.

use std::fmt;
use std::rc::Rc;

use im::Vector;

use crate::vm::frame::Frame;

/// A runtime value on the VM's stack.
///
/// Lists are persistent vectors, so collecting map/filter results shares
/// structure with any copies handed around later.
#[derive(Debug, Clone)]
pub enum Value {
    /// IEEE-754 binary64 number.
    Number(f64),
    /// Boolean.
    Bool(bool),
    /// String, stored with its surrounding quotes stripped.
    Str(Rc<str>),
    /// Ordered sequence of arbitrary values.
    List(Vector<Value>),
    /// A lambda with its captured environment.
    Lambda(Rc<LambdaFn>),
}

/// Runtime handle for a compiled lambda.
///
/// `start` and `end` are instruction indices bounding the lambda's body
/// (start already past the bracketing jump); `env` is the snapshot of the
/// captured variables taken at creation time. The snapshot keeps the
/// captured frame alive after the defining scope has been exited.
#[derive(Debug)]
pub struct LambdaFn {
    pub start: usize,
    pub end: usize,
    pub params: Vec<String>,
    pub captured: Vec<String>,
    pub env: Rc<Frame>,
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        let s: String = s.into();
        Value::Str(Rc::from(s))
    }

    /// The value's type name, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Lambda(_) => "lambda",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Lambda(a), Value::Lambda(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write_number(f, *n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Lambda(l) => write!(f, "#<lambda/{}>", l.params.len()),
        }
    }
}

/// Integer-valued finite numbers render without a fractional part (`2`, not
/// `2.0`); everything else uses the shortest round-trip form.
fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_render_without_trailing_zero() {
        assert_eq!(Value::Number(2.0).to_string(), "2");
        assert_eq!(Value::Number(-14.0).to_string(), "-14");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(0.0).to_string(), "0");
    }

    #[test]
    fn strings_render_bare() {
        assert_eq!(Value::string("x equals -2").to_string(), "x equals -2");
    }

    #[test]
    fn lists_render_space_separated() {
        let list = Value::List(
            [2.0, 4.0, 6.0]
                .into_iter()
                .map(Value::Number)
                .collect::<im::Vector<_>>(),
        );
        assert_eq!(list.to_string(), "[2 4 6]");
        assert_eq!(Value::List(im::Vector::new()).to_string(), "[]");
    }

    #[test]
    fn mixed_variant_values_compare_unequal() {
        assert_ne!(Value::Number(1.0), Value::Bool(true));
        assert_ne!(Value::string("1"), Value::Number(1.0));
    }
}
