// gust-vm - Bytecode compiler and virtual machine for the Gust programming language
// Copyright (c) 2026 The Gust Authors. MIT licensed.

//! Free-variable analysis for lambda bodies.
//!
//! A lambda captures every identifier reference that resolves to a variable
//! in the enclosing scope chain and is not one of the lambda's own
//! parameters. Captures are recorded in the order first encountered, with
//! duplicates suppressed; the compiler serialises that order into the
//! CREATE_LAMBDA operand so the VM can snapshot the values at creation time.

use gust_parser::Node;

use crate::symbols::SymbolTable;

/// Collect the captured variable names of a lambda body.
pub fn collect_captures(body: &Node, params: &[String], symbols: &SymbolTable) -> Vec<String> {
    let mut walker = Walker {
        symbols,
        shadowed: params.to_vec(),
        captured: Vec::new(),
    };
    walker.walk(body);
    walker.captured
}

struct Walker<'a> {
    symbols: &'a SymbolTable,
    /// Names bound inside the lambda: parameters, nested lambda parameters,
    /// and `let` bindings seen so far.
    shadowed: Vec<String>,
    captured: Vec<String>,
}

impl Walker<'_> {
    fn walk(&mut self, node: &Node) {
        match node {
            Node::Identifier(name) => self.reference(name),
            Node::TypeAnnotation { name, .. } => self.reference(name),

            Node::Number(_) | Node::Boolean(_) | Node::Str(_) | Node::Operator(_) => {}

            Node::If { cond, then, alt } => {
                self.walk(cond);
                self.walk(then);
                if let Some(alt) = alt {
                    self.walk(alt);
                }
            }
            Node::Return(value) => self.walk(value),

            Node::Lambda { params, body } => self.walk_shadowed(params, body),
            Node::FunctionDef { params, body, .. } => {
                let depth = self.shadowed.len();
                self.shadowed
                    .extend(params.iter().filter_map(|p| p.param_name().map(String::from)));
                for expr in body {
                    self.walk(expr);
                }
                self.shadowed.truncate(depth);
            }

            Node::LambdaCall { lambda, args } => {
                self.walk(lambda);
                for arg in args {
                    self.walk(arg);
                }
            }
            Node::MapExpr { lambda, args } | Node::FilterExpr { lambda, args } => {
                self.walk(lambda);
                for arg in args {
                    self.walk(arg);
                }
            }

            Node::Expr(items) => self.walk_composite(items),
        }
    }

    fn walk_shadowed(&mut self, params: &[Node], body: &Node) {
        let depth = self.shadowed.len();
        self.shadowed
            .extend(params.iter().filter_map(|p| p.param_name().map(String::from)));
        self.walk(body);
        self.shadowed.truncate(depth);
    }

    fn walk_composite(&mut self, items: &[Node]) {
        // A `let` introduces a binding visible to the rest of the body; the
        // value expression itself is walked before the name is shadowed.
        if let [Node::Identifier(head), binding, value] = items {
            if head == "let" {
                if let Some(name) = binding.param_name() {
                    self.walk(value);
                    self.shadowed.push(name.to_string());
                    return;
                }
            }
        }

        let mut items = items.iter();
        // The head identifier of a reserved form or function call is not a
        // variable reference.
        if let Some(Node::Identifier(head)) = items.clone().next() {
            let head_is_callable = self
                .symbols
                .resolve(head)
                .map(|s| s.is_function())
                .unwrap_or(true);
            if head_is_callable {
                items.next();
            }
        }
        for item in items {
            self.walk(item);
        }
    }

    fn reference(&mut self, name: &str) {
        if self.shadowed.iter().any(|s| s == name) {
            return;
        }
        if self.captured.iter().any(|c| c == name) {
            return;
        }
        if let Some(symbol) = self.symbols.resolve(name) {
            if !symbol.is_function() {
                self.captured.push(name.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gust_parser::Parser;

    fn lambda_parts(src: &str) -> (Vec<String>, Node) {
        let program = Parser::parse_str(src).expect("parse error");
        match program.into_iter().next() {
            Some(Node::Lambda { params, body }) => (
                params
                    .iter()
                    .filter_map(|p| p.param_name().map(String::from))
                    .collect(),
                *body,
            ),
            other => panic!("expected a lambda, got {:?}", other),
        }
    }

    #[test]
    fn free_variable_is_captured() {
        let mut symbols = SymbolTable::new();
        symbols.define_variable("a", None);
        let (params, body) = lambda_parts("((x:int) -> (+ x a))");
        assert_eq!(collect_captures(&body, &params, &symbols), vec!["a"]);
    }

    #[test]
    fn parameters_are_not_captured() {
        let symbols = SymbolTable::new();
        let (params, body) = lambda_parts("((x:int) -> (* x x))");
        assert!(collect_captures(&body, &params, &symbols).is_empty());
    }

    #[test]
    fn capture_order_is_first_encounter_without_duplicates() {
        let mut symbols = SymbolTable::new();
        symbols.define_variable("a", None);
        symbols.define_variable("b", None);
        let (params, body) = lambda_parts("((x:int) -> (+ (+ b a) (+ b x)))");
        assert_eq!(collect_captures(&body, &params, &symbols), vec!["b", "a"]);
    }

    #[test]
    fn nested_lambda_parameters_shadow() {
        let mut symbols = SymbolTable::new();
        symbols.define_variable("y", None);
        // The inner lambda's own `y` shadows the outer binding.
        let (params, body) = lambda_parts("((x:int) -> (((y:int) -> (+ x y)) (3)))");
        assert!(collect_captures(&body, &params, &symbols).is_empty());
    }

    #[test]
    fn function_references_are_not_captured() {
        let mut symbols = SymbolTable::new();
        symbols.define_function("double", 0, vec!["n".to_string()], None);
        let (params, body) = lambda_parts("((x:int) -> (double x))");
        assert!(collect_captures(&body, &params, &symbols).is_empty());
    }
}
