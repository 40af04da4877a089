// gust-vm - Bytecode compiler and virtual machine for the Gust programming language
// Copyright (c) 2026 The Gust Authors. MIT licensed.

//! Compile-time symbol table with lexical scoping.
//!
//! Scopes form a tree held in an arena and addressed by index; each scope
//! carries a back-reference to its parent. Resolution walks from the current
//! scope towards the root; definitions always land in the current scope.
//! Left scopes stay in the arena, so symbol data recorded during compilation
//! of one function remains addressable while compiling the next.

use std::collections::HashMap;

/// What a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
}

/// A named entry in the symbol table.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Declared data type, recorded but never checked.
    pub data_type: Option<String>,
    /// Ordered parameter names (functions only).
    pub param_names: Vec<String>,
    /// Byte address of the function's bracketing jump (functions only).
    pub start_address: usize,
    /// Declared return type (functions only).
    pub return_type: Option<String>,
}

impl Symbol {
    pub fn is_function(&self) -> bool {
        self.kind == SymbolKind::Function
    }
}

type ScopeId = usize;

#[derive(Debug)]
struct Scope {
    symbols: HashMap<String, Symbol>,
    parent: Option<ScopeId>,
}

/// Tree of lexical scopes used by the compiler.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl SymbolTable {
    /// Create a table holding only the global scope.
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope {
                symbols: HashMap::new(),
                parent: None,
            }],
            current: 0,
        }
    }

    /// Push a child of the current scope and make it current.
    pub fn enter_scope(&mut self) {
        let id = self.scopes.len();
        self.scopes.push(Scope {
            symbols: HashMap::new(),
            parent: Some(self.current),
        });
        self.current = id;
    }

    /// Return to the parent scope. Leaving the global scope is a no-op.
    pub fn leave_scope(&mut self) {
        if let Some(parent) = self.scopes[self.current].parent {
            self.current = parent;
        }
    }

    /// Define a variable in the current scope.
    ///
    /// Redefinition is accepted here: the immutability violation surfaces at
    /// DEFINE_VARIABLE execution time, not during compilation.
    pub fn define_variable(&mut self, name: &str, data_type: Option<String>) {
        self.scopes[self.current].symbols.insert(
            name.to_string(),
            Symbol {
                name: name.to_string(),
                kind: SymbolKind::Variable,
                data_type,
                param_names: Vec::new(),
                start_address: 0,
                return_type: None,
            },
        );
    }

    /// Define a function in the current scope, overwriting any prior entry.
    pub fn define_function(
        &mut self,
        name: &str,
        start_address: usize,
        param_names: Vec<String>,
        return_type: Option<String>,
    ) {
        self.scopes[self.current].symbols.insert(
            name.to_string(),
            Symbol {
                name: name.to_string(),
                kind: SymbolKind::Function,
                data_type: None,
                param_names,
                start_address,
                return_type,
            },
        );
    }

    /// Resolve a name, walking from the current scope to the root.
    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            if let Some(symbol) = self.scopes[id].symbols.get(name) {
                return Some(symbol);
            }
            scope = self.scopes[id].parent;
        }
        None
    }

    /// Resolve a name while compiling the body of `function_name`.
    ///
    /// The walk is the same as [`resolve`](Self::resolve); the separate entry
    /// point tags the query as a parameter lookup for tracing.
    pub fn resolve_local(&self, function_name: &str, name: &str) -> Option<&Symbol> {
        let symbol = self.resolve(name);
        tracing::trace!(
            function = function_name,
            name,
            parameter = self.is_function_parameter(function_name, name),
            found = symbol.is_some(),
            "local resolve"
        );
        symbol
    }

    /// Whether `name` is a declared parameter of function `function_name`.
    pub fn is_function_parameter(&self, function_name: &str, name: &str) -> bool {
        self.resolve(function_name)
            .map(|s| s.is_function() && s.param_names.iter().any(|p| p == name))
            .unwrap_or(false)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
