// gust-vm - Bytecode compiler and virtual machine for the Gust programming language
// Copyright (c) 2026 The Gust Authors. MIT licensed.

//! Code generation: walks the AST and emits the byte stream.

use std::collections::HashMap;

use tracing::{debug, trace};

use gust_parser::Node;

use crate::bytecode::{self, CodeBuffer, Instruction, Op};
use crate::symbols::{SymbolKind, SymbolTable};

use super::captures::collect_captures;
use super::{CompileError, Result};

/// A compiled program: the raw byte stream, the decoded instruction list the
/// VM executes, and the byte-offset → instruction-index map used to
/// translate addresses embedded in operands.
#[derive(Debug, Clone)]
pub struct Program {
    pub bytes: Vec<u8>,
    pub instructions: Vec<Instruction>,
    pub offsets: HashMap<usize, usize>,
}

impl Program {
    /// Human-readable listing of the decoded instructions.
    pub fn disassemble(&self) -> String {
        use std::fmt::Write;
        let mut out = String::new();
        for (index, instruction) in self.instructions.iter().enumerate() {
            let _ = writeln!(out, "{:4}  {}", index, instruction);
        }
        out
    }
}

/// The bytecode compiler.
///
/// Owns the symbol table for the whole compilation; scopes are entered and
/// left around function and lambda bodies.
pub struct Compiler {
    code: CodeBuffer,
    symbols: SymbolTable,
    /// Name of the function whose body is being compiled, if any.
    active_function: Option<String>,
    /// Nesting depth of lambda bodies. Identifier resolution inside a lambda
    /// is deferred to run time, since captures are snapshotted there.
    lambda_depth: usize,
}

impl Compiler {
    pub fn new() -> Self {
        Compiler {
            code: CodeBuffer::new(),
            symbols: SymbolTable::new(),
            active_function: None,
            lambda_depth: 0,
        }
    }

    /// Compile a program's top-level forms into instructions plus the offset
    /// map. The final decode pass is the authority on instruction framing.
    pub fn compile(mut self, program: &[Node]) -> Result<Program> {
        for node in program {
            self.compile_node(node)?;
        }

        let bytes = self.code.into_bytes();
        let (instructions, offsets) = bytecode::decode(&bytes)?;
        debug!(
            bytes = bytes.len(),
            instructions = instructions.len(),
            "compilation finished"
        );
        Ok(Program {
            bytes,
            instructions,
            offsets,
        })
    }

    fn compile_node(&mut self, node: &Node) -> Result<()> {
        trace!(kind = node.kind(), "compile node");
        match node {
            Node::Number(n) => {
                self.code.emit_op(Op::PushNumber);
                self.code.emit_f64(*n);
                Ok(())
            }
            Node::Boolean(b) => {
                self.code.emit_op(Op::PushBool);
                self.code.emit_bool(*b);
                Ok(())
            }
            Node::Str(raw) => {
                // Literals arrive quote-wrapped from the parser.
                let stripped = raw.trim_matches('\'');
                self.code.emit_op(Op::PushString);
                self.code.emit_str(stripped)?;
                Ok(())
            }
            Node::Identifier(name) => self.compile_identifier(name),
            // A bare annotation in expression position reads the variable;
            // the declared type is recorded only where names are bound.
            Node::TypeAnnotation { name, .. } => self.compile_identifier(name),
            Node::Operator(symbol) => self.compile_operator(symbol),
            Node::If { cond, then, alt } => {
                self.compile_node(cond)?;
                self.code.emit_op(Op::If);
                self.compile_node(then)?;
                if let Some(alt) = alt {
                    self.code.emit_op(Op::Else);
                    self.compile_node(alt)?;
                }
                self.code.emit_op(Op::EndIf);
                Ok(())
            }
            Node::FunctionDef {
                name,
                params,
                return_type,
                body,
            } => self.compile_function_definition(name, params, return_type.as_deref(), body),
            Node::Return(value) => {
                self.compile_node(value)?;
                self.code.emit_op(Op::Return);
                Ok(())
            }
            Node::Lambda { params, body } => self.compile_lambda(params, body),
            Node::LambdaCall { lambda, args } => {
                self.compile_node(lambda)?;
                for arg in args {
                    self.compile_node(arg)?;
                }
                self.emit_count_op(Op::CallLambda, args.len())
            }
            Node::MapExpr { lambda, args } => {
                self.compile_node(lambda)?;
                for arg in args {
                    self.compile_node(arg)?;
                }
                self.emit_count_op(Op::Map, args.len())
            }
            Node::FilterExpr { lambda, args } => {
                self.compile_node(lambda)?;
                for arg in args {
                    self.compile_node(arg)?;
                }
                self.emit_count_op(Op::Filter, args.len())
            }
            Node::Expr(items) => self.compile_composite(items),
        }
    }

    fn compile_composite(&mut self, items: &[Node]) -> Result<()> {
        let head = match items.first() {
            Some(head) => head,
            None => return Err(CompileError::EmptyExpression),
        };

        if let Node::Identifier(name) = head {
            match name.as_str() {
                "let" => return self.compile_let(items),
                "def" => return self.compile_def_form(items),
                "print" => return self.compile_print(items),
                "reduce" => return Err(CompileError::UnsupportedForm("reduce")),
                _ => {}
            }

            // A head naming a known function is a call: arguments
            // left-to-right, then the call itself.
            if self.resolved_kind(name) == Some(SymbolKind::Function) {
                for arg in &items[1..] {
                    self.compile_node(arg)?;
                }
                return self.emit_name_op(Op::CallFunction, name);
            }
        }

        if let Node::Operator(symbol) = head {
            let symbol = symbol.clone();
            for operand in &items[1..] {
                self.compile_node(operand)?;
            }
            return self.compile_operator(&symbol);
        }

        // Plain sequence: compile each element in order.
        for item in items {
            self.compile_node(item)?;
        }
        Ok(())
    }

    /// `(let name value)` / `(let name:type value)`.
    fn compile_let(&mut self, items: &[Node]) -> Result<()> {
        if items.len() != 3 {
            return Err(CompileError::MalformedForm {
                form: "let",
                message: format!("expected two arguments, got {}", items.len() - 1),
            });
        }

        let (name, data_type) = match &items[1] {
            Node::Identifier(name) => (name.clone(), None),
            Node::TypeAnnotation { name, ty } => (name.clone(), Some(ty.clone())),
            other => {
                return Err(CompileError::MalformedForm {
                    form: "let",
                    message: format!("expected a variable name, got {}", other.kind()),
                });
            }
        };

        self.compile_node(&items[2])?;
        self.emit_name_op(Op::DefineVariable, &name)?;
        // Defined after the value expression is compiled, so the value
        // cannot reference the name being bound.
        self.symbols.define_variable(&name, data_type);
        Ok(())
    }

    /// `(print value)`.
    fn compile_print(&mut self, items: &[Node]) -> Result<()> {
        if items.len() != 2 {
            return Err(CompileError::MalformedForm {
                form: "print",
                message: format!("expected one argument, got {}", items.len() - 1),
            });
        }
        self.compile_node(&items[1])?;
        self.code.emit_op(Op::Print);
        Ok(())
    }

    /// `def` as a head-of-list reserved form. Produces the same emitted
    /// sequence as the parser's dedicated function-definition node.
    fn compile_def_form(&mut self, items: &[Node]) -> Result<()> {
        if items.len() < 4 {
            return Err(CompileError::MalformedForm {
                form: "def",
                message: "expected a name, a parameter list and a body".to_string(),
            });
        }
        let name = match &items[1] {
            Node::Identifier(name) => name.clone(),
            other => {
                return Err(CompileError::MalformedForm {
                    form: "def",
                    message: format!("function name must be an identifier, got {}", other.kind()),
                });
            }
        };
        let params: Vec<Node> = match &items[2] {
            Node::Expr(params) => params.clone(),
            single @ (Node::TypeAnnotation { .. } | Node::Identifier(_)) => vec![single.clone()],
            other => {
                return Err(CompileError::MalformedForm {
                    form: "def",
                    message: format!("parameters must be in a list, got {}", other.kind()),
                });
            }
        };
        self.compile_function_definition(&name, &params, None, &items[3..])
    }

    fn compile_function_definition(
        &mut self,
        name: &str,
        params: &[Node],
        return_type: Option<&str>,
        body: &[Node],
    ) -> Result<()> {
        let param_names = param_names(params, "def")?;
        let start_address = self.code.position();
        debug!(name, start_address, params = ?param_names, "compiling function");

        // Defined in the enclosing scope before the body is compiled, so the
        // body can call the function recursively.
        self.symbols.define_function(
            name,
            start_address,
            param_names.clone(),
            return_type.map(String::from),
        );

        let jump_operand_at = self.emit_jump_placeholder();

        self.symbols.enter_scope();
        let previous_function = self.active_function.replace(name.to_string());
        for param in params {
            self.define_param(param);
        }

        for expr in body {
            self.compile_node(expr)?;
        }
        if !matches!(body.last(), Some(Node::Return(_))) {
            self.code.emit_op(Op::Return);
        }

        let body_end = self.code.position();
        self.patch_jump(jump_operand_at, start_address, body_end)?;

        self.symbols.leave_scope();
        self.active_function = previous_function;

        self.emit_define_function(name, start_address, &param_names)
    }

    fn compile_lambda(&mut self, params: &[Node], body: &Node) -> Result<()> {
        let param_names = param_names(params, "lambda")?;
        let start_address = self.code.position();

        // Free variables are resolved against the enclosing scope chain,
        // before the lambda's own scope exists.
        let captured = collect_captures(body, &param_names, &self.symbols);
        if let Some(function) = &self.active_function {
            for name in &captured {
                trace!(
                    name = %name,
                    function = %function,
                    parameter = self.symbols.is_function_parameter(function, name),
                    "lambda capture"
                );
            }
        }
        debug!(start_address, params = ?param_names, captured = ?captured, "compiling lambda");

        let jump_operand_at = self.emit_jump_placeholder();

        self.symbols.enter_scope();
        self.lambda_depth += 1;
        for param in params {
            self.define_param(param);
        }

        self.compile_node(body)?;
        if !matches!(body, Node::Return(_)) {
            self.code.emit_op(Op::Return);
        }

        let end_address = self.code.position();
        self.patch_jump(jump_operand_at, start_address, end_address)?;

        self.lambda_depth -= 1;
        self.symbols.leave_scope();

        self.emit_create_lambda(start_address, end_address, &param_names, &captured)
    }

    fn compile_identifier(&mut self, name: &str) -> Result<()> {
        let kind = match &self.active_function {
            Some(function) => {
                let function = function.clone();
                self.symbols.resolve_local(&function, name).map(|s| s.kind)
            }
            None => self.symbols.resolve(name).map(|s| s.kind),
        };

        match kind {
            Some(SymbolKind::Function) => self.emit_name_op(Op::CallFunction, name),
            Some(SymbolKind::Variable) => self.emit_name_op(Op::PushVariable, name),
            // Inside a lambda body resolution is deferred: the name may be
            // satisfied by the captured environment at run time.
            None if self.lambda_depth > 0 => self.emit_name_op(Op::PushVariable, name),
            None => Err(CompileError::UndefinedIdentifier(name.to_string())),
        }
    }

    fn compile_operator(&mut self, symbol: &str) -> Result<()> {
        let op = match symbol {
            "+" => Op::Add,
            "-" => Op::Sub,
            "*" => Op::Mul,
            "/" => Op::Div,
            ">" => Op::Grt,
            "<" => Op::Less,
            "=" => Op::Eq,
            "?" => Op::Neq,
            other => return Err(CompileError::UnknownOperator(other.to_string())),
        };
        self.code.emit_op(op);
        Ok(())
    }

    fn resolved_kind(&self, name: &str) -> Option<SymbolKind> {
        self.symbols.resolve(name).map(|s| s.kind)
    }

    fn define_param(&mut self, param: &Node) {
        if let Node::TypeAnnotation { name, ty } = param {
            self.symbols.define_variable(name, Some(ty.clone()));
        } else if let Some(name) = param.param_name() {
            self.symbols.define_variable(name, None);
        }
    }

    // -- emission helpers ---------------------------------------------------

    fn emit_name_op(&mut self, op: Op, name: &str) -> Result<()> {
        self.code.emit_op(op);
        self.code.emit_str(name)?;
        Ok(())
    }

    fn emit_count_op(&mut self, op: Op, count: usize) -> Result<()> {
        self.code.emit_op(op);
        self.code.emit_u32(count as u32);
        Ok(())
    }

    /// Emit `JUMP 0` and return the byte position of the placeholder
    /// operand.
    fn emit_jump_placeholder(&mut self) -> usize {
        self.code.emit_op(Op::Jump);
        let operand_at = self.code.position();
        self.code.emit_u32(0);
        operand_at
    }

    /// Patch a jump placeholder so the decoded instruction skips the body.
    ///
    /// The window runs from the jump instruction itself through the body's
    /// last byte; its instruction count is computed by decoding the window,
    /// and one is subtracted because the VM has already stepped past the
    /// jump when the operand is applied.
    fn patch_jump(&mut self, operand_at: usize, window_start: usize, window_end: usize) -> Result<()> {
        let window = &self.code.as_slice()[window_start..window_end];
        let count = bytecode::instruction_count(window)?;
        let offset = count as u32 - 1;
        self.code.patch_u32(operand_at, offset);
        debug!(window_start, window_end, offset, "patched jump");
        Ok(())
    }

    fn emit_define_function(
        &mut self,
        name: &str,
        start_address: usize,
        param_names: &[String],
    ) -> Result<()> {
        self.code.emit_op(Op::DefineFunction);
        self.code.emit_str(name)?;
        self.code.emit_u32(start_address as u32);
        self.code.emit_u32(param_names.len() as u32);
        self.code.emit_names(param_names)?;
        Ok(())
    }

    fn emit_create_lambda(
        &mut self,
        start_address: usize,
        end_address: usize,
        param_names: &[String],
        captured: &[String],
    ) -> Result<()> {
        self.code.emit_op(Op::CreateLambda);
        self.code.emit_u32(start_address as u32);
        self.code.emit_u32(end_address as u32);
        self.code.emit_u32(param_names.len() as u32);
        self.code.emit_names(param_names)?;
        self.code.emit_u32(captured.len() as u32);
        self.code.emit_names(captured)?;
        Ok(())
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract parameter names, rejecting anything that is not a name or an
/// annotated name.
fn param_names(params: &[Node], form: &'static str) -> Result<Vec<String>> {
    params
        .iter()
        .map(|p| {
            p.param_name().map(String::from).ok_or_else(|| {
                CompileError::MalformedForm {
                    form,
                    message: format!("invalid parameter '{}'", p),
                }
            })
        })
        .collect()
}
