// gust-vm - Bytecode compiler and virtual machine for the Gust programming language
// Copyright (c) 2026 The Gust Authors. MIT licensed.

//! Stack-based virtual machine for executing Gust bytecode.
//!
//! The VM runs the decoded instruction list against a value stack, a call
//! stack, and a stack of environment frames. A single main loop is
//! parameterised by an instruction window: the top level runs the whole
//! stream, and lambda invocation re-enters the same loop bounded by the
//! lambda's `[start, end)` body window.

pub mod error;
pub mod frame;
pub mod stack;

use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use im::Vector;
use tracing::{debug, trace};

use crate::bytecode::{Instruction, Op};
use crate::compiler::Program;
use crate::value::{LambdaFn, Value};

pub use error::{Result, RuntimeError};
pub use frame::{CallStackEntry, Frame};
pub use stack::ValueStack;

/// Metadata installed by DEFINE_FUNCTION.
#[derive(Debug, Clone)]
pub struct FunctionMetadata {
    /// Instruction index of the body's first instruction (already past the
    /// bracketing jump).
    pub start: usize,
    pub param_count: usize,
    pub param_names: Vec<String>,
}

/// The Gust virtual machine.
pub struct Vm {
    stack: ValueStack,
    pc: usize,
    instructions: Vec<Instruction>,
    offsets: HashMap<usize, usize>,
    /// Environment frames, innermost on top; the global frame sits at the
    /// bottom and persists.
    frames: Vec<Rc<Frame>>,
    call_stack: Vec<CallStackEntry>,
    functions: HashMap<String, FunctionMetadata>,
    out: Box<dyn Write>,
}

impl Vm {
    /// Create a VM writing program output to stdout.
    pub fn new(program: Program) -> Self {
        Vm::with_output(program, Box::new(std::io::stdout()))
    }

    /// Create a VM writing program output to the given sink.
    pub fn with_output(program: Program, out: Box<dyn Write>) -> Self {
        Vm {
            stack: ValueStack::new(),
            pc: 0,
            instructions: program.instructions,
            offsets: program.offsets,
            frames: vec![Frame::new(None)],
            call_stack: Vec::new(),
            functions: HashMap::new(),
            out,
        }
    }

    /// Execute the whole instruction stream.
    pub fn run(&mut self) -> Result<()> {
        let end = self.instructions.len();
        self.run_range(0, end)
    }

    /// Current value-stack depth, exposed for the stack-discipline tests.
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Run the main loop over the instruction window `[start, end)`.
    fn run_range(&mut self, start: usize, end: usize) -> Result<()> {
        self.pc = start;

        while self.pc < end {
            let instruction = self.instructions[self.pc].clone();
            trace!(pc = self.pc, instruction = %instruction, "dispatch");
            self.pc += 1;

            match instruction.op {
                // Arithmetic
                Op::Add => self.binary_num_op("ADD", |a, b| a + b)?,
                Op::Sub => self.binary_num_op("SUB", |a, b| a - b)?,
                Op::Mul => self.binary_num_op("MUL", |a, b| a * b)?,
                Op::Div => {
                    let b = self.stack.pop_number("DIV")?;
                    let a = self.stack.pop_number("DIV")?;
                    if b == 0.0 {
                        return Err(RuntimeError::DivisionByZero);
                    }
                    self.stack.push(Value::Number(a / b));
                }

                // Comparison
                Op::Grt => self.comparison_op("GRT", |a, b| a > b)?,
                Op::Less => self.comparison_op("LESS", |a, b| a < b)?,
                Op::Eq => self.equality_op("EQ", false)?,
                Op::Neq => self.equality_op("NEQ", true)?,

                // Conditionals: no jump operands; the VM scans for the
                // matching marker opcode at run time.
                Op::If => {
                    let condition = self.stack.pop_bool("IF")?;
                    if !condition {
                        self.scan_past(Op::Else, end);
                    }
                }
                Op::Else => self.scan_past(Op::EndIf, end),
                Op::EndIf => {}

                Op::Print => {
                    let value = self.stack.pop("PRINT")?;
                    debug!(value = %value, "print");
                    writeln!(self.out, "{}", value)
                        .map_err(|e| RuntimeError::Output(e.to_string()))?;
                }

                Op::Return => {
                    if self.call_stack.is_empty() {
                        return Err(RuntimeError::EmptyCallStack);
                    }
                    let value = self.stack.pop("RETURN")?;
                    let entry = self.call_stack.pop().unwrap();
                    self.frames.pop();
                    if let Some(top) = self.frames.last() {
                        debug_assert!(Rc::ptr_eq(top, &entry.caller_frame));
                    }
                    trace!(return_address = entry.return_address, "return");
                    self.pc = entry.return_address;
                    self.stack.push(value);
                }

                // Pushes
                Op::PushNumber => {
                    let n = num_operand(&instruction, 0)?;
                    self.stack.push(Value::Number(n));
                }
                Op::PushBool => {
                    let b = bool_operand(&instruction, 0)?;
                    self.stack.push(Value::Bool(b));
                }
                Op::PushString => {
                    let s = text_operand(&instruction, 0)?;
                    self.stack.push(Value::string(s));
                }
                Op::PushVariable => {
                    let name = text_operand(&instruction, 0)?;
                    let value = self
                        .lookup_variable(name)
                        .ok_or_else(|| RuntimeError::UndefinedVariable(name.to_string()))?;
                    self.stack.push(value);
                }

                Op::DefineVariable => {
                    let name = text_operand(&instruction, 0)?;
                    let value = self.stack.pop("DEFINE_VARIABLE")?;
                    self.current_frame().define(name, value)?;
                }

                Op::DefineFunction => self.define_function(&instruction)?,
                Op::CallFunction => {
                    let name = text_operand(&instruction, 0)?.to_string();
                    self.call_function(&name)?;
                }

                Op::Jump => {
                    let offset = int_operand(&instruction, 0)? as usize;
                    let target = self.pc + offset;
                    if target > self.instructions.len() {
                        return Err(RuntimeError::InvalidJumpTarget {
                            pc: self.pc - 1,
                            target,
                        });
                    }
                    trace!(target, "jump");
                    self.pc = target;
                }

                Op::CreateLambda => self.create_lambda(&instruction)?,
                Op::CallLambda => {
                    let argc = int_operand(&instruction, 0)? as usize;
                    let args = self.stack.pop_n(argc, "CALL_LAMBDA")?;
                    let lambda = self.pop_lambda("CALL_LAMBDA")?;
                    let result = self.invoke_lambda(&lambda, args)?;
                    self.stack.push(result);
                }
                Op::Map => {
                    let argc = int_operand(&instruction, 0)? as usize;
                    let elements = self.stack.pop_n(argc, "MAP")?;
                    let lambda = self.pop_lambda("MAP")?;
                    let mut results = Vector::new();
                    for element in elements {
                        results.push_back(self.invoke_lambda(&lambda, vec![element])?);
                    }
                    self.stack.push(Value::List(results));
                }
                Op::Filter => {
                    let argc = int_operand(&instruction, 0)? as usize;
                    let elements = self.stack.pop_n(argc, "FILTER")?;
                    let lambda = self.pop_lambda("FILTER")?;
                    // Kept elements preserve the input order.
                    let mut kept = Vector::new();
                    for element in elements {
                        match self.invoke_lambda(&lambda, vec![element.clone()])? {
                            Value::Bool(true) => kept.push_back(element),
                            Value::Bool(false) => {}
                            other => {
                                return Err(RuntimeError::TypeMismatch {
                                    op: "FILTER",
                                    expected: "bool from the predicate",
                                    got: other.type_name().to_string(),
                                });
                            }
                        }
                    }
                    self.stack.push(Value::List(kept));
                }
            }
        }

        Ok(())
    }

    /// Advance the PC past the next `target` opcode in the window; to the
    /// window's end when there is none.
    fn scan_past(&mut self, target: Op, end: usize) {
        while self.pc < end {
            let found = self.instructions[self.pc].op == target;
            self.pc += 1;
            if found {
                return;
            }
        }
    }

    fn define_function(&mut self, instruction: &Instruction) -> Result<()> {
        let name = text_operand(instruction, 0)?;
        let start_byte = int_operand(instruction, 1)? as usize;
        let param_count = int_operand(instruction, 2)? as usize;
        let param_names = names_operand(instruction, 3)?;

        // +1 skips the jump bracketing the body.
        let start = self.instruction_index("DEFINE_FUNCTION", start_byte)? + 1;
        debug!(name, start, param_count, "function defined");
        self.functions.insert(
            name.to_string(),
            FunctionMetadata {
                start,
                param_count,
                param_names: param_names.to_vec(),
            },
        );
        Ok(())
    }

    fn call_function(&mut self, name: &str) -> Result<()> {
        let metadata = self
            .functions
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::FunctionNotDefined(name.to_string()))?;

        if self.stack.len() < metadata.param_count {
            return Err(RuntimeError::NotEnoughArguments {
                function: name.to_string(),
                expected: metadata.param_count,
                got: self.stack.len(),
            });
        }
        // pop_n preserves push order, so the slice is already left-to-right.
        let args = self.stack.pop_n(metadata.param_count, "CALL_FUNCTION")?;

        let caller = self.current_frame();
        let frame = Frame::new(Some(caller.clone()));
        for (param, value) in metadata.param_names.iter().zip(args) {
            frame.define(param, value)?;
        }

        debug!(name, start = metadata.start, return_address = self.pc, "call");
        self.call_stack.push(CallStackEntry {
            return_address: self.pc,
            caller_frame: caller,
        });
        self.frames.push(frame);
        self.pc = metadata.start;
        Ok(())
    }

    fn create_lambda(&mut self, instruction: &Instruction) -> Result<()> {
        let start_byte = int_operand(instruction, 0)? as usize;
        let end_byte = int_operand(instruction, 1)? as usize;
        let params = names_operand(instruction, 3)?.to_vec();
        let captured = names_operand(instruction, 5)?.to_vec();

        let start = self.instruction_index("CREATE_LAMBDA", start_byte)? + 1;
        let end = self.instruction_index("CREATE_LAMBDA", end_byte)?;

        // Snapshot the captured values now; the lambda observes these even
        // after the defining scope has been exited.
        let env = Frame::new(None);
        for name in &captured {
            let value = self
                .lookup_variable(name)
                .ok_or_else(|| RuntimeError::UndefinedVariable(name.clone()))?;
            env.define(name, value)?;
        }

        debug!(start, end, params = ?params, captured = ?captured, "lambda created");
        self.stack.push(Value::Lambda(Rc::new(LambdaFn {
            start,
            end,
            params,
            captured,
            env,
        })));
        Ok(())
    }

    /// Invoke a lambda over its body window and hand back the result.
    fn invoke_lambda(&mut self, lambda: &Rc<LambdaFn>, args: Vec<Value>) -> Result<Value> {
        if args.len() != lambda.params.len() {
            return Err(RuntimeError::LambdaArityMismatch {
                expected: lambda.params.len(),
                got: args.len(),
            });
        }

        let frame = Frame::new(Some(lambda.env.clone()));
        for (param, value) in lambda.params.iter().zip(args) {
            frame.define(param, value)?;
        }

        let saved_pc = self.pc;
        let frames_depth = self.frames.len();
        let calls_depth = self.call_stack.len();
        let stack_depth = self.stack.len();

        debug!(start = lambda.start, end = lambda.end, "entering lambda");
        // The body's RETURN resumes at the window end, which terminates the
        // bounded loop.
        self.call_stack.push(CallStackEntry {
            return_address: lambda.end,
            caller_frame: self.current_frame(),
        });
        self.frames.push(frame);

        let outcome = self.run_range(lambda.start, lambda.end);

        self.frames.truncate(frames_depth);
        self.call_stack.truncate(calls_depth);
        self.pc = saved_pc;
        outcome?;

        if self.stack.len() <= stack_depth {
            return Err(RuntimeError::LambdaNoResult);
        }
        self.stack.pop("CALL_LAMBDA")
    }

    fn pop_lambda(&mut self, op: &'static str) -> Result<Rc<LambdaFn>> {
        match self.stack.pop(op)? {
            Value::Lambda(lambda) => Ok(lambda),
            other => Err(RuntimeError::TypeMismatch {
                op,
                expected: "lambda",
                got: other.type_name().to_string(),
            }),
        }
    }

    fn current_frame(&self) -> Rc<Frame> {
        Rc::clone(self.frames.last().expect("no active frame"))
    }

    /// Walk the frame stack innermost to outermost; each stacked frame is
    /// searched together with its parent chain, which is how a lambda's
    /// captured environment becomes visible.
    fn lookup_variable(&self, name: &str) -> Option<Value> {
        for frame in self.frames.iter().rev() {
            if let Some(value) = frame.lookup_chain(name) {
                return Some(value);
            }
        }
        None
    }

    fn instruction_index(&self, op: &'static str, byte_address: usize) -> Result<usize> {
        self.offsets
            .get(&byte_address)
            .copied()
            .ok_or(RuntimeError::UnknownAddress {
                op,
                address: byte_address,
            })
    }

    fn binary_num_op(&mut self, op: &'static str, f: impl Fn(f64, f64) -> f64) -> Result<()> {
        let b = self.stack.pop_number(op)?;
        let a = self.stack.pop_number(op)?;
        self.stack.push(Value::Number(f(a, b)));
        Ok(())
    }

    fn comparison_op(&mut self, op: &'static str, f: impl Fn(f64, f64) -> bool) -> Result<()> {
        let b = self.stack.pop_number(op)?;
        let a = self.stack.pop_number(op)?;
        self.stack.push(Value::Bool(f(a, b)));
        Ok(())
    }

    /// EQ/NEQ permit only number/number or string/string comparisons.
    fn equality_op(&mut self, op: &'static str, negate: bool) -> Result<()> {
        let b = self.stack.pop(op)?;
        let a = self.stack.pop(op)?;
        let equal = match (&a, &b) {
            (Value::Number(x), Value::Number(y)) => x == y,
            (Value::Str(x), Value::Str(y)) => x == y,
            _ => {
                return Err(RuntimeError::TypeMismatch {
                    op,
                    expected: "two numbers or two strings",
                    got: format!("{} and {}", a.type_name(), b.type_name()),
                });
            }
        };
        self.stack.push(Value::Bool(equal != negate));
        Ok(())
    }
}

fn int_operand(instruction: &Instruction, index: usize) -> Result<u32> {
    instruction.int(index).ok_or(RuntimeError::MalformedOperand {
        op: instruction.op.mnemonic(),
    })
}

fn num_operand(instruction: &Instruction, index: usize) -> Result<f64> {
    instruction.num(index).ok_or(RuntimeError::MalformedOperand {
        op: instruction.op.mnemonic(),
    })
}

fn bool_operand(instruction: &Instruction, index: usize) -> Result<bool> {
    instruction
        .boolean(index)
        .ok_or(RuntimeError::MalformedOperand {
            op: instruction.op.mnemonic(),
        })
}

fn text_operand(instruction: &Instruction, index: usize) -> Result<&str> {
    instruction.text(index).ok_or(RuntimeError::MalformedOperand {
        op: instruction.op.mnemonic(),
    })
}

fn names_operand(instruction: &Instruction, index: usize) -> Result<&[String]> {
    instruction
        .names(index)
        .ok_or(RuntimeError::MalformedOperand {
            op: instruction.op.mnemonic(),
        })
}
