// gust-vm - Bytecode compiler and virtual machine for the Gust programming language
// Copyright (c) 2026 The Gust Authors. MIT licensed.

//! Bytecode instruction format: encoder, decoder, and offset map.
//!
//! Instructions are serialised as an opcode byte followed by variable-length
//! operands, all little-endian: integers are 4 bytes, numbers 8 bytes, bools
//! 1 byte, strings a 4-byte length prefix plus UTF-8 bytes, and name lists a
//! 4-byte count plus length-prefixed elements.
//!
//! The decode pass is the single source of truth for instruction framing: it
//! turns the raw byte stream into typed [`Instruction`] records plus a map
//! from byte offsets to instruction indices. The VM only ever executes the
//! decoded records; jump patching counts instructions by decoding the byte
//! window a jump spans.

use std::collections::HashMap;
use std::fmt;

/// Bytecode operation codes.
///
/// Values are grouped by family; they only need to stay disjoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Op {
    // Arithmetic & comparison (no operands)
    Add = 0,
    Sub = 1,
    Mul = 2,
    Div = 3,
    Grt = 4,
    Less = 5,
    Eq = 6,
    Neq = 7,

    // Control (no operands unless noted)
    If = 8,
    Else = 9,
    EndIf = 10,
    Print = 11,
    Return = 12,

    // Pushes
    PushVariable = 20,
    PushNumber = 21,
    PushBool = 22,
    PushString = 23,

    // Definitions & transfers
    DefineVariable = 30,
    DefineFunction = 31,
    Jump = 32,
    CallFunction = 33,

    // Lambdas
    CreateLambda = 40,
    CallLambda = 41,
    Map = 42,
    Filter = 43,
}

impl Op {
    /// Decode an opcode byte.
    pub fn from_byte(byte: u8) -> Option<Op> {
        Some(match byte {
            0 => Op::Add,
            1 => Op::Sub,
            2 => Op::Mul,
            3 => Op::Div,
            4 => Op::Grt,
            5 => Op::Less,
            6 => Op::Eq,
            7 => Op::Neq,
            8 => Op::If,
            9 => Op::Else,
            10 => Op::EndIf,
            11 => Op::Print,
            12 => Op::Return,
            20 => Op::PushVariable,
            21 => Op::PushNumber,
            22 => Op::PushBool,
            23 => Op::PushString,
            30 => Op::DefineVariable,
            31 => Op::DefineFunction,
            32 => Op::Jump,
            33 => Op::CallFunction,
            40 => Op::CreateLambda,
            41 => Op::CallLambda,
            42 => Op::Map,
            43 => Op::Filter,
            _ => return None,
        })
    }

    /// Upper-case mnemonic, used in diagnostics and disassembly.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Op::Add => "ADD",
            Op::Sub => "SUB",
            Op::Mul => "MUL",
            Op::Div => "DIV",
            Op::Grt => "GRT",
            Op::Less => "LESS",
            Op::Eq => "EQ",
            Op::Neq => "NEQ",
            Op::If => "IF",
            Op::Else => "ELSE",
            Op::EndIf => "ENDIF",
            Op::Print => "PRINT",
            Op::Return => "RETURN",
            Op::PushVariable => "PUSH_VARIABLE",
            Op::PushNumber => "PUSH_NUMBER",
            Op::PushBool => "PUSH_BOOL",
            Op::PushString => "PUSH_STRING",
            Op::DefineVariable => "DEFINE_VARIABLE",
            Op::DefineFunction => "DEFINE_FUNCTION",
            Op::Jump => "JUMP",
            Op::CallFunction => "CALL_FUNCTION",
            Op::CreateLambda => "CREATE_LAMBDA",
            Op::CallLambda => "CALL_LAMBDA",
            Op::Map => "MAP",
            Op::Filter => "FILTER",
        }
    }
}

/// Error in the byte stream itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BytecodeError {
    /// A byte that is not a known opcode where one was expected.
    UnknownOpcode { byte: u8, offset: usize },
    /// The stream ended inside an instruction's operands.
    UnexpectedEnd { op: &'static str, offset: usize },
    /// A declared count disagrees with its list operand's length.
    CountMismatch {
        op: &'static str,
        declared: u32,
        actual: u32,
    },
    /// A string operand is not valid UTF-8.
    InvalidUtf8 { op: &'static str, offset: usize },
    /// An operand does not fit its 4-byte length field.
    Overflow { what: &'static str },
}

impl fmt::Display for BytecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BytecodeError::UnknownOpcode { byte, offset } => {
                write!(f, "unknown opcode {:#04x} at byte offset {}", byte, offset)
            }
            BytecodeError::UnexpectedEnd { op, offset } => {
                write!(
                    f,
                    "unexpected end of bytecode in operands of {} at byte offset {}",
                    op, offset
                )
            }
            BytecodeError::CountMismatch {
                op,
                declared,
                actual,
            } => write!(
                f,
                "{} declares {} names but its list holds {}",
                op, declared, actual
            ),
            BytecodeError::InvalidUtf8 { op, offset } => {
                write!(
                    f,
                    "invalid UTF-8 in string operand of {} at byte offset {}",
                    op, offset
                )
            }
            BytecodeError::Overflow { what } => {
                write!(f, "{} does not fit a 4-byte length field", what)
            }
        }
    }
}

impl std::error::Error for BytecodeError {}

/// Result type for bytecode operations.
pub type Result<T> = std::result::Result<T, BytecodeError>;

/// A decoded operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Int(u32),
    Num(f64),
    Bool(bool),
    Str(String),
    Names(Vec<String>),
}

/// A decoded instruction: opcode plus typed operands.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub op: Op,
    pub operands: Vec<Operand>,
}

impl Instruction {
    pub fn new(op: Op, operands: Vec<Operand>) -> Self {
        Instruction { op, operands }
    }

    pub fn int(&self, index: usize) -> Option<u32> {
        match self.operands.get(index) {
            Some(Operand::Int(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn num(&self, index: usize) -> Option<f64> {
        match self.operands.get(index) {
            Some(Operand::Num(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn boolean(&self, index: usize) -> Option<bool> {
        match self.operands.get(index) {
            Some(Operand::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn text(&self, index: usize) -> Option<&str> {
        match self.operands.get(index) {
            Some(Operand::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn names(&self, index: usize) -> Option<&[String]> {
        match self.operands.get(index) {
            Some(Operand::Names(names)) => Some(names),
            _ => None,
        }
    }

    /// Serialise this instruction, the exact inverse of decoding.
    pub fn encode_into(&self, buf: &mut CodeBuffer) -> Result<()> {
        buf.emit_op(self.op);
        for operand in &self.operands {
            match operand {
                Operand::Int(n) => buf.emit_u32(*n),
                Operand::Num(n) => buf.emit_f64(*n),
                Operand::Bool(b) => buf.emit_bool(*b),
                Operand::Str(s) => buf.emit_str(s)?,
                Operand::Names(names) => buf.emit_names(names)?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.op.mnemonic())?;
        for operand in &self.operands {
            match operand {
                Operand::Int(n) => write!(f, " {}", n)?,
                Operand::Num(n) => write!(f, " {}", n)?,
                Operand::Bool(b) => write!(f, " {}", b)?,
                Operand::Str(s) => write!(f, " {:?}", s)?,
                Operand::Names(names) => write!(f, " {:?}", names)?,
            }
        }
        Ok(())
    }
}

/// Growable little-endian byte stream for instruction emission.
#[derive(Debug, Default)]
pub struct CodeBuffer {
    bytes: Vec<u8>,
}

impl CodeBuffer {
    pub fn new() -> Self {
        CodeBuffer { bytes: Vec::new() }
    }

    /// Current byte offset; the address of the next emitted instruction.
    pub fn position(&self) -> usize {
        self.bytes.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn emit_op(&mut self, op: Op) {
        self.bytes.push(op as u8);
    }

    pub fn emit_u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn emit_f64(&mut self, value: f64) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn emit_bool(&mut self, value: bool) {
        self.bytes.push(u8::from(value));
    }

    pub fn emit_str(&mut self, value: &str) -> Result<()> {
        let len = u32::try_from(value.len()).map_err(|_| BytecodeError::Overflow {
            what: "string operand",
        })?;
        self.emit_u32(len);
        self.bytes.extend_from_slice(value.as_bytes());
        Ok(())
    }

    pub fn emit_names(&mut self, names: &[String]) -> Result<()> {
        let count = u32::try_from(names.len()).map_err(|_| BytecodeError::Overflow {
            what: "name list operand",
        })?;
        self.emit_u32(count);
        for name in names {
            self.emit_str(name)?;
        }
        Ok(())
    }

    /// Overwrite a previously emitted u32 (jump placeholder patching).
    pub fn patch_u32(&mut self, at: usize, value: u32) {
        self.bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }
}

/// Serialise a list of instructions into a fresh byte stream.
pub fn encode(instructions: &[Instruction]) -> Result<Vec<u8>> {
    let mut buf = CodeBuffer::new();
    for instruction in instructions {
        instruction.encode_into(&mut buf)?;
    }
    Ok(buf.into_bytes())
}

/// Decode a byte stream into instruction records plus the offset map.
///
/// The offset map sends the byte offset of every instruction to its index in
/// the decoded list, and additionally maps the stream's end offset to the
/// instruction count, so addresses pointing one past a region translate too.
pub fn decode(bytes: &[u8]) -> Result<(Vec<Instruction>, HashMap<usize, usize>)> {
    let mut reader = Reader::new(bytes);
    let mut instructions = Vec::new();
    let mut offsets = HashMap::new();

    while !reader.at_end() {
        offsets.insert(reader.offset(), instructions.len());
        instructions.push(reader.read_instruction()?);
    }
    offsets.insert(bytes.len(), instructions.len());

    Ok((instructions, offsets))
}

/// Count the instructions in a byte window.
///
/// Used for jump patching: the window spanned by a forward jump is decoded
/// with the same framing rules as [`decode`], so the width table cannot
/// drift from the decoder.
pub fn instruction_count(bytes: &[u8]) -> Result<usize> {
    let mut reader = Reader::new(bytes);
    let mut count = 0;
    while !reader.at_end() {
        reader.read_instruction()?;
        count += 1;
    }
    Ok(count)
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn offset(&self) -> usize {
        self.pos
    }

    fn read_instruction(&mut self) -> Result<Instruction> {
        let offset = self.pos;
        let byte = self.bytes[self.pos];
        self.pos += 1;
        let op = Op::from_byte(byte).ok_or(BytecodeError::UnknownOpcode { byte, offset })?;
        let name = op.mnemonic();

        let operands = match op {
            Op::Add
            | Op::Sub
            | Op::Mul
            | Op::Div
            | Op::Grt
            | Op::Less
            | Op::Eq
            | Op::Neq
            | Op::If
            | Op::Else
            | Op::EndIf
            | Op::Print
            | Op::Return => Vec::new(),

            Op::PushNumber => vec![Operand::Num(self.read_f64(name)?)],
            Op::PushBool => vec![Operand::Bool(self.read_bool(name)?)],
            Op::PushString | Op::PushVariable | Op::DefineVariable | Op::CallFunction => {
                vec![Operand::Str(self.read_str(name)?)]
            }

            Op::Jump | Op::CallLambda | Op::Map | Op::Filter => {
                vec![Operand::Int(self.read_u32(name)?)]
            }

            Op::DefineFunction => {
                let fn_name = self.read_str(name)?;
                let start = self.read_u32(name)?;
                let param_count = self.read_u32(name)?;
                let params = self.read_names(name)?;
                if params.len() as u32 != param_count {
                    return Err(BytecodeError::CountMismatch {
                        op: name,
                        declared: param_count,
                        actual: params.len() as u32,
                    });
                }
                vec![
                    Operand::Str(fn_name),
                    Operand::Int(start),
                    Operand::Int(param_count),
                    Operand::Names(params),
                ]
            }

            Op::CreateLambda => {
                let start = self.read_u32(name)?;
                let end = self.read_u32(name)?;
                let param_count = self.read_u32(name)?;
                let params = self.read_names(name)?;
                if params.len() as u32 != param_count {
                    return Err(BytecodeError::CountMismatch {
                        op: name,
                        declared: param_count,
                        actual: params.len() as u32,
                    });
                }
                let captured_count = self.read_u32(name)?;
                let captured = self.read_names(name)?;
                if captured.len() as u32 != captured_count {
                    return Err(BytecodeError::CountMismatch {
                        op: name,
                        declared: captured_count,
                        actual: captured.len() as u32,
                    });
                }
                vec![
                    Operand::Int(start),
                    Operand::Int(end),
                    Operand::Int(param_count),
                    Operand::Names(params),
                    Operand::Int(captured_count),
                    Operand::Names(captured),
                ]
            }
        };

        Ok(Instruction { op, operands })
    }

    fn take(&mut self, n: usize, op: &'static str) -> Result<&'a [u8]> {
        if self.pos + n > self.bytes.len() {
            return Err(BytecodeError::UnexpectedEnd {
                op,
                offset: self.pos,
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u32(&mut self, op: &'static str) -> Result<u32> {
        let bytes = self.take(4, op)?;
        Ok(u32::from_le_bytes(bytes.try_into().unwrap()))
    }

    fn read_f64(&mut self, op: &'static str) -> Result<f64> {
        let bytes = self.take(8, op)?;
        Ok(f64::from_le_bytes(bytes.try_into().unwrap()))
    }

    fn read_bool(&mut self, op: &'static str) -> Result<bool> {
        Ok(self.take(1, op)?[0] != 0)
    }

    fn read_str(&mut self, op: &'static str) -> Result<String> {
        let len = self.read_u32(op)? as usize;
        let offset = self.pos;
        let bytes = self.take(len, op)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| BytecodeError::InvalidUtf8 { op, offset })
    }

    fn read_names(&mut self, op: &'static str) -> Result<Vec<String>> {
        let count = self.read_u32(op)? as usize;
        let mut names = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            names.push(self.read_str(op)?);
        }
        Ok(names)
    }
}
