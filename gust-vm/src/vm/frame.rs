// gust-vm - Bytecode compiler and virtual machine for the Gust programming language
// Copyright (c) 2026 The Gust Authors. MIT licensed.

//! Environment frames and call-stack entries.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

use super::error::{Result, RuntimeError};

/// A name→value environment frame.
///
/// Frames are shared: a lambda holds its captured frame alive after the
/// defining call has returned, so frames live behind `Rc` with interior
/// mutability for the binding map. Bindings themselves are immutable once
/// defined.
#[derive(Debug)]
pub struct Frame {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Frame>>,
}

impl Frame {
    /// Create a frame with the given parent.
    pub fn new(parent: Option<Rc<Frame>>) -> Rc<Frame> {
        Rc::new(Frame {
            bindings: RefCell::new(HashMap::new()),
            parent,
        })
    }

    /// Bind a name in this frame. Rebinding an existing name is an error;
    /// bindings are immutable after creation.
    pub fn define(&self, name: &str, value: Value) -> Result<()> {
        let mut bindings = self.bindings.borrow_mut();
        if bindings.contains_key(name) {
            return Err(RuntimeError::ImmutableRebinding(name.to_string()));
        }
        bindings.insert(name.to_string(), value);
        Ok(())
    }

    /// Look up a name in this frame only.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.bindings.borrow().get(name).cloned()
    }

    /// Look up a name in this frame and its parent chain.
    pub fn lookup_chain(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.lookup(name) {
            return Some(value);
        }
        let mut parent = self.parent.as_ref();
        while let Some(frame) = parent {
            if let Some(value) = frame.lookup(name) {
                return Some(value);
            }
            parent = frame.parent.as_ref();
        }
        None
    }
}

/// An entry on the VM's call stack.
#[derive(Debug)]
pub struct CallStackEntry {
    /// Instruction index to resume at after RETURN.
    pub return_address: usize,
    /// The frame that was current when the call was made.
    pub caller_frame: Rc<Frame>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebinding_in_one_frame_is_an_error() {
        let frame = Frame::new(None);
        frame.define("x", Value::Number(1.0)).unwrap();
        assert!(matches!(
            frame.define("x", Value::Number(2.0)),
            Err(RuntimeError::ImmutableRebinding(_))
        ));
    }

    #[test]
    fn shadowing_across_frames_is_allowed() {
        let outer = Frame::new(None);
        outer.define("x", Value::Number(1.0)).unwrap();
        let inner = Frame::new(Some(outer));
        inner.define("x", Value::Number(2.0)).unwrap();
        assert_eq!(inner.lookup_chain("x"), Some(Value::Number(2.0)));
    }

    #[test]
    fn chain_lookup_walks_to_the_root() {
        let root = Frame::new(None);
        root.define("g", Value::Bool(true)).unwrap();
        let middle = Frame::new(Some(root));
        let leaf = Frame::new(Some(middle));
        assert_eq!(leaf.lookup_chain("g"), Some(Value::Bool(true)));
        assert_eq!(leaf.lookup("g"), None);
    }
}
