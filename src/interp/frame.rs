//! Stack frames.
//!
//! One frame per active call, plus the globals template frame that seeds
//! every new call.  A frame stores values keyed by declaration handle (for
//! variables) and by expression handle (for cached evaluation results).
//! Both handle kinds index into the translation unit, which outlives every
//! frame, so frames never own AST nodes.

use crate::common::Map;
use crate::front::{DeclId, ExprId};

use super::Value;

#[derive(Clone, Default)]
pub struct StackFrame {
    /// Declaration handle to current value.
    vars: Map<DeclId, Value>,
    /// Expression handle to its most recent evaluation result.
    exprs: Map<ExprId, Value>,
    /// The most recent call-site expression in this frame.  A callee's
    /// `return` delivers its value under this node.
    pc: Option<ExprId>,
    /// Once set, no further statement in this frame executes.
    returned: bool,
}

impl StackFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_decl(&mut self, decl: DeclId, value: Value) {
        self.vars.insert(decl, value);
    }

    /// The value of a variable, which must already be bound.
    pub fn decl_val(&self, decl: DeclId) -> Value {
        *self
            .vars
            .get(&decl)
            .unwrap_or_else(|| panic!("unbound variable declaration {decl:?}"))
    }

    pub fn has_decl(&self, decl: DeclId) -> bool {
        self.vars.contains_key(&decl)
    }

    /// All variable bindings, for the globals merge on return.
    pub fn vars(&self) -> impl Iterator<Item = (DeclId, Value)> + '_ {
        self.vars.iter().map(|(&d, &v)| (d, v))
    }

    pub fn bind_expr(&mut self, expr: ExprId, value: Value) {
        self.exprs.insert(expr, value);
    }

    /// The cached value of an expression, which must already be evaluated.
    pub fn expr_val(&self, expr: ExprId) -> Value {
        *self
            .exprs
            .get(&expr)
            .unwrap_or_else(|| panic!("expression {expr:?} consumed before evaluation"))
    }

    pub fn set_pc(&mut self, expr: ExprId) {
        self.pc = Some(expr);
    }

    pub fn pc(&self) -> Option<ExprId> {
        self.pc
    }

    pub fn set_returned(&mut self, returned: bool) {
        self.returned = returned;
    }

    pub fn returned(&self) -> bool {
        self.returned
    }
}
