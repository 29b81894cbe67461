//! The environment: what each AST node means.
//!
//! The environment owns the call stack, the globals template, the heap,
//! and the resolved identities of the built-in functions.  It exposes one
//! method per node kind; the contract of every method is that the node's
//! children have already been evaluated into the top frame's expression
//! map (the walker guarantees the order), and the method computes this
//! node's value and records it there.
//!
//! Two protocols deserve spelling out:
//!
//! * **Calls.**  A user call clones the globals template, binds the
//!   parameters to the already-evaluated argument values, and pushes the
//!   clone.  `return e` delivers `e`'s value into the *caller's* frame
//!   under the call-site expression the caller most recently recorded as
//!   its `pc`, then raises the callee's `returned` flag.  [after_call]
//!   pops the callee, copies every popped binding whose key exists in the
//!   globals template back into it, and overlays the template onto the
//!   caller.  Built-ins never push, so they skip all of this.
//!
//! * **Assignment.**  The stored-to location comes from the syntactic
//!   shape of the left operand: a dereference stores through the heap (and
//!   mirrors into the variable binding when the address was made by `&x`),
//!   a subscript stores at base plus offset, and a plain name rebinds the
//!   declaration.  The assignment's own value is the right operand's, so
//!   `a = b = c` chains.
//!
//! [after_call]: Environment::after_call

use crate::common::id;
use crate::front::{BinOp, Decl, DeclId, Expr, ExprId, Stmt, StmtId, TranslationUnit, Ty, UnOp};

use super::frame::StackFrame;
use super::heap::Heap;
use super::io::Console;
use super::{Value, INT_SIZE, PTR_SIZE};

pub struct Environment<'a> {
    ast: &'a TranslationUnit,
    console: &'a mut dyn Console,
    /// Active frames, innermost last.  Never empty after [init].
    ///
    /// [init]: Environment::init
    stack: Vec<StackFrame>,
    /// The globals template: seeds every call frame and absorbs the
    /// callee's writes to globals on return.
    globals: StackFrame,
    heap: Heap,
    // Identities of the built-ins and of `main`, filled in by `init`.
    input: Option<DeclId>,
    output: Option<DeclId>,
    malloc: Option<DeclId>,
    free: Option<DeclId>,
    entry: Option<DeclId>,
}

impl<'a> Environment<'a> {
    pub fn new(ast: &'a TranslationUnit, console: &'a mut dyn Console) -> Self {
        Environment {
            ast,
            console,
            stack: Vec::new(),
            globals: StackFrame::new(),
            heap: Heap::new(),
            input: None,
            output: None,
            malloc: None,
            free: None,
            entry: None,
        }
    }

    /// Recognize the built-ins and `main`, seed the globals template, and
    /// push the frame `main`'s body will run in.
    ///
    /// Globals: an uninitialized scalar binds to 0, an array of `n` binds
    /// to the base of a fresh `n`-cell allocation, and a scalar with an
    /// integer-literal initializer binds to that value.  Anything else is
    /// outside the subset.
    pub fn init(&mut self) {
        let ast = self.ast;
        for &decl_id in &ast.top_level {
            match ast.decl(decl_id) {
                Decl::Fn(f) => {
                    if f.name == id("free") {
                        self.free = Some(decl_id);
                    } else if f.name == id("malloc") {
                        self.malloc = Some(decl_id);
                    } else if f.name == id("get") {
                        self.input = Some(decl_id);
                    } else if f.name == id("print") {
                        self.output = Some(decl_id);
                    } else if f.name == id("main") {
                        self.entry = Some(decl_id);
                    }
                }
                Decl::Var(v) => match (v.ty, v.init) {
                    (Ty::Array(n), _) => {
                        let base = self.heap.alloc(n);
                        self.globals.bind_decl(decl_id, base);
                    }
                    (_, Some(init)) => {
                        let Expr::IntLit(value) = *ast.expr(init) else {
                            panic!(
                                "global '{}' must be initialized with an integer literal",
                                v.name
                            )
                        };
                        self.globals.bind_decl(decl_id, value);
                    }
                    (_, None) => self.globals.bind_decl(decl_id, 0),
                },
            }
        }
        self.stack.push(self.globals.clone());
    }

    /// The `main` function.
    pub fn entry(&self) -> DeclId {
        self.entry.expect("program has no main function")
    }

    /// Has the current frame executed a `return`?
    pub fn returned(&self) -> bool {
        self.stack.last().is_some_and(StackFrame::returned)
    }

    /// The truth value of an already-evaluated condition.
    pub fn cond_value(&self, cond: ExprId) -> bool {
        self.top_ref().expr_val(cond) != 0
    }

    pub fn integer_literal(&mut self, id: ExprId) {
        let Expr::IntLit(value) = *self.ast.expr(id) else {
            panic!("not an integer literal: {id:?}")
        };
        self.top().bind_expr(id, value);
    }

    /// A use of a named variable: bind its current value.  The node is
    /// also recorded as the frame's `pc`, so that a call in argument
    /// position has a fresh marker to overwrite.
    pub fn decl_ref(&mut self, id: ExprId) {
        let Expr::DeclRef(decl) = *self.ast.expr(id) else {
            panic!("not a variable use: {id:?}")
        };
        let frame = self.top();
        frame.set_pc(id);
        let value = frame.decl_val(decl);
        frame.bind_expr(id, value);
    }

    pub fn paren(&mut self, id: ExprId) {
        let Expr::Paren(sub) = *self.ast.expr(id) else {
            panic!("not a parenthesized expression: {id:?}")
        };
        let frame = self.top();
        let value = frame.expr_val(sub);
        frame.bind_expr(id, value);
    }

    /// Every cast is a value-preserving transfer in the one-cell model.
    pub fn cast(&mut self, id: ExprId) {
        let Expr::Cast { sub, .. } = *self.ast.expr(id) else {
            panic!("not a cast: {id:?}")
        };
        let frame = self.top();
        frame.set_pc(id);
        let value = frame.expr_val(sub);
        frame.bind_expr(id, value);
    }

    pub fn size_of(&mut self, id: ExprId) {
        let Expr::SizeOf(ty) = *self.ast.expr(id) else {
            panic!("not a sizeof: {id:?}")
        };
        let size = match ty {
            Ty::Int => INT_SIZE,
            Ty::Ptr => PTR_SIZE,
            other => panic!("sizeof is not supported for type '{other}'"),
        };
        self.top().bind_expr(id, size);
    }

    pub fn unary_op(&mut self, id: ExprId) {
        let ast = self.ast;
        let Expr::Unary { op, sub } = *ast.expr(id) else {
            panic!("not a unary operator: {id:?}")
        };
        let val = self.top().expr_val(sub);

        use UnOp::*;
        match op {
            Plus => self.top().bind_expr(id, val),
            Minus => self.top().bind_expr(id, -val),
            Not => self.top().bind_expr(id, (val == 0) as Value),
            PreInc | PreDec | PostInc | PostDec => {
                let delta = if matches!(op, PreInc | PostInc) { 1 } else { -1 };
                // Prefix yields the updated value, postfix the original.
                let result = if matches!(op, PreInc | PreDec) {
                    val + delta
                } else {
                    val
                };
                self.top().bind_expr(id, result);
                if let Expr::DeclRef(decl) = *ast.expr(sub) {
                    self.top().bind_decl(decl, val + delta);
                }
            }
            Deref => {
                let value = self.heap.load(val);
                self.top().bind_expr(id, value);
            }
            AddrOf => {
                let addr = self.heap.address_of(sub, val);
                self.top().bind_expr(id, addr);
            }
        }
    }

    pub fn bin_op(&mut self, id: ExprId) {
        let ast = self.ast;
        let Expr::Binary { op, lhs, rhs } = *ast.expr(id) else {
            panic!("not a binary operator: {id:?}")
        };

        use BinOp::*;
        if op == Assign {
            let val = self.top().expr_val(rhs);
            match *ast.expr(lhs) {
                Expr::Unary {
                    op: UnOp::Deref,
                    sub,
                } => {
                    let addr = self.top().expr_val(sub);
                    self.heap.store(addr, val);
                    // If the address was made by `&x`, the binding of `x`
                    // must follow the cell.
                    if let Some(origin) = self.heap.back_ref(addr) {
                        if let Expr::DeclRef(decl) = *ast.expr(origin) {
                            self.top().bind_decl(decl, val);
                        }
                    }
                }
                Expr::Index { base, index } => {
                    let base = self.top().expr_val(base);
                    let offset = self.top().expr_val(index);
                    self.heap.store(base + offset, val);
                }
                Expr::DeclRef(decl) => self.top().bind_decl(decl, val),
                _ => panic!("unsupported assignment target"),
            }
            // The whole expression takes the assigned value, so chained
            // assignment works.
            self.top().bind_expr(id, val);
            return;
        }

        let a = self.top().expr_val(lhs);
        let b = self.top().expr_val(rhs);
        let result = match op {
            Add => a + b,
            Sub => a - b,
            Mul => a * b,
            Div => a / b,
            Rem => a % b,
            Lt => (a < b) as Value,
            Gt => (a > b) as Value,
            Le => (a <= b) as Value,
            Ge => (a >= b) as Value,
            Eq => (a == b) as Value,
            Ne => (a != b) as Value,
            // Both operands are already evaluated by the time we get
            // here, so these do not short-circuit.
            And => (a != 0 && b != 0) as Value,
            Or => (a != 0 || b != 0) as Value,
            Assign => unreachable!(),
        };
        self.top().bind_expr(id, result);
    }

    /// Array subscript `A[i]`: pointer arithmetic is in cell units, so the
    /// element lives at base plus index.
    pub fn index(&mut self, id: ExprId) {
        let Expr::Index { base, index } = *self.ast.expr(id) else {
            panic!("not an array subscript: {id:?}")
        };
        let base = self.top().expr_val(base);
        let offset = self.top().expr_val(index);
        let value = self.heap.load(base + offset);
        self.top().bind_expr(id, value);
    }

    /// A declaration statement.  Initializers were evaluated by the
    /// walker before any declarator binds, so an initializer cannot see a
    /// variable declared earlier in the same statement.
    pub fn decl_stmt(&mut self, id: StmtId) {
        let ast = self.ast;
        let Stmt::Decl(decls) = ast.stmt(id) else {
            panic!("not a declaration statement: {id:?}")
        };
        for &decl_id in decls {
            let var = ast.var(decl_id);
            match (var.ty, var.init) {
                (Ty::Array(n), _) => {
                    let base = self.heap.alloc(n);
                    self.top().bind_decl(decl_id, base);
                }
                (_, Some(init)) => {
                    let value = self.top().expr_val(init);
                    self.top().bind_decl(decl_id, value);
                }
                (_, None) => self.top().bind_decl(decl_id, 0),
            }
        }
    }

    /// Dispatch a call whose arguments are already evaluated.  Built-ins
    /// run right here; a user call pushes the callee's frame and leaves
    /// running the body to the walker.
    pub fn call(&mut self, id: ExprId) {
        let ast = self.ast;
        let Expr::Call { callee, args } = ast.expr(id) else {
            panic!("not a call: {id:?}")
        };
        let callee = *callee;
        self.top().set_pc(id);

        if self.input == Some(callee) {
            let value = self.console.read_int();
            self.top().bind_expr(id, value);
        } else if self.output == Some(callee) {
            let value = self.top().expr_val(args[0]);
            self.console.print_int(value);
        } else if self.malloc == Some(callee) {
            // The argument is in bytes; the heap is sized in cells.
            let bytes = self.top().expr_val(args[0]);
            let base = self.heap.alloc(bytes / INT_SIZE);
            self.top().bind_expr(id, base);
        } else if self.free == Some(callee) {
            let addr = self.top().expr_val(args[0]);
            self.heap.free(addr);
        } else {
            let Decl::Fn(f) = ast.decl(callee) else {
                panic!("call of a non-function declaration")
            };
            assert_eq!(
                f.params.len(),
                args.len(),
                "function '{}' called with {} arguments, expected {}",
                f.name,
                args.len(),
                f.params.len()
            );
            let mut frame = self.globals.clone();
            for (&param, &arg) in f.params.iter().zip(args) {
                let value = self.top().expr_val(arg);
                frame.bind_decl(param, value);
            }
            frame.set_returned(false);
            self.stack.push(frame);
        }
    }

    /// A `return` statement.  The value (if any) is delivered into the
    /// caller's frame under its recorded call site; the outermost frame
    /// has no caller, so its value is discarded.  Either way the frame is
    /// marked returned, which stops every later statement in it.
    pub fn ret(&mut self, id: StmtId) {
        let Stmt::Return(value) = *self.ast.stmt(id) else {
            panic!("not a return statement: {id:?}")
        };
        let value = value.map(|e| self.top().expr_val(e));
        let depth = self.stack.len();
        if depth >= 2 {
            if let Some(value) = value {
                let pc = self.stack[depth - 2]
                    .pc()
                    .expect("caller frame has no recorded call site");
                self.stack[depth - 2].bind_expr(pc, value);
            }
        }
        self.top().set_returned(true);
    }

    /// Tear down after a call: pop the callee, fold its writes to globals
    /// back into the template, and overlay the template onto the caller.
    /// Built-ins never pushed, so there is nothing to do for them.
    pub fn after_call(&mut self, id: ExprId) {
        let Expr::Call { callee, .. } = *self.ast.expr(id) else {
            panic!("not a call: {id:?}")
        };
        if self.is_builtin(callee) {
            return;
        }
        let callee_frame = self.stack.pop().expect("call stack underflow");
        for (decl, value) in callee_frame.vars() {
            if self.globals.has_decl(decl) {
                self.globals.bind_decl(decl, value);
            }
        }
        let caller = self.stack.last_mut().expect("call stack underflow");
        for (decl, value) in self.globals.vars() {
            caller.bind_decl(decl, value);
        }
    }

    fn is_builtin(&self, decl: DeclId) -> bool {
        let decl = Some(decl);
        decl == self.input || decl == self.output || decl == self.malloc || decl == self.free
    }

    fn top(&mut self) -> &mut StackFrame {
        self.stack.last_mut().expect("call stack is empty")
    }

    fn top_ref(&self) -> &StackFrame {
        self.stack.last().expect("call stack is empty")
    }
}
