//! The walker: traversal in evaluation order.
//!
//! The default rule is children first, left to right, then the
//! environment method for the node.  Four node kinds override it:
//!
//! * `If` evaluates its condition, then exactly one branch.
//! * `While` and `For` re-evaluate their condition every round, and also
//!   stop as soon as the frame's `returned` flag goes up: once a function
//!   has returned, control must leave its body, not spin on a stale
//!   condition value.
//! * `Call` evaluates the arguments, lets the environment set up the
//!   callee frame, walks the callee's body, and lets the environment tear
//!   the frame down again.
//!
//! Every entry point checks the `returned` flag first, which is what
//! makes `return` cut off the rest of the enclosing body.

use crate::front::{Expr, ExprId, Stmt, StmtId, TranslationUnit};

use super::env::Environment;
use super::io::Console;

/// Parse result in, observable I/O out: evaluate `main`.
pub fn run(ast: &TranslationUnit, console: &mut dyn Console) {
    Walker::new(ast, console).run();
}

pub struct Walker<'a> {
    ast: &'a TranslationUnit,
    env: Environment<'a>,
}

impl<'a> Walker<'a> {
    pub fn new(ast: &'a TranslationUnit, console: &'a mut dyn Console) -> Self {
        Walker {
            ast,
            env: Environment::new(ast, console),
        }
    }

    /// Initialize the environment and evaluate the body of `main`.
    pub fn run(&mut self) {
        self.env.init();
        let entry = self.env.entry();
        if let Some(body) = self.ast.fn_body(entry) {
            self.visit_stmt(body);
        }
    }

    fn visit_stmt(&mut self, id: StmtId) {
        if self.env.returned() {
            return;
        }
        let ast = self.ast;
        match ast.stmt(id) {
            Stmt::Compound(stmts) => {
                for &stmt in stmts {
                    self.visit_stmt(stmt);
                }
            }
            Stmt::Expr(expr) => self.visit_expr(*expr),
            Stmt::Decl(decls) => {
                // Initializers are evaluated before any declarator binds.
                for &decl in decls {
                    if let Some(init) = ast.var(decl).init {
                        self.visit_expr(init);
                    }
                }
                self.env.decl_stmt(id);
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.visit_expr(*cond);
                if self.env.cond_value(*cond) {
                    self.visit_stmt(*then_branch);
                } else if let Some(else_branch) = else_branch {
                    self.visit_stmt(*else_branch);
                }
            }
            Stmt::While { cond, body } => loop {
                if self.env.returned() {
                    break;
                }
                self.visit_expr(*cond);
                if !self.env.cond_value(*cond) {
                    break;
                }
                self.visit_stmt(*body);
            },
            Stmt::For {
                init,
                cond,
                inc,
                body,
            } => {
                if let Some(init) = init {
                    self.visit_stmt(*init);
                }
                loop {
                    if self.env.returned() {
                        break;
                    }
                    // An absent condition counts as true.
                    if let Some(cond) = cond {
                        self.visit_expr(*cond);
                        if !self.env.cond_value(*cond) {
                            break;
                        }
                    }
                    self.visit_stmt(*body);
                    if let Some(inc) = inc {
                        self.visit_expr(*inc);
                    }
                }
            }
            Stmt::Return(value) => {
                if let Some(value) = value {
                    self.visit_expr(*value);
                }
                self.env.ret(id);
            }
            Stmt::Empty => {}
        }
    }

    fn visit_expr(&mut self, id: ExprId) {
        if self.env.returned() {
            return;
        }
        let ast = self.ast;
        match ast.expr(id) {
            Expr::IntLit(_) => self.env.integer_literal(id),
            Expr::DeclRef(_) => self.env.decl_ref(id),
            Expr::SizeOf(_) => self.env.size_of(id),
            Expr::Paren(sub) => {
                self.visit_expr(*sub);
                self.env.paren(id);
            }
            Expr::Cast { sub, .. } => {
                self.visit_expr(*sub);
                self.env.cast(id);
            }
            Expr::Unary { sub, .. } => {
                self.visit_expr(*sub);
                self.env.unary_op(id);
            }
            Expr::Binary { lhs, rhs, .. } => {
                self.visit_expr(*lhs);
                self.visit_expr(*rhs);
                self.env.bin_op(id);
            }
            Expr::Index { base, index } => {
                self.visit_expr(*base);
                self.visit_expr(*index);
                self.env.index(id);
            }
            Expr::Call { callee, args } => {
                for &arg in args {
                    self.visit_expr(arg);
                }
                self.env.call(id);
                // Built-ins have no body and no frame to tear down;
                // `after_call` knows to leave them alone.
                if let Some(body) = ast.fn_body(*callee) {
                    self.visit_stmt(body);
                }
                self.env.after_call(id);
            }
        }
    }
}
