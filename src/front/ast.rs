//! The abstract syntax tree.
//!
//! Nodes live in flat arenas inside [TranslationUnit] and reference each
//! other through copyable index handles ([DeclId], [StmtId], [ExprId]).
//! The handles double as the stable node identities the interpreter keys
//! its per-frame value maps on: the tree outlives every stack frame, so a
//! frame only ever stores indices, never nodes.
//!
//! Name resolution happens in the parser; a [Expr::DeclRef] or
//! [Expr::Call] already carries the [DeclId] of the declaration it names.

use derive_more::Display;

use crate::common::Id;

/// Handle to a declaration in [TranslationUnit::decls].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct DeclId(pub usize);

/// Handle to a statement in [TranslationUnit::stmts].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct StmtId(pub usize);

/// Handle to an expression in [TranslationUnit::exprs].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ExprId(pub usize);

/// A parsed program: the node arenas plus the top-level declarations in
/// source order.
#[derive(Debug, Default)]
pub struct TranslationUnit {
    pub decls: Vec<Decl>,
    pub stmts: Vec<Stmt>,
    pub exprs: Vec<Expr>,
    /// Top-level declarations (functions and globals) in source order.
    pub top_level: Vec<DeclId>,
}

impl TranslationUnit {
    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id.0]
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.0]
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.0]
    }

    /// The variable behind a declaration handle.
    pub fn var(&self, id: DeclId) -> &VarDecl {
        match self.decl(id) {
            Decl::Var(v) => v,
            Decl::Fn(f) => panic!("declaration {} is a function, not a variable", f.name),
        }
    }

    /// The body of a function declaration, if it has one.  Built-ins and
    /// prototypes have none.
    pub fn fn_body(&self, id: DeclId) -> Option<StmtId> {
        match self.decl(id) {
            Decl::Fn(f) => f.body,
            Decl::Var(v) => panic!("declaration {} is a variable, not a function", v.name),
        }
    }

    pub fn add_decl(&mut self, decl: Decl) -> DeclId {
        self.decls.push(decl);
        DeclId(self.decls.len() - 1)
    }

    pub fn add_stmt(&mut self, stmt: Stmt) -> StmtId {
        self.stmts.push(stmt);
        StmtId(self.stmts.len() - 1)
    }

    pub fn add_expr(&mut self, expr: Expr) -> ExprId {
        self.exprs.push(expr);
        ExprId(self.exprs.len() - 1)
    }
}

/// The type of a declaration, reduced to what evaluation needs: a
/// classification into integer, pointer, and array, with the element count
/// carried on arrays.  All values occupy one cell, so element types are not
/// tracked.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display)]
pub enum Ty {
    #[display("int")]
    Int,
    #[display("void")]
    Void,
    #[display("int *")]
    Ptr,
    #[display("int [{_0}]")]
    Array(i64),
}

#[derive(Debug)]
pub enum Decl {
    Var(VarDecl),
    Fn(FnDecl),
}

#[derive(Debug)]
pub struct VarDecl {
    pub name: Id,
    pub ty: Ty,
    /// Initializer expression, already parsed but not evaluated.
    pub init: Option<ExprId>,
}

#[derive(Debug)]
pub struct FnDecl {
    pub name: Id,
    pub ret: Ty,
    /// Parameter declarations, in order.  Always `Decl::Var`s.
    pub params: Vec<DeclId>,
    /// `None` for prototypes and the built-ins.
    pub body: Option<StmtId>,
}

#[derive(Debug)]
pub enum Stmt {
    Compound(Vec<StmtId>),
    Expr(ExprId),
    /// One declaration statement may declare several variables.
    Decl(Vec<DeclId>),
    If {
        cond: ExprId,
        then_branch: StmtId,
        else_branch: Option<StmtId>,
    },
    While {
        cond: ExprId,
        body: StmtId,
    },
    For {
        init: Option<StmtId>,
        cond: Option<ExprId>,
        inc: Option<ExprId>,
        body: StmtId,
    },
    Return(Option<ExprId>),
    Empty,
}

#[derive(Debug)]
pub enum Expr {
    IntLit(i64),
    /// A use of a named variable, resolved to its declaration.
    DeclRef(DeclId),
    Paren(ExprId),
    Cast {
        ty: Ty,
        sub: ExprId,
    },
    Unary {
        op: UnOp,
        sub: ExprId,
    },
    Binary {
        op: BinOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    /// Array subscript `base[index]`.
    Index {
        base: ExprId,
        index: ExprId,
    },
    /// `sizeof(type)`.  `sizeof expr` is not part of the subset.
    SizeOf(Ty),
    /// A call with a directly named, resolved callee.
    Call {
        callee: DeclId,
        args: Vec<ExprId>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Display)]
pub enum UnOp {
    #[display("+")]
    Plus,
    #[display("-")]
    Minus,
    #[display("!")]
    Not,
    #[display("++")]
    PreInc,
    #[display("--")]
    PreDec,
    #[display("++")]
    PostInc,
    #[display("--")]
    PostDec,
    #[display("*")]
    Deref,
    #[display("&")]
    AddrOf,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Display)]
pub enum BinOp {
    #[display("=")]
    Assign,
    #[display("+")]
    Add,
    #[display("-")]
    Sub,
    #[display("*")]
    Mul,
    #[display("/")]
    Div,
    #[display("%")]
    Rem,
    #[display("<")]
    Lt,
    #[display(">")]
    Gt,
    #[display("<=")]
    Le,
    #[display(">=")]
    Ge,
    #[display("==")]
    Eq,
    #[display("!=")]
    Ne,
    #[display("&&")]
    And,
    #[display("||")]
    Or,
}
