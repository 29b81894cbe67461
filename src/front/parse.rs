//! The parser.
//!
//! A recursive-descent parser for the supported C subset.  It produces a
//! [TranslationUnit] whose variable uses and calls are already resolved:
//! names are looked up in a scope stack while parsing, so the interpreter
//! never sees an identifier, only declaration handles.
//!
//! The built-ins `get`, `print`, `malloc`, and `free` are registered as
//! body-less function declarations before parsing starts.  A prototype or
//! definition for an already-registered function merges into the existing
//! declaration instead of creating a second one, so a pasted
//! `extern int get();` resolves to the same identity as the built-in.

use std::fmt::Debug;

use derive_more::derive::Display;

use super::ast::*;
use super::lex::*;
use crate::common::{id, Id, Map};

#[derive(Display)]
#[display("Parse error: {}", self.0)]
pub struct ParseError(String);

impl Debug for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

pub fn parse(input: &str) -> Result<TranslationUnit, ParseError> {
    let tokens = Lexer::new(input)
        .tokens()
        .map_err(|e| ParseError(e.to_string()))?;
    Parser::new(tokens).translation_unit()
}

struct Parser<'src> {
    tokens: Vec<Token<'src>>,
    pos: usize,
    unit: TranslationUnit,
    /// Innermost scope last.  The global scope is index 0.
    scopes: Vec<Map<Id, DeclId>>,
}

impl<'src> Parser<'src> {
    fn new(tokens: Vec<Token<'src>>) -> Self {
        let mut parser = Parser {
            tokens,
            pos: 0,
            unit: TranslationUnit::default(),
            scopes: vec![Map::new()],
        };
        for (name, ret) in [
            ("get", Ty::Int),
            ("print", Ty::Void),
            ("malloc", Ty::Ptr),
            ("free", Ty::Void),
        ] {
            let decl = parser.unit.add_decl(Decl::Fn(FnDecl {
                name: id(name),
                ret,
                params: vec![],
                body: None,
            }));
            parser.scopes[0].insert(id(name), decl);
            parser.unit.top_level.push(decl);
        }
        parser
    }

    // ----- token plumbing -----

    fn peek(&self) -> Option<&Token<'src>> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn bump(&mut self) -> Result<Token<'src>, ParseError> {
        let token = self
            .peek()
            .copied()
            .ok_or_else(|| ParseError("unexpected end of input".to_owned()))?;
        self.pos += 1;
        Ok(token)
    }

    /// Consume the next token if it has the given kind.
    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'src>, ParseError> {
        match self.peek() {
            Some(t) if t.kind == kind => self.bump(),
            Some(t) => Err(ParseError(format!("expected '{kind}', found {t}"))),
            None => Err(ParseError(format!(
                "expected '{kind}', found end of input"
            ))),
        }
    }

    // ----- scopes -----

    fn push_scope(&mut self) {
        self.scopes.push(Map::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn define(&mut self, name: Id, decl: DeclId) {
        self.scopes
            .last_mut()
            .expect("scope stack is never empty")
            .insert(name, decl);
    }

    fn lookup(&self, name: Id) -> Result<DeclId, ParseError> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(&name))
            .copied()
            .ok_or_else(|| ParseError(format!("unknown identifier '{name}'")))
    }

    // ----- declarations -----

    fn translation_unit(mut self) -> Result<TranslationUnit, ParseError> {
        while self.peek().is_some() {
            self.external_decl()?;
        }
        Ok(self.unit)
    }

    /// A top-level function definition, function prototype, or variable
    /// declaration.  A leading `extern` is accepted and ignored.
    fn external_decl(&mut self) -> Result<(), ParseError> {
        self.eat(TokenKind::KwExtern);
        let base = self.type_spec()?;
        let ty = self.pointer_suffix(base);
        let name = self.ident()?;

        if self.at(TokenKind::LParen) {
            return self.function(ty, name);
        }

        // First declarator of a global variable list.
        let decl = self.var_declarator(ty, name, true)?;
        self.unit.top_level.push(decl);
        while self.eat(TokenKind::Comma) {
            let ty = self.pointer_suffix(base);
            let name = self.ident()?;
            let decl = self.var_declarator(ty, name, true)?;
            self.unit.top_level.push(decl);
        }
        self.expect(TokenKind::Semi)?;
        Ok(())
    }

    /// `int` or `void`, the only base types in the subset.
    fn type_spec(&mut self) -> Result<Ty, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::KwInt) => {
                self.pos += 1;
                Ok(Ty::Int)
            }
            Some(TokenKind::KwVoid) => {
                self.pos += 1;
                Ok(Ty::Void)
            }
            _ => Err(ParseError(format!(
                "expected a type, found {}",
                self.describe_next()
            ))),
        }
    }

    /// Apply `*`s to a base type.  Multiple indirections collapse into the
    /// single pointer classification the evaluator uses.
    fn pointer_suffix(&mut self, base: Ty) -> Ty {
        let mut ty = base;
        while self.eat(TokenKind::Star) {
            ty = Ty::Ptr;
        }
        ty
    }

    fn ident(&mut self) -> Result<Id, ParseError> {
        let token = self.expect(TokenKind::Id)?;
        Ok(id(token.text))
    }

    /// The part of a variable declaration after its name: an optional
    /// `[N]` suffix or `= initializer`.  Defines the name in the current
    /// scope and returns the new declaration.
    fn var_declarator(
        &mut self,
        ty: Ty,
        name: Id,
        global: bool,
    ) -> Result<DeclId, ParseError> {
        let ty = if self.eat(TokenKind::LBracket) {
            let len = self.int_literal()?;
            self.expect(TokenKind::RBracket)?;
            Ty::Array(len)
        } else {
            ty
        };

        let init = if self.eat(TokenKind::Eq) {
            if matches!(ty, Ty::Array(_)) {
                return Err(ParseError(format!(
                    "array '{name}' cannot have an initializer"
                )));
            }
            Some(self.assignment()?)
        } else {
            None
        };

        if ty == Ty::Void {
            return Err(ParseError(format!("variable '{name}' has type void")));
        }

        let decl = self.unit.add_decl(Decl::Var(VarDecl { name, ty, init }));
        let scope = if global { 0 } else { self.scopes.len() - 1 };
        self.scopes[scope].insert(name, decl);
        Ok(decl)
    }

    fn int_literal(&mut self) -> Result<i64, ParseError> {
        let token = self.expect(TokenKind::Num)?;
        token
            .text
            .parse()
            .map_err(|_| ParseError(format!("integer literal '{}' out of range", token.text)))
    }

    /// A function prototype or definition.  The name is registered before
    /// the body is parsed so recursive calls resolve.  Declarations of the
    /// same name merge into one: a definition fills in the body of an
    /// earlier prototype, and a prototype repeated after the definition is
    /// a no-op.  Only a second *body* is an error.
    fn function(&mut self, ret: Ty, name: Id) -> Result<(), ParseError> {
        let decl = match self.scopes[0].get(&name) {
            Some(&existing) => match self.unit.decl(existing) {
                Decl::Fn(_) => existing,
                Decl::Var(_) => {
                    return Err(ParseError(format!(
                        "'{name}' is already declared as a variable"
                    )))
                }
            },
            None => {
                let decl = self.unit.add_decl(Decl::Fn(FnDecl {
                    name,
                    ret,
                    params: vec![],
                    body: None,
                }));
                self.scopes[0].insert(name, decl);
                self.unit.top_level.push(decl);
                decl
            }
        };

        self.push_scope();
        let params = self.param_list()?;

        let body = if self.eat(TokenKind::Semi) {
            None // prototype
        } else {
            Some(self.compound_stmt()?)
        };
        self.pop_scope();

        if let Decl::Fn(f) = &mut self.unit.decls[decl.0] {
            if body.is_some() {
                if f.body.is_some() {
                    return Err(ParseError(format!("function '{name}' is defined twice")));
                }
                // The definition's named parameters are the ones calls
                // bind; they replace whatever a prototype declared.
                f.params = params;
                f.body = body;
            } else if f.body.is_none() && f.params.is_empty() {
                f.params = params;
            }
        }
        Ok(())
    }

    /// `( )`, `( void )`, or a comma-separated list of value parameters.
    /// Prototypes may leave parameters unnamed, e.g. `void print(int);`.
    fn param_list(&mut self) -> Result<Vec<DeclId>, ParseError> {
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if self.eat(TokenKind::RParen) {
            return Ok(params);
        }
        if self.at(TokenKind::KwVoid)
            && self.tokens.get(self.pos + 1).map(|t| t.kind) == Some(TokenKind::RParen)
        {
            self.pos += 2;
            return Ok(params);
        }
        loop {
            let base = self.type_spec()?;
            let ty = self.pointer_suffix(base);
            let name = if self.at(TokenKind::Id) {
                Some(self.ident()?)
            } else {
                None
            };
            if ty == Ty::Void {
                return Err(ParseError("parameter has type void".to_owned()));
            }
            // An unnamed parameter still occupies its slot in the list,
            // but there is no name to bind in the scope.
            let decl = self.unit.add_decl(Decl::Var(VarDecl {
                name: name.unwrap_or_else(|| id("")),
                ty,
                init: None,
            }));
            if let Some(name) = name {
                self.define(name, decl);
            }
            params.push(decl);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(params)
    }

    // ----- statements -----

    fn compound_stmt(&mut self) -> Result<StmtId, ParseError> {
        self.expect(TokenKind::LBrace)?;
        self.push_scope();
        let mut stmts = Vec::new();
        while !self.at(TokenKind::RBrace) {
            stmts.push(self.stmt()?);
        }
        self.expect(TokenKind::RBrace)?;
        self.pop_scope();
        Ok(self.unit.add_stmt(Stmt::Compound(stmts)))
    }

    fn stmt(&mut self) -> Result<StmtId, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::LBrace) => self.compound_stmt(),
            Some(TokenKind::KwIf) => self.if_stmt(),
            Some(TokenKind::KwWhile) => self.while_stmt(),
            Some(TokenKind::KwFor) => self.for_stmt(),
            Some(TokenKind::KwReturn) => self.return_stmt(),
            Some(TokenKind::KwInt) => self.decl_stmt(),
            Some(TokenKind::Semi) => {
                self.pos += 1;
                Ok(self.unit.add_stmt(Stmt::Empty))
            }
            Some(_) => {
                let expr = self.expr()?;
                self.expect(TokenKind::Semi)?;
                Ok(self.unit.add_stmt(Stmt::Expr(expr)))
            }
            None => Err(ParseError(
                "expected a statement, found end of input".to_owned(),
            )),
        }
    }

    /// A local declaration statement, e.g. `int a = 3, b, C[4];`.
    fn decl_stmt(&mut self) -> Result<StmtId, ParseError> {
        let base = self.type_spec()?;
        let mut decls = Vec::new();
        loop {
            let ty = self.pointer_suffix(base);
            let name = self.ident()?;
            decls.push(self.var_declarator(ty, name, false)?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::Semi)?;
        Ok(self.unit.add_stmt(Stmt::Decl(decls)))
    }

    fn if_stmt(&mut self) -> Result<StmtId, ParseError> {
        self.expect(TokenKind::KwIf)?;
        self.expect(TokenKind::LParen)?;
        let cond = self.expr()?;
        self.expect(TokenKind::RParen)?;
        let then_branch = self.stmt()?;
        let else_branch = if self.eat(TokenKind::KwElse) {
            Some(self.stmt()?)
        } else {
            None
        };
        Ok(self.unit.add_stmt(Stmt::If {
            cond,
            then_branch,
            else_branch,
        }))
    }

    fn while_stmt(&mut self) -> Result<StmtId, ParseError> {
        self.expect(TokenKind::KwWhile)?;
        self.expect(TokenKind::LParen)?;
        let cond = self.expr()?;
        self.expect(TokenKind::RParen)?;
        let body = self.stmt()?;
        Ok(self.unit.add_stmt(Stmt::While { cond, body }))
    }

    /// `for (init; cond; inc) body` with every clause optional.
    fn for_stmt(&mut self) -> Result<StmtId, ParseError> {
        self.expect(TokenKind::KwFor)?;
        self.expect(TokenKind::LParen)?;
        let init = if self.eat(TokenKind::Semi) {
            None
        } else {
            let expr = self.expr()?;
            self.expect(TokenKind::Semi)?;
            Some(self.unit.add_stmt(Stmt::Expr(expr)))
        };
        let cond = if self.at(TokenKind::Semi) {
            None
        } else {
            Some(self.expr()?)
        };
        self.expect(TokenKind::Semi)?;
        let inc = if self.at(TokenKind::RParen) {
            None
        } else {
            Some(self.expr()?)
        };
        self.expect(TokenKind::RParen)?;
        let body = self.stmt()?;
        Ok(self.unit.add_stmt(Stmt::For {
            init,
            cond,
            inc,
            body,
        }))
    }

    fn return_stmt(&mut self) -> Result<StmtId, ParseError> {
        self.expect(TokenKind::KwReturn)?;
        let value = if self.at(TokenKind::Semi) {
            None
        } else {
            Some(self.expr()?)
        };
        self.expect(TokenKind::Semi)?;
        Ok(self.unit.add_stmt(Stmt::Return(value)))
    }

    // ----- expressions, by descending precedence -----

    fn expr(&mut self) -> Result<ExprId, ParseError> {
        self.assignment()
    }

    /// Right-associative, so `a = b = c` parses as `a = (b = c)`.
    fn assignment(&mut self) -> Result<ExprId, ParseError> {
        let lhs = self.logical_or()?;
        if self.eat(TokenKind::Eq) {
            let rhs = self.assignment()?;
            return Ok(self.unit.add_expr(Expr::Binary {
                op: BinOp::Assign,
                lhs,
                rhs,
            }));
        }
        Ok(lhs)
    }

    fn logical_or(&mut self) -> Result<ExprId, ParseError> {
        let mut lhs = self.logical_and()?;
        while self.eat(TokenKind::OrOr) {
            let rhs = self.logical_and()?;
            lhs = self.unit.add_expr(Expr::Binary {
                op: BinOp::Or,
                lhs,
                rhs,
            });
        }
        Ok(lhs)
    }

    fn logical_and(&mut self) -> Result<ExprId, ParseError> {
        let mut lhs = self.equality()?;
        while self.eat(TokenKind::AndAnd) {
            let rhs = self.equality()?;
            lhs = self.unit.add_expr(Expr::Binary {
                op: BinOp::And,
                lhs,
                rhs,
            });
        }
        Ok(lhs)
    }

    fn equality(&mut self) -> Result<ExprId, ParseError> {
        let mut lhs = self.relational()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::EqEq) => BinOp::Eq,
                Some(TokenKind::BangEq) => BinOp::Ne,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.relational()?;
            lhs = self.unit.add_expr(Expr::Binary { op, lhs, rhs });
        }
    }

    fn relational(&mut self) -> Result<ExprId, ParseError> {
        let mut lhs = self.additive()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Lt) => BinOp::Lt,
                Some(TokenKind::Gt) => BinOp::Gt,
                Some(TokenKind::LtEq) => BinOp::Le,
                Some(TokenKind::GtEq) => BinOp::Ge,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.additive()?;
            lhs = self.unit.add_expr(Expr::Binary { op, lhs, rhs });
        }
    }

    fn additive(&mut self) -> Result<ExprId, ParseError> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinOp::Add,
                Some(TokenKind::Minus) => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.multiplicative()?;
            lhs = self.unit.add_expr(Expr::Binary { op, lhs, rhs });
        }
    }

    fn multiplicative(&mut self) -> Result<ExprId, ParseError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinOp::Mul,
                Some(TokenKind::Slash) => BinOp::Div,
                Some(TokenKind::Percent) => BinOp::Rem,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = self.unit.add_expr(Expr::Binary { op, lhs, rhs });
        }
    }

    fn unary(&mut self) -> Result<ExprId, ParseError> {
        let op = match self.peek_kind() {
            Some(TokenKind::Plus) => Some(UnOp::Plus),
            Some(TokenKind::Minus) => Some(UnOp::Minus),
            Some(TokenKind::Bang) => Some(UnOp::Not),
            Some(TokenKind::Star) => Some(UnOp::Deref),
            Some(TokenKind::Amp) => Some(UnOp::AddrOf),
            Some(TokenKind::PlusPlus) => Some(UnOp::PreInc),
            Some(TokenKind::MinusMinus) => Some(UnOp::PreDec),
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            let sub = self.unary()?;
            return Ok(self.unit.add_expr(Expr::Unary { op, sub }));
        }

        // `(int)`/`(int *)` here is a cast, anything else parenthesized is
        // handled by `primary`.
        if self.at(TokenKind::LParen) && self.is_type_token(self.pos + 1) {
            self.pos += 1;
            let base = self.type_spec()?;
            let ty = self.pointer_suffix(base);
            self.expect(TokenKind::RParen)?;
            let sub = self.unary()?;
            return Ok(self.unit.add_expr(Expr::Cast { ty, sub }));
        }

        if self.at(TokenKind::KwSizeof) {
            return self.sizeof_expr();
        }

        self.postfix()
    }

    fn is_type_token(&self, pos: usize) -> bool {
        matches!(
            self.tokens.get(pos).map(|t| t.kind),
            Some(TokenKind::KwInt) | Some(TokenKind::KwVoid)
        )
    }

    /// `sizeof(type)`.  Applying `sizeof` to an expression is not part of
    /// the subset and is rejected while parsing.
    fn sizeof_expr(&mut self) -> Result<ExprId, ParseError> {
        self.expect(TokenKind::KwSizeof)?;
        self.expect(TokenKind::LParen)?;
        if !self.is_type_token(self.pos) {
            return Err(ParseError(
                "sizeof is only supported on a parenthesized type".to_owned(),
            ));
        }
        let base = self.type_spec()?;
        let ty = self.pointer_suffix(base);
        self.expect(TokenKind::RParen)?;
        Ok(self.unit.add_expr(Expr::SizeOf(ty)))
    }

    fn postfix(&mut self) -> Result<ExprId, ParseError> {
        let mut expr = self.primary()?;
        loop {
            match self.peek_kind() {
                Some(TokenKind::LBracket) => {
                    self.pos += 1;
                    let index = self.expr()?;
                    self.expect(TokenKind::RBracket)?;
                    expr = self.unit.add_expr(Expr::Index { base: expr, index });
                }
                Some(TokenKind::PlusPlus) => {
                    self.pos += 1;
                    expr = self.unit.add_expr(Expr::Unary {
                        op: UnOp::PostInc,
                        sub: expr,
                    });
                }
                Some(TokenKind::MinusMinus) => {
                    self.pos += 1;
                    expr = self.unit.add_expr(Expr::Unary {
                        op: UnOp::PostDec,
                        sub: expr,
                    });
                }
                _ => return Ok(expr),
            }
        }
    }

    fn primary(&mut self) -> Result<ExprId, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::Num) => {
                let value = self.int_literal()?;
                Ok(self.unit.add_expr(Expr::IntLit(value)))
            }
            Some(TokenKind::Id) => {
                let name = self.ident()?;
                let decl = self.lookup(name)?;
                if self.at(TokenKind::LParen) {
                    if !matches!(self.unit.decl(decl), Decl::Fn(_)) {
                        return Err(ParseError(format!("'{name}' is not a function")));
                    }
                    let args = self.arg_list()?;
                    return Ok(self.unit.add_expr(Expr::Call { callee: decl, args }));
                }
                if !matches!(self.unit.decl(decl), Decl::Var(_)) {
                    return Err(ParseError(format!(
                        "function '{name}' used without a call"
                    )));
                }
                Ok(self.unit.add_expr(Expr::DeclRef(decl)))
            }
            Some(TokenKind::LParen) => {
                self.pos += 1;
                let sub = self.expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(self.unit.add_expr(Expr::Paren(sub)))
            }
            _ => Err(ParseError(format!(
                "expected an expression, found {}",
                self.describe_next()
            ))),
        }
    }

    fn arg_list(&mut self) -> Result<Vec<ExprId>, ParseError> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if self.eat(TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.assignment()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    fn describe_next(&self) -> String {
        match self.peek() {
            Some(t) => t.to_string(),
            None => "end of input".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_variable_uses_to_their_declarations() {
        let unit = parse("int g; int main() { g = 1; return g; }").unwrap();
        let g = unit
            .top_level
            .iter()
            .copied()
            .find(|&d| matches!(unit.decl(d), Decl::Var(v) if v.name == id("g")))
            .unwrap();
        let refs: Vec<_> = unit
            .exprs
            .iter()
            .filter(|e| matches!(e, Expr::DeclRef(d) if *d == g))
            .collect();
        assert_eq!(refs.len(), 2);
    }

    #[test]
    fn inner_scopes_shadow_outer_ones() {
        let unit = parse("int x; int main() { int x; x = 1; return 0; }").unwrap();
        // Three decls named x would be a resolution bug; the assignment
        // must target the local.
        let locals: Vec<_> = unit
            .decls
            .iter()
            .enumerate()
            .filter(|(_, d)| matches!(d, Decl::Var(v) if v.name == id("x")))
            .map(|(i, _)| DeclId(i))
            .collect();
        assert_eq!(locals.len(), 2);
        let assigned = unit
            .exprs
            .iter()
            .find_map(|e| match e {
                Expr::Binary {
                    op: BinOp::Assign,
                    lhs,
                    ..
                } => match unit.expr(*lhs) {
                    Expr::DeclRef(d) => Some(*d),
                    _ => None,
                },
                _ => None,
            })
            .unwrap();
        assert_eq!(assigned, locals[1]);
    }

    #[test]
    fn calls_resolve_to_the_builtin_identities() {
        let unit = parse("int main() { print(get()); return 0; }").unwrap();
        let callees: Vec<_> = unit
            .exprs
            .iter()
            .filter_map(|e| match e {
                Expr::Call { callee, .. } => match unit.decl(*callee) {
                    Decl::Fn(f) => Some(f.name),
                    _ => None,
                },
                _ => None,
            })
            .collect();
        assert!(callees.contains(&id("print")));
        assert!(callees.contains(&id("get")));
    }

    #[test]
    fn extern_prototypes_merge_with_builtins() {
        let unit = parse(
            "extern int get();\nextern void print(int);\nint main() { print(get()); return 0; }",
        )
        .unwrap();
        let gets: Vec<_> = unit
            .decls
            .iter()
            .filter(|d| matches!(d, Decl::Fn(f) if f.name == id("get")))
            .collect();
        assert_eq!(gets.len(), 1);
    }

    #[test]
    fn prototype_parameters_may_be_unnamed() {
        let unit = parse(
            "extern void print(int);
             extern void free(void *);
             int add(int, int);
             int add(int a, int b) { return a + b; }
             int main() { print(add(1, 2)); return 0; }",
        )
        .unwrap();
        // The definition's named parameters replace the prototype's
        // unnamed ones.
        let params = unit
            .decls
            .iter()
            .find_map(|d| match d {
                Decl::Fn(f) if f.name == id("add") => Some(&f.params),
                _ => None,
            })
            .unwrap();
        let names: Vec<_> = params.iter().map(|&p| unit.var(p).name).collect();
        assert_eq!(names, vec![id("a"), id("b")]);
    }

    #[test]
    fn a_prototype_after_the_definition_merges() {
        let unit = parse(
            "int f() { return 3; }
             int f();
             int main() { return f(); }",
        )
        .unwrap();
        let fs: Vec<_> = unit
            .decls
            .iter()
            .filter(|d| matches!(d, Decl::Fn(f) if f.name == id("f")))
            .collect();
        assert_eq!(fs.len(), 1);
        assert!(matches!(fs[0], Decl::Fn(f) if f.body.is_some()));
    }

    #[test]
    fn a_second_definition_is_rejected() {
        let err = parse(
            "int f() { return 0; }
             int f() { return 1; }
             int main() { return 0; }",
        )
        .unwrap_err();
        assert!(err.to_string().contains("defined twice"));
    }

    #[test]
    fn assignment_is_right_associative() {
        let unit = parse("int main() { int a, b, c; a = b = c; return 0; }").unwrap();
        let outer = unit
            .exprs
            .iter()
            .filter_map(|e| match e {
                Expr::Binary {
                    op: BinOp::Assign,
                    lhs,
                    rhs,
                } => Some((*lhs, *rhs)),
                _ => None,
            })
            .last()
            .unwrap();
        assert!(matches!(unit.expr(outer.0), Expr::DeclRef(_)));
        assert!(matches!(
            unit.expr(outer.1),
            Expr::Binary {
                op: BinOp::Assign,
                ..
            }
        ));
    }

    #[test]
    fn cast_and_paren_disambiguate() {
        let unit = parse("int main() { int* p; p = (int*)malloc(4); p = (p); return 0; }");
        let unit = unit.unwrap();
        assert!(unit
            .exprs
            .iter()
            .any(|e| matches!(e, Expr::Cast { ty: Ty::Ptr, .. })));
        assert!(unit.exprs.iter().any(|e| matches!(e, Expr::Paren(_))));
    }

    #[test]
    fn array_declarator_carries_its_length() {
        let unit = parse("int A[7]; int main() { return 0; }").unwrap();
        assert!(unit
            .decls
            .iter()
            .any(|d| matches!(d, Decl::Var(v) if v.ty == Ty::Array(7))));
    }

    #[test]
    fn dangling_else_binds_to_the_nearest_if() {
        let unit = parse(
            "int main() { int a; if (a) if (a) a = 1; else a = 2; return 0; }",
        )
        .unwrap();
        let (outer, inner) = {
            let mut ifs = unit.stmts.iter().filter_map(|s| match s {
                Stmt::If { else_branch, .. } => Some(else_branch.is_some()),
                _ => None,
            });
            let first = ifs.next().unwrap();
            let second = ifs.next().unwrap();
            (second, first)
        };
        assert!(inner, "inner if should own the else");
        assert!(!outer, "outer if should have no else");
    }

    #[test]
    fn unknown_identifier_is_an_error() {
        let err = parse("int main() { y = 1; return 0; }").unwrap_err();
        assert!(err.to_string().contains("unknown identifier 'y'"));
    }

    #[test]
    fn sizeof_of_an_expression_is_rejected() {
        assert!(parse("int main() { int a; return sizeof(a); }").is_err());
    }

    #[test]
    fn array_initializers_are_rejected() {
        assert!(parse("int main() { int A[2] = 0; return 0; }").is_err());
    }
}
