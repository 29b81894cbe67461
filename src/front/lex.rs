//! The lexer.

use derive_more::Display;
use regex::Regex;

/// Tokens in the program
#[derive(Clone, Copy, PartialEq, Eq, Hash, Display, Debug)]
#[display("kind: '{kind}', part of input: '{text}'")]
pub struct Token<'src> {
    /// What token class this token belongs to.
    pub kind: TokenKind,
    /// What part of the input this token carries.
    pub text: &'src str,
}

/// Token classes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Display, Debug)]
pub enum TokenKind {
    #[display("id")]
    Id,
    #[display("num")]
    Num,
    #[display("int")]
    KwInt,
    #[display("void")]
    KwVoid,
    #[display("if")]
    KwIf,
    #[display("else")]
    KwElse,
    #[display("while")]
    KwWhile,
    #[display("for")]
    KwFor,
    #[display("return")]
    KwReturn,
    #[display("sizeof")]
    KwSizeof,
    #[display("extern")]
    KwExtern,
    #[display("(")]
    LParen,
    #[display(")")]
    RParen,
    #[display("{{")]
    LBrace,
    #[display("}}")]
    RBrace,
    #[display("[")]
    LBracket,
    #[display("]")]
    RBracket,
    #[display(";")]
    Semi,
    #[display(",")]
    Comma,
    #[display("++")]
    PlusPlus,
    #[display("--")]
    MinusMinus,
    #[display("&&")]
    AndAnd,
    #[display("||")]
    OrOr,
    #[display("==")]
    EqEq,
    #[display("!=")]
    BangEq,
    #[display("<=")]
    LtEq,
    #[display(">=")]
    GtEq,
    #[display("<")]
    Lt,
    #[display(">")]
    Gt,
    #[display("=")]
    Eq,
    #[display("+")]
    Plus,
    #[display("-")]
    Minus,
    #[display("*")]
    Star,
    #[display("/")]
    Slash,
    #[display("%")]
    Percent,
    #[display("&")]
    Amp,
    #[display("!")]
    Bang,
}

pub struct LexError(pub usize, pub char);

impl Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Lexer error: unexpected character {:?} at {}", self.1, self.0)
    }
}

impl std::fmt::Debug for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Lexer error: unexpected character {:?} at {}", self.1, self.0)
    }
}

pub struct Lexer<'input> {
    input: &'input str,
    pos: usize,
    whitespace: Regex,
    matchers: Vec<(Regex, TokenKind)>,
}

impl<'input> Lexer<'input> {
    pub fn new(input: &'input str) -> Self {
        use TokenKind::*;

        // Multi-character operators come before their single-character
        // prefixes so munching is maximal.
        let table: &[(&str, TokenKind)] = &[
            (r"\A[0-9]+", Num),
            (r"\A[A-Za-z_][A-Za-z0-9_]*", Id),
            (r"\A\+\+", PlusPlus),
            (r"\A--", MinusMinus),
            (r"\A&&", AndAnd),
            (r"\A\|\|", OrOr),
            (r"\A==", EqEq),
            (r"\A!=", BangEq),
            (r"\A<=", LtEq),
            (r"\A>=", GtEq),
            (r"\A<", Lt),
            (r"\A>", Gt),
            (r"\A=", Eq),
            (r"\A\+", Plus),
            (r"\A-", Minus),
            (r"\A\*", Star),
            (r"\A/", Slash),
            (r"\A%", Percent),
            (r"\A&", Amp),
            (r"\A!", Bang),
            (r"\A\(", LParen),
            (r"\A\)", RParen),
            (r"\A\{", LBrace),
            (r"\A\}", RBrace),
            (r"\A\[", LBracket),
            (r"\A\]", RBracket),
            (r"\A;", Semi),
            (r"\A,", Comma),
        ];

        Lexer {
            input,
            pos: 0,
            // The subset has no preprocessor; `#`-lines (like `#include
            // "sysfun.h"`) are skipped the same way comments are.
            whitespace: Regex::new(
                r"\A(?:[ \t\f\r\n\v]|(?://[^\n]*)|(?:/\*(?s:.)*?\*/)|(?:#[^\n]*))*",
            )
            .unwrap(),
            matchers: table
                .iter()
                .map(|(re, kind)| (Regex::new(re).unwrap(), *kind))
                .collect(),
        }
    }

    /// Has the lexer reached the end of input?
    pub fn end_of_input(&self) -> bool {
        self.pos == self.input.len()
    }

    // Skip comments, preprocessor lines, and whitespace
    fn skip_whitespace(&mut self) {
        if let Some(m) = self.whitespace.find(&self.input[self.pos..]) {
            self.pos += m.end()
        }
    }

    /// Get the next token if possible.
    ///
    /// The return type distinguishes between end-of-input and lexer error.
    pub fn next(&mut self) -> Result<Option<Token<'input>>, LexError> {
        self.skip_whitespace();
        if self.end_of_input() {
            return Ok(None);
        }

        let rest: &'input str = &self.input[self.pos..];
        for (re, kind) in &self.matchers {
            if let Some(m) = re.find(rest) {
                let text = &rest[..m.end()];
                self.pos += m.end();
                let kind = match *kind {
                    TokenKind::Id => keyword_kind(text),
                    other => other,
                };
                return Ok(Some(Token { kind, text }));
            }
        }

        Err(LexError(self.pos, rest.chars().next().unwrap()))
    }

    /// Lex the whole input eagerly.
    pub fn tokens(mut self) -> Result<Vec<Token<'input>>, LexError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next()? {
            tokens.push(token);
        }
        Ok(tokens)
    }
}

/// Promote an identifier to a keyword token where the text demands it.
fn keyword_kind(text: &str) -> TokenKind {
    use TokenKind::*;

    match text {
        "int" => KwInt,
        "void" => KwVoid,
        "if" => KwIf,
        "else" => KwElse,
        "while" => KwWhile,
        "for" => KwFor,
        "return" => KwReturn,
        "sizeof" => KwSizeof,
        "extern" => KwExtern,
        _ => Id,
    }
}

#[cfg(test)]
mod tests {
    use super::TokenKind::*;
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokens()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn operators_munch_maximally() {
        assert_eq!(kinds("a+++b"), vec![Id, PlusPlus, Plus, Id]);
        assert_eq!(kinds("a<=b==c"), vec![Id, LtEq, Id, EqEq, Id]);
        assert_eq!(kinds("p&&*q"), vec![Id, AndAnd, Star, Id]);
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("int mains = sizeof(int);"),
            vec![KwInt, Id, Eq, KwSizeof, LParen, KwInt, RParen, Semi]
        );
    }

    #[test]
    fn comments_and_preprocessor_lines_are_skipped() {
        let input = "#include \"sysfun.h\"\n// line\nint a; /* block\n spans */ int b;";
        assert_eq!(kinds(input), vec![KwInt, Id, Semi, KwInt, Id, Semi]);
    }

    #[test]
    fn unknown_character_is_reported_with_position() {
        let mut lexer = Lexer::new("int a @ b;");
        lexer.next().unwrap();
        lexer.next().unwrap();
        let err = lexer.next().unwrap_err();
        assert_eq!((err.0, err.1), (6, '@'));
    }
}
