// gust-parser - Lexer for Gust
// Copyright (c) 2026 The Gust Authors. MIT licensed.

//! Lexer (tokeniser) for Gust source code.
//!
//! Converts a source string into a stream of tokens.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Delimiters
    LParen, // (
    RParen, // )

    // Punctuation
    Colon, // : in type annotations
    Arrow, // -> in lambdas and return types
    Comma, // , between parameters

    // Literals
    Number(f64),
    Bool(bool),
    /// Raw string literal, surrounding quotes included.
    Str(String),
    Ident(String),
    /// One of `+ - * / > < = ?`.
    Operator(String),

    // Special
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Colon => write!(f, ":"),
            Token::Arrow => write!(f, "->"),
            Token::Comma => write!(f, ","),
            Token::Number(n) => write!(f, "{}", n),
            Token::Bool(b) => write!(f, "{}", b),
            Token::Str(s) => write!(f, "{}", s),
            Token::Ident(s) => write!(f, "{}", s),
            Token::Operator(s) => write!(f, "{}", s),
            Token::Eof => write!(f, "EOF"),
        }
    }
}

/// Lexer error with position information.
#[derive(Debug, Clone)]
pub struct LexerError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for LexerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lexer error at {}:{}: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for LexerError {}

/// The lexer converts source code into tokens.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
    joined: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        Lexer {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
            joined: false,
        }
    }

    /// Current position, for error reporting.
    pub fn position(&self) -> (usize, usize) {
        (self.line, self.column)
    }

    /// Whether the most recent token directly followed its predecessor with
    /// no whitespace between them. `name(` is call syntax; `name (` is not.
    pub fn joined(&self) -> bool {
        self.joined
    }

    /// Get the next token from the source.
    pub fn next_token(&mut self) -> Result<Token, LexerError> {
        let skipped = self.skip_whitespace_and_comments();
        self.joined = !skipped;

        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        match c {
            '(' => {
                self.advance();
                Ok(Token::LParen)
            }
            ')' => {
                self.advance();
                Ok(Token::RParen)
            }
            ':' => {
                self.advance();
                Ok(Token::Colon)
            }
            ',' => {
                self.advance();
                Ok(Token::Comma)
            }
            '\'' => self.read_string(),
            '-' => {
                self.advance();
                match self.peek() {
                    Some('>') => {
                        self.advance();
                        Ok(Token::Arrow)
                    }
                    // A minus directly followed by a digit is a negative
                    // number literal; with anything else it is the operator.
                    Some(d) if d.is_ascii_digit() => self.read_number(true),
                    _ => Ok(Token::Operator("-".to_string())),
                }
            }
            '+' | '*' | '/' | '>' | '<' | '=' | '?' => {
                self.advance();
                Ok(Token::Operator(c.to_string()))
            }
            c if c.is_ascii_digit() => self.read_number(false),
            c if c.is_alphabetic() || c == '_' => Ok(self.read_identifier()),
            c => {
                let err = self.error(format!("unexpected character '{}'", c));
                self.advance();
                Err(err)
            }
        }
    }

    /// Tokenise the whole input, for callers that want the full stream.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next();
        match c {
            Some('\n') => {
                self.line += 1;
                self.column = 1;
            }
            Some(_) => self.column += 1,
            None => {}
        }
        c
    }

    fn error(&self, message: String) -> LexerError {
        LexerError {
            message,
            line: self.line,
            column: self.column,
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> bool {
        let mut skipped = false;
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                    skipped = true;
                }
                Some(';') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                    skipped = true;
                }
                _ => break,
            }
        }
        skipped
    }

    /// Read a single-quoted string literal. The surrounding quotes are kept
    /// in the token; the compiler strips them when the literal is emitted.
    fn read_string(&mut self) -> Result<Token, LexerError> {
        let mut raw = String::new();
        raw.push(self.advance().unwrap()); // opening quote

        loop {
            match self.advance() {
                Some('\'') => {
                    raw.push('\'');
                    return Ok(Token::Str(raw));
                }
                Some(c) => raw.push(c),
                None => return Err(self.error("unterminated string literal".to_string())),
            }
        }
    }

    fn read_number(&mut self, negative: bool) -> Result<Token, LexerError> {
        let mut text = String::new();
        if negative {
            text.push('-');
        }

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if self.peek() == Some('.') {
            text.push('.');
            self.advance();
            let mut saw_digit = false;
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.advance();
                    saw_digit = true;
                } else {
                    break;
                }
            }
            if !saw_digit {
                return Err(self.error(format!("malformed number literal '{}'", text)));
            }
        }

        text.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| self.error(format!("malformed number literal '{}'", text)))
    }

    fn read_identifier(&mut self) -> Token {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }

        match name.as_str() {
            "true" => Token::Bool(true),
            "false" => Token::Bool(false),
            _ => Token::Ident(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<Token> {
        Lexer::new(src).tokenize().expect("lex error")
    }

    #[test]
    fn lexes_let_form() {
        assert_eq!(
            lex("(let x:int 3)"),
            vec![
                Token::LParen,
                Token::Ident("let".into()),
                Token::Ident("x".into()),
                Token::Colon,
                Token::Ident("int".into()),
                Token::Number(3.0),
                Token::RParen,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn minus_disambiguation() {
        assert_eq!(
            lex("-2 - ->"),
            vec![
                Token::Number(-2.0),
                Token::Operator("-".into()),
                Token::Arrow,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn strings_keep_quotes() {
        assert_eq!(
            lex("'x equals -2'"),
            vec![Token::Str("'x equals -2'".into()), Token::Eof]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            lex("1 ; the rest is ignored\n2"),
            vec![Token::Number(1.0), Token::Number(2.0), Token::Eof]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(Lexer::new("'oops").tokenize().is_err());
    }
}
