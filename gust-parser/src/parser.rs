// gust-parser - Parser for Gust
// Copyright (c) 2026 The Gust Authors. MIT licensed.

//! Parser for Gust source code.
//!
//! Builds `Node` trees from the token stream. Reserved forms with dedicated
//! AST shapes (`def`, `if`, `ret`, `map`, `filter`, lambdas) are recognised
//! here; `let` and `print` stay generic composites and are interpreted by the
//! compiler.

use std::fmt;

use crate::ast::Node;
use crate::lexer::{Lexer, LexerError, Token};

/// Parse error with position information.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        ParseError {
            message: message.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parse error at {}:{}: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

impl From<LexerError> for ParseError {
    fn from(e: LexerError) -> Self {
        ParseError::new(e.message, e.line, e.column)
    }
}

/// Result type for parsing.
pub type Result<T> = std::result::Result<T, ParseError>;

struct SpannedToken {
    token: Token,
    line: usize,
    column: usize,
    /// No whitespace between this token and the one before it.
    joined: bool,
}

/// The parser turns a token stream into AST nodes.
pub struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    /// Create a parser for the given source, running the lexer up front.
    pub fn new(source: &str) -> Result<Self> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let (line, column) = lexer.position();
            let token = lexer.next_token()?;
            let done = token == Token::Eof;
            tokens.push(SpannedToken {
                token,
                line,
                column,
                joined: lexer.joined(),
            });
            if done {
                break;
            }
        }
        Ok(Parser { tokens, pos: 0 })
    }

    /// Parse a complete source string into its top-level forms.
    pub fn parse_str(source: &str) -> Result<Vec<Node>> {
        Parser::new(source)?.parse_program()
    }

    /// Parse every top-level form until end of input.
    pub fn parse_program(&mut self) -> Result<Vec<Node>> {
        let mut program = Vec::new();
        while *self.current() != Token::Eof {
            program.push(self.parse_expression()?);
        }
        Ok(program)
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos].token
    }

    /// Whether the current token is glued to the previous one.
    fn current_joined(&self) -> bool {
        self.tokens[self.pos].joined
    }

    fn position(&self) -> (usize, usize) {
        let spanned = &self.tokens[self.pos];
        (spanned.line, spanned.column)
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].token.clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        let (line, column) = self.position();
        ParseError::new(message, line, column)
    }

    fn expect_rparen(&mut self, context: &str) -> Result<()> {
        match self.current() {
            Token::RParen => {
                self.advance();
                Ok(())
            }
            other => Err(self.error(format!("expected ')' after {}, got '{}'", context, other))),
        }
    }

    fn expect_ident(&mut self, context: &str) -> Result<String> {
        match self.current().clone() {
            Token::Ident(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(self.error(format!("expected {}, got '{}'", context, other))),
        }
    }

    /// Parse a single expression starting at the current token.
    fn parse_expression(&mut self) -> Result<Node> {
        match self.current().clone() {
            Token::Number(n) => {
                self.advance();
                Ok(Node::Number(n))
            }
            Token::Bool(b) => {
                self.advance();
                Ok(Node::Boolean(b))
            }
            Token::Str(s) => {
                self.advance();
                Ok(Node::Str(s))
            }
            Token::Operator(op) => self.parse_operator_expr(op),
            Token::Ident(name) => {
                self.advance();
                match self.current() {
                    // `name:type` annotation
                    Token::Colon => {
                        self.advance();
                        let ty = self.expect_ident("type name after ':'")?;
                        Ok(Node::TypeAnnotation { name, ty })
                    }
                    // `name(args...)` call syntax: the paren must be glued to
                    // the name, and must not open a lambda. A spaced paren
                    // starts a sibling form in the enclosing composite.
                    Token::LParen if self.current_joined() && !self.lambda_follows() => {
                        self.advance();
                        let mut items = vec![Node::Identifier(name)];
                        while !matches!(self.current(), Token::RParen | Token::Eof) {
                            items.push(self.parse_expression()?);
                            if *self.current() == Token::Comma {
                                self.advance();
                            }
                        }
                        self.expect_rparen("call arguments")?;
                        Ok(Node::Expr(items))
                    }
                    _ => Ok(Node::Identifier(name)),
                }
            }
            Token::LParen => self.parse_form(),
            other => Err(self.error(format!("unexpected token '{}'", other))),
        }
    }

    /// With the parser at a `(`, decide whether the group is a lambda
    /// expression: its first element is a parameter group (or a single
    /// annotated name) followed by `->`.
    fn lambda_follows(&self) -> bool {
        let mut i = self.pos + 1;
        match self.tokens.get(i).map(|t| &t.token) {
            Some(Token::LParen) => {
                let mut depth = 1;
                i += 1;
                while let Some(spanned) = self.tokens.get(i) {
                    match &spanned.token {
                        Token::LParen => depth += 1,
                        Token::RParen => {
                            depth -= 1;
                            if depth == 0 {
                                return matches!(
                                    self.tokens.get(i + 1).map(|t| &t.token),
                                    Some(Token::Arrow)
                                );
                            }
                        }
                        Token::Eof => return false,
                        _ => {}
                    }
                    i += 1;
                }
                false
            }
            Some(Token::Ident(_)) => {
                matches!(self.tokens.get(i + 1).map(|t| &t.token), Some(Token::Colon))
                    && matches!(self.tokens.get(i + 3).map(|t| &t.token), Some(Token::Arrow))
            }
            _ => false,
        }
    }

    /// Parse a parenthesised form. The current token is the opening paren.
    fn parse_form(&mut self) -> Result<Node> {
        self.advance(); // consume '('

        // Forms with dedicated AST shapes are dispatched on the head token.
        if let Token::Ident(head) = self.current().clone() {
            match head.as_str() {
                "def" => return self.parse_function_definition(),
                "if" => return self.parse_if(),
                "ret" => {
                    self.advance();
                    let value = self.parse_expression()?;
                    self.expect_rparen("return value")?;
                    return Ok(Node::Return(Box::new(value)));
                }
                "map" | "filter" => return self.parse_map_or_filter(&head),
                _ => {}
            }
        }

        let mut items = Vec::new();
        while !matches!(self.current(), Token::RParen | Token::Eof) {
            items.push(self.parse_expression()?);

            // `(params) -> body` after the first element is a lambda.
            if items.len() == 1 && *self.current() == Token::Arrow {
                return self.parse_lambda(items.remove(0));
            }
        }
        self.expect_rparen("expression")?;

        Ok(match items.len() {
            0 => Node::Expr(items),
            // A parenthesised group of exactly one expression unwraps.
            1 => items.remove(0),
            _ => {
                if matches!(items[0], Node::Lambda { .. }) {
                    let lambda = Box::new(items.remove(0));
                    let args = spread_args(items);
                    Node::LambdaCall { lambda, args }
                } else {
                    Node::Expr(items)
                }
            }
        })
    }

    /// `(def name (params) [-> type] body...)` — the '(' and `def` head have
    /// been seen; `def` is still current.
    fn parse_function_definition(&mut self) -> Result<Node> {
        self.advance(); // consume 'def'
        let name = self.expect_ident("function name after 'def'")?;

        if *self.current() != Token::LParen {
            return Err(self.error(format!(
                "expected '(' before parameters of function '{}'",
                name
            )));
        }
        self.advance();
        let params = self.parse_params()?;

        let return_type = if *self.current() == Token::Arrow {
            self.advance();
            Some(self.expect_ident("return type after '->'")?)
        } else {
            None
        };

        let mut body = Vec::new();
        while !matches!(self.current(), Token::RParen | Token::Eof) {
            body.push(self.parse_expression()?);
        }
        if body.is_empty() {
            return Err(self.error(format!("function '{}' has an empty body", name)));
        }
        self.expect_rparen("function body")?;

        Ok(Node::FunctionDef {
            name,
            params,
            return_type,
            body,
        })
    }

    /// Parameter list: annotated or plain names until the closing paren.
    fn parse_params(&mut self) -> Result<Vec<Node>> {
        let mut params = Vec::new();
        loop {
            match self.current().clone() {
                Token::RParen => {
                    self.advance();
                    return Ok(params);
                }
                Token::Comma => {
                    self.advance();
                }
                Token::Ident(name) => {
                    self.advance();
                    if *self.current() == Token::Colon {
                        self.advance();
                        let ty = self.expect_ident("type name after ':'")?;
                        params.push(Node::TypeAnnotation { name, ty });
                    } else {
                        params.push(Node::Identifier(name));
                    }
                }
                other => {
                    return Err(
                        self.error(format!("expected parameter name, got '{}'", other))
                    );
                }
            }
        }
    }

    /// `(if cond then [else alt])` — `if` is still current.
    fn parse_if(&mut self) -> Result<Node> {
        self.advance(); // consume 'if'
        let cond = Box::new(self.parse_expression()?);
        let then = Box::new(self.parse_expression()?);

        let alt = if *self.current() == Token::Ident("else".to_string()) {
            self.advance();
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };

        self.expect_rparen("if statement")?;
        Ok(Node::If { cond, then, alt })
    }

    /// `(map lambda args)` / `(filter lambda args)` — head still current.
    fn parse_map_or_filter(&mut self, head: &str) -> Result<Node> {
        self.advance(); // consume 'map' / 'filter'
        let mut lambda = Box::new(self.parse_expression()?);

        // `(map f (1 2 3))`: the call syntax attaches the element list to
        // `f` as arguments; split it back apart.
        let arg_form = if *self.current() == Token::RParen {
            match &mut *lambda {
                Node::Expr(items)
                    if items.len() >= 2 && matches!(items[0], Node::Identifier(_)) =>
                {
                    let mut items = std::mem::take(items);
                    lambda = Box::new(items.remove(0));
                    Node::Expr(items)
                }
                _ => return Err(self.error(format!("'{}' expects an argument list", head))),
            }
        } else {
            self.parse_expression()?
        };
        self.expect_rparen(head)?;

        let args = spread_args(vec![arg_form]);
        Ok(if head == "map" {
            Node::MapExpr { lambda, args }
        } else {
            Node::FilterExpr { lambda, args }
        })
    }

    /// `(params -> body)` — the Arrow is current, `first` is the parsed
    /// parameter group.
    fn parse_lambda(&mut self, first: Node) -> Result<Node> {
        self.advance(); // consume '->'

        let params = match first {
            Node::TypeAnnotation { .. } | Node::Identifier(_) => vec![first],
            Node::Expr(items) => {
                for item in &items {
                    if item.param_name().is_none() {
                        return Err(self.error(format!(
                            "invalid lambda parameter '{}'",
                            item
                        )));
                    }
                }
                items
            }
            other => {
                return Err(self.error(format!("invalid lambda parameter list '{}'", other)));
            }
        };

        let body = Box::new(self.parse_expression()?);
        self.expect_rparen("lambda body")?;
        Ok(Node::Lambda { params, body })
    }

    fn parse_operator_expr(&mut self, op: String) -> Result<Node> {
        self.advance(); // consume the operator
        let mut items = vec![Node::Operator(op)];

        items.push(self.parse_expression()?);
        if !matches!(self.current(), Token::RParen | Token::Eof) {
            items.push(self.parse_expression()?);
        }

        Ok(Node::Expr(items))
    }
}

/// Spread a parenthesised argument group into individual arguments: a
/// composite whose head is not an operator is an argument list, anything else
/// is a single argument.
fn spread_args(items: Vec<Node>) -> Vec<Node> {
    if items.len() == 1 {
        if let Node::Expr(inner) = &items[0] {
            if !matches!(inner.first(), Some(Node::Operator(_))) {
                return inner.clone();
            }
        }
        return items;
    }
    items
}
