//! Calculator tool — evaluates arithmetic expressions.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! expr    = term (('+' | '-') term)*
//! term    = unary (('*' | '/' | '%') unary)*
//! unary   = ('-' | '+') unary | power
//! power   = primary ('^' unary)?          right-associative
//! primary = NUMBER | IDENT | IDENT '(' expr ')' | '(' expr ')'
//! ```
//!
//! Identifiers are the constants `pi` and `e` and the functions `sqrt`,
//! `abs`, `round`, `floor`, `ceil`.

use async_trait::async_trait;
use textloop_core::error::ToolError;
use textloop_core::tool::{Tool, ToolResult};
use tracing::debug;

pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluate a mathematical expression. Supports + - * / % ^, parentheses, \
         decimal numbers, the constants pi and e, and sqrt/abs/round/floor/ceil."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "The expression to evaluate, e.g. '(2 + 3) * 4' or 'sqrt(2) ^ 2'"
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let expr = arguments["expression"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'expression' argument".into()))?;

        match evaluate(expr) {
            Ok(value) => {
                debug!(expression = expr, value, "Evaluated expression");
                Ok(ToolResult::ok(format_number(value))
                    .with_data(serde_json::json!({ "result": value })))
            }
            Err(e) => Ok(ToolResult::failed(format!("Error: {e}"))),
        }
    }
}

/// Render integers without a trailing `.0`.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Evaluate an expression string.
pub fn evaluate(expr: &str) -> Result<f64, String> {
    let tokens = tokenize(expr)?;
    let mut parser = Parser::new(&tokens);
    let result = parser.parse_expr()?;
    if let Some(tok) = parser.peek() {
        return Err(format!("Unexpected token at position {}: {tok:?}", parser.pos));
    }
    if !result.is_finite() {
        return Err("Result is not a finite number".into());
    }
    Ok(result)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '%' => Some(Token::Percent),
            '^' => Some(Token::Caret),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            _ => None,
        };
        if let Some(tok) = single {
            tokens.push(tok);
            chars.next();
            continue;
        }

        if c.is_whitespace() || c == ',' {
            // Thousands separators are tolerated: "1,000" reads as 1000.
            chars.next();
        } else if c.is_ascii_digit() || c == '.' {
            let mut num = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_ascii_digit() || d == '.' {
                    num.push(d);
                    chars.next();
                } else if d == ',' {
                    chars.next();
                } else {
                    break;
                }
            }
            let value: f64 = num.parse().map_err(|_| format!("Invalid number: {num}"))?;
            tokens.push(Token::Number(value));
        } else if c.is_ascii_alphabetic() {
            let mut ident = String::new();
            while let Some(&a) = chars.peek() {
                if a.is_ascii_alphanumeric() || a == '_' {
                    ident.push(a.to_ascii_lowercase());
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Ident(ident));
        } else {
            return Err(format!("Unexpected character: '{c}'"));
        }
    }

    Ok(tokens)
}

/// Deepest allowed nesting of parentheses, function calls and unary signs.
const MAX_DEPTH: usize = 64;

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Run `f` one nesting level deeper, failing past [`MAX_DEPTH`].
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, String>) -> Result<T, String> {
        if self.depth >= MAX_DEPTH {
            return Err("Expression nested too deeply".into());
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<&'a Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn parse_expr(&mut self) -> Result<f64, String> {
        let mut left = self.parse_term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.consume();
                    left += self.parse_term()?;
                }
                Some(Token::Minus) => {
                    self.consume();
                    left -= self.parse_term()?;
                }
                _ => break,
            }
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<f64, String> {
        let mut left = self.parse_unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.consume();
                    left *= self.parse_unary()?;
                }
                Some(Token::Slash) => {
                    self.consume();
                    let right = self.parse_unary()?;
                    if right == 0.0 {
                        return Err("Division by zero".into());
                    }
                    left /= right;
                }
                Some(Token::Percent) => {
                    self.consume();
                    let right = self.parse_unary()?;
                    if right == 0.0 {
                        return Err("Modulo by zero".into());
                    }
                    left %= right;
                }
                _ => break,
            }
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<f64, String> {
        match self.peek() {
            Some(Token::Minus) => {
                self.consume();
                Ok(-self.nested(Self::parse_unary)?)
            }
            Some(Token::Plus) => {
                self.consume();
                self.nested(Self::parse_unary)
            }
            _ => self.parse_power(),
        }
    }

    // -2^2 = -(2^2) and 2^3^2 = 2^(3^2)
    fn parse_power(&mut self) -> Result<f64, String> {
        let base = self.parse_primary()?;
        if let Some(Token::Caret) = self.peek() {
            self.consume();
            let exponent = self.nested(Self::parse_unary)?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<f64, String> {
        match self.consume() {
            Some(Token::Number(n)) => Ok(*n),
            Some(Token::LParen) => {
                let val = self.nested(Self::parse_expr)?;
                self.expect_rparen()?;
                Ok(val)
            }
            Some(Token::Ident(name)) => match name.as_str() {
                "pi" => Ok(std::f64::consts::PI),
                "e" => Ok(std::f64::consts::E),
                func => {
                    if self.consume() != Some(&Token::LParen) {
                        return Err(format!("Unknown identifier: {func}"));
                    }
                    let arg = self.nested(Self::parse_expr)?;
                    self.expect_rparen()?;
                    apply_function(func, arg)
                }
            },
            Some(tok) => Err(format!("Unexpected token: {tok:?}")),
            None => Err("Unexpected end of expression".into()),
        }
    }

    fn expect_rparen(&mut self) -> Result<(), String> {
        match self.consume() {
            Some(Token::RParen) => Ok(()),
            _ => Err("Expected closing parenthesis".into()),
        }
    }
}

fn apply_function(name: &str, arg: f64) -> Result<f64, String> {
    match name {
        "sqrt" if arg < 0.0 => Err("Square root of a negative number".into()),
        "sqrt" => Ok(arg.sqrt()),
        "abs" => Ok(arg.abs()),
        "round" => Ok(arg.round()),
        "floor" => Ok(arg.floor()),
        "ceil" => Ok(arg.ceil()),
        other => Err(format!("Unknown function: {other}")),
    }
}
