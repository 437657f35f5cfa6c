//! Calculator plugin: evaluates arithmetic expressions typed into the query box

use async_trait::async_trait;
use thiserror::Error;
use wox_core::error::Result;
use wox_core::{impl_plugin_factory, Plugin, PluginMetadata, Query, ResultAction, ResultItem};

pub const CALCULATOR_PLUGIN_ID: &str = "calculator";

const RESULT_SCORE: i64 = 300;

/// Longest text handed to the parser
const MAX_INPUT_CHARS: usize = 512;

/// Deepest nesting of parentheses and unary signs the parser follows
const MAX_DEPTH: usize = 256;

#[derive(Error, Debug, PartialEq)]
pub enum CalcError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected token {0}")]
    UnexpectedToken(String),

    #[error("unknown function or constant '{0}'")]
    UnknownName(String),

    #[error("function {name} takes {expected} argument(s)")]
    Arity { name: String, expected: usize },

    #[error("result is not a finite number")]
    NotFinite,

    #[error("expression is longer than {0} characters")]
    TooLong(usize),

    #[error("expression nests deeper than {0} levels")]
    TooDeep(usize),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(char),
    LParen,
    RParen,
    Comma,
}

fn tokenize(input: &str) -> std::result::Result<Vec<Token>, CalcError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| CalcError::UnexpectedToken(text.clone()))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_alphanumeric() {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                tokens.push(Token::Ident(name.to_lowercase()));
            }
            '+' | '-' | '*' | '/' | '%' | '^' => {
                tokens.push(Token::Op(c));
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            other => return Err(CalcError::UnexpectedChar(other)),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Run `step` one nesting level deeper, failing past `MAX_DEPTH`
    fn nested<T>(
        &mut self,
        step: impl FnOnce(&mut Self) -> std::result::Result<T, CalcError>,
    ) -> std::result::Result<T, CalcError> {
        if self.depth >= MAX_DEPTH {
            return Err(CalcError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let result = step(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> std::result::Result<(), CalcError> {
        match self.advance() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(CalcError::UnexpectedToken(format!("{:?}", token))),
            None => Err(CalcError::UnexpectedEnd),
        }
    }

    fn expression(&mut self) -> std::result::Result<f64, CalcError> {
        let mut value = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek().cloned() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> std::result::Result<f64, CalcError> {
        let mut value = self.unary()?;
        while let Some(Token::Op(op @ ('*' | '/' | '%'))) = self.peek().cloned() {
            self.pos += 1;
            let rhs = self.unary()?;
            value = match op {
                '*' => value * rhs,
                '/' => value / rhs,
                _ => value % rhs,
            };
        }
        Ok(value)
    }

    fn unary(&mut self) -> std::result::Result<f64, CalcError> {
        match self.peek() {
            Some(Token::Op('-')) => {
                self.pos += 1;
                Ok(-self.nested(Self::unary)?)
            }
            Some(Token::Op('+')) => {
                self.pos += 1;
                self.nested(Self::unary)
            }
            _ => self.power(),
        }
    }

    /// Right associative
    fn power(&mut self) -> std::result::Result<f64, CalcError> {
        let base = self.primary()?;
        if let Some(Token::Op('^')) = self.peek() {
            self.pos += 1;
            let exponent = self.nested(Self::unary)?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> std::result::Result<f64, CalcError> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::LParen) => {
                let value = self.nested(Self::expression)?;
                self.expect(Token::RParen)?;
                Ok(value)
            }
            Some(Token::Ident(name)) => {
                if let Some(Token::LParen) = self.peek() {
                    self.pos += 1;
                    let args = self.nested(Self::arguments)?;
                    call(&name, &args)
                } else {
                    constant(&name)
                }
            }
            Some(token) => Err(CalcError::UnexpectedToken(format!("{:?}", token))),
            None => Err(CalcError::UnexpectedEnd),
        }
    }

    fn arguments(&mut self) -> std::result::Result<Vec<f64>, CalcError> {
        let mut args = Vec::new();
        if let Some(Token::RParen) = self.peek() {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            match self.advance() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(args),
                Some(token) => return Err(CalcError::UnexpectedToken(format!("{:?}", token))),
                None => return Err(CalcError::UnexpectedEnd),
            }
        }
    }
}

fn constant(name: &str) -> std::result::Result<f64, CalcError> {
    match name {
        "pi" => Ok(std::f64::consts::PI),
        "e" => Ok(std::f64::consts::E),
        _ => Err(CalcError::UnknownName(name.to_string())),
    }
}

fn call(name: &str, args: &[f64]) -> std::result::Result<f64, CalcError> {
    let unary = |f: fn(f64) -> f64| match args {
        [x] => Ok(f(*x)),
        _ => Err(CalcError::Arity {
            name: name.to_string(),
            expected: 1,
        }),
    };
    let binary = |f: fn(f64, f64) -> f64| match args {
        [x, y] => Ok(f(*x, *y)),
        _ => Err(CalcError::Arity {
            name: name.to_string(),
            expected: 2,
        }),
    };

    match name {
        "abs" => unary(f64::abs),
        "sqrt" => unary(f64::sqrt),
        "cbrt" => unary(f64::cbrt),
        "sin" => unary(f64::sin),
        "cos" => unary(f64::cos),
        "tan" => unary(f64::tan),
        "asin" => unary(f64::asin),
        "acos" => unary(f64::acos),
        "atan" => unary(f64::atan),
        "ln" | "log" => unary(f64::ln),
        "log10" => unary(f64::log10),
        "log2" => unary(f64::log2),
        "exp" => unary(f64::exp),
        "floor" => unary(f64::floor),
        "ceil" => unary(f64::ceil),
        "round" => unary(f64::round),
        "trunc" => unary(f64::trunc),
        "pow" => binary(f64::powf),
        "min" => binary(f64::min),
        "max" => binary(f64::max),
        "hypot" => binary(f64::hypot),
        "atan2" => binary(f64::atan2),
        _ => Err(CalcError::UnknownName(name.to_string())),
    }
}

/// Evaluate an arithmetic expression
pub fn evaluate(expression: &str) -> std::result::Result<f64, CalcError> {
    if expression.chars().count() > MAX_INPUT_CHARS {
        return Err(CalcError::TooLong(MAX_INPUT_CHARS));
    }
    let mut parser = Parser::new(tokenize(expression)?);
    let value = parser.expression()?;
    if let Some(token) = parser.peek() {
        return Err(CalcError::UnexpectedToken(format!("{:?}", token)));
    }
    if !value.is_finite() {
        return Err(CalcError::NotFinite);
    }
    Ok(value)
}

/// Format without float noise: integers plainly, otherwise at most 10 decimals
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let text = format!("{:.10}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Only text with an operator, parenthesis or letter is treated as an expression
fn looks_like_expression(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty()
        && text
            .chars()
            .skip(1)
            .any(|c| matches!(c, '+' | '-' | '*' | '/' | '%' | '^' | '(' | ')'))
}

pub struct CalculatorPlugin {
    metadata: PluginMetadata,
}

impl CalculatorPlugin {
    pub fn new() -> Self {
        Self {
            metadata: PluginMetadata::new(CALCULATOR_PLUGIN_ID, "Calculator")
                .with_author("Wox Launcher")
                .with_description("Evaluate arithmetic expressions")
                .ignoring_auto_score(),
        }
    }
}

impl Default for CalculatorPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Plugin for CalculatorPlugin {
    fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    async fn query(&self, query: &Query) -> Result<Vec<ResultItem>> {
        let expression = query.search();
        if !looks_like_expression(expression) {
            return Ok(Vec::new());
        }

        let value = match evaluate(expression) {
            Ok(value) => format_number(value),
            Err(e) => {
                tracing::debug!("Not an expression {:?}: {}", expression, e);
                return Ok(Vec::new());
            }
        };

        let copied = value.clone();
        Ok(vec![ResultItem::new(value.clone())
            .with_subtitle(format!("{} = {}", expression.trim(), value))
            .with_context_data("calculation")
            .with_score(RESULT_SCORE)
            .with_action(ResultAction::new("Copy result", move |_| {
                println!("{}", copied);
                true
            }))])
    }
}

impl_plugin_factory!(
    CalculatorPluginFactory,
    CalculatorPlugin::new(),
    CALCULATOR_PLUGIN_ID,
    "Calculator"
);
