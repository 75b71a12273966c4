//! Arithmetic and descriptive-statistics evaluator
//!
//! A small recursive-descent parser over `f64`:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '%') unary)*
//! unary   := ('+' | '-') unary | power
//! power   := primary (('^' | '**') unary)?
//! primary := number | constant | ident '(' expr (',' expr)* ')' | '(' expr ')'
//! ```

use async_trait::async_trait;

use super::{string_arg, Capability, ToolDescriptor, ToolError, ToolHandler};

const TOOL_NAME: &str = "calculator";

/// Deepest nesting of parentheses, calls, signs and exponents accepted
const MAX_DEPTH: usize = 256;

/// The `calculator` tool
pub struct Calculator {
    descriptor: ToolDescriptor,
}

impl Calculator {
    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: TOOL_NAME.to_string(),
                description: "Evaluate an arithmetic or statistical expression. Supports + - * / % ^, \
                              parentheses, pi, e, sqrt, abs, ln, log10, exp, floor, ceil, round, \
                              factorial, and sum, mean, median, min, max, stdev, variance, count \
                              over comma-separated values, e.g. mean(12, 15, 11)."
                    .to_string(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "expression": {
                            "type": "string",
                            "description": "The expression to evaluate, e.g. (98.2 - 95) / 1.5"
                        }
                    },
                    "required": ["expression"]
                }),
                capability: Capability::Compute,
            },
        }
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolHandler for Calculator {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, arguments: &serde_json::Value) -> Result<String, ToolError> {
        let expression = string_arg(TOOL_NAME, arguments, "expression")?;
        let value = evaluate(expression)?;
        Ok(format_number(value))
    }
}

/// Evaluate `expression`, failing with [`ToolError::Evaluation`] on malformed input
pub fn evaluate(expression: &str) -> Result<f64, ToolError> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(eval_error("empty expression"));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if let Some(token) = parser.peek() {
        return Err(eval_error(format!("unexpected {token}")));
    }
    if !value.is_finite() {
        return Err(eval_error("result is not a finite number"));
    }
    Ok(value)
}

/// Integral values print without a fraction; others keep up to ten decimals
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let fixed = format!("{value:.10}");
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn eval_error(message: impl Into<String>) -> ToolError {
    ToolError::Evaluation(message.into())
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

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "number {n}"),
            Token::Ident(name) => write!(f, "`{name}`"),
            Token::Op(op) => write!(f, "`{op}`"),
            Token::LParen => write!(f, "`(`"),
            Token::RParen => write!(f, "`)`"),
            Token::Comma => write!(f, "`,`"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, ToolError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
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
                // Scientific notation: 1.5e3, 2E-4
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| eval_error(format!("invalid number `{literal}`")))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                tokens.push(Token::Ident(name.to_ascii_lowercase()));
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Op('^'));
                i += 2;
            }
            '+' | '-' | '*' | '/' | '%' | '^' => {
                tokens.push(Token::Op(c));
                i += 1;
            }
            '×' => {
                tokens.push(Token::Op('*'));
                i += 1;
            }
            '÷' => {
                tokens.push(Token::Op('/'));
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
            other => return Err(eval_error(format!("unexpected character `{other}`"))),
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
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat_op(&mut self, ops: &[char]) -> Option<char> {
        match self.peek() {
            Some(Token::Op(op)) if ops.contains(op) => {
                let op = *op;
                self.pos += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), ToolError> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(eval_error(format!("expected {expected}, found {token}"))),
            None => Err(eval_error(format!("expected {expected}, found end of input"))),
        }
    }

    fn expr(&mut self) -> Result<f64, ToolError> {
        let mut value = self.term()?;
        while let Some(op) = self.eat_op(&['+', '-']) {
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, ToolError> {
        let mut value = self.unary()?;
        while let Some(op) = self.eat_op(&['*', '/', '%']) {
            let rhs = self.unary()?;
            value = match op {
                '*' => value * rhs,
                _ if rhs == 0.0 => return Err(eval_error("division by zero")),
                '/' => value / rhs,
                _ => value % rhs,
            };
        }
        Ok(value)
    }

    // Every recursive path passes through here, so this bounds the stack
    fn unary(&mut self) -> Result<f64, ToolError> {
        if self.depth >= MAX_DEPTH {
            return Err(eval_error("expression nested too deeply"));
        }
        self.depth += 1;
        let value = self.signed();
        self.depth -= 1;
        value
    }

    fn signed(&mut self) -> Result<f64, ToolError> {
        match self.eat_op(&['+', '-']) {
            Some('-') => Ok(-self.unary()?),
            Some(_) => self.unary(),
            None => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64, ToolError> {
        let base = self.primary()?;
        if self.eat_op(&['^']).is_some() {
            // Right associative: 2^3^2 = 2^9
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64, ToolError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(value)
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    let args = self.arguments()?;
                    apply_function(&name, &args)
                } else {
                    constant(&name)
                }
            }
            Some(token) => Err(eval_error(format!("unexpected {token}"))),
            None => Err(eval_error("unexpected end of input")),
        }
    }

    /// Comma-separated arguments after an opening parenthesis
    fn arguments(&mut self) -> Result<Vec<f64>, ToolError> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(args),
                Some(token) => return Err(eval_error(format!("expected `,` or `)`, found {token}"))),
                None => return Err(eval_error("unclosed function call")),
            }
        }
    }
}

fn constant(name: &str) -> Result<f64, ToolError> {
    match name {
        "pi" => Ok(std::f64::consts::PI),
        "e" => Ok(std::f64::consts::E),
        other => Err(eval_error(format!("unknown identifier `{other}`"))),
    }
}

fn apply_function(name: &str, args: &[f64]) -> Result<f64, ToolError> {
    match name {
        "sqrt" | "abs" | "ln" | "log" | "log10" | "exp" | "floor" | "ceil" | "round"
        | "factorial" => {
            let [x] = args else {
                return Err(eval_error(format!(
                    "{name} takes exactly one argument, got {}",
                    args.len()
                )));
            };
            unary_function(name, *x)
        }
        "sum" | "mean" | "avg" | "median" | "min" | "max" | "stdev" | "variance" | "count" => {
            if args.is_empty() {
                return Err(eval_error(format!("{name} needs at least one value")));
            }
            statistic(name, args)
        }
        other => Err(eval_error(format!("unknown function `{other}`"))),
    }
}

fn unary_function(name: &str, x: f64) -> Result<f64, ToolError> {
    match name {
        "sqrt" if x < 0.0 => Err(eval_error("square root of a negative number")),
        "sqrt" => Ok(x.sqrt()),
        "abs" => Ok(x.abs()),
        "ln" | "log" | "log10" if x <= 0.0 => Err(eval_error("logarithm of a non-positive number")),
        "ln" => Ok(x.ln()),
        "log" | "log10" => Ok(x.log10()),
        "exp" => Ok(x.exp()),
        "floor" => Ok(x.floor()),
        "ceil" => Ok(x.ceil()),
        "round" => Ok(x.round()),
        "factorial" => {
            if x < 0.0 || x.fract() != 0.0 || x > 170.0 {
                return Err(eval_error("factorial needs an integer between 0 and 170"));
            }
            Ok((1..=x as u64).fold(1.0, |acc, k| acc * k as f64))
        }
        other => Err(eval_error(format!("unknown function `{other}`"))),
    }
}

fn statistic(name: &str, values: &[f64]) -> Result<f64, ToolError> {
    let n = values.len() as f64;
    let sum: f64 = values.iter().sum();
    let mean = sum / n;
    match name {
        "sum" => Ok(sum),
        "count" => Ok(n),
        "mean" | "avg" => Ok(mean),
        "min" => Ok(values.iter().copied().fold(f64::INFINITY, f64::min)),
        "max" => Ok(values.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        "median" => {
            let mut sorted = values.to_vec();
            sorted.sort_by(|a, b| a.total_cmp(b));
            let mid = sorted.len() / 2;
            if sorted.len() % 2 == 0 {
                Ok((sorted[mid - 1] + sorted[mid]) / 2.0)
            } else {
                Ok(sorted[mid])
            }
        }
        "stdev" | "variance" => {
            if values.len() < 2 {
                return Err(eval_error(format!("{name} needs at least two values")));
            }
            // Sample statistic (n - 1), as used for process data
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
            Ok(if name == "stdev" { variance.sqrt() } else { variance })
        }
        other => Err(eval_error(format!("unknown function `{other}`"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expr: &str) -> String {
        format_number(evaluate(expr).unwrap())
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(eval("2+2"), "4");
        assert_eq!(eval("2 + 3 * 4"), "14");
        assert_eq!(eval("(2 + 3) * 4"), "20");
        assert_eq!(eval("2^3^2"), "512");
        assert_eq!(eval("2**10"), "1024");
        assert_eq!(eval("-2^2"), "-4");
        assert_eq!(eval("10 - 4 - 3"), "3");
        assert_eq!(eval("17 % 5"), "2");
        assert_eq!(eval("7 / 2"), "3.5");
        assert_eq!(eval("1.5e3 + 1"), "1501");
    }

    #[test]
    fn test_functions_and_constants() {
        assert_eq!(eval("sqrt(16)"), "4");
        assert_eq!(eval("factorial(5)"), "120");
        assert_eq!(eval("round(pi * 100)"), "314");
        assert_eq!(eval("round(ln(e) * 1000)"), "1000");
        assert_eq!(eval("abs(-3) + floor(2.7) + ceil(0.2)"), "6");
    }

    #[test]
    fn test_statistics() {
        assert_eq!(eval("mean(2, 4, 6)"), "4");
        assert_eq!(eval("median(5, 1, 3)"), "3");
        assert_eq!(eval("median(4, 1, 3, 2)"), "2.5");
        assert_eq!(eval("min(3, -1, 2) + max(3, -1, 2)"), "2");
        assert_eq!(eval("count(1, 1, 1)"), "3");
        assert_eq!(eval("variance(2, 4, 4, 4, 5, 5, 7, 9)"), "4.5714285714");
        assert_eq!(eval("sum(1, 2, 3) / count(1, 2, 3)"), "2");
    }

    #[test]
    fn test_malformed_input_fails() {
        for bad in [
            "", "2 +", "(1 + 2", "1 / 0", "5 % 0", "foo(1)", "bar", "1 2", "sqrt(-1)",
            "stdev(3)", "mean()", "sqrt(1, 2)", "2 $ 3", "1..2", "factorial(2.5)",
        ] {
            assert!(
                matches!(evaluate(bad), Err(ToolError::Evaluation(_))),
                "expected evaluation error for {bad:?}"
            );
        }
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let parens = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
        let signs = format!("{}1", "-".repeat(100_000));
        let powers = format!("{}1", "1^".repeat(100_000));
        let calls = format!("{}1{}", "abs(".repeat(100_000), ")".repeat(100_000));
        for expr in [parens, signs, powers, calls] {
            match evaluate(&expr) {
                Err(ToolError::Evaluation(message)) => assert!(message.contains("nested too deeply")),
                other => panic!("expected evaluation error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_moderate_nesting_still_evaluates() {
        let expr = format!("{}2{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(eval(&expr), "2");
        assert_eq!(eval("--2"), "2");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(4.0), "4");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.1 + 0.2), "0.3");
        assert_eq!(format_number(1.0 / 3.0), "0.3333333333");
    }

    #[tokio::test]
    async fn test_invoke_reads_expression_argument() {
        let calc = Calculator::new();
        let out = calc
            .invoke(&serde_json::json!({"expression": "2+2"}))
            .await
            .unwrap();
        assert_eq!(out, "4");

        let err = calc.invoke(&serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }
}
