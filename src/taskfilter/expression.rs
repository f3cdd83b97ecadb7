//! # Filter Expressions
//!
//! User-authored filters are written as small boolean expressions over a
//! task's attributes and compiled into a [`TaskFilterFxn`].
//!
//! ```text
//! completion < 100 and end <= today
//! not (title contains "review") or duration > 5
//! start >= 2024-03-01 and end < today+7
//! ```
//!
//! ## Grammar
//!
//! ```text
//! expr       := and_expr ("or" and_expr)*
//! and_expr   := unary ("and" unary)*
//! unary      := "not" unary | "(" expr ")" | comparison
//! comparison := field op value
//! field      := completion | duration | start | end | title
//! op         := = | != | < | <= | > | >= | contains
//! value      := integer | YYYY-MM-DD | today | today+N | today-N | "text"
//! ```
//!
//! Keywords are case-insensitive. Each field accepts one kind of value:
//! `completion` and `duration` (days, both ends included) take integers,
//! `start` and `end` take dates, `title` takes text and only `=`, `!=` and
//! `contains` (all case-insensitive). Anything else is rejected when the
//! expression is compiled, so evaluation never fails.
//!
//! `today` is read from the clock each time the predicate runs, not when it is
//! compiled.
//!
//! `not` and parentheses nest at most 128 levels deep. Chains of `and` or `or`
//! have no length limit.

use crate::clock::Clock;
use crate::error::{FilterError, Result};
use crate::filter::TaskFilterFxn;
use crate::model::Task;
use chrono::{Days, NaiveDate};
use std::cmp::Ordering;
use std::rc::Rc;

const MAX_DAY_OFFSET: u64 = 36_500;

/// Deepest allowed stack of `not` and `(`.
const MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Completion,
    Duration,
    Start,
    End,
    Title,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Contains,
}

impl CmpOp {
    fn holds(self, ordering: Ordering) -> bool {
        match self {
            CmpOp::Eq => ordering == Ordering::Equal,
            CmpOp::Ne => ordering != Ordering::Equal,
            CmpOp::Lt => ordering == Ordering::Less,
            CmpOp::Le => ordering != Ordering::Greater,
            CmpOp::Gt => ordering == Ordering::Greater,
            CmpOp::Ge => ordering != Ordering::Less,
            CmpOp::Contains => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateValue {
    Fixed(NaiveDate),
    /// Today shifted by a number of days
    Today(i64),
}

impl DateValue {
    fn resolve(self, today: NaiveDate) -> NaiveDate {
        match self {
            DateValue::Fixed(date) => date,
            DateValue::Today(offset) => {
                let days = Days::new(offset.unsigned_abs());
                let shifted = if offset < 0 {
                    today.checked_sub_days(days)
                } else {
                    today.checked_add_days(days)
                };
                shifted.unwrap_or(today)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Date(DateValue),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub field: Field,
    pub op: CmpOp,
    pub value: Value,
}

impl Comparison {
    fn eval(&self, task: &Task, today: NaiveDate) -> bool {
        match (&self.field, &self.value) {
            (Field::Completion, Value::Int(n)) => {
                self.op.holds(i64::from(task.completion).cmp(n))
            }
            (Field::Duration, Value::Int(n)) => self.op.holds(task.duration_days().cmp(n)),
            (Field::Start, Value::Date(d)) => self.op.holds(task.start.cmp(&d.resolve(today))),
            (Field::End, Value::Date(d)) => self.op.holds(task.end.cmp(&d.resolve(today))),
            (Field::Title, Value::Text(text)) => {
                let title = task.title.to_lowercase();
                let text = text.to_lowercase();
                match self.op {
                    CmpOp::Contains => title.contains(&text),
                    op => op.holds(title.cmp(&text)),
                }
            }
            // parse() only builds well-typed comparisons
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Two or more operands joined by `and`
    And(Vec<Expr>),
    /// Two or more operands joined by `or`
    Or(Vec<Expr>),
    Not(Box<Expr>),
    Compare(Comparison),
}

impl Expr {
    pub fn eval(&self, task: &Task, today: NaiveDate) -> bool {
        match self {
            Expr::And(terms) => terms.iter().all(|e| e.eval(task, today)),
            Expr::Or(terms) => terms.iter().any(|e| e.eval(task, today)),
            Expr::Not(inner) => !inner.eval(task, today),
            Expr::Compare(cmp) => cmp.eval(task, today),
        }
    }
}

/// Compiles `source` into a predicate over child tasks.
pub fn compile(source: &str, clock: Rc<dyn Clock>) -> Result<TaskFilterFxn> {
    let expr = parse(source)?;
    Ok(TaskFilterFxn::new(move |_, child| match child {
        Some(task) => expr.eval(task, clock.today()),
        None => true,
    }))
}

pub fn parse(source: &str) -> Result<Expr> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: source.chars().count() + 1,
        depth: 0,
    };
    let expr = parser.expr()?;
    if let Some(tok) = parser.peek() {
        return Err(FilterError::expression(
            tok.column,
            format!("unexpected {}", tok.kind.describe()),
        ));
    }
    Ok(expr)
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Word(String),
    Int(i64),
    Date(NaiveDate),
    Text(String),
    Op(CmpOp),
    Plus,
    Minus,
    LParen,
    RParen,
}

impl TokenKind {
    fn describe(&self) -> String {
        match self {
            TokenKind::Word(w) => format!("'{}'", w),
            TokenKind::Int(n) => format!("number {}", n),
            TokenKind::Date(d) => format!("date {}", d),
            TokenKind::Text(t) => format!("text \"{}\"", t),
            TokenKind::Op(_) => "operator".to_string(),
            TokenKind::Plus => "'+'".to_string(),
            TokenKind::Minus => "'-'".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
        }
    }

    fn is_word(&self, keyword: &str) -> bool {
        matches!(self, TokenKind::Word(w) if w.eq_ignore_ascii_case(keyword))
    }
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    /// 1-based character column
    column: usize,
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let column = i + 1;

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let (kind, len) = match c {
            '(' => (TokenKind::LParen, 1),
            ')' => (TokenKind::RParen, 1),
            '+' => (TokenKind::Plus, 1),
            '-' => (TokenKind::Minus, 1),
            '=' => (TokenKind::Op(CmpOp::Eq), 1),
            '!' if chars.get(i + 1) == Some(&'=') => (TokenKind::Op(CmpOp::Ne), 2),
            '<' if chars.get(i + 1) == Some(&'=') => (TokenKind::Op(CmpOp::Le), 2),
            '<' => (TokenKind::Op(CmpOp::Lt), 1),
            '>' if chars.get(i + 1) == Some(&'=') => (TokenKind::Op(CmpOp::Ge), 2),
            '>' => (TokenKind::Op(CmpOp::Gt), 1),
            '"' => {
                let mut text = String::new();
                let mut j = i + 1;
                loop {
                    match chars.get(j) {
                        None => {
                            return Err(FilterError::expression(column, "unterminated text"))
                        }
                        Some('\\') if chars.get(j + 1).is_some() => {
                            text.push(chars[j + 1]);
                            j += 2;
                        }
                        Some('"') => break,
                        Some(ch) => {
                            text.push(*ch);
                            j += 1;
                        }
                    }
                }
                (TokenKind::Text(text), j + 1 - i)
            }
            c if c.is_ascii_digit() => {
                let literal: String = chars[i..]
                    .iter()
                    .take_while(|ch| ch.is_ascii_digit() || **ch == '-')
                    .collect();
                let kind = if literal.contains('-') {
                    NaiveDate::parse_from_str(&literal, "%Y-%m-%d")
                        .map(TokenKind::Date)
                        .map_err(|_| {
                            FilterError::expression(column, format!("invalid date '{}'", literal))
                        })?
                } else {
                    literal.parse().map(TokenKind::Int).map_err(|_| {
                        FilterError::expression(column, format!("number too large '{}'", literal))
                    })?
                };
                (kind, literal.chars().count())
            }
            c if c.is_alphabetic() || c == '_' => {
                let word: String = chars[i..]
                    .iter()
                    .take_while(|ch| ch.is_alphanumeric() || **ch == '_')
                    .collect();
                let len = word.chars().count();
                let kind = if word.eq_ignore_ascii_case("contains") {
                    TokenKind::Op(CmpOp::Contains)
                } else {
                    TokenKind::Word(word)
                };
                (kind, len)
            }
            other => {
                return Err(FilterError::expression(
                    column,
                    format!("unexpected character '{}'", other),
                ))
            }
        };

        tokens.push(Token { kind, column });
        i += len;
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    end: usize,
    // open `not` and `(` around the current position
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat_word(&mut self, keyword: &str) -> bool {
        if self.peek().is_some_and(|t| t.kind.is_word(keyword)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_next(&mut self, what: &str) -> Result<Token> {
        self.advance()
            .ok_or_else(|| FilterError::expression(self.end, format!("expected {}", what)))
    }

    fn expr(&mut self) -> Result<Expr> {
        let mut terms = vec![self.and_expr()?];
        while self.eat_word("or") {
            terms.push(self.and_expr()?);
        }
        Ok(join(terms, Expr::Or))
    }

    fn and_expr(&mut self) -> Result<Expr> {
        let mut terms = vec![self.unary()?];
        while self.eat_word("and") {
            terms.push(self.unary()?);
        }
        Ok(join(terms, Expr::And))
    }

    fn unary(&mut self) -> Result<Expr> {
        let opens = self
            .peek()
            .filter(|t| t.kind.is_word("not") || t.kind == TokenKind::LParen)
            .map(|t| t.column);
        let Some(opens) = opens else {
            return self.comparison().map(Expr::Compare);
        };
        if self.depth >= MAX_DEPTH {
            return Err(FilterError::expression(opens, "expression nested too deeply"));
        }
        self.depth += 1;
        let result = self.nested();
        self.depth -= 1;
        result
    }

    fn nested(&mut self) -> Result<Expr> {
        if self.eat_word("not") {
            return Ok(Expr::Not(Box::new(self.unary()?)));
        }
        if self.peek().is_some_and(|t| t.kind == TokenKind::LParen) {
            let open = self.expect_next("'('")?;
            let inner = self.expr()?;
            return match self.advance() {
                Some(Token {
                    kind: TokenKind::RParen,
                    ..
                }) => Ok(inner),
                Some(tok) => Err(FilterError::expression(
                    tok.column,
                    format!("expected ')' but found {}", tok.kind.describe()),
                )),
                None => Err(FilterError::expression(
                    open.column,
                    "unclosed '('",
                )),
            };
        }
        self.comparison().map(Expr::Compare)
    }

    fn comparison(&mut self) -> Result<Comparison> {
        let tok = self.expect_next("a field name")?;
        let field = match &tok.kind {
            TokenKind::Word(w) => match w.to_ascii_lowercase().as_str() {
                "completion" => Field::Completion,
                "duration" => Field::Duration,
                "start" => Field::Start,
                "end" => Field::End,
                "title" => Field::Title,
                _ => {
                    return Err(FilterError::expression(
                        tok.column,
                        format!("unknown field '{}'", w),
                    ))
                }
            },
            other => {
                return Err(FilterError::expression(
                    tok.column,
                    format!("expected a field name but found {}", other.describe()),
                ))
            }
        };

        let tok = self.expect_next("an operator")?;
        let op = match tok.kind {
            TokenKind::Op(op) => op,
            other => {
                return Err(FilterError::expression(
                    tok.column,
                    format!("expected an operator but found {}", other.describe()),
                ))
            }
        };
        let op_column = tok.column;

        let value_column = self.peek().map_or(self.end, |t| t.column);
        let value = self.value()?;

        let well_typed = match (field, &value) {
            (Field::Completion | Field::Duration, Value::Int(_)) => op != CmpOp::Contains,
            (Field::Start | Field::End, Value::Date(_)) => op != CmpOp::Contains,
            (Field::Title, Value::Text(_)) => {
                matches!(op, CmpOp::Eq | CmpOp::Ne | CmpOp::Contains)
            }
            _ => false,
        };
        if !well_typed {
            let expected = match field {
                Field::Completion | Field::Duration => "a number",
                Field::Start | Field::End => "a date or today",
                Field::Title => "quoted text",
            };
            let column = if op == CmpOp::Contains || field == Field::Title {
                op_column
            } else {
                value_column
            };
            return Err(FilterError::expression(
                column,
                format!("{:?} expects {} with a matching operator", field, expected)
                    .to_lowercase(),
            ));
        }

        Ok(Comparison { field, op, value })
    }

    fn value(&mut self) -> Result<Value> {
        let tok = self.expect_next("a value")?;
        match tok.kind {
            TokenKind::Int(n) => Ok(Value::Int(n)),
            TokenKind::Date(d) => Ok(Value::Date(DateValue::Fixed(d))),
            TokenKind::Text(t) => Ok(Value::Text(t)),
            TokenKind::Word(ref w) if w.eq_ignore_ascii_case("today") => {
                let sign = match self.peek().map(|t| &t.kind) {
                    Some(TokenKind::Plus) => 1,
                    Some(TokenKind::Minus) => -1,
                    _ => return Ok(Value::Date(DateValue::Today(0))),
                };
                self.pos += 1;
                let offset_tok = self.expect_next("a number of days")?;
                match offset_tok.kind {
                    TokenKind::Int(n) if n.unsigned_abs() <= MAX_DAY_OFFSET => {
                        Ok(Value::Date(DateValue::Today(sign * n)))
                    }
                    TokenKind::Int(_) => Err(FilterError::expression(
                        offset_tok.column,
                        format!("day offset must be at most {}", MAX_DAY_OFFSET),
                    )),
                    other => Err(FilterError::expression(
                        offset_tok.column,
                        format!("expected a number of days but found {}", other.describe()),
                    )),
                }
            }
            other => Err(FilterError::expression(
                tok.column,
                format!("expected a value but found {}", other.describe()),
            )),
        }
    }
}

fn join(mut terms: Vec<Expr>, combine: fn(Vec<Expr>) -> Expr) -> Expr {
    if terms.len() == 1 {
        terms.swap_remove(0)
    } else {
        combine(terms)
    }
}
