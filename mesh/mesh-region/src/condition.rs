//! Predicates over normalized triangle positions.
//!
//! A [`Condition`] is evaluated against a centroid that has already been
//! mapped into bounding-box-relative coordinates, so `z > 0.8` means "in
//! the top fifth of the model". Conditions combine with AND, OR, and NOT.
//!
//! Conditions have a compact text form used in rule-table files:
//!
//! ```text
//! always
//! z > 0.8 && y > 0.5
//! z > 0.75 && (x < 0.15 || x > 0.85)
//! !(x >= 0.25 && x <= 0.75)
//! ```

use std::fmt;
use std::str::FromStr;

use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// X axis (left/right).
    X,
    /// Y axis (back/front).
    Y,
    /// Z axis (bottom/top).
    Z,
}

impl Axis {
    /// Component of `point` along this axis.
    #[inline]
    #[must_use]
    pub fn of(self, point: &Point3<f64>) -> f64 {
        match self {
            Self::X => point.x,
            Self::Y => point.y,
            Self::Z => point.z,
        }
    }

    const fn symbol(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        }
    }
}

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cmp {
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
}

impl Cmp {
    /// Apply the comparison. Any comparison with NaN is false.
    #[inline]
    #[must_use]
    pub fn test(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Gt => lhs > rhs,
            Self::Ge => lhs >= rhs,
            Self::Lt => lhs < rhs,
            Self::Le => lhs <= rhs,
        }
    }

    const fn symbol(self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
        }
    }
}

/// Predicate over a normalized position.
///
/// # Example
///
/// ```
/// use mesh_region::{Axis, Condition};
/// use mesh_types::Point3;
///
/// let hands = Condition::gt(Axis::Z, 0.75)
///     .and(Condition::lt(Axis::X, 0.15).or(Condition::gt(Axis::X, 0.85)));
///
/// assert!(hands.matches(&Point3::new(0.9, 0.5, 0.8)));
/// assert!(!hands.matches(&Point3::new(0.5, 0.5, 0.8)));
/// assert_eq!(hands.to_string(), "z > 0.75 && (x < 0.15 || x > 0.85)");
/// assert_eq!("z > 0.75 && (x < 0.15 || x > 0.85)".parse::<Condition>().unwrap(), hands);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Condition {
    /// Matches every position.
    Always,
    /// Compare one axis against a threshold.
    Compare {
        /// Axis to read.
        axis: Axis,
        /// Operator, with the axis value on the left.
        cmp: Cmp,
        /// Threshold in normalized units.
        value: f64,
    },
    /// All sub-conditions match (true when empty).
    All(Vec<Condition>),
    /// Any sub-condition matches (false when empty).
    Any(Vec<Condition>),
    /// The sub-condition does not match.
    Not(Box<Condition>),
}

impl Condition {
    /// The unconditional predicate.
    #[must_use]
    pub const fn always() -> Self {
        Self::Always
    }

    /// `axis > value`
    #[must_use]
    pub const fn gt(axis: Axis, value: f64) -> Self {
        Self::Compare {
            axis,
            cmp: Cmp::Gt,
            value,
        }
    }

    /// `axis >= value`
    #[must_use]
    pub const fn ge(axis: Axis, value: f64) -> Self {
        Self::Compare {
            axis,
            cmp: Cmp::Ge,
            value,
        }
    }

    /// `axis < value`
    #[must_use]
    pub const fn lt(axis: Axis, value: f64) -> Self {
        Self::Compare {
            axis,
            cmp: Cmp::Lt,
            value,
        }
    }

    /// `axis <= value`
    #[must_use]
    pub const fn le(axis: Axis, value: f64) -> Self {
        Self::Compare {
            axis,
            cmp: Cmp::Le,
            value,
        }
    }

    /// `low < axis < high`
    #[must_use]
    pub fn between(axis: Axis, low: f64, high: f64) -> Self {
        Self::All(vec![Self::gt(axis, low), Self::lt(axis, high)])
    }

    /// Combine with AND.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::All(mut terms) => {
                terms.push(other);
                Self::All(terms)
            }
            first => Self::All(vec![first, other]),
        }
    }

    /// Combine with OR.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        match self {
            Self::Any(mut terms) => {
                terms.push(other);
                Self::Any(terms)
            }
            first => Self::Any(vec![first, other]),
        }
    }

    /// Negate.
    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Whether this is the unconditional predicate.
    #[must_use]
    pub const fn is_always(&self) -> bool {
        matches!(self, Self::Always)
    }

    /// Evaluate against a normalized position.
    #[must_use]
    pub fn matches(&self, position: &Point3<f64>) -> bool {
        match self {
            Self::Always => true,
            Self::Compare { axis, cmp, value } => cmp.test(axis.of(position), *value),
            Self::All(terms) => terms.iter().all(|t| t.matches(position)),
            Self::Any(terms) => terms.iter().any(|t| t.matches(position)),
            Self::Not(inner) => !inner.matches(position),
        }
    }

    /// First threshold that is NaN or infinite, if any.
    #[must_use]
    pub fn non_finite_threshold(&self) -> Option<f64> {
        match self {
            Self::Always => None,
            Self::Compare { value, .. } => (!value.is_finite()).then_some(*value),
            Self::All(terms) | Self::Any(terms) => {
                terms.iter().find_map(Self::non_finite_threshold)
            }
            Self::Not(inner) => inner.non_finite_threshold(),
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, parent_and: bool) -> fmt::Result {
        let needs_parens = match self {
            Self::Any(terms) => parent_and && terms.len() > 1,
            Self::All(terms) => !parent_and && terms.len() > 1,
            _ => false,
        };
        if needs_parens {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("always"),
            Self::Compare { axis, cmp, value } => {
                write!(f, "{} {} {value}", axis.symbol(), cmp.symbol())
            }
            Self::All(terms) if terms.is_empty() => f.write_str("always"),
            Self::Any(terms) if terms.is_empty() => f.write_str("!always"),
            Self::All(terms) | Self::Any(terms) => {
                let is_and = matches!(self, Self::All(_));
                let sep = if is_and { " && " } else { " || " };
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(sep)?;
                    }
                    if terms.len() == 1 {
                        write!(f, "{term}")?;
                    } else {
                        term.fmt_operand(f, is_and)?;
                    }
                }
                Ok(())
            }
            Self::Not(inner) => match inner.as_ref() {
                Self::Always | Self::Not(_) => write!(f, "!{inner}"),
                _ => write!(f, "!({inner})"),
            },
        }
    }
}

/// Error from parsing a condition expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("at column {column}: {message}")]
pub struct ConditionParseError {
    /// 1-based character column where parsing failed.
    pub column: usize,
    /// What was expected.
    pub message: String,
}

impl FromStr for Condition {
    type Err = ConditionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser {
            chars: s.chars().collect(),
            pos: 0,
            depth: 0,
        };
        let condition = parser.expr()?;
        parser.skip_ws();
        if parser.pos < parser.chars.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(condition)
    }
}

impl TryFrom<String> for Condition {
    type Error = ConditionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Condition> for String {
    fn from(condition: Condition) -> Self {
        condition.to_string()
    }
}

/// Deepest accepted nesting of `!` and parentheses.
const MAX_DEPTH: usize = 256;

/// Recursive-descent parser; `&&` binds tighter than `||`.
struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn error(&self, message: impl Into<String>) -> ConditionParseError {
        ConditionParseError {
            column: self.pos + 1,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        let matches = token
            .chars()
            .enumerate()
            .all(|(i, c)| self.chars.get(self.pos + i) == Some(&c));
        if matches {
            self.pos += token.chars().count();
        }
        matches
    }

    fn expr(&mut self) -> Result<Condition, ConditionParseError> {
        let mut terms = vec![self.and()?];
        while self.eat("||") {
            terms.push(self.and()?);
        }
        Ok(collapse(terms, Condition::Any))
    }

    fn and(&mut self) -> Result<Condition, ConditionParseError> {
        let mut terms = vec![self.unary()?];
        while self.eat("&&") {
            terms.push(self.unary()?);
        }
        Ok(collapse(terms, Condition::All))
    }

    fn nested(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<Condition, ConditionParseError>,
    ) -> Result<Condition, ConditionParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(format!("nested more than {MAX_DEPTH} levels deep")));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn unary(&mut self) -> Result<Condition, ConditionParseError> {
        if self.eat("!") {
            return self.nested(Self::unary).map(Condition::negate);
        }
        if self.eat("(") {
            let inner = self.nested(Self::expr)?;
            if !self.eat(")") {
                return Err(self.error("expected ')'"));
            }
            return Ok(inner);
        }
        if self.eat("always") {
            return Ok(Condition::Always);
        }
        self.compare()
    }

    fn compare(&mut self) -> Result<Condition, ConditionParseError> {
        self.skip_ws();
        let axis = match self.peek() {
            Some('x' | 'X') => Axis::X,
            Some('y' | 'Y') => Axis::Y,
            Some('z' | 'Z') => Axis::Z,
            _ => return Err(self.error("expected 'always', '(', '!', or an axis (x, y, z)")),
        };
        self.pos += 1;

        // Longest operators first
        let cmp = if self.eat(">=") {
            Cmp::Ge
        } else if self.eat("<=") {
            Cmp::Le
        } else if self.eat(">") {
            Cmp::Gt
        } else if self.eat("<") {
            Cmp::Lt
        } else {
            return Err(self.error("expected one of >, >=, <, <="));
        };

        self.skip_ws();
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
        {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let value: f64 = text.parse().map_err(|_| ConditionParseError {
            column: start + 1,
            message: format!("expected a number, found {text:?}"),
        })?;
        if !value.is_finite() {
            return Err(ConditionParseError {
                column: start + 1,
                message: format!("threshold {text} is not finite"),
            });
        }

        Ok(Condition::Compare { axis, cmp, value })
    }
}

fn collapse(mut terms: Vec<Condition>, join: fn(Vec<Condition>) -> Condition) -> Condition {
    if terms.len() == 1 {
        terms.swap_remove(0)
    } else {
        join(terms)
    }
}
