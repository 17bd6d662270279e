//! Optional applicability context narrowing an entry
//!
//! An entry may be scoped to nodes of particular classes (types or
//! aspects) with a small boolean expression, to a set of property
//! names, or to an arbitrary key-value context interpreted by the
//! embedder. An entry with no context applies unconditionally.
//!
//! Expressions must parse fully: a malformed expression is a loud
//! error at construction time, never an entry that silently matches
//! everything or nothing.
//!
//! Grammar, whitespace separated:
//!
//! ```text
//! expr   := clause ('|' clause)*        alternatives, any may match
//! clause := term+                       conjunction, all must match
//! term   := ('+' | '-')? atom           bare atom means '+'
//! atom   := '{namespace}local' | '(' expr ')'
//! ```

use std::collections::{BTreeMap, BTreeSet};

use palisade_core::{PalisadeError, PalisadeResult, QName};
use serde::{Deserialize, Serialize};

/// A parsed class-match expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassExpression {
    /// The node must carry this class
    Present(QName),
    /// The node must not carry this class
    Absent(QName),
    /// Every sub-expression must match
    All(Vec<ClassExpression>),
    /// At least one sub-expression must match
    Any(Vec<ClassExpression>),
}

impl ClassExpression {
    /// Parse an expression from its textual form
    pub fn parse(input: &str) -> PalisadeResult<Self> {
        let mut tokens = tokenize(input)?;
        tokens.reverse(); // pop() from the front
        let expr = parse_expr(&mut tokens)?;
        if let Some(tok) = tokens.pop() {
            return Err(PalisadeError::invalid(format!(
                "class expression has trailing input at {tok:?}"
            )));
        }
        Ok(expr)
    }

    /// Evaluate against the set of classes a node carries
    pub fn matches(&self, classes: &BTreeSet<QName>) -> bool {
        match self {
            Self::Present(q) => classes.contains(q),
            Self::Absent(q) => !classes.contains(q),
            Self::All(parts) => parts.iter().all(|p| p.matches(classes)),
            Self::Any(parts) => parts.iter().any(|p| p.matches(classes)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Plus,
    Minus,
    Pipe,
    Open,
    Close,
    Name(QName),
}

fn tokenize(input: &str) -> PalisadeResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();
    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '|' => {
                chars.next();
                tokens.push(Token::Pipe);
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            '{' => {
                let rest = &input[start..];
                let close = rest.find('}').ok_or_else(|| {
                    PalisadeError::invalid("class expression: unterminated namespace brace")
                })?;
                let namespace = &rest[1..close];
                let after = &rest[close + 1..];
                let end = after
                    .find(|ch: char| {
                        ch.is_whitespace() || matches!(ch, '+' | '-' | '|' | '(' | ')')
                    })
                    .unwrap_or(after.len());
                let local = &after[..end];
                if local.is_empty() {
                    return Err(PalisadeError::invalid(
                        "class expression: qualified name has no local part",
                    ));
                }
                tokens.push(Token::Name(QName::new(namespace, local)));
                // Skip everything consumed for this name (byte length
                // converted to a character count for the iterator)
                let consumed = rest[..close + 1 + end].chars().count();
                for _ in 0..consumed {
                    chars.next();
                }
            }
            other => {
                return Err(PalisadeError::invalid(format!(
                    "class expression: unexpected character {other:?}"
                )));
            }
        }
    }
    if tokens.is_empty() {
        return Err(PalisadeError::invalid("class expression is empty"));
    }
    Ok(tokens)
}

fn parse_expr(tokens: &mut Vec<Token>) -> PalisadeResult<ClassExpression> {
    let mut clauses = vec![parse_clause(tokens)?];
    while tokens.last() == Some(&Token::Pipe) {
        tokens.pop();
        clauses.push(parse_clause(tokens)?);
    }
    if clauses.len() == 1 {
        Ok(clauses.remove(0))
    } else {
        Ok(ClassExpression::Any(clauses))
    }
}

fn parse_clause(tokens: &mut Vec<Token>) -> PalisadeResult<ClassExpression> {
    let mut terms = Vec::new();
    loop {
        match tokens.last() {
            Some(Token::Plus | Token::Minus | Token::Open | Token::Name(_)) => {
                terms.push(parse_term(tokens)?);
            }
            _ => break,
        }
    }
    if terms.is_empty() {
        return Err(PalisadeError::invalid(
            "class expression: expected a term",
        ));
    }
    if terms.len() == 1 {
        Ok(terms.remove(0))
    } else {
        Ok(ClassExpression::All(terms))
    }
}

fn parse_term(tokens: &mut Vec<Token>) -> PalisadeResult<ClassExpression> {
    let negated = match tokens.last() {
        Some(Token::Plus) => {
            tokens.pop();
            false
        }
        Some(Token::Minus) => {
            tokens.pop();
            true
        }
        _ => false,
    };
    let atom = match tokens.pop() {
        Some(Token::Name(q)) => {
            if negated {
                ClassExpression::Absent(q)
            } else {
                ClassExpression::Present(q)
            }
        }
        Some(Token::Open) => {
            let inner = parse_expr(tokens)?;
            if tokens.pop() != Some(Token::Close) {
                return Err(PalisadeError::invalid(
                    "class expression: unbalanced parentheses",
                ));
            }
            if negated {
                // '-(...)' negates the whole group
                negate(inner)
            } else {
                inner
            }
        }
        other => {
            return Err(PalisadeError::invalid(format!(
                "class expression: expected a name or group, found {other:?}"
            )));
        }
    };
    Ok(atom)
}

fn negate(expr: ClassExpression) -> ClassExpression {
    match expr {
        ClassExpression::Present(q) => ClassExpression::Absent(q),
        ClassExpression::Absent(q) => ClassExpression::Present(q),
        ClassExpression::All(parts) => {
            ClassExpression::Any(parts.into_iter().map(negate).collect())
        }
        ClassExpression::Any(parts) => {
            ClassExpression::All(parts.into_iter().map(negate).collect())
        }
    }
}

/// Applicability qualifier attached to an entry
///
/// All present parts must match for the entry to apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AccessControlEntryContext {
    /// Class-match expression over the node's type and aspects
    class_context: Option<ClassExpression>,
    /// Properties the node must carry
    property_context: BTreeSet<QName>,
    /// Arbitrary key-value context interpreted by the embedder
    key_value_context: BTreeMap<String, serde_json::Value>,
}

impl AccessControlEntryContext {
    /// Context with only a class expression, parsed from text
    pub fn with_class_expression(expression: &str) -> PalisadeResult<Self> {
        Ok(Self {
            class_context: Some(ClassExpression::parse(expression)?),
            ..Self::default()
        })
    }

    /// The class-match expression, if any
    pub fn class_context(&self) -> Option<&ClassExpression> {
        self.class_context.as_ref()
    }

    /// Require a property to be present on the node
    pub fn require_property(&mut self, property: QName) {
        self.property_context.insert(property);
    }

    /// Attach an embedder-interpreted key-value pair
    pub fn insert_key_value(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.key_value_context.insert(key.into(), value);
    }

    /// The embedder-interpreted key-value context
    pub fn key_value_context(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.key_value_context
    }

    /// Whether the entry applies to a node carrying `classes` and
    /// `properties`
    pub fn matches(&self, classes: &BTreeSet<QName>, properties: &BTreeSet<QName>) -> bool {
        if let Some(expr) = &self.class_context {
            if !expr.matches(classes) {
                return false;
            }
        }
        self.property_context.is_subset(properties)
    }
}
