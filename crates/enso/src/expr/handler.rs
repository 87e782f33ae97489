//! Event handler statements.
//!
//! Handlers attached with `@event="…"` use a small statement language on top
//! of the expression syntax:
//!
//! ```text
//! () => this.count++
//! () => { this.count += step; this.last = 'add' }
//! this.reset
//! reset()
//! ```
//!
//! The `() =>` prefix and the braces are optional. Statements are separated
//! by `;` outside string literals and are either a field update (`++`, `--`, `=`, `+=`, `-=`) or a
//! reference to a method registered on the component. Updates are compiled
//! into ordinary expressions (`this.count++` becomes `this.count + 1`), so
//! arithmetic follows expression semantics.

use std::fmt;

use minijinja::Expression;
use once_cell::sync::Lazy;
use regex::Regex;

use super::environment::environment;
use crate::error::CompileError;

static ARROW_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(\s*\)\s*=>\s*").expect("arrow prefix pattern is valid"));

static STEP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^this\.(\w+)\s*(\+\+|--)$").expect("step statement pattern is valid")
});

static ASSIGN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^this\.(\w+)\s*(\+=|-=|=)\s*(.+)$").expect("assignment pattern is valid")
});

static METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:this\.)?(\w+)\s*(?:\(\s*\))?$").expect("method pattern is valid")
});

/// One executable step of a handler.
pub enum Statement {
    /// Evaluate `value` and store the result in `field`.
    Assign {
        field: String,
        source: String,
        value: Expression<'static, 'static>,
    },
    /// Invoke a method registered on the component definition.
    Call { method: String },
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Assign { field, source, .. } => f
                .debug_struct("Assign")
                .field("field", field)
                .field("value", source)
                .finish(),
            Statement::Call { method } => f.debug_struct("Call").field("method", method).finish(),
        }
    }
}

/// A compiled event handler.
#[derive(Debug)]
pub struct Handler {
    source: String,
    statements: Vec<Statement>,
}

impl Handler {
    pub fn compile(source: &str) -> Result<Self, CompileError> {
        let body = ARROW_PREFIX.replace(source.trim(), "");
        let body = body.trim();
        let body = body
            .strip_prefix('{')
            .and_then(|inner| inner.strip_suffix('}'))
            .unwrap_or(body);

        let statements = split_statements(body)
            .into_iter()
            .map(str::trim)
            .filter(|statement| !statement.is_empty())
            .map(|statement| compile_statement(statement, source))
            .collect::<Result<Vec<_>, _>>()?;

        if statements.is_empty() {
            return Err(CompileError::Expression {
                location: source.to_string(),
                message: "event handler has no statements".into(),
            });
        }

        Ok(Self {
            source: source.to_string(),
            statements,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Names of the component methods this handler calls.
    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.statements.iter().filter_map(|statement| match statement {
            Statement::Call { method } => Some(method.as_str()),
            Statement::Assign { .. } => None,
        })
    }
}

/// Splits a handler body at `;` separators that are not inside a quoted
/// string.
fn split_statements(body: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut quote = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in body.char_indices() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == ';' => {
                statements.push(&body[start..i]);
                start = i + 1;
            }
            None => {}
        }
    }
    statements.push(&body[start..]);
    statements
}

fn compile_statement(statement: &str, location: &str) -> Result<Statement, CompileError> {
    if let Some(caps) = STEP.captures(statement) {
        let op = if &caps[2] == "++" { "+" } else { "-" };
        return assign(&caps[1], format!("this.{} {} 1", &caps[1], op), location);
    }

    if let Some(caps) = ASSIGN.captures(statement) {
        let field = &caps[1];
        let rhs = caps[3].trim();
        // `this.a == b` is a comparison, not an assignment.
        if &caps[2] == "=" && rhs.starts_with('=') {
            return Err(unsupported(statement, location));
        }
        let value = match &caps[2] {
            "+=" => format!("this.{} + ({})", field, rhs),
            "-=" => format!("this.{} - ({})", field, rhs),
            _ => rhs.to_string(),
        };
        return assign(field, value, location);
    }

    if let Some(caps) = METHOD.captures(statement) {
        return Ok(Statement::Call {
            method: caps[1].to_string(),
        });
    }

    Err(unsupported(statement, location))
}

fn assign(field: &str, source: String, location: &str) -> Result<Statement, CompileError> {
    let value = environment()
        .compile_expression_owned(source.clone())
        .map_err(|e| CompileError::Expression {
            location: location.to_string(),
            message: e.to_string(),
        })?;
    Ok(Statement::Assign {
        field: field.to_string(),
        source,
        value,
    })
}

fn unsupported(statement: &str, location: &str) -> CompileError {
    CompileError::Expression {
        location: location.to_string(),
        message: format!("unsupported handler statement '{}'", statement),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn describe(source: &str) -> Vec<String> {
        Handler::compile(source)
            .unwrap()
            .statements()
            .iter()
            .map(|statement| match statement {
                Statement::Assign { field, source, .. } => format!("{} <- {}", field, source),
                Statement::Call { method } => format!("call {}", method),
            })
            .collect()
    }

    #[test]
    fn test_increment_with_arrow() {
        assert_eq!(describe("()=>this.count++"), vec!["count <- this.count + 1"]);
        assert_eq!(describe("() => this.count--"), vec!["count <- this.count - 1"]);
    }

    #[test]
    fn test_block_body_with_several_statements() {
        assert_eq!(
            describe("() => { this.a = 1; this.b += this.a * 2; }"),
            vec!["a <- 1", "b <- this.b + (this.a * 2)"]
        );
    }

    #[test]
    fn test_method_references() {
        assert_eq!(describe("reset"), vec!["call reset"]);
        assert_eq!(describe("this.reset"), vec!["call reset"]);
        assert_eq!(describe("() => this.reset()"), vec!["call reset"]);
        let handler = Handler::compile("a(); this.b").unwrap();
        assert_eq!(handler.methods().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_semicolons_inside_strings() {
        assert_eq!(
            describe("() => this.msg = 'a;b'"),
            vec!["msg <- 'a;b'"]
        );
        assert_eq!(
            describe(r#"() => { this.a = "x;\"y"; this.b = 'semi;colon' ; reset }"#),
            vec![r#"a <- "x;\"y""#, "b <- 'semi;colon'", "call reset"]
        );
    }

    #[test]
    fn test_comparison_is_not_assignment() {
        assert!(Handler::compile("this.a == 1").is_err());
    }

    #[test]
    fn test_empty_handler_is_error() {
        assert!(Handler::compile("() => {}").is_err());
    }

    #[test]
    fn test_arbitrary_code_rejected() {
        let err = Handler::compile("alert('x')").unwrap_err();
        assert!(err.to_string().contains("unsupported handler statement"));
    }

    #[test]
    fn test_assignment_rhs_must_compile() {
        assert!(Handler::compile("this.a = (").is_err());
    }
}
