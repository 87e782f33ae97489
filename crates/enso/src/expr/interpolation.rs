//! `{{ … }}` text templates.
//!
//! An [`Interpolation`] is literal text with embedded expressions, compiled
//! once and evaluated against a [`Scope`](super::Scope) value whenever one of
//! its dependencies changes. Evaluation yields an [`Interpolated`] result
//! whose truthiness decides what the effect does with it:
//!
//! - a lone `{{ expr }}` keeps the value's own truthiness, so `0`, `false`,
//!   `none` and `""` are all [`Interpolated::Falsy`]
//! - mixed text concatenates literals and values, dropping `none`, undefined
//!   and booleans; if nothing but a `true` contributed, the result is
//!   [`Interpolated::True`]
//!
//! The whole source is trimmed before it is split, so whitespace around the
//! template disappears while spacing between parts is kept.

use std::collections::BTreeSet;
use std::fmt;

use minijinja::value::{Value, ValueKind};
use minijinja::Expression;

use super::environment::environment;
use super::scanner::scan_dependencies;
use crate::error::CompileError;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Outcome of evaluating an interpolation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpolated {
    /// Boolean `true` with no text to show.
    True,
    Text(String),
    Falsy,
}

impl Interpolated {
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Interpolated::Falsy)
    }

    /// The text an effect writes: `"true"` for [`Interpolated::True`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Interpolated::True => Some("true"),
            Interpolated::Text(text) => Some(text),
            Interpolated::Falsy => None,
        }
    }
}

enum Part {
    Literal(String),
    Expression {
        source: String,
        compiled: Expression<'static, 'static>,
    },
}

impl fmt::Debug for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Part::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Part::Expression { source, .. } => f.debug_tuple("Expression").field(source).finish(),
        }
    }
}

/// A compiled text template.
#[derive(Debug)]
pub struct Interpolation {
    source: String,
    parts: Vec<Part>,
    dependencies: BTreeSet<String>,
}

impl Interpolation {
    /// Compiles text containing `{{ expr }}` markers.
    ///
    /// An opening `{{` without a matching `}}` is kept as literal text.
    pub fn compile(source: &str) -> Result<Self, CompileError> {
        let mut parts = Vec::new();
        let mut rest = source.trim();

        while let Some(start) = rest.find(OPEN) {
            let after_open = &rest[start + OPEN.len()..];
            let Some(end) = after_open.find(CLOSE) else {
                break;
            };
            if start > 0 {
                parts.push(Part::Literal(rest[..start].to_string()));
            }
            parts.push(compile_part(after_open[..end].trim(), source)?);
            rest = &after_open[end + CLOSE.len()..];
        }
        if !rest.is_empty() {
            parts.push(Part::Literal(rest.to_string()));
        }

        Ok(Self {
            source: source.to_string(),
            parts,
            dependencies: scan_dependencies(source),
        })
    }

    /// Compiles a bare expression, as if it were written `{{ source }}`.
    pub fn expression(source: &str) -> Result<Self, CompileError> {
        Ok(Self {
            source: source.to_string(),
            parts: vec![compile_part(source.trim(), source)?],
            dependencies: scan_dependencies(source),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Field names read through `this.<field>`.
    pub fn dependencies(&self) -> &BTreeSet<String> {
        &self.dependencies
    }

    /// Returns `true` if the template contains no expressions.
    pub fn is_static(&self) -> bool {
        self.parts
            .iter()
            .all(|part| matches!(part, Part::Literal(_)))
    }

    /// Evaluates the template against a scope value.
    pub fn evaluate(&self, scope: &Value) -> Result<Interpolated, minijinja::Error> {
        if let [Part::Expression { compiled, .. }] = self.parts.as_slice() {
            let value = compiled.eval(scope.clone())?;
            return Ok(if !value.is_true() {
                Interpolated::Falsy
            } else if value.kind() == ValueKind::Bool {
                Interpolated::True
            } else {
                Interpolated::Text(value.to_string())
            });
        }

        let mut out = String::new();
        let mut saw_true = false;
        for part in &self.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Expression { compiled, .. } => {
                    let value = compiled.eval(scope.clone())?;
                    match value.kind() {
                        ValueKind::Undefined | ValueKind::None => {}
                        ValueKind::Bool => saw_true |= value.is_true(),
                        _ => out.push_str(&value.to_string()),
                    }
                }
            }
        }

        Ok(match (out.is_empty(), saw_true) {
            (true, true) => Interpolated::True,
            (true, false) => Interpolated::Falsy,
            (false, _) => Interpolated::Text(out),
        })
    }
}

fn compile_part(expression: &str, location: &str) -> Result<Part, CompileError> {
    let compiled = environment()
        .compile_expression_owned(expression.to_string())
        .map_err(|e| CompileError::Expression {
            location: location.to_string(),
            message: e.to_string(),
        })?;
    Ok(Part::Expression {
        source: expression.to_string(),
        compiled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Scope;

    fn scope(this: serde_json::Value) -> Value {
        Scope::new()
            .with("this", Value::from_serialize(this))
            .into_value()
    }

    fn eval(source: &str, this: serde_json::Value) -> Interpolated {
        Interpolation::compile(source)
            .unwrap()
            .evaluate(&scope(this))
            .unwrap()
    }

    #[test]
    fn test_lone_expression_keeps_truthiness() {
        use serde_json::json;
        assert_eq!(eval("{{ this.n }}", json!({"n": 5})), Interpolated::Text("5".into()));
        assert_eq!(eval("{{ this.n }}", json!({"n": 0})), Interpolated::Falsy);
        assert_eq!(eval("{{ this.n }}", json!({"n": ""})), Interpolated::Falsy);
        assert_eq!(eval("{{ this.n }}", json!({"n": true})), Interpolated::True);
        assert_eq!(eval("{{ this.missing }}", json!({})), Interpolated::Falsy);
    }

    #[test]
    fn test_mixed_text_drops_booleans_and_none() {
        use serde_json::json;
        let out = eval(
            "a{{ this.t }}b{{ this.f }}c{{ this.z }}",
            json!({"t": true, "f": false, "z": null}),
        );
        assert_eq!(out, Interpolated::Text("abc".into()));
    }

    #[test]
    fn test_mixed_true_only_is_true() {
        use serde_json::json;
        let out = eval("{{ this.a }}{{ this.b }}", json!({"a": true, "b": null}));
        assert_eq!(out, Interpolated::True);
        let out = eval("{{ this.a }}{{ this.b }}", json!({"a": false, "b": null}));
        assert_eq!(out, Interpolated::Falsy);
    }

    #[test]
    fn test_mixed_zero_is_text() {
        let out = eval("count: {{ this.n }}", serde_json::json!({"n": 0}));
        assert_eq!(out, Interpolated::Text("count: 0".into()));
    }

    #[test]
    fn test_outer_whitespace_trimmed_inner_kept() {
        let out = eval(
            "  {{ this.a }} and {{ this.b }}  ",
            serde_json::json!({"a": "x", "b": "y"}),
        );
        assert_eq!(out, Interpolated::Text("x and y".into()));
    }

    #[test]
    fn test_dependencies_scanned_from_source() {
        let interp = Interpolation::compile("{{ this.a }} {{ this.b + this.a }}").unwrap();
        let deps: Vec<_> = interp.dependencies().iter().cloned().collect();
        assert_eq!(deps, vec!["a", "b"]);
    }

    #[test]
    fn test_unclosed_marker_is_literal() {
        let interp = Interpolation::compile("a {{ b").unwrap();
        assert!(interp.is_static());
        assert_eq!(
            interp.evaluate(&Scope::new().into_value()).unwrap(),
            Interpolated::Text("a {{ b".into())
        );
    }

    #[test]
    fn test_invalid_expression_is_compile_error() {
        let err = Interpolation::compile("{{ this.a + }}").unwrap_err();
        assert!(matches!(err, CompileError::Expression { .. }));
    }

    #[test]
    fn test_bare_expression() {
        let interp = Interpolation::expression("this.a > 1").unwrap();
        let out = interp.evaluate(&scope(serde_json::json!({"a": 2}))).unwrap();
        assert_eq!(out, Interpolated::True);
    }

    #[test]
    fn test_helpers_available() {
        let out = eval(
            "{{ class_list('btn', this.on and 'on') }}",
            serde_json::json!({"on": true}),
        );
        assert_eq!(out, Interpolated::Text("btn on".into()));
    }
}
