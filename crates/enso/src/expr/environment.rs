//! The shared expression environment.
//!
//! All template expressions are compiled against one immutable minijinja
//! [`Environment`]. It is created on first use and never mutated afterwards,
//! so compiled expressions can borrow it for `'static` and be cached freely.
//!
//! Besides minijinja's default filters and tests, the environment whitelists
//! two helpers for templates:
//!
//! | Helper | Result |
//! |--------|--------|
//! | `class_list(a, b, ...)` | truthy arguments joined with spaces |
//! | `css_obj(map)` | css declarations from a (possibly nested) map |
//!
//! Expressions see nothing else: there is no ambient global object, no timer
//! or evaluation entry point. Everything else reaches an expression through the
//! explicit [`Scope`](super::Scope).

use minijinja::value::{Rest, ValueKind};
use minijinja::{Environment, Error, ErrorKind, Value};
use once_cell::sync::Lazy;

static ENVIRONMENT: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    register_helpers(&mut env);
    env
});

/// Returns the process-wide expression environment.
pub fn environment() -> &'static Environment<'static> {
    &ENVIRONMENT
}

/// Registers the template helpers on `env`.
pub fn register_helpers(env: &mut Environment<'static>) {
    env.add_function("class_list", class_list);
    env.add_function("css_obj", css_obj);
}

/// Joins every truthy argument into a class attribute value.
fn class_list(classes: Rest<Value>) -> String {
    classes
        .iter()
        .filter(|class| class.is_true())
        .map(|class| class.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds css text from a map. Keys are converted from camelCase to
/// dash-case; nested maps become rule blocks; falsy values are skipped.
fn css_obj(css: Value) -> Result<String, Error> {
    if css.kind() != ValueKind::Map {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            "css_obj expects a map of declarations",
        ));
    }

    let mut out = String::new();
    for key in css.try_iter()? {
        let value = css.get_item(&key)?;
        if !value.is_true() {
            continue;
        }
        let name = camel_to_dash(&key.to_string());
        if value.kind() == ValueKind::Map {
            out.push_str(&format!("{} {{{}}}\n", name, css_obj(value)?));
        } else {
            out.push_str(&format!("{}:{};", name, value));
        }
    }
    Ok(out)
}

fn camel_to_dash(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut previous_is_word = false;
    for ch in name.chars() {
        if ch.is_ascii_uppercase() && previous_is_word {
            out.push('-');
        }
        out.push(ch.to_ascii_lowercase());
        previous_is_word = ch.is_alphanumeric() || ch == '_';
    }
    out
}
