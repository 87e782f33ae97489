//! Dependency scanning.
//!
//! An expression depends on every reactive field it names through the fixed
//! self-reference syntax `this.<field>`. The scan is purely lexical: it does
//! not parse the expression, so a `this.x` inside a string literal counts as
//! well. The resulting set is fixed for the lifetime of the compiled
//! definition.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

static SELF_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bthis\.(\w+)").expect("self-reference pattern is valid"));

/// Returns the field names referenced by `source`, sorted and deduplicated.
///
/// ```rust
/// use enso::expr::scan_dependencies;
///
/// let deps = scan_dependencies("{{ this.first }} {{ this.last }} {{ this.first }}");
/// assert_eq!(deps.into_iter().collect::<Vec<_>>(), vec!["first", "last"]);
/// ```
pub fn scan_dependencies(source: &str) -> BTreeSet<String> {
    let mut fields = BTreeSet::new();
    scan_into(source, &mut fields);
    fields
}

/// Adds the field names referenced by `source` to `fields`.
pub fn scan_into(source: &str, fields: &mut BTreeSet<String>) {
    for captures in SELF_REFERENCE.captures_iter(source) {
        fields.insert(captures[1].to_string());
    }
}
