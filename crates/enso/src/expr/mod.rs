//! Expressions: compilation, dependency scanning and evaluation scope.
//!
//! Directive values are evaluated by minijinja in a shared, read-only
//! environment (see [`environment`]). This module wraps that engine in the
//! three shapes templates need:
//!
//! - [`Interpolation`]: text with `{{ expr }}` markers, for text nodes, bound
//!   attributes and guards
//! - [`Handler`]: the statement language of `@event` attributes
//! - [`Scope`]: the chained lookup an expression evaluates against
//!
//! Dependencies are found lexically by [`scan_dependencies`].

mod environment;
mod handler;
mod interpolation;
mod scanner;
mod scope;

pub use environment::{environment, register_helpers};
pub use handler::{Handler, Statement};
pub use interpolation::{Interpolated, Interpolation};
pub use scanner::{scan_dependencies, scan_into};
pub use scope::{Fields, Scope};
