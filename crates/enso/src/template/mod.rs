//! Template compilation.
//!
//! Markup goes in; a [`Blueprint`] comes out. The blueprint holds the markup
//! with all directive syntax stripped and one [`NodeDefinition`] per node that
//! needs runtime work. Definitions are found again in each instantiated copy
//! through node markers, so instantiation never re-parses or re-walks the
//! template.
//!
//! Compilation goes through a [`Registry`], which decides what counts as a
//! directive (see [`parsers`]) and caches compiled results.

mod blueprint;
mod compiler;
mod definition;
pub mod parsers;
mod registry;

pub use blueprint::{Blueprint, Instance};
pub use definition::{AttributeBinding, Directive, EventBinding, NodeDefinition};
pub use parsers::{CompileContext, DirectiveParser};
pub use registry::Registry;
