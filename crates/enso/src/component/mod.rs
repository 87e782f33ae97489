//! Component definitions.
//!
//! A component is a custom element backed by a compiled template, a property
//! schema and optional behavior. Definitions are built in code with
//! [`ComponentDefinition`] or loaded from YAML with [`ComponentManifest`], and
//! registered on a [`Runtime`](crate::Runtime), which creates and drives the
//! instances.

mod definition;
mod loader;
mod manifest;
mod property;
mod script;
mod style;

pub use definition::ComponentDefinition;
pub use loader::{FileLoader, MemoryLoader, ResourceLoader};
pub use manifest::{AttributeManifest, ComponentManifest, PropertyManifest};
pub use property::{AttributeConverter, AttributeType, Property, PropertyKind, PropertySpec};
pub use script::{ComponentScript, Method};
pub use style::{StyleAttacher, StyleElements};
