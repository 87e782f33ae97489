//! Error types for compiling templates, defining components and driving the
//! runtime.
//!
//! Compile and definition errors are fatal for the template or component they
//! concern and are always returned to the caller. Runtime evaluation problems
//! (a broken event handler, an expression that fails on the current values)
//! are not errors at this level: they are logged and rendering continues.

use enso_markup::MarkupError;
use thiserror::Error;

use crate::runtime::InstanceId;

/// Failure while compiling markup into a [`Blueprint`](crate::Blueprint).
#[derive(Debug, Error)]
pub enum CompileError {
    /// The markup itself could not be parsed.
    #[error(transparent)]
    Markup(#[from] MarkupError),

    /// An expression in a text node, bound attribute or directive did not compile.
    #[error("invalid expression in {location}: {message}")]
    Expression { location: String, message: String },

    /// A `*` directive attribute that no registered parser claims.
    #[error("unsupported directive '{attribute}'")]
    UnsupportedDirective { attribute: String },
}

/// Failure while loading template or style text through a
/// [`ResourceLoader`](crate::ResourceLoader).
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure while building or registering a component definition.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// A property declared an attribute type other than Boolean, Number or String.
    #[error("component attribute '{property}' has unsupported type '{ty}'")]
    UnsupportedAttributeType { property: String, ty: String },

    /// Custom element names must be lowercase and contain a hyphen.
    #[error("invalid component tag '{0}': tags must be lowercase and contain a '-'")]
    InvalidTag(String),

    #[error("component '{0}' is already defined")]
    DuplicateTag(String),

    /// A manifest had neither inline template text nor a template file.
    #[error("component '{0}' has no template")]
    MissingTemplate(String),

    #[error("invalid component manifest: {0}")]
    Manifest(#[from] serde_yaml::Error),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Failure of a runtime operation addressed to the wrong kind of instance.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("no component is defined for tag '{0}'")]
    UnknownTag(String),

    #[error("instance {0} is not a component")]
    NotAComponent(InstanceId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_names_attribute() {
        let err = CompileError::UnsupportedDirective {
            attribute: "*for".into(),
        };
        assert!(err.to_string().contains("*for"));
    }

    #[test]
    fn test_definition_error_wraps_compile_error() {
        let err: DefinitionError = CompileError::UnsupportedDirective {
            attribute: "*repeat".into(),
        }
        .into();
        assert!(matches!(err, DefinitionError::Compile(_)));
        assert!(err.to_string().contains("*repeat"));
    }

    #[test]
    fn test_unsupported_type_message() {
        let err = DefinitionError::UnsupportedAttributeType {
            property: "when".into(),
            ty: "Date".into(),
        };
        assert_eq!(
            err.to_string(),
            "component attribute 'when' has unsupported type 'Date'"
        );
    }
}
