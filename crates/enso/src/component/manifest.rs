//! YAML component manifests.
//!
//! A manifest describes a component declaratively:
//!
//! ```yaml
//! tag: x-counter
//! template: |
//!   <button @click="()=>this.count++">{{ this.count }}</button>
//! styles:
//!   - "button { font-weight: bold; }"
//! style_files:
//!   - counter.css
//! use_shadow: false
//! expose:
//!   step: 1
//! properties:
//!   count:
//!     value: 0
//!   label:
//!     attribute:
//!       type: String
//!       force: true
//!     value: Clicks
//! ```
//!
//! `template_file` may replace `template`; files are read through a
//! [`ResourceLoader`]. Methods and scripts are code and are attached to the
//! resulting [`ComponentDefinition`] with its builder methods.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use super::definition::ComponentDefinition;
use super::loader::ResourceLoader;
use super::property::PropertySpec;
use crate::error::{DefinitionError, LoadError};
use crate::template::Registry;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentManifest {
    pub tag: String,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub template_file: Option<String>,
    #[serde(default)]
    pub styles: Vec<String>,
    #[serde(default)]
    pub style_files: Vec<String>,
    #[serde(default = "default_use_shadow")]
    pub use_shadow: bool,
    #[serde(default)]
    pub expose: BTreeMap<String, Value>,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyManifest>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyManifest {
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub attribute: Option<AttributeManifest>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeManifest {
    #[serde(rename = "type", default = "default_attribute_type")]
    pub ty: String,
    #[serde(default)]
    pub force: bool,
}

fn default_use_shadow() -> bool {
    true
}

fn default_attribute_type() -> String {
    "String".to_string()
}

impl ComponentManifest {
    pub fn from_yaml(source: &str) -> Result<Self, DefinitionError> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Compiles the manifest into a definition.
    ///
    /// `loader` is only consulted for `template_file` and `style_files`; a
    /// manifest that names files but gets no loader fails with
    /// [`LoadError::NotFound`].
    pub fn into_definition(
        self,
        registry: &Registry,
        loader: Option<&dyn ResourceLoader>,
    ) -> Result<ComponentDefinition, DefinitionError> {
        let load = |path: &str| -> Result<String, LoadError> {
            match loader {
                Some(loader) => loader.load(path),
                None => Err(LoadError::NotFound(path.to_string())),
            }
        };

        let markup = match (&self.template, &self.template_file) {
            (Some(inline), _) => inline.clone(),
            (None, Some(path)) => load(path)?,
            (None, None) => return Err(DefinitionError::MissingTemplate(self.tag)),
        };
        let blueprint = registry.compile(&markup)?;

        let mut definition =
            ComponentDefinition::new(self.tag.as_str(), blueprint).use_shadow(self.use_shadow);

        for (name, property) in self.properties {
            let spec = match property.attribute {
                None => PropertySpec::value(property.value),
                Some(attribute) => {
                    let spec = PropertySpec::attribute_named(&name, &attribute.ty, property.value)?;
                    if attribute.force {
                        spec.forced()
                    } else {
                        spec
                    }
                }
            };
            definition = definition.property(name, spec);
        }
        for sheet in self.styles {
            definition = definition.styles(sheet);
        }
        for path in &self.style_files {
            definition = definition.styles(load(path)?);
        }
        for (name, value) in self.expose {
            definition = definition.expose(name, value);
        }
        Ok(definition)
    }
}
