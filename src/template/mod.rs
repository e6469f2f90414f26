//! Versioned transaction templates
//!
//! A template is compiled IR bytecode plus the ordered schema of its parameters.
//! Templates are immutable once registered and are always looked up by an
//! explicit `(name, version)`; there is no "latest".

pub mod manifest;

pub use manifest::{Manifest, ManifestParameter, ManifestTemplate};

use crate::error::TemplateError;
use crate::types::{PayloadEncoding, TemplateId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Declared type of a template parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Int,
    Text,
    Address,
    Bytes,
    Bool,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamType::Int => "int",
            ParamType::Text => "text",
            ParamType::Address => "address",
            ParamType::Bytes => "bytes",
            ParamType::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// Ordered parameter declarations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSchema {
    params: Vec<(String, ParamType)>,
}

impl ParameterSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append; used for literal schemas in code
    pub fn with(mut self, name: impl Into<String>, ty: ParamType) -> Self {
        self.params.push((name.into(), ty));
        self
    }

    /// Build from declarations, rejecting duplicate names
    pub fn from_params(
        params: impl IntoIterator<Item = (String, ParamType)>,
    ) -> Result<Self, TemplateError> {
        let mut schema = ParameterSchema::new();
        for (name, ty) in params {
            if schema.get(&name).is_some() {
                return Err(TemplateError::InvalidManifest(format!(
                    "duplicate parameter `{}`",
                    name
                )));
            }
            schema.params.push((name, ty));
        }
        Ok(schema)
    }

    pub fn get(&self, name: &str) -> Option<ParamType> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, ty)| *ty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ParamType)> {
        self.params.iter().map(|(n, ty)| (n.as_str(), *ty))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Compiled IR plus its parameter schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionTemplate {
    id: TemplateId,
    bytecode: Vec<u8>,
    encoding: PayloadEncoding,
    schema: ParameterSchema,
}

impl TransactionTemplate {
    pub fn new(
        id: TemplateId,
        bytecode: Vec<u8>,
        encoding: PayloadEncoding,
        schema: ParameterSchema,
    ) -> Self {
        TransactionTemplate {
            id,
            bytecode,
            encoding,
            schema,
        }
    }

    pub fn id(&self) -> &TemplateId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.id.name
    }

    /// IR version, sent as `tir.version`
    pub fn version(&self) -> &str {
        &self.id.version
    }

    pub fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }

    /// Bytecode in its wire encoding
    pub fn bytecode_text(&self) -> String {
        self.encoding.encode(&self.bytecode)
    }

    pub fn encoding(&self) -> PayloadEncoding {
        self.encoding
    }

    pub fn schema(&self) -> &ParameterSchema {
        &self.schema
    }
}

/// Templates keyed by `(name, version)`
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<TemplateId, Arc<TransactionTemplate>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template from its parts
    pub fn register(
        &mut self,
        name: &str,
        version: &str,
        bytecode: Vec<u8>,
        schema: ParameterSchema,
    ) -> Result<Arc<TransactionTemplate>, TemplateError> {
        self.insert(TransactionTemplate::new(
            TemplateId::new(name, version),
            bytecode,
            PayloadEncoding::Hex,
            schema,
        ))
    }

    /// Register a fully built template
    pub fn insert(
        &mut self,
        template: TransactionTemplate,
    ) -> Result<Arc<TransactionTemplate>, TemplateError> {
        if self.templates.contains_key(template.id()) {
            return Err(TemplateError::Conflict {
                name: template.name().to_string(),
                version: template.version().to_string(),
            });
        }
        let template = Arc::new(template);
        self.templates
            .insert(template.id().clone(), template.clone());
        Ok(template)
    }

    /// Look up an exact version
    pub fn lookup(
        &self,
        name: &str,
        version: &str,
    ) -> Result<Arc<TransactionTemplate>, TemplateError> {
        self.templates
            .get(&TemplateId::new(name, version))
            .cloned()
            .ok_or_else(|| TemplateError::NotFound {
                name: name.to_string(),
                version: version.to_string(),
            })
    }

    /// Registered versions of `name`, sorted. Diagnostic only.
    pub fn versions(&self, name: &str) -> Vec<String> {
        let mut versions: Vec<String> = self
            .templates
            .keys()
            .filter(|id| id.name == name)
            .map(|id| id.version.clone())
            .collect();
        versions.sort();
        versions
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Load every template declared in a manifest
    pub fn from_manifest_str(json: &str) -> Result<Self, TemplateError> {
        let manifest = Manifest::from_json(json)?;
        let mut registry = TemplateRegistry::new();
        for entry in manifest.templates {
            registry.insert(entry.into_template()?)?;
        }
        Ok(registry)
    }
}
