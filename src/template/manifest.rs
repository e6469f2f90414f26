//! Protocol manifest: the JSON form of a set of compiled templates
//!
//! ```json
//! {
//!   "protocol": "vending-machine",
//!   "templates": [
//!     { "name": "transfer", "version": "v1alpha7", "encoding": "hex",
//!       "bytecode": "0d03…", "parameters": [{ "name": "quantity", "type": "int" }] }
//!   ]
//! }
//! ```

use super::{ParamType, ParameterSchema, TransactionTemplate};
use crate::error::TemplateError;
use crate::types::{PayloadEncoding, TemplateId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub protocol: Option<String>,
    pub templates: Vec<ManifestTemplate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestTemplate {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub encoding: PayloadEncoding,
    pub bytecode: String,
    #[serde(default)]
    pub parameters: Vec<ManifestParameter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ParamType,
}

impl Manifest {
    pub fn from_json(json: &str) -> Result<Self, TemplateError> {
        serde_json::from_str(json).map_err(|e| TemplateError::InvalidManifest(e.to_string()))
    }
}

impl ManifestTemplate {
    pub fn into_template(self) -> Result<TransactionTemplate, TemplateError> {
        if self.name.is_empty() || self.version.is_empty() {
            return Err(TemplateError::InvalidManifest(
                "template name and version are required".to_string(),
            ));
        }
        let bytecode = self.encoding.decode(&self.bytecode).map_err(|e| {
            TemplateError::InvalidManifest(format!("{}@{}: {}", self.name, self.version, e))
        })?;
        if bytecode.is_empty() {
            return Err(TemplateError::InvalidManifest(format!(
                "{}@{}: empty bytecode",
                self.name, self.version
            )));
        }
        let schema =
            ParameterSchema::from_params(self.parameters.into_iter().map(|p| (p.name, p.ty)))?;
        Ok(TransactionTemplate::new(
            TemplateId::new(self.name, self.version),
            bytecode,
            self.encoding,
            schema,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateRegistry;
    use crate::test_utils::VENDING_MACHINE_MANIFEST;

    #[test]
    fn test_load_vending_machine_manifest() {
        let registry = TemplateRegistry::from_manifest_str(VENDING_MACHINE_MANIFEST).unwrap();
        assert_eq!(registry.len(), 2);

        let transfer = registry.lookup("transfer", "v1alpha7").unwrap();
        let names: Vec<&str> = transfer.schema().iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["quantity", "receiver", "sender"]);
        assert_eq!(transfer.schema().get("quantity"), Some(ParamType::Int));
        assert!(transfer.bytecode_text().starts_with("0d0300"));

        let mint = registry.lookup("mint_from_script", "v1alpha7").unwrap();
        assert_eq!(mint.schema().get("minter"), Some(ParamType::Address));
    }

    #[test]
    fn test_base64_bytecode() {
        let json = r#"{"templates": [{"name": "t", "version": "v1", "encoding": "base64",
            "bytecode": "DQM=", "parameters": [{"name": "flag", "type": "bool"}]}]}"#;
        let registry = TemplateRegistry::from_manifest_str(json).unwrap();
        let template = registry.lookup("t", "v1").unwrap();
        assert_eq!(template.bytecode(), &[0x0d, 0x03]);
        assert_eq!(template.bytecode_text(), "DQM=");
    }

    #[test]
    fn test_invalid_manifests() {
        let cases = [
            "not json",
            r#"{"templates": [{"name": "t", "version": "v1", "bytecode": "zz"}]}"#,
            r#"{"templates": [{"name": "t", "version": "v1", "bytecode": ""}]}"#,
            r#"{"templates": [{"name": "t", "version": "v1", "bytecode": "0d",
                "parameters": [{"name": "a", "type": "float"}]}]}"#,
        ];
        for json in cases {
            assert!(
                matches!(
                    TemplateRegistry::from_manifest_str(json),
                    Err(TemplateError::InvalidManifest(_))
                ),
                "{}",
                json
            );
        }

        let duplicate = r#"{"templates": [
            {"name": "t", "version": "v1", "bytecode": "0d"},
            {"name": "t", "version": "v1", "bytecode": "0e"}]}"#;
        assert!(matches!(
            TemplateRegistry::from_manifest_str(duplicate),
            Err(TemplateError::Conflict { .. })
        ));
    }
}
