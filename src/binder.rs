//! Argument binding
//!
//! Turns a caller's loosely typed JSON object into [`BoundArguments`] that
//! satisfy a template's schema exactly. Nothing reaches the resolver unless
//! binding succeeds.

use crate::address::Address;
use crate::error::ParameterError;
use crate::template::{ParamType, TransactionTemplate};
use crate::types::{PayloadEncoding, TemplateId};
use serde_json::{json, Map, Value};

/// A normalized argument value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentValue {
    Integer(i64),
    Text(String),
    Address(Address),
    Bytes(Vec<u8>),
    Bool(bool),
}

impl ArgumentValue {
    /// Resolver wire form: addresses as raw hex, bytes as `{content, encoding}`
    pub fn to_wire(&self) -> Value {
        match self {
            ArgumentValue::Integer(n) => json!(n),
            ArgumentValue::Text(s) => json!(s),
            ArgumentValue::Address(a) => json!(a.to_hex()),
            ArgumentValue::Bytes(b) => json!({
                "content": hex::encode(b),
                "encoding": "hex",
            }),
            ArgumentValue::Bool(b) => json!(b),
        }
    }
}

/// Arguments validated against one template, in schema order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundArguments {
    template: TemplateId,
    values: Vec<(String, ArgumentValue)>,
}

impl BoundArguments {
    /// Template these arguments were bound against
    pub fn template(&self) -> &TemplateId {
        &self.template
    }

    pub fn get(&self, name: &str) -> Option<&ArgumentValue> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgumentValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn to_wire(&self) -> Map<String, Value> {
        self.values
            .iter()
            .map(|(name, value)| (name.clone(), value.to_wire()))
            .collect()
    }
}

/// Validate `raw` against the template schema
///
/// Missing parameters are reported (in schema order) before unexpected ones.
pub fn bind(template: &TransactionTemplate, raw: &Value) -> Result<BoundArguments, ParameterError> {
    let object = raw.as_object().ok_or_else(|| ParameterError::TypeMismatch {
        name: "<args>".to_string(),
        expected: "object".to_string(),
        got: kind(raw).to_string(),
    })?;

    let schema = template.schema();
    if let Some((name, _)) = schema.iter().find(|(name, _)| !object.contains_key(*name)) {
        return Err(ParameterError::Missing(name.to_string()));
    }
    if let Some(name) = object.keys().find(|key| schema.get(key).is_none()) {
        return Err(ParameterError::Unexpected(name.clone()));
    }

    let mut values = Vec::with_capacity(schema.len());
    for (name, ty) in schema.iter() {
        // presence checked above
        let value = &object[name];
        values.push((name.to_string(), convert(name, ty, value)?));
    }

    Ok(BoundArguments {
        template: template.id().clone(),
        values,
    })
}

fn convert(name: &str, ty: ParamType, value: &Value) -> Result<ArgumentValue, ParameterError> {
    let mismatch = || ParameterError::TypeMismatch {
        name: name.to_string(),
        expected: ty.to_string(),
        got: kind(value).to_string(),
    };

    match ty {
        ParamType::Int => match value {
            Value::Number(n) => n.as_i64().map(ArgumentValue::Integer).ok_or_else(mismatch),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(ArgumentValue::Integer)
                .map_err(|_| mismatch()),
            _ => Err(mismatch()),
        },
        ParamType::Text => value
            .as_str()
            .map(|s| ArgumentValue::Text(s.to_string()))
            .ok_or_else(mismatch),
        ParamType::Address => {
            let text = value.as_str().ok_or_else(mismatch)?;
            Address::parse(text)
                .map(ArgumentValue::Address)
                .map_err(|_| mismatch())
        }
        ParamType::Bytes => convert_bytes(value)
            .map(ArgumentValue::Bytes)
            .ok_or_else(mismatch),
        ParamType::Bool => value.as_bool().map(ArgumentValue::Bool).ok_or_else(mismatch),
    }
}

/// `"0x…"` or `{ "content": …, "encoding": "hex" | "base64" }`
fn convert_bytes(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::String(s) => {
            let hex_text = s.strip_prefix("0x")?;
            hex::decode(hex_text).ok()
        }
        Value::Object(obj) => {
            let content = obj.get("content")?.as_str()?;
            let encoding: PayloadEncoding = match obj.get("encoding") {
                Some(enc) => serde_json::from_value(enc.clone()).ok()?,
                None => PayloadEncoding::Hex,
            };
            encoding.decode(content).ok()
        }
        _ => None,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{transfer_args, transfer_template, ADMIN_ADDRESS};
    use rstest::rstest;

    #[test]
    fn test_bind_complete_arguments() {
        let template = transfer_template();
        let bound = bind(&template, &transfer_args()).unwrap();
        assert_eq!(bound.len(), 3);
        let names: Vec<&str> = bound.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["quantity", "receiver", "sender"]);
        assert_eq!(bound.get("quantity"), Some(&ArgumentValue::Integer(1_000_000)));
        assert_eq!(bound.template(), template.id());

        // bech32 normalized to raw hex on the wire
        let wire = bound.to_wire();
        let expected = Address::from_bech32(ADMIN_ADDRESS).unwrap().to_hex();
        assert_eq!(wire["sender"], json!(expected));
    }

    #[rstest]
    #[case("quantity")]
    #[case("receiver")]
    #[case("sender")]
    fn test_missing_parameter(#[case] omitted: &str) {
        let template = transfer_template();
        let mut args = transfer_args();
        args.as_object_mut().unwrap().remove(omitted);
        assert_eq!(
            bind(&template, &args).unwrap_err(),
            ParameterError::Missing(omitted.to_string())
        );
    }

    #[test]
    fn test_missing_reported_before_unexpected() {
        let template = transfer_template();
        let mut args = transfer_args();
        let obj = args.as_object_mut().unwrap();
        obj.remove("sender");
        obj.insert("memo".to_string(), json!("hi"));
        assert_eq!(
            bind(&template, &args).unwrap_err(),
            ParameterError::Missing("sender".to_string())
        );

        args["sender"] = json!(ADMIN_ADDRESS);
        assert_eq!(
            bind(&template, &args).unwrap_err(),
            ParameterError::Unexpected("memo".to_string())
        );
    }

    #[rstest]
    #[case(json!("ten"), "string")]
    #[case(json!(1.5), "number")]
    #[case(json!(null), "null")]
    #[case(json!(u64::MAX), "number")]
    fn test_int_type_mismatch(#[case] quantity: Value, #[case] got: &str) {
        let template = transfer_template();
        let mut args = transfer_args();
        args["quantity"] = quantity;
        assert_eq!(
            bind(&template, &args).unwrap_err(),
            ParameterError::TypeMismatch {
                name: "quantity".to_string(),
                expected: "int".to_string(),
                got: got.to_string(),
            }
        );
    }

    #[test]
    fn test_int_from_decimal_string() {
        let template = transfer_template();
        let mut args = transfer_args();
        args["quantity"] = json!("42");
        let bound = bind(&template, &args).unwrap();
        assert_eq!(bound.get("quantity"), Some(&ArgumentValue::Integer(42)));
    }

    #[rstest]
    #[case::bad_bech32("addr_test1notreal".to_string())]
    #[case::truncated_base(format!("00{}", "ab".repeat(28)))]
    #[case::reserved_header(format!("90{}", "cd".repeat(40)))]
    fn test_invalid_address(#[case] receiver: String) {
        let template = transfer_template();
        let mut args = transfer_args();
        args["receiver"] = json!(receiver);
        assert!(matches!(
            bind(&template, &args),
            Err(ParameterError::TypeMismatch { name, .. }) if name == "receiver"
        ));
    }

    #[test]
    fn test_non_object_arguments() {
        let template = transfer_template();
        assert_eq!(
            bind(&template, &json!([1, 2])).unwrap_err(),
            ParameterError::TypeMismatch {
                name: "<args>".to_string(),
                expected: "object".to_string(),
                got: "array".to_string(),
            }
        );
    }

    #[rstest]
    #[case(json!("0xdeadbeef"))]
    #[case(json!({"content": "deadbeef", "encoding": "hex"}))]
    #[case(json!({"content": "3q2+7w==", "encoding": "base64"}))]
    fn test_bytes_forms(#[case] raw: Value) {
        assert_eq!(convert_bytes(&raw), Some(vec![0xde, 0xad, 0xbe, 0xef]));
    }

    #[test]
    fn test_bytes_and_bool_wire() {
        assert_eq!(convert_bytes(&json!("deadbeef")), None);
        assert_eq!(
            ArgumentValue::Bytes(vec![0xab]).to_wire(),
            json!({"content": "ab", "encoding": "hex"})
        );
        assert_eq!(
            convert("flag", ParamType::Bool, &json!(true)).unwrap(),
            ArgumentValue::Bool(true)
        );
        assert!(convert("flag", ParamType::Bool, &json!("true")).is_err());
    }
}
