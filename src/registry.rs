//! # Renderer Registry
//!
//! Maps renderer type names (`"text"`, `"title_image"`, ...) to renderer
//! implementations and their parameter contracts.
//!
//! The registry is an ordinary value: build one at startup, share it by
//! reference (or `Arc`), and build isolated ones in tests. Registering a
//! name twice replaces the earlier entry.
//!
//! ## Parameter Contracts
//!
//! Schedule parameters arrive as an untyped map. Each renderer declares
//! which fields it takes:
//!
//! ```text
//! main_title     string   required
//! sub_title      string
//! border         integer
//! dither_type    enum     DIFFUSION | ORDERED | NONE
//! ```
//!
//! The contract is checked before a renderer runs, then the map is
//! deserialized into the renderer's own typed params struct.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::DotmateError;
use crate::renderers::Renderer;

/// Untyped renderer parameters as they appear in configuration.
pub type Params = serde_json::Map<String, Value>;

/// Value type of a contract field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Enum,
}

/// One field of a parameter contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
}

impl ParamSpec {
    fn new(name: &'static str, param_type: ParamType) -> Self {
        Self {
            name,
            param_type,
            required: false,
            allowed: Vec::new(),
            description: None,
        }
    }

    pub fn string(name: &'static str) -> Self {
        Self::new(name, ParamType::String)
    }

    pub fn integer(name: &'static str) -> Self {
        Self::new(name, ParamType::Integer)
    }

    pub fn one_of(name: &'static str, allowed: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
            ..Self::new(name, ParamType::Enum)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    fn check(&self, value: &Value) -> Result<(), String> {
        match self.param_type {
            ParamType::String if value.is_string() => Ok(()),
            ParamType::String => Err(format!("'{}' must be a string", self.name)),
            ParamType::Integer if value.as_i64().is_some() => Ok(()),
            ParamType::Integer => Err(format!("'{}' must be an integer", self.name)),
            ParamType::Enum => match value.as_str() {
                Some(s) if self.allowed.contains(&s) => Ok(()),
                _ => Err(format!(
                    "'{}' must be one of {}, got {}",
                    self.name,
                    self.allowed.join(", "),
                    value
                )),
            },
        }
    }
}

/// The declared parameters of a renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParamContract {
    pub fields: Vec<ParamSpec>,
}

impl ParamContract {
    pub fn new(fields: Vec<ParamSpec>) -> Self {
        Self { fields }
    }

    /// Append more fields (used to share image options between renderers).
    pub fn extend(mut self, more: impl IntoIterator<Item = ParamSpec>) -> Self {
        self.fields.extend(more);
        self
    }

    pub fn field(&self, name: &str) -> Option<&ParamSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check required fields, value types and enum membership.
    ///
    /// `null` counts as absent. Fields the contract does not mention are
    /// ignored.
    pub fn validate(&self, kind: &str, params: &Params) -> Result<(), DotmateError> {
        for field in &self.fields {
            match params.get(field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        return Err(DotmateError::invalid_params(
                            kind,
                            format!("missing required field '{}'", field.name),
                        ));
                    }
                }
                Some(value) => field
                    .check(value)
                    .map_err(|reason| DotmateError::invalid_params(kind, reason))?,
            }
        }
        Ok(())
    }

    /// Validate, then deserialize into a renderer's typed params.
    pub fn parse<T: DeserializeOwned>(&self, kind: &str, params: &Params) -> Result<T, DotmateError> {
        self.validate(kind, params)?;
        serde_json::from_value(Value::Object(params.clone()))
            .map_err(|e| DotmateError::invalid_params(kind, e.to_string()))
    }
}

/// A registered renderer and the contract captured at registration.
#[derive(Clone)]
pub struct RegistryEntry {
    pub renderer: Arc<dyn Renderer>,
    pub contract: ParamContract,
}

/// Introspection record for external tooling (config editors, `types`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RendererInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub params: ParamContract,
}

/// Name → renderer table.
#[derive(Clone, Default)]
pub struct RendererRegistry {
    entries: BTreeMap<String, RegistryEntry>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a renderer under a type name, replacing any previous one.
    pub fn register(&mut self, kind: impl Into<String>, renderer: Arc<dyn Renderer>) {
        let contract = renderer.contract();
        self.entries.insert(kind.into(), RegistryEntry { renderer, contract });
    }

    pub fn resolve(&self, kind: &str) -> Result<&RegistryEntry, DotmateError> {
        self.entries
            .get(kind)
            .ok_or_else(|| DotmateError::UnknownRendererKind(kind.to_string()))
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.entries.contains_key(kind)
    }

    /// All registered types with their contracts, sorted by name.
    pub fn list_types(&self) -> Vec<RendererInfo> {
        self.entries
            .iter()
            .map(|(kind, entry)| RendererInfo {
                kind: kind.clone(),
                params: entry.contract.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{RenderedPayload, TextPayload};
    use crate::renderers::{RenderContext, RenderRequest};
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;

    struct Fixed(&'static str);

    #[async_trait]
    impl Renderer for Fixed {
        fn kind(&self) -> &'static str {
            "fixed"
        }

        fn contract(&self) -> ParamContract {
            ParamContract::new(vec![ParamSpec::string("message").required()])
        }

        async fn produce(
            &self,
            _ctx: &RenderContext,
            _request: &RenderRequest,
        ) -> Result<RenderedPayload, DotmateError> {
            Ok(RenderedPayload::Text(TextPayload {
                title: None,
                body: self.0.to_string(),
                signature: None,
                icon: None,
                link: None,
            }))
        }
    }

    fn params(v: Value) -> Params {
        v.as_object().cloned().unwrap()
    }

    fn contract() -> ParamContract {
        ParamContract::new(vec![
            ParamSpec::string("title").required(),
            ParamSpec::integer("border"),
            ParamSpec::one_of("dither_type", ["DIFFUSION", "ORDERED", "NONE"]),
        ])
    }

    #[test]
    fn test_validate_accepts_valid() {
        let p = params(json!({"title": "Hi", "border": 1, "dither_type": "ORDERED", "extra": true}));
        assert!(contract().validate("t", &p).is_ok());
    }

    #[test]
    fn test_validate_missing_required() {
        let err = contract().validate("t", &params(json!({"border": 1}))).unwrap_err();
        assert!(matches!(err, DotmateError::ParameterValidationFailed { .. }));
        assert!(err.to_string().contains("title"));

        let err = contract().validate("t", &params(json!({"title": null}))).unwrap_err();
        assert!(matches!(err, DotmateError::ParameterValidationFailed { .. }));
    }

    #[test]
    fn test_validate_wrong_types() {
        assert!(contract().validate("t", &params(json!({"title": 5}))).is_err());
        assert!(contract().validate("t", &params(json!({"title": "x", "border": "1"}))).is_err());
        assert!(contract().validate("t", &params(json!({"title": "x", "border": 1.5}))).is_err());
    }

    #[test]
    fn test_validate_enum_membership() {
        let err = contract()
            .validate("t", &params(json!({"title": "x", "dither_type": "FANCY"})))
            .unwrap_err();
        assert!(err.to_string().contains("DIFFUSION, ORDERED, NONE"));
    }

    #[test]
    fn test_parse_into_typed() {
        #[derive(Deserialize)]
        struct P {
            title: String,
            border: Option<u8>,
        }
        let p: P = contract()
            .parse("t", &params(json!({"title": "x", "border": 1})))
            .unwrap();
        assert_eq!(p.title, "x");
        assert_eq!(p.border, Some(1));
    }

    #[test]
    fn test_registry_resolve_and_overwrite() {
        let mut registry = RendererRegistry::new();
        registry.register("text", Arc::new(Fixed("first")));
        registry.register("other", Arc::new(Fixed("other")));
        registry.register("text", Arc::new(Fixed("second")));

        let types: Vec<String> = registry.list_types().into_iter().map(|i| i.kind).collect();
        assert_eq!(types, vec!["other", "text"]);
        assert!(registry.resolve("text").is_ok());
        assert!(matches!(
            registry.resolve("nope"),
            Err(DotmateError::UnknownRendererKind(k)) if k == "nope"
        ));
    }

    #[tokio::test]
    async fn test_overwrite_uses_latest_renderer() {
        let mut registry = RendererRegistry::new();
        registry.register("text", Arc::new(Fixed("first")));
        registry.register("text", Arc::new(Fixed("second")));

        let entry = registry.resolve("text").unwrap();
        let ctx = RenderContext::offline();
        let request = RenderRequest::new("dev", params(json!({"message": "m"})));
        match entry.renderer.produce(&ctx, &request).await.unwrap() {
            RenderedPayload::Text(t) => assert_eq!(t.body, "second"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_contract_serializes_for_introspection() {
        let json = serde_json::to_value(contract()).unwrap();
        assert_eq!(json[0]["name"], "title");
        assert_eq!(json[0]["type"], "string");
        assert_eq!(json[0]["required"], true);
        assert_eq!(json[2]["allowed"], json!(["DIFFUSION", "ORDERED", "NONE"]));
        assert!(json[1].get("allowed").is_none());
    }
}
