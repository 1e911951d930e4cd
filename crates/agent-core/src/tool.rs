//! Tool System
//!
//! Tools declare a [`ToolSignature`] (name, doc text, parameters) at registration
//! time. The signature is turned into a provider-neutral [`ToolSchema`] for the
//! completion endpoint and is also used to bind the model's keyword arguments
//! when the tool is invoked.
//!
//! Every tool returns a [`ToolOutput`]: either a reply relayed to the model, or
//! a handoff to another [`Agent`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::agent::Agent;
use crate::error::{AgentError, Result};
use crate::message::ToolCall;

/// Primitive schema kind of a tool parameter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    Null,
}

impl ParamKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Null => "null",
        }
    }

    /// Map a declared type name onto a schema kind.
    ///
    /// Unrecognized or missing annotations fall back to `string`.
    pub fn from_annotation(annotation: &str) -> Self {
        match annotation.trim() {
            "str" | "&str" | "String" | "string" => Self::String,
            "int" | "integer" | "i8" | "i16" | "i32" | "i64" | "isize" | "u8" | "u16" | "u32"
            | "u64" | "usize" => Self::Integer,
            "float" | "number" | "f32" | "f64" => Self::Number,
            "bool" | "boolean" => Self::Boolean,
            "list" | "array" | "Vec" => Self::Array,
            "dict" | "object" | "HashMap" | "BTreeMap" | "Map" => Self::Object,
            "None" | "null" | "()" => Self::Null,
            _ => Self::String,
        }
    }
}

impl std::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rust types with a fixed schema kind
pub trait SchemaKind {
    const KIND: ParamKind;
}

macro_rules! schema_kind {
    ($kind:expr => $($ty:ty),+) => {
        $(impl SchemaKind for $ty { const KIND: ParamKind = $kind; })+
    };
}

schema_kind!(ParamKind::String => String, &str, char);
schema_kind!(ParamKind::Integer => i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
schema_kind!(ParamKind::Number => f32, f64);
schema_kind!(ParamKind::Boolean => bool);
schema_kind!(ParamKind::Object => Map<String, Value>);
schema_kind!(ParamKind::Null => ());

impl<T> SchemaKind for Vec<T> {
    const KIND: ParamKind = ParamKind::Array;
}

impl<V, S> SchemaKind for HashMap<String, V, S> {
    const KIND: ParamKind = ParamKind::Object;
}

/// A declared tool parameter
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    /// Value used when the model omits the argument; `None` makes the parameter required
    pub default: Option<Value>,
}

impl Param {
    /// Parameter without a type annotation (schema kind `string`)
    pub fn new(name: impl Into<String>) -> Self {
        Self::of_kind(name, ParamKind::String)
    }

    /// Parameter typed by a Rust type
    pub fn typed<T: SchemaKind>(name: impl Into<String>) -> Self {
        Self::of_kind(name, T::KIND)
    }

    pub fn of_kind(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub const fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Declared shape of a tool: what the schema builder inspects
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ToolSignature {
    pub name: String,
    pub doc: Option<String>,
    pub params: Vec<Param>,
}

impl ToolSignature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Build the provider-neutral function schema.
    ///
    /// Fails with [`AgentError::Schema`] when the signature cannot be described:
    /// an invalid tool name, or missing or duplicated parameter names.
    pub fn schema(&self) -> Result<ToolSchema> {
        if !is_valid_name(&self.name) {
            return Err(AgentError::Schema(format!(
                "invalid tool name '{}': expected 1-64 characters of [A-Za-z0-9_-]",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.params {
            if param.name.trim().is_empty() {
                return Err(AgentError::Schema(format!(
                    "tool '{}' declares a parameter without a name",
                    self.name
                )));
            }
            if !seen.insert(param.name.as_str()) {
                return Err(AgentError::Schema(format!(
                    "tool '{}' declares parameter '{}' twice",
                    self.name, param.name
                )));
            }

            properties.insert(
                param.name.clone(),
                serde_json::json!({ "type": param.kind }),
            );
            if param.is_required() {
                required.push(param.name.clone());
            }
        }

        Ok(ToolSchema {
            name: self.name.clone(),
            description: self.doc.as_deref().map(str::trim).unwrap_or_default().to_string(),
            parameters: ParametersSchema {
                kind: ParamKind::Object,
                properties,
                required,
            },
        })
    }

    /// Bind decoded keyword arguments against the declared parameters.
    ///
    /// Mirrors keyword-argument binding: unknown names and missing required
    /// parameters fail at call time, defaults fill omitted optional ones.
    /// Values are not checked against the declared kinds.
    pub fn bind(&self, mut arguments: Map<String, Value>) -> Result<ToolArgs> {
        if let Some(unexpected) = arguments
            .keys()
            .find(|key| !self.params.iter().any(|p| &p.name == *key))
        {
            return Err(AgentError::tool(
                &self.name,
                format!("unexpected argument '{unexpected}'"),
            ));
        }

        for param in &self.params {
            if arguments.contains_key(&param.name) {
                continue;
            }
            match &param.default {
                Some(default) => {
                    arguments.insert(param.name.clone(), default.clone());
                }
                None => {
                    return Err(AgentError::tool(
                        &self.name,
                        format!("missing required argument '{}'", param.name),
                    ));
                }
            }
        }

        Ok(ToolArgs {
            tool: self.name.clone(),
            values: arguments,
        })
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// JSON-schema-like description of a tool's parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParametersSchema {
    /// Always `object`
    #[serde(rename = "type")]
    pub kind: ParamKind,

    /// Parameter name to `{"type": kind}`, in declaration order
    pub properties: Map<String, Value>,

    /// Parameters without a default, in declaration order
    pub required: Vec<String>,
}

/// Tool definition schema (for LLM function calling)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: ParametersSchema,
}

/// Bound keyword arguments for one tool invocation
#[derive(Clone, Debug, PartialEq)]
pub struct ToolArgs {
    tool: String,
    values: Map<String, Value>,
}

impl ToolArgs {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Argument coerced to text; non-string JSON values use their JSON rendering.
    pub fn string(&self, name: &str) -> Result<String> {
        match self.require(name)? {
            Value::String(s) => Ok(s.clone()),
            other => Ok(other.to_string()),
        }
    }

    /// Argument coerced to an integer; numeric strings are accepted.
    pub fn integer(&self, name: &str) -> Result<i64> {
        let value = self.require(name)?;
        value
            .as_i64()
            .or_else(|| value.as_f64().and_then(whole_i64))
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
            .ok_or_else(|| {
                AgentError::tool(&self.tool, format!("argument '{name}' is not an integer: {value}"))
            })
    }

    pub const fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    fn require(&self, name: &str) -> Result<&Value> {
        self.values
            .get(name)
            .ok_or_else(|| AgentError::tool(&self.tool, format!("missing argument '{name}'")))
    }
}

/// `f` as an `i64` when it is a whole number inside the `i64` range
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn whole_i64(f: f64) -> Option<i64> {
    // i64::MAX is not representable as f64; 2^63 is the first value past the range.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f)).then_some(f as i64)
}

/// Result of a tool invocation
#[derive(Clone, Debug, PartialEq)]
pub enum ToolOutput {
    /// Text relayed to the model verbatim
    Reply(String),

    /// Switch the active agent
    Handoff(Agent),
}

impl ToolOutput {
    pub fn reply(value: impl ToString) -> Self {
        Self::Reply(value.to_string())
    }
}

impl From<String> for ToolOutput {
    fn from(value: String) -> Self {
        Self::Reply(value)
    }
}

impl From<&str> for ToolOutput {
    fn from(value: &str) -> Self {
        Self::Reply(value.to_string())
    }
}

impl From<Agent> for ToolOutput {
    fn from(agent: Agent) -> Self {
        Self::Handoff(agent)
    }
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Declared name, doc text and parameters
    fn signature(&self) -> ToolSignature;

    /// Execute the tool with bound arguments
    async fn call(&self, args: ToolArgs) -> Result<ToolOutput>;

    fn name(&self) -> String {
        self.signature().name
    }
}

type Handler = dyn Fn(ToolArgs) -> Result<ToolOutput> + Send + Sync;

/// Tool backed by a plain closure
pub struct FunctionTool {
    signature: ToolSignature,
    handler: Box<Handler>,
}

impl FunctionTool {
    pub fn new<F>(signature: ToolSignature, handler: F) -> Self
    where
        F: Fn(ToolArgs) -> Result<ToolOutput> + Send + Sync + 'static,
    {
        Self {
            signature,
            handler: Box::new(handler),
        }
    }
}

#[async_trait]
impl Tool for FunctionTool {
    fn signature(&self) -> ToolSignature {
        self.signature.clone()
    }

    async fn call(&self, args: ToolArgs) -> Result<ToolOutput> {
        (self.handler)(args)
    }
}

/// Name to tool lookup for one agent
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Build a lookup from an ordered tool list; a later duplicate name replaces an earlier one.
    pub fn from_tools(tools: &[Arc<dyn Tool>]) -> Self {
        let mut registry = Self::new();
        for tool in tools {
            registry.register_boxed(Arc::clone(tool));
        }
        registry
    }

    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_boxed(Arc::new(tool));
    }

    /// Register a shared tool
    pub fn register_boxed(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name(), tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Resolve, decode, bind and run a tool call
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolOutput> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| AgentError::UnknownTool(call.name.clone()))?;

        let arguments = decode_arguments(&call.name, &call.arguments)?;
        let args = tool.signature().bind(arguments)?;

        tool.call(args).await
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Parse a raw argument payload into a keyword map.
///
/// The payload must be a JSON object; an empty payload is rejected like any
/// other malformed one.
pub fn decode_arguments(tool: &str, raw: &str) -> Result<Map<String, Value>> {
    serde_json::from_str::<Map<String, Value>>(raw).map_err(|source| AgentError::ArgumentDecode {
        tool: tool.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn refund_signature() -> ToolSignature {
        ToolSignature::new("execute_refund")
            .doc("  Refund an item.\n  ")
            .param(Param::new("item_id"))
            .param(Param::new("reason").with_default("not provided"))
    }

    #[test]
    fn test_required_is_all_params_in_order_without_defaults() {
        let schema = ToolSignature::new("execute_order")
            .param(Param::new("product"))
            .param(Param::typed::<i64>("price"))
            .param(Param::typed::<bool>("gift"))
            .schema()
            .unwrap();

        assert_eq!(schema.parameters.required, vec!["product", "price", "gift"]);
        let names: Vec<_> = schema.parameters.properties.keys().cloned().collect();
        assert_eq!(names, vec!["product", "price", "gift"]);
    }

    #[test]
    fn test_defaulted_param_is_optional_but_described() {
        let schema = refund_signature().schema().unwrap();

        assert_eq!(schema.parameters.required, vec!["item_id"]);
        assert_eq!(schema.parameters.properties["reason"], json!({"type": "string"}));
        assert_eq!(schema.description, "Refund an item.");
    }

    #[test]
    fn test_schema_serializes_to_function_shape() {
        let schema = ToolSignature::new("execute_order")
            .doc("Price should be in USD.")
            .param(Param::new("product"))
            .param(Param::typed::<i64>("price"))
            .schema()
            .unwrap();

        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({
                "name": "execute_order",
                "description": "Price should be in USD.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "product": {"type": "string"},
                        "price": {"type": "integer"}
                    },
                    "required": ["product", "price"]
                }
            })
        );
    }

    #[test]
    fn test_missing_doc_gives_empty_description() {
        let schema = ToolSignature::new("transfer_to_sales_agent").schema().unwrap();
        assert_eq!(schema.description, "");
        assert!(schema.parameters.properties.is_empty());
        assert!(schema.parameters.required.is_empty());
    }

    #[test]
    fn test_kind_table() {
        assert_eq!(ParamKind::from_annotation("int"), ParamKind::Integer);
        assert_eq!(ParamKind::from_annotation("f64"), ParamKind::Number);
        assert_eq!(ParamKind::from_annotation("dict"), ParamKind::Object);
        assert_eq!(ParamKind::from_annotation("None"), ParamKind::Null);
        assert_eq!(ParamKind::from_annotation("Widget"), ParamKind::String);
        assert_eq!(<Vec<String> as SchemaKind>::KIND, ParamKind::Array);
    }

    #[test]
    fn test_invalid_signatures_are_schema_errors() {
        let bad_name = ToolSignature::new("look up").schema();
        assert!(matches!(bad_name, Err(AgentError::Schema(_))));

        let duplicate = ToolSignature::new("look_up_item")
            .param(Param::new("q"))
            .param(Param::new("q"))
            .schema();
        assert!(matches!(duplicate, Err(AgentError::Schema(_))));
    }

    #[test]
    fn test_bind_fills_defaults() {
        let mut args = Map::new();
        args.insert("item_id".into(), json!("item_1"));

        let bound = refund_signature().bind(args).unwrap();
        assert_eq!(bound.string("reason").unwrap(), "not provided");
    }

    #[test]
    fn test_bind_rejects_missing_and_unexpected() {
        let missing = refund_signature().bind(Map::new());
        assert!(matches!(missing, Err(AgentError::ToolExecution { .. })));

        let mut args = Map::new();
        args.insert("item_id".into(), json!("item_1"));
        args.insert("colour".into(), json!("red"));
        let unexpected = refund_signature().bind(args);
        assert!(matches!(unexpected, Err(AgentError::ToolExecution { .. })));
    }

    #[test]
    fn test_integer_coercion() {
        let mut args = Map::new();
        args.insert("price".into(), json!("500"));
        let bound = ToolSignature::new("t")
            .param(Param::typed::<i64>("price"))
            .bind(args)
            .unwrap();
        assert_eq!(bound.integer("price").unwrap(), 500);
    }

    #[test]
    fn test_integer_rejects_fractions_and_out_of_range() {
        let mut args = Map::new();
        args.insert("whole".into(), json!(42.0));
        args.insert("half".into(), json!(4.5));
        args.insert("huge".into(), json!(1e30));
        args.insert("tiny".into(), json!(-1e30));
        let bound = ToolSignature::new("t")
            .param(Param::typed::<f64>("whole"))
            .param(Param::typed::<f64>("half"))
            .param(Param::typed::<f64>("huge"))
            .param(Param::typed::<f64>("tiny"))
            .bind(args)
            .unwrap();

        assert_eq!(bound.integer("whole").unwrap(), 42);
        assert!(matches!(bound.integer("half"), Err(AgentError::ToolExecution { .. })));
        assert!(matches!(bound.integer("huge"), Err(AgentError::ToolExecution { .. })));
        assert!(matches!(bound.integer("tiny"), Err(AgentError::ToolExecution { .. })));
    }

    #[tokio::test]
    async fn test_empty_payload_is_decode_error_even_without_params() {
        let mut registry = ToolRegistry::new();
        registry.register(FunctionTool::new(
            ToolSignature::new("transfer_to_sales_agent"),
            |_| Ok("moved".into()),
        ));
        registry.register(FunctionTool::new(
            ToolSignature::new("look_up_item").param(Param::new("search_query")),
            |_| Ok("item_132612938".into()),
        ));

        for name in ["transfer_to_sales_agent", "look_up_item"] {
            let call = ToolCall::new("call_1", name, "");
            assert!(matches!(
                registry.execute(&call).await,
                Err(AgentError::ArgumentDecode { tool, .. }) if tool == name
            ));
        }
    }

    #[test]
    fn test_decode_arguments() {
        assert!(decode_arguments("t", "{}").unwrap().is_empty());
        assert!(matches!(
            decode_arguments("t", ""),
            Err(AgentError::ArgumentDecode { .. })
        ));
        assert!(matches!(
            decode_arguments("t", "not json"),
            Err(AgentError::ArgumentDecode { .. })
        ));
        assert!(matches!(
            decode_arguments("t", "[1, 2]"),
            Err(AgentError::ArgumentDecode { .. })
        ));
    }

    #[tokio::test]
    async fn test_tool_registry() {
        let mut registry = ToolRegistry::new();
        registry.register(FunctionTool::new(
            ToolSignature::new("look_up_item").param(Param::new("search_query")),
            |_| Ok("item_132612938".into()),
        ));

        assert_eq!(registry.len(), 1);
        assert!(registry.get("unknown").is_none());

        let call = ToolCall::new("call_1", "look_up_item", r#"{"search_query": "widget"}"#);
        let output = registry.execute(&call).await.unwrap();
        assert_eq!(output, ToolOutput::Reply("item_132612938".into()));

        let unknown = ToolCall::new("call_2", "execute_refund", "{}");
        assert!(matches!(
            registry.execute(&unknown).await,
            Err(AgentError::UnknownTool(name)) if name == "execute_refund"
        ));
    }

    #[test]
    fn test_duplicate_names_last_wins() {
        let first: Arc<dyn Tool> = Arc::new(FunctionTool::new(ToolSignature::new("dup"), |_| {
            Ok("first".into())
        }));
        let second: Arc<dyn Tool> = Arc::new(FunctionTool::new(
            ToolSignature::new("dup").doc("second"),
            |_| Ok("second".into()),
        ));

        let registry = ToolRegistry::from_tools(&[first, second]);
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get("dup").unwrap().signature().doc.as_deref(),
            Some("second")
        );
    }
}
