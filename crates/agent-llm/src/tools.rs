//! Tool definition types and JSON schema builders

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool definition for LLM provider
///
/// This describes a tool that the LLM can use, including its name,
/// description, and input schema in JSON Schema format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON schema for the tool's input parameters
    pub input_schema: Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// How the model may pick a tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolChoice {
    /// The model decides
    Auto,
    /// The model must call some tool
    Any,
    /// The model must call the named tool
    Tool {
        /// Tool name
        name: String,
    },
}

/// Helper module to build JSON schemas
pub mod schema {
    use serde_json::{Value, json};

    /// Create a JSON schema for an object with properties
    ///
    /// # Example
    ///
    /// ```
    /// use agent_llm::tools::schema;
    /// use serde_json::json;
    ///
    /// let schema = schema::object(
    ///     json!({
    ///         "summary": schema::string("Executive summary"),
    ///         "confidence": schema::bounded_number("Confidence", 0.0, 1.0),
    ///     }),
    ///     &["summary", "confidence"],
    /// );
    /// assert_eq!(schema["required"][1], "confidence");
    /// ```
    pub fn object(properties: Value, required: &[&str]) -> Value {
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// String property schema
    pub fn string(description: &str) -> Value {
        json!({
            "type": "string",
            "description": description,
        })
    }

    /// String restricted to a set of labels
    pub fn string_enum(description: &str, labels: &[&str]) -> Value {
        json!({
            "type": "string",
            "description": description,
            "enum": labels,
        })
    }

    /// Number property schema
    pub fn number(description: &str) -> Value {
        json!({
            "type": "number",
            "description": description,
        })
    }

    /// Number within inclusive bounds
    pub fn bounded_number(description: &str, minimum: f64, maximum: f64) -> Value {
        json!({
            "type": "number",
            "description": description,
            "minimum": minimum,
            "maximum": maximum,
        })
    }

    /// Non-negative integer property schema
    pub fn count(description: &str) -> Value {
        json!({
            "type": "integer",
            "description": description,
            "minimum": 0,
        })
    }

    /// Integer within inclusive bounds
    pub fn bounded_integer(description: &str, minimum: i64, maximum: i64) -> Value {
        json!({
            "type": "integer",
            "description": description,
            "minimum": minimum,
            "maximum": maximum,
        })
    }

    /// Allow `null` in addition to the given schema's type
    pub fn nullable(mut schema: Value) -> Value {
        if let Some(kind) = schema.get("type").cloned() {
            schema["type"] = json!([kind, "null"]);
        }
        schema
    }

    /// Array property schema
    pub fn array(description: &str, items: Value) -> Value {
        json!({
            "type": "array",
            "description": description,
            "items": items,
        })
    }

    /// Array of strings
    pub fn string_list(description: &str) -> Value {
        array(description, json!({"type": "string"}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_definition_creation() {
        let schema = schema::object(
            json!({
                "query": schema::string("Search query"),
            }),
            &["query"],
        );

        let tool = ToolDefinition::new("search", "Search the web", schema.clone());
        assert_eq!(tool.name, "search");
        assert_eq!(tool.description, "Search the web");
        assert_eq!(tool.input_schema, schema);
    }

    #[test]
    fn test_schema_builders() {
        let labels = schema::string_enum("signal", &["bullish", "bearish"]);
        assert_eq!(labels["enum"], json!(["bullish", "bearish"]));

        let bounded = schema::bounded_number("score", 0.0, 10.0);
        assert_eq!(bounded["maximum"], 10.0);

        let nullable = schema::nullable(schema::number("pe"));
        assert_eq!(nullable["type"], json!(["number", "null"]));

        let list = schema::string_list("insights");
        assert_eq!(list["items"]["type"], "string");
    }

    #[test]
    fn test_tool_choice_serialization() {
        let choice = ToolChoice::Tool {
            name: "record".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&choice).unwrap(),
            json!({"type": "tool", "name": "record"})
        );
        assert_eq!(
            serde_json::to_value(ToolChoice::Auto).unwrap(),
            json!({"type": "auto"})
        );
    }
}
