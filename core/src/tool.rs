//! Capability descriptors and the result contract for tool invocations.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Progress state of a tool invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToolState {
    /// The action is still running and will be re-evaluated next tick.
    #[serde(rename = "IN_PROCESS")]
    Pending,
    /// The action completed.
    Success,
    /// The action cannot complete.
    Failure,
}

/// State plus human-readable message returned by a tool.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolOutcome {
    /// Progress state.
    pub state: ToolState,
    /// Message describing the state.
    pub message: String,
}

impl ToolOutcome {
    /// Action still in progress.
    #[must_use]
    pub fn pending(message: impl Into<String>) -> Self {
        Self {
            state: ToolState::Pending,
            message: message.into(),
        }
    }

    /// Action completed.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            state: ToolState::Success,
            message: message.into(),
        }
    }

    /// Action failed.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            state: ToolState::Failure,
            message: message.into(),
        }
    }

    /// Reports whether the action still needs polling.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state == ToolState::Pending
    }
}

/// JSON type of a tool parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// UTF-8 string.
    String,
    /// Signed integer.
    Integer,
}

/// Single named parameter of a tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ToolParam {
    /// Argument name.
    pub name: &'static str,
    /// Argument type.
    pub kind: ParamKind,
    /// Argument description shown to callers.
    pub description: &'static str,
    /// Whether the argument must be supplied.
    pub required: bool,
}

/// Static descriptor advertised by a capability module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ToolSpec {
    /// Tool name, unique per chassis.
    pub name: &'static str,
    /// What the tool does.
    pub description: &'static str,
    /// Accepted parameters.
    pub params: &'static [ToolParam],
}

impl ToolSpec {
    /// Renders the descriptor as an OpenAI-style function-calling schema.
    #[must_use]
    pub fn to_openai_json(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in self.params {
            let _ = properties.insert(
                param.name.to_owned(),
                json!({ "type": param.kind, "description": param.description }),
            );
            if param.required {
                required.push(Value::from(param.name));
            }
        }

        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": {
                    "type": "object",
                    "properties": properties,
                    "required": required,
                },
            },
        })
    }
}

/// Named invocation with JSON arguments.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool to invoke.
    pub name: String,
    /// Arguments keyed by parameter name.
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCall {
    /// Creates a call with the provided JSON arguments.
    #[must_use]
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Reads a string argument.
    #[must_use]
    pub fn str_arg(&self, name: &str) -> Option<&str> {
        self.arguments.get(name).and_then(Value::as_str)
    }

    /// Reads an integer argument.
    #[must_use]
    pub fn int_arg(&self, name: &str) -> Option<i64> {
        self.arguments.get(name).and_then(Value::as_i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOVE_TO: ToolSpec = ToolSpec {
        name: "move_to_location",
        description: "Move to a location.",
        params: &[
            ToolParam {
                name: "x",
                kind: ParamKind::Integer,
                description: "Column.",
                required: true,
            },
            ToolParam {
                name: "label",
                kind: ParamKind::String,
                description: "Optional tag.",
                required: false,
            },
        ],
    };

    #[test]
    fn openai_schema_lists_required_params() {
        let schema = MOVE_TO.to_openai_json();
        assert_eq!(schema["function"]["name"], "move_to_location");
        assert_eq!(
            schema["function"]["parameters"]["properties"]["x"]["type"],
            "integer"
        );
        assert_eq!(schema["function"]["parameters"]["required"], json!(["x"]));
    }

    #[test]
    fn pending_serializes_as_in_process() {
        let value = serde_json::to_value(ToolOutcome::pending("walking")).expect("serialize");
        assert_eq!(value["state"], "IN_PROCESS");
        assert!(ToolOutcome::pending("").is_pending());
        assert!(!ToolOutcome::failure("").is_pending());
    }

    #[test]
    fn call_arguments_are_typed_on_read() {
        let call = ToolCall::new("move_to_location", json!({ "x": 4, "y": "north" }));
        assert_eq!(call.int_arg("x"), Some(4));
        assert_eq!(call.int_arg("y"), None);
        assert_eq!(call.str_arg("y"), Some("north"));
    }
}
