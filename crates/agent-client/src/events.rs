//! Typed view of the event stream the agent runtime emits for one turn.
//!
//! The taxonomy is owned by the runtime, not by this crate, so every tagged
//! union here carries an explicit fallback variant instead of assuming the
//! set of tags is closed.

use serde::{Deserialize, Serialize};

/// Which interpretation ruleset applies to a turn. Fixed at turn start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentMode {
    Regular,
    ReAct,
}

impl Default for AgentMode {
    fn default() -> Self {
        Self::Regular
    }
}

impl std::fmt::Display for AgentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentMode::Regular => write!(f, "Regular"),
            AgentMode::ReAct => write!(f, "ReAct"),
        }
    }
}

impl std::str::FromStr for AgentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "regular" => Ok(Self::Regular),
            "react" => Ok(Self::ReAct),
            _ => Err(format!("Unknown agent mode: {}", s)),
        }
    }
}

/// One item of the turn stream. A chunk that omits the payload (or that we
/// could not decode at all) is the malformed case; `raw` keeps the original
/// wire text for diagnostics and is never (de)serialized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnEvent {
    #[serde(default)]
    pub payload: Option<EventPayload>,
    #[serde(skip)]
    pub raw: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum EventPayload {
    StepProgress {
        #[serde(default)]
        delta: Option<ContentDelta>,
    },
    StepComplete {
        #[serde(default)]
        step_details: Option<StepDetails>,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentDelta {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "step_type", rename_all = "snake_case")]
pub enum StepDetails {
    Inference {},
    ToolExecution {
        #[serde(default)]
        tool_calls: Vec<ToolCall>,
        #[serde(default)]
        tool_responses: Vec<ToolResponse>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool_name: String,
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub arguments: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResponse {
    pub tool_name: String,
    #[serde(default)]
    pub call_id: Option<String>,
    /// Opaque JSON text until the formatter parses it.
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_mode_parses_case_insensitively() {
        assert_eq!("Regular".parse::<AgentMode>(), Ok(AgentMode::Regular));
        assert_eq!("react".parse::<AgentMode>(), Ok(AgentMode::ReAct));
        assert_eq!("ReAct".parse::<AgentMode>(), Ok(AgentMode::ReAct));
        assert!("cot".parse::<AgentMode>().is_err());
    }

    #[test]
    fn step_progress_delta_decodes() {
        let payload: EventPayload = serde_json::from_str(
            r#"{"event_type": "step_progress", "delta": {"type": "text", "text": "Hel"}}"#,
        )
        .unwrap();

        match payload {
            EventPayload::StepProgress {
                delta: Some(ContentDelta::Text { text }),
            } => assert_eq!(text, "Hel"),
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn tool_execution_step_decodes_with_responses() {
        let payload: EventPayload = serde_json::from_str(
            r#"{
                "event_type": "step_complete",
                "step_details": {
                    "step_type": "tool_execution",
                    "tool_calls": [{"tool_name": "web_search", "call_id": "c1"}],
                    "tool_responses": [{"tool_name": "web_search", "call_id": "c1", "content": "{}"}]
                }
            }"#,
        )
        .unwrap();

        match payload {
            EventPayload::StepComplete {
                step_details:
                    Some(StepDetails::ToolExecution {
                        tool_calls,
                        tool_responses,
                    }),
            } => {
                assert_eq!(tool_calls.len(), 1);
                assert_eq!(tool_responses[0].content, "{}");
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn inference_step_tolerates_extra_fields() {
        let payload: EventPayload = serde_json::from_str(
            r#"{
                "event_type": "step_complete",
                "step_details": {"step_type": "inference", "api_model_response": {"content": "x"}}
            }"#,
        )
        .unwrap();

        assert!(matches!(
            payload,
            EventPayload::StepComplete {
                step_details: Some(StepDetails::Inference {})
            }
        ));
    }

    #[test]
    fn unknown_tags_fall_back_instead_of_failing() {
        let payload: EventPayload =
            serde_json::from_str(r#"{"event_type": "turn_complete", "turn": {}}"#).unwrap();
        assert!(matches!(payload, EventPayload::Unknown));

        let details: StepDetails =
            serde_json::from_str(r#"{"step_type": "shield_call", "violation": null}"#).unwrap();
        assert!(matches!(details, StepDetails::Other));
    }
}
