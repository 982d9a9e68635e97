pub mod client;
pub mod events;
pub mod reformat;

pub use client::{
    AgentConfig, ModelSummary, RuntimeClient, RuntimeError, ShieldSummary, ToolgroupSpec,
    ToolgroupSummary, TurnMessage, VectorDbSummary,
};
pub use events::{
    AgentMode, ContentDelta, EventPayload, StepDetails, ToolCall, ToolResponse, TurnEvent,
};
pub use reformat::reformat_turn;
