pub mod chat_history;
pub mod guardrail;
pub mod knowledge_base;
pub mod mcp_server;
pub mod model_server;
pub mod user;
pub mod virtual_assistant;

#[cfg(test)]
pub(crate) mod test_utils;
