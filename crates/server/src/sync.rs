//! Startup/on-demand reconciliation of local registrations against the
//! agent runtime's catalog. Every job is best-effort: a per-item failure
//! logs and moves on, only a dead runtime fails the whole sync.

use agent_client::ModelSummary;
use db::models::{
    knowledge_base::{CreateKnowledgeBase, KnowledgeBase},
    mcp_server::{CreateMcpServer, McpServer},
    model_server::{CreateModelServer, ModelServer},
};
use serde_json::Value;

use crate::{AppState, error::ApiError};

const MCP_PROVIDER_ID: &str = "model-context-protocol";

/// Upsert one model server row per runtime LLM; drop rows whose model the
/// runtime no longer advertises.
pub async fn sync_model_servers(state: &AppState) -> Result<Vec<ModelServer>, ApiError> {
    let models = state.runtime.list_models().await?;
    let llms: Vec<ModelSummary> = models.into_iter().filter(ModelSummary::is_llm).collect();

    let existing = ModelServer::find_all(state.pool()).await?;
    let mut synced = Vec::new();

    for model in &llms {
        let data = CreateModelServer {
            name: model.identifier.clone(),
            provider_name: model
                .provider_id
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            model_name: model.identifier.clone(),
            endpoint_url: state.runtime.base_url().to_string(),
            token: None,
        };

        let result = match existing.iter().find(|s| s.name == model.identifier) {
            Some(server) => ModelServer::update(state.pool(), server.id, &data).await,
            None => {
                tracing::info!("Registering model server for {}", model.identifier);
                ModelServer::create(state.pool(), &data).await
            }
        };

        match result {
            Ok(server) => synced.push(server),
            Err(e) => tracing::warn!("Failed to sync model {}: {}", model.identifier, e),
        }
    }

    for server in &existing {
        if !llms.iter().any(|m| m.identifier == server.name) {
            tracing::info!(
                "Removing model server {} no longer advertised by the runtime",
                server.name
            );
            ModelServer::delete(state.pool(), server.id).await?;
        }
    }

    tracing::info!("Model server sync complete: {} entries", synced.len());
    Ok(synced)
}

/// Upsert one MCP server row per runtime tool provided by the MCP
/// provider; drop stale rows.
pub async fn sync_mcp_servers(state: &AppState) -> Result<Vec<McpServer>, ApiError> {
    let tools = state.runtime.list_tools().await?;
    let mcp_tools: Vec<&Value> = tools
        .iter()
        .filter(|tool| {
            tool.get("provider_id").and_then(Value::as_str) == Some(MCP_PROVIDER_ID)
        })
        .collect();

    let existing = McpServer::find_all(state.pool()).await?;
    let mut synced = Vec::new();

    for tool in &mcp_tools {
        let Some(identifier) = tool.get("identifier").and_then(Value::as_str) else {
            tracing::warn!("Skipping runtime tool without an identifier: {}", tool);
            continue;
        };

        let configuration = serde_json::json!({
            "type": tool.get("type"),
            "provider_id": tool.get("provider_id"),
            "toolgroup_id": tool.get("toolgroup_id"),
            "tool_host": tool.get("tool_host"),
            "parameters": tool.get("parameters"),
        });

        let data = CreateMcpServer {
            name: identifier.to_string(),
            title: tool
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or(identifier)
                .to_string(),
            description: tool
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            endpoint_url: tool
                .pointer("/metadata/endpoint")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            configuration: Some(configuration.to_string()),
            created_by: None,
        };

        let result = match existing.iter().find(|s| s.name == identifier) {
            Some(server) => McpServer::update(state.pool(), server.id, &data).await,
            None => {
                tracing::info!("Registering MCP server {}", identifier);
                McpServer::create(state.pool(), &data).await
            }
        };

        match result {
            Ok(server) => synced.push(server),
            Err(e) => tracing::warn!("Failed to sync MCP tool {}: {}", identifier, e),
        }
    }

    for server in &existing {
        let still_advertised = mcp_tools.iter().any(|tool| {
            tool.get("identifier").and_then(Value::as_str) == Some(server.name.as_str())
        });
        if !still_advertised {
            tracing::info!(
                "Removing MCP server {} no longer advertised by the runtime",
                server.name
            );
            McpServer::delete(state.pool(), server.id).await?;
        }
    }

    tracing::info!("MCP server sync complete: {} entries", synced.len());
    Ok(synced)
}

/// Register external knowledge bases for runtime vector stores we don't
/// track yet. Locally created rows are never touched.
pub async fn sync_knowledge_bases(state: &AppState) -> Result<Vec<KnowledgeBase>, ApiError> {
    let vector_dbs = state.runtime.list_vector_dbs().await?;
    let mut synced = Vec::new();

    for vector_db in &vector_dbs {
        if KnowledgeBase::find_by_vector_db_name(state.pool(), &vector_db.identifier)
            .await?
            .is_some()
        {
            continue;
        }

        tracing::info!("Registering external knowledge base {}", vector_db.identifier);
        let result = KnowledgeBase::create(
            state.pool(),
            &CreateKnowledgeBase {
                name: vector_db
                    .provider_resource_id
                    .clone()
                    .unwrap_or_else(|| vector_db.identifier.clone()),
                version: "1".to_string(),
                embedding_model: vector_db.embedding_model.clone().unwrap_or_default(),
                provider_id: vector_db.provider_id.clone(),
                vector_db_name: vector_db.identifier.clone(),
                is_external: true,
                source: None,
                source_configuration: None,
                created_by: None,
            },
        )
        .await;

        match result {
            Ok(kb) => synced.push(kb),
            Err(e) => tracing::warn!(
                "Failed to register knowledge base {}: {}",
                vector_db.identifier,
                e
            ),
        }
    }

    tracing::info!("Knowledge base sync complete: {} new entries", synced.len());
    Ok(synced)
}
