//! Virtual assistant configurations and their wiring to knowledge bases,
//! tools and model servers.
//!
//! Association rows store runtime identifiers, not row ids: knowledge base
//! links carry the `vector_db_name`, tool links carry the MCP server `name`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use super::{knowledge_base::KnowledgeBase, mcp_server::McpServer, model_server::ModelServer};

#[derive(Debug, Error)]
pub enum ComponentError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("Virtual assistant {0} not found")]
    AssistantNotFound(Uuid),
    #[error("Model server for model {0} not found")]
    ModelServerNotFound(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, TS)]
#[ts(export)]
pub struct VirtualAssistant {
    pub id: Uuid,
    pub name: String,
    pub prompt: String,
    pub model_name: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Read shape including the association id lists.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VirtualAssistantWithRelations {
    pub id: Uuid,
    pub name: String,
    pub prompt: String,
    pub model_name: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub knowledge_base_ids: Vec<String>,
    pub tool_ids: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CreateVirtualAssistant {
    pub name: String,
    pub prompt: String,
    pub model_name: String,
    pub created_by: Option<Uuid>,
    pub knowledge_base_ids: Vec<String>,
    pub tool_ids: Vec<String>,
}

/// The assistant's resolved components, as handed to the chat layer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AssistantComponents {
    pub model_server: ModelServerSummary,
    pub knowledge_bases: Vec<KnowledgeBaseSummary>,
    pub tools: Vec<ToolSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ModelServerSummary {
    pub id: Uuid,
    pub name: String,
    pub provider_name: String,
    pub model_name: String,
    pub endpoint_url: String,
}

impl From<&ModelServer> for ModelServerSummary {
    fn from(server: &ModelServer) -> Self {
        Self {
            id: server.id,
            name: server.name.clone(),
            provider_name: server.provider_name.clone(),
            model_name: server.model_name.clone(),
            endpoint_url: server.endpoint_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct KnowledgeBaseSummary {
    pub id: Uuid,
    pub name: String,
    pub version: String,
    pub embedding_model: String,
    pub vector_db_name: String,
    pub is_external: bool,
    pub source: Option<String>,
    pub source_configuration: Option<serde_json::Value>,
}

impl From<&KnowledgeBase> for KnowledgeBaseSummary {
    fn from(kb: &KnowledgeBase) -> Self {
        Self {
            id: kb.id,
            name: kb.name.clone(),
            version: kb.version.clone(),
            embedding_model: kb.embedding_model.clone(),
            vector_db_name: kb.vector_db_name.clone(),
            is_external: kb.is_external,
            source: kb.source.clone(),
            source_configuration: kb.source_configuration_json(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ToolSummary {
    pub id: Uuid,
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub endpoint_url: String,
    pub configuration: Option<serde_json::Value>,
}

impl From<&McpServer> for ToolSummary {
    fn from(server: &McpServer) -> Self {
        Self {
            id: server.id,
            name: server.name.clone(),
            title: server.title.clone(),
            description: server.description.clone(),
            endpoint_url: server.endpoint_url.clone(),
            configuration: server.configuration_json(),
        }
    }
}

impl VirtualAssistant {
    pub async fn create(pool: &SqlitePool, data: &CreateVirtualAssistant) -> sqlx::Result<Self> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO virtual_assistants (id, name, prompt, model_name, created_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.prompt)
        .bind(&data.model_name)
        .bind(data.created_by)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        Self::replace_associations(pool, id, &data.knowledge_base_ids, &data.tool_ids).await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> sqlx::Result<Option<Self>> {
        sqlx::query_as("SELECT * FROM virtual_assistants WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_all(pool: &SqlitePool) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as("SELECT * FROM virtual_assistants ORDER BY created_at DESC")
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &CreateVirtualAssistant,
    ) -> sqlx::Result<Self> {
        sqlx::query(
            r#"
            UPDATE virtual_assistants
            SET name = ?, prompt = ?, model_name = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&data.name)
        .bind(&data.prompt)
        .bind(&data.model_name)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

        Self::replace_associations(pool, id, &data.knowledge_base_ids, &data.tool_ids).await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> sqlx::Result<u64> {
        let result = sqlx::query("DELETE FROM virtual_assistants WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Replace both association sets with the given id lists.
    async fn replace_associations(
        pool: &SqlitePool,
        id: Uuid,
        knowledge_base_ids: &[String],
        tool_ids: &[String],
    ) -> sqlx::Result<()> {
        sqlx::query("DELETE FROM virtual_assistant_knowledge_bases WHERE virtual_assistant_id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        sqlx::query("DELETE FROM virtual_assistant_tools WHERE virtual_assistant_id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        for kb_id in knowledge_base_ids {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO virtual_assistant_knowledge_bases (virtual_assistant_id, knowledge_base_id)
                VALUES (?, ?)
                "#,
            )
            .bind(id)
            .bind(kb_id)
            .execute(pool)
            .await?;
        }

        for tool_id in tool_ids {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO virtual_assistant_tools (virtual_assistant_id, tool_id)
                VALUES (?, ?)
                "#,
            )
            .bind(id)
            .bind(tool_id)
            .execute(pool)
            .await?;
        }

        Ok(())
    }

    pub async fn knowledge_base_ids(pool: &SqlitePool, id: Uuid) -> sqlx::Result<Vec<String>> {
        sqlx::query_scalar(
            r#"
            SELECT knowledge_base_id FROM virtual_assistant_knowledge_bases
            WHERE virtual_assistant_id = ?
            ORDER BY knowledge_base_id ASC
            "#,
        )
        .bind(id)
        .fetch_all(pool)
        .await
    }

    pub async fn tool_ids(pool: &SqlitePool, id: Uuid) -> sqlx::Result<Vec<String>> {
        sqlx::query_scalar(
            r#"
            SELECT tool_id FROM virtual_assistant_tools
            WHERE virtual_assistant_id = ?
            ORDER BY tool_id ASC
            "#,
        )
        .bind(id)
        .fetch_all(pool)
        .await
    }

    pub async fn with_relations(
        &self,
        pool: &SqlitePool,
    ) -> sqlx::Result<VirtualAssistantWithRelations> {
        let knowledge_base_ids = Self::knowledge_base_ids(pool, self.id).await?;
        let tool_ids = Self::tool_ids(pool, self.id).await?;

        Ok(VirtualAssistantWithRelations {
            id: self.id,
            name: self.name.clone(),
            prompt: self.prompt.clone(),
            model_name: self.model_name.clone(),
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
            knowledge_base_ids,
            tool_ids,
        })
    }

    /// Resolve the assistant's model server, knowledge bases and tools.
    ///
    /// A missing assistant or model server is a hard failure; association
    /// targets that no longer exist are skipped.
    pub async fn resolve_components(
        pool: &SqlitePool,
        id: Uuid,
    ) -> Result<AssistantComponents, ComponentError> {
        let assistant = Self::find_by_id(pool, id)
            .await?
            .ok_or(ComponentError::AssistantNotFound(id))?;

        let model_server = ModelServer::find_by_model_name(pool, &assistant.model_name)
            .await?
            .ok_or_else(|| ComponentError::ModelServerNotFound(assistant.model_name.clone()))?;

        let mut knowledge_bases = Vec::new();
        for kb_id in Self::knowledge_base_ids(pool, id).await? {
            match KnowledgeBase::find_by_vector_db_name(pool, &kb_id).await? {
                Some(kb) => knowledge_bases.push(KnowledgeBaseSummary::from(&kb)),
                None => {
                    tracing::warn!("Knowledge base {} referenced by assistant {} is gone", kb_id, id)
                }
            }
        }

        let mut tools = Vec::new();
        for tool_id in Self::tool_ids(pool, id).await? {
            match McpServer::find_by_name(pool, &tool_id).await? {
                Some(server) => tools.push(ToolSummary::from(&server)),
                None => tracing::warn!("Tool {} referenced by assistant {} is gone", tool_id, id),
            }
        }

        Ok(AssistantComponents {
            model_server: ModelServerSummary::from(&model_server),
            knowledge_bases,
            tools,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        mcp_server::CreateMcpServer,
        model_server::CreateModelServer,
        test_utils::setup_test_pool,
    };

    fn assistant_input(kb_ids: Vec<String>, tool_ids: Vec<String>) -> CreateVirtualAssistant {
        CreateVirtualAssistant {
            name: "Helper".into(),
            prompt: "You are a helpful assistant.".into(),
            model_name: "granite-3.1-8b-instruct".into(),
            created_by: None,
            knowledge_base_ids: kb_ids,
            tool_ids,
        }
    }

    #[tokio::test]
    async fn associations_track_the_requested_id_lists() {
        let pool = setup_test_pool().await;

        let assistant = VirtualAssistant::create(
            &pool,
            &assistant_input(vec!["docs-v1".into()], vec!["mcp::weather".into()]),
        )
        .await
        .expect("create assistant");

        let read = assistant.with_relations(&pool).await.expect("relations");
        assert_eq!(read.knowledge_base_ids, vec!["docs-v1".to_string()]);
        assert_eq!(read.tool_ids, vec!["mcp::weather".to_string()]);

        // update replaces both sets
        VirtualAssistant::update(
            &pool,
            assistant.id,
            &assistant_input(vec!["docs-v2".into(), "faq".into()], vec![]),
        )
        .await
        .expect("update assistant");

        let kb_ids = VirtualAssistant::knowledge_base_ids(&pool, assistant.id)
            .await
            .expect("query");
        assert_eq!(kb_ids, vec!["docs-v2".to_string(), "faq".to_string()]);
        assert!(VirtualAssistant::tool_ids(&pool, assistant.id)
            .await
            .expect("query")
            .is_empty());
    }

    #[tokio::test]
    async fn component_resolution_requires_a_model_server() {
        let pool = setup_test_pool().await;

        let assistant = VirtualAssistant::create(&pool, &assistant_input(vec![], vec![]))
            .await
            .expect("create assistant");

        let err = VirtualAssistant::resolve_components(&pool, assistant.id)
            .await
            .expect_err("no model server registered");
        assert!(matches!(err, ComponentError::ModelServerNotFound(_)));

        ModelServer::create(
            &pool,
            &CreateModelServer {
                name: "granite".into(),
                provider_name: "vllm".into(),
                model_name: "granite-3.1-8b-instruct".into(),
                endpoint_url: "http://models.local:8000/v1".into(),
                token: None,
            },
        )
        .await
        .expect("create model server");

        let components = VirtualAssistant::resolve_components(&pool, assistant.id)
            .await
            .expect("resolves once the model server exists");
        assert_eq!(components.model_server.provider_name, "vllm");
        assert!(components.tools.is_empty());
    }

    #[tokio::test]
    async fn dangling_tool_links_are_skipped_not_fatal() {
        let pool = setup_test_pool().await;

        ModelServer::create(
            &pool,
            &CreateModelServer {
                name: "granite".into(),
                provider_name: "vllm".into(),
                model_name: "granite-3.1-8b-instruct".into(),
                endpoint_url: "http://models.local:8000/v1".into(),
                token: None,
            },
        )
        .await
        .expect("create model server");

        McpServer::create(
            &pool,
            &CreateMcpServer {
                name: "mcp::weather".into(),
                title: "Weather".into(),
                description: None,
                endpoint_url: "http://mcp.local:9090/sse".into(),
                configuration: None,
                created_by: None,
            },
        )
        .await
        .expect("create mcp server");

        let assistant = VirtualAssistant::create(
            &pool,
            &assistant_input(vec![], vec!["mcp::weather".into(), "mcp::gone".into()]),
        )
        .await
        .expect("create assistant");

        let components = VirtualAssistant::resolve_components(&pool, assistant.id)
            .await
            .expect("resolve");
        assert_eq!(components.tools.len(), 1);
        assert_eq!(components.tools[0].name, "mcp::weather");
    }
}
