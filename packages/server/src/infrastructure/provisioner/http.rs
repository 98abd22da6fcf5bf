//! HTTP AgentProvisioner implementation.
//!
//! Talks to the external conversation-session API that provisions synthetic
//! participants: a replica (the AI identity) is validated first, then a
//! conversation session is created for the room and its joinable URL is
//! resolved. Messaging and teardown go to the same API. All calls carry the
//! `x-api-key` header and a 30-second timeout; a missing API key fails at
//! request time so the server itself can run unconfigured.

use std::time::Duration;

use serde::Deserialize;

use crate::domain::{AgentDescriptor, AgentProvisioner, AgentStatus, ProvisionError, RoomId};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the conversation-session API
#[derive(Debug, Clone)]
pub struct ProvisionerConfig {
    /// Base URL of the provisioner API (e.g. "https://tavusapi.com")
    pub base_url: String,
    /// API key; `None` leaves the bridge unconfigured
    pub api_key: Option<String>,
    /// Replica (AI identity) used for every provisioned session
    pub replica_id: String,
}

#[derive(Debug, Deserialize)]
struct ReplicaResponse {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConversationResponse {
    conversation_id: String,
    #[serde(default)]
    conversation_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: Option<String>,
}

/// AgentProvisioner over the conversation-session HTTP API.
pub struct HttpAgentProvisioner {
    config: ProvisionerConfig,
    http: reqwest::Client,
}

impl HttpAgentProvisioner {
    pub fn new(config: ProvisionerConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { config, http }
    }

    fn api_key(&self) -> Result<&str, ProvisionError> {
        match self.config.api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(ProvisionError::NotConfigured),
        }
    }

    async fn into_api_error(response: reqwest::Response) -> ProvisionError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        ProvisionError::Api { status, message }
    }

    /// Look up the replica and return its display name.
    async fn check_replica(&self, api_key: &str) -> Result<String, ProvisionError> {
        let url = format!("{}/v2/replicas/{}", self.config.base_url, self.config.replica_id);
        let response = self
            .http
            .get(&url)
            .header("x-api-key", api_key)
            .send()
            .await
            .map_err(|e| ProvisionError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            tracing::error!(
                "replica '{}' lookup failed with status {}",
                self.config.replica_id,
                response.status()
            );
            return Err(ProvisionError::ReplicaUnavailable(
                self.config.replica_id.clone(),
            ));
        }

        let replica: ReplicaResponse = response
            .json()
            .await
            .map_err(|e| ProvisionError::Transport(e.to_string()))?;
        Ok(replica.name.unwrap_or_else(|| "AI Assistant".to_string()))
    }

    /// Resolve the joinable session URL, falling back to a constructed one.
    async fn resolve_session_url(
        &self,
        api_key: &str,
        conversation_id: &str,
        from_create: Option<String>,
    ) -> String {
        if let Some(url) = from_create {
            return url;
        }

        let url = format!("{}/v2/conversations/{}", self.config.base_url, conversation_id);
        let detail = self
            .http
            .get(&url)
            .header("x-api-key", api_key)
            .send()
            .await;

        if let Ok(response) = detail {
            if response.status().is_success() {
                if let Ok(conversation) = response.json::<ConversationResponse>().await {
                    if let Some(url) = conversation.conversation_url {
                        return url;
                    }
                }
            }
        }

        format!("{}/conversations/{}", self.config.base_url, conversation_id)
    }
}

#[async_trait::async_trait]
impl AgentProvisioner for HttpAgentProvisioner {
    async fn create_session(&self, room_id: &RoomId) -> Result<AgentDescriptor, ProvisionError> {
        let api_key = self.api_key()?.to_string();

        let replica_label = self.check_replica(&api_key).await?;
        tracing::info!(
            "replica '{}' available as '{}', creating session for room '{}'",
            self.config.replica_id,
            replica_label,
            room_id
        );

        let url = format!("{}/v2/conversations", self.config.base_url);
        let response = self
            .http
            .post(&url)
            .header("x-api-key", &api_key)
            .json(&serde_json::json!({
                "replica_id": self.config.replica_id,
                "conversation_name": format!("room {}", room_id.as_str()),
            }))
            .send()
            .await
            .map_err(|e| ProvisionError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::into_api_error(response).await);
        }

        let conversation: ConversationResponse = response
            .json()
            .await
            .map_err(|e| ProvisionError::Transport(e.to_string()))?;

        let session_url = self
            .resolve_session_url(
                &api_key,
                &conversation.conversation_id,
                conversation.conversation_url,
            )
            .await;

        Ok(AgentDescriptor {
            agent_id: conversation.conversation_id,
            session_url,
            replica_label,
            status: AgentStatus::Active,
        })
    }

    async fn send_text(
        &self,
        agent: &AgentDescriptor,
        message: &str,
    ) -> Result<String, ProvisionError> {
        let api_key = self.api_key()?;

        let url = format!(
            "{}/v2/conversations/{}/messages",
            self.config.base_url, agent.agent_id
        );
        let response = self
            .http
            .post(&url)
            .header("x-api-key", api_key)
            .json(&serde_json::json!({ "message": message }))
            .send()
            .await
            .map_err(|e| ProvisionError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::into_api_error(response).await);
        }

        let ack: MessageResponse = response
            .json()
            .await
            .unwrap_or(MessageResponse { message: None });
        Ok(ack
            .message
            .unwrap_or_else(|| "Message delivered to the agent session.".to_string()))
    }

    async fn end_session(&self, agent: &AgentDescriptor) -> Result<(), ProvisionError> {
        let api_key = self.api_key()?;

        let url = format!(
            "{}/v2/conversations/{}",
            self.config.base_url, agent.agent_id
        );
        let response = self
            .http
            .delete(&url)
            .header("x-api-key", api_key)
            .send()
            .await
            .map_err(|e| ProvisionError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::into_api_error(response).await);
        }

        tracing::info!("ended agent session '{}'", agent.agent_id);
        Ok(())
    }
}
