use axum::{routing::{get, post}, Json, Router};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc};
use tracing::info;

use crate::engine::TurnEngine;
use crate::error::AgentError;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<TurnEngine>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub thread_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub thread_id: String,
    /// Mid-turn failure reported alongside whatever partial output the turn
    /// produced before it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

async fn chat(
    axum::extract::State(state): axum::extract::State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, String)> {
    let thread_id = body.thread_id.unwrap_or_else(|| "default".to_string());
    let (fragments, result) = state.engine.run_turn_collect(&thread_id, &body.message).await;
    let error = match result {
        Ok(()) => None,
        // nothing was produced at all; surface the outage as a gateway error
        Err(err @ AgentError::ModelUnavailable { .. }) if fragments.is_empty() => {
            return Err((StatusCode::BAD_GATEWAY, err.to_string()));
        }
        Err(err) => Some(err.to_string()),
    };
    Ok(Json(ChatResponse {
        response: fragments.concat(),
        thread_id,
        error,
    }))
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "switchboard agent backend" }))
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/chat", post(chat))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::model::ChatModel;
    use crate::store::SessionStore;
    use crate::tools::ToolRegistry;
    use async_trait::async_trait;

    struct EchoModel;

    #[async_trait]
    impl ChatModel for EchoModel {
        async fn invoke(&self, history: &[Message]) -> Result<Message, AgentError> {
            let last = history.last().expect("history is never empty");
            Ok(Message::assistant(format!("echo: {}", last.content)))
        }
    }

    struct DownModel;

    #[async_trait]
    impl ChatModel for DownModel {
        async fn invoke(&self, _history: &[Message]) -> Result<Message, AgentError> {
            Err(AgentError::model_unavailable("connection refused"))
        }
    }

    fn state_with(model: Arc<dyn ChatModel>) -> AppState {
        AppState {
            engine: Arc::new(TurnEngine::new(
                model,
                ToolRegistry::new(),
                SessionStore::new(),
                25,
            )),
        }
    }

    async fn spawn_server(state: AppState) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn chat_defaults_the_thread_id() {
        let base = spawn_server(state_with(Arc::new(EchoModel))).await;
        let resp = reqwest::Client::new()
            .post(format!("{base}/chat"))
            .json(&serde_json::json!({ "message": "hi" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: ChatResponse = resp.json().await.unwrap();
        assert_eq!(body.thread_id, "default");
        assert_eq!(body.response, "echo: hi");
        assert!(body.error.is_none());
    }

    #[tokio::test]
    async fn chat_keeps_threads_separate() {
        let state = state_with(Arc::new(EchoModel));
        let engine = state.engine.clone();
        let base = spawn_server(state).await;
        let client = reqwest::Client::new();
        for (msg, tid) in [("a", "t1"), ("b", "t2")] {
            client
                .post(format!("{base}/chat"))
                .json(&serde_json::json!({ "message": msg, "thread_id": tid }))
                .send()
                .await
                .unwrap();
        }
        assert_eq!(engine.store().history("t1").await.len(), 2);
        assert_eq!(engine.store().history("t2").await.len(), 2);
    }

    #[tokio::test]
    async fn model_outage_maps_to_bad_gateway() {
        let base = spawn_server(state_with(Arc::new(DownModel))).await;
        let resp = reqwest::Client::new()
            .post(format!("{base}/chat"))
            .json(&serde_json::json!({ "message": "hi" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 502);
    }

    #[tokio::test]
    async fn root_reports_identity() {
        let base = spawn_server(state_with(Arc::new(EchoModel))).await;
        let body: serde_json::Value = reqwest::get(&base).await.unwrap().json().await.unwrap();
        assert_eq!(body["message"], "switchboard agent backend");
    }
}
