use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::conversation::{Inbound, Keyboard, Reply, SessionState};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat/:user_id/messages", post(post_text))
        .route("/chat/:user_id/voice", post(post_voice))
        .route("/chat/:user_id/session", get(get_session))
}

#[derive(Deserialize)]
pub struct TextMessageRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ReplyBody {
    pub text: String,
    pub keyboard: Option<Vec<Vec<&'static str>>>,
    pub remove_keyboard: bool,
}

impl From<Reply> for ReplyBody {
    fn from(reply: Reply) -> Self {
        let (keyboard, remove_keyboard) = match reply.keyboard {
            Some(Keyboard::Remove) => (None, true),
            Some(keyboard) => (Some(keyboard.rows()), false),
            None => (None, false),
        };

        Self {
            text: reply.text,
            keyboard,
            remove_keyboard,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub replies: Vec<ReplyBody>,
}

impl From<Vec<Reply>> for ChatResponse {
    fn from(replies: Vec<Reply>) -> Self {
        Self {
            replies: replies.into_iter().map(ReplyBody::from).collect(),
        }
    }
}

async fn post_text(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Json(payload): Json<TextMessageRequest>,
) -> Json<ChatResponse> {
    let replies = state
        .assistant
        .handle(user_id, Inbound::Text(payload.text))
        .await;
    Json(replies.into())
}

async fn post_voice(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    audio: Bytes,
) -> Json<ChatResponse> {
    let replies = state
        .assistant
        .handle(user_id, Inbound::Voice(audio.to_vec()))
        .await;
    Json(replies.into())
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Json<SessionState> {
    Json(state.assistant.sessions().snapshot(user_id).await)
}
