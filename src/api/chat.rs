//! Chat endpoints, mounted only when the chat feature is enabled

use crate::api::handlers::{ensure_disease, owned_prediction};
use crate::api::{AppState, AuthUser};
use crate::chat::{context_for, ChatReply};
use crate::error::Result;
use crate::models::{ChatContext, ChatLog, ConversationSummary, UserProfile};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 4000))]
    pub message: String,
    pub prediction_id: Option<Uuid>,
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub conversation_id: String,
    pub messages: Vec<ChatLog>,
}

#[derive(Debug, Serialize)]
pub struct DeleteConversationResponse {
    pub conversation_id: String,
    pub deleted_messages: usize,
}

async fn prediction_context(
    state: &AppState,
    user: &UserProfile,
    prediction_id: &Uuid,
) -> Result<ChatContext> {
    let prediction = owned_prediction(state, user, prediction_id).await?;
    let disease = match state.store.get_disease(&prediction.disease_id).await? {
        Some(disease) => disease,
        None => ensure_disease(state, prediction.disease).await?,
    };
    Ok(context_for(&prediction, &disease))
}

/// Open a conversation about one of the caller's predictions
pub async fn start_conversation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(prediction_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ChatReply>)> {
    let context = prediction_context(&state, &user, &prediction_id).await?;
    let reply = state.chat.start_conversation(user.id, &context).await?;
    Ok((StatusCode::CREATED, Json(reply)))
}

/// Send a message. Context comes from `prediction_id` or, failing that,
/// from the prediction the conversation was started with.
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<ChatReply>> {
    request.validate()?;

    let prediction_id = match (request.prediction_id, request.conversation_id.as_deref()) {
        (Some(id), _) => Some(id),
        (None, Some(conversation_id)) => state
            .store
            .list_chat_logs(&user.id, Some(conversation_id))
            .await?
            .iter()
            .find_map(|log| log.prediction_id),
        (None, None) => None,
    };

    let context = match prediction_id {
        Some(id) => Some(prediction_context(&state, &user, &id).await?),
        None => None,
    };

    let reply = state
        .chat
        .send_message(
            user.id,
            &request.message,
            context.as_ref(),
            request.conversation_id,
        )
        .await?;
    Ok(Json(reply))
}

pub async fn list_conversations(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<ConversationSummary>>> {
    Ok(Json(state.chat.list_conversations(user.id).await?))
}

pub async fn get_conversation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(conversation_id): Path<String>,
) -> Result<Json<ConversationResponse>> {
    let messages = state.chat.conversation(user.id, &conversation_id).await?;
    Ok(Json(ConversationResponse {
        conversation_id,
        messages,
    }))
}

pub async fn delete_conversation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(conversation_id): Path<String>,
) -> Result<Json<DeleteConversationResponse>> {
    let deleted_messages = state
        .chat
        .delete_conversation(user.id, &conversation_id)
        .await?;
    Ok(Json(DeleteConversationResponse {
        conversation_id,
        deleted_messages,
    }))
}
