//! Manual re-broadcast endpoint
//!
//! Lets an admin resend a message (optionally with an image) to all
//! subscribers, e.g. after a milestone broadcast that delivered to nobody.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use crate::broadcast::{BroadcastResult, PhotoPayload};
use crate::error::Error;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NotifyRequest {
    pub message: String,
    /// Remotely resolvable image reference, sent by reference
    pub photo_url: Option<String>,
    /// Base64-encoded image bytes, uploaded as an attachment
    pub photo_base64: Option<String>,
    /// Caption for photo sends; defaults to `message`
    pub caption: Option<String>,
}

/// POST /api/notify
pub async fn send_notification(
    State(state): State<AppState>,
    Json(request): Json<NotifyRequest>,
) -> Result<Json<BroadcastResult>, ApiError> {
    if request.message.trim().is_empty() {
        return Err(Error::InvalidInput("message must not be empty".to_string()).into());
    }

    // Pick the wire path from the payload shape
    let photo = match (&request.photo_url, &request.photo_base64) {
        (Some(_), Some(_)) => {
            return Err(Error::InvalidInput(
                "provide photo_url or photo_base64, not both".to_string(),
            )
            .into())
        }
        (Some(url), None) => Some(PhotoPayload::Url(url.clone())),
        (None, Some(encoded)) => Some(PhotoPayload::from_base64(encoded)?),
        (None, None) => None,
    };

    let result = match photo {
        Some(photo) => {
            let caption = request.caption.as_deref().unwrap_or(&request.message);
            state.dispatcher.send_photo(&state.db, &photo, caption).await?
        }
        None => state.dispatcher.send_text(&state.db, &request.message).await?,
    };

    Ok(Json(result))
}
