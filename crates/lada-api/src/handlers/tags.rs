//! Catalogue listing

use axum::{extract::State, Json};
use chrono::Utc;
use lada_local_models::{is_downloaded, size_bytes, size_label};
use lada_providers::wire::{ModelTag, TagsResponse};
use serde_json::json;

use crate::state::AppState;

/// `GET /api/tags`: every catalogue model, loaded or not
pub async fn list_tags(State(state): State<AppState>) -> Json<TagsResponse> {
    let wrapper = &state.wrapper;
    let current = wrapper.current_model().await;
    let modified_at = Utc::now().to_rfc3339();

    let models = wrapper
        .catalog()
        .entries()
        .iter()
        .map(|entry| ModelTag {
            name: entry.name.clone(),
            modified_at: modified_at.clone(),
            size: size_bytes(&entry.name),
            digest: "unknown".to_string(),
            details: json!({
                "is_loaded": current.as_deref() == Some(entry.name.as_str()),
                "is_downloaded": is_downloaded(wrapper.cache_dir(), &entry.model_id),
                "model_id": entry.model_id,
                "size_label": size_label(&entry.name),
            }),
        })
        .collect();

    Json(TagsResponse { models })
}
