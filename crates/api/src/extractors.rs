//! Request extractors.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use engine_core::ViewMode;
use serde::Deserialize;

use crate::response::ApiError;

#[derive(Debug, Default, Deserialize)]
struct ViewParam {
    #[serde(default)]
    view: Option<String>,
}

/// The `view` query parameter: `week` (default) or `day`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct View(pub ViewMode);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for View {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(param) = Query::<ViewParam>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;

        match param.view.as_deref().map(str::trim) {
            None | Some("") | Some("week") => Ok(View(ViewMode::Week)),
            Some("day") => Ok(View(ViewMode::Day)),
            Some(other) => Err(ApiError::bad_request(format!(
                "unknown view '{}', expected 'week' or 'day'",
                other
            ))),
        }
    }
}
