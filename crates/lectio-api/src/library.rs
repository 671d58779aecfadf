//! Reading-progress handlers under `/library`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/library` | The caller's progress rows, most recent first |
//! | `POST` | `/library/{book_id}/start-or-resume` | Returns the content URL and stored position |
//! | `POST` | `/library/{book_id}/progress` | Body: `{"progressPercent":42.5,"lastChapter":"…","lastPosition":1200}` |
//! | `POST` | `/library/{book_id}/complete` | Status `completed`, percent 100 |
//!
//! Every event is applied by the store as one read-apply-upsert transaction,
//! so duplicate or concurrent checkpoints never create a second row.

use axum::{
  Extension, Json,
  extract::{Path, State},
};
use lectio_core::{
  progress::{Checkpoint, ProgressEvent, ReadingProgress},
  store::ClubStore,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  AppState,
  auth::Identity,
  books::published_book,
  error::{ApiError, Result},
};

/// `GET /library`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<ReadingProgress>>>
where
  S: ClubStore,
{
  let rows = state
    .store
    .list_progress(Some(identity.user_id))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(rows))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeResponse {
  pub content_url: String,
  #[serde(flatten)]
  pub progress:    ReadingProgress,
}

async fn record<S: ClubStore>(
  state: &AppState<S>,
  identity: &Identity,
  book_id: Uuid,
  event: ProgressEvent,
) -> Result<ReadingProgress> {
  state
    .store
    .record_progress(identity.user_id, book_id, event)
    .await
    .map_err(ApiError::from_store)
}

/// `POST /library/{book_id}/start-or-resume`
pub async fn start_or_resume<S>(
  State(state): State<AppState<S>>,
  Extension(identity): Extension<Identity>,
  Path(book_id): Path<Uuid>,
) -> Result<Json<ResumeResponse>>
where
  S: ClubStore,
{
  let book = published_book(state.store.as_ref(), book_id).await?;
  let progress = record(&state, &identity, book_id, ProgressEvent::StartOrResume).await?;
  Ok(Json(ResumeResponse { content_url: book.content_url, progress }))
}

/// `POST /library/{book_id}/progress`
pub async fn checkpoint<S>(
  State(state): State<AppState<S>>,
  Extension(identity): Extension<Identity>,
  Path(book_id): Path<Uuid>,
  Json(body): Json<Checkpoint>,
) -> Result<Json<ReadingProgress>>
where
  S: ClubStore,
{
  body.validate()?;
  published_book(state.store.as_ref(), book_id).await?;
  let progress = record(&state, &identity, book_id, ProgressEvent::Checkpoint(body)).await?;
  Ok(Json(progress))
}

/// `POST /library/{book_id}/complete`
pub async fn complete<S>(
  State(state): State<AppState<S>>,
  Extension(identity): Extension<Identity>,
  Path(book_id): Path<Uuid>,
) -> Result<Json<ReadingProgress>>
where
  S: ClubStore,
{
  published_book(state.store.as_ref(), book_id).await?;
  let progress = record(&state, &identity, book_id, ProgressEvent::Complete).await?;
  tracing::info!(user_id = %identity.user_id, %book_id, "book completed");
  Ok(Json(progress))
}
