//! Catalog handlers.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/books` | Published books only, newest first |
//! | `GET`  | `/books/{id}` | 404 for drafts |
//! | `GET`  | `/admin/books` | Drafts included |
//! | `POST` | `/admin/books` | Body: [`BookDraft`]; returns 201 |
//! | `PUT`  | `/admin/books/{id}` | Body: [`BookDraft`] |
//! | `POST` | `/admin/books/{id}/toggle-publish` | Publishing re-validates the book |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use lectio_core::{
  book::{Book, BookDraft},
  store::ClubStore,
};
use uuid::Uuid;

use crate::{
  AppState,
  error::{ApiError, Result},
};

fn not_found(id: Uuid) -> ApiError { ApiError::NotFound(format!("book not found: {id}")) }

/// A book readers may see: existing and published.
pub(crate) async fn published_book<S: ClubStore>(store: &S, id: Uuid) -> Result<Book> {
  store
    .get_book(id)
    .await
    .map_err(ApiError::from_store)?
    .filter(|b| b.published)
    .ok_or_else(|| not_found(id))
}

// ─── Reader side ─────────────────────────────────────────────────────────────

/// `GET /books`
pub async fn list_published<S>(State(state): State<AppState<S>>) -> Result<Json<Vec<Book>>>
where
  S: ClubStore,
{
  let books = state.store.list_books(true).await.map_err(ApiError::from_store)?;
  Ok(Json(books))
}

/// `GET /books/{id}`
pub async fn get_published<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Book>>
where
  S: ClubStore,
{
  Ok(Json(published_book(state.store.as_ref(), id).await?))
}

// ─── Admin side ──────────────────────────────────────────────────────────────

/// `GET /admin/books`
pub async fn list_all<S>(State(state): State<AppState<S>>) -> Result<Json<Vec<Book>>>
where
  S: ClubStore,
{
  let books = state.store.list_books(false).await.map_err(ApiError::from_store)?;
  Ok(Json(books))
}

/// `POST /admin/books`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Json(draft): Json<BookDraft>,
) -> Result<impl IntoResponse>
where
  S: ClubStore,
{
  draft.validate()?;
  let book = state.store.create_book(draft).await.map_err(ApiError::from_store)?;
  tracing::info!(book_id = %book.book_id, published = book.published, "book created");
  Ok((StatusCode::CREATED, Json(book)))
}

/// `PUT /admin/books/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(draft): Json<BookDraft>,
) -> Result<Json<Book>>
where
  S: ClubStore,
{
  draft.validate()?;
  let book = state.store.update_book(id, draft).await.map_err(ApiError::from_store)?;
  Ok(Json(book))
}

/// `POST /admin/books/{id}/toggle-publish`
pub async fn toggle_publish<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Book>>
where
  S: ClubStore,
{
  let book = state
    .store
    .get_book(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| not_found(id))?;
  let book = state
    .store
    .update_book(id, book.toggled()?)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(book_id = %id, published = book.published, "publication toggled");
  Ok(Json(book))
}
