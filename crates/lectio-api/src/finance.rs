//! Finance endpoints: the monthly summary and expense bookkeeping.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/admin/finance/summary` | `?month=3&year=2026` required |
//! | `GET`    | `/admin/finance/expenses` | Optional `?month&year` (both or neither) |
//! | `POST`   | `/admin/finance/expenses` | Body: [`NewExpense`]; returns 201 |
//! | `PUT`    | `/admin/finance/expenses/{id}` | Body: [`NewExpense`] |
//! | `DELETE` | `/admin/finance/expenses/{id}` | Returns 204 |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use lectio_core::{
  finance::{Expense, FinanceSummary, Month, NewExpense, summarize},
  store::ClubStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  error::{ApiError, Result},
};

#[derive(Debug, Deserialize)]
pub struct MonthParams {
  pub month: Option<u32>,
  pub year:  Option<i32>,
}

impl MonthParams {
  fn month(&self) -> Result<Option<Month>> {
    match (self.year, self.month) {
      (Some(y), Some(m)) => Ok(Some(Month::new(y, m)?)),
      (None, None) => Ok(None),
      _ => Err(ApiError::BadRequest("month and year go together".into())),
    }
  }
}

/// `GET /admin/finance/summary?month&year`
pub async fn summary<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<MonthParams>,
) -> Result<Json<FinanceSummary>>
where
  S: ClubStore,
{
  let month = params
    .month()?
    .ok_or_else(|| ApiError::BadRequest("month and year are required".into()))?;
  let users = state.store.list_users().await.map_err(ApiError::from_store)?;
  let expenses = state
    .store
    .list_expenses(Some(month))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(summarize(month, &users, &expenses)))
}

// ─── Expenses ────────────────────────────────────────────────────────────────

/// `GET /admin/finance/expenses[?month&year]`
pub async fn list_expenses<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<MonthParams>,
) -> Result<Json<Vec<Expense>>>
where
  S: ClubStore,
{
  let expenses = state
    .store
    .list_expenses(params.month()?)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(expenses))
}

/// `POST /admin/finance/expenses`
pub async fn create_expense<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<NewExpense>,
) -> Result<impl IntoResponse>
where
  S: ClubStore,
{
  body.validate()?;
  let expense = state.store.add_expense(body).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(expense)))
}

/// `PUT /admin/finance/expenses/{id}`
pub async fn update_expense<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<NewExpense>,
) -> Result<Json<Expense>>
where
  S: ClubStore,
{
  body.validate()?;
  let expense = state
    .store
    .update_expense(id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(expense))
}

/// `DELETE /admin/finance/expenses/{id}`
pub async fn delete_expense<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode>
where
  S: ClubStore,
{
  state.store.delete_expense(id).await.map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
