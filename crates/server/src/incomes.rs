//! Incomes API endpoints.

use api_types::{
    income::{IncomeNew, IncomeUpdate, IncomeView},
    pagination::{ListQuery, PagedResponse, PaginationParams},
};
use axum::{Extension, extract::State, http::StatusCode};
use engine::AuthClaims;
use uuid::Uuid;

use crate::{
    Created, Reply,
    extract::{IdPath, Payload, QueryString},
    reply,
    server::ServerState,
};

pub async fn list(
    Extension(user): Extension<AuthClaims>,
    State(state): State<ServerState>,
    QueryString(query): QueryString<ListQuery>,
) -> Reply<PagedResponse<IncomeView>> {
    let page = state.engine.list_incomes(query.into(), &user.uid).await?;
    Ok(reply(page))
}

pub async fn query(
    Extension(user): Extension<AuthClaims>,
    State(state): State<ServerState>,
    Payload(params): Payload<PaginationParams>,
) -> Reply<PagedResponse<IncomeView>> {
    let page = state.engine.list_incomes(params, &user.uid).await?;
    Ok(reply(page))
}

pub async fn create(
    Extension(user): Extension<AuthClaims>,
    State(state): State<ServerState>,
    Payload(payload): Payload<IncomeNew>,
) -> Created<IncomeView> {
    let income = state.engine.new_income(&payload, &user.uid).await?;
    Ok((StatusCode::CREATED, reply(income)))
}

pub async fn get(
    Extension(user): Extension<AuthClaims>,
    State(state): State<ServerState>,
    IdPath(id): IdPath<Uuid>,
) -> Reply<IncomeView> {
    Ok(reply(state.engine.income(id, &user.uid).await?))
}

pub async fn update(
    Extension(user): Extension<AuthClaims>,
    State(state): State<ServerState>,
    IdPath(id): IdPath<Uuid>,
    Payload(payload): Payload<IncomeUpdate>,
) -> Reply<IncomeView> {
    Ok(reply(state.engine.update_income(id, &payload, &user.uid).await?))
}

pub async fn delete(
    Extension(user): Extension<AuthClaims>,
    State(state): State<ServerState>,
    IdPath(id): IdPath<Uuid>,
) -> Reply<IncomeView> {
    Ok(reply(state.engine.delete_income(id, &user.uid).await?))
}
