//! Budgets API endpoints.

use api_types::{
    budget::{BudgetNew, BudgetUpdate, BudgetView},
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
) -> Reply<PagedResponse<BudgetView>> {
    let page = state.engine.list_budgets(query.into(), &user.uid).await?;
    Ok(reply(page))
}

pub async fn query(
    Extension(user): Extension<AuthClaims>,
    State(state): State<ServerState>,
    Payload(params): Payload<PaginationParams>,
) -> Reply<PagedResponse<BudgetView>> {
    let page = state.engine.list_budgets(params, &user.uid).await?;
    Ok(reply(page))
}

pub async fn create(
    Extension(user): Extension<AuthClaims>,
    State(state): State<ServerState>,
    Payload(payload): Payload<BudgetNew>,
) -> Created<BudgetView> {
    let budget = state.engine.new_budget(&payload, &user.uid).await?;
    Ok((StatusCode::CREATED, reply(budget)))
}

pub async fn get(
    Extension(user): Extension<AuthClaims>,
    State(state): State<ServerState>,
    IdPath(id): IdPath<Uuid>,
) -> Reply<BudgetView> {
    Ok(reply(state.engine.budget(id, &user.uid).await?))
}

pub async fn update(
    Extension(user): Extension<AuthClaims>,
    State(state): State<ServerState>,
    IdPath(id): IdPath<Uuid>,
    Payload(payload): Payload<BudgetUpdate>,
) -> Reply<BudgetView> {
    Ok(reply(state.engine.update_budget(id, &payload, &user.uid).await?))
}

pub async fn delete(
    Extension(user): Extension<AuthClaims>,
    State(state): State<ServerState>,
    IdPath(id): IdPath<Uuid>,
) -> Reply<BudgetView> {
    Ok(reply(state.engine.delete_budget(id, &user.uid).await?))
}
