//! Transactions API endpoints.

use api_types::{
    pagination::{ListQuery, PagedResponse, PaginationParams},
    transaction::{TransactionNew, TransactionUpdate, TransactionView},
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

/// List with the query string form. Filtering by category needs
/// `POST /transactions/query`.
pub async fn list(
    Extension(user): Extension<AuthClaims>,
    State(state): State<ServerState>,
    QueryString(query): QueryString<ListQuery>,
) -> Reply<PagedResponse<TransactionView>> {
    let page = state
        .engine
        .list_transactions(query.into(), &user.uid)
        .await?;
    Ok(reply(page))
}

pub async fn query(
    Extension(user): Extension<AuthClaims>,
    State(state): State<ServerState>,
    Payload(params): Payload<PaginationParams>,
) -> Reply<PagedResponse<TransactionView>> {
    let page = state.engine.list_transactions(params, &user.uid).await?;
    Ok(reply(page))
}

pub async fn create(
    Extension(user): Extension<AuthClaims>,
    State(state): State<ServerState>,
    Payload(payload): Payload<TransactionNew>,
) -> Created<TransactionView> {
    let transaction = state.engine.new_transaction(&payload, &user.uid).await?;
    Ok((StatusCode::CREATED, reply(transaction)))
}

pub async fn get(
    Extension(user): Extension<AuthClaims>,
    State(state): State<ServerState>,
    IdPath(id): IdPath<Uuid>,
) -> Reply<TransactionView> {
    Ok(reply(state.engine.transaction(id, &user.uid).await?))
}

pub async fn update(
    Extension(user): Extension<AuthClaims>,
    State(state): State<ServerState>,
    IdPath(id): IdPath<Uuid>,
    Payload(payload): Payload<TransactionUpdate>,
) -> Reply<TransactionView> {
    let transaction = state
        .engine
        .update_transaction(id, &payload, &user.uid)
        .await?;
    Ok(reply(transaction))
}

pub async fn delete(
    Extension(user): Extension<AuthClaims>,
    State(state): State<ServerState>,
    IdPath(id): IdPath<Uuid>,
) -> Reply<TransactionView> {
    Ok(reply(state.engine.delete_transaction(id, &user.uid).await?))
}
