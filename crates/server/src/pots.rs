//! Pots API endpoints.

use api_types::{
    pagination::{ListQuery, PagedResponse, PaginationParams},
    pot::{PotAmount, PotNew, PotUpdate, PotView},
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
) -> Reply<PagedResponse<PotView>> {
    let page = state.engine.list_pots(query.into(), &user.uid).await?;
    Ok(reply(page))
}

pub async fn query(
    Extension(user): Extension<AuthClaims>,
    State(state): State<ServerState>,
    Payload(params): Payload<PaginationParams>,
) -> Reply<PagedResponse<PotView>> {
    let page = state.engine.list_pots(params, &user.uid).await?;
    Ok(reply(page))
}

pub async fn create(
    Extension(user): Extension<AuthClaims>,
    State(state): State<ServerState>,
    Payload(payload): Payload<PotNew>,
) -> Created<PotView> {
    let pot = state.engine.new_pot(&payload, &user.uid).await?;
    Ok((StatusCode::CREATED, reply(pot)))
}

pub async fn get(
    Extension(user): Extension<AuthClaims>,
    State(state): State<ServerState>,
    IdPath(id): IdPath<Uuid>,
) -> Reply<PotView> {
    Ok(reply(state.engine.pot(id, &user.uid).await?))
}

pub async fn update(
    Extension(user): Extension<AuthClaims>,
    State(state): State<ServerState>,
    IdPath(id): IdPath<Uuid>,
    Payload(payload): Payload<PotUpdate>,
) -> Reply<PotView> {
    Ok(reply(state.engine.update_pot(id, &payload, &user.uid).await?))
}

pub async fn delete(
    Extension(user): Extension<AuthClaims>,
    State(state): State<ServerState>,
    IdPath(id): IdPath<Uuid>,
) -> Reply<PotView> {
    Ok(reply(state.engine.delete_pot(id, &user.uid).await?))
}

/// Move money into the pot.
pub async fn add(
    Extension(user): Extension<AuthClaims>,
    State(state): State<ServerState>,
    IdPath(id): IdPath<Uuid>,
    Payload(payload): Payload<PotAmount>,
) -> Reply<PotView> {
    Ok(reply(state.engine.add_to_pot(id, &payload, &user.uid).await?))
}

/// Take money out of the pot; fails without side effects when the pot holds
/// less than requested.
pub async fn withdraw(
    Extension(user): Extension<AuthClaims>,
    State(state): State<ServerState>,
    IdPath(id): IdPath<Uuid>,
    Payload(payload): Payload<PotAmount>,
) -> Reply<PotView> {
    let pot = state
        .engine
        .withdraw_from_pot(id, &payload, &user.uid)
        .await?;
    Ok(reply(pot))
}
