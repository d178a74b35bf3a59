use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use std::sync::Arc;

use crate::{ServerError, budgets, incomes, pots, transactions, user};
use engine::{AuthProvider, Engine};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub auth: Arc<dyn AuthProvider>,
}

impl ServerState {
    pub fn new(engine: Engine, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            engine: Arc::new(engine),
            auth,
        }
    }
}

/// Resolves the bearer token and stores the claims in the request extensions.
async fn auth(
    State(state): State<ServerState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let token = bearer
        .as_ref()
        .map(|TypedHeader(header)| header.token())
        .unwrap_or_default();
    let claims = state.auth.verify_token(token).await?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/budgets", get(budgets::list).post(budgets::create))
        .route("/budgets/query", post(budgets::query))
        .route(
            "/budgets/{id}",
            get(budgets::get).patch(budgets::update).delete(budgets::delete),
        )
        .route("/incomes", get(incomes::list).post(incomes::create))
        .route("/incomes/query", post(incomes::query))
        .route(
            "/incomes/{id}",
            get(incomes::get).patch(incomes::update).delete(incomes::delete),
        )
        .route("/pots", get(pots::list).post(pots::create))
        .route("/pots/query", post(pots::query))
        .route(
            "/pots/{id}",
            get(pots::get).patch(pots::update).delete(pots::delete),
        )
        .route("/pots/{id}/add", post(pots::add))
        .route("/pots/{id}/withdraw", post(pots::withdraw))
        .route(
            "/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route("/transactions/query", post(transactions::query))
        .route(
            "/transactions/{id}",
            get(transactions::get)
                .patch(transactions::update)
                .delete(transactions::delete),
        )
        .route("/me", get(user::me))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

/// Bind `addr` and serve until the listener fails.
pub async fn run(
    engine: Engine,
    auth: Arc<dyn AuthProvider>,
    addr: &str,
) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    run_with_listener(engine, auth, listener).await
}

pub async fn run_with_listener(
    engine: Engine,
    auth: Arc<dyn AuthProvider>,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(ServerState::new(engine, auth))).await
}

pub fn spawn_with_listener(
    engine: Engine,
    auth: Arc<dyn AuthProvider>,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, auth, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
