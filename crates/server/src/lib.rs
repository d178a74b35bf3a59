use api_types::envelope::ActionResponse;
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use engine::{EngineError, ErrorKind, ValidationErrors};

pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod budgets;
mod extract;
mod incomes;
mod pots;
mod server;
mod transactions;
mod user;

pub mod types {
    pub mod budget {
        pub use api_types::budget::{BudgetNew, BudgetUpdate, BudgetView};
    }

    pub mod income {
        pub use api_types::income::{IncomeNew, IncomeUpdate, IncomeView};
    }

    pub mod pot {
        pub use api_types::pot::{PotAmount, PotNew, PotUpdate, PotView};
    }

    pub mod transaction {
        pub use api_types::transaction::{TransactionNew, TransactionUpdate, TransactionView};
    }

    pub mod pagination {
        pub use api_types::pagination::{ListQuery, PagedResponse, PaginationParams};
    }
}

/// Successful action body.
pub(crate) type Reply<T> = Result<Json<ActionResponse<T>>, ServerError>;

/// Successful action body for endpoints that create something.
pub(crate) type Created<T> = Result<(StatusCode, Json<ActionResponse<T>>), ServerError>;

pub(crate) fn reply<T>(data: T) -> Json<ActionResponse<T>> {
    Json(ActionResponse::ok(data))
}

/// Every failure leaves the server as `{data: null, error, validationErrors?}`.
#[derive(Debug)]
pub struct ServerError(EngineError);

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        other => match other.kind() {
            ErrorKind::Validation | ErrorKind::DomainRule => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Auth => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}

fn body_for_engine_error(err: EngineError) -> ActionResponse<()> {
    match err {
        EngineError::Validation(errors) => {
            ActionResponse::failure("validation failed".to_string(), Some(errors.into_inner()))
        }
        err @ EngineError::Store { .. } => {
            tracing::error!("store error: {err}");
            ActionResponse::failure("internal server error".to_string(), None)
        }
        other => ActionResponse::failure(other.to_string(), None),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let status = status_for_engine_error(&self.0);
        (status, Json(body_for_engine_error(self.0))).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self(value)
    }
}

fn rejected(field: &str, message: String) -> ServerError {
    ServerError(EngineError::Validation(ValidationErrors::single(field, message)))
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        rejected("body", rejection.body_text())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(rejection: QueryRejection) -> Self {
        rejected("query", rejection.body_text())
    }
}

impl From<PathRejection> for ServerError {
    fn from(rejection: PathRejection) -> Self {
        rejected("id", rejection.body_text())
    }
}
