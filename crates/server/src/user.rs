//! Identity of the caller.

use api_types::user::Me;
use axum::Extension;
use engine::AuthClaims;

use crate::{Reply, reply};

/// Return the verified claims of the bearer token.
pub async fn me(Extension(user): Extension<AuthClaims>) -> Reply<Me> {
    Ok(reply(Me {
        uid: user.uid,
        email: user.email,
        claims: user.claims,
    }))
}
