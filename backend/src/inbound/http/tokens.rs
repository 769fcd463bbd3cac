//! Sign-in HTTP handler.
//!
//! ```text
//! POST /api/v1/auth/token  Exchange an identity-provider code for a token
//! ```

use actix_web::{post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Error;
use crate::domain::ports::SignedToken;
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Request payload carrying the provider's one-time code.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequestBody {
    pub code: String,
}

/// Issued bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponseBody {
    pub access_token: String,
    /// Always `Bearer`.
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

impl From<SignedToken> for TokenResponseBody {
    fn from(value: SignedToken) -> Self {
        Self {
            access_token: value.token,
            token_type: "Bearer".to_owned(),
            expires_at: value.expires_at,
        }
    }
}

/// Exchange an identity-provider code for a signed identity token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/token",
    request_body = TokenRequestBody,
    responses(
        (status = 200, description = "Token issued", body = TokenResponseBody),
        (status = 400, description = "Missing code", body = Error),
        (status = 401, description = "Code rejected or account unknown", body = Error),
        (status = 503, description = "Identity provider unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "issueToken",
    security([])
)]
#[post("/auth/token")]
pub async fn issue_token(
    state: web::Data<HttpState>,
    payload: web::Json<TokenRequestBody>,
) -> ApiResult<web::Json<TokenResponseBody>> {
    let signed = state.sign_in.sign_in(&payload.code).await?;
    Ok(web::Json(signed.into()))
}
