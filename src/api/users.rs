// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Budgeting API Contributors

use axum::extract::State;
use axum::{Extension, Json};

use crate::error::AppError;
use crate::middleware::RequestContext;
use crate::serializers::{Resp, UserResp};
use crate::state::AppState;

/// Returns the authenticated identity as established by the auth stage.
pub async fn me(Extension(ctx): Extension<RequestContext>) -> Result<Json<Resp>, AppError> {
    let user = ctx.require_user()?;
    Ok(Json(Resp::ok(&UserResp::from(&user))))
}

/// Forwards the caller's token upstream and returns the withdrawable amount.
pub async fn balance(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Resp>, AppError> {
    ctx.require_user()?;
    let token = ctx.token().unwrap_or_default();
    let amount = state.users.get_available_balance(&token).await?;
    Ok(Json(Resp::ok(&amount)))
}
