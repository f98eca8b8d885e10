// src/handlers/users.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::tenancy::{AddExistingUserPayload, CreateUserPayload},
    services::tenancy_service::RemovalAction,
};

pub async fn list_users(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let users = app_state.tenancy_service.list_users(&user).await?;
    Ok(Json(users))
}

pub async fn create_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let created = app_state.tenancy_service.create_user(&user, payload).await?;

    if let Err(e) = app_state
        .audit_repo
        .log_action(
            user.id,
            "create_user",
            None,
            json!({ "created_user_id": created.id }),
            user.tenant_id,
        )
        .await
    {
        tracing::warn!("Falha ao registrar create_user no log de ações: {}", e);
    }

    Ok((StatusCode::CREATED, Json(created)))
}

/// Remove um usuário: owner desvincula do tenant, admin apaga de vez.
pub async fn remove_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let action = app_state.tenancy_service.remove_user(&user, user_id).await?;

    let action_name = match action {
        RemovalAction::Detach => "detach_user",
        RemovalAction::HardDelete => "delete_user",
    };
    if let Err(e) = app_state
        .audit_repo
        .log_action(user.id, action_name, None, json!({ "target_user_id": user_id }), user.tenant_id)
        .await
    {
        tracing::warn!("Falha ao registrar {action_name} no log de ações: {}", e);
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_existing_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<AddExistingUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    let added = app_state
        .tenancy_service
        .add_existing_user(&user, payload.user_id)
        .await?;

    if let Err(e) = app_state
        .audit_repo
        .log_action(
            user.id,
            "add_existing_user",
            None,
            json!({ "target_user_id": payload.user_id }),
            user.tenant_id,
        )
        .await
    {
        tracing::warn!("Falha ao registrar add_existing_user no log de ações: {}", e);
    }

    Ok(Json(added))
}
