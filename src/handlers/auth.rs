// src/handlers/auth.rs

use axum::{extract::State, Json};
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{AuthResponse, LoginPayload, User, UserInfo},
};

// Handler de login
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let (token, user) = app_state
        .auth_service
        .login_user(&payload.username, &payload.password)
        .await?;

    // Log de auditoria tolerante a falha: nunca derruba o login.
    if let Err(e) = app_state
        .audit_repo
        .log_action(user.id, "login", None, json!({}), user.tenant_id)
        .await
    {
        tracing::warn!("Falha ao registrar login no log de ações: {}", e);
    }

    Ok(Json(AuthResponse { token, user: UserInfo::from(&user) }))
}

// Logout: tokens JWT são stateless, então só registramos a ação.
pub async fn logout(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<serde_json::Value>, AppError> {
    if let Err(e) = app_state
        .audit_repo
        .log_action(user.id, "logout", None, json!({}), user.tenant_id)
        .await
    {
        tracing::warn!("Falha ao registrar logout no log de ações: {}", e);
    }

    Ok(Json(json!({ "message": "Sessão encerrada." })))
}

// Handler da rota protegida /me
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}
