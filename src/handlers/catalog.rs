// src/handlers/catalog.rs
//
// Cadastros por tenant: fornecedores, armazéns e fulfillments.
// Leitura para qualquer membro do tenant; escrita exige a capacidade
// de gestão de cadastro (owner/admin).

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::User,
    models::catalog::CreateNamedPayload,
    services::authz::{self, Capability},
};

fn tenant_of(user: &User) -> Result<i64, AppError> {
    user.tenant_id
        .ok_or_else(|| AppError::Forbidden("o cadastro exige vínculo a um tenant".to_string()))
}

pub async fn list_suppliers(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let tenant_id = tenant_of(&user)?;
    Ok(Json(app_state.catalog_repo.list_suppliers(tenant_id).await?))
}

pub async fn create_supplier(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateNamedPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    authz::require(&user, Capability::ManageCatalog)?;
    let tenant_id = tenant_of(&user)?;
    let created = app_state.catalog_repo.create_supplier(tenant_id, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_warehouses(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let tenant_id = tenant_of(&user)?;
    Ok(Json(app_state.catalog_repo.list_warehouses(tenant_id).await?))
}

pub async fn create_warehouse(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateNamedPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    authz::require(&user, Capability::ManageCatalog)?;
    let tenant_id = tenant_of(&user)?;
    let created = app_state.catalog_repo.create_warehouse(tenant_id, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_fulfillments(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let tenant_id = tenant_of(&user)?;
    Ok(Json(app_state.catalog_repo.list_fulfillments(tenant_id).await?))
}

pub async fn create_fulfillment(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateNamedPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    authz::require(&user, Capability::ManageCatalog)?;
    let tenant_id = tenant_of(&user)?;
    let created = app_state.catalog_repo.create_fulfillment(tenant_id, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
