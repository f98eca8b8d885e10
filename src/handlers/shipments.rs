// src/handlers/shipments.rs

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::shipment::{
        CreateShipmentPayload, ShipmentListQuery, StatusUpdatePayload, UpdateShipmentPayload,
    },
};

const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

pub async fn create_shipment(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateShipmentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let view = app_state.shipment_service.create_shipment(&user, payload).await?;

    if let Err(e) = app_state
        .audit_repo
        .log_action(
            user.id,
            "create_shipment",
            Some(&view.shipment.id),
            json!({ "supplier": view.shipment.supplier, "warehouse": view.shipment.warehouse }),
            user.tenant_id,
        )
        .await
    {
        tracing::warn!("Falha ao registrar create_shipment no log de ações: {}", e);
    }

    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn list_shipments(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<ShipmentListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let items = app_state.shipment_service.list_shipments(&user, &query).await?;
    Ok(Json(items))
}

pub async fn get_shipment(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(shipment_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let view = app_state.shipment_service.get_shipment(&user, &shipment_id).await?;
    Ok(Json(view))
}

pub async fn update_shipment(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(shipment_id): Path<String>,
    Json(patch): Json<UpdateShipmentPayload>,
) -> Result<impl IntoResponse, AppError> {
    let view = app_state
        .shipment_service
        .update_shipment(&user, &shipment_id, patch)
        .await?;

    if let Err(e) = app_state
        .audit_repo
        .log_action(user.id, "update_shipment", Some(&shipment_id), json!({}), user.tenant_id)
        .await
    {
        tracing::warn!("Falha ao registrar update_shipment no log de ações: {}", e);
    }

    Ok(Json(view))
}

/// Confirmação de etapa de status. A chave de idempotência vem no header
/// `Idempotency-Key`; sem ela, o serviço sintetiza uma nova por chamada.
pub async fn create_shipment_event(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(shipment_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<StatusUpdatePayload>,
) -> Result<impl IntoResponse, AppError> {
    let idempotency_key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let view = app_state
        .shipment_service
        .transition_status(&user, &shipment_id, payload.action, idempotency_key, payload.notes)
        .await?;

    if let Err(e) = app_state
        .audit_repo
        .log_action(
            user.id,
            "confirm_status",
            Some(&shipment_id),
            json!({ "new_status": payload.action.as_str() }),
            user.tenant_id,
        )
        .await
    {
        tracing::warn!("Falha ao registrar confirm_status no log de ações: {}", e);
    }

    Ok(Json(view))
}

pub async fn get_shipment_changes(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(shipment_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let changes = app_state.shipment_service.get_change_log(&user, &shipment_id).await?;
    Ok(Json(changes))
}
