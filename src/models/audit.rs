// src/models/audit.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tipos de alteração registrados no change log de remessas.
/// Um registro por CAMPO alterado, não por requisição.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Supplier,
    Warehouse,
    RouteType,
    ShipmentType,
    Fulfillment,
    ShipmentDate,
    BagContents,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Supplier => "supplier",
            ChangeType::Warehouse => "warehouse",
            ChangeType::RouteType => "route_type",
            ChangeType::ShipmentType => "shipment_type",
            ChangeType::Fulfillment => "fulfillment",
            ChangeType::ShipmentDate => "shipment_date",
            ChangeType::BagContents => "bag_contents",
        }
    }
}

/// Uma alteração de campo computada em memória antes da persistência,
/// com os valores antigo e novo capturados antes da mutação.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub change_type: ChangeType,
    pub old_value: serde_json::Value,
    pub new_value: serde_json::Value,
}

/// Evento do histórico de status, já com o username do autor resolvido.
/// O autor pode ter sido removido do sistema; o evento permanece.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub id: i64,
    pub status: String,
    pub changed_by: Option<String>,
    pub changed_at: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Item do change log para leitura (auditoria de edições de metadados).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLogItem {
    pub id: i64,
    pub change_type: String,
    pub old_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
    pub changed_by: Option<String>,
    pub changed_at: DateTime<Utc>,
    pub notes: Option<String>,
}
