// src/models/shipment.rs

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::common::error::AppError;
use crate::models::audit::StatusEvent;

/// Tipo de rota da remessa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteType {
    #[serde(rename = "DIRECT")]
    Direct,
    #[serde(rename = "VIA_FF")]
    ViaFf,
}

impl RouteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteType::Direct => "DIRECT",
            RouteType::ViaFf => "VIA_FF",
        }
    }

    pub fn parse(s: &str) -> Option<RouteType> {
        match s {
            "DIRECT" => Some(RouteType::Direct),
            "VIA_FF" => Some(RouteType::ViaFf),
            _ => None,
        }
    }
}

/// Status de uma remessa: cadeia linear estrita, sem saltos e sem retorno.
///
/// `Unconfirmed` é o sentinela inicial explícito — nunca usamos status
/// nulo/ausente para representar "remessa recém-criada".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShipmentStatus {
    #[serde(rename = "UNCONFIRMED")]
    Unconfirmed,
    #[serde(rename = "SENT_FROM_FACTORY")]
    SentFromFactory,
    #[serde(rename = "SHIPPED_FROM_FF")]
    ShippedFromFf,
    #[serde(rename = "DELIVERED")]
    Delivered,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Unconfirmed => "UNCONFIRMED",
            ShipmentStatus::SentFromFactory => "SENT_FROM_FACTORY",
            ShipmentStatus::ShippedFromFf => "SHIPPED_FROM_FF",
            ShipmentStatus::Delivered => "DELIVERED",
        }
    }

    pub fn parse(s: &str) -> Option<ShipmentStatus> {
        match s {
            "UNCONFIRMED" => Some(ShipmentStatus::Unconfirmed),
            "SENT_FROM_FACTORY" => Some(ShipmentStatus::SentFromFactory),
            "SHIPPED_FROM_FF" => Some(ShipmentStatus::ShippedFromFf),
            "DELIVERED" => Some(ShipmentStatus::Delivered),
            _ => None,
        }
    }

    /// O único sucessor legal deste status. `None` no estado terminal.
    pub fn successor(&self) -> Option<ShipmentStatus> {
        match self {
            ShipmentStatus::Unconfirmed => Some(ShipmentStatus::SentFromFactory),
            ShipmentStatus::SentFromFactory => Some(ShipmentStatus::ShippedFromFf),
            ShipmentStatus::ShippedFromFf => Some(ShipmentStatus::Delivered),
            ShipmentStatus::Delivered => None,
        }
    }

    pub const ALL: [ShipmentStatus; 4] = [
        ShipmentStatus::Unconfirmed,
        ShipmentStatus::SentFromFactory,
        ShipmentStatus::ShippedFromFf,
        ShipmentStatus::Delivered,
    ];
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Valida que `new` é o único sucessor legal de `current`.
/// Qualquer outro par (salto, retorno, estado terminal) é rejeitado.
pub fn validate_transition(
    current: ShipmentStatus,
    new: ShipmentStatus,
) -> Result<(), AppError> {
    if current.successor() == Some(new) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition {
            from: current.as_str().to_string(),
            to: new.as_str().to_string(),
        })
    }
}

// ---
// Sacos e itens (conteúdo da remessa, persistido como JSONB)
// ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BagItem {
    pub model: String,
    pub color: String,
    // Mapa tamanho -> quantidade. i64 para podermos rejeitar negativos
    // com erro de validação em vez de erro de desserialização.
    pub sizes: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bag {
    pub bag_id: String,
    pub items: Vec<BagItem>,
}

/// Validação estrutural dos sacos, feita ANTES de qualquer persistência:
/// bag_id não vazio e único dentro da remessa, quantidades não negativas.
pub fn validate_bags(bags: &[Bag]) -> Result<(), AppError> {
    let mut seen = HashSet::new();
    for bag in bags {
        if bag.bag_id.trim().is_empty() {
            return Err(AppError::InvalidPayload(
                "Todo saco precisa de um bag_id não vazio.".to_string(),
            ));
        }
        if !seen.insert(bag.bag_id.as_str()) {
            return Err(AppError::InvalidPayload(format!(
                "bag_id duplicado na remessa: '{}'.",
                bag.bag_id
            )));
        }
        for item in &bag.items {
            for (size, qty) in &item.sizes {
                if *qty < 0 {
                    return Err(AppError::InvalidPayload(format!(
                        "Quantidade negativa no saco '{}', tamanho '{}'.",
                        bag.bag_id, size
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Soma de todas as quantidades de todos os itens de todos os sacos.
pub fn total_pieces(bags: &[Bag]) -> i64 {
    bags.iter()
        .flat_map(|bag| bag.items.iter())
        .flat_map(|item| item.sizes.values())
        .sum()
}

// ---
// Sequência de identificadores legíveis: SHIP-{tenant_id}-{contador:04}
// ---

pub fn format_shipment_id(tenant_id: i64, seq: u32) -> String {
    format!("SHIP-{}-{:04}", tenant_id, seq)
}

/// Prefixo de busca dos ids de um tenant (para o LIKE do repositório).
pub fn shipment_id_prefix(tenant_id: i64) -> String {
    format!("SHIP-{}-", tenant_id)
}

/// Extrai o contador de 4 dígitos do final de um id deste tenant.
pub fn parse_sequence(id: &str, tenant_id: i64) -> Option<u32> {
    let rest = id.strip_prefix(&shipment_id_prefix(tenant_id))?;
    rest.parse::<u32>().ok()
}

/// Próximo id da sequência do tenant, a partir do maior id já existente.
/// Sem id anterior (ou id ilegível), a sequência começa em 1.
pub fn next_shipment_id(tenant_id: i64, greatest: Option<&str>) -> String {
    let next = greatest
        .and_then(|id| parse_sequence(id, tenant_id))
        .map(|seq| seq + 1)
        .unwrap_or(1);
    format_shipment_id(tenant_id, next)
}

// ---
// A remessa em si
// ---

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub id: String,
    pub supplier: String,
    pub warehouse: String,
    pub route_type: RouteType,
    pub shipment_type: Option<String>,
    pub fulfillment: Option<String>,
    pub ship_date: Option<NaiveDate>,
    pub current_status: ShipmentStatus,
    pub bags: Vec<Bag>,
    pub total_bags: i32,
    pub total_pieces: i64,
    pub tenant_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Linha crua do banco; sacos chegam como JSONB e os enums como texto.
#[derive(Debug, sqlx::FromRow)]
pub struct ShipmentRow {
    pub id: String,
    pub supplier: String,
    pub warehouse: String,
    pub route_type: String,
    pub shipment_type: Option<String>,
    pub fulfillment: Option<String>,
    pub ship_date: Option<NaiveDate>,
    pub current_status: String,
    pub bags: serde_json::Value,
    pub total_bags: i32,
    pub total_pieces: i64,
    pub tenant_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShipmentRow {
    pub fn into_shipment(self) -> Result<Shipment, AppError> {
        let route_type = RouteType::parse(&self.route_type)
            .ok_or_else(|| anyhow::anyhow!("route_type desconhecido no banco: '{}'", self.route_type))?;
        let current_status = ShipmentStatus::parse(&self.current_status).ok_or_else(|| {
            anyhow::anyhow!("current_status desconhecido no banco: '{}'", self.current_status)
        })?;
        let bags: Vec<Bag> = serde_json::from_value(self.bags)
            .map_err(|e| anyhow::anyhow!("bags ilegível no banco: {}", e))?;
        Ok(Shipment {
            id: self.id,
            supplier: self.supplier,
            warehouse: self.warehouse,
            route_type,
            shipment_type: self.shipment_type,
            fulfillment: self.fulfillment,
            ship_date: self.ship_date,
            current_status,
            bags,
            total_bags: self.total_bags,
            total_pieces: self.total_pieces,
            tenant_id: self.tenant_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

// ---
// Payloads e views da API
// ---

#[derive(Debug, Deserialize, Validate)]
pub struct CreateShipmentPayload {
    #[validate(length(min = 1, message = "O fornecedor é obrigatório."))]
    pub supplier: String,
    #[validate(length(min = 1, message = "O armazém é obrigatório."))]
    pub warehouse: String,
    pub route_type: RouteType,
    pub shipment_type: Option<String>,
    pub fulfillment: Option<String>,
    pub ship_date: Option<NaiveDate>,
    pub bags: Vec<Bag>,
}

// Patch de edição: campo ausente = não alterar.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateShipmentPayload {
    pub supplier: Option<String>,
    pub warehouse: Option<String>,
    pub route_type: Option<RouteType>,
    pub shipment_type: Option<String>,
    pub fulfillment: Option<String>,
    pub ship_date: Option<NaiveDate>,
    pub bags: Option<Vec<Bag>>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdatePayload {
    pub action: ShipmentStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ShipmentListQuery {
    pub status: Option<String>,
    pub supplier: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Remessa completa mais o histórico de status (mais recente primeiro).
#[derive(Debug, Serialize)]
pub struct ShipmentView {
    pub shipment: Shipment,
    pub events: Vec<StatusEvent>,
}

/// Item resumido para listagens.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentListItem {
    pub id: String,
    pub supplier: String,
    pub warehouse: String,
    pub current_status: ShipmentStatus,
    pub total_bags: i32,
    pub total_pieces: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Shipment> for ShipmentListItem {
    fn from(s: Shipment) -> Self {
        Self {
            id: s.id,
            supplier: s.supplier,
            warehouse: s.warehouse,
            current_status: s.current_status,
            total_bags: s.total_bags,
            total_pieces: s.total_pieces,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(id: &str, sizes: &[(&str, i64)]) -> Bag {
        Bag {
            bag_id: id.to_string(),
            items: vec![BagItem {
                model: "camisa".to_string(),
                color: "azul".to_string(),
                sizes: sizes.iter().map(|(s, q)| (s.to_string(), *q)).collect(),
            }],
        }
    }

    #[test]
    fn total_pieces_soma_todos_os_tamanhos_de_todos_os_sacos() {
        let bags = vec![
            bag("BAG-1", &[("S", 10), ("M", 20)]),
            bag("BAG-2", &[("L", 15), ("XL", 5)]),
        ];
        assert_eq!(total_pieces(&bags), 50);
        assert_eq!(total_pieces(&[]), 0);
    }

    #[test]
    fn validate_bags_rejeita_bag_id_duplicado() {
        let bags = vec![bag("BAG-1", &[("S", 1)]), bag("BAG-1", &[("M", 2)])];
        let err = validate_bags(&bags).unwrap_err();
        assert!(matches!(err, AppError::InvalidPayload(_)));
    }

    #[test]
    fn validate_bags_rejeita_quantidade_negativa() {
        let bags = vec![bag("BAG-1", &[("S", -1)])];
        assert!(validate_bags(&bags).is_err());
    }

    #[test]
    fn validate_bags_rejeita_bag_id_vazio() {
        let bags = vec![bag("  ", &[("S", 1)])];
        assert!(validate_bags(&bags).is_err());
    }

    #[test]
    fn validate_bags_aceita_payload_bem_formado() {
        let bags = vec![bag("BAG-1", &[("S", 0), ("M", 3)]), bag("BAG-2", &[])];
        assert!(validate_bags(&bags).is_ok());
    }

    #[test]
    fn sequencia_comeca_em_0001_sem_id_anterior() {
        assert_eq!(next_shipment_id(1, None), "SHIP-1-0001");
    }

    #[test]
    fn sequencia_incrementa_o_maior_id_existente() {
        assert_eq!(next_shipment_id(1, Some("SHIP-1-0001")), "SHIP-1-0002");
        assert_eq!(next_shipment_id(2, Some("SHIP-2-0041")), "SHIP-2-0042");
        // Ao estourar os 4 dígitos o contador segue crescendo (monotônico,
        // ainda que o zero-padding deixe de alinhar).
        assert_eq!(next_shipment_id(1, Some("SHIP-1-9999")), "SHIP-1-10000");
    }

    #[test]
    fn sequencia_continua_alem_do_estouro_do_padding() {
        // Depois do estouro dos 4 dígitos a sequência segue crescendo a
        // partir do maior id real, sem recair nos números já usados.
        assert_eq!(next_shipment_id(1, Some("SHIP-1-10000")), "SHIP-1-10001");
        assert_eq!(next_shipment_id(1, Some("SHIP-1-10041")), "SHIP-1-10042");
    }

    #[test]
    fn maior_id_ordena_por_comprimento_antes_da_ordem_lexicografica() {
        // A regra de ordenação da consulta do repositório (length DESC,
        // id DESC): lexicograficamente "SHIP-1-9999" venceria
        // "SHIP-1-10000" e a sequência travaria recomputando 10000 para
        // sempre. Com o comprimento na frente, o maior id numérico vence.
        let ids = ["SHIP-1-0007", "SHIP-1-9999", "SHIP-1-10000"];
        let greatest = ids
            .iter()
            .copied()
            .max_by_key(|id| (id.len(), *id))
            .unwrap();
        assert_eq!(greatest, "SHIP-1-10000");
        assert_eq!(next_shipment_id(1, Some(greatest)), "SHIP-1-10001");

        // A ordenação puramente lexicográfica escolheria o id errado.
        assert_eq!(ids.iter().max().unwrap(), &"SHIP-1-9999");
    }

    #[test]
    fn sequencia_ignora_id_ilegivel() {
        assert_eq!(next_shipment_id(1, Some("SHIP-1-abc")), "SHIP-1-0001");
        assert_eq!(next_shipment_id(1, Some("OUTRO-1-0009")), "SHIP-1-0001");
    }

    #[test]
    fn parse_sequence_exige_o_prefixo_do_tenant() {
        assert_eq!(parse_sequence("SHIP-1-0007", 1), Some(7));
        assert_eq!(parse_sequence("SHIP-1-0007", 2), None);
        assert_eq!(parse_sequence("SHIP-12-0007", 1), None);
    }

    #[test]
    fn transicoes_validas_seguem_a_cadeia_linear() {
        use ShipmentStatus::*;
        assert!(validate_transition(Unconfirmed, SentFromFactory).is_ok());
        assert!(validate_transition(SentFromFactory, ShippedFromFf).is_ok());
        assert!(validate_transition(ShippedFromFf, Delivered).is_ok());
    }

    #[test]
    fn qualquer_par_fora_da_cadeia_falha_com_invalid_transition() {
        // Totalidade: percorre todos os pares (atual, tentado) e garante que
        // só os três passos legais da cadeia são aceitos.
        for current in ShipmentStatus::ALL {
            for attempted in ShipmentStatus::ALL {
                let result = validate_transition(current, attempted);
                if current.successor() == Some(attempted) {
                    assert!(result.is_ok(), "{current} -> {attempted} deveria ser legal");
                } else {
                    assert!(
                        matches!(result, Err(AppError::InvalidTransition { .. })),
                        "{current} -> {attempted} deveria ser rejeitado"
                    );
                }
            }
        }
    }

    #[test]
    fn delivered_e_terminal() {
        assert_eq!(ShipmentStatus::Delivered.successor(), None);
        for attempted in ShipmentStatus::ALL {
            assert!(validate_transition(ShipmentStatus::Delivered, attempted).is_err());
        }
    }

    #[test]
    fn status_serializa_com_os_valores_de_fio() {
        let json = serde_json::to_string(&ShipmentStatus::SentFromFactory).unwrap();
        assert_eq!(json, "\"SENT_FROM_FACTORY\"");
        let parsed: ShipmentStatus = serde_json::from_str("\"UNCONFIRMED\"").unwrap();
        assert_eq!(parsed, ShipmentStatus::Unconfirmed);
    }
}
