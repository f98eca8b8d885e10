// src/services/shipment_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AuditRepository, ShipmentRepository},
    models::audit::{ChangeLogItem, ChangeType, FieldChange},
    models::auth::User,
    models::shipment::{
        self, next_shipment_id, shipment_id_prefix, total_pieces, validate_bags,
        validate_transition, CreateShipmentPayload, Shipment, ShipmentListItem,
        ShipmentListQuery, ShipmentStatus, ShipmentView, UpdateShipmentPayload,
    },
    services::authz::{self, Capability, ReadScope},
    services::sheets::SheetsMirror,
};

// Tentativas de inserção quando duas criações disputam o mesmo número de
// sequência. A unicidade do id é garantida pela constraint; o laço só
// recalcula e tenta de novo.
const SEQUENCE_RETRIES: u32 = 3;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Clone)]
pub struct ShipmentService {
    repo: ShipmentRepository,
    audit_repo: AuditRepository,
    mirror: SheetsMirror,
    pool: PgPool,
}

impl ShipmentService {
    pub fn new(
        repo: ShipmentRepository,
        audit_repo: AuditRepository,
        mirror: SheetsMirror,
        pool: PgPool,
    ) -> Self {
        Self { repo, audit_repo, mirror, pool }
    }

    /// Cria a remessa com id sequencial por tenant (`SHIP-{t}-{0001}`),
    /// totais computados e o status no sentinela inicial `UNCONFIRMED`.
    /// Corridas na sequência voltam como violação de unicidade e são
    /// retentadas com o número recalculado.
    pub async fn create_shipment(
        &self,
        user: &User,
        payload: CreateShipmentPayload,
    ) -> Result<ShipmentView, AppError> {
        authz::require(user, Capability::CreateShipment)?;
        let tenant_id = user
            .tenant_id
            .ok_or_else(|| AppError::Forbidden(Capability::CreateShipment.slug().to_string()))?;

        validate_bags(&payload.bags)?;
        let pieces = total_pieces(&payload.bags);
        let prefix = shipment_id_prefix(tenant_id);

        let now = chrono::Utc::now();
        let mut shipment = Shipment {
            id: String::new(),
            supplier: payload.supplier,
            warehouse: payload.warehouse,
            route_type: payload.route_type,
            shipment_type: payload.shipment_type,
            fulfillment: payload.fulfillment,
            ship_date: payload.ship_date,
            current_status: ShipmentStatus::Unconfirmed,
            total_bags: payload.bags.len() as i32,
            total_pieces: pieces,
            bags: payload.bags,
            tenant_id,
            created_at: now,
            updated_at: now,
        };

        let mut attempt = 0;
        loop {
            let greatest = self.repo.greatest_id(tenant_id, &prefix).await?;
            shipment.id = next_shipment_id(tenant_id, greatest.as_deref());

            match self.repo.insert(&self.pool, &shipment).await {
                Ok(()) => break,
                Err(e) if e.is_unique_violation() => {
                    attempt += 1;
                    if attempt >= SEQUENCE_RETRIES {
                        // Esgotamos os retries: devolve como retryable
                        // para o cliente, nunca sobrescreve.
                        return Err(AppError::Conflict);
                    }
                    tracing::warn!(
                        "Colisão de sequência em {} (tentativa {}), recalculando.",
                        shipment.id,
                        attempt
                    );
                }
                Err(e) => return Err(e),
            }
        }

        // Relê a linha para devolver os timestamps canônicos do banco.
        let row = self
            .repo
            .find(&shipment.id, Some(tenant_id))
            .await?
            .ok_or(AppError::NotFound)?;
        let created = row.into_shipment()?;

        self.mirror.mirror_shipment(&created);

        Ok(ShipmentView { shipment: created, events: Vec::new() })
    }

    /// Lista remessas dentro do escopo de visibilidade do papel.
    /// Motorista e usuários sem escopo recebem lista vazia — nunca erro,
    /// nunca dados de outro tenant.
    pub async fn list_shipments(
        &self,
        user: &User,
        query: &ShipmentListQuery,
    ) -> Result<Vec<ShipmentListItem>, AppError> {
        let (tenant_filter, fulfillment_filter) = match authz::read_scope(user) {
            ReadScope::AllTenants => (None, None),
            ReadScope::Tenant(t) => (Some(t), None),
            ReadScope::TenantFulfillment { tenant_id, fulfillment } => {
                (Some(tenant_id), Some(fulfillment))
            }
            // Motorista nunca recebe lista navegável; ff sem centro e
            // usuário sem tenant não enxergam nada.
            ReadScope::DirectOnly(_) | ReadScope::Nothing => return Ok(Vec::new()),
        };

        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = query.offset.unwrap_or(0).max(0);

        let rows = self
            .repo
            .list(
                tenant_filter,
                fulfillment_filter.as_deref(),
                query.status.as_deref(),
                query.supplier.as_deref(),
                limit,
                offset,
            )
            .await?;

        rows.into_iter()
            .map(|row| row.into_shipment().map(ShipmentListItem::from))
            .collect()
    }

    /// Busca por id dentro do escopo do usuário. O filtro de tenant entra
    /// na própria consulta; o filtro de fulfillment do papel `ff` é um
    /// pós-check que devolve o MESMO NotFound de uma remessa inexistente.
    pub async fn get_shipment(&self, user: &User, shipment_id: &str) -> Result<ShipmentView, AppError> {
        let (tenant_filter, ff_check) = Self::scope_filters(user)?;

        let found = self
            .repo
            .find(shipment_id, tenant_filter)
            .await?
            .map(|row| row.into_shipment())
            .transpose()?;
        let shipment = visible_shipment(found, ff_check.as_deref())?;

        let events = self.audit_repo.status_history(&shipment.id).await?;
        Ok(ShipmentView { shipment, events })
    }

    /// Edição de metadados (somente supplier/admin). Para cada campo do
    /// patch que difere do valor persistido: aplica e grava UMA entrada de
    /// change log com os valores antigo e novo. Patch sem diferenças é
    /// no-op completo: nenhuma escrita, nenhum log.
    pub async fn update_shipment(
        &self,
        user: &User,
        shipment_id: &str,
        patch: UpdateShipmentPayload,
    ) -> Result<ShipmentView, AppError> {
        authz::require(user, Capability::EditShipment)?;
        let (tenant_filter, _) = Self::scope_filters(user)?;

        let mut tx = self.pool.begin().await?;

        let row = self
            .repo
            .find_for_update(&mut *tx, shipment_id, tenant_filter)
            .await?
            .ok_or(AppError::NotFound)?;
        let mut shipment = row.into_shipment()?;

        let changes = apply_patch(&mut shipment, &patch)?;
        if changes.is_empty() {
            // Nada mudou: não escreve, não loga.
            drop(tx);
            let events = self.audit_repo.status_history(&shipment.id).await?;
            return Ok(ShipmentView { shipment, events });
        }

        self.repo.apply_update(&mut *tx, &shipment).await?;
        for change in &changes {
            self.audit_repo
                .insert_change_log(
                    &mut *tx,
                    &shipment.id,
                    user.id,
                    change,
                    patch.notes.as_deref(),
                    Some(shipment.tenant_id),
                )
                .await?;
        }

        tx.commit().await?;

        self.mirror.mirror_shipment(&shipment);

        let events = self.audit_repo.status_history(&shipment.id).await?;
        Ok(ShipmentView { shipment, events })
    }

    /// Transição de status com idempotência.
    ///
    /// Dentro de UMA transação, com a linha da remessa travada:
    ///   1. chave de idempotência já vista → devolve o estado atual, sem
    ///      nova entrada e sem erro (retry seguro do cliente);
    ///   2. valida que o alvo é o único sucessor legal da cadeia;
    ///   3. autoriza o papel para ESTA etapa;
    ///   4. atualiza o status e insere o histórico atomicamente.
    /// Sem chave do cliente, sintetizamos uma nova a cada chamada — ou
    /// seja, chamadas sem chave nunca curto-circuitam e duplicatas caem
    /// na validação da cadeia.
    pub async fn transition_status(
        &self,
        user: &User,
        shipment_id: &str,
        action: ShipmentStatus,
        idempotency_key: Option<String>,
        notes: Option<String>,
    ) -> Result<ShipmentView, AppError> {
        let (tenant_filter, ff_check) = Self::scope_filters(user)?;

        let key = idempotency_key
            .filter(|k| !k.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut tx = self.pool.begin().await?;

        let found = self
            .repo
            .find_for_update(&mut *tx, shipment_id, tenant_filter)
            .await?
            .map(|row| row.into_shipment())
            .transpose()?;
        let shipment = visible_shipment(found, ff_check.as_deref())?;

        let key_already_seen = self
            .audit_repo
            .find_by_idempotency_key(&mut *tx, &key)
            .await?
            .is_some();

        match plan_transition(user, shipment.current_status, action, key_already_seen)? {
            TransitionPlan::Replay => {
                // Transição já aplicada num retry anterior: estado atual,
                // nenhuma entrada nova.
                drop(tx);
                let events = self.audit_repo.status_history(&shipment.id).await?;
                return Ok(ShipmentView { shipment, events });
            }
            TransitionPlan::Apply => {}
        }

        self.repo.set_status(&mut *tx, &shipment.id, action.as_str()).await?;
        if let Err(e) = self
            .audit_repo
            .insert_status_history(
                &mut *tx,
                &shipment.id,
                action.as_str(),
                user.id,
                notes.as_deref(),
                &key,
                Some(shipment.tenant_id),
            )
            .await
        {
            // Duas requisições em corrida com a mesma chave: a constraint
            // UNIQUE segura a segunda. Retryable, nunca duplica.
            return Err(if e.is_unique_violation() { AppError::Conflict } else { e });
        }

        tx.commit().await?;

        // Visão atualizada pós-commit, com o histórico completo.
        let row = self
            .repo
            .find(&shipment.id, tenant_filter)
            .await?
            .ok_or(AppError::NotFound)?;
        let refreshed = row.into_shipment()?;

        self.mirror.mirror_shipment(&refreshed);

        let events = self.audit_repo.status_history(&refreshed.id).await?;
        Ok(ShipmentView { shipment: refreshed, events })
    }

    /// Change log (auditoria de edições) de uma remessa visível ao usuário.
    pub async fn get_change_log(
        &self,
        user: &User,
        shipment_id: &str,
    ) -> Result<Vec<ChangeLogItem>, AppError> {
        // Reaproveita a busca escopada: garante a visibilidade antes de
        // expor a trilha.
        let view = self.get_shipment(user, shipment_id).await?;
        self.audit_repo.change_log(&view.shipment.id).await
    }

    /// Resolve o escopo de leitura em (filtro de tenant na consulta,
    /// pós-check de fulfillment). Quem não enxerga nada recebe NotFound —
    /// indistinguível de uma remessa inexistente.
    fn scope_filters(user: &User) -> Result<(Option<i64>, Option<String>), AppError> {
        match authz::read_scope(user) {
            ReadScope::AllTenants => Ok((None, None)),
            ReadScope::Tenant(t) | ReadScope::DirectOnly(t) => Ok((Some(t), None)),
            ReadScope::TenantFulfillment { tenant_id, fulfillment } => {
                Ok((Some(tenant_id), Some(fulfillment)))
            }
            ReadScope::Nothing => Err(AppError::NotFound),
        }
    }
}

/// Pós-filtro de visibilidade sobre o resultado da busca escopada.
/// Remessa ausente (inexistente OU de outro tenant, já cortada pelo filtro
/// da consulta) e remessa fora do centro do usuário `ff` produzem
/// exatamente o mesmo erro — a resposta nunca denuncia que a remessa
/// existe em outro lugar.
pub fn visible_shipment(
    found: Option<Shipment>,
    ff_check: Option<&str>,
) -> Result<Shipment, AppError> {
    let shipment = found.ok_or(AppError::NotFound)?;
    if let Some(name) = ff_check {
        if shipment.fulfillment.as_deref() != Some(name) {
            return Err(AppError::NotFound);
        }
    }
    Ok(shipment)
}

/// O que fazer com um pedido de transição, decidido com a linha já travada.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPlan {
    /// Chave de idempotência já vista: devolve o estado atual, sem nova
    /// entrada de histórico e sem erro.
    Replay,
    /// Aplica a transição e grava o histórico.
    Apply,
}

/// Decisão pura da transição, na ordem do fluxo:
///   1. chave já vista → replay (curto-circuita ANTES de validar a cadeia,
///      senão o retry do cliente viraria InvalidTransition);
///   2. o alvo é o único sucessor legal da cadeia;
///   3. o papel pode confirmar ESTA etapa.
pub fn plan_transition(
    user: &User,
    current: ShipmentStatus,
    action: ShipmentStatus,
    key_already_seen: bool,
) -> Result<TransitionPlan, AppError> {
    if key_already_seen {
        return Ok(TransitionPlan::Replay);
    }
    validate_transition(current, action)?;
    authz::require_confirm(user, action)?;
    Ok(TransitionPlan::Apply)
}

/// Aplica o patch campo a campo sobre o agregado, capturando o valor
/// antigo ANTES de cada mutação. Devolve uma `FieldChange` por campo que
/// realmente mudou; se os sacos mudaram, os totais são recomputados.
pub fn apply_patch(
    shipment: &mut Shipment,
    patch: &UpdateShipmentPayload,
) -> Result<Vec<FieldChange>, AppError> {
    let mut changes = Vec::new();

    if let Some(supplier) = &patch.supplier {
        if *supplier != shipment.supplier {
            changes.push(FieldChange {
                change_type: ChangeType::Supplier,
                old_value: serde_json::json!(shipment.supplier),
                new_value: serde_json::json!(supplier),
            });
            shipment.supplier = supplier.clone();
        }
    }

    if let Some(warehouse) = &patch.warehouse {
        if *warehouse != shipment.warehouse {
            changes.push(FieldChange {
                change_type: ChangeType::Warehouse,
                old_value: serde_json::json!(shipment.warehouse),
                new_value: serde_json::json!(warehouse),
            });
            shipment.warehouse = warehouse.clone();
        }
    }

    if let Some(route_type) = patch.route_type {
        if route_type != shipment.route_type {
            changes.push(FieldChange {
                change_type: ChangeType::RouteType,
                old_value: serde_json::json!(shipment.route_type.as_str()),
                new_value: serde_json::json!(route_type.as_str()),
            });
            shipment.route_type = route_type;
        }
    }

    if let Some(shipment_type) = &patch.shipment_type {
        if Some(shipment_type) != shipment.shipment_type.as_ref() {
            changes.push(FieldChange {
                change_type: ChangeType::ShipmentType,
                old_value: serde_json::json!(shipment.shipment_type),
                new_value: serde_json::json!(shipment_type),
            });
            shipment.shipment_type = Some(shipment_type.clone());
        }
    }

    if let Some(fulfillment) = &patch.fulfillment {
        if Some(fulfillment) != shipment.fulfillment.as_ref() {
            changes.push(FieldChange {
                change_type: ChangeType::Fulfillment,
                old_value: serde_json::json!(shipment.fulfillment),
                new_value: serde_json::json!(fulfillment),
            });
            shipment.fulfillment = Some(fulfillment.clone());
        }
    }

    if let Some(ship_date) = patch.ship_date {
        if Some(ship_date) != shipment.ship_date {
            changes.push(FieldChange {
                change_type: ChangeType::ShipmentDate,
                old_value: serde_json::json!(shipment.ship_date),
                new_value: serde_json::json!(ship_date),
            });
            shipment.ship_date = Some(ship_date);
        }
    }

    if let Some(bags) = &patch.bags {
        shipment::validate_bags(bags)?;
        if *bags != shipment.bags {
            changes.push(FieldChange {
                change_type: ChangeType::BagContents,
                old_value: serde_json::to_value(&shipment.bags).map_err(anyhow::Error::from)?,
                new_value: serde_json::to_value(bags).map_err(anyhow::Error::from)?,
            });
            shipment.bags = bags.clone();
            // Invariante: os totais sempre derivam do conteúdo atual.
            shipment.total_bags = bags.len() as i32;
            shipment.total_pieces = total_pieces(bags);
        }
    }

    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Role;
    use crate::models::shipment::{Bag, BagItem, RouteType};
    use std::collections::BTreeMap;

    fn user(role: Role, tenant_id: Option<i64>) -> User {
        User {
            id: 9,
            username: "teste".to_string(),
            password_hash: "$2b$fake".to_string(),
            role,
            tenant_id,
            tenant_name: tenant_id.map(|_| "Tenant".to_string()),
            fulfillment_id: None,
            fulfillment_name: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn bag(id: &str, qty: i64) -> Bag {
        let mut sizes = BTreeMap::new();
        sizes.insert("M".to_string(), qty);
        Bag {
            bag_id: id.to_string(),
            items: vec![BagItem {
                model: "camisa".to_string(),
                color: "preta".to_string(),
                sizes,
            }],
        }
    }

    fn sample_shipment() -> Shipment {
        let bags = vec![bag("BAG-1", 10), bag("BAG-2", 20)];
        let now = chrono::Utc::now();
        Shipment {
            id: "SHIP-1-0001".to_string(),
            supplier: "Fornecedor A".to_string(),
            warehouse: "Kazan".to_string(),
            route_type: RouteType::ViaFf,
            shipment_type: None,
            fulfillment: Some("FF Moscou".to_string()),
            ship_date: None,
            current_status: ShipmentStatus::Unconfirmed,
            total_bags: 2,
            total_pieces: 30,
            bags,
            tenant_id: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn patch_vazio_e_noop_sem_nenhuma_mudanca() {
        let mut shipment = sample_shipment();
        let before = shipment.clone();
        let changes = apply_patch(&mut shipment, &UpdateShipmentPayload::default()).unwrap();
        assert!(changes.is_empty());
        assert_eq!(shipment.supplier, before.supplier);
        assert_eq!(shipment.total_pieces, before.total_pieces);
    }

    #[test]
    fn patch_com_valores_identicos_nao_gera_log() {
        let mut shipment = sample_shipment();
        let patch = UpdateShipmentPayload {
            supplier: Some("Fornecedor A".to_string()),
            warehouse: Some("Kazan".to_string()),
            route_type: Some(RouteType::ViaFf),
            ..Default::default()
        };
        let changes = apply_patch(&mut shipment, &patch).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn uma_entrada_de_log_por_campo_alterado() {
        let mut shipment = sample_shipment();
        let patch = UpdateShipmentPayload {
            supplier: Some("Fornecedor B".to_string()),
            warehouse: Some("Moscou".to_string()),
            route_type: Some(RouteType::Direct),
            ..Default::default()
        };
        let changes = apply_patch(&mut shipment, &patch).unwrap();
        assert_eq!(changes.len(), 3);

        let supplier_change = changes
            .iter()
            .find(|c| c.change_type == ChangeType::Supplier)
            .unwrap();
        assert_eq!(supplier_change.old_value, serde_json::json!("Fornecedor A"));
        assert_eq!(supplier_change.new_value, serde_json::json!("Fornecedor B"));

        assert_eq!(shipment.supplier, "Fornecedor B");
        assert_eq!(shipment.route_type, RouteType::Direct);
    }

    #[test]
    fn mudanca_de_sacos_recomputa_os_totais() {
        let mut shipment = sample_shipment();
        let new_bags = vec![bag("BAG-1", 5), bag("BAG-2", 5), bag("BAG-3", 5)];
        let patch = UpdateShipmentPayload { bags: Some(new_bags), ..Default::default() };

        let changes = apply_patch(&mut shipment, &patch).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type, ChangeType::BagContents);
        assert_eq!(shipment.total_bags, 3);
        assert_eq!(shipment.total_pieces, 15);
        // Invariante do agregado após a edição.
        assert_eq!(shipment.total_pieces, total_pieces(&shipment.bags));
    }

    #[test]
    fn sacos_invalidos_no_patch_sao_rejeitados_antes_de_mutar() {
        let mut shipment = sample_shipment();
        let before = shipment.clone();
        let patch = UpdateShipmentPayload {
            bags: Some(vec![bag("BAG-1", -2)]),
            ..Default::default()
        };
        assert!(apply_patch(&mut shipment, &patch).is_err());
        assert_eq!(shipment.bags, before.bags);
        assert_eq!(shipment.total_pieces, before.total_pieces);
    }

    #[test]
    fn mesma_chave_duas_vezes_aplica_uma_unica_transicao() {
        let supplier = user(Role::Supplier, Some(1));

        // Primeira chamada: chave nunca vista, aplica e grava histórico.
        let first = plan_transition(
            &supplier,
            ShipmentStatus::Unconfirmed,
            ShipmentStatus::SentFromFactory,
            false,
        )
        .unwrap();
        assert_eq!(first, TransitionPlan::Apply);

        // Retry do cliente com a MESMA chave: o status já avançou e a chave
        // já está no histórico. Devolve o estado atual sem nova entrada —
        // nunca InvalidTransition, nunca segunda gravação.
        let retry = plan_transition(
            &supplier,
            ShipmentStatus::SentFromFactory,
            ShipmentStatus::SentFromFactory,
            true,
        )
        .unwrap();
        assert_eq!(retry, TransitionPlan::Replay);
    }

    #[test]
    fn chave_ja_vista_curto_circuita_antes_da_cadeia_e_do_papel() {
        // Mesmo um pedido que seria ilegal (salto na cadeia, papel errado)
        // vira replay quando a chave já foi aplicada.
        let driver = user(Role::Driver, Some(1));
        let plan = plan_transition(
            &driver,
            ShipmentStatus::Unconfirmed,
            ShipmentStatus::Delivered,
            true,
        )
        .unwrap();
        assert_eq!(plan, TransitionPlan::Replay);
    }

    #[test]
    fn retry_sem_chave_cai_na_validacao_da_cadeia() {
        // Sem chave do cliente o serviço sintetiza uma nova por chamada, ou
        // seja, a segunda confirmação chega aqui com `key_already_seen`
        // falso e o duplicado é rejeitado pela cadeia.
        let supplier = user(Role::Supplier, Some(1));
        let result = plan_transition(
            &supplier,
            ShipmentStatus::SentFromFactory,
            ShipmentStatus::SentFromFactory,
            false,
        );
        assert!(matches!(result, Err(AppError::InvalidTransition { .. })));
    }

    #[test]
    fn etapa_legal_na_cadeia_mas_de_outro_papel_e_forbidden() {
        let supplier = user(Role::Supplier, Some(1));
        let result = plan_transition(
            &supplier,
            ShipmentStatus::SentFromFactory,
            ShipmentStatus::ShippedFromFf,
            false,
        );
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn remessa_de_outro_tenant_e_inexistente_produzem_o_mesmo_erro() {
        // A consulta escopada corta remessas de outro tenant, então as duas
        // situações chegam aqui como `None` — e o pós-filtro do `ff` tem
        // que colapsar no MESMO erro, nunca num 403 que denuncie que a
        // remessa existe.
        let absent = visible_shipment(None, None);
        assert!(matches!(absent, Err(AppError::NotFound)));

        let other_center = visible_shipment(Some(sample_shipment()), Some("FF Kazan"));
        assert!(matches!(other_center, Err(AppError::NotFound)));
    }

    #[test]
    fn ff_do_centro_atribuido_enxerga_a_remessa() {
        let shipment = visible_shipment(Some(sample_shipment()), Some("FF Moscou")).unwrap();
        assert_eq!(shipment.id, "SHIP-1-0001");
        // Sem pós-filtro (papéis não-ff) a remessa também passa.
        assert!(visible_shipment(Some(sample_shipment()), None).is_ok());
    }

    #[test]
    fn data_de_embarque_gera_entrada_propria() {
        let mut shipment = sample_shipment();
        let date = chrono::NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let patch = UpdateShipmentPayload { ship_date: Some(date), ..Default::default() };
        let changes = apply_patch(&mut shipment, &patch).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type, ChangeType::ShipmentDate);
        assert_eq!(changes[0].old_value, serde_json::Value::Null);
        assert_eq!(shipment.ship_date, Some(date));
    }
}
