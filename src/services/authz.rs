// src/services/authz.rs
//
// Autorização por papel: a matriz de capacidades é uma tabela explícita e
// exaustiva (match sobre enums fechados), nunca condicionais espalhados.
// Três perguntas distintas são respondidas aqui:
//   1. O papel pode executar a capacidade? (role_allows)
//   2. Que fatia das remessas o usuário enxerga? (read_scope)
//   3. O papel pode confirmar ESTA etapa de status? (can_confirm)

use crate::common::error::AppError;
use crate::models::auth::{Role, User};
use crate::models::shipment::ShipmentStatus;

/// Capacidades tenant-scoped do sistema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ReadShipments,
    CreateShipment,
    EditShipment,
    ManageUsers,
    ListTenants,
    CreateTenant,
    ManageCatalog,
}

impl Capability {
    pub fn slug(&self) -> &'static str {
        match self {
            Capability::ReadShipments => "shipments:read",
            Capability::CreateShipment => "shipments:create",
            Capability::EditShipment => "shipments:edit",
            Capability::ManageUsers => "users:manage",
            Capability::ListTenants => "tenants:list",
            Capability::CreateTenant => "tenants:create",
            Capability::ManageCatalog => "catalog:manage",
        }
    }
}

/// A matriz papel × capacidade. Tabela fechada: adicionar um papel novo
/// obriga o compilador a passar por aqui.
pub fn role_allows(role: Role, cap: Capability) -> bool {
    use Capability::*;
    match role {
        Role::Admin => true,
        Role::Owner => matches!(
            cap,
            ReadShipments | CreateShipment | ManageUsers | ListTenants | ManageCatalog
        ),
        Role::Supplier => matches!(cap, ReadShipments | CreateShipment | EditShipment),
        Role::Ff => matches!(cap, ReadShipments),
        Role::Driver => matches!(cap, ReadShipments),
    }
}

/// Exige a capacidade, senão `Forbidden` com o slug negado.
/// Usuário sem tenant não tem NENHUMA capacidade tenant-scoped
/// (a exceção é o admin, que é global).
pub fn require(user: &User, cap: Capability) -> Result<(), AppError> {
    if user.role != Role::Admin && user.tenant_id.is_none() {
        return Err(AppError::Forbidden(cap.slug().to_string()));
    }
    if role_allows(user.role, cap) {
        Ok(())
    } else {
        Err(AppError::Forbidden(cap.slug().to_string()))
    }
}

/// A fatia de remessas visível para um usuário.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadScope {
    /// Admin: todos os tenants.
    AllTenants,
    /// Papéis comuns: só o próprio tenant.
    Tenant(i64),
    /// Usuário `ff`: próprio tenant E fulfillment igual ao centro atribuído.
    TenantFulfillment { tenant_id: i64, fulfillment: String },
    /// Motorista: nunca lista, só busca direta por id dentro do tenant
    /// (o fluxo real é via QR code).
    DirectOnly(i64),
    /// Sem tenant, ou `ff` sem centro atribuído: não enxerga nada.
    Nothing,
}

pub fn read_scope(user: &User) -> ReadScope {
    if user.role == Role::Admin {
        return ReadScope::AllTenants;
    }
    let Some(tenant_id) = user.tenant_id else {
        return ReadScope::Nothing;
    };
    match user.role {
        Role::Admin => ReadScope::AllTenants,
        Role::Owner | Role::Supplier => ReadScope::Tenant(tenant_id),
        Role::Ff => match &user.fulfillment_name {
            Some(name) => ReadScope::TenantFulfillment {
                tenant_id,
                fulfillment: name.clone(),
            },
            None => ReadScope::Nothing,
        },
        Role::Driver => ReadScope::DirectOnly(tenant_id),
    }
}

/// Permissão de transição por STATUS ALVO (não por "pode editar").
/// Cada etapa da cadeia pertence a um papel específico, mais o admin.
pub fn can_confirm(role: Role, target: ShipmentStatus) -> bool {
    match target {
        // O sentinela inicial nunca é alvo de confirmação.
        ShipmentStatus::Unconfirmed => false,
        ShipmentStatus::SentFromFactory => matches!(role, Role::Supplier | Role::Admin),
        ShipmentStatus::ShippedFromFf => matches!(role, Role::Ff | Role::Admin),
        ShipmentStatus::Delivered => matches!(role, Role::Driver | Role::Admin),
    }
}

pub fn require_confirm(user: &User, target: ShipmentStatus) -> Result<(), AppError> {
    if can_confirm(user.role, target) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "o papel '{}' não pode confirmar '{}'",
            user.role,
            target.as_str()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(role: Role, tenant_id: Option<i64>, fulfillment: Option<&str>) -> User {
        User {
            id: 7,
            username: "teste".to_string(),
            password_hash: "$2b$fake".to_string(),
            role,
            tenant_id,
            tenant_name: tenant_id.map(|_| "Tenant".to_string()),
            fulfillment_id: fulfillment.map(|_| 1),
            fulfillment_name: fulfillment.map(|s| s.to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn matriz_de_capacidades_por_papel() {
        use Capability::*;
        // (papel, capacidade, esperado) — espelha a tabela de autorização.
        let table = [
            (Role::Admin, ReadShipments, true),
            (Role::Admin, CreateShipment, true),
            (Role::Admin, EditShipment, true),
            (Role::Admin, ManageUsers, true),
            (Role::Admin, ListTenants, true),
            (Role::Admin, CreateTenant, true),
            (Role::Owner, ReadShipments, true),
            (Role::Owner, CreateShipment, true),
            (Role::Owner, EditShipment, false),
            (Role::Owner, ManageUsers, true),
            (Role::Owner, ListTenants, true),
            (Role::Owner, CreateTenant, false),
            (Role::Supplier, ReadShipments, true),
            (Role::Supplier, CreateShipment, true),
            (Role::Supplier, EditShipment, true),
            (Role::Supplier, ManageUsers, false),
            (Role::Supplier, ListTenants, false),
            (Role::Ff, ReadShipments, true),
            (Role::Ff, CreateShipment, false),
            (Role::Ff, EditShipment, false),
            (Role::Ff, ManageUsers, false),
            (Role::Driver, ReadShipments, true),
            (Role::Driver, CreateShipment, false),
            (Role::Driver, EditShipment, false),
            (Role::Driver, ManageUsers, false),
            (Role::Driver, ListTenants, false),
        ];
        for (role, cap, expected) in table {
            assert_eq!(
                role_allows(role, cap),
                expected,
                "papel {role} x capacidade {:?}",
                cap
            );
        }
    }

    #[test]
    fn usuario_sem_tenant_nao_tem_capacidade_tenant_scoped() {
        let u = user(Role::Supplier, None, None);
        assert!(matches!(
            require(&u, Capability::ReadShipments),
            Err(AppError::Forbidden(_))
        ));
        // Admin é global e passa mesmo sem tenant.
        let a = user(Role::Admin, None, None);
        assert!(require(&a, Capability::ReadShipments).is_ok());
    }

    #[test]
    fn escopo_de_leitura_por_papel() {
        assert_eq!(read_scope(&user(Role::Admin, Some(1), None)), ReadScope::AllTenants);
        assert_eq!(read_scope(&user(Role::Owner, Some(3), None)), ReadScope::Tenant(3));
        assert_eq!(read_scope(&user(Role::Supplier, Some(3), None)), ReadScope::Tenant(3));
        assert_eq!(
            read_scope(&user(Role::Ff, Some(3), Some("FF Moscou"))),
            ReadScope::TenantFulfillment {
                tenant_id: 3,
                fulfillment: "FF Moscou".to_string()
            }
        );
        assert_eq!(read_scope(&user(Role::Driver, Some(3), None)), ReadScope::DirectOnly(3));
    }

    #[test]
    fn ff_sem_centro_atribuido_nao_enxerga_nada() {
        assert_eq!(read_scope(&user(Role::Ff, Some(3), None)), ReadScope::Nothing);
    }

    #[test]
    fn usuario_sem_tenant_nao_enxerga_nada() {
        for role in [Role::Owner, Role::Supplier, Role::Ff, Role::Driver] {
            assert_eq!(read_scope(&user(role, None, None)), ReadScope::Nothing);
        }
    }

    #[test]
    fn permissao_de_transicao_por_status_alvo() {
        use ShipmentStatus::*;
        let table = [
            (SentFromFactory, vec![Role::Supplier, Role::Admin]),
            (ShippedFromFf, vec![Role::Ff, Role::Admin]),
            (Delivered, vec![Role::Driver, Role::Admin]),
        ];
        for (status, allowed) in table {
            for role in Role::ALL {
                assert_eq!(
                    can_confirm(role, status),
                    allowed.contains(&role),
                    "papel {role} x status {status}"
                );
            }
        }
        // Ninguém "confirma" o sentinela inicial.
        for role in Role::ALL {
            assert!(!can_confirm(role, Unconfirmed));
        }
    }

    #[test]
    fn fornecedor_nao_confirma_etapa_do_ff_mesmo_sendo_a_proxima_da_cadeia() {
        let u = user(Role::Supplier, Some(1), None);
        assert!(require_confirm(&u, ShipmentStatus::SentFromFactory).is_ok());
        assert!(matches!(
            require_confirm(&u, ShipmentStatus::ShippedFromFf),
            Err(AppError::Forbidden(_))
        ));
    }
}
