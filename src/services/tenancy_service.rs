// src/services/tenancy_service.rs

use bcrypt::hash;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{CatalogRepository, TenantRepository, UserRepository},
    models::auth::{Role, User},
    models::tenancy::{CreateUserPayload, Tenant, UserListItem},
    services::authz::{self, Capability},
};

/// Ação resultante de um pedido de remoção de usuário.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalAction {
    /// Owner: anula a referência de tenant; o registro do usuário fica.
    Detach,
    /// Admin de plataforma: apaga o usuário de vez.
    HardDelete,
}

#[derive(Clone)]
pub struct TenancyService {
    tenant_repo: TenantRepository,
    user_repo: UserRepository,
    catalog_repo: CatalogRepository,
    pool: PgPool,
}

impl TenancyService {
    pub fn new(
        tenant_repo: TenantRepository,
        user_repo: UserRepository,
        catalog_repo: CatalogRepository,
        pool: PgPool,
    ) -> Self {
        Self { tenant_repo, user_repo, catalog_repo, pool }
    }

    // ---
    // Tenants
    // ---

    /// Cria um tenant (só o admin de plataforma). Nome é globalmente único.
    pub async fn create_tenant(&self, actor: &User, name: &str) -> Result<Tenant, AppError> {
        authz::require(actor, Capability::CreateTenant)?;

        if self.tenant_repo.find_by_name(name).await?.is_some() {
            return Err(AppError::TenantNameAlreadyExists);
        }

        let tenant = self.tenant_repo.create(&self.pool, name).await;
        match tenant {
            // Corrida entre o check e o insert: a constraint decide.
            Err(e) if e.is_unique_violation() => Err(AppError::TenantNameAlreadyExists),
            other => other,
        }
    }

    /// Admin e owner podem listar os tenants (owner: somente listagem).
    pub async fn list_tenants(&self, actor: &User) -> Result<Vec<Tenant>, AppError> {
        authz::require(actor, Capability::ListTenants)?;
        self.tenant_repo.list().await
    }

    // ---
    // Usuários e ciclo de membresia
    // ---

    /// Admin vê todos os usuários; owner vê os do próprio tenant, sem as
    /// contas de admin de plataforma.
    pub async fn list_users(&self, actor: &User) -> Result<Vec<UserListItem>, AppError> {
        authz::require(actor, Capability::ManageUsers)?;

        let rows = match actor.role {
            Role::Admin => self.user_repo.list(None, false).await?,
            _ => self.user_repo.list(actor.tenant_id, true).await?,
        };

        rows.into_iter()
            .map(|row| {
                let user = row.into_user()?;
                Ok(UserListItem {
                    id: user.id,
                    username: user.username,
                    role: user.role,
                    tenant_name: user.tenant_name,
                    fulfillment_name: user.fulfillment_name,
                })
            })
            .collect()
    }

    /// Cria um usuário. Admin cria em qualquer tenant; owner só no seu, e
    /// nunca cria contas de admin.
    pub async fn create_user(
        &self,
        actor: &User,
        payload: CreateUserPayload,
    ) -> Result<UserListItem, AppError> {
        authz::require(actor, Capability::ManageUsers)?;

        if actor.role != Role::Admin {
            if Some(payload.tenant_id) != actor.tenant_id {
                return Err(AppError::Forbidden(
                    "owner só cria usuários no próprio tenant".to_string(),
                ));
            }
            if payload.role == Role::Admin {
                return Err(AppError::Forbidden(
                    "owner não cria contas de admin".to_string(),
                ));
            }
        }

        if self.user_repo.find_by_username(&payload.username).await?.is_some() {
            return Err(AppError::UsernameAlreadyExists);
        }

        if self.tenant_repo.find_by_id(payload.tenant_id).await?.is_none() {
            return Err(AppError::InvalidPayload("Tenant inexistente.".to_string()));
        }

        // Usuário `ff` é vinculado a um centro do MESMO tenant.
        if let Some(ff_id) = payload.fulfillment_id {
            let fulfillment = self
                .catalog_repo
                .find_fulfillment(ff_id)
                .await?
                .ok_or_else(|| AppError::InvalidPayload("Fulfillment inexistente.".to_string()))?;
            if fulfillment.tenant_id != payload.tenant_id {
                return Err(AppError::InvalidPayload(
                    "Fulfillment pertence a outro tenant.".to_string(),
                ));
            }
        }

        let password = payload.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let result = self
            .user_repo
            .create_user(
                &self.pool,
                &payload.username,
                &password_hash,
                payload.role.as_str(),
                payload.tenant_id,
                payload.fulfillment_id,
            )
            .await;
        let id = match result {
            Err(e) if e.is_unique_violation() => return Err(AppError::UsernameAlreadyExists),
            other => other?,
        };

        let created = self
            .user_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound)?
            .into_user()?;
        Ok(UserListItem {
            id: created.id,
            username: created.username,
            role: created.role,
            tenant_name: created.tenant_name,
            fulfillment_name: created.fulfillment_name,
        })
    }

    /// Remove um usuário: owner desvincula do tenant (soft-detach), admin
    /// apaga de vez. Auto-remoção é sempre negada, para qualquer papel.
    pub async fn remove_user(&self, actor: &User, user_id: i64) -> Result<RemovalAction, AppError> {
        let target = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound)?
            .into_user()?;

        let action = validate_removal(actor, &target)?;
        match action {
            RemovalAction::Detach => {
                self.user_repo.set_tenant(&self.pool, target.id, None).await?;
            }
            RemovalAction::HardDelete => {
                self.user_repo.delete(&self.pool, target.id).await?;
            }
        }
        Ok(action)
    }

    /// Owner adiciona um usuário EXISTENTE e sem tenant ao seu tenant.
    /// Usuário de outro tenant nunca pode ser "roubado" — precisa ter sido
    /// desvinculado antes.
    pub async fn add_existing_user(&self, actor: &User, user_id: i64) -> Result<UserListItem, AppError> {
        let target = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound)?
            .into_user()?;

        validate_attach(actor, &target)?;

        let tenant_id = actor
            .tenant_id
            .ok_or_else(|| AppError::Forbidden(Capability::ManageUsers.slug().to_string()))?;
        self.user_repo.set_tenant(&self.pool, target.id, Some(tenant_id)).await?;

        let updated = self
            .user_repo
            .find_by_id(target.id)
            .await?
            .ok_or(AppError::NotFound)?
            .into_user()?;
        Ok(UserListItem {
            id: updated.id,
            username: updated.username,
            role: updated.role,
            tenant_name: updated.tenant_name,
            fulfillment_name: updated.fulfillment_name,
        })
    }
}

/// Regras puras de remoção. Separadas do serviço para serem testáveis sem
/// banco.
pub fn validate_removal(actor: &User, target: &User) -> Result<RemovalAction, AppError> {
    if !matches!(actor.role, Role::Admin | Role::Owner) {
        return Err(AppError::Forbidden(Capability::ManageUsers.slug().to_string()));
    }

    // Auto-remoção sempre negada, independente do papel.
    if target.id == actor.id {
        return Err(AppError::Forbidden(
            "não é permitido remover a própria conta".to_string(),
        ));
    }

    match actor.role {
        Role::Admin => Ok(RemovalAction::HardDelete),
        _ => {
            // Owner só mexe em membros do próprio tenant (e precisa ter um).
            if actor.tenant_id.is_none() || target.tenant_id != actor.tenant_id {
                return Err(AppError::Forbidden(
                    "owner só remove usuários do próprio tenant".to_string(),
                ));
            }
            Ok(RemovalAction::Detach)
        }
    }
}

/// Regras puras de re-vinculação de um usuário existente a um tenant.
pub fn validate_attach(actor: &User, target: &User) -> Result<(), AppError> {
    if actor.role != Role::Owner || actor.tenant_id.is_none() {
        return Err(AppError::Forbidden(
            "só owners adicionam usuários existentes ao tenant".to_string(),
        ));
    }
    if target.id == actor.id {
        return Err(AppError::InvalidPayload(
            "Não é possível adicionar a si mesmo.".to_string(),
        ));
    }
    if target.role == Role::Admin {
        return Err(AppError::Forbidden(
            "contas de admin não entram em tenants".to_string(),
        ));
    }
    if target.tenant_id == actor.tenant_id {
        return Err(AppError::InvalidPayload(
            "Usuário já está no seu tenant.".to_string(),
        ));
    }
    if target.tenant_id.is_some() {
        return Err(AppError::InvalidPayload(
            "Usuário pertence a outro tenant; desvincule-o primeiro.".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: i64, role: Role, tenant_id: Option<i64>) -> User {
        User {
            id,
            username: format!("user{id}"),
            password_hash: "$2b$fake".to_string(),
            role,
            tenant_id,
            tenant_name: tenant_id.map(|t| format!("Tenant {t}")),
            fulfillment_id: None,
            fulfillment_name: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn owner_desvincula_membro_do_proprio_tenant() {
        let owner = user(1, Role::Owner, Some(10));
        let member = user(2, Role::Supplier, Some(10));
        assert_eq!(validate_removal(&owner, &member).unwrap(), RemovalAction::Detach);
    }

    #[test]
    fn admin_apaga_de_vez() {
        let admin = user(1, Role::Admin, Some(1));
        let member = user(2, Role::Supplier, Some(10));
        assert_eq!(validate_removal(&admin, &member).unwrap(), RemovalAction::HardDelete);
    }

    #[test]
    fn auto_remocao_e_sempre_negada() {
        let owner = user(1, Role::Owner, Some(10));
        let admin = user(2, Role::Admin, Some(1));
        assert!(matches!(validate_removal(&owner, &owner), Err(AppError::Forbidden(_))));
        assert!(matches!(validate_removal(&admin, &admin), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn owner_nao_remove_usuario_de_outro_tenant() {
        let owner = user(1, Role::Owner, Some(10));
        let outsider = user(2, Role::Supplier, Some(11));
        assert!(validate_removal(&owner, &outsider).is_err());
        // Nem usuário já sem tenant.
        let detached = user(3, Role::Supplier, None);
        assert!(validate_removal(&owner, &detached).is_err());
    }

    #[test]
    fn papeis_comuns_nao_removem_ninguem() {
        let member = user(2, Role::Supplier, Some(10));
        for role in [Role::Supplier, Role::Ff, Role::Driver] {
            let actor = user(1, role, Some(10));
            assert!(validate_removal(&actor, &member).is_err());
        }
    }

    #[test]
    fn owner_reanexa_usuario_sem_tenant() {
        let owner = user(1, Role::Owner, Some(10));
        let detached = user(2, Role::Supplier, None);
        assert!(validate_attach(&owner, &detached).is_ok());
    }

    #[test]
    fn reanexar_falha_se_o_usuario_ja_tem_outro_tenant() {
        let owner = user(1, Role::Owner, Some(10));
        let other = user(2, Role::Supplier, Some(11));
        assert!(matches!(
            validate_attach(&owner, &other),
            Err(AppError::InvalidPayload(_))
        ));
    }

    #[test]
    fn reanexar_nega_admins_e_a_si_mesmo() {
        let owner = user(1, Role::Owner, Some(10));
        let admin = user(2, Role::Admin, None);
        assert!(matches!(validate_attach(&owner, &admin), Err(AppError::Forbidden(_))));
        assert!(validate_attach(&owner, &owner).is_err());
    }

    #[test]
    fn so_owner_reanexa() {
        let detached = user(2, Role::Supplier, None);
        for role in [Role::Admin, Role::Supplier, Role::Ff, Role::Driver] {
            let actor = user(1, role, Some(10));
            assert!(validate_attach(&actor, &detached).is_err());
        }
    }

    #[test]
    fn usuario_ja_no_tenant_do_owner_nao_e_reanexado() {
        let owner = user(1, Role::Owner, Some(10));
        let member = user(2, Role::Supplier, Some(10));
        assert!(matches!(
            validate_attach(&owner, &member),
            Err(AppError::InvalidPayload(_))
        ));
    }
}
