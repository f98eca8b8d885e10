// src/config.rs

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

use crate::{
    db::{AuditRepository, CatalogRepository, ShipmentRepository, TenantRepository, UserRepository},
    services::{
        auth::AuthService, sheets::SheetsMirror, shipment_service::ShipmentService,
        tenancy_service::TenancyService,
    },
};

// O estado compartilhado que será acessível em toda a aplicação.
// Nenhum cache de usuário/tenant/remessa mora aqui: toda decisão de
// autorização relê o banco.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub shipment_service: ShipmentService,
    pub tenancy_service: TenancyService,
    pub catalog_repo: CatalogRepository,
    pub audit_repo: AuditRepository,
}

impl AppState {
    // Carrega a configuração e monta o gráfico de dependências.
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let tenant_repo = TenantRepository::new(db_pool.clone());
        let shipment_repo = ShipmentRepository::new(db_pool.clone());
        let audit_repo = AuditRepository::new(db_pool.clone());
        let catalog_repo = CatalogRepository::new(db_pool.clone());
        let mirror = SheetsMirror::from_env();

        let auth_service = AuthService::new(user_repo.clone(), jwt_secret);
        let shipment_service = ShipmentService::new(
            shipment_repo,
            audit_repo.clone(),
            mirror,
            db_pool.clone(),
        );
        let tenancy_service = TenancyService::new(
            tenant_repo,
            user_repo,
            catalog_repo.clone(),
            db_pool.clone(),
        );

        Ok(Self {
            db_pool,
            auth_service,
            shipment_service,
            tenancy_service,
            catalog_repo,
            audit_repo,
        })
    }
}
