//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use tokio::net::TcpListener;

mod common;
mod config;
mod db;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Rotas públicas de autenticação
    let auth_routes = Router::new().route("/login", post(handlers::auth::login));

    // Sessão do usuário autenticado
    let session_routes = Router::new()
        .route("/logout", post(handlers::auth::logout))
        .route("/me", get(handlers::auth::get_me));

    let shipment_routes = Router::new()
        .route(
            "/",
            post(handlers::shipments::create_shipment).get(handlers::shipments::list_shipments),
        )
        .route(
            "/{id}",
            get(handlers::shipments::get_shipment).put(handlers::shipments::update_shipment),
        )
        .route("/{id}/events", post(handlers::shipments::create_shipment_event))
        .route("/{id}/changes", get(handlers::shipments::get_shipment_changes));

    let user_routes = Router::new()
        .route(
            "/",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route("/add-existing", post(handlers::users::add_existing_user))
        .route("/{id}", delete(handlers::users::remove_user));

    let tenancy_routes = Router::new().route(
        "/",
        post(handlers::tenancy::create_tenant).get(handlers::tenancy::list_tenants),
    );

    let catalog_routes = Router::new()
        .route(
            "/suppliers",
            post(handlers::catalog::create_supplier).get(handlers::catalog::list_suppliers),
        )
        .route(
            "/warehouses",
            post(handlers::catalog::create_warehouse).get(handlers::catalog::list_warehouses),
        )
        .route(
            "/fulfillments",
            post(handlers::catalog::create_fulfillment).get(handlers::catalog::list_fulfillments),
        );

    // Tudo que não for login exige token válido.
    let protected = Router::new()
        .nest("/api/auth", session_routes)
        .nest("/api/shipments", shipment_routes)
        .nest("/api/users", user_routes)
        .nest("/api/tenants", tenancy_routes)
        .nest("/api/catalog", catalog_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .merge(protected)
        .with_state(app_state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
