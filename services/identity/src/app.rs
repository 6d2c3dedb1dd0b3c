//! 依赖装配

use std::sync::Arc;

use axum::Router;
use shelf_adapter_email::{EmailClient, EmailSender, EmailTemplate};
use shelf_bootstrap::Infrastructure;
use shelf_errors::AppResult;
use tracing::info;

use crate::api::http::{AppState, FilterState, router};
use crate::application::AuthenticationService;
use crate::domain::repositories::IdentityRepository;
use crate::domain::services::Argon2PasswordHasher;
use crate::domain::unit_of_work::UnitOfWorkFactory;
use crate::infrastructure::persistence::{
    InMemoryStore, PostgresIdentityRepository, PostgresUnitOfWorkFactory, run_migrations,
};

/// 根据基础设施装配服务并构建路由
pub async fn build_router(infra: Arc<Infrastructure>) -> AppResult<Router> {
    let config = infra.config();
    let pool = infra.postgres_pool();

    let (uow_factory, identities): (Arc<dyn UnitOfWorkFactory>, Arc<dyn IdentityRepository>) =
        match &pool {
            Some(pool) => {
                run_migrations(pool).await?;
                (
                    Arc::new(PostgresUnitOfWorkFactory::new(pool.clone())),
                    Arc::new(PostgresIdentityRepository::new(pool.clone())),
                )
            }
            None => {
                let store = InMemoryStore::with_roles([config.activation.baseline_role.clone()]);
                (Arc::new(store.clone()), Arc::new(store))
            }
        };

    let email_sender: Arc<dyn EmailSender> = Arc::new(EmailClient::new(
        config.email.clone(),
        EmailTemplate::builtin()?,
    ));

    let token_service = infra.token_service();
    let auth = Arc::new(AuthenticationService::new(
        uow_factory,
        identities.clone(),
        Arc::new(Argon2PasswordHasher::new()),
        token_service.clone(),
        email_sender,
        &config.activation,
    ));

    info!(
        code_length = config.activation.code_length,
        window_minutes = config.activation.window_minutes,
        require_activation_for_login = config.activation.require_for_login,
        "Identity service assembled"
    );

    Ok(router(
        AppState::new(auth, pool),
        FilterState::new(token_service, identities),
    ))
}
