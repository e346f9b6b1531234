use std::sync::Arc;

use stallboard::{
    App, AppContext, ConfigBuilder,
    allowlist::{DomainService, DomainsModule, InMemoryAllowListStore},
    auth::{
        AuthModule, InMemoryIdentityProvider, InMemoryTokenStore, RemoteAdminVerifier,
        SessionManager,
    },
    dashboard::DashboardModule,
    stalls::{InMemoryStallStore, StallService, StallsModule},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigBuilder::new().from_env().build()?;
    stallboard::init_tracing_with_config(&config);

    let provider = Arc::new(InMemoryIdentityProvider::new());
    seed_admin_account(&provider);

    let allow_list = Arc::new(InMemoryAllowListStore::new().with_tenant(
        &config.tenant.id,
        &config.tenant.name,
        config.tenant.initial_domains.clone(),
    ));
    let tokens = Arc::new(InMemoryTokenStore::new());

    let mut session = SessionManager::new(
        provider,
        allow_list.clone(),
        tokens,
        &config.tenant.id,
    )
    .with_call_timeout(config.auth.call_timeout());
    if let Some(url) = &config.auth.verify_url {
        session = session.with_remote_verifier(RemoteAdminVerifier::new(url));
    }
    let session = Arc::new(session);
    session.spawn_listener();

    let context = AppContext::builder()
        .with_session(session)
        .with_domains(Arc::new(DomainService::new(
            allow_list,
            &config.tenant.id,
        )))
        .with_stalls(Arc::new(StallService::new(
            Arc::new(InMemoryStallStore::new()),
            &config.tenant.id,
        )))
        .build();

    App::with_config(config)
        .with_context(context)
        .register_module(AuthModule)
        .register_protected_module(DashboardModule)
        .register_protected_module(StallsModule)
        .register_protected_module(DomainsModule)
        .serve()
        .await?;

    Ok(())
}

/// Seed the provider with the admin account from the environment.
fn seed_admin_account(provider: &InMemoryIdentityProvider) {
    let email = std::env::var("STALLBOARD_ADMIN_EMAIL").ok();
    let password = std::env::var("STALLBOARD_ADMIN_PASSWORD").ok();

    match (email, password) {
        (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
            provider.add_user(&email, &password);
            tracing::info!(email = %email, "Admin account registered");
        }
        _ => {
            tracing::warn!(
                "No admin account configured; set STALLBOARD_ADMIN_EMAIL and \
                 STALLBOARD_ADMIN_PASSWORD to enable login"
            );
        }
    }
}
