use std::sync::Arc;
use chrono::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use agrimove_api::{ApiRouter, ApiState};
use agrimove_auth::{Authenticator, InMemoryCredentialStore, PasswordHasher, TokenManager};
use agrimove_core::NewUser;
use agrimove_ledger::InMemoryLedger;
use crate::config::Config;

pub struct Application {
    config: Config,
    state: Arc<ApiState>,
}

impl Application {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let secret = config.auth.signing_secret()?;
        let token_manager = TokenManager::new(&secret)
            .with_default_ttl(Duration::minutes(config.auth.token_ttl_minutes));

        let hasher = PasswordHasher::new(config.auth.pbkdf2_iterations)?;
        info!(iterations = hasher.iterations(), "password hasher ready");

        let credential_store = Arc::new(InMemoryCredentialStore::new());
        let authenticator = Arc::new(Authenticator::new(
            credential_store,
            hasher,
            token_manager,
        ));

        for user in &config.users {
            authenticator
                .register(NewUser {
                    username: user.username.clone(),
                    password: user.password.clone(),
                    confirm_password: user.password.clone(),
                    full_name: user.full_name.clone(),
                    email: user.email.clone(),
                })
                .await?;
        }
        info!(count = config.users.len(), "seed users registered");

        let ledger = Arc::new(InMemoryLedger::new());
        info!("transport ledger is in-memory; records are lost on restart");

        let state = Arc::new(ApiState::new(authenticator, ledger));

        Ok(Self { config, state })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let router = ApiRouter::new(self.state.clone()).build_rest_router();

        let http_addr = self.config.server.bind_address;
        let listener = TcpListener::bind(http_addr).await?;
        info!(address = %http_addr, "HTTP server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("server shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install ctrl+c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
