use std::sync::Arc;

use crate::auth::{Hasher, PrincipalResolver, TokenCodec};
use crate::config::Config;
use crate::repository::{
    AccountDirectory, InMemoryAccountDirectory, InMemoryTaskRepository, TaskRepository,
};

/// Everything a handler needs, shared across workers through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub tokens: TokenCodec,
    pub hasher: Hasher,
    pub accounts: Arc<dyn AccountDirectory>,
    pub tasks: Arc<dyn TaskRepository>,
    pub allow_admin_registration: bool,
}

impl AppState {
    pub fn new(
        config: &Config,
        accounts: Arc<dyn AccountDirectory>,
        tasks: Arc<dyn TaskRepository>,
    ) -> Self {
        Self {
            tokens: TokenCodec::new(&config.jwt_secret),
            hasher: config.hasher,
            accounts,
            tasks,
            allow_admin_registration: config.allow_admin_registration,
        }
    }

    /// State over fresh in-memory repositories.
    pub fn in_memory(config: &Config) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryAccountDirectory::new()),
            Arc::new(InMemoryTaskRepository::new()),
        )
    }

    pub fn resolver(&self) -> PrincipalResolver<'_> {
        PrincipalResolver::new(&self.tokens)
    }
}
