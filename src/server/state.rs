//! Shared application state

use crate::auth::UserStore;
use crate::config::ServerConfig;
use crate::error::Result;

pub struct AppState {
    pub users: UserStore,
}

impl AppState {
    pub fn new(users: UserStore) -> Self {
        Self { users }
    }

    /// Open the user store named by the configuration
    pub async fn from_config(config: &ServerConfig) -> Result<Self> {
        let users = UserStore::connect(&config.database_url, config.session_ttl).await?;
        Ok(Self::new(users))
    }
}
