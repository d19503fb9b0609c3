use std::sync::Arc;

use murmur_db::storage::Storage;

use crate::{
    auth::{AuthManager, SessionAuthProvider, SessionSigner},
    config::MurmurApiConfig,
};

#[derive(Clone)]
pub struct ApiContext {
    pub config: Arc<MurmurApiConfig>,
    pub db: Arc<dyn Storage>,
    pub auth_manager: Arc<AuthManager>,
    pub session_signer: Arc<SessionSigner>,
}

impl ApiContext {
    pub fn new(config: MurmurApiConfig, db: Arc<dyn Storage>, signer: SessionSigner) -> Self {
        let session_signer = Arc::new(signer);
        let auth_manager = AuthManager::new().with_provider(SessionAuthProvider::new(
            Arc::clone(&session_signer),
            Arc::clone(&db),
        ));

        Self {
            config: Arc::new(config),
            db,
            auth_manager: Arc::new(auth_manager),
            session_signer,
        }
    }

    /// Page size for timelines and post lists.
    pub fn posts_per_page(&self) -> u64 {
        self.config.posts_per_page.max(1)
    }
}
