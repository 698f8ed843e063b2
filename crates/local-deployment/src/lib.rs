use std::sync::Arc;

use async_trait::async_trait;
use db::DBService;
use deployment::{Deployment, DeploymentError};
use secrecy::ExposeSecret;
use services::services::config::Config;
use tracing::debug;
use utils::tokenize::Tokenizer;

#[derive(Clone)]
pub struct LocalDeployment {
    config: Arc<Config>,
    db: DBService,
    tokenizer: Tokenizer,
}

impl LocalDeployment {
    /// Connect to the configured database and apply migrations
    pub async fn from_config(config: Config) -> Result<Self, DeploymentError> {
        let db = DBService::new(&config.database_url).await?;
        debug!(host = %config.host, port = config.port, "Deployment configured");
        Ok(Self::from_parts(config, db))
    }

    /// Assemble from an already connected database, e.g. an in-memory one
    pub fn from_parts(config: Config, db: DBService) -> Self {
        let tokenizer = Tokenizer::new(config.tokenize_secret.expose_secret());
        Self {
            config: Arc::new(config),
            db,
            tokenizer,
        }
    }
}

#[async_trait]
impl Deployment for LocalDeployment {
    async fn new() -> Result<Self, DeploymentError> {
        Self::from_config(Config::from_env()?).await
    }

    fn config(&self) -> &Config {
        &self.config
    }

    fn db(&self) -> &DBService {
        &self.db
    }

    fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }
}
