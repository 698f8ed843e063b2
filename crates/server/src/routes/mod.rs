use axum::Router;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use ts_rs::TS;
use utils::tokenize::{TokenizeError, Tokenizer};

use crate::DeploymentImpl;

pub mod activity_logs;
pub mod auth;
pub mod company_profiles;
pub mod crop_productions;
pub mod farmer_profiles;
pub mod health;
pub mod livestock_prices;
pub mod user_roles;
pub mod users;

/// Body of every `tokenized/*` route
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TokenizedRequest {
    pub tokenized: String,
}

impl TokenizedRequest {
    pub fn decode<T: DeserializeOwned>(&self, tokenizer: &Tokenizer) -> Result<T, TokenizeError> {
        tokenizer.verify_as(&self.tokenized)
    }
}

pub fn router(deployment: DeploymentImpl) -> Router {
    let api = Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(farmer_profiles::router())
        .merge(company_profiles::router())
        .merge(crop_productions::router())
        .merge(livestock_prices::router())
        .merge(users::router())
        .merge(user_roles::router())
        .merge(activity_logs::router());

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(deployment)
}
