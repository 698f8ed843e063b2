pub mod activity_log;
pub mod company_profile;
pub mod config;
pub mod crop_production;
pub mod database_validator;
pub mod export;
pub mod farmer_profile;
pub mod livestock_price;
pub mod password;
pub mod privilege;
pub mod request;
pub mod session;
pub mod user_management;
