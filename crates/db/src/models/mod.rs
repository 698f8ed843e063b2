pub mod activity_log;
pub mod company_profile;
pub mod crop_production;
pub mod farmer_profile;
pub mod livestock_price;
pub mod pagination;
pub mod user;
pub mod user_role;
pub mod user_session;
