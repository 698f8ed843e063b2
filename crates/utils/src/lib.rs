pub mod response;
pub mod sentry;
pub mod tokenize;
