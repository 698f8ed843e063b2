pub mod extract;
pub mod session;
