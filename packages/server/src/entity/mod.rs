pub mod bill;
pub mod user;
