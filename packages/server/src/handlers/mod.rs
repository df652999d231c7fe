pub mod bill;
pub mod health;
