pub mod bill;
pub mod billing;
pub mod inventory;
pub mod owner;
