pub mod balance;
pub mod deploy;
pub mod token;
pub mod transactions;
pub mod transfer;
