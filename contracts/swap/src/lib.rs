pub mod amm;
pub mod contract;
pub mod delegate;
pub mod escrow;
pub mod ibc;
pub mod math;
pub mod relay;
pub mod state;

mod error;

pub use error::ContractError;

#[cfg(test)]
mod testing;
