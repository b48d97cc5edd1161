use cosmwasm_std::{ConversionOverflowError, OverflowError, StdError};
use cw_utils::PaymentError;
use thiserror::Error;

/// This enum describes swap module errors
#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Payment(#[from] PaymentError),

    #[error("Unauthorized")]
    Unauthorized {},

    #[error("Event of zero transfer")]
    ZeroAmount {},

    #[error("Doubling denominations in pool assets")]
    DuplicateDenoms {},

    #[error("Fee rate exceeds the allowed maximum")]
    InvalidFeeRate {},

    #[error("Slippage tolerance must be within (0, 10000]")]
    InvalidSlippage {},

    #[error("Recipient address is missing")]
    MissingRecipient {},

    #[error("Pool {pool_id} not found")]
    PoolNotFound { pool_id: String },

    #[error("Pool {pool_id} already exists")]
    PoolAlreadyExists { pool_id: String },

    #[error("Pool {pool_id} is not ready")]
    PoolNotReady { pool_id: String },

    #[error("Denom {denom} is on the wrong side of the pool for this operation")]
    WrongSide { denom: String },

    #[error("Pool must hold exactly one asset native to this chain")]
    InvalidNativeAssignment {},

    #[error("Redeemed amount exceeds the outstanding pool supply")]
    InsufficientSupply {},

    #[error("Sender balance does not cover the required {denom}")]
    InsufficientBalance { denom: String },

    #[error("Escrow does not hold enough {denom}")]
    InsufficientEscrow { denom: String },

    #[error("Remote deposit signature verification failed")]
    SignatureInvalid {},

    #[error("Remote deposit sequence mismatch: expected {expected}, got {actual}")]
    SequenceMismatch { expected: u64, actual: u64 },

    #[error("Pool side {denom} is empty")]
    EmptyPoolSide { denom: String },

    #[error("Requested output would drain the pool side")]
    DrainedPool {},

    #[error("Fixed-point math domain error")]
    MathDomain {},

    #[error("Operation exceeds the slippage tolerance")]
    SlippageExceeded {},

    #[error("Only ordered channels are supported")]
    InvalidChannelOrder {},

    #[error("Invalid channel version {actual}; only {expected} is supported")]
    InvalidChannelVersion { expected: String, actual: String },

    #[error("Channels may not be closed")]
    ChannelMayNotBeClosed {},
}

impl From<OverflowError> for ContractError {
    fn from(o: OverflowError) -> Self {
        StdError::from(o).into()
    }
}

impl From<ConversionOverflowError> for ContractError {
    fn from(o: ConversionOverflowError) -> Self {
        StdError::from(o).into()
    }
}
