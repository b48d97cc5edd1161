use std::fmt;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Coin, StdError, StdResult, Uint128};

/// Sum of the two asset weights in every pool.
pub const TOTAL_WEIGHT: u64 = 100;
/// Smallest weight a single pool asset may carry.
pub const MIN_WEIGHT: u64 = 1;
/// Largest weight a single pool asset may carry.
pub const MAX_WEIGHT: u64 = 99;
/// Largest supported number of decimal places for a pool asset.
pub const MAX_DECIMALS: u8 = 18;

/// Which chain issued a pool asset. The same pool carries opposite
/// labels on the two replicas.
#[cw_serde]
pub enum PoolSide {
    /// The asset is issued on this chain
    Native,
    /// The asset is issued on the counterparty chain
    Remote,
}

impl fmt::Display for PoolSide {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PoolSide::Native => write!(f, "native"),
            PoolSide::Remote => write!(f, "remote"),
        }
    }
}

/// This structure describes one of the two assets locked in an interchain pool.
#[cw_serde]
pub struct PoolAsset {
    /// Whether this chain or the counterparty issued the asset
    pub side: PoolSide,
    /// Denomination and current pool balance
    pub balance: Coin,
    /// Weight as an integer percentage; the two weights sum to 100
    pub weight: u64,
    /// Number of decimal places the denomination uses
    pub decimals: u8,
}

impl fmt::Display for PoolAsset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}{} ({}, weight {})",
            self.balance.amount, self.balance.denom, self.side, self.weight
        )
    }
}

impl PoolAsset {
    pub fn new(side: PoolSide, denom: impl Into<String>, weight: u64, decimals: u8) -> Self {
        Self {
            side,
            balance: Coin {
                denom: denom.into(),
                amount: Uint128::zero(),
            },
            weight,
            decimals,
        }
    }

    /// Validates the weight and decimals ranges for a single asset.
    pub fn validate(&self) -> StdResult<()> {
        if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&self.weight) {
            return Err(StdError::generic_err(format!(
                "asset weight must be within [{MIN_WEIGHT}, {MAX_WEIGHT}]"
            )));
        }
        if self.decimals > MAX_DECIMALS {
            return Err(StdError::generic_err(format!(
                "asset decimals must not exceed {MAX_DECIMALS}"
            )));
        }
        Ok(())
    }
}

/// Parses a `"50:50"`-style weight declaration into the two integer weights.
/// Both must lie in `[1, 99]` and sum to exactly 100.
pub fn parse_weights(weight: &str) -> StdResult<(u64, u64)> {
    let parts: Vec<&str> = weight.split(':').collect();
    if parts.len() != 2 {
        return Err(StdError::generic_err(
            "weight must be of the form \"<w0>:<w1>\"",
        ));
    }

    let w0: u64 = parts[0]
        .trim()
        .parse()
        .map_err(|_| StdError::generic_err(format!("invalid weight: {}", parts[0])))?;
    let w1: u64 = parts[1]
        .trim()
        .parse()
        .map_err(|_| StdError::generic_err(format!("invalid weight: {}", parts[1])))?;

    if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&w0) || !(MIN_WEIGHT..=MAX_WEIGHT).contains(&w1) {
        return Err(StdError::generic_err(format!(
            "weights must be within [{MIN_WEIGHT}, {MAX_WEIGHT}]"
        )));
    }
    if w0 + w1 != TOTAL_WEIGHT {
        return Err(StdError::generic_err(format!(
            "weights must sum to {TOTAL_WEIGHT}"
        )));
    }

    Ok((w0, w1))
}
