use std::fmt;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Coin, StdError, StdResult, Uint128};
use itertools::Itertools;
use sha2::{Digest, Sha256};

use crate::asset::{PoolAsset, PoolSide, TOTAL_WEIGHT};

/// Prefix of every pool identifier (and of the LP denomination).
pub const POOL_ID_PREFIX: &str = "pool";

/// Tokenfactory caps subdenoms at 44 characters, so the LP subdenom keeps
/// the prefix plus the first 40 hex characters of the pool hash.
const LP_SUBDENOM_HASH_LEN: usize = 40;

/// Lifecycle of a mirrored pool. `Initial` pools accept deposits only;
/// the first successful double deposit flips them to `Ready`.
#[cw_serde]
pub enum PoolStatus {
    Initial,
    Ready,
}

impl fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PoolStatus::Initial => write!(f, "initial"),
            PoolStatus::Ready => write!(f, "ready"),
        }
    }
}

/// Derives the deterministic pool identifier for a pair of denominations.
/// Both replicas derive the same id regardless of argument order.
pub fn generate_pool_id(denoms: &[String; 2]) -> String {
    let concat: String = denoms.iter().sorted().join("");

    let mut hasher = Sha256::new();
    hasher.update(concat.as_bytes());

    format!("{}{}", POOL_ID_PREFIX, hex::encode(hasher.finalize()))
}

/// Truncates a pool id into a tokenfactory-compatible subdenom.
pub fn lp_subdenom(pool_id: &str) -> String {
    pool_id
        .chars()
        .take(POOL_ID_PREFIX.len() + LP_SUBDENOM_HASH_LEN)
        .collect()
}

/// The full on-chain tokenfactory denomination of a pool's LP token.
pub fn lp_denom(contract: impl fmt::Display, pool_id: &str) -> String {
    format!("factory/{}/{}", contract, lp_subdenom(pool_id))
}

/// One replica's view of a mirrored liquidity pool. The two replicas hold
/// identical balances, supply and status; only the `PoolSide` labels are
/// inverted between them.
#[cw_serde]
pub struct InterchainLiquidityPool {
    /// Deterministic pool identifier, shared by both replicas
    pub id: String,
    /// The two pool assets
    pub assets: [PoolAsset; 2],
    /// Outstanding LP supply; `supply.denom == id`
    pub supply: Coin,
    /// Lifecycle status
    pub status: PoolStatus,
    /// Channel end on this chain; packets for this pool are emitted here
    pub source_channel: String,
    /// Port of the counterparty module
    pub counterparty_port: String,
    /// Counterparty end of the ordered channel the pool is mirrored over
    pub counterparty_channel: String,
}

impl InterchainLiquidityPool {
    pub fn new(
        assets: [PoolAsset; 2],
        source_channel: impl Into<String>,
        counterparty_port: impl Into<String>,
        counterparty_channel: impl Into<String>,
    ) -> StdResult<Self> {
        let denoms = [
            assets[0].balance.denom.clone(),
            assets[1].balance.denom.clone(),
        ];
        if denoms[0] == denoms[1] {
            return Err(StdError::generic_err("pool denominations must differ"));
        }
        assets[0].validate()?;
        assets[1].validate()?;
        if assets[0].weight + assets[1].weight != TOTAL_WEIGHT {
            return Err(StdError::generic_err(format!(
                "asset weights must sum to {TOTAL_WEIGHT}"
            )));
        }

        let id = generate_pool_id(&denoms);
        Ok(Self {
            supply: Coin {
                denom: id.clone(),
                amount: Uint128::zero(),
            },
            id,
            assets,
            status: PoolStatus::Initial,
            source_channel: source_channel.into(),
            counterparty_port: counterparty_port.into(),
            counterparty_channel: counterparty_channel.into(),
        })
    }

    /// Looks up the pool asset holding the given denomination.
    pub fn asset(&self, denom: &str) -> StdResult<&PoolAsset> {
        self.assets
            .iter()
            .find(|a| a.balance.denom == denom)
            .ok_or_else(|| StdError::generic_err(format!("denom {denom} is not in the pool")))
    }

    /// The asset on the opposite side of `denom`.
    pub fn counter_asset(&self, denom: &str) -> StdResult<&PoolAsset> {
        self.assets
            .iter()
            .find(|a| a.balance.denom != denom)
            .ok_or_else(|| StdError::generic_err("pool has no counter asset"))
    }

    /// The side label this replica assigned to `denom`.
    pub fn side_of(&self, denom: &str) -> StdResult<PoolSide> {
        Ok(self.asset(denom)?.side.clone())
    }

    pub fn add_balance(&mut self, denom: &str, amount: Uint128) -> StdResult<()> {
        let asset = self.asset_mut(denom)?;
        asset.balance.amount = asset.balance.amount.checked_add(amount)?;
        Ok(())
    }

    pub fn sub_balance(&mut self, denom: &str, amount: Uint128) -> StdResult<()> {
        let asset = self.asset_mut(denom)?;
        asset.balance.amount = asset.balance.amount.checked_sub(amount)?;
        Ok(())
    }

    pub fn add_supply(&mut self, amount: Uint128) -> StdResult<()> {
        self.supply.amount = self.supply.amount.checked_add(amount)?;
        Ok(())
    }

    pub fn sub_supply(&mut self, amount: Uint128) -> StdResult<()> {
        self.supply.amount = self.supply.amount.checked_sub(amount)?;
        Ok(())
    }

    fn asset_mut(&mut self, denom: &str) -> StdResult<&mut PoolAsset> {
        self.assets
            .iter_mut()
            .find(|a| a.balance.denom == denom)
            .ok_or_else(|| StdError::generic_err(format!("denom {denom} is not in the pool")))
    }
}
