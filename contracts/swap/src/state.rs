use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Deps, IbcEndpoint, Order, StdResult, Uint128};
use cw_storage_plus::{Bound, Item, Map};

use interchainswap::pool::InterchainLiquidityPool;

/// This structure stores the main config parameters for the swap module.
#[cw_serde]
pub struct Config {
    /// Address allowed to update the configuration
    pub owner: Addr,
    /// Pool fee rate in basis points
    pub fee_rate: u64,
    /// The port this module is bound to
    pub source_port: String,
}

/// Properties of a connected ordered channel.
#[cw_serde]
pub struct ChannelInfo {
    /// Channel id on this chain
    pub id: String,
    /// Port the channel is bound to on this chain
    pub port_id: String,
    /// Counterparty end of the channel
    pub counterparty_endpoint: IbcEndpoint,
    /// Connection the channel was established over
    pub connection_id: String,
}

/// Stores the config struct at the given key
pub const CONFIG: Item<Config> = Item::new("config");

/// All mirrored pools, keyed by pool id
pub const POOLS: Map<&str, InterchainLiquidityPool> = Map::new("pools");

/// Connected channels, keyed by local channel id
pub const CHANNELS: Map<&str, ChannelInfo> = Map::new("channels");

/// Escrowed amounts, keyed by (escrow subaccount, denom)
pub const ESCROWS: Map<(&str, &str), Uint128> = Map::new("escrows");

/// ## Pagination settings
/// The maximum limit for reading pools from [`POOLS`]
const MAX_LIMIT: u32 = 30;
/// The default limit for reading pools from [`POOLS`]
const DEFAULT_LIMIT: u32 = 10;

/// Reads pools from [`POOLS`] according to the `start_after` and `limit` variables.
pub fn read_pools(
    deps: Deps,
    start_after: Option<String>,
    limit: Option<u32>,
) -> StdResult<Vec<InterchainLiquidityPool>> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.as_deref().map(Bound::exclusive);

    POOLS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| {
            let (_, pool) = item?;
            Ok(pool)
        })
        .collect()
}
