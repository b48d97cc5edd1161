use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Binary, Coin, Uint128};

use crate::pool::InterchainLiquidityPool;

/// Fee rates and slippage tolerances are expressed in basis points of 1/10000.
pub const BASIS_POINTS: u64 = 10_000;
/// Upper bound for the pool fee rate (10%).
pub const MAX_FEE_RATE: u64 = 1_000;

/// This structure describes the parameters used for creating a contract.
#[cw_serde]
pub struct InstantiateMsg {
    /// Address allowed to update the contract configuration
    pub owner: String,
    /// Pool fee rate in basis points
    pub fee_rate: u64,
}

/// The local half of a double-sided deposit; the sender is the transaction
/// signer and the token must be attached to the message.
#[cw_serde]
pub struct LocalDeposit {
    pub sender: String,
    pub token: Coin,
}

/// The remote half of a double-sided deposit, authorized out-of-band by the
/// counterparty-chain sender. The signature covers the canonical encoding of
/// `{sender, sequence, token}` and is checked on the receiving chain.
#[cw_serde]
pub struct RemoteDeposit {
    pub sender: String,
    /// The remote sender's current account sequence, replay protection
    pub sequence: u64,
    pub token: Coin,
    /// Secp256k1 signature over the canonical deposit message
    pub signature: Binary,
}

/// The canonical message a remote depositor signs.
#[cw_serde]
pub struct RemoteDepositSignDoc {
    pub sender: String,
    pub sequence: u64,
    pub token: Coin,
}

impl RemoteDeposit {
    /// The canonical bytes covered by `signature`.
    pub fn canonical_bytes(&self) -> cosmwasm_std::StdResult<Binary> {
        cosmwasm_std::to_json_binary(&RemoteDepositSignDoc {
            sender: self.sender.clone(),
            sequence: self.sequence,
            token: self.token.clone(),
        })
    }
}

/// This structure describes the execute messages available in the contract.
/// Each variant is delegated: validated and escrowed locally, then emitted
/// as a packet towards the counterparty.
#[cw_serde]
pub enum ExecuteMsg {
    /// Create a mirrored pool over an ordered channel
    CreatePool {
        source_channel: String,
        /// The two denominations; exactly one must be native to this chain
        denoms: [String; 2],
        /// Decimal places of the two denominations, same order as `denoms`
        decimals: [u8; 2],
        /// Weight declaration of the form "50:50"
        weight: String,
        /// Relative packet timeout in seconds
        timeout: Option<u64>,
    },
    /// Deposit a single native token; the coin must be attached as funds
    SingleDeposit {
        pool_id: String,
        tokens: Vec<Coin>,
        timeout: Option<u64>,
    },
    /// Deposit both sides at once: the local leg is attached as funds, the
    /// remote leg is pulled on the counterparty chain under `remote_deposit`'s
    /// signature
    DoubleDeposit {
        pool_id: String,
        token: Coin,
        remote_deposit: RemoteDeposit,
        timeout: Option<u64>,
    },
    /// Redeem LP tokens for one of the pool denominations; the LP coin must
    /// be attached as funds
    Withdraw {
        /// LP tokens to redeem, denominated in the pool id
        pool_coin: Coin,
        /// Which pool denomination to receive
        denom_out: String,
        timeout: Option<u64>,
    },
    /// Sell an exact input amount (out-given-in)
    LeftSwap {
        /// Exact input, native to this chain, attached as funds
        token_in: Coin,
        /// Expected output on the counterparty chain; its amount anchors the
        /// slippage check
        token_out: Coin,
        /// Slippage tolerance in basis points
        slippage: u64,
        /// Recipient on the counterparty chain
        recipient: String,
        timeout: Option<u64>,
    },
    /// Buy an exact output amount (in-given-out)
    RightSwap {
        /// Maximum input the sender commits, native to this chain, attached
        /// as funds
        token_in: Coin,
        /// Exact output to receive on the counterparty chain
        token_out: Coin,
        /// Slippage tolerance in basis points
        slippage: u64,
        /// Recipient on the counterparty chain
        recipient: String,
        timeout: Option<u64>,
    },
    /// Update the contract configuration; only the owner can execute this
    UpdateConfig { fee_rate: Option<u64> },
}

/// This structure describes the query messages available in the contract.
#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    /// Returns the contract configuration
    #[returns(ConfigResponse)]
    Config {},
    /// Returns the governance-controlled pool parameters
    #[returns(ParamsResponse)]
    Params {},
    /// Returns a single pool by id
    #[returns(InterchainLiquidityPool)]
    Pool { pool_id: String },
    /// Enumerates pools, paginated by pool id
    #[returns(PoolsResponse)]
    Pools {
        start_after: Option<String>,
        limit: Option<u32>,
    },
    /// Quotes a left swap (out-given-in) against the current pool state
    #[returns(SwapSimulationResponse)]
    LeftSwapSimulation { token_in: Coin, denom_out: String },
    /// Quotes a right swap (in-given-out) against the current pool state
    #[returns(SwapSimulationResponse)]
    RightSwapSimulation { token_out: Coin, denom_in: String },
    /// Returns the amount currently escrowed for a channel and denomination
    #[returns(EscrowResponse)]
    EscrowedAmount { channel: String, denom: String },
}

#[cw_serde]
pub struct ConfigResponse {
    pub owner: String,
    pub fee_rate: u64,
    pub source_port: String,
}

#[cw_serde]
pub struct ParamsResponse {
    pub fee_rate: u64,
}

#[cw_serde]
pub struct PoolsResponse {
    pub pools: Vec<InterchainLiquidityPool>,
}

#[cw_serde]
pub struct SwapSimulationResponse {
    /// The quoted counter-amount: output for a left swap, required input
    /// for a right swap
    pub token: Coin,
}

#[cw_serde]
pub struct EscrowResponse {
    pub amount: Uint128,
}

// Wire requests and responses. `data` inside the packet envelope is the
// canonical JSON encoding of one of these, selected by the envelope type.

#[cw_serde]
pub struct MsgCreatePoolRequest {
    pub source_port: String,
    pub source_channel: String,
    pub sender: String,
    pub denoms: [String; 2],
    pub decimals: [u8; 2],
    /// Weight declaration of the form "50:50"
    pub weight: String,
}

#[cw_serde]
pub struct MsgCreatePoolResponse {
    pub pool_id: String,
}

#[cw_serde]
pub struct MsgSingleDepositRequest {
    pub pool_id: String,
    pub sender: String,
    pub tokens: Vec<Coin>,
}

#[cw_serde]
pub struct MsgSingleDepositResponse {
    pub pool_token: Coin,
}

#[cw_serde]
pub struct MsgDoubleDepositRequest {
    pub pool_id: String,
    pub local_deposit: LocalDeposit,
    pub remote_deposit: RemoteDeposit,
}

#[cw_serde]
pub struct MsgDoubleDepositResponse {
    /// LP issued per leg: local leg first, remote leg second
    pub pool_tokens: Vec<Coin>,
}

#[cw_serde]
pub struct MsgWithdrawRequest {
    pub sender: String,
    /// LP tokens to redeem, denominated in the pool id
    pub pool_coin: Coin,
    pub denom_out: String,
}

#[cw_serde]
pub struct MsgWithdrawResponse {
    pub tokens: Vec<Coin>,
}

#[cw_serde]
pub struct MsgSwapRequest {
    pub sender: String,
    pub token_in: Coin,
    pub token_out: Coin,
    /// Slippage tolerance in basis points
    pub slippage: u64,
    pub recipient: String,
}

#[cw_serde]
pub struct MsgSwapResponse {
    pub tokens: Vec<Coin>,
}
