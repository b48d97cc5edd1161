#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{
    attr, to_json_binary, Binary, Deps, DepsMut, Env, MessageInfo, Response, StdError, StdResult,
};
use cw2::set_contract_version;
use cw_utils::nonpayable;

use interchainswap::msg::{
    ConfigResponse, EscrowResponse, ExecuteMsg, InstantiateMsg, ParamsResponse, PoolsResponse,
    QueryMsg, SwapSimulationResponse, MAX_FEE_RATE,
};
use interchainswap::packet::SwapMessageType;
use interchainswap::pool::generate_pool_id;

use crate::amm::InterchainMarketMaker;
use crate::delegate;
use crate::error::ContractError;
use crate::escrow;
use crate::state::{read_pools, Config, CHANNELS, CONFIG, POOLS};

/// Contract name that is used for migration.
const CONTRACT_NAME: &str = "interchainswap-swap";
/// Contract version that is used for migration.
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Creates a new contract with the specified parameters in the [`InstantiateMsg`].
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    if msg.fee_rate > MAX_FEE_RATE {
        return Err(ContractError::InvalidFeeRate {});
    }

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let config = Config {
        owner: deps.api.addr_validate(&msg.owner)?,
        fee_rate: msg.fee_rate,
        // the chain assigns the wasm port for this contract at store time
        source_port: format!("wasm.{}", env.contract.address),
    };
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new().add_attributes(vec![
        attr("action", "instantiate"),
        attr("owner", config.owner),
        attr("fee_rate", config.fee_rate.to_string()),
    ]))
}

/// Exposes all the execute functions available in the contract. The six
/// swap-protocol messages are delegated: validated and escrowed here, then
/// carried to the counterparty as a packet.
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::CreatePool {
            source_channel,
            denoms,
            decimals,
            weight,
            timeout,
        } => delegate::create_pool(
            deps,
            env,
            info,
            source_channel,
            denoms,
            decimals,
            weight,
            timeout,
        ),
        ExecuteMsg::SingleDeposit {
            pool_id,
            tokens,
            timeout,
        } => delegate::single_deposit(deps, env, info, pool_id, tokens, timeout),
        ExecuteMsg::DoubleDeposit {
            pool_id,
            token,
            remote_deposit,
            timeout,
        } => delegate::double_deposit(deps, env, info, pool_id, token, remote_deposit, timeout),
        ExecuteMsg::Withdraw {
            pool_coin,
            denom_out,
            timeout,
        } => delegate::withdraw(deps, env, info, pool_coin, denom_out, timeout),
        ExecuteMsg::LeftSwap {
            token_in,
            token_out,
            slippage,
            recipient,
            timeout,
        } => delegate::swap(
            deps,
            env,
            info,
            SwapMessageType::LeftSwap,
            token_in,
            token_out,
            slippage,
            recipient,
            timeout,
        ),
        ExecuteMsg::RightSwap {
            token_in,
            token_out,
            slippage,
            recipient,
            timeout,
        } => delegate::swap(
            deps,
            env,
            info,
            SwapMessageType::RightSwap,
            token_in,
            token_out,
            slippage,
            recipient,
            timeout,
        ),
        ExecuteMsg::UpdateConfig { fee_rate } => update_config(deps, info, fee_rate),
    }
}

/// Updates the governance-controlled parameters. Only the owner can execute this.
fn update_config(
    deps: DepsMut,
    info: MessageInfo,
    fee_rate: Option<u64>,
) -> Result<Response, ContractError> {
    nonpayable(&info)?;

    let mut config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized {});
    }

    if let Some(fee_rate) = fee_rate {
        if fee_rate > MAX_FEE_RATE {
            return Err(ContractError::InvalidFeeRate {});
        }
        config.fee_rate = fee_rate;
    }
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new().add_attributes(vec![
        attr("action", "update_config"),
        attr("fee_rate", config.fee_rate.to_string()),
    ]))
}

/// Exposes all the queries available in the contract.
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => {
            let config = CONFIG.load(deps.storage)?;
            to_json_binary(&ConfigResponse {
                owner: config.owner.to_string(),
                fee_rate: config.fee_rate,
                source_port: config.source_port,
            })
        }
        QueryMsg::Params {} => {
            let config = CONFIG.load(deps.storage)?;
            to_json_binary(&ParamsResponse {
                fee_rate: config.fee_rate,
            })
        }
        QueryMsg::Pool { pool_id } => {
            let pool = POOLS.load(deps.storage, &pool_id)?;
            to_json_binary(&pool)
        }
        QueryMsg::Pools { start_after, limit } => to_json_binary(&PoolsResponse {
            pools: read_pools(deps, start_after, limit)?,
        }),
        QueryMsg::LeftSwapSimulation {
            token_in,
            denom_out,
        } => {
            let pool_id = generate_pool_id(&[token_in.denom.clone(), denom_out.clone()]);
            let pool = POOLS.load(deps.storage, &pool_id)?;
            let config = CONFIG.load(deps.storage)?;

            let amm = InterchainMarketMaker::new(&pool, config.fee_rate);
            let token = amm
                .left_swap(&token_in, &denom_out)
                .map_err(|e| StdError::generic_err(e.to_string()))?;
            to_json_binary(&SwapSimulationResponse { token })
        }
        QueryMsg::RightSwapSimulation {
            token_out,
            denom_in,
        } => {
            let pool_id = generate_pool_id(&[denom_in.clone(), token_out.denom.clone()]);
            let pool = POOLS.load(deps.storage, &pool_id)?;
            let config = CONFIG.load(deps.storage)?;

            let amm = InterchainMarketMaker::new(&pool, config.fee_rate);
            let token = amm
                .right_swap(&denom_in, &token_out)
                .map_err(|e| StdError::generic_err(e.to_string()))?;
            to_json_binary(&SwapSimulationResponse { token })
        }
        QueryMsg::EscrowedAmount { channel, denom } => {
            let info = CHANNELS.load(deps.storage, &channel)?;
            let key = escrow::escrow_key(&info.port_id, &info.id);
            to_json_binary(&EscrowResponse {
                amount: escrow::balance(deps.storage, &key, &denom),
            })
        }
    }
}
