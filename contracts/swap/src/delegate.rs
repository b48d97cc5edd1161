use cosmwasm_std::{
    attr, to_json_binary, Coin, DepsMut, Env, IbcMsg, IbcTimeout, MessageInfo, Response, StdError,
};
use cw_utils::{must_pay, nonpayable};
use serde::Serialize;

use interchainswap::asset::{parse_weights, PoolAsset, PoolSide};
use interchainswap::msg::{
    LocalDeposit, MsgCreatePoolRequest, MsgDoubleDepositRequest, MsgSingleDepositRequest,
    MsgSwapRequest, MsgWithdrawRequest, RemoteDeposit, BASIS_POINTS,
};
use interchainswap::packet::{InterchainSwapPacketData, SwapMessageType, DEFAULT_TIMEOUT_SECONDS};
use interchainswap::pool::{
    generate_pool_id, lp_denom, lp_subdenom, InterchainLiquidityPool, PoolStatus,
};
use interchainswap::querier::has_supply;
use interchainswap::token_factory::tf_create_denom_msg;

use crate::error::ContractError;
use crate::escrow;
use crate::state::{ChannelInfo, CHANNELS, POOLS};

/// Builds the typed packet and the transport message carrying it.
fn emit_packet<T: Serialize>(
    env: &Env,
    channel_id: String,
    msg_type: SwapMessageType,
    msg: &T,
    timeout: Option<u64>,
) -> Result<IbcMsg, ContractError> {
    let packet = InterchainSwapPacketData::encode(msg_type, msg)?;
    let timeout = IbcTimeout::with_timestamp(
        env.block
            .time
            .plus_seconds(timeout.unwrap_or(DEFAULT_TIMEOUT_SECONDS)),
    );

    Ok(IbcMsg::SendPacket {
        channel_id,
        data: to_json_binary(&packet)?,
        timeout,
    })
}

fn load_channel(deps: &DepsMut, channel_id: &str) -> Result<ChannelInfo, ContractError> {
    CHANNELS
        .may_load(deps.storage, channel_id)?
        .ok_or_else(|| StdError::generic_err(format!("channel {channel_id} is not connected")).into())
}

fn load_pool(deps: &DepsMut, pool_id: &str) -> Result<InterchainLiquidityPool, ContractError> {
    POOLS
        .may_load(deps.storage, pool_id)?
        .ok_or_else(|| ContractError::PoolNotFound {
            pool_id: pool_id.to_string(),
        })
}

fn assert_ready(pool: &InterchainLiquidityPool) -> Result<(), ContractError> {
    if pool.status != PoolStatus::Ready {
        return Err(ContractError::PoolNotReady {
            pool_id: pool.id.clone(),
        });
    }
    Ok(())
}

fn assert_side(
    pool: &InterchainLiquidityPool,
    denom: &str,
    side: PoolSide,
) -> Result<(), ContractError> {
    if pool.side_of(denom)? != side {
        return Err(ContractError::WrongSide {
            denom: denom.to_string(),
        });
    }
    Ok(())
}

fn pool_side(deps: &DepsMut, denom: &str) -> Result<PoolSide, ContractError> {
    let side = if has_supply(&deps.querier, denom)? {
        PoolSide::Native
    } else {
        PoolSide::Remote
    };
    Ok(side)
}

/// Registers the pool locally in `Initial` state and proposes it to the
/// counterparty. No escrow is taken; the pool only becomes usable once the
/// counterparty mirrors it and a seeding double deposit lands.
#[allow(clippy::too_many_arguments)]
pub fn create_pool(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    source_channel: String,
    denoms: [String; 2],
    decimals: [u8; 2],
    weight: String,
    timeout: Option<u64>,
) -> Result<Response, ContractError> {
    nonpayable(&info)?;

    if denoms[0] == denoms[1] {
        return Err(ContractError::DuplicateDenoms {});
    }
    let (w0, w1) = parse_weights(&weight)?;
    let channel = load_channel(&deps, &source_channel)?;

    let pool_id = generate_pool_id(&denoms);
    if POOLS.has(deps.storage, &pool_id) {
        return Err(ContractError::PoolAlreadyExists { pool_id });
    }

    // label each asset by who issued it; a mirrored pool needs exactly one
    // asset from each chain
    let side0 = pool_side(&deps, &denoms[0])?;
    let side1 = pool_side(&deps, &denoms[1])?;
    let assets = [
        PoolAsset::new(side0, &denoms[0], w0, decimals[0]),
        PoolAsset::new(side1, &denoms[1], w1, decimals[1]),
    ];
    if assets.iter().filter(|a| a.side == PoolSide::Native).count() != 1 {
        return Err(ContractError::InvalidNativeAssignment {});
    }
    for asset in &assets {
        asset.validate()?;
    }

    let pool = InterchainLiquidityPool::new(
        assets,
        source_channel.clone(),
        channel.counterparty_endpoint.port_id.clone(),
        channel.counterparty_endpoint.channel_id.clone(),
    )?;
    POOLS.save(deps.storage, &pool_id, &pool)?;

    let request = MsgCreatePoolRequest {
        source_port: channel.port_id,
        source_channel: source_channel.clone(),
        sender: info.sender.to_string(),
        denoms,
        decimals,
        weight,
    };
    let packet = emit_packet(
        &env,
        source_channel,
        SwapMessageType::CreatePool,
        &request,
        timeout,
    )?;

    Ok(Response::new()
        .add_message(tf_create_denom_msg(
            env.contract.address,
            lp_subdenom(&pool_id),
        ))
        .add_message(packet)
        .add_attributes(vec![
            attr("action", "create_pool"),
            attr("pool_id", pool_id),
            attr("sender", info.sender),
        ]))
}

/// Escrows a single-sided deposit and proposes it to the counterparty.
pub fn single_deposit(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    pool_id: String,
    tokens: Vec<Coin>,
    timeout: Option<u64>,
) -> Result<Response, ContractError> {
    let [token]: [Coin; 1] = tokens
        .try_into()
        .map_err(|_| StdError::generic_err("single deposit takes exactly one token"))?;
    if token.amount.is_zero() {
        return Err(ContractError::ZeroAmount {});
    }

    let pool = load_pool(&deps, &pool_id)?;
    assert_side(&pool, &token.denom, PoolSide::Native)?;
    if pool.supply.amount.is_zero() {
        // the pool has not been seeded; the formula would divide by zero
        return Err(ContractError::EmptyPoolSide {
            denom: token.denom.clone(),
        });
    }

    let paid = must_pay(&info, &token.denom)?;
    if paid != token.amount {
        return Err(StdError::generic_err(
            "attached funds do not match the declared deposit",
        )
        .into());
    }

    let channel = load_channel(&deps, &pool.source_channel)?;
    let key = escrow::escrow_key(&channel.port_id, &channel.id);
    escrow::lock(deps.storage, &key, &token)?;

    let request = MsgSingleDepositRequest {
        pool_id: pool_id.clone(),
        sender: info.sender.to_string(),
        tokens: vec![token],
    };
    let packet = emit_packet(
        &env,
        pool.source_channel,
        SwapMessageType::SingleDeposit,
        &request,
        timeout,
    )?;

    Ok(Response::new().add_message(packet).add_attributes(vec![
        attr("action", "single_deposit"),
        attr("pool_id", pool_id),
        attr("sender", info.sender),
    ]))
}

/// Escrows the local leg of a double-sided deposit and proposes both legs
/// to the counterparty, which authenticates and collects the remote leg.
pub fn double_deposit(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    pool_id: String,
    token: Coin,
    remote_deposit: RemoteDeposit,
    timeout: Option<u64>,
) -> Result<Response, ContractError> {
    if token.amount.is_zero() || remote_deposit.token.amount.is_zero() {
        return Err(ContractError::ZeroAmount {});
    }
    if remote_deposit.signature.is_empty() {
        return Err(ContractError::SignatureInvalid {});
    }

    let pool = load_pool(&deps, &pool_id)?;
    assert_side(&pool, &token.denom, PoolSide::Native)?;
    assert_side(&pool, &remote_deposit.token.denom, PoolSide::Remote)?;

    let paid = must_pay(&info, &token.denom)?;
    if paid != token.amount {
        return Err(StdError::generic_err(
            "attached funds do not match the declared deposit",
        )
        .into());
    }

    let channel = load_channel(&deps, &pool.source_channel)?;
    let key = escrow::escrow_key(&channel.port_id, &channel.id);
    escrow::lock(deps.storage, &key, &token)?;

    let request = MsgDoubleDepositRequest {
        pool_id: pool_id.clone(),
        local_deposit: LocalDeposit {
            sender: info.sender.to_string(),
            token,
        },
        remote_deposit,
    };
    let packet = emit_packet(
        &env,
        pool.source_channel,
        SwapMessageType::DoubleDeposit,
        &request,
        timeout,
    )?;

    Ok(Response::new().add_message(packet).add_attributes(vec![
        attr("action", "double_deposit"),
        attr("pool_id", pool_id),
        attr("sender", info.sender),
    ]))
}

/// Escrows LP tokens and proposes the redemption to the counterparty.
/// The output denomination must be native here, where it will be paid out
/// of escrow once the acknowledgement lands.
pub fn withdraw(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    pool_coin: Coin,
    denom_out: String,
    timeout: Option<u64>,
) -> Result<Response, ContractError> {
    if pool_coin.amount.is_zero() {
        return Err(ContractError::ZeroAmount {});
    }

    let pool = load_pool(&deps, &pool_coin.denom)?;
    assert_ready(&pool)?;
    assert_side(&pool, &denom_out, PoolSide::Native)?;
    if pool_coin.amount >= pool.supply.amount {
        return Err(ContractError::InsufficientSupply {});
    }

    // the on-chain LP voucher travels under its tokenfactory denom
    let voucher = Coin {
        denom: lp_denom(&env.contract.address, &pool.id),
        amount: pool_coin.amount,
    };
    let paid = must_pay(&info, &voucher.denom)?;
    if paid != voucher.amount {
        return Err(StdError::generic_err(
            "attached funds do not match the redeemed amount",
        )
        .into());
    }

    let channel = load_channel(&deps, &pool.source_channel)?;
    let key = escrow::escrow_key(&channel.port_id, &channel.id);
    escrow::lock(deps.storage, &key, &voucher)?;

    let request = MsgWithdrawRequest {
        sender: info.sender.to_string(),
        pool_coin,
        denom_out,
    };
    let packet = emit_packet(
        &env,
        pool.source_channel,
        SwapMessageType::Withdraw,
        &request,
        timeout,
    )?;

    Ok(Response::new().add_message(packet).add_attributes(vec![
        attr("action", "withdraw"),
        attr("pool_id", pool.id),
        attr("sender", info.sender),
    ]))
}

/// Escrows the input of a swap and proposes it to the counterparty, which
/// prices it, checks slippage and pays the recipient there.
#[allow(clippy::too_many_arguments)]
pub fn swap(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg_type: SwapMessageType,
    token_in: Coin,
    token_out: Coin,
    slippage: u64,
    recipient: String,
    timeout: Option<u64>,
) -> Result<Response, ContractError> {
    if token_in.amount.is_zero() || token_out.amount.is_zero() {
        return Err(ContractError::ZeroAmount {});
    }
    if slippage == 0 || slippage > BASIS_POINTS {
        return Err(ContractError::InvalidSlippage {});
    }
    if recipient.is_empty() {
        return Err(ContractError::MissingRecipient {});
    }

    let pool_id = generate_pool_id(&[token_in.denom.clone(), token_out.denom.clone()]);
    let pool = load_pool(&deps, &pool_id)?;
    assert_ready(&pool)?;
    assert_side(&pool, &token_in.denom, PoolSide::Native)?;
    assert_side(&pool, &token_out.denom, PoolSide::Remote)?;

    let paid = must_pay(&info, &token_in.denom)?;
    if paid != token_in.amount {
        return Err(
            StdError::generic_err("attached funds do not match the swap input").into(),
        );
    }

    let channel = load_channel(&deps, &pool.source_channel)?;
    let key = escrow::escrow_key(&channel.port_id, &channel.id);
    escrow::lock(deps.storage, &key, &token_in)?;

    let action = match msg_type {
        SwapMessageType::LeftSwap => "left_swap",
        SwapMessageType::RightSwap => "right_swap",
        _ => return Err(StdError::generic_err("not a swap message type").into()),
    };

    let request = MsgSwapRequest {
        sender: info.sender.to_string(),
        token_in,
        token_out,
        slippage,
        recipient,
    };
    let packet = emit_packet(&env, pool.source_channel, msg_type, &request, timeout)?;

    Ok(Response::new().add_message(packet).add_attributes(vec![
        attr("action", action),
        attr("pool_id", pool_id),
        attr("sender", info.sender),
    ]))
}
