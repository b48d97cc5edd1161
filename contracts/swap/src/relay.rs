use cosmwasm_std::{
    attr, from_json, Binary, Coin, CosmosMsg, DepsMut, Env, IbcBasicResponse, IbcPacket,
    IbcReceiveResponse, StdError,
};
use sha2::{Digest, Sha256};

use interchainswap::asset::{parse_weights, PoolAsset, PoolSide};
use interchainswap::authz::authz_send_msg;
use interchainswap::msg::{
    MsgCreatePoolRequest, MsgCreatePoolResponse, MsgDoubleDepositRequest,
    MsgDoubleDepositResponse, MsgSingleDepositRequest, MsgSingleDepositResponse, MsgSwapRequest,
    MsgSwapResponse, MsgWithdrawRequest, MsgWithdrawResponse,
};
use interchainswap::packet::{ack_success, InterchainSwapPacketData, SwapMessageType};
use interchainswap::pool::{
    generate_pool_id, lp_denom, lp_subdenom, InterchainLiquidityPool, PoolStatus,
};
use interchainswap::querier::{has_supply, query_account, query_balance};
use interchainswap::token_factory::{tf_burn_msg, tf_create_denom_msg, tf_mint_msg};

use crate::amm::{assert_left_slippage, assert_right_slippage, InterchainMarketMaker};
use crate::error::ContractError;
use crate::escrow;
use crate::state::{CONFIG, POOLS};

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

/// Decodes an inbound packet and runs the matching handler. Callers wrap
/// any error into a failure acknowledgement so the transaction on this
/// chain still commits the ack.
pub fn do_packet_receive(
    deps: DepsMut,
    env: &Env,
    packet: &IbcPacket,
) -> Result<IbcReceiveResponse, ContractError> {
    let data: InterchainSwapPacketData = from_json(&packet.data)?;

    match data.msg_type {
        SwapMessageType::CreatePool => receive_create_pool(deps, env, packet, data.decode()?),
        SwapMessageType::SingleDeposit => receive_single_deposit(deps, env, data.decode()?),
        SwapMessageType::DoubleDeposit => {
            receive_double_deposit(deps, env, packet, data.decode()?)
        }
        SwapMessageType::Withdraw => receive_withdraw(deps, env, data.decode()?),
        SwapMessageType::LeftSwap => {
            receive_swap(deps, env, packet, SwapMessageType::LeftSwap, data.decode()?)
        }
        SwapMessageType::RightSwap => {
            receive_swap(deps, env, packet, SwapMessageType::RightSwap, data.decode()?)
        }
    }
}

/// Mirrors a proposed pool on this chain. Side labels are assigned from
/// this chain's point of view by asking the bank which denomination has
/// local supply.
fn receive_create_pool(
    deps: DepsMut,
    env: &Env,
    packet: &IbcPacket,
    msg: MsgCreatePoolRequest,
) -> Result<IbcReceiveResponse, ContractError> {
    if msg.denoms[0] == msg.denoms[1] {
        return Err(ContractError::DuplicateDenoms {});
    }
    let (w0, w1) = parse_weights(&msg.weight)?;

    let pool_id = generate_pool_id(&msg.denoms);
    if POOLS.has(deps.storage, &pool_id) {
        return Err(ContractError::PoolAlreadyExists { pool_id });
    }

    let mut assets = Vec::with_capacity(2);
    for (denom, weight, decimals) in [
        (&msg.denoms[0], w0, msg.decimals[0]),
        (&msg.denoms[1], w1, msg.decimals[1]),
    ] {
        let side = if has_supply(&deps.querier, denom)? {
            PoolSide::Native
        } else {
            PoolSide::Remote
        };
        let asset = PoolAsset::new(side, denom, weight, decimals);
        asset.validate()?;
        assets.push(asset);
    }
    let [asset0, asset1] = <[PoolAsset; 2]>::try_from(assets)
        .map_err(|_| StdError::generic_err("expected two pool assets"))?;
    if [&asset0, &asset1]
        .iter()
        .filter(|a| a.side == PoolSide::Native)
        .count()
        != 1
    {
        return Err(ContractError::InvalidNativeAssignment {});
    }

    // the packet source is this pool's counterparty end
    let pool = InterchainLiquidityPool::new(
        [asset0, asset1],
        packet.dest.channel_id.clone(),
        packet.src.port_id.clone(),
        packet.src.channel_id.clone(),
    )?;
    POOLS.save(deps.storage, &pool_id, &pool)?;

    let response = MsgCreatePoolResponse {
        pool_id: pool_id.clone(),
    };

    Ok(IbcReceiveResponse::new()
        .set_ack(ack_success(&response)?)
        .add_message(tf_create_denom_msg(
            env.contract.address.to_string(),
            lp_subdenom(&pool_id),
        ))
        .add_attributes(vec![
            attr("action", "receive_create_pool"),
            attr("pool_id", pool_id),
        ]))
}

/// Applies a single-sided deposit to the mirror. Only the pool record moves
/// here; LP tokens are minted on the initiating chain when the
/// acknowledgement lands.
fn receive_single_deposit(
    deps: DepsMut,
    _env: &Env,
    msg: MsgSingleDepositRequest,
) -> Result<IbcReceiveResponse, ContractError> {
    let mut pool = load_pool(&deps, &msg.pool_id)?;

    let token = match msg.tokens.as_slice() {
        [token] => token,
        _ => return Err(StdError::generic_err("single deposit takes exactly one token").into()),
    };
    // the deposited asset is native on the initiating chain
    assert_side(&pool, &token.denom, PoolSide::Remote)?;

    let config = CONFIG.load(deps.storage)?;
    let amm = InterchainMarketMaker::new(&pool, config.fee_rate);
    let issued = amm.deposit_single(token)?;

    pool.add_balance(&token.denom, token.amount)?;
    pool.add_supply(issued.amount)?;
    POOLS.save(deps.storage, &msg.pool_id, &pool)?;

    let response = MsgSingleDepositResponse {
        pool_token: issued.clone(),
    };

    Ok(IbcReceiveResponse::new()
        .set_ack(ack_success(&response)?)
        .add_attributes(vec![
            attr("action", "receive_single_deposit"),
            attr("pool_id", msg.pool_id),
            attr("issued", issued.amount),
        ]))
}

/// Applies both legs of a double deposit. The remote leg is charged on this
/// chain: the depositor's signature is verified against the auth account and
/// the funds are pulled under their authz grant. The remote-side LP is
/// minted here as a voucher; the local-side LP mints on the initiator at
/// ack time. The first double deposit seeds the pool and readies it.
fn receive_double_deposit(
    deps: DepsMut,
    env: &Env,
    packet: &IbcPacket,
    msg: MsgDoubleDepositRequest,
) -> Result<IbcReceiveResponse, ContractError> {
    let mut pool = load_pool(&deps, &msg.pool_id)?;

    let local = &msg.local_deposit;
    let remote = &msg.remote_deposit;
    assert_side(&pool, &local.token.denom, PoolSide::Remote)?;
    assert_side(&pool, &remote.token.denom, PoolSide::Native)?;

    // the remote leg is authorized by signature, not by transaction origin
    let depositor = deps.api.addr_validate(&remote.sender)?;
    let account = query_account(&deps.querier, depositor.as_str())?;
    if account.sequence != remote.sequence {
        return Err(ContractError::SequenceMismatch {
            expected: account.sequence,
            actual: remote.sequence,
        });
    }
    let pubkey = account.pubkey.ok_or(ContractError::SignatureInvalid {})?;
    let digest = Sha256::digest(remote.canonical_bytes()?.as_slice());
    let valid = deps
        .api
        .secp256k1_verify(&digest, remote.signature.as_slice(), pubkey.as_slice())
        .map_err(|_| ContractError::SignatureInvalid {})?;
    if !valid {
        return Err(ContractError::SignatureInvalid {});
    }

    // the authz pull executes after this transaction; fail early instead of
    // acking a deposit whose funds are not there
    let held = query_balance(&deps.querier, depositor.as_str(), &remote.token.denom)?;
    if held < remote.token.amount {
        return Err(ContractError::InsufficientBalance {
            denom: remote.token.denom.clone(),
        });
    }

    let config = CONFIG.load(deps.storage)?;
    let amm = InterchainMarketMaker::new(&pool, config.fee_rate);
    let issued = amm.deposit_double([&local.token, &remote.token])?;

    pool.add_balance(&local.token.denom, local.token.amount)?;
    pool.add_balance(&remote.token.denom, remote.token.amount)?;
    pool.add_supply(issued[0].amount.checked_add(issued[1].amount)?)?;
    if pool.status == PoolStatus::Initial {
        pool.status = PoolStatus::Ready;
    }
    POOLS.save(deps.storage, &msg.pool_id, &pool)?;

    // collect the remote leg into escrow on this side
    let key = escrow::escrow_key(&packet.dest.port_id, &packet.dest.channel_id);
    escrow::lock(deps.storage, &key, &remote.token)?;
    let pull = authz_send_msg(
        env.contract.address.to_string(),
        depositor.as_str(),
        env.contract.address.to_string(),
        remote.token.clone(),
    );

    // the remote sender's LP share lives on this chain
    let voucher = tf_mint_msg(
        env.contract.address.to_string(),
        Coin {
            denom: lp_denom(&env.contract.address, &pool.id),
            amount: issued[1].amount,
        },
        depositor.as_str(),
    );

    let response = MsgDoubleDepositResponse {
        pool_tokens: issued.to_vec(),
    };

    Ok(IbcReceiveResponse::new()
        .set_ack(ack_success(&response)?)
        .add_message(pull)
        .add_message(voucher)
        .add_attributes(vec![
            attr("action", "receive_double_deposit"),
            attr("pool_id", msg.pool_id),
            attr("status", pool.status.to_string()),
        ]))
}

/// Applies a withdrawal to the mirror. The output is paid on the initiating
/// chain out of its escrow, so only balances and supply move here.
fn receive_withdraw(
    deps: DepsMut,
    _env: &Env,
    msg: MsgWithdrawRequest,
) -> Result<IbcReceiveResponse, ContractError> {
    let mut pool = load_pool(&deps, &msg.pool_coin.denom)?;
    assert_ready(&pool)?;
    // paid out where it is native, which is the initiating chain
    assert_side(&pool, &msg.denom_out, PoolSide::Remote)?;

    let config = CONFIG.load(deps.storage)?;
    let amm = InterchainMarketMaker::new(&pool, config.fee_rate);
    let out = amm.withdraw(&msg.pool_coin, &msg.denom_out)?;

    pool.sub_balance(&msg.denom_out, out.amount)?;
    pool.sub_supply(msg.pool_coin.amount)?;
    POOLS.save(deps.storage, &pool.id, &pool)?;

    let response = MsgWithdrawResponse {
        tokens: vec![out.clone()],
    };

    Ok(IbcReceiveResponse::new()
        .set_ack(ack_success(&response)?)
        .add_attributes(vec![
            attr("action", "receive_withdraw"),
            attr("pool_id", pool.id),
            attr("amount_out", out.amount),
        ]))
}

/// Prices a swap on the mirror, enforces the slippage bound and pays the
/// recipient from this chain's escrow.
fn receive_swap(
    deps: DepsMut,
    _env: &Env,
    packet: &IbcPacket,
    msg_type: SwapMessageType,
    msg: MsgSwapRequest,
) -> Result<IbcReceiveResponse, ContractError> {
    let pool_id = generate_pool_id(&[msg.token_in.denom.clone(), msg.token_out.denom.clone()]);
    let mut pool = load_pool(&deps, &pool_id)?;
    assert_ready(&pool)?;
    assert_side(&pool, &msg.token_in.denom, PoolSide::Remote)?;
    assert_side(&pool, &msg.token_out.denom, PoolSide::Native)?;

    let recipient = deps.api.addr_validate(&msg.recipient)?;
    let config = CONFIG.load(deps.storage)?;
    let amm = InterchainMarketMaker::new(&pool, config.fee_rate);

    let (paid_out, action) = match msg_type {
        SwapMessageType::LeftSwap => {
            let out = amm.left_swap(&msg.token_in, &msg.token_out.denom)?;
            assert_left_slippage(out.amount, msg.token_out.amount, msg.slippage)?;
            (out, "receive_left_swap")
        }
        SwapMessageType::RightSwap => {
            let required = amm.right_swap(&msg.token_in.denom, &msg.token_out)?;
            assert_right_slippage(msg.token_in.amount, required.amount, msg.slippage)?;
            (msg.token_out.clone(), "receive_right_swap")
        }
        _ => return Err(StdError::generic_err("not a swap message type").into()),
    };

    pool.add_balance(&msg.token_in.denom, msg.token_in.amount)?;
    pool.sub_balance(&paid_out.denom, paid_out.amount)?;

    // the escrow check is the last fallible step; a failure here must not
    // leave a half-applied pool behind the error acknowledgement
    let key = escrow::escrow_key(&packet.dest.port_id, &packet.dest.channel_id);
    let payment = escrow::pay_out(deps.storage, &key, paid_out.clone(), recipient.as_str())?;
    POOLS.save(deps.storage, &pool_id, &pool)?;

    let response = MsgSwapResponse {
        tokens: vec![paid_out.clone()],
    };

    Ok(IbcReceiveResponse::new()
        .set_ack(ack_success(&response)?)
        .add_message(payment)
        .add_attributes(vec![
            attr("action", action),
            attr("pool_id", pool_id),
            attr("recipient", recipient),
            attr("amount_out", paid_out.amount),
        ]))
}

/// Finalizes a successfully acknowledged packet on the initiating chain:
/// the mirror deltas the counterparty already applied are replayed on the
/// local record, and LP tokens are minted, burned or paid out as the
/// operation requires.
pub fn on_acknowledged(
    deps: DepsMut,
    env: &Env,
    packet: &IbcPacket,
    data: InterchainSwapPacketData,
    ack_data: Binary,
) -> Result<IbcBasicResponse, ContractError> {
    match data.msg_type {
        SwapMessageType::CreatePool => {
            let response: MsgCreatePoolResponse = from_json(&ack_data)?;
            // the mirror exists now; readiness still waits for seeding
            Ok(IbcBasicResponse::new().add_attributes(vec![
                attr("action", "acknowledge_create_pool"),
                attr("pool_id", response.pool_id),
            ]))
        }
        SwapMessageType::SingleDeposit => {
            let request: MsgSingleDepositRequest = data.decode()?;
            let response: MsgSingleDepositResponse = from_json(&ack_data)?;
            let token = match request.tokens.as_slice() {
                [token] => token.clone(),
                _ => {
                    return Err(
                        StdError::generic_err("single deposit takes exactly one token").into(),
                    )
                }
            };

            let mut pool = load_pool(&deps, &request.pool_id)?;
            pool.add_balance(&token.denom, token.amount)?;
            pool.add_supply(response.pool_token.amount)?;
            POOLS.save(deps.storage, &request.pool_id, &pool)?;

            let mint = tf_mint_msg(
                env.contract.address.to_string(),
                Coin {
                    denom: lp_denom(&env.contract.address, &pool.id),
                    amount: response.pool_token.amount,
                },
                request.sender.as_str(),
            );

            Ok(IbcBasicResponse::new().add_message(mint).add_attributes(vec![
                attr("action", "acknowledge_single_deposit"),
                attr("pool_id", request.pool_id),
                attr("issued", response.pool_token.amount),
            ]))
        }
        SwapMessageType::DoubleDeposit => {
            let request: MsgDoubleDepositRequest = data.decode()?;
            let response: MsgDoubleDepositResponse = from_json(&ack_data)?;
            let [local_lp, _remote_lp] = match response.pool_tokens.as_slice() {
                [a, b] => [a.clone(), b.clone()],
                _ => {
                    return Err(StdError::generic_err(
                        "double deposit issues exactly two pool tokens",
                    )
                    .into())
                }
            };

            let mut pool = load_pool(&deps, &request.pool_id)?;
            pool.add_balance(
                &request.local_deposit.token.denom,
                request.local_deposit.token.amount,
            )?;
            pool.add_balance(
                &request.remote_deposit.token.denom,
                request.remote_deposit.token.amount,
            )?;
            let total: cosmwasm_std::Uint128 = response
                .pool_tokens
                .iter()
                .map(|c| c.amount)
                .sum();
            pool.add_supply(total)?;
            if pool.status == PoolStatus::Initial {
                pool.status = PoolStatus::Ready;
            }
            POOLS.save(deps.storage, &request.pool_id, &pool)?;

            let mint = tf_mint_msg(
                env.contract.address.to_string(),
                Coin {
                    denom: lp_denom(&env.contract.address, &pool.id),
                    amount: local_lp.amount,
                },
                request.local_deposit.sender.as_str(),
            );

            Ok(IbcBasicResponse::new().add_message(mint).add_attributes(vec![
                attr("action", "acknowledge_double_deposit"),
                attr("pool_id", request.pool_id),
                attr("status", pool.status.to_string()),
            ]))
        }
        SwapMessageType::Withdraw => {
            let request: MsgWithdrawRequest = data.decode()?;
            let response: MsgWithdrawResponse = from_json(&ack_data)?;
            let out = match response.tokens.as_slice() {
                [token] => token.clone(),
                _ => {
                    return Err(
                        StdError::generic_err("withdraw returns exactly one token").into()
                    )
                }
            };

            let mut pool = load_pool(&deps, &request.pool_coin.denom)?;
            pool.sub_balance(&out.denom, out.amount)?;
            pool.sub_supply(request.pool_coin.amount)?;
            POOLS.save(deps.storage, &pool.id, &pool)?;

            let key = escrow::escrow_key(&packet.src.port_id, &packet.src.channel_id);

            // the escrowed LP voucher is burned for good
            let voucher = Coin {
                denom: lp_denom(&env.contract.address, &pool.id),
                amount: request.pool_coin.amount,
            };
            escrow::release(deps.storage, &key, &voucher)?;
            let burn = tf_burn_msg(env.contract.address.to_string(), voucher);

            let payment =
                escrow::pay_out(deps.storage, &key, out.clone(), request.sender.as_str())?;

            Ok(IbcBasicResponse::new()
                .add_message(burn)
                .add_message(payment)
                .add_attributes(vec![
                    attr("action", "acknowledge_withdraw"),
                    attr("pool_id", pool.id),
                    attr("amount_out", out.amount),
                ]))
        }
        SwapMessageType::LeftSwap | SwapMessageType::RightSwap => {
            let request: MsgSwapRequest = data.decode()?;
            let response: MsgSwapResponse = from_json(&ack_data)?;
            let out = match response.tokens.as_slice() {
                [token] => token.clone(),
                _ => return Err(StdError::generic_err("swap returns exactly one token").into()),
            };

            let pool_id = generate_pool_id(&[
                request.token_in.denom.clone(),
                request.token_out.denom.clone(),
            ]);
            let mut pool = load_pool(&deps, &pool_id)?;
            // replay the counterparty's deltas; the escrowed input stays put
            pool.add_balance(&request.token_in.denom, request.token_in.amount)?;
            pool.sub_balance(&out.denom, out.amount)?;
            POOLS.save(deps.storage, &pool_id, &pool)?;

            let action = match data.msg_type {
                SwapMessageType::LeftSwap => "acknowledge_left_swap",
                _ => "acknowledge_right_swap",
            };

            Ok(IbcBasicResponse::new().add_attributes(vec![
                attr("action", action),
                attr("pool_id", pool_id),
                attr("amount_out", out.amount),
            ]))
        }
    }
}

/// Returns the escrowed input of a failed or timed-out packet to its
/// original sender. The pool was never touched on this chain, so no state
/// other than the escrow ledger moves.
pub fn refund(
    deps: DepsMut,
    env: &Env,
    packet: &IbcPacket,
    data: InterchainSwapPacketData,
) -> Result<IbcBasicResponse, ContractError> {
    let key = escrow::escrow_key(&packet.src.port_id, &packet.src.channel_id);

    let (messages, sender): (Vec<CosmosMsg>, String) = match data.msg_type {
        SwapMessageType::CreatePool => {
            let request: MsgCreatePoolRequest = data.decode()?;
            // the counterparty refused the pool; drop the local half
            let pool_id = generate_pool_id(&request.denoms);
            POOLS.remove(deps.storage, &pool_id);
            (vec![], request.sender)
        }
        SwapMessageType::SingleDeposit => {
            let request: MsgSingleDepositRequest = data.decode()?;
            let token = match request.tokens.as_slice() {
                [token] => token.clone(),
                _ => {
                    return Err(
                        StdError::generic_err("single deposit takes exactly one token").into(),
                    )
                }
            };
            let payment =
                escrow::pay_out(deps.storage, &key, token, request.sender.as_str())?;
            (vec![payment], request.sender)
        }
        SwapMessageType::DoubleDeposit => {
            let request: MsgDoubleDepositRequest = data.decode()?;
            let payment = escrow::pay_out(
                deps.storage,
                &key,
                request.local_deposit.token.clone(),
                request.local_deposit.sender.as_str(),
            )?;
            (vec![payment], request.local_deposit.sender)
        }
        SwapMessageType::Withdraw => {
            let request: MsgWithdrawRequest = data.decode()?;
            let voucher = Coin {
                denom: lp_denom(&env.contract.address, &request.pool_coin.denom),
                amount: request.pool_coin.amount,
            };
            let payment =
                escrow::pay_out(deps.storage, &key, voucher, request.sender.as_str())?;
            (vec![payment], request.sender)
        }
        SwapMessageType::LeftSwap | SwapMessageType::RightSwap => {
            let request: MsgSwapRequest = data.decode()?;
            let payment = escrow::pay_out(
                deps.storage,
                &key,
                request.token_in.clone(),
                request.sender.as_str(),
            )?;
            (vec![payment], request.sender)
        }
    };

    Ok(IbcBasicResponse::new()
        .add_messages(messages)
        .add_attributes(vec![attr("action", "refund"), attr("sender", sender)]))
}
