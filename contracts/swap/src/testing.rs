use cosmwasm_std::testing::{mock_env, mock_info, MockApi, MockStorage, MOCK_CONTRACT_ADDR};
use cosmwasm_std::{
    coins, from_json, Addr, Binary, Coin, CosmosMsg, IbcAcknowledgement, IbcBasicResponse,
    IbcChannel, IbcChannelCloseMsg, IbcChannelConnectMsg, IbcChannelOpenMsg, IbcEndpoint, IbcMsg,
    IbcOrder, IbcPacket, IbcPacketAckMsg, IbcPacketReceiveMsg, IbcPacketTimeoutMsg,
    IbcReceiveResponse, IbcTimeout, OwnedDeps, Response, Timestamp, Uint128,
};
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{Signature, SigningKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use proptest::prelude::*;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};

use interchainswap::asset::PoolSide;
use interchainswap::msg::{
    ConfigResponse, ExecuteMsg, InstantiateMsg, ParamsResponse, QueryMsg, RemoteDeposit,
};
use interchainswap::packet::{InterchainSwapAck, IBC_VERSION};
use interchainswap::pool::{generate_pool_id, lp_denom, InterchainLiquidityPool, PoolStatus};

use crate::contract::{execute, instantiate, query};
use crate::error::ContractError;
use crate::escrow;
use crate::ibc::{
    ibc_channel_close, ibc_channel_connect, ibc_channel_open, ibc_packet_ack, ibc_packet_receive,
    ibc_packet_timeout,
};
use crate::mock_querier::{mock_dependencies, WasmMockQuerier};
use crate::state::POOLS;

const OWNER: &str = "owner";
const ALICE: &str = "alice";
const BOB: &str = "bob";
const RECIPIENT: &str = "carol";
const ATOM: &str = "uatom";
const OSMO: &str = "uosmo";
const CHANNEL_A: &str = "channel-0";
const CHANNEL_B: &str = "channel-1";
const FEE: u64 = 30;

type Chain = OwnedDeps<MockStorage, MockApi, WasmMockQuerier>;

fn contract_port() -> String {
    format!("wasm.{MOCK_CONTRACT_ADDR}")
}

fn endpoint(channel: &str) -> IbcEndpoint {
    IbcEndpoint {
        port_id: contract_port(),
        channel_id: channel.to_string(),
    }
}

fn test_channel(local: &str, remote: &str) -> IbcChannel {
    IbcChannel::new(
        endpoint(local),
        endpoint(remote),
        IbcOrder::Ordered,
        IBC_VERSION,
        "connection-2",
    )
}

/// A chain with the module instantiated, one connected channel and a
/// circulating supply of its native denomination.
fn setup_chain(local_channel: &str, remote_channel: &str, native_denom: &str) -> Chain {
    let mut deps = mock_dependencies(&[]);
    deps.querier
        .set_balance("issuer", coins(1_000_000_000_000, native_denom));

    instantiate(
        deps.as_mut(),
        mock_env(),
        mock_info(OWNER, &[]),
        InstantiateMsg {
            owner: OWNER.to_string(),
            fee_rate: FEE,
        },
    )
    .unwrap();

    ibc_channel_connect(
        deps.as_mut(),
        mock_env(),
        IbcChannelConnectMsg::OpenAck {
            channel: test_channel(local_channel, remote_channel),
            counterparty_version: IBC_VERSION.to_string(),
        },
    )
    .unwrap();

    deps
}

fn sent_packet_data(res: &Response) -> Binary {
    res.messages
        .iter()
        .find_map(|m| match &m.msg {
            CosmosMsg::Ibc(IbcMsg::SendPacket { data, .. }) => Some(data.clone()),
            _ => None,
        })
        .expect("no packet was sent")
}

fn packet(data: Binary, from_channel: &str, to_channel: &str) -> IbcPacket {
    IbcPacket::new(
        data,
        endpoint(from_channel),
        endpoint(to_channel),
        1,
        IbcTimeout::with_timestamp(Timestamp::from_seconds(1_700_000_000)),
    )
}

/// Runs an emitted packet through the counterparty's receive entry point.
fn deliver(chain: &mut Chain, data: Binary, from: &str, to: &str) -> IbcReceiveResponse {
    ibc_packet_receive(
        chain.as_mut(),
        mock_env(),
        IbcPacketReceiveMsg::new(packet(data, from, to), Addr::unchecked("relayer")),
    )
    .unwrap()
}

/// Feeds a receive response's acknowledgement back into the initiator.
fn ack_back(
    chain: &mut Chain,
    original: Binary,
    ack: Binary,
    from: &str,
    to: &str,
) -> IbcBasicResponse {
    ibc_packet_ack(
        chain.as_mut(),
        mock_env(),
        IbcPacketAckMsg::new(
            IbcAcknowledgement::new(ack),
            packet(original, from, to),
            Addr::unchecked("relayer"),
        ),
    )
    .unwrap()
}

fn expect_success<T: DeserializeOwned>(res: &IbcReceiveResponse) -> T {
    match from_json(&res.acknowledgement).unwrap() {
        InterchainSwapAck::Result(data) => from_json(data).unwrap(),
        InterchainSwapAck::Error(err) => panic!("unexpected error ack: {err}"),
    }
}

fn expect_error(res: &IbcReceiveResponse) -> String {
    match from_json(&res.acknowledgement).unwrap() {
        InterchainSwapAck::Error(err) => err,
        InterchainSwapAck::Result(_) => panic!("unexpected success ack"),
    }
}

fn bob_signing_key() -> SigningKey {
    SigningKey::from_slice(&[7u8; 32]).unwrap()
}

fn bob_pubkey() -> Binary {
    Binary::from(
        bob_signing_key()
            .verifying_key()
            .to_encoded_point(true)
            .as_bytes(),
    )
}

/// Builds the remote leg of a double deposit, signed the way the
/// counterparty chain will verify it.
fn signed_remote_deposit(sequence: u64, token: Coin) -> RemoteDeposit {
    let mut deposit = RemoteDeposit {
        sender: BOB.to_string(),
        sequence,
        token,
        signature: Binary::default(),
    };
    let digest = Sha256::digest(deposit.canonical_bytes().unwrap().as_slice());
    let signature: Signature = bob_signing_key().sign_prehash(&digest).unwrap();
    let signature = signature.normalize_s().unwrap_or(signature);
    deposit.signature = Binary::from(signature.to_bytes().as_slice());
    deposit
}

fn pool_id() -> String {
    generate_pool_id(&[ATOM.to_string(), OSMO.to_string()])
}

fn pool_on(chain: &Chain) -> InterchainLiquidityPool {
    POOLS.load(chain.as_ref().storage, &pool_id()).unwrap()
}

fn balance_of(pool: &InterchainLiquidityPool, denom: &str) -> Uint128 {
    pool.asset(denom).unwrap().balance.amount
}

/// Both replicas must agree on balances, supply and status; only the side
/// labels are inverted.
fn assert_mirrored(chain_a: &Chain, chain_b: &Chain) {
    let a = pool_on(chain_a);
    let b = pool_on(chain_b);

    assert_eq!(a.id, b.id);
    assert_eq!(a.supply, b.supply);
    assert_eq!(a.status, b.status);
    for denom in [ATOM, OSMO] {
        assert_eq!(balance_of(&a, denom), balance_of(&b, denom), "{denom}");
        assert_ne!(
            a.asset(denom).unwrap().side,
            b.asset(denom).unwrap().side,
            "{denom} side labels must be inverted"
        );
    }
}

/// Creates the ATOM/OSMO pool on chain A, mirrors it to chain B and seeds
/// it with a 1e6 + 1e6 double deposit, acknowledged end to end.
fn seeded_pair() -> (Chain, Chain) {
    let mut chain_a = setup_chain(CHANNEL_A, CHANNEL_B, ATOM);
    let mut chain_b = setup_chain(CHANNEL_B, CHANNEL_A, OSMO);
    chain_b.querier.with_account(BOB, 7, Some(bob_pubkey()));
    chain_b.querier.set_balance(BOB, coins(1_000_000, OSMO));

    // create
    let res = execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &[]),
        ExecuteMsg::CreatePool {
            source_channel: CHANNEL_A.to_string(),
            denoms: [ATOM.to_string(), OSMO.to_string()],
            decimals: [6, 6],
            weight: "50:50".to_string(),
            timeout: None,
        },
    )
    .unwrap();
    let create_data = sent_packet_data(&res);
    let recv = deliver(&mut chain_b, create_data.clone(), CHANNEL_A, CHANNEL_B);
    ack_back(
        &mut chain_a,
        create_data,
        recv.acknowledgement,
        CHANNEL_A,
        CHANNEL_B,
    );

    // seed
    let res = execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &coins(1_000_000, ATOM)),
        ExecuteMsg::DoubleDeposit {
            pool_id: pool_id(),
            token: Coin::new(1_000_000, ATOM),
            remote_deposit: signed_remote_deposit(7, Coin::new(1_000_000, OSMO)),
            timeout: None,
        },
    )
    .unwrap();
    let seed_data = sent_packet_data(&res);
    let recv = deliver(&mut chain_b, seed_data.clone(), CHANNEL_A, CHANNEL_B);
    ack_back(
        &mut chain_a,
        seed_data,
        recv.acknowledgement,
        CHANNEL_A,
        CHANNEL_B,
    );

    (chain_a, chain_b)
}

#[test]
fn proper_initialization() {
    let deps = setup_chain(CHANNEL_A, CHANNEL_B, ATOM);

    let config: ConfigResponse =
        from_json(query(deps.as_ref(), mock_env(), QueryMsg::Config {}).unwrap()).unwrap();
    assert_eq!(config.owner, OWNER);
    assert_eq!(config.fee_rate, FEE);
    assert_eq!(config.source_port, contract_port());

    let params: ParamsResponse =
        from_json(query(deps.as_ref(), mock_env(), QueryMsg::Params {}).unwrap()).unwrap();
    assert_eq!(params.fee_rate, FEE);
}

#[test]
fn instantiate_rejects_excessive_fee() {
    let mut deps = mock_dependencies(&[]);
    let err = instantiate(
        deps.as_mut(),
        mock_env(),
        mock_info(OWNER, &[]),
        InstantiateMsg {
            owner: OWNER.to_string(),
            fee_rate: 1_001,
        },
    )
    .unwrap_err();
    assert_eq!(err, ContractError::InvalidFeeRate {});
}

#[test]
fn update_config_is_owner_gated() {
    let mut deps = setup_chain(CHANNEL_A, CHANNEL_B, ATOM);

    let err = execute(
        deps.as_mut(),
        mock_env(),
        mock_info(ALICE, &[]),
        ExecuteMsg::UpdateConfig { fee_rate: Some(10) },
    )
    .unwrap_err();
    assert_eq!(err, ContractError::Unauthorized {});

    execute(
        deps.as_mut(),
        mock_env(),
        mock_info(OWNER, &[]),
        ExecuteMsg::UpdateConfig { fee_rate: Some(10) },
    )
    .unwrap();

    let params: ParamsResponse =
        from_json(query(deps.as_ref(), mock_env(), QueryMsg::Params {}).unwrap()).unwrap();
    assert_eq!(params.fee_rate, 10);
}

#[test]
fn channel_handshake_enforces_order_and_version() {
    let mut deps = setup_chain(CHANNEL_A, CHANNEL_B, ATOM);

    let unordered = IbcChannel::new(
        endpoint(CHANNEL_A),
        endpoint(CHANNEL_B),
        IbcOrder::Unordered,
        IBC_VERSION,
        "connection-2",
    );
    let err = ibc_channel_open(
        deps.as_mut(),
        mock_env(),
        IbcChannelOpenMsg::OpenInit { channel: unordered },
    )
    .unwrap_err();
    assert_eq!(err, ContractError::InvalidChannelOrder {});

    let wrong_version = IbcChannel::new(
        endpoint(CHANNEL_A),
        endpoint(CHANNEL_B),
        IbcOrder::Ordered,
        "ics20-1",
        "connection-2",
    );
    let err = ibc_channel_open(
        deps.as_mut(),
        mock_env(),
        IbcChannelOpenMsg::OpenInit {
            channel: wrong_version,
        },
    )
    .unwrap_err();
    assert_eq!(
        err,
        ContractError::InvalidChannelVersion {
            expected: IBC_VERSION.to_string(),
            actual: "ics20-1".to_string(),
        }
    );

    let response = ibc_channel_open(
        deps.as_mut(),
        mock_env(),
        IbcChannelOpenMsg::OpenInit {
            channel: test_channel(CHANNEL_A, CHANNEL_B),
        },
    )
    .unwrap();
    assert_eq!(response.unwrap().version, IBC_VERSION);

    let err = ibc_channel_close(
        deps.as_mut(),
        mock_env(),
        IbcChannelCloseMsg::CloseInit {
            channel: test_channel(CHANNEL_A, CHANNEL_B),
        },
    )
    .unwrap_err();
    assert_eq!(err, ContractError::ChannelMayNotBeClosed {});
}

#[test]
fn create_pool_registers_initial_pool_and_emits_packet() {
    let mut chain_a = setup_chain(CHANNEL_A, CHANNEL_B, ATOM);

    let res = execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &[]),
        ExecuteMsg::CreatePool {
            source_channel: CHANNEL_A.to_string(),
            denoms: [ATOM.to_string(), OSMO.to_string()],
            decimals: [6, 6],
            weight: "50:50".to_string(),
            timeout: None,
        },
    )
    .unwrap();

    // a tokenfactory create-denom plus the packet
    assert_eq!(res.messages.len(), 2);
    sent_packet_data(&res);

    let pool = pool_on(&chain_a);
    assert_eq!(pool.status, PoolStatus::Initial);
    assert_eq!(pool.supply.amount, Uint128::zero());
    assert_eq!(pool.asset(ATOM).unwrap().side, PoolSide::Native);
    assert_eq!(pool.asset(OSMO).unwrap().side, PoolSide::Remote);
    assert_eq!(pool.source_channel, CHANNEL_A);
    assert_eq!(pool.counterparty_channel, CHANNEL_B);

    // recreating the same pair is refused
    let err = execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &[]),
        ExecuteMsg::CreatePool {
            source_channel: CHANNEL_A.to_string(),
            denoms: [OSMO.to_string(), ATOM.to_string()],
            decimals: [6, 6],
            weight: "50:50".to_string(),
            timeout: None,
        },
    )
    .unwrap_err();
    assert_eq!(
        err,
        ContractError::PoolAlreadyExists { pool_id: pool_id() }
    );
}

#[test]
fn create_pool_validates_input() {
    let mut chain_a = setup_chain(CHANNEL_A, CHANNEL_B, ATOM);

    let base = |denoms: [&str; 2], weight: &str, channel: &str| ExecuteMsg::CreatePool {
        source_channel: channel.to_string(),
        denoms: [denoms[0].to_string(), denoms[1].to_string()],
        decimals: [6, 6],
        weight: weight.to_string(),
        timeout: None,
    };

    let err = execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &[]),
        base([ATOM, ATOM], "50:50", CHANNEL_A),
    )
    .unwrap_err();
    assert_eq!(err, ContractError::DuplicateDenoms {});

    execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &[]),
        base([ATOM, OSMO], "60:50", CHANNEL_A),
    )
    .unwrap_err();

    execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &[]),
        base([ATOM, OSMO], "50:50", "channel-99"),
    )
    .unwrap_err();

    // neither denom issued locally
    let err = execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &[]),
        base(["ufoo", "ubar"], "50:50", CHANNEL_A),
    )
    .unwrap_err();
    assert_eq!(err, ContractError::InvalidNativeAssignment {});
}

#[test]
fn receive_create_pool_mirrors_with_inverted_sides() {
    let mut chain_a = setup_chain(CHANNEL_A, CHANNEL_B, ATOM);
    let mut chain_b = setup_chain(CHANNEL_B, CHANNEL_A, OSMO);

    let res = execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &[]),
        ExecuteMsg::CreatePool {
            source_channel: CHANNEL_A.to_string(),
            denoms: [ATOM.to_string(), OSMO.to_string()],
            decimals: [6, 6],
            weight: "50:50".to_string(),
            timeout: None,
        },
    )
    .unwrap();

    let recv = deliver(&mut chain_b, sent_packet_data(&res), CHANNEL_A, CHANNEL_B);
    let response: interchainswap::msg::MsgCreatePoolResponse = expect_success(&recv);
    assert_eq!(response.pool_id, pool_id());

    let pool = pool_on(&chain_b);
    assert_eq!(pool.status, PoolStatus::Initial);
    assert_eq!(pool.asset(OSMO).unwrap().side, PoolSide::Native);
    assert_eq!(pool.asset(ATOM).unwrap().side, PoolSide::Remote);
    assert_eq!(pool.source_channel, CHANNEL_B);
    assert_eq!(pool.counterparty_channel, CHANNEL_A);

    assert_mirrored(&chain_a, &chain_b);
}

#[test]
fn single_deposit_requires_seeded_pool() {
    let mut chain_a = setup_chain(CHANNEL_A, CHANNEL_B, ATOM);

    execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &[]),
        ExecuteMsg::CreatePool {
            source_channel: CHANNEL_A.to_string(),
            denoms: [ATOM.to_string(), OSMO.to_string()],
            decimals: [6, 6],
            weight: "50:50".to_string(),
            timeout: None,
        },
    )
    .unwrap();

    let err = execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &coins(1_000_000, ATOM)),
        ExecuteMsg::SingleDeposit {
            pool_id: pool_id(),
            tokens: vec![Coin::new(1_000_000, ATOM)],
            timeout: None,
        },
    )
    .unwrap_err();
    assert_eq!(
        err,
        ContractError::EmptyPoolSide {
            denom: ATOM.to_string()
        }
    );
}

#[test]
fn double_deposit_seeds_and_readies_both_replicas() {
    let (chain_a, chain_b) = seeded_pair();

    let pool_a = pool_on(&chain_a);
    assert_eq!(pool_a.status, PoolStatus::Ready);
    assert_eq!(pool_a.supply.amount, Uint128::new(1_000_000));
    assert_eq!(balance_of(&pool_a, ATOM), Uint128::new(1_000_000));
    assert_eq!(balance_of(&pool_a, OSMO), Uint128::new(1_000_000));

    assert_mirrored(&chain_a, &chain_b);

    // escrow ledgers hold each chain's native leg
    let key_a = escrow::escrow_key(&contract_port(), CHANNEL_A);
    assert_eq!(
        escrow::balance(chain_a.as_ref().storage, &key_a, ATOM),
        Uint128::new(1_000_000)
    );
    let key_b = escrow::escrow_key(&contract_port(), CHANNEL_B);
    assert_eq!(
        escrow::balance(chain_b.as_ref().storage, &key_b, OSMO),
        Uint128::new(1_000_000)
    );
}

#[test]
fn double_deposit_mints_voucher_and_pulls_remote_leg() {
    let mut chain_a = setup_chain(CHANNEL_A, CHANNEL_B, ATOM);
    let mut chain_b = setup_chain(CHANNEL_B, CHANNEL_A, OSMO);
    chain_b.querier.with_account(BOB, 7, Some(bob_pubkey()));
    chain_b.querier.set_balance(BOB, coins(1_000_000, OSMO));

    let res = execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &[]),
        ExecuteMsg::CreatePool {
            source_channel: CHANNEL_A.to_string(),
            denoms: [ATOM.to_string(), OSMO.to_string()],
            decimals: [6, 6],
            weight: "50:50".to_string(),
            timeout: None,
        },
    )
    .unwrap();
    deliver(&mut chain_b, sent_packet_data(&res), CHANNEL_A, CHANNEL_B);

    let res = execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &coins(1_000_000, ATOM)),
        ExecuteMsg::DoubleDeposit {
            pool_id: pool_id(),
            token: Coin::new(1_000_000, ATOM),
            remote_deposit: signed_remote_deposit(7, Coin::new(1_000_000, OSMO)),
            timeout: None,
        },
    )
    .unwrap();
    let recv = deliver(&mut chain_b, sent_packet_data(&res), CHANNEL_A, CHANNEL_B);

    // one authz pull of the remote leg, one voucher mint
    let stargate_urls: Vec<&str> = recv
        .messages
        .iter()
        .filter_map(|m| match &m.msg {
            CosmosMsg::Stargate { type_url, .. } => Some(type_url.as_str()),
            _ => None,
        })
        .collect();
    assert!(stargate_urls.contains(&"/cosmos.authz.v1beta1.MsgExec"));
    assert!(stargate_urls.contains(&"/osmosis.tokenfactory.v1beta1.MsgMint"));
}

#[test]
fn double_deposit_rejects_unfunded_remote_sender() {
    let mut chain_a = setup_chain(CHANNEL_A, CHANNEL_B, ATOM);
    let mut chain_b = setup_chain(CHANNEL_B, CHANNEL_A, OSMO);
    // bob's signature checks out but his account holds no uosmo
    chain_b.querier.with_account(BOB, 7, Some(bob_pubkey()));

    let res = execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &[]),
        ExecuteMsg::CreatePool {
            source_channel: CHANNEL_A.to_string(),
            denoms: [ATOM.to_string(), OSMO.to_string()],
            decimals: [6, 6],
            weight: "50:50".to_string(),
            timeout: None,
        },
    )
    .unwrap();
    deliver(&mut chain_b, sent_packet_data(&res), CHANNEL_A, CHANNEL_B);

    let res = execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &coins(1_000_000, ATOM)),
        ExecuteMsg::DoubleDeposit {
            pool_id: pool_id(),
            token: Coin::new(1_000_000, ATOM),
            remote_deposit: signed_remote_deposit(7, Coin::new(1_000_000, OSMO)),
            timeout: None,
        },
    )
    .unwrap();
    let recv = deliver(&mut chain_b, sent_packet_data(&res), CHANNEL_A, CHANNEL_B);

    let err = expect_error(&recv);
    assert!(err.contains("balance"), "{err}");
    assert_eq!(pool_on(&chain_b).supply.amount, Uint128::zero());
}

#[test]
fn double_deposit_rejects_sequence_mismatch() {
    let mut chain_a = setup_chain(CHANNEL_A, CHANNEL_B, ATOM);
    let mut chain_b = setup_chain(CHANNEL_B, CHANNEL_A, OSMO);
    chain_b.querier.with_account(BOB, 8, Some(bob_pubkey()));

    let res = execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &[]),
        ExecuteMsg::CreatePool {
            source_channel: CHANNEL_A.to_string(),
            denoms: [ATOM.to_string(), OSMO.to_string()],
            decimals: [6, 6],
            weight: "50:50".to_string(),
            timeout: None,
        },
    )
    .unwrap();
    deliver(&mut chain_b, sent_packet_data(&res), CHANNEL_A, CHANNEL_B);

    let res = execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &coins(1_000_000, ATOM)),
        ExecuteMsg::DoubleDeposit {
            pool_id: pool_id(),
            token: Coin::new(1_000_000, ATOM),
            remote_deposit: signed_remote_deposit(7, Coin::new(1_000_000, OSMO)),
            timeout: None,
        },
    )
    .unwrap();
    let recv = deliver(&mut chain_b, sent_packet_data(&res), CHANNEL_A, CHANNEL_B);

    let err = expect_error(&recv);
    assert!(err.contains("sequence mismatch"), "{err}");
    // the mirror pool stays unseeded
    assert_eq!(pool_on(&chain_b).supply.amount, Uint128::zero());
}

#[test]
fn double_deposit_rejects_forged_signature() {
    let mut chain_a = setup_chain(CHANNEL_A, CHANNEL_B, ATOM);
    let mut chain_b = setup_chain(CHANNEL_B, CHANNEL_A, OSMO);
    chain_b.querier.with_account(BOB, 7, Some(bob_pubkey()));

    let res = execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &[]),
        ExecuteMsg::CreatePool {
            source_channel: CHANNEL_A.to_string(),
            denoms: [ATOM.to_string(), OSMO.to_string()],
            decimals: [6, 6],
            weight: "50:50".to_string(),
            timeout: None,
        },
    )
    .unwrap();
    deliver(&mut chain_b, sent_packet_data(&res), CHANNEL_A, CHANNEL_B);

    // signed over a different token amount than the one in the message
    let mut forged = signed_remote_deposit(7, Coin::new(500, OSMO));
    forged.token = Coin::new(1_000_000, OSMO);

    let res = execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &coins(1_000_000, ATOM)),
        ExecuteMsg::DoubleDeposit {
            pool_id: pool_id(),
            token: Coin::new(1_000_000, ATOM),
            remote_deposit: forged,
            timeout: None,
        },
    )
    .unwrap();
    let recv = deliver(&mut chain_b, sent_packet_data(&res), CHANNEL_A, CHANNEL_B);

    let err = expect_error(&recv);
    assert!(err.contains("signature"), "{err}");
}

#[test]
fn single_deposit_flow_grows_both_replicas() {
    let (mut chain_a, mut chain_b) = seeded_pair();

    // P = 1e6·(sqrt(1 + 210000/1e6) − 1) = 1e5 up to rounding
    let res = execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &coins(210_000, ATOM)),
        ExecuteMsg::SingleDeposit {
            pool_id: pool_id(),
            tokens: vec![Coin::new(210_000, ATOM)],
            timeout: None,
        },
    )
    .unwrap();
    let data = sent_packet_data(&res);

    let recv = deliver(&mut chain_b, data.clone(), CHANNEL_A, CHANNEL_B);
    let response: interchainswap::msg::MsgSingleDepositResponse = expect_success(&recv);
    let issued = response.pool_token.amount;
    assert!(issued.abs_diff(Uint128::new(100_000)) <= Uint128::new(1));

    let ack_res = ack_back(
        &mut chain_a,
        data,
        recv.acknowledgement,
        CHANNEL_A,
        CHANNEL_B,
    );
    // LP mints to the local sender on ack
    assert!(ack_res.messages.iter().any(|m| matches!(
        &m.msg,
        CosmosMsg::Stargate { type_url, .. }
            if type_url == "/osmosis.tokenfactory.v1beta1.MsgMint"
    )));

    let pool_a = pool_on(&chain_a);
    assert_eq!(
        pool_a.supply.amount,
        Uint128::new(1_000_000) + issued
    );
    assert_eq!(balance_of(&pool_a, ATOM), Uint128::new(1_210_000));
    assert_mirrored(&chain_a, &chain_b);
}

#[test]
fn left_swap_flow_matches_scenario_values() {
    let (mut chain_a, mut chain_b) = seeded_pair();

    let res = execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &coins(100_000, ATOM)),
        ExecuteMsg::LeftSwap {
            token_in: Coin::new(100_000, ATOM),
            token_out: Coin::new(90_000, OSMO),
            slippage: 100,
            recipient: RECIPIENT.to_string(),
            timeout: None,
        },
    )
    .unwrap();
    let data = sent_packet_data(&res);

    let recv = deliver(&mut chain_b, data.clone(), CHANNEL_A, CHANNEL_B);
    let response: interchainswap::msg::MsgSwapResponse = expect_success(&recv);
    assert_eq!(response.tokens[0], Coin::new(90_661, OSMO));

    // the recipient is paid from chain B's escrow
    assert!(recv.messages.iter().any(|m| matches!(
        &m.msg,
        CosmosMsg::Bank(cosmwasm_std::BankMsg::Send { to_address, amount })
            if to_address == RECIPIENT && amount == &coins(90_661, OSMO)
    )));

    let pool_b = pool_on(&chain_b);
    assert_eq!(balance_of(&pool_b, ATOM), Uint128::new(1_100_000));
    assert_eq!(balance_of(&pool_b, OSMO), Uint128::new(909_339));

    ack_back(
        &mut chain_a,
        data,
        recv.acknowledgement,
        CHANNEL_A,
        CHANNEL_B,
    );
    assert_mirrored(&chain_a, &chain_b);

    // the swap input stays escrowed on the initiator
    let key_a = escrow::escrow_key(&contract_port(), CHANNEL_A);
    assert_eq!(
        escrow::balance(chain_a.as_ref().storage, &key_a, ATOM),
        Uint128::new(1_100_000)
    );
}

#[test]
fn left_swap_slippage_rejection_refunds_escrow() {
    let (mut chain_a, mut chain_b) = seeded_pair();
    let key_a = escrow::escrow_key(&contract_port(), CHANNEL_A);
    let escrowed_before = escrow::balance(chain_a.as_ref().storage, &key_a, ATOM);

    // actual out will be 90661, the floor demands at least 99500
    let res = execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &coins(100_000, ATOM)),
        ExecuteMsg::LeftSwap {
            token_in: Coin::new(100_000, ATOM),
            token_out: Coin::new(100_000, OSMO),
            slippage: 50,
            recipient: RECIPIENT.to_string(),
            timeout: None,
        },
    )
    .unwrap();
    let data = sent_packet_data(&res);

    let recv = deliver(&mut chain_b, data.clone(), CHANNEL_A, CHANNEL_B);
    let err = expect_error(&recv);
    assert!(err.contains("slippage"), "{err}");

    // chain B's pool is untouched behind the error ack
    assert_eq!(balance_of(&pool_on(&chain_b), ATOM), Uint128::new(1_000_000));

    let ack_res = ack_back(
        &mut chain_a,
        data,
        recv.acknowledgement,
        CHANNEL_A,
        CHANNEL_B,
    );
    // the full input is returned to the sender
    assert!(ack_res.messages.iter().any(|m| matches!(
        &m.msg,
        CosmosMsg::Bank(cosmwasm_std::BankMsg::Send { to_address, amount })
            if to_address == ALICE && amount == &coins(100_000, ATOM)
    )));
    assert_eq!(
        escrow::balance(chain_a.as_ref().storage, &key_a, ATOM),
        escrowed_before
    );
    assert_eq!(balance_of(&pool_on(&chain_a), ATOM), Uint128::new(1_000_000));
}

#[test]
fn timeout_refunds_escrow_and_leaves_pool_untouched() {
    let (mut chain_a, _chain_b) = seeded_pair();
    let key_a = escrow::escrow_key(&contract_port(), CHANNEL_A);
    let escrowed_before = escrow::balance(chain_a.as_ref().storage, &key_a, ATOM);

    let res = execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &coins(100_000, ATOM)),
        ExecuteMsg::LeftSwap {
            token_in: Coin::new(100_000, ATOM),
            token_out: Coin::new(90_000, OSMO),
            slippage: 100,
            recipient: RECIPIENT.to_string(),
            timeout: None,
        },
    )
    .unwrap();
    let data = sent_packet_data(&res);

    let timeout_res = ibc_packet_timeout(
        chain_a.as_mut(),
        mock_env(),
        IbcPacketTimeoutMsg::new(
            packet(data, CHANNEL_A, CHANNEL_B),
            Addr::unchecked("relayer"),
        ),
    )
    .unwrap();

    assert!(timeout_res.messages.iter().any(|m| matches!(
        &m.msg,
        CosmosMsg::Bank(cosmwasm_std::BankMsg::Send { to_address, amount })
            if to_address == ALICE && amount == &coins(100_000, ATOM)
    )));
    assert_eq!(
        escrow::balance(chain_a.as_ref().storage, &key_a, ATOM),
        escrowed_before
    );
    assert_eq!(balance_of(&pool_on(&chain_a), ATOM), Uint128::new(1_000_000));
}

#[test]
fn right_swap_flow_pays_exact_output() {
    let (mut chain_a, mut chain_b) = seeded_pair();

    let res = execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &coins(60_000, ATOM)),
        ExecuteMsg::RightSwap {
            token_in: Coin::new(60_000, ATOM),
            token_out: Coin::new(50_000, OSMO),
            slippage: 1_500,
            recipient: RECIPIENT.to_string(),
            timeout: None,
        },
    )
    .unwrap();
    let data = sent_packet_data(&res);

    let recv = deliver(&mut chain_b, data.clone(), CHANNEL_A, CHANNEL_B);
    let response: interchainswap::msg::MsgSwapResponse = expect_success(&recv);
    assert_eq!(response.tokens[0], Coin::new(50_000, OSMO));

    assert!(recv.messages.iter().any(|m| matches!(
        &m.msg,
        CosmosMsg::Bank(cosmwasm_std::BankMsg::Send { to_address, amount })
            if to_address == RECIPIENT && amount == &coins(50_000, OSMO)
    )));

    ack_back(
        &mut chain_a,
        data,
        recv.acknowledgement,
        CHANNEL_A,
        CHANNEL_B,
    );
    assert_mirrored(&chain_a, &chain_b);

    let pool_a = pool_on(&chain_a);
    assert_eq!(balance_of(&pool_a, ATOM), Uint128::new(1_060_000));
    assert_eq!(balance_of(&pool_a, OSMO), Uint128::new(950_000));
}

#[test]
fn right_swap_rejects_insufficient_commitment() {
    let (mut chain_a, mut chain_b) = seeded_pair();

    // ~52.8k ATOM is required to buy 50k OSMO; committing 40k cannot cover it
    let res = execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &coins(40_000, ATOM)),
        ExecuteMsg::RightSwap {
            token_in: Coin::new(40_000, ATOM),
            token_out: Coin::new(50_000, OSMO),
            slippage: 1_000,
            recipient: RECIPIENT.to_string(),
            timeout: None,
        },
    )
    .unwrap();

    let recv = deliver(&mut chain_b, sent_packet_data(&res), CHANNEL_A, CHANNEL_B);
    let err = expect_error(&recv);
    assert!(err.contains("slippage"), "{err}");
}

#[test]
fn withdraw_flow_redeems_native_side() {
    let (mut chain_a, mut chain_b) = seeded_pair();
    let voucher_denom = lp_denom(MOCK_CONTRACT_ADDR, &pool_id());

    let res = execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &coins(100_000, voucher_denom.clone())),
        ExecuteMsg::Withdraw {
            pool_coin: Coin {
                denom: pool_id(),
                amount: Uint128::new(100_000),
            },
            denom_out: ATOM.to_string(),
            timeout: None,
        },
    )
    .unwrap();
    let data = sent_packet_data(&res);

    let recv = deliver(&mut chain_b, data.clone(), CHANNEL_A, CHANNEL_B);
    let response: interchainswap::msg::MsgWithdrawResponse = expect_success(&recv);
    // out = 1e6·(1 − 0.9²) = 190000
    assert_eq!(response.tokens[0], Coin::new(190_000, ATOM));

    let ack_res = ack_back(
        &mut chain_a,
        data,
        recv.acknowledgement,
        CHANNEL_A,
        CHANNEL_B,
    );

    // the redeemed voucher burns and the output leaves escrow
    assert!(ack_res.messages.iter().any(|m| matches!(
        &m.msg,
        CosmosMsg::Stargate { type_url, .. }
            if type_url == "/osmosis.tokenfactory.v1beta1.MsgBurn"
    )));
    assert!(ack_res.messages.iter().any(|m| matches!(
        &m.msg,
        CosmosMsg::Bank(cosmwasm_std::BankMsg::Send { to_address, amount })
            if to_address == ALICE && amount == &coins(190_000, ATOM)
    )));

    let pool_a = pool_on(&chain_a);
    assert_eq!(pool_a.supply.amount, Uint128::new(900_000));
    assert_eq!(balance_of(&pool_a, ATOM), Uint128::new(810_000));
    assert_mirrored(&chain_a, &chain_b);
}

#[test]
fn withdraw_requires_ready_pool() {
    let mut chain_a = setup_chain(CHANNEL_A, CHANNEL_B, ATOM);

    execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &[]),
        ExecuteMsg::CreatePool {
            source_channel: CHANNEL_A.to_string(),
            denoms: [ATOM.to_string(), OSMO.to_string()],
            decimals: [6, 6],
            weight: "50:50".to_string(),
            timeout: None,
        },
    )
    .unwrap();

    let voucher_denom = lp_denom(MOCK_CONTRACT_ADDR, &pool_id());
    let err = execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &coins(100_000, voucher_denom)),
        ExecuteMsg::Withdraw {
            pool_coin: Coin {
                denom: pool_id(),
                amount: Uint128::new(100_000),
            },
            denom_out: ATOM.to_string(),
            timeout: None,
        },
    )
    .unwrap_err();
    assert_eq!(err, ContractError::PoolNotReady { pool_id: pool_id() });
}

#[test]
fn swap_delegation_validates_sides_and_funds() {
    let (mut chain_a, _chain_b) = seeded_pair();

    // selling the remote denom locally is refused
    let err = execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &coins(100_000, OSMO)),
        ExecuteMsg::LeftSwap {
            token_in: Coin::new(100_000, OSMO),
            token_out: Coin::new(90_000, ATOM),
            slippage: 100,
            recipient: RECIPIENT.to_string(),
            timeout: None,
        },
    )
    .unwrap_err();
    assert_eq!(
        err,
        ContractError::WrongSide {
            denom: OSMO.to_string()
        }
    );

    // declared input must match the attached funds
    execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &coins(90_000, ATOM)),
        ExecuteMsg::LeftSwap {
            token_in: Coin::new(100_000, ATOM),
            token_out: Coin::new(90_000, OSMO),
            slippage: 100,
            recipient: RECIPIENT.to_string(),
            timeout: None,
        },
    )
    .unwrap_err();

    let err = execute(
        chain_a.as_mut(),
        mock_env(),
        mock_info(ALICE, &coins(100_000, ATOM)),
        ExecuteMsg::LeftSwap {
            token_in: Coin::new(100_000, ATOM),
            token_out: Coin::new(90_000, OSMO),
            slippage: 0,
            recipient: RECIPIENT.to_string(),
            timeout: None,
        },
    )
    .unwrap_err();
    assert_eq!(err, ContractError::InvalidSlippage {});
}

#[test]
fn escrowed_amount_query_reflects_ledger() {
    let (chain_a, _chain_b) = seeded_pair();

    let response: interchainswap::msg::EscrowResponse = from_json(
        query(
            chain_a.as_ref(),
            mock_env(),
            QueryMsg::EscrowedAmount {
                channel: CHANNEL_A.to_string(),
                denom: ATOM.to_string(),
            },
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(response.amount, Uint128::new(1_000_000));
}

#[test]
fn pool_queries() {
    let (chain_a, _chain_b) = seeded_pair();

    let pool: InterchainLiquidityPool = from_json(
        query(
            chain_a.as_ref(),
            mock_env(),
            QueryMsg::Pool { pool_id: pool_id() },
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(pool.id, pool_id());

    let pools: interchainswap::msg::PoolsResponse = from_json(
        query(
            chain_a.as_ref(),
            mock_env(),
            QueryMsg::Pools {
                start_after: None,
                limit: None,
            },
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(pools.pools.len(), 1);

    let simulation: interchainswap::msg::SwapSimulationResponse = from_json(
        query(
            chain_a.as_ref(),
            mock_env(),
            QueryMsg::LeftSwapSimulation {
                token_in: Coin::new(100_000, ATOM),
                denom_out: OSMO.to_string(),
            },
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(simulation.token, Coin::new(90_661, OSMO));
}

proptest! {
    #[test]
    fn pool_id_determinism(denom_a in "[a-z]{3,12}", denom_b in "[a-z]{3,12}") {
        prop_assume!(denom_a != denom_b);
        let fwd = generate_pool_id(&[denom_a.clone(), denom_b.clone()]);
        let rev = generate_pool_id(&[denom_b, denom_a]);
        prop_assert_eq!(fwd, rev);
    }

    #[test]
    fn invariant_never_decreases_across_swaps(
        amounts in proptest::collection::vec(1_000u128..200_000, 1..8),
    ) {
        use crate::amm::{invariant_growth, InterchainMarketMaker};
        use interchainswap::asset::PoolAsset;

        let mut pool = InterchainLiquidityPool::new(
            [
                PoolAsset::new(PoolSide::Native, ATOM, 50, 6),
                PoolAsset::new(PoolSide::Remote, OSMO, 50, 6),
            ],
            CHANNEL_A,
            &contract_port(),
            CHANNEL_B,
        )
        .unwrap();
        pool.assets[0].balance.amount = Uint128::new(1_000_000);
        pool.assets[1].balance.amount = Uint128::new(1_000_000);
        pool.supply.amount = Uint128::new(1_000_000);
        pool.status = PoolStatus::Ready;

        for (i, amount) in amounts.into_iter().enumerate() {
            let before = pool.clone();
            let (denom_in, denom_out) = if i % 2 == 0 { (ATOM, OSMO) } else { (OSMO, ATOM) };

            let amm = InterchainMarketMaker::new(&pool, FEE);
            let out = amm.left_swap(&Coin::new(amount, denom_in), denom_out).unwrap();

            pool.add_balance(denom_in, Uint128::new(amount)).unwrap();
            pool.sub_balance(denom_out, out.amount).unwrap();

            let growth = invariant_growth(&before, &pool).unwrap();
            prop_assert!(
                growth >= cosmwasm_std::Decimal256::one(),
                "invariant decreased on swap {}: {}",
                i,
                growth
            );
        }
    }
}
