#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{
    attr, from_json, Binary, DepsMut, Env, Ibc3ChannelOpenResponse, IbcBasicResponse, IbcChannel,
    IbcChannelCloseMsg, IbcChannelConnectMsg, IbcChannelOpenMsg, IbcChannelOpenResponse, IbcOrder,
    IbcPacketAckMsg, IbcPacketReceiveMsg, IbcPacketTimeoutMsg, IbcReceiveResponse, Never,
};

use interchainswap::packet::{ack_fail, InterchainSwapAck, InterchainSwapPacketData, IBC_VERSION};

use crate::error::ContractError;
use crate::relay;
use crate::state::{ChannelInfo, CHANNELS};

/// The handshake only admits ordered channels speaking exactly our version;
/// mirrored pools rely on packets applying in emission order.
fn validate_order_and_version(
    channel: &IbcChannel,
    counterparty_version: Option<&str>,
) -> Result<(), ContractError> {
    if channel.order != IbcOrder::Ordered {
        return Err(ContractError::InvalidChannelOrder {});
    }
    if channel.version != IBC_VERSION {
        return Err(ContractError::InvalidChannelVersion {
            expected: IBC_VERSION.to_string(),
            actual: channel.version.clone(),
        });
    }
    if let Some(version) = counterparty_version {
        if version != IBC_VERSION {
            return Err(ContractError::InvalidChannelVersion {
                expected: IBC_VERSION.to_string(),
                actual: version.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn ibc_channel_open(
    _deps: DepsMut,
    _env: Env,
    msg: IbcChannelOpenMsg,
) -> Result<IbcChannelOpenResponse, ContractError> {
    validate_order_and_version(msg.channel(), msg.counterparty_version())?;

    Ok(Some(Ibc3ChannelOpenResponse {
        version: IBC_VERSION.to_string(),
    }))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn ibc_channel_connect(
    deps: DepsMut,
    _env: Env,
    msg: IbcChannelConnectMsg,
) -> Result<IbcBasicResponse, ContractError> {
    let channel = msg.channel();
    validate_order_and_version(channel, msg.counterparty_version())?;

    let info = ChannelInfo {
        id: channel.endpoint.channel_id.clone(),
        port_id: channel.endpoint.port_id.clone(),
        counterparty_endpoint: channel.counterparty_endpoint.clone(),
        connection_id: channel.connection_id.clone(),
    };
    CHANNELS.save(deps.storage, &info.id, &info)?;

    Ok(IbcBasicResponse::new().add_attributes(vec![
        attr("action", "ibc_connect"),
        attr("channel_id", &info.id),
    ]))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn ibc_channel_close(
    _deps: DepsMut,
    _env: Env,
    _msg: IbcChannelCloseMsg,
) -> Result<IbcBasicResponse, ContractError> {
    // a closed channel would strand every pool mirrored over it
    Err(ContractError::ChannelMayNotBeClosed {})
}

/// Handler errors must still produce a committed acknowledgement, so they
/// are folded into an error ack instead of aborting the transaction.
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn ibc_packet_receive(
    deps: DepsMut,
    env: Env,
    msg: IbcPacketReceiveMsg,
) -> Result<IbcReceiveResponse, Never> {
    match relay::do_packet_receive(deps, &env, &msg.packet) {
        Ok(response) => Ok(response),
        Err(err) => {
            let error = err.to_string();
            let ack = ack_fail(&error).unwrap_or_else(|_| {
                Binary::from(br#"{"error":"failed to encode acknowledgement"}"#.as_slice())
            });
            Ok(IbcReceiveResponse::new().set_ack(ack).add_attributes(vec![
                attr("action", "receive"),
                attr("success", "false"),
                attr("error", error),
            ]))
        }
    }
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn ibc_packet_ack(
    deps: DepsMut,
    env: Env,
    msg: IbcPacketAckMsg,
) -> Result<IbcBasicResponse, ContractError> {
    let ack: InterchainSwapAck = from_json(&msg.acknowledgement.data)?;
    let data: InterchainSwapPacketData = from_json(&msg.original_packet.data)?;

    match ack {
        InterchainSwapAck::Result(response) => {
            relay::on_acknowledged(deps, &env, &msg.original_packet, data, response)
        }
        InterchainSwapAck::Error(error) => relay::refund(deps, &env, &msg.original_packet, data)
            .map(|response| response.add_attribute("error", error)),
    }
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn ibc_packet_timeout(
    deps: DepsMut,
    env: Env,
    msg: IbcPacketTimeoutMsg,
) -> Result<IbcBasicResponse, ContractError> {
    let data: InterchainSwapPacketData = from_json(&msg.packet.data)?;

    relay::refund(deps, &env, &msg.packet, data)
        .map(|response| response.add_attribute("timeout", "true"))
}
