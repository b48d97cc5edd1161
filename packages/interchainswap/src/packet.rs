use cosmwasm_schema::cw_serde;
use cosmwasm_std::{from_json, to_json_binary, Binary, StdResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Version string the channel handshake requires on both ends.
pub const IBC_VERSION: &str = "ics101-1";
/// Port this module binds at instantiation.
pub const IBC_PORT: &str = "interchainswap";
/// Relative packet timeout applied when the caller does not supply one.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 600;

/// Type tag carried by every packet so the counterparty can dispatch
/// (and reject) by message kind.
#[cw_serde]
pub enum SwapMessageType {
    CreatePool,
    SingleDeposit,
    DoubleDeposit,
    Withdraw,
    LeftSwap,
    RightSwap,
}

/// The typed envelope travelling over the ordered channel. `data` is the
/// canonical JSON encoding of the request named by `msg_type`.
#[cw_serde]
pub struct InterchainSwapPacketData {
    #[serde(rename = "type")]
    pub msg_type: SwapMessageType,
    pub data: Binary,
}

impl InterchainSwapPacketData {
    pub fn encode<T: Serialize>(msg_type: SwapMessageType, msg: &T) -> StdResult<Self> {
        Ok(Self {
            msg_type,
            data: to_json_binary(msg)?,
        })
    }

    pub fn decode<T: DeserializeOwned>(&self) -> StdResult<T> {
        from_json(&self.data)
    }
}

/// Acknowledgement envelope, ics20-shaped: a typed response on success,
/// a bare string on failure.
#[cw_serde]
pub enum InterchainSwapAck {
    Result(Binary),
    Error(String),
}

/// Serializes a typed response into a success acknowledgement.
pub fn ack_success<T: Serialize>(response: &T) -> StdResult<Binary> {
    to_json_binary(&InterchainSwapAck::Result(to_json_binary(response)?))
}

/// Serializes an error string into a failure acknowledgement.
pub fn ack_fail(err: impl Into<String>) -> StdResult<Binary> {
    to_json_binary(&InterchainSwapAck::Error(err.into()))
}
