use cosmos_sdk_proto::cosmos::authz::v1beta1::MsgExec;
use cosmos_sdk_proto::cosmos::bank::v1beta1::MsgSend;
use cosmwasm_std::{Binary, Coin, CosmosMsg};
use prost::Message;

use crate::token_factory::ProtoCoin;

const MSG_EXEC_TYPE_URL: &str = "/cosmos.authz.v1beta1.MsgExec";
const MSG_SEND_TYPE_URL: &str = "/cosmos.bank.v1beta1.MsgSend";

/// Builds an authz-exec bank transfer pulling `coin` from `owner` to
/// `recipient`, executed under a grant the owner gave to `grantee`.
///
/// The contract uses this to collect the remote leg of a double deposit:
/// the leg is signed by the remote sender but charged on this chain, where
/// a plain `BankMsg` could only spend the contract's own balance.
pub fn authz_send_msg(
    grantee: impl Into<String>,
    owner: impl Into<String>,
    recipient: impl Into<String>,
    coin: Coin,
) -> CosmosMsg {
    let send = MsgSend {
        from_address: owner.into(),
        to_address: recipient.into(),
        amount: vec![ProtoCoin {
            denom: coin.denom,
            amount: coin.amount.to_string(),
        }],
    };

    let exec = MsgExec {
        grantee: grantee.into(),
        msgs: vec![prost_types::Any {
            type_url: MSG_SEND_TYPE_URL.to_string(),
            value: send.encode_to_vec(),
        }],
    };

    CosmosMsg::Stargate {
        type_url: MSG_EXEC_TYPE_URL.to_string(),
        value: Binary::from(exec.encode_to_vec()),
    }
}
