use cosmos_sdk_proto::cosmos::auth::v1beta1::{BaseAccount, QueryAccountRequest};
use cosmos_sdk_proto::cosmos::crypto::secp256k1::PubKey;
use cosmwasm_std::{
    to_json_vec, Binary, ContractResult, Empty, QuerierWrapper, QueryRequest, StdError, StdResult,
    SystemResult, Uint128,
};
use prost::Message;

/// gRPC path of the auth module's account query.
const AUTH_ACCOUNT_QUERY_PATH: &str = "/cosmos.auth.v1beta1.Query/Account";

/// A chain account as the auth module reports it: address, replay-protection
/// sequence and (when the account has signed before) its secp256k1 key.
pub struct AccountInfo {
    pub address: String,
    pub sequence: u64,
    pub pubkey: Option<Binary>,
}

/// Returns a native token balance for a specific account.
pub fn query_balance(
    querier: &QuerierWrapper,
    account_addr: impl Into<String>,
    denom: impl Into<String>,
) -> StdResult<Uint128> {
    querier
        .query_balance(account_addr, denom)
        .map(|coin| coin.amount)
}

/// Returns the total chain-wide supply of a denomination.
pub fn query_total_supply(querier: &QuerierWrapper, denom: impl Into<String>) -> StdResult<Uint128> {
    querier.query_supply(denom).map(|coin| coin.amount)
}

/// Whether any of `denom` has been issued on this chain. Used to label a
/// pool asset as native or remote.
pub fn has_supply(querier: &QuerierWrapper, denom: impl Into<String>) -> StdResult<bool> {
    Ok(!query_total_supply(querier, denom)?.is_zero())
}

/// Looks up an account through the auth module. The response travels as raw
/// protobuf, so this goes through `raw_query` rather than the JSON querier.
pub fn query_account(querier: &QuerierWrapper, address: impl Into<String>) -> StdResult<AccountInfo> {
    let address = address.into();
    let request = QueryRequest::<Empty>::Stargate {
        path: AUTH_ACCOUNT_QUERY_PATH.to_string(),
        data: Binary::from(
            QueryAccountRequest {
                address: address.clone(),
            }
            .encode_to_vec(),
        ),
    };

    let raw = to_json_vec(&request)?;
    let bytes = match querier.raw_query(&raw) {
        SystemResult::Err(err) => Err(StdError::generic_err(format!(
            "querier system error: {err}"
        ))),
        SystemResult::Ok(ContractResult::Err(err)) => Err(StdError::generic_err(format!(
            "account query failed: {err}"
        ))),
        SystemResult::Ok(ContractResult::Ok(value)) => Ok(value),
    }?;

    let response =
        cosmos_sdk_proto::cosmos::auth::v1beta1::QueryAccountResponse::decode(bytes.as_slice())
            .map_err(|e| StdError::generic_err(format!("cannot decode account response: {e}")))?;

    let any = response
        .account
        .ok_or_else(|| StdError::generic_err(format!("account {address} not found")))?;
    let account = BaseAccount::decode(any.value.as_slice())
        .map_err(|e| StdError::generic_err(format!("cannot decode account: {e}")))?;

    let pubkey = account
        .pub_key
        .map(|key| {
            PubKey::decode(key.value.as_slice())
                .map(|pk| Binary::from(pk.key))
                .map_err(|e| StdError::generic_err(format!("cannot decode pubkey: {e}")))
        })
        .transpose()?;

    Ok(AccountInfo {
        address: account.address,
        sequence: account.sequence,
        pubkey,
    })
}
