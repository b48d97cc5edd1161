use cosmwasm_std::{BankMsg, Coin, CosmosMsg, Storage, Uint128};
use sha2::{Digest, Sha256};

use crate::error::ContractError;
use crate::state::ESCROWS;

/// Deterministic escrow subaccount for a channel end. Funds themselves sit
/// in the contract's bank balance; this key partitions them per channel in
/// the escrow ledger.
pub fn escrow_key(port: &str, channel: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(port.as_bytes());
    hasher.update(b"/");
    hasher.update(channel.as_bytes());
    hex::encode(hasher.finalize())
}

/// Records `coin` as escrowed under the subaccount. The matching funds must
/// already be in the contract's balance (attached to the message or pulled
/// by an authz transfer in the same transaction).
pub fn lock(
    storage: &mut dyn Storage,
    key: &str,
    coin: &Coin,
) -> Result<Uint128, ContractError> {
    let updated = ESCROWS
        .may_load(storage, (key, &coin.denom))?
        .unwrap_or_default()
        .checked_add(coin.amount)?;
    ESCROWS.save(storage, (key, &coin.denom), &updated)?;
    Ok(updated)
}

/// Releases `coin` from the subaccount, failing if less is escrowed.
/// The caller pairs this with the bank message that actually moves funds.
pub fn release(
    storage: &mut dyn Storage,
    key: &str,
    coin: &Coin,
) -> Result<Uint128, ContractError> {
    let held = ESCROWS
        .may_load(storage, (key, &coin.denom))?
        .unwrap_or_default();
    let updated = held
        .checked_sub(coin.amount)
        .map_err(|_| ContractError::InsufficientEscrow {
            denom: coin.denom.clone(),
        })?;

    if updated.is_zero() {
        ESCROWS.remove(storage, (key, &coin.denom));
    } else {
        ESCROWS.save(storage, (key, &coin.denom), &updated)?;
    }
    Ok(updated)
}

/// Releases `coin` and builds the bank transfer paying it to `recipient`.
pub fn pay_out(
    storage: &mut dyn Storage,
    key: &str,
    coin: Coin,
    recipient: impl Into<String>,
) -> Result<CosmosMsg, ContractError> {
    release(storage, key, &coin)?;
    Ok(CosmosMsg::Bank(BankMsg::Send {
        to_address: recipient.into(),
        amount: vec![coin],
    }))
}

/// Currently escrowed amount for a subaccount and denomination.
pub fn balance(storage: &dyn Storage, key: &str, denom: &str) -> Uint128 {
    ESCROWS
        .may_load(storage, (key, denom))
        .unwrap_or_default()
        .unwrap_or_default()
}
