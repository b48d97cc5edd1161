use cosmwasm_std::{Coin, Decimal256, Uint128, Uint256};

use interchainswap::asset::TOTAL_WEIGHT;
use interchainswap::msg::BASIS_POINTS;
use interchainswap::pool::InterchainLiquidityPool;

use crate::error::ContractError;
use crate::math::{ceil_to_uint128, floor_to_uint128, pow, to_decimal};

/// Stateless weighted-pool pricing over a pool snapshot. Every function is
/// pure; callers persist the balance/supply deltas themselves so the two
/// replicas can apply identical updates at different points of the packet
/// round trip.
pub struct InterchainMarketMaker<'a> {
    pub pool: &'a InterchainLiquidityPool,
    /// Fee rate in basis points
    pub fee_rate: u64,
}

impl<'a> InterchainMarketMaker<'a> {
    pub fn new(pool: &'a InterchainLiquidityPool, fee_rate: u64) -> Self {
        Self { pool, fee_rate }
    }

    /// Spot price of `denom_out` in units of `denom_in`:
    /// `(B_in / w_in) / (B_out / w_out)`.
    pub fn market_price(
        &self,
        denom_in: &str,
        denom_out: &str,
    ) -> Result<Decimal256, ContractError> {
        let asset_in = self.pool.asset(denom_in)?;
        let asset_out = self.pool.asset(denom_out)?;

        if asset_out.balance.amount.is_zero() {
            return Err(ContractError::EmptyPoolSide {
                denom: denom_out.to_string(),
            });
        }

        let numerator =
            Uint256::from(asset_in.balance.amount) * Uint256::from(asset_out.weight);
        let denominator =
            Uint256::from(asset_out.balance.amount) * Uint256::from(asset_in.weight);

        Decimal256::checked_from_ratio(numerator, denominator)
            .map_err(|_| ContractError::MathDomain {})
    }

    /// LP issued for a single-sided deposit:
    /// `P = S · ((1 + A/B)^w − 1)`, rounded toward zero.
    pub fn deposit_single(&self, token: &Coin) -> Result<Coin, ContractError> {
        let asset = self.pool.asset(&token.denom)?;

        if token.amount.is_zero() {
            return Err(ContractError::ZeroAmount {});
        }
        if asset.balance.amount.is_zero() || self.pool.supply.amount.is_zero() {
            return Err(ContractError::EmptyPoolSide {
                denom: token.denom.clone(),
            });
        }

        let weight = Decimal256::from_ratio(asset.weight, TOTAL_WEIGHT);
        let ratio = Decimal256::one()
            + Decimal256::from_ratio(token.amount, asset.balance.amount);

        let factor = pow(ratio, weight)?
            .checked_sub(Decimal256::one())
            .map_err(|_| ContractError::MathDomain {})?;
        let issued = floor_to_uint128(
            to_decimal(self.pool.supply.amount)
                .checked_mul(factor)
                .map_err(|_| ContractError::MathDomain {})?,
        )?;

        Ok(Coin {
            denom: self.pool.id.clone(),
            amount: issued,
        })
    }

    /// LP issued for a double-sided deposit, one entry per leg in argument
    /// order. A deposit into an unseeded pool fixes the initial supply at
    /// `max(A_0, A_1)`, split between the legs pro rata by amount with the
    /// rounding remainder assigned to the first leg; afterwards each leg
    /// earns the linear share `S · A_k / B_k`.
    pub fn deposit_double(
        &self,
        tokens: [&Coin; 2],
    ) -> Result<[Coin; 2], ContractError> {
        if tokens[0].amount.is_zero() || tokens[1].amount.is_zero() {
            return Err(ContractError::ZeroAmount {});
        }
        // both legs must name pool denominations
        self.pool.asset(&tokens[0].denom)?;
        self.pool.asset(&tokens[1].denom)?;
        if tokens[0].denom == tokens[1].denom {
            return Err(ContractError::DuplicateDenoms {});
        }

        let supply = self.pool.supply.amount;
        let issued = if supply.is_zero() {
            let total = tokens[0].amount.checked_add(tokens[1].amount)?;
            let seed = tokens[0].amount.max(tokens[1].amount);
            let second = seed.multiply_ratio(tokens[1].amount, total);
            [seed.checked_sub(second)?, second]
        } else {
            let mut out = [Uint128::zero(), Uint128::zero()];
            for (i, token) in tokens.iter().enumerate() {
                let balance = self.pool.asset(&token.denom)?.balance.amount;
                if balance.is_zero() {
                    return Err(ContractError::EmptyPoolSide {
                        denom: token.denom.clone(),
                    });
                }
                out[i] = supply.multiply_ratio(token.amount, balance);
            }
            out
        };

        Ok([
            Coin {
                denom: self.pool.id.clone(),
                amount: issued[0],
            },
            Coin {
                denom: self.pool.id.clone(),
                amount: issued[1],
            },
        ])
    }

    /// Tokens returned for redeeming `redeem` LP against `denom_out`:
    /// `A = B · (1 − (1 − R/S)^{1/w})`, rounded toward zero.
    pub fn withdraw(&self, redeem: &Coin, denom_out: &str) -> Result<Coin, ContractError> {
        let asset = self.pool.asset(denom_out)?;
        let supply = self.pool.supply.amount;

        if redeem.amount.is_zero() {
            return Err(ContractError::ZeroAmount {});
        }
        if redeem.denom != self.pool.supply.denom {
            return Err(ContractError::Std(cosmwasm_std::StdError::generic_err(
                format!("redeem denom {} is not the pool token", redeem.denom),
            )));
        }
        if redeem.amount >= supply {
            return Err(ContractError::InsufficientSupply {});
        }
        if asset.balance.amount.is_zero() {
            return Err(ContractError::EmptyPoolSide {
                denom: denom_out.to_string(),
            });
        }

        let exponent = Decimal256::from_ratio(TOTAL_WEIGHT, asset.weight);
        let kept = Decimal256::one() - Decimal256::from_ratio(redeem.amount, supply);

        let factor = Decimal256::one()
            .checked_sub(pow(kept, exponent)?)
            .map_err(|_| ContractError::MathDomain {})?;
        let amount = floor_to_uint128(
            to_decimal(asset.balance.amount)
                .checked_mul(factor)
                .map_err(|_| ContractError::MathDomain {})?,
        )?;

        Ok(Coin {
            denom: denom_out.to_string(),
            amount,
        })
    }

    /// Out-given-in. The fee is charged on the input first, then
    /// `A_out = B_out · (1 − (B_in / (B_in + A'_in))^{w_in/w_out})`,
    /// rounded toward zero.
    pub fn left_swap(&self, token_in: &Coin, denom_out: &str) -> Result<Coin, ContractError> {
        let asset_in = self.pool.asset(&token_in.denom)?;
        let asset_out = self.pool.asset(denom_out)?;

        if token_in.amount.is_zero() {
            return Err(ContractError::ZeroAmount {});
        }
        if asset_in.balance.amount.is_zero() {
            return Err(ContractError::EmptyPoolSide {
                denom: token_in.denom.clone(),
            });
        }
        if asset_out.balance.amount.is_zero() {
            return Err(ContractError::EmptyPoolSide {
                denom: denom_out.to_string(),
            });
        }

        let amount_after_fee = token_in
            .amount
            .multiply_ratio(BASIS_POINTS - self.fee_rate, BASIS_POINTS);
        if amount_after_fee.is_zero() {
            return Err(ContractError::ZeroAmount {});
        }

        let balance_in = to_decimal(asset_in.balance.amount);
        let new_balance_in = balance_in
            .checked_add(to_decimal(amount_after_fee))
            .map_err(|_| ContractError::MathDomain {})?;
        let exponent = Decimal256::from_ratio(asset_in.weight, asset_out.weight);

        let kept = pow(
            balance_in
                .checked_div(new_balance_in)
                .map_err(|_| ContractError::MathDomain {})?,
            exponent,
        )?;
        let factor = Decimal256::one()
            .checked_sub(kept)
            .map_err(|_| ContractError::MathDomain {})?;
        let amount = floor_to_uint128(
            to_decimal(asset_out.balance.amount)
                .checked_mul(factor)
                .map_err(|_| ContractError::MathDomain {})?,
        )?;

        Ok(Coin {
            denom: denom_out.to_string(),
            amount,
        })
    }

    /// In-given-out. The pre-fee input
    /// `A'_in = B_in · ((B_out / (B_out − A_out))^{w_out/w_in} − 1)` is
    /// rounded away from zero, then grossed up by the fee so the user pays
    /// `A_in = A'_in / (1 − f/10000)`, also away from zero.
    pub fn right_swap(
        &self,
        denom_in: &str,
        token_out: &Coin,
    ) -> Result<Coin, ContractError> {
        let asset_in = self.pool.asset(denom_in)?;
        let asset_out = self.pool.asset(&token_out.denom)?;

        if token_out.amount.is_zero() {
            return Err(ContractError::ZeroAmount {});
        }
        if asset_in.balance.amount.is_zero() {
            return Err(ContractError::EmptyPoolSide {
                denom: denom_in.to_string(),
            });
        }
        if token_out.amount >= asset_out.balance.amount {
            return Err(ContractError::DrainedPool {});
        }

        let balance_out = to_decimal(asset_out.balance.amount);
        let remaining = balance_out - to_decimal(token_out.amount);
        let exponent = Decimal256::from_ratio(asset_out.weight, asset_in.weight);

        let growth = pow(
            balance_out
                .checked_div(remaining)
                .map_err(|_| ContractError::MathDomain {})?,
            exponent,
        )?
        .checked_sub(Decimal256::one())
        .map_err(|_| ContractError::MathDomain {})?;
        let pre_fee = ceil_to_uint128(
            to_decimal(asset_in.balance.amount)
                .checked_mul(growth)
                .map_err(|_| ContractError::MathDomain {})?,
        )?;

        // gross up by the fee, rounding against the user
        let numerator = Uint256::from(pre_fee) * Uint256::from(BASIS_POINTS);
        let denominator = Uint256::from(BASIS_POINTS - self.fee_rate);
        let amount: Uint128 = numerator
            .checked_add(denominator - Uint256::one())
            .map_err(|_| ContractError::MathDomain {})?
            .checked_div(denominator)
            .map_err(|_| ContractError::MathDomain {})?
            .try_into()?;

        Ok(Coin {
            denom: denom_in.to_string(),
            amount,
        })
    }

}

/// Ratio of the weighted product `V = B_0^{w_0/100} · B_1^{w_1/100}`
/// between two snapshots of the same pool:
/// `V_after / V_before = Π (B'_i / B_i)^{w_i/100}`.
///
/// Working on balance ratios keeps the power bases close to one, where the
/// series kernel converges quickly; a result of at least one means the
/// invariant did not decrease.
pub fn invariant_growth(
    before: &InterchainLiquidityPool,
    after: &InterchainLiquidityPool,
) -> Result<Decimal256, ContractError> {
    let mut growth = Decimal256::one();
    for (b, a) in before.assets.iter().zip(after.assets.iter()) {
        if b.balance.amount.is_zero() {
            return Err(ContractError::EmptyPoolSide {
                denom: b.balance.denom.clone(),
            });
        }
        let weight = Decimal256::from_ratio(b.weight, TOTAL_WEIGHT);
        let ratio = Decimal256::checked_from_ratio(a.balance.amount, b.balance.amount)
            .map_err(|_| ContractError::MathDomain {})?;
        growth = growth
            .checked_mul(pow(ratio, weight)?)
            .map_err(|_| ContractError::MathDomain {})?;
    }
    Ok(growth)
}

/// Left-swap slippage guard: the realized output may undershoot the
/// expected output by at most `slippage` basis points.
pub fn assert_left_slippage(
    actual_out: Uint128,
    expected_out: Uint128,
    slippage: u64,
) -> Result<(), ContractError> {
    let floor = expected_out.multiply_ratio(BASIS_POINTS - slippage.min(BASIS_POINTS), BASIS_POINTS);
    if actual_out < floor {
        return Err(ContractError::SlippageExceeded {});
    }
    Ok(())
}

/// Right-swap slippage guard, the symmetric form: the input the user
/// committed may overshoot the computed requirement by at most `slippage`
/// basis points, and must cover it.
pub fn assert_right_slippage(
    committed_in: Uint128,
    required_in: Uint128,
    slippage: u64,
) -> Result<(), ContractError> {
    if committed_in < required_in {
        return Err(ContractError::SlippageExceeded {});
    }
    let ceiling = Uint256::from(required_in)
        .checked_mul(Uint256::from(BASIS_POINTS + slippage))
        .map_err(|_| ContractError::MathDomain {})?;
    if Uint256::from(committed_in) * Uint256::from(BASIS_POINTS) > ceiling {
        return Err(ContractError::SlippageExceeded {});
    }
    Ok(())
}
