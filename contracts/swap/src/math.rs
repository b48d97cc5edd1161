use cosmwasm_std::{Decimal256, Fraction, Uint128, Uint256};

use crate::error::ContractError;

/// Series terms below this threshold no longer move results at token scale.
/// 1e-16 in the 18-decimal fixed-point representation.
const POW_PRECISION: Decimal256 = Decimal256::raw(100);

/// Raises `base > 0` to an arbitrary non-negative fixed-point power.
///
/// The integer part of the exponent is applied by repeated multiplication,
/// the fractional part through [`pow_approx`]. Bases of 2 and above are
/// folded into `(0, 2)` through the reciprocal, which keeps the series
/// argument inside its convergence radius. All arithmetic is exact
/// 18-decimal fixed point, so replicas agree bit for bit.
pub fn pow(base: Decimal256, exp: Decimal256) -> Result<Decimal256, ContractError> {
    if base.is_zero() {
        return Err(ContractError::MathDomain {});
    }

    let two = Decimal256::percent(200);
    if base >= two {
        let inverted = pow(base.inv().ok_or(ContractError::MathDomain {})?, exp)?;
        return inverted.inv().ok_or(ContractError::MathDomain {});
    }

    let whole = exp.to_uint_floor();
    let frac = exp - Decimal256::from_ratio(whole, 1u8);

    let mut result = int_pow(base, whole)?;
    if !frac.is_zero() {
        result = result
            .checked_mul(pow_approx(base, frac)?)
            .map_err(|_| ContractError::MathDomain {})?;
    }

    Ok(result)
}

/// `base` raised to a small non-negative integer power.
fn int_pow(base: Decimal256, exp: Uint256) -> Result<Decimal256, ContractError> {
    let mut result = Decimal256::one();
    let mut remaining = exp;
    while !remaining.is_zero() {
        result = result
            .checked_mul(base)
            .map_err(|_| ContractError::MathDomain {})?;
        remaining -= Uint256::one();
    }
    Ok(result)
}

/// Binomial-series approximation of `base^exp` for `base ∈ (0, 2)` and
/// `exp ∈ (0, 1)`:
///
/// `(1 + x)^a = 1 + a·x + a(a−1)/2!·x² + …` with `x = base − 1`.
///
/// Terms are generated iteratively and the loop stops once a term drops
/// below [`POW_PRECISION`]; since every step is exact rational fixed-point
/// arithmetic the result is deterministic across replicas.
fn pow_approx(base: Decimal256, exp: Decimal256) -> Result<Decimal256, ContractError> {
    if exp.is_zero() {
        return Ok(Decimal256::one());
    }

    let one = Decimal256::one();
    let (x, x_neg) = sub_sign(base, one);

    let mut term = one;
    let mut sum = one;
    let mut negative = false;
    let mut i: u64 = 1;

    while term >= POW_PRECISION {
        let big_k = Decimal256::from_ratio(i, 1u8);

        // c = |a - (k - 1)|, the next factor of the falling factorial
        let (c, c_neg) = sub_sign(exp, big_k - one);
        term = term
            .checked_mul(c)
            .and_then(|t| t.checked_mul(x))
            .map_err(|_| ContractError::MathDomain {})?
            .checked_div(big_k)
            .map_err(|_| ContractError::MathDomain {})?;
        if term.is_zero() {
            break;
        }

        if x_neg {
            negative = !negative;
        }
        if c_neg {
            negative = !negative;
        }
        if negative {
            sum = sum
                .checked_sub(term)
                .map_err(|_| ContractError::MathDomain {})?;
        } else {
            sum = sum
                .checked_add(term)
                .map_err(|_| ContractError::MathDomain {})?;
        }

        i += 1;
    }

    Ok(sum)
}

/// `|a - b|` together with the sign of the difference.
fn sub_sign(a: Decimal256, b: Decimal256) -> (Decimal256, bool) {
    if a >= b {
        (a - b, false)
    } else {
        (b - a, true)
    }
}

/// Converts an integer amount into the fixed-point domain.
pub fn to_decimal(amount: Uint128) -> Decimal256 {
    Decimal256::from_ratio(amount, 1u8)
}

/// Fixed point to integer, rounded toward zero. Used for amounts leaving
/// the pool and for LP issuance.
pub fn floor_to_uint128(value: Decimal256) -> Result<Uint128, ContractError> {
    Ok(value.to_uint_floor().try_into()?)
}

/// Fixed point to integer, rounded away from zero. Used for amounts the
/// user owes the pool.
pub fn ceil_to_uint128(value: Decimal256) -> Result<Uint128, ContractError> {
    Ok(value.to_uint_ceil().try_into()?)
}
