//! 金额换算：内存中用 `Decimal`，数据库中存整数分

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::core::error::CoreError;

pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// 统一为两位小数，零值也输出为 `0.00`
pub fn round_to_cents(amount: Decimal) -> Decimal {
    let mut amount = amount.round_dp(2);
    amount.rescale(2);
    amount
}

pub fn to_cents(amount: Decimal) -> Result<i64, CoreError> {
    (amount.round_dp(2) * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or_else(|| CoreError::BadRequest(format!("金额超出范围: {}", amount)))
}
