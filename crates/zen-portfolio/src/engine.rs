//! Portfolio Engine
//!
//! Pure mapping from (holdings, prices) to allocation status against the
//! equal-weight target, plus the trades that would restore it. No I/O, no
//! hidden state: the same inputs always give the same output.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::{AssetHoldings, AssetStatus, AssetType, MarketPrices, PortfolioStatus};

/// Equal-weight target share per asset, in percent. Deliberately not
/// renormalized: the three targets sum to 99.99.
pub const TARGET_PERCENTAGE: Decimal = Decimal::from_parts(3333, 0, 0, false, 2);

/// Maximum allowed |deviation| in percentage points. Strict: exactly 5 is
/// still balanced.
pub const REBALANCE_THRESHOLD: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Compute the allocation status of a portfolio.
///
/// ```text
/// gold value       = goldWeight × (goldPricePerUnit / 10)
/// savings value    = savingsAmount
/// stablecoin value = stablecoinAmount × stablecoinPrice
/// percentage       = value / total × 100      (0 when total is 0)
/// deviation        = percentage − 33.33
/// out of balance   = |deviation| > 5
/// ```
///
/// Values and the total saturate at the `Decimal` bounds instead of
/// overflowing, so every input has a status.
pub fn compute_status(holdings: &AssetHoldings, prices: &MarketPrices) -> PortfolioStatus {
    let values =
        AssetType::ALL.map(|asset| (asset, holdings.quantity(asset).saturating_mul(prices.unit_price(asset))));
    let total_value = values
        .iter()
        .fold(Decimal::ZERO, |total, (_, value)| total.saturating_add(*value));

    if total_value.is_zero() {
        return empty_status();
    }

    PortfolioStatus {
        total_value,
        assets: values.map(|(asset, value)| classify(asset, value, total_value)),
    }
}

fn classify(asset: AssetType, value: Decimal, total_value: Decimal) -> AssetStatus {
    // value <= total for non-negative inputs, so the share never overflows
    let current_percentage = (value / total_value).saturating_mul(Decimal::ONE_HUNDRED);
    let deviation = current_percentage - TARGET_PERCENTAGE;

    AssetStatus {
        asset,
        current_value: value,
        current_percentage,
        target_percentage: TARGET_PERCENTAGE,
        deviation,
        is_out_of_balance: deviation.abs() > REBALANCE_THRESHOLD,
    }
}

/// Status of a zero-value portfolio: everything zero, nothing flagged
fn empty_status() -> PortfolioStatus {
    PortfolioStatus {
        total_value: Decimal::ZERO,
        assets: AssetType::ALL.map(|asset| AssetStatus {
            asset,
            current_value: Decimal::ZERO,
            current_percentage: Decimal::ZERO,
            target_percentage: TARGET_PERCENTAGE,
            deviation: Decimal::ZERO,
            is_out_of_balance: false,
        }),
    }
}

/// What to do with one asset to get back to target
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RebalanceAction {
    Buy,
    Sell,
    Hold,
}

/// Suggested adjustment for one asset, in VND
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalanceTrade {
    #[serde(rename = "type")]
    pub asset: AssetType,

    pub action: RebalanceAction,

    /// target value - current value (positive = buy)
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

/// Trades that bring every out-of-balance asset back to the target share of
/// the current total. Balanced assets are `HOLD` but still report their gap.
pub fn rebalance_plan(status: &PortfolioStatus) -> [RebalanceTrade; 3] {
    let target_value = status.total_value / Decimal::ONE_HUNDRED * TARGET_PERCENTAGE;

    status.assets.each_ref().map(|a| {
        let amount = target_value.saturating_sub(a.current_value);
        let action = if !a.is_out_of_balance {
            RebalanceAction::Hold
        } else if amount.is_sign_positive() {
            RebalanceAction::Buy
        } else {
            RebalanceAction::Sell
        };

        RebalanceTrade { asset: a.asset, action, amount }
    })
}
