//! Domain Models
//!
//! Holdings, prices and derived allocation status for the three-asset
//! portfolio. Uses `rust_decimal` for all monetary values - never use f64 for
//! money! Values still travel as plain JSON numbers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};

/// Fractional gold units (chỉ) per standard unit (lượng)
pub const GOLD_TENTHS_PER_UNIT: Decimal = Decimal::TEN;

/// Largest quantity accepted from a form input (10^18). Inputs above it are
/// capped so that quantity × price × 3 assets stays inside `Decimal`.
pub const MAX_QUANTITY: Decimal = Decimal::from_parts(2_808_348_672, 232_830_643, 0, false, 0);

/// The three tracked asset classes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssetType {
    Gold,
    Savings,
    #[serde(alias = "USDT")]
    Stablecoin,
}

impl AssetType {
    /// Fixed output order of every status and plan
    pub const ALL: [Self; 3] = [Self::Gold, Self::Savings, Self::Stablecoin];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gold => "GOLD",
            Self::Savings => "SAVINGS",
            Self::Stablecoin => "STABLECOIN",
        }
    }

    /// Unit the holding quantity is entered in
    pub const fn unit(self) -> &'static str {
        match self {
            Self::Gold => "chỉ",
            Self::Savings => "VND",
            Self::Stablecoin => "USDT",
        }
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-entered quantities
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetHoldings {
    /// Gold in tenths of the standard unit (chỉ)
    #[serde(with = "rust_decimal::serde::float")]
    pub gold_weight: Decimal,

    /// Cash balance in VND
    #[serde(with = "rust_decimal::serde::float")]
    pub savings_amount: Decimal,

    /// Stablecoin units (USDT)
    #[serde(with = "rust_decimal::serde::float")]
    pub stablecoin_amount: Decimal,

    /// Last save
    pub updated_at: DateTime<Utc>,
}

impl Default for AssetHoldings {
    fn default() -> Self {
        Self::new(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
    }
}

impl AssetHoldings {
    pub fn new(gold_weight: Decimal, savings_amount: Decimal, stablecoin_amount: Decimal) -> Self {
        Self {
            gold_weight,
            savings_amount,
            stablecoin_amount,
            updated_at: Utc::now(),
        }
    }

    /// Build holdings from raw form inputs.
    ///
    /// This is the input-parsing boundary: negative, NaN and infinite inputs
    /// become zero, finite inputs above [`MAX_QUANTITY`] are capped to it.
    /// Nothing downstream clamps again.
    pub fn from_inputs(gold_weight: f64, savings_amount: f64, stablecoin_amount: f64) -> Self {
        Self::new(
            clamp_input(gold_weight),
            clamp_input(savings_amount),
            clamp_input(stablecoin_amount),
        )
    }

    /// Same quantities, new `updated_at`
    #[must_use]
    pub fn stamped(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = at;
        self
    }

    /// Quantity held of `asset`, in its own unit
    pub const fn quantity(&self, asset: AssetType) -> Decimal {
        match asset {
            AssetType::Gold => self.gold_weight,
            AssetType::Savings => self.savings_amount,
            AssetType::Stablecoin => self.stablecoin_amount,
        }
    }

    pub fn is_empty(&self) -> bool {
        AssetType::ALL.iter().all(|a| self.quantity(*a).is_zero())
    }
}

fn clamp_input(value: f64) -> Decimal {
    if !value.is_finite() || value <= 0.0 {
        return Decimal::ZERO;
    }
    Decimal::from_f64(value).map_or(MAX_QUANTITY, |v| v.min(MAX_QUANTITY))
}

/// Current market quotes in VND
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPrices {
    /// Price of one standard unit of gold (lượng = 10 chỉ)
    #[serde(with = "rust_decimal::serde::float")]
    pub gold_price_per_unit: Decimal,

    /// Price of one stablecoin
    #[serde(with = "rust_decimal::serde::float")]
    pub stablecoin_price: Decimal,

    pub timestamp: DateTime<Utc>,
}

impl MarketPrices {
    pub fn new(gold_price_per_unit: Decimal, stablecoin_price: Decimal) -> Self {
        Self {
            gold_price_per_unit,
            stablecoin_price,
            timestamp: Utc::now(),
        }
    }

    /// Same quotes with a fresh timestamp
    #[must_use]
    pub fn refreshed(mut self) -> Self {
        self.timestamp = Utc::now();
        self
    }

    /// Gold price per chỉ, the unit holdings are tracked in
    pub fn gold_price_per_tenth(&self) -> Decimal {
        self.gold_price_per_unit / GOLD_TENTHS_PER_UNIT
    }

    /// VND value of one holding unit of `asset`
    pub fn unit_price(&self, asset: AssetType) -> Decimal {
        match asset {
            AssetType::Gold => self.gold_price_per_tenth(),
            AssetType::Savings => Decimal::ONE,
            AssetType::Stablecoin => self.stablecoin_price,
        }
    }
}

/// Allocation status of one asset
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetStatus {
    #[serde(rename = "type")]
    pub asset: AssetType,

    #[serde(with = "rust_decimal::serde::float")]
    pub current_value: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub current_percentage: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub target_percentage: Decimal,

    /// current - target, signed
    #[serde(with = "rust_decimal::serde::float")]
    pub deviation: Decimal,

    pub is_out_of_balance: bool,
}

/// Derived status of the whole portfolio. Never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioStatus {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_value: Decimal,

    /// Always GOLD, SAVINGS, STABLECOIN
    pub assets: [AssetStatus; 3],
}

impl PortfolioStatus {
    pub fn asset(&self, asset: AssetType) -> &AssetStatus {
        match asset {
            AssetType::Gold => &self.assets[0],
            AssetType::Savings => &self.assets[1],
            AssetType::Stablecoin => &self.assets[2],
        }
    }

    /// True when any asset drifted past the threshold
    pub fn needs_rebalancing(&self) -> bool {
        self.assets.iter().any(|a| a.is_out_of_balance)
    }

    /// Zero total value. Percentages are all zero by definition in this
    /// state, which is not the same as a perfectly balanced portfolio.
    pub fn is_empty(&self) -> bool {
        self.total_value.is_zero()
    }

    pub fn out_of_balance(&self) -> impl Iterator<Item = &AssetStatus> {
        self.assets.iter().filter(|a| a.is_out_of_balance)
    }
}
