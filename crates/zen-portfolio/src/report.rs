//! Status Reports
//!
//! Human-readable rendering of a `PortfolioStatus` for chat delivery, plus the
//! number formatting shared with the advice prompt.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::model::PortfolioStatus;

const RULE: &str = "---------------------------------------";

/// Report language
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Vi,
    En,
}

struct Strings {
    title: &'static str,
    total: &'static str,
    value: &'static str,
    deviation: &'static str,
    notice: &'static str,
    rebalance_needed: &'static str,
    balanced: &'static str,
    answer_in: &'static str,
}

const VI: Strings = Strings {
    title: "BÁO CÁO DANH MỤC ZenWealth",
    total: "Tổng tài sản",
    value: "Giá trị",
    deviation: "Chênh lệch",
    notice: "Thông báo",
    rebalance_needed: "Cần cân bằng lại danh mục!",
    balanced: "Danh mục đang ở trạng thái cân bằng.",
    answer_in: "Lưu ý hãy trả lời bằng tiếng Việt.",
};

const EN: Strings = Strings {
    title: "ZenWealth PORTFOLIO REPORT",
    total: "Total assets",
    value: "Value",
    deviation: "Deviation",
    notice: "Notice",
    rebalance_needed: "Portfolio needs rebalancing!",
    balanced: "Portfolio is balanced.",
    answer_in: "Answer in English.",
};

impl Locale {
    const fn strings(self) -> &'static Strings {
        match self {
            Self::Vi => &VI,
            Self::En => &EN,
        }
    }

    /// Thousands separator used for currency amounts
    pub const fn group_separator(self) -> char {
        match self {
            Self::Vi => '.',
            Self::En => ',',
        }
    }

    /// Instruction appended to LLM prompts
    pub const fn answer_instruction(self) -> &'static str {
        self.strings().answer_in
    }
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vi" | "vi-vn" => Ok(Self::Vi),
            "en" | "en-us" | "en-gb" => Ok(Self::En),
            other => Err(format!("unsupported locale: {other}")),
        }
    }
}

/// Whole-unit amount with thousands grouping, e.g. `116.700.000`
pub fn format_amount(value: Decimal, locale: Locale) -> String {
    let rounded = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().trunc().to_string();
    let separator = locale.group_separator();

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

/// Two decimals, half away from zero: `35.35`
pub fn format_percent(value: Decimal) -> String {
    format!("{:.2}", value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Like `format_percent` with an explicit `+` on positive values
pub fn format_signed_percent(value: Decimal) -> String {
    if value > Decimal::ZERO {
        format!("+{}", format_percent(value))
    } else {
        format_percent(value)
    }
}

/// Render the Markdown status report sent to chat
pub fn render_report(status: &PortfolioStatus, locale: Locale, date: NaiveDate) -> String {
    let s = locale.strings();

    let sections: Vec<String> = status
        .assets
        .iter()
        .map(|a| {
            let marker = if a.is_out_of_balance { "⚠️" } else { "✅" };
            format!(
                "{marker} *{}:* {}%\n   - {}: {} VND\n   - {}: {}%",
                a.asset,
                format_percent(a.current_percentage),
                s.value,
                format_amount(a.current_value, locale),
                s.deviation,
                format_signed_percent(a.deviation),
            )
        })
        .collect();

    let notice = if status.needs_rebalancing() {
        s.rebalance_needed
    } else {
        s.balanced
    };

    format!(
        "📊 *{title}* ({date})\n{RULE}\n💰 *{total}:* {amount} VND\n\n{sections}\n\n{RULE}\n🔔 *{notice_label}:* {notice}",
        title = s.title,
        date = date.format("%d/%m/%Y"),
        total = s.total,
        amount = format_amount(status.total_value, locale),
        sections = sections.join("\n\n"),
        notice_label = s.notice,
    )
}
