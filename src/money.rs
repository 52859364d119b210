// 💰 Rate/Value Formatter - pt-BR percentages, BRL currency, update stamps
//
// pt-BR conventions: "." groups thousands, "," separates decimals,
// currency is prefixed "R$ " and a negative sign goes before the symbol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shown when a value cannot be rendered
pub const NOT_AVAILABLE: &str = "N/A";

const CURRENCY_KEYWORDS: [&str; 7] = ["dolar", "euro", "peso", "libra", "iene", "usd", "eur"];
const INTEREST_KEYWORDS: [&str; 4] = ["taxa", "juros", "selic", "cdi"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Percentage,
    Currency,
}

impl ValueKind {
    /// Rates named after a currency are quotes; everything else is a rate
    pub fn for_rate_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if CURRENCY_KEYWORDS.iter().any(|keyword| lower.contains(keyword)) {
            ValueKind::Currency
        } else {
            ValueKind::Percentage
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Percentage => "percentage",
            ValueKind::Currency => "currency",
        }
    }
}

// ============================================================================
// NUMBER RENDERING
// ============================================================================

/// Round half away from zero to `digits` decimals
fn round_to(value: f64, digits: usize) -> f64 {
    let scale = 10f64.powi(digits as i32);
    (value * scale).round() / scale
}

fn group_thousands(integer: &str) -> String {
    let len = integer.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, c) in integer.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    grouped
}

/// Unsigned pt-BR rendering of |value| with between `min_fraction` and
/// `max_fraction` decimals. The bool tells whether a minus sign is due.
fn pt_br_magnitude(value: f64, min_fraction: usize, max_fraction: usize) -> (bool, String) {
    let rounded = round_to(value, max_fraction);
    let negative = rounded < 0.0;

    let fixed = format!("{:.*}", max_fraction, rounded.abs());
    let (integer, fraction) = match fixed.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (fixed.as_str(), ""),
    };

    let mut fraction = fraction.to_string();
    while fraction.len() > min_fraction && fraction.ends_with('0') {
        fraction.pop();
    }

    let mut out = group_thousands(integer);
    if !fraction.is_empty() {
        out.push(',');
        out.push_str(&fraction);
    }
    (negative, out)
}

/// Plain pt-BR number, e.g. `1.234,5678`
pub fn format_number(value: f64, min_fraction: usize, max_fraction: usize) -> String {
    let (negative, magnitude) = pt_br_magnitude(value, min_fraction, max_fraction);
    if negative {
        format!("-{}", magnitude)
    } else {
        magnitude
    }
}

fn format_currency(value: f64, min_fraction: usize, max_fraction: usize) -> String {
    let (negative, magnitude) = pt_br_magnitude(value, min_fraction, max_fraction);
    if negative {
        format!("-R$ {}", magnitude)
    } else {
        format!("R$ {}", magnitude)
    }
}

// ============================================================================
// PUBLIC FORMATTERS
// ============================================================================

/// Render a value as BRL (2 decimals) or as an already-scaled percentage
/// (2 to 4 decimals).
pub fn format_value(value: f64, kind: ValueKind) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }

    match kind {
        ValueKind::Currency => format_currency(value, 2, 2),
        ValueKind::Percentage => format!("{}%", format_number(value, 2, 4)),
    }
}

/// Rates-screen heuristic: guesses the unit from the magnitude alone.
///
/// `|v| < 1` is read as a fraction and shown x100 with 4 decimals, `v > 1`
/// is shown as currency, and `1` or anything `<= -1` as a raw percentage.
/// Decimals use "." here, unlike `format_value`.
pub fn format_by_magnitude(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }

    if value.abs() < 1.0 {
        let scaled = value * 100.0;
        // -0.0 prints as "-0.0000"
        let scaled = if scaled == 0.0 { 0.0 } else { scaled };
        return format!("{:.4}%", scaled);
    }

    if value > 1.0 {
        return format_currency(value, 2, 4);
    }

    format!("{:.4}%", value)
}

/// Currency pipe for optional amounts; absent or NaN shows as zero reais
pub fn format_brl(value: Option<f64>) -> String {
    match value {
        Some(v) if !v.is_nan() => format_value(v, ValueKind::Currency),
        _ => format_value(0.0, ValueKind::Currency),
    }
}

/// Unit suffix shown next to a rate
pub fn rate_unit(name: &str) -> &'static str {
    if name.is_empty() || ValueKind::for_rate_name(name) == ValueKind::Currency {
        return "";
    }

    let lower = name.to_lowercase();
    if INTEREST_KEYWORDS.iter().any(|keyword| lower.contains(keyword)) {
        "% a.a."
    } else {
        ""
    }
}

/// Relative "last updated" label
pub fn last_update_text(last: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - last).num_minutes();

    match minutes {
        m if m < 1 => "Atualizado agora".to_string(),
        1 => "Atualizado há 1 minuto".to_string(),
        m if m < 60 => format!("Atualizado há {} minutos", m),
        m => match m / 60 {
            1 => "Atualizado há 1 hora".to_string(),
            h if h < 24 => format!("Atualizado há {} horas", h),
            _ => last.format("%d/%m/%Y").to_string(),
        },
    }
}

/// pt-BR date-time stamp, e.g. `19/10/2026, 14:05:09`
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%d/%m/%Y, %H:%M:%S").to_string()
}
