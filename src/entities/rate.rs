// 📈 Rate Entity - financial indicators from /taxas/v1
//
// Wire shape is {"nome": "Selic", "valor": 11.75}. Values arrive already
// scaled for percentages (11.75 means 11.75%).

use super::null_as_default;
use crate::filter::{self, Record};
use crate::money::{self, ValueKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    #[serde(rename = "nome", default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(rename = "valor", default, deserialize_with = "null_as_default")]
    pub value: f64,
}

impl Rate {
    pub fn new(name: &str, value: f64) -> Self {
        Rate {
            name: name.to_string(),
            value,
        }
    }

    pub fn kind(&self) -> ValueKind {
        ValueKind::for_rate_name(&self.name)
    }

    pub fn unit(&self) -> &'static str {
        money::rate_unit(&self.name)
    }

    /// Value rendered according to the rate's inferred kind
    pub fn formatted_value(&self) -> String {
        money::format_value(self.value, self.kind())
    }

    pub fn trend(&self) -> Trend {
        Trend::for_value(self.value)
    }

    /// Traffic-light level; currencies use tighter thresholds
    pub fn level(&self) -> Level {
        Level::for_value(self.value, self.kind())
    }
}

impl Record for Rate {
    fn display_name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// TREND + LEVEL
// ============================================================================

/// Coarse direction arrow for a single reading (no previous value to compare)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Flat,
    Down,
}

impl Trend {
    pub fn for_value(value: f64) -> Self {
        if value > 10.0 {
            Trend::Up
        } else if value > 0.0 {
            Trend::Flat
        } else {
            Trend::Down
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Trend::Up => "↑",
            Trend::Flat => "→",
            Trend::Down => "↓",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Moderate,
    High,
}

impl Level {
    pub fn for_value(value: f64, kind: ValueKind) -> Self {
        let (high, moderate) = match kind {
            ValueKind::Currency => (5.0, 3.0),
            ValueKind::Percentage => (15.0, 5.0),
        };

        if value > high {
            Level::High
        } else if value > moderate {
            Level::Moderate
        } else {
            Level::Low
        }
    }
}

// ============================================================================
// MAIN INDICATORS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Indicator {
    /// Substring looked up in the rate names
    pub key: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
}

/// Highlighted indicators, in display order
pub const MAIN_INDICATORS: [Indicator; 5] = [
    Indicator {
        key: "selic",
        display_name: "SELIC",
        description: "Taxa básica de juros da economia",
    },
    Indicator {
        key: "cdi",
        display_name: "CDI",
        description: "Certificado de Depósito Interbancário",
    },
    Indicator {
        key: "ipca",
        display_name: "IPCA",
        description: "Índice de Preços ao Consumidor Amplo",
    },
    Indicator {
        key: "dolar",
        display_name: "USD",
        description: "Dólar Americano",
    },
    Indicator {
        key: "euro",
        display_name: "EUR",
        description: "Euro",
    },
];

/// A highlighted rate together with how it is presented
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorCard {
    pub name: String,
    pub display_name: String,
    pub value: f64,
    pub kind: ValueKind,
    pub description: String,
}

impl IndicatorCard {
    fn new(indicator: &Indicator, rate: &Rate) -> Self {
        IndicatorCard {
            name: rate.name.clone(),
            display_name: indicator.display_name.to_string(),
            value: rate.value,
            kind: rate.kind(),
            description: indicator.description.to_string(),
        }
    }

    pub fn formatted_value(&self) -> String {
        money::format_value(self.value, self.kind)
    }
}

/// One card per indicator that has a matching rate, plus every rate not
/// used by a card (in fetch order).
pub fn split_main_indicators(rates: &[Rate]) -> (Vec<IndicatorCard>, Vec<Rate>) {
    let mut cards = Vec::new();
    let mut used: Vec<&str> = Vec::new();

    for indicator in MAIN_INDICATORS.iter() {
        if let Some(rate) = filter::find_by_key(Some(rates), indicator.key) {
            cards.push(IndicatorCard::new(indicator, rate));
            used.push(rate.name.as_str());
        }
    }

    let others = rates
        .iter()
        .filter(|rate| !used.contains(&rate.name.as_str()))
        .cloned()
        .collect();

    (cards, others)
}

/// Rates whose name contains any main indicator key
pub fn main_rates(rates: &[Rate]) -> Vec<Rate> {
    rates
        .iter()
        .filter(|rate| {
            let lower = rate.name.to_lowercase();
            MAIN_INDICATORS.iter().any(|i| lower.contains(i.key))
        })
        .cloned()
        .collect()
}
