// 🏦 Bank Entity - directory record from /banks/v1
//
// The upstream list is the source of truth: records are never edited,
// a fresh list replaces the old one on every fetch.

use super::null_as_default;
use crate::filter::{self, FilterCriteria, Record};
use serde::{Deserialize, Serialize};

/// Codes of the banks highlighted on the directory screen
pub const MAIN_BANK_CODES: [i64; 9] = [1, 33, 104, 237, 341, 399, 745, 748, 756];

// ============================================================================
// BANK CATEGORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BankCategory {
    CreditCooperative,
    FinanceCompany,
    InvestmentBank,
    DevelopmentBank,
    CommercialBank,
}

impl BankCategory {
    /// Inferred from keywords in the bank's name; commercial when none match
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_lowercase();

        if lower.contains("cooperativa") {
            BankCategory::CreditCooperative
        } else if lower.contains("financeira") {
            BankCategory::FinanceCompany
        } else if lower.contains("investimento") {
            BankCategory::InvestmentBank
        } else if lower.contains("desenvolvimento") {
            BankCategory::DevelopmentBank
        } else {
            BankCategory::CommercialBank
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BankCategory::CreditCooperative => "Cooperativa de Crédito",
            BankCategory::FinanceCompany => "Financeira",
            BankCategory::InvestmentBank => "Banco de Investimento",
            BankCategory::DevelopmentBank => "Banco de Desenvolvimento",
            BankCategory::CommercialBank => "Banco Comercial",
        }
    }
}

// ============================================================================
// BANK ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bank {
    /// Brazilian payment-system identifier (8 digits)
    #[serde(default, deserialize_with = "null_as_default")]
    pub ispb: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    /// Compe code; some institutions have none
    #[serde(default)]
    pub code: Option<i64>,

    #[serde(rename = "fullName", default, deserialize_with = "null_as_default")]
    pub full_name: String,
}

impl Bank {
    pub fn new(ispb: &str, name: &str, code: Option<i64>, full_name: &str) -> Self {
        Bank {
            ispb: ispb.to_string(),
            name: name.to_string(),
            code,
            full_name: full_name.to_string(),
        }
    }

    pub fn category(&self) -> BankCategory {
        BankCategory::from_name(&self.name)
    }

    pub fn is_main(&self) -> bool {
        is_main_bank(self.code)
    }

    /// Code padded to three digits ("001"), or "N/A"
    pub fn code_label(&self) -> String {
        match self.code {
            Some(code) => format!("{:03}", code),
            None => "N/A".to_string(),
        }
    }
}

impl Record for Bank {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn full_name(&self) -> &str {
        &self.full_name
    }

    fn numeric_code(&self) -> Option<i64> {
        self.code
    }
}

pub fn is_main_bank(code: Option<i64>) -> bool {
    code.map_or(false, |code| MAIN_BANK_CODES.contains(&code))
}

/// The highlighted banks, by name
pub fn main_banks(banks: &[Bank]) -> Vec<Bank> {
    filter::main_subset_by_code(banks, &MAIN_BANK_CODES)
}

// ============================================================================
// BANK DIRECTORY
// ============================================================================

/// One fetched bank list plus lookups over it
#[derive(Debug, Clone, Default)]
pub struct BankDirectory {
    banks: Vec<Bank>,
}

impl BankDirectory {
    pub fn new(banks: Vec<Bank>) -> Self {
        BankDirectory { banks }
    }

    pub fn all(&self) -> &[Bank] {
        &self.banks
    }

    pub fn len(&self) -> usize {
        self.banks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.banks.is_empty()
    }

    pub fn get_by_code(&self, code: i64) -> Option<&Bank> {
        self.banks.iter().find(|b| b.code == Some(code))
    }

    pub fn get_by_ispb(&self, ispb: &str) -> Option<&Bank> {
        self.banks.iter().find(|b| b.ispb == ispb)
    }

    /// First bank whose short name contains `partial`
    pub fn find(&self, partial: &str) -> Option<&Bank> {
        filter::find_by_key(Some(&self.banks[..]), partial)
    }

    pub fn search(&self, criteria: &FilterCriteria) -> Vec<Bank> {
        filter::filter_records(&self.banks, Some(criteria))
    }

    pub fn main_banks(&self) -> Vec<Bank> {
        main_banks(&self.banks)
    }

    /// Number of banks per category, in first-seen order
    pub fn category_counts(&self) -> Vec<(BankCategory, usize)> {
        let mut counts: Vec<(BankCategory, usize)> = Vec::new();
        for bank in &self.banks {
            let category = bank.category();
            match counts.iter_mut().find(|(c, _)| *c == category) {
                Some((_, count)) => *count += 1,
                None => counts.push((category, 1)),
            }
        }
        counts
    }
}
