// Entity Models - the four BrasilAPI payloads
//
// Each entity:
// - Deserializes straight from the upstream JSON (wire names kept via serde)
// - Tolerates null/missing fields (upstream data is patchy)
// - Carries its own presentation helpers

pub mod address;
pub mod bank;
pub mod company;
pub mod rate;

pub use address::Address;
pub use bank::{Bank, BankCategory, BankDirectory};
pub use company::{Company, CompanySize, Partner, RegistrationStatus};
pub use rate::{IndicatorCard, Rate};

use serde::{Deserialize, Deserializer};

/// `null` becomes the type's default instead of a decode error
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Fields the upstream sends either as a number or as a string
pub(crate) fn number_or_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}
