// 📍 Address Entity - result of a postal-code lookup (/cep/v2)

use super::null_as_default;
use crate::digits::normalize;
use crate::documents::postal_code;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(default)]
    pub latitude: Option<String>,
    #[serde(default)]
    pub longitude: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, deserialize_with = "null_as_default")]
    pub cep: String,

    /// Two-letter state code (UF)
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub city: String,

    /// v1 of the API calls this "district"
    #[serde(default, alias = "district", deserialize_with = "null_as_default")]
    pub neighborhood: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub street: String,

    /// Which upstream provider answered
    #[serde(default, deserialize_with = "null_as_default")]
    pub service: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Address {
    /// Clean 8 digits, used as the history key
    pub fn cep_digits(&self) -> String {
        normalize(&self.cep)
    }

    pub fn formatted_cep(&self) -> String {
        postal_code::display(&self.cep)
    }

    /// "Street, Neighborhood, City - UF, NNNNN-NNN", skipping empty parts
    pub fn one_line(&self) -> String {
        let city_state = match (self.city.is_empty(), self.state.is_empty()) {
            (false, false) => format!("{} - {}", self.city, self.state),
            (false, true) => self.city.clone(),
            (true, false) => self.state.clone(),
            (true, true) => String::new(),
        };

        [
            self.street.clone(),
            self.neighborhood.clone(),
            city_state,
            self.formatted_cep(),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }

    /// (latitude, longitude) when the provider sent parseable coordinates
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let coords = self.location.as_ref()?.coordinates.as_ref()?;
        let lat = coords.latitude.as_deref()?.trim().parse().ok()?;
        let lng = coords.longitude.as_deref()?.trim().parse().ok()?;
        Some((lat, lng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAULISTA: &str = r#"{
        "cep": "01310100",
        "state": "SP",
        "city": "São Paulo",
        "neighborhood": "Bela Vista",
        "street": "Avenida Paulista",
        "service": "open-cep",
        "location": {
            "type": "Point",
            "coordinates": {"longitude": "-46.6544", "latitude": "-23.5632"}
        }
    }"#;

    #[test]
    fn test_deserialize_v2_shape() {
        let address: Address = serde_json::from_str(PAULISTA).unwrap();
        assert_eq!(address.city, "São Paulo");
        assert_eq!(address.neighborhood, "Bela Vista");
        assert_eq!(address.formatted_cep(), "01310-100");
        assert_eq!(address.coordinates(), Some((-23.5632, -46.6544)));
    }

    #[test]
    fn test_district_alias_and_missing_fields() {
        let json = r#"{"cep":"70040010","state":"DF","city":"Brasília","district":"Zona Cívico-Administrativa","street":null}"#;
        let address: Address = serde_json::from_str(json).unwrap();
        assert_eq!(address.neighborhood, "Zona Cívico-Administrativa");
        assert_eq!(address.street, "");
        assert_eq!(address.service, "");
        assert_eq!(address.coordinates(), None);
    }

    #[test]
    fn test_empty_coordinates_object() {
        let json = r#"{"cep":"01310100","location":{"type":"Point","coordinates":{}}}"#;
        let address: Address = serde_json::from_str(json).unwrap();
        assert_eq!(address.coordinates(), None);
    }

    #[test]
    fn test_one_line() {
        let address: Address = serde_json::from_str(PAULISTA).unwrap();
        assert_eq!(
            address.one_line(),
            "Avenida Paulista, Bela Vista, São Paulo - SP, 01310-100"
        );

        let sparse = Address {
            cep: "70040010".to_string(),
            city: "Brasília".to_string(),
            ..Default::default()
        };
        assert_eq!(sparse.one_line(), "Brasília, 70040-010");
    }
}
