// 🏢 Company Entity - result of a registry-number lookup (/cnpj/v1)
//
// Field names on the wire are the Receita Federal's (razao_social,
// nome_fantasia, ...). Almost everything may be null or missing.

use super::{null_as_default, number_or_text};
use crate::documents::{phone, registry_number};
use crate::money;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const NOT_INFORMED: &str = "Não informado";

/// Well-known registry numbers, handy for trying the lookup out
pub const SAMPLE_COMPANIES: [(&str, &str); 5] = [
    ("Banco do Brasil", "00000000000191"),
    ("Petrobras", "33000167000101"),
    ("Vale S.A.", "33592510000154"),
    ("Itaú Unibanco", "60701190000104"),
    ("Bradesco", "60746948000112"),
];

// ============================================================================
// SIZE + STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompanySize {
    Micro,
    Small,
    Medium,
    Large,
    VeryLarge,
}

impl CompanySize {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "01" => Some(CompanySize::Micro),
            "02" => Some(CompanySize::Small),
            "03" => Some(CompanySize::Medium),
            "04" => Some(CompanySize::Large),
            "05" => Some(CompanySize::VeryLarge),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompanySize::Micro => "Microempresa",
            CompanySize::Small => "Pequena Empresa",
            CompanySize::Medium => "Média Empresa",
            CompanySize::Large => "Grande Empresa",
            CompanySize::VeryLarge => "Empresa de Grande Porte",
        }
    }

    /// Known codes get their label, unknown values are shown as they came
    pub fn describe(code: &str) -> String {
        if code.is_empty() {
            return NOT_INFORMED.to_string();
        }
        match CompanySize::from_code(code) {
            Some(size) => size.as_str().to_string(),
            None => code.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Active,
    Suspended,
    Canceled,
    Unknown,
}

impl RegistrationStatus {
    pub fn from_text(status: &str) -> Self {
        let lower = status.to_lowercase();

        if lower.contains("inativa") {
            RegistrationStatus::Unknown
        } else if lower.contains("ativa") {
            RegistrationStatus::Active
        } else if lower.contains("suspensa") {
            RegistrationStatus::Suspended
        } else if lower.contains("cancelada") {
            RegistrationStatus::Canceled
        } else {
            RegistrationStatus::Unknown
        }
    }
}

/// ISO date (`2005-11-03`) as `03/11/2005`; empty as "Não informado";
/// anything unparseable is shown as given
pub fn display_date(date: &str) -> String {
    if date.trim().is_empty() {
        return NOT_INFORMED.to_string();
    }

    match NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d") {
        Ok(parsed) => parsed.format("%d/%m/%Y").to_string(),
        Err(_) => date.to_string(),
    }
}

// ============================================================================
// PARTNER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Partner {
    #[serde(rename = "nome_socio", default, deserialize_with = "null_as_default")]
    pub name: String,

    /// Masked CPF or a CNPJ, as published
    #[serde(rename = "cnpj_cpf_do_socio", default, deserialize_with = "null_as_default")]
    pub document: String,

    #[serde(rename = "qualificacao_socio", default, deserialize_with = "null_as_default")]
    pub qualification: String,

    #[serde(rename = "data_entrada_sociedade", default, deserialize_with = "null_as_default")]
    pub joined_on: String,

    #[serde(rename = "faixa_etaria", default, deserialize_with = "null_as_default")]
    pub age_range: String,
}

// ============================================================================
// COMPANY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Company {
    #[serde(default, deserialize_with = "number_or_text")]
    pub cnpj: String,

    /// 1 = head office, 2 = branch
    #[serde(rename = "identificador_matriz_filial", default)]
    pub branch_kind: Option<i64>,

    #[serde(rename = "razao_social", default, deserialize_with = "null_as_default")]
    pub legal_name: String,

    #[serde(rename = "nome_fantasia", default, deserialize_with = "null_as_default")]
    pub trade_name: String,

    /// Numeric code or text depending on the upstream source
    #[serde(rename = "situacao_cadastral", default, deserialize_with = "number_or_text")]
    pub status_code: String,

    #[serde(rename = "descricao_situacao_cadastral", default, deserialize_with = "null_as_default")]
    pub status_description: String,

    #[serde(rename = "data_situacao_cadastral", default, deserialize_with = "null_as_default")]
    pub status_date: String,

    #[serde(rename = "data_inicio_atividade", default, deserialize_with = "null_as_default")]
    pub activity_start: String,

    #[serde(rename = "cnae_fiscal", default)]
    pub main_activity_code: Option<i64>,

    #[serde(rename = "cnae_fiscal_descricao", default, deserialize_with = "null_as_default")]
    pub main_activity: String,

    #[serde(rename = "descricao_tipo_de_logradouro", default, deserialize_with = "null_as_default")]
    pub street_type: String,

    #[serde(rename = "logradouro", default, deserialize_with = "null_as_default")]
    pub street: String,

    #[serde(rename = "numero", default, deserialize_with = "null_as_default")]
    pub number: String,

    #[serde(rename = "complemento", default, deserialize_with = "null_as_default")]
    pub complement: String,

    #[serde(rename = "bairro", default, deserialize_with = "null_as_default")]
    pub neighborhood: String,

    #[serde(default, deserialize_with = "number_or_text")]
    pub cep: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub uf: String,

    #[serde(rename = "municipio", default, deserialize_with = "null_as_default")]
    pub city: String,

    #[serde(rename = "ddd_telefone_1", default, deserialize_with = "null_as_default")]
    pub phone_1: String,

    #[serde(rename = "ddd_telefone_2", default, deserialize_with = "null_as_default")]
    pub phone_2: String,

    #[serde(rename = "capital_social", default)]
    pub share_capital: Option<f64>,

    /// Size code ("01".."05") or a label, depending on the source
    #[serde(default, deserialize_with = "number_or_text")]
    pub porte: String,

    #[serde(rename = "opcao_pelo_simples", default)]
    pub simples: Option<bool>,

    #[serde(rename = "opcao_pelo_mei", default)]
    pub mei: Option<bool>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub qsa: Vec<Partner>,
}

impl Company {
    pub fn formatted_cnpj(&self) -> String {
        registry_number::format(&self.cnpj)
    }

    /// Trade name when there is one, otherwise the legal name
    pub fn display_name(&self) -> &str {
        if self.trade_name.trim().is_empty() {
            &self.legal_name
        } else {
            &self.trade_name
        }
    }

    pub fn is_head_office(&self) -> bool {
        self.branch_kind == Some(1)
    }

    /// Status text, preferring the description over a bare code
    pub fn status_text(&self) -> &str {
        if self.status_description.is_empty() {
            &self.status_code
        } else {
            &self.status_description
        }
    }

    pub fn status(&self) -> RegistrationStatus {
        RegistrationStatus::from_text(self.status_text())
    }

    pub fn size_description(&self) -> String {
        CompanySize::describe(&self.porte)
    }

    pub fn share_capital_text(&self) -> String {
        money::format_brl(self.share_capital)
    }

    /// Formatted phones, skipping empty ones
    pub fn phones(&self) -> Vec<String> {
        [&self.phone_1, &self.phone_2]
            .iter()
            .filter(|p| !p.trim().is_empty())
            .map(|p| phone::format(p))
            .collect()
    }

    /// "RUA X, 100, SALA 1 - BAIRRO, CIDADE/UF"
    pub fn address_line(&self) -> String {
        let street = [self.street_type.as_str(), self.street.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(" ");

        let mut line = [street.as_str(), self.number.as_str(), self.complement.as_str()]
            .iter()
            .filter(|s| !s.trim().is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");

        if !self.neighborhood.is_empty() {
            line.push_str(" - ");
            line.push_str(&self.neighborhood);
        }
        if !self.city.is_empty() {
            line.push_str(&format!(", {}/{}", self.city, self.uf));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const BANCO_DO_BRASIL: &str = r#"{
        "cnpj": "00000000000191",
        "identificador_matriz_filial": 1,
        "descricao_matriz_filial": "MATRIZ",
        "razao_social": "BANCO DO BRASIL SA",
        "nome_fantasia": "DIRECAO GERAL",
        "situacao_cadastral": 2,
        "descricao_situacao_cadastral": "ATIVA",
        "data_situacao_cadastral": "2005-11-03",
        "data_inicio_atividade": "1966-08-01",
        "cnae_fiscal": 6422100,
        "cnae_fiscal_descricao": "Bancos múltiplos, com carteira comercial",
        "descricao_tipo_de_logradouro": "QUADRA",
        "logradouro": "SAUN QUADRA 5 LOTE B TORRES I, II E III",
        "numero": "SN",
        "complemento": "ANDAR T I SL S101 A S1602",
        "bairro": "ASA NORTE",
        "cep": 70040912,
        "uf": "DF",
        "municipio": "BRASILIA",
        "ddd_telefone_1": "6134939002",
        "ddd_telefone_2": "",
        "capital_social": 120000000000,
        "porte": "05",
        "opcao_pelo_simples": null,
        "opcao_pelo_mei": false,
        "qsa": [
            {"nome_socio": "TARCIANA PAULA GOMES MEDEIROS", "cnpj_cpf_do_socio": "***123456**", "qualificacao_socio": "Presidente", "data_entrada_sociedade": "2023-01-16", "faixa_etaria": "Entre 41 a 50 anos"}
        ]
    }"#;

    #[test]
    fn test_deserialize_from_api_shape() {
        let company: Company = serde_json::from_str(BANCO_DO_BRASIL).unwrap();
        assert_eq!(company.formatted_cnpj(), "00.000.000/0001-91");
        assert_eq!(company.status_code, "2");
        assert_eq!(company.status(), RegistrationStatus::Active);
        assert_eq!(company.cep, "70040912");
        assert!(company.is_head_office());
        assert_eq!(company.qsa.len(), 1);
        assert_eq!(company.qsa[0].qualification, "Presidente");
        assert_eq!(company.simples, None);
        assert_eq!(company.mei, Some(false));
    }

    #[test]
    fn test_presentation_helpers() {
        let company: Company = serde_json::from_str(BANCO_DO_BRASIL).unwrap();
        assert_eq!(company.display_name(), "DIRECAO GERAL");
        assert_eq!(company.size_description(), "Empresa de Grande Porte");
        assert_eq!(company.share_capital_text(), "R$ 120.000.000.000,00");
        assert_eq!(company.phones(), vec!["(61) 3493-9002".to_string()]);
        assert_eq!(display_date(&company.activity_start), "01/08/1966");
        assert!(company.address_line().ends_with("- ASA NORTE, BRASILIA/DF"));
    }

    #[test]
    fn test_sparse_payload() {
        let company: Company =
            serde_json::from_str(r#"{"cnpj":"11222333000181","razao_social":"ACME LTDA","qsa":null}"#)
                .unwrap();
        assert_eq!(company.display_name(), "ACME LTDA");
        assert_eq!(company.size_description(), NOT_INFORMED);
        assert_eq!(company.share_capital_text(), "R$ 0,00");
        assert!(company.phones().is_empty());
        assert!(company.qsa.is_empty());
        assert_eq!(company.status(), RegistrationStatus::Unknown);
    }

    #[rstest]
    #[case("01", "Microempresa")]
    #[case("03", "Média Empresa")]
    #[case("05", "Empresa de Grande Porte")]
    #[case("DEMAIS", "DEMAIS")]
    #[case("", "Não informado")]
    fn test_size_description(#[case] code: &str, #[case] expected: &str) {
        assert_eq!(CompanySize::describe(code), expected);
    }

    #[rstest]
    #[case("ATIVA", RegistrationStatus::Active)]
    #[case("Suspensa", RegistrationStatus::Suspended)]
    #[case("CANCELADA", RegistrationStatus::Canceled)]
    #[case("INATIVA", RegistrationStatus::Unknown)]
    #[case("BAIXADA", RegistrationStatus::Unknown)]
    #[case("", RegistrationStatus::Unknown)]
    fn test_status_from_text(#[case] text: &str, #[case] expected: RegistrationStatus) {
        assert_eq!(RegistrationStatus::from_text(text), expected);
    }

    #[test]
    fn test_display_date() {
        assert_eq!(display_date(""), "Não informado");
        assert_eq!(display_date("2005-11-03"), "03/11/2005");
        assert_eq!(display_date("03/11/2005"), "03/11/2005");
    }

    #[test]
    fn test_samples_are_valid_registry_numbers() {
        for (name, cnpj) in SAMPLE_COMPANIES {
            assert!(registry_number::is_valid(cnpj), "{} sample is invalid", name);
        }
    }
}
