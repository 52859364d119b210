// ⚠️ Error taxonomy
//
// Two layers:
// - DocumentError: local validation failures (wrong length, bad check digits).
//   Never retried, never sent upstream.
// - ApiError: everything that can go wrong around an upstream call, as a closed
//   set of kinds with a stable code, a user-facing message and a retry flag.
//
// Lookups over empty collections are NOT errors - they return None.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

// ============================================================================
// DOCUMENT ERRORS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    PostalCode,
    RegistryNumber,
    Phone,
}

impl DocumentKind {
    /// Short label used in user-facing messages
    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::PostalCode => "CEP",
            DocumentKind::RegistryNumber => "CNPJ",
            DocumentKind::Phone => "Telefone",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    /// Normalized input does not have the document's fixed length.
    /// Raised before any check-digit computation.
    #[error("{document} deve conter exatamente {expected} dígitos")]
    InvalidLength {
        document: DocumentKind,
        expected: usize,
        actual: usize,
    },

    /// Length is right but the check digits do not match, or the number is a
    /// known-invalid repeated-digit pattern.
    #[error("{document} inválido")]
    InvalidCheckDigits { document: DocumentKind },
}

impl DocumentError {
    /// Stable key for callers that localise messages themselves
    pub fn message_key(&self) -> &'static str {
        match self {
            DocumentError::InvalidLength { .. } => "invalid_length",
            DocumentError::InvalidCheckDigits { .. } => "invalid_check_digits",
        }
    }

    pub fn document(&self) -> DocumentKind {
        match self {
            DocumentError::InvalidLength { document, .. }
            | DocumentError::InvalidCheckDigits { document } => *document,
        }
    }
}

// ============================================================================
// UPSTREAM RESOURCES
// ============================================================================

/// The four upstream collections. Each one words its failures differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    PostalCode,
    Banks,
    RegistryNumber,
    Rates,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::PostalCode => "cep",
            Resource::Banks => "banks",
            Resource::RegistryNumber => "cnpj",
            Resource::Rates => "taxas",
        }
    }

    fn not_found_message(&self) -> &'static str {
        match self {
            Resource::PostalCode => "CEP não encontrado",
            Resource::RegistryNumber => "CNPJ não encontrado",
            Resource::Banks | Resource::Rates => "Dados não encontrados.",
        }
    }

    fn bad_request_message(&self) -> &'static str {
        match self {
            Resource::PostalCode => "CEP inválido",
            Resource::RegistryNumber => "CNPJ inválido",
            Resource::Banks | Resource::Rates => "Requisição inválida.",
        }
    }

    fn fallback_message(&self) -> &'static str {
        match self {
            Resource::PostalCode => "Erro inesperado ao buscar CEP",
            Resource::RegistryNumber => "Erro inesperado ao buscar CNPJ",
            Resource::Banks => "Erro inesperado ao carregar bancos",
            Resource::Rates => "Erro inesperado ao carregar taxas",
        }
    }
}

// ============================================================================
// API ERRORS
// ============================================================================

pub const NETWORK_ERROR_MESSAGE: &str = "Erro de conexão. Verifique sua internet.";
pub const TIMEOUT_ERROR_MESSAGE: &str = "Tempo limite esgotado. Tente novamente.";
pub const SERVER_ERROR_MESSAGE: &str = "Erro do servidor. Tente novamente mais tarde.";
pub const RATE_LIMIT_MESSAGE: &str = "Muitas consultas. Aguarde um momento e tente novamente.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Status 0: the request never got a response
    Network,
    Timeout,
    BadRequest,
    NotFound,
    RateLimited,
    Server,
    /// Response arrived but the body did not decode
    Decode,
    /// Rejected locally before reaching the network
    Validation,
    Unknown,
}

impl ErrorKind {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Network => "NETWORK_ERROR",
            ErrorKind::Timeout => "TIMEOUT_ERROR",
            ErrorKind::BadRequest => "BAD_REQUEST",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::RateLimited => "RATE_LIMIT",
            ErrorKind::Server => "SERVER_ERROR",
            ErrorKind::Decode => "DECODE_ERROR",
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Only connectivity, timeouts and upstream failures are worth another try
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Network | ErrorKind::Timeout | ErrorKind::Server
        )
    }

    /// Classify an HTTP status code (0 = no response)
    pub fn from_status(status: u16) -> Self {
        match status {
            0 => ErrorKind::Network,
            400 => ErrorKind::BadRequest,
            404 => ErrorKind::NotFound,
            408 => ErrorKind::Timeout,
            429 => ErrorKind::RateLimited,
            s if s >= 500 => ErrorKind::Server,
            _ => ErrorKind::Unknown,
        }
    }
}

#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    pub retryable: bool,
    pub timestamp: DateTime<Utc>,
}

impl ApiError {
    fn new(kind: ErrorKind, message: impl Into<String>, endpoint: &str) -> Self {
        ApiError {
            kind,
            message: message.into(),
            endpoint: endpoint.to_string(),
            http_status: None,
            retryable: kind.is_retryable(),
            timestamp: Utc::now(),
        }
    }

    /// Map an HTTP status from `resource` to a tagged error
    pub fn from_status(resource: Resource, status: u16, endpoint: &str) -> Self {
        let kind = ErrorKind::from_status(status);
        let message = match kind {
            ErrorKind::Network => NETWORK_ERROR_MESSAGE,
            ErrorKind::Timeout => TIMEOUT_ERROR_MESSAGE,
            ErrorKind::BadRequest => resource.bad_request_message(),
            ErrorKind::NotFound => resource.not_found_message(),
            ErrorKind::RateLimited => RATE_LIMIT_MESSAGE,
            ErrorKind::Server => SERVER_ERROR_MESSAGE,
            _ => resource.fallback_message(),
        };

        let mut error = ApiError::new(kind, message, endpoint);
        if status != 0 {
            error.http_status = Some(status);
        }
        error
    }

    pub fn network(endpoint: &str) -> Self {
        ApiError::new(ErrorKind::Network, NETWORK_ERROR_MESSAGE, endpoint)
    }

    pub fn timeout(endpoint: &str) -> Self {
        ApiError::new(ErrorKind::Timeout, TIMEOUT_ERROR_MESSAGE, endpoint)
    }

    pub fn decode(resource: Resource, endpoint: &str, detail: impl fmt::Display) -> Self {
        ApiError::new(
            ErrorKind::Decode,
            format!("{} ({})", resource.fallback_message(), detail),
            endpoint,
        )
    }

    pub fn validation(error: &DocumentError, endpoint: &str) -> Self {
        ApiError::new(ErrorKind::Validation, error.to_string(), endpoint)
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, ErrorKind::Network, true)]
    #[case(400, ErrorKind::BadRequest, false)]
    #[case(404, ErrorKind::NotFound, false)]
    #[case(408, ErrorKind::Timeout, true)]
    #[case(429, ErrorKind::RateLimited, false)]
    #[case(500, ErrorKind::Server, true)]
    #[case(503, ErrorKind::Server, true)]
    #[case(418, ErrorKind::Unknown, false)]
    fn test_status_classification(
        #[case] status: u16,
        #[case] kind: ErrorKind,
        #[case] retryable: bool,
    ) {
        let error = ApiError::from_status(Resource::Banks, status, "/banks/v1");
        assert_eq!(error.kind, kind);
        assert_eq!(error.retryable, retryable);
    }

    #[test]
    fn test_messages_depend_on_resource() {
        let cep = ApiError::from_status(Resource::PostalCode, 404, "/cep/v2/01310100");
        assert_eq!(cep.message, "CEP não encontrado");
        assert_eq!(cep.code(), "NOT_FOUND");
        assert_eq!(cep.http_status, Some(404));

        let cnpj = ApiError::from_status(Resource::RegistryNumber, 400, "/cnpj/v1/x");
        assert_eq!(cnpj.message, "CNPJ inválido");

        let rates = ApiError::from_status(Resource::Rates, 418, "/taxas/v1");
        assert_eq!(rates.message, "Erro inesperado ao carregar taxas");
    }

    #[test]
    fn test_network_error_has_no_status() {
        let error = ApiError::from_status(Resource::Rates, 0, "/taxas/v1");
        assert_eq!(error.http_status, None);
        assert_eq!(error.message, NETWORK_ERROR_MESSAGE);
    }

    #[test]
    fn test_document_error_messages() {
        let length = DocumentError::InvalidLength {
            document: DocumentKind::PostalCode,
            expected: 8,
            actual: 5,
        };
        assert_eq!(length.to_string(), "CEP deve conter exatamente 8 dígitos");
        assert_eq!(length.message_key(), "invalid_length");

        let digits = DocumentError::InvalidCheckDigits {
            document: DocumentKind::RegistryNumber,
        };
        assert_eq!(digits.to_string(), "CNPJ inválido");
        assert_eq!(digits.message_key(), "invalid_check_digits");
        assert_eq!(digits.document(), DocumentKind::RegistryNumber);
    }

    #[test]
    fn test_validation_error_is_not_retryable() {
        let doc = DocumentError::InvalidLength {
            document: DocumentKind::RegistryNumber,
            expected: 14,
            actual: 3,
        };
        let error = ApiError::validation(&doc, "/cnpj/v1");
        assert_eq!(error.kind, ErrorKind::Validation);
        assert!(!error.retryable);
        assert_eq!(error.message, "CNPJ deve conter exatamente 14 dígitos");
    }
}
