// Brasil Dashboard - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod digits;      // Digit normalizer
pub mod documents;   // CEP / CNPJ / phone validation + formatting
pub mod filter;      // Record filter/sort engine
pub mod money;       // pt-BR rate and currency formatting
pub mod entities;    // Bank, Rate, Address, Company
pub mod error;       // DocumentError + ApiError taxonomy
pub mod client;      // BrasilAPI HTTP client
pub mod db;          // SQLite (WAL): kv_store + lookup events
pub mod history;     // Capped search history
pub mod export;      // CSV export
pub mod loading;     // Per-resource loading state
pub mod config;      // Flags + env configuration
pub mod logging;     // tracing subscriber setup

// Re-export commonly used types
pub use client::BrasilApiClient;
pub use config::{ApiConfig, ConfigArgs};
pub use db::{
    LookupEvent, LookupStat,
    open_database, setup_database,
    kv_get, kv_put, kv_delete,
    insert_lookup_event, recent_lookup_events, lookup_stats,
};
pub use documents::{PostalCode, RegistryNumber};
pub use entities::{
    Address,
    Bank, BankCategory, BankDirectory,
    Company, CompanySize, Partner, RegistrationStatus,
    IndicatorCard, Rate,
};
pub use error::{ApiError, DocumentError, DocumentKind, ErrorKind, Resource};
pub use filter::{FilterCriteria, Record, SortField, SortOrder};
pub use history::{HistoryEntry, SearchHistory};
pub use loading::{LoadState, LoadTracker};
pub use money::ValueKind;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
