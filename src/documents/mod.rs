// Document numbers - validation + display formatting
pub mod phone;
pub mod postal_code;
pub mod registry_number;
mod weights;

pub use postal_code::PostalCode;
pub use registry_number::RegistryNumber;
