pub mod error;
pub mod logger;
pub mod system;
pub mod validation;
