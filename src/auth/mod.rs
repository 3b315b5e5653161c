mod jwt;

// Re-export for use in extractors and main.rs
pub use jwt::{TokenClaims, TokenVerifier};
