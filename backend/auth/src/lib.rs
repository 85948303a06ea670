pub mod cache;
pub mod claims;
pub mod error;
pub mod exchange;

pub use cache::TokenCache;
pub use claims::TokenClaims;
pub use error::AuthError;
pub use exchange::{IamTokenSource, TokenSource};
