pub mod extractors;
pub mod middleware;
pub mod password;
pub mod principal;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::AccountView;

// Re-export necessary items
pub use extractors::AuthenticatedPrincipal;
pub use middleware::AuthMiddleware;
pub use password::Hasher;
pub use principal::{Principal, PrincipalResolver};
pub use token::{Claims, TokenCodec, TokenError};

/// Represents the payload for a login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Account email; compared case-insensitively.
    #[validate(length(min = 1, message = "Email and password are required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Email and password are required"))]
    pub password: String,
}

/// Represents the payload for a registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Stored lower-cased; any non-empty value is accepted.
    #[validate(length(min = 1, message = "Email, password, and name are required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Email, password, and name are required"))]
    pub password: String,
    #[validate(length(min = 1, message = "Email, password, and name are required"))]
    pub name: String,
    /// Requested role. Only `"admin"` (any case) has an effect, and only when
    /// admin registration is enabled.
    pub role: Option<String>,
}

/// Response after a successful login or registration.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    /// The signed bearer token for subsequent requests.
    pub token: String,
    pub user: AccountView,
}
