use serde::{Deserialize, Serialize};

use crate::auth::token::TokenCodec;
use crate::models::Role;

const BEARER_PREFIX: &str = "Bearer ";

/// The authenticated identity behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Account id taken from the token subject.
    pub subject: String,
    pub role: Role,
}

impl Principal {
    pub fn new(subject: impl Into<String>, role: Role) -> Self {
        Self {
            subject: subject.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Ownership rule: the owner or any admin.
    pub fn can_act_on(&self, owner_id: &str) -> bool {
        self.is_admin() || self.subject == owner_id
    }
}

/// Turns an `Authorization` header value into a `Principal`.
///
/// Every failure collapses to `None`. The reason is logged at debug level
/// and never returned, so callers can only answer "authentication required".
#[derive(Debug, Clone, Copy)]
pub struct PrincipalResolver<'a> {
    codec: &'a TokenCodec,
}

impl<'a> PrincipalResolver<'a> {
    pub fn new(codec: &'a TokenCodec) -> Self {
        Self { codec }
    }

    pub fn resolve(&self, header: Option<&str>) -> Option<Principal> {
        let Some(token) = header.and_then(|value| value.strip_prefix(BEARER_PREFIX)) else {
            log::debug!("no bearer credential presented");
            return None;
        };

        let claims = match self.codec.decode(token.trim()) {
            Ok(claims) => claims,
            Err(err) => {
                log::debug!("bearer token rejected: {}", err);
                return None;
            }
        };

        if claims.sub.is_empty() {
            log::debug!("bearer token rejected: empty subject");
            return None;
        }
        Some(Principal::new(claims.sub, claims.role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::Claims;
    use chrono::{Duration, Utc};

    fn codec() -> TokenCodec {
        TokenCodec::new("resolver_test_secret")
    }

    #[test]
    fn test_resolves_valid_bearer_token() {
        let codec = codec();
        let token = codec.issue(&Claims::new("u1", Role::Admin)).unwrap();
        let header = format!("Bearer {}", token);

        let principal = PrincipalResolver::new(&codec).resolve(Some(&header));
        assert_eq!(principal, Some(Principal::new("u1", Role::Admin)));
    }

    #[test]
    fn test_rejections_are_indistinguishable() {
        let codec = codec();
        let resolver = PrincipalResolver::new(&codec);
        let valid = codec.issue(&Claims::new("u1", Role::User)).unwrap();
        let expired = codec
            .issue(&Claims::issued_at("u1", Role::User, Utc::now() - Duration::days(10)))
            .unwrap();
        let foreign = TokenCodec::new("other")
            .issue(&Claims::new("u1", Role::User))
            .unwrap();
        let no_subject = codec.issue(&Claims::new("", Role::User)).unwrap();

        let headers = [
            None,
            Some(String::new()),
            Some("Bearer garbage".to_string()),
            Some(format!("Token {}", valid)),
            Some(valid.clone()),
            Some(format!("bearer {}", valid)),
            Some(format!("Bearer {}", expired)),
            Some(format!("Bearer {}", foreign)),
            Some(format!("Bearer {}", no_subject)),
        ];
        for header in headers {
            assert_eq!(resolver.resolve(header.as_deref()), None, "{:?}", header);
        }
    }

    #[test]
    fn test_ownership_rule() {
        let user = Principal::new("u1", Role::User);
        let admin = Principal::new("root", Role::Admin);
        assert!(user.can_act_on("u1"));
        assert!(!user.can_act_on("u2"));
        assert!(admin.can_act_on("u2"));
    }
}
