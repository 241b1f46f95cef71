use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::Principal;
use crate::error::AppError;

/// Extracts the `Principal` that `AuthMiddleware` stored for this request.
///
/// Fails with `Unauthorized` when no principal is present, e.g. on a route
/// that is not wrapped by the middleware.
#[derive(Debug, Clone)]
pub struct AuthenticatedPrincipal(pub Principal);

impl FromRequest for AuthenticatedPrincipal {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Principal>().cloned() {
            Some(principal) => ready(Ok(AuthenticatedPrincipal(principal))),
            None => {
                log::warn!("no principal on {}; is AuthMiddleware applied?", req.path());
                ready(Err(AppError::Unauthorized("Unauthorized".into()).into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use actix_web::http::StatusCode;
    use actix_web::test;

    #[actix_rt::test]
    async fn test_authenticated_principal_extractor_success() {
        let req = test::TestRequest::default().to_http_request();
        req.extensions_mut().insert(Principal::new("u1", Role::Admin));

        let mut payload = Payload::None;
        let extracted = AuthenticatedPrincipal::from_request(&req, &mut payload)
            .await
            .unwrap();
        assert_eq!(extracted.0, Principal::new("u1", Role::Admin));
    }

    #[actix_rt::test]
    async fn test_authenticated_principal_extractor_failure() {
        let req = test::TestRequest::default().to_http_request();

        let mut payload = Payload::None;
        let result = AuthenticatedPrincipal::from_request(&req, &mut payload).await;

        let err = result.unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }
}
