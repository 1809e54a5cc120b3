use std::future::{ready, Ready};

use actix_web::{FromRequest, HttpRequest};

use crate::errors::AppError;

/// Identity resolved by the fronting gateway. The engine treats the id as
/// an opaque string and never inspects it beyond attribution.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

fn header_value(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let user = header_value(req, "X-User-Id")
            .map(|id| CurrentUser {
                id,
                display_name: header_value(req, "X-User-Name"),
                email: header_value(req, "X-User-Email"),
            })
            .ok_or_else(|| AppError::Unauthorized("Missing X-User-Id header".to_string()));

        ready(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_rt::test]
    async fn extracts_user_from_headers() {
        let req = TestRequest::default()
            .insert_header(("X-User-Id", "user-42"))
            .insert_header(("X-User-Name", "Ada Lovelace"))
            .to_http_request();

        let user = CurrentUser::extract(&req).await.expect("should extract");
        assert_eq!(user.id, "user-42");
        assert_eq!(user.display_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(user.email, None);
    }

    #[actix_rt::test]
    async fn missing_id_is_unauthorized() {
        let req = TestRequest::default().to_http_request();
        let result = CurrentUser::extract(&req).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[actix_rt::test]
    async fn blank_id_is_unauthorized() {
        let req = TestRequest::default()
            .insert_header(("X-User-Id", "   "))
            .to_http_request();
        let result = CurrentUser::extract(&req).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
