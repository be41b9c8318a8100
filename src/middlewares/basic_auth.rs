use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{self, HeaderValue};
use actix_web::{Error, HttpResponse};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::future::LocalBoxFuture;
use log::{debug, warn};
use std::future::{ready, Ready};
use std::rc::Rc;

use crate::config::Credentials;

/// Rutas que se sirven sin credenciales.
pub const PUBLIC_PATHS: [&str; 1] = ["/robots.txt"];

/// Autenticación HTTP básica con un único par de credenciales compartidas.
///
/// Sin credenciales válidas la respuesta es 401 con el desafío
/// `WWW-Authenticate`; cada petición se evalúa por separado.
#[derive(Clone)]
pub struct BasicAuth {
    gate: Rc<Gate>,
}

struct Gate {
    credentials: Credentials,
    challenge: String,
}

impl BasicAuth {
    pub fn new(credentials: Credentials, realm: &str) -> Self {
        let realm = realm.replace('"', "'");
        Self {
            gate: Rc::new(Gate {
                credentials,
                challenge: format!("Basic realm=\"{}\", charset=\"UTF-8\"", realm),
            }),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for BasicAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = BasicAuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BasicAuthMiddleware {
            service,
            gate: Rc::clone(&self.gate),
        }))
    }
}

pub struct BasicAuthMiddleware<S> {
    service: S,
    gate: Rc<Gate>,
}

impl<S, B> Service<ServiceRequest> for BasicAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let public = PUBLIC_PATHS.contains(&req.path());
        let authorized =
            public || is_authorized(req.headers().get(header::AUTHORIZATION), &self.gate.credentials);

        if authorized {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) });
        }

        if req.headers().contains_key(header::AUTHORIZATION) {
            warn!("Rejected credentials for {} {}", req.method(), req.path());
        } else {
            debug!("Missing credentials for {} {}", req.method(), req.path());
        }

        let response = HttpResponse::Unauthorized()
            .insert_header((header::WWW_AUTHENTICATE, self.gate.challenge.clone()))
            .body("Unauthorized");
        let res = req.into_response(response).map_into_right_body();
        Box::pin(async move { Ok(res) })
    }
}

/// Valida una cabecera `Authorization: Basic ...` contra las credenciales.
pub fn is_authorized(header: Option<&HeaderValue>, credentials: &Credentials) -> bool {
    let Some((username, password)) = header.and_then(decode_basic) else {
        return false;
    };
    // ambas comparaciones se evalúan siempre
    let user_ok = constant_time_eq(username.as_bytes(), credentials.username.as_bytes());
    let password_ok = constant_time_eq(password.as_bytes(), credentials.password.as_bytes());
    user_ok & password_ok
}

fn decode_basic(header: &HeaderValue) -> Option<(String, String)> {
    let value = header.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic(user: &str, password: &str) -> HeaderValue {
        let token = STANDARD.encode(format!("{}:{}", user, password));
        HeaderValue::from_str(&format!("Basic {}", token)).unwrap()
    }

    fn credentials() -> Credentials {
        Credentials::new("fiocruz", "linhas:2024")
    }

    #[test]
    fn test_valid_credentials() {
        assert!(is_authorized(Some(&basic("fiocruz", "linhas:2024")), &credentials()));
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        let token = STANDARD.encode("fiocruz:linhas:2024");
        let header = HeaderValue::from_str(&format!("basic {}", token)).unwrap();
        assert!(is_authorized(Some(&header), &credentials()));
    }

    #[test]
    fn test_rejected_credentials() {
        assert!(!is_authorized(None, &credentials()));
        assert!(!is_authorized(Some(&basic("fiocruz", "otra")), &credentials()));
        assert!(!is_authorized(Some(&basic("otro", "linhas:2024")), &credentials()));
        assert!(!is_authorized(Some(&HeaderValue::from_static("Bearer abc")), &credentials()));
        assert!(!is_authorized(Some(&HeaderValue::from_static("Basic %%%")), &credentials()));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
