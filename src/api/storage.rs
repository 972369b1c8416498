//! Client storage
//!
//! The browser keeps the admin token and the checkout in progress in cookies.
//! `ClientStorage` is read from the request's `Cookie` header and written back
//! as `Set-Cookie` headers on the response.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue},
    response::{IntoResponseParts, ResponseParts},
};
use std::collections::HashMap;
use std::convert::Infallible;

use crate::services::{CheckoutStarted, TokenStore};

pub const AUTH_TOKEN: &str = "auth_token";
pub const CHECKOUT_REQUEST_ID: &str = "checkout_request_id";
pub const PHONE_NUMBER: &str = "phone_number";

const COOKIE_ATTRIBUTES: &str = "Path=/; HttpOnly; SameSite=Lax";

#[derive(Debug, Clone, Default)]
pub struct ClientStorage {
    values: HashMap<String, String>,
    /// Pending writes; `None` removes the cookie
    changes: Vec<(String, Option<String>)>,
}

impl ClientStorage {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut values = HashMap::new();
        for header in headers.get_all(header::COOKIE) {
            let Ok(raw) = header.to_str() else {
                continue;
            };
            for pair in raw.split(';') {
                let Some((name, value)) = pair.trim().split_once('=') else {
                    continue;
                };
                let value = urlencoding::decode(value)
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| value.to_string());
                if !value.is_empty() {
                    values.insert(name.to_string(), value);
                }
            }
        }
        Self {
            values,
            changes: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.values.insert(name.to_string(), value.to_string());
        self.changes.push((name.to_string(), Some(value.to_string())));
    }

    pub fn remove(&mut self, name: &str) {
        self.values.remove(name);
        self.changes.push((name.to_string(), None));
    }

    pub fn checkout_request_id(&self) -> Option<&str> {
        self.get(CHECKOUT_REQUEST_ID)
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.get(PHONE_NUMBER)
    }

    pub fn start_checkout(&mut self, started: &CheckoutStarted) {
        self.set(CHECKOUT_REQUEST_ID, &started.checkout_request_id);
        self.set(PHONE_NUMBER, &started.phone_number);
    }

    pub fn clear_checkout(&mut self) {
        self.remove(CHECKOUT_REQUEST_ID);
        self.remove(PHONE_NUMBER);
    }

    /// `Set-Cookie` values for the pending writes
    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.changes
            .iter()
            .map(|(name, value)| match value {
                Some(value) => format!(
                    "{}={}; {}",
                    name,
                    urlencoding::encode(value),
                    COOKIE_ATTRIBUTES
                ),
                None => format!("{}=; {}; Max-Age=0", name, COOKIE_ATTRIBUTES),
            })
            .collect()
    }
}

impl TokenStore for ClientStorage {
    fn token(&self) -> Option<String> {
        self.get(AUTH_TOKEN).map(str::to_string)
    }

    fn set_token(&mut self, token: &str) {
        self.set(AUTH_TOKEN, token);
    }

    fn clear_token(&mut self) {
        self.remove(AUTH_TOKEN);
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ClientStorage {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

impl IntoResponseParts for ClientStorage {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        for cookie in self.set_cookie_headers() {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    res.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(e) => tracing::warn!("Dropping invalid cookie: {}", e),
            }
        }
        Ok(res)
    }
}
