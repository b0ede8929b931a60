//! API handlers module

pub mod authors;
pub mod health;
pub mod library;
pub mod papers;
pub mod search;

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use citegraph_common::errors::{AppError, Result};
use citegraph_common::library::DEFAULT_USER;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::str::FromStr;

/// Raw query string parameters. Typed parsing happens per handler so that
/// malformed numbers surface as validation errors rather than extractor
/// rejections.
pub type QueryParams = HashMap<String, String>;

/// JSON request body whose rejections render as `AppError`.
///
/// The content type is not checked; anything that does not decode into `T`
/// is an `InvalidFormat` error.
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(request: Request, state: &S) -> Result<Self> {
        let body = Bytes::from_request(request, state)
            .await
            .map_err(|e| AppError::InvalidFormat { message: e.body_text() })?;

        decode_json(&body).map(JsonBody)
    }
}

/// Decode a JSON body, mapping serde errors to `InvalidFormat`
pub fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| AppError::InvalidFormat {
        message: format!("Invalid request body: {}", e),
    })
}

/// Optional numeric parameter; empty counts as absent
pub fn parse_number<T: FromStr>(params: &QueryParams, key: &str) -> Result<Option<T>> {
    match params.get(key).map(|v| v.trim()) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| AppError::invalid(key, format!("{} must be an integer", key))),
    }
}

/// Boolean flag, true only for a case-insensitive "true"
pub fn parse_flag(params: &QueryParams, key: &str, default: bool) -> bool {
    match params.get(key).map(|v| v.trim()) {
        None | Some("") => default,
        Some(raw) => raw.eq_ignore_ascii_case("true"),
    }
}

/// Owner of library resources, `anonymous` when not given
pub fn user_id(params: &QueryParams) -> String {
    params
        .get("user_id")
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_USER)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_parse_number() {
        let p = params(&[("page", "3"), ("empty", ""), ("bad", "abc")]);

        assert_eq!(parse_number::<u32>(&p, "page").unwrap(), Some(3));
        assert_eq!(parse_number::<u32>(&p, "empty").unwrap(), None);
        assert_eq!(parse_number::<u32>(&p, "missing").unwrap(), None);

        let err = parse_number::<i64>(&p, "bad").unwrap_err();
        assert!(matches!(err, AppError::Validation { field: Some(ref f), .. } if f == "bad"));
    }

    #[test]
    fn test_parse_flag() {
        let p = params(&[("a", "TRUE"), ("b", "false"), ("c", "yes")]);

        assert!(parse_flag(&p, "a", false));
        assert!(!parse_flag(&p, "b", true));
        assert!(!parse_flag(&p, "c", true));
        assert!(parse_flag(&p, "missing", true));
    }

    #[test]
    fn test_decode_json_errors_are_invalid_format() {
        let err = decode_json::<Vec<String>>(br#"{"paper_ids":"W1"}"#).unwrap_err();
        assert!(matches!(err, AppError::InvalidFormat { .. }));
        assert!(decode_json::<Vec<String>>(b"").is_err());
        assert_eq!(decode_json::<Vec<String>>(br#"["W1"]"#).unwrap(), vec!["W1".to_string()]);
    }

    #[test]
    fn test_user_id_default() {
        assert_eq!(user_id(&params(&[])), "anonymous");
        assert_eq!(user_id(&params(&[("user_id", " ")])), "anonymous");
        assert_eq!(user_id(&params(&[("user_id", "u1")])), "u1");
    }
}
