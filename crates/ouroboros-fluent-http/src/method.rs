//! HTTP verbs understood by the request-shape calls

use crate::error::HttpError;
use std::fmt;
use std::str::FromStr;

/// HTTP request methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl HttpMethod {
    /// Every verb, in routing order
    pub const ALL: [HttpMethod; 7] = [
        Self::Get,
        Self::Head,
        Self::Post,
        Self::Put,
        Self::Patch,
        Self::Delete,
        Self::Options,
    ];

    /// Wire form (uppercase)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
        }
    }

    /// Call-name form (lowercase), e.g. `post` in `post_json`
    pub fn token(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Head => "head",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Delete => "delete",
            Self::Options => "options",
        }
    }

    /// Match an exact lowercase call token
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.token() == token)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = HttpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(&s.to_ascii_lowercase())
            .ok_or_else(|| HttpError::InvalidArgument(format!("Invalid HTTP method: {}", s)))
    }
}

impl From<HttpMethod> for http::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => http::Method::GET,
            HttpMethod::Head => http::Method::HEAD,
            HttpMethod::Post => http::Method::POST,
            HttpMethod::Put => http::Method::PUT,
            HttpMethod::Patch => http::Method::PATCH,
            HttpMethod::Delete => http::Method::DELETE,
            HttpMethod::Options => http::Method::OPTIONS,
        }
    }
}

/// Parse any method token (including extension methods such as `PURGE`)
/// into its uppercase wire form.
pub fn parse_wire_method(method: &str) -> Result<http::Method, HttpError> {
    let upper = method.trim().to_ascii_uppercase();
    if upper.is_empty() {
        return Err(HttpError::InvalidArgument("HTTP method cannot be empty".to_string()));
    }
    http::Method::from_bytes(upper.as_bytes())
        .map_err(|_| HttpError::InvalidArgument(format!("Invalid HTTP method: {}", method)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_method_as_str_and_token() {
        assert_eq!(HttpMethod::Get.as_str(), "GET");
        assert_eq!(HttpMethod::Options.as_str(), "OPTIONS");
        assert_eq!(HttpMethod::Patch.token(), "patch");
        for method in HttpMethod::ALL {
            assert_eq!(method.as_str().to_ascii_lowercase(), method.token());
        }
    }

    #[test]
    fn test_http_method_from_str() {
        assert_eq!(HttpMethod::from_str("GET").unwrap(), HttpMethod::Get);
        assert_eq!(HttpMethod::from_str("post").unwrap(), HttpMethod::Post);
        assert_eq!(HttpMethod::from_str("Delete").unwrap(), HttpMethod::Delete);
        assert!(matches!(
            HttpMethod::from_str("INVALID"),
            Err(HttpError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parse_wire_method_uppercases() {
        assert_eq!(parse_wire_method("post").unwrap(), http::Method::POST);
        assert_eq!(parse_wire_method("purge").unwrap().as_str(), "PURGE");
        assert!(parse_wire_method("").is_err());
        assert!(parse_wire_method("bad method").is_err());
    }

    #[test]
    fn test_into_http_method() {
        let method: http::Method = HttpMethod::Head.into();
        assert_eq!(method, http::Method::HEAD);
    }
}
