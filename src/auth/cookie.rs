//! # 会话 Cookie
//!
//! 读取请求 Cookie 头并生成 `Set-Cookie` 值

use axum::http::{HeaderMap, HeaderValue, header};

use crate::config::AuthConfig;

/// 从 `Cookie` 头中取出指定名称的值
#[must_use]
pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// 登录成功后下发的 Cookie
#[must_use]
pub fn session_cookie(config: &AuthConfig, token: &str) -> Option<HeaderValue> {
    build_cookie(&config.cookie_name, token, config.cookie_max_age_secs(), config.secure_cookie)
}

/// 登出时清除 Cookie
#[must_use]
pub fn clear_session_cookie(config: &AuthConfig) -> Option<HeaderValue> {
    build_cookie(&config.cookie_name, "", 0, config.secure_cookie)
}

fn build_cookie(name: &str, value: &str, max_age: i64, secure: bool) -> Option<HeaderValue> {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if max_age == 0 {
        cookie.push_str("; Expires=Thu, 01 Jan 1970 00:00:00 GMT");
    }
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_cookie(raw: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(raw).unwrap());
        headers
    }

    #[test]
    fn test_parse_cookie_among_others() {
        let headers = headers_with_cookie("theme=dark; rummi_session=abc123; lang=en");
        assert_eq!(
            parse_cookie(&headers, "rummi_session"),
            Some("abc123".to_string())
        );
        assert_eq!(parse_cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_parse_cookie_ignores_empty_value() {
        let headers = headers_with_cookie("rummi_session=");
        assert_eq!(parse_cookie(&headers, "rummi_session"), None);
        assert_eq!(parse_cookie(&HeaderMap::new(), "rummi_session"), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let config = AuthConfig::default();
        let value = session_cookie(&config, "tok").unwrap();
        let value = value.to_str().unwrap();

        assert!(value.starts_with("rummi_session=tok;"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Lax"));
        assert!(value.contains("Path=/"));
        assert!(value.contains("Max-Age=604800"));
        assert!(!value.contains("Secure"));
    }

    #[test]
    fn test_secure_flag_and_clear_cookie() {
        let config = AuthConfig {
            secure_cookie: true,
            ..AuthConfig::default()
        };
        let value = clear_session_cookie(&config).unwrap();
        let value = value.to_str().unwrap();

        assert!(value.starts_with("rummi_session=;"));
        assert!(value.contains("Max-Age=0"));
        assert!(value.contains("Secure"));
    }
}
