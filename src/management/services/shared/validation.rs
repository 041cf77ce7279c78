//! 请求字段校验
//!
//! 失败时返回携带字段名的 `AppError::Validation`，消息直接面向客户端。

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::{AppError, Result};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("valid phone regex"));
static PINCODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{6}$").expect("valid pincode regex"));

/// 密码最小长度
pub const MIN_PASSWORD_LEN: usize = 8;

/// 校验字符长度（按字符计数，首尾空白不计）
pub fn validate_length(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
    let len = value.trim().chars().count();
    if len < min {
        return Err(AppError::validation_field(
            field,
            format!("{field} must be at least {min} characters"),
        ));
    }
    if len > max {
        return Err(AppError::validation_field(
            field,
            format!("{field} must be at most {max} characters"),
        ));
    }
    Ok(())
}

/// 校验非空
pub fn validate_required(field: &str, value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation_field(field, message));
    }
    Ok(())
}

/// 校验邮箱格式，返回小写形式
pub fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    if !EMAIL_RE.is_match(&email) {
        return Err(AppError::validation_field("email", "Invalid email address"));
    }
    Ok(email)
}

/// 手机号：10 位数字
pub fn validate_phone(phone: &str) -> Result<()> {
    if !PHONE_RE.is_match(phone) {
        return Err(AppError::validation_field("phone", "Phone must be 10 digits"));
    }
    Ok(())
}

/// 邮编：6 位数字
pub fn validate_pincode(pincode: &str) -> Result<()> {
    if !PINCODE_RE.is_match(pincode) {
        return Err(AppError::validation_field(
            "pincode",
            "Pincode must be 6 digits",
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation_field(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    Ok(())
}

/// 必须为正数
pub fn validate_positive(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AppError::validation_field(
            field,
            format!("{field} must be a positive number"),
        ));
    }
    Ok(())
}

/// 解析 `YYYY-MM-DD` 日期
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::validation_field(field, format!("{field} must be a date in YYYY-MM-DD format"))
    })
}
