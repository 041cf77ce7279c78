//! # 密码哈希
//!
//! bcrypt 加盐慢哈希；校验失败一律返回 `false`

use crate::error::Result;

/// 生成密码哈希，每次调用使用新的随机盐
pub fn hash_password(plaintext: &str, cost: u32) -> Result<String> {
    Ok(bcrypt::hash(plaintext, cost)?)
}

/// 校验密码
///
/// 哈希格式错误时同样返回 `false`。
#[must_use]
pub fn verify_password(plaintext: &str, hash: &str) -> bool {
    bcrypt::verify(plaintext, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[test]
    fn test_hash_verify_round_trip() {
        let hash = hash_password("s3cret-pass", TEST_COST).unwrap();
        assert!(verify_password("s3cret-pass", &hash));
        assert!(!verify_password("wrong-pass", &hash));
    }

    #[test]
    fn test_same_input_gives_different_hashes() {
        let first = hash_password("s3cret-pass", TEST_COST).unwrap();
        let second = hash_password("s3cret-pass", TEST_COST).unwrap();

        assert_ne!(first, second);
        assert!(verify_password("s3cret-pass", &first));
        assert!(verify_password("s3cret-pass", &second));
    }

    #[test]
    fn test_malformed_hash_is_false() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
        assert!(!verify_password("anything", ""));
    }
}
