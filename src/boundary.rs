//! 境界文字列の生成と検証 (RFC 2046 Section 5.1.1)
//!
//! ```text
//! boundary := 0*69<bchars> bcharsnospace
//! bchars := bcharsnospace / " "
//! bcharsnospace := DIGIT / ALPHA / "'" / "(" / ")" /
//!                  "+" / "_" / "," / "-" / "." /
//!                  "/" / ":" / "=" / "?"
//! ```

use crate::error::EncodeError;

/// 境界文字列の最大長
pub const MAX_BOUNDARY_LEN: usize = 70;

/// 乱数値から境界文字列を生成する
///
/// Sans I/O の原則に従い、乱数値は呼び出し側が用意する。
/// 結果は 32 文字の小文字 16 進数になる。
///
/// ```
/// use shiguredo_multipart::boundary::boundary_from_random;
///
/// let boundary = boundary_from_random(0x90967316f8404798963cce746a4f4ef9);
/// assert_eq!(boundary, "90967316f8404798963cce746a4f4ef9");
/// ```
pub fn boundary_from_random(random_value: u128) -> String {
    format!("{:032x}", random_value)
}

/// OS の乱数源から境界文字列を生成する
pub fn generate_boundary() -> Result<String, EncodeError> {
    let mut bytes = [0u8; 16];
    getrandom::getrandom(&mut bytes).map_err(|e| EncodeError::Random(e.to_string()))?;
    Ok(boundary_from_random(u128::from_be_bytes(bytes)))
}

/// 境界文字列を検証する
pub fn validate_boundary(boundary: &str) -> Result<(), EncodeError> {
    let valid = !boundary.is_empty()
        && boundary.len() <= MAX_BOUNDARY_LEN
        && !boundary.ends_with(' ')
        && boundary.bytes().all(is_bchar);
    if valid {
        Ok(())
    } else {
        Err(EncodeError::InvalidBoundary(boundary.to_string()))
    }
}

/// 2 つの境界が区切り行として衝突するかどうか
///
/// 一方が他方の接頭辞になっていると、外側の区切り行の検索が内側の
/// 区切り行にも一致してしまう。
pub fn boundaries_collide(a: &str, b: &str) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

fn is_bchar(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'\'' | b'(' | b')' | b'+' | b'_' | b',' | b'-' | b'.' | b'/' | b':' | b'=' | b'?' | b' '
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_from_random_is_padded() {
        assert_eq!(boundary_from_random(1), "00000000000000000000000000000001");
        assert_eq!(boundary_from_random(u128::MAX).len(), 32);
    }

    #[test]
    fn test_generate_boundary() {
        let a = generate_boundary().unwrap();
        let b = generate_boundary().unwrap();
        assert_eq!(a.len(), 32);
        assert!(a.bytes().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
        assert!(validate_boundary(&a).is_ok());
    }

    #[test]
    fn test_validate_boundary() {
        assert!(validate_boundary("this-is-a-boundary").is_ok());
        assert!(validate_boundary("test boundary").is_ok());
        assert!(validate_boundary("--90967316f8404798963cce746a4f4ef9").is_ok());
        assert!(validate_boundary(&"a".repeat(70)).is_ok());

        assert!(validate_boundary("").is_err());
        assert!(validate_boundary("trailing ").is_err());
        assert!(validate_boundary(&"a".repeat(71)).is_err());
        assert!(validate_boundary("line\r\nbreak").is_err());
        assert!(validate_boundary("quote\"").is_err());
    }

    #[test]
    fn test_boundaries_collide() {
        assert!(boundaries_collide("abc", "abc"));
        assert!(boundaries_collide("abc", "abcdef"));
        assert!(boundaries_collide("abcdef", "abc"));
        assert!(!boundaries_collide("abc", "abd"));
    }
}
