//! tokio-multipart エラー型

use std::fmt;

use shiguredo_multipart::{EncodeError, MultipartError};

/// tokio-multipart エラー
#[derive(Debug)]
pub enum Error {
    /// I/O エラー
    Io(std::io::Error),
    /// multipart エンコードエラー
    Encode(EncodeError),
    /// multipart デコードエラー
    Multipart(MultipartError),
    /// メッセージに Content-Type ヘッダーがない
    MissingContentType,
    /// 読み取りタイムアウト
    Timeout,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Encode(e) => write!(f, "multipart encode error: {}", e),
            Error::Multipart(e) => write!(f, "multipart decode error: {}", e),
            Error::MissingContentType => write!(f, "missing Content-Type header"),
            Error::Timeout => write!(f, "read timeout"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Encode(e) => Some(e),
            Error::Multipart(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        // BodySource 経由で io::Error に包まれたエンコードエラーは元に戻す
        if let Some(encode) = e
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<EncodeError>())
        {
            return Error::Encode(encode.clone());
        }
        Error::Io(e)
    }
}

impl From<EncodeError> for Error {
    fn from(e: EncodeError) -> Self {
        Error::Encode(e)
    }
}

impl From<MultipartError> for Error {
    fn from(e: MultipartError) -> Self {
        Error::Multipart(e)
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Error::Timeout
    }
}

/// Result 型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_error_recovered_from_io_error() {
        let original = EncodeError::UnknownLength("asset".to_string());
        let io: std::io::Error = original.clone().into();
        assert!(matches!(Error::from(io), Error::Encode(e) if e == original));
    }

    #[test]
    fn test_plain_io_error() {
        let io = std::io::Error::other("broken pipe");
        assert!(matches!(Error::from(io), Error::Io(_)));
    }
}
