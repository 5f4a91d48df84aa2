use std::fmt;

use crate::charset::Charset;

/// multipart エンコードエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// 不正な境界文字列 (RFC 2046 Section 5.1.1)
    InvalidBoundary(String),
    /// 入れ子の境界が祖先の境界と衝突している
    BoundaryCollision { outer: String, inner: String },
    /// 不正なメディアタイプ (multipart/* 以外を含む)
    InvalidMediaType(String),
    /// ヘッダーに CR / LF が含まれている
    InvalidHeader(String),
    /// 指定された文字セットで表現できない文字がある
    Unencodable { charset: Charset, field: String },
    /// 長さを事前に知る必要があるソースの長さが不明
    UnknownLength(String),
    /// ソースが申告した長さと実際に読み取った長さが一致しない
    LengthMismatch {
        field: String,
        expected: u64,
        actual: u64,
    },
    /// 乱数生成に失敗
    Random(String),
    /// ボディソースの読み取りエラー
    Io(String),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::InvalidBoundary(boundary) => {
                write!(f, "invalid boundary: {:?}", boundary)
            }
            EncodeError::BoundaryCollision { outer, inner } => {
                write!(
                    f,
                    "nested boundary {:?} collides with enclosing boundary {:?}",
                    inner, outer
                )
            }
            EncodeError::InvalidMediaType(media_type) => {
                write!(f, "invalid multipart media type: {:?}", media_type)
            }
            EncodeError::InvalidHeader(header) => {
                write!(f, "invalid part header: {:?}", header)
            }
            EncodeError::Unencodable { charset, field } => {
                write!(f, "field {:?} cannot be encoded as {}", field, charset)
            }
            EncodeError::UnknownLength(field) => {
                write!(f, "length of field {:?} is unknown", field)
            }
            EncodeError::LengthMismatch {
                field,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "field {:?} produced {} bytes but reported {}",
                    field, actual, expected
                )
            }
            EncodeError::Random(msg) => write!(f, "random generation failed: {}", msg),
            EncodeError::Io(msg) => write!(f, "body source error: {}", msg),
        }
    }
}

impl std::error::Error for EncodeError {}

impl From<std::io::Error> for EncodeError {
    fn from(e: std::io::Error) -> Self {
        EncodeError::Io(e.to_string())
    }
}

impl From<EncodeError> for std::io::Error {
    fn from(e: EncodeError) -> Self {
        match e {
            EncodeError::Io(msg) => std::io::Error::other(msg),
            other => std::io::Error::new(std::io::ErrorKind::InvalidData, other),
        }
    }
}

/// multipart デコードエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartError {
    /// Content-Type が multipart/* ではない
    NonMultipartContentType(String),
    /// Content-Type に boundary パラメータがない
    MissingBoundary,
    /// ボディに区切り行が見つからない
    MissingDelimiter,
    /// ヘッダーとボディの区切り (CRLF CRLF) がないパート
    ImproperBodyPart,
    /// 不正なパートヘッダー
    InvalidHeader,
    /// 終了区切り行の前に入力が終わった
    Incomplete,
    /// パート数超過
    TooManyParts { count: usize, limit: usize },
    /// パートヘッダーが大きすぎる
    HeaderTooLarge { size: usize, limit: usize },
    /// パートが大きすぎる
    PartTooLarge { size: usize, limit: usize },
    /// バッファサイズ超過
    BufferOverflow { size: usize, limit: usize },
    /// 入力ソースの読み取りエラー
    Io(String),
}

impl fmt::Display for MultipartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MultipartError::NonMultipartContentType(content_type) => {
                write!(f, "unexpected mimetype in content-type: {:?}", content_type)
            }
            MultipartError::MissingBoundary => write!(f, "missing boundary parameter"),
            MultipartError::MissingDelimiter => write!(f, "no multipart boundary found"),
            MultipartError::ImproperBodyPart => {
                write!(f, "improper body part: content does not contain CR-LF-CR-LF")
            }
            MultipartError::InvalidHeader => write!(f, "invalid part header"),
            MultipartError::Incomplete => write!(f, "incomplete multipart data"),
            MultipartError::TooManyParts { count, limit } => {
                write!(f, "too many parts: {} > {}", count, limit)
            }
            MultipartError::HeaderTooLarge { size, limit } => {
                write!(f, "part header too large: {} > {}", size, limit)
            }
            MultipartError::PartTooLarge { size, limit } => {
                write!(f, "part too large: {} > {}", size, limit)
            }
            MultipartError::BufferOverflow { size, limit } => {
                write!(f, "buffer overflow: {} > {}", size, limit)
            }
            MultipartError::Io(msg) => write!(f, "read error: {}", msg),
        }
    }
}

impl std::error::Error for MultipartError {}

impl From<std::io::Error> for MultipartError {
    fn from(e: std::io::Error) -> Self {
        MultipartError::Io(e.to_string())
    }
}
