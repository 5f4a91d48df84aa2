//! Content-Type ヘッダーパース (RFC 9110 Section 8.3)
//!
//! multipart ボディの境界を取り出すため、および各パートの Content-Type を
//! 解釈するために使用します。
//!
//! ```rust
//! use shiguredo_multipart::content_type::ContentType;
//!
//! let ct = ContentType::parse("multipart/related; boundary=\"samp1\"").unwrap();
//! assert!(ct.is_multipart());
//! assert_eq!(ct.subtype(), "related");
//! assert_eq!(ct.boundary(), Some("samp1"));
//! ```

use core::fmt;

use crate::charset::Charset;
use crate::error::MultipartError;

/// Content-Type パースエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentTypeError {
    /// 空の Content-Type
    Empty,
    /// 不正なメディアタイプ形式
    InvalidMediaType,
    /// 不正なパラメータ形式
    InvalidParameter,
    /// 引用符が閉じていない
    UnterminatedQuote,
}

impl fmt::Display for ContentTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentTypeError::Empty => write!(f, "empty Content-Type"),
            ContentTypeError::InvalidMediaType => write!(f, "invalid media type"),
            ContentTypeError::InvalidParameter => write!(f, "invalid parameter"),
            ContentTypeError::UnterminatedQuote => write!(f, "unterminated quote"),
        }
    }
}

impl std::error::Error for ContentTypeError {}

/// パース済み Content-Type
///
/// ```text
/// media-type = type "/" subtype parameters
/// parameters = *( OWS ";" OWS [ parameter ] )
/// parameter  = parameter-name "=" ( token / quoted-string )
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// type (小文字化済み)
    media_type: String,
    /// subtype (小文字化済み)
    subtype: String,
    /// (小文字化済みの名前, 値)
    parameters: Vec<(String, String)>,
}

impl ContentType {
    /// Content-Type 文字列をパース
    pub fn parse(input: &str) -> Result<Self, ContentTypeError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ContentTypeError::Empty);
        }

        let (essence, mut rest) = match input.find(';') {
            Some(pos) => (&input[..pos], &input[pos..]),
            None => (input, ""),
        };
        let (media_type, subtype) = essence
            .trim()
            .split_once('/')
            .ok_or(ContentTypeError::InvalidMediaType)?;
        let (media_type, subtype) = (media_type.trim(), subtype.trim());
        if !is_token(media_type) || !is_token(subtype) {
            return Err(ContentTypeError::InvalidMediaType);
        }

        let mut parameters = Vec::new();
        loop {
            rest = rest.trim_start_matches(|c: char| c == ';' || c.is_ascii_whitespace());
            if rest.is_empty() {
                break;
            }
            let (name, after_name) = rest
                .split_once('=')
                .ok_or(ContentTypeError::InvalidParameter)?;
            let name = name.trim();
            if !is_token(name) {
                return Err(ContentTypeError::InvalidParameter);
            }
            let after_name = after_name.trim_start();
            let (value, remaining) = match after_name.strip_prefix('"') {
                Some(quoted) => unquote(quoted)?,
                None => {
                    let end = after_name
                        .find(|c: char| c == ';' || c.is_ascii_whitespace())
                        .unwrap_or(after_name.len());
                    (after_name[..end].to_string(), &after_name[end..])
                }
            };
            parameters.push((name.to_ascii_lowercase(), value));
            rest = remaining;
        }

        Ok(ContentType {
            media_type: media_type.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            parameters,
        })
    }

    /// 新しい ContentType を作成
    pub fn new(media_type: &str, subtype: &str) -> Self {
        ContentType {
            media_type: media_type.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            parameters: Vec::new(),
        }
    }

    /// パラメータを追加 (同名のパラメータは置き換える)
    pub fn with_parameter(mut self, name: &str, value: &str) -> Self {
        let name = name.to_ascii_lowercase();
        self.parameters.retain(|(n, _)| *n != name);
        self.parameters.push((name, value.to_string()));
        self
    }

    /// type を取得 (例: "multipart")
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// subtype を取得 (例: "form-data")
    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// パラメータを除いたメディアタイプ (例: "multipart/form-data")
    pub fn mime_type(&self) -> String {
        format!("{}/{}", self.media_type, self.subtype)
    }

    /// パラメータを取得 (名前は大文字小文字を区別しない)
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// すべてのパラメータを取得
    pub fn parameters(&self) -> &[(String, String)] {
        &self.parameters
    }

    /// boundary パラメータを取得
    pub fn boundary(&self) -> Option<&str> {
        self.parameter("boundary")
    }

    /// charset パラメータを既知の文字セットとして取得
    pub fn charset(&self) -> Option<Charset> {
        self.parameter("charset").and_then(Charset::from_label)
    }

    /// multipart/* かどうか
    pub fn is_multipart(&self) -> bool {
        self.media_type == "multipart"
    }

    /// multipart/form-data かどうか
    pub fn is_form_data(&self) -> bool {
        self.is_multipart() && self.subtype == "form-data"
    }

    /// multipart デコード用に境界を取り出す
    ///
    /// multipart/* でなければ `NonMultipartContentType`、
    /// boundary パラメータがない (または空) なら `MissingBoundary` を返す。
    /// boundary 以外のパラメータの構文エラーは無視する。
    pub fn multipart_boundary(input: &str) -> Result<String, MultipartError> {
        let input = input.trim();
        let essence = input.split_once(';').map_or(input, |(essence, _)| essence).trim();
        let is_multipart = essence
            .split_once('/')
            .is_some_and(|(media_type, _)| media_type.trim().eq_ignore_ascii_case("multipart"));
        if !is_multipart {
            return Err(MultipartError::NonMultipartContentType(essence.to_string()));
        }

        let boundary = match ContentType::parse(input) {
            Ok(ct) => ct.boundary().map(str::to_string),
            Err(_) => scan_boundary(input),
        };
        match boundary {
            Some(boundary) if !boundary.is_empty() => Ok(boundary),
            _ => Err(MultipartError::MissingBoundary),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.media_type, self.subtype)?;
        for (name, value) in &self.parameters {
            if is_token(value) {
                write!(f, "; {}={}", name, value)?;
            } else {
                write!(f, "; {}=\"{}\"", name, value.replace('\\', "\\\\").replace('"', "\\\""))?;
            }
        }
        Ok(())
    }
}

/// `;` で区切って boundary パラメータだけを探す
///
/// 厳密なパースに失敗した Content-Type で使う。
fn scan_boundary(input: &str) -> Option<String> {
    input.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("boundary") {
            return None;
        }
        let value = value.trim();
        match value.strip_prefix('"') {
            Some(quoted) => match unquote(quoted) {
                Ok((value, _)) => Some(value),
                Err(_) => Some(quoted.to_string()),
            },
            None => Some(value.to_string()),
        }
    })
}

/// 引用符付き文字列の本体を取り出す (先頭の `"` は除去済み)
fn unquote(input: &str) -> Result<(String, &str), ContentTypeError> {
    let mut value = String::new();
    let mut chars = input.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, escaped)) => value.push(escaped),
                None => return Err(ContentTypeError::UnterminatedQuote),
            },
            '"' => return Ok((value, &input[i + 1..])),
            _ => value.push(c),
        }
    }
    Err(ContentTypeError::UnterminatedQuote)
}

/// RFC 9110 の token かどうか
pub(crate) fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            matches!(b,
                b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' |
                b'0'..=b'9' | b'A'..=b'Z' | b'^' | b'_' | b'`' | b'a'..=b'z' | b'|' | b'~'
            )
        })
}
