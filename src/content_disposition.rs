//! Content-Disposition ヘッダー (RFC 7578 Section 4.2 / RFC 6266)
//!
//! エンコーダーはパートごとの `form-data; name="..."; filename="..."` を
//! この型で組み立て、デコーダーはパートの名前とファイル名をこの型で取り出します。
//!
//! ```rust
//! use shiguredo_multipart::content_disposition::ContentDisposition;
//!
//! let cd = ContentDisposition::form_data("upload").with_filename("a \"b\".txt");
//! assert_eq!(cd.to_string(), r#"form-data; name="upload"; filename="a \"b\".txt""#);
//!
//! let parsed = ContentDisposition::parse(&cd.to_string()).unwrap();
//! assert_eq!(parsed.name(), Some("upload"));
//! assert_eq!(parsed.filename(), Some("a \"b\".txt"));
//! ```

use core::fmt;

/// Content-Disposition パースエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentDispositionError {
    /// 空の入力
    Empty,
    /// 不正な disposition-type
    InvalidDispositionType,
    /// 不正なパラメータ
    InvalidParameter,
    /// 不正な RFC 5987 エンコーディング
    InvalidExtValue,
}

impl fmt::Display for ContentDispositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentDispositionError::Empty => write!(f, "empty content-disposition"),
            ContentDispositionError::InvalidDispositionType => {
                write!(f, "invalid disposition-type")
            }
            ContentDispositionError::InvalidParameter => write!(f, "invalid parameter"),
            ContentDispositionError::InvalidExtValue => write!(f, "invalid ext-value encoding"),
        }
    }
}

impl std::error::Error for ContentDispositionError {}

/// Disposition タイプ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispositionType {
    /// form-data: multipart/form-data のパート
    FormData,
    /// attachment: multipart/mixed などの添付パート
    Attachment,
    /// inline
    Inline,
}

impl fmt::Display for DispositionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DispositionType::FormData => "form-data",
            DispositionType::Attachment => "attachment",
            DispositionType::Inline => "inline",
        })
    }
}

/// Content-Disposition ヘッダー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    disposition_type: DispositionType,
    /// name パラメータ
    name: Option<String>,
    /// filename パラメータ
    filename: Option<String>,
    /// filename* パラメータ (デコード済み)
    filename_ext: Option<String>,
    /// その他のパラメータ
    parameters: Vec<(String, String)>,
}

impl ContentDisposition {
    /// 指定した disposition-type で作成
    pub fn new(disposition_type: DispositionType) -> Self {
        ContentDisposition {
            disposition_type,
            name: None,
            filename: None,
            filename_ext: None,
            parameters: Vec::new(),
        }
    }

    /// `form-data; name="<name>"` を作成
    pub fn form_data(name: &str) -> Self {
        let mut cd = ContentDisposition::new(DispositionType::FormData);
        cd.name = Some(name.to_string());
        cd
    }

    /// filename を設定
    pub fn with_filename(mut self, filename: &str) -> Self {
        self.filename = Some(filename.to_string());
        self
    }

    /// Content-Disposition ヘッダー値をパース
    pub fn parse(input: &str) -> Result<Self, ContentDispositionError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ContentDispositionError::Empty);
        }

        let mut segments = split_unquoted_semicolons(input).into_iter();
        let disposition_type = match segments
            .next()
            .map(|s| s.trim().to_ascii_lowercase())
            .as_deref()
        {
            Some("form-data") => DispositionType::FormData,
            Some("attachment") => DispositionType::Attachment,
            Some("inline") => DispositionType::Inline,
            _ => return Err(ContentDispositionError::InvalidDispositionType),
        };

        let mut cd = ContentDisposition::new(disposition_type);
        for segment in segments {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let (name, value) = segment
                .split_once('=')
                .ok_or(ContentDispositionError::InvalidParameter)?;
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim();
            match name.as_str() {
                "name" => cd.name = Some(parse_value(value)?),
                "filename" => cd.filename = Some(parse_value(value)?),
                "filename*" => cd.filename_ext = Some(parse_ext_value(value)?),
                _ => cd.parameters.push((name, parse_value(value)?)),
            }
        }
        Ok(cd)
    }

    /// disposition-type を取得
    pub fn disposition_type(&self) -> DispositionType {
        self.disposition_type
    }

    /// name パラメータを取得
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// ファイル名を取得 (filename* があればそちらを優先)
    pub fn filename(&self) -> Option<&str> {
        self.filename_ext.as_deref().or(self.filename.as_deref())
    }

    /// その他のパラメータを取得
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// form-data かどうか
    pub fn is_form_data(&self) -> bool {
        self.disposition_type == DispositionType::FormData
    }
}

impl fmt::Display for ContentDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.disposition_type)?;
        if let Some(name) = &self.name {
            write!(f, "; name=\"{}\"", escape(name))?;
        }
        if let Some(filename) = &self.filename {
            write!(f, "; filename=\"{}\"", escape(filename))?;
        }
        if let Some(filename_ext) = &self.filename_ext {
            write!(f, "; filename*=UTF-8''{}", percent_encode(filename_ext))?;
        }
        for (name, value) in &self.parameters {
            write!(f, "; {}=\"{}\"", name, escape(value))?;
        }
        Ok(())
    }
}

/// 引用符の外にあるセミコロンで分割
fn split_unquoted_semicolons(input: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                segments.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&input[start..]);
    segments
}

/// token または quoted-string の値を取り出す
fn parse_value(value: &str) -> Result<String, ContentDispositionError> {
    let Some(inner) = value.strip_prefix('"') else {
        return Ok(value.to_string());
    };
    let inner = inner
        .strip_suffix('"')
        .ok_or(ContentDispositionError::InvalidParameter)?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            out.push(chars.next().ok_or(ContentDispositionError::InvalidParameter)?);
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

/// RFC 5987 ext-value (`UTF-8'lang'%XX..`) をデコード
fn parse_ext_value(value: &str) -> Result<String, ContentDispositionError> {
    let mut pieces = value.splitn(3, '\'');
    let charset = pieces.next().unwrap_or_default();
    let encoded = match (pieces.next(), pieces.next()) {
        (Some(_language), Some(encoded)) => encoded,
        _ => return Err(ContentDispositionError::InvalidExtValue),
    };
    if !charset.eq_ignore_ascii_case("UTF-8") {
        return Err(ContentDispositionError::InvalidExtValue);
    }

    let bytes = encoded.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes
                .get(i + 1..i + 3)
                .and_then(|h| std::str::from_utf8(h).ok())
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or(ContentDispositionError::InvalidExtValue)?;
            decoded.push(hex);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(decoded).map_err(|_| ContentDispositionError::InvalidExtValue)
}

fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&b) {
            out.push(char::from(b));
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_data_display() {
        assert_eq!(
            ContentDisposition::form_data("field").to_string(),
            "form-data; name=\"field\""
        );
        assert_eq!(
            ContentDisposition::form_data("file")
                .with_filename("filename")
                .to_string(),
            "form-data; name=\"file\"; filename=\"filename\""
        );
    }

    #[test]
    fn test_parse_form_data() {
        let cd = ContentDisposition::parse("form-data; name=\"field 1\"").unwrap();
        assert!(cd.is_form_data());
        assert_eq!(cd.name(), Some("field 1"));
        assert_eq!(cd.filename(), None);
    }

    #[test]
    fn test_parse_semicolon_inside_quotes() {
        let cd = ContentDisposition::parse("form-data; name=\"a;b\"; filename=c.txt").unwrap();
        assert_eq!(cd.name(), Some("a;b"));
        assert_eq!(cd.filename(), Some("c.txt"));
    }

    #[test]
    fn test_parse_filename_ext_preferred() {
        let cd = ContentDisposition::parse(
            "attachment; filename=\"fallback.txt\"; filename*=UTF-8''%E6%97%A5%E6%9C%AC.txt",
        )
        .unwrap();
        assert_eq!(cd.disposition_type(), DispositionType::Attachment);
        assert_eq!(cd.filename(), Some("日本.txt"));
    }

    #[test]
    fn test_parse_other_parameter() {
        let cd = ContentDisposition::parse("inline; size=42").unwrap();
        assert_eq!(cd.parameter("SIZE"), Some("42"));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            ContentDisposition::parse(""),
            Err(ContentDispositionError::Empty)
        );
        assert_eq!(
            ContentDisposition::parse("unknown; name=x"),
            Err(ContentDispositionError::InvalidDispositionType)
        );
        assert_eq!(
            ContentDisposition::parse("form-data; name=\"x"),
            Err(ContentDispositionError::InvalidParameter)
        );
        assert_eq!(
            ContentDisposition::parse("form-data; name"),
            Err(ContentDispositionError::InvalidParameter)
        );
        assert_eq!(
            ContentDisposition::parse("attachment; filename*=latin1''abc"),
            Err(ContentDispositionError::InvalidExtValue)
        );
        assert_eq!(
            ContentDisposition::parse("attachment; filename*=UTF-8''%zz"),
            Err(ContentDispositionError::InvalidExtValue)
        );
    }

    #[test]
    fn test_non_ascii_name_roundtrip() {
        let cd = ContentDisposition::form_data("名前");
        let parsed = ContentDisposition::parse(&cd.to_string()).unwrap();
        assert_eq!(parsed.name(), Some("名前"));
    }

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode("a b.txt"), "a%20b.txt");
    }
}
