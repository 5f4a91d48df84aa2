//! バッファ済み multipart デコーダー
//!
//! ボディ全体がメモリ上にある場合に使います。パースは構築時に一度だけ行われ、
//! 不正なボディは構築時のエラーになります。
//!
//! ボディ全体が手元にあるため、終了区切り行 `--<boundary>--` がなくても
//! 入力の終わりで最後のパートを閉じます。
//!
//! ```rust
//! use shiguredo_multipart::{MultipartDecoder, MultipartError};
//!
//! let body = b"--b\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n1\r\n--b--\r\n";
//! let decoder = MultipartDecoder::new(body, "multipart/form-data; boundary=b").unwrap();
//! assert_eq!(decoder.boundary(), "b");
//! assert_eq!(decoder.parts()[0].text().as_deref(), Some("1"));
//!
//! assert!(matches!(
//!     MultipartDecoder::new(b"\xff\xd8", "image/jpeg"),
//!     Err(MultipartError::NonMultipartContentType(_))
//! ));
//! ```

use crate::body_part::BodyPart;
use crate::charset::Charset;
use crate::content_type::ContentType;
use crate::error::MultipartError;
use crate::limits::MultipartLimits;
use crate::parser::MultipartParser;

/// バッファ済み multipart デコーダー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartDecoder {
    content_type: String,
    boundary: String,
    charset: Charset,
    parts: Vec<BodyPart>,
}

impl MultipartDecoder {
    /// UTF-8 でデコード
    pub fn new(content: &[u8], content_type: &str) -> Result<Self, MultipartError> {
        Self::with_charset(content, content_type, Charset::Utf8)
    }

    /// 文字セットを指定してデコード
    pub fn with_charset(
        content: &[u8],
        content_type: &str,
        charset: Charset,
    ) -> Result<Self, MultipartError> {
        Self::with_options(content, content_type, charset, MultipartLimits::unlimited())
    }

    /// 文字セットと制限を指定してデコード
    pub fn with_options(
        content: &[u8],
        content_type: &str,
        charset: Charset,
        limits: MultipartLimits,
    ) -> Result<Self, MultipartError> {
        let boundary = ContentType::multipart_boundary(content_type)?;
        let mut parser =
            MultipartParser::with_options(&boundary, charset, limits).allow_unterminated(true);
        parser.feed(content)?;
        parser.finish();

        let mut parts = Vec::new();
        while let Some(part) = parser.next_part()? {
            parts.push(part);
        }
        tracing::debug!(boundary = %boundary, parts = parts.len(), "multipart body decoded");

        Ok(MultipartDecoder {
            content_type: content_type.to_string(),
            boundary,
            charset,
            parts,
        })
    }

    /// 元の Content-Type ヘッダー値
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Content-Type から取り出した境界文字列
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// テキストのデコードに使う文字セット
    pub fn charset(&self) -> Charset {
        self.charset
    }

    /// デコード済みのパート (出現順)
    pub fn parts(&self) -> &[BodyPart] {
        &self.parts
    }

    /// パートを取り出す
    pub fn into_parts(self) -> Vec<BodyPart> {
        self.parts
    }
}

impl IntoIterator for MultipartDecoder {
    type Item = BodyPart;
    type IntoIter = std::vec::IntoIter<BodyPart>;

    fn into_iter(self) -> Self::IntoIter {
        self.parts.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT_TYPE: &str = "multipart/form-data; boundary=this-is-a-boundary";

    #[test]
    fn test_decode_two_fields() {
        let body = b"--this-is-a-boundary\r\n\
            Content-Disposition: form-data; name=\"field\"\r\n\r\n\
            value\r\n\
            --this-is-a-boundary\r\n\
            Content-Disposition: form-data; name=\"other_field\"\r\n\r\n\
            other_value\r\n\
            --this-is-a-boundary--\r\n";
        let decoder = MultipartDecoder::new(body, CONTENT_TYPE).unwrap();
        let fields: Vec<(&str, String)> = decoder
            .parts()
            .iter()
            .map(|p| (p.name().unwrap(), p.text().unwrap().into_owned()))
            .collect();
        assert_eq!(
            fields,
            [
                ("field", "value".to_string()),
                ("other_field", "other_value".to_string())
            ]
        );
        assert_eq!(decoder.content_type(), CONTENT_TYPE);
    }

    #[test]
    fn test_absent_empty_present() {
        let body = b"--b\r\nHeader: absent\r\n\
            \r\n--b\r\nHeader: empty\r\n\r\n\
            \r\n--b\r\nHeader: present\r\n\r\nbytes\
            \r\n--b--\r\n";
        let decoder = MultipartDecoder::new(body, "multipart/mixed; boundary=b").unwrap();
        let contents: Vec<Option<&[u8]>> = decoder.parts().iter().map(|p| p.content()).collect();
        assert_eq!(contents, [None, Some(&b""[..]), Some(&b"bytes"[..])]);
    }

    #[test]
    fn test_quoted_boundary() {
        let body = b"--test boundary\r\n\r\nx\r\n--test boundary--";
        let decoder =
            MultipartDecoder::new(body, "multipart/form-data; boundary=\"test boundary\"").unwrap();
        assert_eq!(decoder.boundary(), "test boundary");
        assert_eq!(decoder.parts().len(), 1);
    }

    #[test]
    fn test_non_multipart() {
        assert_eq!(
            MultipartDecoder::new(b"data", "image/jpeg"),
            Err(MultipartError::NonMultipartContentType("image/jpeg".to_string()))
        );
    }

    #[test]
    fn test_missing_boundary() {
        assert_eq!(
            MultipartDecoder::new(b"data", "multipart/form-data"),
            Err(MultipartError::MissingBoundary)
        );
    }

    #[test]
    fn test_improper_body_part_is_distinct() {
        let body = b"--b\r\nno separator\r\n--b--\r\n";
        assert_eq!(
            MultipartDecoder::new(body, "multipart/form-data; boundary=b"),
            Err(MultipartError::ImproperBodyPart)
        );
    }

    #[test]
    fn test_missing_delimiter() {
        let ct = "multipart/form-data; boundary=b";
        assert_eq!(
            MultipartDecoder::new(b"", ct),
            Err(MultipartError::MissingDelimiter)
        );
        assert_eq!(
            MultipartDecoder::new(b"plain text", ct),
            Err(MultipartError::MissingDelimiter)
        );
    }

    #[test]
    fn test_without_closing_delimiter() {
        let ct = "multipart/form-data; boundary=b";
        let decoder = MultipartDecoder::new(b"--b\r\nA: 1\r\n\r\nx", ct).unwrap();
        assert_eq!(decoder.parts().len(), 1);
        assert_eq!(decoder.parts()[0].headers().get_str("A"), Some("1"));
        assert_eq!(decoder.parts()[0].content(), Some(&b"x"[..]));

        let decoder = MultipartDecoder::new(b"--b\r\nA: 1\r\n\r\nx\r\n--b\r\n", ct).unwrap();
        assert_eq!(decoder.parts().len(), 1);
        assert_eq!(decoder.parts()[0].content(), Some(&b"x"[..]));

        let decoder = MultipartDecoder::new(b"--b\r\n\r\n1\r\n--b\r\n\r\n2", ct).unwrap();
        let contents: Vec<_> = decoder.parts().iter().map(|p| p.content()).collect();
        assert_eq!(contents, [Some(&b"1"[..]), Some(&b"2"[..])]);
    }

    #[test]
    fn test_latin1_charset() {
        let body = b"--b\r\n\r\ncaf\xe9\r\n--b--";
        let decoder = MultipartDecoder::with_charset(
            body,
            "multipart/form-data; boundary=b",
            Charset::Latin1,
        )
        .unwrap();
        assert_eq!(decoder.charset(), Charset::Latin1);
        assert_eq!(decoder.parts()[0].text().as_deref(), Some("caf\u{e9}"));
    }

    #[test]
    fn test_limits_apply() {
        let body = b"--b\r\n\r\n1\r\n--b\r\n\r\n2\r\n--b--";
        let limits = MultipartLimits {
            max_parts: 1,
            ..MultipartLimits::unlimited()
        };
        assert!(matches!(
            MultipartDecoder::with_options(body, "multipart/mixed; boundary=b", Charset::Utf8, limits),
            Err(MultipartError::TooManyParts { .. })
        ));
    }

    #[test]
    fn test_into_iter() {
        let body = b"--b\r\n\r\n1\r\n--b\r\n\r\n2\r\n--b--";
        let decoder = MultipartDecoder::new(body, "multipart/mixed; boundary=b").unwrap();
        let contents: Vec<Vec<u8>> = decoder.into_iter().filter_map(|p| p.into_content()).collect();
        assert_eq!(contents, [b"1".to_vec(), b"2".to_vec()]);
    }
}
