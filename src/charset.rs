//! テキストフィールド用の文字セット
//!
//! エンコーダーはテキスト値とパートヘッダーを構築時に一度だけこの文字セットで
//! バイト列に変換し、以降は変換済みのバイト列のみを扱います。
//! バイト列として渡された値は変換しません。

use core::fmt;
use std::borrow::Cow;

/// 文字セット
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    /// UTF-8
    #[default]
    Utf8,
    /// ISO-8859-1
    Latin1,
}

impl Charset {
    /// ラベルから文字セットを取得 (大文字小文字を区別しない)
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Some(Charset::Utf8),
            "iso-8859-1" | "iso8859-1" | "latin-1" | "latin1" => Some(Charset::Latin1),
            _ => None,
        }
    }

    /// 正規のラベル
    pub fn name(&self) -> &'static str {
        match self {
            Charset::Utf8 => "utf-8",
            Charset::Latin1 => "iso-8859-1",
        }
    }

    /// 文字列をエンコード
    ///
    /// 表現できない文字が含まれる場合は None を返す。
    pub fn encode(&self, text: &str) -> Option<Vec<u8>> {
        match self {
            Charset::Utf8 => Some(text.as_bytes().to_vec()),
            Charset::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).ok())
                .collect(),
        }
    }

    /// バイト列をデコード
    ///
    /// UTF-8 として不正なバイト列の場合は None を返す。
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        match self {
            Charset::Utf8 => std::str::from_utf8(bytes).ok().map(Cow::Borrowed),
            Charset::Latin1 => {
                if bytes.is_ascii() {
                    // ASCII のみなら UTF-8 としてそのまま使える
                    std::str::from_utf8(bytes).ok().map(Cow::Borrowed)
                } else {
                    Some(Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()))
                }
            }
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label() {
        assert_eq!(Charset::from_label("UTF-8"), Some(Charset::Utf8));
        assert_eq!(Charset::from_label("utf8"), Some(Charset::Utf8));
        assert_eq!(Charset::from_label("Latin-1"), Some(Charset::Latin1));
        assert_eq!(Charset::from_label(" ISO-8859-1 "), Some(Charset::Latin1));
        assert_eq!(Charset::from_label("shift_jis"), None);
    }

    #[test]
    fn test_encode_latin1() {
        assert_eq!(Charset::Latin1.encode("caf\u{e9}"), Some(b"caf\xe9".to_vec()));
        assert_eq!(Charset::Latin1.encode("\u{3042}"), None);
        assert_eq!(Charset::Latin1.encode(""), Some(Vec::new()));
    }

    #[test]
    fn test_encode_utf8() {
        assert_eq!(
            Charset::Utf8.encode("caf\u{e9}"),
            Some(b"caf\xc3\xa9".to_vec())
        );
    }

    #[test]
    fn test_decode() {
        assert_eq!(Charset::Utf8.decode(b"abc").as_deref(), Some("abc"));
        assert_eq!(Charset::Utf8.decode(b"\xff"), None);
        assert_eq!(Charset::Latin1.decode(b"caf\xe9").as_deref(), Some("caf\u{e9}"));
        // 同じバイト列でも文字セットによって結果が変わる
        assert_ne!(
            Charset::Utf8.decode(b"caf\xc3\xa9"),
            Charset::Latin1.decode(b"caf\xc3\xa9")
        );
    }
}
