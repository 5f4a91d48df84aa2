//! デコード済みのパート
//!
//! 区切り行と区切り行の間のバイト列 (セグメント) を一つのパートとして解釈します。
//! パートのボディは次の 3 通りを区別します。
//!
//! - ヘッダーだけで空行がない: `content()` は None
//! - 空行の直後に区切り行: `content()` は `Some(b"")`
//! - 空行の後にバイト列: `content()` はそのバイト列

use std::borrow::Cow;

use crate::charset::Charset;
use crate::content_disposition::ContentDisposition;
use crate::content_type::{ContentType, is_token};
use crate::error::MultipartError;

/// パートヘッダー
///
/// 名前は大文字小文字を区別せずに比較し、値はデコードせずバイト列のまま保持する。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartHeaders {
    entries: Vec<(String, Vec<u8>)>,
}

impl PartHeaders {
    /// ヘッダー値を取得 (同名が複数ある場合は最初のもの)
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_slice())
    }

    /// ヘッダー値を UTF-8 文字列として取得
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| std::str::from_utf8(v).ok())
    }

    /// 同名のヘッダー値をすべて取得
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a [u8]> + 'a {
        self.entries
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_slice())
    }

    /// ヘッダーが存在するかどうか
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// 出現順にすべてのヘッダーを走査
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    /// ヘッダーの数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// ヘッダーが一つもないかどうか
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// ヘッダーブロックをパースする
    ///
    /// 行頭が SP / HTAB の行は直前のヘッダー値の継続行として、
    /// 単一の空白で連結する。
    pub(crate) fn parse(block: &[u8]) -> Result<Self, MultipartError> {
        let mut entries: Vec<(String, Vec<u8>)> = Vec::new();
        if block.is_empty() {
            return Ok(PartHeaders { entries });
        }
        for line in split_crlf(block) {
            if line.first().is_some_and(|b| *b == b' ' || *b == b'\t') {
                let (_, value) = entries.last_mut().ok_or(MultipartError::InvalidHeader)?;
                value.push(b' ');
                value.extend_from_slice(trim(line));
                continue;
            }
            let colon = line
                .iter()
                .position(|b| *b == b':')
                .ok_or(MultipartError::InvalidHeader)?;
            let name = std::str::from_utf8(&line[..colon])
                .ok()
                .filter(|name| is_token(name))
                .ok_or(MultipartError::InvalidHeader)?;
            entries.push((name.to_string(), trim(&line[colon + 1..]).to_vec()));
        }
        Ok(PartHeaders { entries })
    }
}

/// デコード済みのパート
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyPart {
    headers: PartHeaders,
    content: Option<Vec<u8>>,
    charset: Charset,
    disposition: Option<ContentDisposition>,
    content_type: Option<ContentType>,
}

impl BodyPart {
    /// 区切り行の直後から次の区切り行の直前までのセグメントをパースする
    ///
    /// セグメントは区切り行の残り (空白と CRLF) から始まる。
    pub(crate) fn parse(segment: &[u8], charset: Charset) -> Result<Self, MultipartError> {
        let padding = segment
            .iter()
            .take_while(|b| **b == b' ' || **b == b'\t')
            .count();
        let rest = &segment[padding..];
        if !rest.starts_with(b"\r\n") {
            return Err(MultipartError::ImproperBodyPart);
        }

        match find(rest, b"\r\n\r\n") {
            Some(0) => Ok(BodyPart::new(
                PartHeaders::default(),
                Some(rest[4..].to_vec()),
                charset,
            )),
            Some(end) => {
                let headers = PartHeaders::parse(&rest[2..end])?;
                Ok(BodyPart::new(headers, Some(rest[end + 4..].to_vec()), charset))
            }
            None => {
                // 空行がないセグメントは、ヘッダー行だけで構成されている場合に限り
                // ボディなしのパートとして扱う
                let block = &rest[2..];
                let headers = if block.is_empty() {
                    PartHeaders::default()
                } else {
                    let block = block
                        .strip_suffix(b"\r\n")
                        .ok_or(MultipartError::ImproperBodyPart)?;
                    PartHeaders::parse(block).map_err(|_| MultipartError::ImproperBodyPart)?
                };
                Ok(BodyPart::new(headers, None, charset))
            }
        }
    }

    fn new(headers: PartHeaders, content: Option<Vec<u8>>, charset: Charset) -> Self {
        let decode = |name: &str| headers.get(name).and_then(|v| charset.decode(v));
        let disposition = decode("Content-Disposition").and_then(|v| ContentDisposition::parse(&v).ok());
        let content_type = decode("Content-Type").and_then(|v| ContentType::parse(&v).ok());
        BodyPart {
            headers,
            content,
            charset,
            disposition,
            content_type,
        }
    }

    /// パートヘッダー
    pub fn headers(&self) -> &PartHeaders {
        &self.headers
    }

    /// ボディ (ヘッダーだけのパートは None)
    pub fn content(&self) -> Option<&[u8]> {
        self.content.as_deref()
    }

    /// ボディを取り出す
    pub fn into_content(self) -> Option<Vec<u8>> {
        self.content
    }

    /// ボディを文字セットでデコードした文字列
    ///
    /// ボディがない、またはデコードできない場合は None。
    pub fn text(&self) -> Option<Cow<'_, str>> {
        self.content
            .as_deref()
            .and_then(|content| self.charset.decode(content))
    }

    /// デコードに使う文字セット
    pub fn charset(&self) -> Charset {
        self.charset
    }

    /// Content-Disposition
    pub fn content_disposition(&self) -> Option<&ContentDisposition> {
        self.disposition.as_ref()
    }

    /// Content-Disposition の name パラメータ
    pub fn name(&self) -> Option<&str> {
        self.disposition.as_ref()?.name()
    }

    /// Content-Disposition のファイル名
    pub fn filename(&self) -> Option<&str> {
        self.disposition.as_ref()?.filename()
    }

    /// Content-Type
    pub fn content_type(&self) -> Option<&ContentType> {
        self.content_type.as_ref()
    }

    /// ファイルパートかどうか
    pub fn is_file(&self) -> bool {
        self.filename().is_some()
    }
}

/// バイト列から部分列を検索
pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn split_crlf(block: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::new();
    let mut rest = block;
    while let Some(pos) = find(rest, b"\r\n") {
        lines.push(&rest[..pos]);
        rest = &rest[pos + 2..];
    }
    lines.push(rest);
    lines
}

fn trim(value: &[u8]) -> &[u8] {
    let is_ws = |b: &u8| *b == b' ' || *b == b'\t';
    let start = value.iter().position(|b| !is_ws(b)).unwrap_or(value.len());
    let end = value.iter().rposition(|b| !is_ws(b)).map_or(start, |p| p + 1);
    &value[start..end]
}
