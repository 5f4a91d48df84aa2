//! multipart ボディのストリーミングエンコーダー
//!
//! ## 概要
//!
//! フィールド列から multipart ボディ (RFC 2046 Section 5.1 / RFC 7578) を
//! 呼び出し側が要求した分だけ少しずつ生成します。
//! パートヘッダーとテキスト値は構築時に一度だけエンコードされ、
//! 全体の長さもその時点で確定します。
//!
//! ```text
//! --<boundary>\r\n
//! <header-name>: <header-value>\r\n
//! \r\n
//! <body>\r\n
//! --<boundary>--\r\n
//! ```
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_multipart::MultipartEncoder;
//!
//! let fields = vec![("field", "value"), ("other_field", "other_value")];
//! let mut encoder = MultipartEncoder::with_boundary(fields, "this-is-a-boundary").unwrap();
//! assert_eq!(
//!     encoder.content_type(),
//!     "multipart/form-data; boundary=this-is-a-boundary"
//! );
//!
//! let length = encoder.content_length().unwrap();
//! let mut body = Vec::new();
//! loop {
//!     let chunk = encoder.read(Some(16)).unwrap();
//!     if chunk.is_empty() {
//!         break;
//!     }
//!     body.extend(chunk);
//! }
//! assert_eq!(body.len() as u64, length);
//! assert!(body.ends_with(b"--this-is-a-boundary--\r\n"));
//! ```

use core::fmt;
use std::io;

use crate::boundary::{boundaries_collide, generate_boundary, validate_boundary};
use crate::buffer::StreamBuffer;
use crate::charset::Charset;
use crate::content_disposition::ContentDisposition;
use crate::content_type::{ContentType, is_token};
use crate::error::EncodeError;
use crate::field::{Content, Field, FieldValue, Fields, FileBody, NamedFile};
use crate::source::BodySource;

/// サイズ指定なしの読み取りでソースから一度に取り出す最大バイト数
const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// エンコーダーの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderOptions {
    /// 境界文字列 (None ならランダムに生成)
    pub boundary: Option<String>,
    /// テキスト値とヘッダーの文字セット (デフォルト: UTF-8)
    pub charset: Charset,
    /// トップレベルのメディアタイプ (デフォルト: multipart/form-data)
    pub media_type: String,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            boundary: None,
            charset: Charset::Utf8,
            media_type: "multipart/form-data".to_string(),
        }
    }
}

impl EncoderOptions {
    /// 境界文字列を設定
    pub fn with_boundary(mut self, boundary: &str) -> Self {
        self.boundary = Some(boundary.to_string());
        self
    }

    /// 文字セットを設定
    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    /// メディアタイプを設定 (例: "multipart/mixed")
    pub fn with_media_type(mut self, media_type: &str) -> Self {
        self.media_type = media_type.to_string();
        self
    }
}

/// フレーミング済みのパート
struct Part {
    name: String,
    /// エンコード済みヘッダーブロック (空行まで)
    headers: Vec<u8>,
    body: Box<dyn BodySource + Send>,
    /// 構築時にソースが申告した長さ
    expected: Option<u64>,
    /// 実際に読み取ったボディのバイト数
    produced: u64,
}

impl Part {
    fn check_overrun(&self) -> Result<(), EncodeError> {
        match self.expected {
            Some(expected) if self.produced > expected => Err(self.mismatch(expected)),
            _ => Ok(()),
        }
    }

    fn check_complete(&self) -> Result<(), EncodeError> {
        match self.expected {
            Some(expected) if self.produced != expected => Err(self.mismatch(expected)),
            _ => Ok(()),
        }
    }

    fn mismatch(&self, expected: u64) -> EncodeError {
        EncodeError::LengthMismatch {
            field: self.name.clone(),
            expected,
            actual: self.produced,
        }
    }
}

/// 生成状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// 次に書く区切り行 (インデックスがパート数と等しければ終了区切り行)
    Delimiter(usize),
    /// パートヘッダー
    Headers(usize),
    /// パートボディ
    Body(usize),
    /// 終了区切り行まで書き込み済み
    Finished,
}

/// multipart ストリーミングエンコーダー
pub struct MultipartEncoder {
    boundary: String,
    content_type: String,
    /// 自身と入れ子のエンコーダーすべての境界
    boundaries: Vec<String>,
    parts: Vec<Part>,
    state: State,
    buffer: StreamBuffer,
    content_length: Option<u64>,
    bytes_read: u64,
}

impl MultipartEncoder {
    /// ランダムな境界でエンコーダーを作成
    pub fn new(fields: impl Into<Fields>) -> Result<Self, EncodeError> {
        Self::with_options(fields, EncoderOptions::default())
    }

    /// 境界を指定してエンコーダーを作成
    pub fn with_boundary(fields: impl Into<Fields>, boundary: &str) -> Result<Self, EncodeError> {
        Self::with_options(fields, EncoderOptions::default().with_boundary(boundary))
    }

    /// 設定を指定してエンコーダーを作成
    ///
    /// すべてのパートヘッダーとテキスト値はここでエンコードされる。
    pub fn with_options(
        fields: impl Into<Fields>,
        options: EncoderOptions,
    ) -> Result<Self, EncodeError> {
        let boundary = match options.boundary {
            Some(boundary) => boundary,
            None => generate_boundary()?,
        };
        validate_boundary(&boundary)?;

        let media_type = ContentType::parse(&options.media_type)
            .ok()
            .filter(|ct| ct.is_multipart())
            .ok_or_else(|| EncodeError::InvalidMediaType(options.media_type.clone()))?;
        let content_type = media_type
            .with_parameter("boundary", &boundary)
            .to_string();

        let mut boundaries = vec![boundary.clone()];
        let parts = fields
            .into()
            .into_iter()
            .map(|field| build_part(field, options.charset, &boundary, &mut boundaries))
            .collect::<Result<Vec<_>, _>>()?;
        let content_length = total_length(&boundary, &parts);

        tracing::debug!(
            boundary = %boundary,
            parts = parts.len(),
            content_length = ?content_length,
            "multipart encoder created"
        );

        Ok(MultipartEncoder {
            boundary,
            content_type,
            boundaries,
            parts,
            state: State::Delimiter(0),
            buffer: StreamBuffer::new(),
            content_length,
            bytes_read: 0,
        })
    }

    /// 境界文字列
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Content-Type ヘッダー値 (例: `multipart/form-data; boundary=...`)
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// ボディ全体のバイト数
    ///
    /// 長さを申告しないソースが含まれる場合は None。
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// これまでに読み取られたバイト数
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// すべてのバイトを生成し、読み取り終えたかどうか
    pub fn is_finished(&self) -> bool {
        self.state == State::Finished && self.buffer.is_empty()
    }

    /// 最大 `size` バイトを読み取る (`None` なら残りすべて)
    ///
    /// 読み終えた後は常に空を返す。エンコーダーは再利用できない。
    pub fn read(&mut self, size: Option<usize>) -> Result<Vec<u8>, EncodeError> {
        if self.state != State::Finished {
            let wanted = size.map(|size| size.saturating_sub(self.buffer.length_unread()));
            if wanted != Some(0) {
                self.buffer.compact();
                self.load(wanted)?;
            }
        }
        let chunk = self.buffer.read(size);
        self.bytes_read += chunk.len() as u64;
        Ok(chunk)
    }

    /// 残りをすべて読み取る
    pub fn to_bytes(&mut self) -> Result<Vec<u8>, EncodeError> {
        self.read(None)
    }

    pub(crate) fn boundaries(&self) -> &[String] {
        &self.boundaries
    }

    /// 少なくとも `amount` バイト (None なら終端まで) をバッファに生成する
    fn load(&mut self, amount: Option<usize>) -> Result<(), EncodeError> {
        let mut remaining = amount;
        while remaining != Some(0) {
            let written = match self.state {
                State::Delimiter(index) if index < self.parts.len() => {
                    tracing::trace!(index, name = %self.parts[index].name, "part start");
                    self.state = State::Headers(index);
                    self.write_delimiter(false)
                }
                State::Delimiter(_) => {
                    tracing::trace!(boundary = %self.boundary, "closing delimiter");
                    self.state = State::Finished;
                    self.write_delimiter(true)
                }
                State::Headers(index) => {
                    self.state = State::Body(index);
                    self.buffer.append(&self.parts[index].headers)
                }
                State::Body(index) => {
                    let part = &mut self.parts[index];
                    let chunk = part
                        .body
                        .read_chunk(remaining.unwrap_or(DEFAULT_CHUNK_SIZE))?;
                    if chunk.is_empty() {
                        part.check_complete()?;
                        tracing::trace!(index, bytes = part.produced, "part end");
                        self.state = State::Delimiter(index + 1);
                        self.buffer.append(b"\r\n")
                    } else {
                        part.produced += chunk.len() as u64;
                        part.check_overrun()?;
                        self.buffer.append(&chunk)
                    }
                }
                State::Finished => break,
            };
            remaining = remaining.map(|r| r.saturating_sub(written));
        }
        Ok(())
    }

    fn write_delimiter(&mut self, close: bool) -> usize {
        let mut line = Vec::with_capacity(self.boundary.len() + 6);
        line.extend_from_slice(b"--");
        line.extend_from_slice(self.boundary.as_bytes());
        if close {
            line.extend_from_slice(b"--");
        }
        line.extend_from_slice(b"\r\n");
        self.buffer.append(&line)
    }
}

impl fmt::Debug for MultipartEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultipartEncoder")
            .field("boundary", &self.boundary)
            .field("parts", &self.parts.len())
            .field("content_length", &self.content_length)
            .field("bytes_read", &self.bytes_read)
            .field("state", &self.state)
            .finish()
    }
}

impl io::Read for MultipartEncoder {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let chunk = MultipartEncoder::read(self, Some(buf.len()))?;
        buf[..chunk.len()].copy_from_slice(&chunk);
        Ok(chunk.len())
    }
}

impl BodySource for MultipartEncoder {
    fn read_chunk(&mut self, max_bytes: usize) -> io::Result<Vec<u8>> {
        Ok(MultipartEncoder::read(self, Some(max_bytes))?)
    }

    fn remaining(&self) -> Option<u64> {
        self.content_length
            .map(|length| length.saturating_sub(self.bytes_read))
    }
}

/// `--b\r\n` + ヘッダー + ボディ + `\r\n` をパートごとに、最後に `--b--\r\n` を足す
fn total_length(boundary: &str, parts: &[Part]) -> Option<u64> {
    let boundary_len = boundary.len() as u64;
    parts.iter().try_fold(boundary_len + 6, |total, part| {
        Some(total + boundary_len + 4 + part.headers.len() as u64 + part.expected? + 2)
    })
}

fn build_part(
    field: Field,
    charset: Charset,
    boundary: &str,
    boundaries: &mut Vec<String>,
) -> Result<Part, EncodeError> {
    let Field { name, value } = field;
    let (filename, content_type, extra_headers, body) = match value {
        FieldValue::Scalar(content) => (
            None,
            None,
            Vec::new(),
            in_memory(content, charset, &name)?,
        ),
        FieldValue::FileLike(source) => (None, None, Vec::new(), source),
        FieldValue::NamedFile(NamedFile {
            filename,
            body,
            content_type,
            headers,
        }) => {
            let (body, nested_type) = match body {
                FileBody::Data(content) => (in_memory(content, charset, &name)?, None),
                FileBody::Source(source) => (source, None),
                FileBody::Nested(encoder) => {
                    let nested_type = adopt_nested(&encoder, boundary, boundaries)?;
                    let body: Box<dyn BodySource + Send> = encoder;
                    (body, Some(nested_type))
                }
            };
            (filename, content_type.or(nested_type), headers, body)
        }
        FieldValue::Nested(encoder) => {
            let nested_type = adopt_nested(&encoder, boundary, boundaries)?;
            let body: Box<dyn BodySource + Send> = encoder;
            (None, Some(nested_type), Vec::new(), body)
        }
    };

    let headers = render_headers(
        &name,
        filename.as_deref(),
        content_type.as_deref(),
        &extra_headers,
        charset,
    )?;
    let expected = body.remaining();
    Ok(Part {
        name,
        headers,
        body,
        expected,
        produced: 0,
    })
}

fn in_memory(
    content: Content,
    charset: Charset,
    name: &str,
) -> Result<Box<dyn BodySource + Send>, EncodeError> {
    let bytes = match content {
        Content::Text(text) => charset
            .encode(&text)
            .ok_or_else(|| EncodeError::Unencodable {
                charset,
                field: name.to_string(),
            })?,
        Content::Bytes(bytes) => bytes,
    };
    Ok(Box::new(StreamBuffer::from_bytes(bytes)))
}

/// 入れ子のエンコーダーの境界を検査して取り込み、その Content-Type を返す
fn adopt_nested(
    encoder: &MultipartEncoder,
    boundary: &str,
    boundaries: &mut Vec<String>,
) -> Result<String, EncodeError> {
    if let Some(inner) = encoder
        .boundaries()
        .iter()
        .find(|inner| boundaries_collide(boundary, inner))
    {
        return Err(EncodeError::BoundaryCollision {
            outer: boundary.to_string(),
            inner: inner.clone(),
        });
    }
    boundaries.extend(encoder.boundaries().iter().cloned());
    Ok(encoder.content_type().to_string())
}

fn render_headers(
    name: &str,
    filename: Option<&str>,
    content_type: Option<&str>,
    extra_headers: &[(String, String)],
    charset: Charset,
) -> Result<Vec<u8>, EncodeError> {
    reject_line_breaks(name)?;
    let mut disposition = ContentDisposition::form_data(name);
    if let Some(filename) = filename {
        reject_line_breaks(filename)?;
        disposition = disposition.with_filename(filename);
    }

    let mut block = format!("Content-Disposition: {}\r\n", disposition);
    if let Some(content_type) = content_type {
        reject_line_breaks(content_type)?;
        block.push_str(&format!("Content-Type: {}\r\n", content_type));
    }
    for (header_name, value) in extra_headers {
        if !is_token(header_name) {
            return Err(EncodeError::InvalidHeader(header_name.clone()));
        }
        reject_line_breaks(value)?;
        block.push_str(&format!("{}: {}\r\n", header_name, value));
    }
    block.push_str("\r\n");

    charset
        .encode(&block)
        .ok_or_else(|| EncodeError::Unencodable {
            charset,
            field: name.to_string(),
        })
}

fn reject_line_breaks(value: &str) -> Result<(), EncodeError> {
    if value.contains(['\r', '\n']) {
        Err(EncodeError::InvalidHeader(value.to_string()))
    } else {
        Ok(())
    }
}
