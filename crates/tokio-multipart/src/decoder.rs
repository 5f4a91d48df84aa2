//! 非同期 multipart デコーダー
//!
//! `AsyncRead` から少しずつ読み取り、パートを前から順に返す。
//!
//! ```ignore
//! use tokio_multipart::AsyncMultipartDecoder;
//!
//! let mut decoder = AsyncMultipartDecoder::new(stream, content_type)?
//!     .read_timeout(Duration::from_secs(30));
//! while let Some(part) = decoder.next_part().await? {
//!     println!("{:?}: {} bytes", part.name(), part.content().map_or(0, |c| c.len()));
//! }
//! ```

use std::time::Duration;

use shiguredo_multipart::content_type::ContentType;
use shiguredo_multipart::{BodyPart, Charset, MultipartError, MultipartLimits, MultipartParser};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{Error, Result};

const DEFAULT_BUFFER_SIZE: usize = 8192;

/// 非同期 multipart デコーダー
#[derive(Debug)]
pub struct AsyncMultipartDecoder<R> {
    reader: R,
    parser: MultipartParser,
    buf: Vec<u8>,
    read_timeout: Option<Duration>,
    eof: bool,
}

impl<R: AsyncRead + Unpin> AsyncMultipartDecoder<R> {
    /// デフォルトの制限と UTF-8 でデコーダーを作成
    pub fn new(reader: R, content_type: &str) -> Result<Self> {
        Self::with_options(reader, content_type, Charset::Utf8, MultipartLimits::default())
    }

    /// 文字セットと制限を指定してデコーダーを作成
    pub fn with_options(
        reader: R,
        content_type: &str,
        charset: Charset,
        limits: MultipartLimits,
    ) -> Result<Self> {
        let boundary = ContentType::multipart_boundary(content_type)?;
        Ok(AsyncMultipartDecoder {
            reader,
            parser: MultipartParser::with_options(&boundary, charset, limits),
            buf: vec![0; DEFAULT_BUFFER_SIZE],
            read_timeout: None,
            eof: false,
        })
    }

    /// 一度に読み取るバイト数を設定
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.buf = vec![0; size.max(1)];
        self
    }

    /// 1 回の読み取りのタイムアウトを設定
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Content-Type から取り出した境界文字列
    pub fn boundary(&self) -> &str {
        self.parser.boundary()
    }

    /// 終了区切り行まで処理したかどうか
    pub fn is_finished(&self) -> bool {
        self.parser.is_finished()
    }

    /// 次のパートを取得 (終了区切り行の後は None)
    pub async fn next_part(&mut self) -> Result<Option<BodyPart>> {
        loop {
            if let Some(part) = self.parser.next_part()? {
                return Ok(Some(part));
            }
            if self.parser.is_finished() {
                return Ok(None);
            }
            if self.eof {
                return Err(Error::Multipart(MultipartError::Incomplete));
            }

            let n = match self.read_timeout {
                Some(timeout) => {
                    tokio::time::timeout(timeout, self.reader.read(&mut self.buf)).await??
                }
                None => self.reader.read(&mut self.buf).await?,
            };
            if n == 0 {
                tracing::trace!(boundary = %self.parser.boundary(), "multipart input ended");
                self.eof = true;
                self.parser.finish();
            } else {
                self.parser.feed(&self.buf[..n])?;
            }
        }
    }

    /// 残りのパートをすべて読み取る
    pub async fn collect_parts(&mut self) -> Result<Vec<BodyPart>> {
        let mut parts = Vec::new();
        while let Some(part) = self.next_part().await? {
            parts.push(part);
        }
        Ok(parts)
    }

    /// reader を取り出す
    pub fn into_inner(self) -> R {
        self.reader
    }
}
