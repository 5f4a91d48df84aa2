//! Sans I/O multipart パーサー
//!
//! ## 概要
//!
//! 入力バイト列を `feed()` で少しずつ受け取り、区切り行 `\r\n--<boundary>` で
//! 分割したセグメントを `next_part()` で一つずつ `BodyPart` として返します。
//! I/O は一切行わないため、バッファ済みデコーダー・ストリーミングデコーダー・
//! tokio の非同期デコーダーはすべてこのパーサーを共有します。
//!
//! - 最初の区切り行より前 (プリアンブル) は破棄する
//! - 終了区切り行 `--<boundary>--` より後 (エピローグ) は破棄する
//! - 入力の終わりは `finish()` で通知する。終了区切り行の前に入力が終わった場合は
//!   `MultipartError::Incomplete`、区切り行が一つもない場合は
//!   `MultipartError::MissingDelimiter` になる
//! - `allow_unterminated(true)` の場合は入力の終わりを終了区切り行とみなし、
//!   残りを最後のパートとして返す
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_multipart::MultipartParser;
//!
//! let mut parser = MultipartParser::new("boundary");
//! parser.feed(b"--boundary\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nv").unwrap();
//! // 次の区切り行が届くまでパートは確定しない
//! assert!(parser.next_part().unwrap().is_none());
//!
//! parser.feed(b"alue\r\n--boundary--\r\n").unwrap();
//! let part = parser.next_part().unwrap().unwrap();
//! assert_eq!(part.name(), Some("a"));
//! assert_eq!(part.text().as_deref(), Some("value"));
//!
//! parser.finish();
//! assert!(parser.next_part().unwrap().is_none());
//! assert!(parser.is_finished());
//! ```

use crate::body_part::{BodyPart, find};
use crate::buffer::StreamBuffer;
use crate::charset::Charset;
use crate::error::MultipartError;
use crate::limits::MultipartLimits;

/// パース状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    /// 最初の区切り行を探している
    Preamble,
    /// 区切り行の直後 (終了区切り行かどうかの判定待ち)
    AfterDelimiter,
    /// パートのセグメントを読んでいる
    InPart,
    /// 終了区切り行を検出した
    Finished,
}

/// multipart パーサー
#[derive(Debug, Clone)]
pub struct MultipartParser {
    boundary: String,
    /// `\r\n--<boundary>`
    delimiter: Vec<u8>,
    buffer: StreamBuffer,
    state: ParserState,
    /// 区切り行の検索を再開する位置 (未読領域の先頭からのオフセット)
    scan_from: usize,
    limits: MultipartLimits,
    charset: Charset,
    parts: usize,
    input_finished: bool,
    allow_unterminated: bool,
}

impl MultipartParser {
    /// デフォルトの制限と UTF-8 でパーサーを作成
    pub fn new(boundary: &str) -> Self {
        Self::with_options(boundary, Charset::Utf8, MultipartLimits::default())
    }

    /// 文字セットと制限を指定してパーサーを作成
    pub fn with_options(boundary: &str, charset: Charset, limits: MultipartLimits) -> Self {
        let mut delimiter = b"\r\n--".to_vec();
        delimiter.extend_from_slice(boundary.as_bytes());
        // ボディ先頭の区切り行も `\r\n--<boundary>` で見つけられるようにする
        let buffer = StreamBuffer::from_bytes(b"\r\n".to_vec());
        MultipartParser {
            boundary: boundary.to_string(),
            delimiter,
            buffer,
            state: ParserState::Preamble,
            scan_from: 0,
            limits,
            charset,
            parts: 0,
            input_finished: false,
            allow_unterminated: false,
        }
    }

    /// 終了区切り行のない入力を受け入れるかどうかを設定
    ///
    /// 有効にすると `finish()` の後に残ったセグメントを最後のパートとして返す。
    /// CRLF だけのセグメントはパートにならない。
    pub fn allow_unterminated(mut self, allow: bool) -> Self {
        self.allow_unterminated = allow;
        self
    }

    /// 境界文字列
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// 制限設定
    pub fn limits(&self) -> &MultipartLimits {
        &self.limits
    }

    /// データを追加
    ///
    /// 終了区切り行を検出した後のデータ (エピローグ) は捨てる。
    pub fn feed(&mut self, data: &[u8]) -> Result<(), MultipartError> {
        if self.state == ParserState::Finished {
            return Ok(());
        }
        self.buffer.compact();
        let size = self.buffer.length_unread().saturating_add(data.len());
        if size > self.limits.max_buffer_size {
            return Err(MultipartError::BufferOverflow {
                size,
                limit: self.limits.max_buffer_size,
            });
        }
        self.buffer.append(data);
        Ok(())
    }

    /// 入力の終わりを通知
    pub fn finish(&mut self) {
        self.input_finished = true;
    }

    /// 終了区切り行まで処理したかどうか
    pub fn is_finished(&self) -> bool {
        self.state == ParserState::Finished
    }

    /// これまでに返したパート数
    pub fn parts_parsed(&self) -> usize {
        self.parts
    }

    /// 次のパートを取得
    ///
    /// データが足りない場合と終了区切り行まで処理し終えた場合は `Ok(None)` を返す。
    /// 両者は `is_finished()` で区別する。`finish()` の後はデータ不足が
    /// エラーになる。
    pub fn next_part(&mut self) -> Result<Option<BodyPart>, MultipartError> {
        self.step().inspect_err(|e| {
            tracing::debug!(boundary = %self.boundary, error = %e, "multipart parse failed");
        })
    }

    fn step(&mut self) -> Result<Option<BodyPart>, MultipartError> {
        loop {
            match self.state {
                ParserState::Preamble => {
                    let data = self.buffer.unread();
                    match find(&data[self.scan_from..], &self.delimiter) {
                        Some(pos) => {
                            let end = self.scan_from + pos + self.delimiter.len();
                            self.buffer.consume(end);
                            self.scan_from = 0;
                            self.state = ParserState::AfterDelimiter;
                        }
                        None if self.input_finished => {
                            return Err(MultipartError::MissingDelimiter);
                        }
                        None => {
                            // 区切り行の途中で切れている可能性がある末尾だけ残す
                            let keep = self.delimiter.len() - 1;
                            let discard = data.len().saturating_sub(keep);
                            self.buffer.consume(discard);
                            self.scan_from = 0;
                            return Ok(None);
                        }
                    }
                }
                ParserState::AfterDelimiter => {
                    let data = self.buffer.unread();
                    if data.len() < 2 {
                        if self.input_finished {
                            if self.allow_unterminated {
                                return self.close_unterminated();
                            }
                            return Err(MultipartError::Incomplete);
                        }
                        return Ok(None);
                    }
                    if data.starts_with(b"--") {
                        tracing::trace!(parts = self.parts, "closing delimiter");
                        self.state = ParserState::Finished;
                        self.buffer = StreamBuffer::new();
                        return Ok(None);
                    }
                    self.state = ParserState::InPart;
                    self.scan_from = 0;
                }
                ParserState::InPart => {
                    let data = self.buffer.unread();
                    match find(&data[self.scan_from..], &self.delimiter) {
                        Some(pos) => {
                            let segment_len = self.scan_from + pos;
                            self.check_segment(&data[..segment_len])?;
                            let part = BodyPart::parse(&data[..segment_len], self.charset)?;
                            self.buffer.consume(segment_len + self.delimiter.len());
                            self.scan_from = 0;
                            self.state = ParserState::AfterDelimiter;
                            self.parts += 1;
                            tracing::trace!(
                                index = self.parts - 1,
                                name = ?part.name(),
                                bytes = segment_len,
                                "part parsed"
                            );
                            return Ok(Some(part));
                        }
                        None => {
                            if self.input_finished && self.allow_unterminated {
                                return self.close_unterminated();
                            }
                            self.check_pending(data)?;
                            if self.input_finished {
                                return Err(MultipartError::Incomplete);
                            }
                            self.scan_from = data.len().saturating_sub(self.delimiter.len() - 1);
                            return Ok(None);
                        }
                    }
                }
                ParserState::Finished => return Ok(None),
            }
        }
    }

    /// 入力の終わりで残りのセグメントを閉じる
    fn close_unterminated(&mut self) -> Result<Option<BodyPart>, MultipartError> {
        let data = self.buffer.unread();
        let padding = data
            .iter()
            .take_while(|b| **b == b' ' || **b == b'\t')
            .count();
        let rest = &data[padding..];
        let part = if rest.is_empty() || rest == b"\r\n" {
            None
        } else {
            self.check_segment(data)?;
            Some(BodyPart::parse(data, self.charset)?)
        };
        tracing::trace!(parts = self.parts, "input ended without closing delimiter");
        self.state = ParserState::Finished;
        self.buffer = StreamBuffer::new();
        if part.is_some() {
            self.parts += 1;
        }
        Ok(part)
    }

    /// 区切り行まで揃ったセグメントの制限を検査
    fn check_segment(&self, segment: &[u8]) -> Result<(), MultipartError> {
        let limits = &self.limits;
        if self.parts >= limits.max_parts {
            return Err(MultipartError::TooManyParts {
                count: self.parts + 1,
                limit: limits.max_parts,
            });
        }
        if segment.len() > limits.max_part_size {
            return Err(MultipartError::PartTooLarge {
                size: segment.len(),
                limit: limits.max_part_size,
            });
        }
        let header_size = find(segment, b"\r\n\r\n").unwrap_or(segment.len());
        if header_size > limits.max_header_size {
            return Err(MultipartError::HeaderTooLarge {
                size: header_size,
                limit: limits.max_header_size,
            });
        }
        Ok(())
    }

    /// 区切り行がまだ届いていないセグメントの制限を検査
    fn check_pending(&self, pending: &[u8]) -> Result<(), MultipartError> {
        let limits = &self.limits;
        let size = pending.len().saturating_sub(self.delimiter.len());
        if size > limits.max_part_size {
            return Err(MultipartError::PartTooLarge {
                size,
                limit: limits.max_part_size,
            });
        }
        let window = limits.max_header_size.saturating_add(4);
        if pending.len() > window && find(&pending[..window], b"\r\n\r\n").is_none() {
            return Err(MultipartError::HeaderTooLarge {
                size: pending.len(),
                limit: limits.max_header_size,
            });
        }
        Ok(())
    }
}
