//! ストリーミング multipart デコーダー
//!
//! プル型の入力 (チャンクを返すクロージャ、または `std::io::Read`) から
//! 必要な分だけ読み取り、パートを前から順に一度だけ返します。
//! ボディ全体をメモリに載せたくない場合に使います。
//! 分割規則は `MultipartDecoder` と同じ `MultipartParser` を使うため同一です。
//!
//! ```rust
//! use shiguredo_multipart::MultipartStreamDecoder;
//!
//! let body: &[u8] = b"--b\r\n\r\nfirst\r\n--b\r\n\r\nsecond\r\n--b--\r\n";
//! let decoder =
//!     MultipartStreamDecoder::from_reader(body, "multipart/mixed; boundary=b").unwrap();
//! let texts: Vec<String> = decoder
//!     .map(|part| part.unwrap().text().unwrap().into_owned())
//!     .collect();
//! assert_eq!(texts, ["first", "second"]);
//! ```

use std::io::{self, Read};

use crate::body_part::BodyPart;
use crate::charset::Charset;
use crate::content_type::ContentType;
use crate::error::MultipartError;
use crate::limits::MultipartLimits;
use crate::parser::MultipartParser;

/// `from_reader` が一度に読み取るバイト数
pub const DEFAULT_READ_SIZE: usize = 8 * 1024;

/// プル型の入力
pub trait ChunkSource {
    /// 次のチャンクを返す (空のベクタは入力の終わり)
    fn next_chunk(&mut self) -> io::Result<Vec<u8>>;
}

impl<F> ChunkSource for F
where
    F: FnMut() -> io::Result<Vec<u8>>,
{
    fn next_chunk(&mut self) -> io::Result<Vec<u8>> {
        self()
    }
}

/// `std::io::Read` を固定サイズで読み取る入力
#[derive(Debug)]
pub struct ReadChunks<R> {
    reader: R,
    chunk_size: usize,
}

impl<R: Read> ReadChunks<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        ReadChunks {
            reader,
            chunk_size: chunk_size.max(1),
        }
    }
}

impl<R: Read> ChunkSource for ReadChunks<R> {
    fn next_chunk(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = vec![0; self.chunk_size];
        loop {
            match self.reader.read(&mut buf) {
                Ok(n) => {
                    buf.truncate(n);
                    return Ok(buf);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

/// ストリーミング multipart デコーダー
#[derive(Debug)]
pub struct MultipartStreamDecoder<C> {
    source: C,
    parser: MultipartParser,
    content_type: String,
    /// 入力の終わりに到達した
    eof: bool,
    /// エラーまたは終了区切り行でイテレーションを終えた
    done: bool,
}

impl<R: Read> MultipartStreamDecoder<ReadChunks<R>> {
    /// reader から読み取るデコーダーを作成
    pub fn from_reader(reader: R, content_type: &str) -> Result<Self, MultipartError> {
        Self::new(ReadChunks::new(reader, DEFAULT_READ_SIZE), content_type)
    }
}

impl<C: ChunkSource> MultipartStreamDecoder<C> {
    /// デフォルトの制限と UTF-8 でデコーダーを作成
    ///
    /// Content-Type が multipart/* でない、または boundary がない場合は
    /// 入力を読み取る前にエラーを返す。
    pub fn new(source: C, content_type: &str) -> Result<Self, MultipartError> {
        Self::with_options(source, content_type, Charset::Utf8, MultipartLimits::default())
    }

    /// 文字セットと制限を指定してデコーダーを作成
    pub fn with_options(
        source: C,
        content_type: &str,
        charset: Charset,
        limits: MultipartLimits,
    ) -> Result<Self, MultipartError> {
        let boundary = ContentType::multipart_boundary(content_type)?;
        Ok(MultipartStreamDecoder {
            source,
            parser: MultipartParser::with_options(&boundary, charset, limits),
            content_type: content_type.to_string(),
            eof: false,
            done: false,
        })
    }

    /// 元の Content-Type ヘッダー値
    pub fn content_type(&self) -> &str {
        &self.content_type
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
    pub fn next_part(&mut self) -> Result<Option<BodyPart>, MultipartError> {
        loop {
            if let Some(part) = self.parser.next_part()? {
                return Ok(Some(part));
            }
            if self.parser.is_finished() {
                return Ok(None);
            }
            if self.eof {
                return Err(MultipartError::Incomplete);
            }
            let chunk = self.source.next_chunk()?;
            if chunk.is_empty() {
                self.eof = true;
                self.parser.finish();
            } else {
                self.parser.feed(&chunk)?;
            }
        }
    }

    /// 入力を取り出す
    pub fn into_inner(self) -> C {
        self.source
    }
}

impl<C: ChunkSource> Iterator for MultipartStreamDecoder<C> {
    type Item = Result<BodyPart, MultipartError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_part() {
            Ok(Some(part)) => Some(Ok(part)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<C: ChunkSource> std::iter::FusedIterator for MultipartStreamDecoder<C> {}
