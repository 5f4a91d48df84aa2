//! パートボディの読み取り元
//!
//! エンコーダーはすべてのボディを `BodySource` 経由で少しずつ読み取ります。
//! 空のチャンクが返された時点でそのソースは終端とみなします。
//! `remaining()` が None を返すソースを含むエンコーダーは
//! 全体の長さを事前に計算できません。

use std::io::{self, Read, Seek, SeekFrom};

use crate::error::EncodeError;

/// プル型のボディソース
pub trait BodySource {
    /// 最大 `max_bytes` バイトを読み取る
    ///
    /// 空のベクタは終端を表す。`max_bytes` が 0 の場合も空を返してよい。
    fn read_chunk(&mut self, max_bytes: usize) -> io::Result<Vec<u8>>;

    /// 残りのバイト数 (不明な場合は None)
    fn remaining(&self) -> Option<u64>;
}

impl<S: BodySource + ?Sized> BodySource for Box<S> {
    fn read_chunk(&mut self, max_bytes: usize) -> io::Result<Vec<u8>> {
        (**self).read_chunk(max_bytes)
    }

    fn remaining(&self) -> Option<u64> {
        (**self).remaining()
    }
}

/// reader から最大 `limit` バイトを読み取る
fn read_up_to<R: Read>(reader: &mut R, limit: usize) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(limit.min(64 * 1024));
    reader.by_ref().take(limit as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

/// シーク可能なソース (ファイル、Cursor など)
///
/// 長さは構築時の「終端位置 - 現在位置」で決まる。
#[derive(Debug)]
pub struct SeekableSource<R> {
    inner: R,
    remaining: u64,
}

impl<R: Read + Seek> SeekableSource<R> {
    /// 現在位置から終端までをボディとして扱う
    pub fn new(mut inner: R) -> io::Result<Self> {
        let position = inner.stream_position()?;
        let end = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(position))?;
        Ok(SeekableSource {
            inner,
            remaining: end.saturating_sub(position),
        })
    }

    /// 内部の reader を取り出す
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> BodySource for SeekableSource<R> {
    fn read_chunk(&mut self, max_bytes: usize) -> io::Result<Vec<u8>> {
        let limit = (max_bytes as u64).min(self.remaining) as usize;
        let chunk = read_up_to(&mut self.inner, limit)?;
        self.remaining -= chunk.len() as u64;
        Ok(chunk)
    }

    fn remaining(&self) -> Option<u64> {
        Some(self.remaining)
    }
}

/// 任意の reader をソースにする
///
/// 長さを指定した場合はその長さで読み取りを打ち切る。
#[derive(Debug)]
pub struct ReaderSource<R> {
    inner: R,
    remaining: Option<u64>,
}

impl<R: Read> ReaderSource<R> {
    /// 長さが分かっている reader
    pub fn new(inner: R, length: u64) -> Self {
        ReaderSource {
            inner,
            remaining: Some(length),
        }
    }

    /// 長さが分からない reader
    ///
    /// このソースを含むエンコーダーは `content_length()` が None になる。
    pub fn unknown_length(inner: R) -> Self {
        ReaderSource {
            inner,
            remaining: None,
        }
    }

    /// 転送層が報告した Content-Length を長さとして使う
    ///
    /// リモートのファイルをアップロードする場合など、長さを転送層からしか
    /// 得られないソース向け。Content-Length がない、または不正な場合は
    /// `origin` を含む `EncodeError::UnknownLength` を返す。
    pub fn from_content_length(
        inner: R,
        content_length: Option<&str>,
        origin: &str,
    ) -> Result<Self, EncodeError> {
        let length = content_length
            .and_then(|v| v.trim().parse::<u64>().ok())
            .ok_or_else(|| EncodeError::UnknownLength(origin.to_string()))?;
        Ok(ReaderSource::new(inner, length))
    }
}

impl<R: Read> BodySource for ReaderSource<R> {
    fn read_chunk(&mut self, max_bytes: usize) -> io::Result<Vec<u8>> {
        match self.remaining {
            Some(remaining) => {
                let limit = (max_bytes as u64).min(remaining) as usize;
                let chunk = read_up_to(&mut self.inner, limit)?;
                self.remaining = Some(remaining - chunk.len() as u64);
                Ok(chunk)
            }
            None => read_up_to(&mut self.inner, max_bytes),
        }
    }

    fn remaining(&self) -> Option<u64> {
        self.remaining
    }
}

/// 合計サイズが分かっているチャンク列のソース
///
/// chunked 転送を使わずに、イテレーターが生成するデータを
/// Content-Length 付きで送りたい場合に使う。
pub struct ChunkedSource<I> {
    chunks: I,
    pending: Vec<u8>,
    offset: usize,
    remaining: u64,
}

impl<I: Iterator<Item = Vec<u8>>> ChunkedSource<I> {
    /// 合計サイズとチャンク列から作成
    pub fn new(size: u64, chunks: I) -> Self {
        ChunkedSource {
            chunks,
            pending: Vec::new(),
            offset: 0,
            remaining: size,
        }
    }
}

impl<I: Iterator<Item = Vec<u8>>> BodySource for ChunkedSource<I> {
    fn read_chunk(&mut self, max_bytes: usize) -> io::Result<Vec<u8>> {
        if max_bytes == 0 {
            return Ok(Vec::new());
        }
        while self.offset >= self.pending.len() {
            match self.chunks.next() {
                Some(chunk) => {
                    self.pending = chunk;
                    self.offset = 0;
                }
                None => return Ok(Vec::new()),
            }
        }
        let end = self.pending.len().min(self.offset + max_bytes);
        let chunk = self.pending[self.offset..end].to_vec();
        self.offset = end;
        self.remaining = self.remaining.saturating_sub(chunk.len() as u64);
        Ok(chunk)
    }

    fn remaining(&self) -> Option<u64> {
        Some(self.remaining)
    }
}

impl<I> std::fmt::Debug for ChunkedSource<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkedSource")
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}
