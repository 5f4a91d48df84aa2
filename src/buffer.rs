//! 読み取り位置付きストリーミングバッファ
//!
//! 書き込みは常に末尾に追加され、読み取りは読み取り位置から順に進みます。
//! 読み取り済みの領域が未読領域以上になった時点で `compact()` により
//! 未読領域を先頭に詰め直すため、インクリメンタルな読み取りを続けても
//! バッファは有限のボディに対して際限なく大きくなりません。
//!
//! ```rust
//! use shiguredo_multipart::StreamBuffer;
//!
//! let mut buffer = StreamBuffer::new();
//! buffer.append(b"hello ");
//! buffer.append(b"world");
//! assert_eq!(buffer.read(Some(5)), b"hello");
//! assert_eq!(buffer.length_unread(), 6);
//! assert_eq!(buffer.read(None), b" world");
//! ```

use std::io;

use crate::source::BodySource;

/// 読み取り位置付きバイトバッファ
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamBuffer {
    data: Vec<u8>,
    /// 読み取り位置
    position: usize,
}

impl StreamBuffer {
    /// 空のバッファを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 既存のバイト列から作成 (読み取り位置は先頭)
    pub fn from_bytes(data: Vec<u8>) -> Self {
        StreamBuffer { data, position: 0 }
    }

    /// 末尾に追加し、書き込んだバイト数を返す
    ///
    /// 読み取り位置は変化しない。
    pub fn append(&mut self, bytes: &[u8]) -> usize {
        self.data.extend_from_slice(bytes);
        bytes.len()
    }

    /// 最大 `size` バイトを読み取る (`None` なら残りすべて)
    pub fn read(&mut self, size: Option<usize>) -> Vec<u8> {
        let available = self.length_unread();
        let n = size.map_or(available, |size| size.min(available));
        let out = self.data[self.position..self.position + n].to_vec();
        self.position += n;
        out
    }

    /// 未読のバイト数
    pub fn length_unread(&self) -> usize {
        self.data.len() - self.position
    }

    /// 未読データがないかどうか
    pub fn is_empty(&self) -> bool {
        self.length_unread() == 0
    }

    /// 未読領域を参照
    pub fn unread(&self) -> &[u8] {
        &self.data[self.position..]
    }

    /// 未読領域の先頭 `n` バイトを読み捨てる
    pub fn consume(&mut self, n: usize) {
        self.position += n.min(self.length_unread());
    }

    /// 読み取り済み領域が未読領域以上なら未読領域を先頭に詰める
    ///
    /// 詰め直しを行った場合は true を返す。
    pub fn compact(&mut self) -> bool {
        let unread = self.length_unread();
        if self.position == 0 || self.position < unread {
            return false;
        }
        self.data.drain(..self.position);
        self.position = 0;
        true
    }

    /// 確保済みの容量 (読み取り済み領域を含む)
    pub fn capacity_used(&self) -> usize {
        self.data.len()
    }
}

impl io::Read for StreamBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.length_unread());
        buf[..n].copy_from_slice(&self.data[self.position..self.position + n]);
        self.position += n;
        Ok(n)
    }
}

impl io::Write for StreamBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.append(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl BodySource for StreamBuffer {
    fn read_chunk(&mut self, max_bytes: usize) -> io::Result<Vec<u8>> {
        Ok(StreamBuffer::read(self, Some(max_bytes)))
    }

    fn remaining(&self) -> Option<u64> {
        Some(self.length_unread() as u64)
    }
}
