//! 読み取り進捗の監視
//!
//! ```rust
//! use shiguredo_multipart::{MultipartEncoder, MultipartEncoderMonitor, Progress};
//!
//! let encoder = MultipartEncoder::with_boundary(vec![("field", "value")], "b").unwrap();
//! let total = encoder.content_length().unwrap();
//! let mut seen = Vec::new();
//! let mut monitor = MultipartEncoderMonitor::new(encoder, |progress: &Progress| {
//!     seen.push(progress.bytes_read);
//! });
//! while !monitor.read(Some(8)).unwrap().is_empty() {}
//! drop(monitor);
//! assert_eq!(seen.last().copied(), Some(total));
//! ```

use std::io;

use crate::encoder::MultipartEncoder;
use crate::error::EncodeError;
use crate::source::BodySource;

/// 読み取り進捗
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// これまでに読み取られた累計バイト数
    pub bytes_read: u64,
    /// ボディ全体のバイト数 (不明な場合は None)
    pub total: Option<u64>,
}

/// `read` のたびにコールバックを呼び出すエンコーダーのラッパー
///
/// フレーミングには一切影響しない。
pub struct MultipartEncoderMonitor<F> {
    encoder: MultipartEncoder,
    callback: F,
    bytes_read: u64,
}

impl MultipartEncoderMonitor<fn(&Progress)> {
    /// 何もしないコールバックで作成
    pub fn without_callback(encoder: MultipartEncoder) -> Self {
        fn noop(_: &Progress) {}
        MultipartEncoderMonitor::new(encoder, noop as fn(&Progress))
    }
}

impl<F: FnMut(&Progress)> MultipartEncoderMonitor<F> {
    /// コールバック付きで作成
    pub fn new(encoder: MultipartEncoder, callback: F) -> Self {
        MultipartEncoderMonitor {
            encoder,
            callback,
            bytes_read: 0,
        }
    }

    /// 最大 `size` バイトを読み取り、コールバックを呼び出す
    ///
    /// 空の読み取りでもコールバックは呼ばれる。
    pub fn read(&mut self, size: Option<usize>) -> Result<Vec<u8>, EncodeError> {
        let chunk = self.encoder.read(size)?;
        self.bytes_read += chunk.len() as u64;
        let progress = self.progress();
        (self.callback)(&progress);
        Ok(chunk)
    }

    /// 現在の進捗
    pub fn progress(&self) -> Progress {
        Progress {
            bytes_read: self.bytes_read,
            total: self.encoder.content_length(),
        }
    }

    /// ラップしているエンコーダー
    pub fn encoder(&self) -> &MultipartEncoder {
        &self.encoder
    }

    /// エンコーダーの Content-Type ヘッダー値
    pub fn content_type(&self) -> &str {
        self.encoder.content_type()
    }

    /// ボディ全体の長さ
    pub fn content_length(&self) -> Option<u64> {
        self.encoder.content_length()
    }

    /// 境界文字列
    pub fn boundary(&self) -> &str {
        self.encoder.boundary()
    }

    /// エンコーダーを取り出す
    pub fn into_inner(self) -> MultipartEncoder {
        self.encoder
    }
}

impl<F> std::fmt::Debug for MultipartEncoderMonitor<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultipartEncoderMonitor")
            .field("encoder", &self.encoder)
            .field("bytes_read", &self.bytes_read)
            .finish_non_exhaustive()
    }
}

impl<F: FnMut(&Progress)> io::Read for MultipartEncoderMonitor<F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let chunk = MultipartEncoderMonitor::read(self, Some(buf.len()))?;
        buf[..chunk.len()].copy_from_slice(&chunk);
        Ok(chunk.len())
    }
}

impl<F: FnMut(&Progress)> BodySource for MultipartEncoderMonitor<F> {
    fn read_chunk(&mut self, max_bytes: usize) -> io::Result<Vec<u8>> {
        Ok(MultipartEncoderMonitor::read(self, Some(max_bytes))?)
    }

    fn remaining(&self) -> Option<u64> {
        self.encoder.remaining()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Fields;

    fn encoder() -> MultipartEncoder {
        MultipartEncoder::with_boundary(
            vec![("field", "value"), ("other_field", "other_value")],
            "this-is-a-boundary",
        )
        .unwrap()
    }

    #[test]
    fn test_callback_receives_cumulative_bytes() {
        let mut calls = Vec::new();
        let mut monitor = MultipartEncoderMonitor::new(encoder(), |p: &Progress| calls.push(*p));
        let total = monitor.content_length().unwrap();
        let mut body = Vec::new();
        loop {
            let chunk = monitor.read(Some(10)).unwrap();
            if chunk.is_empty() {
                break;
            }
            body.extend(chunk);
        }
        drop(monitor);

        assert_eq!(body.len() as u64, total);
        assert_eq!(calls.first().map(|p| p.bytes_read), Some(10));
        assert!(calls.windows(2).all(|w| w[0].bytes_read <= w[1].bytes_read));
        let last = calls.last().unwrap();
        assert_eq!(last.bytes_read, total);
        assert_eq!(last.total, Some(total));
    }

    #[test]
    fn test_output_identical_to_encoder() {
        let expected = encoder().to_bytes().unwrap();
        let mut monitor = MultipartEncoderMonitor::without_callback(encoder());
        assert_eq!(monitor.read(None).unwrap(), expected);
        assert_eq!(monitor.progress().bytes_read, expected.len() as u64);
        assert!(monitor.read(None).unwrap().is_empty());
    }

    #[test]
    fn test_forwards_metadata() {
        let monitor = MultipartEncoderMonitor::without_callback(encoder());
        assert_eq!(monitor.boundary(), "this-is-a-boundary");
        assert_eq!(
            monitor.content_type(),
            "multipart/form-data; boundary=this-is-a-boundary"
        );
        assert_eq!(monitor.content_length(), encoder().content_length());
    }

    #[test]
    fn test_monitor_as_nested_source() {
        let inner = MultipartEncoder::with_boundary(vec![("a", "1")], "inner").unwrap();
        let monitor = MultipartEncoderMonitor::without_callback(inner);
        let fields = Fields::new().stream("n", monitor);
        let mut outer = MultipartEncoder::with_boundary(fields, "outer").unwrap();
        let length = outer.content_length().unwrap();
        assert_eq!(outer.to_bytes().unwrap().len() as u64, length);
    }
}
