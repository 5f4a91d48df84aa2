//! multipart ボディの送信
//!
//! ## 使い方
//!
//! ```ignore
//! use shiguredo_multipart::MultipartEncoder;
//! use tokio_multipart::{Request, write_request};
//!
//! let mut encoder = MultipartEncoder::new(vec![("field", "value")])?;
//! let request = Request::new("POST", "/upload").header("Host", "example.com");
//! let stream = tokio::net::TcpStream::connect("example.com:80").await?;
//! write_request(request, &mut encoder, &mut stream).await?;
//! ```

use shiguredo_http11::{Request, encode_chunk, encode_request_headers};
use shiguredo_multipart::{BodySource, MultipartEncoder};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::Result;

/// ソースから一度に読み取るバイト数
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// ボディをそのまま書き込む (Content-Length 形式)
///
/// 書き込んだバイト数を返す。
pub async fn write_body<S, W>(source: &mut S, writer: &mut W, chunk_size: usize) -> Result<u64>
where
    S: BodySource + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let chunk_size = chunk_size.max(1);
    let mut written = 0u64;
    loop {
        let chunk = source.read_chunk(chunk_size)?;
        if chunk.is_empty() {
            break;
        }
        writer.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    writer.flush().await?;
    tracing::debug!(bytes = written, "multipart body written");
    Ok(written)
}

/// ボディを chunked 形式で書き込む
///
/// 終端チャンクまで書き込み、ボディのバイト数 (チャンクの枠を除く) を返す。
pub async fn write_chunked_body<S, W>(
    source: &mut S,
    writer: &mut W,
    chunk_size: usize,
) -> Result<u64>
where
    S: BodySource + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let chunk_size = chunk_size.max(1);
    let mut written = 0u64;
    loop {
        let chunk = source.read_chunk(chunk_size)?;
        if chunk.is_empty() {
            break;
        }
        writer.write_all(&encode_chunk(&chunk)).await?;
        written += chunk.len() as u64;
    }
    writer.write_all(&encode_chunk(&[])).await?;
    writer.flush().await?;
    tracing::debug!(bytes = written, "multipart body written (chunked)");
    Ok(written)
}

/// リクエストヘッダーと multipart ボディを書き込む
///
/// Content-Type はエンコーダーのものに置き換える。
/// エンコーダーが長さを知っていれば Content-Length を、
/// 知らなければ `Transfer-Encoding: chunked` を付ける。
pub async fn write_request<W>(
    mut request: Request,
    encoder: &mut MultipartEncoder,
    writer: &mut W,
) -> Result<u64>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    request.headers.retain(|(name, _)| {
        !name.eq_ignore_ascii_case("Content-Type")
            && !name.eq_ignore_ascii_case("Content-Length")
            && !name.eq_ignore_ascii_case("Transfer-Encoding")
    });
    request.add_header("Content-Type", encoder.content_type());

    match encoder.content_length() {
        Some(length) => {
            request.add_header("Content-Length", &length.to_string());
            tracing::debug!(
                method = %request.method,
                uri = %request.uri,
                content_length = length,
                "writing multipart request"
            );
            writer.write_all(&encode_request_headers(&request)).await?;
            write_body(encoder, writer, DEFAULT_CHUNK_SIZE).await
        }
        None => {
            request.add_header("Transfer-Encoding", "chunked");
            tracing::debug!(
                method = %request.method,
                uri = %request.uri,
                "writing multipart request (chunked)"
            );
            writer.write_all(&encode_request_headers(&request)).await?;
            write_chunked_body(encoder, writer, DEFAULT_CHUNK_SIZE).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use shiguredo_multipart::{EncodeError, Fields, MultipartEncoderMonitor, Progress, ReaderSource};
    use std::io::Cursor;

    fn encoder() -> MultipartEncoder {
        MultipartEncoder::with_boundary(vec![("field", "value")], "b").unwrap()
    }

    #[tokio::test]
    async fn test_write_body() {
        let expected = encoder().to_bytes().unwrap();
        let mut out = Vec::new();
        let written = write_body(&mut encoder(), &mut out, 7).await.unwrap();
        assert_eq!(written, expected.len() as u64);
        assert_eq!(out, expected);
    }

    #[tokio::test]
    async fn test_write_body_from_monitor() {
        let mut reported = 0;
        let mut monitor = MultipartEncoderMonitor::new(encoder(), |p: &Progress| {
            reported = p.bytes_read;
        });
        let mut out = Vec::new();
        let written = write_body(&mut monitor, &mut out, 4).await.unwrap();
        drop(monitor);
        assert_eq!(reported, written);
    }

    #[tokio::test]
    async fn test_write_chunked_body() {
        let body = encoder().to_bytes().unwrap();
        let mut out = Vec::new();
        write_chunked_body(&mut encoder(), &mut out, 1024)
            .await
            .unwrap();
        let mut expected = encode_chunk(&body);
        expected.extend_from_slice(b"0\r\n\r\n");
        assert_eq!(out, expected);
    }

    #[tokio::test]
    async fn test_write_request_with_content_length() {
        let body = encoder().to_bytes().unwrap();
        let mut encoder = encoder();
        let request = Request::new("POST", "/upload")
            .header("Host", "example.com")
            .header("Content-Type", "text/plain");
        let mut out = Vec::new();
        write_request(request, &mut encoder, &mut out).await.unwrap();

        let head = format!(
            "POST /upload HTTP/1.1\r\n\
             Host: example.com\r\n\
             Content-Type: multipart/form-data; boundary=b\r\n\
             Content-Length: {}\r\n\r\n",
            body.len()
        );
        let mut expected = head.into_bytes();
        expected.extend_from_slice(&body);
        assert_eq!(out, expected);
    }

    #[tokio::test]
    async fn test_write_request_chunked_for_unknown_length() {
        let source = ReaderSource::unknown_length(Cursor::new(b"data".to_vec()));
        let fields = Fields::new().stream("s", source);
        let mut encoder = MultipartEncoder::with_boundary(fields, "b").unwrap();
        let mut out = Vec::new();
        write_request(Request::new("POST", "/"), &mut encoder, &mut out)
            .await
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Transfer-Encoding: chunked\r\n"));
        assert!(!text.contains("Content-Length"));
        assert!(text.ends_with("0\r\n\r\n"));
    }

    #[tokio::test]
    async fn test_length_mismatch_surfaces_as_encode_error() {
        let fields = Fields::new().stream("s", ReaderSource::new(Cursor::new(b"ab".to_vec()), 4));
        let mut encoder = MultipartEncoder::with_boundary(fields, "b").unwrap();
        let mut out = Vec::new();
        let err = write_body(&mut encoder, &mut out, 1024).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Encode(EncodeError::LengthMismatch { expected: 4, actual: 2, .. })
        ));
    }
}
