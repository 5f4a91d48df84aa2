//! tokio_multipart - Tokio integration for shiguredo_multipart
//!
//! tokio を使用した非同期 multipart/form-data の送受信ライブラリ。
//!
//! ## 特徴
//!
//! - **shiguredo_multipart ベース**: Sans I/O ライブラリをベースにした設計
//! - **非同期 I/O**: tokio による完全非同期対応
//! - **ストリーミング**: ボディ全体をメモリに載せずに送信、受信できる
//! - **shiguredo_http11 連携**: Request / Response に multipart ボディを載せられる
//!
//! ## 送信
//!
//! ```ignore
//! use shiguredo_multipart::{Fields, MultipartEncoder, NamedFile};
//! use tokio_multipart::{Request, write_request};
//!
//! let fields = Fields::new()
//!     .text("title", "report")
//!     .file("attachment", NamedFile::new("report.csv", csv).content_type("text/csv"));
//! let mut encoder = MultipartEncoder::new(fields)?;
//!
//! let request = Request::new("POST", "/upload").header("Host", "example.com");
//! let mut stream = tokio::net::TcpStream::connect("example.com:80").await?;
//! write_request(request, &mut encoder, &mut stream).await?;
//! ```
//!
//! ## 受信
//!
//! ```ignore
//! use tokio_multipart::AsyncMultipartDecoder;
//!
//! let mut decoder = AsyncMultipartDecoder::new(body_reader, content_type)?;
//! while let Some(part) = decoder.next_part().await? {
//!     println!("{:?}", part.name());
//! }
//! ```
//!
//! ## Request / Response
//!
//! ```ignore
//! use tokio_multipart::{MultipartMessageExt, RequestExt};
//!
//! let request = Request::new("POST", "/upload").multipart(&mut encoder)?;
//! let decoder = response.multipart_decoder()?;
//! ```

pub mod body;
pub mod decoder;
pub mod error;
pub mod ext;

pub use body::{DEFAULT_CHUNK_SIZE, write_body, write_chunked_body, write_request};
pub use decoder::AsyncMultipartDecoder;
pub use error::{Error, Result};
pub use ext::{MultipartMessageExt, RequestExt};

// shiguredo_http11 の型を re-export
pub use shiguredo_http11::{Request, Response};
