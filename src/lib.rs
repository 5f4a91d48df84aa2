//! # shiguredo_multipart
//!
//! multipart/form-data (RFC 7578 / RFC 2046) のストリーミングエンコーダーとデコーダー (Sans I/O)
//!
//! ## 特徴
//!
//! - **Sans I/O**: I/O を完全に分離した設計
//! - **ストリーミング**: エンコーダーは要求された分だけボディを生成し、
//!   デコーダーは入力を少しずつ受け取ってパートを返す
//! - **正確な長さ**: エンコーダーはボディを生成する前に Content-Length を確定できる
//! - **入れ子**: エンコーダー自身を別のエンコーダーのパートにできる
//!
//! ## 使い方
//!
//! ### エンコード
//!
//! ```rust
//! use shiguredo_multipart::{Fields, MultipartEncoder, NamedFile};
//!
//! let fields = Fields::new()
//!     .text("field", "value")
//!     .file("upload", NamedFile::new("hello.txt", "Hello").content_type("text/plain"));
//! let mut encoder = MultipartEncoder::with_boundary(fields, "this-is-a-boundary").unwrap();
//!
//! // リクエストヘッダー
//! let content_type = encoder.content_type().to_string();
//! let content_length = encoder.content_length().unwrap();
//!
//! // ボディを少しずつ送信...
//! let mut sent = 0;
//! loop {
//!     let chunk = encoder.read(Some(1024)).unwrap();
//!     if chunk.is_empty() {
//!         break;
//!     }
//!     sent += chunk.len() as u64;
//! }
//! assert_eq!(sent, content_length);
//! # let _ = content_type;
//! ```
//!
//! ### デコード
//!
//! ```rust
//! use shiguredo_multipart::MultipartDecoder;
//!
//! let body = b"--b\r\n\
//!     Content-Disposition: form-data; name=\"field\"\r\n\r\n\
//!     value\r\n\
//!     --b--\r\n";
//! let decoder = MultipartDecoder::new(body, "multipart/form-data; boundary=b").unwrap();
//! for part in decoder.parts() {
//!     assert_eq!(part.name(), Some("field"));
//!     assert_eq!(part.text().as_deref(), Some("value"));
//! }
//! ```

mod body_part;
pub mod boundary;
mod buffer;
pub mod charset;
pub mod content_disposition;
pub mod content_type;
mod decoder;
mod encoder;
mod error;
mod field;
mod limits;
mod monitor;
mod parser;
pub mod source;
mod stream_decoder;

pub use body_part::{BodyPart, PartHeaders};
pub use boundary::{boundary_from_random, generate_boundary};
pub use buffer::StreamBuffer;
pub use charset::Charset;
pub use decoder::MultipartDecoder;
pub use encoder::{EncoderOptions, MultipartEncoder};
pub use error::{EncodeError, MultipartError};
pub use field::{Content, Field, FieldValue, Fields, FileBody, NamedFile};
pub use limits::MultipartLimits;
pub use monitor::{MultipartEncoderMonitor, Progress};
pub use parser::MultipartParser;
pub use source::{BodySource, ChunkedSource, ReaderSource, SeekableSource};
pub use stream_decoder::{ChunkSource, DEFAULT_READ_SIZE, MultipartStreamDecoder, ReadChunks};
