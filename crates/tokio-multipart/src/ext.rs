//! Request / Response 拡張トレイト
//!
//! shiguredo_http11 のメッセージに multipart ボディを載せる、
//! または取り出すためのメソッドを追加する。

use shiguredo_http11::{Request, Response};
use shiguredo_multipart::content_type::ContentType;
use shiguredo_multipart::{MultipartDecoder, MultipartEncoder};

use crate::error::{Error, Result};

/// Request 拡張トレイト
pub trait RequestExt: Sized {
    /// エンコーダーの出力をボディに設定する
    ///
    /// Content-Type と Content-Length は置き換えられる。
    fn multipart(self, encoder: &mut MultipartEncoder) -> Result<Self>;
}

impl RequestExt for Request {
    fn multipart(mut self, encoder: &mut MultipartEncoder) -> Result<Self> {
        let body = encoder.to_bytes()?;
        self.headers.retain(|(name, _)| {
            !name.eq_ignore_ascii_case("Content-Type")
                && !name.eq_ignore_ascii_case("Content-Length")
                && !name.eq_ignore_ascii_case("Transfer-Encoding")
        });
        self.add_header("Content-Type", encoder.content_type());
        self.add_header("Content-Length", &body.len().to_string());
        Ok(self.body(body))
    }
}

/// multipart ボディを持つメッセージの拡張トレイト
pub trait MultipartMessageExt {
    /// Content-Type が multipart/* かどうか
    fn is_multipart(&self) -> bool;

    /// ボディを multipart としてデコード
    fn multipart_decoder(&self) -> Result<MultipartDecoder>;
}

fn is_multipart(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|value| ContentType::parse(value).ok())
        .is_some_and(|ct| ct.is_multipart())
}

fn decode(content_type: Option<&str>, body: &[u8]) -> Result<MultipartDecoder> {
    let content_type = content_type.ok_or(Error::MissingContentType)?;
    Ok(MultipartDecoder::new(body, content_type)?)
}

impl MultipartMessageExt for Request {
    fn is_multipart(&self) -> bool {
        is_multipart(self.get_header("Content-Type"))
    }

    fn multipart_decoder(&self) -> Result<MultipartDecoder> {
        decode(self.get_header("Content-Type"), &self.body)
    }
}

impl MultipartMessageExt for Response {
    fn is_multipart(&self) -> bool {
        is_multipart(self.get_header("Content-Type"))
    }

    fn multipart_decoder(&self) -> Result<MultipartDecoder> {
        decode(self.get_header("Content-Type"), &self.body)
    }
}
