//! エンコーダーへの入力フィールド
//!
//! ```rust
//! use shiguredo_multipart::{Fields, NamedFile};
//!
//! let fields = Fields::new()
//!     .text("field", "value")
//!     .file(
//!         "upload",
//!         NamedFile::new("report.json", &b"{}"[..])
//!             .content_type("application/json")
//!             .header("X-Checksum", "abc"),
//!     );
//! assert_eq!(fields.len(), 2);
//!
//! // 順序付きのペア列からも作成できる
//! let fields: Fields = vec![("field", "value"), ("other_field", "other_value")].into();
//! assert_eq!(fields.len(), 2);
//! ```

use core::fmt;

use crate::encoder::MultipartEncoder;
use crate::source::BodySource;

/// テキストまたはバイト列の値
///
/// テキストはエンコーダーの文字セットで変換され、バイト列はそのまま使われる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Bytes(Vec<u8>),
}

/// ファイルパートのボディ
pub enum FileBody {
    /// メモリ上の値
    Data(Content),
    /// 読み取り元
    Source(Box<dyn BodySource + Send>),
    /// 入れ子の multipart ボディ
    Nested(Box<MultipartEncoder>),
}

impl FileBody {
    /// 任意の `BodySource` をボディにする
    pub fn source<S: BodySource + Send + 'static>(source: S) -> Self {
        FileBody::Source(Box::new(source))
    }
}

impl From<&str> for FileBody {
    fn from(value: &str) -> Self {
        FileBody::Data(Content::Text(value.to_string()))
    }
}

impl From<String> for FileBody {
    fn from(value: String) -> Self {
        FileBody::Data(Content::Text(value))
    }
}

impl From<&[u8]> for FileBody {
    fn from(value: &[u8]) -> Self {
        FileBody::Data(Content::Bytes(value.to_vec()))
    }
}

impl From<Vec<u8>> for FileBody {
    fn from(value: Vec<u8>) -> Self {
        FileBody::Data(Content::Bytes(value))
    }
}

impl From<MultipartEncoder> for FileBody {
    fn from(value: MultipartEncoder) -> Self {
        FileBody::Nested(Box::new(value))
    }
}

impl fmt::Debug for FileBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileBody::Data(content) => f.debug_tuple("Data").field(content).finish(),
            FileBody::Source(source) => f
                .debug_struct("Source")
                .field("remaining", &source.remaining())
                .finish(),
            FileBody::Nested(encoder) => f.debug_tuple("Nested").field(encoder).finish(),
        }
    }
}

/// ファイル名・Content-Type・追加ヘッダー付きのパート
#[derive(Debug)]
pub struct NamedFile {
    pub(crate) filename: Option<String>,
    pub(crate) body: FileBody,
    pub(crate) content_type: Option<String>,
    pub(crate) headers: Vec<(String, String)>,
}

impl NamedFile {
    /// ファイル名付きで作成
    pub fn new(filename: &str, body: impl Into<FileBody>) -> Self {
        NamedFile {
            filename: Some(filename.to_string()),
            body: body.into(),
            content_type: None,
            headers: Vec::new(),
        }
    }

    /// ファイル名なしで作成 (filename パラメータを出力しない)
    pub fn anonymous(body: impl Into<FileBody>) -> Self {
        NamedFile {
            filename: None,
            body: body.into(),
            content_type: None,
            headers: Vec::new(),
        }
    }

    /// Content-Type を設定
    pub fn content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    /// 追加ヘッダーを設定
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// フィールドの値
pub enum FieldValue {
    /// テキストまたはバイト列
    Scalar(Content),
    /// ファイル名なしの読み取り元
    FileLike(Box<dyn BodySource + Send>),
    /// ファイル名・Content-Type・追加ヘッダー付き
    NamedFile(NamedFile),
    /// 入れ子の multipart ボディ (Content-Type は子のものを使う)
    Nested(Box<MultipartEncoder>),
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Scalar(content) => f.debug_tuple("Scalar").field(content).finish(),
            FieldValue::FileLike(source) => f
                .debug_struct("FileLike")
                .field("remaining", &source.remaining())
                .finish(),
            FieldValue::NamedFile(file) => f.debug_tuple("NamedFile").field(file).finish(),
            FieldValue::Nested(encoder) => f.debug_tuple("Nested").field(encoder).finish(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Scalar(Content::Text(value.to_string()))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Scalar(Content::Text(value))
    }
}

impl From<&[u8]> for FieldValue {
    fn from(value: &[u8]) -> Self {
        FieldValue::Scalar(Content::Bytes(value.to_vec()))
    }
}

impl<const N: usize> From<&[u8; N]> for FieldValue {
    fn from(value: &[u8; N]) -> Self {
        FieldValue::Scalar(Content::Bytes(value.to_vec()))
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        FieldValue::Scalar(Content::Bytes(value))
    }
}

impl From<NamedFile> for FieldValue {
    fn from(value: NamedFile) -> Self {
        FieldValue::NamedFile(value)
    }
}

impl From<MultipartEncoder> for FieldValue {
    fn from(value: MultipartEncoder) -> Self {
        FieldValue::Nested(Box::new(value))
    }
}

/// 名前付きフィールド
#[derive(Debug)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
}

/// 順序付きのフィールド列
#[derive(Debug, Default)]
pub struct Fields {
    fields: Vec<Field>,
}

impl Fields {
    /// 空のフィールド列を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 任意の値のフィールドを追加
    pub fn field(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.push(Field {
            name: name.to_string(),
            value: value.into(),
        });
        self
    }

    /// テキストフィールドを追加
    pub fn text(self, name: &str, value: &str) -> Self {
        self.field(name, value)
    }

    /// バイト列フィールドを追加
    pub fn bytes(self, name: &str, value: impl Into<Vec<u8>>) -> Self {
        self.field(name, value.into())
    }

    /// 読み取り元をボディとするフィールドを追加
    pub fn stream<S: BodySource + Send + 'static>(mut self, name: &str, source: S) -> Self {
        self.fields.push(Field {
            name: name.to_string(),
            value: FieldValue::FileLike(Box::new(source)),
        });
        self
    }

    /// ファイルフィールドを追加
    pub fn file(self, name: &str, file: NamedFile) -> Self {
        self.field(name, file)
    }

    /// 入れ子の multipart フィールドを追加
    pub fn nested(self, name: &str, encoder: MultipartEncoder) -> Self {
        self.field(name, encoder)
    }

    /// フィールド数
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// フィールドがないかどうか
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl IntoIterator for Fields {
    type Item = Field;
    type IntoIter = std::vec::IntoIter<Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<K, V> From<Vec<(K, V)>> for Fields
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from(pairs: Vec<(K, V)>) -> Self {
        Fields {
            fields: pairs
                .into_iter()
                .map(|(name, value)| Field {
                    name: name.into(),
                    value: value.into(),
                })
                .collect(),
        }
    }
}

impl FromIterator<Field> for Fields {
    fn from_iter<T: IntoIterator<Item = Field>>(iter: T) -> Self {
        Fields {
            fields: iter.into_iter().collect(),
        }
    }
}
