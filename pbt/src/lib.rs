//! PBT テスト共通ユーティリティ

use proptest::prelude::*;

// ========================================
// フィールド生成
// ========================================

/// フィールド名
pub fn field_name() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9_]{0,15}".prop_map(|s| s)
}

/// ファイル名
pub fn filename() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,16}\\.[a-z]{1,4}".prop_map(|s| s)
}

/// テキスト値 (非 ASCII を含む)
pub fn text_value() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,!?あいう]{0,64}".prop_map(|s| s)
}

/// バイナリ値
pub fn binary_value() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..256)
}

// ========================================
// 境界文字列生成 (RFC 2046)
// ========================================

/// 境界文字列: 0*69<bchars> bcharsnospace
///
/// 先頭に英数字 8 文字を置き、ボディ中に偶然現れないようにする。
pub fn boundary() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{8}[a-zA-Z0-9 '()+_,./:=?-]{0,40}[a-zA-Z0-9]".prop_map(|s| s)
}

// ========================================
// パート生成
// ========================================

/// エンコードするパート
#[derive(Debug, Clone)]
pub enum PartSpec {
    Text { name: String, value: String },
    File { name: String, filename: String, data: Vec<u8> },
}

pub fn part_spec() -> impl Strategy<Value = PartSpec> {
    prop_oneof![
        (field_name(), text_value()).prop_map(|(name, value)| PartSpec::Text { name, value }),
        (field_name(), filename(), binary_value())
            .prop_map(|(name, filename, data)| PartSpec::File { name, filename, data }),
    ]
}

pub fn part_specs() -> impl Strategy<Value = Vec<PartSpec>> {
    proptest::collection::vec(part_spec(), 0..6)
}

/// 読み取りサイズの列 (循環して使う)
pub fn read_sizes() -> impl Strategy<Value = Vec<usize>> {
    proptest::collection::vec(1usize..64, 1..8)
}

// ========================================
// multipart 風の入力生成
// ========================================

/// 境界 `b` の区切り行やヘッダーの断片を混ぜたバイト列
pub fn multipart_like_bytes() -> impl Strategy<Value = Vec<u8>> {
    let piece = prop_oneof![
        Just(b"--b".to_vec()),
        Just(b"--b--".to_vec()),
        Just(b"\r\n".to_vec()),
        Just(b"\r\n\r\n".to_vec()),
        Just(b"Content-Disposition: form-data; name=\"x\"".to_vec()),
        Just(b"Content-Type: text/plain".to_vec()),
        Just(b" \t".to_vec()),
        Just(b"-".to_vec()),
        proptest::collection::vec(any::<u8>(), 0..8),
    ];
    proptest::collection::vec(piece, 0..32).prop_map(|pieces| pieces.concat())
}
