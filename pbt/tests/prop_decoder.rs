//! MultipartDecoder / MultipartStreamDecoder / MultipartParser のプロパティテスト

use pbt::{PartSpec, multipart_like_bytes, part_specs};
use proptest::prelude::*;
use shiguredo_multipart::{
    BodyPart, Charset, Fields, MultipartDecoder, MultipartEncoder, MultipartError,
    MultipartLimits, MultipartParser, MultipartStreamDecoder, NamedFile, ReadChunks,
};

const CONTENT_TYPE: &str = "multipart/form-data; boundary=b";

fn encode(specs: &[PartSpec], boundary: &str) -> Vec<u8> {
    let fields = specs.iter().fold(Fields::new(), |fields, spec| match spec {
        PartSpec::Text { name, value } => fields.text(name, value),
        PartSpec::File {
            name,
            filename,
            data,
        } => fields.file(name, NamedFile::new(filename, data.clone())),
    });
    MultipartEncoder::with_boundary(fields, boundary)
        .unwrap()
        .to_bytes()
        .unwrap()
}

fn buffered(body: &[u8], content_type: &str) -> Result<Vec<BodyPart>, MultipartError> {
    MultipartDecoder::new(body, content_type).map(MultipartDecoder::into_parts)
}

fn streamed(
    body: &[u8],
    content_type: &str,
    chunk_size: usize,
) -> Result<Vec<BodyPart>, MultipartError> {
    MultipartStreamDecoder::with_options(
        ReadChunks::new(body, chunk_size),
        content_type,
        Charset::Utf8,
        MultipartLimits::unlimited(),
    )?
    .collect()
}

/// 入力全体を一度に投入した場合のパーサーの結果
fn parsed_at_once(body: &[u8], boundary: &str) -> Result<Vec<BodyPart>, MultipartError> {
    let mut parser =
        MultipartParser::with_options(boundary, Charset::Utf8, MultipartLimits::unlimited());
    parser.feed(body)?;
    parser.finish();
    let mut parts = Vec::new();
    while let Some(part) = parser.next_part()? {
        parts.push(part);
    }
    Ok(parts)
}

// ========================================
// ストリーミングとバッファ済みの一致
// ========================================

// エンコーダーの出力をどのサイズで区切っても同じパートになる
proptest! {
    #[test]
    fn stream_matches_buffered(specs in part_specs(), chunk_size in 1usize..48) {
        let body = encode(&specs, "boundary-1234");
        let content_type = "multipart/form-data; boundary=boundary-1234";
        let expected = buffered(&body, content_type).unwrap();
        prop_assert_eq!(expected.len(), specs.len());
        prop_assert_eq!(streamed(&body, content_type, chunk_size).unwrap(), expected);
    }
}

// 不正な入力でも分割位置によらず結果 (エラーを含む) は一致し、
// ストリーミングで成功した入力はバッファ済みでも同じパートになる
proptest! {
    #[test]
    fn stream_matches_buffered_on_arbitrary_input(
        body in multipart_like_bytes(),
        chunk_size in 1usize..16
    ) {
        let result = streamed(&body, CONTENT_TYPE, chunk_size);
        let at_once = parsed_at_once(&body, "b");
        prop_assert_eq!(&result, &at_once);
        if result.is_ok() {
            prop_assert_eq!(result, buffered(&body, CONTENT_TYPE));
        }
    }
}

// ========================================
// パーサーへの分割投入
// ========================================

proptest! {
    #[test]
    fn parser_split_feed(specs in part_specs(), split in any::<prop::sample::Index>()) {
        let body = encode(&specs, "split-boundary");
        let at = split.index(body.len() + 1);

        let mut parser = MultipartParser::new("split-boundary");
        let mut parts = Vec::new();
        for piece in [&body[..at], &body[at..]] {
            parser.feed(piece).unwrap();
            while let Some(part) = parser.next_part().unwrap() {
                parts.push(part);
            }
        }
        parser.finish();
        prop_assert!(parser.next_part().unwrap().is_none());
        prop_assert!(parser.is_finished());
        prop_assert_eq!(parser.parts_parsed(), specs.len());
        prop_assert_eq!(
            parts,
            buffered(&body, "multipart/form-data; boundary=split-boundary").unwrap()
        );
    }
}

// ========================================
// プリアンブルとエピローグ
// ========================================

proptest! {
    #[test]
    fn preamble_and_epilogue_ignored(
        specs in part_specs(),
        preamble in "[a-zA-Z0-9 ]{0,32}",
        epilogue in proptest::collection::vec(any::<u8>(), 0..32)
    ) {
        let body = encode(&specs, "boundary-5678");
        let mut framed = Vec::new();
        if !preamble.is_empty() {
            framed.extend_from_slice(preamble.as_bytes());
            framed.extend_from_slice(b"\r\n");
        }
        framed.extend_from_slice(&body);
        framed.extend_from_slice(&epilogue);

        let content_type = "multipart/form-data; boundary=boundary-5678";
        prop_assert_eq!(buffered(&framed, content_type), buffered(&body, content_type));
    }
}

// ========================================
// 途中で切れた入力
// ========================================

// 終了区切り行の前で切れたボディはストリーミングでは必ずエラーになる
proptest! {
    #[test]
    fn truncated_body_is_error(
        specs in part_specs(),
        cut in any::<prop::sample::Index>(),
        chunk_size in 1usize..48
    ) {
        let body = encode(&specs, "boundary-cut");
        // 終了区切り行 "--boundary-cut--" の最後の "--" より前で切る
        let close_start = body.len() - "--\r\n".len();
        let at = cut.index(close_start);
        let content_type = "multipart/form-data; boundary=boundary-cut";
        let result = streamed(&body[..at], content_type, chunk_size);
        prop_assert!(matches!(
            result,
            Err(MultipartError::Incomplete) | Err(MultipartError::MissingDelimiter)
        ));
    }
}

// 終了区切り行だけを欠いたボディはバッファ済みデコーダーで元のパートになる
proptest! {
    #[test]
    fn buffered_accepts_missing_close(
        specs in proptest::collection::vec(pbt::part_spec(), 1..6)
    ) {
        let body = encode(&specs, "boundary-open");
        let content_type = "multipart/form-data; boundary=boundary-open";
        let open = &body[..body.len() - "\r\n--boundary-open--\r\n".len()];
        prop_assert_eq!(buffered(open, content_type), buffered(&body, content_type));
    }
}
