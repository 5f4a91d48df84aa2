#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_multipart::{
    Charset, MultipartDecoder, MultipartLimits, MultipartParser, MultipartStreamDecoder,
    ReadChunks,
};

#[derive(Arbitrary, Debug)]
struct Input {
    chunk_size: u8,
    body: Vec<u8>,
}

const CONTENT_TYPE: &str = "multipart/form-data; boundary=b";

fuzz_target!(|input: Input| {
    let chunk_size = usize::from(input.chunk_size).max(1);
    let decoder = match MultipartStreamDecoder::with_options(
        ReadChunks::new(input.body.as_slice(), chunk_size),
        CONTENT_TYPE,
        Charset::Utf8,
        MultipartLimits::unlimited(),
    ) {
        Ok(decoder) => decoder,
        Err(_) => return,
    };
    let streamed: Result<Vec<_>, _> = decoder.collect();

    // 分割位置に関係なく一度に投入した場合と同じ結果になる
    let mut parser = MultipartParser::with_options("b", Charset::Utf8, MultipartLimits::unlimited());
    let at_once = parser.feed(&input.body).and_then(|()| {
        parser.finish();
        let mut parts = Vec::new();
        while let Some(part) = parser.next_part()? {
            parts.push(part);
        }
        Ok(parts)
    });
    assert_eq!(streamed, at_once);

    // ストリーミングで成功した入力はバッファ済みデコーダーでも同じパートになる
    if streamed.is_ok() {
        let buffered = MultipartDecoder::new(&input.body, CONTENT_TYPE).map(|d| d.into_parts());
        assert_eq!(streamed, buffered);
    }
});
