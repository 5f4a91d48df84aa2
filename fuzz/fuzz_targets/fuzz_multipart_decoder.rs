#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_multipart::{Charset, MultipartDecoder};

fuzz_target!(|data: &[u8]| {
    // 様々な境界でデコードを試行
    let content_types = [
        "multipart/form-data; boundary=boundary",
        "multipart/form-data; boundary=----WebKitFormBoundary",
        "multipart/mixed; boundary=abc123",
        "multipart/mixed; boundary=\"a b\"",
        "multipart/form-data; boundary=-",
    ];

    for content_type in content_types {
        for charset in [Charset::Utf8, Charset::Latin1] {
            // パニックしなければ OK
            if let Ok(decoder) = MultipartDecoder::with_charset(data, content_type, charset) {
                for part in decoder.parts() {
                    let _ = part.name();
                    let _ = part.filename();
                    let _ = part.content_type();
                    let _ = part.content();
                    let _ = part.text();
                    let _ = part.is_file();
                    for (name, value) in part.headers().iter() {
                        let _ = (name, value);
                    }
                }
            }
        }
    }
});
