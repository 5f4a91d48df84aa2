#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_multipart::{
    Fields, MultipartDecoder, MultipartEncoder, NamedFile, boundary_from_random,
};

#[derive(Arbitrary, Debug)]
enum FuzzField {
    Text { name: String, value: String },
    File { name: String, filename: String, data: Vec<u8> },
}

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    random: u128,
    fields: Vec<FuzzField>,
    read_size: u8,
}

fn is_valid_name(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_.~!$&'()*+,=".contains(c))
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fuzz_target!(|input: FuzzInput| {
    let boundary = boundary_from_random(input.random);
    let delimiter = format!("\r\n--{}", boundary);

    let mut fields = Fields::new();
    let mut expected: Vec<(String, Vec<u8>)> = Vec::new();
    for field in &input.fields {
        let (name, bytes) = match field {
            FuzzField::Text { name, value } => (name, value.as_bytes()),
            FuzzField::File { name, data, .. } => (name, data.as_slice()),
        };
        // 名前が不正なもの、内容に区切り行を含むものは対象外
        if !is_valid_name(name) || contains(bytes, delimiter.as_bytes()) {
            continue;
        }
        fields = match field {
            FuzzField::Text { name, value } => fields.text(name, value),
            FuzzField::File {
                name,
                filename,
                data,
            } => {
                if !is_valid_name(filename) {
                    continue;
                }
                fields.file(name, NamedFile::new(filename, data.clone()))
            }
        };
        expected.push((name.clone(), bytes.to_vec()));
    }

    let mut encoder = MultipartEncoder::with_boundary(fields, &boundary).unwrap();
    let content_type = encoder.content_type().to_string();
    let content_length = encoder.content_length();

    // 指定サイズで少しずつ読み取る
    let read_size = usize::from(input.read_size).max(1);
    let mut body = Vec::new();
    loop {
        let chunk = encoder.read(Some(read_size)).unwrap();
        if chunk.is_empty() {
            break;
        }
        assert!(chunk.len() <= read_size);
        body.extend_from_slice(&chunk);
    }
    assert_eq!(content_length, Some(body.len() as u64));

    let decoder = MultipartDecoder::new(&body, &content_type).unwrap();
    let actual: Vec<(String, Vec<u8>)> = decoder
        .into_parts()
        .into_iter()
        .map(|part| {
            let name = part.name().unwrap_or_default().to_string();
            (name, part.into_content().unwrap_or_default())
        })
        .collect();
    assert_eq!(actual, expected);
});
