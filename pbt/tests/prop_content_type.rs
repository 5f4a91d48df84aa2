//! Content-Type のプロパティテスト

use pbt::boundary;
use proptest::prelude::*;
use shiguredo_multipart::MultipartError;
use shiguredo_multipart::content_type::ContentType;

fn multipart_subtype() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("form-data".to_string()),
        Just("mixed".to_string()),
        Just("alternative".to_string()),
        Just("related".to_string()),
    ]
}

// 表示した Content-Type から境界文字列を取り出せる (引用符が必要な場合を含む)
proptest! {
    #[test]
    fn content_type_boundary_roundtrip(subtype in multipart_subtype(), boundary in boundary()) {
        let ct = ContentType::new("multipart", &subtype).with_parameter("boundary", &boundary);
        let rendered = ct.to_string();

        let parsed = ContentType::parse(&rendered).unwrap();
        prop_assert!(parsed.is_multipart());
        prop_assert_eq!(parsed.subtype(), subtype.as_str());
        prop_assert_eq!(parsed.boundary(), Some(boundary.as_str()));
        prop_assert_eq!(ContentType::multipart_boundary(&rendered).unwrap(), boundary);
    }
}

// 大文字小文字と空白の揺れを受け入れる
proptest! {
    #[test]
    fn content_type_case_and_whitespace(
        boundary in "[a-zA-Z0-9]{1,32}",
        upper in any::<bool>(),
        spaces in "[ ]{0,3}"
    ) {
        let media = if upper { "MULTIPART/FORM-DATA" } else { "multipart/form-data" };
        let input = format!("{}{};{}Boundary={}{}", spaces, media, spaces, boundary, spaces);
        let ct = ContentType::parse(&input).unwrap();
        prop_assert!(ct.is_form_data());
        prop_assert_eq!(ContentType::multipart_boundary(&input).unwrap(), boundary);
    }
}

// multipart 以外は境界の有無に関係なく拒否する
proptest! {
    #[test]
    fn non_multipart_rejected(
        media in prop_oneof![Just("text"), Just("image"), Just("application")],
        subtype in "[a-z]{1,8}",
        boundary in "[a-z]{1,8}"
    ) {
        let input = format!("{}/{}; boundary={}", media, subtype, boundary);
        prop_assert_eq!(
            ContentType::multipart_boundary(&input),
            Err(MultipartError::NonMultipartContentType(format!("{}/{}", media, subtype)))
        );
    }
}
