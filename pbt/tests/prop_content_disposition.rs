//! Content-Disposition のプロパティテスト

use pbt::{field_name, filename};
use proptest::prelude::*;
use shiguredo_multipart::content_disposition::ContentDisposition;

// 引用符やセミコロンを含む値
fn quoted_value() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ;=\"\\\\あ]{0,16}".prop_map(|s| s)
}

proptest! {
    #[test]
    fn content_disposition_roundtrip(name in quoted_value(), filename in proptest::option::of(quoted_value())) {
        let mut cd = ContentDisposition::form_data(&name);
        if let Some(filename) = &filename {
            cd = cd.with_filename(filename);
        }
        let parsed = ContentDisposition::parse(&cd.to_string()).unwrap();
        prop_assert!(parsed.is_form_data());
        prop_assert_eq!(parsed.name(), Some(name.as_str()));
        prop_assert_eq!(parsed.filename(), filename.as_deref());
        prop_assert_eq!(parsed, cd);
    }
}

proptest! {
    #[test]
    fn content_disposition_token_values(name in field_name(), filename in filename()) {
        let input = format!("form-data; name={}; filename={}", name, filename);
        let cd = ContentDisposition::parse(&input).unwrap();
        prop_assert_eq!(cd.name(), Some(name.as_str()));
        prop_assert_eq!(cd.filename(), Some(filename.as_str()));
    }
}
