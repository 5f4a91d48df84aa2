#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_multipart::content_disposition::ContentDisposition;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(cd) = ContentDisposition::parse(s) {
            let _ = cd.disposition_type();
            let _ = cd.name();
            let _ = cd.filename();
            let _ = cd.is_form_data();

            let displayed = cd.to_string();
            if let Ok(reparsed) = ContentDisposition::parse(&displayed) {
                assert_eq!(cd.disposition_type(), reparsed.disposition_type());
            }
        }
    }
});
