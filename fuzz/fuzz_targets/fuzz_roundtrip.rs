#![no_main]
use libfuzzer_sys::fuzz_target;
use xmldom::escape::{escape, escaped_length, unescape};
use xmldom::serial::print;
use xmldom::Document;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Escaping is lossless for any text
        let escaped = escape(s);
        assert_eq!(escaped.len(), escaped_length(s));
        assert_eq!(unescape(&escaped), s);

        // Parse -> print -> parse should never panic or fail
        if let Ok(doc) = Document::parse_str(s) {
            let output = print(&doc, false);
            assert!(Document::parse_str(&output).is_ok());
        }
    }
});
