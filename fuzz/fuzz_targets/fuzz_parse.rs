#![no_main]
use libfuzzer_sys::fuzz_target;
use wixcop::Document;

fuzz_target!(|data: &[u8]| {
    // Decoding and parsing arbitrary bytes should never panic
    let _ = Document::parse_bytes(data);
});
