#![no_main]
use libfuzzer_sys::fuzz_target;
use wixcop::{Converter, Settings};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let settings = Settings::default();
        let converter = Converter::new(&settings, 4);
        // Converting must never panic, and converting the output again must
        // leave it unchanged.
        if let Ok(first) = converter.convert_str(s) {
            let second = converter
                .convert_str(&first.output)
                .expect("canonical output must parse");
            assert_eq!(first.output, second.output);
        }
    }
});
