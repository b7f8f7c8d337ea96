#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    nestsh::fuzz_tokenize_bytes(data);
});
