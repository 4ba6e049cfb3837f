#![no_main]

use libfuzzer_sys::fuzz_target;

use tonfeed_format::boc;

// Decoding must never panic, and anything that decodes must survive a
// reencode cycle unchanged
fuzz_target!(|data: &[u8]| {
    let Ok(cell) = boc::decode(data) else {
        return;
    };

    let encoded = boc::encode(&cell);

    let out = boc::decode(&encoded).expect("reencoded boc should decode");

    assert_eq!(out, cell, "decoded cell should match original");
});
