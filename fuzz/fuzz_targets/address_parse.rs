#![no_main]

use std::str::FromStr;

use libfuzzer_sys::fuzz_target;

use tonfeed_format::Address;

// Parsing must never panic, and every accepted address must roundtrip
// through its display form
fuzz_target!(|data: &str| {
    let Ok(address) = Address::from_str(data) else {
        return;
    };

    let out = Address::from_str(&address.to_string()).expect("displayed address should parse");

    assert_eq!(out, address);
});
