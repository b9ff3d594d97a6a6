#![no_main]

use ipcfsm_proto::parse_header;
use libfuzzer_sys::fuzz_target;

// Arbitrary bytes fed to the handshake header parser must never panic,
// regardless of length or content.
fuzz_target!(|data: &[u8]| {
    let _ = parse_header(data);
});
