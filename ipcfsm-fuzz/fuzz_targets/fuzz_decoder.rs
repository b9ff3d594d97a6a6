#![no_main]

use bytes::Bytes;
use ipcfsm_core::buffer::SegmentedBuffer;
use ipcfsm_proto::FrameDecoder;
use libfuzzer_sys::fuzz_target;

// Arbitrary bytes fed to the frame decoder, one unpredictable chunk at a
// time, must never panic regardless of how the input is sliced.
fuzz_target!(|data: &[u8]| {
    let mut decoder = FrameDecoder::new();
    let mut buf = SegmentedBuffer::new();

    for chunk in data.chunks(7.max(data.len() / 5 + 1)) {
        buf.push(Bytes::copy_from_slice(chunk));
        loop {
            match decoder.decode(&mut buf) {
                Ok(Some(_frame)) => continue,
                Ok(None) => break,
                Err(_) => return,
            }
        }
    }
});
