//! Fuzz target: `FrameAssembler::feed`
//!
//! Drives arbitrary byte sequences, split at a fuzzer-chosen chunk size,
//! into the streaming frame assembler and asserts that it never panics,
//! always makes progress and never yields a payload beyond its capacity.
//!
//! cargo fuzz run fuzz_frame_assembler

#![no_main]

use cmdcore::protocol::codec::FrameAssembler;
use libfuzzer_sys::fuzz_target;

const MAX_PAYLOAD: usize = 256;

fuzz_target!(|data: &[u8]| {
    let Some((&chunk, stream)) = data.split_first() else {
        return;
    };
    let chunk = usize::from(chunk.max(1));
    let mut asm = FrameAssembler::new(MAX_PAYLOAD);

    for piece in stream.chunks(chunk) {
        let mut offset = 0;
        while offset < piece.len() {
            let (used, frame) = asm.feed(&piece[offset..]);
            assert!(used > 0, "assembler made no progress");
            offset += used;
            if let Some(header) = frame {
                assert!(header.payload_len() <= MAX_PAYLOAD);
                assert_eq!(asm.payload().len(), header.payload_len());
            }
        }
    }

    // After a reset the assembler must accept bytes cleanly again.
    asm.reset();
    assert!(!asm.is_partial());
    let _ = asm.feed(stream);
});
