//! Fuzz target: `LineBuffer::feed` + `protocol::parse`
//!
//! The first input byte picks a chunk size; the rest is streamed into a
//! session-sized line buffer in chunks of that size.  Every completed line
//! is classified and answered.  Nothing may panic, no delivered line may
//! exceed the buffer, and no reply may exceed the response buffer.
//!
//! cargo fuzz run fuzz_line_assembler

#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use rotator::rotator::{AxisLink, RotatorController};
use rotator::server::protocol::{self, RESPONSE_CAP};
use rotator::server::session::MAX_LINE_LEN;
use rotator::server::{LineBuffer, LineEvent};

fuzz_target!(|data: &[u8]| {
    let Some((&chunk, stream)) = data.split_first() else {
        return;
    };
    let chunk = usize::from(chunk).max(1);

    let rotator = RotatorController::new(Arc::new(AxisLink::new()), Arc::new(AxisLink::new()));
    let mut buf = LineBuffer::<MAX_LINE_LEN>::new();

    for piece in stream.chunks(chunk) {
        let _ = buf.feed::<()>(piece, |event| {
            if let LineEvent::Line(line) = event {
                assert!(line.len() <= MAX_LINE_LEN, "line exceeds buffer");
                let resp = protocol::execute(protocol::parse(line), &rotator);
                assert!(resp.len() <= RESPONSE_CAP);
                assert!(resp.ends_with('\n'), "unterminated reply");
            }
            Ok(())
        });
        assert!(buf.pending() <= MAX_LINE_LEN);
    }

    // After a reset the buffer must accept bytes cleanly again.
    buf.reset();
    assert_eq!(buf.pending(), 0);
    assert!(!buf.is_discarding());
});
