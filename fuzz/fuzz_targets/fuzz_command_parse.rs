//! Fuzz target: `protocol::parse`
//!
//! Classification must be total.  A `SetPosition` carrying values only
//! ever carries finite ones.
//!
//! cargo fuzz run fuzz_command_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use rotator::server::protocol::{self, Command};

fuzz_target!(|line: &[u8]| {
    match protocol::parse(line) {
        Command::SetPosition(Some((az, el))) => {
            assert!(az.is_finite() && el.is_finite());
            assert_eq!(line.first(), Some(&b'P'));
        }
        Command::SetPosition(None) => assert_eq!(line.first(), Some(&b'P')),
        Command::GetPosition => assert_eq!(line.first(), Some(&b'p')),
        Command::Unknown => {}
    }
});
