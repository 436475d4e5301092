//! rotctld-style line protocol.
//!
//! ```text
//!   p\n                  ->  "<azimuth>\n<elevation>\n"   (two decimals)
//!   P <az> <el>\n        ->  "RPRT 0\n"
//!   anything else\n      ->  "RPRT 0\n"
//! ```
//!
//! Every line gets exactly one response.  A `P` whose fields do not parse
//! is acknowledged like any other line and leaves the targets alone.

use core::fmt::Write;

use heapless::String;
use log::{debug, warn};

use crate::ports::RotatorPort;

/// Large enough for two `{:.2}` renderings of any finite `f32`.
pub const RESPONSE_CAP: usize = 128;

pub type Response = String<RESPONSE_CAP>;

const ACK: &str = "RPRT 0\n";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// `p`
    GetPosition,
    /// `P az el`; `None` when the fields are missing or not finite numbers.
    SetPosition(Option<(f32, f32)>),
    /// Any other line, including an empty one.
    Unknown,
}

/// Classify one line.  `line` excludes the `\n`; a trailing `\r` is ignored.
pub fn parse(line: &[u8]) -> Command {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    match line.first() {
        Some(b'p') => Command::GetPosition,
        Some(b'P') => Command::SetPosition(parse_pair(&line[1..])),
        _ => Command::Unknown,
    }
}

fn parse_pair(args: &[u8]) -> Option<(f32, f32)> {
    let text = core::str::from_utf8(args).ok()?;
    let mut fields = text.split_ascii_whitespace();
    let az = parse_finite(fields.next()?)?;
    let el = parse_finite(fields.next()?)?;
    Some((az, el))
}

fn parse_finite(field: &str) -> Option<f32> {
    field.parse::<f32>().ok().filter(|v| v.is_finite())
}

/// Run a command against the rotator and render its response.
pub fn execute<R: RotatorPort + ?Sized>(cmd: Command, rotator: &R) -> Response {
    let mut out = Response::new();
    match cmd {
        Command::GetPosition => {
            let (az, el) = rotator.get_position();
            if write!(out, "{:.2}\n{:.2}\n", az, el).is_err() {
                warn!("tcpsrv: position response truncated");
            }
        }
        Command::SetPosition(Some((az, el))) => {
            rotator.set_position(az, el);
            ack(&mut out);
        }
        Command::SetPosition(None) => {
            debug!("tcpsrv: malformed P command ignored");
            ack(&mut out);
        }
        Command::Unknown => ack(&mut out),
    }
    out
}

fn ack(out: &mut Response) {
    // ACK is far below RESPONSE_CAP.
    let _ = out.push_str(ACK);
}
