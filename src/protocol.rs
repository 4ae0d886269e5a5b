// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! C8 — the line protocol: banner, command parsing, dispatch to the emitter.

use std::io::{self, Write};
use std::time::Duration;

use log::debug;

use crate::device::DeviceState;
use crate::touch::TouchEmitter;

/// The banner's version line. Bumped only if the wire format changes.
pub const VERSION: u32 = 1;

/// Writes the three-line banner a client receives immediately on connect,
/// before any command is consumed: `v <version>`, `^ <max_contacts> <max_x>
/// <max_y> <max_pressure>`, `$ <pid>`.
pub fn write_banner<W: Write>(w: &mut W, state: &DeviceState, pid: u32) -> io::Result<()> {
    writeln!(w, "v {VERSION}")?;
    writeln!(
        w,
        "^ {} {} {} {}",
        state.max_contacts, state.max_x, state.max_y, state.max_pressure
    )?;
    writeln!(w, "$ {pid}")?;
    w.flush()
}

/// A parsed command line. Unrecognized first bytes and malformed lines
/// parse to `Ignore` — per spec there is no error channel back to the
/// client, so a command that can't be made sense of is simply dropped.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Down { slot: i64, x: i64, y: i64, pressure: i64 },
    Move { slot: i64, x: i64, y: i64, pressure: i64 },
    Up { slot: i64 },
    Commit,
    Reset,
    Wait { millis: u64 },
    Ignore,
}

/// A lenient integer scan consistent with `strtol`'s tolerance for garbage:
/// an optional sign followed by a run of digits is consumed and everything
/// after the first non-digit is ignored, so `"12abc"` reads as `12`, not as
/// a parse failure. A token with no leading digits (or a missing field)
/// becomes `0`.
fn lenient_i64(token: Option<&str>) -> i64 {
    let s = match token {
        Some(s) => s,
        None => return 0,
    };

    let bytes = s.as_bytes();
    let mut idx = 0;
    let negative = match bytes.first() {
        Some(b'-') => {
            idx += 1;
            true
        }
        Some(b'+') => {
            idx += 1;
            false
        }
        _ => false,
    };

    let digits_start = idx;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    if idx == digits_start {
        return 0;
    }

    let magnitude: i64 = s[digits_start..idx].parse().unwrap_or(0);
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

fn parse_line(line: &str) -> Command {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return Command::Ignore;
    }

    let mut fields = line[1..].split_whitespace();
    match line.as_bytes()[0] {
        b'd' => Command::Down {
            slot: lenient_i64(fields.next()),
            x: lenient_i64(fields.next()),
            y: lenient_i64(fields.next()),
            pressure: lenient_i64(fields.next()),
        },
        b'm' => Command::Move {
            slot: lenient_i64(fields.next()),
            x: lenient_i64(fields.next()),
            y: lenient_i64(fields.next()),
            pressure: lenient_i64(fields.next()),
        },
        b'u' => Command::Up {
            slot: lenient_i64(fields.next()),
        },
        b'c' => Command::Commit,
        b'r' => Command::Reset,
        b'w' => Command::Wait {
            millis: lenient_i64(fields.next()).max(0) as u64,
        },
        _ => Command::Ignore,
    }
}

/// A slot index outside `0..MAX_SUPPORTED_CONTACTS` is always rejected by
/// the emitters' own bounds check; negative input is mapped to a sentinel
/// that is guaranteed out of range rather than silently wrapping.
fn slot_index(raw: i64) -> usize {
    usize::try_from(raw).unwrap_or(usize::MAX)
}

/// Drives one client session: owns the device state and the protocol-A/B
/// emitter chosen for it, and applies each parsed line in order.
pub struct Interpreter<'a> {
    device: &'a mut DeviceState,
    emitter: TouchEmitter,
}

impl<'a> Interpreter<'a> {
    pub fn new(device: &'a mut DeviceState) -> Self {
        let emitter = TouchEmitter::for_device(device);
        Interpreter { device, emitter }
    }

    /// Applies one already-trimmed command line. Returns `Some(millis)`
    /// when the line was a `w` command, so the caller (which owns the
    /// actual sleep — a suspension point, not core-state mutation) can
    /// delay before consuming the next line.
    pub fn apply_line(&mut self, line: &str) -> Option<Duration> {
        match parse_line(line) {
            Command::Down { slot, x, y, pressure } => {
                let applied = self.emitter.down(
                    self.device,
                    slot_index(slot),
                    x as i32,
                    y as i32,
                    pressure as i32,
                );
                if !applied {
                    debug!("down on slot {slot} dropped silently");
                }
                None
            }
            Command::Move { slot, x, y, pressure } => {
                let applied = self.emitter.move_to(
                    self.device,
                    slot_index(slot),
                    x as i32,
                    y as i32,
                    pressure as i32,
                );
                if !applied {
                    debug!("move on slot {slot} dropped silently");
                }
                None
            }
            Command::Up { slot } => {
                let applied = self.emitter.up(self.device, slot_index(slot));
                if !applied {
                    debug!("up on slot {slot} dropped silently");
                }
                None
            }
            Command::Commit => {
                self.emitter.commit(self.device);
                None
            }
            Command::Reset => {
                self.emitter.panic_reset_all(self.device);
                None
            }
            Command::Wait { millis } => Some(Duration::from_millis(millis)),
            Command::Ignore => None,
        }
    }
}
