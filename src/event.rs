// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! C1 — serializing a single kernel input event to the device file.

use std::io;
use std::os::unix::io::RawFd;

use libc::timeval;
use uinput_sys::input_event;

/// Writes one `input_event` record to `fd`, matching the kernel's
/// `struct input_event` byte-for-byte: a zeroed timestamp (the kernel fills
/// it in) followed by `type`, `code`, `value`.
///
/// A single `write(2)` call carries the whole record. Anything other than
/// writing the full `size_of::<input_event>()` bytes is reported as a
/// failure — there is no retry and no partial-write recovery, matching the
/// upstream C implementation this is translated from.
pub fn write_event(fd: RawFd, kind: u16, code: u16, value: i32) -> io::Result<()> {
    let event = input_event {
        time: timeval {
            tv_sec: 0,
            tv_usec: 0,
        },
        kind,
        code,
        value,
    };

    let len = std::mem::size_of::<input_event>();
    let ptr = (&event as *const input_event).cast::<libc::c_void>();

    let written = unsafe { libc::write(fd, ptr, len) };

    if written < 0 {
        return Err(io::Error::last_os_error());
    }
    if written as usize != len {
        return Err(io::Error::new(
            io::ErrorKind::WriteZero,
            format!("short write: wrote {written} of {len} bytes"),
        ));
    }
    Ok(())
}
