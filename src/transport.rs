// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! C9 — external glue: how command lines and the banner actually reach the
//! wire. The core (`protocol::Interpreter`) knows nothing about sockets,
//! stdin, or files; this module is the only place that does.

use std::io::{self, BufRead, BufReader, Write};
use std::net::Shutdown;
use std::os::unix::io::FromRawFd;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;
use std::thread;

use log::{info, warn};

use crate::device::DeviceState;
use crate::error::TransportError;
use crate::protocol::{write_banner, Interpreter};

/// Runs one client session to completion: banner, then command lines until
/// EOF, honoring `w <ms>` sleeps between lines. Single-threaded and
/// cooperative per §5 — the caller is responsible for serializing sessions.
fn serve_session<R: BufRead, W: Write>(
    device: &mut DeviceState,
    reader: R,
    mut writer: W,
) -> io::Result<()> {
    let pid = std::process::id();
    write_banner(&mut writer, device, pid)?;

    let mut interpreter = Interpreter::new(device);
    let mut lines = reader.lines();
    while let Some(line) = lines.next() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("command stream read error: {e}");
                break;
            }
        };
        if let Some(delay) = interpreter.apply_line(&line) {
            thread::sleep(delay);
        }
    }
    Ok(())
}

/// Builds the raw `sockaddr_un` for an abstract-namespace socket named
/// `name` (Linux convention: a leading `NUL` byte in `sun_path`, with the
/// name following it — the address is not NUL-terminated and its length is
/// `sizeof(sun_family) + 1 + name.len()`, per spec.md §6).
fn abstract_sockaddr(name: &[u8]) -> io::Result<(libc::sockaddr_un, libc::socklen_t)> {
    let mut addr: libc::sockaddr_un = unsafe { std::mem::zeroed() };
    addr.sun_family = libc::AF_UNIX as libc::sa_family_t;

    // sun_path[0] is left zero (the abstract-namespace marker); the name
    // occupies sun_path[1..].
    if name.len() + 1 > addr.sun_path.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "abstract socket name too long",
        ));
    }
    for (slot, &byte) in addr.sun_path[1..=name.len()].iter_mut().zip(name) {
        *slot = byte as libc::c_char;
    }

    let len = std::mem::size_of::<libc::sa_family_t>() + 1 + name.len();
    Ok((addr, len as libc::socklen_t))
}

/// Hand-rolls `socket`/`bind`/`listen` directly: `std::os::unix::net::
/// UnixListener` has no way to request a custom listen backlog, but
/// spec.md §6 pins it at exactly 1, so this bypasses the safe wrapper's
/// `listen(fd, 128)` default the same way `event::write_event` bypasses
/// `std::fs::File` to get a bit-exact event write.
fn bind_abstract_listener(name: &str) -> io::Result<UnixListener> {
    let (addr, addr_len) = abstract_sockaddr(name.as_bytes())?;

    let fd = unsafe { libc::socket(libc::AF_UNIX, libc::SOCK_STREAM, 0) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }

    let bind_rc = unsafe {
        libc::bind(
            fd,
            (&addr as *const libc::sockaddr_un).cast::<libc::sockaddr>(),
            addr_len,
        )
    };
    if bind_rc != 0 {
        let err = io::Error::last_os_error();
        unsafe { libc::close(fd) };
        return Err(err);
    }

    let listen_rc = unsafe { libc::listen(fd, 1) };
    if listen_rc != 0 {
        let err = io::Error::last_os_error();
        unsafe { libc::close(fd) };
        return Err(err);
    }

    Ok(unsafe { UnixListener::from_raw_fd(fd) })
}

/// Binds an abstract-namespace Unix stream socket named `name` and serves
/// one client at a time, forever: accept, serve to EOF, close, accept
/// again. The listen backlog is 1, matching the historical single-client
/// contract.
pub fn run_socket(device: &mut DeviceState, name: &str) -> Result<(), TransportError> {
    let listener = bind_abstract_listener(name).map_err(|source| TransportError::BindFailed {
        name: name.to_string(),
        source,
    })?;

    info!("listening on abstract socket @{name}");

    loop {
        let (stream, _) = listener.accept().map_err(TransportError::AcceptFailed)?;
        info!("client connected");
        if let Err(e) = serve_one_connection(device, stream) {
            warn!("client session ended with an error: {e}");
        }
        info!("client disconnected");
    }
}

fn serve_one_connection(device: &mut DeviceState, stream: UnixStream) -> io::Result<()> {
    let writer = stream.try_clone()?;
    let reader = BufReader::new(stream);
    let result = serve_session(device, reader, &writer);
    let _ = writer.shutdown(Shutdown::Both);
    result
}

/// Reads commands from standard input, writing the banner and any protocol
/// output to standard output. Used for `-i`.
pub fn run_stdin(device: &mut DeviceState) -> Result<(), TransportError> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    serve_session(device, stdin.lock(), stdout.lock()).map_err(TransportError::SessionFailed)
}

/// Reads a pre-recorded command script from `path`, writing the banner and
/// any protocol output to standard output. Used for `-f`.
pub fn run_file(device: &mut DeviceState, path: &Path) -> Result<(), TransportError> {
    let file = std::fs::File::open(path).map_err(|source| TransportError::FileOpenFailed {
        path: path.to_path_buf(),
        source,
    })?;
    let stdout = io::stdout();
    serve_session(device, BufReader::new(file), stdout.lock())
        .map_err(TransportError::SessionFailed)
}

/// Fallback glue (§9, §C.5): when no usable device was found, forward the
/// banner and raw command bytes to an external proxy endpoint unmodified
/// instead of running the core against a device at all. Kept deliberately
/// thin — the proxy is a plain byte pipe, not a reimplementation of the
/// protocol.
pub fn run_proxy(addr: &str) -> Result<(), TransportError> {
    let mut upstream = std::net::TcpStream::connect(addr).map_err(|source| {
        TransportError::ProxyConnectFailed { addr: addr.to_string(), source }
    })?;

    info!("no local device available, forwarding to proxy at {addr}");

    let mut upstream_reader = upstream.try_clone().map_err(|source| {
        TransportError::ProxyConnectFailed { addr: addr.to_string(), source }
    })?;
    let stdout_pump = thread::spawn(move || {
        let mut stdout = io::stdout();
        let _ = io::copy(&mut upstream_reader, &mut stdout);
    });

    let mut stdin = io::stdin();
    let _ = io::copy(&mut stdin, &mut upstream);
    let _ = upstream.shutdown(Shutdown::Both);
    let _ = stdout_pump.join();
    Ok(())
}
