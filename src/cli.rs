// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Argument parsing for the `minitouchd` binary.

use std::path::PathBuf;

use clap::Parser;

/// Touch-injection daemon: drives a kernel evdev multi-touch node from a
/// line protocol delivered over an abstract Unix socket, stdin, or a file.
#[derive(Debug, Parser)]
#[command(name = "minitouchd", version, about)]
pub struct Args {
    /// Use this device node instead of probing `/dev/input` for the best match.
    #[arg(short = 'd', long = "device", value_name = "PATH")]
    pub device: Option<PathBuf>,

    /// Name of the abstract Unix domain socket to listen on.
    #[arg(short = 'n', long = "name", value_name = "NAME", default_value = "minitouch")]
    pub name: String,

    /// Enable verbose diagnostics (device scoring notes, per-client connect/disconnect).
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Read commands from standard input instead of opening a socket.
    #[arg(short = 'i', long = "stdin")]
    pub stdin: bool,

    /// Read a pre-recorded command script from this file instead of opening a socket.
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Forward the banner and raw command bytes to this address if no usable device is found.
    #[arg(long = "proxy", value_name = "ADDR")]
    pub proxy: Option<String>,

    /// Root directory to scan for candidate devices when `-d` is not given.
    #[arg(long = "root", value_name = "PATH", default_value = "/dev/input", hide = true)]
    pub root: PathBuf,
}
