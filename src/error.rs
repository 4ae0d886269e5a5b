// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can surface while locating and opening the multi-touch device.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("no suitable multi-touch device found under {root}")]
    NoSuitableDevice { root: PathBuf },

    #[error("{path}: not a supported touch device")]
    NotSupported { path: PathBuf },

    #[error("unable to scan {root}: {source}")]
    ScanFailed { root: PathBuf, source: io::Error },
}

/// Errors that can surface while standing up the client-facing transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to bind socket {name:?}: {source}")]
    BindFailed { name: String, source: io::Error },

    #[error("failed to open script file {path}: {source}")]
    FileOpenFailed { path: PathBuf, source: io::Error },

    #[error("accept failed: {0}")]
    AcceptFailed(io::Error),

    #[error("proxy connect to {addr} failed: {source}")]
    ProxyConnectFailed { addr: String, source: io::Error },

    #[error("command session ended with an error: {0}")]
    SessionFailed(io::Error),
}

/// Top-level error type, matched once in `main` to select an exit code.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
