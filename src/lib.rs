// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core of the touch-injection daemon, split out as a library so the
//! protocol, device-selection, and emitter logic are unit-testable without
//! going through a process or touching real hardware.

pub mod cli;
pub mod contacts;
pub mod device;
pub mod error;
pub mod event;
pub mod protocol;
pub mod touch;
pub mod transport;

pub use error::Error;
