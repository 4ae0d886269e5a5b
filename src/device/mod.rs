// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The chosen device's capability snapshot and live protocol state.

pub mod probe;
pub mod select;

use std::os::unix::io::{AsRawFd, RawFd};
use std::path::PathBuf;

use log::info;

use crate::contacts::{next_tracking_id, ContactTable, MAX_SUPPORTED_CONTACTS};
use crate::error::DeviceError;

use self::probe::ProbedDevice;

/// §6/§9: Type-B's effective contact count is `abs_maximum(ABS_MT_SLOT) + 1`
/// (slot indices are 0-based); Type-A has no slot axis and is fixed at the
/// historical 2-contact assumption.
fn reported_contact_count(has_mtslot: bool, max_slot: i32) -> usize {
    if has_mtslot {
        (max_slot as i64 + 1).max(0) as usize
    } else {
        2
    }
}

/// True when the Type-A kernel-misreport workaround (§6) should fire.
fn resolve_max_tracking_id_misreport(has_mtslot: bool, has_tracking_id: bool, max_tracking_id: i32) -> bool {
    !has_mtslot && has_tracking_id && max_tracking_id == 0
}

/// Capability flags and limits captured at probe time, plus the live
/// protocol state (`ContactTable`, tracking-id counter, active-contact
/// count) mutated only by the protocol-dispatch component.
pub struct DeviceState {
    device: Box<dyn AsRawFd>,
    pub path: PathBuf,
    pub score: i64,

    pub has_mtslot: bool,
    pub has_tracking_id: bool,
    pub has_key_btn_touch: bool,
    pub has_touch_major: bool,
    pub has_width_major: bool,
    pub has_pressure: bool,

    pub min_pressure: i32,
    pub max_pressure: i32,
    pub max_x: i32,
    pub max_y: i32,

    pub max_tracking_id: i32,
    pub max_contacts: usize,

    next_tracking_id_counter: i32,
    pub active_contacts: usize,

    pub contacts: ContactTable,
}

impl DeviceState {
    /// Builds the live `DeviceState` from a probe winner, clamping
    /// `max_contacts` to `MAX_SUPPORTED_CONTACTS` and applying the
    /// Type-A `max_tracking_id == 0` kernel-misreport workaround.
    pub fn from_probed(probed: ProbedDevice) -> Result<Self, DeviceError> {
        let ProbedDevice {
            path,
            score,
            device,
            has_mtslot,
            has_tracking_id,
            has_key_btn_touch,
            has_touch_major,
            has_width_major,
            has_pressure,
            min_pressure,
            max_pressure,
            max_x,
            max_y,
            max_slot,
            mut max_tracking_id,
        } = probed;

        let reported_contacts = reported_contact_count(has_mtslot, max_slot);
        if reported_contacts > MAX_SUPPORTED_CONTACTS {
            info!(
                "{}: device reports {reported_contacts} contacts, clamping to the hard cap {}",
                path.display(),
                MAX_SUPPORTED_CONTACTS
            );
        }
        let max_contacts = reported_contacts.min(MAX_SUPPORTED_CONTACTS);
        debug_assert!(max_contacts <= MAX_SUPPORTED_CONTACTS);

        if resolve_max_tracking_id_misreport(has_mtslot, has_tracking_id, max_tracking_id) {
            info!(
                "{}: device reports max_tracking_id == 0, treating as a kernel misreport \
                 and using {} instead",
                path.display(),
                MAX_SUPPORTED_CONTACTS - 1
            );
            max_tracking_id = (MAX_SUPPORTED_CONTACTS - 1) as i32;
        }

        Ok(DeviceState {
            device: Box::new(device),
            path,
            score,
            has_mtslot,
            has_tracking_id,
            has_key_btn_touch,
            has_touch_major,
            has_width_major,
            has_pressure,
            min_pressure,
            max_pressure,
            max_x,
            max_y,
            max_tracking_id,
            max_contacts,
            next_tracking_id_counter: 0,
            active_contacts: 0,
            contacts: ContactTable::new(),
        })
    }

    pub fn fd(&self) -> RawFd {
        self.device.as_raw_fd()
    }

    /// Mints the next Type-B tracking id.
    pub fn mint_tracking_id(&mut self) -> i32 {
        self.next_tracking_id_counter = next_tracking_id(self.next_tracking_id_counter);
        self.next_tracking_id_counter
    }
}

/// Test-only constructors, shared with `touch::type_a`/`touch::type_b`'s own
/// unit tests: a `DeviceState` whose writes go to `/dev/null` rather than a
/// real evdev node.
#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;
    use std::fs::OpenOptions;

    pub fn test_device_state(has_mtslot: bool, max_contacts: usize) -> DeviceState {
        let null = OpenOptions::new()
            .read(true)
            .write(true)
            .open("/dev/null")
            .expect("/dev/null is always available");

        DeviceState {
            device: Box::new(null),
            path: PathBuf::from("/dev/null"),
            score: 0,
            has_mtslot,
            has_tracking_id: true,
            has_key_btn_touch: true,
            has_touch_major: true,
            has_width_major: true,
            has_pressure: true,
            min_pressure: 0,
            max_pressure: 255,
            max_x: 1079,
            max_y: 1919,
            max_tracking_id: i32::MAX,
            max_contacts,
            next_tracking_id_counter: 0,
            active_contacts: 0,
            contacts: ContactTable::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_b_max_contacts_is_slot_plus_one() {
        assert_eq!(reported_contact_count(true, 4), 5);
    }

    #[test]
    fn type_a_max_contacts_is_the_historical_constant() {
        assert_eq!(reported_contact_count(false, 0), 2);
    }

    #[test]
    fn max_contacts_is_clamped_to_hard_cap() {
        let reported = reported_contact_count(true, 50);
        assert_eq!(reported.min(MAX_SUPPORTED_CONTACTS), MAX_SUPPORTED_CONTACTS);
    }

    #[test]
    fn type_a_zero_max_tracking_id_is_treated_as_misreport() {
        assert!(resolve_max_tracking_id_misreport(false, true, 0));
        assert!(!resolve_max_tracking_id_misreport(false, true, 5));
        assert!(!resolve_max_tracking_id_misreport(false, false, 0));
        assert!(!resolve_max_tracking_id_misreport(true, true, 0));
    }
}
