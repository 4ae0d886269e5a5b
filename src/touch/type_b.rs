// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! C6 — the slotted (Type-B) multi-touch emitter.
//!
//! Type-B devices carry contact identity across reports via `ABS_MT_SLOT`
//! and `ABS_MT_TRACKING_ID`. Each operation emits its events immediately;
//! `commit` only flushes `SYN_REPORT`.

use log::warn;
use uinput_sys::*;

use crate::contacts::ContactState;
use crate::device::DeviceState;
use crate::event::write_event;

pub fn down(state: &mut DeviceState, slot: usize, x: i32, y: i32, pressure: i32) -> bool {
    if slot >= state.max_contacts {
        return false;
    }

    if !state.contacts.get(slot).is_idle() {
        panic_reset_all(state);
    }

    let tracking_id = state.mint_tracking_id();
    {
        let contact = state.contacts.get_mut(slot);
        contact.state = ContactState::Down;
        contact.tracking_id = tracking_id;
        contact.x = x;
        contact.y = y;
        contact.pressure = pressure;
    }
    state.active_contacts += 1;

    let fd = state.fd();
    emit(fd, EV_ABS, ABS_MT_SLOT, slot as i32);
    emit(fd, EV_ABS, ABS_MT_TRACKING_ID, tracking_id);

    if state.has_key_btn_touch && state.active_contacts == 1 {
        emit(fd, EV_KEY, BTN_TOUCH, 1);
    }
    if state.has_touch_major {
        emit(fd, EV_ABS, ABS_MT_TOUCH_MAJOR, 0x06);
    }
    if state.has_width_major {
        emit(fd, EV_ABS, ABS_MT_WIDTH_MAJOR, 0x04);
    }
    if state.has_pressure {
        emit(fd, EV_ABS, ABS_MT_PRESSURE, pressure);
    }
    emit(fd, EV_ABS, ABS_MT_POSITION_X, x);
    emit(fd, EV_ABS, ABS_MT_POSITION_Y, y);

    true
}

pub fn move_to(state: &mut DeviceState, slot: usize, x: i32, y: i32, pressure: i32) -> bool {
    if slot >= state.max_contacts || state.contacts.get(slot).is_idle() {
        return false;
    }

    {
        let contact = state.contacts.get_mut(slot);
        contact.x = x;
        contact.y = y;
        contact.pressure = pressure;
    }

    let fd = state.fd();
    emit(fd, EV_ABS, ABS_MT_SLOT, slot as i32);
    if state.has_touch_major {
        emit(fd, EV_ABS, ABS_MT_TOUCH_MAJOR, 0x06);
    }
    if state.has_width_major {
        emit(fd, EV_ABS, ABS_MT_WIDTH_MAJOR, 0x04);
    }
    if state.has_pressure {
        emit(fd, EV_ABS, ABS_MT_PRESSURE, pressure);
    }
    emit(fd, EV_ABS, ABS_MT_POSITION_X, x);
    emit(fd, EV_ABS, ABS_MT_POSITION_Y, y);

    true
}

pub fn up(state: &mut DeviceState, slot: usize) -> bool {
    if slot >= state.max_contacts || state.contacts.get(slot).is_idle() {
        return false;
    }

    state.contacts.get_mut(slot).state = ContactState::Idle;
    state.active_contacts -= 1;

    let fd = state.fd();
    emit(fd, EV_ABS, ABS_MT_SLOT, slot as i32);
    emit(fd, EV_ABS, ABS_MT_TRACKING_ID, -1);

    if state.has_key_btn_touch && state.active_contacts == 0 {
        emit(fd, EV_KEY, BTN_TOUCH, 0);
    }

    true
}

pub fn panic_reset_all(state: &mut DeviceState) {
    let fd = state.fd();
    let mut changed = false;

    for slot in 0..state.max_contacts {
        if !state.contacts.get(slot).is_idle() {
            state.contacts.get_mut(slot).state = ContactState::Idle;
            state.active_contacts = state.active_contacts.saturating_sub(1);
            emit(fd, EV_ABS, ABS_MT_SLOT, slot as i32);
            emit(fd, EV_ABS, ABS_MT_TRACKING_ID, -1);
            changed = true;
        }
    }

    if state.has_key_btn_touch && changed {
        emit(fd, EV_KEY, BTN_TOUCH, 0);
    }

    if changed {
        emit(fd, EV_SYN, SYN_REPORT, 0);
    }
}

pub fn commit(state: &mut DeviceState) {
    let fd = state.fd();
    emit(fd, EV_SYN, SYN_REPORT, 0);
}

fn emit(fd: std::os::unix::io::RawFd, kind: u32, code: u32, value: i32) {
    if let Err(e) = write_event(fd, kind as u16, code as u16, value) {
        warn!("short or failed device write: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::tests_support::test_device_state;

    #[test]
    fn down_on_out_of_range_slot_is_rejected() {
        let mut state = test_device_state(true, 5);
        assert!(!down(&mut state, 99, 0, 0, 0));
        assert_eq!(state.active_contacts, 0);
    }

    #[test]
    fn move_or_up_on_idle_slot_is_a_no_op() {
        let mut state = test_device_state(true, 5);
        assert!(!move_to(&mut state, 0, 10, 10, 10));
        assert!(!up(&mut state, 0));
        assert!(state.contacts.get(0).is_idle());
    }

    #[test]
    fn tracking_ids_are_strictly_increasing_across_downs() {
        let mut state = test_device_state(true, 5);
        assert!(down(&mut state, 0, 0, 0, 0));
        let first_id = state.contacts.get(0).tracking_id;
        assert!(up(&mut state, 0));
        assert!(down(&mut state, 1, 0, 0, 0));
        let second_id = state.contacts.get(1).tracking_id;
        assert!(second_id > first_id);
    }

    #[test]
    fn two_finger_pinch_tracks_active_count() {
        let mut state = test_device_state(true, 5);
        assert!(down(&mut state, 0, 100, 100, 50));
        assert!(down(&mut state, 1, 900, 1800, 50));
        commit(&mut state);
        assert_eq!(state.active_contacts, 2);

        assert!(move_to(&mut state, 0, 200, 200, 60));
        assert!(move_to(&mut state, 1, 800, 1700, 60));
        commit(&mut state);
        assert_eq!(state.active_contacts, 2);

        assert!(up(&mut state, 0));
        assert!(up(&mut state, 1));
        commit(&mut state);
        assert_eq!(state.active_contacts, 0);
    }

    #[test]
    fn overlapping_down_panic_resets_before_reaccepting() {
        let mut state = test_device_state(true, 5);
        assert!(down(&mut state, 0, 100, 100, 50));
        commit(&mut state);
        assert_eq!(state.active_contacts, 1);
        let first_id = state.contacts.get(0).tracking_id;

        assert!(down(&mut state, 0, 200, 200, 50));
        commit(&mut state);
        assert_eq!(state.active_contacts, 1);
        let second_id = state.contacts.get(0).tracking_id;
        assert!(second_id > first_id);
    }

    #[test]
    fn panic_reset_is_idempotent() {
        let mut state = test_device_state(true, 5);
        assert!(down(&mut state, 0, 1, 1, 1));
        panic_reset_all(&mut state);
        assert_eq!(state.active_contacts, 0);
        // second reset sees an already-idle table: no further state change.
        panic_reset_all(&mut state);
        assert_eq!(state.active_contacts, 0);
    }
}
