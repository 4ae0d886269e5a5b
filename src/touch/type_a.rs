// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! C5 — the stateless (Type-A) multi-touch emitter.
//!
//! Type-A devices describe each report by streaming every active contact in
//! one synchronization frame, separated by `SYN_MT_REPORT` and terminated by
//! `SYN_REPORT`. Operations here only mutate the contact table; events are
//! written exclusively by `commit`.

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

    let contact = state.contacts.get_mut(slot);
    contact.state = ContactState::Down;
    contact.x = x;
    contact.y = y;
    contact.pressure = pressure;
    true
}

pub fn move_to(state: &mut DeviceState, slot: usize, x: i32, y: i32, pressure: i32) -> bool {
    if slot >= state.max_contacts || state.contacts.get(slot).is_idle() {
        return false;
    }

    let contact = state.contacts.get_mut(slot);
    contact.state = ContactState::Moved;
    contact.x = x;
    contact.y = y;
    contact.pressure = pressure;
    true
}

pub fn up(state: &mut DeviceState, slot: usize) -> bool {
    if slot >= state.max_contacts || state.contacts.get(slot).is_idle() {
        return false;
    }

    state.contacts.get_mut(slot).state = ContactState::Up;
    true
}

pub fn panic_reset_all(state: &mut DeviceState) {
    for slot in 0..state.max_contacts {
        if !state.contacts.get(slot).is_idle() {
            state.contacts.get_mut(slot).state = ContactState::Up;
        }
    }
    commit(state);
}

pub fn commit(state: &mut DeviceState) {
    let fd = state.fd();
    let mut found_any = false;

    for slot in 0..state.max_contacts {
        let contact = *state.contacts.get(slot);

        match contact.state {
            ContactState::Down => {
                found_any = true;

                if state.has_tracking_id {
                    emit(fd, EV_ABS, ABS_MT_TRACKING_ID, slot as i32);
                }

                state.active_contacts += 1;
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
                    emit(fd, EV_ABS, ABS_MT_PRESSURE, contact.pressure);
                }
                emit(fd, EV_ABS, ABS_MT_POSITION_X, contact.x);
                emit(fd, EV_ABS, ABS_MT_POSITION_Y, contact.y);

                emit(fd, EV_SYN, SYN_MT_REPORT, 0);

                state.contacts.get_mut(slot).state = ContactState::Moved;
            }
            ContactState::Moved => {
                found_any = true;

                if state.has_tracking_id {
                    emit(fd, EV_ABS, ABS_MT_TRACKING_ID, slot as i32);
                }
                if state.has_touch_major {
                    emit(fd, EV_ABS, ABS_MT_TOUCH_MAJOR, 0x06);
                }
                if state.has_width_major {
                    emit(fd, EV_ABS, ABS_MT_WIDTH_MAJOR, 0x04);
                }
                if state.has_pressure {
                    emit(fd, EV_ABS, ABS_MT_PRESSURE, contact.pressure);
                }
                emit(fd, EV_ABS, ABS_MT_POSITION_X, contact.x);
                emit(fd, EV_ABS, ABS_MT_POSITION_Y, contact.y);

                emit(fd, EV_SYN, SYN_MT_REPORT, 0);
            }
            ContactState::Up => {
                found_any = true;

                if state.has_tracking_id {
                    emit(fd, EV_ABS, ABS_MT_TRACKING_ID, slot as i32);
                }

                state.active_contacts -= 1;
                if state.has_key_btn_touch && state.active_contacts == 0 {
                    emit(fd, EV_KEY, BTN_TOUCH, 0);
                }

                emit(fd, EV_SYN, SYN_MT_REPORT, 0);

                state.contacts.get_mut(slot).state = ContactState::Idle;
            }
            ContactState::Idle => {}
        }
    }

    if found_any {
        emit(fd, EV_SYN, SYN_REPORT, 0);
    }
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
        let mut state = test_device_state(false, 2);
        assert!(!down(&mut state, 99, 0, 0, 0));
        assert_eq!(state.active_contacts, 0);
    }

    #[test]
    fn move_or_up_on_idle_slot_is_a_no_op() {
        let mut state = test_device_state(false, 2);
        assert!(!move_to(&mut state, 0, 10, 10, 10));
        assert!(!up(&mut state, 0));
        assert!(state.contacts.get(0).is_idle());
    }

    #[test]
    fn single_tap_toggles_active_contacts_across_commits() {
        let mut state = test_device_state(false, 2);
        assert!(down(&mut state, 0, 100, 200, 50));
        commit(&mut state);
        assert_eq!(state.active_contacts, 1);

        assert!(up(&mut state, 0));
        commit(&mut state);
        assert_eq!(state.active_contacts, 0);
        assert!(state.contacts.get(0).is_idle());
    }

    #[test]
    fn second_down_on_same_slot_panic_resets_first() {
        let mut state = test_device_state(false, 2);
        assert!(down(&mut state, 0, 100, 100, 50));
        commit(&mut state);
        assert_eq!(state.active_contacts, 1);

        // overlapping down triggers panic_reset_all, which commits the
        // up-frame for slot 0 before the new down is accepted.
        assert!(down(&mut state, 0, 200, 200, 50));
        assert_eq!(state.active_contacts, 0);
        commit(&mut state);
        assert_eq!(state.active_contacts, 1);
    }
}
