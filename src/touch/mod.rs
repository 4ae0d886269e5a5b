// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! C7 — protocol dispatch: route `down`/`move`/`up`/`commit`/`reset` to the
//! Type-A or Type-B emitter, chosen once at device-open time.

pub mod type_a;
pub mod type_b;

use crate::device::DeviceState;

/// Which wire convention the opened device speaks. Fixed for the process
/// lifetime — replaces the C source's per-call `if (state->has_mtslot)`
/// branch with a tagged variant selected once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    TypeA,
    TypeB,
}

pub struct TouchEmitter {
    protocol: Protocol,
}

impl TouchEmitter {
    pub fn for_device(state: &DeviceState) -> Self {
        TouchEmitter {
            protocol: if state.has_mtslot {
                Protocol::TypeB
            } else {
                Protocol::TypeA
            },
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn down(&self, state: &mut DeviceState, slot: usize, x: i32, y: i32, pressure: i32) -> bool {
        match self.protocol {
            Protocol::TypeA => type_a::down(state, slot, x, y, pressure),
            Protocol::TypeB => type_b::down(state, slot, x, y, pressure),
        }
    }

    pub fn move_to(&self, state: &mut DeviceState, slot: usize, x: i32, y: i32, pressure: i32) -> bool {
        match self.protocol {
            Protocol::TypeA => type_a::move_to(state, slot, x, y, pressure),
            Protocol::TypeB => type_b::move_to(state, slot, x, y, pressure),
        }
    }

    pub fn up(&self, state: &mut DeviceState, slot: usize) -> bool {
        match self.protocol {
            Protocol::TypeA => type_a::up(state, slot),
            Protocol::TypeB => type_b::up(state, slot),
        }
    }

    pub fn commit(&self, state: &mut DeviceState) {
        match self.protocol {
            Protocol::TypeA => type_a::commit(state),
            Protocol::TypeB => type_b::commit(state),
        }
    }

    pub fn panic_reset_all(&self, state: &mut DeviceState) {
        match self.protocol {
            Protocol::TypeA => type_a::panic_reset_all(state),
            Protocol::TypeB => type_b::panic_reset_all(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::tests_support::test_device_state;

    #[test]
    fn picks_type_b_when_device_has_mtslot() {
        let state = test_device_state(true, 5);
        assert_eq!(TouchEmitter::for_device(&state).protocol(), Protocol::TypeB);
    }

    #[test]
    fn picks_type_a_when_device_lacks_mtslot() {
        let state = test_device_state(false, 2);
        assert_eq!(TouchEmitter::for_device(&state).protocol(), Protocol::TypeA);
    }

    #[test]
    fn dispatch_routes_through_to_the_chosen_protocol() {
        let mut state = test_device_state(true, 5);
        let emitter = TouchEmitter::for_device(&state);
        assert!(emitter.down(&mut state, 0, 1, 2, 3));
        emitter.commit(&mut state);
        assert_eq!(state.active_contacts, 1);
    }
}
