// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! C2 — open a candidate device, inspect its capability bits, score it.

use std::ffi::CString;
use std::mem::MaybeUninit;
use std::path::{Path, PathBuf};

use evdev::{AbsoluteAxisType, Device, Key, PropType};
use log::{debug, info};

/// A device that passed every rejection rule in §4.2, with its capability
/// snapshot and score already computed.
pub struct ProbedDevice {
    pub path: PathBuf,
    pub score: i64,
    pub device: Device,
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
    pub max_slot: i32,
    pub max_tracking_id: i32,
}

fn is_character_device(path: &Path) -> bool {
    let cpath = match CString::new(path.as_os_str().to_string_lossy().as_bytes()) {
        Ok(c) => c,
        Err(_) => return false,
    };

    let mut statbuf = MaybeUninit::<libc::stat>::uninit();
    let rc = unsafe { libc::stat(cpath.as_ptr(), statbuf.as_mut_ptr()) };
    if rc != 0 {
        return false;
    }

    let statbuf = unsafe { statbuf.assume_init() };
    (statbuf.st_mode & libc::S_IFMT) == libc::S_IFCHR
}

fn abs_minmax(device: &Device, axis: AbsoluteAxisType) -> Option<(i32, i32)> {
    let supported = device.supported_absolute_axis()?;
    if !supported.contains(axis) {
        return None;
    }
    let info = device.get_abs_state().ok()?;
    let entry = info[axis.0 as usize];
    Some((entry.minimum, entry.maximum))
}

/// The capability bits §4.2's scoring formula depends on, pulled out of the
/// open `Device` handle so the formula itself is a pure function a unit
/// test can drive directly, without an evdev-capable node.
#[derive(Debug, Clone, Copy)]
pub struct ScoreInputs {
    pub tool_type_range: Option<(i32, i32)>,
    pub has_mtslot: bool,
    pub max_slot: i32,
    pub name_has_key_or_side: bool,
    pub has_direct: bool,
    pub max_x: i32,
    pub max_y: i32,
}

/// §4.2's scoring formula, starting from `10000`. Returns `None` when the
/// device's `ABS_MT_TOOL_TYPE` range excludes `MT_TOOL_FINGER` — that case
/// is an outright rejection, not merely a penalty.
pub fn score(inputs: &ScoreInputs) -> Option<i64> {
    const MT_TOOL_FINGER: i32 = uinput_sys::MT_TOOL_FINGER as i32;

    let mut score: i64 = 10000;

    if let Some((tool_min, tool_max)) = inputs.tool_type_range {
        if tool_min > MT_TOOL_FINGER || tool_max < MT_TOOL_FINGER {
            return None;
        }
        score -= (tool_max - MT_TOOL_FINGER) as i64;
    }

    if inputs.has_mtslot {
        score += 1000 + inputs.max_slot as i64;
    }

    if inputs.name_has_key_or_side {
        score -= 1;
    }

    if inputs.has_direct {
        score += 10000;
    }

    score += ((inputs.max_x as f64) * (inputs.max_y as f64)).sqrt().floor() as i64;

    Some(score)
}

/// §4.2's final comparison: a candidate replaces the incumbent only on a
/// strict improvement; ties reject the candidate. Kept as a standalone
/// function so `select_device`'s fold and this module's own tests agree on
/// exactly one tie-break rule.
pub fn outscores(candidate_score: i64, incumbent_score: i64) -> bool {
    candidate_score > incumbent_score
}

/// Probes a single path against §4.2's rejection rules and scoring formula.
/// Returns `None` on any mismatch (the reasons are logged, not returned —
/// per-entry probe failures are not fatal to the walk).
pub fn probe_device(path: &Path) -> Option<ProbedDevice> {
    if !is_character_device(path) {
        return None;
    }

    let device = match Device::open(path) {
        Ok(d) => d,
        Err(e) => {
            debug!("{}: unable to open for inspection: {e}", path.display());
            return None;
        }
    };

    let has_abs_position_x = device
        .supported_absolute_axis()
        .is_some_and(|s| s.contains(AbsoluteAxisType::ABS_MT_POSITION_X));
    if !has_abs_position_x {
        return None;
    }

    let tool_type_range = abs_minmax(&device, AbsoluteAxisType::ABS_MT_TOOL_TYPE);

    let has_mtslot = device
        .supported_absolute_axis()
        .is_some_and(|s| s.contains(AbsoluteAxisType::ABS_MT_SLOT));
    let max_slot = if has_mtslot {
        abs_minmax(&device, AbsoluteAxisType::ABS_MT_SLOT)
            .map(|(_, max)| max)
            .unwrap_or(0)
    } else {
        0
    };

    let name_lower = device.name().unwrap_or_default().to_lowercase();
    let name_has_key_or_side = name_lower.contains("key") || name_lower.contains("_side");

    let has_direct = device.properties().contains(PropType::DIRECT);

    let (max_x, max_y) = abs_minmax(&device, AbsoluteAxisType::ABS_MT_POSITION_X)
        .map(|(_, max_x)| {
            let max_y = abs_minmax(&device, AbsoluteAxisType::ABS_MT_POSITION_Y)
                .map(|(_, max_y)| max_y)
                .unwrap_or(0);
            (max_x, max_y)
        })
        .unwrap_or((0, 0));

    let score = match score(&ScoreInputs {
        tool_type_range,
        has_mtslot,
        max_slot,
        name_has_key_or_side,
        has_direct,
        max_x,
        max_y,
    }) {
        Some(score) => score,
        None => {
            debug!(
                "{}: touch device but doesn't support fingers",
                path.display()
            );
            return None;
        }
    };

    let has_tracking_id = device
        .supported_absolute_axis()
        .is_some_and(|s| s.contains(AbsoluteAxisType::ABS_MT_TRACKING_ID));
    let max_tracking_id = if has_tracking_id {
        abs_minmax(&device, AbsoluteAxisType::ABS_MT_TRACKING_ID)
            .map(|(_, max)| max)
            .unwrap_or(0)
    } else {
        0
    };

    let has_key_btn_touch = device
        .supported_keys()
        .is_some_and(|s| s.contains(Key::BTN_TOUCH));
    let has_touch_major = device
        .supported_absolute_axis()
        .is_some_and(|s| s.contains(AbsoluteAxisType::ABS_MT_TOUCH_MAJOR));
    let has_width_major = device
        .supported_absolute_axis()
        .is_some_and(|s| s.contains(AbsoluteAxisType::ABS_MT_WIDTH_MAJOR));
    let has_pressure = device
        .supported_absolute_axis()
        .is_some_and(|s| s.contains(AbsoluteAxisType::ABS_MT_PRESSURE));
    let (min_pressure, max_pressure) = if has_pressure {
        abs_minmax(&device, AbsoluteAxisType::ABS_MT_PRESSURE).unwrap_or((0, 0))
    } else {
        (0, 0)
    };

    info!(
        "{}: candidate ({} touch), score {score}",
        path.display(),
        if has_mtslot { "Type B" } else { "Type A" }
    );

    Some(ProbedDevice {
        path: path.to_path_buf(),
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
        max_tracking_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_character_device_is_rejected() {
        // A regular file is never a character device.
        let tmp = std::env::temp_dir().join("minitouchd-probe-test-regular-file");
        std::fs::write(&tmp, b"not a device").unwrap();
        assert!(!is_character_device(&tmp));
        std::fs::remove_file(&tmp).ok();
    }

    #[test]
    fn missing_path_is_rejected() {
        assert!(!is_character_device(Path::new(
            "/nonexistent/minitouchd-probe-test"
        )));
    }

    fn baseline_inputs() -> ScoreInputs {
        ScoreInputs {
            tool_type_range: None,
            has_mtslot: false,
            max_slot: 0,
            name_has_key_or_side: false,
            has_direct: false,
            max_x: 0,
            max_y: 0,
        }
    }

    #[test]
    fn tool_type_range_excluding_finger_is_rejected() {
        // MT_TOOL_FINGER is 0; a range of 1..=2 can't represent a finger.
        let inputs = ScoreInputs {
            tool_type_range: Some((1, 2)),
            ..baseline_inputs()
        };
        assert_eq!(score(&inputs), None);
    }

    #[test]
    fn tool_type_range_including_finger_is_accepted_and_penalized() {
        // MT_TOOL_FINGER is 0; tool_max above it costs (tool_max - 0) points.
        let inputs = ScoreInputs {
            tool_type_range: Some((0, 3)),
            ..baseline_inputs()
        };
        assert_eq!(score(&inputs), Some(10000 - 3));
    }

    #[test]
    fn mtslot_and_surface_area_add_to_the_base_score() {
        let inputs = ScoreInputs {
            has_mtslot: true,
            max_slot: 4,
            max_x: 1079,
            max_y: 1919,
            ..baseline_inputs()
        };
        let expected = 10000 + 1000 + 4 + ((1079.0_f64 * 1919.0).sqrt().floor() as i64);
        assert_eq!(score(&inputs), Some(expected));
    }

    #[test]
    fn key_or_side_name_applies_a_small_penalty() {
        let inputs = ScoreInputs { name_has_key_or_side: true, ..baseline_inputs() };
        assert_eq!(score(&inputs), Some(10000 - 1));
    }

    /// spec.md §8 scenario 6: two otherwise-identical devices, one with
    /// `INPUT_PROP_DIRECT` and one without — the direct one must win
    /// regardless of which order they're probed in.
    #[test]
    fn input_prop_direct_wins_the_tiebreak_regardless_of_probe_order() {
        let direct = ScoreInputs {
            has_direct: true,
            max_x: 1079,
            max_y: 1919,
            ..baseline_inputs()
        };
        let indirect = ScoreInputs { max_x: 1079, max_y: 1919, ..baseline_inputs() };

        let direct_score = score(&direct).unwrap();
        let indirect_score = score(&indirect).unwrap();
        assert!(direct_score > indirect_score);

        // direct probed first, then indirect: indirect must not replace it.
        let mut best = direct_score;
        if outscores(indirect_score, best) {
            best = indirect_score;
        }
        assert_eq!(best, direct_score);

        // indirect probed first, then direct: direct must replace it.
        let mut best = indirect_score;
        if outscores(direct_score, best) {
            best = direct_score;
        }
        assert_eq!(best, direct_score);
    }

    #[test]
    fn outscores_rejects_ties() {
        assert!(!outscores(100, 100));
        assert!(outscores(101, 100));
        assert!(!outscores(99, 100));
    }
}
