//! Hints Module
//!
//! Reading of WM_NORMAL_HINTS size constraints and _MOTIF_WM_HINTS
//! decoration/function hints, decoded into client options.

use anyhow::Result;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;

use crate::wm::client_flags::ClientOptions;
use crate::wm::ewmh::Atoms;
use crate::wm::geometry::{Gravity, SizeHints};

// WM_NORMAL_HINTS flag bits.
const P_MIN_SIZE: u32 = 1 << 4;
const P_MAX_SIZE: u32 = 1 << 5;
const P_WIN_GRAVITY: u32 = 1 << 9;

// _MOTIF_WM_HINTS flag bits.
const MWM_HINTS_FUNCTIONS: u32 = 1 << 0;
const MWM_HINTS_DECORATIONS: u32 = 1 << 1;
const MWM_HINTS_STATUS: u32 = 1 << 3;

const MWM_FUNC_ALL: u32 = 1 << 0;
const MWM_FUNC_RESIZE: u32 = 1 << 1;
const MWM_FUNC_MOVE: u32 = 1 << 2;
const MWM_FUNC_MINIMIZE: u32 = 1 << 3;
const MWM_FUNC_MAXIMIZE: u32 = 1 << 4;
const MWM_FUNC_CLOSE: u32 = 1 << 5;

const MWM_DECOR_ALL: u32 = 1 << 0;
const MWM_DECOR_BORDER: u32 = 1 << 1;
const MWM_DECOR_TITLE: u32 = 1 << 3;

const MWM_TEAROFF_WINDOW: u32 = 1 << 0;

/// Raw _MOTIF_WM_HINTS property (5 CARD32s).
#[derive(Debug, Clone, Copy, Default)]
pub struct MotifHints {
    pub flags: u32,
    pub functions: u32,
    pub decorations: u32,
    pub status: u32,
}

/// Read WM_NORMAL_HINTS into size constraints. An absent or short property
/// yields the defaults (no constraints, north-west gravity).
pub fn read_size_hints<C: Connection>(conn: &C, window: Window) -> Result<SizeHints> {
    let mut out = SizeHints::default();
    let reply = conn
        .get_property(
            false,
            window,
            AtomEnum::WM_NORMAL_HINTS,
            AtomEnum::WM_SIZE_HINTS,
            0,
            18,
        )?
        .reply()?;
    if let Some(value32) = reply.value32() {
        let values: Vec<u32> = value32.take(18).collect();
        if values.len() >= 18 {
            let flags = values[0];
            if flags & P_MIN_SIZE != 0 {
                out.min_width = values[5].max(1);
                out.min_height = values[6].max(1);
            }
            if flags & P_MAX_SIZE != 0 {
                out.max_width = values[7];
                out.max_height = values[8];
            }
            if flags & P_WIN_GRAVITY != 0 {
                out.gravity = Gravity::from_hint(values[17]);
            }
        }
    }
    Ok(out)
}

/// Read _MOTIF_WM_HINTS, if present.
pub fn read_motif_hints<C: Connection>(
    conn: &C,
    atoms: &Atoms,
    window: Window,
) -> Result<Option<MotifHints>> {
    let reply = conn
        .get_property(
            false,
            window,
            atoms.motif_wm_hints,
            atoms.motif_wm_hints,
            0,
            5,
        )?
        .reply()?;
    if let Some(value32) = reply.value32() {
        let values: Vec<u32> = value32.take(5).collect();
        if values.len() >= 4 {
            return Ok(Some(MotifHints {
                flags: values[0],
                functions: values[1],
                decorations: values[2],
                status: values[3],
            }));
        }
    }
    Ok(None)
}

/// Decode decoration/function hints into client option bits.
///
/// Tear-off status strips every decoration and movement capability. The
/// function and decoration words otherwise toggle the matching NO_* bits,
/// with the ALL bit inverting the sense of the word.
pub fn decode_motif_hints(hints: &MotifHints) -> ClientOptions {
    let mut options = ClientOptions::empty();

    if hints.flags & MWM_HINTS_STATUS != 0 && hints.status & MWM_TEAROFF_WINDOW != 0 {
        return ClientOptions::tearoff();
    }

    if hints.flags & MWM_HINTS_FUNCTIONS != 0 {
        let invert = hints.functions & MWM_FUNC_ALL != 0;
        let enabled = |bit: u32| (hints.functions & bit != 0) != invert;
        if !enabled(MWM_FUNC_RESIZE) {
            options.insert(ClientOptions::NO_RESIZE);
        }
        if !enabled(MWM_FUNC_MOVE) {
            options.insert(ClientOptions::NO_MOVE);
        }
        if !enabled(MWM_FUNC_MINIMIZE) {
            options.insert(ClientOptions::NO_MIN);
        }
        if !enabled(MWM_FUNC_MAXIMIZE) {
            options.insert(ClientOptions::NO_MAX);
        }
        if !enabled(MWM_FUNC_CLOSE) {
            options.insert(ClientOptions::NO_CLOSE);
        }
    }

    if hints.flags & MWM_HINTS_DECORATIONS != 0 {
        let invert = hints.decorations & MWM_DECOR_ALL != 0;
        let enabled = |bit: u32| (hints.decorations & bit != 0) != invert;
        if !enabled(MWM_DECOR_BORDER) {
            options.insert(ClientOptions::NO_BORDER);
        }
        if !enabled(MWM_DECOR_TITLE) {
            options.insert(ClientOptions::NO_TITLE_BAR);
        }
    }

    options
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tearoff_status_strips_everything() {
        let hints = MotifHints {
            flags: MWM_HINTS_STATUS,
            status: MWM_TEAROFF_WINDOW,
            ..Default::default()
        };
        let options = decode_motif_hints(&hints);
        assert!(options.contains(ClientOptions::tearoff()));
    }

    #[test]
    fn zero_decorations_disable_border_and_title() {
        let hints = MotifHints {
            flags: MWM_HINTS_DECORATIONS,
            decorations: 0,
            ..Default::default()
        };
        let options = decode_motif_hints(&hints);
        assert!(options.contains(ClientOptions::NO_BORDER | ClientOptions::NO_TITLE_BAR));
    }

    #[test]
    fn decor_all_enables_everything() {
        let hints = MotifHints {
            flags: MWM_HINTS_DECORATIONS,
            decorations: MWM_DECOR_ALL,
            ..Default::default()
        };
        assert!(decode_motif_hints(&hints).is_empty());
    }

    #[test]
    fn function_bits_map_to_no_flags() {
        let hints = MotifHints {
            flags: MWM_HINTS_FUNCTIONS,
            functions: MWM_FUNC_MOVE | MWM_FUNC_CLOSE,
            ..Default::default()
        };
        let options = decode_motif_hints(&hints);
        assert!(!options.contains(ClientOptions::NO_MOVE));
        assert!(!options.contains(ClientOptions::NO_CLOSE));
        assert!(options.contains(ClientOptions::NO_RESIZE));
        assert!(options.contains(ClientOptions::NO_MAX));
    }

    #[test]
    fn absent_hint_words_leave_defaults() {
        assert!(decode_motif_hints(&MotifHints::default()).is_empty());
    }
}
