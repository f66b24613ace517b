//! Client Flags
//!
//! Bitfield flags for per-client capabilities and window state.

use bitflags::bitflags;

bitflags! {
    /// Per-client option and state bits.
    ///
    /// The NO_* capability bits come from decoration hints; the state bits
    /// mirror the published window state. REMOVE marks a client for the
    /// deferred cleanup pass.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ClientOptions: u32 {
        const NO_MOVE      = 1 << 0;
        const NO_RESIZE    = 1 << 1;
        const NO_CLOSE     = 1 << 2;
        const NO_MIN       = 1 << 3;
        const NO_MAX       = 1 << 4;
        const NO_TITLE_BAR = 1 << 5;
        const NO_BORDER    = 1 << 6;
        const SHADED       = 1 << 7;
        const FULLSCREEN   = 1 << 8;
        const MAX_HORZ     = 1 << 9;
        const MAX_VERT     = 1 << 10;
        const SHAPED       = 1 << 11;
        const TEAROFF      = 1 << 12;
        const STICKY       = 1 << 13;
        const REMOVE       = 1 << 14;
    }
}

impl ClientOptions {
    /// Bits set on a tear-off (menu-like) window: no decorations, no
    /// resizing. Tear-offs stay movable but skip the synthetic configure
    /// after a drag.
    pub fn tearoff() -> Self {
        Self::TEAROFF
            | Self::NO_BORDER
            | Self::NO_TITLE_BAR
            | Self::NO_RESIZE
            | Self::NO_MIN
            | Self::NO_MAX
    }

    pub fn maximized() -> Self {
        Self::FULLSCREEN | Self::MAX_HORZ | Self::MAX_VERT
    }

    pub fn is_maximized(&self) -> bool {
        self.contains(Self::FULLSCREEN)
    }
}
