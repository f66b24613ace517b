//! Client Module
//!
//! Per-window client state: geometry, frame handles, virtual desktop
//! membership and the unmap bookkeeping that drives removal.

use x11rb::protocol::xproto::{Colormap, Window};

use crate::wm::client_flags::ClientOptions;
use crate::wm::geometry::{Geometry, SizeHints};

/// A managed top-level window.
pub struct Client {
    /// The application window.
    pub window: Window,
    /// The decoration frame; `None` only between allocation and reparenting.
    pub frame: Option<Window>,
    /// Title strip child of the frame, created lazily.
    pub titlebar: Option<Window>,
    /// Index into the screen table.
    pub screen: usize,
    /// Client geometry in root coordinates (frame placement derives from it).
    pub geometry: Geometry,
    /// Saved geometry for maximize restore.
    pub old_geometry: Option<Geometry>,
    /// Saved height while shaded.
    pub shade_height: u32,
    /// Size constraints from WM_NORMAL_HINTS.
    pub hints: SizeHints,
    /// Frame border width in pixels (0 for borderless/shaped windows).
    pub border: u16,
    /// Virtual desktop this client lives on.
    pub vdesk: u32,
    /// Count of pending self-caused UnmapNotify events to swallow.
    pub ignore_unmaps: u8,
    /// Whether the frame is currently unmapped.
    pub hidden: bool,
    /// Colormap to install on focus, 0 if none.
    pub colormap: Colormap,
    pub options: ClientOptions,
}

impl Client {
    pub fn new(window: Window, screen: usize, border: u16) -> Self {
        Self {
            window,
            frame: None,
            titlebar: None,
            screen,
            geometry: Geometry {
                x: 0,
                y: 0,
                width: 1,
                height: 1,
            },
            old_geometry: None,
            shade_height: 0,
            hints: SizeHints::default(),
            border,
            vdesk: 0,
            ignore_unmaps: 0,
            hidden: true,
            colormap: 0,
            options: ClientOptions::empty(),
        }
    }

    /// Account for one UnmapNotify. Self-caused unmaps decrement the counter;
    /// a genuine withdrawal marks the client for the cleanup pass. Returns
    /// true when the client is now pending removal.
    pub fn on_unmap(&mut self) -> bool {
        if self.ignore_unmaps > 0 {
            self.ignore_unmaps -= 1;
            false
        } else {
            self.options.insert(ClientOptions::REMOVE);
            true
        }
    }

    pub fn pending_removal(&self) -> bool {
        self.options.contains(ClientOptions::REMOVE)
    }

    /// Vertical space reserved for the title strip above the client, in
    /// pixels. Zero for borderless, fullscreen and no-title-bar clients.
    pub fn title_offset(&self, title_height: u16) -> i32 {
        if self.border == 0
            || self
                .options
                .intersects(ClientOptions::NO_TITLE_BAR | ClientOptions::FULLSCREEN)
        {
            0
        } else {
            title_height as i32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmap_counter_swallows_self_caused_unmaps() {
        let mut c = Client::new(42, 0, 1);
        c.ignore_unmaps = 2;
        assert!(!c.on_unmap());
        assert_eq!(c.ignore_unmaps, 1);
        assert!(!c.on_unmap());
        assert!(!c.pending_removal());
    }

    #[test]
    fn unmap_at_zero_marks_pending_removal() {
        let mut c = Client::new(42, 0, 1);
        assert!(c.on_unmap());
        assert!(c.pending_removal());
    }

    #[test]
    fn title_offset_is_zero_for_borderless_and_fullscreen() {
        let mut c = Client::new(42, 0, 1);
        assert_eq!(c.title_offset(18), 18);
        c.options.insert(ClientOptions::FULLSCREEN);
        assert_eq!(c.title_offset(18), 0);
        c.options.remove(ClientOptions::FULLSCREEN);
        c.border = 0;
        assert_eq!(c.title_offset(18), 0);
    }
}
