//! Screen Module
//!
//! Per-screen state: root window, dimensions, current virtual desktop and
//! the graphics contexts used for outlines and title rendering.

use anyhow::Result;
use tracing::debug;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;

use crate::config::Config;

/// Per-screen window manager state.
pub struct ScreenInfo {
    pub screen_num: usize,
    pub root: Window,
    pub width: u16,
    pub height: u16,
    /// Currently displayed virtual desktop.
    pub vdesk: u32,
    /// XOR GC for drag outlines and the desktop indicator.
    pub gc: Gcontext,
    /// Plain GC for title strip rendering.
    pub title_gc: Gcontext,
    pub fg: u32,
    pub bg: u32,
    /// Supporting-WM-check window, set during EWMH setup.
    pub check_win: Window,
}

impl ScreenInfo {
    pub fn new<C: Connection>(
        conn: &C,
        screen_num: usize,
        xscreen: &Screen,
        config: &Config,
    ) -> Result<Self> {
        let fg = alloc_named_pixel(conn, xscreen.default_colormap, &config.foreground)
            .unwrap_or(xscreen.white_pixel);
        let bg = alloc_named_pixel(conn, xscreen.default_colormap, &config.background)
            .unwrap_or(xscreen.black_pixel);

        let gc = conn.generate_id()?;
        conn.create_gc(
            gc,
            xscreen.root,
            &CreateGCAux::new()
                .function(GX::XOR)
                .foreground(fg ^ bg)
                .line_width(1)
                .subwindow_mode(SubwindowMode::INCLUDE_INFERIORS)
                .graphics_exposures(0),
        )?;

        let title_gc = conn.generate_id()?;
        conn.create_gc(
            title_gc,
            xscreen.root,
            &CreateGCAux::new()
                .foreground(fg)
                .background(bg)
                .graphics_exposures(0),
        )?;

        debug!(
            "screen {}: {}x{}, root 0x{:x}",
            screen_num, xscreen.width_in_pixels, xscreen.height_in_pixels, xscreen.root
        );

        Ok(Self {
            screen_num,
            root: xscreen.root,
            width: xscreen.width_in_pixels,
            height: xscreen.height_in_pixels,
            vdesk: 0,
            gc,
            title_gc,
            fg,
            bg,
            check_win: 0,
        })
    }
}

/// Resolve a color name through the default colormap. Unknown names fall
/// back to the caller's default pixel.
fn alloc_named_pixel<C: Connection>(conn: &C, colormap: Colormap, name: &str) -> Option<u32> {
    conn.alloc_named_color(colormap, name.as_bytes())
        .ok()?
        .reply()
        .ok()
        .map(|r| r.pixel)
}
