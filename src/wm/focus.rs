//! Focus Module
//!
//! Pointer-driven focus: input focus, colormap installation and the
//! published active-window property.

use anyhow::Result;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::wrapper::ConnectionExt as _;

use crate::wm::client::Client;
use crate::wm::ewmh::Atoms;

/// Give a client the input focus, install its colormap and publish it as
/// the active window.
pub fn select_client<C: Connection>(
    conn: &C,
    atoms: &Atoms,
    root: Window,
    client: &Client,
) -> Result<()> {
    conn.set_input_focus(InputFocus::POINTER_ROOT, client.window, x11rb::CURRENT_TIME)?;
    if client.colormap != 0 {
        conn.install_colormap(client.colormap)?;
    }
    conn.change_property32(
        PropMode::REPLACE,
        root,
        atoms.net_active_window,
        AtomEnum::WINDOW,
        &[client.window],
    )?;
    conn.flush()?;
    Ok(())
}
