//! Workspace Module
//!
//! Virtual-desktop switching, per-client desktop membership and the
//! transient desktop-number indicator.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, warn};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use crate::wm::client_flags::ClientOptions;
use crate::wm::ewmh::{self};
use crate::wm::manage;
use crate::wm::WindowManager;

/// Hard upper bound on the desktop count; config may pick fewer.
pub const MAX_DESKTOPS: u32 = 10;

/// Switch one screen to another virtual desktop. Out-of-range targets and
/// switches to the current desktop are no-ops. Returns the desktop the
/// screen displays afterwards.
pub fn switch_desktop(wm: &mut WindowManager, screen_idx: usize, target: u32) -> Result<u32> {
    let conn = wm.conn.clone();
    let atoms = wm.atoms;
    let WindowManager {
        clients,
        screens,
        config,
        ..
    } = wm;
    let screen = &mut screens[screen_idx];

    if target >= config.desktops {
        warn!(
            "invalid desktop {} (screen has {})",
            target, config.desktops
        );
        return Ok(screen.vdesk);
    }
    if target == screen.vdesk {
        debug!("already on desktop {}", target);
        return Ok(target);
    }

    let previous = screen.vdesk;
    screen.vdesk = target;

    for client in clients.iter_mut() {
        if client.screen != screen_idx {
            continue;
        }
        if client.options.contains(ClientOptions::STICKY) {
            manage::restore(conn.as_ref(), &atoms, client)?;
            continue;
        }
        if client.vdesk == previous {
            manage::hide(conn.as_ref(), &atoms, client)?;
        } else if client.vdesk == target {
            manage::restore(conn.as_ref(), &atoms, client)?;
        }
    }

    conn.change_property32(
        PropMode::REPLACE,
        screen.root,
        atoms.net_current_desktop,
        AtomEnum::CARDINAL,
        &[target],
    )?;
    conn.flush()?;

    flash_desktop_number(conn, screen.root, screen.gc, target);
    Ok(target)
}

/// Move a client to another desktop and reconcile its visibility with the
/// screen's current desktop.
pub fn client_to_desktop(wm: &mut WindowManager, window: Window, desktop: u32) -> Result<()> {
    let conn = wm.conn.clone();
    let atoms = wm.atoms;
    let WindowManager {
        clients,
        screens,
        config,
        ..
    } = wm;
    if desktop >= config.desktops {
        return Ok(());
    }
    let Some(client) = clients.find_mut(window) else {
        return Ok(());
    };
    client.vdesk = desktop;
    ewmh::set_wm_desktop(conn.as_ref(), &atoms, window, desktop)?;
    let current = screens[client.screen].vdesk;
    if client.options.contains(ClientOptions::STICKY) || desktop == current {
        manage::restore(conn.as_ref(), &atoms, client)?;
    } else {
        manage::hide(conn.as_ref(), &atoms, client)?;
    }
    conn.flush()?;
    Ok(())
}

/// Encode one PolyText8 text element: length, zero delta, then the bytes.
fn text_element(text: &[u8]) -> Vec<u8> {
    let text = &text[..text.len().min(254)];
    let mut items = Vec::with_capacity(text.len() + 2);
    items.push(text.len() as u8);
    items.push(0);
    items.extend_from_slice(text);
    items
}

/// Draw the new desktop number at the root origin and erase it after a
/// short delay from a fire-and-forget thread. PolyText8 honors the XOR GC
/// function (ImageText8 would not), so the second identical draw erases the
/// first. The thread only issues its own draw requests through the shared
/// connection; it never touches manager state.
fn flash_desktop_number(conn: Arc<RustConnection>, root: Window, gc: Gcontext, desktop: u32) {
    let items = text_element(format!("{}", desktop + 1).as_bytes());
    if conn.poly_text8(root, gc, 4, 16, &items).is_err() {
        return;
    }
    let _ = conn.flush();
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(750));
        let _ = conn.poly_text8(root, gc, 4, 16, &items);
        let _ = conn.flush();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_element_encodes_length_delta_and_bytes() {
        assert_eq!(text_element(b"3"), vec![1, 0, b'3']);
        assert_eq!(text_element(b"10"), vec![2, 0, b'1', b'0']);
    }

    #[test]
    fn text_element_caps_at_protocol_limit() {
        let long = [b'x'; 300];
        let items = text_element(&long);
        assert_eq!(items[0], 254);
        assert_eq!(items.len(), 256);
    }
}
