//! NetWM Module
//!
//! Client-message dispatch: desktop switches, activation, close and
//! move/resize requests, and the three-way window-state changes.

use anyhow::Result;
use tracing::debug;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;

use crate::wm::client_flags::ClientOptions;
use crate::wm::ewmh::{self};
use crate::wm::focus;
use crate::wm::geometry::{self, Gravity, ResizeRequest};
use crate::wm::manage;
use crate::wm::moveresize;
use crate::wm::workspace;
use crate::wm::WindowManager;

// _NET_WM_STATE action codes.
const STATE_REMOVE: u32 = 0;
const STATE_ADD: u32 = 1;
// _NET_WM_MOVERESIZE directions.
const MOVERESIZE_MOVE: u32 = 8;
const MOVERESIZE_CANCEL: u32 = 11;
// Source indication: 1 = application, 2 = pager/user action.
const SOURCE_PAGER: u32 = 2;

/// Resolve a three-way state action against the current value: 0 removes,
/// 1 adds, anything else toggles.
fn state_action_enables(action: u32, currently: bool) -> bool {
    match action {
        STATE_REMOVE => false,
        STATE_ADD => true,
        _ => !currently,
    }
}

/// Dispatch one ClientMessage.
pub fn handle_client_message(wm: &mut WindowManager, event: &ClientMessageEvent) -> Result<()> {
    let atoms = wm.atoms;
    let data = event.data.as_data32();
    let t = event.type_;

    if t == atoms.net_current_desktop {
        if let Some(screen_idx) = wm.screen_by_root(event.window) {
            workspace::switch_desktop(wm, screen_idx, data[0])?;
        }
    } else if t == atoms.net_wm_desktop {
        workspace::client_to_desktop(wm, event.window, data[0])?;
    } else if t == atoms.net_active_window {
        // Only honored for direct user actions.
        if data[0] == 2 {
            activate(wm, event.window)?;
        }
    } else if t == atoms.net_close_window {
        if data[1] == 2 {
            let conn = wm.conn.clone();
            if let Some(client) = wm.clients.find(event.window) {
                manage::close_client(conn.as_ref(), &atoms, client)?;
            }
        }
    } else if t == atoms.net_moveresize_window {
        handle_moveresize_window(wm, event.window, &data)?;
    } else if t == atoms.net_wm_moveresize {
        match data[2] {
            MOVERESIZE_CANCEL => {}
            MOVERESIZE_MOVE => moveresize::drag(wm, event.window, false)?,
            _ => moveresize::drag(wm, event.window, true)?,
        }
    } else if t == atoms.net_wm_state {
        handle_state_message(wm, event.window, &data)?;
    } else if t == atoms.wm_change_state {
        if data[0] == ewmh::ICCCM_ICONIC {
            let conn = wm.conn.clone();
            if let Some(client) = wm.clients.find_mut(event.window) {
                manage::hide(conn.as_ref(), &atoms, client)?;
                conn.flush()?;
            }
        }
    } else {
        debug!("unhandled client message type {}", t);
    }
    Ok(())
}

fn activate(wm: &mut WindowManager, window: Window) -> Result<()> {
    let conn = wm.conn.clone();
    let atoms = wm.atoms;
    let Some(client) = wm.clients.find(window) else {
        return Ok(());
    };
    let root = wm.screens[client.screen].root;
    manage::raise(conn.as_ref(), client)?;
    focus::select_client(conn.as_ref(), &atoms, root, client)?;
    wm.current = Some(window);
    Ok(())
}

/// Packed first word of _NET_MOVERESIZE_WINDOW: gravity in the low byte,
/// configure flags at bits 8..11, source indication at bits 12..13. Only
/// pager/user-sourced requests are honored.
fn moveresize_allowed(value: u32) -> bool {
    (value >> 12) & 0x3 == SOURCE_PAGER
}

fn handle_moveresize_window(wm: &mut WindowManager, window: Window, data: &[u32; 5]) -> Result<()> {
    let value = data[0];
    if !moveresize_allowed(value) {
        return Ok(());
    }
    let flags = (value >> 8) & 0xf;
    let conn = wm.conn.clone();
    let atoms = wm.atoms;
    let WindowManager {
        clients,
        screens,
        config,
        ..
    } = wm;
    let Some(client) = clients.find_mut(window) else {
        return Ok(());
    };
    if client.options.contains(ClientOptions::FULLSCREEN) {
        return Ok(());
    }
    let req = ResizeRequest {
        x: (flags & 0x1 != 0).then_some(data[1] as i32),
        y: (flags & 0x2 != 0).then_some(data[2] as i32),
        width: (flags & 0x4 != 0).then_some(data[3]),
        height: (flags & 0x8 != 0).then_some(data[4]),
    };
    let gravity = match value & 0xff {
        0 => client.hints.gravity,
        g => Gravity::from_hint(g),
    };
    client.geometry = geometry::resolve_resize(
        &client.geometry,
        &client.hints,
        &req,
        gravity,
        client.border as i32,
    );
    let screen = &screens[client.screen];
    manage::apply_geometry(conn.as_ref(), &atoms, config, screen, client)?;
    conn.flush()?;
    Ok(())
}

/// _NET_WM_STATE carries an action code plus up to two state atoms, each
/// applied independently.
fn handle_state_message(wm: &mut WindowManager, window: Window, data: &[u32; 5]) -> Result<()> {
    let action = data[0];
    for state in [data[1], data[2]] {
        if state != 0 {
            apply_state_change(wm, window, state, action)?;
        }
    }
    Ok(())
}

fn apply_state_change(
    wm: &mut WindowManager,
    window: Window,
    state: Atom,
    action: u32,
) -> Result<()> {
    let conn = wm.conn.clone();
    let atoms = wm.atoms;
    let WindowManager {
        clients,
        screens,
        config,
        ..
    } = wm;
    let Some(client) = clients.find_mut(window) else {
        return Ok(());
    };
    let screen = &screens[client.screen];
    let currently = ewmh::has_state(conn.as_ref(), &atoms, window, state)?;
    let enable = state_action_enables(action, currently);

    if state == atoms.net_wm_state_fullscreen
        || state == atoms.net_wm_state_maximized_horz
        || state == atoms.net_wm_state_maximized_vert
    {
        // All three drive the same full-screen toggle.
        if enable != client.options.is_maximized() {
            manage::toggle_maximize(conn.as_ref(), &atoms, config, screen, client)?;
        }
    } else if state == atoms.net_wm_state_shaded {
        if enable != client.options.contains(ClientOptions::SHADED) {
            manage::toggle_shade(conn.as_ref(), &atoms, config, screen, client)?;
        }
    } else if state == atoms.net_wm_state_sticky || state == atoms.net_wm_state_skip_pager {
        client.options.set(ClientOptions::STICKY, enable);
        if enable {
            ewmh::add_state(conn.as_ref(), &atoms, window, atoms.net_wm_state_sticky)?;
        } else {
            ewmh::remove_state(conn.as_ref(), &atoms, window, atoms.net_wm_state_sticky)?;
        }
    } else if state == atoms.net_wm_state_above {
        if enable {
            manage::raise(conn.as_ref(), client)?;
        }
        sync_state(conn.as_ref(), &atoms, window, state, enable)?;
    } else if state == atoms.net_wm_state_below {
        if enable {
            manage::lower(conn.as_ref(), client)?;
        }
        sync_state(conn.as_ref(), &atoms, window, state, enable)?;
    } else {
        debug!("ignoring state change for atom {}", state);
    }
    conn.flush()?;
    Ok(())
}

fn sync_state<C: Connection>(
    conn: &C,
    atoms: &ewmh::Atoms,
    window: Window,
    state: Atom,
    enable: bool,
) -> Result<()> {
    if enable {
        ewmh::add_state(conn, atoms, window, state)
    } else {
        ewmh::remove_state(conn, atoms, window, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_action_always_disables() {
        assert!(!state_action_enables(STATE_REMOVE, true));
        assert!(!state_action_enables(STATE_REMOVE, false));
    }

    #[test]
    fn add_action_always_enables() {
        assert!(state_action_enables(STATE_ADD, true));
        assert!(state_action_enables(STATE_ADD, false));
    }

    #[test]
    fn toggle_inverts_current_state() {
        assert!(!state_action_enables(2, true));
        assert!(state_action_enables(2, false));
    }

    #[test]
    fn double_toggle_restores_original() {
        let start = false;
        let once = state_action_enables(2, start);
        let twice = state_action_enables(2, once);
        assert_eq!(twice, start);
    }

    #[test]
    fn moveresize_honors_only_pager_source() {
        let gravity_and_flags = 0x1 | (0xf << 8);
        assert!(moveresize_allowed(gravity_and_flags | (SOURCE_PAGER << 12)));
        assert!(!moveresize_allowed(gravity_and_flags));
        assert!(!moveresize_allowed(gravity_and_flags | (1 << 12)));
        assert!(!moveresize_allowed(gravity_and_flags | (3 << 12)));
    }
}
