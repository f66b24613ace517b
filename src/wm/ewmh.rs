//! EWMH (Extended Window Manager Hints) implementation
//!
//! Atom table, root-window setup and the per-window state property
//! read/modify/write primitives that keep published protocol state in sync
//! with the registry.

use anyhow::Result;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::wrapper::ConnectionExt as _;

use crate::wm::client::Client;
use crate::wm::client_flags::ClientOptions;
use crate::wm::registry::Registry;
use crate::wm::screen::ScreenInfo;

/// Cap on the published client list; managing more windows is allowed but
/// the excess is silently truncated from the list properties.
pub const MAX_CLIENTS: usize = 1024;

/// ICCCM WM_STATE values.
pub const ICCCM_WITHDRAWN: u32 = 0;
pub const ICCCM_NORMAL: u32 = 1;
pub const ICCCM_ICONIC: u32 = 3;

/// Holds all interned atoms. Built once at startup; `Copy` so handlers can
/// take it by value without touching the connection.
#[derive(Debug, Clone, Copy)]
pub struct Atoms {
    pub net_supported: Atom,
    pub net_client_list: Atom,
    pub net_client_list_stacking: Atom,
    pub net_number_of_desktops: Atom,
    pub net_current_desktop: Atom,
    pub net_desktop_viewport: Atom,
    pub net_desktop_geometry: Atom,
    pub net_active_window: Atom,
    pub net_supporting_wm_check: Atom,
    pub net_virtual_roots: Atom,
    pub net_close_window: Atom,
    pub net_moveresize_window: Atom,
    pub net_wm_moveresize: Atom,
    pub net_frame_extents: Atom,
    pub net_wm_name: Atom,
    pub net_wm_desktop: Atom,
    pub net_wm_pid: Atom,
    pub net_wm_state: Atom,
    pub net_wm_state_sticky: Atom,
    pub net_wm_state_maximized_vert: Atom,
    pub net_wm_state_maximized_horz: Atom,
    pub net_wm_state_shaded: Atom,
    pub net_wm_state_hidden: Atom,
    pub net_wm_state_fullscreen: Atom,
    pub net_wm_state_above: Atom,
    pub net_wm_state_below: Atom,
    pub net_wm_state_skip_pager: Atom,
    pub net_wm_allowed_actions: Atom,
    pub net_wm_action_move: Atom,
    pub net_wm_action_resize: Atom,
    pub net_wm_action_shade: Atom,
    pub net_wm_action_stick: Atom,
    pub net_wm_action_maximize_horz: Atom,
    pub net_wm_action_maximize_vert: Atom,
    pub net_wm_action_fullscreen: Atom,
    pub net_wm_action_change_desktop: Atom,
    pub net_wm_action_close: Atom,
    pub net_wm_action_above: Atom,
    pub net_wm_action_below: Atom,
    pub net_wm_opaque_region: Atom,
    pub net_wm_user_time: Atom,
    pub wm_protocols: Atom,
    pub wm_delete_window: Atom,
    pub wm_state: Atom,
    pub wm_change_state: Atom,
    pub motif_wm_hints: Atom,
    pub utf8_string: Atom,
}

impl Atoms {
    /// Intern all required atoms.
    pub fn new<C: Connection>(conn: &C) -> Result<Self> {
        let intern = |name: &str| -> Result<Atom> {
            Ok(conn.intern_atom(false, name.as_bytes())?.reply()?.atom)
        };

        Ok(Self {
            net_supported: intern("_NET_SUPPORTED")?,
            net_client_list: intern("_NET_CLIENT_LIST")?,
            net_client_list_stacking: intern("_NET_CLIENT_LIST_STACKING")?,
            net_number_of_desktops: intern("_NET_NUMBER_OF_DESKTOPS")?,
            net_current_desktop: intern("_NET_CURRENT_DESKTOP")?,
            net_desktop_viewport: intern("_NET_DESKTOP_VIEWPORT")?,
            net_desktop_geometry: intern("_NET_DESKTOP_GEOMETRY")?,
            net_active_window: intern("_NET_ACTIVE_WINDOW")?,
            net_supporting_wm_check: intern("_NET_SUPPORTING_WM_CHECK")?,
            net_virtual_roots: intern("_NET_VIRTUAL_ROOTS")?,
            net_close_window: intern("_NET_CLOSE_WINDOW")?,
            net_moveresize_window: intern("_NET_MOVERESIZE_WINDOW")?,
            net_wm_moveresize: intern("_NET_WM_MOVERESIZE")?,
            net_frame_extents: intern("_NET_FRAME_EXTENTS")?,
            net_wm_name: intern("_NET_WM_NAME")?,
            net_wm_desktop: intern("_NET_WM_DESKTOP")?,
            net_wm_pid: intern("_NET_WM_PID")?,
            net_wm_state: intern("_NET_WM_STATE")?,
            net_wm_state_sticky: intern("_NET_WM_STATE_STICKY")?,
            net_wm_state_maximized_vert: intern("_NET_WM_STATE_MAXIMIZED_VERT")?,
            net_wm_state_maximized_horz: intern("_NET_WM_STATE_MAXIMIZED_HORZ")?,
            net_wm_state_shaded: intern("_NET_WM_STATE_SHADED")?,
            net_wm_state_hidden: intern("_NET_WM_STATE_HIDDEN")?,
            net_wm_state_fullscreen: intern("_NET_WM_STATE_FULLSCREEN")?,
            net_wm_state_above: intern("_NET_WM_STATE_ABOVE")?,
            net_wm_state_below: intern("_NET_WM_STATE_BELOW")?,
            net_wm_state_skip_pager: intern("_NET_WM_STATE_SKIP_PAGER")?,
            net_wm_allowed_actions: intern("_NET_WM_ALLOWED_ACTIONS")?,
            net_wm_action_move: intern("_NET_WM_ACTION_MOVE")?,
            net_wm_action_resize: intern("_NET_WM_ACTION_RESIZE")?,
            net_wm_action_shade: intern("_NET_WM_ACTION_SHADE")?,
            net_wm_action_stick: intern("_NET_WM_ACTION_STICK")?,
            net_wm_action_maximize_horz: intern("_NET_WM_ACTION_MAXIMIZE_HORZ")?,
            net_wm_action_maximize_vert: intern("_NET_WM_ACTION_MAXIMIZE_VERT")?,
            net_wm_action_fullscreen: intern("_NET_WM_ACTION_FULLSCREEN")?,
            net_wm_action_change_desktop: intern("_NET_WM_ACTION_CHANGE_DESKTOP")?,
            net_wm_action_close: intern("_NET_WM_ACTION_CLOSE")?,
            net_wm_action_above: intern("_NET_WM_ACTION_ABOVE")?,
            net_wm_action_below: intern("_NET_WM_ACTION_BELOW")?,
            net_wm_opaque_region: intern("_NET_WM_OPAQUE_REGION")?,
            net_wm_user_time: intern("_NET_WM_USER_TIME")?,
            wm_protocols: intern("WM_PROTOCOLS")?,
            wm_delete_window: intern("WM_DELETE_WINDOW")?,
            wm_state: intern("WM_STATE")?,
            wm_change_state: intern("WM_CHANGE_STATE")?,
            motif_wm_hints: intern("_MOTIF_WM_HINTS")?,
            utf8_string: intern("UTF8_STRING")?,
        })
    }

    fn supported_list(&self) -> Vec<Atom> {
        vec![
            self.net_supported,
            self.net_client_list,
            self.net_client_list_stacking,
            self.net_number_of_desktops,
            self.net_current_desktop,
            self.net_desktop_viewport,
            self.net_desktop_geometry,
            self.net_active_window,
            self.net_supporting_wm_check,
            self.net_virtual_roots,
            self.net_close_window,
            self.net_moveresize_window,
            self.net_wm_moveresize,
            self.net_frame_extents,
            self.net_wm_name,
            self.net_wm_desktop,
            self.net_wm_pid,
            self.net_wm_state,
            self.net_wm_state_sticky,
            self.net_wm_state_maximized_vert,
            self.net_wm_state_maximized_horz,
            self.net_wm_state_shaded,
            self.net_wm_state_hidden,
            self.net_wm_state_fullscreen,
            self.net_wm_state_above,
            self.net_wm_state_below,
            self.net_wm_state_skip_pager,
            self.net_wm_allowed_actions,
            self.net_wm_action_move,
            self.net_wm_action_resize,
            self.net_wm_action_shade,
            self.net_wm_action_stick,
            self.net_wm_action_maximize_horz,
            self.net_wm_action_maximize_vert,
            self.net_wm_action_fullscreen,
            self.net_wm_action_change_desktop,
            self.net_wm_action_close,
            self.net_wm_action_above,
            self.net_wm_action_below,
        ]
    }
}

/// Publish the root-window EWMH surface for one screen: supported atoms,
/// desktop layout and the supporting-WM-check window. Returns the check
/// window; it stays alive for the manager's lifetime.
pub fn init_screen<C: Connection>(
    conn: &C,
    atoms: &Atoms,
    screen: &ScreenInfo,
    desktops: u32,
) -> Result<Window> {
    conn.change_property32(
        PropMode::REPLACE,
        screen.root,
        atoms.net_supported,
        AtomEnum::ATOM,
        &atoms.supported_list(),
    )?;
    conn.change_property32(
        PropMode::REPLACE,
        screen.root,
        atoms.net_number_of_desktops,
        AtomEnum::CARDINAL,
        &[desktops],
    )?;
    conn.change_property32(
        PropMode::REPLACE,
        screen.root,
        atoms.net_current_desktop,
        AtomEnum::CARDINAL,
        &[screen.vdesk],
    )?;
    conn.change_property32(
        PropMode::REPLACE,
        screen.root,
        atoms.net_desktop_viewport,
        AtomEnum::CARDINAL,
        &[0, 0],
    )?;
    conn.change_property32(
        PropMode::REPLACE,
        screen.root,
        atoms.net_desktop_geometry,
        AtomEnum::CARDINAL,
        &[screen.width as u32, screen.height as u32],
    )?;
    conn.change_property32(
        PropMode::REPLACE,
        screen.root,
        atoms.net_virtual_roots,
        AtomEnum::WINDOW,
        &[],
    )?;

    let check_win = conn.generate_id()?;
    conn.create_window(
        x11rb::COPY_DEPTH_FROM_PARENT,
        check_win,
        screen.root,
        -1,
        -1,
        1,
        1,
        0,
        WindowClass::INPUT_OUTPUT,
        x11rb::COPY_FROM_PARENT,
        &CreateWindowAux::new().override_redirect(1),
    )?;
    conn.change_property32(
        PropMode::REPLACE,
        screen.root,
        atoms.net_supporting_wm_check,
        AtomEnum::WINDOW,
        &[check_win],
    )?;
    conn.change_property32(
        PropMode::REPLACE,
        check_win,
        atoms.net_supporting_wm_check,
        AtomEnum::WINDOW,
        &[check_win],
    )?;
    conn.change_property8(
        PropMode::REPLACE,
        check_win,
        atoms.net_wm_name,
        atoms.utf8_string,
        b"rewm",
    )?;
    conn.change_property32(
        PropMode::REPLACE,
        check_win,
        atoms.net_wm_pid,
        AtomEnum::CARDINAL,
        &[std::process::id()],
    )?;

    Ok(check_win)
}

/// Remove the root properties published by `init_screen`.
pub fn clear_screen<C: Connection>(conn: &C, atoms: &Atoms, screen: &ScreenInfo) -> Result<()> {
    for prop in [
        atoms.net_supported,
        atoms.net_client_list,
        atoms.net_client_list_stacking,
        atoms.net_current_desktop,
        atoms.net_active_window,
        atoms.net_supporting_wm_check,
    ] {
        conn.delete_property(screen.root, prop)?;
    }
    Ok(())
}

fn read_states<C: Connection>(conn: &C, atoms: &Atoms, window: Window) -> Result<Vec<Atom>> {
    let reply = conn
        .get_property(false, window, atoms.net_wm_state, AtomEnum::ATOM, 0, 1024)?
        .reply()?;
    Ok(reply.value32().map(|v| v.collect()).unwrap_or_default())
}

/// Prepend a state atom. No duplicate scan; consumers treat the property as
/// a set, so repeated atoms are tolerated.
fn state_list_with(mut states: Vec<Atom>, state: Atom) -> Vec<Atom> {
    states.insert(0, state);
    states
}

/// Drop every occurrence of one state atom, preserving all others.
fn state_list_without(mut states: Vec<Atom>, state: Atom) -> Vec<Atom> {
    states.retain(|&a| a != state);
    states
}

fn write_states<C: Connection>(
    conn: &C,
    atoms: &Atoms,
    window: Window,
    states: &[Atom],
) -> Result<()> {
    conn.change_property32(
        PropMode::REPLACE,
        window,
        atoms.net_wm_state,
        AtomEnum::ATOM,
        states,
    )?;
    Ok(())
}

/// Add one state atom to the window's state property.
pub fn add_state<C: Connection>(
    conn: &C,
    atoms: &Atoms,
    window: Window,
    state: Atom,
) -> Result<()> {
    let states = state_list_with(read_states(conn, atoms, window)?, state);
    write_states(conn, atoms, window, &states)
}

/// Remove one state atom from the window's state property.
pub fn remove_state<C: Connection>(
    conn: &C,
    atoms: &Atoms,
    window: Window,
    state: Atom,
) -> Result<()> {
    let states = state_list_without(read_states(conn, atoms, window)?, state);
    write_states(conn, atoms, window, &states)
}

pub fn has_state<C: Connection>(
    conn: &C,
    atoms: &Atoms,
    window: Window,
    state: Atom,
) -> Result<bool> {
    Ok(read_states(conn, atoms, window)?.contains(&state))
}

/// Set the ICCCM WM_STATE property (NormalState/IconicState).
pub fn set_wm_state<C: Connection>(
    conn: &C,
    atoms: &Atoms,
    window: Window,
    state: u32,
) -> Result<()> {
    conn.change_property32(
        PropMode::REPLACE,
        window,
        atoms.wm_state,
        atoms.wm_state,
        &[state, 0],
    )?;
    Ok(())
}

/// Publish both client-list properties for one root.
///
/// _NET_CLIENT_LIST comes from the registry in insertion order;
/// _NET_CLIENT_LIST_STACKING is rebuilt from the server's child order, so
/// the two can transiently disagree about membership between an unmap and
/// the cleanup pass.
pub fn update_client_list<C: Connection>(
    conn: &C,
    atoms: &Atoms,
    root: Window,
    registry: &Registry,
) -> Result<()> {
    let list: Vec<Window> = registry.windows().take(MAX_CLIENTS).collect();
    conn.change_property32(
        PropMode::REPLACE,
        root,
        atoms.net_client_list,
        AtomEnum::WINDOW,
        &list,
    )?;

    let tree = conn.query_tree(root)?.reply()?;
    let stacking: Vec<Window> = tree
        .children
        .iter()
        .filter_map(|&child| registry.client_of_frame(child))
        .take(MAX_CLIENTS)
        .collect();
    conn.change_property32(
        PropMode::REPLACE,
        root,
        atoms.net_client_list_stacking,
        AtomEnum::WINDOW,
        &stacking,
    )?;
    Ok(())
}

/// Publish the actions the manager will honor for this client.
pub fn set_allowed_actions<C: Connection>(
    conn: &C,
    atoms: &Atoms,
    window: Window,
    options: ClientOptions,
) -> Result<()> {
    let mut actions = vec![
        atoms.net_wm_action_stick,
        atoms.net_wm_action_change_desktop,
        atoms.net_wm_action_above,
        atoms.net_wm_action_below,
    ];
    if !options.contains(ClientOptions::NO_MOVE) {
        actions.push(atoms.net_wm_action_move);
    }
    if !options.contains(ClientOptions::NO_RESIZE) {
        actions.push(atoms.net_wm_action_resize);
    }
    if !options.contains(ClientOptions::NO_CLOSE) {
        actions.push(atoms.net_wm_action_close);
    }
    if !options.contains(ClientOptions::NO_MAX) {
        actions.push(atoms.net_wm_action_maximize_horz);
        actions.push(atoms.net_wm_action_maximize_vert);
        actions.push(atoms.net_wm_action_fullscreen);
    }
    if !options.contains(ClientOptions::NO_TITLE_BAR) {
        actions.push(atoms.net_wm_action_shade);
    }
    conn.change_property32(
        PropMode::REPLACE,
        window,
        atoms.net_wm_allowed_actions,
        AtomEnum::ATOM,
        &actions,
    )?;
    Ok(())
}

/// Publish decoration extents so clients can account for the frame.
pub fn set_frame_extents<C: Connection>(
    conn: &C,
    atoms: &Atoms,
    client: &Client,
    title_height: u16,
) -> Result<()> {
    let b = client.border as u32;
    let top = b + client.title_offset(title_height) as u32;
    conn.change_property32(
        PropMode::REPLACE,
        client.window,
        atoms.net_frame_extents,
        AtomEnum::CARDINAL,
        &[b, b, top, b],
    )?;
    Ok(())
}

/// Ask the client to close itself via WM_DELETE_WINDOW.
pub fn send_wm_delete<C: Connection>(conn: &C, atoms: &Atoms, window: Window) -> Result<()> {
    let event = ClientMessageEvent::new(
        32,
        window,
        atoms.wm_protocols,
        [atoms.wm_delete_window, x11rb::CURRENT_TIME, 0, 0, 0],
    );
    conn.send_event(false, window, EventMask::NO_EVENT, event)?;
    Ok(())
}

/// Read _NET_WM_DESKTOP from a window, if present.
pub fn get_wm_desktop<C: Connection>(
    conn: &C,
    atoms: &Atoms,
    window: Window,
) -> Result<Option<u32>> {
    let reply = conn
        .get_property(false, window, atoms.net_wm_desktop, AtomEnum::CARDINAL, 0, 1)?
        .reply()?;
    Ok(reply.value32().and_then(|mut v| v.next()))
}

pub fn set_wm_desktop<C: Connection>(
    conn: &C,
    atoms: &Atoms,
    window: Window,
    desktop: u32,
) -> Result<()> {
    conn.change_property32(
        PropMode::REPLACE,
        window,
        atoms.net_wm_desktop,
        AtomEnum::CARDINAL,
        &[desktop],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn added_state_is_present_and_prepended() {
        let states = state_list_with(vec![7, 9], 5);
        assert_eq!(states, vec![5, 7, 9]);
        assert!(states.contains(&5));
    }

    #[test]
    fn add_then_remove_round_trips() {
        let states = state_list_with(vec![7, 9], 5);
        let states = state_list_without(states, 5);
        assert!(!states.contains(&5));
        assert_eq!(states, vec![7, 9]);
    }

    #[test]
    fn removal_preserves_unrelated_states() {
        let states = state_list_without(vec![1, 2, 3], 2);
        assert_eq!(states, vec![1, 3]);
    }

    #[test]
    fn removal_drops_every_duplicate() {
        let states = state_list_with(state_list_with(vec![4], 8), 8);
        assert_eq!(states, vec![8, 8, 4]);
        assert_eq!(state_list_without(states, 8), vec![4]);
    }
}
