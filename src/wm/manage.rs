//! Manage Module
//!
//! Client lifecycle: adoption of top-level windows into frames, geometry
//! application, hide/restore, maximize and shade toggles, and teardown.

use anyhow::Result;
use tracing::debug;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;

use crate::config::Config;
use crate::wm::client::Client;
use crate::wm::client_flags::ClientOptions;
use crate::wm::ewmh::{self, Atoms};
use crate::wm::geometry::Geometry;
use crate::wm::hints;
use crate::wm::screen::ScreenInfo;
use crate::wm::shape;
use crate::wm::titlebar;
use crate::wm::WindowManager;

/// Adopt a top-level window: read its hints and geometry, wrap it in a
/// frame, reparent and register it. Windows that vanish mid-adoption or
/// carry override-redirect are skipped silently.
pub fn manage_window(wm: &mut WindowManager, screen_idx: usize, window: Window) -> Result<()> {
    if wm.clients.contains(window) {
        debug!("window 0x{:x} is already managed", window);
        return Ok(());
    }
    let conn = wm.conn.clone();
    let atoms = wm.atoms;
    let config = &wm.config;
    let screen = &wm.screens[screen_idx];

    let attrs = match conn.get_window_attributes(window)?.reply() {
        Ok(attrs) => attrs,
        Err(_) => {
            debug!("window 0x{:x} vanished before adoption", window);
            return Ok(());
        }
    };
    if attrs.override_redirect {
        return Ok(());
    }
    let geom = match conn.get_geometry(window)?.reply() {
        Ok(geom) => geom,
        Err(_) => return Ok(()),
    };

    let mut client = Client::new(window, screen_idx, config.border_width);
    client.colormap = attrs.colormap;
    client.geometry = Geometry {
        x: geom.x as i32,
        y: geom.y as i32,
        width: (geom.width as u32).max(1),
        height: (geom.height as u32).max(1),
    };
    client.hints = hints::read_size_hints(conn.as_ref(), window)?;

    if let Some(mh) = hints::read_motif_hints(conn.as_ref(), &atoms, window)? {
        client.options.insert(hints::decode_motif_hints(&mh));
    }
    if client.options.contains(ClientOptions::NO_BORDER) {
        client.border = 0;
    }
    if shape::is_shaped(conn.as_ref(), window)? {
        client.border = 0;
        client
            .options
            .insert(ClientOptions::SHAPED | ClientOptions::NO_TITLE_BAR);
        shape::select_shape_events(conn.as_ref(), window)?;
    }

    // Desktop membership: take a valid property, otherwise publish ours back.
    client.vdesk = match ewmh::get_wm_desktop(conn.as_ref(), &atoms, window)? {
        Some(v) if v < config.desktops => v,
        _ => {
            ewmh::set_wm_desktop(conn.as_ref(), &atoms, window, screen.vdesk)?;
            screen.vdesk
        }
    };

    // An already-viewable window will emit one UnmapNotify from the
    // reparent; it must not look like a withdrawal.
    if attrs.map_state == MapState::VIEWABLE {
        client.ignore_unmaps += 1;
    }

    if client.geometry.x == 0 && client.geometry.y == 0 {
        client.geometry.x = (screen.width as i32 - client.geometry.width as i32) / 2;
        client.geometry.y = (screen.height as i32 - client.geometry.height as i32) / 2;
    }

    conn.change_window_attributes(
        window,
        &ChangeWindowAttributesAux::new().event_mask(
            EventMask::ENTER_WINDOW | EventMask::PROPERTY_CHANGE | EventMask::COLOR_MAP_CHANGE,
        ),
    )?;

    let offset = client.title_offset(config.title_height);
    let frame = conn.generate_id()?;
    conn.create_window(
        x11rb::COPY_DEPTH_FROM_PARENT,
        frame,
        screen.root,
        client.geometry.x as i16,
        (client.geometry.y - offset) as i16,
        client.geometry.width as u16,
        (client.geometry.height as i32 + offset) as u16,
        client.border,
        WindowClass::INPUT_OUTPUT,
        x11rb::COPY_FROM_PARENT,
        &CreateWindowAux::new().override_redirect(1).event_mask(
            EventMask::SUBSTRUCTURE_REDIRECT
                | EventMask::SUBSTRUCTURE_NOTIFY
                | EventMask::BUTTON_PRESS
                | EventMask::ENTER_WINDOW
                | EventMask::EXPOSURE,
        ),
    )?;
    client.frame = Some(frame);

    conn.change_save_set(SetMode::INSERT, window)?;
    conn.reparent_window(window, frame, 0, offset as i16)?;
    conn.configure_window(window, &ConfigureWindowAux::new().border_width(0))?;
    conn.map_window(window)?;

    ewmh::set_allowed_actions(conn.as_ref(), &atoms, window, client.options)?;

    if client.vdesk == screen.vdesk || client.options.contains(ClientOptions::STICKY) {
        restore(conn.as_ref(), &atoms, &mut client)?;
    } else {
        ewmh::set_wm_state(conn.as_ref(), &atoms, window, ewmh::ICCCM_ICONIC)?;
        ewmh::add_state(conn.as_ref(), &atoms, window, atoms.net_wm_state_hidden)?;
    }
    apply_geometry(conn.as_ref(), &atoms, config, screen, &mut client)?;

    debug!(
        "managed window 0x{:x} at {:?} on desktop {}",
        window, client.geometry, client.vdesk
    );
    let root = screen.root;
    wm.clients.insert(client);
    ewmh::update_client_list(conn.as_ref(), &atoms, root, &wm.clients)?;
    conn.flush()?;
    Ok(())
}

/// Tear a client down: strip the per-window state properties, hand the
/// window back to the root and destroy the frame. Requests against an
/// already-destroyed window fail harmlessly as logged error events.
pub fn unmanage_window(wm: &mut WindowManager, window: Window) -> Result<()> {
    let Some(client) = wm.clients.remove(window) else {
        return Ok(());
    };
    let conn = wm.conn.clone();
    let atoms = wm.atoms;
    let root = wm.screens[client.screen].root;
    debug!("unmanaging window 0x{:x}", window);

    ewmh::set_wm_state(conn.as_ref(), &atoms, window, ewmh::ICCCM_WITHDRAWN)?;
    conn.delete_property(window, atoms.net_wm_state)?;
    conn.delete_property(window, atoms.net_wm_desktop)?;
    conn.reparent_window(
        window,
        root,
        client.geometry.x as i16,
        client.geometry.y as i16,
    )?;
    conn.change_save_set(SetMode::DELETE, window)?;
    if let Some(frame) = client.frame {
        conn.destroy_window(frame)?;
    }
    if wm.current == Some(window) {
        wm.current = None;
    }
    ewmh::update_client_list(conn.as_ref(), &atoms, root, &wm.clients)?;
    conn.flush()?;
    Ok(())
}

/// Push the client's geometry out to the server: place the frame (shifted up
/// by the title offset), the client window inside it, refresh decorations
/// and republish frame extents, then tell the client where it ended up.
pub fn apply_geometry<C: Connection>(
    conn: &C,
    atoms: &Atoms,
    config: &Config,
    screen: &ScreenInfo,
    client: &mut Client,
) -> Result<()> {
    let Some(frame) = client.frame else {
        return Ok(());
    };
    let offset = client.title_offset(config.title_height);
    let g = client.geometry;
    let frame_height = if client.options.contains(ClientOptions::SHADED) {
        offset.max(1) as u32
    } else {
        (g.height as i32 + offset) as u32
    };
    conn.configure_window(
        frame,
        &ConfigureWindowAux::new()
            .x(g.x)
            .y(g.y - offset)
            .width(g.width)
            .height(frame_height)
            .border_width(client.border as u32),
    )?;
    conn.configure_window(
        client.window,
        &ConfigureWindowAux::new()
            .x(0)
            .y(offset)
            .width(g.width)
            .height(g.height),
    )?;
    if offset > 0 {
        titlebar::update(conn, config, screen, client)?;
    }
    if client.options.contains(ClientOptions::SHAPED) {
        shape::apply_shape(conn, client)?;
    }
    ewmh::set_frame_extents(conn, atoms, client, config.title_height)?;
    send_configure_notify(conn, client)?;
    Ok(())
}

/// Synthetic ConfigureNotify so reparented clients learn their root-relative
/// position (ICCCM 4.1.5).
pub fn send_configure_notify<C: Connection>(conn: &C, client: &Client) -> Result<()> {
    let g = client.geometry;
    let event = ConfigureNotifyEvent {
        response_type: CONFIGURE_NOTIFY_EVENT,
        sequence: 0,
        event: client.window,
        window: client.window,
        above_sibling: x11rb::NONE,
        x: g.x as i16,
        y: g.y as i16,
        width: g.width as u16,
        height: g.height as u16,
        border_width: 0,
        override_redirect: false,
    };
    conn.send_event(false, client.window, EventMask::STRUCTURE_NOTIFY, event)?;
    Ok(())
}

/// Unmap the frame and publish iconic/hidden state. Idempotent.
pub fn hide<C: Connection>(conn: &C, atoms: &Atoms, client: &mut Client) -> Result<()> {
    if client.hidden {
        return Ok(());
    }
    if let Some(frame) = client.frame {
        conn.unmap_window(frame)?;
    }
    ewmh::set_wm_state(conn, atoms, client.window, ewmh::ICCCM_ICONIC)?;
    ewmh::add_state(conn, atoms, client.window, atoms.net_wm_state_hidden)?;
    client.hidden = true;
    Ok(())
}

/// Map the frame and publish normal state. Idempotent.
pub fn restore<C: Connection>(conn: &C, atoms: &Atoms, client: &mut Client) -> Result<()> {
    if !client.hidden {
        return Ok(());
    }
    if let Some(frame) = client.frame {
        conn.map_window(frame)?;
    }
    ewmh::set_wm_state(conn, atoms, client.window, ewmh::ICCCM_NORMAL)?;
    ewmh::remove_state(conn, atoms, client.window, atoms.net_wm_state_hidden)?;
    client.hidden = false;
    Ok(())
}

pub fn raise<C: Connection>(conn: &C, client: &Client) -> Result<()> {
    if let Some(frame) = client.frame {
        conn.configure_window(frame, &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE))?;
    }
    Ok(())
}

pub fn lower<C: Connection>(conn: &C, client: &Client) -> Result<()> {
    if let Some(frame) = client.frame {
        conn.configure_window(frame, &ConfigureWindowAux::new().stack_mode(StackMode::BELOW))?;
    }
    Ok(())
}

/// Toggle between normal and full-screen geometry, saving and restoring the
/// previous rectangle. Drives the fullscreen and both maximized states.
pub fn toggle_maximize<C: Connection>(
    conn: &C,
    atoms: &Atoms,
    config: &Config,
    screen: &ScreenInfo,
    client: &mut Client,
) -> Result<()> {
    if client.options.contains(ClientOptions::NO_MAX) {
        return Ok(());
    }
    let states = [
        atoms.net_wm_state_fullscreen,
        atoms.net_wm_state_maximized_horz,
        atoms.net_wm_state_maximized_vert,
    ];
    if client.options.is_maximized() {
        if let Some(old) = client.old_geometry.take() {
            client.geometry = old;
        }
        client.options.remove(ClientOptions::maximized());
        for state in states {
            ewmh::remove_state(conn, atoms, client.window, state)?;
        }
    } else {
        client.old_geometry = Some(client.geometry);
        client.geometry = Geometry {
            x: 0,
            y: 0,
            width: screen.width as u32,
            height: screen.height as u32,
        };
        client.options.insert(ClientOptions::maximized());
        for state in states {
            ewmh::add_state(conn, atoms, client.window, state)?;
        }
    }
    apply_geometry(conn, atoms, config, screen, client)?;
    raise(conn, client)?;
    Ok(())
}

/// Roll the client up into its title strip, or back out.
pub fn toggle_shade<C: Connection>(
    conn: &C,
    atoms: &Atoms,
    config: &Config,
    screen: &ScreenInfo,
    client: &mut Client,
) -> Result<()> {
    if client.title_offset(config.title_height) == 0 {
        return Ok(());
    }
    if client.options.contains(ClientOptions::SHADED) {
        client.options.remove(ClientOptions::SHADED);
        client.geometry.height = client.shade_height.max(1);
        conn.map_window(client.window)?;
        ewmh::remove_state(conn, atoms, client.window, atoms.net_wm_state_shaded)?;
        ewmh::set_wm_state(conn, atoms, client.window, ewmh::ICCCM_NORMAL)?;
    } else {
        client.shade_height = client.geometry.height;
        client.options.insert(ClientOptions::SHADED);
        // The unmap below is ours, not a withdrawal.
        client.ignore_unmaps += 1;
        conn.unmap_window(client.window)?;
        ewmh::add_state(conn, atoms, client.window, atoms.net_wm_state_shaded)?;
        ewmh::set_wm_state(conn, atoms, client.window, ewmh::ICCCM_ICONIC)?;
    }
    apply_geometry(conn, atoms, config, screen, client)
}

/// Graceful close via WM_DELETE_WINDOW, honoring the NO_CLOSE capability.
pub fn close_client<C: Connection>(conn: &C, atoms: &Atoms, client: &Client) -> Result<()> {
    if client.options.contains(ClientOptions::NO_CLOSE) {
        return Ok(());
    }
    ewmh::send_wm_delete(conn, atoms, client.window)?;
    conn.flush()?;
    Ok(())
}
