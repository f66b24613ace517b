//! Events Module
//!
//! The outer dispatch loop: one blocking event at a time, routed to the
//! lifecycle, synchronizer and transaction modules, followed by a cleanup
//! pass that performs any removals flagged while handling the event.

use anyhow::{Context, Result};
use tracing::{debug, warn};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::protocol::{ErrorKind, Event};

use crate::wm::client_flags::ClientOptions;
use crate::wm::focus;
use crate::wm::hints;
use crate::wm::manage;
use crate::wm::moveresize;
use crate::wm::netwm;
use crate::wm::shape;
use crate::wm::titlebar::{self, TitleAction};
use crate::wm::{keyboard, WindowManager};

/// Run the dispatcher until the connection dies. Handler failures are
/// logged and the loop continues; only a lost connection is fatal.
pub fn run(wm: &mut WindowManager) -> Result<()> {
    loop {
        let event = wm
            .conn
            .wait_for_event()
            .context("lost connection to the X server")?;
        if let Err(e) = handle_event(wm, event) {
            warn!("event handler failed: {:#}", e);
        }
        if wm.need_cleanup {
            cleanup(wm)?;
        }
    }
}

/// Route one event. Also used to replay events a drag transaction queued
/// while it owned the connection.
pub(crate) fn handle_event(wm: &mut WindowManager, event: Event) -> Result<()> {
    match event {
        Event::ButtonPress(e) => handle_button_press(wm, &e),
        Event::ClientMessage(e) => netwm::handle_client_message(wm, &e),
        Event::ColormapNotify(e) => handle_colormap_notify(wm, &e),
        Event::ConfigureRequest(e) => handle_configure_request(wm, &e),
        Event::DestroyNotify(e) => handle_destroy_notify(wm, &e),
        Event::EnterNotify(e) => handle_enter_notify(wm, &e),
        Event::Expose(e) => handle_expose(wm, &e),
        Event::KeyPress(e) => keyboard::handle_key_press(wm, &e),
        Event::MapRequest(e) => handle_map_request(wm, &e),
        Event::PropertyNotify(e) => handle_property_notify(wm, &e),
        Event::ShapeNotify(e) => handle_shape_notify(wm, &e),
        Event::UnmapNotify(e) => handle_unmap_notify(wm, &e),
        Event::Error(e) => handle_x_error(wm, &e),
        // Keyboard remapping does not affect the grabbed vocabulary.
        Event::MappingNotify(_) => Ok(()),
        _ => Ok(()),
    }
}

/// Perform the removals flagged during event handling.
fn cleanup(wm: &mut WindowManager) -> Result<()> {
    for window in wm.clients.pending_removals() {
        manage::unmanage_window(wm, window)?;
    }
    wm.need_cleanup = false;
    Ok(())
}

fn handle_button_press(wm: &mut WindowManager, event: &ButtonPressEvent) -> Result<()> {
    let conn = wm.conn.clone();
    let atoms = wm.atoms;
    let title_height = wm.config.title_height;
    let Some(client) = wm.clients.find_any_mut(event.event) else {
        return Ok(());
    };
    let window = client.window;
    let width = client.geometry.width as u16;
    let decorated = client.title_offset(title_height) > 0;

    match event.detail {
        1 => {
            let action = if decorated {
                titlebar::hit_test(event.event_x, event.event_y, width, title_height)
            } else {
                TitleAction::Move
            };
            match action {
                TitleAction::Close => {
                    let WindowManager {
                        clients,
                        screens,
                        config,
                        ..
                    } = wm;
                    if let Some(client) = clients.find_mut(window) {
                        // Roll a shaded client back out before asking it to go.
                        if client.options.contains(ClientOptions::SHADED) {
                            let screen = &screens[client.screen];
                            manage::toggle_shade(conn.as_ref(), &atoms, config, screen, client)?;
                        }
                        manage::close_client(conn.as_ref(), &atoms, client)?;
                    }
                }
                TitleAction::Shade => {
                    let WindowManager {
                        clients,
                        screens,
                        config,
                        ..
                    } = wm;
                    if let Some(client) = clients.find_mut(window) {
                        let screen = &screens[client.screen];
                        manage::toggle_shade(conn.as_ref(), &atoms, config, screen, client)?;
                        conn.flush()?;
                    }
                }
                TitleAction::Resize => moveresize::drag(wm, window, true)?,
                TitleAction::Move => moveresize::drag(wm, window, false)?,
            }
        }
        2 => {
            manage::lower(conn.as_ref(), client)?;
            conn.flush()?;
        }
        3 => moveresize::drag(wm, window, true)?,
        _ => {}
    }
    Ok(())
}

fn handle_colormap_notify(wm: &mut WindowManager, event: &ColormapNotifyEvent) -> Result<()> {
    if !event.new {
        return Ok(());
    }
    let conn = wm.conn.clone();
    let current = wm.current;
    if let Some(client) = wm.clients.find_mut(event.window) {
        client.colormap = event.colormap;
        if current == Some(client.window) {
            conn.install_colormap(event.colormap)?;
            conn.flush()?;
        }
    }
    Ok(())
}

/// Managed clients get the request resolved through the geometry engine;
/// unmanaged windows have it forwarded verbatim.
fn handle_configure_request(wm: &mut WindowManager, event: &ConfigureRequestEvent) -> Result<()> {
    let conn = wm.conn.clone();
    let atoms = wm.atoms;
    let WindowManager {
        clients,
        screens,
        config,
        ..
    } = wm;
    let Some(client) = clients.find_mut(event.window) else {
        conn.configure_window(
            event.window,
            &ConfigureWindowAux::from_configure_request(event),
        )?;
        conn.flush()?;
        return Ok(());
    };
    if client.options.contains(ClientOptions::FULLSCREEN) {
        return Ok(());
    }
    let mask = event.value_mask;
    let req = crate::wm::geometry::ResizeRequest {
        x: mask
            .contains(ConfigWindow::X)
            .then_some(event.x as i32),
        y: mask
            .contains(ConfigWindow::Y)
            .then_some(event.y as i32),
        width: mask
            .contains(ConfigWindow::WIDTH)
            .then_some(event.width as u32),
        height: mask
            .contains(ConfigWindow::HEIGHT)
            .then_some(event.height as u32),
    };
    client.geometry = crate::wm::geometry::resolve_resize(
        &client.geometry,
        &client.hints,
        &req,
        client.hints.gravity,
        client.border as i32,
    );
    let screen = &screens[client.screen];
    manage::apply_geometry(conn.as_ref(), &atoms, config, screen, client)?;
    if mask.contains(ConfigWindow::STACK_MODE) && event.stack_mode == StackMode::ABOVE {
        manage::raise(conn.as_ref(), client)?;
    }
    conn.flush()?;
    Ok(())
}

fn handle_destroy_notify(wm: &mut WindowManager, event: &DestroyNotifyEvent) -> Result<()> {
    if let Some(client) = wm.clients.find_mut(event.window) {
        client.ignore_unmaps = 0;
        client.options.insert(ClientOptions::REMOVE);
        wm.need_cleanup = true;
    }
    Ok(())
}

fn handle_enter_notify(wm: &mut WindowManager, event: &EnterNotifyEvent) -> Result<()> {
    let conn = wm.conn.clone();
    let atoms = wm.atoms;
    let WindowManager {
        clients, screens, ..
    } = wm;
    let Some(client) = clients.find_any_mut(event.event) else {
        return Ok(());
    };
    let screen = &screens[client.screen];
    if client.options.contains(ClientOptions::STICKY) || client.vdesk == screen.vdesk {
        focus::select_client(conn.as_ref(), &atoms, screen.root, client)?;
        wm.current = Some(client.window);
    }
    Ok(())
}

fn handle_expose(wm: &mut WindowManager, event: &ExposeEvent) -> Result<()> {
    if event.count != 0 {
        return Ok(());
    }
    let conn = wm.conn.clone();
    let WindowManager {
        clients,
        screens,
        config,
        ..
    } = wm;
    if let Some(client) = clients.find_any_mut(event.window) {
        if client.titlebar == Some(event.window) {
            let screen = &screens[client.screen];
            titlebar::update(conn.as_ref(), config, screen, client)?;
            conn.flush()?;
        }
    }
    Ok(())
}

fn handle_map_request(wm: &mut WindowManager, event: &MapRequestEvent) -> Result<()> {
    let conn = wm.conn.clone();
    let atoms = wm.atoms;
    if let Some(client) = wm.clients.find_mut(event.window) {
        // A map for a client already on its way out is stale.
        if client.pending_removal() {
            return Ok(());
        }
        manage::restore(conn.as_ref(), &atoms, client)?;
        conn.flush()?;
        return Ok(());
    }
    if let Some(screen_idx) = wm.screen_by_root(event.parent) {
        manage::manage_window(wm, screen_idx, event.window)?;
    }
    Ok(())
}

fn handle_property_notify(wm: &mut WindowManager, event: &PropertyNotifyEvent) -> Result<()> {
    let atoms = wm.atoms;
    // High-churn properties with no layout consequence.
    if event.atom == atoms.net_wm_opaque_region
        || event.atom == atoms.net_wm_user_time
        || event.atom == u32::from(AtomEnum::WM_HINTS)
    {
        return Ok(());
    }
    let conn = wm.conn.clone();
    let WindowManager {
        clients,
        screens,
        config,
        ..
    } = wm;
    let Some(client) = clients.find_mut(event.window) else {
        return Ok(());
    };
    let screen = &screens[client.screen];
    if event.atom == u32::from(AtomEnum::WM_NAME) {
        if client.title_offset(config.title_height) > 0 {
            titlebar::update(conn.as_ref(), config, screen, client)?;
            conn.flush()?;
        }
    } else if event.atom == u32::from(AtomEnum::WM_NORMAL_HINTS) {
        client.hints = hints::read_size_hints(conn.as_ref(), client.window)?;
    } else {
        // Decoration-relevant properties may have changed the frame layout.
        manage::apply_geometry(conn.as_ref(), &atoms, config, screen, client)?;
        conn.flush()?;
    }
    Ok(())
}

fn handle_shape_notify(
    wm: &mut WindowManager,
    event: &x11rb::protocol::shape::NotifyEvent,
) -> Result<()> {
    let conn = wm.conn.clone();
    if let Some(client) = wm.clients.find(event.affected_window) {
        shape::apply_shape(conn.as_ref(), client)?;
        conn.flush()?;
    }
    Ok(())
}

/// An UnmapNotify either burns one self-caused-unmap credit or flags the
/// client for removal in the cleanup pass.
fn handle_unmap_notify(wm: &mut WindowManager, event: &UnmapNotifyEvent) -> Result<()> {
    if let Some(client) = wm.clients.find_mut(event.window) {
        if client.on_unmap() {
            debug!("window 0x{:x} withdrawn, scheduling removal", event.window);
            wm.need_cleanup = true;
        }
    }
    Ok(())
}

/// Protocol errors are non-fatal. A window error naming a managed client
/// means the window died under us; route it through the same cleanup as a
/// withdrawal.
fn handle_x_error(wm: &mut WindowManager, error: &x11rb::x11_utils::X11Error) -> Result<()> {
    if error.error_kind == ErrorKind::Window {
        if let Some(client) = wm.clients.find_mut(error.bad_value) {
            client.options.insert(ClientOptions::REMOVE);
            wm.need_cleanup = true;
            return Ok(());
        }
    }
    debug!(
        "x error {:?} for resource 0x{:x}",
        error.error_kind, error.bad_value
    );
    Ok(())
}
