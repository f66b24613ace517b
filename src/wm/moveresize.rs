//! MoveResize Module
//!
//! The interactive drag transaction: a bounded nested event loop that owns
//! the pointer, tracks motion, and ends on the first button event. Events
//! that are not part of the transaction are queued and handed back to the
//! dispatcher once the transaction ends.

use anyhow::Result;
use tracing::debug;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::protocol::Event;

use crate::config::Config;
use crate::wm::client::Client;
use crate::wm::client_flags::ClientOptions;
use crate::wm::events;
use crate::wm::geometry::{self, Geometry, Gravity, Point, ResizeRequest};
use crate::wm::manage;
use crate::wm::screen::ScreenInfo;
use crate::wm::WindowManager;

/// How the transaction loop treats one incoming event.
enum DragStep {
    /// A motion report: recompute geometry.
    Track(MotionNotifyEvent),
    /// A button event: the transaction is over.
    End,
    /// Not ours; hold it for the dispatcher.
    Defer(Event),
}

/// The pointer grab only redirects pointer events, so anything else on the
/// connection during a drag still belongs to the outer dispatcher and must
/// not be consumed here.
fn classify(event: Event) -> DragStep {
    match event {
        Event::MotionNotify(motion) => DragStep::Track(motion),
        Event::ButtonPress(_) | Event::ButtonRelease(_) => DragStep::End,
        other => DragStep::Defer(other),
    }
}

/// Run a pointer-driven move or resize on one client.
///
/// The pointer is grabbed for the duration; every MotionNotify recomputes
/// the geometry (snapped and hint-clamped) and any button event ends the
/// transaction. Non-pointer events arriving meanwhile are queued and
/// dispatched after the grab is released. With outline dragging the new
/// rectangle is committed once at the end; otherwise it is applied live on
/// each motion. A pure move finishes with a synthetic ConfigureNotify, a
/// resize does not (the real ConfigureNotify already carries the new size);
/// tear-off windows never get one.
pub fn drag(wm: &mut WindowManager, window: Window, resize: bool) -> Result<()> {
    let conn = wm.conn.clone();
    let atoms = wm.atoms;
    // Snapshot of neighbour frames for edge snapping; the set cannot change
    // while the transaction owns the event stream.
    let others: Vec<Geometry> = wm
        .clients
        .iter()
        .filter(|c| c.window != window && !c.hidden)
        .map(|c| c.geometry)
        .collect();
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

    // The press raises the window even when the drag itself is refused.
    manage::raise(conn.as_ref(), client)?;
    conn.flush()?;

    if client.options.contains(ClientOptions::FULLSCREEN) {
        return Ok(());
    }
    if resize
        && client
            .options
            .intersects(ClientOptions::NO_RESIZE | ClientOptions::SHADED)
    {
        return Ok(());
    }
    if !resize && client.options.contains(ClientOptions::NO_MOVE) {
        return Ok(());
    }

    let grab = conn
        .grab_pointer(
            false,
            screen.root,
            EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION,
            GrabMode::ASYNC,
            GrabMode::ASYNC,
            x11rb::NONE,
            x11rb::NONE,
            x11rb::CURRENT_TIME,
        )?
        .reply()?;
    if grab.status != GrabStatus::SUCCESS {
        debug!("pointer grab failed, aborting drag");
        return Ok(());
    }

    let pointer = conn.query_pointer(screen.root)?.reply()?;
    let start = Point {
        x: pointer.root_x as i32,
        y: pointer.root_y as i32,
    };
    let original = Point {
        x: client.geometry.x,
        y: client.geometry.y,
    };

    if resize {
        // Anchor the sweep at the bottom-right corner.
        conn.warp_pointer(
            x11rb::NONE,
            client.window,
            0,
            0,
            0,
            0,
            client.geometry.width as i16,
            client.geometry.height as i16,
        )?;
    }

    let outline = config.outline_drag && client.border > 0;
    let mut outlined = false;
    let mut deferred: Vec<Event> = Vec::new();

    loop {
        let motion = match classify(conn.wait_for_event()?) {
            DragStep::End => break,
            DragStep::Defer(event) => {
                deferred.push(event);
                continue;
            }
            DragStep::Track(motion) => motion,
        };
        if outlined {
            // XOR redraw erases the previous rectangle.
            draw_outline(conn.as_ref(), screen, config, client)?;
            outlined = false;
        }
        if resize {
            let req = ResizeRequest {
                width: Some((motion.root_x as i32 - client.geometry.x).unsigned_abs().max(1)),
                height: Some((motion.root_y as i32 - client.geometry.y).unsigned_abs().max(1)),
                ..Default::default()
            };
            client.geometry = geometry::resolve_resize(
                &client.geometry,
                &client.hints,
                &req,
                Gravity::NorthWest,
                0,
            );
        } else {
            let pos = geometry::resolve_drag(
                original,
                start,
                Point {
                    x: motion.root_x as i32,
                    y: motion.root_y as i32,
                },
            );
            client.geometry.x = pos.x;
            client.geometry.y = pos.y;
            if config.snap_distance > 0 {
                let snapped = geometry::snap_position(
                    &client.geometry,
                    screen.width as u32,
                    screen.height as u32,
                    &others,
                    config.snap_distance,
                );
                client.geometry.x = snapped.x;
                client.geometry.y = snapped.y;
            }
        }
        if outline {
            draw_outline(conn.as_ref(), screen, config, client)?;
            outlined = true;
            conn.flush()?;
        } else {
            manage::apply_geometry(conn.as_ref(), &atoms, config, screen, client)?;
            conn.flush()?;
        }
    }

    if outlined {
        draw_outline(conn.as_ref(), screen, config, client)?;
    }
    conn.ungrab_pointer(x11rb::CURRENT_TIME)?;
    manage::apply_geometry(conn.as_ref(), &atoms, config, screen, client)?;
    if !resize && !client.options.contains(ClientOptions::TEAROFF) {
        manage::send_configure_notify(conn.as_ref(), client)?;
    }
    conn.flush()?;

    for event in deferred {
        events::handle_event(wm, event)?;
    }
    Ok(())
}

/// Draw the drag rectangle on the root with the XOR GC; drawing the same
/// rectangle twice erases it.
fn draw_outline<C: Connection>(
    conn: &C,
    screen: &ScreenInfo,
    config: &Config,
    client: &Client,
) -> Result<()> {
    let offset = client.title_offset(config.title_height);
    let g = client.geometry;
    conn.poly_rectangle(
        screen.root,
        screen.gc,
        &[Rectangle {
            x: g.x as i16,
            y: (g.y - offset) as i16,
            width: (g.width + client.border as u32) as u16,
            height: (g.height as i32 + offset + client.border as i32) as u16,
        }],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motion_is_tracked() {
        let event = Event::MotionNotify(MotionNotifyEvent::default());
        assert!(matches!(classify(event), DragStep::Track(_)));
    }

    #[test]
    fn button_events_end_the_transaction() {
        let press = Event::ButtonPress(ButtonPressEvent::default());
        let release = Event::ButtonRelease(ButtonReleaseEvent::default());
        assert!(matches!(classify(press), DragStep::End));
        assert!(matches!(classify(release), DragStep::End));
    }

    #[test]
    fn non_pointer_events_are_deferred_not_dropped() {
        let map = Event::MapRequest(MapRequestEvent {
            window: 99,
            ..Default::default()
        });
        match classify(map) {
            DragStep::Defer(Event::MapRequest(e)) => assert_eq!(e.window, 99),
            _ => panic!("map request must survive the transaction"),
        }

        let unmap = Event::UnmapNotify(UnmapNotifyEvent::default());
        assert!(matches!(classify(unmap), DragStep::Defer(_)));
    }
}
