//! Shape Module
//!
//! Non-rectangular window support via the X Shape extension. Shaped clients
//! keep no border or title strip; their bounding shape is mirrored onto the
//! frame so the decoration does not paint outside the client's outline.

use anyhow::Result;
use x11rb::connection::Connection;
use x11rb::protocol::shape::{self, ConnectionExt as _};
use x11rb::protocol::xproto::Window;

use crate::wm::client::Client;

/// Whether the window carries a non-default bounding shape.
pub fn is_shaped<C: Connection>(conn: &C, window: Window) -> Result<bool> {
    match conn.shape_query_extents(window)?.reply() {
        Ok(extents) => Ok(extents.bounding_shaped),
        Err(_) => Ok(false),
    }
}

/// Copy the client's bounding shape onto its frame. Called after geometry
/// changes and on ShapeNotify.
pub fn apply_shape<C: Connection>(conn: &C, client: &Client) -> Result<()> {
    let Some(frame) = client.frame else {
        return Ok(());
    };
    conn.shape_combine(
        shape::SO::SET,
        shape::SK::BOUNDING,
        shape::SK::BOUNDING,
        frame,
        0,
        0,
        client.window,
    )?;
    Ok(())
}

/// Ask for ShapeNotify events from this window.
pub fn select_shape_events<C: Connection>(conn: &C, window: Window) -> Result<()> {
    conn.shape_select_input(window, true)?;
    Ok(())
}
