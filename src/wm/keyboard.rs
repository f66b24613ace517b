//! Keyboard Module
//!
//! Key grabs and the small command vocabulary: Mod+1..9 switches desktops,
//! Mod+arrows nudge the active client, Mod+Escape closes it.

use anyhow::Result;
use tracing::debug;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;

use crate::wm::client_flags::ClientOptions;
use crate::wm::manage;
use crate::wm::screen::ScreenInfo;
use crate::wm::workspace;
use crate::wm::WindowManager;

/// Modifier used for all bindings.
const MOD: ModMask = ModMask::M1;
/// Pixels per arrow-key nudge.
const STEP: i32 = 16;

// Keysyms resolved at startup.
const XK_1: u32 = 0x31;
const XK_ESCAPE: u32 = 0xff1b;
const XK_LEFT: u32 = 0xff51;
const XK_UP: u32 = 0xff52;
const XK_RIGHT: u32 = 0xff53;
const XK_DOWN: u32 = 0xff54;

/// Resolved keycodes for the command vocabulary. A keysym missing from the
/// keyboard mapping simply leaves that binding inert.
#[derive(Debug, Default)]
pub struct KeyBindings {
    desks: [Option<Keycode>; 9],
    left: Option<Keycode>,
    right: Option<Keycode>,
    up: Option<Keycode>,
    down: Option<Keycode>,
    close: Option<Keycode>,
}

/// Resolve keycodes and grab each binding on every root.
pub fn setup<C: Connection>(conn: &C, screens: &[ScreenInfo]) -> Result<KeyBindings> {
    let table = KeysymTable::load(conn)?;
    let mut bindings = KeyBindings {
        left: table.keycode(XK_LEFT),
        right: table.keycode(XK_RIGHT),
        up: table.keycode(XK_UP),
        down: table.keycode(XK_DOWN),
        close: table.keycode(XK_ESCAPE),
        ..Default::default()
    };
    for (i, slot) in bindings.desks.iter_mut().enumerate() {
        *slot = table.keycode(XK_1 + i as u32);
    }

    let all: Vec<Keycode> = bindings
        .desks
        .iter()
        .chain([
            &bindings.left,
            &bindings.right,
            &bindings.up,
            &bindings.down,
            &bindings.close,
        ])
        .filter_map(|k| *k)
        .collect();
    for screen in screens {
        for &key in &all {
            conn.grab_key(
                false,
                screen.root,
                MOD,
                key,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
            )?;
        }
    }
    Ok(bindings)
}

/// React to a grabbed KeyPress. Unknown keys are ignored.
pub fn handle_key_press(wm: &mut WindowManager, event: &KeyPressEvent) -> Result<()> {
    if u16::from(event.state) & u16::from(MOD) == 0 {
        return Ok(());
    }
    let key = Some(event.detail);

    let desks = wm.keys.desks;
    for (i, desk_key) in desks.iter().enumerate() {
        if key == *desk_key {
            if let Some(screen_idx) = wm.screen_by_root(event.root) {
                workspace::switch_desktop(wm, screen_idx, i as u32)?;
            }
            return Ok(());
        }
    }

    let Some(current) = wm.current else {
        debug!("key command with no active client");
        return Ok(());
    };

    if key == wm.keys.close {
        let conn = wm.conn.clone();
        let atoms = wm.atoms;
        if let Some(client) = wm.clients.find(current) {
            manage::close_client(conn.as_ref(), &atoms, client)?;
        }
        return Ok(());
    }

    let (dx, dy) = if key == wm.keys.left {
        (-STEP, 0)
    } else if key == wm.keys.right {
        (STEP, 0)
    } else if key == wm.keys.up {
        (0, -STEP)
    } else if key == wm.keys.down {
        (0, STEP)
    } else {
        return Ok(());
    };

    let conn = wm.conn.clone();
    let atoms = wm.atoms;
    let WindowManager {
        clients,
        screens,
        config,
        ..
    } = wm;
    let Some(client) = clients.find_mut(current) else {
        return Ok(());
    };
    if client
        .options
        .intersects(ClientOptions::NO_MOVE | ClientOptions::FULLSCREEN)
    {
        return Ok(());
    }
    client.geometry.x += dx;
    client.geometry.y += dy;
    let screen = &screens[client.screen];
    manage::apply_geometry(conn.as_ref(), &atoms, config, screen, client)?;
    conn.flush()?;
    Ok(())
}

/// Snapshot of the server's keysym table.
struct KeysymTable {
    first: Keycode,
    per_keycode: u8,
    keysyms: Vec<u32>,
}

impl KeysymTable {
    fn load<C: Connection>(conn: &C) -> Result<Self> {
        let setup = conn.setup();
        let first = setup.min_keycode;
        let count = setup.max_keycode - setup.min_keycode + 1;
        let reply = conn.get_keyboard_mapping(first, count)?.reply()?;
        Ok(Self {
            first,
            per_keycode: reply.keysyms_per_keycode,
            keysyms: reply.keysyms,
        })
    }

    /// First keycode producing the given keysym in any column.
    fn keycode(&self, keysym: u32) -> Option<Keycode> {
        let per = self.per_keycode.max(1) as usize;
        self.keysyms
            .chunks(per)
            .position(|syms| syms.contains(&keysym))
            .map(|i| self.first + i as u8)
    }
}
