//! Window Manager Module
//!
//! Connection ownership, per-screen setup and the top-level manager state
//! shared by the event dispatcher.

pub mod client;
pub mod client_flags;
pub mod events;
pub mod ewmh;
pub mod focus;
pub mod geometry;
pub mod hints;
pub mod keyboard;
pub mod manage;
pub mod moveresize;
pub mod netwm;
pub mod registry;
pub mod screen;
pub mod shape;
pub mod titlebar;
pub mod workspace;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

use crate::config::Config;
use ewmh::Atoms;
use keyboard::KeyBindings;
use registry::Registry;
use screen::ScreenInfo;

pub struct WindowManager {
    pub conn: Arc<RustConnection>,
    pub atoms: Atoms,
    pub config: Config,
    pub screens: Vec<ScreenInfo>,
    pub clients: Registry,
    pub keys: KeyBindings,
    /// Window holding the input focus, if any.
    pub current: Option<Window>,
    /// Set by handlers that flagged clients for removal; drained by the
    /// dispatcher's cleanup pass.
    pub need_cleanup: bool,
}

impl WindowManager {
    /// Connect to the display, claim substructure redirection on every root
    /// and publish the protocol properties. Fails if another manager holds
    /// the redirection.
    pub fn new(config: Config) -> Result<Self> {
        let (conn, _) = x11rb::connect(None).context("cannot open display")?;
        let conn = Arc::new(conn);
        let atoms = Atoms::new(conn.as_ref())?;

        let roots: Vec<Screen> = conn.setup().roots.clone();
        let mut screens = Vec::with_capacity(roots.len());
        for (num, xscreen) in roots.iter().enumerate() {
            let mut screen = ScreenInfo::new(conn.as_ref(), num, xscreen, &config)?;
            conn.change_window_attributes(
                screen.root,
                &ChangeWindowAttributesAux::new().event_mask(
                    EventMask::SUBSTRUCTURE_REDIRECT
                        | EventMask::SUBSTRUCTURE_NOTIFY
                        | EventMask::ENTER_WINDOW
                        | EventMask::PROPERTY_CHANGE
                        | EventMask::COLOR_MAP_CHANGE,
                ),
            )?
            .check()
            .context("another window manager is already running")?;
            screen.check_win =
                ewmh::init_screen(conn.as_ref(), &atoms, &screen, config.desktops)?;
            screens.push(screen);
        }

        let keys = keyboard::setup(conn.as_ref(), &screens)?;
        conn.flush()?;
        info!("managing {} screen(s)", screens.len());

        Ok(Self {
            conn,
            atoms,
            config,
            screens,
            clients: Registry::default(),
            keys,
            current: None,
            need_cleanup: false,
        })
    }

    /// Screen index owning the given root window.
    pub fn screen_by_root(&self, root: Window) -> Option<usize> {
        self.screens.iter().position(|s| s.root == root)
    }

    /// Adopt the windows that were already mapped when we started.
    pub fn scan_existing(&mut self) -> Result<()> {
        let conn = self.conn.clone();
        for screen_idx in 0..self.screens.len() {
            let root = self.screens[screen_idx].root;
            let tree = conn.query_tree(root)?.reply()?;
            for window in tree.children {
                let Ok(attrs) = conn.get_window_attributes(window)?.reply() else {
                    continue;
                };
                if attrs.override_redirect || attrs.map_state != MapState::VIEWABLE {
                    continue;
                }
                manage::manage_window(self, screen_idx, window)?;
            }
        }
        Ok(())
    }
}

impl Drop for WindowManager {
    fn drop(&mut self) {
        // Leave the roots clean for whatever manages them next.
        for screen in &self.screens {
            let _ = ewmh::clear_screen(self.conn.as_ref(), &self.atoms, screen);
        }
        let _ = self.conn.flush();
    }
}
