//! Registry Module
//!
//! The set of managed clients, keyed by application window with insertion
//! order preserved for client-list publication. Removal is deferred: event
//! handlers flag a client with REMOVE and the dispatcher's cleanup pass
//! performs the structural removal once no handler holds a reference.

use std::collections::HashMap;

use x11rb::protocol::xproto::Window;

use crate::wm::client::Client;

#[derive(Default)]
pub struct Registry {
    clients: HashMap<Window, Client>,
    order: Vec<Window>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, window: Window) -> bool {
        self.clients.contains_key(&window)
    }

    pub fn insert(&mut self, client: Client) {
        let window = client.window;
        if self.clients.insert(window, client).is_none() {
            self.order.push(window);
        }
    }

    pub fn find(&self, window: Window) -> Option<&Client> {
        self.clients.get(&window)
    }

    pub fn find_mut(&mut self, window: Window) -> Option<&mut Client> {
        self.clients.get_mut(&window)
    }

    /// Look a client up by any of its window handles (app window, frame or
    /// title strip). Frame handles never collide with client keys, so the
    /// fast map lookup is tried first.
    pub fn find_any_mut(&mut self, window: Window) -> Option<&mut Client> {
        if self.clients.contains_key(&window) {
            return self.clients.get_mut(&window);
        }
        self.clients
            .values_mut()
            .find(|c| c.frame == Some(window) || c.titlebar == Some(window))
    }

    /// Map a frame handle back to its client window.
    pub fn client_of_frame(&self, frame: Window) -> Option<Window> {
        self.clients
            .values()
            .find(|c| c.frame == Some(frame))
            .map(|c| c.window)
    }

    pub fn remove(&mut self, window: Window) -> Option<Client> {
        let client = self.clients.remove(&window)?;
        self.order.retain(|w| *w != window);
        Some(client)
    }

    /// Managed windows in insertion order.
    pub fn windows(&self) -> impl Iterator<Item = Window> + '_ {
        self.order.iter().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Client> {
        self.order.iter().filter_map(|w| self.clients.get(w))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Client> {
        self.clients.values_mut()
    }

    /// Windows flagged for removal, for the cleanup pass.
    pub fn pending_removals(&self) -> Vec<Window> {
        self.iter()
            .filter(|c| c.pending_removal())
            .map(|c| c.window)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wm::client_flags::ClientOptions;

    fn client(window: Window) -> Client {
        Client::new(window, 0, 1)
    }

    #[test]
    fn publication_order_is_insertion_order() {
        let mut reg = Registry::new();
        reg.insert(client(30));
        reg.insert(client(10));
        reg.insert(client(20));
        let order: Vec<Window> = reg.windows().collect();
        assert_eq!(order, vec![30, 10, 20]);
    }

    #[test]
    fn double_insert_keeps_one_entry() {
        let mut reg = Registry::new();
        reg.insert(client(10));
        reg.insert(client(10));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn find_any_resolves_frame_and_titlebar() {
        let mut reg = Registry::new();
        let mut c = client(10);
        c.frame = Some(100);
        c.titlebar = Some(101);
        reg.insert(c);
        assert_eq!(reg.find_any_mut(100).map(|c| c.window), Some(10));
        assert_eq!(reg.find_any_mut(101).map(|c| c.window), Some(10));
        assert_eq!(reg.client_of_frame(100), Some(10));
        assert!(reg.find_any_mut(102).is_none());
    }

    #[test]
    fn cleanup_selects_exactly_flagged_clients() {
        let mut reg = Registry::new();
        reg.insert(client(10));
        let mut doomed = client(20);
        doomed.options.insert(ClientOptions::REMOVE);
        reg.insert(doomed);
        reg.insert(client(30));
        assert_eq!(reg.pending_removals(), vec![20]);
        for w in reg.pending_removals() {
            reg.remove(w);
        }
        assert_eq!(reg.windows().collect::<Vec<_>>(), vec![10, 30]);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut reg = Registry::new();
        reg.insert(client(10));
        assert!(reg.remove(10).is_some());
        assert!(reg.remove(10).is_none());
        assert!(reg.is_empty());
    }
}
