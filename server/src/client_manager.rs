//! Connected clients, split into pending and active rosters
//!
//! This module tracks every open connection and which stage it is in:
//! - Pending: connected, has not yet supplied a usable name
//! - Active: named, takes part in broadcasts and the turn rotation
//!
//! A client lives in exactly one roster at a time. Both rosters insert at the
//! front; for the active roster this order *is* the turn order, so the most
//! recent joiner sits at the head.

use crate::line_buffer::LineBuffer;
use log::{debug, info};
use std::collections::VecDeque;
use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Roster {
    Pending,
    Active,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("client {0} is not waiting for a name")]
    NotPending(u32),
    #[error("name {0:?} is already taken")]
    NameInUse(String),
}

/// One connection and its input state
#[derive(Debug)]
pub struct Client {
    /// Connection handle assigned by the transport
    pub id: u32,
    /// Peer address, only used for logging
    pub addr: SocketAddr,
    /// Empty until the client is promoted into the game
    pub name: String,
    /// Bytes received but not yet consumed as complete lines
    pub line_buffer: LineBuffer,
}

impl Client {
    pub fn new(id: u32, addr: SocketAddr, line_capacity: usize) -> Self {
        Self {
            id,
            addr,
            name: String::new(),
            line_buffer: LineBuffer::new(line_capacity),
        }
    }
}

/// Registry of every open connection
pub struct ClientManager {
    pending: VecDeque<Client>,
    active: VecDeque<Client>,
    /// Maximum number of concurrent connections, pending and active combined
    max_clients: usize,
    line_capacity: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize, line_capacity: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            active: VecDeque::new(),
            max_clients,
            line_capacity,
        }
    }

    /// Registers a freshly accepted connection as pending.
    ///
    /// Returns false when the server is at capacity or the ID is already
    /// known; the caller should then close the connection.
    pub fn add_pending(&mut self, id: u32, addr: SocketAddr) -> bool {
        if self.len() >= self.max_clients || self.locate(id).is_some() {
            return false;
        }

        info!("Adding client {} from {}", id, addr);
        self.insert_front(Roster::Pending, Client::new(id, addr, self.line_capacity));
        true
    }

    pub fn insert_front(&mut self, roster: Roster, client: Client) {
        self.roster_mut(roster).push_front(client);
    }

    pub fn exists(&self, roster: Roster, id: u32) -> bool {
        self.roster(roster).iter().any(|client| client.id == id)
    }

    /// Which roster holds `id`, if any
    pub fn locate(&self, id: u32) -> Option<Roster> {
        if self.exists(Roster::Active, id) {
            Some(Roster::Active)
        } else if self.exists(Roster::Pending, id) {
            Some(Roster::Pending)
        } else {
            None
        }
    }

    /// Unlinks a client from whichever roster holds it
    pub fn remove(&mut self, id: u32) -> Option<Client> {
        let roster = self.locate(id)?;
        let list = self.roster_mut(roster);
        let index = list.iter().position(|client| client.id == id)?;
        let client = list.remove(index)?;
        info!("Removing client {} {}", client.id, client.addr);
        Some(client)
    }

    /// Moves a pending client to the front of the active roster under `name`
    pub fn promote(&mut self, id: u32, name: &str) -> Result<(), RegistryError> {
        if self.name_in_use(name) {
            return Err(RegistryError::NameInUse(name.to_string()));
        }

        let index = self
            .pending
            .iter()
            .position(|client| client.id == id)
            .ok_or(RegistryError::NotPending(id))?;
        let mut client = self
            .pending
            .remove(index)
            .ok_or(RegistryError::NotPending(id))?;

        debug!("Removing client {} from new players", id);
        client.name = name.to_string();
        info!("Adding client {} as {}", id, client.name);
        self.active.push_front(client);
        Ok(())
    }

    /// Case-sensitive check against every active player's name
    pub fn name_in_use(&self, name: &str) -> bool {
        self.active.iter().any(|client| client.name == name)
    }

    /// Active client IDs in turn order, as an owned snapshot
    pub fn active_ids(&self) -> Vec<u32> {
        self.active.iter().map(|client| client.id).collect()
    }

    pub fn name_of(&self, id: u32) -> Option<&str> {
        self.active
            .iter()
            .find(|client| client.id == id)
            .map(|client| client.name.as_str())
    }

    pub fn client_mut(&mut self, id: u32) -> Option<&mut Client> {
        self.active
            .iter_mut()
            .chain(self.pending.iter_mut())
            .find(|client| client.id == id)
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Total number of open connections
    pub fn len(&self) -> usize {
        self.active.len() + self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn roster(&self, roster: Roster) -> &VecDeque<Client> {
        match roster {
            Roster::Pending => &self.pending,
            Roster::Active => &self.active,
        }
    }

    fn roster_mut(&mut self, roster: Roster) -> &mut VecDeque<Client> {
        match roster {
            Roster::Pending => &mut self.pending,
            Roster::Active => &mut self.active,
        }
    }
}
