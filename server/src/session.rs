//! Single-writer game session
//!
//! `Session` owns the client registry and the game state and is driven by
//! three events coming from the transport: a connection opened, bytes
//! arrived, a connection went away. Every mutation happens inside these
//! calls, so the event loop needs no locking as long as it owns the session.
//!
//! Outgoing traffic goes through the [`Transport`] trait. A failed send is
//! treated as the recipient disconnecting: it is unlinked on the spot, and
//! the follow-up announcements (goodbye, new turn) are queued until the
//! current event has been handled so they never interleave with a broadcast
//! that is still running.

use crate::client_manager::{ClientManager, Roster};
use crate::config::ServerConfig;
use crate::dictionary::WordSource;
use crate::error::SendError;
use crate::game::{GameState, GuessRejection, RoundState};
use log::{debug, info, warn};
use shared::Message;
use std::collections::VecDeque;
use std::net::SocketAddr;
use thiserror::Error;

/// Outbound half of the connection layer
pub trait Transport {
    /// Queues `message` for delivery to `client_id`
    fn send(&mut self, client_id: u32, message: &Message) -> Result<(), SendError>;

    /// Releases everything held for `client_id`. Called once per connection.
    fn close(&mut self, client_id: u32);
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum NameRejection {
    #[error("empty name")]
    Empty,
    #[error("name longer than {0} characters")]
    TooLong(usize),
    #[error("name already in use")]
    Taken,
}

impl From<NameRejection> for Message {
    fn from(rejection: NameRejection) -> Self {
        match rejection {
            NameRejection::Empty => Message::NameEmpty,
            NameRejection::TooLong(_) => Message::NameTooLong,
            NameRejection::Taken => Message::NameTaken,
        }
    }
}

pub struct Session<T: Transport> {
    clients: ClientManager,
    game: GameState,
    transport: T,
    config: ServerConfig,
    /// Names of active players who left during the current event
    departures: VecDeque<String>,
    /// Set when the turn holder leaves; cleared by the next turn announcement
    turn_unannounced: bool,
}

impl<T: Transport> Session<T> {
    pub fn new(config: ServerConfig, words: Box<dyn WordSource>, transport: T) -> Self {
        let game = GameState::new(words, config.max_guesses);
        Self {
            clients: ClientManager::new(config.max_clients, config.max_line_len),
            game,
            transport,
            config,
            departures: VecDeque::new(),
            turn_unannounced: false,
        }
    }

    pub fn clients(&self) -> &ClientManager {
        &self.clients
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Admits a new connection as pending and greets it.
    ///
    /// Returns false if the connection was refused because the server is
    /// full; it has been closed in that case.
    pub fn connect(&mut self, client_id: u32, addr: SocketAddr) -> bool {
        if !self.clients.add_pending(client_id, addr) {
            warn!("Refusing client {} from {}: server full", client_id, addr);
            if let Err(e) = self.transport.send(client_id, &Message::ServerFull) {
                debug!("Could not tell client {} the server is full: {}", client_id, e);
            }
            self.transport.close(client_id);
            return false;
        }

        self.send_to(client_id, &Message::Welcome);
        self.settle();
        true
    }

    /// Feeds bytes read from `client_id` and handles every complete line
    pub fn receive(&mut self, client_id: u32, data: &[u8]) {
        let Some(client) = self.clients.client_mut(client_id) else {
            debug!("Dropping {} bytes for unknown client {}", data.len(), client_id);
            return;
        };
        debug!("[{}] Read {} bytes", client_id, data.len());
        client.line_buffer.append(data);

        // Re-resolve the client for every line: handling one line may promote
        // it to the active roster or remove it entirely.
        while let Some(client) = self.clients.client_mut(client_id) {
            let line = match client.line_buffer.next_line() {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!("Client {}: {}, disconnecting", client_id, e);
                    self.send_to(client_id, &Message::LineTooLong);
                    self.remove_client(client_id);
                    break;
                }
            };

            debug!("[{}] newline {}", client_id, line);

            match self.clients.locate(client_id) {
                Some(Roster::Pending) => self.register_name(client_id, &line),
                Some(Roster::Active) => self.take_guess(client_id, &line),
                None => break,
            }
        }

        self.settle();
    }

    /// Removes a connection that closed or failed underneath us
    pub fn disconnect(&mut self, client_id: u32) {
        if !self.remove_client(client_id) {
            debug!("Trying to remove client {}, but it is not registered", client_id);
        }
        self.settle();
    }

    fn register_name(&mut self, client_id: u32, name: &str) {
        if let Err(rejection) = self.validate_name(name) {
            debug!("Client {} offered name {:?}: {}", client_id, name, rejection);
            self.send_to(client_id, &rejection.into());
            return;
        }

        if let Err(e) = self.clients.promote(client_id, name) {
            warn!("Could not move client {} into the game: {}", client_id, e);
            return;
        }
        self.game.turn.begin(&self.clients.active_ids());

        info!("{} has joined.", name);
        self.broadcast(
            &Message::Joined {
                name: name.to_string(),
            },
            None,
        );
        let status = self.game.status();
        self.send_to(client_id, &status);
        self.announce_turn();
    }

    fn validate_name(&self, name: &str) -> Result<(), NameRejection> {
        if name.is_empty() {
            return Err(NameRejection::Empty);
        }
        if name.chars().count() > self.config.max_name_len {
            return Err(NameRejection::TooLong(self.config.max_name_len));
        }
        if self.clients.name_in_use(name) {
            return Err(NameRejection::Taken);
        }
        Ok(())
    }

    fn take_guess(&mut self, client_id: u32, line: &str) {
        let Some(name) = self.clients.name_of(client_id).map(str::to_string) else {
            return;
        };

        let letter = match self.game.validate_guess(client_id, line) {
            Ok(letter) => letter,
            Err(rejection) => {
                if rejection == GuessRejection::NotYourTurn {
                    info!("Player {} tried to guess out of turn", name);
                } else {
                    debug!("Rejected guess {:?} from {}: {}", line, name, rejection);
                }
                self.send_to(client_id, &rejection.into());
                return;
            }
        };

        // Settle the game state before any message goes out; a failed send
        // below may unlink players and must see the turn already moved.
        let outcome = self.game.apply_guess(letter);
        if !outcome.is_hit() {
            self.game.turn.advance(&self.clients.active_ids());
        }
        let round = self.game.round_state();

        if !outcome.is_hit() {
            info!("Letter {} is not in the word", letter);
            self.send_to(client_id, &Message::NotInWord { letter });
        }
        self.broadcast(
            &Message::Guessed {
                name: name.clone(),
                letter,
            },
            None,
        );

        match round {
            RoundState::Won => {
                let word = self.game.word().to_string();
                self.broadcast(&Message::WordWas { word }, None);
                self.announce_winner(client_id, &name);
                self.start_new_round();
            }
            RoundState::Lost => {
                let word = self.game.word().to_string();
                info!("No guesses left, the word was {}", word);
                self.broadcast(&Message::RoundLost { word }, None);
                self.start_new_round();
            }
            RoundState::AwaitingGuess => {
                let status = self.game.status();
                self.broadcast(&status, None);
                self.announce_turn();
            }
        }
    }

    fn start_new_round(&mut self) {
        self.game.reset(&self.clients.active_ids());
        let status = self.game.status();
        self.broadcast(&status, None);
        self.announce_turn();
    }

    /// Sends `message` to every active player except `exclude`
    pub fn broadcast(&mut self, message: &Message, exclude: Option<u32>) {
        for client_id in self.clients.active_ids() {
            if Some(client_id) == exclude || !self.clients.exists(Roster::Active, client_id) {
                continue;
            }
            self.send_to(client_id, message);
        }
    }

    /// Tells the turn holder to guess and everyone else whose turn it is
    pub fn announce_turn(&mut self) {
        self.turn_unannounced = false;
        let Some(current) = self.game.turn.current() else {
            return;
        };
        let Some(name) = self.clients.name_of(current).map(str::to_string) else {
            return;
        };
        info!("It's {}'s turn.", name);

        for client_id in self.clients.active_ids() {
            if !self.clients.exists(Roster::Active, client_id) {
                continue;
            }
            let message = if client_id == current {
                Message::YourGuess
            } else {
                Message::TurnOf { name: name.clone() }
            };
            self.send_to(client_id, &message);
        }
    }

    pub fn announce_winner(&mut self, winner_id: u32, winner_name: &str) {
        info!("Game over. {} won!", winner_name);
        for client_id in self.clients.active_ids() {
            if !self.clients.exists(Roster::Active, client_id) {
                continue;
            }
            let message = if client_id == winner_id {
                Message::YouWin
            } else {
                Message::WinnerIs {
                    name: winner_name.to_string(),
                }
            };
            self.send_to(client_id, &message);
        }
    }

    /// Delivers to one client, unlinking it if the transport refuses
    fn send_to(&mut self, client_id: u32, message: &Message) -> bool {
        if self.clients.locate(client_id).is_none() {
            return false;
        }
        match self.transport.send(client_id, message) {
            Ok(()) => true,
            Err(e) => {
                warn!("Write to client {} failed: {}", client_id, e);
                self.remove_client(client_id);
                false
            }
        }
    }

    /// Unlinks a client and releases its connection.
    ///
    /// For an active client the turn is repaired before unlinking, while the
    /// client can still be found in the turn order.
    fn remove_client(&mut self, client_id: u32) -> bool {
        let Some(roster) = self.clients.locate(client_id) else {
            return false;
        };

        let held_turn = self.game.turn.is_turn_of(client_id);
        if roster == Roster::Active {
            self.game.turn.on_remove(&self.clients.active_ids(), client_id);
        }

        let Some(client) = self.clients.remove(client_id) else {
            return false;
        };
        info!("Disconnect from {}", client.addr);

        if roster == Roster::Active {
            if self.clients.active_len() == 0 {
                self.game.turn.clear();
            }
            if held_turn {
                self.turn_unannounced = true;
            }
            self.departures.push_back(client.name);
        }

        self.transport.close(client_id);
        true
    }

    /// Flushes announcements for players who left during the last event.
    ///
    /// The turn is re-announced only if nobody has announced it since its
    /// holder left; a guess that carried on after the removal already did.
    fn settle(&mut self) {
        while let Some(name) = self.departures.pop_front() {
            info!("{} left the game", name);
            self.broadcast(&Message::Goodbye { name }, None);
            if self.turn_unannounced {
                self.announce_turn();
            }
        }
    }
}
