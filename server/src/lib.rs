//! # Word Game Server Library
//!
//! This library implements a turn-based, multi-player word guessing game
//! served over TCP. Players connect, pick a unique name, and then take
//! turns guessing letters of a hidden word while sharing a single pool of
//! remaining guesses.
//!
//! ## Core Responsibilities
//!
//! ### Line Reassembly
//! TCP gives no message boundaries. Every connection owns a bounded buffer
//! that collects bytes until a full line has arrived, so a guess split over
//! several packets, or several guesses packed into one, are handled alike.
//!
//! ### Client Management
//! Connections start out pending and only join the game (broadcasts and the
//! turn rotation) once they supply a name nobody else is using. Disconnects
//! can happen at any moment, including in the middle of a broadcast or while
//! the leaving player holds the turn.
//!
//! ### Game Rules
//! A correct letter reveals every matching position and lets the guesser go
//! again. A miss costs one shared guess and passes the turn. The round ends
//! when the word is fully revealed or the guesses run out; a new word is then
//! drawn and play restarts at the head of the player list.
//!
//! ## Architecture Design
//!
//! ### Single Control Flow
//! Each connection gets a reader task and a writer task, but neither touches
//! game state. Readers push raw bytes into one channel and a single loop
//! applies them to the [`session::Session`] in arrival order. This keeps all
//! mutation on one task without locks.
//!
//! ### Stable Turn References
//! The turn is stored as a client ID and resolved against the current player
//! order on demand, so removing players can never leave it dangling.
//!
//! ## Module Organization
//!
//! - `line_buffer`: per-connection line reassembly
//! - `client_manager`: pending and active rosters
//! - `turn`: round-robin turn bookkeeping
//! - `game`: word, mask, guesses and round outcome
//! - `dictionary`: word sources
//! - `session`: name registration, guess handling and broadcasts
//! - `network`: TCP accept loop and per-connection tasks
//! - `config`, `error`: limits and error types
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::dictionary::WordList;
//! use server::network::{ChannelTransport, Server};
//! use server::session::Session;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let words = WordList::load("words.txt")?;
//!     let session = Session::new(
//!         ServerConfig::default(),
//!         Box::new(words),
//!         ChannelTransport::new(),
//!     );
//!
//!     let server = Server::bind("127.0.0.1:53744", session).await?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod game;
pub mod line_buffer;
pub mod network;
pub mod session;
pub mod turn;
