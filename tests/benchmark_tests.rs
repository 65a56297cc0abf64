//! Performance benchmarks for the hot paths of the word game server

use server::config::ServerConfig;
use server::dictionary::{WordList, WordSource};
use server::error::SendError;
use server::game::GameState;
use server::line_buffer::LineBuffer;
use server::session::{Session, Transport};
use server::turn::TurnOrder;
use shared::Message;
use std::net::SocketAddr;
use std::time::Instant;

/// Transport that accepts everything and only counts
#[derive(Default)]
struct CountingTransport {
    sent: usize,
    bytes: usize,
}

impl Transport for CountingTransport {
    fn send(&mut self, _client_id: u32, message: &Message) -> Result<(), SendError> {
        // Render like the real transport would
        self.bytes += message.to_string().len();
        self.sent += 1;
        Ok(())
    }

    fn close(&mut self, _client_id: u32) {}
}

fn addr() -> SocketAddr {
    "127.0.0.1:9000".parse().unwrap()
}

/// Benchmarks reassembly of many small lines arriving one byte at a time
#[test]
fn benchmark_line_reassembly() {
    let iterations = 100_000;
    let mut buffer = LineBuffer::new(256);
    let start = Instant::now();

    let mut lines = 0;
    for _ in 0..iterations {
        for byte in b"e\r\n" {
            buffer.append(std::slice::from_ref(byte));
            while let Ok(Some(_)) = buffer.next_line() {
                lines += 1;
            }
        }
    }

    let duration = start.elapsed();
    println!(
        "Line reassembly: {} lines in {:?} ({:.2} ns/line)",
        lines,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert_eq!(lines, iterations);
    assert_eq!(buffer.pending(), 0);
    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks splitting one large read holding many lines
#[test]
fn benchmark_batched_lines() {
    let batch: Vec<u8> = b"guess\r\n".repeat(10_000);
    let mut buffer = LineBuffer::new(256);
    let start = Instant::now();

    buffer.append(&batch);
    let mut lines = 0;
    while let Ok(Some(line)) = buffer.next_line() {
        assert_eq!(line, "guess");
        lines += 1;
    }

    let duration = start.elapsed();
    println!("Batched lines: {} lines in {:?}", lines, duration);

    assert_eq!(lines, 10_000);
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks turn rotation over a crowded table
#[test]
fn benchmark_turn_rotation() {
    let order: Vec<u32> = (1..=64).collect();
    let mut turn = TurnOrder::new();
    turn.begin(&order);

    let iterations = 100_000;
    let start = Instant::now();
    for _ in 0..iterations {
        turn.advance(&order);
    }
    let duration = start.elapsed();

    println!(
        "Turn rotation: {} advances over {} players in {:?}",
        iterations,
        order.len(),
        duration
    );

    assert_eq!(turn.current(), Some(order[iterations % order.len()]));
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks whole rounds played through the game state alone
#[test]
fn benchmark_game_rounds() {
    let mut game = GameState::new(
        Box::new(WordList::sequential(["wordgame", "server", "letters"])),
        26,
    );
    let order = [1u32];
    game.reset(&order);

    let rounds = 10_000;
    let start = Instant::now();
    for _ in 0..rounds {
        for letter in 'a'..='z' {
            if game.is_guessed(letter) {
                continue;
            }
            game.apply_guess(letter);
        }
        assert_eq!(game.guesses_left(), game.max_guesses() - (26 - distinct(game.word())));
        game.reset(&order);
    }
    let duration = start.elapsed();

    println!("Game rounds: {} rounds in {:?}", rounds, duration);
    assert!(duration.as_millis() < 5000);
}

fn distinct(word: &str) -> u32 {
    let mut seen = [false; 26];
    for byte in word.bytes() {
        seen[(byte - b'a') as usize] = true;
    }
    seen.iter().filter(|&&s| s).count() as u32
}

/// Benchmarks guesses flowing through a session with many players
#[test]
fn benchmark_session_guesses() {
    let config = ServerConfig::default();
    let mut session = Session::new(
        config,
        Box::new(WordList::sequential(["zzzz"])),
        CountingTransport::default(),
    );

    let players = 32u32;
    for id in 1..=players {
        session.connect(id, addr());
        session.receive(id, format!("player{id}\r\n").as_bytes());
    }
    assert_eq!(session.clients().active_len(), players as usize);

    let iterations = 2_000;
    let start = Instant::now();
    for _ in 0..iterations {
        let Some(current) = session.game().turn.current() else {
            panic!("No turn holder with players seated");
        };
        // Always a miss, so the turn keeps moving and rounds keep resetting
        let letter = ('a'..='y')
            .find(|&letter| !session.game().is_guessed(letter))
            .unwrap_or('a');
        session.receive(current, format!("{letter}\r\n").as_bytes());
    }
    let duration = start.elapsed();

    println!(
        "Session guesses: {} guesses to {} players in {:?}, {} messages ({} bytes)",
        iterations,
        players,
        duration,
        session.transport().sent,
        session.transport().bytes
    );

    assert_eq!(session.clients().active_len(), players as usize);
    assert!(session.transport().sent > iterations);
    assert!(duration.as_millis() < 5000);
}

/// Benchmarks drawing words from a list that keeps rewinding
#[test]
fn benchmark_word_draws() {
    let words: Vec<String> = (0..100).map(|i| format!("word{}", "a".repeat(i % 20))).collect();
    let mut list = WordList::sequential(words);

    let iterations = 100_000;
    let start = Instant::now();
    for _ in 0..iterations {
        assert!(!list.next_word().is_empty());
    }
    let duration = start.elapsed();

    println!("Word draws: {} draws in {:?}", iterations, duration);
    assert!(duration.as_millis() < 2000);
}
