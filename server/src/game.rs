//! The running word game: target word, revealed mask, guesses and turn.

use crate::dictionary::WordSource;
use crate::turn::TurnOrder;
use log::info;
use shared::{Message, PLACEHOLDER};
use thiserror::Error;

/// Why a guess line was refused. Nothing in the game changes on rejection.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GuessRejection {
    #[error("guess out of turn")]
    NotYourTurn,
    #[error("not a lowercase letter")]
    InvalidLetter,
    #[error("more than one character")]
    NotSingleLetter,
    #[error("letter already guessed")]
    AlreadyGuessed,
}

impl From<GuessRejection> for Message {
    fn from(rejection: GuessRejection) -> Self {
        match rejection {
            GuessRejection::NotYourTurn => Message::NotYourTurn,
            GuessRejection::InvalidLetter => Message::InvalidLetter,
            GuessRejection::NotSingleLetter => Message::SingleLetter,
            GuessRejection::AlreadyGuessed => Message::AlreadyGuessed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    AwaitingGuess,
    Won,
    Lost,
}

/// Result of applying one accepted letter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuessOutcome {
    pub letter: char,
    pub revealed: usize,
}

impl GuessOutcome {
    pub fn is_hit(&self) -> bool {
        self.revealed > 0
    }
}

pub struct GameState {
    words: Box<dyn WordSource>,
    word: Vec<u8>,
    mask: Vec<u8>,
    guesses_left: u32,
    max_guesses: u32,
    guessed: [bool; 26],
    pub turn: TurnOrder,
}

impl GameState {
    /// Creates the game and draws the first word
    pub fn new(words: Box<dyn WordSource>, max_guesses: u32) -> Self {
        let mut game = Self {
            words,
            word: Vec::new(),
            mask: Vec::new(),
            guesses_left: max_guesses,
            max_guesses,
            guessed: [false; 26],
            turn: TurnOrder::new(),
        };
        game.draw_word();
        game
    }

    /// Starts a new round in place. The turn goes back to the head of
    /// `order`; players themselves are untouched.
    pub fn reset(&mut self, order: &[u32]) {
        self.draw_word();
        self.guesses_left = self.max_guesses;
        self.guessed = [false; 26];
        self.turn.restart(order);
        info!("New game");
    }

    fn draw_word(&mut self) {
        self.word = self.words.next_word().into_bytes();
        self.mask = vec![PLACEHOLDER as u8; self.word.len()];
    }

    /// Checks a complete guess line from `client_id`, returning the letter
    pub fn validate_guess(&self, client_id: u32, line: &str) -> Result<char, GuessRejection> {
        if !self.turn.is_turn_of(client_id) {
            return Err(GuessRejection::NotYourTurn);
        }

        let mut chars = line.chars();
        let letter = match chars.next() {
            Some(c) if c.is_ascii_lowercase() => c,
            _ => return Err(GuessRejection::InvalidLetter),
        };
        if chars.next().is_some() {
            return Err(GuessRejection::NotSingleLetter);
        }
        if self.is_guessed(letter) {
            return Err(GuessRejection::AlreadyGuessed);
        }
        Ok(letter)
    }

    /// Records `letter` and reveals every hidden position holding it.
    ///
    /// A guess that reveals nothing costs one of the shared guesses. The
    /// caller is expected to have run `validate_guess` first.
    pub fn apply_guess(&mut self, letter: char) -> GuessOutcome {
        let Some(index) = letter_index(letter) else {
            return GuessOutcome {
                letter,
                revealed: 0,
            };
        };
        self.guessed[index] = true;

        let target = letter as u8;
        let mut revealed = 0;
        for (slot, &actual) in self.mask.iter_mut().zip(self.word.iter()) {
            if *slot == PLACEHOLDER as u8 && actual == target {
                *slot = actual;
                revealed += 1;
            }
        }

        if revealed == 0 {
            self.guesses_left = self.guesses_left.saturating_sub(1);
        }
        GuessOutcome { letter, revealed }
    }

    pub fn round_state(&self) -> RoundState {
        if self.mask == self.word {
            RoundState::Won
        } else if self.guesses_left == 0 {
            RoundState::Lost
        } else {
            RoundState::AwaitingGuess
        }
    }

    pub fn is_guessed(&self, letter: char) -> bool {
        letter_index(letter).is_some_and(|index| self.guessed[index])
    }

    pub fn letters_guessed(&self) -> Vec<char> {
        (b'a'..=b'z')
            .map(char::from)
            .filter(|&c| self.is_guessed(c))
            .collect()
    }

    pub fn word(&self) -> &str {
        std::str::from_utf8(&self.word).unwrap_or_default()
    }

    pub fn mask(&self) -> &str {
        std::str::from_utf8(&self.mask).unwrap_or_default()
    }

    pub fn guesses_left(&self) -> u32 {
        self.guesses_left
    }

    pub fn max_guesses(&self) -> u32 {
        self.max_guesses
    }

    /// Summary sent to players on join and after each guess
    pub fn status(&self) -> Message {
        Message::Status {
            mask: self.mask().to_string(),
            guesses_left: self.guesses_left,
            letters: self.letters_guessed(),
        }
    }
}

fn letter_index(letter: char) -> Option<usize> {
    letter
        .is_ascii_lowercase()
        .then(|| (letter as u8 - b'a') as usize)
}
