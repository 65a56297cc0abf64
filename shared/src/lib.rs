use std::fmt;

pub const DEFAULT_PORT: u16 = 53744;
pub const MAX_GUESSES: u32 = 4;
pub const MAX_NAME: usize = 30;
pub const MAX_WORD: usize = 30;
pub const MAX_BUF: usize = 256;
pub const LINE_END: &str = "\r\n";
pub const PLACEHOLDER: char = '-';

/// Every line the server can send to a client.
///
/// `Display` renders the exact wire text, terminator included, so callers
/// write `message.to_string()` straight onto the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Welcome,
    ServerFull,
    LineTooLong,

    NameEmpty,
    NameTooLong,
    NameTaken,
    Joined {
        name: String,
    },
    Goodbye {
        name: String,
    },

    Status {
        mask: String,
        guesses_left: u32,
        letters: Vec<char>,
    },
    YourGuess,
    TurnOf {
        name: String,
    },

    NotYourTurn,
    InvalidLetter,
    SingleLetter,
    AlreadyGuessed,

    Guessed {
        name: String,
        letter: char,
    },
    NotInWord {
        letter: char,
    },

    WordWas {
        word: String,
    },
    YouWin,
    WinnerIs {
        name: String,
    },
    RoundLost {
        word: String,
    },
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Welcome => write!(f, "Welcome to our word game. What is your name?{LINE_END}"),
            Message::ServerFull => write!(f, "Server full{LINE_END}"),
            Message::LineTooLong => write!(f, "Line too long, goodbye{LINE_END}"),
            Message::NameEmpty => write!(f, "Please enter a valid username{LINE_END}"),
            Message::NameTooLong => write!(f, "Please enter a shorter username{LINE_END}"),
            Message::NameTaken => write!(f, "Please enter a not used username{LINE_END}"),
            Message::Joined { name } => write!(f, "{name} has joined.{LINE_END}"),
            Message::Goodbye { name } => write!(f, "Goodbye {name}{LINE_END}"),
            Message::Status {
                mask,
                guesses_left,
                letters,
            } => {
                write!(f, "***************{LINE_END}")?;
                write!(f, "Word to guess: {mask}{LINE_END}")?;
                write!(f, "Guesses remaining: {guesses_left}{LINE_END}")?;
                write!(f, "Letters guessed: {LINE_END}")?;
                for letter in letters {
                    write!(f, "{letter} ")?;
                }
                write!(f, "{LINE_END}***************{LINE_END}")
            }
            Message::YourGuess => write!(f, "Your guess?{LINE_END}"),
            Message::TurnOf { name } => write!(f, "It's {name}'s turn{LINE_END}"),
            Message::NotYourTurn => write!(f, "It's not your turn to guess{LINE_END}"),
            Message::InvalidLetter => write!(f, "Please enter a valid letter{LINE_END}"),
            Message::SingleLetter => write!(f, "Please enter a single letter{LINE_END}"),
            Message::AlreadyGuessed => {
                write!(f, "Please enter a letter that is not guessed{LINE_END}")
            }
            Message::Guessed { name, letter } => write!(f, "{name} guesses: {letter}{LINE_END}"),
            Message::NotInWord { letter } => write!(f, "{letter} not in the word{LINE_END}"),
            Message::WordWas { word } => write!(f, "The word was {word}{LINE_END}"),
            Message::YouWin => {
                write!(f, "Game over! You win!{LINE_END}{LINE_END}Let's start a new game{LINE_END}")
            }
            Message::WinnerIs { name } => write!(
                f,
                "Game over! {name} won!{LINE_END}{LINE_END}Let's start a new game{LINE_END}"
            ),
            Message::RoundLost { word } => write!(
                f,
                "The word is {word}{LINE_END}No guesses left. Game over.{LINE_END}{LINE_END}Let's start a new game{LINE_END}"
            ),
        }
    }
}

/// Splits a chunk of server output into its lines, dropping the terminators.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split(LINE_END).filter(|line| !line.is_empty())
}
