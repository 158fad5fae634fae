// Turns recognizer output ("knight f three", "e takes d five", "castle kingside") into SAN
// text that shakmaty can parse. Recognition itself belongs to the speech engine; this module
// only owns the word list the recognizer is constrained to and the word -> SAN mapping.

use crate::error::NotationError;

const FILES: [&str; 8] = ["a", "b", "c", "d", "e", "f", "g", "h"];
const NUMBERS: [&str; 8] = ["one", "two", "three", "four", "five", "six", "seven", "eight"];
const KEYWORDS: [&str; 11] = [
    "king", "queen", "bishop", "knight", "rook", "takes", "castle", "kingside", "queenside",
    "equals", "to",
];
// accepted by the normalizer but not part of the recognizer grammar
const ALIASES: [&str; 3] = ["short", "long", "x"];

/// Grammar handed to the recognizer: keywords followed by every "<file> <number>" pair.
pub fn vocabulary() -> Vec<String> {
    let mut words: Vec<String> = KEYWORDS.iter().map(|w| w.to_string()).collect();
    for number in NUMBERS {
        for file in FILES {
            words.push(format!("{file} {number}"));
        }
    }
    words
}

fn piece_letter(word: &str) -> Option<char> {
    match word {
        "king" => Some('K'),
        "queen" => Some('Q'),
        "rook" => Some('R'),
        "bishop" => Some('B'),
        "knight" => Some('N'),
        _ => None,
    }
}

fn rank_digit(word: &str) -> Option<char> {
    NUMBERS
        .iter()
        .position(|&n| n == word)
        .map(|i| (b'1' + i as u8) as char)
}

fn is_known(word: &str) -> bool {
    FILES.contains(&word)
        || NUMBERS.contains(&word)
        || KEYWORDS.contains(&word)
        || ALIASES.contains(&word)
        || (word.len() == 1 && word.as_bytes()[0].is_ascii_digit())
}

/// Normalize recognized words to SAN.
pub fn spoken_to_san(text: &str) -> Result<String, NotationError> {
    let words: Vec<String> = text.split_whitespace().map(|w| w.to_ascii_lowercase()).collect();
    if words.is_empty() {
        return Err(NotationError::Empty);
    }
    if let Some(unknown) = words.iter().find(|w| !is_known(w)) {
        return Err(NotationError::UnknownWord(unknown.clone()));
    }

    if words[0] == "castle" {
        let san = match words.get(1).map(String::as_str) {
            None | Some("kingside" | "short") => "O-O",
            Some("queenside" | "long") => "O-O-O",
            Some(other) => return Err(NotationError::UnknownWord(other.to_string())),
        };
        if let Some(extra) = words.get(2) {
            return Err(NotationError::UnknownWord(extra.clone()));
        }
        return Ok(san.to_string());
    }

    let mut san = String::new();
    for word in &words {
        let word = word.as_str();
        match word {
            "to" => {}
            "takes" | "x" => san.push('x'),
            "equals" => san.push('='),
            _ => {
                if let Some(piece) = piece_letter(word) {
                    san.push(piece);
                } else if let Some(digit) = rank_digit(word) {
                    san.push(digit);
                } else {
                    san.push_str(word);
                }
            }
        }
    }

    tracing::debug!(text, %san, "normalized spoken move");
    Ok(san)
}
