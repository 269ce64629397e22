use std::cmp::Ordering;
use std::str::FromStr;

use crate::error::Error;

/// Value sent as `winner_id` when neither player won more games.
pub const TIE: &str = "tie";

/// One side of a game score: any run of digits, kept with leading zeros
/// stripped. Ordered like the number it spells.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Points(String);

impl Points {
    fn from_digits(digits: &str) -> Self {
        Points(digits.trim_start_matches('0').to_string())
    }

    pub fn as_str(&self) -> &str {
        if self.0.is_empty() {
            "0"
        } else {
            &self.0
        }
    }
}

impl Ord for Points {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Points {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<u64> for Points {
    fn from(value: u64) -> Self {
        Points::from_digits(&value.to_string())
    }
}

impl std::fmt::Display for Points {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One game of a match, written `x-y` with player 1's score first.
/// A missing side counts as zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Score {
    pub player1: Points,
    pub player2: Points,
}

impl Score {
    pub fn new(player1: impl Into<Points>, player2: impl Into<Points>) -> Self {
        Score {
            player1: player1.into(),
            player2: player2.into(),
        }
    }
}

impl FromStr for Score {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::validation("scores_csv", format!("`{s}` is not of the form x-y"));

        let (left, right) = s.split_once('-').ok_or_else(invalid)?;
        let side = |part: &str| {
            if part.chars().all(|c| c.is_ascii_digit()) {
                Ok(Points::from_digits(part))
            } else {
                Err(invalid())
            }
        };

        Ok(Score {
            player1: side(left)?,
            player2: side(right)?,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Player1,
    Player2,
    Tie,
}

/// Games won by each player. Drawn games count for neither.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub player1: usize,
    pub player2: usize,
}

impl Tally {
    pub fn of(scores: &[Score]) -> Self {
        scores.iter().fold(Tally::default(), |mut tally, score| {
            match score.player1.cmp(&score.player2) {
                Ordering::Greater => tally.player1 += 1,
                Ordering::Less => tally.player2 += 1,
                Ordering::Equal => {}
            }
            tally
        })
    }

    pub fn outcome(&self) -> Outcome {
        match self.player1.cmp(&self.player2) {
            Ordering::Greater => Outcome::Player1,
            Ordering::Less => Outcome::Player2,
            Ordering::Equal => Outcome::Tie,
        }
    }
}

/// An empty score list resolves to a tie.
pub fn resolve(scores: &[Score]) -> Outcome {
    Tally::of(scores).outcome()
}
