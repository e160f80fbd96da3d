//! Dice notation, roll requests and rolling.
//!
//! Notation is the familiar `NdS` with an optional `+M` or `-M` modifier,
//! e.g. `1d20`, `3d6+5`, `1d100-10`. A roll request may carry a target
//! value, in which case the result is also graded as a percentile skill
//! check with regular, hard and extreme success levels.

pub mod roll;

pub use roll::DiceResult;

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Upper bound on dice rolled by one expression.
pub const MAX_DICE: u32 = 1000;

/// A parsed dice expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notation {
    /// Number of dice.
    pub count: u32,
    /// Sides per die.
    pub sides: u32,
    /// Flat modifier added to the sum.
    pub modifier: i64,
}

impl Notation {
    /// Roll the dice using the given RNG, returning each die's value.
    pub fn roll(&self, rng: &mut StdRng) -> Vec<u32> {
        (0..self.count)
            .map(|_| rng.random_range(1..=self.sides))
            .collect()
    }
}

fn parse_number<T: FromStr>(digits: &str) -> Option<T> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl FromStr for Notation {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || EngineError::InvalidNotation(trimmed.to_string());
        let lower = trimmed.to_lowercase();

        let (count, rest) = lower.split_once('d').ok_or_else(invalid)?;
        let (sides, modifier) = match rest.find(['+', '-']) {
            Some(i) => rest.split_at(i),
            None => (rest, ""),
        };

        let count: u32 = parse_number(count).ok_or_else(invalid)?;
        let sides: u32 = parse_number(sides).ok_or_else(invalid)?;
        let modifier = match modifier.split_at_checked(1) {
            None => 0,
            Some(("+", digits)) => parse_number::<i64>(digits).ok_or_else(invalid)?,
            Some(("-", digits)) => -parse_number::<i64>(digits).ok_or_else(invalid)?,
            Some(_) => return Err(invalid()),
        };

        if count == 0 || count > MAX_DICE || sides == 0 {
            return Err(invalid());
        }
        Ok(Self {
            count,
            sides,
            modifier,
        })
    }
}

impl fmt::Display for Notation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, "+{m}"),
            m => write!(f, "{m}"),
        }
    }
}

/// Difficulty of a percentile check, also used as the achieved success level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Roll at or under the target.
    #[default]
    Regular,
    /// Roll at or under half the target.
    Hard,
    /// Roll at or under a fifth of the target.
    Extreme,
}

impl Difficulty {
    /// The highest roll that succeeds at this difficulty.
    pub fn threshold(self, target: i64) -> i64 {
        match self {
            Self::Regular => target,
            Self::Hard => target.div_euclid(2),
            Self::Extreme => target.div_euclid(5),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regular => write!(f, "regular"),
            Self::Hard => write!(f, "hard"),
            Self::Extreme => write!(f, "extreme"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "regular" => Ok(Self::Regular),
            "hard" => Ok(Self::Hard),
            "extreme" => Ok(Self::Extreme),
            other => Err(EngineError::InvalidNotation(format!(
                "unknown difficulty \"{other}\""
            ))),
        }
    }
}

/// A request to roll dice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiceRoll {
    /// Dice expression, e.g. `3d6+2`.
    pub notation: String,
    /// Why the roll is made.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Character making the roll.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_id: Option<String>,
    /// Extra modifier on top of the one in the notation.
    #[serde(default)]
    pub modifier: i64,
    /// Difficulty of the check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    /// Skill value to roll against; enables success grading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_value: Option<i64>,
}

impl DiceRoll {
    /// Create a roll request for the given notation.
    pub fn new(notation: impl Into<String>) -> Self {
        Self {
            notation: notation.into(),
            reason: None,
            character_id: None,
            modifier: 0,
            difficulty: None,
            target_value: None,
        }
    }

    /// Set the reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Set the rolling character.
    pub fn by(mut self, character_id: impl Into<String>) -> Self {
        self.character_id = Some(character_id.into());
        self
    }

    /// Set the extra modifier.
    pub fn with_modifier(mut self, modifier: i64) -> Self {
        self.modifier = modifier;
        self
    }

    /// Roll against a target value at the given difficulty.
    pub fn against(mut self, target_value: i64, difficulty: Difficulty) -> Self {
        self.target_value = Some(target_value);
        self.difficulty = Some(difficulty);
        self
    }

    /// Parse the notation.
    pub fn parsed(&self) -> EngineResult<Notation> {
        self.notation.parse()
    }

    /// Execute the roll.
    pub fn roll(&self, rng: &mut StdRng) -> EngineResult<DiceResult> {
        let notation = self.parsed()?;
        let rolls = notation.roll(rng);
        DiceResult::grade(self, notation, rolls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn parse_plain() {
        let n: Notation = "1d20".parse().unwrap();
        assert_eq!(
            n,
            Notation {
                count: 1,
                sides: 20,
                modifier: 0
            }
        );
    }

    #[test]
    fn parse_modifiers() {
        let n: Notation = "3d6+5".parse().unwrap();
        assert_eq!((n.count, n.sides, n.modifier), (3, 6, 5));
        let n: Notation = " 1D100-10 ".parse().unwrap();
        assert_eq!((n.count, n.sides, n.modifier), (1, 100, -10));
    }

    #[test]
    fn parse_rejects_garbage() {
        for bad in ["", "d20", "1d", "2x6", "1d6+", "1d6+-2", "0d6", "1d0", "1d6+2a", "-1d6"] {
            assert!(
                matches!(bad.parse::<Notation>(), Err(EngineError::InvalidNotation(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn display_round_trips() {
        for text in ["1d20", "3d6+5", "1d100-10"] {
            let n: Notation = text.parse().unwrap();
            assert_eq!(n.to_string(), text);
        }
    }

    #[test]
    fn roll_within_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        let n: Notation = "10d6".parse().unwrap();
        let rolls = n.roll(&mut rng);
        assert_eq!(rolls.len(), 10);
        assert!(rolls.iter().all(|v| (1..=6).contains(v)));
    }

    #[test]
    fn roll_deterministic_with_seed() {
        let request = DiceRoll::new("4d20+1");
        let a = request.roll(&mut StdRng::seed_from_u64(99)).unwrap();
        let b = request.roll(&mut StdRng::seed_from_u64(99)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn difficulty_thresholds() {
        assert_eq!(Difficulty::Regular.threshold(65), 65);
        assert_eq!(Difficulty::Hard.threshold(65), 32);
        assert_eq!(Difficulty::Extreme.threshold(65), 13);
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("easy".parse::<Difficulty>().is_err());
    }
}
