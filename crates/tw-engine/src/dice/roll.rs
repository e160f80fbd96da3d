//! Dice roll results and percentile check grading.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{DiceRoll, Difficulty, Notation};
use crate::error::{EngineError, EngineResult};

/// The outcome of a [`DiceRoll`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiceResult {
    /// Notation as requested.
    pub notation: String,
    /// Individual die values.
    pub rolls: Vec<u32>,
    /// Sum of the dice.
    pub total: i64,
    /// Notation modifier plus the request's extra modifier.
    pub modifier: i64,
    /// `total + modifier`.
    pub final_result: i64,
    /// Whether the check succeeded at the requested difficulty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    /// A natural 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_success: Option<bool>,
    /// A 100, or 96 and above against a target under 50.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_failure: Option<bool>,
    /// Best level achieved, `None` on failure or without a target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_level: Option<Difficulty>,
    /// Reason copied from the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Rolling character copied from the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_id: Option<String>,
}

impl DiceResult {
    /// Build the result for already rolled dice, grading it when the
    /// request has a target value.
    ///
    /// Fails with [`EngineError::InvalidNotation`] when the modifiers push
    /// the result out of `i64` range.
    pub fn grade(request: &DiceRoll, notation: Notation, rolls: Vec<u32>) -> EngineResult<Self> {
        let out_of_range = || {
            EngineError::InvalidNotation(format!("{}: modifier out of range", request.notation))
        };
        let total: i64 = rolls.iter().map(|&v| i64::from(v)).sum();
        let modifier = notation
            .modifier
            .checked_add(request.modifier)
            .ok_or_else(out_of_range)?;
        let final_result = total.checked_add(modifier).ok_or_else(out_of_range)?;

        let mut result = Self {
            notation: request.notation.clone(),
            rolls,
            total,
            modifier,
            final_result,
            success: None,
            critical_success: None,
            critical_failure: None,
            success_level: None,
            reason: request.reason.clone(),
            character_id: request.character_id.clone(),
        };

        if let Some(target) = request.target_value {
            let difficulty = request.difficulty.unwrap_or_default();
            result.success = Some(final_result <= difficulty.threshold(target));
            result.critical_success = Some(final_result == 1);
            result.critical_failure = Some(is_fumble(final_result, target));
            result.success_level = success_level(final_result, target);
        }
        Ok(result)
    }

    /// True if the check succeeded; false without a target.
    pub fn succeeded(&self) -> bool {
        self.success == Some(true)
    }
}

fn is_fumble(roll: i64, target: i64) -> bool {
    roll == 100 || (target < 50 && roll >= 96)
}

fn success_level(roll: i64, target: i64) -> Option<Difficulty> {
    [Difficulty::Extreme, Difficulty::Hard, Difficulty::Regular]
        .into_iter()
        .find(|level| roll <= level.threshold(target))
}

impl fmt::Display for DiceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<String> = self.rolls.iter().map(u32::to_string).collect();
        write!(f, "{} [{}]", self.notation, values.join(", "))?;
        if self.modifier != 0 {
            write!(f, " {:+}", self.modifier)?;
        }
        write!(f, " = {}", self.final_result)?;
        match (self.success_level, self.success) {
            (_, None) => Ok(()),
            _ if self.critical_success == Some(true) => write!(f, " (critical success)"),
            _ if self.critical_failure == Some(true) => write!(f, " (fumble)"),
            (Some(level), Some(true)) => write!(f, " ({level} success)"),
            (_, Some(_)) => write!(f, " (failure)"),
        }
    }
}
