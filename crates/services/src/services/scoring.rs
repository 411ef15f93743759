//! Pure scoring: maps a normalized lifestyle answer record to the composite
//! testosterone index and its categorical outputs.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

use super::quiz_engine::AnswerMap;

const DEFAULT_AGE: f64 = 30.0;
const DEFAULT_WEIGHT: f64 = 75.0;
const DEFAULT_HEIGHT: f64 = 175.0;
const DEFAULT_SLEEP_HOURS: f64 = 7.0;
const DEFAULT_SCALE_VALUE: f64 = 5.0;

/// Four-step category used for 1-10 scale answers and the testosterone estimate
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ScaleLevel {
    VeryLow,
    Low,
    Normal,
    High,
}

/// Overall risk classification derived from the composite score
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    Elevated,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
pub struct TestosteroneEstimate {
    /// Estimated total testosterone in ng/dL
    pub value: f64,
    pub level: ScaleLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct ScoreResult {
    /// Composite index in [0, 100]
    pub total_score: f64,
    pub estimated_testosterone: TestosteroneEstimate,
    pub level: RiskLevel,
    pub recommended_tier: String,
}

/// Fixed-shape scoring input derived from the raw answer map.
///
/// Categorical answers stay as lowercase strings; the two 1-10 scales are
/// pre-mapped to levels and alcohol to its weekly-drinks proxy.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedQuizData {
    pub age: f64,
    pub weight: f64,
    pub height: f64,
    pub training_frequency: String,
    pub training_type: String,
    pub sleep_hours: f64,
    pub diet: String,
    pub weekly_drinks: f64,
    pub nicotine: String,
    pub libido: ScaleLevel,
    pub morning_erections: String,
    pub morning_energy: ScaleLevel,
    pub recovery: String,
    pub mood: String,
}

impl NormalizedQuizData {
    /// Total over any answer map: missing or non-finite numerics fall back to
    /// the documented defaults, missing categoricals to the empty string.
    pub fn from_answers(answers: &AnswerMap) -> Self {
        Self {
            age: number_or(answers, "age", DEFAULT_AGE),
            weight: number_or(answers, "weight", DEFAULT_WEIGHT),
            height: number_or(answers, "height", DEFAULT_HEIGHT),
            training_frequency: category(answers, "training_frequency"),
            training_type: category(answers, "training_type"),
            sleep_hours: number_or(answers, "sleep_hours", DEFAULT_SLEEP_HOURS),
            diet: category(answers, "diet"),
            weekly_drinks: alcohol_to_weekly_drinks(&category(answers, "alcohol")),
            nicotine: category(answers, "nicotine"),
            libido: scale_to_level(number_or(answers, "libido", DEFAULT_SCALE_VALUE)),
            morning_erections: category(answers, "morning_erections"),
            morning_energy: scale_to_level(number_or(
                answers,
                "morning_energy",
                DEFAULT_SCALE_VALUE,
            )),
            recovery: category(answers, "recovery"),
            mood: category(answers, "mood"),
        }
    }
}

fn number_or(answers: &AnswerMap, id: &str, default: f64) -> f64 {
    answers
        .get(id)
        .and_then(|value| value.as_number())
        .filter(|n| n.is_finite())
        .unwrap_or(default)
}

fn category(answers: &AnswerMap, id: &str) -> String {
    answers
        .get(id)
        .and_then(|value| value.as_text())
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// Weekly-drinks proxy for the categorical alcohol answer.
/// Unrecognized categories map to 0.
pub fn alcohol_to_weekly_drinks(alcohol: &str) -> f64 {
    match alcohol {
        "never" => 0.0,
        "rarely" => 2.0,
        "weekly" => 5.0,
        "often" => 10.0,
        _ => 0.0,
    }
}

/// 1-10 scale to level, inclusive lower bounds: >=8 high, >=5 normal, >=3 low.
pub fn scale_to_level(value: f64) -> ScaleLevel {
    if value >= 8.0 {
        ScaleLevel::High
    } else if value >= 5.0 {
        ScaleLevel::Normal
    } else if value >= 3.0 {
        ScaleLevel::Low
    } else {
        ScaleLevel::VeryLow
    }
}

/// Deterministic composite score: start at 100, apply per-factor deltas,
/// clamp to [0, 100], then derive the categorical outputs.
pub fn calculate_score(input: &NormalizedQuizData) -> ScoreResult {
    let mut score = 100.0;
    score += age_delta(input.age);
    score += bmi_delta(input.weight, input.height);
    score += training_frequency_delta(&input.training_frequency);
    score += training_type_delta(&input.training_type);
    score += sleep_delta(input.sleep_hours);
    score += diet_delta(&input.diet);
    score -= input.weekly_drinks;
    score += nicotine_delta(&input.nicotine);
    score += libido_delta(input.libido);
    score += morning_erections_delta(&input.morning_erections);
    score += energy_delta(input.morning_energy);
    score += recovery_delta(&input.recovery);
    score += mood_delta(&input.mood);

    let total_score = score.clamp(0.0, 100.0);
    let value = (250.0 + 5.5 * total_score).round();
    let level = risk_level(total_score);

    ScoreResult {
        total_score,
        estimated_testosterone: TestosteroneEstimate {
            value,
            level: testosterone_level(value),
        },
        level,
        recommended_tier: recommended_tier(level).to_string(),
    }
}

fn age_delta(age: f64) -> f64 {
    if age < 30.0 {
        0.0
    } else if age < 40.0 {
        -4.0
    } else if age < 50.0 {
        -8.0
    } else if age < 60.0 {
        -12.0
    } else {
        -16.0
    }
}

fn bmi_delta(weight: f64, height: f64) -> f64 {
    let meters = height / 100.0;
    if meters <= 0.0 {
        return 0.0;
    }
    let bmi = weight / (meters * meters);
    if bmi < 18.5 {
        -4.0
    } else if bmi < 25.0 {
        0.0
    } else if bmi < 30.0 {
        -5.0
    } else {
        -10.0
    }
}

fn training_frequency_delta(frequency: &str) -> f64 {
    match frequency {
        "none" => -10.0,
        "1-2" => -4.0,
        "3-4" => 4.0,
        "5+" => 2.0,
        _ => 0.0,
    }
}

fn training_type_delta(kind: &str) -> f64 {
    match kind {
        "strength" => 3.0,
        "mixed" => 2.0,
        _ => 0.0,
    }
}

fn sleep_delta(hours: f64) -> f64 {
    if hours >= 7.5 {
        4.0
    } else if hours >= 6.5 {
        0.0
    } else if hours >= 5.5 {
        -6.0
    } else {
        -12.0
    }
}

fn diet_delta(diet: &str) -> f64 {
    match diet {
        "high-protein" => 3.0,
        "balanced" => 1.0,
        "vegetarian" => -2.0,
        "fast-food" => -8.0,
        _ => 0.0,
    }
}

fn nicotine_delta(nicotine: &str) -> f64 {
    match nicotine {
        "former" => -2.0,
        "sometimes" => -5.0,
        "daily" => -8.0,
        _ => 0.0,
    }
}

fn libido_delta(level: ScaleLevel) -> f64 {
    match level {
        ScaleLevel::High => 4.0,
        ScaleLevel::Normal => 0.0,
        ScaleLevel::Low => -6.0,
        ScaleLevel::VeryLow => -10.0,
    }
}

fn morning_erections_delta(frequency: &str) -> f64 {
    match frequency {
        "daily" => 4.0,
        "often" => 0.0,
        "rarely" => -6.0,
        "never" => -10.0,
        _ => 0.0,
    }
}

fn energy_delta(level: ScaleLevel) -> f64 {
    match level {
        ScaleLevel::High => 3.0,
        ScaleLevel::Normal => 0.0,
        ScaleLevel::Low => -4.0,
        ScaleLevel::VeryLow => -8.0,
    }
}

fn recovery_delta(recovery: &str) -> f64 {
    match recovery {
        "fast" => 3.0,
        "slow" => -5.0,
        _ => 0.0,
    }
}

fn mood_delta(mood: &str) -> f64 {
    match mood {
        "stable" => 2.0,
        "swings" => -3.0,
        "irritable" => -4.0,
        "low" => -6.0,
        _ => 0.0,
    }
}

fn risk_level(score: f64) -> RiskLevel {
    if score >= 75.0 {
        RiskLevel::Low
    } else if score >= 50.0 {
        RiskLevel::Moderate
    } else if score >= 25.0 {
        RiskLevel::Elevated
    } else {
        RiskLevel::High
    }
}

fn testosterone_level(value: f64) -> ScaleLevel {
    if value >= 600.0 {
        ScaleLevel::High
    } else if value >= 450.0 {
        ScaleLevel::Normal
    } else if value >= 350.0 {
        ScaleLevel::Low
    } else {
        ScaleLevel::VeryLow
    }
}

fn recommended_tier(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "foundation",
        RiskLevel::Moderate => "performance",
        RiskLevel::Elevated | RiskLevel::High => "total",
    }
}
