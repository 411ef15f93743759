//! Static quiz catalog: the fixed ordered sequence of questions and info slides.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

/// Input kind of a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum QuestionType {
    Slider,
    Buttons,
    Text,
    Email,
}

/// One selectable option of a buttons question
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct AnswerOption {
    pub value: String,
    pub label: String,
}

/// Constraint set for a question; which fields apply depends on the type
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct QuestionConstraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub options: Vec<AnswerOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Question {
    pub id: String,
    pub question_type: QuestionType,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub constraints: QuestionConstraints,
    pub required: bool,
}

/// Informational interstitial; carries no answer, only advances traversal
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct InfoSlide {
    pub id: String,
    pub icon: String,
    pub title: String,
    pub body: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cta_label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum QuizItem {
    Question(Question),
    Info(InfoSlide),
}

impl QuizItem {
    pub fn id(&self) -> &str {
        match self {
            QuizItem::Question(q) => &q.id,
            QuizItem::Info(i) => &i.id,
        }
    }

    pub fn as_question(&self) -> Option<&Question> {
        match self {
            QuizItem::Question(q) => Some(q),
            QuizItem::Info(_) => None,
        }
    }
}

static ITEMS: Lazy<Vec<QuizItem>> = Lazy::new(build_items);

/// The fixed item sequence. Order determines step count and progress.
pub fn quiz_items() -> &'static [QuizItem] {
    &ITEMS
}

pub fn item_count() -> usize {
    ITEMS.len()
}

pub fn find_question(id: &str) -> Option<&'static Question> {
    ITEMS.iter().find_map(|item| match item {
        QuizItem::Question(q) if q.id == id => Some(q),
        _ => None,
    })
}

fn build_items() -> Vec<QuizItem> {
    vec![
        info(
            "intro",
            "bolt",
            "Your testosterone index in 3 minutes",
            &[
                "Answer a few questions about your body and lifestyle.",
                "We calculate your personal testosterone index and show you where you stand.",
                "No lab values needed, your answers are enough for a first estimate.",
            ],
            Some("Start"),
        ),
        text_question("first_name", "What is your first name?", "Your first name"),
        email_question(
            "email",
            "Where should we send your results?",
            "you@example.com",
        ),
        slider("age", "How old are you?", None, 18.0, 80.0, 1.0, "years"),
        slider(
            "height",
            "How tall are you?",
            None,
            150.0,
            210.0,
            1.0,
            "cm",
        ),
        slider(
            "weight",
            "How much do you weigh?",
            None,
            50.0,
            160.0,
            1.0,
            "kg",
        ),
        info(
            "training_fact",
            "dumbbell",
            "Training moves the needle",
            &[
                "Heavy compound lifts are one of the strongest natural testosterone signals.",
                "The next questions tell us how your current routine stacks up.",
            ],
            None,
        ),
        buttons(
            "training_frequency",
            "How often do you train per week?",
            Some("Any intentional exercise counts"),
            &[
                ("none", "Not at all"),
                ("1-2", "1-2 times"),
                ("3-4", "3-4 times"),
                ("5+", "5 times or more"),
            ],
        ),
        buttons(
            "training_type",
            "What kind of training do you mostly do?",
            None,
            &[
                ("strength", "Strength training"),
                ("cardio", "Cardio / endurance"),
                ("mixed", "A mix of both"),
                ("none", "I don't train"),
            ],
        ),
        slider(
            "sleep_hours",
            "How many hours do you sleep on a typical night?",
            None,
            4.0,
            10.0,
            0.5,
            "hours",
        ),
        buttons(
            "diet",
            "Which best describes your diet?",
            None,
            &[
                ("balanced", "Balanced home cooking"),
                ("high-protein", "High protein, whole foods"),
                ("vegetarian", "Vegetarian / vegan"),
                ("fast-food", "Mostly fast food or takeout"),
            ],
        ),
        buttons(
            "alcohol",
            "How often do you drink alcohol?",
            None,
            &[
                ("never", "Never"),
                ("rarely", "A few times a month"),
                ("weekly", "Every week"),
                ("often", "Several times a week"),
            ],
        ),
        buttons(
            "nicotine",
            "Do you use nicotine?",
            Some("Cigarettes, vapes, snus or pouches"),
            &[
                ("never", "Never"),
                ("former", "I quit"),
                ("sometimes", "Occasionally"),
                ("daily", "Daily"),
            ],
        ),
        info(
            "body_signals",
            "pulse",
            "Your body keeps score",
            &[
                "Libido, morning erections and energy are direct readouts of your hormonal state.",
                "Be honest here, the index is only as good as your answers.",
            ],
            None,
        ),
        slider(
            "libido",
            "How would you rate your libido?",
            Some("1 = none at all, 10 = very strong"),
            1.0,
            10.0,
            1.0,
            "",
        ),
        buttons(
            "morning_erections",
            "How often do you wake up with an erection?",
            None,
            &[
                ("daily", "Almost every morning"),
                ("often", "A few times a week"),
                ("rarely", "A few times a month"),
                ("never", "Practically never"),
            ],
        ),
        slider(
            "morning_energy",
            "How energetic do you feel in the morning?",
            Some("1 = exhausted, 10 = fully charged"),
            1.0,
            10.0,
            1.0,
            "",
        ),
        buttons(
            "recovery",
            "How fast do you recover from a hard workout?",
            None,
            &[
                ("fast", "A day is enough"),
                ("normal", "Two days or so"),
                ("slow", "I'm sore for days"),
            ],
        ),
        buttons(
            "mood",
            "How has your mood been lately?",
            None,
            &[
                ("stable", "Stable and motivated"),
                ("swings", "Up and down"),
                ("irritable", "Short-tempered"),
                ("low", "Flat and unmotivated"),
            ],
        ),
        info(
            "almost_done",
            "chart",
            "That's everything",
            &[
                "We'll crunch your answers into your personal testosterone index.",
                "Your detailed results and recommended program are one tap away.",
            ],
            Some("Show my results"),
        ),
    ]
}

fn slider(
    id: &str,
    prompt: &str,
    subtitle: Option<&str>,
    min: f64,
    max: f64,
    step: f64,
    unit: &str,
) -> QuizItem {
    QuizItem::Question(Question {
        id: id.to_string(),
        question_type: QuestionType::Slider,
        prompt: prompt.to_string(),
        subtitle: subtitle.map(str::to_string),
        constraints: QuestionConstraints {
            min: Some(min),
            max: Some(max),
            step: Some(step),
            unit: (!unit.is_empty()).then(|| unit.to_string()),
            ..Default::default()
        },
        required: true,
    })
}

fn buttons(
    id: &str,
    prompt: &str,
    subtitle: Option<&str>,
    options: &[(&str, &str)],
) -> QuizItem {
    QuizItem::Question(Question {
        id: id.to_string(),
        question_type: QuestionType::Buttons,
        prompt: prompt.to_string(),
        subtitle: subtitle.map(str::to_string),
        constraints: QuestionConstraints {
            options: options
                .iter()
                .map(|(value, label)| AnswerOption {
                    value: value.to_string(),
                    label: label.to_string(),
                })
                .collect(),
            ..Default::default()
        },
        required: true,
    })
}

fn text_question(id: &str, prompt: &str, placeholder: &str) -> QuizItem {
    QuizItem::Question(Question {
        id: id.to_string(),
        question_type: QuestionType::Text,
        prompt: prompt.to_string(),
        subtitle: None,
        constraints: QuestionConstraints {
            placeholder: Some(placeholder.to_string()),
            ..Default::default()
        },
        required: true,
    })
}

fn email_question(id: &str, prompt: &str, placeholder: &str) -> QuizItem {
    QuizItem::Question(Question {
        id: id.to_string(),
        question_type: QuestionType::Email,
        prompt: prompt.to_string(),
        subtitle: None,
        constraints: QuestionConstraints {
            placeholder: Some(placeholder.to_string()),
            ..Default::default()
        },
        required: true,
    })
}

fn info(id: &str, icon: &str, title: &str, body: &[&str], cta: Option<&str>) -> QuizItem {
    QuizItem::Info(InfoSlide {
        id: id.to_string(),
        icon: icon.to_string(),
        title: title.to_string(),
        body: body.iter().map(|line| line.to_string()).collect(),
        cta_label: cta.map(str::to_string),
    })
}
