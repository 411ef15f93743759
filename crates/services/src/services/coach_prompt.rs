//! Coach system prompt assembly from typed context sections.

use chrono::Timelike;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::knowledge_base;

/// Read-only snapshot of who the coach is talking to
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UserContext {
    pub first_name: String,
    #[serde(default)]
    pub program_day: Option<u32>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub capsules_remaining: Option<u32>,
}

/// Completion state of today's program tasks
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct DailyTaskStatus {
    pub meals_completed: u32,
    pub meals_planned: u32,
    pub workout_done: bool,
    pub sleep_logged: bool,
    pub capsules_taken: bool,
}

/// Today's plan, when the program has one scheduled
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ProgramContext {
    #[serde(default)]
    pub calories: Option<u32>,
    #[serde(default)]
    pub protein_g: Option<u32>,
    #[serde(default)]
    pub carbs_g: Option<u32>,
    #[serde(default)]
    pub fat_g: Option<u32>,
    #[serde(default)]
    pub meals: Vec<String>,
    #[serde(default)]
    pub workout: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CoachContext {
    pub user: UserContext,
    #[serde(default)]
    pub tasks: Option<DailyTaskStatus>,
    #[serde(default)]
    pub program: Option<ProgramContext>,
}

const COACH_RULES: &str = "Rules:\n\
Stay strictly on the topics of the program: training, nutrition, sleep, supplements, recovery and the user's daily tasks. If asked about anything else, briefly steer the conversation back to the program.\n\
Never give medical diagnoses and never advise on medication. For medical concerns, recommend seeing a doctor.\n\
Write short, conversational plain-text paragraphs.\n\
Never use markdown formatting: no bullet points, no numbered lists, no headers, no bold or italic markers.\n\
Never use emojis.\n\
Address the user by first name occasionally, not in every message.\n\
Keep answers under 120 words unless the user explicitly asks for more detail.";

/// Build the full system prompt for the given context and hour of day.
///
/// Deterministic for a fixed (context, hour) pair; absent optional
/// sub-contexts are simply omitted.
pub fn build_system_prompt(context: &CoachContext, hour: u32) -> String {
    let sections = [
        persona_section(&context.user),
        time_of_day_phrase(hour).to_string(),
        COACH_RULES.to_string(),
        context
            .tasks
            .as_ref()
            .map(task_status_section)
            .unwrap_or_default(),
        context
            .program
            .as_ref()
            .map(program_section)
            .unwrap_or_default(),
        knowledge_base::format_knowledge_base(),
    ];

    sections
        .into_iter()
        .filter(|section| !section.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Like [`build_system_prompt`] but with the current wall-clock hour, the one
/// permitted non-determinism.
pub fn build_system_prompt_now(context: &CoachContext) -> String {
    build_system_prompt(context, chrono::Local::now().hour())
}

fn persona_section(user: &UserContext) -> String {
    let name = if user.first_name.trim().is_empty() {
        "the user"
    } else {
        user.first_name.trim()
    };
    let mut lines = vec![format!(
        "You are Max, the personal coach of the Vigor30 testosterone program. You are talking to {name}."
    )];
    if let Some(day) = user.program_day {
        lines.push(format!("They are on day {day} of the 30-day program."));
    }
    if let Some(category) = &user.category {
        lines.push(format!("Their goal category is {category}."));
    }
    if let Some(level) = &user.level {
        lines.push(format!("Their current level is {level}."));
    }
    if let Some(capsules) = user.capsules_remaining {
        lines.push(format!(
            "They have {capsules} capsules left in their current supply."
        ));
    }
    lines.join(" ")
}

fn time_of_day_phrase(hour: u32) -> &'static str {
    match hour {
        5..=11 => "It is morning for the user. A good moment to talk about today's plan.",
        12..=17 => "It is afternoon for the user. Check in on how the day is going so far.",
        18..=22 => "It is evening for the user. Focus on winding down, recovery and sleep.",
        _ => "It is late at night for the user. Keep it brief and nudge them toward sleep.",
    }
}

fn task_status_section(tasks: &DailyTaskStatus) -> String {
    let mut lines = vec!["Today's task status:".to_string()];
    if tasks.meals_planned > 0 {
        if tasks.meals_completed >= tasks.meals_planned {
            lines.push(format!(
                "All {} meals are logged. Praise them for staying on track.",
                tasks.meals_planned
            ));
        } else {
            lines.push(format!(
                "{} of {} meals are logged. Remind them of the remaining meals without nagging.",
                tasks.meals_completed, tasks.meals_planned
            ));
        }
    }
    lines.push(if tasks.workout_done {
        "The workout is done. Acknowledge it when it fits.".to_string()
    } else {
        "The workout is still open. Encourage them to fit it in today.".to_string()
    });
    lines.push(if tasks.sleep_logged {
        "Last night's sleep is logged.".to_string()
    } else {
        "Last night's sleep is not logged yet. Ask them to log it.".to_string()
    });
    lines.push(if tasks.capsules_taken {
        "Today's capsule dose is taken.".to_string()
    } else {
        "Today's capsule dose has not been taken yet. Remind them.".to_string()
    });
    lines.join("\n")
}

fn program_section(program: &ProgramContext) -> String {
    let mut lines = vec!["Program context for today:".to_string()];
    if let Some(calories) = program.calories {
        lines.push(format!("Daily calorie target: {calories} kcal."));
    }
    if let Some(protein) = program.protein_g {
        lines.push(format!("Protein target: {protein} g."));
    }
    if let Some(carbs) = program.carbs_g {
        lines.push(format!("Carb target: {carbs} g."));
    }
    if let Some(fat) = program.fat_g {
        lines.push(format!("Fat target: {fat} g."));
    }
    if !program.meals.is_empty() {
        lines.push(format!("Scheduled meals: {}.", program.meals.join(", ")));
    }
    if let Some(workout) = &program.workout {
        lines.push(format!("Scheduled workout: {workout}."));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_context() -> CoachContext {
        CoachContext {
            user: UserContext {
                first_name: "Jan".to_string(),
                program_day: None,
                category: None,
                level: None,
                capsules_remaining: None,
            },
            tasks: None,
            program: None,
        }
    }

    fn full_context() -> CoachContext {
        CoachContext {
            user: UserContext {
                first_name: "Jan".to_string(),
                program_day: Some(12),
                category: Some("muscle-gain".to_string()),
                level: Some("normal".to_string()),
                capsules_remaining: Some(18),
            },
            tasks: Some(DailyTaskStatus {
                meals_completed: 2,
                meals_planned: 3,
                workout_done: true,
                sleep_logged: false,
                capsules_taken: true,
            }),
            program: Some(ProgramContext {
                calories: Some(2600),
                protein_g: Some(180),
                carbs_g: Some(250),
                fat_g: Some(90),
                meals: vec!["Oatmeal with eggs".to_string(), "Chicken and rice".to_string()],
                workout: Some("Push day".to_string()),
            }),
        }
    }

    #[test]
    fn prompt_is_deterministic_for_fixed_hour() {
        let context = full_context();
        assert_eq!(
            build_system_prompt(&context, 9),
            build_system_prompt(&context, 9)
        );
    }

    #[test]
    fn hour_selects_one_of_four_framings() {
        let context = bare_context();
        let morning = build_system_prompt(&context, 8);
        let afternoon = build_system_prompt(&context, 14);
        let evening = build_system_prompt(&context, 20);
        let night = build_system_prompt(&context, 2);

        assert!(morning.contains("morning"));
        assert!(afternoon.contains("afternoon"));
        assert!(evening.contains("evening"));
        assert!(night.contains("late at night"));
        // boundary hours
        assert!(build_system_prompt(&context, 5).contains("morning"));
        assert!(build_system_prompt(&context, 23).contains("late at night"));
    }

    #[test]
    fn absent_sub_contexts_are_omitted_without_error() {
        let prompt = build_system_prompt(&bare_context(), 9);
        assert!(!prompt.contains("Today's task status"));
        assert!(!prompt.contains("Program context for today"));
        assert!(prompt.contains("You are Max"));
        assert!(prompt.contains("Knowledge base"));
    }

    #[test]
    fn full_context_enumerates_every_field() {
        let prompt = build_system_prompt(&full_context(), 9);
        assert!(prompt.contains("day 12 of the 30-day program"));
        assert!(prompt.contains("muscle-gain"));
        assert!(prompt.contains("18 capsules left"));
        assert!(prompt.contains("2 of 3 meals are logged"));
        assert!(prompt.contains("The workout is done"));
        assert!(prompt.contains("sleep is not logged yet"));
        assert!(prompt.contains("capsule dose is taken"));
        assert!(prompt.contains("2600 kcal"));
        assert!(prompt.contains("180 g"));
        assert!(prompt.contains("Oatmeal with eggs, Chicken and rice"));
        assert!(prompt.contains("Push day"));
    }

    #[test]
    fn completed_meals_switch_to_praise_framing() {
        let mut context = full_context();
        context.tasks = Some(DailyTaskStatus {
            meals_completed: 3,
            meals_planned: 3,
            workout_done: false,
            sleep_logged: true,
            capsules_taken: false,
        });
        let prompt = build_system_prompt(&context, 9);
        assert!(prompt.contains("All 3 meals are logged. Praise them"));
        assert!(prompt.contains("workout is still open"));
        assert!(prompt.contains("has not been taken yet"));
    }

    #[test]
    fn rules_ban_markdown_and_emojis() {
        let prompt = build_system_prompt(&bare_context(), 9);
        assert!(prompt.contains("Never use markdown formatting"));
        assert!(prompt.contains("Never use emojis"));
    }
}
