//! Static knowledge base the coach grounds its factual claims in.

pub struct KnowledgeArticle {
    pub title: &'static str,
    pub url: &'static str,
    pub summary: &'static str,
    pub facts: &'static [&'static str],
}

pub const ARTICLES: &[KnowledgeArticle] = &[
    KnowledgeArticle {
        title: "Sleep: the cheapest testosterone booster",
        url: "https://vigor30.app/blog/sleep-and-testosterone",
        summary: "Why most testosterone is produced during sleep and what a week of short nights does to your levels.",
        facts: &[
            "One week of sleeping 5 hours a night lowered testosterone by 10-15% in healthy young men.",
            "The bulk of daily testosterone release happens during deep sleep before 3 a.m.",
            "A consistent bedtime beats extra weekend sleep for hormonal stability.",
        ],
    },
    KnowledgeArticle {
        title: "Lift heavy, recover hard",
        url: "https://vigor30.app/blog/strength-training-hormones",
        summary: "Which training styles raise testosterone acutely and which wear it down over time.",
        facts: &[
            "Compound lifts with large muscle groups produce the strongest acute hormonal response.",
            "3-4 sessions per week outperforms daily training once recovery is factored in.",
            "Chronic endurance overtraining is associated with reduced resting testosterone.",
        ],
    },
    KnowledgeArticle {
        title: "Eat like your hormones depend on it",
        url: "https://vigor30.app/blog/nutrition-basics",
        summary: "Protein, dietary fat, zinc and vitamin D as the nutritional base of testosterone production.",
        facts: &[
            "Very low-fat diets (under 20% of calories) are linked to lower testosterone.",
            "Zinc deficiency measurably suppresses testosterone and is common in heavy sweaters.",
            "A caloric deficit steeper than ~25% starts to cost you hormone output.",
        ],
    },
    KnowledgeArticle {
        title: "Alcohol and your evening beer habit",
        url: "https://vigor30.app/blog/alcohol-and-testosterone",
        summary: "How alcohol dose-dependently suppresses testosterone and disturbs sleep architecture.",
        facts: &[
            "Moderate drinking (1-2 drinks) has a small effect; binge drinking suppresses testosterone for up to 24 hours.",
            "Alcohol before bed fragments exactly the deep sleep phases where testosterone is released.",
        ],
    },
    KnowledgeArticle {
        title: "Stress, cortisol and the seesaw effect",
        url: "https://vigor30.app/blog/stress-cortisol",
        summary: "Why chronically elevated cortisol and testosterone rarely coexist, and what actually lowers stress.",
        facts: &[
            "Cortisol and testosterone share a precursor; chronic stress shifts production toward cortisol.",
            "Ten minutes of daily walking outdoors measurably lowers evening cortisol.",
        ],
    },
    KnowledgeArticle {
        title: "Body fat is an endocrine organ",
        url: "https://vigor30.app/blog/body-fat-aromatase",
        summary: "How excess body fat converts testosterone to estrogen and why waist size tracks hormone levels.",
        facts: &[
            "Fat tissue expresses aromatase, which converts testosterone into estradiol.",
            "Losing 10% of body weight in overweight men typically raises testosterone by 50-100 ng/dL.",
        ],
    },
];

/// Deterministic text rendering of the article list for the system prompt
pub fn format_knowledge_base() -> String {
    let mut out = String::from(
        "Knowledge base. Ground factual claims in these articles and share the link when one fits the question:\n",
    );
    for article in ARTICLES {
        out.push_str(&format!(
            "\nArticle: {}\nLink: {}\nSummary: {}\n",
            article.title, article.url, article.summary
        ));
        for fact in article.facts {
            out.push_str(&format!("Fact: {fact}\n"));
        }
    }
    out
}
