/// Deterministic fallback strategy generator
///
/// Always-available generation path used when the remote collaborator is not
/// configured, times out, or faults. Builds a complete structured result from
/// the request's own fields with no external calls, so the same input always
/// yields the same output.
use crate::strategy::{
    CalendarEntry, CompetitorGap, Keyword, Persona, PostingSchedule, RoiPrediction, SamplePost,
    StrategicGuidance, StrategyInput, StrategyResult,
};

/// Generate a template strategy from the request fields
pub fn generate(input: &StrategyInput) -> StrategyResult {
    StrategyResult {
        personas: personas(input),
        competitor_gaps: competitor_gaps(),
        keywords: keywords(input),
        strategic_guidance: guidance(input),
        calendar: calendar(),
        sample_posts: sample_posts(input),
        roi_prediction: RoiPrediction {
            traffic_lift_percentage: "18-25%".to_string(),
            engagement_boost_percentage: "35-45%".to_string(),
            estimated_monthly_reach: "5K-15K".to_string(),
            time_to_results: "30-60 days".to_string(),
        },
    }
}

fn personas(input: &StrategyInput) -> Vec<Persona> {
    let check_habit = format!("Checks {} daily", input.platform);
    vec![
        Persona {
            name: format!("{} Enthusiast", input.audience),
            age_range: "18-24".to_string(),
            occupation: "Student / Early Career".to_string(),
            pain_points: string_vec(&["Limited budget", "Time constraints", "Learning curve"]),
            desires: string_vec(&["Affordable solutions", "Quick wins", "Build skills"]),
            content_preferences: string_vec(&["Short video", "Quick tips", "Trendy content"]),
        },
        Persona {
            name: format!("{} Professional", input.audience),
            age_range: "25-34".to_string(),
            occupation: "Working Professional".to_string(),
            pain_points: string_vec(&[
                "Limited time",
                "Struggling with consistency",
                "Difficulty measuring ROI",
            ]),
            desires: string_vec(&["Grow authentically", "Build brand", "Save time"]),
            content_preferences: vec![
                "Behind-the-scenes".to_string(),
                "Data insights".to_string(),
                check_habit.clone(),
            ],
        },
        Persona {
            name: format!("{} Expert", input.audience),
            age_range: "35-45".to_string(),
            occupation: "Senior Professional / Manager".to_string(),
            pain_points: string_vec(&[
                "Keeping up with trends",
                "Brand consistency",
                "Scaling challenges",
            ]),
            desires: string_vec(&["Efficient systems", "Authority building", "Long-term growth"]),
            content_preferences: string_vec(&["Case studies", "Industry insights", "Long-form"]),
        },
    ]
}

fn competitor_gaps() -> Vec<CompetitorGap> {
    vec![
        CompetitorGap {
            gap: "Lack of personalized strategies".to_string(),
            impact: "High".to_string(),
            implementation: "Persona-driven content planning".to_string(),
        },
        CompetitorGap {
            gap: "No real-time trend coverage".to_string(),
            impact: "High".to_string(),
            implementation: "Weekly trend monitoring".to_string(),
        },
        CompetitorGap {
            gap: "Missing performance analytics".to_string(),
            impact: "Medium".to_string(),
            implementation: "Engagement tracking per post".to_string(),
        },
    ]
}

fn keywords(input: &StrategyInput) -> Vec<Keyword> {
    let industry_tag = format!("#{}", input.industry.replace(' ', ""));
    let platform_tag = format!("#{}Tips", input.platform);

    vec![
        Keyword {
            term: format!("{} content ideas", input.industry.to_lowercase()),
            intent: "Informational".to_string(),
            difficulty: "Easy".to_string(),
            priority: 10,
            hashtags: vec![industry_tag.clone(), "#ContentIdeas".to_string()],
        },
        Keyword {
            term: format!("grow on {}", input.platform.to_lowercase()),
            intent: "Informational".to_string(),
            difficulty: "Easy".to_string(),
            priority: 9,
            hashtags: vec![platform_tag.clone(), "#SocialMediaGrowth".to_string()],
        },
        Keyword {
            term: format!("{} tips", input.platform.to_lowercase()),
            intent: "Informational".to_string(),
            difficulty: "Easy".to_string(),
            priority: 8,
            hashtags: vec![platform_tag, "#MarketingHacks".to_string()],
        },
        Keyword {
            term: format!("{} marketing", input.industry.to_lowercase()),
            intent: "Transactional".to_string(),
            difficulty: "Medium".to_string(),
            priority: 7,
            hashtags: vec![industry_tag, "#MarketingStrategy".to_string()],
        },
        Keyword {
            term: format!("viral {} content", input.platform.to_lowercase()),
            intent: "Informational".to_string(),
            difficulty: "Medium".to_string(),
            priority: 6,
            hashtags: string_vec(&["#ViralContent", "#Trending"]),
        },
    ]
}

fn guidance(input: &StrategyInput) -> StrategicGuidance {
    StrategicGuidance {
        what_to_do: string_vec(&[
            "Behind-the-scenes content",
            "User testimonials",
            "Educational carousels",
            "Quick tip videos",
        ]),
        how_to_do_it: string_vec(&[
            "Hook in the first 3 seconds",
            "Add captions and text overlays",
            "Include a clear CTA",
            "Post consistently",
        ]),
        primary_platform: input.platform.clone(),
        when_to_post: PostingSchedule {
            best_days: string_vec(&["Tuesday", "Thursday", "Saturday"]),
            best_times: string_vec(&["9-11 AM", "1-3 PM", "7-9 PM"]),
            frequency: "3-5 times per week".to_string(),
        },
        things_to_avoid: string_vec(&[
            "Posting without a CTA",
            "Overly salesy tone",
            "Ignoring comments",
            "Inconsistent cadence",
        ]),
    }
}

fn calendar() -> Vec<CalendarEntry> {
    vec![
        CalendarEntry {
            week: 1,
            day: 1,
            topic: "Introduction".to_string(),
            format: "Reel".to_string(),
            caption_hook: "Here's why...".to_string(),
            cta: "Follow for more".to_string(),
        },
        CalendarEntry {
            week: 1,
            day: 3,
            topic: "Quick Win".to_string(),
            format: "Carousel".to_string(),
            caption_hook: "Want results?".to_string(),
            cta: "Save this".to_string(),
        },
        CalendarEntry {
            week: 2,
            day: 2,
            topic: "Educational".to_string(),
            format: "Post".to_string(),
            caption_hook: "Did you know...".to_string(),
            cta: "Share this".to_string(),
        },
    ]
}

fn sample_posts(input: &StrategyInput) -> Vec<SamplePost> {
    vec![SamplePost {
        title: "Game-Changing Strategy".to_string(),
        caption: format!(
            "If you're in {}, listen up.\n\nConsistent posting. Authentic storytelling. \
             Value first.\n\nComment 'STRATEGY' below",
            input.industry
        ),
        hashtags: vec![
            format!("#{}", input.industry.replace(' ', "")),
            format!("#{}Marketing", input.platform),
            "#ContentStrategy".to_string(),
        ],
        best_time: "Weekdays 9-11 AM".to_string(),
    }]
}

fn string_vec(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
