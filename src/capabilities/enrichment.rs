use std::sync::OnceLock;

use regex::Regex;

/// Adds a supplementary block to a chat answer when the question calls
/// for it.
pub trait Enricher: Send + Sync {
    fn name(&self) -> &str;

    fn enrich(&self, question: &str, location: Option<&str>) -> Option<String>;
}

const NUTRIENT_KEYWORDS: &[&str] = &[
    "feed", "food", "diet", "nutrition", "nutrient", "calorie", "protein", "eat", "meal", "weight",
];

const LOCATION_KEYWORDS: &[&str] = &[
    "vet", "clinic", "hospital", "near", "nearby", "local", "weather", "climate", "area",
];

/// Case-insensitive substring match against a keyword list.
pub fn mentions_any(text: &str, keywords: &[&str]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

/// Flattens the client supplied location (free text or a
/// `{latitude, longitude}` object) into one line.
pub fn describe_location(location: &serde_json::Value) -> Option<String> {
    match location {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.trim().is_empty() => None,
        serde_json::Value::String(s) => Some(s.trim().to_string()),
        serde_json::Value::Object(map) => {
            let lat = map.get("latitude").and_then(|v| v.as_f64());
            let lon = map.get("longitude").and_then(|v| v.as_f64());
            match (lat, lon) {
                (Some(lat), Some(lon)) => Some(format!("{:.4}, {:.4}", lat, lon)),
                _ => Some(location.to_string()),
            }
        }
        other => Some(other.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LifeStage {
    Puppy,
    Adult,
    Senior,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activity {
    Low,
    Normal,
    High,
}

/// Daily energy and macro estimate plus life-stage feeding tips.
#[derive(Debug, Default)]
pub struct NutrientAdvisor;

impl NutrientAdvisor {
    fn life_stage(question: &str) -> LifeStage {
        if mentions_any(question, &["puppy", "puppies"]) {
            LifeStage::Puppy
        } else if mentions_any(question, &["senior", "old dog", "elderly", "older dog"]) {
            LifeStage::Senior
        } else {
            LifeStage::Adult
        }
    }

    fn activity(question: &str) -> Activity {
        if mentions_any(question, &["very active", "working dog", "high energy", "athletic"]) {
            Activity::High
        } else if mentions_any(question, &["lazy", "inactive", "couch", "low activity"]) {
            Activity::Low
        } else {
            Activity::Normal
        }
    }

    /// Weight in kilograms if the question states one.
    fn weight_kg(question: &str) -> Option<f64> {
        static WEIGHT_RE: OnceLock<Regex> = OnceLock::new();
        let re = WEIGHT_RE.get_or_init(|| {
            Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(kg|kilos?|kilograms?|lbs?|pounds?)\b").unwrap()
        });
        let caps = re.captures(question)?;
        let value: f64 = caps[1].parse().ok()?;
        let unit = caps[2].to_lowercase();
        let kg = if unit.starts_with('l') || unit.starts_with('p') {
            value * 0.4536
        } else {
            value
        };
        (kg > 0.0).then_some(kg)
    }
}

impl Enricher for NutrientAdvisor {
    fn name(&self) -> &str {
        "nutrient"
    }

    fn enrich(&self, question: &str, _location: Option<&str>) -> Option<String> {
        if !mentions_any(question, NUTRIENT_KEYWORDS) {
            return None;
        }

        let stage = Self::life_stage(question);
        let activity = Self::activity(question);
        let (label, protein_pct, fat_pct, carbs_pct) = match stage {
            LifeStage::Puppy => ("puppy", 28.0, 20.0, 52.0),
            LifeStage::Adult => ("adult", 25.0, 15.0, 60.0),
            LifeStage::Senior => ("senior", 22.0, 12.0, 66.0),
        };

        let mut lines = vec![format!("Nutrient analysis ({} dog):", label)];

        match Self::weight_kg(question) {
            Some(kg) => {
                let mut multiplier = match stage {
                    LifeStage::Puppy => 3.0,
                    LifeStage::Adult => 1.6,
                    LifeStage::Senior => 1.2,
                };
                multiplier *= match activity {
                    Activity::Low => 0.8,
                    Activity::Normal => 1.0,
                    Activity::High => 1.4,
                };
                let resting = 70.0 * kg.powf(0.75);
                let daily = resting * multiplier;
                lines.push(format!(
                    "- Estimated daily energy for {:.1} kg: ~{:.0} kcal (protein {:.1} g, fat {:.1} g, carbs {:.1} g).",
                    kg,
                    daily,
                    daily * protein_pct / 100.0 / 4.0,
                    daily * fat_pct / 100.0 / 9.0,
                    daily * carbs_pct / 100.0 / 4.0,
                ));
            }
            None => lines.push(format!(
                "- Suggested calorie split: {:.0}% protein, {:.0}% fat, {:.0}% carbohydrates. \
                 Share your dog's weight in kg for a daily calorie estimate.",
                protein_pct, fat_pct, carbs_pct
            )),
        }

        let tips: &[&str] = match stage {
            LifeStage::Puppy => &[
                "High protein and fat are essential for growth.",
                "DHA and EPA (Omega-3) support brain and vision development.",
                "Keep calcium and phosphorus balanced (about 1.2:1) for bone growth.",
            ],
            LifeStage::Adult => &[
                "A balanced diet with ~25% protein and ~15% fat maintains a healthy weight.",
                "Omega-6 fatty acids help skin and coat health.",
            ],
            LifeStage::Senior => &[
                "Lower fat (~10-12%) helps prevent obesity in less active seniors.",
                "Joint-support nutrients like glucosamine and chondroitin are worth adding.",
                "Choose easily digestible, high-quality protein.",
            ],
        };
        lines.extend(tips.iter().map(|t| format!("- {}", t)));

        match activity {
            Activity::High => lines.push("- Active dogs benefit from extra fat for energy.".to_string()),
            Activity::Low => lines.push("- Monitor calorie intake to avoid weight gain.".to_string()),
            Activity::Normal => {}
        }

        Some(lines.join("\n"))
    }
}

/// Location-aware care advice. Only fires when the client sent a location.
#[derive(Debug, Default)]
pub struct LocationAdvisor;

impl Enricher for LocationAdvisor {
    fn name(&self) -> &str {
        "location"
    }

    fn enrich(&self, question: &str, location: Option<&str>) -> Option<String> {
        let location = location?;
        if !mentions_any(question, LOCATION_KEYWORDS) {
            return None;
        }

        let mut lines = vec![format!("Advice for your area ({}):", location)];
        if mentions_any(question, &["vet", "clinic", "hospital"]) {
            lines.push(
                "- Save the number of the nearest 24/7 emergency veterinary clinic before you need it."
                    .to_string(),
            );
        }
        lines.push("- Ask a local vet which ticks, fleas and heartworm risks are common nearby.".to_string());
        lines.push(
            "- Adjust walks to the local weather: avoid hot pavement and limit exposure in extreme cold."
                .to_string(),
        );
        Some(lines.join("\n"))
    }
}

/// Feeding hints keyed on how big the predicted breed usually gets.
pub fn nutrition_tips_for_breed(breed: &str) -> String {
    const LARGE: &[&str] = &[
        "retriever", "shepherd", "mastiff", "great dane", "rottweiler", "newfoundland",
        "bernese", "saint bernard", "doberman", "husky", "malamute", "great pyrenees",
    ];
    const SMALL: &[&str] = &[
        "chihuahua", "pomeranian", "toy", "yorkshire", "maltese", "pug", "shih", "papillon",
        "pekinese", "miniature", "terrier",
    ];

    if mentions_any(breed, LARGE) {
        "Large breeds need controlled calories and joint support such as glucosamine and chondroitin; \
         avoid rapid growth in puppies."
            .to_string()
    } else if mentions_any(breed, SMALL) {
        "Small breeds do best with calorie-dense food in small, frequent portions; watch dental health."
            .to_string()
    } else {
        "Feed a balanced diet with ~25% protein and ~15% fat, keep fresh water available \
         and adjust portions to activity level."
            .to_string()
    }
}
