//! Topic candidate data model
//!
//! A topic candidate is one production idea discovered by the backend. The
//! wire format is a flat JSON object whose `topic_type` field selects which
//! kind-specific attributes are meaningful. Here that object is split into a
//! shared [`TopicBase`] and a [`TopicKind`] sum type so kind-specific fields
//! are only reachable after matching on the kind.

use chrono::NaiveDateTime;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Discriminant of a topic candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicType {
    MovieFood,
    FamousRecipe,
    Archaeological,
}

impl TopicType {
    pub const ALL: [TopicType; 3] = [
        TopicType::MovieFood,
        TopicType::FamousRecipe,
        TopicType::Archaeological,
    ];

    /// Wire identifier (`movie_food`, `famous_recipe`, `archaeological`)
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicType::MovieFood => "movie_food",
            TopicType::FamousRecipe => "famous_recipe",
            TopicType::Archaeological => "archaeological",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TopicType::MovieFood => "Screen food",
            TopicType::FamousRecipe => "Famous recipe",
            TopicType::Archaeological => "Archaeological food",
        }
    }
}

impl fmt::Display for TopicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TopicType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie_food" => Ok(TopicType::MovieFood),
            "famous_recipe" => Ok(TopicType::FamousRecipe),
            "archaeological" => Ok(TopicType::Archaeological),
            other => Err(Error::InvalidInput(format!("Unknown topic type: {}", other))),
        }
    }
}

/// Scored narrative framing attached to a topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryAngle {
    /// Free-form category emitted by the backend (dish history, behind the scenes, ...)
    #[serde(default)]
    pub angle_type: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// 1-10
    #[serde(default)]
    pub potential_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningHook {
    #[serde(rename = "type", default)]
    pub hook_type: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    #[serde(default)]
    pub amount: String,
    /// Kitchen staple (onion, garlic, salt...)
    #[serde(default)]
    pub is_pantry: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CookingDifficulty {
    #[serde(rename = "简单")]
    Easy,
    #[default]
    #[serde(rename = "中等")]
    Medium,
    #[serde(rename = "困难")]
    Hard,
    #[serde(rename = "超出能力")]
    BeyondSkill,
}

impl CookingDifficulty {
    /// Parse a wire value; anything unrecognised reads as `Medium`
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "简单" => CookingDifficulty::Easy,
            "中等" => CookingDifficulty::Medium,
            "困难" => CookingDifficulty::Hard,
            "超出能力" => CookingDifficulty::BeyondSkill,
            other => {
                tracing::debug!("Unknown cooking difficulty {:?}, using medium", other);
                CookingDifficulty::Medium
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CookingDifficulty::Easy => "easy",
            CookingDifficulty::Medium => "medium",
            CookingDifficulty::Hard => "hard",
            CookingDifficulty::BeyondSkill => "beyond skill",
        }
    }
}

impl<'de> Deserialize<'de> for CookingDifficulty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .as_deref()
            .map(CookingDifficulty::from_wire)
            .unwrap_or_default())
    }
}

/// Screen-work metadata for `movie_food` topics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkInfo {
    #[serde(default)]
    pub work_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub douban_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub douban_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    /// Film: "1:38:00", series: "S01E05 15:00"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_scene_timestamp: Option<String>,
}

/// Restaurant metadata for `famous_recipe` topics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestaurantInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_location: Option<String>,
    /// 1-3
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub michelin_stars: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chef_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chef_background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_story: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_source_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dish_category: Option<String>,
}

/// Archive metadata for `archaeological` topics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArchiveInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_period: Option<String>,
    /// Year the recipe was recorded (e.g. 1867)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_origin: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cultural_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_figure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_collection: Option<String>,
}

/// Kind-specific attributes, selected by the `topic_type` tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "topic_type", rename_all = "snake_case")]
pub enum TopicKind {
    MovieFood(WorkInfo),
    FamousRecipe(RestaurantInfo),
    Archaeological(ArchiveInfo),
}

impl TopicKind {
    pub fn topic_type(&self) -> TopicType {
        match self {
            TopicKind::MovieFood(_) => TopicType::MovieFood,
            TopicKind::FamousRecipe(_) => TopicType::FamousRecipe,
            TopicKind::Archaeological(_) => TopicType::Archaeological,
        }
    }
}

/// Attributes shared by every kind of topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicBase {
    pub id: String,
    pub work_name: String,

    #[serde(default)]
    pub food_scene_description: String,
    #[serde(default)]
    pub recommended_dish: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dish_origin: Option<String>,

    #[serde(default)]
    pub story_angles: Vec<StoryAngle>,
    #[serde(default)]
    pub backup_angles: Vec<StoryAngle>,
    #[serde(default)]
    pub opening_hooks: Vec<OpeningHook>,

    #[serde(default)]
    pub footage_sources: Vec<String>,
    #[serde(default)]
    pub footage_available: bool,

    #[serde(default)]
    pub cooking_difficulty: CookingDifficulty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooking_notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<Ingredient>>,

    #[serde(default)]
    pub is_interesting: bool,
    #[serde(default)]
    pub is_discussable: bool,
    #[serde(default)]
    pub has_momentum: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heat_reason: Option<String>,

    #[serde(default)]
    pub is_done: bool,
    #[serde(default)]
    pub is_favorited: bool,

    #[serde(default)]
    pub total_score: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovered_at: Option<String>,
    #[serde(default)]
    pub collected_at: String,
    #[serde(default)]
    pub source: String,
}

/// A discovered production idea
///
/// Some backend records omit `topic_type`; those decode as `movie_food`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicCandidate {
    #[serde(flatten)]
    pub base: TopicBase,
    #[serde(flatten)]
    pub kind: TopicKind,
}

#[derive(Deserialize)]
struct WireTopic {
    #[serde(flatten)]
    base: TopicBase,
    #[serde(flatten)]
    kind: TopicKind,
}

impl<'de> Deserialize<'de> for TopicCandidate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut value = serde_json::Value::deserialize(deserializer)?;
        if let Some(map) = value.as_object_mut() {
            let missing = map.get("topic_type").map_or(true, |t| t.is_null());
            if missing {
                map.insert(
                    "topic_type".to_string(),
                    TopicType::MovieFood.as_str().into(),
                );
            }
        }
        let wire = WireTopic::deserialize(value).map_err(D::Error::custom)?;
        Ok(TopicCandidate {
            base: wire.base,
            kind: wire.kind,
        })
    }
}

impl TopicCandidate {
    pub fn id(&self) -> &str {
        &self.base.id
    }

    pub fn work_name(&self) -> &str {
        &self.base.work_name
    }

    pub fn dish_name(&self) -> &str {
        &self.base.recommended_dish
    }

    pub fn topic_type(&self) -> TopicType {
        self.kind.topic_type()
    }

    /// Story angles ordered by potential score, highest first (stable for ties)
    pub fn top_angles(&self, n: usize) -> Vec<&StoryAngle> {
        let mut angles: Vec<&StoryAngle> = self.base.story_angles.iter().collect();
        angles.sort_by(|a, b| {
            b.potential_score
                .partial_cmp(&a.potential_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        angles.truncate(n);
        angles
    }

    /// Number of appeal signals set (interesting, discussable, momentum)
    pub fn appeal_count(&self) -> usize {
        [
            self.base.is_interesting,
            self.base.is_discussable,
            self.base.has_momentum,
        ]
        .iter()
        .filter(|b| **b)
        .count()
    }
}

/// Why a topic is being removed from the discovery pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotInterested,
    NotSuitable,
    TooSimple,
    Done,
}

impl SkipReason {
    pub const ALL: [SkipReason; 4] = [
        SkipReason::NotInterested,
        SkipReason::NotSuitable,
        SkipReason::TooSimple,
        SkipReason::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NotInterested => "not_interested",
            SkipReason::NotSuitable => "not_suitable",
            SkipReason::TooSimple => "too_simple",
            SkipReason::Done => "done",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::NotInterested => "Not interested",
            SkipReason::NotSuitable => "Not suitable for me",
            SkipReason::TooSimple => "Footage too simple",
            SkipReason::Done => "Already made",
        }
    }
}

impl FromStr for SkipReason {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SkipReason::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown skip reason: {}", s)))
    }
}

/// State of the backend discovery run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryStatus {
    #[serde(default)]
    pub is_running: bool,
    /// ISO-8601 timestamp without offset, as emitted by the backend
    #[serde(default)]
    pub last_run: Option<String>,
    #[serde(default)]
    pub last_count: usize,
}

impl DiscoveryStatus {
    /// Parse `last_run`, accepting both naive and RFC 3339 timestamps
    pub fn last_run_at(&self) -> Option<NaiveDateTime> {
        let raw = self.last_run.as_deref()?;
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .or_else(|| {
                chrono::DateTime::parse_from_rfc3339(raw)
                    .ok()
                    .map(|dt| dt.naive_utc())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn movie_json() -> serde_json::Value {
        json!({
            "id": "t-1",
            "topic_type": "movie_food",
            "work_name": "Ratatouille-ish Film",
            "work_type": "film",
            "douban_score": 8.1,
            "douban_url": null,
            "food_scene_description": "The critic tastes the stew",
            "recommended_dish": "Vegetable Stew",
            "story_angles": [
                {"angle_type": "其他", "title": "Low", "description": "d1", "potential_score": 3},
                {"angle_type": "其他", "title": "High", "description": "d2", "potential_score": 9}
            ],
            "footage_sources": ["film"],
            "footage_available": true,
            "cooking_difficulty": "简单",
            "is_interesting": true,
            "is_discussable": false,
            "has_momentum": true,
            "is_done": false,
            "is_favorited": false,
            "total_score": 7.5,
            "collected_at": "2024-05-01T10:00:00",
            "source": "curated"
        })
    }

    #[test]
    fn test_movie_topic_deserializes_into_kind() {
        let topic: TopicCandidate = serde_json::from_value(movie_json()).unwrap();

        assert_eq!(topic.topic_type(), TopicType::MovieFood);
        match &topic.kind {
            TopicKind::MovieFood(work) => {
                assert_eq!(work.work_type, "film");
                assert_eq!(work.douban_score, Some(8.1));
                assert!(work.douban_url.is_none());
            }
            other => panic!("unexpected kind: {:?}", other),
        }
        assert_eq!(topic.base.cooking_difficulty, CookingDifficulty::Easy);
        assert_eq!(topic.appeal_count(), 2);
    }

    #[test]
    fn test_archaeological_topic_fields() {
        let topic: TopicCandidate = serde_json::from_value(json!({
            "id": "a-1",
            "topic_type": "archaeological",
            "work_name": "Victorian Kitchen",
            "recommended_dish": "Mock Turtle Soup",
            "year_origin": 1867,
            "historical_source": "Household Book"
        }))
        .unwrap();

        match topic.kind {
            TopicKind::Archaeological(info) => {
                assert_eq!(info.year_origin, Some(1867));
                assert_eq!(info.historical_source.as_deref(), Some("Household Book"));
            }
            other => panic!("unexpected kind: {:?}", other),
        }
        assert!(topic.base.story_angles.is_empty());
        assert!(topic.base.ingredients.is_none());
    }

    #[test]
    fn test_unknown_topic_type_rejected() {
        let mut value = movie_json();
        value["topic_type"] = json!("street_food");
        assert!(serde_json::from_value::<TopicCandidate>(value).is_err());
    }

    #[test]
    fn test_missing_topic_type_defaults_to_movie_food() {
        let topics: Vec<TopicCandidate> = serde_json::from_value(json!([
            movie_json(),
            {"id": "t-2", "work_name": "B", "recommended_dish": "Bread", "work_type": "series"},
            {"id": "t-3", "topic_type": null, "work_name": "C"}
        ]))
        .unwrap();

        assert_eq!(topics.len(), 3);
        assert_eq!(topics[1].topic_type(), TopicType::MovieFood);
        match &topics[1].kind {
            TopicKind::MovieFood(work) => assert_eq!(work.work_type, "series"),
            other => panic!("unexpected kind: {:?}", other),
        }
        assert_eq!(topics[2].topic_type(), TopicType::MovieFood);
    }

    #[test]
    fn test_unknown_difficulty_reads_as_medium() {
        let mut value = movie_json();
        value["cooking_difficulty"] = json!("较难");
        let topic: TopicCandidate = serde_json::from_value(value).unwrap();
        assert_eq!(topic.base.cooking_difficulty, CookingDifficulty::Medium);

        let mut value = movie_json();
        value["cooking_difficulty"] = json!("超出能力");
        let topic: TopicCandidate = serde_json::from_value(value).unwrap();
        assert_eq!(topic.base.cooking_difficulty, CookingDifficulty::BeyondSkill);
    }

    #[test]
    fn test_serialize_keeps_flat_shape() {
        let topic: TopicCandidate = serde_json::from_value(movie_json()).unwrap();
        let value = serde_json::to_value(&topic).unwrap();

        assert_eq!(value["topic_type"], "movie_food");
        assert_eq!(value["work_type"], "film");
        assert_eq!(value["recommended_dish"], "Vegetable Stew");
    }

    #[test]
    fn test_top_angles_sorted_by_score() {
        let topic: TopicCandidate = serde_json::from_value(movie_json()).unwrap();
        let top = topic.top_angles(1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].title, "High");
    }

    #[test]
    fn test_skip_reason_round_trip_str() {
        for reason in SkipReason::ALL {
            assert_eq!(reason.as_str().parse::<SkipReason>().unwrap(), reason);
        }
        assert!("bored".parse::<SkipReason>().is_err());
    }

    #[test]
    fn test_discovery_status_last_run_parse() {
        let status = DiscoveryStatus {
            is_running: false,
            last_run: Some("2024-05-01T10:00:00.123456".to_string()),
            last_count: 5,
        };
        assert!(status.last_run_at().is_some());

        let status = DiscoveryStatus {
            last_run: Some("2024-05-01T10:00:00Z".to_string()),
            ..Default::default()
        };
        assert!(status.last_run_at().is_some());

        assert!(DiscoveryStatus::default().last_run_at().is_none());
    }
}
