//! Request and response bodies of the topic backend REST API
//!
//! Field names follow the backend's JSON exactly, including the camelCase
//! `sourceNote`/`sourceUrl` on materials.

use serde::{Deserialize, Serialize};

use crate::topic::{SkipReason, TopicCandidate};

/// Error body returned by the backend on non-success status codes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// `POST /api/topics/{id}/favorite`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteToggleResponse {
    #[serde(default)]
    pub topic_id: String,
    pub is_favorited: bool,
}

/// `GET /api/favorites/full`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FavoritesFullResponse {
    #[serde(default)]
    pub topics: Vec<TopicCandidate>,
    #[serde(default)]
    pub count: usize,
}

/// `POST /api/collect`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub topics: Vec<TopicCandidate>,
    /// Plain-text digest of the collected topics
    #[serde(default)]
    pub formatted: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `POST /api/topics/skip`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkipRequest {
    pub topic_id: String,
    pub work_name: String,
    #[serde(default)]
    pub dish_name: String,
    pub reason: SkipReason,
}

/// `POST /api/topics/done`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkDoneRequest {
    pub work_name: String,
    #[serde(default)]
    pub dish_name: String,
}

/// `POST /api/workflow/{id}/generate-materials`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateMaterialsRequest {
    pub work_name: String,
    pub dish_name: String,
    pub food_scene: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateMaterialsResponse {
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub count: usize,
}

/// How far a material snippet can be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Credibility {
    #[serde(rename = "已核实")]
    Verified,
    #[serde(rename = "传说")]
    Rumored,
    /// Research direction that still has to be dug up
    #[serde(rename = "待挖掘")]
    ToExplore,
    #[serde(rename = "待核实")]
    Unverified,
}

impl Credibility {
    pub fn label(&self) -> &'static str {
        match self {
            Credibility::Verified => "verified",
            Credibility::Rumored => "rumored",
            Credibility::ToExplore => "to explore",
            Credibility::Unverified => "unverified",
        }
    }
}

/// One AI-generated material snippet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: String,
    pub category: String,
    pub content: String,
    pub credibility: Credibility,
    #[serde(rename = "sourceNote", default)]
    pub source_note: String,
    #[serde(rename = "sourceUrl", default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potential_score: Option<f64>,
}

impl Material {
    /// Placeholder direction the user still has to research
    pub fn is_unexplored_placeholder(&self) -> bool {
        self.content.starts_with(markers::UNEXPLORED)
    }

    /// Story direction rather than a concrete fact
    pub fn is_direction(&self) -> bool {
        self.content.starts_with(markers::DIRECTION)
    }
}

/// Content prefixes the backend uses to flag non-factual materials
pub mod markers {
    pub const UNEXPLORED: &str = "[待挖掘]";
    pub const DIRECTION: &str = "[方向]";
}

/// Material categories as emitted by the backend
pub mod category {
    pub const WORK_DETAIL: &str = "作品细节";
    pub const OPENING_HOOK: &str = "开场钩子";
    pub const HISTORY_ORIGIN: &str = "历史源头";
    pub const CULTURAL_SHIFT: &str = "文化流变";
    pub const CELEBRITY_ANECDOTE: &str = "名人轶事";
    pub const COLD_FACT: &str = "冷知识";
    pub const DATA: &str = "数据";
    pub const STORY_ANGLE: &str = "故事角度";
}
