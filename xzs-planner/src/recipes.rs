//! Cooking tutorial data
//!
//! Tutorials are static reference data keyed by dish name. The built-in
//! set ships as `data/recipes.toml`; a file named by the `recipe_data`
//! config key can add dishes or replace built-in ones. Unknown dishes get a
//! generic four-stage template.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use crate::error::Result;

const BUILTIN_RECIPES: &str = include_str!("../data/recipes.toml");

/// One tutorial stage in canonical form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorialStep {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    pub details: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ingredients: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tips: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Step as written in a data file: detailed, or the short legacy form
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawStep {
    Detailed(TutorialStep),
    Legacy {
        id: String,
        title: String,
        description: String,
        #[serde(default)]
        duration: Option<String>,
        #[serde(default)]
        tips: Option<String>,
    },
}

impl From<RawStep> for TutorialStep {
    fn from(raw: RawStep) -> Self {
        match raw {
            RawStep::Detailed(step) => step,
            RawStep::Legacy {
                id,
                title,
                description,
                duration,
                tips,
            } => TutorialStep {
                id,
                title,
                duration,
                details: vec![description],
                ingredients: Vec::new(),
                tips: tips.into_iter().collect(),
                warnings: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct RecipeFile {
    #[serde(default)]
    dish: Vec<RawDish>,
}

#[derive(Debug, Deserialize)]
struct RawDish {
    name: String,
    #[serde(default)]
    aliases: Vec<String>,
    steps: Vec<RawStep>,
}

/// Source of per-dish cooking tutorials
pub trait RecipeSource: Send + Sync {
    /// Steps for a dish; never empty (unknown dishes get the generic template)
    fn lookup_steps(&self, dish_name: &str) -> Vec<TutorialStep>;
}

/// Tutorials parsed from TOML
#[derive(Debug, Clone, Default)]
pub struct TomlRecipeSource {
    dishes: HashMap<String, Vec<TutorialStep>>,
}

impl TomlRecipeSource {
    /// The tutorials compiled into the binary
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_RECIPES)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: RecipeFile = toml::from_str(content).map_err(|e| {
            xzs_common::Error::Config(format!("Failed to parse recipe data: {}", e))
        })?;

        let mut dishes = HashMap::new();
        for dish in file.dish {
            let steps: Vec<TutorialStep> = dish.steps.into_iter().map(TutorialStep::from).collect();
            for alias in &dish.aliases {
                dishes.insert(alias.trim().to_string(), steps.clone());
            }
            dishes.insert(dish.name.trim().to_string(), steps);
        }

        Ok(Self { dishes })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(xzs_common::Error::from)?;
        Self::from_toml_str(&content)
    }

    /// Built-in tutorials, with dishes from `path` taking precedence
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut source = Self::builtin()?;
        if let Some(path) = path {
            let overrides = Self::from_file(path)?;
            info!(
                path = %path.display(),
                dishes = overrides.dishes.len(),
                "Loaded recipe data"
            );
            source.dishes.extend(overrides.dishes);
        }
        Ok(source)
    }

    /// Number of names (dish names and aliases) with a tutorial
    pub fn len(&self) -> usize {
        self.dishes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dishes.is_empty()
    }

    pub fn contains(&self, dish_name: &str) -> bool {
        self.dishes.contains_key(dish_name.trim())
    }
}

impl RecipeSource for TomlRecipeSource {
    fn lookup_steps(&self, dish_name: &str) -> Vec<TutorialStep> {
        match self.dishes.get(dish_name.trim()) {
            Some(steps) if !steps.is_empty() => steps.clone(),
            _ => {
                debug!(dish = %dish_name, "No tutorial for dish, using generic steps");
                generic_steps(dish_name)
            }
        }
    }
}

/// Four-stage template used for dishes without a tutorial
pub fn generic_steps(dish_name: &str) -> Vec<TutorialStep> {
    fn step(
        id: &str,
        title: &str,
        duration: &str,
        details: Vec<String>,
        tips: &[&str],
        warnings: &[&str],
    ) -> TutorialStep {
        TutorialStep {
            id: id.to_string(),
            title: title.to_string(),
            duration: Some(duration.to_string()),
            details,
            ingredients: Vec::new(),
            tips: tips.iter().map(|s| s.to_string()).collect(),
            warnings: warnings.iter().map(|s| s.to_string()).collect(),
        }
    }

    let lines = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    vec![
        step(
            "1",
            "Prepare ingredients",
            "10 min",
            vec![
                format!("Gather everything needed for {}", dish_name),
                "Check each item against the recipe list".to_string(),
                "Take out anything that needs to thaw".to_string(),
                "Set out the tools and containers you will use".to_string(),
            ],
            &[
                "Have everything ready before you start cooking",
                "Check amounts against the video tutorials above",
            ],
            &[],
        ),
        step(
            "2",
            "Prep",
            "15 min",
            lines(&[
                "Wash the vegetables",
                "Cut everything to the size the recipe asks for",
                "Trim meat or seafood and cut it to size",
                "Mix the seasonings in small bowls ahead of time",
            ]),
            &[
                "Cut pieces evenly so they cook at the same rate",
                "Pause the video tutorial if you are unsure how to cut something",
            ],
            &[],
        ),
        step(
            "3",
            "Cook",
            "30 min",
            lines(&[
                "Follow the recipe steps in order",
                "Watch the heat and the timing",
                "Taste as you go and adjust the seasoning",
                "Judge doneness by color and texture",
            ]),
            &[
                "Watch the video a few times on a first attempt",
                "Stop and check whenever something is unclear",
            ],
            &["Mind hot surfaces and splashing oil"],
        ),
        step(
            "4",
            "Plate",
            "5 min",
            lines(&[
                "Pick a plate that suits the dish",
                "Arrange it neatly",
                "Garnish with herbs or sauce",
                "Serve while hot",
            ]),
            &["Good plating makes it more appetizing", "Take a photo of your result"],
            &[],
        ),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoPlatform {
    Bilibili,
    YouTube,
    Xiaohongshu,
}

impl fmt::Display for VideoPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VideoPlatform::Bilibili => "Bilibili",
            VideoPlatform::YouTube => "YouTube",
            VideoPlatform::Xiaohongshu => "Xiaohongshu",
        };
        f.write_str(name)
    }
}

/// Search link for video tutorials of a dish
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoLink {
    pub platform: VideoPlatform,
    pub title: String,
    pub url: String,
}

/// One search link per platform, each with that platform's query suffix
pub fn video_links(dish_name: &str) -> Vec<VideoLink> {
    let searches = [
        (
            VideoPlatform::Bilibili,
            "https://search.bilibili.com/all",
            "keyword",
            "教程",
        ),
        (
            VideoPlatform::YouTube,
            "https://www.youtube.com/results",
            "search_query",
            "recipe",
        ),
        (
            VideoPlatform::Xiaohongshu,
            "https://www.xiaohongshu.com/search_result",
            "keyword",
            "做法",
        ),
    ];

    searches
        .into_iter()
        .filter_map(|(platform, base, param, suffix)| {
            let query = format!("{} {}", dish_name, suffix);
            let url = Url::parse_with_params(base, &[(param, query.as_str())]).ok()?;
            Some(VideoLink {
                platform,
                title: format!("Search \"{}\" on {}", dish_name, platform),
                url: url.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_parses_both_step_forms() {
        let source = TomlRecipeSource::builtin().unwrap();
        assert!(source.contains("普罗旺斯炖蔬菜"));
        assert!(source.contains("Vegetable Stew"));

        let detailed = source.lookup_steps("Ratatouille");
        assert_eq!(detailed.len(), 6);
        assert!(!detailed[0].ingredients.is_empty());
        assert!(!detailed[0].warnings.is_empty());

        let legacy = source.lookup_steps("五美元奶昔");
        assert_eq!(legacy.len(), 4);
        assert_eq!(legacy[0].details.len(), 1);
        assert!(legacy[0].tips.is_empty());
        assert_eq!(legacy[1].tips, vec!["Stop early to keep it thick".to_string()]);
    }

    #[test]
    fn test_unknown_dish_gets_generic_template() {
        let source = TomlRecipeSource::builtin().unwrap();
        let steps = source.lookup_steps("Mystery Pie");

        assert_eq!(steps.len(), 4);
        assert!(steps[0].details[0].contains("Mystery Pie"));
        assert_eq!(steps[2].warnings.len(), 1);
    }

    #[test]
    fn test_file_overrides_builtin_dish() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("recipes.toml");
        std::fs::write(
            &path,
            r#"
[[dish]]
name = "五美元奶昔"

[[dish.steps]]
id = "1"
title = "Order one"
description = "Ask the waiter"
"#,
        )
        .unwrap();

        let source = TomlRecipeSource::load(Some(&path)).unwrap();
        let steps = source.lookup_steps("五美元奶昔");
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].title, "Order one");
        assert!(source.contains("法式欧姆蛋"));
    }

    #[test]
    fn test_invalid_data_is_config_error() {
        let err = TomlRecipeSource::from_toml_str("[[dish]]\nname = 3").unwrap_err();
        assert!(matches!(
            err,
            crate::error::PlannerError::Common(xzs_common::Error::Config(_))
        ));
    }

    #[test]
    fn test_video_links_per_platform() {
        let links = video_links("Vegetable Stew");

        assert_eq!(links.len(), 3);
        assert!(links[0].url.starts_with("https://search.bilibili.com/all?keyword="));
        assert!(links[1]
            .url
            .starts_with("https://www.youtube.com/results?search_query=Vegetable"));
        assert!(links[1].url.contains("recipe"));
        assert!(links[2]
            .url
            .starts_with("https://www.xiaohongshu.com/search_result?keyword="));
    }
}
