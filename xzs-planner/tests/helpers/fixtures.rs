//! Topic fixtures in the backend's wire format

use serde_json::json;
use xzs_common::TopicCandidate;

/// `movie_food` topic with no ingredient list
pub fn movie_topic(id: &str, work_name: &str, dish: &str) -> TopicCandidate {
    serde_json::from_value(json!({
        "id": id,
        "topic_type": "movie_food",
        "work_name": work_name,
        "work_type": "film",
        "douban_score": 8.1,
        "release_year": 2007,
        "food_scene_description": "A food critic takes one bite and is back in his mother's kitchen",
        "recommended_dish": dish,
        "story_angles": [
            {"angle_type": "情感共鸣", "title": "Taste memory", "description": "One bite, one childhood", "potential_score": 9}
        ],
        "footage_sources": ["film"],
        "footage_available": true,
        "cooking_difficulty": "中等",
        "is_interesting": true,
        "is_discussable": true,
        "total_score": 8.4,
        "collected_at": "2026-01-01T10:00:00",
        "source": "curated"
    }))
    .expect("movie topic fixture")
}

/// `famous_recipe` topic with an explicit ingredient list
pub fn famous_topic(id: &str) -> TopicCandidate {
    serde_json::from_value(json!({
        "id": id,
        "topic_type": "famous_recipe",
        "work_name": "Blue Hill",
        "recommended_dish": "Roasted Carrot",
        "food_scene_description": "Carrots roasted whole in the embers",
        "restaurant_name": "Blue Hill",
        "chef_name": "Dan",
        "michelin_stars": 1,
        "ingredients": [
            {"name": "Carrot", "amount": "6"},
            {"name": "Butter", "amount": "30g"},
            {"name": "Salt", "amount": "a pinch", "is_pantry": true}
        ],
        "cooking_difficulty": "简单",
        "total_score": 7.0,
        "collected_at": "2026-01-02T10:00:00",
        "source": "curated"
    }))
    .expect("famous topic fixture")
}

/// `archaeological` topic recorded in 1867
pub fn archaeological_topic(id: &str) -> TopicCandidate {
    serde_json::from_value(json!({
        "id": id,
        "topic_type": "archaeological",
        "work_name": "Victorian Kitchen",
        "recommended_dish": "Jelly Tower",
        "food_scene_description": "A wobbling jelly tower on a silver stand",
        "year_origin": 1867,
        "historical_source": "an 1867 household book",
        "cooking_difficulty": "困难",
        "total_score": 6.5,
        "collected_at": "2026-01-03T10:00:00",
        "source": "archive"
    }))
    .expect("archaeological topic fixture")
}

/// Pool of `n` movie topics named "Film 1".."Film n"
pub fn movie_pool(n: usize) -> Vec<TopicCandidate> {
    (1..=n)
        .map(|i| movie_topic(&format!("m-{}", i), &format!("Film {}", i), "Noodles"))
        .collect()
}
