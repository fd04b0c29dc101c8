//! Navigable addresses
//!
//! The address is the single source of truth for the browsing tab, the
//! pagination threshold and the workflow step. [`derive_state_from_address`]
//! is a pure parse into a [`SessionView`]; [`write_address`] is its inverse.
//! [`NavigationHistory`] keeps the back/forward stack.
//!
//! Address shapes:
//! - `/?tab=<tab>&count=<n>`: topic browsing
//! - `/workflow/<topic_id>?step=<i>`: workflow session

use percent_encoding::percent_decode_str;
use reqwest::Url;
use std::fmt;
use std::str::FromStr;
use tracing::warn;
use xzs_common::TopicType;

use crate::error::PlannerError;

/// Topics shown per page in the browsing view
pub const PAGE_SIZE: usize = 10;

/// Index of the final workflow step
pub const LAST_STEP_INDEX: usize = 4;

/// Base used only to parse relative addresses
const ADDRESS_BASE: &str = "http://xzstudio.local/";

/// Browsing view filter tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BrowseTab {
    #[default]
    MovieFood,
    FamousRecipe,
    Archaeological,
    Favorites,
}

impl BrowseTab {
    pub const ALL: [BrowseTab; 4] = [
        BrowseTab::MovieFood,
        BrowseTab::FamousRecipe,
        BrowseTab::Archaeological,
        BrowseTab::Favorites,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BrowseTab::MovieFood => "movie_food",
            BrowseTab::FamousRecipe => "famous_recipe",
            BrowseTab::Archaeological => "archaeological",
            BrowseTab::Favorites => "favorites",
        }
    }

    /// Topic type filtered by this tab (`None` for favorites)
    pub fn topic_type(&self) -> Option<TopicType> {
        match self {
            BrowseTab::MovieFood => Some(TopicType::MovieFood),
            BrowseTab::FamousRecipe => Some(TopicType::FamousRecipe),
            BrowseTab::Archaeological => Some(TopicType::Archaeological),
            BrowseTab::Favorites => None,
        }
    }
}

impl fmt::Display for BrowseTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BrowseTab {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BrowseTab::ALL
            .into_iter()
            .find(|tab| tab.as_str() == s)
            .ok_or_else(|| PlannerError::Validation(format!("Unknown tab: {}", s)))
    }
}

/// UI state carried by an address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionView {
    Browse { tab: BrowseTab, visible_count: usize },
    Workflow { topic_id: String, step: usize },
}

impl SessionView {
    pub fn home() -> Self {
        SessionView::Browse {
            tab: BrowseTab::default(),
            visible_count: PAGE_SIZE,
        }
    }
}

/// Parse an address into the view it describes
///
/// Unknown tabs fall back to `movie_food`, counts below one page (or
/// unparsable) fall back to one page, and steps are clamped to `[0, 4]`
/// with unparsable values reading as 0. Unrecognized paths show the
/// browsing view.
pub fn derive_state_from_address(address: &str) -> SessionView {
    let Some(url) = Url::parse(ADDRESS_BASE).ok().and_then(|base| base.join(address).ok()) else {
        return SessionView::home();
    };

    let query = |key: &str| {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    };

    let segments: Vec<String> = match url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).map(decode_segment).collect())
    {
        Some(Some(segments)) => segments,
        Some(None) => {
            warn!("Address {:?} is not valid UTF-8 once decoded, showing home", address);
            return SessionView::home();
        }
        None => Vec::new(),
    };

    match segments.as_slice() {
        [workflow, topic_id] if workflow == "workflow" => SessionView::Workflow {
            topic_id: topic_id.clone(),
            step: parse_step(query("step").as_deref()),
        },
        _ => SessionView::Browse {
            tab: query("tab")
                .and_then(|t| t.parse().ok())
                .unwrap_or_default(),
            visible_count: parse_count(query("count").as_deref()),
        },
    }
}

/// Render a view as an address
pub fn write_address(view: &SessionView) -> String {
    let mut url = match Url::parse(ADDRESS_BASE) {
        Ok(url) => url,
        Err(_) => return "/".to_string(),
    };

    match view {
        SessionView::Browse { tab, visible_count } => {
            {
                let mut pairs = url.query_pairs_mut();
                pairs.append_pair("tab", tab.as_str());
                if *visible_count > PAGE_SIZE {
                    pairs.append_pair("count", &visible_count.to_string());
                }
            }
        }
        SessionView::Workflow { topic_id, step } => {
            if let Ok(mut path) = url.path_segments_mut() {
                path.clear().push("workflow").push(topic_id);
            }
            url.query_pairs_mut()
                .append_pair("step", &(*step).min(LAST_STEP_INDEX).to_string());
        }
    }

    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

fn parse_step(raw: Option<&str>) -> usize {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .map(|step| step.clamp(0, LAST_STEP_INDEX as i64) as usize)
        .unwrap_or(0)
}

fn parse_count(raw: Option<&str>) -> usize {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .map(|count| count.max(PAGE_SIZE as i64) as usize)
        .unwrap_or(PAGE_SIZE)
}

/// Decode `%XX` escapes in a path segment; `None` when the bytes are not UTF-8
fn decode_segment(segment: &str) -> Option<String> {
    percent_decode_str(segment)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

/// Back/forward stack of addresses
#[derive(Debug, Clone)]
pub struct NavigationHistory {
    entries: Vec<String>,
    index: usize,
}

impl NavigationHistory {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: vec![initial.into()],
            index: 0,
        }
    }

    pub fn current(&self) -> &str {
        &self.entries[self.index]
    }

    pub fn view(&self) -> SessionView {
        derive_state_from_address(self.current())
    }

    /// New entry; forward entries are discarded
    pub fn push(&mut self, address: impl Into<String>) {
        self.entries.truncate(self.index + 1);
        self.entries.push(address.into());
        self.index = self.entries.len() - 1;
    }

    /// Overwrite the current entry
    pub fn replace(&mut self, address: impl Into<String>) {
        self.entries[self.index] = address.into();
    }

    pub fn can_go_back(&self) -> bool {
        self.index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn back(&mut self) -> Option<&str> {
        if !self.can_go_back() {
            return None;
        }
        self.index -= 1;
        Some(self.current())
    }

    pub fn forward(&mut self) -> Option<&str> {
        if !self.can_go_forward() {
            return None;
        }
        self.index += 1;
        Some(self.current())
    }
}

impl Default for NavigationHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_defaults() {
        assert_eq!(derive_state_from_address("/"), SessionView::home());
        assert_eq!(derive_state_from_address(""), SessionView::home());
    }

    #[test]
    fn test_browse_tab_and_count() {
        assert_eq!(
            derive_state_from_address("/?tab=famous_recipe&count=30"),
            SessionView::Browse {
                tab: BrowseTab::FamousRecipe,
                visible_count: 30
            }
        );
    }

    #[test]
    fn test_browse_invalid_values_fall_back() {
        assert_eq!(
            derive_state_from_address("/?tab=street_food&count=abc"),
            SessionView::home()
        );
        assert_eq!(
            derive_state_from_address("/?tab=favorites&count=3"),
            SessionView::Browse {
                tab: BrowseTab::Favorites,
                visible_count: PAGE_SIZE
            }
        );
    }

    #[test]
    fn test_workflow_step_clamped() {
        let cases = [
            ("/workflow/t-1", 0),
            ("/workflow/t-1?step=2", 2),
            ("/workflow/t-1?step=9", 4),
            ("/workflow/t-1?step=-3", 0),
            ("/workflow/t-1?step=two", 0),
        ];
        for (address, step) in cases {
            assert_eq!(
                derive_state_from_address(address),
                SessionView::Workflow {
                    topic_id: "t-1".to_string(),
                    step
                },
                "address {}",
                address
            );
        }
    }

    #[test]
    fn test_encoded_topic_id_decoded() {
        assert_eq!(
            derive_state_from_address("/workflow/%E5%8F%B0%20t?step=1"),
            SessionView::Workflow {
                topic_id: "台 t".to_string(),
                step: 1
            }
        );
    }

    #[test]
    fn test_invalid_utf8_segment_rejected() {
        // %FF%FE is not valid UTF-8 and must not be replaced with U+FFFD
        assert_eq!(
            derive_state_from_address("/workflow/%FF%FE?step=2"),
            SessionView::home()
        );
    }

    #[test]
    fn test_write_then_derive_is_stable() {
        let views = [
            SessionView::home(),
            SessionView::Browse {
                tab: BrowseTab::Archaeological,
                visible_count: 20,
            },
            SessionView::Workflow {
                topic_id: "id with space".to_string(),
                step: 3,
            },
        ];
        for view in views {
            assert_eq!(derive_state_from_address(&write_address(&view)), view);
        }
    }

    #[test]
    fn test_write_address_shapes() {
        assert_eq!(
            write_address(&SessionView::Workflow {
                topic_id: "t-1".to_string(),
                step: 2
            }),
            "/workflow/t-1?step=2"
        );
        assert_eq!(write_address(&SessionView::home()), "/?tab=movie_food");
    }

    #[test]
    fn test_history_push_back_forward() {
        let mut history = NavigationHistory::new("/");
        history.push("/workflow/t-1?step=0");
        history.push("/workflow/t-1?step=1");

        assert_eq!(history.back(), Some("/workflow/t-1?step=0"));
        assert_eq!(history.forward(), Some("/workflow/t-1?step=1"));
        assert_eq!(history.forward(), None);

        history.back();
        history.push("/workflow/t-1?step=2");
        assert!(!history.can_go_forward());
        assert_eq!(history.current(), "/workflow/t-1?step=2");
    }

    #[test]
    fn test_history_replace_keeps_depth() {
        let mut history = NavigationHistory::new("/?tab=movie_food");
        history.replace("/?tab=movie_food&count=20");
        assert!(!history.can_go_back());
        assert_eq!(history.current(), "/?tab=movie_food&count=20");
    }
}
