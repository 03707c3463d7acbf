use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Minimum vote count applied together with a star threshold
const MIN_VOTES_FOR_STAR_FILTER: u32 = 50;

/// Browse tab of the catalog grid
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CatalogTab {
    #[default]
    NowPlaying,
    TopRated,
    Upcoming,
}

/// Filter selection for discovery browsing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CatalogFilters {
    pub tab: CatalogTab,
    pub genre: Option<u32>,
    pub year: Option<i32>,
    /// Minimum rating on the 5-star scale; 0 disables the filter.
    pub min_stars: u8,
}

impl CatalogFilters {
    /// Translates the selection into discovery query parameters.
    pub fn to_params(&self, today: NaiveDate) -> DiscoverParams {
        let today = today.format("%Y-%m-%d").to_string();
        let mut params = DiscoverParams::new();

        let sort = match self.tab {
            CatalogTab::TopRated => "vote_average.desc",
            CatalogTab::NowPlaying | CatalogTab::Upcoming => "popularity.desc",
        };
        params.set("sort_by", sort);

        match self.tab {
            CatalogTab::Upcoming => params.set("primary_release_date.gte", &today),
            CatalogTab::NowPlaying => params.set("primary_release_date.lte", &today),
            CatalogTab::TopRated => {}
        }

        if let Some(genre) = self.genre {
            params.set("with_genres", genre);
        }
        if let Some(year) = self.year {
            params.set("primary_release_year", year);
        }
        if self.min_stars > 0 {
            params.set("vote_average.gte", u32::from(self.min_stars) * 2);
            params.set("vote_count.gte", MIN_VOTES_FOR_STAR_FILTER);
        }

        params
    }
}

/// Ordered query parameters for the discovery endpoint
///
/// The page number is never stored here; the pagination layer supplies it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DiscoverParams(BTreeMap<String, String>);

impl DiscoverParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: impl ToString) {
        self.0.insert(key.to_string(), value.to_string());
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Key/value pairs with empty values dropped.
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.0
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}

/// What the catalog grid is currently showing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogQuery {
    Discover(DiscoverParams),
    Search(String),
}

impl CatalogQuery {
    /// Search wins over filters whenever the text box holds anything but whitespace.
    pub fn from_input(text: &str, filters: &CatalogFilters, today: NaiveDate) -> Self {
        let text = text.trim();
        if text.is_empty() {
            CatalogQuery::Discover(filters.to_params(today))
        } else {
            CatalogQuery::Search(text.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
    }

    #[test]
    fn test_now_playing_defaults() {
        let params = CatalogFilters::default().to_params(today());
        assert_eq!(params.get("sort_by"), Some("popularity.desc"));
        assert_eq!(params.get("primary_release_date.lte"), Some("2024-05-17"));
        assert_eq!(params.get("primary_release_date.gte"), None);
        assert_eq!(params.get("vote_average.gte"), None);
        assert_eq!(params.get("vote_count.gte"), None);
    }

    #[test]
    fn test_top_rated_has_no_date_bound() {
        let filters = CatalogFilters {
            tab: CatalogTab::TopRated,
            ..Default::default()
        };
        let params = filters.to_params(today());
        assert_eq!(params.get("sort_by"), Some("vote_average.desc"));
        assert_eq!(params.get("primary_release_date.lte"), None);
        assert_eq!(params.get("primary_release_date.gte"), None);
    }

    #[test]
    fn test_upcoming_with_all_filters() {
        let filters = CatalogFilters {
            tab: CatalogTab::Upcoming,
            genre: Some(28),
            year: Some(2024),
            min_stars: 4,
        };
        let params = filters.to_params(today());
        assert_eq!(params.get("primary_release_date.gte"), Some("2024-05-17"));
        assert_eq!(params.get("with_genres"), Some("28"));
        assert_eq!(params.get("primary_release_year"), Some("2024"));
        assert_eq!(params.get("vote_average.gte"), Some("8"));
        assert_eq!(params.get("vote_count.gte"), Some("50"));
    }

    #[test]
    fn test_pairs_skip_empty_values() {
        let params = DiscoverParams::new()
            .with("sort_by", "popularity.desc")
            .with("with_genres", "");
        assert_eq!(params.pairs(), vec![("sort_by", "popularity.desc")]);
    }

    #[test]
    fn test_query_from_input() {
        let filters = CatalogFilters::default();
        assert_eq!(
            CatalogQuery::from_input("  dune ", &filters, today()),
            CatalogQuery::Search("dune".to_string())
        );
        assert!(matches!(
            CatalogQuery::from_input("   ", &filters, today()),
            CatalogQuery::Discover(_)
        ));
    }
}
