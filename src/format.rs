//! Display helpers shared by list, carousel and detail views.

use crate::models::Movie;

const MISSING_YEAR: &str = "—";

pub const DEFAULT_POSTER_SIZE: &str = "w342";
pub const DEFAULT_BACKDROP_SIZE: &str = "w780";
pub const DEFAULT_PROFILE_SIZE: &str = "w185";

/// Release year from an ISO date, or a dash when unknown.
pub fn year_of(date: Option<&str>) -> String {
    match date.map(str::trim) {
        Some(d) if !d.is_empty() => d.chars().take(4).collect(),
        _ => MISSING_YEAR.to_string(),
    }
}

/// Converts a 0–10 vote average to the 5-star scale, one decimal place.
pub fn to_five_star(vote_average: f64) -> f64 {
    ((vote_average / 2.0) * 10.0).round() / 10.0
}

/// Short human form of a count: `950`, `1.2K`, `3.4M`, `1B`.
pub fn compact(n: u64) -> String {
    const UNITS: [(u64, &str); 4] = [
        (1_000_000_000_000, "T"),
        (1_000_000_000, "B"),
        (1_000_000, "M"),
        (1_000, "K"),
    ];

    for (i, (scale, suffix)) in UNITS.iter().enumerate() {
        if n >= *scale {
            let value = (n as f64 / *scale as f64 * 10.0).round() / 10.0;
            // 999_950 rounds up to 1000K; show it as 1M
            if value >= 1000.0 && i > 0 {
                return format!("1{}", UNITS[i - 1].1);
            }
            return format!("{}{}", trim_decimal(value), suffix);
        }
    }
    n.to_string()
}

fn trim_decimal(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as u64)
    } else {
        format!("{:.1}", value)
    }
}

/// Resolves image paths against the image CDN
///
/// `None` means the caller should render its placeholder artwork.
#[derive(Debug, Clone)]
pub struct ImageUrls {
    base: String,
}

impl ImageUrls {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    fn resolve(&self, path: Option<&str>, size: &str) -> Option<String> {
        path.filter(|p| !p.is_empty())
            .map(|p| format!("{}/{}{}", self.base, size, p))
    }

    pub fn poster(&self, path: Option<&str>, size: &str) -> Option<String> {
        self.resolve(path, size)
    }

    pub fn backdrop(&self, path: Option<&str>, size: &str) -> Option<String> {
        self.resolve(path, size)
    }

    pub fn profile(&self, path: Option<&str>, size: &str) -> Option<String> {
        self.resolve(path, size)
    }

    /// Background artwork for a movie: backdrop, falling back to the poster.
    pub fn backdrop_for(&self, movie: &Movie, size: &str) -> Option<String> {
        let path = movie
            .backdrop_path
            .as_deref()
            .or(movie.poster_path.as_deref());
        self.backdrop(path, size)
    }
}
