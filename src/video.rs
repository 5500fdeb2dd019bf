use std::fmt;
use url::Url;

// @module: Video reference parsing

/// A video URL together with the id extracted from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoReference {
    /// URL as given by the user
    pub url: String,
    /// Video id, `None` when nothing usable was found
    pub id: Option<String>,
}

impl VideoReference {
    /// Parse a video URL or a bare id.
    ///
    /// The id is the last non-empty path segment. `av` ids are reduced to
    /// their number, `BV` ids are kept as-is.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();

        let segment = match Url::parse(input) {
            Ok(url) => url
                .path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
                .map(str::to_string),
            Err(_) => input
                .split(['?', '#'])
                .next()
                .and_then(|path| path.split('/').filter(|s| !s.is_empty()).next_back())
                .map(str::to_string),
        };

        let id = segment.map(|s| Self::normalize_id(&s)).filter(|s| !s.is_empty());

        Self {
            url: input.to_string(),
            id,
        }
    }

    fn normalize_id(segment: &str) -> String {
        match segment.get(..2) {
            Some(prefix) if prefix.eq_ignore_ascii_case("av")
                && segment.len() > 2
                && segment[2..].chars().all(|c| c.is_ascii_digit()) =>
            {
                segment[2..].to_string()
            }
            _ => segment.to_string(),
        }
    }

    /// Id or `"unknown"`
    pub fn id_or_unknown(&self) -> &str {
        self.id.as_deref().unwrap_or("unknown")
    }

    /// Label shown for the video link in reports
    pub fn display_label(&self) -> String {
        match &self.id {
            Some(id) if id.starts_with("BV") => id.clone(),
            Some(id) if id.chars().all(|c| c.is_ascii_digit()) => format!("av{}", id),
            Some(id) => id.clone(),
            None => self.url.clone(),
        }
    }
}

impl fmt::Display for VideoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}
