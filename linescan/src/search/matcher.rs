/// Case-insensitive substring matcher for a single needle.
///
/// The needle is lowercased once at construction; each candidate line is
/// lowercased at match time. Simple `char`-wise lowercasing only, no
/// locale-specific folding.
#[derive(Debug, Clone)]
pub struct LineMatcher {
    needle: String,
}

impl LineMatcher {
    /// Creates a matcher for the given query
    pub fn new(query: &str) -> Self {
        Self {
            needle: query.to_lowercase(),
        }
    }

    /// Tests whether `line` contains the needle, ignoring case
    pub fn is_match(&self, line: &str) -> bool {
        line.to_lowercase().contains(&self.needle)
    }

    /// The lowercased needle this matcher scans for
    pub fn needle(&self) -> &str {
        &self.needle
    }
}
