//! Project-specific utilities live here.

/// Names of the fields whose value is empty or whitespace.
///
/// Presence is the only input validation the API performs.
pub fn blank_fields<'a>(fields: &[(&'a str, &str)]) -> Vec<&'a str> {
    fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect()
}
