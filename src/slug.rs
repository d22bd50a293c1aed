/// Lowercases, turns spaces into `-`, and drops anything that is neither
/// alphanumeric nor `-`.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('-'),
            c if c.is_alphanumeric() || c == '-' => Some(c),
            _ => None,
        })
        .collect()
}

/// Movies share titles across remakes, so the year is part of their slug.
pub fn movie_slug(title: &str, year: Option<i32>) -> String {
    match year {
        Some(year) => format!("{}-{year}", slugify(title)),
        None => slugify(title),
    }
}
