//! Diesel row/insert structs mirroring `schema.rs`, convertible to and from
//! the domain layer.

pub mod audit;
pub mod booking;
pub mod business;
pub mod category;
#[cfg(feature = "server")]
pub mod config;
pub mod service;
pub mod user;

/// Join a list of values into the newline-separated text form used for
/// list-valued columns (gallery URLs, category tags).
pub(crate) fn join_lines<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|v| v.as_ref().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split a newline-separated text column back into its values.
pub(crate) fn split_lines(value: &str) -> Vec<String> {
    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
