//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Count followed by the Lithuanian noun for "item" in the matching case.
///
/// Usage in templates: `{{ cart.item_count()|items }}` renders `3 prekės`.
#[askama::filter_fn]
pub fn items(count: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let text = count.to_string();
    let noun = text.parse::<u64>().map_or("prekių", item_noun);
    Ok(format!("{text} {noun}"))
}

/// 1, 21, 31… take the nominative singular; 2–9 (outside the teens) the
/// nominative plural; 0, 10–20 and round tens the genitive plural.
fn item_noun(n: u64) -> &'static str {
    let last = n % 10;
    let teens = (11..=19).contains(&(n % 100));
    if last == 1 && !teens {
        "prekė"
    } else if last >= 2 && !teens {
        "prekės"
    } else {
        "prekių"
    }
}
