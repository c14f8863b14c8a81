//! Common helper functions for output formatting.

use listfilter_engine::{Combine, CriteriaSet, Criterion};
use owo_colors::OwoColorize;

/// Truncates a string to a maximum number of characters.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        s.to_string()
    }
}

/// Formats one criterion's values, joined by their combination mode.
///
/// `S & M` for AND, `S | M` for OR.
pub fn format_criterion(criterion: &Criterion) -> String {
    if criterion.values.is_empty() {
        return "(any)".to_string();
    }
    let separator = match criterion.combine {
        Combine::And => " & ",
        Combine::Or => " | ",
    };
    criterion.values.join(separator)
}

/// Formats a criterion set as `key: values` pairs.
pub fn format_criteria(criteria: &CriteriaSet) -> String {
    if criteria.is_empty() {
        return "none".to_string();
    }
    criteria
        .iter()
        .map(|(key, criterion)| format!("{key}: {}", format_criterion(criterion)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Formats a `shown/total` count.
pub fn format_count(visible: usize, total: usize, use_colors: bool) -> String {
    let label = format!("{visible}/{total} visible");
    if !use_colors {
        return label;
    }
    if visible == 0 && total > 0 {
        label.red().to_string()
    } else {
        label.green().to_string()
    }
}

/// Applies the dimmed style to hidden entries.
pub fn dim_if(text: &str, hidden: bool, use_colors: bool) -> String {
    if hidden && use_colors {
        text.dimmed().to_string()
    } else {
        text.to_string()
    }
}
