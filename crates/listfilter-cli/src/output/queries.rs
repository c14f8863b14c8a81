//! Decoded query output formatting.

use std::collections::BTreeMap;

use listfilter_engine::{Combine, Criterion};
use owo_colors::OwoColorize;
use serde::Serialize;

use super::helpers::{format_criterion, truncate_str};

/// JSON output structure for the decode command.
#[derive(Serialize)]
pub struct DecodedOutput<'a> {
    pub variables: BTreeMap<&'a str, VariableOutput<'a>>,
}

/// JSON output structure for one decoded variable.
#[derive(Serialize)]
pub struct VariableOutput<'a> {
    pub combine: Combine,
    pub values: &'a [String],
}

/// Formats decoded query variables as JSON.
pub fn format_decoded_json(
    variables: &BTreeMap<String, Criterion>,
) -> Result<String, serde_json::Error> {
    let output = DecodedOutput {
        variables: variables
            .iter()
            .map(|(var, criterion)| {
                (
                    var.as_str(),
                    VariableOutput {
                        combine: criterion.combine,
                        values: &criterion.values,
                    },
                )
            })
            .collect(),
    };
    serde_json::to_string_pretty(&output)
}

/// Formats decoded query variables as a table.
pub fn format_decoded_table(variables: &BTreeMap<String, Criterion>, use_colors: bool) -> String {
    if variables.is_empty() {
        return "No filter variables found.\n".to_string();
    }

    let mut output = String::new();

    let header = format!("{:<20} {:<4} {}", "Variable", "Mode", "Values");
    if use_colors {
        output.push_str(&format!("{}\n", header.dimmed()));
    } else {
        output.push_str(&header);
        output.push('\n');
    }

    for (var, criterion) in variables {
        let name = truncate_str(var, 20);
        let mode = criterion.combine.to_string();
        let values = format_criterion(criterion);
        if use_colors {
            output.push_str(&format!(
                "{:<20} {:<4} {}\n",
                name.cyan(),
                mode.yellow(),
                values
            ));
        } else {
            output.push_str(&format!("{:<20} {:<4} {}\n", name, mode, values));
        }
    }

    output
}
