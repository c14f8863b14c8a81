//! Run output formatting.

use listfilter_engine::CriteriaSet;
use listfilter_page::Markup;
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::commands::run::{InstanceResult, RunResult};

use super::helpers::{dim_if, format_count, format_criteria, truncate_str};

/// Items longer than this are cut in tables.
const ITEM_WIDTH: usize = 60;

/// JSON output structure for the run command.
#[derive(Serialize)]
pub struct RunOutput<'a> {
    pub url: &'a str,
    pub instances: Vec<InstanceOutput<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<&'a Markup>,
}

/// JSON output structure for one instance.
#[derive(Serialize)]
pub struct InstanceOutput<'a> {
    pub id: &'a str,
    pub query: &'a str,
    pub criteria: &'a CriteriaSet,
    pub visible_items: usize,
    pub total_items: usize,
    pub blocks: &'a [usize],
    pub headings: Vec<HeadingOutput<'a>>,
    pub items: Vec<ItemOutput<'a>>,
}

/// JSON output structure for one heading.
#[derive(Serialize)]
pub struct HeadingOutput<'a> {
    pub title: &'a str,
    pub depth: u32,
    pub count: usize,
    pub visible: bool,
}

/// JSON output structure for one item.
#[derive(Serialize)]
pub struct ItemOutput<'a> {
    pub text: &'a str,
    pub visible: bool,
}

/// JSON output structure for an instance that failed to bind.
#[derive(Serialize)]
pub struct ErrorOutput {
    pub instance: String,
    pub message: String,
}

fn instance_output(result: &InstanceResult) -> InstanceOutput<'_> {
    let report = &result.report;
    InstanceOutput {
        id: &report.instance,
        query: &report.query,
        criteria: &report.criteria,
        visible_items: report.visible_items,
        total_items: report.total_items,
        blocks: &report.blocks,
        headings: report
            .headings
            .iter()
            .map(|h| HeadingOutput {
                title: &h.title,
                depth: h.depth,
                count: h.count,
                visible: h.visible,
            })
            .collect(),
        items: result
            .items
            .iter()
            .map(|i| ItemOutput {
                text: &i.text,
                visible: i.visible,
            })
            .collect(),
    }
}

/// Formats a run result as JSON.
pub fn format_run_json(result: &RunResult) -> Result<String, serde_json::Error> {
    let output = RunOutput {
        url: &result.url,
        instances: result.instances.iter().map(instance_output).collect(),
        errors: result
            .failures
            .iter()
            .map(|e| ErrorOutput {
                instance: e.instance_id().to_string(),
                message: e.to_string(),
            })
            .collect(),
        document: result.document.as_ref(),
    };
    serde_json::to_string_pretty(&output)
}

/// Formats a run result as a table.
///
/// Hidden items are listed only when `verbose`; otherwise they are counted.
pub fn format_run_table(result: &RunResult, use_colors: bool, verbose: bool) -> String {
    let mut output = String::new();

    for (i, instance) in result.instances.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        format_instance(&mut output, instance, use_colors, verbose);
    }

    output.push('\n');
    if use_colors {
        output.push_str(&format!("{} {}\n", "URL:".bold(), result.url));
    } else {
        output.push_str(&format!("URL: {}\n", result.url));
    }

    for failure in &result.failures {
        let line = format!("Skipped: {failure}");
        if use_colors {
            output.push_str(&format!("{}\n", line.yellow()));
        } else {
            output.push_str(&line);
            output.push('\n');
        }
    }

    output
}

fn format_instance(output: &mut String, result: &InstanceResult, use_colors: bool, verbose: bool) {
    let report = &result.report;

    let id = if use_colors {
        report.instance.cyan().bold().to_string()
    } else {
        report.instance.clone()
    };
    output.push_str(&format!(
        "{}  {}\n",
        id,
        format_count(report.visible_items, report.total_items, use_colors)
    ));
    output.push_str(&format!("  Filters: {}\n", format_criteria(&report.criteria)));

    let min_depth = report.headings.iter().map(|h| h.depth).min().unwrap_or(0);
    for heading in &report.headings {
        let indent = "  ".repeat((heading.depth - min_depth) as usize + 1);
        let line = format!("{indent}{} ({})", heading.title, heading.count);
        output.push_str(&dim_if(&line, !heading.visible, use_colors));
        output.push('\n');
    }

    output.push_str("  Items:\n");
    let mut hidden = 0;
    for item in &result.items {
        if !item.visible && !verbose {
            hidden += 1;
            continue;
        }
        let marker = if item.visible { "+" } else { "-" };
        let line = format!("    {marker} {}", truncate_str(&item.text, ITEM_WIDTH));
        output.push_str(&dim_if(&line, !item.visible, use_colors));
        output.push('\n');
    }
    if hidden > 0 {
        let line = format!("    ({hidden} hidden)");
        output.push_str(&dim_if(&line, true, use_colors));
        output.push('\n');
    }
}
