//! Run command implementation.
//!
//! Loads a page, binds every filter instance on it, replays the requested
//! interactions and reports what stays visible.

use std::fs;
use std::path::PathBuf;

use listfilter_engine::{
    bind_all, BindingError, CycleReport, FilterConfig, FilterInstance, Interaction,
};
use listfilter_page::{Markup, Page, Selector};
use tracing::{debug, warn};

use super::{CommandContext, CommandError, Result};
use crate::output::{format_run_json, format_run_table};

/// Options for the run command.
#[derive(Debug, Default)]
pub struct RunOptions {
    /// Page markup file.
    pub page: PathBuf,
    /// Page URL.
    pub url: String,
    /// Only act on this instance.
    pub instance: Option<String>,
    /// Clear every control first.
    pub reset: bool,
    /// `KEY=VALUE` selections.
    pub select: Vec<String>,
    /// Keys whose enabled toggle is flipped.
    pub toggle: Vec<String>,
    /// `KEY=VALUE` value toggles.
    pub toggle_value: Vec<String>,
    /// Keys whose relation toggle is flipped.
    pub toggle_relation: Vec<String>,
    /// Include the resulting markup.
    pub dump: bool,
}

/// Visibility of one list item after the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemState {
    /// Item text, whitespace-normalized.
    pub text: String,
    /// Whether the item is shown.
    pub visible: bool,
}

/// Final state of one bound instance.
#[derive(Debug)]
pub struct InstanceResult {
    /// Report of the final recompute.
    pub report: CycleReport,
    /// Every list item, in document order.
    pub items: Vec<ItemState>,
}

/// Everything the run command reports.
#[derive(Debug)]
pub struct RunResult {
    /// Page URL after the last interaction.
    pub url: String,
    /// Bound instances, in discovery order.
    pub instances: Vec<InstanceResult>,
    /// Instances that could not be bound.
    pub failures: Vec<BindingError>,
    /// Page markup, when requested.
    pub document: Option<Markup>,
}

/// Executes the run command.
pub fn execute(ctx: &CommandContext, config: &FilterConfig, opts: &RunOptions) -> Result<()> {
    let result = run(config, opts)?;

    if ctx.json_output {
        println!("{}", format_run_json(&result)?);
    } else if !ctx.quiet {
        print!("{}", format_run_table(&result, ctx.use_colors, ctx.verbose));
    }

    if let Some(document) = &result.document {
        if !ctx.json_output {
            println!("{}", serde_json::to_string_pretty(document)?);
        }
    }

    Ok(())
}

/// Binds the page, replays the interactions and collects the final state.
pub fn run(config: &FilterConfig, opts: &RunOptions) -> Result<RunResult> {
    let json = fs::read_to_string(&opts.page)?;
    let mut page = Page::from_json(&json, &opts.url)?;

    // Parse interactions up front so a typo fails before anything is bound.
    let interactions = parse_interactions(opts)?;

    let mut instances = Vec::new();
    let mut failures = Vec::new();
    for bound in bind_all(&mut page, config) {
        match bound {
            Ok(instance) => instances.push(instance),
            Err(e) => failures.push(e),
        }
    }
    let mut instances = select_instances(instances, &failures, opts.instance.as_deref())?;
    if opts.instance.is_some() {
        // The URL starts from the chosen instance's state, not the last bound one's.
        for instance in &mut instances {
            instance.recompute(&mut page);
        }
    }

    if opts.reset {
        for instance in &mut instances {
            instance.reset(&mut page);
        }
    }

    for interaction in &interactions {
        replay(&mut page, &mut instances, interaction)?;
    }

    let url = page.location().to_string();
    let reports = final_reports(&mut page, &mut instances);
    let results = instances
        .iter()
        .zip(reports)
        .map(|(instance, report)| InstanceResult {
            items: item_states(&page, instance, &config.selectors.item),
            report,
        })
        .collect();

    let document = opts
        .dump
        .then(|| page.document.to_markup(page.document.root()));

    Ok(RunResult {
        url,
        instances: results,
        failures,
        document,
    })
}

/// Keeps the requested instance, or all of them.
fn select_instances(
    mut instances: Vec<FilterInstance>,
    failures: &[BindingError],
    wanted: Option<&str>,
) -> Result<Vec<FilterInstance>> {
    match wanted {
        Some(id) => {
            instances.retain(|instance| instance.id() == id);
            if instances.is_empty() {
                if let Some(err) = failures.iter().find(|e| e.instance_id() == id) {
                    return Err(err.clone().into());
                }
                return Err(CommandError::NotFound(format!(
                    "no filter instance '{id}' on the page"
                )));
            }
        }
        None if instances.is_empty() => {
            if let Some(err) = failures.first() {
                return Err(err.clone().into());
            }
            return Err(CommandError::NotFound(
                "no filter instance on the page".to_string(),
            ));
        }
        None => {}
    }
    Ok(instances)
}

/// Sends one interaction to every instance that binds its key.
fn replay(
    page: &mut Page,
    instances: &mut [FilterInstance],
    interaction: &Interaction,
) -> Result<()> {
    let key = interaction.key();
    let mut bound = false;
    let mut handled = false;

    for instance in instances.iter_mut() {
        if !instance.bindings().iter().any(|b| b.key == key) {
            continue;
        }
        bound = true;
        handled |= instance.dispatch(page, interaction).is_some();
    }

    if !bound {
        return Err(CommandError::InvalidArgument(format!(
            "no control for key '{key}'"
        )));
    }
    if handled {
        debug!(?interaction, url = %page.location(), "replayed interaction");
    } else {
        warn!(?interaction, "interaction had no effect");
    }
    Ok(())
}

/// Recomputes every instance for its report, leaving the page URL as the
/// last interaction left it.
fn final_reports(page: &mut Page, instances: &mut [FilterInstance]) -> Vec<CycleReport> {
    let location = page.location().clone();
    let reports = instances
        .iter_mut()
        .filter_map(|instance| instance.recompute(page))
        .collect();
    page.history.replace_state(location);
    reports
}

fn item_states(page: &Page, instance: &FilterInstance, item: &Selector) -> Vec<ItemState> {
    let doc = &page.document;
    doc.select_all(instance.list_root(), item)
        .into_iter()
        .map(|node| ItemState {
            text: doc.text_content(node),
            visible: !doc.flag(node, "hidden"),
        })
        .collect()
}

/// Builds the interaction sequence: selections, enabled toggles, value
/// toggles, then relation toggles, each group in argument order.
fn parse_interactions(opts: &RunOptions) -> Result<Vec<Interaction>> {
    let mut interactions = Vec::new();

    for arg in &opts.select {
        let (key, value) = parse_assignment(arg)?;
        let value = (!value.is_empty()).then_some(value);
        interactions.push(Interaction::Select { key, value });
    }
    for key in &opts.toggle {
        interactions.push(Interaction::ToggleEnabled {
            key: parse_key(key)?,
        });
    }
    for arg in &opts.toggle_value {
        let (key, value) = parse_assignment(arg)?;
        if value.is_empty() {
            return Err(CommandError::InvalidArgument(format!(
                "'{arg}' names no value"
            )));
        }
        interactions.push(Interaction::ToggleValue { key, value });
    }
    for key in &opts.toggle_relation {
        interactions.push(Interaction::ToggleRelation {
            key: parse_key(key)?,
        });
    }

    Ok(interactions)
}

/// Splits `KEY=VALUE`; the value may be empty.
fn parse_assignment(arg: &str) -> Result<(String, String)> {
    let (key, value) = arg.split_once('=').ok_or_else(|| {
        CommandError::InvalidArgument(format!("expected KEY=VALUE, got '{arg}'"))
    })?;
    Ok((parse_key(key)?, value.trim().to_string()))
}

fn parse_key(key: &str) -> Result<String> {
    let key = key.trim();
    if key.is_empty() {
        return Err(CommandError::InvalidArgument("empty filter key".to_string()));
    }
    Ok(key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PAGE: &str = r#"{
        "tag": "body",
        "children": [
            {"tag": "form", "class": "list-filter", "attrs": {"data-filter-id": "shop"}, "children": [
                {"tag": "div", "attrs": {"data-filter-key": "color"}, "children": [
                    {"tag": "select", "children": [
                        {"tag": "option", "attrs": {"value": ""}},
                        {"tag": "option", "attrs": {"value": "red"}},
                        {"tag": "option", "attrs": {"value": "blue"}}
                    ]}
                ]},
                {"tag": "div", "attrs": {"data-filter-key": "size"}, "children": [
                    {"tag": "input", "class": "filter-enabled"},
                    {"tag": "input", "class": "filter-relation"},
                    {"tag": "input", "class": "filter-value", "attrs": {"value": "S"}},
                    {"tag": "input", "class": "filter-value", "attrs": {"value": "M"}}
                ]}
            ]},
            {"tag": "section", "class": "list-filter-target", "attrs": {"data-filter-id": "shop"}, "children": [
                {"tag": "h2", "text": "Tees"},
                {"tag": "ul", "children": [
                    {"tag": "li", "class": "color-red size-S size-M", "text": "Red tee"},
                    {"tag": "li", "class": "color-blue size-S", "text": "Blue tee"}
                ]}
            ]}
        ]
    }"#;

    fn write_page(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("page.json");
        fs::write(&path, PAGE).unwrap();
        path
    }

    fn options(page: PathBuf, url: &str) -> RunOptions {
        RunOptions {
            page,
            url: url.to_string(),
            ..Default::default()
        }
    }

    fn visible(result: &RunResult) -> Vec<&str> {
        result.instances[0]
            .items
            .iter()
            .filter(|i| i.visible)
            .map(|i| i.text.as_str())
            .collect()
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("color=red").unwrap(),
            ("color".to_string(), "red".to_string())
        );
        assert_eq!(
            parse_assignment(" color = ").unwrap(),
            ("color".to_string(), String::new())
        );
        assert!(matches!(
            parse_assignment("color"),
            Err(CommandError::InvalidArgument(_))
        ));
        assert!(matches!(
            parse_assignment("=red"),
            Err(CommandError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parse_interactions_order() {
        let opts = RunOptions {
            select: vec!["color=".to_string()],
            toggle: vec!["size".to_string()],
            toggle_value: vec!["size=S".to_string()],
            toggle_relation: vec!["size".to_string()],
            ..Default::default()
        };
        let interactions = parse_interactions(&opts).unwrap();
        assert_eq!(
            interactions,
            vec![
                Interaction::Select {
                    key: "color".to_string(),
                    value: None
                },
                Interaction::ToggleEnabled {
                    key: "size".to_string()
                },
                Interaction::ToggleValue {
                    key: "size".to_string(),
                    value: "S".to_string()
                },
                Interaction::ToggleRelation {
                    key: "size".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_toggle_value_needs_a_value() {
        let opts = RunOptions {
            toggle_value: vec!["size=".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            parse_interactions(&opts),
            Err(CommandError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_run_seeds_from_url() {
        let dir = TempDir::new().unwrap();
        let opts = options(write_page(&dir), "/shop?color=blue");
        let result = run(&FilterConfig::default(), &opts).unwrap();

        assert_eq!(result.url, "/shop?color=blue");
        assert_eq!(visible(&result), vec!["Blue tee"]);
        assert_eq!(result.instances[0].report.instance, "shop");
        assert!(result.failures.is_empty());
        assert!(result.document.is_none());
    }

    #[test]
    fn test_run_replays_interactions() {
        let dir = TempDir::new().unwrap();
        let opts = RunOptions {
            select: vec!["color=red".to_string()],
            toggle_value: vec!["size=S".to_string(), "size=M".to_string()],
            toggle_relation: vec!["size".to_string()],
            ..options(write_page(&dir), "/shop#top")
        };
        let result = run(&FilterConfig::default(), &opts).unwrap();

        assert_eq!(result.url, "/shop?color=red&size=.S,M#top");
        assert_eq!(visible(&result), vec!["Red tee"]);
        let report = &result.instances[0].report;
        assert_eq!(report.visible_items, 1);
        assert_eq!(report.headings[0].count, 1);
    }

    #[test]
    fn test_reset_runs_before_interactions() {
        let dir = TempDir::new().unwrap();
        let opts = RunOptions {
            reset: true,
            select: vec!["color=red".to_string()],
            ..options(write_page(&dir), "/shop?color=blue&size=S")
        };
        let result = run(&FilterConfig::default(), &opts).unwrap();
        assert_eq!(result.url, "/shop?color=red");
    }

    #[test]
    fn test_unknown_key_is_invalid() {
        let dir = TempDir::new().unwrap();
        let opts = RunOptions {
            toggle: vec!["material".to_string()],
            ..options(write_page(&dir), "/")
        };
        let err = run(&FilterConfig::default(), &opts).unwrap_err();
        assert!(matches!(err, CommandError::InvalidArgument(_)));
        assert!(err.to_string().contains("material"));
    }

    #[test]
    fn test_unknown_instance_is_not_found() {
        let dir = TempDir::new().unwrap();
        let opts = RunOptions {
            instance: Some("blog".to_string()),
            ..options(write_page(&dir), "/")
        };
        let err = run(&FilterConfig::default(), &opts).unwrap_err();
        assert!(matches!(err, CommandError::NotFound(_)));
    }

    #[test]
    fn test_page_without_list_reports_binding_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.json");
        fs::write(
            &path,
            r#"{"tag": "body", "children": [
                {"tag": "form", "class": "list-filter", "attrs": {"data-filter-id": "lonely"}}
            ]}"#,
        )
        .unwrap();
        let err = run(&FilterConfig::default(), &options(path, "/")).unwrap_err();
        assert!(matches!(
            err,
            CommandError::Binding(BindingError::MissingListRoot { .. })
        ));
    }

    #[test]
    fn test_missing_page_file() {
        let dir = TempDir::new().unwrap();
        let opts = options(dir.path().join("missing.json"), "/");
        let err = run(&FilterConfig::default(), &opts).unwrap_err();
        assert!(matches!(err, CommandError::Io(_)));
    }

    #[test]
    fn test_dump_includes_markup() {
        let dir = TempDir::new().unwrap();
        let opts = RunOptions {
            dump: true,
            ..options(write_page(&dir), "/?color=red")
        };
        let result = run(&FilterConfig::default(), &opts).unwrap();
        let document = result.document.unwrap();
        let list = &document.children[1];
        assert_eq!(list.children[0].attrs.get("data-count").map(String::as_str), Some("1"));
        assert!(list.children[1].children[1].attrs.contains_key("hidden"));
    }
}
