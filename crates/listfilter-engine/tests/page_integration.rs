//! Integration tests binding filter instances on a complete page.
//!
//! The page is the shop demo used by the `lf` CLI: a "shop" instance with a
//! single-choice color and a multi-choice size filter, and an unnamed
//! articles instance whose topic filter uses the `t` url variable.

use std::fs;

use listfilter_engine::{bind_all, BindingError, Criterion, FilterConfig, FilterInstance, Interaction};
use listfilter_page::{Page, Selector};
use tempfile::tempdir;

const SHOP: &str = include_str!("../../../demos/shop.json");

fn load(url: &str) -> Page {
    Page::from_json(SHOP, url).expect("demo page should parse")
}

fn bind(page: &mut Page, config: &FilterConfig) -> Vec<FilterInstance> {
    bind_all(page, config)
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .expect("every demo instance should bind")
}

fn visible_in(page: &Page, instance: &FilterInstance) -> Vec<String> {
    let doc = &page.document;
    let li = Selector::parse("li").unwrap();
    doc.select_all(instance.list_root(), &li)
        .into_iter()
        .filter(|&n| !doc.flag(n, "hidden"))
        .map(|n| doc.text_content(n))
        .collect()
}

#[test]
fn test_every_instance_is_seeded_from_the_initial_url() {
    let mut page = load("/catalog?color=red&size=.S,M&t=web_dev#top");
    let instances = bind(&mut page, &FilterConfig::default());

    assert_eq!(instances.len(), 2);
    let (shop, articles) = (&instances[0], &instances[1]);
    assert_eq!(shop.id(), "shop");
    assert_eq!(articles.id(), "list-filter-1");

    assert_eq!(visible_in(&page, shop), ["Red tee"]);
    assert_eq!(
        articles.snapshot(&page).get("topic"),
        Some(&Criterion::any(["web_dev"]))
    );
    assert_eq!(
        visible_in(&page, articles),
        ["Styling forms", "Rust on the web"]
    );

    // The last bound instance rewrote the URL with its own state.
    assert_eq!(page.location().to_string(), "/catalog?t=web_dev#top");
    assert_eq!(page.history.len(), 1);
}

#[test]
fn test_interaction_rewrites_url_with_own_state() {
    let mut page = load("/catalog");
    let mut instances = bind(&mut page, &FilterConfig::default());

    let report = instances[1]
        .dispatch(
            &mut page,
            &Interaction::ToggleEnabled {
                key: "topic".to_string(),
            },
        )
        .unwrap();
    assert_eq!(report.query, "t=rust,web_dev");
    assert_eq!(report.visible_items, 3);

    let report = instances[0]
        .dispatch(
            &mut page,
            &Interaction::Select {
                key: "color".to_string(),
                value: Some("blue".to_string()),
            },
        )
        .unwrap();
    assert_eq!(report.url, "/catalog?color=blue");
    assert_eq!(visible_in(&page, &instances[0]), ["Blue tee", "Blue stripe"]);
    // The articles list keeps its own visibility.
    assert_eq!(visible_in(&page, &instances[1]).len(), 3);
}

#[test]
fn test_heading_counts_follow_filtering() {
    let mut page = load("/catalog?size=L");
    let instances = bind(&mut page, &FilterConfig::default());
    let doc = &page.document;

    let counts: Vec<(String, Option<&str>, bool)> = doc
        .select_all(instances[0].list_root(), &Selector::parse("h2,h3").unwrap())
        .into_iter()
        .map(|h| (doc.text_content(h), doc.attr(h, "data-count"), doc.flag(h, "hidden")))
        .collect();
    assert_eq!(
        counts,
        vec![
            ("Shirts".to_string(), Some("1"), false),
            ("Plain".to_string(), Some("0"), true),
            ("Striped".to_string(), Some("1"), false),
            ("Hats".to_string(), Some("0"), true),
        ]
    );

    let h3 = doc
        .select_first(instances[0].list_root(), &Selector::parse("h3").unwrap())
        .unwrap();
    assert_eq!(doc.attr(h3, "data-depth"), Some("3"));
}

#[test]
fn test_config_file_changes_templates_and_normalization() {
    let temp_dir = tempdir().expect("failed to create temp dir");
    let path = temp_dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
normalize_underscores = false

[templates]
url_var = "f-%key%"
"#,
    )
    .expect("failed to write config");
    let config = FilterConfig::from_toml_str(&fs::read_to_string(&path).unwrap()).unwrap();

    let mut page = load("/catalog?f-color=blue&color=red&t=web_dev");
    let instances = bind(&mut page, &config);

    assert_eq!(instances[0].bindings()[0].url_var, "f-color");
    assert_eq!(visible_in(&page, &instances[0]), ["Blue tee", "Blue stripe"]);
    // Per-key override wins over the template; tags keep their underscore.
    assert_eq!(instances[1].bindings()[0].url_var, "t");
    assert!(visible_in(&page, &instances[1]).is_empty());
}

#[test]
fn test_unknown_identifier_fails_without_affecting_others() {
    let mut page = load("/catalog?color=red");
    let instances = bind(&mut page, &FilterConfig::default());
    let before = page.document.clone();

    let err = FilterInstance::bind(&mut page, "missing", &FilterConfig::default()).unwrap_err();
    assert_eq!(err, BindingError::missing_filter_root("missing"));
    assert_eq!(page.document, before);
    assert_eq!(visible_in(&page, &instances[0]).len(), 3);
}
