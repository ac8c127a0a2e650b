use std::path::PathBuf;

use jobfill::dom::dom_model::NodeId;
use jobfill::dom::page::Page;
use jobfill::dom::snapshot::PageSnapshot;
use jobfill::profile::profile_model::{ProfileData, ProfileValue, ProfileValueMap};
use serde_json::{Value, json};

pub const FORM_URL: &str = "https://jobs.example.com/apply/42";

pub fn fixture(name: &str) -> PathBuf {
    let base = std::env::current_dir().unwrap();
    base.join("tests").join("fixtures").join(name)
}

pub fn load_page(name: &str) -> Page {
    Page::load(&fixture(name)).unwrap()
}

pub fn load_profile(name: &str) -> ProfileData {
    let content = std::fs::read_to_string(fixture(name)).unwrap();
    serde_json::from_str(&content).unwrap()
}

/// Page from a JSON snapshot root.
pub fn page_from(root: Value) -> Page {
    let snapshot: PageSnapshot = serde_json::from_value(json!({ "url": FORM_URL, "root": root })).unwrap();
    Page::from_snapshot(&snapshot).unwrap()
}

/// `<body><form id="app">{children}</form></body>`
pub fn form_page(children: Vec<Value>) -> Page {
    page_from(json!({
        "tag": "body",
        "children": [{ "tag": "form", "attrs": { "id": "app" }, "children": children }]
    }))
}

pub fn input(attrs: Value) -> Value {
    json!({ "tag": "input", "attrs": attrs })
}

pub fn text(t: &str) -> Value {
    json!({ "text": t })
}

pub fn node(page: &Page, dom_id: &str) -> NodeId {
    page.document
        .element_by_id(dom_id)
        .unwrap_or_else(|| panic!("no element with id {}", dom_id))
}

pub fn profile(pairs: &[(&str, &str)]) -> ProfileValueMap {
    pairs
        .iter()
        .map(|(k, v)| (*k, ProfileValue::text(v)))
        .collect()
}

pub fn ids(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
