use jobfill::dom::dom_model::EventKind;
use jobfill::dom::page::{Page, page_domain};
use jobfill::field::field_model::FillOutcome;
use jobfill::fill::orchestrator::{capture_fields, fill_page};
use jobfill::profile::profile_model::{DomainMappings, ProfileData, ProfileValue, ProfileValueMap};
use jobfill::trace::logger::TraceLogger;
use serde_json::{Value, json};

use crate::common::utils::{form_page, input, load_page, load_profile, node, profile};

mod common;

fn application() -> (Page, ProfileData) {
    (load_page("application_form.json"), load_profile("profile.json"))
}

// =========================================================================
// Fill pass
// =========================================================================

#[test]
fn fill_fixture_form() {
    let (mut page, data) = application();
    let outcome = jobfill::fill(&mut page, &data);

    assert_eq!(outcome.filled, 7);
    assert_eq!(outcome.skipped, 1, "pre-filled last name is skipped");
    assert_eq!(outcome.not_applied, 0);
    assert_eq!(outcome.unknown_count, 1);

    let doc = &page.document;
    assert_eq!(doc.value(node(&page, "first_name")).unwrap(), "Ada");
    assert_eq!(doc.value(node(&page, "last_name")).unwrap(), "Existing");
    assert_eq!(doc.value(node(&page, "email")).unwrap(), "ada@example.com");
    assert_eq!(doc.value(node(&page, "linkedin")).unwrap(), "https://linkedin.com/in/ada");
    assert_eq!(doc.value(node(&page, "country")).unwrap(), "US");
    assert_eq!(doc.value(node(&page, "about")).unwrap(), "Mathematician and writer.");
    assert!(doc.is_checked(node(&page, "relocate")).unwrap());
}

#[test]
fn fill_reports_unknown_widget_once() {
    let (mut page, data) = application();
    let outcome = jobfill::fill(&mut page, &data);

    let matching: Vec<_> = outcome
        .unknown
        .iter()
        .filter(|u| u.field_name == "custom_widget_42")
        .collect();
    assert_eq!(matching.len(), 1);

    let record = matching[0];
    assert_eq!(record.field_type, "text");
    assert_eq!(record.page_domain, "boards.acme-jobs.com");
    assert_eq!(record.page_url, "https://boards.acme-jobs.com/apply/123");
    assert_eq!(record.field_label, None);
}

#[test]
fn fill_is_idempotent() {
    let (mut page, data) = application();
    let first = jobfill::fill(&mut page, &data);
    let second = jobfill::fill(&mut page, &data);

    assert_eq!(first.filled, 7);
    assert_eq!(second.filled, 0, "second pass must not refill anything");
    assert_eq!(second.skipped, 7, "six filled text-like controls plus the pre-filled one");
    assert_eq!(second.not_applied, 1, "checkbox already in the wanted state");
    assert_eq!(second.unknown_count, 1);
}

#[test]
fn fill_dispatches_framework_visible_events() {
    let (mut page, data) = application();
    jobfill::fill(&mut page, &data);

    let email = node(&page, "email");
    let events: Vec<_> = page.document.events().iter().filter(|e| e.target == email).collect();

    assert_eq!(events.len(), 5);
    assert_eq!(events[0].kind, EventKind::Input);
    assert!(events[0].observed_by_framework, "controlled email input must register the change");
    assert_eq!(events[4].kind, EventKind::Blur);
}

#[test]
fn domain_overrides_win_over_profile() {
    let mut page = form_page(vec![
        input(json!({ "id": "email", "name": "email" })),
        input(json!({ "id": "q", "name": "how_did_you_hear" })),
    ]);
    let data = ProfileData {
        profile: Some(json!({ "email": "ada@example.com" }).as_object().unwrap().clone()),
        field_mappings: Default::default(),
    };
    let overrides: DomainMappings = serde_json::from_value(json!({
        "fieldMappings": { "email": "ada@work.example", "how_did_you_hear": "Referral" }
    }))
    .unwrap();

    let outcome = jobfill::fill_with_overrides(&mut page, &data, &overrides, None);

    assert_eq!(outcome.filled, 2);
    assert_eq!(page.document.value(node(&page, "email")).unwrap(), "ada@work.example");
    assert_eq!(page.document.value(node(&page, "q")).unwrap(), "Referral");
}

#[test]
fn unmatched_select_counts_as_not_applied() {
    let mut page = form_page(vec![json!({
        "tag": "select",
        "attrs": { "id": "degree", "name": "degree" },
        "children": [
            { "tag": "option", "attrs": { "value": "" }, "children": [{ "text": "Choose" }] },
            { "tag": "option", "attrs": { "value": "bs" }, "children": [{ "text": "Bachelor" }] }
        ]
    })]);
    let outcome = fill_page(&mut page, &profile(&[("degree", "Doctorate")]), None);

    assert_eq!(outcome.filled, 0);
    assert_eq!(outcome.not_applied, 1);
    assert_eq!(outcome.unknown_count, 0, "matched fields are never unknown");
}

#[test]
fn blank_profile_value_on_blank_input_is_not_applied() {
    let mut page = form_page(vec![input(json!({ "id": "phone", "name": "phone" }))]);
    let data: ProfileData = serde_json::from_value(json!({ "profile": { "phone": "" } })).unwrap();

    let outcome = jobfill::fill(&mut page, &data);

    assert_eq!(outcome.filled, 0, "writing an empty value over an empty input changes nothing");
    assert_eq!(outcome.not_applied, 1);
    assert_eq!(outcome.unknown_count, 0);
    assert!(page.document.events_for(node(&page, "phone")).is_empty());
}

#[test]
fn radio_group_reports_one_unknown() {
    let mut page = form_page(vec![
        input(json!({ "type": "radio", "name": "tshirt_size", "value": "S" })),
        input(json!({ "type": "radio", "name": "tshirt_size", "value": "M" })),
        input(json!({ "type": "radio", "name": "tshirt_size", "value": "L" })),
    ]);
    let outcome = fill_page(&mut page, &profile(&[("email", "a@b.com")]), None);

    assert_eq!(outcome.unknown_count, 1, "same name on the same domain is reported once");
    assert_eq!(outcome.unknown[0].field_name, "tshirt_size");
    assert_eq!(outcome.unknown[0].field_type, "radio");
}

#[test]
fn controls_without_identifiers_are_not_reported() {
    let mut page = form_page(vec![json!({
        "tag": "div",
        "children": [{ "tag": "div", "children": [input(json!({ "type": "text" }))] }]
    }), input(json!({ "id": "named" }))]);
    let outcome = fill_page(&mut page, &ProfileValueMap::new(), None);

    assert_eq!(outcome.unknown_count, 1);
    assert_eq!(outcome.unknown[0].field_name, "named");
}

#[test]
fn fill_on_empty_page_is_all_zero() {
    let mut page = form_page(vec![]);
    let outcome = jobfill::fill(&mut page, &ProfileData::default());

    assert_eq!(outcome, FillOutcome::default());
}

#[test]
fn fill_outcome_serializes_camel_case() {
    let (mut page, data) = application();
    let value = serde_json::to_value(jobfill::fill(&mut page, &data)).unwrap();

    assert_eq!(value["filled"], 7);
    assert_eq!(value["notApplied"], 0);
    assert_eq!(value["unknownCount"], 1);
    assert_eq!(value["unknown"][0]["fieldName"], "custom_widget_42");
}

// =========================================================================
// Capture
// =========================================================================

#[test]
fn capture_reports_every_reportable_field() {
    let page = load_page("application_form.json");
    let records = jobfill::capture_fields(&page);

    let names: Vec<&str> = records.iter().map(|r| r.field_name.as_str()).collect();
    assert_eq!(names.len(), 9);
    assert!(names.contains(&"email"));
    assert!(names.contains(&"custom_widget_42"));
    assert!(!names.contains(&"password"));

    let email = records.iter().find(|r| r.field_name == "email").unwrap();
    assert_eq!(email.field_label.as_deref(), Some("Email"));
    assert_eq!(email.field_type, "email");
}

#[test]
fn capture_does_not_touch_the_page() {
    let page = load_page("application_form.json");
    capture_fields(&page);
    assert!(page.document.events().is_empty());
}

// =========================================================================
// Profile input
// =========================================================================

#[test]
fn profile_map_skips_metadata_and_synthesizes_full_name() {
    let map = ProfileValueMap::from_profile_data(&load_profile("profile.json"));

    assert!(map.get("id").is_none());
    assert!(map.get("userId").is_none());
    assert!(map.get("createdAt").is_none());
    assert_eq!(map.get("fullName"), Some(&ProfileValue::text("Ada Lovelace")));
    assert_eq!(map.get("skills"), Some(&ProfileValue::text("analysis, poetry")));
    assert_eq!(map.get("graduationYear").and_then(ProfileValue::as_text).as_deref(), Some("1835"));
    assert_eq!(map.keys().next(), Some("firstName"), "insertion order is kept");
}

#[test]
fn profile_map_field_mappings_override_in_place() {
    let data: ProfileData = serde_json::from_value(json!({
        "profile": { "firstName": "Ada", "email": "old@example.com", "lastName": "L" },
        "fieldMappings": { "email": "new@example.com", "referral": null }
    }))
    .unwrap();
    let map = ProfileValueMap::from_profile_data(&data);

    let keys: Vec<&str> = map.keys().collect();
    assert_eq!(keys, vec!["firstName", "email", "lastName", "referral", "fullName"]);
    assert_eq!(map.get("email"), Some(&ProfileValue::text("new@example.com")));
    assert!(map.get("referral").unwrap().is_null());
}

#[test]
fn explicit_full_name_is_kept() {
    let data: ProfileData = serde_json::from_value(json!({
        "profile": { "firstName": "Ada", "lastName": "Lovelace", "fullName": "Augusta Ada King" }
    }))
    .unwrap();
    let map = ProfileValueMap::from_profile_data(&data);

    assert_eq!(map.get("fullName"), Some(&ProfileValue::text("Augusta Ada King")));
}

#[test]
fn profile_values_serialize_as_plain_scalars() {
    let map: ProfileValueMap = [
        ("a", ProfileValue::Bool(true)),
        ("b", ProfileValue::text("x")),
        ("c", ProfileValue::Null),
    ]
    .into_iter()
    .collect();

    let value: Value = serde_json::to_value(&map).unwrap();
    assert_eq!(value, json!({ "a": true, "b": "x", "c": null }));
}

#[test]
fn missing_profile_object_is_tolerated() {
    let data: ProfileData = serde_json::from_value(json!({ "fieldMappings": { "city": "Paris" } })).unwrap();
    let map = ProfileValueMap::from_profile_data(&data);

    assert_eq!(map.len(), 1);
    assert_eq!(map.get("city"), Some(&ProfileValue::text("Paris")));
}

// =========================================================================
// Page helpers and trace
// =========================================================================

#[test]
fn page_domain_is_the_hostname() {
    assert_eq!(page_domain("https://jobs.lever.co/acme/123/apply"), "jobs.lever.co");
    assert_eq!(page_domain("http://localhost:8080/form"), "localhost");
    assert_eq!(page_domain("not a url"), "");
}

#[test]
fn filled_page_round_trips_through_snapshot_file() {
    let (mut page, data) = application();
    jobfill::fill(&mut page, &data);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("filled.json");
    page.save(&path).unwrap();

    let reloaded = Page::load(&path).unwrap();
    assert_eq!(reloaded.url, page.url);
    assert_eq!(reloaded.document.value(node(&reloaded, "first_name")).unwrap(), "Ada");
    assert_eq!(reloaded.document.value(node(&reloaded, "country")).unwrap(), "US");
    assert!(reloaded.document.is_checked(node(&reloaded, "relocate")).unwrap());

    let second = jobfill::fill(&mut Page::load(&path).unwrap(), &data);
    assert_eq!(second.filled, 0);
}

#[test]
fn trace_logger_writes_one_line_per_field() {
    let (mut page, data) = application();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fill_trace.jsonl");

    let tracer = TraceLogger::new(&path);
    assert!(tracer.is_enabled());
    let map = ProfileValueMap::from_profile_data(&data);
    fill_page(&mut page, &map, Some(&tracer));

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    assert_eq!(lines.len(), 9);
    assert_eq!(lines[0]["decision"], "filled");
    assert_eq!(lines[0]["profile_key"], "firstName");
    assert_eq!(lines[0]["strategy"], "normalized_key");
    assert_eq!(lines[0]["page_domain"], "boards.acme-jobs.com");
    assert_eq!(lines[1]["decision"], "skipped");
    assert_eq!(lines[8]["decision"], "unknown");
    assert_eq!(lines[8]["field_name"], "custom_widget_42");
}

#[test]
fn trace_logger_on_unwritable_path_is_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let tracer = TraceLogger::new(dir.path().join("missing").join("trace.jsonl"));
    assert!(!tracer.is_enabled());
}
