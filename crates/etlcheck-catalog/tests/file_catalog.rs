use std::path::PathBuf;

use etlcheck_catalog::{
    CatalogError, FileCatalog, Registration, SourceRegistry, SuiteCatalog, SuiteStore,
    ensure_asset, ensure_batch_definition, ensure_source,
};
use etlcheck_core::{Rule, status_purchase_amount_rule};

fn temp_catalog_dir(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!("etlcheck_{label}_{}", uuid::Uuid::new_v4()))
}

#[test]
fn suites_survive_reopening_the_catalog() {
    let root = temp_catalog_dir("suites");

    {
        let mut store = FileCatalog::open(&root).expect("open catalog");
        let mut catalog = SuiteCatalog::new(&mut store);
        let mut suite = catalog.get_or_create("customers_source").expect("suite");
        catalog.add_rule_if_absent(&mut suite, status_purchase_amount_rule());
        catalog.save(&suite).expect("save suite");
    }

    let mut store = FileCatalog::open(&root).expect("reopen catalog");
    assert_eq!(
        store.list_suites().expect("list suites"),
        vec!["customers_source".to_string()]
    );

    let mut catalog = SuiteCatalog::new(&mut store);
    let mut suite = catalog.get_or_create("customers_source").expect("suite");
    assert_eq!(suite.rules, vec![status_purchase_amount_rule()]);

    assert!(!catalog.add_rule_if_absent(
        &mut suite,
        Rule::column_values_in_set("Tier", ["Gold"])
    ));
    catalog.save(&suite).expect("overwrite suite");
    assert_eq!(
        store.get("customers_source").expect("get").rules.len(),
        1,
        "save overwrites instead of appending"
    );

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn missing_suite_is_not_found() {
    let root = temp_catalog_dir("missing");
    let store = FileCatalog::open(&root).expect("open catalog");
    let err = store.get("nope").unwrap_err();
    assert!(matches!(err, CatalogError::SuiteNotFound(_)));
}

#[test]
fn rejects_suite_names_that_escape_the_catalog() {
    let root = temp_catalog_dir("escape");
    let mut store = FileCatalog::open(&root).expect("open catalog");
    let err = store
        .save(&etlcheck_core::Suite::new("../outside"))
        .unwrap_err();
    assert!(matches!(err, CatalogError::Invalid(_)));
}

#[test]
fn registrations_are_persisted_once() {
    let root = temp_catalog_dir("registry");

    {
        let mut store = FileCatalog::open(&root).expect("open catalog");
        assert_eq!(
            ensure_source(&mut store, "crm").expect("source"),
            Registration::Created
        );
        let (asset, _) = ensure_asset(&mut store, "crm", "customers").expect("asset");
        ensure_batch_definition(&mut store, &asset, "customers_full").expect("batch");
    }

    let mut store = FileCatalog::open(&root).expect("reopen catalog");
    assert_eq!(
        ensure_source(&mut store, "crm").expect("source"),
        Registration::AlreadyExists
    );
    let (asset, registration) = ensure_asset(&mut store, "crm", "customers").expect("asset");
    assert_eq!(registration, Registration::AlreadyExists);
    let (batch, registration) =
        ensure_batch_definition(&mut store, &asset, "customers_full").expect("batch");
    assert_eq!(registration, Registration::AlreadyExists);
    assert_eq!(batch.asset_name, "customers");
    assert_eq!(store.list_sources().expect("sources").len(), 1);

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn saved_suite_records_fingerprint() {
    let root = temp_catalog_dir("fingerprint");
    let mut store = FileCatalog::open(&root).expect("open catalog");
    let mut suite = store.create("customers_target").expect("suite");
    suite.add_rule_if_absent(Rule::column_pair_equal("CustomerID", "CustomerID_db"));
    store.save(&suite).expect("save suite");

    let raw = std::fs::read_to_string(root.join("suites/customers_target.json")).expect("read");
    let document: serde_json::Value = serde_json::from_str(&raw).expect("parse");
    assert_eq!(document["fingerprint"], serde_json::json!(suite.fingerprint()));
    assert_eq!(store.get("customers_target").expect("get"), suite);

    let _ = std::fs::remove_dir_all(&root);
}
