use etlcheck_core::{Rule, Suite, status_purchase_amount_rule};

#[test]
fn serializes_suite_deterministically() {
    let mut suite = Suite::new("customers_source");
    suite.add_rule_if_absent(status_purchase_amount_rule());

    let json = serde_json::to_string_pretty(&suite).expect("serialize suite");
    let expected = r#"{
  "suite_version": "0.1",
  "name": "customers_source",
  "rules": [
    {
      "kind": "column_values_in_set",
      "parameters": {
        "column": "Status",
        "value_set": [
          "Active",
          "Pending"
        ]
      },
      "row_condition": "PurchaseAmount > 0"
    }
  ]
}"#;
    assert_eq!(json, expected);
}

#[test]
fn suite_documents_round_trip_without_optional_fields() {
    let suite: Suite = serde_json::from_str(
        r#"{"name": "target", "rules": [{"kind": "column_pair_equal",
            "parameters": {"column_a": "CustomerID", "column_b": "CustomerID_db"}}]}"#,
    )
    .expect("parse suite");

    assert_eq!(suite.suite_version, etlcheck_core::SUITE_VERSION);
    assert_eq!(suite.rules, vec![Rule::column_pair_equal("CustomerID", "CustomerID_db")]);
}
