// Author: Dustin Pilgrim
// License: MIT

#[cfg(test)]
use super::*;
#[cfg(test)]
use crate::config::{Arity, Target};
#[cfg(test)]
use crate::export::{equivalent, export_str_to_json};

const CLUSTER: &str = "mongodbatlas_advanced_cluster";

/// JSON view of `resource "mongodbatlas_advanced_cluster" "<name>"`.
fn cluster_json(text: &str, name: &str) -> serde_json::Value {
    export_str_to_json(text).unwrap()["resource"][CLUSTER][name].clone()
}

#[test]
fn test_pass_through_is_byte_exact() {
    let input = r#"# settings
variable "v" {
  default   = 1 # note
  big       = 9007199254740993
  policy = <<EOT
{ "Version": "2012-10-17" }
EOT
}

resource "mongodbatlas_project" "test" {
  name = "project"
  labels {
    key   = "a"
    value = "b"
  }
}

resource "mongodbatlas_advanced_cluster" "test" {
  name = "cluster"   // nothing to convert
}

data "mongodbatlas_advanced_cluster" "test" {
  name = "cluster"
  timeouts {
    read = "1m"
  }
}
"#;

    let rules = RuleTable::advanced_cluster();
    assert_eq!(convert_str(input, &rules).unwrap(), input);
}

#[test]
fn test_unrelated_blocks_keep_source_text() {
    let unrelated = r#"variable "v" {
  default = 1 # note
  big     = 9007199254740993
  msg = <<EOT
hello ${var.name}
EOT
}
"#;
    let target = r#"
resource "mongodbatlas_advanced_cluster" "test" {
  labels {
    key   = "a"
    value = "b"
  }
}
"#;

    let input = format!("{}{}", unrelated, target);
    let out = convert_str(&input, &RuleTable::advanced_cluster()).unwrap();

    assert!(out.starts_with(unrelated), "got:\n{}", out);
    assert_eq!(cluster_json(&out, "test")["labels"]["a"], "b");
}

#[test]
fn test_list_arity_keeps_order() {
    let input = r#"
resource "mongodbatlas_advanced_cluster" "test" {
  replication_specs {
    zone_name = "Zone 1"
    region_configs {
      region_name = "US_EAST_1"
      priority    = 7
    }
    region_configs {
      region_name = "US_WEST_2"
      priority    = 6
    }
    region_configs {
      region_name = "EU_WEST_1"
      priority    = 5
    }
  }
}
"#;

    let out = convert_str(input, &RuleTable::advanced_cluster()).unwrap();
    let cluster = cluster_json(&out, "test");

    let specs = cluster["replication_specs"].as_array().expect("replication_specs tuple");
    assert_eq!(specs.len(), 1);
    assert_eq!(specs[0]["zone_name"], "Zone 1");

    let names: Vec<_> = specs[0]["region_configs"]
        .as_array()
        .expect("region_configs tuple")
        .iter()
        .filter_map(|r| r["region_name"].as_str())
        .collect();
    assert_eq!(names, vec!["US_EAST_1", "US_WEST_2", "EU_WEST_1"]);
}

#[test]
fn test_list_arity_zero_writes_nothing() {
    let rules = RuleTable::advanced_cluster();
    let input = "resource \"mongodbatlas_advanced_cluster\" \"test\" {\n  name = \"x\"\n}\n";
    let mut body = parse_body(input).unwrap();
    let report = Converter::new(&rules).convert(&mut body).unwrap();

    assert!(report.is_empty());
    assert_eq!(report.targets(), 1);
    assert_eq!(print_body(&body), input);
}

#[test]
fn test_singleton_arity() {
    let rules = RuleTable::new(Target::resource(CLUSTER)).singleton("advanced_configuration");

    // zero instances
    let none = "resource \"mongodbatlas_advanced_cluster\" \"test\" {\n  name = \"x\"\n}\n";
    assert_eq!(convert_str(none, &rules).unwrap(), none);

    // one instance
    let one = r#"
resource "mongodbatlas_advanced_cluster" "test" {
  advanced_configuration {
    javascript_enabled           = true
    minimum_enabled_tls_protocol = "TLS1_2"
  }
}
"#;
    let expected = r#"
resource "mongodbatlas_advanced_cluster" "test" {
  advanced_configuration = {
    javascript_enabled           = true
    minimum_enabled_tls_protocol = "TLS1_2"
  }
}
"#;
    assert!(equivalent(&convert_str(one, &rules).unwrap(), expected).unwrap());

    // two instances
    let two = r#"
resource "mongodbatlas_advanced_cluster" "test" {
  advanced_configuration {
    javascript_enabled = true
  }
  advanced_configuration {
    javascript_enabled = false
  }
}
"#;
    let err = convert_str(two, &rules).unwrap_err();
    assert_eq!(
        err,
        ReshapeError::MultiplicityError {
            field: "advanced_configuration".into(),
            count: 2,
            hint: Some("Keep one 'advanced_configuration' block or declare it as a list".into()),
            code: Some(401),
        }
    );
}

#[test]
fn test_failed_block_is_left_unchanged() {
    let ok = r#"
resource "mongodbatlas_advanced_cluster" "ok" {
  timeouts {
    create = "1h"
  }
}
"#;
    let bad = r#"
resource "mongodbatlas_advanced_cluster" "bad" {
  tags {
    key   = "env"
    value = "dev"
  }
  timeouts {
    create = "1h"
  }
  timeouts {
    create = "2h"
  }
}
"#;

    let rules = RuleTable::new(Target::resource(CLUSTER))
        .keyed_pair("tags")
        .singleton("timeouts");
    let mut body = parse_body(&format!("{}{}", ok, bad)).unwrap();

    let err = Converter::new(&rules).convert(&mut body).unwrap_err();
    assert!(matches!(err, ReshapeError::MultiplicityError { count: 2, .. }));

    let out = print_body(&body);
    assert!(cluster_json(&out, "ok")["timeouts"].is_object());
    // tags ran before timeouts failed, but the block keeps its source form
    assert!(out.ends_with(bad), "got:\n{}", out);
}

#[test]
fn test_keyed_pair_later_wins() {
    let input = r#"
resource "mongodbatlas_advanced_cluster" "test" {
  tags {
    key   = "a"
    value = "1"
  }
  tags {
    key   = "b"
    value = "2"
  }
  tags {
    key   = "a"
    value = "3"
  }
}
"#;

    let rules = RuleTable::advanced_cluster();
    let mut body = parse_body(input).unwrap();
    let report = Converter::new(&rules).convert(&mut body).unwrap();

    let cluster = cluster_json(&print_body(&body), "test");
    let tags = cluster["tags"].as_object().expect("tags map");
    assert_eq!(tags.len(), 2);
    assert_eq!(tags["a"], "3");
    assert_eq!(tags["b"], "2");
    assert!(cluster.get("labels").is_none());

    assert_eq!(
        report.blocks[0].fields,
        vec![FieldConversion {
            name: "tags".into(),
            arity: Arity::keyed_pair(),
            instances: 3,
        }]
    );
}

#[test]
fn test_keyed_pair_custom_names_and_errors() {
    let rules = RuleTable::new(Target::resource(CLUSTER)).with_rule(FieldRule::new(
        "labels",
        Arity::KeyedPair {
            key: "name".into(),
            value: "text".into(),
        },
    ));

    let good = "resource \"mongodbatlas_advanced_cluster\" \"t\" {\n  labels {\n    name = \"k\"\n    text = 10\n  }\n}\n";
    let out = convert_str(good, &rules).unwrap();
    assert!(equivalent(&out, "resource \"mongodbatlas_advanced_cluster\" \"t\" {\n  labels = { k = 10 }\n}\n").unwrap());

    let reference_key = "resource \"mongodbatlas_advanced_cluster\" \"t\" {\n  labels {\n    name = var.k\n    text = 1\n  }\n}\n";
    let err = convert_str(reference_key, &rules).unwrap_err();
    assert!(matches!(err, ReshapeError::InvalidKeyedPair { code: Some(402), .. }));

    let template_key = "resource \"mongodbatlas_advanced_cluster\" \"t\" {\n  labels {\n    name = \"k-${var.k}\"\n    text = 1\n  }\n}\n";
    let err = convert_str(template_key, &rules).unwrap_err();
    assert!(matches!(err, ReshapeError::InvalidKeyedPair { code: Some(402), .. }));

    let missing_value = "resource \"mongodbatlas_advanced_cluster\" \"t\" {\n  labels {\n    name = \"k\"\n  }\n}\n";
    let err = convert_str(missing_value, &rules).unwrap_err();
    assert!(matches!(err, ReshapeError::InvalidKeyedPair { ref message, .. } if message.contains("'text'")));
}

#[test]
fn test_labeled_nested_block_is_unsupported() {
    let input = r#"
resource "mongodbatlas_advanced_cluster" "test" {
  replication_specs {
    region_configs "primary" {
      priority = 7
    }
  }
}
"#;
    let err = convert_str(input, &RuleTable::advanced_cluster()).unwrap_err();
    assert!(matches!(err, ReshapeError::UnsupportedBlock { ref name, .. } if name == "region_configs"));
}

#[test]
fn test_unclassified_nested_blocks_become_tuples() {
    let input = r#"
resource "mongodbatlas_advanced_cluster" "test" {
  timeouts {
    extra {
      a = 1
    }
  }
}
"#;
    let rules = RuleTable::new(Target::resource(CLUSTER)).singleton("timeouts");
    let out = convert_str(input, &rules).unwrap();
    let expected = "resource \"mongodbatlas_advanced_cluster\" \"test\" {\n  timeouts = {\n    extra = [{ a = 1 }]\n  }\n}\n";
    assert!(equivalent(&out, expected).unwrap());
}

#[test]
fn test_attribute_written_at_first_block_position() {
    let input = r#"
resource "mongodbatlas_advanced_cluster" "test" {
  name = "x"
  tags {
    key   = "a"
    value = "1"
  }
  # keep me
  cluster_type = "REPLICASET"
  tags {
    key   = "b"
    value = "2"
  }
}
"#;
    let out = convert_str(input, &RuleTable::advanced_cluster()).unwrap();

    assert!(out.starts_with("\nresource \"mongodbatlas_advanced_cluster\" \"test\" {\n  name = \"x\"\n  tags = {"), "got:\n{}", out);
    assert!(out.ends_with("\n  # keep me\n  cluster_type = \"REPLICASET\"\n}\n"), "got:\n{}", out);

    let expected = r#"
resource "mongodbatlas_advanced_cluster" "test" {
  name = "x"
  tags = {
    a = "1"
    b = "2"
  }
  cluster_type = "REPLICASET"
}
"#;
    assert!(equivalent(&out, expected).unwrap());
}

#[test]
fn test_existing_attribute_is_replaced_in_place() {
    let input = r#"
resource "mongodbatlas_advanced_cluster" "test" {
  tags = { old = "yes" }
  name = "x"
  tags {
    key   = "new"
    value = "yes"
  }
}
"#;
    let out = convert_str(input, &RuleTable::advanced_cluster()).unwrap();
    let expected = r#"
resource "mongodbatlas_advanced_cluster" "test" {
  tags = { new = "yes" }
  name = "x"
}
"#;
    assert!(equivalent(&out, expected).unwrap());
    assert!(out.find("tags").unwrap() < out.find("name").unwrap());
}

#[test]
fn test_rule_order_does_not_matter() {
    let input = r#"
resource "mongodbatlas_advanced_cluster" "test" {
  labels {
    key   = "l"
    value = "1"
  }
  name = "x"
  replication_specs {
    region_configs {
      priority = 7
      electable_specs {
        node_count = 3
      }
    }
  }
  tags {
    key   = "t"
    value = "1"
  }
  timeouts {
    create = "1h"
  }
  replication_specs {
    zone_name = "second"
  }
  advanced_configuration {
    javascript_enabled = true
  }
  labels {
    key   = "m"
    value = "2"
  }
}
"#;

    let base = vec![
        FieldRule::new("replication_specs", Arity::List),
        FieldRule::new("electable_specs", Arity::Singleton),
        FieldRule::new("advanced_configuration", Arity::Singleton),
        FieldRule::new("timeouts", Arity::Singleton),
        FieldRule::new("tags", Arity::keyed_pair()),
        FieldRule::new("labels", Arity::keyed_pair()),
    ];

    let expected = convert_str(input, &RuleTable::with_rules(Target::resource(CLUSTER), base.clone())).unwrap();

    let mut orders = Vec::new();
    permutations(base.len(), &mut (0..base.len()).collect(), &mut orders);
    assert_eq!(orders.len(), 720);

    for order in orders {
        let rules: Vec<FieldRule> = order.iter().map(|&i| base[i].clone()).collect();
        let table = RuleTable::with_rules(Target::resource(CLUSTER), rules);
        assert_eq!(convert_str(input, &table).unwrap(), expected, "order {:?}", order);
    }
}

/// Heap's algorithm.
fn permutations(k: usize, items: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
    if k <= 1 {
        out.push(items.clone());
        return;
    }
    permutations(k - 1, items, out);
    for i in 0..k - 1 {
        let j = if k % 2 == 0 { i } else { 0 };
        items.swap(j, k - 1);
        permutations(k - 1, items, out);
    }
}

#[test]
fn test_advanced_cluster_conversion() {
    let input = r#"
resource "mongodbatlas_project" "test" {
  name   = "project"
  org_id = var.org_id
}

resource "mongodbatlas_advanced_cluster" "test" {
  project_id   = mongodbatlas_project.test.id
  name         = "test-acc"
  cluster_type = "REPLICASET"

  replication_specs {
    region_configs {
      priority      = 7
      provider_name = "AWS"
      region_name   = "US_EAST_1"
      electable_specs {
        node_count    = 3
        instance_size = "M10"
      }
      auto_scaling {
        disk_gb_enabled = true
      }
    }
  }

  advanced_configuration {
    javascript_enabled = true
  }

  tags {
    key   = "team"
    value = "core"
  }
  tags {
    key   = "env"
    value = "dev"
  }
}
"#;

    let expected = r#"
resource "mongodbatlas_project" "test" {
  name   = "project"
  org_id = var.org_id
}

resource "mongodbatlas_advanced_cluster" "test" {
  project_id   = mongodbatlas_project.test.id
  name         = "test-acc"
  cluster_type = "REPLICASET"
  replication_specs = [{
    region_configs = [{
      priority        = 7
      provider_name   = "AWS"
      region_name     = "US_EAST_1"
      electable_specs = { node_count = 3, instance_size = "M10" }
      auto_scaling    = { disk_gb_enabled = true }
    }]
  }]
  advanced_configuration = { javascript_enabled = true }
  tags = {
    env  = "dev"
    team = "core"
  }
}
"#;

    let rules = RuleTable::advanced_cluster();
    let out = convert_str(input, &rules).unwrap();
    assert!(equivalent(&out, expected).unwrap(), "got:\n{}", out);

    // converting again finds nothing left to do
    assert_eq!(convert_str(&out, &rules).unwrap(), out);

    let mut body = parse_body(input).unwrap();
    let report = Converter::new(&rules).convert(&mut body).unwrap();
    let names: Vec<_> = report.blocks[0].fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["replication_specs", "advanced_configuration", "tags"]);
    assert_eq!(report.blocks[0].labels, vec![CLUSTER, "test"]);
    assert_eq!(report.converted_fields(), 3);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["blocks"][0]["fields"][2]["arity"], "keyed_pair");
    assert_eq!(json["blocks"][0]["fields"][2]["key"], "key");
    assert_eq!(json["blocks"][0]["fields"][0]["instances"], 1);
}

#[test]
fn test_converted_values_keep_exact_source_form() {
    let input = r#"
resource "mongodbatlas_advanced_cluster" "test" {
  advanced_configuration {
    oplog_size_mb = 9007199254740993
    ratio         = 0.1
    note          = "cluster-${var.env}"
    policy = <<EOT
{ "Version": "2012-10-17" }
EOT
  }
}
"#;
    let out = convert_str(input, &RuleTable::advanced_cluster()).unwrap();
    assert!(out.contains("9007199254740993"), "got:\n{}", out);

    let cluster = cluster_json(&out, "test");
    let config = &cluster["advanced_configuration"];
    assert_eq!(config["oplog_size_mb"], serde_json::json!(9007199254740993u64));
    assert_eq!(config["note"], "cluster-${var.env}");
    assert_eq!(config["policy"], "{ \"Version\": \"2012-10-17\" }\n");
}

#[test]
fn test_lifecycle_ignore_changes_rewritten() {
    let input = r#"
resource "mongodbatlas_advanced_cluster" "test" {
  name = "x"
  advanced_configuration {
    javascript_enabled = true
  }
  lifecycle {
    ignore_changes = [advanced_configuration[0].x, replication_specs[0].region_configs[0].electable_specs.0.instance_size, name]
  }
}
"#;

    let rules = RuleTable::advanced_cluster();
    let mut body = parse_body(input).unwrap();
    let report = Converter::new(&rules).convert(&mut body).unwrap();
    let out = print_body(&body);

    assert!(
        out.contains("  lifecycle {\n    ignore_changes = [advanced_configuration.x, replication_specs[0].region_configs[0].electable_specs.instance_size, name]\n  }\n"),
        "got:\n{}",
        out
    );
    assert_eq!(report.blocks[0].ignore_changes, 2);

    // a second run has nothing left to rewrite
    let again = convert_str(&out, &rules).unwrap();
    assert_eq!(again, out);
}

#[test]
fn test_lifecycle_rewrite_can_be_disabled() {
    let input = r#"
resource "mongodbatlas_advanced_cluster" "test" {
  lifecycle {
    ignore_changes = [
      advanced_configuration.0.javascript_enabled, # legacy index
      tags,
    ]
  }
}
"#;
    let rules = RuleTable::advanced_cluster();

    let mut untouched = parse_body(input).unwrap();
    Converter::new(&rules)
        .rewrite_lifecycle(false)
        .convert(&mut untouched)
        .unwrap();
    assert_eq!(print_body(&untouched), input);

    let out = convert_str(input, &rules).unwrap();
    assert_eq!(
        out,
        input.replace(
            "advanced_configuration.0.javascript_enabled",
            "advanced_configuration.javascript_enabled"
        )
    );
}

#[test]
fn test_lifecycle_outside_target_is_untouched() {
    let input = r#"
resource "mongodbatlas_project" "test" {
  lifecycle {
    ignore_changes = [advanced_configuration[0].x]
  }
}
"#;
    assert_eq!(convert_str(input, &RuleTable::advanced_cluster()).unwrap(), input);
}

#[test]
fn test_convert_str_propagates_parse_errors() {
    let err = convert_str("resource \"x\" {", &RuleTable::advanced_cluster()).unwrap_err();
    assert!(matches!(err, ReshapeError::SyntaxError { code: Some(201), .. }));
}

#[test]
fn test_lift_copies_attributes_and_shapes_blocks() {
    let body = parse_body("a = 1\nb = var.x # ref\ntimeouts {\n  create = \"1h\"\n}\nitem {\n  n = 1\n}\nitem {\n  n = 2\n}\n").unwrap();
    let rules = RuleTable::new(Target::new("x")).singleton("timeouts");

    let value = lift(&body, &rules).unwrap();
    let fields = value.as_object().unwrap();
    let keys: Vec<_> = fields.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["a", "b", "timeouts", "item"]);
    assert_eq!(fields["b"].to_string(), "var.x");
    assert!(matches!(&fields["timeouts"], Value::Object(_)));
    assert_eq!(fields["item"].as_tuple().map(Vec::len), Some(2));

    // the input is untouched
    assert_eq!(body.child_blocks().count(), 3);
}

#[test]
fn test_nested_block_named_like_attribute() {
    let rules = RuleTable::new(Target::resource(CLUSTER)).singleton("timeouts");

    let block_last = parse_body("extra = 1\nextra {\n  a = 2\n}\n").unwrap();
    let value = lift(&block_last, &rules).unwrap();
    assert_eq!(value.as_object().map(|f| f.len()), Some(1));
    assert_eq!(value.get("extra").and_then(Value::as_tuple).map(Vec::len), Some(1));

    let block_first = parse_body("extra {\n  a = 2\n}\nextra = 1\n").unwrap();
    let value = lift(&block_first, &rules).unwrap();
    assert!(value.get("extra").and_then(Value::as_tuple).is_some());

    let input = r#"
resource "mongodbatlas_advanced_cluster" "test" {
  timeouts {
    create = "1h"
    create {
      when = "now"
    }
  }
}
"#;
    let out = convert_str(input, &rules).unwrap();
    let timeouts = &cluster_json(&out, "test")["timeouts"];
    assert_eq!(timeouts["create"][0]["when"], "now");
}

#[test]
fn test_converter_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Converter<'static>>();
    assert_send_sync::<RuleTable>();
}
