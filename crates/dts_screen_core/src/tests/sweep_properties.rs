//! Run counts, identifiers and ordering for a range of templates

use crate::combinations::{combination_count, generate_combinations};
use crate::materialize::materialize_runs;
use crate::model::{ParameterValue, id_width};
use crate::template::Template;

/// Number of runs equals the product of value counts for assorted shapes
#[test]
fn test_run_count_is_product_of_lengths() {
    let cases = [
        ("A = <<a:1,2,3>>", 3),
        ("A = <<a:1,2,3>> B = <<b:0:1:0.5>>", 9),
        ("A = <<a:x>> B = <<b:y>>", 1),
        ("A = <<a:0:9:1>> B = <<b:0:9:1>> C = <<c:0:9:1>>", 1000),
        ("A = <<a:1,2>> B = <<b:1,2>> C = <<c:1,2>> D = <<d:1,2,3>>", 24),
    ];

    for (raw, expected) in cases {
        let template = Template::parse(raw).unwrap();
        assert_eq!(combination_count(&template.parameters), expected, "{raw}");
        assert_eq!(generate_combinations(&template.parameters).len(), expected, "{raw}");
    }
}

/// Identifiers are dense, 1-based and padded to min(digits, 4)
#[test]
fn test_run_ids_are_dense_and_padded() {
    let dir = tempfile::tempdir().unwrap();
    let template = Template::parse("A = <<a:1:12:1>>\n").unwrap();
    let combos = generate_combinations(&template.parameters);
    let runs = materialize_runs(&template, &combos, dir.path()).unwrap();

    let ids: Vec<&str> = runs.iter().map(|r| r.run_id.as_str()).collect();
    let expected: Vec<String> = (1..=12).map(|i| format!("run_{i:02}")).collect();
    assert_eq!(ids, expected);
}

#[test]
fn test_id_width_is_capped() {
    assert_eq!(id_width(6), 1);
    assert_eq!(id_width(10), 2);
    assert_eq!(id_width(999), 3);
    assert_eq!(id_width(1000), 4);
    assert_eq!(id_width(99_999), 4);
}

/// Every combination is distinct when the value lists are distinct
#[test]
fn test_combinations_are_distinct() {
    let template = Template::parse("<<a:1,2,3>> <<b:0:2:1>> <<c:p,q>>").unwrap();
    let combos = generate_combinations(&template.parameters);
    for (i, a) in combos.iter().enumerate() {
        for b in &combos[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

/// Rendering every combination leaves no placeholders behind
#[test]
fn test_render_replaces_every_placeholder() {
    let raw = "A = <<a:1,2>>\nB = {{b:0.5:1.0:0.5}}\nA again = <<a:1,2>>\n";
    let template = Template::parse(raw).unwrap();
    for assignment in generate_combinations(&template.parameters) {
        let rendered = template.render(&assignment);
        assert!(!rendered.contains("<<"), "{rendered}");
        assert!(!rendered.contains("{{"), "{rendered}");
    }

    let first = &generate_combinations(&template.parameters)[0];
    assert_eq!(first["b"], ParameterValue::Number(0.5));
    assert_eq!(template.render(first), "A = 1\nB = 0.5\nA again = 1\n");
}
