//! Snapshot tests
//!
//! Decodes each *.hcl file in /tests/fixtures/ individually with the stock
//! `variables` and `locals` blocks and compares if the decoded document changes.

use hclspec::eval::EvalContext;
use hclspec::schema::Schema;

#[test]
fn snapshots() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("HCLSPEC_LOG"))
        .with_writer(std::io::stderr)
        .init();

    insta::glob!("fixtures/*.hcl", |path| {
        let mut schema = Schema::new(hclspec::blocks::stock());
        let report = schema.parse_hcl_file(path);
        assert!(!report.has_errors(), "{report}");

        let mut context = EvalContext::new();
        let report = schema.parse(&mut context);
        assert!(!report.has_errors(), "{report}");

        let mut rendered = serde_json::Value::Null;
        let report = schema.decode(&context, &mut rendered);
        assert!(!report.has_errors(), "{report}");

        insta::assert_yaml_snapshot!(rendered);
    });
}
