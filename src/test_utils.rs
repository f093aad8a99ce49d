use crate::{
    diag::{self, Files, Sink},
    parser::SchemaParser,
    schema::Schema,
    Path, PathBuf,
};
use std::collections::BTreeMap;

/// Gets the path of a schema fixture in `tests/test_data`
pub fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/test_data");
    path.push(name);
    path
}

/// Parses the schema fixtures, in order, returning the resolved schema and
/// the diagnostics emitted while parsing it
pub fn parse_fixtures(names: &[&str]) -> anyhow::Result<(Schema, Vec<serde_json::Value>)> {
    let paths: Vec<_> = names.iter().map(|name| fixture(name)).collect();

    let mut files = Files::new();
    let mut sink = Sink::new();
    let schema = SchemaParser::default().parse(&paths, &mut files, &mut sink)?;

    Ok((schema, diagnostics_to_json(sink, &files)))
}

/// Converts every diagnostic in the sink into the JSON form emitted by the
/// binary, so tests can use [`field_eq`] and [`assert_field_eq`] on them
pub fn diagnostics_to_json(sink: Sink, files: &Files) -> Vec<serde_json::Value> {
    sink.into_iter()
        .map(|diag| diag::diag_to_json(diag, files))
        .collect()
}

/// Reads every file under the root, keyed by its `/` separated path relative
/// to the root
pub fn read_tree(root: &Path) -> BTreeMap<String, String> {
    let mut tree = BTreeMap::new();

    for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
        let entry = entry.expect("failed to walk directory");
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .expect("entry was outside the root")
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        tree.insert(
            relative,
            fs::read_to_string(entry.path()).expect("failed to read file"),
        );
    }

    tree
}

#[macro_export]
macro_rules! field_eq {
    ($obj:expr, $field:expr, $expected:expr) => {
        $obj.pointer($field) == Some(&serde_json::json!($expected))
    };
}

#[macro_export]
macro_rules! assert_field_eq {
    ($obj:expr, $field:expr, $expected:expr) => {
        assert_eq!($obj.pointer($field), Some(&serde_json::json!($expected)));
    };
}
