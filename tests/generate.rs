use ldap_codegen::{
    assert_field_eq,
    diag::{Files, Sink},
    gen::{ArtifactKind, Settings},
    test_utils as tu, PathBuf,
};

struct Output {
    _td: tempfile::TempDir,
    settings: Settings,
}

impl Output {
    fn new() -> Self {
        let td = tempfile::tempdir().unwrap();
        let root = PathBuf::from_path_buf(td.path().join("out")).unwrap();

        Self {
            _td: td,
            settings: Settings::new(root, "com.example.directory"),
        }
    }

    fn compile(&self) -> (ldap_codegen::gen::Report, Vec<serde_json::Value>) {
        let schema_files = [
            tu::fixture("schema/core.dxc"),
            tu::fixture("schema/people.dxc"),
        ];

        let mut files = Files::new();
        let mut sink = Sink::new();

        let report =
            ldap_codegen::compile(&schema_files, &self.settings, &mut files, &mut sink).unwrap();
        (report, tu::diagnostics_to_json(sink, &files))
    }

    fn tree(&self) -> Vec<String> {
        tu::read_tree(&self.settings.output_root)
            .into_keys()
            .collect()
    }
}

#[test]
fn generates_every_artifact() {
    let out = Output::new();
    let (report, diags) = out.compile();

    assert!(report.skipped.is_empty());
    assert!(report.removed.is_empty());
    assert_eq!(report.written.len(), 6);

    // The only diagnostic is the synthesized `description`
    assert_eq!(diags.len(), 1);
    assert_field_eq!(diags[0], "/fields/severity", "warning");

    insta::assert_debug_snapshot!(out.tree(), @r###"
    [
        "com/example/directory/mappers/EmployeeMapper.rs",
        "com/example/directory/mappers/OrganizationMapper.rs",
        "com/example/directory/mappers/PersonMapper.rs",
        "com/example/directory/types/Employee.rs",
        "com/example/directory/types/Organization.rs",
        "com/example/directory/types/Person.rs",
    ]
    "###);

    let employee = std::fs::read_to_string(
        out.settings
            .artifact_path(ArtifactKind::Entity, "Employee"),
    )
    .unwrap();

    assert!(employee.contains("pub struct Employee {"), "{employee}");
    assert!(employee.contains("pub employee_number: String,"), "{employee}");
    assert!(employee.contains("pub cn: String,"), "{employee}");
    assert!(employee.contains("pub description: Option<String>,"), "{employee}");
    assert!(employee.contains(r#"Some("Person")"#), "{employee}");
    assert!(employee.contains(r#"Some("employeeNumber")"#), "{employee}");
    assert!(
        employee.contains("into `com.example.directory.types`"),
        "{employee}"
    );

    // Inherited attributes are reached through the embedded parent
    assert!(employee.contains("use super::Person;"), "{employee}");
    assert!(employee.contains("pub parent: Person,"), "{employee}");

    let person = std::fs::read_to_string(
        out.settings
            .artifact_path(ArtifactKind::Entity, "Person"),
    )
    .unwrap();
    assert!(person.contains("pub sn: Vec<String>,"), "{person}");
    assert!(!person.contains("pub parent:"), "{person}");

    let employee_mapper = std::fs::read_to_string(
        out.settings
            .artifact_path(ArtifactKind::Mapper, "EmployeeMapper"),
    )
    .unwrap();
    assert!(
        employee_mapper.contains("parent: PersonMapper::from_entry(entry)?,"),
        "{employee_mapper}"
    );
    assert!(
        employee_mapper.contains("PersonMapper::to_entry(&entity.parent, entry);"),
        "{employee_mapper}"
    );

    let organization = std::fs::read_to_string(
        out.settings
            .artifact_path(ArtifactKind::Entity, "Organization"),
    )
    .unwrap();
    assert!(
        organization.contains(r#"&["person", "employee"]"#),
        "{organization}"
    );

    let mapper = std::fs::read_to_string(
        out.settings
            .artifact_path(ArtifactKind::Mapper, "PersonMapper"),
    )
    .unwrap();
    assert!(mapper.contains("impl EntryMapper for PersonMapper"), "{mapper}");
    assert!(mapper.contains("type Entity = Person;"), "{mapper}");
    assert!(
        mapper.contains("into `com.example.directory.mappers`"),
        "{mapper}"
    );
    assert!(
        mapper.contains("use super::super::types::Person;"),
        "{mapper}"
    );
    assert!(
        mapper.contains(r#"jpeg_photo: entry.optional("jpegPhoto")?"#),
        "{mapper}"
    );
}

#[test]
fn generation_is_idempotent() {
    let mut out = Output::new();
    out.settings.remove_old_output = true;

    out.compile();
    let first = tu::read_tree(&out.settings.output_root);

    let (report, _) = out.compile();
    let second = tu::read_tree(&out.settings.output_root);

    assert_eq!(report.removed.len(), 6);
    assert_eq!(first, second);
}

#[test]
fn cleanup_is_scoped() {
    let mut out = Output::new();
    out.compile();

    let types = out.settings.output_dir(ArtifactKind::Entity);
    let mappers = out.settings.output_dir(ArtifactKind::Mapper);

    // Neither a stale source in a nested directory nor a file with another
    // extension is generated output
    std::fs::create_dir_all(types.join("nested")).unwrap();
    std::fs::write(types.join("nested/Stale.rs"), "").unwrap();
    std::fs::write(types.join("README.md"), "").unwrap();
    std::fs::write(types.join("Stale.rs"), "").unwrap();

    out.settings.remove_old_output = true;
    out.settings.generate_mappers = false;

    let (report, _) = out.compile();

    let removed: Vec<_> = report
        .removed
        .iter()
        .map(|p| p.strip_prefix(&types).unwrap().as_str())
        .collect();
    assert_eq!(
        removed,
        ["Employee.rs", "Organization.rs", "Person.rs", "Stale.rs"]
    );

    assert!(types.join("nested/Stale.rs").exists());
    assert!(types.join("README.md").exists());
    assert!(types.join("Person.rs").exists());
    assert!(mappers.join("PersonMapper.rs").exists());
}

#[test]
fn failed_artifacts_are_isolated() {
    let mut out = Output::new();

    // Only classes with a naming attribute try to use the field that the
    // model doesn't have
    let template = out.settings.output_root.with_file_name("mapper.hbs");
    std::fs::write(
        &template,
        "{{className}}{{#if rdnAttribute}} {{rdnAttribute.notAField}}{{/if}}",
    )
    .unwrap();
    out.settings.mapper_template = Some(template);

    let (report, diags) = out.compile();

    let skipped: Vec<_> = report
        .skipped
        .iter()
        .map(|s| (s.kind, s.class_name.as_str()))
        .collect();
    assert_eq!(
        skipped,
        [
            (ArtifactKind::Mapper, "PersonMapper"),
            (ArtifactKind::Mapper, "EmployeeMapper")
        ]
    );

    insta::assert_debug_snapshot!(out.tree(), @r###"
    [
        "com/example/directory/mappers/OrganizationMapper.rs",
        "com/example/directory/types/Employee.rs",
        "com/example/directory/types/Organization.rs",
        "com/example/directory/types/Person.rs",
    ]
    "###);

    let failures: Vec<_> = diags
        .iter()
        .filter(|d| ldap_codegen::field_eq!(d, "/fields/code", "artifact-render-failed"))
        .collect();
    assert_eq!(failures.len(), 2);
    assert_field_eq!(failures[0], "/fields/severity", "error");
    assert_field_eq!(
        failures[0],
        "/fields/message",
        "failed to render mapper 'PersonMapper', it was skipped"
    );
}

#[test]
fn missing_templates_fail_before_output() {
    let mut out = Output::new();
    out.settings.entity_template = Some(out.settings.output_root.with_file_name("nope.hbs"));

    let mut files = Files::new();
    let mut sink = Sink::new();
    let err = ldap_codegen::compile(
        &[tu::fixture("schema/core.dxc")],
        &out.settings,
        &mut files,
        &mut sink,
    )
    .unwrap_err();

    assert!(err.to_string().starts_with("failed to read entity template"));
    assert!(!out.settings.output_root.exists());
}

#[test]
fn missing_settings_fail() {
    let out = Output::new();
    let mut files = Files::new();
    let mut sink = Sink::new();

    let no_files: [PathBuf; 0] = [];
    let err =
        ldap_codegen::compile(&no_files, &out.settings, &mut files, &mut sink).unwrap_err();
    assert_eq!(err.to_string(), "no schema files were specified");

    let settings = Settings::new(out.settings.output_root.clone(), "");
    let err = ldap_codegen::compile(
        &[tu::fixture("schema/core.dxc")],
        &settings,
        &mut files,
        &mut sink,
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "the package name was not specified");
}

#[test]
fn config_driven_run() {
    use ldap_codegen::cfg::{Config, Overrides, ValidationContext};

    let td = tempfile::tempdir().unwrap();
    let root = PathBuf::from_path_buf(td.path().to_owned()).unwrap();
    let cfg_path = root.join("ldap-codegen.toml");

    fs_extra::dir::copy(
        tu::fixture("schema"),
        &root,
        &fs_extra::dir::CopyOptions::new(),
    )
    .unwrap();

    std::fs::write(
        &cfg_path,
        r#"
[schemas]
directory = "schema"
include = ["*.dxc"]
exclude = ["broken.dxc"]

[output]
directory = "generated"
package = "org.example"
mappers = false
"#,
    )
    .unwrap();

    let mut files = Files::new();
    let mut sink = Sink::new();

    let loaded = Config::load(&cfg_path, &mut files, &mut sink).unwrap();
    let base_dir = loaded.base_dir().to_owned();
    let valid = loaded
        .config
        .validate(
            Overrides::default(),
            ValidationContext {
                cfg_id: Some(loaded.id),
                base_dir: &base_dir,
                sink: &mut sink,
            },
        )
        .unwrap();

    let schema_files = valid.schema_files(&mut sink).unwrap();
    assert_eq!(
        schema_files,
        [root.join("schema/core.dxc"), root.join("schema/people.dxc")]
    );

    let report =
        ldap_codegen::compile(&schema_files, &valid.settings, &mut files, &mut sink).unwrap();

    assert_eq!(report.written.len(), 3);
    assert!(report
        .written
        .iter()
        .all(|p| p.starts_with(root.join("generated/org/example/types"))));
}
