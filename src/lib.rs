#![doc = include_str!("../README.md")]

pub mod cfg;
pub mod decoder;
pub mod diag;
pub mod gen;
pub mod parser;
/// The in-memory directory schema model
pub mod schema;

#[doc(hidden)]
pub mod test_utils;

pub use camino::{Utf8Path as Path, Utf8PathBuf as PathBuf};

use anyhow::Context as _;

/// Compiles the schema files into entity and mapper artifacts
///
/// The schema files are decoded as DXC and artifacts are rendered with
/// handlebars. Templates are loaded, and the schema files parsed, before any
/// output is written, failing either fails the compile. Artifacts that fail
/// to render or write are skipped and reported to the sink.
pub fn compile<P: AsRef<Path>>(
    schema_files: &[P],
    settings: &gen::Settings,
    files: &mut diag::Files,
    sink: &mut diag::Sink,
) -> anyhow::Result<gen::Report> {
    if schema_files.is_empty() {
        anyhow::bail!("no schema files were specified");
    }
    if settings.package.is_empty() {
        anyhow::bail!("the package name was not specified");
    }
    if settings.output_root.as_str().is_empty() {
        anyhow::bail!("the output directory was not specified");
    }

    let templates = gen::Templates::load(settings)?;
    let schema = parser::SchemaParser::default().parse(schema_files, files, sink)?;

    fs::create_dir_all(&settings.output_root).with_context(|| {
        format!(
            "failed to create output directory '{}'",
            settings.output_root
        )
    })?;

    let removed = if settings.remove_old_output {
        gen::remove_old_output(settings, sink)
    } else {
        Vec::new()
    };

    let mut report = gen::Generator::new(
        &schema,
        settings,
        &templates,
        gen::HandlebarsRenderer::new(),
    )
    .generate(sink);
    report.removed = removed;

    log::info!(
        "wrote {} artifacts, skipped {}",
        report.written.len(),
        report.skipped.len()
    );

    Ok(report)
}
