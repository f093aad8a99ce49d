//! Derives a generation model for each object class of a resolved schema and
//! emits an entity and a mapper artifact for it

mod cleanup;
mod diags;
mod model;
mod template;

pub use cleanup::remove_old_output;
pub use diags::Code;
pub use model::{capitalize, field_name, AttributeView, GenerationModel, ObjectClassView};
pub use template::{HandlebarsRenderer, Renderer, Templates};

use crate::{diag::Sink, schema::Schema, Path, PathBuf};
use std::io::Write as _;

/// The extension of generated source files
pub const GENERATED_EXTENSION: &str = "rs";

/// The kinds of artifact generated for each object class
#[derive(
    strum::Display,
    strum::EnumIter,
    strum::IntoStaticStr,
    serde::Serialize,
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    Entity,
    Mapper,
}

impl ArtifactKind {
    /// The sub-namespace of the package artifacts of this kind are placed in
    #[inline]
    pub fn namespace(self) -> &'static str {
        match self {
            Self::Entity => "types",
            Self::Mapper => "mappers",
        }
    }

    /// The suffix appended to class names
    #[inline]
    pub fn class_suffix(self) -> &'static str {
        match self {
            Self::Entity => "",
            Self::Mapper => "Mapper",
        }
    }
}

/// What and where to generate
#[derive(Clone, Debug)]
pub struct Settings {
    pub output_root: PathBuf,
    /// Dot separated package name, eg `com.example.directory`
    pub package: String,
    pub generate_entities: bool,
    pub generate_mappers: bool,
    /// Replaces the builtin entity template
    pub entity_template: Option<PathBuf>,
    /// Replaces the builtin mapper template
    pub mapper_template: Option<PathBuf>,
    /// Removes previously generated files before generating
    pub remove_old_output: bool,
}

impl Settings {
    pub fn new(output_root: impl Into<PathBuf>, package: impl Into<String>) -> Self {
        Self {
            output_root: output_root.into(),
            package: package.into(),
            generate_entities: true,
            generate_mappers: true,
            entity_template: None,
            mapper_template: None,
            remove_old_output: false,
        }
    }

    #[inline]
    pub fn is_enabled(&self, kind: ArtifactKind) -> bool {
        match kind {
            ArtifactKind::Entity => self.generate_entities,
            ArtifactKind::Mapper => self.generate_mappers,
        }
    }

    /// The enabled kinds of artifact, in generation order
    pub fn enabled_kinds(&self) -> impl Iterator<Item = ArtifactKind> + '_ {
        use strum::IntoEnumIterator;
        ArtifactKind::iter().filter(|kind| self.is_enabled(*kind))
    }

    /// The directory artifacts of the specified kind are written to, ie
    /// `<output root>/<package as path>/<namespace>`
    pub fn output_dir(&self, kind: ArtifactKind) -> PathBuf {
        let mut dir = self.output_root.clone();
        dir.extend(self.package.split('.'));
        dir.push(kind.namespace());
        dir
    }

    /// The path of an artifact
    #[inline]
    pub fn artifact_path(&self, kind: ArtifactKind, class_name: &str) -> PathBuf {
        self.output_dir(kind)
            .join(format!("{class_name}.{GENERATED_EXTENSION}"))
    }
}

/// An artifact that failed to render or write
#[derive(Debug, serde::Serialize)]
pub struct Skipped {
    pub kind: ArtifactKind,
    pub class_name: String,
    pub reason: String,
}

/// The outcome of a generation run
#[derive(Debug, Default)]
pub struct Report {
    /// Previously generated files that were removed before generating
    pub removed: Vec<PathBuf>,
    /// Artifacts written, in the order they were written
    pub written: Vec<PathBuf>,
    pub skipped: Vec<Skipped>,
}

/// Emits artifacts for every object class of a resolved schema
pub struct Generator<'g, R> {
    schema: &'g Schema,
    settings: &'g Settings,
    templates: &'g Templates,
    renderer: R,
}

impl<'g, R: Renderer> Generator<'g, R> {
    pub fn new(
        schema: &'g Schema,
        settings: &'g Settings,
        templates: &'g Templates,
        renderer: R,
    ) -> Self {
        Self {
            schema,
            settings,
            templates,
            renderer,
        }
    }

    /// The models for every object class, in parse order
    pub fn models(&self, kind: ArtifactKind) -> impl Iterator<Item = GenerationModel<'g>> + '_ {
        self.schema
            .object_classes
            .iter()
            .map(move |oc| GenerationModel::new(self.schema, oc, &self.settings.package, kind))
    }

    /// Renders and writes every artifact
    ///
    /// Failing to render or write an artifact is reported to the sink and the
    /// artifact is skipped, the rest of the artifacts are still generated
    pub fn generate(&self, sink: &mut Sink) -> Report {
        let mut report = Report::default();

        for oc in &self.schema.object_classes {
            for kind in self.settings.enabled_kinds() {
                let model = GenerationModel::new(self.schema, oc, &self.settings.package, kind);
                let path = self.settings.artifact_path(kind, &model.class_name);

                let (code, error) = match self.renderer.render(self.templates.get(kind), &model) {
                    Ok(contents) => match write_artifact(&path, &contents) {
                        Ok(()) => {
                            log::info!("wrote {path}");
                            report.written.push(path);
                            continue;
                        }
                        Err(err) => (Code::ArtifactWriteFailed, err),
                    },
                    Err(err) => (Code::ArtifactRenderFailed, err),
                };

                sink.push(diags::ArtifactFailed {
                    code,
                    kind,
                    class_name: &model.class_name,
                    error: &error,
                });

                report.skipped.push(Skipped {
                    kind,
                    class_name: model.class_name,
                    reason: format!("{error:#}"),
                });
            }
        }

        report
    }
}

/// Writes an artifact, creating its parent directories if needed
fn write_artifact(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = std::io::BufWriter::new(fs::File::create(path)?);
    file.write_all(contents.as_bytes())?;
    file.flush()?;

    Ok(())
}
