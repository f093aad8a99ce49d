//! The `ldap-codegen.toml` configuration file
//!
//! ```toml
//! [schemas]
//! directory = "schema"
//! include = ["*.dxc"]
//! exclude = ["legacy-*.dxc"]
//!
//! [output]
//! directory = "src/generated"
//! package = "com.example.directory"
//! entities = true
//! mappers = true
//! remove-old-output = false
//!
//! [templates]
//! entity = "templates/entity.hbs"
//! ```

use crate::{
    diag::{Coord, Diagnostic, FileId, Files, Severity, Sink},
    gen::Settings,
    Path, PathBuf,
};
use anyhow::Context as _;
use globset::{GlobMatcher, GlobSet};
use toml_span::{de_helpers::TableHelper, value::Value, DeserError, Deserialize, Spanned};

/// The name of the config file that is used if one is not specified
pub const DEFAULT_CONFIG: &str = "ldap-codegen.toml";

#[derive(
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
)]
#[strum(serialize_all = "kebab-case")]
pub enum Code {
    MissingSetting,
    InvalidPackage,
    InvalidPattern,
    MissingSchemaDirectory,
    EmptySchemaList,
}

impl From<Code> for String {
    fn from(c: Code) -> Self {
        c.to_string()
    }
}

#[derive(Default)]
pub struct SchemasConfig {
    /// The directory schema files are discovered in
    pub directory: Option<Spanned<String>>,
    /// Glob patterns of the schema files to use, relative to the directory
    pub include: Vec<Spanned<String>>,
    /// Glob patterns of schema files to ignore
    pub exclude: Vec<Spanned<String>>,
}

impl<'de> Deserialize<'de> for SchemasConfig {
    fn deserialize(value: &mut Value<'de>) -> Result<Self, DeserError> {
        let mut th = TableHelper::new(value)?;
        let directory = th.optional("directory");
        let include = th.optional("include").unwrap_or_default();
        let exclude = th.optional("exclude").unwrap_or_default();
        th.finalize(None)?;

        Ok(Self {
            directory,
            include,
            exclude,
        })
    }
}

#[derive(Default)]
pub struct OutputConfig {
    /// The root directory artifacts are written to
    pub directory: Option<Spanned<String>>,
    /// The package artifacts are generated in
    pub package: Option<Spanned<String>>,
    pub entities: Option<bool>,
    pub mappers: Option<bool>,
    /// Removes previously generated artifacts before generating
    pub remove_old_output: Option<bool>,
}

impl<'de> Deserialize<'de> for OutputConfig {
    fn deserialize(value: &mut Value<'de>) -> Result<Self, DeserError> {
        let mut th = TableHelper::new(value)?;
        let directory = th.optional("directory");
        let package = th.optional("package");
        let entities = th.optional("entities");
        let mappers = th.optional("mappers");
        let remove_old_output = th.optional("remove-old-output");
        th.finalize(None)?;

        Ok(Self {
            directory,
            package,
            entities,
            mappers,
            remove_old_output,
        })
    }
}

#[derive(Default)]
pub struct TemplatesConfig {
    pub entity: Option<Spanned<String>>,
    pub mapper: Option<Spanned<String>>,
}

impl<'de> Deserialize<'de> for TemplatesConfig {
    fn deserialize(value: &mut Value<'de>) -> Result<Self, DeserError> {
        let mut th = TableHelper::new(value)?;
        let entity = th.optional("entity");
        let mapper = th.optional("mapper");
        th.finalize(None)?;

        Ok(Self { entity, mapper })
    }
}

#[derive(Default)]
pub struct Config {
    pub schemas: SchemasConfig,
    pub output: OutputConfig,
    pub templates: TemplatesConfig,
}

impl<'de> Deserialize<'de> for Config {
    fn deserialize(value: &mut Value<'de>) -> Result<Self, DeserError> {
        let mut th = TableHelper::new(value)?;
        let schemas = th.optional("schemas").unwrap_or_default();
        let output = th.optional("output").unwrap_or_default();
        let templates = th.optional("templates").unwrap_or_default();
        th.finalize(None)?;

        Ok(Self {
            schemas,
            output,
            templates,
        })
    }
}

/// A config that was read from disk
pub struct LoadedConfig {
    pub config: Config,
    pub id: FileId,
    pub path: PathBuf,
}

impl LoadedConfig {
    /// The directory relative paths in the config are resolved against
    #[inline]
    pub fn base_dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new(""))
    }
}

impl Config {
    /// Reads and deserializes a config file
    ///
    /// Syntax errors, unknown keys, and values of the wrong type are all
    /// reported to the sink before failing
    pub fn load(path: &Path, files: &mut Files, sink: &mut Sink) -> anyhow::Result<LoadedConfig> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config from '{path}'"))?;
        let id = files.add(path.to_owned(), contents);

        let mut parsed = match toml_span::parse(files.source(id)) {
            Ok(parsed) => parsed,
            Err(err) => {
                sink.push(err.to_diagnostic(id));
                anyhow::bail!("failed to parse config from '{path}'");
            }
        };

        let config = match Self::deserialize(&mut parsed) {
            Ok(config) => config,
            Err(err) => {
                for err in err.errors {
                    sink.push(err.to_diagnostic(id));
                }
                anyhow::bail!("failed to deserialize config from '{path}'");
            }
        };

        log::info!("using config from {path}");

        Ok(LoadedConfig {
            config,
            id,
            path: path.to_owned(),
        })
    }
}

/// Settings that take precedence over the config file, relative paths are
/// used as is
#[derive(Default, Debug)]
pub struct Overrides {
    pub schema_directory: Option<PathBuf>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub output_directory: Option<PathBuf>,
    pub package: Option<String>,
    pub entities: Option<bool>,
    pub mappers: Option<bool>,
    pub remove_old_output: Option<bool>,
    pub entity_template: Option<PathBuf>,
    pub mapper_template: Option<PathBuf>,
}

pub struct ValidationContext<'ctx> {
    /// The config file the settings were read from, if there was one
    pub cfg_id: Option<FileId>,
    /// The directory relative paths in the config file are resolved against
    pub base_dir: &'ctx Path,
    pub sink: &'ctx mut Sink,
}

/// The fully resolved settings for a run
pub struct ValidConfig {
    pub schema_directory: PathBuf,
    /// The patterns in the order they were specified
    pub include: Vec<(String, GlobMatcher)>,
    pub exclude: GlobSet,
    pub settings: Settings,
}

/// A setting and, if it came from the config file, where it was specified
struct Setting<T> {
    value: T,
    coord: Option<Coord>,
}

impl<T> Setting<T> {
    #[inline]
    fn from_cli(value: T) -> Self {
        Self { value, coord: None }
    }
}

impl Config {
    /// Merges the config with the overrides and validates the result
    ///
    /// All problems are reported to the sink rather than stopping at the
    /// first one, [`None`] is returned if there were any
    pub fn validate(self, overrides: Overrides, ctx: ValidationContext<'_>) -> Option<ValidConfig> {
        let ValidationContext {
            cfg_id,
            base_dir,
            sink,
        } = ctx;

        let errors = sink.count(Severity::Error);

        let from_file = |spanned: Spanned<String>| Setting {
            coord: cfg_id.map(|file| Coord {
                file,
                span: spanned.span.into(),
            }),
            value: spanned.value,
        };
        let path_from_file = |spanned: Spanned<String>| {
            let Setting { value, coord } = from_file(spanned);
            Setting {
                value: base_dir.join(value),
                coord,
            }
        };

        let mut required = |value: Option<Setting<PathBuf>>, key, flag| {
            if value.is_none() {
                sink.push(MissingSetting { key, flag });
            }
            value
        };

        let schema_directory = required(
            overrides
                .schema_directory
                .map(Setting::from_cli)
                .or_else(|| self.schemas.directory.map(path_from_file)),
            "schemas.directory",
            "--schema-dir",
        );
        let output_directory = required(
            overrides
                .output_directory
                .map(Setting::from_cli)
                .or_else(|| self.output.directory.map(path_from_file)),
            "output.directory",
            "--output-dir",
        );

        let package = overrides
            .package
            .map(Setting::from_cli)
            .or_else(|| self.output.package.map(from_file));

        match &package {
            None => sink.push(MissingSetting {
                key: "output.package",
                flag: "--package",
            }),
            Some(package) if !is_valid_package(&package.value) => sink.push(InvalidPackage {
                package: &package.value,
                coord: package.coord.clone(),
            }),
            Some(_) => {}
        }

        if let Some(dir) = &schema_directory {
            if !dir.value.is_dir() {
                sink.push(MissingSchemaDirectory {
                    directory: &dir.value,
                    coord: dir.coord.clone(),
                });
            }
        }

        let patterns = |cli: Vec<String>, file: Vec<Spanned<String>>| -> Vec<Setting<String>> {
            if cli.is_empty() {
                file.into_iter().map(from_file).collect()
            } else {
                cli.into_iter().map(Setting::from_cli).collect()
            }
        };

        let mut include = Vec::new();
        for pattern in patterns(overrides.include, self.schemas.include) {
            if let Some(glob) = build_glob(&pattern, sink) {
                include.push((pattern.value, glob.compile_matcher()));
            }
        }

        let mut exclude = globset::GlobSetBuilder::new();
        for pattern in patterns(overrides.exclude, self.schemas.exclude) {
            if let Some(glob) = build_glob(&pattern, sink) {
                exclude.add(glob);
            }
        }
        let exclude = match exclude.build() {
            Ok(set) => set,
            Err(err) => {
                sink.push(InvalidPattern {
                    pattern: "exclude",
                    error: &err,
                    coord: None,
                });
                GlobSet::empty()
            }
        };

        let entity_template = overrides
            .entity_template
            .or_else(|| self.templates.entity.map(|e| path_from_file(e).value));
        let mapper_template = overrides
            .mapper_template
            .or_else(|| self.templates.mapper.map(|m| path_from_file(m).value));

        if sink.count(Severity::Error) > errors {
            return None;
        }

        let (Some(schema_directory), Some(output_directory), Some(package)) =
            (schema_directory, output_directory, package)
        else {
            return None;
        };

        Some(ValidConfig {
            schema_directory: schema_directory.value,
            include,
            exclude,
            settings: Settings {
                output_root: output_directory.value,
                package: package.value,
                generate_entities: overrides.entities.or(self.output.entities).unwrap_or(true),
                generate_mappers: overrides.mappers.or(self.output.mappers).unwrap_or(true),
                entity_template,
                mapper_template,
                remove_old_output: overrides
                    .remove_old_output
                    .or(self.output.remove_old_output)
                    .unwrap_or(false),
            },
        })
    }
}

/// Packages are dot separated, each segment must be non-empty and usable as
/// a single directory name
fn is_valid_package(package: &str) -> bool {
    package.split('.').all(|segment| {
        !segment.is_empty()
            && !segment.contains(['/', '\\'])
            && !segment.contains(char::is_whitespace)
    })
}

fn build_glob(pattern: &Setting<String>, sink: &mut Sink) -> Option<globset::Glob> {
    match globset::GlobBuilder::new(&pattern.value)
        .literal_separator(true)
        .build()
    {
        Ok(glob) => Some(glob),
        Err(err) => {
            sink.push(InvalidPattern {
                pattern: &pattern.value,
                error: &err,
                coord: pattern.coord.clone(),
            });
            None
        }
    }
}

impl ValidConfig {
    /// Discovers the schema files to parse
    ///
    /// With no include patterns every file directly inside the schema
    /// directory is used, sorted by name. Otherwise each include pattern adds
    /// its (sorted) matches in the order the patterns were specified. Exclude
    /// patterns are then applied to the result.
    pub fn schema_files(&self, sink: &mut Sink) -> anyhow::Result<Vec<PathBuf>> {
        let root = &self.schema_directory;
        let max_depth = if self.include.is_empty() { 1 } else { usize::MAX };

        let mut candidates = Vec::new();
        for entry in walkdir::WalkDir::new(root)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
        {
            let entry =
                entry.with_context(|| format!("failed to read schema directory '{root}'"))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = match entry
                .path()
                .strip_prefix(root)
                .map(|rel| PathBuf::from_path_buf(rel.to_owned()))
            {
                Ok(Ok(relative)) => relative,
                _ => {
                    log::warn!("ignoring non-utf8 path '{}'", entry.path().display());
                    continue;
                }
            };

            candidates.push(relative);
        }

        let mut selected = indexmap::IndexSet::new();
        if self.include.is_empty() {
            selected.extend(candidates);
        } else {
            for (pattern, matcher) in &self.include {
                let mut matches: Vec<_> = candidates
                    .iter()
                    .filter(|rel| matcher.is_match(rel))
                    .cloned()
                    .collect();
                matches.sort();

                log::debug!("pattern '{pattern}' matched {} files", matches.len());
                selected.extend(matches);
            }
        }

        selected.retain(|rel| !self.exclude.is_match(rel));

        if selected.is_empty() {
            sink.push(EmptySchemaList { directory: root });
            anyhow::bail!("no schema files were selected from '{root}'");
        }

        Ok(selected.into_iter().map(|rel| root.join(rel)).collect())
    }
}

struct MissingSetting {
    key: &'static str,
    flag: &'static str,
}

impl From<MissingSetting> for Diagnostic {
    fn from(ms: MissingSetting) -> Self {
        Diagnostic::new(Severity::Error)
            .with_message(format!("required setting `{}` was not specified", ms.key))
            .with_code(Code::MissingSetting)
            .with_notes(vec![format!(
                "set it in the config file, or pass `{}` on the command line",
                ms.flag
            )])
    }
}

#[inline]
fn labeled(diag: Diagnostic, coord: Option<Coord>) -> Diagnostic {
    match coord {
        Some(coord) => diag.with_labels(vec![coord.into_label()]),
        None => diag,
    }
}

struct InvalidPackage<'p> {
    package: &'p str,
    coord: Option<Coord>,
}

impl<'p> From<InvalidPackage<'p>> for Diagnostic {
    fn from(ip: InvalidPackage<'p>) -> Self {
        labeled(
            Diagnostic::new(Severity::Error)
                .with_message(format!("package '{}' is invalid", ip.package))
                .with_code(Code::InvalidPackage)
                .with_notes(vec![
                    "packages are dot separated names, eg. `com.example.directory`".to_owned(),
                ]),
            ip.coord,
        )
    }
}

struct InvalidPattern<'p> {
    pattern: &'p str,
    error: &'p dyn std::error::Error,
    coord: Option<Coord>,
}

impl<'p> From<InvalidPattern<'p>> for Diagnostic {
    fn from(ip: InvalidPattern<'p>) -> Self {
        labeled(
            Diagnostic::new(Severity::Error)
                .with_message(format!("invalid glob pattern '{}'", ip.pattern))
                .with_code(Code::InvalidPattern)
                .with_notes(vec![ip.error.to_string()]),
            ip.coord,
        )
    }
}

struct MissingSchemaDirectory<'p> {
    directory: &'p Path,
    coord: Option<Coord>,
}

impl<'p> From<MissingSchemaDirectory<'p>> for Diagnostic {
    fn from(msd: MissingSchemaDirectory<'p>) -> Self {
        labeled(
            Diagnostic::new(Severity::Error)
                .with_message(format!(
                    "schema directory '{}' does not exist",
                    msd.directory
                ))
                .with_code(Code::MissingSchemaDirectory),
            msd.coord,
        )
    }
}

struct EmptySchemaList<'p> {
    directory: &'p Path,
}

impl<'p> From<EmptySchemaList<'p>> for Diagnostic {
    fn from(esl: EmptySchemaList<'p>) -> Self {
        Diagnostic::new(Severity::Error)
            .with_message(format!(
                "no schema files were selected from '{}'",
                esl.directory
            ))
            .with_code(Code::EmptySchemaList)
    }
}
