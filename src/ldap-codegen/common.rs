use crate::{Color, Format};
use anyhow::Context as _;
use ldap_codegen::{
    cfg::{self, Config, Overrides, ValidationContext},
    diag::{Diagnostic, Files, Severity, Sink},
    gen::Settings,
    Path, PathBuf,
};

#[derive(Copy, Clone)]
pub struct LogContext {
    pub color: Color,
    pub format: Format,
    pub log_level: log::LevelFilter,
}

pub(crate) fn should_colorize(color: Color, stream: impl std::io::IsTerminal) -> bool {
    match color {
        Color::Auto => stream.is_terminal(),
        Color::Always => true,
        Color::Never => false,
    }
}

pub(crate) fn make_absolute_path(path: PathBuf, context_dir: &Path) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        context_dir.join(path)
    }
}

pub(crate) fn current_dir() -> anyhow::Result<PathBuf> {
    let cwd = std::env::current_dir().context("unable to determine current working directory")?;
    PathBuf::from_path_buf(cwd)
        .map_err(|cwd| anyhow::anyhow!("working directory '{}' is not utf-8", cwd.display()))
}

/// The settings shared by every subcommand that reads schemas, each one
/// overrides the matching key in the config file
#[derive(clap::Args, Debug, Clone)]
#[command(rename_all = "kebab-case")]
pub struct ConfigArgs {
    /// Path to the config file
    ///
    /// Defaults to `ldap-codegen.toml` in the working directory, which is
    /// optional as long as the required settings are passed on the command line
    #[arg(short, long, env = "LDAP_CODEGEN_CONFIG")]
    pub config: Option<PathBuf>,
    /// The directory schema files are discovered in
    #[arg(long, env = "LDAP_CODEGEN_SCHEMA_DIR")]
    pub schema_dir: Option<PathBuf>,
    /// Glob patterns selecting schema files relative to the schema directory
    #[arg(long, value_delimiter = ',')]
    pub include: Vec<String>,
    /// Glob patterns removing schema files from the include list
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,
    /// The root directory generated sources are written under
    #[arg(long, env = "LDAP_CODEGEN_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,
    /// The dot separated package generated sources are placed in
    #[arg(long, env = "LDAP_CODEGEN_PACKAGE")]
    pub package: Option<String>,
    /// Whether entity sources are generated
    #[arg(long, value_name = "BOOL", env = "LDAP_CODEGEN_ENTITIES")]
    pub entities: Option<bool>,
    /// Whether mapper sources are generated
    #[arg(long, value_name = "BOOL", env = "LDAP_CODEGEN_MAPPERS")]
    pub mappers: Option<bool>,
    /// Whether previously generated sources are removed before generating
    #[arg(long, value_name = "BOOL", env = "LDAP_CODEGEN_REMOVE_OLD_OUTPUT")]
    pub remove_old_output: Option<bool>,
    /// Replaces the builtin entity template
    #[arg(long, env = "LDAP_CODEGEN_ENTITY_TEMPLATE")]
    pub entity_template: Option<PathBuf>,
    /// Replaces the builtin mapper template
    #[arg(long, env = "LDAP_CODEGEN_MAPPER_TEMPLATE")]
    pub mapper_template: Option<PathBuf>,
}

impl ConfigArgs {
    fn into_overrides(self, cwd: &Path) -> Overrides {
        let abs = |path: Option<PathBuf>| path.map(|p| make_absolute_path(p, cwd));

        Overrides {
            schema_directory: abs(self.schema_dir),
            include: self.include,
            exclude: self.exclude,
            output_directory: abs(self.output_dir),
            package: self.package,
            entities: self.entities,
            mappers: self.mappers,
            remove_old_output: self.remove_old_output,
            entity_template: abs(self.entity_template),
            mapper_template: abs(self.mapper_template),
        }
    }
}

/// Everything a subcommand needs to run the pipeline
pub struct Run {
    pub schema_files: Vec<PathBuf>,
    pub settings: Settings,
}

/// Loads the config file, if there is one, merges the command line into it,
/// and discovers the schema files
///
/// Every configuration problem is printed before failing
pub(crate) fn load_run(args: ConfigArgs, files: &mut Files, log_ctx: LogContext) -> anyhow::Result<Run> {
    let cwd = current_dir()?;

    let (cfg_path, explicit) = match args.config.clone() {
        Some(path) => (make_absolute_path(path, &cwd), true),
        None => (cwd.join(cfg::DEFAULT_CONFIG), false),
    };

    let mut sink = Sink::new();

    let loaded = if explicit || cfg_path.exists() {
        match Config::load(&cfg_path, files, &mut sink) {
            Ok(loaded) => Some(loaded),
            Err(err) => {
                print_diagnostics(log_ctx, files, sink);
                return Err(err);
            }
        }
    } else {
        log::info!("no config found at '{cfg_path}', using command line settings");
        None
    };

    let (config, cfg_id, base_dir) = match loaded {
        Some(loaded) => {
            let base_dir = loaded.base_dir().to_owned();
            (loaded.config, Some(loaded.id), base_dir)
        }
        None => (Config::default(), None, cwd.clone()),
    };

    let valid = config.validate(
        args.into_overrides(&cwd),
        ValidationContext {
            cfg_id,
            base_dir: &base_dir,
            sink: &mut sink,
        },
    );

    let run = match valid {
        Some(valid) => valid.schema_files(&mut sink).map(|schema_files| Run {
            schema_files,
            settings: valid.settings,
        }),
        None => Err(anyhow::anyhow!("the configuration is invalid")),
    };

    print_diagnostics(log_ctx, files, sink);
    run
}

pub(crate) fn print_diagnostics(log_ctx: LogContext, files: &Files, sink: Sink) {
    if sink.is_empty() {
        return;
    }

    if let Some(mut printer) = DiagPrinter::new(log_ctx) {
        for diag in sink {
            printer.print(diag, files);
        }
    }
}

#[inline]
pub fn log_level_to_severity(log_level: log::LevelFilter) -> Option<Severity> {
    match log_level {
        log::LevelFilter::Off => None,
        log::LevelFilter::Error => Some(Severity::Error),
        log::LevelFilter::Warn => Some(Severity::Warning),
        log::LevelFilter::Info => Some(Severity::Note),
        log::LevelFilter::Debug | log::LevelFilter::Trace => Some(Severity::Help),
    }
}

use codespan_reporting::term::{self, termcolor::ColorChoice};
use std::io::Write;

enum OutputFormat {
    Human {
        stream: term::termcolor::StandardStream,
        config: term::Config,
    },
    Json,
}

/// Prints diagnostics to stderr, filtered by the log level
pub struct DiagPrinter {
    which: OutputFormat,
    max_severity: Severity,
}

impl DiagPrinter {
    pub fn new(ctx: LogContext) -> Option<Self> {
        let max_severity = log_level_to_severity(ctx.log_level)?;

        let which = match ctx.format {
            Format::Human => {
                let color = if should_colorize(ctx.color, std::io::stderr()) {
                    ColorChoice::Always
                } else {
                    ColorChoice::Never
                };

                OutputFormat::Human {
                    stream: term::termcolor::StandardStream::stderr(color),
                    config: ldap_codegen::diag::codespan_config(),
                }
            }
            Format::Json => OutputFormat::Json,
        };

        Some(Self {
            which,
            max_severity,
        })
    }

    pub fn print(&mut self, diag: Diagnostic, files: &Files) {
        if diag.severity < self.max_severity {
            return;
        }

        match &mut self.which {
            OutputFormat::Human { stream, config } => {
                let mut lock = stream.lock();
                let _ = term::emit(&mut lock, config, files, &diag);
            }
            OutputFormat::Json => {
                let to_print = match serde_json::to_vec(&ldap_codegen::diag::diag_to_json(diag, files)) {
                    Ok(json) => json,
                    Err(err) => {
                        log::error!("failed to serialize diagnostic: {err}");
                        return;
                    }
                };

                let stderr = std::io::stderr();
                let mut el = stderr.lock();
                let _ = el.write_all(&to_print);
                let _ = el.write(b"\n");
            }
        }
    }
}
