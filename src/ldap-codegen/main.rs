#![deny(unsafe_code)]
#![warn(
    clippy::all,
    clippy::dbg_macro,
    clippy::doc_markdown,
    clippy::enum_glob_use,
    clippy::explicit_into_iter_loop,
    clippy::implicit_clone,
    clippy::inefficient_to_string,
    clippy::map_unwrap_or,
    clippy::needless_borrow,
    clippy::needless_continue,
    clippy::semicolon_if_nothing_returned,
    clippy::string_add,
    clippy::todo,
    clippy::unimplemented,
    clippy::unnested_or_patterns,
    future_incompatible,
    nonstandard_style,
    rust_2018_idioms
)]
#![allow(clippy::exit)]

use anyhow::{Context as _, Error};
use clap::{Parser, Subcommand, ValueEnum};

mod common;
mod generate;
mod init;
mod list;
mod stats;

#[derive(Subcommand, Debug)]
enum Command {
    /// Compiles the configured schema files into entity and mapper sources
    #[command(name = "generate")]
    Generate(generate::Args),
    /// Prints the object classes of the configured schema files
    #[command(name = "list")]
    List(list::Args),
    /// Creates an ldap-codegen config from a template
    #[command(name = "init")]
    Init(init::Args),
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Format {
    Human,
    Json,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Color {
    Auto,
    Always,
    Never,
}

fn parse_level(s: &str) -> Result<log::LevelFilter, Error> {
    s.parse::<log::LevelFilter>()
        .with_context(|| format!("failed to parse level '{s}'"))
}

/// Compiles directory schemas into typed entity and mapper sources
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(rename_all = "kebab-case", max_term_width = 80)]
struct Opts {
    /// The log level for messages
    #[arg(
        short = 'L',
        long,
        default_value = "warn",
        value_parser = parse_level,
        long_help = "The log level for messages

Only log messages at or above the level will be emitted.

Possible values:
* off
* error
* warn
* info
* debug
* trace
"
    )]
    log_level: log::LevelFilter,
    /// Specify the format of ldap-codegen's output
    #[arg(short, long, default_value = "human", value_enum)]
    format: Format,
    #[arg(
        short,
        long,
        default_value = "auto",
        value_enum,
        env = "LDAP_CODEGEN_COLOR"
    )]
    color: Color,
    #[command(subcommand)]
    cmd: Command,
}

fn setup_logger(
    level: log::LevelFilter,
    format: Format,
    color: bool,
) -> Result<(), fern::InitError> {
    use log::Level::{Debug, Error, Info, Trace, Warn};
    use nu_ansi_term::Color::{Blue, Green, Purple, Red, Yellow};

    let now = || {
        time::OffsetDateTime::now_utc()
            .format(time::macros::format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second]"
            ))
            .unwrap_or_default()
    };

    match format {
        Format::Human => {
            if color {
                fern::Dispatch::new()
                    .level(level)
                    .format(move |out, message, record| {
                        out.finish(format_args!(
                            "{date} [{level}] {message}\x1B[0m",
                            date = now(),
                            level = match record.level() {
                                Error => Red.paint("ERROR"),
                                Warn => Yellow.paint("WARN"),
                                Info => Green.paint("INFO"),
                                Debug => Blue.paint("DEBUG"),
                                Trace => Purple.paint("TRACE"),
                            },
                            message = message,
                        ));
                    })
                    .chain(std::io::stderr())
                    .apply()?;
            } else {
                fern::Dispatch::new()
                    .level(level)
                    .format(move |out, message, record| {
                        out.finish(format_args!(
                            "{date} [{level}] {message}",
                            date = now(),
                            level = match record.level() {
                                Error => "ERROR",
                                Warn => "WARN",
                                Info => "INFO",
                                Debug => "DEBUG",
                                Trace => "TRACE",
                            },
                            message = message,
                        ));
                    })
                    .chain(std::io::stderr())
                    .apply()?;
            }
        }
        Format::Json => {
            fern::Dispatch::new()
                .level(level)
                .format(move |out, message, record| {
                    let timestamp = time::OffsetDateTime::now_utc()
                        .format(&time::format_description::well_known::Rfc3339)
                        .unwrap_or_default();

                    out.finish(format_args!(
                        "{}",
                        serde_json::json!({
                            "type": "log",
                            "fields": {
                                "timestamp": timestamp,
                                "level": record.level().as_str(),
                                "message": message.to_string(),
                            }
                        })
                    ));
                })
                .chain(std::io::stderr())
                .apply()?;
        }
    }

    Ok(())
}

fn real_main() -> Result<(), Error> {
    let args = Opts::parse();

    let log_level = args.log_level;

    let color = common::should_colorize(args.color, std::io::stderr());

    setup_logger(log_level, args.format, color)?;

    let log_ctx = common::LogContext {
        color: args.color,
        format: args.format,
        log_level,
    };

    match args.cmd {
        Command::Generate(gargs) => {
            let stats = generate::cmd(log_ctx, gargs)?;
            stats::print_stats(&stats, log_ctx);
            Ok(())
        }
        Command::List(largs) => list::cmd(log_ctx, largs),
        Command::Init(iargs) => init::cmd(iargs),
    }
}

fn main() {
    match real_main() {
        Ok(_) => {}
        Err(e) => {
            log::error!("{:#}", e);
            std::process::exit(1);
        }
    }
}
