use crate::{common::LogContext, Format};
use ldap_codegen::{
    diag::{Severity, Sink},
    gen::Report,
};
use nu_ansi_term::Color;
use serde::Serialize;

#[derive(Default, Serialize)]
pub struct Stats {
    pub written: usize,
    pub skipped: usize,
    pub removed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub notes: usize,
}

impl Stats {
    pub fn new(report: &Report, sink: &Sink) -> Self {
        Self {
            written: report.written.len(),
            skipped: report.skipped.len(),
            removed: report.removed.len(),
            errors: sink.count(Severity::Error),
            warnings: sink.count(Severity::Warning),
            notes: sink.count(Severity::Note),
        }
    }
}

pub(crate) fn print_stats(stats: &Stats, log_ctx: LogContext) {
    // In the case of human, we print to stdout, to distinguish it from the rest
    // of the output, but for JSON we still go to stderr alongside the
    // diagnostics and log lines
    match log_ctx.format {
        Format::Human => {
            if log_ctx.log_level == log::LevelFilter::Off {
                return;
            }

            let color = crate::common::should_colorize(log_ctx.color, std::io::stdout());

            println!("{}", summary_line(stats, color));
        }
        Format::Json => {
            let summary = serde_json::json!({
                "type": "summary",
                "fields": stats,
            });

            use std::io::Write;
            let stderr = std::io::stderr();
            let mut el = stderr.lock();
            let _ = writeln!(el, "{summary}");
        }
    }
}

fn summary_line(stats: &Stats, color: bool) -> String {
    let status = match (stats.skipped > 0, color) {
        (false, true) => Color::Green.paint("ok").to_string(),
        (true, true) => Color::Yellow.paint("incomplete").to_string(),
        (false, false) => "ok".to_owned(),
        (true, false) => "incomplete".to_owned(),
    };

    let plural = |n: usize, what: &str| {
        if n == 1 {
            format!("{n} {what}")
        } else {
            format!("{n} {what}s")
        }
    };

    let mut line = format!(
        "generate {status}, {} written, {} skipped, {}",
        plural(stats.written, "file"),
        plural(stats.skipped, "artifact"),
        plural(stats.warnings, "warning"),
    );

    if stats.removed > 0 {
        line.push_str(&format!(", {} removed", plural(stats.removed, "old file")));
    }

    line
}
