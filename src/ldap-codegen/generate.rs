use crate::{
    common::{self, ConfigArgs, LogContext, Run},
    stats::Stats,
};
use ldap_codegen::diag::{Files, Sink};

#[derive(clap::Parser, Debug)]
pub struct Args {
    #[command(flatten)]
    pub config: ConfigArgs,
    /// Prints the effective settings before generating
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn cmd(log_ctx: LogContext, args: Args) -> anyhow::Result<Stats> {
    let mut files = Files::new();
    let run = common::load_run(args.config, &mut files, log_ctx)?;

    if args.verbose {
        print_settings(&run, log_ctx);
    }

    let mut sink = Sink::new();
    let result = ldap_codegen::compile(&run.schema_files, &run.settings, &mut files, &mut sink);

    let stats = result.as_ref().ok().map(|report| Stats::new(report, &sink));
    common::print_diagnostics(log_ctx, &files, sink);

    let report = result?;
    for skipped in &report.skipped {
        log::warn!(
            "skipped {} '{}': {}",
            skipped.kind,
            skipped.class_name,
            skipped.reason
        );
    }

    Ok(stats.unwrap_or_default())
}

fn settings_json(run: &Run) -> serde_json::Value {
    let settings = &run.settings;
    let path = |path: &Option<ldap_codegen::PathBuf>| path.as_ref().map(|p| p.as_str().to_owned());

    serde_json::json!({
        "schemaFiles": run.schema_files.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
        "outputRoot": settings.output_root.as_str(),
        "package": settings.package,
        "entityNamespace": format!("{}.{}", settings.package, ldap_codegen::gen::ArtifactKind::Entity.namespace()),
        "mapperNamespace": format!("{}.{}", settings.package, ldap_codegen::gen::ArtifactKind::Mapper.namespace()),
        "generateEntities": settings.generate_entities,
        "generateMappers": settings.generate_mappers,
        "entityTemplate": path(&settings.entity_template),
        "mapperTemplate": path(&settings.mapper_template),
        "removeOldOutput": settings.remove_old_output,
    })
}

fn print_settings(run: &Run, log_ctx: LogContext) {
    let settings = settings_json(run);

    match log_ctx.format {
        crate::Format::Human => {
            eprintln!("settings:");
            if let serde_json::Value::Object(map) = settings {
                for (key, value) in map {
                    eprintln!("  {key} = {value}");
                }
            }
        }
        crate::Format::Json => {
            eprintln!(
                "{}",
                serde_json::json!({
                    "type": "settings",
                    "fields": settings,
                })
            );
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ldap_codegen::gen::Settings;

    #[test]
    fn settings_dump() {
        let mut settings = Settings::new("/out", "com.example");
        settings.generate_mappers = false;
        settings.entity_template = Some("/templates/entity.hbs".into());

        let run = Run {
            schema_files: vec!["/schema/core.dxc".into()],
            settings,
        };

        insta::assert_json_snapshot!(settings_json(&run), @r###"
        {
          "entityNamespace": "com.example.types",
          "entityTemplate": "/templates/entity.hbs",
          "generateEntities": true,
          "generateMappers": false,
          "mapperNamespace": "com.example.mappers",
          "mapperTemplate": null,
          "outputRoot": "/out",
          "package": "com.example",
          "removeOldOutput": false,
          "schemaFiles": [
            "/schema/core.dxc"
          ]
        }
        "###);
    }
}
