use crate::{
    common::{self, ConfigArgs, LogContext},
    Format,
};
use ldap_codegen::{
    diag::{Files, Sink},
    gen::{ArtifactKind, GenerationModel},
    parser::SchemaParser,
    schema::{ObjectClass, Schema},
};
use serde::Serialize;
use std::io::Write as _;

#[derive(clap::Parser, Debug)]
pub struct Args {
    #[command(flatten)]
    pub config: ConfigArgs,
    /// Prints the full generation models of the enabled artifact kinds as
    /// JSON instead of a summary of each object class
    #[arg(long)]
    pub models: bool,
}

/// The summary of an object class that is listed
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Listing<'s> {
    name: &'s str,
    parent: Option<&'s str>,
    naming_attribute: Option<&'s str>,
    children: Vec<&'s str>,
    required: Vec<&'s str>,
    optional: Vec<&'s str>,
}

impl<'s> Listing<'s> {
    fn new(schema: &'s Schema, oc: &'s ObjectClass) -> Self {
        let model = GenerationModel::new(schema, oc, "", ArtifactKind::Entity);

        Self {
            name: &oc.name,
            parent: oc
                .subclass_of
                .as_deref()
                .map(|parent| schema.declared_class_name(parent)),
            naming_attribute: model.rdn_attribute.map(|attr| attr.name),
            children: model.child_object_classes,
            required: oc.required_attributes.iter().map(|a| a.name()).collect(),
            optional: oc.optional_attributes.iter().map(|a| a.name()).collect(),
        }
    }
}

pub fn cmd(log_ctx: LogContext, args: Args) -> anyhow::Result<()> {
    let mut files = Files::new();
    let run = common::load_run(args.config, &mut files, log_ctx)?;

    let mut sink = Sink::new();
    let parsed = SchemaParser::default().parse(&run.schema_files, &mut files, &mut sink);
    common::print_diagnostics(log_ctx, &files, sink);
    let schema = parsed?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if args.models {
        let schema = &schema;
        let models: Vec<_> = run
            .settings
            .enabled_kinds()
            .flat_map(|kind| {
                let package = run.settings.package.as_str();
                schema
                    .object_classes
                    .iter()
                    .map(move |oc| GenerationModel::new(schema, oc, package, kind))
            })
            .collect();

        serde_json::to_writer_pretty(&mut out, &models)?;
        writeln!(out)?;
        return Ok(());
    }

    for oc in &schema.object_classes {
        let listing = Listing::new(&schema, oc);

        match log_ctx.format {
            Format::Human => write_human(&mut out, &listing)?,
            Format::Json => {
                serde_json::to_writer(&mut out, &listing)?;
                writeln!(out)?;
            }
        }
    }

    Ok(())
}

fn write_human(out: &mut impl std::io::Write, listing: &Listing<'_>) -> std::io::Result<()> {
    write!(out, "{}", listing.name)?;
    if let Some(parent) = listing.parent {
        write!(out, " : {parent}")?;
    }
    writeln!(out)?;

    if let Some(naming) = listing.naming_attribute {
        writeln!(out, "  named by: {naming}")?;
    }

    let mut list = |label: &str, items: &[&str]| -> std::io::Result<()> {
        if !items.is_empty() {
            writeln!(out, "  {label}: {}", items.join(", "))?;
        }
        Ok(())
    };

    list("children", &listing.children)?;
    list("must", &listing.required)?;
    list("may", &listing.optional)
}
