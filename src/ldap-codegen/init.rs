use anyhow::{ensure, Context, Error};
use ldap_codegen::{cfg::DEFAULT_CONFIG, PathBuf};

#[derive(clap::Parser, Debug, Clone)]
pub struct Args {
    /// The path to create the config file at, defaults to
    /// `ldap-codegen.toml` in the working directory
    config: Option<PathBuf>,
}

const CONTENTS: &str = include_str!("../../resources/ldap-codegen.toml");

pub fn cmd(args: Args) -> Result<(), Error> {
    let cwd = crate::common::current_dir()?;
    let cfg_file = crate::common::make_absolute_path(
        args.config.unwrap_or_else(|| DEFAULT_CONFIG.into()),
        &cwd,
    );

    // make sure the file does not exist yet
    ensure!(
        !cfg_file.exists(),
        "unable to initialize config file '{cfg_file}', the path already exists"
    );
    // make sure the path does not terminate in '..', we need a file name
    ensure!(
        cfg_file.file_name().is_some(),
        "unable to create a config file at '{cfg_file}', the path is not a file"
    );

    log::info!("saving config file to '{cfg_file}'");

    fs::write(&cfg_file, CONTENTS).context("unable to write config file")?;

    Ok(())
}
