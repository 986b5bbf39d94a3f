mod report;
mod runner;
mod system;

use self::report::report_summary;
use self::runner::run_builds;
use self::system::SyntheticSystem;
use crate::config::{Args, Config};
use crate::io::{setup_output, write_matrix};
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use std::fs::{self, File};
use tracing::info;

pub struct FockApplication {
    args: Args,
    config: Config,
}

impl FockApplication {
    pub fn from_cli() -> Result<Self> {
        let args = Args::parse();
        let config = load_config(&args)?;
        Ok(Self { args, config })
    }

    pub fn run(self) -> Result<()> {
        setup_output(self.args.output.as_ref());
        info!("Configuration loaded:\n{:?}", self.config);

        let system = SyntheticSystem::from_config(&self.config)?;
        let summary = run_builds(&system, &self.config)?;
        report_summary(&system, &summary);

        if let Some(path) = &self.args.dump {
            let mut file = File::create(path)
                .wrap_err_with(|| format!("Unable to create dump file: {}", path))?;
            write_matrix(&mut file, "Two-electron matrix G", &summary.matrix)?;
            info!("Two-electron matrix written to: {}", path);
        }

        Ok(())
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let config_content = fs::read_to_string(&args.config_file)
        .wrap_err_with(|| format!("Unable to read configuration file: {}", args.config_file))?;

    let config = serde_yml::from_str::<Config>(&config_content)
        .wrap_err("Failed to parse configuration file")?
        .with_defaults()
        .apply_args(args);

    Ok(config)
}
