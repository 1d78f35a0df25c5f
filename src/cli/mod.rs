/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Command line interface
//!
//! Every subcommand reads a JSON run description (scatterer, optics,
//! detector grid and optional solver settings) and writes a JSON result to
//! a file or to standard output.

use crate::config::RunDescription;
use crate::target::FieldRecord;
use crate::theory::{determine_theory, Multisphere, ScatteringTheory};
use crate::scatterer::Scatterer;
use crate::tmatrix::SolutionMethod;
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use serde_json::json;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "holoscat",
    version,
    about = "Light scattering by spheres and sphere clusters for holographic microscopy"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scattered electric field on the detector grid
    Field(RunArgs),
    /// Scattered intensity |E|² on the detector grid
    Intensity(RunArgs),
    /// Scattering cross-section of the scatterer
    CrossSection(RunArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Run description file (JSON)
    #[arg(value_name = "RUN")]
    input: PathBuf,

    /// Output file; standard output when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override the interaction-equation solving method
    #[arg(long, value_enum)]
    method: Option<MethodArg>,

    /// Override the iteration cap of the interaction solve
    #[arg(long)]
    max_iterations: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum MethodArg {
    /// Stabilized biconjugate gradient
    BiconjugateGradient,
    /// Order-of-scattering iteration
    OrderOfScattering,
}

impl From<MethodArg> for SolutionMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::BiconjugateGradient => SolutionMethod::BiconjugateGradient,
            MethodArg::OrderOfScattering => SolutionMethod::OrderOfScattering,
        }
    }
}

impl RunArgs {
    fn load(&self) -> anyhow::Result<RunDescription> {
        let mut run = RunDescription::from_file(&self.input)
            .with_context(|| format!("loading run description {}", self.input.display()))?;
        if let Some(method) = self.method {
            run.solver.method = method.into();
        }
        if let Some(max_iterations) = self.max_iterations {
            run.solver.max_iterations = max_iterations;
        }
        run.solver.validate()?;
        Ok(run)
    }

    fn write(&self, value: &serde_json::Value) -> anyhow::Result<()> {
        let text = serde_json::to_string_pretty(value)?;
        match &self.output {
            Some(path) => {
                fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
                info!("wrote {}", path.display());
            }
            None => println!("{}", text),
        }
        Ok(())
    }
}

/// Theory for a run: clusters use the run's solver settings
fn theory_for(run: &RunDescription) -> Box<dyn ScatteringTheory> {
    match run.scatterer {
        Scatterer::Spheres(_) => Box::new(Multisphere::new(run.solver)),
        _ => determine_theory(&run.scatterer),
    }
}

/// Parse `args` (without the program name) and execute the command
pub fn run<I, S>(args: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("holoscat".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();

    let cli = match Cli::try_parse_from(&full_args) {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                return Ok(());
            }
            _ => return Err(anyhow::anyhow!(err.to_string())),
        },
    };

    dispatch(cli.command)
}

fn dispatch(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Field(args) => {
            let run = args.load()?;
            let theory = theory_for(&run);
            let field = theory.calc_field(&run.scatterer, &run.optics, &run.detector)?;
            args.write(&serde_json::to_value(FieldRecord::from(&field))?)
        }
        Command::Intensity(args) => {
            let run = args.load()?;
            let theory = theory_for(&run);
            let intensity = theory.calc_intensity(&run.scatterer, &run.optics, &run.detector)?;
            args.write(&json!({
                "shape": intensity.shape(),
                "values": intensity.iter().copied().collect::<Vec<f64>>(),
            }))
        }
        Command::CrossSection(args) => {
            let run = args.load()?;
            let theory = theory_for(&run);
            let cross_section = theory.calc_cross_section(&run.scatterer, &run.optics)?;
            args.write(&json!({
                "theory": theory.name(),
                "cross_section": cross_section,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["holoscat", "field", "run.json", "-o", "out.json"]).unwrap();
        match cli.command {
            Command::Field(args) => {
                assert_eq!(args.input, PathBuf::from("run.json"));
                assert_eq!(args.output, Some(PathBuf::from("out.json")));
            }
            _ => panic!("expected the field subcommand"),
        }

        let cli = Cli::try_parse_from([
            "holoscat",
            "cross-section",
            "run.json",
            "--method",
            "biconjugate-gradient",
        ])
        .unwrap();
        match cli.command {
            Command::CrossSection(args) => {
                assert!(matches!(args.method, Some(MethodArg::BiconjugateGradient)))
            }
            _ => panic!("expected the cross-section subcommand"),
        }
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(run(["field", "/nonexistent/run.json"]).is_err());
    }

    #[test]
    fn test_help_is_not_an_error() {
        assert!(run(["--help"]).is_ok());
    }
}
