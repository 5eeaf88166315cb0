//! Stowaway CLI - embed assets into an executable and inspect the result

use anyhow::{Context, Result};
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use stowaway_container::{ContainerBuilder, Restorer};
use stowaway_core::{format_size, ContainerConfig};
use stowaway_vfs::VirtualFileSystem;
use tracing_subscriber::EnvFilter;

/// Exit status for usage errors and failed commands
const FAILURE: u8 = 255;

#[derive(Parser, Debug)]
#[command(name = "stowaway")]
#[command(about = "Embed asset files into a copy of an executable")]
#[command(disable_version_flag = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Print version
    #[arg(short = 'v', long = "version", global = true)]
    version: bool,

    /// Log every stage and embedded file
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a container from an executable and asset paths
    Build {
        /// Executable to copy
        #[arg(short = 'e', long)]
        exe: PathBuf,

        /// File or directory to embed (repeatable)
        #[arg(short = 'z', long = "zip", required = true)]
        sources: Vec<PathBuf>,

        /// Output path
        #[arg(short = 'o', long, default_value = "out")]
        output: PathBuf,

        /// Resolve asset paths relative to this directory
        #[arg(short = 'C', long)]
        directory: Option<PathBuf>,
    },

    /// Print the signature and embedded paths of a container
    Show {
        /// Container to inspect
        #[arg(short = 'f', long)]
        file: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(FAILURE),
            };
            let _ = e.print();
            return code;
        }
    };

    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(FAILURE)
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = ContainerConfig::default();

    if cli.version {
        println!("{}", config.version_string());
        return Ok(());
    }

    match cli.command {
        Some(Command::Build {
            exe,
            sources,
            output,
            directory,
        }) => cmd_build(config, &exe, sources, &output, directory),
        Some(Command::Show { file, json }) => cmd_show(config, &file, json, cli.verbose),
        None => {
            let mut usage = Cli::command();
            usage.print_help()?;
            anyhow::bail!("no command given")
        }
    }
}

fn cmd_build(
    config: ContainerConfig,
    exe: &Path,
    sources: Vec<PathBuf>,
    output: &Path,
    directory: Option<PathBuf>,
) -> Result<()> {
    tracing::debug!("building {} from {} sources", output.display(), sources.len());

    let mut builder = ContainerBuilder::new(config).exe(exe).sources(sources);
    if let Some(dir) = directory {
        builder = builder.base_dir(dir);
    }

    let report = builder
        .build(output)
        .with_context(|| format!("failed to build {}", output.display()))?;

    println!(
        "Built {} ({} files): {}",
        report.output.display(),
        report.files,
        report.signature
    );
    Ok(())
}

fn cmd_show(config: ContainerConfig, file: &Path, json: bool, verbose: bool) -> Result<()> {
    let vfs = Restorer::new(config)
        .restore(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&show_json(file, &vfs))?);
        return Ok(());
    }

    println!("=== Container ===");
    println!("Path:       {}", file.display());
    if let Some(signature) = vfs.signature() {
        println!("Signature:  {}", signature);
        println!("Archive:    {}", format_size(signature.archive_size()));
    }
    println!("Files:      {}", vfs.len());
    println!();

    println!("=== Embedded Files ===");
    if verbose {
        for file in vfs.files() {
            println!("{}  {}", file.metadata(), file.path());
        }
    } else {
        for path in vfs.paths() {
            println!("{}", path);
        }
    }

    Ok(())
}

fn show_json(file: &Path, vfs: &VirtualFileSystem) -> serde_json::Value {
    serde_json::json!({
        "path": file.display().to_string(),
        "signature": vfs.signature(),
        "namespace": vfs.root(),
        "files": vfs.paths(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_build() {
        let cli = Cli::try_parse_from([
            "stowaway", "build", "-e", "app", "-z", "web", "-z", "conf.toml", "-C", "assets",
        ])
        .unwrap();

        match cli.command {
            Some(Command::Build {
                exe,
                sources,
                output,
                directory,
            }) => {
                assert_eq!(exe, PathBuf::from("app"));
                assert_eq!(sources, vec![PathBuf::from("web"), PathBuf::from("conf.toml")]);
                assert_eq!(output, PathBuf::from("out"));
                assert_eq!(directory, Some(PathBuf::from("assets")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_requires_sources() {
        let err = Cli::try_parse_from(["stowaway", "build", "-e", "app"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_parse_version_flag() {
        let cli = Cli::try_parse_from(["stowaway", "-v"]).unwrap();
        assert!(cli.version);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_build_then_show() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("app"), b"#!/bin/sh\necho hi\n").unwrap();
        fs::create_dir_all(dir.path().join("web")).unwrap();
        fs::write(dir.path().join("web/index.html"), "<h1>hi</h1>").unwrap();

        let output = dir.path().join("bundle");
        cmd_build(
            ContainerConfig::default(),
            &dir.path().join("app"),
            vec![PathBuf::from("web")],
            &output,
            Some(dir.path().to_path_buf()),
        )
        .unwrap();

        cmd_show(ContainerConfig::default(), &output, false, true).unwrap();

        let vfs = Restorer::new(ContainerConfig::default())
            .restore(&output)
            .unwrap();
        let json = show_json(&output, &vfs);
        assert_eq!(json["files"], serde_json::json!(["web/index.html"]));
        assert_eq!(json["namespace"], "stowaway");
        assert_eq!(json["signature"]["app_tag"], "stowaway");
    }

    #[test]
    fn test_show_plain_file_fails() {
        let dir = TempDir::new().unwrap();
        let plain = dir.path().join("plain");
        fs::write(&plain, vec![1u8; 128]).unwrap();
        assert!(cmd_show(ContainerConfig::default(), &plain, false, false).is_err());
    }
}
