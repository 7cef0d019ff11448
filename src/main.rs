mod scene_editor;

use anyhow::{Context, bail};
use scene_editor::EDITOR_CONFIG_PATH;
use scene_editor::editor::LaunchOptions;
use scene_editor::geometry::PrimitiveKind;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Default, PartialEq)]
struct CliOptions {
    config_path: Option<PathBuf>,
    primitive: Option<PrimitiveKind>,
    show_help: bool,
}

fn parse_cli_options(args: impl IntoIterator<Item = String>) -> anyhow::Result<CliOptions> {
    let mut options = CliOptions::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let Some(value) = args.next() else {
                    bail!("{arg} expects a path");
                };
                options.config_path = Some(PathBuf::from(value));
            }
            "--primitive" | "-p" => {
                let Some(value) = args.next() else {
                    bail!("{arg} expects a primitive name");
                };
                options.primitive = Some(value.parse()?);
            }
            "--help" | "-h" => options.show_help = true,
            _ => bail!("unknown option: {arg}"),
        }
    }

    Ok(options)
}

fn print_help() {
    println!(
        "Usage:\n  primforge [options]\n\nOptions:\n  -c, --config <path>     Editor settings file (default: {EDITOR_CONFIG_PATH})\n  -p, --primitive <kind>  Starting primitive: box, sphere, cylinder, torus, cone, octahedron\n  -h, --help              Show this help"
    );
}

fn main() -> anyhow::Result<()> {
    let options = parse_cli_options(env::args().skip(1))?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    let launch = LaunchOptions {
        config_required: options.config_path.is_some(),
        config_path: options
            .config_path
            .unwrap_or_else(|| PathBuf::from(EDITOR_CONFIG_PATH)),
        primitive: options.primitive,
    };
    let config_path = launch.config_path.clone();

    scene_editor::editor::run(launch)
        .with_context(|| format!("loading editor settings from {}", config_path.display()))
}
