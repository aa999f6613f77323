use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::error;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use subx2nc::backend::NetcdfBackend;
use subx2nc::catalog::resolve_url;
use subx2nc::cli::{Cli, Commands, ConfigFormat, OutputFormat, TemplateType, render_config, template_config};
use subx2nc::info::{
    get_field_info, print_field_info_csv, print_field_info_human, print_field_info_json, print_field_info_yaml,
};
use subx2nc::input::JobConfig;
use subx2nc::inspect::RequestSpec;
use subx2nc::log::{config_echo, show_farewell_with_timing, show_greeting, show_plan, show_summary};
use subx2nc::{BatchSummary, RunOptions, process_subx_job};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        log::LevelFilter::Error
    } else if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let human = cli.output_format == OutputFormat::Human && !cli.quiet;

    match cli.command {
        Commands::Fetch {
            out_path,
            dry_run,
            fail_fast,
        } => {
            let config_path = require_config(cli.config.as_deref())?;
            let options = RunOptions {
                dry_run,
                fail_fast,
                show_progress: human,
            };
            fetch(&config_path, out_path, &options, cli.output_format, human)
        }
        Commands::Validate { config_file, detailed } => {
            let config_path = match config_file {
                Some(path) => path,
                None => require_config(cli.config.as_deref())?,
            };
            validate(&config_path, detailed, cli.output_format)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Info {
            group,
            model,
            variable,
            plev,
            base_url,
            forecast_type,
            format,
        } => {
            let request = RequestSpec::new(&group, &model, &variable, plev.as_deref().unwrap_or(""));
            let url = resolve_url(&base_url, &forecast_type, &group, &model, &variable);
            let info = get_field_info(&NetcdfBackend, &url, &request)?;

            match format.unwrap_or(cli.output_format) {
                OutputFormat::Human => print_field_info_human(&info),
                OutputFormat::Json => print_field_info_json(&info)?,
                OutputFormat::Yaml => print_field_info_yaml(&info)?,
                OutputFormat::Csv => print_field_info_csv(&info)?,
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Template {
            template_type,
            output,
            format,
        } => {
            template(template_type, output.as_deref(), format)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Completions { shell, output } => {
            let mut command = Cli::command();
            let name = command.get_name().to_string();
            match output {
                Some(path) => {
                    let mut file = fs::File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    clap_complete::generate(shell, &mut command, name, &mut file);
                }
                None => clap_complete::generate(shell, &mut command, name, &mut io::stdout()),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn require_config(config: Option<&Path>) -> Result<PathBuf> {
    config
        .map(Path::to_path_buf)
        .context("No configuration file given: pass --config or set SUBX2NC_CONFIG")
}

fn load_config(path: &Path) -> Result<JobConfig> {
    JobConfig::from_file(path).with_context(|| format!("Failed to load configuration from {}", path.display()))
}

fn fetch(
    config_path: &Path,
    out_path: Option<PathBuf>,
    options: &RunOptions,
    format: OutputFormat,
    human: bool,
) -> Result<ExitCode> {
    let start_time = Instant::now();

    if human {
        show_greeting(&config_path.display().to_string());
    }

    let mut config = load_config(config_path)?;
    if let Some(out_path) = out_path {
        config.out_path = out_path;
    }

    if human {
        config_echo(&config);
        if options.dry_run {
            show_plan(&config);
        }
    }

    let summary = process_subx_job(&config, options)?;

    match format {
        OutputFormat::Human => {
            if human {
                show_summary(&summary);
                show_farewell_with_timing(start_time.elapsed());
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&summary)?),
        OutputFormat::Csv => print_summary_csv(&summary),
    }

    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_summary_csv(summary: &BatchSummary) {
    println!("status,group,model,variable,plev,ensemble,start_date,detail");
    let status = if summary.dry_run { "planned" } else { "written" };
    for path in &summary.artifacts {
        println!("{},,,,,,,\"{}\"", status, path.display());
    }
    for failure in &summary.failures {
        println!(
            "failed,{},{},{},{},{},{},\"{}\"",
            failure.group,
            failure.model,
            failure.variable,
            failure.plev,
            failure.ensemble.map(|e| e.to_string()).unwrap_or_default(),
            failure.start_date.as_deref().unwrap_or(""),
            failure.error.replace('"', "'")
        );
    }
}

fn validate(config_path: &Path, detailed: bool, format: OutputFormat) -> Result<()> {
    let config = load_config(config_path)?;
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "config": config_path,
                "valid": true,
                "models": config.models.len(),
                "fields": config.fields.len(),
                "variables": config.variable_count(),
            })
        ),
        _ => {
            println!("✓ Configuration is valid: {}", config_path.display());
            println!(
                "  {} models × {} fields = {} variables",
                config.models.len(),
                config.fields.len(),
                config.variable_count()
            );
            if detailed {
                config_echo(&config);
                show_plan(&config);
            }
        }
    }
    Ok(())
}

fn template(template_type: TemplateType, output: Option<&Path>, format: ConfigFormat) -> Result<()> {
    let rendered = render_config(&template_config(template_type), format)?;

    match output {
        Some(path) => {
            fs::write(path, &rendered).with_context(|| format!("Failed to write template to {}", path.display()))?;
            eprintln!("Template written to {}", path.display());
        }
        None => {
            let mut stdout = io::stdout();
            stdout.write_all(rendered.as_bytes())?;
            if !rendered.ends_with('\n') {
                writeln!(stdout)?;
            }
        }
    }
    Ok(())
}
