mod cli;

use hclspec::eval::EvalContext;
use hclspec::report::Report;
use hclspec::schema::Schema;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("HCLSPEC_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Check(check_cli) => check(check_cli),
        cli::Command::Evaluate(evaluate_cli) => evaluate(evaluate_cli),
        cli::Command::Files(files_cli) => files(files_cli),
    };

    match command_result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            for error in e.chain() {
                eprintln!("{error}")
            }
            std::process::exit(1);
        }
    }
}

/// Loads, decodes and prints diagnostics. Returns `false` if there were errors.
pub fn check(cli: cli::CheckCommand) -> anyhow::Result<bool> {
    let mut schema = Schema::new(hclspec::blocks::stock());
    let mut ok = load(&mut schema, &cli.input, &cli.render)?;

    let report = schema.parse(&mut EvalContext::new());
    ok &= render(&report, &cli.render)?;

    if ok {
        eprintln!("ok: {} file(s) decoded", schema.parsed_files().len());
    }

    Ok(ok)
}

pub fn evaluate(cli: cli::EvaluateCommand) -> anyhow::Result<bool> {
    let mut schema = Schema::new(hclspec::blocks::stock());
    let mut ok = load(&mut schema, &cli.input, &cli.render)?;

    let mut context = EvalContext::new();
    let report = schema.parse(&mut context);
    ok &= render(&report, &cli.render)?;

    let mut value = serde_json::Value::Null;
    let report = schema.decode(&context, &mut value);
    ok &= render(&report, &cli.render)?;

    output(&cli.output, &value)?;
    Ok(ok)
}

pub fn files(cli: cli::FilesCommand) -> anyhow::Result<bool> {
    let mut schema = Schema::default();
    let report = load_quiet(&mut schema, &cli.input)?;

    for filename in schema.parsed_files() {
        println!("{filename}");
    }

    Ok(!report.has_errors())
}

fn load(
    schema: &mut Schema,
    input: &cli::InputArgs,
    render_args: &cli::RenderArgs,
) -> anyhow::Result<bool> {
    let report = load_quiet(schema, input)?;
    render(&report, render_args)
}

fn load_quiet(schema: &mut Schema, input: &cli::InputArgs) -> anyhow::Result<Report> {
    if !input.workdir && input.files.is_empty() && input.globs.is_empty() {
        let stdin = std::io::read_to_string(std::io::stdin())?;
        return Ok(schema.parse_hcl(stdin.as_bytes(), "<stdin>"));
    }

    let mut diagnostics = hclspec::diagnostic::Diagnostics::new();

    if input.workdir {
        diagnostics.extend(schema.file_glob("*.hcl").into_raw());
        diagnostics.extend(schema.file_glob("*.json").into_raw());
    }

    diagnostics.extend(schema.files(&input.files).into_raw());

    for pattern in &input.globs {
        diagnostics.extend(schema.file_glob(pattern).into_raw());
    }

    anyhow::ensure!(!schema.parsed_files().is_empty(), "No files loaded");

    Ok(Report::new(diagnostics, schema.documents().sources()))
}

/// Prints diagnostics to stderr. Returns `false` if there were errors.
fn render(report: &Report, args: &cli::RenderArgs) -> anyhow::Result<bool> {
    report.write_text(&mut std::io::stderr(), args.width, !args.no_color)?;
    Ok(!report.has_errors())
}

fn output(output: &cli::OutputArgs, value: &serde_json::Value) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), value)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), value)?,
    };

    Ok(())
}
