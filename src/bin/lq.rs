use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use clap::Parser;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Table};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use logquery::engine::{Engine, EngineConfig};
use logquery::executor::{CommandOutcome, WriterSink};
use logquery::state::ViewSource;

/// logquery command-line front end
#[derive(Parser, Debug)]
#[command(name = "lq")]
#[command(about = "SQL-like queries over text files and directory listings", long_about = None)]
struct Args {
    /// Config file (TOML)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Culture for number and date formatting (e.g. en-US, de-DE)
    #[arg(long)]
    culture: Option<String>,

    /// Output column delimiter
    #[arg(short = 'd', long)]
    delimiter: Option<String>,

    /// Heading mode: off, on or rule
    #[arg(long)]
    heading: Option<String>,

    /// Pad output columns to their widest value
    #[arg(short = 'a', long)]
    auto_size: bool,

    /// Run a query batch and exit
    #[arg(short = 'q', long, conflicts_with = "file")]
    query: Option<String>,

    /// Run the query batch in a file and exit
    #[arg(short = 'f', long)]
    file: Option<PathBuf>,
}

/// Load configuration with priority: CLI args > ENV > config file > defaults
fn load_config(args: &Args) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let mut config = EngineConfig::load(args.config.as_deref())?;
    if let Some(culture) = &args.culture {
        config.culture.clone_from(culture);
    }
    if let Some(delimiter) = &args.delimiter {
        config.delimiter = unescape(delimiter);
    }
    if let Some(heading) = &args.heading {
        config.heading.clone_from(heading);
    }
    if args.auto_size {
        config.auto_size = true;
    }
    Ok(config)
}

// Shells make a literal tab awkward to pass
fn unescape(text: &str) -> String {
    text.replace("\\t", "\t")
}

fn run_batch(engine: &mut Engine, text: &str) -> bool {
    let stdout = io::stdout();
    let mut sink = WriterSink::new(stdout.lock());
    let result = engine.execute(text, &mut sink);
    let _ = sink.into_inner().flush();

    for warning in engine.warnings() {
        eprintln!("warning: {warning}");
    }
    match result {
        Ok(outcomes) => {
            for outcome in outcomes {
                match outcome {
                    CommandOutcome::Rows(_) => eprintln!("({})", outcome.message()),
                    CommandOutcome::Success(message) => eprintln!("{message}"),
                }
            }
            true
        }
        Err(e) => {
            eprintln!("error: {e}");
            false
        }
    }
}

fn print_variables(engine: &Engine) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Name", "Type", "Value"]);
    for variable in engine.session().variables.list() {
        let value = variable.value.map_or_else(|| "(unset)".to_string(), |v| v.to_string());
        table.add_row(vec![
            Cell::new(&variable.name),
            Cell::new(variable.data_type),
            Cell::new(value),
        ]);
    }
    println!("{table}");
}

fn print_views(engine: &Engine) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Name", "Parameters", "Kind"]);
    for view in engine.session().views.list() {
        let parameters = view
            .parameters
            .iter()
            .map(|p| format!("{} {}", p.name, p.data_type))
            .collect::<Vec<_>>()
            .join(", ");
        let kind = match view.source {
            ViewSource::Query(_) => "query",
            ViewSource::Native(_) => "native",
        };
        table.add_row(vec![Cell::new(&view.name), Cell::new(parameters), Cell::new(kind)]);
    }
    println!("{table}");
}

fn print_help() {
    println!("Meta-commands:");
    println!("  \\vars             - List declared variables");
    println!("  \\views            - List views");
    println!("  \\reset            - Drop all variables and views");
    println!("  \\q, \\quit         - Quit");
    println!("  \\?, \\h, \\help     - Show this help");
    println!("\nStatements end with ';': USE, DECLARE, SET, CREATE/ALTER/DROP VIEW, SELECT");
}

fn repl(engine: &mut Engine) -> Result<(), Box<dyn std::error::Error>> {
    let mut rl = DefaultEditor::new()?;

    let history_file = dirs::home_dir().map(|mut p| {
        p.push(".lq_history");
        p
    });
    if let Some(ref path) = history_file {
        let _ = rl.load_history(path); // Ignore error if file doesn't exist
    }

    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║                  logquery interactive                    ║");
    println!("╚══════════════════════════════════════════════════════════╝");
    println!("Type \\? for help, \\q to quit.\n");

    let mut buffer = String::new();
    loop {
        let prompt = if buffer.is_empty() { "lq> " } else { "..> " };
        match rl.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if buffer.is_empty() && trimmed.starts_with('\\') {
                    let _ = rl.add_history_entry(trimmed);
                    match trimmed {
                        "\\q" | "\\quit" => break,
                        "\\vars" => print_variables(engine),
                        "\\views" => print_views(engine),
                        "\\reset" => match engine.reset() {
                            Ok(()) => println!("Session reset"),
                            Err(e) => eprintln!("error: {e}"),
                        },
                        "\\?" | "\\h" | "\\help" => print_help(),
                        _ => println!("Unknown meta-command: {trimmed}. Use \\? for help."),
                    }
                    continue;
                }
                if trimmed.is_empty() && buffer.is_empty() {
                    continue;
                }

                buffer.push_str(&line);
                buffer.push('\n');
                if trimmed.ends_with(';') {
                    let _ = rl.add_history_entry(buffer.trim());
                    run_batch(engine, &buffer);
                    buffer.clear();
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C drops the pending statement
                buffer.clear();
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("error: {e}");
                break;
            }
        }
    }

    if let Some(ref path) = history_file {
        let _ = rl.save_history(path);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let mut engine = Engine::new(&config)?;

    let batch = match (&args.query, &args.file) {
        (Some(query), _) => Some(query.clone()),
        (None, Some(file)) => Some(fs::read_to_string(file)?),
        (None, None) => None,
    };

    match batch {
        Some(text) => {
            if !run_batch(&mut engine, &text) {
                drop(engine);
                std::process::exit(1);
            }
            Ok(())
        }
        None => repl(&mut engine),
    }
}
