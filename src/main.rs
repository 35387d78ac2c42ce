//! CLI entry point for utsushi
//!
//! Previews a script in the terminal, or serves the preview protocol over
//! stdin/stdout for an editor.

use std::path::PathBuf;
use std::process;
use utsushi::config::PreviewConfig;
use utsushi::logging::{self, LogConfig};

struct Options {
    script: PathBuf,
    config: Option<PathBuf>,
    debug: bool,
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = &args[1];

    match command.as_str() {
        "play" | "serve" => {
            let options = match parse_options(&args[2..]) {
                Ok(options) => options,
                Err(message) => {
                    eprintln!("Error: {}", message);
                    eprintln!();
                    print_usage();
                    process::exit(1);
                }
            };
            if let Err(err) = run(command, options).await {
                eprintln!("Error: {} failed", command);
                eprintln!("Reason: {:#}", err);
                process::exit(1);
            }
        }
        "--help" | "-h" => {
            print_usage();
        }
        _ => {
            eprintln!("Error: Unknown command '{}'", command);
            eprintln!();
            print_usage();
            process::exit(1);
        }
    }
}

fn parse_options(args: &[String]) -> Result<Options, String> {
    let mut script = None;
    let mut config = None;
    let mut debug = false;

    let mut args = args.iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--debug" => debug = true,
            "--config" => {
                let path = args.next().ok_or("Missing value for --config")?;
                config = Some(PathBuf::from(path));
            }
            flag if flag.starts_with("--") => return Err(format!("Unknown option '{}'", flag)),
            path if script.is_none() => script = Some(PathBuf::from(path)),
            extra => return Err(format!("Unexpected argument '{}'", extra)),
        }
    }

    Ok(Options {
        script: script.ok_or("Missing script file path")?,
        config,
        debug,
    })
}

async fn run(command: &str, options: Options) -> anyhow::Result<()> {
    let mut config = PreviewConfig::load(options.config.as_deref())?;
    if options.debug {
        config.log = LogConfig::verbose();
    }
    logging::init(&config.log);

    match command {
        "play" => utsushi::cli::play::run_play(&options.script, &config, options.debug).await,
        _ => utsushi::cli::serve::run_serve(&options.script, &config).await,
    }
}

fn print_usage() {
    println!("utsushi - Live preview for narrative scripts");
    println!();
    println!("USAGE:");
    println!("    utsushi play <script.md> [--config <file>] [--debug]");
    println!("    utsushi serve <script.md> [--config <file>] [--debug]");
    println!();
    println!("COMMANDS:");
    println!("    play <file>     Preview the script in the terminal, reloading on save");
    println!("    serve <file>    Speak the preview protocol as JSON lines on stdin/stdout");
    println!("    --help, -h      Show this help message");
    println!();
    println!("OPTIONS:");
    println!("    --config <file>    JSON configuration (see PreviewConfig)");
    println!("    --debug            Log everything to stderr and show state details");
    println!();
    println!("ENVIRONMENT:");
    println!("    {}    Enable logging to stderr", logging::DEBUG_ENV);
    println!();
    println!("EXAMPLES:");
    println!("    utsushi play scenarios/intro.md");
    println!("    utsushi serve scenarios/intro.md --config preview.json");
}
