use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};
use vikey::config::{Config, DEFAULT_CONFIG_PATH, SharedConfig};
use vikey::engine::{MAX_DIRECTIVE_BACKSPACES, ReplacementDirective};
use vikey::typing::{self, InjectionMode, SystemClipboard, TextSynthesizer};
use vikey::{Encoding, OutputEncoding, logging};

#[derive(Parser)]
#[command(name = "vikey", version, about = "Vietnamese input method")]
struct Cli {
    /// Config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Intercept keystrokes system-wide (default; Windows only)
    Run,
    /// Transliterate text between Vietnamese encodings
    Convert {
        /// unicode, vni, tcvn3 or composite
        #[arg(long, default_value = "unicode")]
        from: String,
        #[arg(long)]
        to: String,
        /// Text to convert; read from stdin when omitted
        text: Option<String>,
    },
    /// Type text into whichever window has focus, to check an injection mode
    Send {
        /// Characters to delete first
        #[arg(long, default_value_t = 0)]
        backspaces: usize,
        /// fast, slow or clipboard (default: from config)
        #[arg(long)]
        mode: Option<String>,
        /// unicode, vni or tcvn3
        #[arg(long, default_value = "unicode")]
        encoding: String,
        /// Time to focus the target window
        #[arg(long, default_value_t = 3000)]
        delay_ms: u64,
        text: String,
    },
}

#[hotpath::main]
fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = Config::load_from(&cli.config);
    logging::init(
        &loaded
            .as_ref()
            .map(|c| c.logging.clone())
            .unwrap_or_default(),
    );
    let config = loaded.unwrap_or_else(|e| {
        warn!(error = %e, "using default config");
        Config::default()
    });
    let config = Arc::new(SharedConfig::watching(config, &cli.config));

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(config),
        Command::Convert { from, to, text } => convert_text(&from, &to, text),
        Command::Send {
            backspaces,
            mode,
            encoding,
            delay_ms,
            text,
        } => send_text(&config, backspaces, mode, &encoding, delay_ms, text),
    }
}

#[cfg(windows)]
fn run(config: Arc<SharedConfig>) -> Result<()> {
    use vikey::app_context::{self, ConfiguredAppContext};
    use vikey::engine::PassthroughEngine;
    use vikey::intercept::{self, Dispatcher, KeyInterceptor, ToggleHotkey};
    use vikey::stats;
    use vikey::typing::{BoxedSynthesizer, Win32Input};

    let hotkey = config.read(|c| c.toggle_hotkey.clone());
    if ToggleHotkey::from_config(&hotkey).is_none() {
        warn!(key = %hotkey.key, "unknown toggle key, using Ctrl+Space");
    }

    let stats = stats::new_shared();
    let synth: BoxedSynthesizer =
        TextSynthesizer::new(Box::new(Win32Input), Box::new(SystemClipboard));
    let app = ConfiguredAppContext::new(app_context::system_tracker(), Arc::clone(&config));
    let interceptor = KeyInterceptor::new(
        Box::new(PassthroughEngine),
        Box::new(app),
        synth,
        Arc::clone(&config),
        Arc::clone(&stats),
    );
    let dispatcher = Arc::new(Dispatcher::new(interceptor));

    let handle = intercept::install(Arc::clone(&dispatcher))?;
    let thread_id = handle.thread_id();
    ctrlc::set_handler(move || intercept::request_quit(thread_id))
        .context("Failed to install Ctrl+C handler")?;

    info!(
        enabled = dispatcher.is_enabled(),
        mode = %config.injection_mode(),
        "vikey running, Ctrl+C to quit"
    );
    let interval = Duration::from_secs(config.read(|c| c.hook.health_interval_secs));
    intercept::run_message_loop(&config, &stats, interval)?;

    drop(handle);
    info!("{}", stats.summary());
    Ok(())
}

#[cfg(not(windows))]
fn run(_config: Arc<SharedConfig>) -> Result<()> {
    bail!("the keyboard hook is only available on Windows; `convert` and `send` work everywhere")
}

fn convert_text(from: &str, to: &str, text: Option<String>) -> Result<()> {
    let from: Encoding = from.parse()?;
    let to: Encoding = to.parse()?;
    match text {
        Some(text) => println!("{}", vikey::convert(&text, from, to)),
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read stdin")?;
            print!("{}", vikey::convert(&input, from, to));
        }
    }
    Ok(())
}

fn send_text(
    config: &SharedConfig,
    backspaces: usize,
    mode: Option<String>,
    encoding: &str,
    delay_ms: u64,
    text: String,
) -> Result<()> {
    let mode = match mode {
        Some(name) => name.parse::<InjectionMode>()?,
        None => config.injection_mode(),
    };
    let encoding: OutputEncoding = encoding.parse()?;
    let directive = ReplacementDirective::new(backspaces, text);
    if !directive.is_well_formed() {
        bail!(
            "at most {} backspaces and no NUL characters",
            MAX_DIRECTIVE_BACKSPACES
        );
    }

    info!(%mode, %encoding, delay_ms, "typing into the focused window");
    thread::sleep(Duration::from_millis(delay_ms));

    let mut synth = TextSynthesizer::new(typing::system_input()?, SystemClipboard);
    synth.send(&directive, mode, encoding)?;
    Ok(())
}
