use clap::{Arg, ArgAction, Command};
use quick_translate::{
    JsonFileStore, LanguageCode, LibreTranslateProvider, LanguageDetectorService, MemoryStore,
    Messages, MockDetection, MockMode, MockModels, ModelBroker, Pipeline, PopupView, ResultCache,
    RunOutcome, SelectionSource, SessionStore, StaticSelection, StdinSelection, TranslatorService,
};
use std::env;
use std::io::{IsTerminal, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Streams rendered content to stdout and the status line to stderr
struct TerminalView {
    shown: Mutex<String>,
    status_line: bool,
}

impl TerminalView {
    fn new() -> Self {
        Self {
            shown: Mutex::new(String::new()),
            status_line: std::io::stderr().is_terminal(),
        }
    }
}

impl PopupView for TerminalView {
    fn render(&self, markdown: &str) {
        let Ok(mut shown) = self.shown.lock() else {
            return;
        };
        let mut out = std::io::stdout().lock();

        // Renders within a run only ever extend the previous one, except for
        // the final error message.
        let _ = if markdown.starts_with(shown.as_str()) {
            write!(out, "{}", &markdown[shown.len()..])
        } else {
            write!(out, "\n{}", markdown)
        };
        let _ = out.flush();
        *shown = markdown.to_string();
    }

    fn set_status(&self, text: &str) {
        if self.status_line {
            eprint!("\r\x1b[2K{}", text);
        }
    }

    fn set_controls_enabled(&self, _enabled: bool) {}
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("quick-translate")
        .version("0.1.0")
        .about("Translate text with on-device language models, streaming the result")
        .arg(
            Arg::new("to")
                .long("to")
                .short('t')
                .help("Target language code (default: $QUICK_TRANSLATE_TARGET or en)"),
        )
        .arg(
            Arg::new("text")
                .long("text")
                .help("Text to translate (default: read from stdin)"),
        )
        .arg(
            Arg::new("fresh")
                .long("fresh")
                .short('f')
                .help("Ignore the cached result and translate again")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("cache-file")
                .long("cache-file")
                .help("Keep the last result in this JSON file between invocations"),
        )
        .arg(
            Arg::new("endpoint")
                .long("endpoint")
                .short('e')
                .help("LibreTranslate server URL (default: $LIBRETRANSLATE_URL)"),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .help("Use mock models instead of a translation server")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("locales")
                .long("locales")
                .help("Directory of message catalogs (<locale>.json or <locale>/messages.json)"),
        )
        .arg(
            Arg::new("ui-locale")
                .long("ui-locale")
                .help("Language of messages and language names")
                .default_value("en"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log pipeline progress to stderr")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let default_filter = if matches.get_flag("verbose") {
        "quick_translate=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let target = matches
        .get_one::<String>("to")
        .cloned()
        .or_else(|| env::var("QUICK_TRANSLATE_TARGET").ok())
        .unwrap_or_else(|| "en".to_string());
    let target = LanguageCode::parse(&target)?;
    let ui_locale = LanguageCode::parse(matches.get_one::<String>("ui-locale").unwrap())?;

    let mut messages = match matches.get_one::<String>("locales") {
        Some(dir) => Messages::from_dir(Path::new(dir))?,
        None => Messages::bundled()?,
    };
    messages.with_locale(ui_locale);
    let messages = Arc::new(messages);

    let detection: Arc<dyn LanguageDetectorService>;
    let translation: Arc<dyn TranslatorService>;
    if matches.get_flag("mock") {
        let models = Arc::new(
            MockModels::new(MockMode::Suffix)
                .detecting(MockDetection::language("en"))
                .with_progress(&[0.0, 0.5, 1.0])
                .with_delay(40),
        );
        detection = models.clone();
        translation = models;
    } else {
        let provider = match matches.get_one::<String>("endpoint") {
            Some(url) => LibreTranslateProvider::new(url, env::var("LIBRETRANSLATE_API_KEY").ok()),
            None => LibreTranslateProvider::from_env(),
        };
        let provider = match provider {
            Ok(provider) => Arc::new(provider),
            Err(e) => {
                eprintln!("❌ {}", e);
                eprintln!("   Pass --endpoint http://localhost:5000 or set LIBRETRANSLATE_URL");
                eprintln!("   Or use --mock to use mock models");
                return Err(e.into());
            }
        };
        detection = provider.clone();
        translation = provider;
    }

    let store: Box<dyn SessionStore> = match matches.get_one::<String>("cache-file") {
        Some(path) => Box::new(JsonFileStore::new(path)),
        None => Box::new(MemoryStore::new()),
    };

    let selection: Arc<dyn SelectionSource> = match matches.get_one::<String>("text") {
        Some(text) => Arc::new(StaticSelection::new(text)),
        None => Arc::new(StdinSelection),
    };

    let broker = ModelBroker::new(detection, translation, messages.clone());
    let pipeline = Pipeline::new(
        broker,
        ResultCache::new(store),
        messages,
        Arc::new(TerminalView::new()),
        selection,
    );

    let report = pipeline.run(&target, !matches.get_flag("fresh")).await;
    println!();

    if let RunOutcome::Failed(_) = report.outcome {
        std::process::exit(1);
    }
    Ok(())
}
