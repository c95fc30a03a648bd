use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use dialoguer::Input;
use tracing_subscriber::EnvFilter;

use friday_gateway::api::ApiServerBuilder;
use friday_gateway::config::SpeechPreferences;
use friday_gateway::voice::{
    CommandSynthesizer, MicrophoneRecognizer, SpeakerSink, SpeechRecognizer, SpeechSynthesizer,
    catalog,
};
use friday_gateway::{
    Config, ConversationStore, HttpGateway, KvStore, Session, SpeechInputCapture, SpeechOutcome,
    SpeechOutputChooser, StatusIndicator, SubmitOutcome, db,
};

/// FRIDAY - voice chat assistant
#[derive(Parser)]
#[command(name = "friday", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the gateway server (default)
    Serve {
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },
    /// Talk to FRIDAY in the terminal
    Chat(ClientArgs),
    /// Speak one line of text
    Say {
        /// Text to speak
        text: String,

        #[command(flatten)]
        client: ClientArgs,
    },
    /// List cloud and on-device voices
    Voices,
    /// Interactive first-run setup
    Setup,
}

#[derive(Args, Clone, Default)]
struct ClientArgs {
    /// Gateway base URL
    #[arg(long)]
    gateway_url: Option<String>,

    /// Don't speak replies
    #[arg(long)]
    no_speak: bool,

    /// Use on-device speech instead of cloud voices
    #[arg(long)]
    local_tts: bool,

    /// Voice name (cloud catalog name or on-device voice)
    #[arg(long)]
    voice: Option<String>,
}

impl ClientArgs {
    fn preferences(&self, base: &SpeechPreferences) -> SpeechPreferences {
        SpeechPreferences {
            speak: base.speak && !self.no_speak,
            cloud_tts: base.cloud_tts && !self.local_tts,
            voice: self.voice.clone().or_else(|| base.voice.clone()),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn,friday_gateway=info",
        1 => "info,friday_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => serve(port).await,
        Command::Chat(args) => chat(&args).await,
        Command::Say { text, client } => say(&text, &client).await,
        Command::Voices => voices().await,
        Command::Setup => friday_gateway::setup::run_setup(),
    }
}

/// Run the gateway until it fails
async fn serve(port: Option<u16>) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(port) = port {
        config.server.port = port;
    }
    tracing::debug!(?config, "loaded configuration");

    ApiServerBuilder::from_config(&config).build().run().await?;
    Ok(())
}

/// Everything the terminal client needs
struct Client {
    session: Session,
    capture: SpeechInputCapture,
}

fn local_synthesizer() -> Option<Arc<dyn SpeechSynthesizer>> {
    match CommandSynthesizer::detect() {
        Ok(synth) => Some(Arc::new(synth)),
        Err(e) => {
            tracing::warn!(error = %e, "on-device speech unavailable");
            None
        }
    }
}

fn speech_output(
    gateway: &Arc<HttpGateway>,
    preferences: SpeechPreferences,
) -> Arc<SpeechOutputChooser> {
    Arc::new(SpeechOutputChooser::new(
        gateway.clone(),
        local_synthesizer(),
        Arc::new(SpeakerSink::new()),
        preferences,
    ))
}

fn connect(config: &Config, args: &ClientArgs) -> anyhow::Result<Arc<HttpGateway>> {
    let url = args
        .gateway_url
        .as_deref()
        .unwrap_or(&config.client.gateway_url);
    tracing::debug!(gateway = url, "using gateway");
    Ok(Arc::new(HttpGateway::new(url, config.client.timeout)?))
}

fn build_client(config: Config, args: &ClientArgs) -> anyhow::Result<Client> {
    let gateway = connect(&config, args)?;
    let speech = speech_output(&gateway, args.preferences(&config.client.preferences));

    let storage = KvStore::new(db::init(config.database_path())?);
    let store = ConversationStore::load(Arc::new(storage));

    let recognizer: Option<Arc<dyn SpeechRecognizer>> =
        match MicrophoneRecognizer::detect(gateway.clone()) {
            Ok(recognizer) => Some(Arc::new(recognizer)),
            Err(e) => {
                tracing::info!(error = %e, "hold-to-talk disabled");
                None
            }
        };

    let status = StatusIndicator::new();
    let capture = SpeechInputCapture::new(recognizer, status.clone());
    let session = Session::new(config.persona, store, gateway, speech, status);

    Ok(Client { session, capture })
}

/// Interactive conversation loop
#[allow(clippy::future_not_send)]
async fn chat(args: &ClientArgs) -> anyhow::Result<()> {
    let config = Config::load()?;
    let client = build_client(config, args)?;
    let session = &client.session;
    let name = session.persona().name().to_string();

    if session.start().await {
        println!("{name}: {}", session.persona().greeting());
        session.greet().await;
    } else {
        let turns = session.turns().await;
        println!("(resuming, {} earlier messages)", turns.len());
        if let Some(last) = turns.last() {
            println!("{}: {}", last.role, last.content);
        }
    }
    println!("Type a message, /listen to talk, /voices, /reset, or /quit.\n");

    while let Some(line) = prompt("you", String::new()).await? {
        match line.trim() {
            "" => {}
            "/quit" | "/exit" => break,
            "/reset" => {
                session.reset().await;
                println!("Conversation cleared.");
            }
            "/voices" => print_local_voices(session.speech()).await,
            "/listen" => {
                if let Some(text) = listen(&client.capture).await? {
                    submit(session, &name, &text).await;
                }
            }
            text => submit(session, &name, text).await,
        }
    }

    session.shutdown().await;
    Ok(())
}

async fn submit(session: &Session, name: &str, text: &str) {
    match session.submit(text).await {
        SubmitOutcome::Replied { reply, .. } | SubmitOutcome::Fallback { reply, .. } => {
            println!("{name}: {reply}");
        }
        SubmitOutcome::Busy => println!("(still working on the last message)"),
        SubmitOutcome::Ignored => {}
    }
}

/// Read a line, `None` on end of input
async fn prompt(label: &'static str, initial: String) -> anyhow::Result<Option<String>> {
    let answer = tokio::task::spawn_blocking(move || {
        Input::<String>::new()
            .with_prompt(label)
            .with_initial_text(initial)
            .allow_empty(true)
            .interact_text()
    })
    .await?;

    match answer {
        Ok(line) => Ok(Some(line)),
        Err(dialoguer::Error::IO(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Record one utterance and let the user edit it before sending
#[allow(clippy::future_not_send)]
async fn listen(capture: &SpeechInputCapture) -> anyhow::Result<Option<String>> {
    if !capture.is_available() {
        println!("Speech recognition isn't available here. Type instead.");
        return Ok(None);
    }

    capture.press();
    println!("Listening... press Enter to stop.");

    let mut staging = capture.subscribe_staging();
    let echo = tokio::spawn(async move {
        while staging.changed().await.is_ok() {
            let text = staging.borrow_and_update().clone();
            if !text.is_empty() {
                eprint!("\r  ... {text}");
            }
        }
    });

    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map(|_| ())
    })
    .await??;

    let started = capture.release();
    let result = capture.finished().await;
    echo.abort();
    eprintln!();

    if !started {
        println!("Too quick, hold a little longer.");
        return Ok(None);
    }

    match result {
        Some(Ok(_)) => {
            let edited = prompt("you", capture.staged_text()).await?;
            Ok(edited.filter(|t| !t.trim().is_empty()))
        }
        Some(Err(e)) => {
            println!("Couldn't hear you: {e}");
            Ok(None)
        }
        None => Ok(None),
    }
}

/// Speak one line through the normal output path
async fn say(text: &str, args: &ClientArgs) -> anyhow::Result<()> {
    let config = Config::load()?;
    let gateway = connect(&config, args)?;
    let speech = speech_output(&gateway, args.preferences(&config.client.preferences));

    let outcome = speech.speak(text).await;
    speech.wait().await;

    match outcome {
        SpeechOutcome::Skipped => println!("Speech is turned off."),
        SpeechOutcome::Cloud => println!("Spoken with a cloud voice."),
        SpeechOutcome::Local => println!("Spoken on-device."),
        SpeechOutcome::LocalFallback => println!("Cloud voice failed, spoken on-device."),
        SpeechOutcome::Silent => println!("Nothing could speak that; no voice is available."),
    }
    Ok(())
}

/// List the catalog and whatever the local engine offers
async fn voices() -> anyhow::Result<()> {
    println!("Cloud voices:");
    for voice in catalog::voices() {
        let marker = if voice.name == catalog::DEFAULT_VOICE { "*" } else { " " };
        println!(" {marker} {:<8} {}", voice.name, voice.description);
    }

    println!("\nOn-device voices:");
    match local_synthesizer() {
        Some(synth) => {
            let voices = synth.voices().await;
            if voices.is_empty() {
                println!("   (none reported)");
            }
            for voice in voices {
                println!("   {:<24} {}", voice.name, voice.language.unwrap_or_default());
            }
        }
        None => println!("   (no speech engine installed)"),
    }
    Ok(())
}

async fn print_local_voices(speech: &SpeechOutputChooser) {
    let voices = speech.local_voices().await;
    if voices.is_empty() {
        println!("No on-device voices.");
        return;
    }
    for voice in voices {
        println!("  {}", voice.name);
    }
}
