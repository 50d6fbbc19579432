use anyhow::Result;
use clap::Parser;
use companion_voice::{
    ClientConfig, ClientEvent, EventKind, FileStore, NatsChannel, VoiceClient, WavFileCapture,
};
use std::sync::Arc;
use tracing::info;

/// Demo driver: connects to a backend over NATS, "captures" from a WAV
/// file, and prints what the backend sends back.
#[derive(Parser, Debug)]
#[command(name = "companion-voice")]
struct Args {
    /// Configuration file (TOML/JSON). Flags below override it.
    #[arg(long)]
    config: Option<String>,

    /// Backend URL, e.g. nats://localhost:4222
    #[arg(long)]
    server_url: Option<String>,

    /// WAV file standing in for the microphone.
    #[arg(long, default_value = "sample.wav")]
    wav: String,

    /// Store file for the persisted device id.
    #[arg(long, default_value = "companion-voice.json")]
    store: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::new("nats://localhost:4222"),
    };
    if let Some(url) = args.server_url {
        config.server_url = url;
    }

    info!("companion-voice demo, backend {}", config.server_url);

    let channel = Arc::new(NatsChannel::new(&config));
    let client = VoiceClient::new(
        config,
        Box::new(WavFileCapture::new(&args.wav)),
        channel,
        Box::new(FileStore::new(&args.store)),
    )
    .await?;

    let (_status_sub, mut status_rx) = client.subscribe(EventKind::Status);
    let (_text_sub, mut text_rx) = client.subscribe(EventKind::Text);
    let (_audio_sub, mut audio_rx) = client.subscribe(EventKind::Audio);
    let (_error_sub, mut error_rx) = client.subscribe(EventKind::Error);

    client.connect().await;
    client.start_listening().await;

    loop {
        tokio::select! {
            Some(ClientEvent::Status(status)) = status_rx.recv() => {
                info!("status: {}", status);
            }
            Some(ClientEvent::Text(text)) = text_rx.recv() => {
                let stamp = chrono::Local::now().format("%H:%M:%S");
                if text.is_final {
                    println!("[{}] ai: {}", stamp, text.ai_text);
                } else {
                    print!("\r[{}] ai: {}", stamp, text.ai_text);
                }
            }
            Some(ClientEvent::Audio(audio)) = audio_rx.recv() => {
                info!("speak (priority {}): {}", audio.priority, audio.text);
            }
            Some(ClientEvent::Error(err)) = error_rx.recv() => {
                info!("error [{}]: {}", err.kind, err.message);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                client.disconnect().await;
                break;
            }
        }
    }

    Ok(())
}
