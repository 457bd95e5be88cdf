mod common;
mod config;
mod error;
mod network;
mod ui;

use std::error::Error;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use common::{FormSubmission, NetworkCommand, NetworkEvent, SubmitStatus};
use config::AppConfig;
use error::ClientError;
use network::{ChatClient, FormSubmitter, Session, WebSocketSource};
use ui::components::chat_area::format_line;
use ui::{AppState, ChatApp};

#[derive(Parser)]
#[command(
    name = "socketio_chat_client",
    version,
    about = "Realtime inbox client for a Socket.IO chat backend"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Nickname; also the channel messages arrive on
    #[arg(long, env = "CHAT_NICKNAME")]
    nickname: Option<String>,
    /// Backend base url, e.g. http://127.0.0.1:5000
    #[arg(long, env = "CHAT_SERVER_URL", value_name = "URL")]
    server: Option<String>,
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Clone)]
enum Mode {
    /// Print incoming messages to stdout (no UI)
    Tail,
    /// Submit the send form once and exit
    Send {
        /// Form field as NAME=VALUE; repeatable, later values win
        #[arg(short, long = "field", value_name = "NAME=VALUE", value_parser = parse_field)]
        fields: Vec<(String, String)>,
        /// Override the configured form action
        #[arg(long)]
        action: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let mut app_config = config::load_config(&cli.config);
    if let Some(server) = cli.server {
        app_config.server_url = server;
    }

    let nickname = cli
        .nickname
        .or_else(|| app_config.nickname.clone())
        .ok_or(ClientError::MissingIdentity)?;
    let session = Session::new(&nickname, &app_config.server_url)?;

    match cli.mode {
        Some(Mode::Tail) => run_tail(session, &app_config).await,
        Some(Mode::Send { fields, action }) => {
            run_send(session, &app_config, fields, action).await
        }
        None => run_full_client(session, app_config).await,
    }
}

fn spawn_network(
    session: Session,
    app_config: &AppConfig,
    event_tx: mpsc::Sender<NetworkEvent>,
    cmd_rx: mpsc::Receiver<NetworkCommand>,
) -> Result<JoinHandle<()>, ClientError> {
    let source = WebSocketSource::new(session.server_url(), &app_config.socketio_path)?;
    let history_target = app_config
        .history_path
        .as_deref()
        .map(|path| session.resolve(path))
        .transpose()?;

    let mut client = ChatClient::new(session, event_tx, cmd_rx);
    if let Some(target) = history_target {
        client = client.with_history(target);
    }

    Ok(tokio::spawn(async move {
        if let Err(err) = client.run(source).await {
            log::error!("Network client terminated: {err}");
        }
    }))
}

async fn run_full_client(session: Session, app_config: AppConfig) -> Result<(), Box<dyn Error>> {
    // UI -> Network
    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    // Network -> UI
    let (event_tx, event_rx) = mpsc::channel(100);

    let state = AppState::new(session.identity(), &app_config.send_form);
    spawn_network(session, &app_config, event_tx, cmd_rx)?;

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Socket.IO Chat",
        options,
        Box::new(move |cc| {
            log::info!("UI started for {}", state.identity);
            Ok(Box::new(ChatApp::new(cc, state, cmd_tx, event_rx)))
        }),
    )?;
    Ok(())
}

async fn run_tail(session: Session, app_config: &AppConfig) -> Result<(), Box<dyn Error>> {
    let (_cmd_tx, cmd_rx) = mpsc::channel(1);
    let (event_tx, mut event_rx) = mpsc::channel(100);
    let network = spawn_network(session, app_config, event_tx, cmd_rx)?;

    loop {
        tokio::select! {
            event = event_rx.recv() => {
                match event {
                    Some(NetworkEvent::MessageReceived(message)) => println!("{}", format_line(&message)),
                    Some(NetworkEvent::HistorySynced(history)) => {
                        for message in &history {
                            println!("{}", format_line(message));
                        }
                    }
                    Some(NetworkEvent::ConnectionFailed(reason)) => {
                        return Err(format!("connection failed: {reason}").into());
                    }
                    Some(NetworkEvent::Disconnected(reason)) => {
                        log::info!("Disconnected: {reason}");
                        break;
                    }
                    Some(NetworkEvent::DecodeFailed { raw, error }) => {
                        log::warn!("Unreadable message ({error}): {raw}");
                    }
                    Some(other) => log::debug!("{other:?}"),
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted");
                break;
            }
        }
    }

    network.abort();
    Ok(())
}

async fn run_send(
    session: Session,
    app_config: &AppConfig,
    overrides: Vec<(String, String)>,
    action: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let mut fields: Vec<(String, String)> = app_config
        .send_form
        .fields
        .iter()
        .map(|field| (field.name.clone(), field.value.clone()))
        .collect();
    fields.extend(overrides);

    let action = action.unwrap_or_else(|| app_config.send_form.action.clone());
    let submission = FormSubmission::new(action, fields);
    let target = session.resolve(&submission.action)?;

    let submitter = FormSubmitter::new(reqwest::Client::new());
    match submitter.submit_status(target.clone(), &submission).await {
        SubmitStatus::Delivered { status } => {
            log::info!("Submitted to {target} (HTTP {status})");
            Ok(())
        }
        SubmitStatus::Rejected { status } => {
            Err(format!("{target} rejected the submission (HTTP {status})").into())
        }
        SubmitStatus::Failed { reason } => Err(format!("submission failed: {reason}").into()),
    }
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected NAME=VALUE, got `{raw}`"))
}
