//! Wi-Fi QR - Main Entry Point

use std::{path::Path, sync::Arc};

use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wifi_qr::{
    AuthType, DetectionResult, GenerationController, PayloadCodec, ScanSession, ScanState,
    WifiCredentials,
    backend::{CopyOutcome, ReplayBackend, SystemClipboard, copy_password},
    config::{CliArgs, Command, Settings},
    protocol::Notification,
    qr::{QrCodeRenderer, QrRenderer, RenderOptions, RqrrDecoder, scan_image},
    storage::JsonFileStore,
};

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> AppResult<()> {
    // Logs go to stderr, stdout carries results
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,wifi_qr=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();
    info!(?args, "Starting wifi-qr");
    let settings = Settings::from(args);

    match settings.command.clone() {
        Command::Generate {
            ssid,
            password,
            auth,
            hidden,
            output_dir,
            copy,
        } => {
            let credentials = WifiCredentials::new(ssid, password, AuthType::new(auth), hidden);
            run_generate(credentials, output_dir.as_deref(), copy).await
        }
        Command::Decode { payload } => {
            let credentials = PayloadCodec::decode(&payload)?;
            println!("{}", serde_json::to_string(&credentials)?);
            Ok(())
        }
        Command::ScanImage {
            path,
            copy_password,
        } => run_scan_image(&path, copy_password).await,
        Command::Devices => run_devices(&settings).await,
        Command::Scan {
            device,
            snapshot,
            copy_password,
        } => run_scan(&settings, device, snapshot.as_deref(), copy_password).await,
    }
}

async fn run_generate(
    credentials: WifiCredentials,
    output_dir: Option<&Path>,
    copy: bool,
) -> AppResult<()> {
    let mut controller = GenerationController::new(QrCodeRenderer, SystemClipboard::new());

    let code = controller.generate(credentials)?;
    println!("{}", code.payload);

    if let Some(dir) = output_dir {
        let path = controller.export_png(dir)?;
        info!("Saved {}", path.display());
    }

    if copy {
        controller.copy_payload().await?;
    }
    Ok(())
}

async fn run_scan_image(path: &Path, copy: bool) -> AppResult<()> {
    let result = scan_image(path, &mut RqrrDecoder::new())?;
    println!("{}", serde_json::to_string(&result)?);

    if let DetectionResult::NoDetection = result {
        warn!("No QR code found in {}", path.display());
    }
    if copy {
        copy_detected_password(&result).await;
    }
    Ok(())
}

fn open_session(
    settings: &Settings,
) -> ScanSession<ReplayBackend, RqrrDecoder, JsonFileStore> {
    ScanSession::new(
        Arc::new(ReplayBackend::new(&settings.camera_root)),
        Arc::new(JsonFileStore::new(&settings.state_file)),
        RqrrDecoder::new(),
        settings.frame_interval,
    )
}

async fn run_devices(settings: &Settings) -> AppResult<()> {
    let session = open_session(settings);
    let devices = session.refresh_devices().await?;
    let selected = session.selected_device().await;

    if devices.is_empty() {
        warn!("No cameras found under {}", settings.camera_root.display());
    }
    for device in devices {
        let marker = if selected.as_deref() == Some(device.id.as_str()) {
            " *"
        } else {
            ""
        };
        println!("{}\t{}{}", device.id, device.label, marker);
    }
    Ok(())
}

async fn run_scan(
    settings: &Settings,
    device: Option<String>,
    snapshot: Option<&Path>,
    copy: bool,
) -> AppResult<()> {
    let session = open_session(settings);
    session.refresh_devices().await?;
    if device.is_some() {
        session.select_device(device).await?;
    }

    let mut events = session.subscribe();
    session.start().await?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT (Ctrl+C), stopping scan");
                break;
            }
            _ = shutdown_signal() => {
                info!("Received SIGTERM, stopping scan");
                break;
            }
            event = events.recv() => match event {
                Ok(notification) => {
                    println!("{}", serde_json::to_string(&notification)?);
                    if let Notification::ScanStateChanged(params) = &notification {
                        if matches!(params.state, ScanState::Paused | ScanState::Idle) {
                            break;
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Dropped {} notifications", skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    if let Some(result) = session.last_detection().await {
        if let Some(path) = snapshot {
            save_snapshot(&result, path)?;
        }
        if copy {
            copy_detected_password(&result).await;
        }
    }

    session.stop().await?;
    Ok(())
}

/// Render the detected payload back into a still image
fn save_snapshot(result: &DetectionResult, path: &Path) -> AppResult<()> {
    if let DetectionResult::WifiDetected { raw_payload, .. } = result {
        let image = QrCodeRenderer.render(raw_payload, &RenderOptions::default())?;
        image.save(path)?;
        info!("Saved snapshot to {}", path.display());
    }
    Ok(())
}

async fn copy_detected_password(result: &DetectionResult) {
    let Some(credentials) = result.credentials() else {
        return;
    };
    match copy_password(&SystemClipboard::new(), credentials).await {
        Ok(CopyOutcome::Copied) => info!("Password copied to clipboard"),
        Ok(CopyOutcome::NoPassword) => info!("Open network, no password to copy"),
        Err(e) => error!("{}", e),
    }
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!("Failed to register SIGTERM handler: {}", e);
            std::future::pending::<()>().await
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    // On non-Unix platforms, just wait forever
    std::future::pending::<()>().await
}
