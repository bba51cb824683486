//! Host process launched by the browser. Takes no arguments; see
//! [`youtube_downloader_host::config`] for the optional config file.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use youtube_downloader_host::config::{default_path, HostConfig};
use youtube_downloader_host::dispatch::Dispatcher;
use youtube_downloader_host::downloader::YtDlp;
use youtube_downloader_host::host::{serve, LoopExit, StopSignal};
use youtube_downloader_host::logging::{self, LogTarget};
use youtube_downloader_host::notify::{NoopNotifier, NotifySend, Notifier};

fn main() -> ExitCode {
    let (config, config_error) = match HostConfig::load() {
        Ok(c) => (c, None),
        Err(e) => (HostConfig::default(), Some(e)),
    };

    if let LogTarget::Stderr(e) = logging::init(&config.logging) {
        tracing::warn!(file = %config.logging.file.display(), error = %e, "cannot open log file, logging to stderr");
    }
    match config_error {
        Some(e) => tracing::error!(error = %e, "using default configuration"),
        None => tracing::debug!(path = %default_path().display(), "configuration loaded"),
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "failed to start runtime");
            return ExitCode::FAILURE;
        }
    };
    let code = runtime.block_on(run(config));
    // the stdin reader may still be blocked; do not wait for it
    runtime.shutdown_background();
    code
}

async fn run(config: HostConfig) -> ExitCode {
    let stop = Arc::new(StopSignal::new());
    let notifier: Box<dyn Notifier + Send> = if config.notifications.enabled {
        Box::new(NotifySend::new())
    } else {
        Box::new(NoopNotifier)
    };
    let downloader = YtDlp::locate(config.downloads.yt_dlp.as_deref());
    tracing::info!(yt_dlp = %downloader.binary_path().display(), "host starting");
    let dispatcher = Dispatcher::new(downloader, notifier, config.downloads, config.notifications);

    let loop_stop = Arc::clone(&stop);
    let mut worker = tokio::task::spawn_blocking(move || {
        let stdin = io::stdin();
        let stdout = io::stdout();
        serve(&mut stdin.lock(), &mut stdout.lock(), &loop_stop, |request| {
            dispatcher.process(&request)
        })
    });

    tokio::select! {
        joined = &mut worker => match joined {
            Ok(Ok(LoopExit::Disconnected)) => {
                tracing::info!("browser disconnected, exiting");
                ExitCode::SUCCESS
            }
            Ok(Ok(LoopExit::Interrupted)) => ExitCode::SUCCESS,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "transport error, exiting");
                ExitCode::FAILURE
            }
            Err(e) => {
                tracing::error!(error = %e, "message loop panicked");
                ExitCode::FAILURE
            }
        },
        _ = wait_for_signal() => {
            let stop = Arc::clone(&stop);
            // waits out a frame that is being written right now
            if let Err(e) = tokio::task::spawn_blocking(move || stop.request_stop()).await {
                tracing::error!(error = %e, "failed to stop message loop");
            }
            ExitCode::SUCCESS
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("received SIGTERM, exiting"),
                _ = sigint.recv() => tracing::info!("received SIGINT, exiting"),
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "could not register signal handlers, using ctrl_c fallback");
            ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    ctrl_c().await;
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received Ctrl+C, exiting"),
        Err(e) => {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            // without a signal source the loop decides when to stop
            std::future::pending::<()>().await
        }
    }
}
