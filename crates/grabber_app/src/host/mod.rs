mod config;
mod events;
mod logging;

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use engine_logging::{engine_info, engine_warn};
use grabber_engine::{
    ChannelProgressSink, ClientSettings, CredentialStore, GrabberApi, SupervisorSettings,
    WorkerSupervisor,
};
use serde::Serialize;

pub fn run_app() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_RUN_FILE));
    let run = config::load_run_file(&path)?;
    logging::initialize(run.log);

    // The captured session arrives in one piece, as it would from the login flow.
    let credentials = Arc::new(CredentialStore::default());
    credentials.replace(run.session.into_credentials()?);

    let (sink, events) = ChannelProgressSink::channel();
    let supervisor = WorkerSupervisor::with_http(
        ClientSettings::default(),
        credentials,
        Arc::new(sink),
        SupervisorSettings::default(),
    )?;
    let api = GrabberApi::new(Arc::new(supervisor));
    let printer = events::spawn_printer(events);

    let started = api.start(run.params);
    print_reply("start", &started)?;
    if started.success {
        wait_for_stop_request(run.run_for_secs.map(Duration::from_secs));
        print_reply("stop", &api.stop())?;
        print_reply("status", &api.status())?;
    }

    // Dropping the api closes the event channel and lets the printer finish.
    drop(api);
    if let Some(printer) = printer {
        if printer.join().is_err() {
            engine_warn!("Event printer panicked");
        }
    }
    Ok(())
}

fn wait_for_stop_request(run_for: Option<Duration>) {
    let (tx, rx) = mpsc::channel();
    let _ = thread::Builder::new()
        .name("stdin-stop".to_string())
        .spawn(move || {
            let mut line = String::new();
            if matches!(std::io::stdin().lock().read_line(&mut line), Ok(read) if read > 0) {
                let _ = tx.send(());
            }
        });
    wait_on(&rx, run_for);
}

/// Blocks until a stop request arrives on `rx` or `run_for` elapses.
fn wait_on(rx: &mpsc::Receiver<()>, run_for: Option<Duration>) {
    match run_for {
        Some(limit) => {
            engine_info!("Grabbing for up to {:?}; press Enter to stop early", limit);
            let deadline = Instant::now() + limit;
            if let Err(mpsc::RecvTimeoutError::Disconnected) = rx.recv_timeout(limit) {
                // stdin is closed; only the timer can end the run.
                thread::sleep(deadline.saturating_duration_since(Instant::now()));
            }
        }
        None => {
            engine_info!("Grabbing; press Enter to stop");
            if rx.recv().is_err() {
                engine_warn!("stdin is closed; grabbing until the process is terminated");
                loop {
                    thread::park();
                }
            }
        }
    }
}

fn print_reply<T: Serialize>(operation: &str, reply: &T) -> anyhow::Result<()> {
    println!("{operation}: {}", serde_json::to_string(reply)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_stdin_without_limit_keeps_running() {
        let (done_tx, done_rx) = mpsc::channel();
        thread::spawn(move || {
            let (tx, rx) = mpsc::channel::<()>();
            drop(tx);
            wait_on(&rx, None);
            let _ = done_tx.send(());
        });
        assert_eq!(
            done_rx.recv_timeout(Duration::from_millis(300)),
            Err(mpsc::RecvTimeoutError::Timeout)
        );
    }

    #[test]
    fn closed_stdin_with_limit_waits_for_the_timer() {
        let (tx, rx) = mpsc::channel::<()>();
        drop(tx);
        let started = Instant::now();
        wait_on(&rx, Some(Duration::from_millis(150)));
        assert!(started.elapsed() >= Duration::from_millis(150));
    }

    #[test]
    fn enter_stops_before_the_limit() {
        let (tx, rx) = mpsc::channel();
        tx.send(()).unwrap();
        let started = Instant::now();
        wait_on(&rx, Some(Duration::from_secs(10)));
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
