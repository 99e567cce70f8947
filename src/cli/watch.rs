//! `watch` command: keep a data file hot and report every reload.

use anyhow::{Context, Result};
use crossbeam::channel;
use hot_import::logger::{status_error, status_success, status_unchanged};
use hot_import::{DataLoader, Handle, HotConfig, HotImport, ReloadOutcome, Value, log};

use super::args::WatchArgs;

/// Print the module, then a status block per reload until Ctrl+C.
pub fn run(args: &WatchArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => HotConfig::load(path)
            .with_context(|| format!("failed to load `{}`", path.display()))?,
        None => HotConfig::default(),
    };
    // Watching is the point of this command
    let hot = HotImport::with_config(DataLoader, HotConfig { watch: true, ..config });

    let events = hot.subscribe();
    let handle = hot.hot_import(&args.file)?;
    println!("{}", render(&handle, args.key.as_deref())?);

    let (shutdown_tx, shutdown_rx) = channel::bounded(1);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.try_send(());
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))?;

    loop {
        crossbeam::select! {
            recv(events) -> event => match event {
                Ok(event) => report(&handle, &event.outcome, args.key.as_deref()),
                Err(_) => break,
            },
            recv(shutdown_rx) -> _ => break,
        }
    }

    hot.stop_watch_all();
    log!("watch"; "stopped");
    Ok(())
}

/// Current value of the module, or of one field, as pretty JSON.
fn render(handle: &Handle, key: Option<&str>) -> Result<String> {
    let value = match key {
        Some(key) => handle
            .value(key)
            .with_context(|| format!("no field `{key}` in `{}`", handle.path().display()))?,
        None => handle.current().as_value().cloned().unwrap_or(Value::Null),
    };
    Ok(serde_json::to_string_pretty(&value)?)
}

fn report(handle: &Handle, outcome: &ReloadOutcome, key: Option<&str>) {
    let path = handle.path();
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

    match outcome {
        ReloadOutcome::Reloaded { version } => match render(handle, key) {
            Ok(text) => status_success(&format!("{name} v{version}\n{text}")),
            Err(e) => status_error(&format!("{name} v{version}"), &format!("{e:#}")),
        },
        ReloadOutcome::Unchanged => status_unchanged(&format!("{name} unchanged")),
        ReloadOutcome::RolledBack { error } => status_error(
            &format!("{name} reload failed, keeping v{}", handle.version()),
            &error.chain(),
        ),
    }
}
