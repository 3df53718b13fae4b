use color_eyre::{eyre::eyre, Result};
use padnav::controller::ConnectionEvent;
use padnav::navigation::{
    ConfirmResponse, Coord, Direction, GridShape, NavOutcome, Overlay, RegionId, RegionSpec,
};
use padnav::persistence::{ConfigStore, MemoryStore, TomlFileStore};
use padnav::shortcuts::ShortcutChannel;
use padnav::ControllerHandle;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let store = open_store();

    let mut shortcuts = ShortcutChannel::load_or_default(store.as_ref());
    if shortcuts.is_empty() {
        shortcuts.register("search", "ctrl+f")?;
        shortcuts.register("close", "esc")?;
        if let Err(e) = shortcuts.save(store.as_ref()) {
            warn!("Could not save default shortcuts: {}", e);
        }
    }
    info!("Keyboard shortcuts ready ({} bound)", shortcuts.len());

    info!("Initializing controller subsystem");
    let handle = ControllerHandle::init_with_gilrs(store.clone())
        .map_err(|e| eyre!("Failed to start controller: {}", e))?;

    register_demo_regions(&handle)?;

    let _connections = handle.subscribe_connections(|event| match event {
        ConnectionEvent::Connected { index, id, family } => {
            info!("[{}] {} ready as {}", index, id, family)
        }
        ConnectionEvent::Disconnected { index, id } => info!("[{}] {} gone", index, id),
    });
    let _outcomes = handle.subscribe_outcomes(|outcome| match outcome {
        NavOutcome::Dropped(_) | NavOutcome::Ignored => {}
        other => info!("{:?}", other),
    });

    info!("Running, press Ctrl+C to quit");
    tokio::signal::ctrl_c().await?;

    handle.shutdown().await;
    Ok(())
}

fn open_store() -> Arc<dyn ConfigStore> {
    match TomlFileStore::open_default() {
        Ok(store) => {
            info!("Using config file {}", store.path().display());
            Arc::new(store)
        }
        Err(e) => {
            warn!("Config file unavailable, settings will not persist: {}", e);
            Arc::new(MemoryStore::new())
        }
    }
}

// Section tabs on top, a scrollable content grid below, and a yes/no dialog
// opened from the grid
fn register_demo_regions(handle: &ControllerHandle) -> Result<()> {
    let mut driver = handle.navigation();
    let nav = driver.controller_mut();

    nav.register_region(
        RegionSpec::new("sections", GridShape::row(4)),
        |at: Coord| {
            info!("Section {} selected", at.col);
            ConfirmResponse::Handled
        },
    )?;

    nav.register_region(
        RegionSpec::new("content", GridShape::uniform(6, 5))
            .with_parent("sections", Some(Direction::Up))
            .scrollable(),
        |at: Coord| {
            let id = format!("dialog-{}-{}", at.row, at.col);
            let dialog = RegionSpec::new(id, GridShape::row(2));
            ConfirmResponse::PushOverlay(Overlay::new(dialog, move |choice: Coord| {
                info!("Item {} answered {}", at, if choice.col == 0 { "yes" } else { "no" });
                ConfirmResponse::CloseOverlay
            }))
        },
    )?;

    nav.focus(&RegionId::new("content"), Instant::now())?;
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    // Plain level names only ("debug", "warn", ...)
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|value| value.parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
