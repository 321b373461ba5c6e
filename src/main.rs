use dawg_history::messaging::notification::{Notification, NotificationCategory};
use dawg_history::naming::unique_name;
use dawg_history::{
    AtomicF32, History, HistoryConfig, ParameterSender, bind, create_command_channel,
    create_notification_channel,
};
use ringbuf::traits::{Consumer, Producer};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

// Kept small on purpose so the demo can show a full ringbuffer being reported
const UI_RINGBUFFER_CAPACITY: usize = 4;
const NOTIFICATION_RINGBUFFER_CAPACITY: usize = 16;

const MASTER_VOLUME_PARAM: u32 = 0;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== DAWG history demo ===\n");

    let config = match std::env::args().nth(1) {
        Some(path) => match HistoryConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("ERROR: failed to load {}: {}", path, e);
                return;
            }
        },
        None => HistoryConfig::default(),
    };

    let (command_tx, mut command_rx) = create_command_channel(UI_RINGBUFFER_CAPACITY);
    let (mut notification_tx, mut notification_rx) =
        create_notification_channel(NOTIFICATION_RINGBUFFER_CAPACITY);

    let history = History::with_config(config);
    let _status = history.subscribe_status(|status| {
        println!(
            "  [menu] Undo: {:<24} Redo: {}",
            status.undo_label.as_deref().unwrap_or("-"),
            status.redo_label.as_deref().unwrap_or("-"),
        );
    });

    let tracks = history.create_ref("tracks", vec!["Track 1".to_string()]);
    let volume = history.create_ref("master volume", 0.5_f32);

    // The audio callback would read this atomic; the ringbuffer carries the
    // same change for consumers that need discrete events.
    let volume_param = AtomicF32::new(0.5);
    let _atomic = bind(&volume, volume_param.clone());
    let _sender = bind(
        &volume,
        ParameterSender::new(MASTER_VOLUME_PARAM, Arc::new(Mutex::new(command_tx)), 0.5),
    );
    let _meter = volume.subscribe(|event| {
        if event.is_replay() {
            println!("  [meter] master volume restored to {}", event.new_value);
        }
        Ok(())
    });

    println!("Add Track (one gesture, two refs):");
    let added = history.transact("Add Track", |_| {
        let name = tracks.with(|list| {
            unique_name("Track", |candidate| list.iter().any(|t| t == candidate))
        });
        tracks.update(|list| list.push(name))?;
        volume.set(0.8)
    });
    if let Err(e) = added {
        let _ = notification_tx.try_push(Notification::from_error(&e));
    }
    println!("  tracks = {:?}, volume = {}", tracks.get(), volume_param.get());

    println!("Undo:");
    history.undo();
    println!("  tracks = {:?}, volume = {}", tracks.get(), volume_param.get());

    println!("Redo:");
    if let Err(e) = history.redo() {
        let _ = notification_tx.try_push(Notification::from_error(&e));
    }
    println!("  tracks = {:?}, volume = {}", tracks.get(), volume_param.get());

    println!("Redo again:");
    match history.redo() {
        Ok(true) => {}
        Ok(false) => {
            let _ = notification_tx.try_push(Notification::warning(
                NotificationCategory::History,
                "Nothing to redo".to_string(),
            ));
        }
        Err(e) => {
            let _ = notification_tx.try_push(Notification::from_error(&e));
        }
    }

    println!("Audio thread received:");
    while let Some(command) = command_rx.try_pop() {
        println!("  {:?}", command);
    }

    // Nobody drains the ringbuffer from here on, so writes start failing
    println!("Volume automation without an audio consumer:");
    for step in 1..=6 {
        let value = step as f32 / 10.0;
        match volume.set(value) {
            Ok(()) => println!("  volume -> {}", value),
            Err(e) => {
                let _ = notification_tx.try_push(Notification::from_error(&e));
                println!("  volume stays at {}", volume.get());
            }
        }
    }

    println!("\nNotifications:");
    while let Some(notification) = notification_rx.try_pop() {
        println!(
            "  [{:?}/{:?}] {}",
            notification.level, notification.category, notification.message
        );
    }

    println!("\nUndo stack depth: {}", history.undo_count());
}
