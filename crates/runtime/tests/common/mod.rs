#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use save_runtime::{
    Event, FragmentError, FragmentPayload, LoadReport, SaveReport, SaveStorage, SaveSystem,
    SaveableSystem,
};
use tokio::sync::broadcast;

/// Test system whose state is a list of strings stored as bincode.
pub struct Tracked {
    name: &'static str,
    pub items: Mutex<Vec<String>>,
    restores: AtomicUsize,
    clears: AtomicUsize,
}

impl Tracked {
    pub fn new(name: &'static str, items: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            name,
            items: Mutex::new(items.iter().map(|s| s.to_string()).collect()),
            restores: AtomicUsize::new(0),
            clears: AtomicUsize::new(0),
        })
    }

    pub fn items(&self) -> Vec<String> {
        self.items.lock().unwrap().clone()
    }

    pub fn set_items(&self, items: &[&str]) {
        *self.items.lock().unwrap() = items.iter().map(|s| s.to_string()).collect();
    }

    pub fn restores(&self) -> usize {
        self.restores.load(Ordering::SeqCst)
    }

    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    pub fn payload(&self) -> FragmentPayload {
        FragmentPayload::encode(&self.items()).unwrap()
    }
}

impl SaveableSystem for Tracked {
    fn fragment_name(&self) -> String {
        self.name.to_string()
    }

    fn gather_save_data(&self) -> Result<Option<FragmentPayload>, FragmentError> {
        FragmentPayload::encode(&*self.items.lock().unwrap()).map(Some)
    }

    fn restore_from_save_data(&self, fragment: &FragmentPayload) -> Result<(), FragmentError> {
        *self.items.lock().unwrap() = fragment.decode()?;
        self.restores.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn clear_save_data(&self) {
        self.items.lock().unwrap().clear();
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}

/// Build a save system over `storage` with auto-load disabled.
pub async fn start(storage: Arc<dyn SaveStorage>) -> SaveSystem {
    SaveSystem::builder()
        .storage(storage)
        .max_slots(5)
        .auto_load_on_start(false)
        .build()
        .await
        .expect("save system should start")
}

pub async fn next_save(rx: &mut broadcast::Receiver<Event>) -> SaveReport {
    loop {
        match rx.recv().await.expect("save topic should stay open") {
            Event::SaveComplete(report) => return report,
            _ => continue,
        }
    }
}

pub async fn next_load(rx: &mut broadcast::Receiver<Event>) -> LoadReport {
    loop {
        match rx.recv().await.expect("load topic should stay open") {
            Event::LoadComplete(report) => return report,
            _ => continue,
        }
    }
}
