//! Integration tests for debounced persistence.
//!
//! # Purpose
//!
//! These tests drive the cache through its public API with a store that
//! records the instant of every save.  They verify:
//!
//! - Coalescing: a burst of writes closer together than the settle delay
//!   produces exactly one save, and that save happens no sooner than the
//!   settle delay after the *last* write.
//! - `flush_now` saves exactly once and cancels the pending flush.
//! - A flush that fires on the alarm thread never interleaves with writers.
//!
//! Timing margins are generous so a loaded CI machine does not flake.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use btconf::{CacheSettings, ConfigCache, ConfigFile, ConfigStore, DebounceState, StoreError};

const SCOPE: &str = "Remote";
const DEV: &str = "aa:bb:cc:dd:ee:ff";

/// Store that records when each save happened and a copy of what was saved.
struct RecordingStore {
    file: ConfigFile,
    saves: Arc<Mutex<Vec<(Instant, ConfigFile)>>>,
}

impl ConfigStore for RecordingStore {
    fn has_section(&self, section: &str) -> bool {
        self.file.has_section(section)
    }
    fn has_key(&self, section: &str, key: &str) -> bool {
        self.file.has_key(section, key)
    }
    fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.file.get(section, key)
    }
    fn set(&mut self, section: &str, key: &str, value: &str) {
        self.file.set(section, key, value);
    }
    fn remove_key(&mut self, section: &str, key: &str) -> bool {
        self.file.remove_key(section, key)
    }
    fn remove_section(&mut self, section: &str) -> bool {
        self.file.remove_section(section)
    }
    fn sections(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        self.file.sections()
    }
    fn save(&self, _path: &Path) -> Result<(), StoreError> {
        self.saves
            .lock()
            .unwrap()
            .push((Instant::now(), self.file.clone()));
        Ok(())
    }
}

type Saves = Arc<Mutex<Vec<(Instant, ConfigFile)>>>;

fn make_cache(delay: Duration) -> (ConfigCache, Saves) {
    let saves: Saves = Arc::new(Mutex::new(Vec::new()));
    let store = RecordingStore {
        file: ConfigFile::new(),
        saves: Arc::clone(&saves),
    };
    let settings = CacheSettings::in_dir(Path::new("/unused")).with_settle_delay(delay);
    let cache = ConfigCache::with_store(Box::new(store), &settings).expect("alarm");
    (cache, saves)
}

#[test]
fn test_burst_of_writes_produces_one_flush_after_last_write() {
    // Arrange
    let delay = Duration::from_millis(150);
    let (cache, saves) = make_cache(delay);

    // Act – 6 writes, 30 ms apart: each well inside the settle delay.
    let mut last_write = Instant::now();
    for i in 0..6 {
        last_write = Instant::now();
        cache.set_int(SCOPE, DEV, "Counter", i);
        thread::sleep(Duration::from_millis(30));
    }
    thread::sleep(Duration::from_millis(600));

    // Assert
    let saves = saves.lock().unwrap();
    assert_eq!(saves.len(), 1, "burst must coalesce into a single flush");
    let (at, snapshot) = &saves[0];
    assert!(
        at.duration_since(last_write) >= delay,
        "flush must wait a full settle delay after the last write"
    );
    assert_eq!(snapshot.get(DEV, "Counter"), Some("5"));
}

#[test]
fn test_writes_separated_by_more_than_delay_flush_separately() {
    let (cache, saves) = make_cache(Duration::from_millis(40));

    cache.set_int(SCOPE, DEV, "A", 1);
    thread::sleep(Duration::from_millis(300));
    cache.set_int(SCOPE, DEV, "B", 2);
    thread::sleep(Duration::from_millis(300));

    assert_eq!(saves.lock().unwrap().len(), 2);
}

#[test]
fn test_flush_now_saves_once_and_suppresses_pending_flush() {
    // Arrange
    let (cache, saves) = make_cache(Duration::from_millis(80));
    cache.set_string(SCOPE, DEV, "Name", "speaker");
    assert_eq!(cache.debounce_state(), DebounceState::Pending);

    // Act
    cache.flush_now().expect("flush");
    thread::sleep(Duration::from_millis(400));

    // Assert
    let saves = saves.lock().unwrap();
    assert_eq!(saves.len(), 1, "no double flush shortly after flush_now");
    assert_eq!(saves[0].1.get(DEV, "Name"), Some("speaker"));
    assert_eq!(cache.debounce_state(), DebounceState::Idle);
}

#[test]
fn test_cleanup_flushes_even_when_alarm_has_not_fired() {
    let (cache, saves) = make_cache(Duration::from_secs(60));
    cache.set_binary(SCOPE, DEV, "LinkKey", &[0xde, 0xad, 0xbe, 0xef]);

    cache.cleanup().expect("cleanup");

    let saves = saves.lock().unwrap();
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0].1.get(DEV, "LinkKey"), Some("deadbeef"));
}

#[test]
fn test_alarm_flush_does_not_interleave_with_writers() {
    // Arrange – short delay so the alarm fires repeatedly while threads write.
    let (cache, saves) = make_cache(Duration::from_millis(5));

    // Act
    thread::scope(|s| {
        for t in 0..4 {
            let cache = &cache;
            s.spawn(move || {
                for i in 0..200 {
                    let section = format!("pair-{t}");
                    cache.set_int(SCOPE, &section, "value", i);
                    cache.set_string(SCOPE, &section, "text", &i.to_string());
                }
            });
        }
    });
    cache.flush_now().expect("final flush");

    // Assert – every snapshot holds only well-formed values, and the final
    // one reflects the last write of every thread.
    let saves = saves.lock().unwrap();
    assert!(!saves.is_empty());
    for (_, snapshot) in saves.iter() {
        for t in 0..4 {
            let section = format!("pair-{t}");
            if let Some(v) = snapshot.get(&section, "value") {
                assert!(v.parse::<i32>().is_ok(), "torn value {v:?}");
            }
        }
    }
    let last = &saves.last().unwrap().1;
    for t in 0..4 {
        assert_eq!(last.get(&format!("pair-{t}"), "text"), Some("199"));
    }
}
