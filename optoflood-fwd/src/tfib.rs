//! Temporary Forwarding Information Base (TFIB).
//!
//! TFIB entries are short-lived reverse-path hints installed when a
//! mobility-marked Data arrives. They are consulted before the FIB during
//! the convergence window and expire after roughly a second; a periodic
//! sweep driven by the forwarder reactor removes the carcasses. Expired
//! entries are invisible to lookup even before the sweep runs.

use crate::face::FaceId;
use log::{debug, trace};
use optoflood_common::metrics::{Counter, Gauge};
use optoflood_common::ndn::Name;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Default lifetime of a temporary forwarding entry.
pub const DEFAULT_LIFETIME: Duration = Duration::from_millis(1000);

/// One temporary forwarding entry.
#[derive(Debug, Clone)]
pub struct TfibEntry {
    prefix: Name,
    face: FaceId,
    new_face_seq: u32,
    flood_id: u64,
    expiry: Instant,
}

impl TfibEntry {
    fn new(prefix: Name, face: FaceId, new_face_seq: u32, flood_id: u64, lifetime: Duration) -> Self {
        Self {
            prefix,
            face,
            new_face_seq,
            flood_id,
            expiry: Instant::now() + lifetime,
        }
    }

    pub fn prefix(&self) -> &Name {
        &self.prefix
    }

    pub fn face(&self) -> FaceId {
        self.face
    }

    pub fn new_face_seq(&self) -> u32 {
        self.new_face_seq
    }

    pub fn flood_id(&self) -> u64 {
        self.flood_id
    }

    pub fn expiry(&self) -> Instant {
        self.expiry
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expiry
    }

    fn refresh(&mut self, lifetime: Duration) {
        self.expiry = Instant::now() + lifetime;
    }
}

type AfterInsertFn = Box<dyn FnMut(&Name, FaceId, u32)>;
type BeforeRemoveFn = Box<dyn FnMut(&Name)>;

/// The Temporary FIB.
///
/// Listeners registered with [`Tfib::on_after_insert`] and
/// [`Tfib::on_before_remove`] are invoked synchronously, at most once per
/// mutation, in reactor context. They must not call back into the table.
pub struct Tfib {
    // Ordered map so lookup can walk prefixes from longest to shortest
    entries: BTreeMap<Name, TfibEntry>,
    lifetime: Duration,
    after_insert: Vec<AfterInsertFn>,
    before_remove: Vec<BeforeRemoveFn>,
    entries_gauge: Gauge,
    expires: Counter,
}

impl Tfib {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            entries: BTreeMap::new(),
            lifetime,
            after_insert: Vec::new(),
            before_remove: Vec::new(),
            entries_gauge: Gauge::new(),
            expires: Counter::new(),
        }
    }

    /// Registers a listener invoked after an entry is created or replaced.
    pub fn on_after_insert(&mut self, listener: impl FnMut(&Name, FaceId, u32) + 'static) {
        self.after_insert.push(Box::new(listener));
    }

    /// Registers a listener invoked just before an entry is removed.
    pub fn on_before_remove(&mut self, listener: impl FnMut(&Name) + 'static) {
        self.before_remove.push(Box::new(listener));
    }

    /// Finds the entry for the longest prefix of `name`, the name itself
    /// included. Exact matches win over proper prefixes; expired entries
    /// are never returned.
    pub fn lookup(&self, name: &Name) -> Option<&TfibEntry> {
        let now = Instant::now();
        for len in (0..=name.len()).rev() {
            let prefix = name.prefix(len);
            if let Some(entry) = self.entries.get(&prefix) {
                if !entry.is_expired_at(now) {
                    return Some(entry);
                }
            }
        }
        None
    }

    /// Finds the non-expired entry for exactly `prefix`.
    pub fn exact(&self, prefix: &Name) -> Option<&TfibEntry> {
        self.entries
            .get(prefix)
            .filter(|entry| !entry.is_expired_at(Instant::now()))
    }

    /// Inserts or updates the entry for `prefix`.
    ///
    /// An existing entry is replaced when the new sequence number is
    /// higher or the flood identifier differs: a smaller sequence within
    /// the same flood is a late straggler, while a different flood is a
    /// distinct mobility event and always wins. Anything else merely
    /// refreshes the expiry.
    pub fn insert(&mut self, prefix: Name, face: FaceId, new_face_seq: u32, flood_id: u64) {
        debug!(
            "insert {} face={} seq={} flood_id={}",
            prefix, face, new_face_seq, flood_id
        );

        let lifetime = self.lifetime;
        let replaced = match self.entries.entry(prefix.clone()) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if new_face_seq > entry.new_face_seq || flood_id != entry.flood_id {
                    *entry = TfibEntry::new(prefix.clone(), face, new_face_seq, flood_id, lifetime);
                    true
                } else {
                    entry.refresh(lifetime);
                    trace!("refreshed entry for {}", prefix);
                    false
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(TfibEntry::new(
                    prefix.clone(),
                    face,
                    new_face_seq,
                    flood_id,
                    lifetime,
                ));
                self.entries_gauge.increment();
                true
            }
        };

        if replaced {
            self.emit_after_insert(&prefix, face, new_face_seq);
        }
    }

    /// Removes the entry for `prefix`, if any.
    pub fn erase(&mut self, prefix: &Name) {
        if self.entries.contains_key(prefix) {
            debug!("erase {}", prefix);
            self.emit_before_remove(prefix);
            self.entries.remove(prefix);
            self.entries_gauge.decrement();
        }
    }

    /// Removes every expired entry.
    pub fn sweep(&mut self) {
        let now = Instant::now();
        let expired: Vec<Name> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(prefix, _)| prefix.clone())
            .collect();

        for prefix in &expired {
            self.expires.increment();
            self.erase(prefix);
        }

        if !expired.is_empty() {
            debug!("swept {} expired entries", expired.len());
        }
    }

    /// Removes every entry forwarding to `face`.
    ///
    /// The face manager must call this when a face goes down so the table
    /// never holds dangling face references.
    pub fn on_face_down(&mut self, face: FaceId) {
        let doomed: Vec<Name> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.face == face)
            .map(|(prefix, _)| prefix.clone())
            .collect();

        for prefix in &doomed {
            self.erase(prefix);
        }

        if !doomed.is_empty() {
            debug!("dropped {} entries for {}", doomed.len(), face);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry without signalling. Used at shutdown.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.entries_gauge.set(0);
    }

    /// Current number of entries as reported to metrics.
    pub fn entry_count(&self) -> u64 {
        self.entries_gauge.value()
    }

    /// Total number of entries removed by expiry sweeps.
    pub fn expired_total(&self) -> u64 {
        self.expires.value()
    }

    fn emit_after_insert(&mut self, prefix: &Name, face: FaceId, seq: u32) {
        for listener in &mut self.after_insert {
            listener(prefix, face, seq);
        }
    }

    fn emit_before_remove(&mut self, prefix: &Name) {
        for listener in &mut self.before_remove {
            listener(prefix);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::thread::sleep;

    fn tfib() -> Tfib {
        Tfib::new(DEFAULT_LIFETIME)
    }

    #[test]
    fn exact_match_wins_over_prefix() {
        let mut tfib = tfib();
        tfib.insert(Name::from_string("/a/b"), FaceId(1), 1, 10);
        tfib.insert(Name::from_string("/a/b/c"), FaceId(2), 1, 11);

        let hit = tfib.lookup(&Name::from_string("/a/b/c")).unwrap();
        assert_eq!(hit.face(), FaceId(2));

        // A longer name falls through to the longest prefix
        let hit = tfib.lookup(&Name::from_string("/a/b/c/d")).unwrap();
        assert_eq!(hit.face(), FaceId(2));

        let hit = tfib.lookup(&Name::from_string("/a/b/x")).unwrap();
        assert_eq!(hit.face(), FaceId(1));

        assert!(tfib.lookup(&Name::from_string("/z")).is_none());
    }

    #[test]
    fn stale_sequence_refreshes_without_replacing() {
        let mut tfib = tfib();
        let prefix = Name::from_string("/video");

        tfib.insert(prefix.clone(), FaceId(1), 7, 42);
        // Late straggler from the same flood: lower seq must not overwrite
        tfib.insert(prefix.clone(), FaceId(2), 5, 42);

        let entry = tfib.exact(&prefix).unwrap();
        assert_eq!(entry.face(), FaceId(1));
        assert_eq!(entry.new_face_seq(), 7);

        // Higher seq within the same flood replaces
        tfib.insert(prefix.clone(), FaceId(2), 9, 42);
        let entry = tfib.exact(&prefix).unwrap();
        assert_eq!(entry.face(), FaceId(2));
        assert_eq!(entry.new_face_seq(), 9);
    }

    #[test]
    fn different_flood_always_wins() {
        let mut tfib = tfib();
        let prefix = Name::from_string("/video");

        tfib.insert(prefix.clone(), FaceId(1), 7, 42);
        tfib.insert(prefix.clone(), FaceId(3), 1, 43);

        let entry = tfib.exact(&prefix).unwrap();
        assert_eq!(entry.face(), FaceId(3));
        assert_eq!(entry.new_face_seq(), 1);
        assert_eq!(entry.flood_id(), 43);
    }

    #[test]
    fn expired_entries_are_invisible_before_sweep() {
        let mut tfib = Tfib::new(Duration::from_millis(10));
        let prefix = Name::from_string("/a");
        tfib.insert(prefix.clone(), FaceId(1), 1, 1);

        assert!(tfib.lookup(&prefix).is_some());
        sleep(Duration::from_millis(20));

        // Not yet swept, but gone from the caller's point of view
        assert_eq!(tfib.len(), 1);
        assert!(tfib.lookup(&prefix).is_none());
        assert!(tfib.exact(&prefix).is_none());

        tfib.sweep();
        assert_eq!(tfib.len(), 0);
        assert_eq!(tfib.expired_total(), 1);
    }

    #[test]
    fn refresh_extends_expiry() {
        let mut tfib = Tfib::new(Duration::from_millis(100));
        let prefix = Name::from_string("/a");
        tfib.insert(prefix.clone(), FaceId(1), 1, 1);

        sleep(Duration::from_millis(60));
        // Same seq, same flood: refresh only
        tfib.insert(prefix.clone(), FaceId(1), 1, 1);

        sleep(Duration::from_millis(60));
        // 120 ms after creation the entry would have expired without the refresh
        assert!(tfib.lookup(&prefix).is_some());
    }

    #[test]
    fn face_down_purges_matching_entries() {
        let mut tfib = tfib();
        tfib.insert(Name::from_string("/a"), FaceId(1), 1, 1);
        tfib.insert(Name::from_string("/b"), FaceId(2), 1, 2);
        tfib.insert(Name::from_string("/c"), FaceId(1), 1, 3);

        tfib.on_face_down(FaceId(1));

        assert!(tfib.lookup(&Name::from_string("/a")).is_none());
        assert!(tfib.lookup(&Name::from_string("/c")).is_none());
        assert_eq!(tfib.lookup(&Name::from_string("/b")).unwrap().face(), FaceId(2));
        assert_eq!(tfib.len(), 1);
    }

    #[test]
    fn signals_fire_on_mutation_only() {
        let mut tfib = tfib();
        let inserts = Rc::new(RefCell::new(Vec::new()));
        let removes = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&inserts);
        tfib.on_after_insert(move |prefix, face, seq| {
            sink.borrow_mut().push((prefix.clone(), face, seq));
        });
        let sink = Rc::clone(&removes);
        tfib.on_before_remove(move |prefix| {
            sink.borrow_mut().push(prefix.clone());
        });

        let prefix = Name::from_string("/p");
        tfib.insert(prefix.clone(), FaceId(1), 1, 1); // create
        tfib.insert(prefix.clone(), FaceId(1), 1, 1); // refresh, no signal
        tfib.insert(prefix.clone(), FaceId(2), 2, 1); // replace

        assert_eq!(
            *inserts.borrow(),
            vec![
                (prefix.clone(), FaceId(1), 1),
                (prefix.clone(), FaceId(2), 2)
            ]
        );

        tfib.erase(&prefix);
        tfib.erase(&prefix); // idempotent, no second signal
        assert_eq!(*removes.borrow(), vec![prefix]);
    }

    #[test]
    fn entry_gauge_tracks_size() {
        let mut tfib = tfib();
        tfib.insert(Name::from_string("/a"), FaceId(1), 1, 1);
        tfib.insert(Name::from_string("/b"), FaceId(1), 1, 2);
        assert_eq!(tfib.entry_count(), 2);

        tfib.erase(&Name::from_string("/a"));
        assert_eq!(tfib.entry_count(), 1);

        tfib.clear();
        assert_eq!(tfib.entry_count(), 0);
        assert!(tfib.is_empty());
    }
}
