//! The forwarder hook and reactor.
//!
//! Splices OptoFlood into the host forwarder's two native paths: Data
//! ingress (mobility-marked packets feed the flood controller, then the
//! normal PIT-satisfaction path runs) and Interest ingress on ContentStore
//! miss (the TFIB is consulted before the FIB; a FIB miss with flood
//! parameters triggers Interest flooding).
//!
//! Everything runs on one cooperative reactor: ingress events, the TFIB
//! expiry sweep and the dedup cache sweep are multiplexed in [`Forwarder::run`].
//! Both sweep intervals are locals of the loop, so every exit path drops
//! and thereby cancels them.

use crate::config::Config;
use crate::face::{FaceId, FaceInfo, FaceState, FaceTable, PacketTx};
use crate::fib::Fib;
use crate::flood::FloodController;
use crate::pit::Pit;
use crate::tfib::Tfib;
use log::{debug, info, trace, warn};
use optoflood_common::mobility;
use optoflood_common::ndn::{Data, Interest};
use tokio::sync::{mpsc, watch};
use tokio::time;

/// Events delivered to the forwarder by the face layer.
#[derive(Debug)]
pub enum FwdEvent {
    /// An Interest arrived (after the external ContentStore missed).
    Interest { interest: Interest, ingress: FaceId },

    /// A Data packet arrived.
    Data { data: Data, ingress: FaceId },

    /// A face was registered or came back up.
    FaceUp(FaceId),

    /// A face went down.
    FaceDown(FaceId),
}

/// The OptoFlood-enabled forwarder core.
///
/// Owns every table; all processing happens in reactor context with no
/// internal locking. Egress goes through the [`PacketTx`] seam.
pub struct Forwarder<T: PacketTx> {
    cfg: Config,
    faces: FaceTable,
    fib: Fib,
    pit: Pit,
    tfib: Tfib,
    flood: FloodController,
    tx: T,
}

impl<T: PacketTx> Forwarder<T> {
    pub fn new(cfg: Config, tx: T) -> Self {
        let tfib = Tfib::new(cfg.tfib_lifetime());
        let flood = FloodController::new(&cfg);
        Self {
            cfg,
            faces: FaceTable::new(),
            fib: Fib::new(),
            pit: Pit::new(),
            tfib,
            flood,
            tx,
        }
    }

    pub fn faces(&self) -> &FaceTable {
        &self.faces
    }

    pub fn faces_mut(&mut self) -> &mut FaceTable {
        &mut self.faces
    }

    pub fn fib_mut(&mut self) -> &mut Fib {
        &mut self.fib
    }

    pub fn pit(&self) -> &Pit {
        &self.pit
    }

    pub fn tfib(&self) -> &Tfib {
        &self.tfib
    }

    pub fn tfib_mut(&mut self) -> &mut Tfib {
        &mut self.tfib
    }

    pub fn flood(&self) -> &FloodController {
        &self.flood
    }

    pub fn flood_mut(&mut self) -> &mut FloodController {
        &mut self.flood
    }

    /// Data ingress hook.
    pub fn on_data(&mut self, data: Data, ingress: FaceId) {
        trace!("data {} in={}", data.name, ingress);

        if mobility::has_mobility_flag(&data.app_meta) {
            match self.flood.on_mobile_data(
                &data,
                ingress,
                &mut self.tfib,
                &self.faces,
                &mut self.tx,
            ) {
                Ok(disposition) => debug!("mobility data {}: {:?}", data.name, disposition),
                Err(e) => debug!("mobility data {} dropped: {}", data.name, e),
            }
        }

        // Normal path: deliver to waiting downstream consumers
        if let Some(entry) = self.pit.take(&data.name) {
            for record in entry.in_records() {
                if record.face == ingress {
                    continue;
                }
                if !self.faces.is_up(record.face) {
                    debug!("skipping down face {} for {}", record.face, data.name);
                    continue;
                }
                if let Err(e) = self.tx.send_data(record.face, &data) {
                    warn!("data delivery to {} failed: {}", record.face, e);
                }
            }
        }
    }

    /// Interest ingress hook, invoked after the external ContentStore
    /// missed.
    pub fn on_interest(&mut self, interest: Interest, ingress: FaceId) {
        trace!("interest {} in={}", interest.name, ingress);

        // Temporary forwarding entries take precedence over the stale FIB
        let tfib_hit = self
            .tfib
            .lookup(&interest.name)
            .map(|entry| (entry.prefix().clone(), entry.face()));
        if let Some((prefix, face)) = tfib_hit {
            if self.faces.is_up(face) {
                info!("temporary route {} -> {} for {}", prefix, face, interest.name);
                self.pit
                    .entry(&interest)
                    .insert_or_update_in_record(ingress, &interest);
                if let Err(e) = self.tx.send_interest(face, &interest) {
                    warn!("interest to {} failed: {}", face, e);
                }
                return;
            }
            debug!(
                "temporary route {} references unusable face {}, erasing",
                prefix, face
            );
            self.tfib.erase(&prefix);
        }

        // Regular FIB lookup
        let next_hop = self.fib.longest_prefix_match(&interest.name).and_then(|entry| {
            entry
                .next_hops()
                .iter()
                .find(|hop| hop.face != ingress && self.faces.is_up(hop.face))
                .map(|hop| hop.face)
        });

        if let Some(face) = next_hop {
            if interest.hop_limit == Some(0) {
                debug!("interest {} arrived with exhausted hop limit", interest.name);
                return;
            }
            let mut out = interest.clone();
            out.hop_limit = Some(match interest.hop_limit {
                Some(hop) => hop - 1,
                None => self.cfg.default_hop_limit,
            });

            self.pit
                .entry(&interest)
                .insert_or_update_in_record(ingress, &interest);
            if let Err(e) = self.tx.send_interest(face, &out) {
                warn!("interest to {} failed: {}", face, e);
            }
            return;
        }

        // FIB miss: flood parameters trigger opportunistic recovery
        if interest.app_params.is_some() {
            match self.flood.on_flood_interest(
                &interest,
                ingress,
                &mut self.pit,
                &self.faces,
                &mut self.tx,
            ) {
                Ok(disposition) => debug!("flood interest {}: {:?}", interest.name, disposition),
                Err(e) => debug!("flood interest {} dropped: {}", interest.name, e),
            }
        } else {
            debug!("no route for {}, dropping", interest.name);
        }
    }

    /// Registers a face or marks it back up.
    pub fn on_face_up(&mut self, face: FaceId) {
        if !self.faces.set_state(face, FaceState::Up) {
            self.faces.insert(FaceInfo::new(face, FaceState::Up));
        }
        debug!("{} up", face);
    }

    /// Marks a face down and drops every temporary route through it.
    pub fn on_face_down(&mut self, face: FaceId) {
        self.faces.set_state(face, FaceState::Down);
        self.tfib.on_face_down(face);
        debug!("{} down", face);
    }

    fn dispatch(&mut self, event: FwdEvent) {
        match event {
            FwdEvent::Interest { interest, ingress } => self.on_interest(interest, ingress),
            FwdEvent::Data { data, ingress } => self.on_data(data, ingress),
            FwdEvent::FaceUp(face) => self.on_face_up(face),
            FwdEvent::FaceDown(face) => self.on_face_down(face),
        }
    }

    /// Runs the forwarder reactor until shutdown is signalled or the
    /// event channel closes.
    ///
    /// Shutdown drops in-flight work and empties the TFIB. The sweep
    /// timers live and die with this call.
    pub async fn run(
        &mut self,
        mut events: mpsc::Receiver<FwdEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut tfib_sweep = time::interval(self.cfg.cleanup_interval());
        let mut dedup_sweep = time::interval(self.cfg.dedup_sweep_interval());

        info!("forwarder running");
        loop {
            tokio::select! {
                maybe_event = events.recv() => match maybe_event {
                    Some(event) => self.dispatch(event),
                    None => {
                        debug!("event channel closed");
                        break;
                    }
                },
                _ = tfib_sweep.tick() => self.tfib.sweep(),
                _ = dedup_sweep.tick() => self.flood.dedup_sweep(),
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("shutdown signalled");
                        break;
                    }
                }
            }
        }

        self.tfib.clear();
        info!("forwarder stopped");
    }
}
