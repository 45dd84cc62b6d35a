//! The flood controller.
//!
//! Processes mobility-marked Data and flood-triggered Interests: decodes
//! the OptoFlood fields, suppresses duplicates, installs the reverse-path
//! TFIB entry, enforces the emission rate, decrements the hop budget and
//! fans copies out to the selected egress faces. Egress copies reuse the
//! ingress metadata bytes; only the link-layer hop-limit tag is rewritten.

use crate::config::Config;
use crate::dedup::FloodIdCache;
use crate::face::{FaceId, FaceInfo, FaceTable, PacketTx};
use crate::pit::Pit;
use crate::rate::RateLimiter;
use crate::tfib::Tfib;
use log::{debug, info, warn};
use optoflood_common::metrics::FloodMetrics;
use optoflood_common::mobility::{FloodParams, MobilityMeta};
use optoflood_common::ndn::{Data, Interest};
use optoflood_common::{Error, Result};

/// Pluggable predicate for guided flooding: given a candidate face and the
/// trace hint, decide whether the face should receive a copy.
pub type HintFilter = Box<dyn Fn(&FaceInfo, &[u8]) -> bool>;

/// Outcome of processing one flood event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloodDisposition {
    /// Accepted; this many egress copies were handed to the sender.
    Flooded(usize),

    /// The flood identifier was already seen; nothing changed.
    Duplicate,

    /// Accepted and the TFIB updated, but fan-out was suppressed by the
    /// rate limiter.
    RateLimited,

    /// Accepted and the TFIB updated, but the hop budget reached zero.
    HopExhausted,
}

/// Orchestrates flood processing for one forwarder.
pub struct FloodController {
    cfg: Config,
    dedup: FloodIdCache,
    rate: RateLimiter,
    hint_filter: Option<HintFilter>,
    pub metrics: FloodMetrics,
}

impl FloodController {
    pub fn new(cfg: &Config) -> Self {
        Self {
            cfg: cfg.clone(),
            dedup: FloodIdCache::new(cfg.flood_id_ttl(), cfg.max_flood_ids),
            rate: RateLimiter::new(cfg.rate_limit, cfg.rate_window()),
            hint_filter: None,
            metrics: FloodMetrics::new(),
        }
    }

    /// Installs a guided-flooding predicate. Without one, every UP
    /// non-ingress face receives a copy.
    pub fn set_hint_filter(&mut self, filter: impl Fn(&FaceInfo, &[u8]) -> bool + 'static) {
        self.hint_filter = Some(Box::new(filter));
    }

    /// Periodic purge of the dedup cache, driven by the forwarder reactor.
    pub fn dedup_sweep(&mut self) {
        self.dedup.sweep();
    }

    /// Processes a mobility-marked Data arriving on `ingress`.
    pub fn on_mobile_data<T: PacketTx>(
        &mut self,
        data: &Data,
        ingress: FaceId,
        tfib: &mut Tfib,
        faces: &FaceTable,
        tx: &mut T,
    ) -> Result<FloodDisposition> {
        let meta = match MobilityMeta::decode(&data.app_meta) {
            Ok(meta) => meta,
            Err(e) => {
                self.metrics.malformed_drops.increment();
                warn!("undecodable mobility metadata from {}: {}", ingress, e);
                return Err(e);
            }
        };

        let flood_id = match meta.flood_id {
            Some(id) => id,
            None => {
                warn!("mobility Data {} lacks a FloodId, dropping", data.name);
                return Err(Error::MissingField("FloodId"));
            }
        };
        let new_face_seq = match meta.new_face_seq {
            Some(seq) => seq,
            None => {
                warn!("mobility Data {} lacks a NewFaceSeq, dropping", data.name);
                return Err(Error::MissingField("NewFaceSeq"));
            }
        };

        if self.dedup.seen(flood_id) {
            debug!("duplicate flood id {}, dropping", flood_id);
            self.metrics.flood_duplicates_dropped.increment();
            return Ok(FloodDisposition::Duplicate);
        }
        self.dedup.remember(flood_id);
        self.metrics.flood_data_ingested.increment();

        // Reverse-path hint: the producer's new attachment is reachable
        // through the face the Data came in on.
        let prefix = data.name.parent();
        tfib.insert(prefix.clone(), ingress, new_face_seq, flood_id);
        info!(
            "tfib updated: {} -> {} seq={} flood_id={}",
            prefix, ingress, new_face_seq, flood_id
        );

        if !self.rate.admit() {
            self.metrics.rate_limit_drops.increment();
            return Ok(FloodDisposition::RateLimited);
        }

        let hop_limit = data.hop_limit.unwrap_or(self.cfg.default_hop_limit);
        if hop_limit <= 1 {
            debug!("flood {} hop budget exhausted, not forwarding", flood_id);
            return Ok(FloodDisposition::HopExhausted);
        }
        let next_hop_limit = hop_limit - 1;

        let mut emitted = 0usize;
        for face in self.select_egress(faces, ingress, meta.trace_hint.as_deref()) {
            let mut copy = data.clone();
            copy.hop_limit = Some(next_hop_limit);
            match tx.send_data(face, &copy) {
                Ok(()) => {
                    emitted += 1;
                    self.metrics.flood_copies_emitted.increment();
                }
                Err(e) => warn!("flood copy to {} failed: {}", face, e),
            }
        }

        info!(
            "flood {} forwarded to {} faces with hop limit {}",
            flood_id, emitted, next_hop_limit
        );
        Ok(FloodDisposition::Flooded(emitted))
    }

    /// Processes a flood-triggered Interest that missed the FIB.
    ///
    /// The in-record for `ingress` is installed before any emission so
    /// returning Data can be satisfied.
    pub fn on_flood_interest<T: PacketTx>(
        &mut self,
        interest: &Interest,
        ingress: FaceId,
        pit: &mut Pit,
        faces: &FaceTable,
        tx: &mut T,
    ) -> Result<FloodDisposition> {
        let params = match &interest.app_params {
            Some(raw) => match FloodParams::decode(raw) {
                Ok(params) => params,
                Err(e) => {
                    self.metrics.malformed_drops.increment();
                    warn!("undecodable flood parameters from {}: {}", ingress, e);
                    return Err(e);
                }
            },
            None => {
                warn!("flood Interest {} without parameters", interest.name);
                return Err(Error::MissingField("FloodHopLimit"));
            }
        };

        pit.entry(interest)
            .insert_or_update_in_record(ingress, interest);

        // The link tag tracks the budget once the flood is in flight; the
        // declared parameter seeds it at the first hop.
        let hop_limit = interest.hop_limit.unwrap_or(params.hop_limit);
        if hop_limit <= 1 {
            debug!(
                "flood Interest {} hop budget exhausted, not forwarding",
                interest.name
            );
            return Ok(FloodDisposition::HopExhausted);
        }
        let next_hop_limit = hop_limit - 1;

        let mut emitted = 0usize;
        for face in self.select_egress(faces, ingress, params.trace_hint.as_deref()) {
            let mut copy = interest.clone();
            copy.hop_limit = Some(next_hop_limit);
            match tx.send_interest(face, &copy) {
                Ok(()) => {
                    emitted += 1;
                    self.metrics.flood_copies_emitted.increment();
                }
                Err(e) => warn!("flood Interest copy to {} failed: {}", face, e),
            }
        }

        info!(
            "flood Interest {} forwarded to {} faces with hop limit {}",
            interest.name, emitted, next_hop_limit
        );
        Ok(FloodDisposition::Flooded(emitted))
    }

    /// Candidate egress faces: every UP face other than ingress, narrowed
    /// by the hint filter when a hint is present. A hint may narrow the
    /// fan-out but never black-hole it: if the filter rejects every
    /// candidate the full set is used.
    fn select_egress(
        &self,
        faces: &FaceTable,
        ingress: FaceId,
        trace_hint: Option<&[u8]>,
    ) -> Vec<FaceId> {
        let candidates: Vec<&FaceInfo> = faces
            .iter()
            .filter(|face| face.id != ingress && face.is_up())
            .collect();

        if let (Some(hint), Some(filter)) = (trace_hint, self.hint_filter.as_ref()) {
            let guided: Vec<FaceId> = candidates
                .iter()
                .filter(|face| filter(face, hint))
                .map(|face| face.id)
                .collect();
            if !guided.is_empty() {
                return guided;
            }
            if !candidates.is_empty() {
                debug!("trace hint matched no faces, using full fan-out");
            }
        }

        candidates.into_iter().map(|face| face.id).collect()
    }
}
