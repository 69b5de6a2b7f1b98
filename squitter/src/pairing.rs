//! Per-aircraft buffer of the latest even and odd position messages.
//!
//! Each airborne position message replaces the stored frame of the same
//! parity; once both parities are present the pair is handed to the global
//! CPR decoder.

use std::collections::HashMap;
use std::time::Instant;

use log::debug;
use squitter_core::cpr::MAX_PAIR_AGE;
use squitter_core::{try_resolve, AirbornePosition, Icao, Position};

#[derive(Debug, Default)]
struct Slots {
    even: Option<AirbornePosition>,
    odd: Option<AirbornePosition>,
}

impl Slots {
    fn newest(&self) -> Option<Instant> {
        let even = self.even.as_ref().map(|m| m.header.timestamp());
        let odd = self.odd.as_ref().map(|m| m.header.timestamp());
        even.max(odd)
    }
}

pub struct PairBuffer {
    reference: Position,
    aircraft: HashMap<Icao, Slots>,
    resolved: u64,
    rejected: u64,
}

impl PairBuffer {
    pub fn new(reference: Position) -> Self {
        PairBuffer {
            reference,
            aircraft: HashMap::new(),
            resolved: 0,
            rejected: 0,
        }
    }

    /// Store `msg` and try to resolve a position from the aircraft's pair.
    pub fn push(&mut self, msg: &AirbornePosition) -> Option<Position> {
        let slots = self.aircraft.entry(*msg.header.icao()).or_default();
        if msg.cpr_odd {
            slots.odd = Some(msg.clone());
        } else {
            slots.even = Some(msg.clone());
        }

        let (Some(even), Some(odd)) = (&slots.even, &slots.odd) else {
            return None;
        };

        match try_resolve(even, odd, self.reference) {
            Ok(pos) => {
                self.resolved += 1;
                Some(pos)
            }
            Err(e) => {
                self.rejected += 1;
                debug!("{}: pair not resolved: {e}", msg.header.icao_hex());
                None
            }
        }
    }

    /// Drop aircraft whose newest frame is older than the pairing window.
    /// Returns count removed.
    pub fn prune(&mut self, now: Instant) -> usize {
        let before = self.aircraft.len();
        self.aircraft.retain(|_, slots| match slots.newest() {
            Some(t) => now.saturating_duration_since(t) <= MAX_PAIR_AGE,
            None => false,
        });
        before - self.aircraft.len()
    }

    /// Number of aircraft with at least one buffered frame.
    pub fn len(&self) -> usize {
        self.aircraft.len()
    }

    pub fn resolved(&self) -> u64 {
        self.resolved
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
