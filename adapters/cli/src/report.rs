//! Running tallies of a headless run.

use std::fmt;

use barrage_core::Event;

/// Event counts accumulated over a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct RunReport {
    pub(crate) queued: u64,
    pub(crate) rejected: u64,
    pub(crate) spawned: u64,
    pub(crate) launched: u64,
    pub(crate) impacts: u64,
    pub(crate) discarded: u64,
    pub(crate) expired: u64,
}

impl RunReport {
    /// Folds a batch of events into the tallies.
    pub(crate) fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::ProjectileQueued { amount, .. } => self.queued += u64::from(*amount),
                Event::EnqueueRejected { .. } => self.rejected += 1,
                Event::ProjectileSpawned { .. } => self.spawned += 1,
                Event::BatchLaunched { count } => {
                    self.launched += u64::try_from(*count).unwrap_or(u64::MAX);
                }
                Event::ImpactDelivered { .. } => self.impacts += 1,
                Event::ProjectileDiscarded { .. } => self.discarded += 1,
                Event::ProjectileExpired { .. } => self.expired += 1,
                Event::TimeAdvanced { .. }
                | Event::CooldownElapsed
                | Event::ProjectileFaded { .. }
                | Event::TargetAssigned { .. }
                | Event::TargetCleared => {}
            }
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "queued {} (rejected {}), spawned {}, launched {}, impacts {}, discarded {}, expired {}",
            self.queued,
            self.rejected,
            self.spawned,
            self.launched,
            self.impacts,
            self.discarded,
            self.expired
        )
    }
}
