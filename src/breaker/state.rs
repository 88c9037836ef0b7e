//! Breaker state machine.
//!
//! # States
//! - Closed: operation runs on the caller's task
//! - HalfOpen: callers are rejected while the recovery probe retries
//! - Open: callers are rejected and an alert is raised on every call
//!
//! # State Transitions
//! ```text
//! Closed → HalfOpen: consecutive failures > threshold (probe spawned)
//! HalfOpen → Closed: a probe attempt succeeds
//! HalfOpen → Open: probe attempts > retry_max
//! any → Closed: reset()
//! ```
//!
//! # Design Decisions
//! - State and a generation counter share one atomic word
//! - Tripping and resetting start a new generation; a probe may only move the
//!   breaker within the generation it was spawned for

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// State of a breaker.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum State {
    Closed = 0,
    HalfOpen = 1,
    Open = 2,
}

impl From<u8> for State {
    fn from(val: u8) -> Self {
        match val {
            1 => State::HalfOpen,
            2 => State::Open,
            _ => State::Closed,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Closed => write!(f, "closed"),
            State::HalfOpen => write!(f, "half-open"),
            State::Open => write!(f, "open"),
        }
    }
}

/// Generation of a breaker's state. Bumped on every trip and reset.
pub(crate) type Generation = u64;

const STATE_BITS: u32 = 8;
const STATE_MASK: u64 = (1 << STATE_BITS) - 1;

fn pack(generation: Generation, state: State) -> u64 {
    (generation << STATE_BITS) | state as u64
}

fn unpack(word: u64) -> (Generation, State) {
    (word >> STATE_BITS, State::from((word & STATE_MASK) as u8))
}

/// Lock-free holder for the current [`State`] and its generation.
#[derive(Debug)]
pub(crate) struct AtomicState(AtomicU64);

impl AtomicState {
    pub(crate) fn new() -> Self {
        Self(AtomicU64::new(pack(0, State::Closed)))
    }

    pub(crate) fn load(&self) -> State {
        unpack(self.0.load(Ordering::Acquire)).1
    }

    /// True while the breaker is in `state` within `generation`.
    pub(crate) fn is(&self, generation: Generation, state: State) -> bool {
        self.0.load(Ordering::Acquire) == pack(generation, state)
    }

    /// Closed → HalfOpen. Only one caller wins; the winner gets the new generation.
    pub(crate) fn trip(&self) -> Option<Generation> {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                match unpack(word) {
                    (generation, State::Closed) => {
                        Some(pack(generation.wrapping_add(1), State::HalfOpen))
                    }
                    _ => None,
                }
            })
            .ok()
            .map(|prev| unpack(prev).0.wrapping_add(1) & (u64::MAX >> STATE_BITS))
    }

    /// `from` → `to` within `generation`. Returns false if the state moved on.
    pub(crate) fn transition(&self, generation: Generation, from: State, to: State) -> bool {
        self.0
            .compare_exchange(
                pack(generation, from),
                pack(generation, to),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Unconditionally return to Closed in a fresh generation. Returns the old state.
    pub(crate) fn reset(&self) -> State {
        let prev = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                let (generation, _) = unpack(word);
                Some(pack(generation.wrapping_add(1), State::Closed))
            })
            .unwrap_or_else(|word| word);
        unpack(prev).1
    }
}
