//! Payment gateway strategies.
//!
//! The payment actor never talks to a gateway directly; it asks a [`PaymentProcessor`] for
//! the outcome of one attempt. A transient failure makes the durable step retry, which
//! rolls the outcome again from scratch.

use crate::model::PaymentId;
use parking_lot::Mutex;
use rand::Rng;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    TransientFailure(String),
}

pub trait PaymentProcessor: Send + Sync {
    fn attempt(&self, payment_id: &PaymentId, amount: f64) -> AttemptOutcome;
}

/// Fails each attempt with probability `failure_rate`.
#[derive(Debug, Clone)]
pub struct SimulatedProcessor {
    failure_rate: f64,
}

impl SimulatedProcessor {
    pub fn new(failure_rate: f64) -> Self {
        Self {
            failure_rate: failure_rate.clamp(0.0, 1.0),
        }
    }
}

impl PaymentProcessor for SimulatedProcessor {
    fn attempt(&self, payment_id: &PaymentId, amount: f64) -> AttemptOutcome {
        if rand::rng().random::<f64>() < self.failure_rate {
            AttemptOutcome::TransientFailure(format!("simulated gateway failure for {payment_id} ({amount:.2})"))
        } else {
            AttemptOutcome::Success
        }
    }
}

/// Plays back a fixed sequence of outcomes, then succeeds. Counts every attempt.
#[derive(Debug, Default)]
pub struct ScriptedProcessor {
    script: Mutex<VecDeque<AttemptOutcome>>,
    fallback: Option<AttemptOutcome>,
    attempts: AtomicU32,
}

impl ScriptedProcessor {
    pub fn new(outcomes: impl IntoIterator<Item = AttemptOutcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into_iter().collect()),
            fallback: None,
            attempts: AtomicU32::new(0),
        }
    }

    pub fn always_succeed() -> Self {
        Self::new([])
    }

    /// `failures` transient failures, then success.
    pub fn failing_first(failures: usize) -> Self {
        Self::new((0..failures).map(|i| AttemptOutcome::TransientFailure(format!("scripted failure {}", i + 1))))
    }

    /// Every attempt fails transiently.
    pub fn always_fail() -> Self {
        Self {
            fallback: Some(AttemptOutcome::TransientFailure("gateway down".into())),
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl PaymentProcessor for ScriptedProcessor {
    fn attempt(&self, _payment_id: &PaymentId, _amount: f64) -> AttemptOutcome {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .pop_front()
            .or_else(|| self.fallback.clone())
            .unwrap_or(AttemptOutcome::Success)
    }
}
