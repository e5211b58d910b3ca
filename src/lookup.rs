//! The lookup controller: query state, request sequencing and the
//! `NoResult` / `HasResult` state machine.
//!
//! Each submitted query takes a sequence number when it is issued. When it
//! finishes, it is only applied if no newer request has already finished, so
//! an older response that arrives late never replaces a newer one. Failures
//! count as finishing; they leave the current result untouched.

use std::cell::{Cell, RefCell};

use crate::data::LookupResult;
use crate::error::LookupError;
use crate::ipify::GeoLookup;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    seq: u64,
}

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NoResult,
    HasResult,
}

/// What a completed lookup did to the state.
#[derive(Debug)]
pub enum Transition {
    /// The result was replaced; render it.
    Applied(LookupResult),
    /// The lookup failed; the previous result (if any) is still current.
    Failed(LookupError),
    /// A newer request already finished; this completion was dropped.
    Stale,
}

#[derive(Debug, Clone)]
pub struct TrackerState {
    query: String,
    result: Option<LookupResult>,
    issued: u64,
    settled: u64,
}

impl TrackerState {
    pub fn new(seed_query: &str) -> TrackerState {
        TrackerState {
            query: seed_query.to_string(),
            result: None,
            issued: 0,
            settled: 0,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, text: &str) {
        self.query.clear();
        self.query.push_str(text);
    }

    pub fn result(&self) -> Option<&LookupResult> {
        self.result.as_ref()
    }

    pub fn phase(&self) -> Phase {
        if self.result.is_some() {
            Phase::HasResult
        } else {
            Phase::NoResult
        }
    }

    pub fn begin(&mut self) -> Ticket {
        self.issued += 1;
        Ticket { seq: self.issued }
    }

    pub fn finish(&mut self, ticket: Ticket, outcome: Result<LookupResult, LookupError>) -> Transition {
        if ticket.seq <= self.settled {
            log::debug!(
                "Dropping lookup #{} (#{} already finished)",
                ticket.seq,
                self.settled
            );
            return Transition::Stale;
        }
        self.settled = ticket.seq;

        match outcome {
            Ok(result) => {
                self.result = Some(result.clone());
                Transition::Applied(result)
            }
            Err(e) => {
                log::warn!("Lookup #{} failed: {}", ticket.seq, e);
                Transition::Failed(e)
            }
        }
    }
}

pub struct LookupController<C> {
    client: C,
    seed_query: String,
    state: RefCell<TrackerState>,
    started: Cell<bool>,
}

impl<C: GeoLookup> LookupController<C> {
    pub fn new(client: C, seed_query: &str) -> LookupController<C> {
        LookupController {
            client,
            seed_query: seed_query.to_string(),
            state: RefCell::new(TrackerState::new(seed_query)),
            started: Cell::new(false),
        }
    }

    pub fn current_query(&self) -> String {
        self.state.borrow().query().to_string()
    }

    pub fn current_result(&self) -> Option<LookupResult> {
        self.state.borrow().result().cloned()
    }

    pub fn phase(&self) -> Phase {
        self.state.borrow().phase()
    }

    pub fn update_query(&self, text: &str) {
        self.state.borrow_mut().set_query(text);
    }

    /// Runs one lookup. Never fails: errors come back as `Transition::Failed`.
    pub async fn submit_query(&self, query: &str) -> Transition {
        let ticket = self.state.borrow_mut().begin();
        log::info!("Lookup #{} issued for {:?}", ticket.seq(), query);

        let outcome = self.client.lookup(query).await;

        self.state.borrow_mut().finish(ticket, outcome)
    }

    pub async fn on_submit_click(&self) -> Transition {
        let query = self.current_query();
        self.submit_query(&query).await
    }

    /// Enter in the search entry; GTK reports it as the entry's `activate`.
    pub async fn on_enter_key(&self) -> Transition {
        self.on_submit_click().await
    }

    /// The one automatic lookup of the seed query. Later calls return `None`.
    pub async fn start(&self) -> Option<Transition> {
        if self.started.replace(true) {
            return None;
        }
        let seed = self.seed_query.clone();
        Some(self.submit_query(&seed).await)
    }
}
