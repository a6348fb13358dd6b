//! Process-wide session state store.
//!
//! The store owns the only committed [`AuthState`]. Every change goes
//! through a single commit point that stamps it with a delivery sequence
//! number. Listeners are notified in sequence order, always with no store
//! lock held. A commit made from inside a listener is queued behind the
//! delivery in progress; a commit from any other thread returns only once
//! its state has reached every listener.
//!
//! Resolutions are coalesced: concurrent `initialize` calls share one
//! in-flight future. Each resolution is tagged with a generation, and a
//! result whose generation has been superseded (by `reauthenticate` or
//! `logout`) is discarded instead of committed.

use b2b_storefront_core::Result;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::{Condvar, Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};
use tracing::{debug, info, instrument};

use crate::company::{CompanyInfo, CompanyStatus, MasqueradeCompany};
use crate::error::MasqueradeError;
use crate::permission::{self, Permissions};
use crate::resolver::Resolver;
use crate::role::Role;
use crate::state::AuthState;

type PendingResolution = Shared<BoxFuture<'static, AuthState>>;

type Listener = dyn Fn(&AuthState) + Send + Sync;

struct ListenerSlot {
    id: u64,
    /// First delivery this listener may receive: its own replay.
    first_seq: u64,
    active: AtomicBool,
    callback: Box<Listener>,
}

impl ListenerSlot {
    fn accepts(&self, delivery: &Delivery) -> bool {
        self.active.load(Ordering::SeqCst)
            && delivery.seq >= self.first_seq
            && delivery.only.is_none_or(|id| id == self.id)
    }
}

/// A state waiting to be delivered. `only` restricts a replay to the
/// listener that subscribed.
struct Delivery {
    seq: u64,
    state: AuthState,
    only: Option<u64>,
}

#[derive(Default)]
struct Flight {
    generation: u64,
    pending: Option<PendingResolution>,
}

#[derive(Default)]
struct Dispatch {
    queue: VecDeque<Delivery>,
    next_seq: u64,
    /// Every delivery with a lower sequence number has been made.
    delivered: u64,
    drainer: Option<ThreadId>,
}

impl Dispatch {
    fn enqueue(&mut self, state: AuthState, only: Option<u64>) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push_back(Delivery { seq, state, only });
        seq
    }
}

struct Inner {
    resolver: Resolver,
    state: RwLock<AuthState>,
    flight: Mutex<Flight>,
    listeners: Mutex<Vec<Arc<ListenerSlot>>>,
    dispatch: Mutex<Dispatch>,
    delivered: Condvar,
    next_listener_id: AtomicU64,
}

/// Releases the drainer role even if a listener panics.
struct DrainGuard<'a> {
    inner: &'a Inner,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.inner.dispatch.lock().drainer = None;
        self.inner.delivered.notify_all();
    }
}

impl Inner {
    /// Replaces the committed state and queues it for delivery, returning
    /// its sequence number.
    ///
    /// Lock order is flight, then state, then dispatch, then listeners.
    /// Callers must run [`Inner::deliver_through`] once they have released
    /// the flight lock.
    fn commit(&self, next: AuthState) -> u64 {
        let mut state = self.state.write();
        *state = next.clone();
        self.dispatch.lock().enqueue(next, None)
    }

    /// Returns once delivery `seq` has been made.
    ///
    /// Only one thread drains at a time. When the current thread is already
    /// draining (a listener committed), the delivery stays queued and is
    /// made by that drain in order. Otherwise the caller either becomes the
    /// drainer or waits for the running drain to get past `seq`.
    fn deliver_through(&self, seq: u64) {
        let current = thread::current().id();
        {
            let mut dispatch = self.dispatch.lock();
            loop {
                if dispatch.delivered > seq {
                    return;
                }
                match dispatch.drainer {
                    None => break,
                    Some(owner) if owner == current => return,
                    Some(_) => self.delivered.wait(&mut dispatch),
                }
            }
            dispatch.drainer = Some(current);
        }

        let _guard = DrainGuard { inner: self };
        loop {
            let next = self.dispatch.lock().queue.pop_front();
            let Some(delivery) = next else {
                return;
            };

            let listeners = self.listeners.lock().clone();
            for slot in listeners {
                if slot.accepts(&delivery) {
                    (slot.callback)(&delivery.state);
                }
            }

            self.dispatch.lock().delivered = delivery.seq + 1;
            self.delivered.notify_all();
        }
    }

    /// Starts a new resolution generation, superseding any in flight.
    /// Returns the resolution and the sequence number of the loading state.
    fn start(self: &Arc<Self>, flight: &mut Flight) -> (PendingResolution, u64) {
        flight.generation += 1;
        let generation = flight.generation;

        let loading = self.state.read().loading();
        let seq = self.commit(loading);

        let inner = Arc::clone(self);
        let resolution = async move {
            let outcome = inner.resolver.resolve().await;
            inner.finish(generation, outcome).await
        }
        .boxed()
        .shared();

        flight.pending = Some(resolution.clone());
        info!(generation, "resolution started");
        (resolution, seq)
    }

    /// Commits `outcome` if `generation` is still current. A superseded
    /// resolution hands its callers the newer outcome instead.
    async fn finish(self: Arc<Self>, generation: u64, outcome: AuthState) -> AuthState {
        let committed = {
            let mut flight = self.flight.lock();
            if flight.generation == generation {
                flight.pending = None;
                Ok(self.commit(outcome.clone()))
            } else {
                Err(flight.pending.clone())
            }
        };

        match committed {
            Ok(seq) => {
                debug!(
                    generation,
                    authenticated = outcome.is_authenticated(),
                    source = ?outcome.source(),
                    "resolution committed"
                );
                self.deliver_through(seq);
                outcome
            }
            Err(newer) => {
                debug!(generation, "discarding superseded resolution");
                match newer {
                    Some(newer) => newer.await,
                    None => self.state.read().clone(),
                }
            }
        }
    }
}

/// Handle to the session state store.
///
/// Cloning is cheap; all clones share one state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl SessionStore {
    /// Creates an uninitialized store driving `resolver`.
    #[must_use]
    pub fn new(resolver: Resolver) -> Self {
        Self {
            inner: Arc::new(Inner {
                resolver,
                state: RwLock::new(AuthState::uninitialized()),
                flight: Mutex::new(Flight::default()),
                listeners: Mutex::new(Vec::new()),
                dispatch: Mutex::new(Dispatch::default()),
                delivered: Condvar::new(),
                next_listener_id: AtomicU64::new(0),
            }),
        }
    }

    /// Resolves the visitor's identity once.
    ///
    /// Joins a resolution already in flight. When the store has already
    /// been initialized and nothing is in flight, returns the committed
    /// state without contacting the provider.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> AuthState {
        let pending = {
            let mut flight = self.inner.flight.lock();
            if let Some(pending) = &flight.pending {
                debug!(generation = flight.generation, "joining in-flight resolution");
                Some((pending.clone(), None))
            } else if self.inner.state.read().is_initialized() {
                None
            } else {
                let (pending, seq) = self.inner.start(&mut flight);
                Some((pending, Some(seq)))
            }
        };

        match pending {
            Some((pending, seq)) => {
                if let Some(seq) = seq {
                    self.inner.deliver_through(seq);
                }
                pending.await
            }
            None => self.get_state(),
        }
    }

    /// Discards any in-flight resolution and resolves from scratch.
    ///
    /// The previous identity stays committed (with `is_loading` set) until
    /// the new resolution completes.
    #[instrument(skip(self))]
    pub async fn reauthenticate(&self) -> AuthState {
        let (pending, seq) = {
            let mut flight = self.inner.flight.lock();
            if flight.pending.is_some() {
                debug!(generation = flight.generation, "superseding in-flight resolution");
            }
            self.inner.start(&mut flight)
        };
        self.inner.deliver_through(seq);
        pending.await
    }

    /// Signs the visitor out without consulting the resolver.
    ///
    /// Any in-flight resolution is invalidated and will not be committed.
    pub fn logout(&self) {
        let seq = {
            let mut flight = self.inner.flight.lock();
            flight.generation += 1;
            flight.pending = None;
            self.inner.commit(AuthState::logged_out())
        };
        self.inner.deliver_through(seq);
        info!("logged out");
    }

    /// Returns the latest committed state.
    #[must_use]
    pub fn get_state(&self) -> AuthState {
        self.inner.state.read().clone()
    }

    /// Registers `listener`.
    ///
    /// The listener first receives the current state, then every state
    /// committed after it, until the returned [`Subscription`] is dropped
    /// or unsubscribed. States committed earlier but not yet delivered are
    /// never passed to it. The replay happens before this returns, except
    /// when subscribing from inside a listener: it is then made right after
    /// the delivery in progress. Listeners run synchronously and must not
    /// block.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&AuthState) + Send + Sync + 'static,
    {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);
        let (slot, seq) = {
            let state = self.inner.state.read();
            let mut dispatch = self.inner.dispatch.lock();
            let seq = dispatch.enqueue(state.clone(), Some(id));
            let slot = Arc::new(ListenerSlot {
                id,
                first_seq: seq,
                active: AtomicBool::new(true),
                callback: Box::new(listener),
            });
            self.inner.listeners.lock().push(Arc::clone(&slot));
            (slot, seq)
        };
        self.inner.deliver_through(seq);

        Subscription {
            store: Arc::downgrade(&self.inner),
            slot,
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    /// Checks the current session's permissions. See
    /// [`permission::has_permission`].
    #[must_use]
    pub fn has_permission(&self, code: &str, required_level: u8) -> bool {
        let state = self.inner.state.read();
        permission::has_permission(state.session(), code, required_level)
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.inner.state.read().session().map(|s| s.role())
    }

    #[must_use]
    pub fn company_status(&self) -> Option<CompanyStatus> {
        self.inner.state.read().session().map(|s| s.company_status())
    }

    #[must_use]
    pub fn company_info(&self) -> Option<CompanyInfo> {
        self.inner
            .state
            .read()
            .session()
            .map(|s| s.company_info().clone())
    }

    #[must_use]
    pub fn permissions(&self) -> Permissions {
        self.inner
            .state
            .read()
            .session()
            .map(|s| s.permissions().clone())
            .unwrap_or_default()
    }

    /// Codes granted at level 1 or above in the current session.
    #[must_use]
    pub fn granted_codes(&self) -> Vec<String> {
        self.inner
            .state
            .read()
            .session()
            .map(|s| s.permissions().granted_codes())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_b2b_user(&self) -> bool {
        self.inner
            .state
            .read()
            .session()
            .is_some_and(|s| s.is_b2b_user())
    }

    #[must_use]
    pub fn is_masquerading(&self) -> bool {
        self.inner
            .state
            .read()
            .session()
            .is_some_and(|s| s.is_masquerading())
    }

    #[must_use]
    pub fn masquerade_company(&self) -> Option<MasqueradeCompany> {
        self.inner
            .state
            .read()
            .session()
            .and_then(|s| s.masquerade().cloned())
    }

    /// Starts acting on behalf of `company`.
    ///
    /// # Errors
    ///
    /// Fails when no customer is authenticated, the role may not
    /// masquerade, or a resolution is in flight.
    pub fn begin_masquerade(
        &self,
        company: MasqueradeCompany,
    ) -> Result<AuthState, MasqueradeError> {
        self.replace_masquerade(Some(company))
    }

    /// Stops acting on behalf of a company. A no-op when not masquerading.
    ///
    /// # Errors
    ///
    /// Fails when no customer is authenticated or a resolution is in
    /// flight.
    pub fn end_masquerade(&self) -> Result<AuthState, MasqueradeError> {
        self.replace_masquerade(None)
    }

    fn replace_masquerade(
        &self,
        company: Option<MasqueradeCompany>,
    ) -> Result<AuthState, MasqueradeError> {
        let committed = {
            let flight = self.inner.flight.lock();
            if flight.pending.is_some() {
                return Err(MasqueradeError::ResolutionInFlight.into());
            }

            let current = self.inner.state.read().clone();
            let Some(session) = current.authenticated_session() else {
                return Err(MasqueradeError::NotAuthenticated.into());
            };
            if company.is_some() && !session.role().can_masquerade() {
                return Err(MasqueradeError::NotPermitted {
                    role: session.role(),
                }
                .into());
            }
            if company.is_none() && !session.is_masquerading() {
                return Ok(current);
            }

            match &company {
                Some(target) => info!(company_id = %target.id, "masquerade started"),
                None => info!("masquerade ended"),
            }
            let next = current.with_session(session.with_masquerade(company));
            let seq = self.inner.commit(next.clone());
            (next, seq)
        };
        self.inner.deliver_through(committed.1);
        Ok(committed.0)
    }
}

/// Keeps a listener registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    store: Weak<Inner>,
    slot: Arc<ListenerSlot>,
}

impl Subscription {
    /// Unsubscribes. No further calls reach the listener after this returns.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.slot.active.store(false, Ordering::SeqCst);
        if let Some(inner) = self.store.upgrade() {
            inner.listeners.lock().retain(|s| s.id != self.slot.id);
        }
    }
}
