use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tokio::sync::mpsc::error::TrySendError;

use wschat_core::error::{Result, WsChatError};

use crate::realtime::types::{ClientId, Delivery, Departed, LeaveOutcome, Mailbox};

struct ClientEntry {
    mailbox: Mailbox,
    room: Option<String>,
    username: String,
}

#[derive(Default)]
struct RegistryState {
    clients: HashMap<ClientId, ClientEntry>,
    rooms: HashMap<String, HashSet<ClientId>>,
}

impl RegistryState {
    /// Drop `id` from `room`'s member set, deleting the room when it empties.
    /// Returns true if the room still has members afterwards.
    fn detach(&mut self, id: ClientId, room: &str) -> bool {
        let Some(members) = self.rooms.get_mut(room) else {
            return false;
        };
        members.remove(&id);
        if members.is_empty() {
            self.rooms.remove(room);
            return false;
        }
        true
    }

    /// Remove a client entirely. Dropping the entry drops the mailbox sender.
    fn evict(&mut self, id: ClientId) {
        if let Some(entry) = self.clients.remove(&id) {
            if let Some(room) = entry.room {
                self.detach(id, &room);
            }
        }
    }
}

/// Non-blocking enqueue onto every target mailbox.
fn deliver<'a>(
    clients: &HashMap<ClientId, ClientEntry>,
    targets: impl IntoIterator<Item = &'a ClientId>,
    payload: &Bytes,
) -> Delivery {
    let mut out = Delivery::default();
    for id in targets {
        let Some(entry) = clients.get(id) else { continue };
        match entry.mailbox.try_send(payload.clone()) {
            Ok(()) => out.delivered += 1,
            Err(TrySendError::Full(_)) => out.evicted.push(*id),
            Err(TrySendError::Closed(_)) => out.closed += 1,
        }
    }
    out
}

/// Client and room membership under a single lock.
///
/// Invariants:
/// - a client is in at most one room, and its recorded room always contains it;
/// - no room with zero members is kept.
///
/// The lock is a blocking mutex and is never held across an `.await`; fan-out
/// uses `try_send` only, so holding it cannot stall on a slow consumer.
pub struct RoomRegistry {
    state: Mutex<RegistryState>,
    seq: AtomicU64,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            seq: AtomicU64::new(1),
        }
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a freshly upgraded client with no room and no username.
    pub fn register(&self, mailbox: Mailbox) -> ClientId {
        let id = ClientId(self.seq.fetch_add(1, Ordering::Relaxed));
        self.state().clients.insert(
            id,
            ClientEntry {
                mailbox,
                room: None,
                username: String::new(),
            },
        );
        id
    }

    /// Move `id` into `room` (leaving any prior room) and record its username.
    pub fn join(&self, id: ClientId, room: &str, username: &str) -> Result<()> {
        let mut st = self.state();

        let entry = st
            .clients
            .get_mut(&id)
            .ok_or(WsChatError::UnknownClient(id.0))?;
        let prior = entry.room.replace(room.to_owned());
        entry.username = username.to_owned();

        if let Some(prior) = prior.filter(|p| p != room) {
            st.detach(id, &prior);
        }
        st.rooms.entry(room.to_owned()).or_default().insert(id);
        Ok(())
    }

    /// Take `id` out of `room`. A room the client is not currently in is left alone.
    pub fn leave(&self, id: ClientId, room: &str) -> LeaveOutcome {
        let mut st = self.state();

        let Some(entry) = st.clients.get_mut(&id) else {
            return LeaveOutcome::NotMember;
        };
        if entry.room.as_deref() != Some(room) {
            return LeaveOutcome::NotMember;
        }
        entry.room = None;

        if st.detach(id, room) {
            LeaveOutcome::Remaining
        } else {
            LeaveOutcome::RoomClosed
        }
    }

    /// Full teardown of one client. Returns its room and username when that
    /// room still has members to notify.
    pub fn disconnect(&self, id: ClientId) -> Option<Departed> {
        let mut st = self.state();

        let entry = st.clients.remove(&id)?;
        let room = entry.room?;
        if st.detach(id, &room) {
            Some(Departed {
                room,
                username: entry.username,
            })
        } else {
            None
        }
    }

    /// Fan `payload` out to every member of `room`.
    /// Members whose mailbox is full are evicted from the registry and the room.
    pub fn publish_room(&self, room: &str, payload: &Bytes) -> Delivery {
        let mut guard = self.state();
        let st = &mut *guard;

        let delivery = match st.rooms.get(room) {
            Some(members) => deliver(&st.clients, members, payload),
            None => return Delivery::default(),
        };
        for id in &delivery.evicted {
            st.evict(*id);
        }
        delivery
    }

    /// Fan `payload` out to every connected client regardless of room.
    pub fn broadcast_all(&self, payload: &Bytes) -> Delivery {
        let mut guard = self.state();
        let st = &mut *guard;

        let delivery = deliver(&st.clients, st.clients.keys(), payload);
        for id in &delivery.evicted {
            st.evict(*id);
        }
        delivery
    }

    pub fn contains(&self, id: ClientId) -> bool {
        self.state().clients.contains_key(&id)
    }

    pub fn room_of(&self, id: ClientId) -> Option<String> {
        self.state().clients.get(&id).and_then(|c| c.room.clone())
    }

    pub fn room_members(&self, room: &str) -> Vec<ClientId> {
        let mut members: Vec<ClientId> = self
            .state()
            .rooms
            .get(room)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default();
        members.sort();
        members
    }

    pub fn client_count(&self) -> usize {
        self.state().clients.len()
    }

    pub fn room_count(&self) -> usize {
        self.state().rooms.len()
    }

    /// Consistent copy of both maps, taken under one lock acquisition.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let st = self.state();
        RegistrySnapshot {
            clients: st
                .clients
                .iter()
                .map(|(id, c)| (*id, c.room.clone()))
                .collect(),
            rooms: st
                .rooms
                .iter()
                .map(|(name, members)| {
                    let mut ids: Vec<ClientId> = members.iter().copied().collect();
                    ids.sort();
                    (name.clone(), ids)
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrySnapshot {
    pub clients: BTreeMap<ClientId, Option<String>>,
    pub rooms: BTreeMap<String, Vec<ClientId>>,
}

impl RegistrySnapshot {
    /// Check both directions of the membership invariant.
    pub fn is_consistent(&self) -> bool {
        let rooms_ok = self.rooms.iter().all(|(name, members)| {
            !members.is_empty()
                && members
                    .iter()
                    .all(|id| matches!(self.clients.get(id), Some(Some(r)) if r == name))
        });
        let clients_ok = self.clients.iter().all(|(id, room)| match room {
            None => true,
            Some(r) => self.rooms.get(r).is_some_and(|m| m.contains(id)),
        });
        rooms_ok && clients_ok
    }
}
