//! # Realm
//!
//! The graph instance. Owns every node, link and subscription declared
//! through it, and runs propagation.
//!
//! ## Propagation
//!
//! ```text
//! publish ──► queue ──► pass: apply writes → topological order → evaluate links → notify
//!                ▲                                                           │
//!                └──────────── re-entrant publish from a subscriber ◄────────┘
//! ```
//!
//! A pass evaluates every node at most once, after all of its sources.
//! Publishes issued while a pass is running are queued and drained in FIFO
//! order before the outermost `publish` returns.

use std::any::{type_name, Any, TypeId};
use std::borrow::Cow;
use std::cell::{Cell as Flag, RefCell};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use tracing::{debug, error, trace, warn};

use crate::error::{FailureStage, PropagationFailure, RealmError};
use crate::node::{Aggregate, Cell, Key, NodeHandle, NodeId, NodeKind, Signal, Sink, Source};
use crate::subscription::Subscription;

pub(crate) type Value = Rc<dyn Any>;
pub(crate) type Operator = Rc<dyn Fn(&[Value]) -> anyhow::Result<Option<Value>>>;
type Callback = Rc<dyn Fn(&Realm, &dyn Any) -> anyhow::Result<()>>;
type Reducer = Box<dyn FnOnce(Option<&Value>) -> Value>;

static NEXT_REALM_ID: AtomicU32 = AtomicU32::new(1);

/// Identity of a registered link or pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkId(u64);

/// Read-only description of a node, for diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub value_type: &'static str,
    pub subscribers: usize,
    pub has_value: bool,
}

struct Slot {
    name: Cow<'static, str>,
    kind: NodeKind,
    type_id: TypeId,
    type_name: &'static str,
    value: Option<Value>,
    subscribers: Vec<(u64, Callback)>,
}

struct Connection {
    /// Inputs that trigger evaluation
    sources: Vec<NodeId>,
    /// Inputs read at their latest value, never triggering
    pulls: Vec<NodeId>,
    sink: NodeId,
    operator: Operator,
}

pub(crate) struct Graph {
    realm: u32,
    /// Indexed by `NodeId::index`. Disposed slots stay `None` so ids are never
    /// reused; the table grows with the number of nodes ever declared.
    slots: Vec<Option<Slot>>,
    names: HashMap<String, NodeId>,
    connections: BTreeMap<LinkId, Connection>,
    outgoing: HashMap<NodeId, Vec<LinkId>>,
    incoming: HashMap<NodeId, Vec<LinkId>>,
    links: HashMap<(NodeId, NodeId), LinkId>,
    next_link: u64,
    next_subscription: u64,
}

enum Pending {
    Ready(Value),
    Reduce(Reducer),
}

type PendingWrite = (NodeId, Pending);

pub(crate) struct RealmInner {
    id: u32,
    pub(crate) graph: RefCell<Graph>,
    queue: RefCell<VecDeque<Vec<PendingWrite>>>,
    draining: Flag<bool>,
    failures: RefCell<Vec<PropagationFailure>>,
}

/// Handle to a reactive graph instance.
///
/// Cloning is cheap; all clones address the same graph. The graph lives as
/// long as any clone (or any plugin holding one) lives, and [`Realm::teardown`]
/// releases its contents explicitly.
#[derive(Clone)]
pub struct Realm {
    pub(crate) inner: Rc<RealmInner>,
}

impl Realm {
    pub fn new() -> Self {
        let id = NEXT_REALM_ID.fetch_add(1, Ordering::Relaxed);
        debug!(realm = id, "Creating realm");
        Self {
            inner: Rc::new(RealmInner {
                id,
                graph: RefCell::new(Graph::new(id)),
                queue: RefCell::new(VecDeque::new()),
                draining: Flag::new(false),
                failures: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> u32 {
        self.inner.id
    }

    // ----- declaration -----

    /// Declare an anonymous cell seeded with `initial`
    pub fn cell<T: 'static>(&self, initial: T) -> Cell<T> {
        self.insert_node(None, Some(Rc::new(initial)))
    }

    /// Declare an anonymous cell that has no value until first published
    pub fn empty_cell<T: 'static>(&self) -> Cell<T> {
        self.insert_node(None, None)
    }

    pub fn signal<T: 'static>(&self) -> Signal<T> {
        self.insert_node(None, None)
    }

    pub fn aggregate<T: 'static>(&self) -> Aggregate<T> {
        self.insert_node(None, Some(Rc::new(Vec::<T>::new())))
    }

    /// Declare a named cell. Required keys must be given an initial value.
    pub fn declare_cell<T: 'static>(
        &self,
        key: Key<Cell<T>>,
        initial: Option<T>,
    ) -> Result<Cell<T>, RealmError> {
        if key.is_required() && initial.is_none() {
            return Err(RealmError::InvalidInitialState {
                node: key.name().to_string(),
            });
        }
        self.declare_named(key, initial.map(|v| Rc::new(v) as Value))
    }

    pub fn declare_signal<T: 'static>(&self, key: Key<Signal<T>>) -> Result<Signal<T>, RealmError> {
        self.declare_named(key, None)
    }

    pub fn declare_aggregate<T: 'static>(
        &self,
        key: Key<Aggregate<T>>,
    ) -> Result<Aggregate<T>, RealmError> {
        self.declare_named(key, Some(Rc::new(Vec::<T>::new())))
    }

    /// Look up a node declared under `key` by some other contributor
    pub fn resolve<N: NodeHandle>(&self, key: Key<N>) -> Result<N, RealmError> {
        let graph = self.inner.graph.borrow();
        let id = graph
            .names
            .get(key.name())
            .copied()
            .ok_or_else(|| RealmError::MissingNode {
                name: key.name().to_string(),
            })?;
        let slot = graph.slot_checked(id)?;
        if slot.kind != N::KIND || slot.type_id != N::value_type() {
            return Err(RealmError::TypeMismatch {
                node: key.name().to_string(),
                expected: type_name::<N::Value>(),
                found: slot.type_name,
            });
        }
        Ok(N::from_id(id))
    }

    /// Whether a node is declared under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.inner.graph.borrow().names.contains_key(name)
    }

    pub fn name_of(&self, id: NodeId) -> Option<String> {
        self.inner
            .graph
            .borrow()
            .slot(id)
            .map(|slot| slot.name.to_string())
    }

    /// Snapshot of every live node, in declaration order
    pub fn nodes(&self) -> Vec<NodeInfo> {
        let graph = self.inner.graph.borrow();
        graph
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.as_ref().map(|slot| NodeInfo {
                    id: NodeId {
                        realm: graph.realm,
                        index: index as u32,
                    },
                    name: slot.name.to_string(),
                    kind: slot.kind,
                    value_type: slot.type_name,
                    subscribers: slot.subscribers.len(),
                    has_value: slot.value.is_some(),
                })
            })
            .collect()
    }

    fn declare_named<N: NodeHandle>(
        &self,
        key: Key<N>,
        value: Option<Value>,
    ) -> Result<N, RealmError> {
        if self.contains(key.name()) {
            return Err(RealmError::DuplicateNode {
                name: key.name().to_string(),
            });
        }
        let node: N = self.insert_node(Some(Cow::Borrowed(key.name())), value);
        self.inner
            .graph
            .borrow_mut()
            .names
            .insert(key.name().to_string(), node.id());
        Ok(node)
    }

    pub(crate) fn insert_node<N: NodeHandle>(
        &self,
        name: Option<Cow<'static, str>>,
        value: Option<Value>,
    ) -> N {
        let mut graph = self.inner.graph.borrow_mut();
        let id = NodeId {
            realm: graph.realm,
            index: graph.slots.len() as u32,
        };
        let name = name.unwrap_or_else(|| Cow::Owned(format!("{}{}", N::KIND.label(), id)));
        trace!(node = %name, kind = N::KIND.label(), "Declaring node");
        graph.slots.push(Some(Slot {
            name,
            kind: N::KIND,
            type_id: N::value_type(),
            type_name: type_name::<N::Value>(),
            value,
            subscribers: Vec::new(),
        }));
        N::from_id(id)
    }

    /// Declare a derived signal named after the stage and its inputs
    pub(crate) fn derived<T: 'static>(&self, stage: &str, inputs: &[NodeId]) -> Result<Signal<T>, RealmError> {
        let name = {
            let graph = self.inner.graph.borrow();
            let mut names = Vec::with_capacity(inputs.len());
            for input in inputs {
                names.push(graph.slot_checked(*input)?.name.to_string());
            }
            format!("{}({})", stage, names.join(", "))
        };
        Ok(self.insert_node(Some(Cow::Owned(name)), None))
    }

    // ----- reads -----

    /// Current value of a cell or aggregate. Signals never hold one.
    pub fn value<T: Clone + 'static, S: Source<T>>(&self, source: S) -> Result<Option<T>, RealmError> {
        let graph = self.inner.graph.borrow();
        let slot = graph.slot_typed::<T>(source.node_id())?;
        Ok(slot
            .value
            .as_ref()
            .and_then(|value| value.downcast_ref::<T>())
            .cloned())
    }

    /// Current contents of an aggregate
    pub fn values<T: Clone + 'static>(&self, aggregate: Aggregate<T>) -> Result<Vec<T>, RealmError> {
        Ok(self.value(aggregate)?.unwrap_or_default())
    }

    // ----- writes -----

    /// Set a cell or emit on a signal, then propagate synchronously
    pub fn publish<T: 'static, S: Sink<T>>(&self, node: S, value: T) -> Result<(), RealmError> {
        let id = node.node_id();
        self.inner.graph.borrow().slot_typed::<T>(id)?;
        self.enqueue(vec![(id, Pending::Ready(Rc::new(value)))])
    }

    /// Append `items` to an aggregate.
    ///
    /// The new contents are computed when the write is applied, not when it is
    /// queued, so appends issued from inside a propagation never clobber each other.
    pub fn append<T: Clone + 'static>(
        &self,
        aggregate: Aggregate<T>,
        items: impl IntoIterator<Item = T>,
    ) -> Result<(), RealmError> {
        let write = self.append_write(aggregate, items)?;
        self.enqueue(vec![write])
    }

    /// Group several writes into a single propagation pass
    pub fn batch(&self) -> Batch<'_> {
        Batch {
            realm: self,
            writes: Vec::new(),
        }
    }

    fn append_write<T: Clone + 'static>(
        &self,
        aggregate: Aggregate<T>,
        items: impl IntoIterator<Item = T>,
    ) -> Result<PendingWrite, RealmError> {
        let id = aggregate.node_id();
        self.inner.graph.borrow().slot_typed::<Vec<T>>(id)?;
        let items: Vec<T> = items.into_iter().collect();
        let reduce: Reducer = Box::new(move |current| {
            let mut next = current
                .and_then(|value| value.downcast_ref::<Vec<T>>())
                .cloned()
                .unwrap_or_default();
            next.extend(items);
            Rc::new(next)
        });
        Ok((id, Pending::Reduce(reduce)))
    }

    fn enqueue(&self, writes: Vec<PendingWrite>) -> Result<(), RealmError> {
        self.inner.queue.borrow_mut().push_back(writes);
        self.drain()
    }

    fn drain(&self) -> Result<(), RealmError> {
        if self.inner.draining.get() {
            trace!(realm = self.inner.id, "Publish queued behind running propagation");
            return Ok(());
        }

        {
            let _guard = DrainGuard::enter(&self.inner);
            loop {
                let next = self.inner.queue.borrow_mut().pop_front();
                match next {
                    Some(writes) => self.run_pass(writes),
                    None => break,
                }
            }
        }

        let failures = std::mem::take(&mut *self.inner.failures.borrow_mut());
        if failures.is_empty() {
            Ok(())
        } else {
            Err(RealmError::Propagation { failures })
        }
    }

    fn run_pass(&self, writes: Vec<PendingWrite>) {
        let mut fired: HashMap<NodeId, Value> = HashMap::new();
        let mut seeds = Vec::new();
        // Further values for a signal that already fired in this pass
        let mut deferred: Vec<PendingWrite> = Vec::new();

        {
            let mut graph = self.inner.graph.borrow_mut();
            for (id, pending) in writes {
                let Some(slot) = graph.slot_mut(id) else {
                    warn!(node = %id, "Dropping write to disposed node");
                    continue;
                };
                let value = match pending {
                    Pending::Ready(value) => value,
                    Pending::Reduce(reduce) => reduce(slot.value.as_ref()),
                };
                if slot.kind.retains_value() {
                    slot.value = Some(value.clone());
                } else if fired.contains_key(&id) {
                    deferred.push((id, Pending::Ready(value)));
                    continue;
                }
                if fired.insert(id, value).is_none() {
                    seeds.push(id);
                }
            }
        }

        seeds.sort();
        let order = self.inner.graph.borrow().propagation_order(&seeds);
        trace!(seeds = seeds.len(), nodes = order.len(), "Running propagation pass");

        for node in order {
            if !fired.contains_key(&node) {
                let mut results = self.evaluate(node, &fired).into_iter();
                if self.retains_value(node) {
                    if let Some(last) = results.last() {
                        fired.insert(node, last);
                    }
                } else if let Some(first) = results.next() {
                    fired.insert(node, first);
                    deferred.extend(results.map(|value| (node, Pending::Ready(value))));
                }
            }
            if let Some(value) = fired.get(&node).cloned() {
                self.notify(node, &value);
            }
        }

        if !deferred.is_empty() {
            // Ahead of publishes queued by subscribers: these belong to the current write
            trace!(values = deferred.len(), "Deferring extra signal values to a follow-up pass");
            self.inner.queue.borrow_mut().push_front(deferred);
        }
    }

    fn retains_value(&self, node: NodeId) -> bool {
        self.inner
            .graph
            .borrow()
            .slot(node)
            .map_or(false, |slot| slot.kind.retains_value())
    }

    /// Run the incoming links of `node` that had a source fire in this pass.
    ///
    /// Returns every value produced, in link order. A cell keeps the last one.
    fn evaluate(&self, node: NodeId, fired: &HashMap<NodeId, Value>) -> Vec<Value> {
        let (name, candidates) = {
            let graph = self.inner.graph.borrow();
            let Some(slot) = graph.slot(node) else {
                return Vec::new();
            };
            let mut candidates = Vec::new();
            for link in graph.incoming.get(&node).into_iter().flatten() {
                let Some(connection) = graph.connections.get(link) else {
                    continue;
                };
                if !connection.sources.iter().any(|source| fired.contains_key(source)) {
                    continue;
                }
                // No partial results: every input must have a value.
                let inputs: Option<Vec<Value>> = connection
                    .sources
                    .iter()
                    .chain(connection.pulls.iter())
                    .map(|input| {
                        fired
                            .get(input)
                            .cloned()
                            .or_else(|| graph.slot(*input).and_then(|slot| slot.value.clone()))
                    })
                    .collect();
                if let Some(inputs) = inputs {
                    candidates.push((connection.operator.clone(), inputs));
                }
            }
            (slot.name.clone(), candidates)
        };

        let mut results = Vec::new();
        for (operator, inputs) in candidates {
            match operator(&inputs) {
                Ok(Some(value)) => results.push(value),
                Ok(None) => {}
                Err(err) => self.record_failure(&name, FailureStage::Operator, err),
            }
        }

        if let Some(value) = results.last() {
            let mut graph = self.inner.graph.borrow_mut();
            if let Some(slot) = graph.slot_mut(node) {
                if slot.kind.retains_value() {
                    slot.value = Some(value.clone());
                }
            }
        }
        results
    }

    fn notify(&self, node: NodeId, value: &Value) {
        let (name, callbacks) = {
            let graph = self.inner.graph.borrow();
            let Some(slot) = graph.slot(node) else {
                return;
            };
            let callbacks: Vec<Callback> = slot
                .subscribers
                .iter()
                .map(|(_, callback)| callback.clone())
                .collect();
            (slot.name.clone(), callbacks)
        };

        for callback in callbacks {
            if let Err(err) = callback(self, &**value) {
                self.record_failure(&name, FailureStage::Subscriber, err);
            }
        }
    }

    fn record_failure(&self, node: &str, stage: FailureStage, err: anyhow::Error) {
        error!(node = %node, stage = ?stage, error = %format!("{:#}", err), "Propagation failure isolated");
        self.inner.failures.borrow_mut().push(PropagationFailure {
            node: node.to_string(),
            stage,
            message: format!("{:#}", err),
        });
    }

    // ----- wiring -----

    /// Register `callback` for every future value of `source`
    pub fn subscribe<T, S, F>(&self, source: S, callback: F) -> Result<Subscription, RealmError>
    where
        T: 'static,
        S: Source<T>,
        F: Fn(&Realm, &T) -> anyhow::Result<()> + 'static,
    {
        let id = source.node_id();
        let mut graph = self.inner.graph.borrow_mut();
        graph.slot_typed::<T>(id)?;

        let subscription = graph.next_subscription;
        graph.next_subscription += 1;

        let callback: Callback = Rc::new(move |realm, value| {
            let value = value.downcast_ref::<T>().ok_or_else(|| {
                anyhow::anyhow!("payload is not a {}", type_name::<T>())
            })?;
            callback(realm, value)
        });
        graph.slot_checked_mut(id)?.subscribers.push((subscription, callback));

        Ok(Subscription::new(Rc::downgrade(&self.inner), id, subscription))
    }

    pub(crate) fn connect(
        &self,
        sources: Vec<NodeId>,
        pulls: Vec<NodeId>,
        sink: NodeId,
        operator: Operator,
    ) -> Result<LinkId, RealmError> {
        let mut graph = self.inner.graph.borrow_mut();
        for input in sources.iter().chain(pulls.iter()).chain(std::iter::once(&sink)) {
            graph.slot_checked(*input)?;
        }

        let link = LinkId(graph.next_link);
        graph.next_link += 1;

        let mut inputs: Vec<NodeId> = sources.iter().chain(pulls.iter()).copied().collect();
        inputs.sort_unstable();
        inputs.dedup();
        for input in inputs {
            graph.outgoing.entry(input).or_default().push(link);
        }
        graph.incoming.entry(sink).or_default().push(link);
        graph.connections.insert(
            link,
            Connection {
                sources,
                pulls,
                sink,
                operator,
            },
        );
        Ok(link)
    }

    pub(crate) fn existing_link(&self, from: NodeId, to: NodeId) -> Option<LinkId> {
        self.inner.graph.borrow().links.get(&(from, to)).copied()
    }

    pub(crate) fn remember_link(&self, from: NodeId, to: NodeId, link: LinkId) {
        self.inner.graph.borrow_mut().links.insert((from, to), link);
    }

    pub(crate) fn check_type<T: 'static>(&self, id: NodeId) -> Result<(), RealmError> {
        self.inner.graph.borrow().slot_typed::<T>(id).map(|_| ())
    }

    /// Remove a link or pipeline stage. Returns false if it was already gone.
    pub fn unlink(&self, link: LinkId) -> bool {
        self.inner.graph.borrow_mut().remove_link(link)
    }

    /// Remove a node together with its subscriptions and every link touching it
    pub fn dispose_node(&self, id: NodeId) -> Result<(), RealmError> {
        let mut graph = self.inner.graph.borrow_mut();
        let slot = graph.take_slot(id)?;
        graph.names.retain(|_, node| *node != id);

        let touching: Vec<LinkId> = graph
            .connections
            .iter()
            .filter(|(_, c)| c.sink == id || c.sources.contains(&id) || c.pulls.contains(&id))
            .map(|(link, _)| *link)
            .collect();
        for link in touching {
            graph.remove_link(link);
        }
        debug!(node = %slot.name, "Disposed node");
        Ok(())
    }

    /// Release every node, link and subscription. Handles become unknown.
    ///
    /// Pending writes and uncollected failures are dropped as well.
    pub fn teardown(&self) {
        let mut graph = self.inner.graph.borrow_mut();
        let released = graph.slots.iter().filter(|slot| slot.is_some()).count();
        graph.clear();
        self.inner.queue.borrow_mut().clear();
        self.inner.failures.borrow_mut().clear();
        debug!(realm = self.inner.id, nodes = released, "Realm torn down");
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let graph = self.inner.graph.borrow();
        f.debug_struct("Realm")
            .field("id", &self.inner.id)
            .field("nodes", &graph.slots.iter().filter(|s| s.is_some()).count())
            .field("links", &graph.connections.len())
            .finish()
    }
}

/// Writes committed together as one propagation pass
pub struct Batch<'a> {
    realm: &'a Realm,
    writes: Vec<PendingWrite>,
}

impl<'a> Batch<'a> {
    pub fn publish<T: 'static, S: Sink<T>>(mut self, node: S, value: T) -> Result<Self, RealmError> {
        let id = node.node_id();
        self.realm.inner.graph.borrow().slot_typed::<T>(id)?;
        self.writes.push((id, Pending::Ready(Rc::new(value))));
        Ok(self)
    }

    pub fn append<T: Clone + 'static>(
        mut self,
        aggregate: Aggregate<T>,
        items: impl IntoIterator<Item = T>,
    ) -> Result<Self, RealmError> {
        let write = self.realm.append_write(aggregate, items)?;
        self.writes.push(write);
        Ok(self)
    }

    pub fn commit(self) -> Result<(), RealmError> {
        if self.writes.is_empty() {
            return Ok(());
        }
        self.realm.enqueue(self.writes)
    }
}

struct DrainGuard<'a>(&'a RealmInner);

impl<'a> DrainGuard<'a> {
    fn enter(inner: &'a RealmInner) -> Self {
        inner.draining.set(true);
        Self(inner)
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.draining.set(false);
    }
}

impl Graph {
    fn new(realm: u32) -> Self {
        Self {
            realm,
            slots: Vec::new(),
            names: HashMap::new(),
            connections: BTreeMap::new(),
            outgoing: HashMap::new(),
            incoming: HashMap::new(),
            links: HashMap::new(),
            next_link: 0,
            next_subscription: 0,
        }
    }

    fn slot(&self, id: NodeId) -> Option<&Slot> {
        if id.realm != self.realm {
            return None;
        }
        self.slots.get(id.index as usize).and_then(|slot| slot.as_ref())
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Slot> {
        if id.realm != self.realm {
            return None;
        }
        self.slots
            .get_mut(id.index as usize)
            .and_then(|slot| slot.as_mut())
    }

    fn slot_checked(&self, id: NodeId) -> Result<&Slot, RealmError> {
        self.slot(id).ok_or_else(|| RealmError::UnknownNode {
            node: id.to_string(),
        })
    }

    fn slot_checked_mut(&mut self, id: NodeId) -> Result<&mut Slot, RealmError> {
        self.slot_mut(id).ok_or_else(|| RealmError::UnknownNode {
            node: id.to_string(),
        })
    }

    fn slot_typed<T: 'static>(&self, id: NodeId) -> Result<&Slot, RealmError> {
        let slot = self.slot_checked(id)?;
        if slot.type_id != TypeId::of::<T>() {
            return Err(RealmError::TypeMismatch {
                node: slot.name.to_string(),
                expected: type_name::<T>(),
                found: slot.type_name,
            });
        }
        Ok(slot)
    }

    fn take_slot(&mut self, id: NodeId) -> Result<Slot, RealmError> {
        if id.realm != self.realm {
            return Err(RealmError::UnknownNode {
                node: id.to_string(),
            });
        }
        self.slots
            .get_mut(id.index as usize)
            .and_then(|slot| slot.take())
            .ok_or_else(|| RealmError::UnknownNode {
                node: id.to_string(),
            })
    }

    pub(crate) fn remove_subscriber(&mut self, node: NodeId, subscription: u64) -> bool {
        match self.slot_mut(node) {
            Some(slot) => {
                let before = slot.subscribers.len();
                slot.subscribers.retain(|(id, _)| *id != subscription);
                slot.subscribers.len() != before
            }
            None => false,
        }
    }

    fn remove_link(&mut self, link: LinkId) -> bool {
        let Some(connection) = self.connections.remove(&link) else {
            return false;
        };
        for input in connection.sources.iter().chain(connection.pulls.iter()) {
            if let Some(links) = self.outgoing.get_mut(input) {
                links.retain(|l| *l != link);
            }
        }
        if let Some(links) = self.incoming.get_mut(&connection.sink) {
            links.retain(|l| *l != link);
        }
        self.links.retain(|_, l| *l != link);
        true
    }

    /// Nodes reachable from `seeds`, sources before sinks.
    ///
    /// Reverse DFS post-order; a back edge (cycle) is cut, so every node is
    /// still visited once.
    fn propagation_order(&self, seeds: &[NodeId]) -> Vec<NodeId> {
        let mut visited = HashSet::new();
        let mut post_order = Vec::new();
        for seed in seeds {
            self.visit(*seed, &mut visited, &mut post_order);
        }
        post_order.reverse();
        post_order
    }

    fn visit(&self, node: NodeId, visited: &mut HashSet<NodeId>, post_order: &mut Vec<NodeId>) {
        if !visited.insert(node) {
            return;
        }
        if let Some(links) = self.outgoing.get(&node) {
            for link in links {
                if let Some(connection) = self.connections.get(link) {
                    self.visit(connection.sink, visited, post_order);
                }
            }
        }
        post_order.push(node);
    }

    fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        self.names.clear();
        self.connections.clear();
        self.outgoing.clear();
        self.incoming.clear();
        self.links.clear();
    }
}
