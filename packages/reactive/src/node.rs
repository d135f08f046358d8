//! # Node Handles
//!
//! Typed, copyable references to nodes living inside a [`Realm`](crate::Realm).
//!
//! A handle is only an address: the value, the subscribers and the wiring are
//! owned by the realm that declared the node. Handles from one realm are
//! rejected by every other realm with `UnknownNode`.

use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;

/// Stable identity of a declared node (realm + slot)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    pub(crate) realm: u32,
    pub(crate) index: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:{}", self.realm, self.index)
    }
}

/// What a node retains between propagation passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Holds a current value
    Cell,
    /// Transient events, nothing retained
    Signal,
    /// Append-only `Vec<T>`
    Aggregate,
}

impl NodeKind {
    pub(crate) fn retains_value(self) -> bool {
        !matches!(self, NodeKind::Signal)
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            NodeKind::Cell => "cell",
            NodeKind::Signal => "signal",
            NodeKind::Aggregate => "aggregate",
        }
    }
}

/// Common behavior of all handle types
pub trait NodeHandle: Copy + 'static {
    /// Type of the value stored/delivered by the node
    type Value: 'static;

    const KIND: NodeKind;

    fn from_id(id: NodeId) -> Self;

    fn id(&self) -> NodeId;

    fn value_type() -> TypeId {
        TypeId::of::<Self::Value>()
    }
}

/// Anything that can feed a pipeline or a subscription with `T` values
pub trait Source<T: 'static>: Copy {
    fn node_id(&self) -> NodeId;
}

/// Anything that accepts published `T` values.
///
/// Aggregates are deliberately not sinks: contributors only get `append`.
pub trait Sink<T: 'static>: Source<T> {}

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident, $kind:expr, $value:ty) => {
        $(#[$meta])*
        pub struct $name<T> {
            id: NodeId,
            _marker: PhantomData<fn() -> T>,
        }

        impl<T> Clone for $name<T> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<T> Copy for $name<T> {}

        impl<T> PartialEq for $name<T> {
            fn eq(&self, other: &Self) -> bool {
                self.id == other.id
            }
        }

        impl<T> Eq for $name<T> {}

        impl<T> fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.id)
            }
        }

        impl<T: 'static> NodeHandle for $name<T> {
            type Value = $value;
            const KIND: NodeKind = $kind;

            fn from_id(id: NodeId) -> Self {
                Self {
                    id,
                    _marker: PhantomData,
                }
            }

            fn id(&self) -> NodeId {
                self.id
            }
        }

        impl<T: 'static> Source<$value> for $name<T> {
            fn node_id(&self) -> NodeId {
                self.id
            }
        }
    };
}

handle!(
    /// A stateful node with a current value
    Cell,
    NodeKind::Cell,
    T
);

handle!(
    /// A transient event stream
    Signal,
    NodeKind::Signal,
    T
);

handle!(
    /// An append-only list shared by several contributors
    Aggregate,
    NodeKind::Aggregate,
    Vec<T>
);

impl<T: 'static> Sink<T> for Cell<T> {}
impl<T: 'static> Sink<T> for Signal<T> {}

/// A typed name under which a shared node is declared and later resolved
pub struct Key<N> {
    name: &'static str,
    required: bool,
    _marker: PhantomData<fn() -> N>,
}

impl<N> Key<N> {
    /// Key for a node that may be declared without an initial value
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            required: false,
            _marker: PhantomData,
        }
    }

    /// Key for a cell that must be seeded when declared
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            required: true,
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn is_required(&self) -> bool {
        self.required
    }
}

impl<N> Clone for Key<N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N> Copy for Key<N> {}

impl<N> fmt::Debug for Key<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("name", &self.name)
            .field("required", &self.required)
            .finish()
    }
}
