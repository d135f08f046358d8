use std::rc::Weak;

use crate::node::NodeId;
use crate::realm::RealmInner;

/// Disposer returned by [`Realm::subscribe`](crate::Realm::subscribe).
///
/// Dropping it does not unsubscribe; call [`Subscription::dispose`].
#[derive(Debug, Clone)]
pub struct Subscription {
    realm: Weak<RealmInner>,
    node: NodeId,
    id: u64,
}

impl Subscription {
    pub(crate) fn new(realm: Weak<RealmInner>, node: NodeId, id: u64) -> Self {
        Self { realm, node, id }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Stop future notifications. Idempotent; a no-op once the realm is gone.
    pub fn dispose(&self) {
        if let Some(inner) = self.realm.upgrade() {
            inner.graph.borrow_mut().remove_subscriber(self.node, self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Realm;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_dispose_is_idempotent() {
        let realm = Realm::new();
        let signal = realm.signal::<u8>();
        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        let subscription = realm
            .subscribe(signal, move |_, _: &u8| {
                counter.set(counter.get() + 1);
                Ok(())
            })
            .unwrap();

        realm.publish(signal, 1).unwrap();
        subscription.dispose();
        subscription.dispose();
        realm.publish(signal, 2).unwrap();

        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_dispose_after_realm_dropped() {
        let subscription = {
            let realm = Realm::new();
            let signal = realm.signal::<u8>();
            realm.subscribe(signal, |_, _: &u8| Ok(())).unwrap()
        };
        subscription.dispose();
    }
}
