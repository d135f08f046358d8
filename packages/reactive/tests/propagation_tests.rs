//! Propagation ordering and isolation guarantees

use markwright_reactive::{FailureStage, Realm, RealmError};
use std::cell::RefCell;
use std::rc::Rc;

type Log = Rc<RefCell<Vec<String>>>;

fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

#[test]
fn test_all_dependents_observe_before_publish_returns() {
    let realm = Realm::new();
    let source = realm.cell(0u32);
    let other = realm.empty_cell::<u32>();
    let seen = log();

    let direct = seen.clone();
    realm
        .subscribe(source, move |_, v: &u32| {
            direct.borrow_mut().push(format!("direct:{}", v));
            Ok(())
        })
        .unwrap();

    let mapped = realm.map(source, |v| v + 100).unwrap();
    let via_map = seen.clone();
    realm
        .subscribe(mapped, move |_, v: &u32| {
            via_map.borrow_mut().push(format!("map:{}", v));
            Ok(())
        })
        .unwrap();

    let combined = realm.combine(source, other).unwrap();
    let via_combine = seen.clone();
    realm
        .subscribe(combined, move |_, (a, b): &(u32, u32)| {
            via_combine.borrow_mut().push(format!("combine:{}+{}", a, b));
            Ok(())
        })
        .unwrap();

    // `other` has never been published: no partial combination
    realm.publish(source, 1).unwrap();
    let mut first: Vec<String> = seen.borrow().clone();
    first.sort();
    assert_eq!(first, vec!["direct:1", "map:101"]);

    seen.borrow_mut().clear();
    realm.publish(other, 5).unwrap();
    realm.publish(source, 2).unwrap();
    let all = seen.borrow().clone();
    assert!(all.contains(&"direct:2".to_string()));
    assert!(all.contains(&"map:102".to_string()));
    assert!(all.contains(&"combine:2+5".to_string()));
}

#[test]
fn test_reentrant_publish_runs_after_current_pass() {
    let realm = Realm::new();
    let first = realm.signal::<u8>();
    let second = realm.signal::<u8>();
    let seen = log();

    let trigger = seen.clone();
    realm
        .subscribe(first, move |realm, v: &u8| {
            trigger.borrow_mut().push("first:a".to_string());
            realm.publish(second, v + 1)?;
            trigger.borrow_mut().push("first:a-after-publish".to_string());
            Ok(())
        })
        .unwrap();

    let sibling = seen.clone();
    realm
        .subscribe(first, move |_, _: &u8| {
            sibling.borrow_mut().push("first:b".to_string());
            Ok(())
        })
        .unwrap();

    let downstream = seen.clone();
    realm
        .subscribe(second, move |_, v: &u8| {
            downstream.borrow_mut().push(format!("second:{}", v));
            Ok(())
        })
        .unwrap();

    realm.publish(first, 1).unwrap();
    assert_eq!(
        *seen.borrow(),
        vec!["first:a", "first:a-after-publish", "first:b", "second:2"]
    );
}

#[test]
fn test_queued_publishes_drain_fifo() {
    let realm = Realm::new();
    let start = realm.signal::<()>();
    let a = realm.signal::<u8>();
    let b = realm.signal::<u8>();
    let seen = log();

    realm
        .subscribe(start, move |realm, _: &()| {
            realm.publish(a, 1)?;
            realm.publish(b, 2)?;
            realm.publish(a, 3)?;
            Ok(())
        })
        .unwrap();

    for (signal, label) in [(a, "a"), (b, "b")] {
        let entries = seen.clone();
        realm
            .subscribe(signal, move |_, v: &u8| {
                entries.borrow_mut().push(format!("{}{}", label, v));
                Ok(())
            })
            .unwrap();
    }

    realm.publish(start, ()).unwrap();
    assert_eq!(*seen.borrow(), vec!["a1", "b2", "a3"]);
}

#[test]
fn test_diamond_evaluates_once_with_settled_inputs() {
    let realm = Realm::new();
    let root = realm.cell(1i32);
    let left = realm.map(root, |v| v * 10).unwrap();
    let right = realm.map(root, |v| v + 1).unwrap();
    let joined = realm.combine(left, right).unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let entries = seen.clone();
    realm
        .subscribe(joined, move |_, pair: &(i32, i32)| {
            entries.borrow_mut().push(*pair);
            Ok(())
        })
        .unwrap();

    realm.publish(root, 2).unwrap();
    assert_eq!(*seen.borrow(), vec![(20, 3)]);
}

#[test]
fn test_failing_subscriber_does_not_block_siblings() {
    let realm = Realm::new();
    let signal = realm.signal::<u8>();
    let seen = log();

    realm
        .subscribe(signal, |_, _: &u8| anyhow::bail!("renderer unavailable"))
        .unwrap();
    let sibling = seen.clone();
    realm
        .subscribe(signal, move |_, v: &u8| {
            sibling.borrow_mut().push(format!("ok:{}", v));
            Ok(())
        })
        .unwrap();

    let err = realm.publish(signal, 9).unwrap_err();
    match &err {
        RealmError::Propagation { failures } => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].stage, FailureStage::Subscriber);
            assert_eq!(failures[0].message, "renderer unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(*seen.borrow(), vec!["ok:9"]);

    // The next publish starts clean
    let again = realm.publish(signal, 10).unwrap_err();
    assert_eq!(again.failures().len(), 1);
    assert_eq!(seen.borrow().len(), 2);
}

#[test]
fn test_failure_in_queued_publish_surfaces_to_outer_caller() {
    let realm = Realm::new();
    let outer = realm.signal::<()>();
    let inner = realm.signal::<()>();

    realm
        .subscribe(outer, move |realm, _: &()| {
            // Queued: this call returns Ok, the failure lands on the outer publish
            realm.publish(inner, ())?;
            Ok(())
        })
        .unwrap();
    realm
        .subscribe(inner, |_, _: &()| anyhow::bail!("inner failed"))
        .unwrap();

    let err = realm.publish(outer, ()).unwrap_err();
    assert_eq!(err.failures().len(), 1);
    assert_eq!(err.failures()[0].message, "inner failed");
}

#[test]
fn test_append_from_subscribers_keeps_every_batch() {
    let realm = Realm::new();
    let registry = realm.aggregate::<&'static str>();
    let go = realm.signal::<()>();

    realm
        .subscribe(go, move |realm, _: &()| {
            realm.append(registry, ["first"])?;
            Ok(())
        })
        .unwrap();
    realm
        .subscribe(go, move |realm, _: &()| {
            realm.append(registry, ["second"])?;
            Ok(())
        })
        .unwrap();

    realm.publish(go, ()).unwrap();
    assert_eq!(realm.values(registry).unwrap(), vec!["first", "second"]);
}

#[test]
fn test_link_cycle_is_cut() {
    let realm = Realm::new();
    let a = realm.cell(0u8);
    let b = realm.cell(0u8);
    realm.link(a, b).unwrap();
    realm.link(b, a).unwrap();

    let count = Rc::new(std::cell::Cell::new(0));
    let counter = count.clone();
    realm
        .subscribe(b, move |_, _: &u8| {
            counter.set(counter.get() + 1);
            Ok(())
        })
        .unwrap();

    realm.publish(a, 4).unwrap();
    assert_eq!(realm.value(b).unwrap(), Some(4));
    assert_eq!(count.get(), 1);
}

#[test]
fn test_batch_delivers_every_signal_value() {
    let realm = Realm::new();
    let signal = realm.signal::<u8>();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let entries = seen.clone();
    realm
        .subscribe(signal, move |_, v: &u8| {
            entries.borrow_mut().push(*v);
            Ok(())
        })
        .unwrap();

    realm
        .batch()
        .publish(signal, 1)
        .unwrap()
        .publish(signal, 2)
        .unwrap()
        .commit()
        .unwrap();
    assert_eq!(*seen.borrow(), vec![1, 2]);
}

#[test]
fn test_fan_in_signal_delivers_each_link_result() {
    let realm = Realm::new();
    let source = realm.signal::<u8>();
    let target = realm.signal::<u8>();
    realm.link(realm.map(source, |v| v + 10).unwrap(), target).unwrap();
    realm.link(realm.map(source, |v| v + 20).unwrap(), target).unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let entries = seen.clone();
    realm
        .subscribe(target, move |_, v: &u8| {
            entries.borrow_mut().push(*v);
            Ok(())
        })
        .unwrap();

    realm.publish(source, 1).unwrap();
    assert_eq!(*seen.borrow(), vec![11, 21]);
}

#[test]
fn test_extra_signal_values_precede_publishes_queued_by_subscribers() {
    let realm = Realm::new();
    let signal = realm.signal::<u8>();
    let other = realm.signal::<u8>();
    let seen = log();

    let forward = seen.clone();
    realm
        .subscribe(signal, move |realm, v: &u8| {
            forward.borrow_mut().push(format!("signal:{}", v));
            realm.publish(other, *v)?;
            Ok(())
        })
        .unwrap();
    let entries = seen.clone();
    realm
        .subscribe(other, move |_, v: &u8| {
            entries.borrow_mut().push(format!("other:{}", v));
            Ok(())
        })
        .unwrap();

    realm
        .batch()
        .publish(signal, 1)
        .unwrap()
        .publish(signal, 2)
        .unwrap()
        .commit()
        .unwrap();
    assert_eq!(*seen.borrow(), vec!["signal:1", "signal:2", "other:1", "other:2"]);
}

#[test]
fn test_fan_in_cell_keeps_last_write() {
    let realm = Realm::new();
    let source = realm.signal::<u8>();
    let target = realm.cell(0u8);
    realm.link(realm.map(source, |v| v + 10).unwrap(), target).unwrap();
    realm.link(realm.map(source, |v| v + 20).unwrap(), target).unwrap();
    let count = Rc::new(std::cell::Cell::new(0));

    let counter = count.clone();
    realm
        .subscribe(target, move |_, _: &u8| {
            counter.set(counter.get() + 1);
            Ok(())
        })
        .unwrap();

    realm.publish(source, 1).unwrap();
    assert_eq!(realm.value(target).unwrap(), Some(21));
    assert_eq!(count.get(), 1);
}
