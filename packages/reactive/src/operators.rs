//! # Pipeline Operators
//!
//! Every operator declares a derived signal and a link that computes it.
//! Stages are pure; side effects belong in subscriptions.
//!
//! | operator           | fires when            | reads                          |
//! |--------------------|-----------------------|--------------------------------|
//! | `map`/`filter`     | source fires          | source                         |
//! | `with_latest_from` | source fires          | source + latest of `aux`       |
//! | `combine`          | either input fires    | latest of both                 |
//!
//! Inputs without a value (an empty cell, a signal that did not fire) suppress
//! the stage entirely. There are no partial results.

use std::any::type_name;
use std::rc::Rc;

use anyhow::anyhow;
use tracing::debug;

use crate::error::RealmError;
use crate::node::{Signal, Sink, Source};
use crate::realm::{LinkId, Operator, Realm, Value};

fn input<T: 'static>(inputs: &[Value], index: usize) -> anyhow::Result<&T> {
    inputs
        .get(index)
        .and_then(|value| value.downcast_ref::<T>())
        .ok_or_else(|| anyhow!("pipeline input {} is not a {}", index, type_name::<T>()))
}

impl Realm {
    pub fn map<T, U, S, F>(&self, source: S, f: F) -> Result<Signal<U>, RealmError>
    where
        T: 'static,
        U: 'static,
        S: Source<T>,
        F: Fn(&T) -> U + 'static,
    {
        self.try_map(source, move |value| Ok(f(value)))
    }

    /// Like `map`, but a failing stage is isolated and reported
    pub fn try_map<T, U, S, F>(&self, source: S, f: F) -> Result<Signal<U>, RealmError>
    where
        T: 'static,
        U: 'static,
        S: Source<T>,
        F: Fn(&T) -> anyhow::Result<U> + 'static,
    {
        self.filter_map_inner("map", source, move |value| f(value).map(Some))
    }

    pub fn filter<T, S, F>(&self, source: S, predicate: F) -> Result<Signal<T>, RealmError>
    where
        T: 'static,
        S: Source<T>,
        F: Fn(&T) -> bool + 'static,
    {
        let from = source.node_id();
        self.check_type::<T>(from)?;
        let sink = self.derived::<T>("filter", &[from])?;
        // Passes the original payload through untouched
        let operator: Operator = Rc::new(move |inputs: &[Value]| {
            let value = input::<T>(inputs, 0)?;
            Ok(predicate(value).then(|| inputs[0].clone()))
        });
        self.connect(vec![from], vec![], sink.node_id(), operator)?;
        Ok(sink)
    }

    pub fn filter_map<T, U, S, F>(&self, source: S, f: F) -> Result<Signal<U>, RealmError>
    where
        T: 'static,
        U: 'static,
        S: Source<T>,
        F: Fn(&T) -> Option<U> + 'static,
    {
        self.filter_map_inner("filter_map", source, move |value| Ok(f(value)))
    }

    fn filter_map_inner<T, U, S, F>(&self, stage: &str, source: S, f: F) -> Result<Signal<U>, RealmError>
    where
        T: 'static,
        U: 'static,
        S: Source<T>,
        F: Fn(&T) -> anyhow::Result<Option<U>> + 'static,
    {
        let from = source.node_id();
        self.check_type::<T>(from)?;
        let sink = self.derived::<U>(stage, &[from])?;
        let operator: Operator = Rc::new(move |inputs: &[Value]| {
            let value = input::<T>(inputs, 0)?;
            Ok(f(value)?.map(|out| Rc::new(out) as Value))
        });
        self.connect(vec![from], vec![], sink.node_id(), operator)?;
        Ok(sink)
    }

    /// Pair each value of `source` with the latest value of `aux`.
    ///
    /// `aux` never triggers the stage; if it has no value yet, nothing fires.
    pub fn with_latest_from<T, U, S, A>(&self, source: S, aux: A) -> Result<Signal<(T, U)>, RealmError>
    where
        T: Clone + 'static,
        U: Clone + 'static,
        S: Source<T>,
        A: Source<U>,
    {
        let (from, pull) = (source.node_id(), aux.node_id());
        self.check_type::<T>(from)?;
        self.check_type::<U>(pull)?;
        let sink = self.derived::<(T, U)>("with_latest_from", &[from, pull])?;
        let operator: Operator = Rc::new(|inputs: &[Value]| {
            let pair = (input::<T>(inputs, 0)?.clone(), input::<U>(inputs, 1)?.clone());
            Ok(Some(Rc::new(pair) as Value))
        });
        self.connect(vec![from], vec![pull], sink.node_id(), operator)?;
        Ok(sink)
    }

    /// Latest values of `a` and `b`, whenever either fires and both have one
    pub fn combine<A, B, SA, SB>(&self, a: SA, b: SB) -> Result<Signal<(A, B)>, RealmError>
    where
        A: Clone + 'static,
        B: Clone + 'static,
        SA: Source<A>,
        SB: Source<B>,
    {
        let (left, right) = (a.node_id(), b.node_id());
        self.check_type::<A>(left)?;
        self.check_type::<B>(right)?;
        let sink = self.derived::<(A, B)>("combine", &[left, right])?;
        let operator: Operator = Rc::new(|inputs: &[Value]| {
            let pair = (input::<A>(inputs, 0)?.clone(), input::<B>(inputs, 1)?.clone());
            Ok(Some(Rc::new(pair) as Value))
        });
        self.connect(vec![left, right], vec![], sink.node_id(), operator)?;
        Ok(sink)
    }

    /// Forward every value of `source` into `target`.
    ///
    /// Linking the same pair twice returns the first link; nothing is delivered twice.
    pub fn link<T, S, D>(&self, source: S, target: D) -> Result<LinkId, RealmError>
    where
        T: 'static,
        S: Source<T>,
        D: Sink<T>,
    {
        let (from, to) = (source.node_id(), target.node_id());
        self.check_type::<T>(from)?;
        self.check_type::<T>(to)?;

        if let Some(existing) = self.existing_link(from, to) {
            debug!(from = %from, to = %to, "Link already registered");
            return Ok(existing);
        }

        let operator: Operator = Rc::new(|inputs: &[Value]| Ok(inputs.first().cloned()));
        let link = self.connect(vec![from], vec![], to, operator)?;
        self.remember_link(from, to, link);
        Ok(link)
    }
}
