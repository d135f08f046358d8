//! Reversible prop mapping between the two trees.
//!
//! A visitor that renames props (`lang` → `language`) or injects its own
//! (`syntaxKind`) would clobber a syntax prop that already uses the target
//! name. [`PropMapping::lift`] moves such props aside under an escaped name and
//! [`PropMapping::lower`] restores them, so
//! `lower(lift(props)) == props` for every input.
//!
//! ```text
//! syntax            lift                  presentation
//! lang: "rs"    ─►  language: "rs"
//! language: "x" ─►  ~language: "x"
//! ~note: 1      ─►  ~~note: 1
//! ```

use std::collections::BTreeMap;

use serde_json::Value;

pub type Props = BTreeMap<String, Value>;

/// Marks a syntax prop moved aside to avoid a collision
pub const ESCAPE_PREFIX: char = '~';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropMapping {
    /// (syntax name, presentation name)
    renames: &'static [(&'static str, &'static str)],
    /// Presentation props the visitor sets itself
    injected: &'static [&'static str],
}

impl PropMapping {
    pub const fn new(
        renames: &'static [(&'static str, &'static str)],
        injected: &'static [&'static str],
    ) -> Self {
        Self { renames, injected }
    }

    fn is_reserved(&self, name: &str) -> bool {
        self.injected.iter().any(|injected| *injected == name)
            || self.renames.iter().any(|(_, to)| *to == name)
    }

    /// Syntax props to presentation props. Injected names are left free.
    pub fn lift(&self, props: &Props) -> Props {
        props
            .iter()
            .map(|(name, value)| {
                let name = match self.renames.iter().find(|(from, _)| *from == name.as_str()) {
                    Some((_, to)) => to.to_string(),
                    None if self.is_reserved(name) || name.starts_with(ESCAPE_PREFIX) => {
                        format!("{}{}", ESCAPE_PREFIX, name)
                    }
                    None => name.clone(),
                };
                (name, value.clone())
            })
            .collect()
    }

    /// Presentation props back to syntax props. Injected props are dropped;
    /// read them before lowering.
    pub fn lower(&self, props: &Props) -> Props {
        props
            .iter()
            .filter(|(name, _)| {
                !self.injected.iter().any(|injected| *injected == name.as_str())
            })
            .map(|(name, value)| {
                let name = match self.renames.iter().find(|(_, to)| *to == name.as_str()) {
                    Some((from, _)) => from.to_string(),
                    None => name
                        .strip_prefix(ESCAPE_PREFIX)
                        .map_or_else(|| name.clone(), str::to_string),
                };
                (name, value.clone())
            })
            .collect()
    }
}
