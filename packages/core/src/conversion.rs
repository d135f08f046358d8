//! # Conversion Registries
//!
//! Import (syntax → presentation) and export (presentation → syntax) share one
//! contract: a list of [`VisitorDescriptor`]s, contributed by plugins into an
//! aggregate node of the realm, sorted by priority and matched by kind tag.
//!
//! ```text
//! node ──► first descriptor (priority desc, registration order) whose
//!          claim covers node.kind and whose predicate accepts
//!      ──► convert(node, ctx) ── ctx.convert_children(node) ──► recurse
//! ```
//!
//! A plugin converts only its own kinds; children are dispatched back through
//! the registry via [`VisitContext::convert_children`].

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use markwright_reactive::{Aggregate, Key, Realm, RealmError};
use tracing::trace;

use crate::error::ConversionError;
use crate::priority::{sort_by_priority, Prioritized};
use crate::system::{EXPORT_VISITORS, IMPORT_VISITORS};
use crate::tree::{KeyGenerator, NodeKey, PresentationNode, SyntaxNode, TreeNode};

/// Priority of ordinary, kind-specific visitors
pub const DEFAULT_PRIORITY: i32 = 10;

/// Priority of catch-all visitors
pub const FALLBACK_PRIORITY: i32 = 0;

/// One side of the conversion pipeline
pub trait Direction: Sized + 'static {
    type Input: TreeNode + 'static;
    type Output: 'static;

    const NAME: &'static str;

    /// Aggregate node holding this direction's descriptors
    fn registry_key() -> Key<Aggregate<VisitorDescriptor<Self>>>;
}

/// Syntax tree → presentation tree
#[derive(Debug)]
pub enum Import {}

/// Presentation tree → syntax tree
#[derive(Debug)]
pub enum Export {}

impl Direction for Import {
    type Input = SyntaxNode;
    type Output = PresentationNode;

    const NAME: &'static str = "import";

    fn registry_key() -> Key<Aggregate<VisitorDescriptor<Self>>> {
        IMPORT_VISITORS
    }
}

impl Direction for Export {
    type Input = PresentationNode;
    type Output = SyntaxNode;

    const NAME: &'static str = "export";

    fn registry_key() -> Key<Aggregate<VisitorDescriptor<Self>>> {
        EXPORT_VISITORS
    }
}

/// Which kind tags a descriptor claims
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KindClaim {
    Kinds(Vec<String>),
    Any,
}

impl KindClaim {
    pub fn kind(kind: impl Into<String>) -> Self {
        KindClaim::Kinds(vec![kind.into()])
    }

    pub fn kinds<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        KindClaim::Kinds(kinds.into_iter().map(Into::into).collect())
    }

    pub fn covers(&self, kind: &str) -> bool {
        match self {
            KindClaim::Kinds(kinds) => kinds.iter().any(|k| k == kind),
            KindClaim::Any => true,
        }
    }

    /// A kind both claims cover, `*` when both are catch-alls
    pub fn overlap(&self, other: &KindClaim) -> Option<String> {
        match (self, other) {
            (KindClaim::Any, KindClaim::Any) => Some("*".to_string()),
            (KindClaim::Any, KindClaim::Kinds(kinds)) | (KindClaim::Kinds(kinds), KindClaim::Any) => {
                kinds.first().cloned()
            }
            (KindClaim::Kinds(ours), KindClaim::Kinds(theirs)) => {
                ours.iter().find(|k| theirs.contains(k)).cloned()
            }
        }
    }
}

type Predicate<D> = Rc<dyn Fn(&<D as Direction>::Input, &VisitContext<'_, D>) -> bool>;
type Convert<D> = Rc<
    dyn Fn(
        &<D as Direction>::Input,
        &mut VisitContext<'_, D>,
    ) -> Result<<D as Direction>::Output, ConversionError>,
>;

/// A priority-ranked conversion rule for one or more node kinds
pub struct VisitorDescriptor<D: Direction> {
    name: Cow<'static, str>,
    priority: i32,
    claim: KindClaim,
    predicate: Option<Predicate<D>>,
    convert: Convert<D>,
}

impl<D: Direction> VisitorDescriptor<D> {
    pub fn new<F>(name: impl Into<Cow<'static, str>>, claim: KindClaim, convert: F) -> Self
    where
        F: Fn(&D::Input, &mut VisitContext<'_, D>) -> Result<D::Output, ConversionError> + 'static,
    {
        Self {
            name: name.into(),
            priority: DEFAULT_PRIORITY,
            claim,
            predicate: None,
            convert: Rc::new(convert),
        }
    }

    /// Catch-all descriptor at [`FALLBACK_PRIORITY`]
    pub fn fallback<F>(name: impl Into<Cow<'static, str>>, convert: F) -> Self
    where
        F: Fn(&D::Input, &mut VisitContext<'_, D>) -> Result<D::Output, ConversionError> + 'static,
    {
        Self::new(name, KindClaim::Any, convert).with_priority(FALLBACK_PRIORITY)
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Narrow the claim with a predicate over the node and its context
    pub fn when<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&D::Input, &VisitContext<'_, D>) -> bool + 'static,
    {
        self.predicate = Some(Rc::new(predicate));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn claim(&self) -> &KindClaim {
        &self.claim
    }

    pub fn matches(&self, node: &D::Input, ctx: &VisitContext<'_, D>) -> bool {
        self.claim.covers(node.kind())
            && self
                .predicate
                .as_ref()
                .map_or(true, |predicate| predicate(node, ctx))
    }
}

impl<D: Direction> Clone for VisitorDescriptor<D> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            priority: self.priority,
            claim: self.claim.clone(),
            predicate: self.predicate.clone(),
            convert: self.convert.clone(),
        }
    }
}

impl<D: Direction> fmt::Debug for VisitorDescriptor<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisitorDescriptor")
            .field("direction", &D::NAME)
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("claim", &self.claim)
            .field("refined", &self.predicate.is_some())
            .finish()
    }
}

impl<D: Direction> Prioritized for VisitorDescriptor<D> {
    fn priority(&self) -> i32 {
        self.priority
    }
}

/// Append a descriptor to the registry of its direction
pub fn register_visitor<D: Direction>(
    realm: &Realm,
    descriptor: VisitorDescriptor<D>,
) -> Result<(), RealmError> {
    let registry = realm.resolve(D::registry_key())?;
    realm.append(registry, [descriptor])
}

/// State handed to visitors while a tree is converted
pub struct VisitContext<'a, D: Direction> {
    realm: &'a Realm,
    registry: &'a ConversionRegistry<D>,
    keys: &'a mut KeyGenerator,
    ancestors: Vec<String>,
    position: Option<(usize, usize)>,
}

impl<'a, D: Direction> VisitContext<'a, D> {
    /// The graph, for reading configuration cells
    pub fn realm(&self) -> &Realm {
        self.realm
    }

    /// Kinds of the enclosing nodes, outermost first
    pub fn ancestors(&self) -> &[String] {
        &self.ancestors
    }

    pub fn parent_kind(&self) -> Option<&str> {
        self.ancestors.last().map(String::as_str)
    }

    /// Index among siblings, `None` for the root
    pub fn sibling_index(&self) -> Option<usize> {
        self.position.map(|(index, _)| index)
    }

    pub fn sibling_count(&self) -> Option<usize> {
        self.position.map(|(_, count)| count)
    }

    pub fn next_key(&mut self) -> NodeKey {
        self.keys.next_key()
    }

    fn path(&self, kind: &str) -> String {
        let mut segments: Vec<&str> = self.ancestors.iter().map(String::as_str).collect();
        segments.push(kind);
        segments.join(" > ")
    }

    /// Dispatch a single node through the registry
    pub fn convert(&mut self, node: &D::Input) -> Result<D::Output, ConversionError> {
        let registry = self.registry;
        registry.dispatch(node, self)
    }

    /// Dispatch every child of `node` through the registry, in order
    pub fn convert_children(&mut self, node: &D::Input) -> Result<Vec<D::Output>, ConversionError> {
        let registry = self.registry;
        let children = node.children();
        let count = children.len();
        let saved = self.position.take();
        self.ancestors.push(node.kind().to_string());

        let mut converted = Vec::with_capacity(count);
        let mut outcome = Ok(());
        for (index, child) in children.iter().enumerate() {
            self.position = Some((index, count));
            match registry.dispatch(child, self) {
                Ok(output) => converted.push(output),
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            }
        }

        self.ancestors.pop();
        self.position = saved;
        outcome.map(|_| converted)
    }
}

/// Priority-sorted snapshot of one direction's descriptors
pub struct ConversionRegistry<D: Direction> {
    descriptors: Vec<VisitorDescriptor<D>>,
}

impl<D: Direction> ConversionRegistry<D> {
    pub fn new(mut descriptors: Vec<VisitorDescriptor<D>>) -> Self {
        sort_by_priority(&mut descriptors);
        Self { descriptors }
    }

    /// Current descriptors registered in `realm`
    pub fn snapshot(realm: &Realm) -> Result<Self, ConversionError> {
        let registry = realm.resolve(D::registry_key())?;
        Ok(Self::new(realm.values(registry)?))
    }

    /// Descriptors in selection order
    pub fn descriptors(&self) -> &[VisitorDescriptor<D>] {
        &self.descriptors
    }

    pub fn convert(
        &self,
        realm: &Realm,
        node: &D::Input,
        keys: &mut KeyGenerator,
    ) -> Result<D::Output, ConversionError> {
        let mut ctx = VisitContext {
            realm,
            registry: self,
            keys,
            ancestors: Vec::new(),
            position: None,
        };
        self.dispatch(node, &mut ctx)
    }

    /// Name of the descriptor that would convert `node` as a root
    pub fn selected_visitor(&self, realm: &Realm, node: &D::Input) -> Option<String> {
        let mut keys = KeyGenerator::new("selection");
        let ctx = VisitContext {
            realm,
            registry: self,
            keys: &mut keys,
            ancestors: Vec::new(),
            position: None,
        };
        self.select(node, &ctx).map(|d| d.name().to_string())
    }

    /// First pair of same-priority descriptors whose claims overlap
    pub fn ambiguity(&self) -> Option<(&VisitorDescriptor<D>, &VisitorDescriptor<D>, String)> {
        for (index, first) in self.descriptors.iter().enumerate() {
            for second in &self.descriptors[index + 1..] {
                if second.priority != first.priority {
                    break;
                }
                if let Some(kind) = first.claim.overlap(&second.claim) {
                    return Some((first, second, kind));
                }
            }
        }
        None
    }

    fn select(&self, node: &D::Input, ctx: &VisitContext<'_, D>) -> Option<&VisitorDescriptor<D>> {
        self.descriptors.iter().find(|descriptor| descriptor.matches(node, ctx))
    }

    fn dispatch(&self, node: &D::Input, ctx: &mut VisitContext<'_, D>) -> Result<D::Output, ConversionError> {
        let Some(descriptor) = self.select(node, ctx) else {
            return Err(ConversionError::NoMatchingVisitor {
                direction: D::NAME,
                kind: node.kind().to_string(),
                path: ctx.path(node.kind()),
            });
        };
        trace!(
            direction = D::NAME,
            kind = node.kind(),
            visitor = %descriptor.name,
            "Dispatching node"
        );
        (descriptor.convert)(node, ctx)
    }
}

impl<D: Direction> fmt::Debug for ConversionRegistry<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionRegistry")
            .field("direction", &D::NAME)
            .field("descriptors", &self.descriptors)
            .finish()
    }
}
