//! The worked example object graph.
//!
//! ```text
//! Root ──@a──> NodeA ──leaf──> Leaf ──root──> Root
//!   │            └──@b──> NodeB
//!   └──@b──> NodeB ──leaf(ctor)──> Leaf ──root──> Root
//!                └──@a──> NodeA
//! ```
//!
//! `Root`, `NodeA`, and `NodeB` are singletons; every `Leaf` is fresh and
//! takes the next index from the per-injector [`Sequence`].

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use spindle_core::{Component, Constructor, Dependency, Field, Inject, Injector, Qualifier, implements};

/// Contract implemented by both graph nodes.
pub trait Node: Send + Sync {
    /// Rendered name, reflecting whether the peer node was injected.
    fn name(&self) -> String;
}

/// Zero-based counter shared by every leaf built by one injector.
#[derive(Debug, Default)]
pub struct Sequence {
    next: AtomicUsize,
}

impl Sequence {
    /// Returns the next index.
    pub fn next_index(&self) -> usize {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}

impl Component for Sequence {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new(|_| Ok(Self::default()))]
    }

    fn singleton() -> bool {
        true
    }
}

/// Singleton root holding both nodes.
#[derive(Debug, Default)]
pub struct Root {
    /// Node tagged `a`.
    pub a: Inject<dyn Node>,
    /// Node tagged `b`.
    pub b: Inject<dyn Node>,
}

impl Component for Root {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new(|_| Ok(Self::default()))]
    }

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::<Self>::contract::<dyn Node>("a", |r| &r.a).qualified(Qualifier::named("a")),
            Field::<Self>::contract::<dyn Node>("b", |r| &r.b).qualified(Qualifier::named("b")),
        ]
    }

    fn singleton() -> bool {
        true
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "root({}, {})", node_name(&self.a), node_name(&self.b))
    }
}

fn node_name(slot: &Inject<dyn Node>) -> String {
    slot.get().map_or_else(|| "none".to_string(), |node| node.name())
}

fn leaf_name(slot: &Inject<Leaf>) -> String {
    slot.get().map_or_else(|| "none".to_string(), ToString::to_string)
}

/// Node tagged `a`: field-injects its leaf and the `b` node.
#[derive(Debug, Default)]
pub struct NodeA {
    /// Fresh leaf.
    pub leaf: Inject<Leaf>,
    /// Peer node tagged `b`.
    pub b: Inject<dyn Node>,
}

impl Node for NodeA {
    fn name(&self) -> String {
        if self.b.is_injected() {
            format!("nodeAWithB({})", leaf_name(&self.leaf))
        } else {
            format!("nodeA({})", leaf_name(&self.leaf))
        }
    }
}

impl Component for NodeA {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new(|_| Ok(Self::default()))]
    }

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::<Self>::component::<Leaf>("leaf", |n| &n.leaf),
            Field::<Self>::contract::<dyn Node>("b", |n| &n.b).qualified(Qualifier::named("b")),
        ]
    }

    fn qualifiers() -> Vec<Qualifier> {
        vec![Qualifier::named("a")]
    }

    fn singleton() -> bool {
        true
    }
}

/// Node tagged `b`: constructor-injects its leaf, field-injects the `a` node.
#[derive(Debug)]
pub struct NodeB {
    /// Leaf received through the constructor.
    pub leaf: Arc<Leaf>,
    /// Peer node tagged `a`.
    pub a: Inject<dyn Node>,
}

impl NodeB {
    /// Creates the node around its leaf.
    #[must_use]
    pub fn new(leaf: Arc<Leaf>) -> Self {
        Self {
            leaf,
            a: Inject::new(),
        }
    }
}

impl Node for NodeB {
    fn name(&self) -> String {
        if self.a.is_injected() {
            format!("nodeBWithA({})", self.leaf)
        } else {
            format!("nodeB({})", self.leaf)
        }
    }
}

impl Component for NodeB {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![
            Constructor::new(|args| Ok(Self::new(args.take::<Leaf>()?)))
                .inject()
                .param(Dependency::component::<Leaf>("leaf")),
        ]
    }

    fn fields() -> Vec<Field<Self>> {
        vec![Field::<Self>::contract::<dyn Node>("a", |n| &n.a).qualified(Qualifier::named("a"))]
    }

    fn qualifiers() -> Vec<Qualifier> {
        vec![Qualifier::named("b")]
    }

    fn singleton() -> bool {
        true
    }
}

implements!(NodeA => dyn Node);
implements!(NodeB => dyn Node);

/// Fresh per request; points back at the root.
#[derive(Debug)]
pub struct Leaf {
    /// Back-reference to the root singleton.
    pub root: Inject<Root>,
    /// Position in construction order.
    pub index: usize,
}

impl Component for Leaf {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![
            Constructor::new(|args| {
                let index = args.take::<Sequence>()?.next_index();
                Ok(Self {
                    root: Inject::new(),
                    index,
                })
            })
            .inject()
            .param(Dependency::component::<Sequence>("sequence")),
        ]
    }

    fn fields() -> Vec<Field<Self>> {
        vec![Field::<Self>::component::<Root>("root", |l| &l.root)]
    }
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.root.is_injected() {
            write!(f, "leafwithroot{}", self.index)
        } else {
            write!(f, "leaf{}", self.index)
        }
    }
}

/// Registers both nodes under their own qualifier tags.
///
/// # Errors
///
/// Returns an error if either binding slot is already taken.
pub fn register(injector: &Injector) -> spindle_core::Result<()> {
    let _ = injector
        .register_binding::<dyn Node, NodeA>()?
        .register_binding::<dyn Node, NodeB>()?;
    Ok(())
}
