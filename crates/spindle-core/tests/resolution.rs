//! Integration tests for resolution, qualifier routing, and constructor selection.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use spindle_core::{
    AmbiguitySource, Component, Constructor, Dependency, Field, Inject, InjectError, Injector, Qualifier, implements,
};

// ── Fixtures ──

trait Store: Send + Sync {
    fn kind(&self) -> &'static str;
}

#[derive(Debug)]
struct Disk;

#[derive(Debug)]
struct Memory;

impl Store for Disk {
    fn kind(&self) -> &'static str {
        "disk"
    }
}

impl Store for Memory {
    fn kind(&self) -> &'static str {
        "memory"
    }
}

impl Component for Disk {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new(|_| Ok(Self))]
    }

    fn qualifiers() -> Vec<Qualifier> {
        vec![Qualifier::named("disk")]
    }
}

impl Component for Memory {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new(|_| Ok(Self))]
    }

    fn qualifiers() -> Vec<Qualifier> {
        vec![Qualifier::named("memory")]
    }

    fn singleton() -> bool {
        true
    }
}

implements!(Disk => dyn Store);
implements!(Memory => dyn Store);

#[derive(Debug)]
struct Untagged;

impl Store for Untagged {
    fn kind(&self) -> &'static str {
        "untagged"
    }
}

impl Component for Untagged {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new(|_| Ok(Self))]
    }
}

implements!(Untagged => dyn Store);

#[derive(Debug, Default)]
struct MemoryUser {
    store: Inject<dyn Store>,
}

impl Component for MemoryUser {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new(|_| Ok(Self::default()))]
    }

    fn fields() -> Vec<Field<Self>> {
        vec![Field::<Self>::contract::<dyn Store>("store", |u| &u.store).qualified(Qualifier::named("memory"))]
    }
}

#[derive(Debug, Default)]
struct TwoTags {
    store: Inject<dyn Store>,
}

impl Component for TwoTags {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new(|_| Ok(Self::default()))]
    }

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::<Self>::contract::<dyn Store>("store", |u| &u.store)
                .qualified(Qualifier::named("disk"))
                .qualified(Qualifier::named("memory")),
        ]
    }
}

#[derive(Debug, Default)]
struct AnyStore {
    store: Inject<dyn Store>,
}

impl Component for AnyStore {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new(|_| Ok(Self::default()))]
    }

    fn fields() -> Vec<Field<Self>> {
        vec![Field::<Self>::contract::<dyn Store>("store", |u| &u.store)]
    }
}

#[derive(Debug)]
struct Shared;

impl Component for Shared {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new(|_| Ok(Self))]
    }

    fn singleton() -> bool {
        true
    }
}

#[derive(Debug)]
struct Fresh;

impl Component for Fresh {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new(|_| Ok(Self))]
    }
}

#[derive(Debug)]
struct NeedsArgs;

impl Component for NeedsArgs {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![
            Constructor::new(|_| Ok(Self)).param(Dependency::component::<Fresh>("fresh")),
            Constructor::new(|_| Ok(Self)).private(),
        ]
    }
}

#[derive(Debug)]
struct TwoDefaults;

impl Component for TwoDefaults {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new(|_| Ok(Self)), Constructor::new(|_| Ok(Self))]
    }
}

#[derive(Debug)]
struct Exploding;

impl Component for Exploding {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new(|_| Err("boom".into()))]
    }
}

#[derive(Debug)]
struct Greedy;

impl Component for Greedy {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new(|args| {
            let _ = args.take::<Fresh>()?;
            Ok(Self)
        })]
    }
}

#[derive(Debug, Default)]
struct SelfAware {
    injector: Inject<Injector>,
}

impl Component for SelfAware {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new(|_| Ok(Self::default()))]
    }

    fn fields() -> Vec<Field<Self>> {
        vec![Field::<Self>::contract::<Injector>("injector", |s| &s.injector)]
    }
}

#[derive(Debug, Default)]
struct Endless {
    next: Inject<Endless>,
}

impl Component for Endless {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new(|_| Ok(Self::default()))]
    }

    fn fields() -> Vec<Field<Self>> {
        vec![Field::<Self>::component::<Endless>("next", |e| &e.next)]
    }
}

#[derive(Debug, Default)]
struct Journal {
    entries: Mutex<Vec<&'static str>>,
}

impl Journal {
    fn record(&self, entry: &'static str) {
        self.entries.lock().unwrap().push(entry);
    }

    fn entries(&self) -> Vec<&'static str> {
        self.entries.lock().unwrap().clone()
    }
}

impl Component for Journal {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new(|_| Ok(Self::default()))]
    }

    fn singleton() -> bool {
        true
    }
}

macro_rules! journaled {
    ($name:ident, $entry:literal) => {
        #[derive(Debug)]
        struct $name;

        impl Component for $name {
            fn constructors() -> Vec<Constructor<Self>> {
                vec![
                    Constructor::new(|args| {
                        args.take::<Journal>()?.record($entry);
                        Ok(Self)
                    })
                    .inject()
                    .param(Dependency::component::<Journal>("journal")),
                ]
            }
        }
    };
}

journaled!(First, "first");
journaled!(Second, "second");
journaled!(Third, "third");

#[derive(Debug, Default)]
struct Ordered {
    third: Inject<Third>,
}

impl Component for Ordered {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![
            Constructor::new(|args| {
                let _ = args.take::<First>()?;
                let _ = args.take::<Second>()?;
                Ok(Self::default())
            })
            .inject()
            .param(Dependency::component::<First>("first"))
            .param(Dependency::component::<Second>("second")),
        ]
    }

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::<Self>::component::<Third>("third", |o| &o.third),
            Field::<Self>::component::<Third>("ignored", |o| &o.third).unmarked(),
        ]
    }
}

#[derive(Debug)]
struct Tally {
    built: AtomicUsize,
}

impl Component for Tally {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new(|_| {
            Ok(Self {
                built: AtomicUsize::new(0),
            })
        })]
    }
}

fn store_injector() -> Arc<Injector> {
    let injector = Injector::new();
    let _ = injector
        .register_binding::<dyn Store, Disk>()
        .expect("bind disk")
        .register_binding::<dyn Store, Memory>()
        .expect("bind memory");
    injector
}

// ── Singleton and fresh instances ──

#[test]
fn singleton_identity_is_stable() {
    let injector = Injector::new();
    let a = injector.get_instance::<Shared>().expect("first");
    let b = injector.get_instance::<Shared>().expect("second");
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn non_singleton_is_fresh_each_time() {
    let injector = Injector::new();
    let a = injector.get_instance::<Fresh>().expect("first");
    let b = injector.get_instance::<Fresh>().expect("second");
    assert!(!Arc::ptr_eq(&a, &b));
}

#[test]
fn singleton_class_registration_makes_type_shared() {
    let injector = Injector::new();
    let _ = injector.register_singleton_class::<Fresh>().expect("mark");
    let a = injector.get_instance::<Fresh>().expect("first");
    let b = injector.get_instance::<Fresh>().expect("second");
    assert!(Arc::ptr_eq(&a, &b));
    assert!(injector.register_singleton_class::<Fresh>().is_err());
}

#[test]
fn separate_injectors_do_not_share_singletons() {
    let one = Injector::new();
    let two = Injector::new();
    let a = one.get_instance::<Shared>().expect("one");
    let b = two.get_instance::<Shared>().expect("two");
    assert!(!Arc::ptr_eq(&a, &b));
    assert_ne!(one.id(), two.id());
}

#[test]
fn registered_singleton_is_returned_as_is() {
    let injector = Injector::new();
    let tally = Arc::new(Tally {
        built: AtomicUsize::new(41),
    });
    let _ = injector.register_singleton(Arc::clone(&tally)).expect("register");
    let got = injector.get_instance::<Tally>().expect("resolve");
    assert!(Arc::ptr_eq(&tally, &got));
    assert_eq!(got.built.fetch_add(1, Ordering::SeqCst), 41);

    let err = injector.register_singleton(Arc::new(Tally {
        built: AtomicUsize::new(0),
    }));
    assert!(matches!(err, Err(InjectError::DuplicateSingleton { .. })));
}

// ── Qualifiers ──

#[test]
fn qualifier_selects_the_tagged_binding() {
    let injector = store_injector();
    let user = injector.get_instance::<MemoryUser>().expect("resolve");
    let store = user.store.get().expect("store injected");
    assert_eq!(store.kind(), "memory");
}

#[test]
fn qualified_round_trip_returns_registered_type() {
    let injector = store_injector();
    let disk = injector
        .get_qualified::<dyn Store>(Qualifier::named("disk"))
        .expect("disk");
    assert_eq!(disk.kind(), "disk");
}

#[test]
fn qualified_singleton_is_registered_as_qualified_instance() {
    let injector = store_injector();
    let first = injector
        .get_qualified::<dyn Store>(Qualifier::named("memory"))
        .expect("first");
    assert_eq!(injector.cache().qualified_count(), 1);
    let second = injector
        .get_qualified::<dyn Store>(Qualifier::named("memory"))
        .expect("second");
    assert!(Arc::ptr_eq(&first, &second));

    let concrete = injector.get_instance::<Memory>().expect("concrete");
    let concrete: Arc<dyn Store> = concrete;
    assert!(Arc::ptr_eq(&first, &concrete));
}

#[test]
fn qualified_slot_short_circuits_non_singleton_binding() {
    let injector = store_injector();
    let first = injector
        .get_qualified::<dyn Store>(Qualifier::named("disk"))
        .expect("first");
    let second = injector
        .get_qualified::<dyn Store>(Qualifier::named("disk"))
        .expect("second");
    assert!(Arc::ptr_eq(&first, &second));

    let unqualified: Arc<dyn Store> = injector.get_instance::<Disk>().expect("disk");
    assert!(!Arc::ptr_eq(&first, &unqualified));
    assert_eq!(unqualified.kind(), "disk");
}

#[test]
fn two_tags_resolving_to_distinct_bindings_are_ambiguous() {
    let injector = store_injector();
    let err = injector.get_instance::<TwoTags>().unwrap_err();
    assert!(
        matches!(
            err,
            InjectError::AmbiguousQualifier {
                source_kind: AmbiguitySource::Bindings,
                point: "store",
                ..
            }
        ),
        "got: {err}"
    );
}

#[test]
fn two_tags_resolving_to_distinct_instances_are_ambiguous() {
    let injector = Injector::new();
    let _ = injector
        .register_qualified_instance::<dyn Store>(Qualifier::named("disk"), Arc::new(Disk))
        .expect("disk")
        .register_qualified_instance::<dyn Store>(Qualifier::named("memory"), Arc::new(Memory))
        .expect("memory");
    let err = injector.get_instance::<TwoTags>().unwrap_err();
    assert!(
        matches!(
            err,
            InjectError::AmbiguousQualifier {
                source_kind: AmbiguitySource::Instances,
                ..
            }
        ),
        "got: {err}"
    );
}

#[test]
fn two_tags_on_the_same_instance_are_not_ambiguous() {
    let injector = Injector::new();
    let shared: Arc<dyn Store> = Arc::new(Disk);
    let _ = injector
        .register_qualified_instance(Qualifier::named("disk"), Arc::clone(&shared))
        .expect("disk")
        .register_qualified_instance(Qualifier::named("memory"), Arc::clone(&shared))
        .expect("memory");
    let holder = injector.get_instance::<TwoTags>().expect("resolve");
    assert!(Arc::ptr_eq(holder.store.get().expect("injected"), &shared));
}

#[test]
fn qualified_instance_wins_over_binding() {
    let injector = store_injector();
    let pinned: Arc<dyn Store> = Arc::new(Disk);
    let _ = injector
        .register_qualified_instance(Qualifier::named("memory"), Arc::clone(&pinned))
        .expect("pin");
    let user = injector.get_instance::<MemoryUser>().expect("resolve");
    assert!(Arc::ptr_eq(user.store.get().expect("injected"), &pinned));
}

#[test]
fn duplicate_registrations_are_rejected() {
    let injector = store_injector();
    let err = injector.register_binding::<dyn Store, Disk>().unwrap_err();
    assert!(matches!(err, InjectError::DuplicateBinding { .. }));

    let _ = injector
        .register_qualified_instance::<dyn Store>(Qualifier::named("x"), Arc::new(Disk))
        .expect("first");
    let err = injector
        .register_qualified_instance::<dyn Store>(Qualifier::named("x"), Arc::new(Memory))
        .unwrap_err();
    assert!(matches!(err, InjectError::DuplicateQualifiedInstance { .. }));
}

#[test]
fn binding_without_qualifier_needs_explicit_tag() {
    let injector = Injector::new();
    let err = injector.register_binding::<dyn Store, Untagged>().unwrap_err();
    assert!(matches!(err, InjectError::MissingQualifier { .. }));

    let _ = injector
        .register_qualified_binding::<dyn Store, Untagged>(Qualifier::named("plain"))
        .expect("explicit tag");
    let store = injector
        .get_qualified::<dyn Store>(Qualifier::named("plain"))
        .expect("resolve");
    assert_eq!(store.kind(), "untagged");
}

#[test]
fn unqualified_contract_uses_cached_instance_only() {
    let injector = store_injector();
    let err = injector.get_instance::<AnyStore>().unwrap_err();
    assert!(matches!(err, InjectError::NoEligibleConstructor { .. }), "got: {err}");

    let fallback: Arc<dyn Store> = Arc::new(Memory);
    let _ = injector.register_singleton(Arc::clone(&fallback)).expect("register");
    let holder = injector.get_instance::<AnyStore>().expect("resolve");
    assert!(Arc::ptr_eq(holder.store.get().expect("injected"), &fallback));
}

// ── Constructors ──

#[test]
fn parameterised_unmarked_constructor_is_not_eligible() {
    let injector = Injector::new();
    let err = injector.get_instance::<NeedsArgs>().unwrap_err();
    assert!(matches!(err, InjectError::NoEligibleConstructor { .. }), "got: {err}");
}

#[test]
fn several_eligible_constructors_are_ambiguous() {
    let injector = Injector::new();
    let err = injector.get_instance::<TwoDefaults>().unwrap_err();
    assert!(matches!(err, InjectError::AmbiguousConstructor { count: 2, .. }));
}

#[test]
fn constructor_error_is_wrapped() {
    let injector = Injector::new();
    let err = injector.get_instance::<Exploding>().unwrap_err();
    assert!(matches!(err, InjectError::ConstructionFailed { .. }));
    assert!(err.to_string().contains("boom"), "got: {err}");
}

#[test]
fn reading_an_undeclared_parameter_is_a_missing_dependency() {
    let injector = Injector::new();
    let err = injector.get_instance::<Greedy>().unwrap_err();
    assert!(matches!(err, InjectError::MissingDependency { .. }), "got: {err}");
}

#[test]
fn parameters_then_fields_resolve_in_declaration_order() {
    let injector = Injector::new();
    let ordered = injector.get_instance::<Ordered>().expect("resolve");
    assert!(ordered.third.is_injected());
    let journal = injector.get_instance::<Journal>().expect("journal");
    assert_eq!(journal.entries(), vec!["first", "second", "third"]);
}

// ── Injector as a dependency, member injection, depth limit ──

#[test]
fn injector_injects_itself() {
    let injector = Injector::new();
    let aware = injector.get_instance::<SelfAware>().expect("resolve");
    assert!(Arc::ptr_eq(aware.injector.get().expect("injected"), &injector));
    assert!(injector.register_singleton(Arc::clone(&injector)).is_err());
}

#[test]
fn cached_lookup_returns_contract_singletons_and_the_injector() {
    let injector = Injector::new();
    assert!(matches!(
        injector.get_cached::<dyn Store>(),
        Err(InjectError::NoEligibleConstructor { .. })
    ));

    let store: Arc<dyn Store> = Arc::new(Memory);
    let _ = injector
        .register_singleton::<dyn Store>(Arc::clone(&store))
        .expect("register");
    let got = injector.get_cached::<dyn Store>().expect("cached store");
    assert!(Arc::ptr_eq(&got, &store));

    let this = injector.get_cached::<Injector>().expect("self");
    assert!(Arc::ptr_eq(&this, &injector));
    assert!(injector.get_cached::<Fresh>().is_err());
}

#[test]
fn inject_members_populates_caller_owned_instance() {
    let injector = store_injector();
    let user = MemoryUser::default();
    injector.inject_members(&user).expect("inject");
    assert_eq!(user.store.get().expect("injected").kind(), "memory");
}

#[test]
fn depth_limit_turns_runaway_recursion_into_error() {
    let injector = Injector::builder().max_depth(16).build().expect("build");
    let err = injector.get_instance::<Endless>().unwrap_err();
    assert!(matches!(err, InjectError::DepthExceeded { limit: 16, .. }), "got: {err}");
}

// ── Concurrency ──

#[test]
fn concurrent_first_requests_share_one_singleton() {
    let injector = Injector::new();
    let instances: Vec<Arc<Shared>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| injector.get_instance::<Shared>().expect("resolve")))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    let first = &instances[0];
    assert!(instances.iter().all(|i| Arc::ptr_eq(i, first)));
}
