use std::{
    cell::RefCell,
    collections::{BTreeSet, HashMap},
    fmt::Debug,
    rc::{Rc, Weak},
    sync::Arc,
};

use strata_promise::prelude::*;

use crate::{
    bean::{Bean, InjectOptions},
    config::RegistryConfig,
    errors::InjectError,
    factories::{BeanPromise, Definition, InstanceFactory, Produced},
    resolver::Resolver,
    token::{Qualifier, Qualifiers, Token},
    types::Instance,
};

/// A binding after evaluation
#[derive(Clone)]
enum Provision {
    Ready(Instance),
    /// Only kept under lazy validation, injecting it fails
    Empty,
    /// Already checked for emptiness once it settles
    Deferred(BeanPromise<Instance>),
    /// A lazily run factory which failed - kept so it isn't retried
    Failed(InjectError),
}

/// A factory together with where and how it was provided
struct Factory {
    producer: Rc<dyn InstanceFactory>,
    qualifiers: Vec<Arc<str>>,
    /// The registry the binding was provided on
    owner: Weak<RegistryInner>,
    /// First result, shared by every registry resolving this binding
    evaluated: RefCell<Option<Provision>>,
}

impl Factory {
    fn evaluated(&self) -> Option<Provision> {
        self.evaluated.borrow().clone()
    }
}

type Table<V> = HashMap<Token, HashMap<Qualifier, V>>;

/// A node in a tree of registries.
///
/// Bindings of the node itself always win, parents are only asked for tokens the node
/// knows nothing about - the most recently added parent first.
/// The handle is cheap to clone, clones refer to the same node.
#[derive(Clone)]
pub struct Registry(Rc<RegistryInner>);
struct RegistryInner {
    config: RegistryConfig,
    parents: Vec<Registry>,
    /// Literal values and constructed defaults
    values: RefCell<Table<Provision>>,
    factories: RefCell<Table<Rc<Factory>>>,
}

impl Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let values = self.0.values.borrow();
        let factories = self.0.factories.borrow();

        let mut map = f.debug_struct("Registry");
        map.field("config", &self.0.config)
            .field("parents", &self.0.parents.len());
        for (token, qualifiers) in factories.iter() {
            for (qualifier, factory) in qualifiers {
                let state = match factory.evaluated.borrow().is_some() {
                    true => "evaluated",
                    false => "pending",
                };
                map.field(&format!("{token}#{qualifier}"), &state);
            }
        }
        for (token, qualifiers) in values.iter() {
            for qualifier in qualifiers.keys() {
                map.field(&format!("{token}#{qualifier}"), &"value");
            }
        }
        map.finish()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self::create(config, Vec::new())
    }

    /// A registry inheriting from `parents`, later parents take precedence over earlier ones
    pub fn with_parents(parents: impl IntoIterator<Item = Registry>) -> Self {
        Self::with_config_and_parents(RegistryConfig::default(), parents)
    }

    /// A configured registry inheriting from `parents`.
    ///
    /// The configuration only applies to bindings provided on this registry,
    /// inherited ones keep the configuration of the registry they were provided on.
    pub fn with_config_and_parents(
        config: RegistryConfig,
        parents: impl IntoIterator<Item = Registry>,
    ) -> Self {
        Self::create(config, parents.into_iter().collect())
    }

    /// A registry inheriting from this one
    pub fn child(&self) -> Self {
        Self::with_parents([self.clone()])
    }

    fn create(config: RegistryConfig, parents: Vec<Registry>) -> Self {
        Registry(Rc::new(RegistryInner {
            config,
            parents,
            values: RefCell::new(HashMap::new()),
            factories: RefCell::new(HashMap::new()),
        }))
    }

    pub fn config(&self) -> RegistryConfig {
        self.0.config
    }

    pub fn parents(&self) -> &[Registry] {
        &self.0.parents
    }

    /// True if both handles refer to the same node
    pub fn same(a: &Registry, b: &Registry) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

// Providing
impl Registry {
    /// Binds `definition` to `token` under the default qualifier
    pub fn provide(
        &self,
        token: impl Into<Token>,
        definition: Definition,
    ) -> Result<&Self, InjectError> {
        self.provide_qualified(token, Qualifiers::none(), definition)
    }

    /// Binds `definition` to `token` under every qualifier in `qualifiers`.
    ///
    /// Fails without binding anything if any of the slots is already taken in this registry.
    /// With eager evaluation a factory runs right away, once for all qualifiers.
    pub fn provide_qualified(
        &self,
        token: impl Into<Token>,
        qualifiers: impl Into<Qualifiers>,
        definition: Definition,
    ) -> Result<&Self, InjectError> {
        let token = token.into();
        let qualifiers = qualifiers.into();
        let keys = qualifiers.keys();

        for qualifier in &keys {
            if self.owns_slot(&token, qualifier) {
                return Err(InjectError::DuplicateFactory {
                    token,
                    qualifier: qualifier.clone(),
                });
            }
        }

        // The first slot names the binding in errors
        let primary = keys[0].clone();
        match definition {
            Definition::Literal(produced) => {
                let provision = admit(&token, &primary, produced, self);
                self.check(&provision, &token, &primary)?;

                tracing::debug!("Provided '{token}' under {} qualifier(s) - literal", keys.len());
                let mut values = self.0.values.borrow_mut();
                let slots = values.entry(token).or_default();
                for qualifier in keys {
                    slots.insert(qualifier, provision.clone());
                }
            }
            Definition::Factory(producer) => {
                let factory = Rc::new(Factory {
                    producer,
                    qualifiers: qualifiers.as_slice().to_vec(),
                    owner: Rc::downgrade(&self.0),
                    evaluated: RefCell::new(None),
                });
                if !self.0.config.lazy {
                    tracing::debug!("Evaluating factory for '{token}' eagerly");
                    let produced = factory.producer.construct(self, &token, &factory.qualifiers);
                    let provision = admit(&token, &primary, produced, self);
                    self.check(&provision, &token, &primary)?;
                    *factory.evaluated.borrow_mut() = Some(provision);
                }

                tracing::debug!(
                    "Provided '{token}' under {} qualifier(s) - factory {}",
                    keys.len(),
                    if self.0.config.lazy { "deferred" } else { "evaluated" }
                );
                let mut factories = self.0.factories.borrow_mut();
                let slots = factories.entry(token).or_default();
                for qualifier in keys {
                    slots.insert(qualifier, factory.clone());
                }
            }
        }

        Ok(self)
    }

    /// Checks a fresh binding as it is provided
    fn check(&self, provision: &Provision, token: &Token, qualifier: &Qualifier) -> Result<(), InjectError> {
        match provision {
            Provision::Failed(error) => Err(error.clone()),
            Provision::Empty if !self.0.config.lazy_validation => Err(InjectError::EmptyValue {
                token: token.clone(),
                qualifier: qualifier.clone(),
            }),
            _ => Ok(()),
        }
    }
}

// Injecting
impl Registry {
    /// Injects the bean bound to `token` under the default qualifier
    pub fn inject(&self, token: impl Into<Token>) -> Result<Bean, InjectError> {
        self.inject_with(token, InjectOptions::default())
    }

    pub fn inject_qualified(
        &self,
        token: impl Into<Token>,
        qualifier: impl Into<Qualifier>,
    ) -> Result<Bean, InjectError> {
        self.inject_with(token, InjectOptions::default().qualifier(qualifier))
    }

    /// Injects the most specific binding for `token`.
    ///
    /// Lookup starts at this registry and walks the parents, most recently added first.
    /// If nothing is bound and the token is a constructible class, a default instance is
    /// created and cached here. A factory's first result is kept with the binding, so every
    /// registry resolving it shares that result. `force_evaluation` runs the factory again
    /// without replacing it.
    pub fn inject_with(
        &self,
        token: impl Into<Token>,
        options: InjectOptions,
    ) -> Result<Bean, InjectError> {
        let token = token.into();
        let InjectOptions {
            qualifier,
            force_evaluation,
        } = options;

        let Some(found) = self.find(&token, &qualifier)? else {
            return self.construct(token, qualifier);
        };

        if force_evaluation {
            if let Some(factory) = &found.factory {
                tracing::debug!("Re-evaluating factory for '{token}#{qualifier}'");
                let provision = self.evaluate(factory, &token, &qualifier);
                return open(provision, token, qualifier);
            }
        }

        if let Some(value) = found.value {
            return open(value, token, qualifier);
        }

        let Some(factory) = found.factory else {
            return Err(InjectError::NoBeanDefinition { token, qualifier });
        };
        if let Some(provision) = factory.evaluated() {
            return open(provision, token, qualifier);
        }

        let provision = self.evaluate(&factory, &token, &qualifier);
        tracing::debug!("Caching '{token}#{qualifier}'");
        *factory.evaluated.borrow_mut() = Some(provision.clone());
        open(provision, token, qualifier)
    }

    /// Resolves `token` through a typed [Resolver] strategy
    pub fn resolve<R: Resolver>(&self, token: impl Into<Token>) -> Result<R, InjectError> {
        R::resolve(self, token.into(), Qualifier::Default)
    }

    pub fn resolve_qualified<R: Resolver>(
        &self,
        token: impl Into<Token>,
        qualifier: impl Into<Qualifier>,
    ) -> Result<R, InjectError> {
        R::resolve(self, token.into(), qualifier.into())
    }

    /// Runs a factory in the context of the registry that owns it
    fn evaluate(&self, factory: &Factory, token: &Token, qualifier: &Qualifier) -> Provision {
        let owner = factory.owner.upgrade().map(Registry).unwrap_or_else(|| self.clone());
        tracing::debug!("Evaluating factory for '{token}#{qualifier}'");
        let produced = factory.producer.construct(&owner, token, &factory.qualifiers);
        admit(token, qualifier, produced, &owner)
    }

    /// Fallback for unbound tokens
    fn construct(&self, token: Token, qualifier: Qualifier) -> Result<Bean, InjectError> {
        let construct = match &token {
            Token::Class(class) => class.construct,
            _ => None,
        };
        let Some(construct) = construct else {
            return Err(InjectError::NoBeanDefinition { token, qualifier });
        };

        tracing::debug!("Nothing bound for '{token}#{qualifier}' - constructing a default");
        let instance = construct();
        self.0
            .values
            .borrow_mut()
            .entry(token)
            .or_default()
            .insert(qualifier, Provision::Ready(instance.clone()));
        Ok(Bean::Ready(instance))
    }
}

/// Turns raw factory output into a binding, empty values are kept for [Registry::check]
fn admit(token: &Token, qualifier: &Qualifier, produced: Produced, owner: &Registry) -> Provision {
    match produced {
        Produced::Value(instance) => Provision::Ready(instance),
        Produced::Empty => Provision::Empty,
        Produced::Failed(error) => Provision::Failed(InjectError::FactoryFailed {
            token: token.clone(),
            error: Arc::new(error),
        }),
        Produced::Pending(promise) => {
            // Emptiness of a deferred value is only known once it settles,
            // so it is checked then - whatever the validation mode
            let token = token.clone();
            let qualifier = qualifier.clone();
            let checked = BeanPromise::<Option<Instance>>::follow(promise, Some(owner.clone()))
                .then(move |value, _| value.ok_or(InjectError::EmptyValue { token, qualifier }));
            Provision::Deferred(checked)
        }
    }
}

/// Opens an evaluated binding for the caller - empty and failed ones are errors
fn open(provision: Provision, token: Token, qualifier: Qualifier) -> Result<Bean, InjectError> {
    match provision {
        Provision::Ready(instance) => Ok(Bean::Ready(instance)),
        Provision::Deferred(promise) => Ok(Bean::Deferred(promise)),
        Provision::Empty => Err(InjectError::EmptyValue { token, qualifier }),
        Provision::Failed(error) => Err(error),
    }
}

/// A binding found at one level
struct Found {
    value: Option<Provision>,
    factory: Option<Rc<Factory>>,
}

// Lookup
impl Registry {
    /// True if this registry itself holds a binding for `token` and `qualifier`.
    ///
    /// Under the default qualifier a single binding counts, whatever it's qualifier.
    pub fn has_own(&self, token: impl Into<Token>, qualifier: impl Into<Qualifier>) -> bool {
        let token = token.into();
        let qualifier = qualifier.into();
        let candidates = self.qualifiers_of(&token);

        candidates.contains(&qualifier) || (qualifier.is_default() && candidates.len() == 1)
    }

    /// True if this registry or any ancestor holds a binding
    pub fn has(&self, token: impl Into<Token>, qualifier: impl Into<Qualifier>) -> bool {
        let token = token.into();
        let qualifier = qualifier.into();
        self.has_in_tree(&token, &qualifier)
    }

    fn has_in_tree(&self, token: &Token, qualifier: &Qualifier) -> bool {
        self.has_own(token, qualifier.clone())
            || self
                .0
                .parents
                .iter()
                .any(|parent| parent.has_in_tree(token, qualifier))
    }

    /// Exact match on one slot, used to refuse duplicates
    fn owns_slot(&self, token: &Token, qualifier: &Qualifier) -> bool {
        let in_values = self
            .0
            .values
            .borrow()
            .get(token)
            .is_some_and(|values| values.contains_key(qualifier));
        let in_factories = self
            .0
            .factories
            .borrow()
            .get(token)
            .is_some_and(|factories| factories.contains_key(qualifier));
        in_values || in_factories
    }

    /// Every qualifier `token` is bound under at this level
    fn qualifiers_of(&self, token: &Token) -> BTreeSet<Qualifier> {
        let values = self.0.values.borrow();
        let factories = self.0.factories.borrow();
        values
            .get(token)
            .into_iter()
            .flat_map(HashMap::keys)
            .chain(factories.get(token).into_iter().flat_map(HashMap::keys))
            .cloned()
            .collect()
    }

    /// Finds the most specific binding, this level first, then the parents
    fn find(&self, token: &Token, qualifier: &Qualifier) -> Result<Option<Found>, InjectError> {
        if let Some(found) = self.find_own(token, qualifier)? {
            return Ok(Some(found));
        }

        for parent in self.0.parents.iter().rev() {
            if let Some(found) = parent.find(token, qualifier)? {
                return Ok(Some(found));
            }
        }

        Ok(None)
    }

    /// Looks at this level only.
    ///
    /// An exact qualifier match wins. Under the default qualifier a single binding is the
    /// answer, and several are undecidable - that error ends the lookup instead of
    /// falling through to a parent.
    fn find_own(&self, token: &Token, qualifier: &Qualifier) -> Result<Option<Found>, InjectError> {
        let candidates = self.qualifiers_of(token);
        tracing::trace!(
            "Looking up '{token}#{qualifier}' among {} local binding(s)",
            candidates.len()
        );

        let matched = if candidates.contains(qualifier) {
            qualifier.clone()
        } else if !qualifier.is_default() || candidates.is_empty() {
            return Ok(None);
        } else if candidates.len() == 1 {
            match candidates.into_iter().next() {
                Some(only) => only,
                None => return Ok(None),
            }
        } else {
            tracing::warn!("'{token}' is undecidable under the default qualifier: {candidates:?}");
            return Err(InjectError::UndecidableBean {
                token: token.clone(),
                qualifiers: candidates.into_iter().collect(),
            });
        };

        let value = self
            .0
            .values
            .borrow()
            .get(token)
            .and_then(|values| values.get(&matched))
            .cloned();
        let factory = self
            .0
            .factories
            .borrow()
            .get(token)
            .and_then(|factories| factories.get(&matched))
            .cloned();

        Ok(Some(Found { value, factory }))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use strata_promise::tick::{run_pending, run_until};

    use super::*;
    use crate::errors::{DUPLICATE_FACTORY, EMPTY_VALUE, NO_BEAN_DEFINITION, UNDECIDABLE_BEAN};

    fn counting(calls: &Rc<Cell<u32>>, value: &'static str) -> Definition {
        let calls = calls.clone();
        Definition::factory(move |_, _, _| {
            calls.set(calls.get() + 1);
            Some(value)
        })
    }

    fn text(bean: Bean) -> &'static str {
        *bean.downcast::<&'static str>().unwrap()
    }

    #[test]
    fn provide_then_inject() {
        let registry = Registry::new();
        registry
            .provide("address", Definition::factory(|_, _, _| Some("Earth")))
            .unwrap();

        assert_eq!(text(registry.inject("address").unwrap()), "Earth");
    }

    #[test]
    fn literal_values_are_bound_as_is() {
        let registry = Registry::new();
        registry.provide("port", Definition::value(8080_u16)).unwrap();
        assert_eq!(*registry.inject("port").unwrap().downcast::<u16>().unwrap(), 8080);
    }

    #[test]
    fn duplicates_are_refused_without_partial_binding() {
        let registry = Registry::new();
        registry
            .provide_qualified("db", ["a", "b"], Definition::value(1_u8))
            .unwrap();

        let error = registry
            .provide_qualified("db", ["b", "a"], Definition::value(2_u8))
            .unwrap_err();
        assert_eq!(error.name(), DUPLICATE_FACTORY);

        let error = registry
            .provide_qualified("db", ["c", "a"], Definition::value(3_u8))
            .unwrap_err();
        assert_eq!(error.name(), DUPLICATE_FACTORY);
        assert!(!registry.has_own("db", "c"));
    }

    #[test]
    fn eager_factories_run_once_at_provide_time() {
        let calls = Rc::new(Cell::new(0));
        let registry = Registry::new();
        registry.provide("address", counting(&calls, "Earth")).unwrap();
        assert_eq!(calls.get(), 1);

        let first = registry.inject("address").unwrap();
        let second = registry.inject("address").unwrap();
        assert_eq!(calls.get(), 1);
        assert!(first.instance().unwrap().ptr_eq(second.instance().unwrap()));
    }

    #[test]
    fn lazy_factories_run_once_on_first_inject() {
        let calls = Rc::new(Cell::new(0));
        let registry = Registry::with_config(RegistryConfig::default().lazy(true));
        registry.provide("address", counting(&calls, "Earth")).unwrap();
        assert_eq!(calls.get(), 0);

        registry.inject("address").unwrap();
        registry.inject("address").unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn forced_evaluation_leaves_the_cache_alone() {
        let calls = Rc::new(Cell::new(0));
        let registry = Registry::new();
        registry.provide("address", counting(&calls, "Earth")).unwrap();
        let cached = registry.inject("address").unwrap();

        let forced = InjectOptions::default().force_evaluation(true);
        let first = registry.inject_with("address", forced.clone()).unwrap();
        let second = registry.inject_with("address", forced).unwrap();
        assert_eq!(calls.get(), 3);
        assert!(!first.instance().unwrap().ptr_eq(cached.instance().unwrap()));
        assert!(!second.instance().unwrap().ptr_eq(first.instance().unwrap()));

        let plain = registry.inject("address").unwrap();
        assert!(plain.instance().unwrap().ptr_eq(cached.instance().unwrap()));
    }

    #[test]
    fn empty_values_fail_eagerly_by_default() {
        let registry = Registry::new();
        let error = registry
            .provide("address", Definition::factory(|_, _, _| None::<&str>))
            .unwrap_err();
        assert_eq!(error.name(), EMPTY_VALUE);
        assert!(!registry.has_own("address", Qualifier::Default));

        let error = registry.provide("planet", Definition::empty()).unwrap_err();
        assert_eq!(error.name(), EMPTY_VALUE);
    }

    #[test]
    fn lazy_validation_defers_the_failure_to_inject() {
        let registry = Registry::with_config(RegistryConfig::default().lazy_validation(true));
        registry.provide("planet", Definition::empty()).unwrap();

        let error = registry.inject("planet").unwrap_err();
        assert!(matches!(
            error,
            InjectError::EmptyValue { ref qualifier, .. } if qualifier.is_default()
        ));
    }

    #[test]
    fn lazy_factories_validate_on_inject() {
        let registry = Registry::with_config(RegistryConfig::default().lazy(true));
        registry
            .provide("address", Definition::factory(|_, _, _| None::<&str>))
            .unwrap();
        assert_eq!(registry.inject("address").unwrap_err().name(), EMPTY_VALUE);
    }

    #[test]
    fn deferred_values_are_validated_when_they_settle() {
        let registry = Registry::with_config(RegistryConfig::default().lazy_validation(true));
        let (empty, resolver) = BeanPromise::<Option<&str>>::pending();
        registry.provide("address", Definition::deferred(empty)).unwrap();

        let Bean::Deferred(promise) = registry.inject("address").unwrap() else {
            panic!("expected a deferred bean");
        };
        resolver.resolve(None, None);

        let settlement = run_until(promise).unwrap();
        assert!(Registry::same(settlement.context().unwrap(), &registry));
        assert_eq!(settlement.into_result().unwrap_err().name(), EMPTY_VALUE);
    }

    #[test]
    fn factory_promises_settle_in_the_owning_context() {
        let registry = Registry::new();
        registry
            .provide(
                "address",
                Definition::factory(|_, _, _| BeanPromise::resolve(Some("Earth"), None)),
            )
            .unwrap();

        let promise = registry.inject("address").unwrap().into_promise::<&str>(None);
        let observed = Rc::new(RefCell::new(None));
        let slot = observed.clone();
        promise.then(move |value, context| {
            *slot.borrow_mut() = Some((*value, context));
            Ok::<(), InjectError>(())
        });
        run_pending();

        let (value, context) = observed.borrow_mut().take().unwrap();
        assert_eq!(value, "Earth");
        assert!(Registry::same(&context.unwrap(), &registry));
    }

    #[test]
    fn factories_receive_registry_token_and_qualifiers() {
        type Call = (Registry, Token, Vec<String>);
        let seen: Rc<RefCell<Vec<Call>>> = Rc::default();
        let registry = Registry::new();

        for (token, qualifiers) in [("db", Qualifiers::from(["primary", "main"])), ("cache", Qualifiers::none())] {
            let log = seen.clone();
            registry
                .provide_qualified(
                    token,
                    qualifiers,
                    Definition::factory(move |registry: &Registry, token: &Token, qualifiers: &[Arc<str>]| {
                        let qualifiers = qualifiers.iter().map(|q| q.to_string()).collect();
                        log.borrow_mut().push((registry.clone(), token.clone(), qualifiers));
                        Some(token.to_string())
                    }),
                )
                .unwrap();
        }

        let seen = seen.borrow();
        assert!(Registry::same(&seen[0].0, &registry));
        assert_eq!(seen[0].1, Token::key("db"));
        assert_eq!(seen[0].2, vec!["primary", "main"]);
        assert_eq!(seen[1].1, Token::key("cache"));
        assert!(seen[1].2.is_empty());
    }

    #[test]
    fn qualified_bindings() {
        let registry = Registry::new();
        registry
            .provide_qualified("db", "a", Definition::factory(|_, _, _| Some("A")))
            .unwrap()
            .provide_qualified("db", "b", Definition::factory(|_, _, _| Some("B")))
            .unwrap();

        assert_eq!(registry.inject("db").unwrap_err().name(), UNDECIDABLE_BEAN);
        assert_eq!(text(registry.inject_qualified("db", "a").unwrap()), "A");
        assert_eq!(text(registry.inject_qualified("db", "b").unwrap()), "B");
        assert_eq!(
            registry.inject_qualified("db", "c").unwrap_err().name(),
            NO_BEAN_DEFINITION
        );
    }

    #[test]
    fn undecidable_stays_undecidable_after_lazy_caching() {
        let registry = Registry::with_config(RegistryConfig::default().lazy(true));
        registry
            .provide_qualified("db", "a", Definition::value("A"))
            .unwrap()
            .provide_qualified("db", "b", Definition::factory(|_, _, _| Some("B")))
            .unwrap();

        assert_eq!(text(registry.inject_qualified("db", "b").unwrap()), "B");
        assert_eq!(registry.inject("db").unwrap_err().name(), UNDECIDABLE_BEAN);
    }

    #[test]
    fn single_qualifier_answers_the_default() {
        let registry = Registry::new();
        registry
            .provide_qualified("host", "primary", Definition::value("db1"))
            .unwrap();

        assert!(registry.has_own("host", Qualifier::Default));
        assert_eq!(text(registry.inject("host").unwrap()), "db1");
    }

    #[test]
    fn empty_qualifier_is_not_the_default() {
        let registry = Registry::new();
        registry.provide_qualified("host", "", Definition::value("blank")).unwrap();
        registry.provide("host", Definition::value("default")).unwrap();

        assert_eq!(text(registry.inject("host").unwrap()), "default");
        assert_eq!(text(registry.inject_qualified("host", "").unwrap()), "blank");
    }

    #[test]
    fn children_shadow_parents() {
        let parent = Registry::new();
        parent.provide("address", Definition::value("Earth")).unwrap();
        parent.provide("moon", Definition::value("Luna")).unwrap();

        let child = parent.child();
        child.provide("address", Definition::value("Mars")).unwrap();

        assert_eq!(text(child.inject("address").unwrap()), "Mars");
        assert_eq!(text(child.inject("moon").unwrap()), "Luna");
        assert_eq!(text(parent.inject("address").unwrap()), "Earth");
    }

    #[test]
    fn latest_parent_wins() {
        let first = Registry::new();
        first.provide("address", Definition::value("Earth")).unwrap();
        let second = Registry::new();
        second.provide("address", Definition::value("Mars")).unwrap();

        let child = Registry::with_parents([first.clone(), second]);
        assert_eq!(text(child.inject("address").unwrap()), "Mars");

        let reversed = Registry::with_parents([child.parents()[1].clone(), first]);
        assert_eq!(text(reversed.inject("address").unwrap()), "Earth");
    }

    #[test]
    fn ambiguity_does_not_fall_through_to_parents() {
        let parent = Registry::new();
        parent.provide("db", Definition::value("parent")).unwrap();

        let child = parent.child();
        child.provide_qualified("db", "a", Definition::value("A")).unwrap();
        child.provide_qualified("db", "b", Definition::value("B")).unwrap();

        assert_eq!(child.inject("db").unwrap_err().name(), UNDECIDABLE_BEAN);
    }

    #[test]
    fn lazy_inherited_factories_run_in_the_owning_registry() {
        let parent = Registry::with_config(RegistryConfig::default().lazy(true));
        parent
            .provide(
                "owner",
                Definition::factory(|registry: &Registry, _: &Token, _: &[Arc<str>]| {
                    Some(registry.clone())
                }),
            )
            .unwrap();

        let child = parent.child();
        let owner = child.inject("owner").unwrap().downcast::<Registry>().unwrap();
        assert!(Registry::same(&owner, &parent));
        assert!(!child.has_own("owner", Qualifier::Default));
    }

    #[test]
    fn inherited_results_are_shared_with_the_owner() {
        let calls = Rc::new(Cell::new(0));
        let parent = Registry::with_config(RegistryConfig::default().lazy(true));
        parent.provide("address", counting(&calls, "Earth")).unwrap();
        let child = parent.child();
        let sibling = parent.child();

        let from_child = child.inject("address").unwrap();
        let from_parent = parent.inject("address").unwrap();
        let from_sibling = sibling.inject("address").unwrap();
        assert_eq!(calls.get(), 1);
        assert!(from_child.instance().unwrap().ptr_eq(from_parent.instance().unwrap()));
        assert!(from_sibling.instance().unwrap().ptr_eq(from_parent.instance().unwrap()));
    }

    #[test]
    fn default_lookup_does_not_depend_on_earlier_injections() {
        let parent = Registry::with_config(RegistryConfig::default().lazy(true));
        parent
            .provide("db", Definition::factory(|_, _, _| Some("default")))
            .unwrap()
            .provide_qualified("db", "x", Definition::factory(|_, _, _| Some("x")))
            .unwrap();
        let child = parent.child();

        assert_eq!(text(child.inject("db").unwrap()), "default");
        assert_eq!(text(child.inject_qualified("db", "x").unwrap()), "x");
        assert_eq!(text(child.inject("db").unwrap()), "default");

        let fresh = parent.child();
        assert_eq!(text(fresh.inject_qualified("db", "x").unwrap()), "x");
        assert_eq!(text(fresh.inject("db").unwrap()), "default");
        assert!(!fresh.has_own("db", "x"));
    }

    #[test]
    fn children_can_shadow_after_injecting_inherited_bindings() {
        let parent = Registry::with_config(RegistryConfig::default().lazy(true));
        parent
            .provide("address", Definition::factory(|_, _, _| Some("Earth")))
            .unwrap();
        let child = parent.child();

        assert_eq!(text(child.inject("address").unwrap()), "Earth");
        child.provide("address", Definition::value("Mars")).unwrap();
        assert_eq!(text(child.inject("address").unwrap()), "Mars");
        assert_eq!(text(parent.inject("address").unwrap()), "Earth");
    }

    #[test]
    fn configured_children_keep_their_parents() {
        let calls = Rc::new(Cell::new(0));
        let parent = Registry::new();
        parent.provide("address", Definition::value("Earth")).unwrap();

        let child = Registry::with_config_and_parents(
            RegistryConfig::default().lazy(true).lazy_validation(true),
            [parent.clone()],
        );
        assert!(child.config().lazy);
        assert!(!parent.config().lazy);

        child.provide("planet", counting(&calls, "Mars")).unwrap();
        assert_eq!(calls.get(), 0);
        assert_eq!(text(child.inject("planet").unwrap()), "Mars");
        assert_eq!(calls.get(), 1);
        assert_eq!(text(child.inject("address").unwrap()), "Earth");

        child.provide("moon", Definition::empty()).unwrap();
        assert_eq!(child.inject("moon").unwrap_err().name(), EMPTY_VALUE);
    }

    #[test]
    fn has_and_has_own() {
        let parent = Registry::new();
        parent.provide_qualified("db", "main", Definition::value(1_u8)).unwrap();
        let child = parent.child();

        assert!(parent.has_own("db", "main"));
        assert!(parent.has_own("db", Qualifier::Default));
        assert!(!child.has_own("db", "main"));
        assert!(child.has("db", "main"));
        assert!(child.has("db", Qualifier::Default));
        assert!(!child.has("db", "other"));
        assert!(!child.has("cache", Qualifier::Default));
    }

    #[derive(Default)]
    struct Clock {
        ticks: Cell<u32>,
    }

    #[test]
    fn constructible_classes_are_built_and_cached() {
        let registry = Registry::new();
        let token = Token::constructible::<Clock>();

        let first = registry.inject(&token).unwrap().downcast::<Clock>().unwrap();
        first.ticks.set(5);
        let second = registry.inject(&token).unwrap().downcast::<Clock>().unwrap();
        assert_eq!(second.ticks.get(), 5);
        assert!(registry.has_own(&token, Qualifier::Default));

        let error = registry.inject(Token::class::<String>()).unwrap_err();
        assert_eq!(error.name(), NO_BEAN_DEFINITION);
    }

    #[test]
    fn lazy_factory_failures_are_not_retried() {
        let calls = Rc::new(Cell::new(0));
        let registry = Registry::with_config(RegistryConfig::default().lazy(true));
        let counter = calls.clone();
        registry
            .provide(
                "flaky",
                Definition::factory(move |_, _, _| {
                    counter.set(counter.get() + 1);
                    Err::<Option<u8>, _>("unreachable")
                }),
            )
            .unwrap();

        assert_eq!(registry.inject("flaky").unwrap_err().name(), "FACTORY_FAILED");
        assert_eq!(registry.inject("flaky").unwrap_err().name(), "FACTORY_FAILED");
        assert_eq!(calls.get(), 1);

        let forced = InjectOptions::default().force_evaluation(true);
        assert!(registry.inject_with("flaky", forced).is_err());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn eager_factory_failures_bind_nothing() {
        let registry = Registry::new();
        let error = registry
            .provide("flaky", Definition::factory(|_, _, _| Err::<Option<u8>, _>("no")))
            .unwrap_err();
        assert_eq!(error.name(), "FACTORY_FAILED");
        assert!(!registry.has("flaky", Qualifier::Default));
    }
}
