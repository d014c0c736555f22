//! Name → factory lookup for states and transitions.
//!
//! Peers never exchange behavior objects, only names. The
//! [`StateRegistry`] maps a name (scoped by [`SpeciesTag`], falling back to
//! a shared table) to a factory producing a fresh instance. It is built
//! once, validated up front and shared read-only behind an `Arc`; each
//! driver keeps its own [`ResolutionCache`] for repeated lookups.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use agent_core::{AgentError, ErrorSeverity, SpeciesTag};
use thiserror::Error;

use crate::state::{BehaviorState, StateKey};
use crate::transition::{Transition, TransitionKey, TransitionList};

pub type StateFactory = Arc<dyn Fn() -> Box<dyn BehaviorState> + Send + Sync>;
pub type TransitionFactory = Arc<dyn Fn() -> Box<dyn Transition> + Send + Sync>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown behavior name '{name}' for species '{species}'")]
    Unknown { name: String, species: SpeciesTag },

    #[error("behavior name '{name}' registered twice for '{scope}'")]
    Duplicate { name: &'static str, scope: String },

    #[error("'{name}' is a transition, expected a state")]
    NotAState { name: &'static str },

    #[error("'{name}' is a state, expected a transition")]
    NotATransition { name: &'static str },

    #[error("species '{0}' has no initial state")]
    MissingInitial(SpeciesTag),

    #[error("species '{0}' is not registered")]
    UnknownSpecies(SpeciesTag),
}

impl AgentError for RegistryError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Unknown { .. } => ErrorSeverity::Validation,
            _ => ErrorSeverity::Internal,
        }
    }
}

/// A resolved registry entry.
#[derive(Clone)]
pub enum Resolved {
    State(StateKey, StateFactory),
    Transition(TransitionKey, TransitionFactory),
}

impl Resolved {
    pub fn name(&self) -> &'static str {
        match self {
            Self::State(key, _) => key.as_str(),
            Self::Transition(key, _) => key.as_str(),
        }
    }

    pub fn is_transition(&self) -> bool {
        matches!(self, Self::Transition(..))
    }
}

impl std::fmt::Debug for Resolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::State(key, _) => f.debug_tuple("State").field(key).finish(),
            Self::Transition(key, _) => f.debug_tuple("Transition").field(key).finish(),
        }
    }
}

type Table = HashMap<&'static str, Resolved>;

struct SpeciesTable {
    initial: Option<StateKey>,
    globals: Vec<TransitionKey>,
    entries: Table,
}

/// Immutable catalog of every state and transition the session knows.
pub struct StateRegistry {
    species: HashMap<SpeciesTag, SpeciesTable>,
    shared: Table,
}

impl StateRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Uncached lookup: the species table first, then the shared table.
    pub fn lookup(&self, name: &str, species: SpeciesTag) -> Result<Resolved, RegistryError> {
        self.species
            .get(&species)
            .and_then(|table| table.entries.get(name))
            .or_else(|| self.shared.get(name))
            .cloned()
            .ok_or_else(|| RegistryError::Unknown {
                name: name.to_owned(),
                species,
            })
    }

    pub fn initial_state(&self, species: SpeciesTag) -> Result<StateKey, RegistryError> {
        let table = self
            .species
            .get(&species)
            .ok_or(RegistryError::UnknownSpecies(species))?;
        table.initial.ok_or(RegistryError::MissingInitial(species))
    }

    /// Fresh instances of the species' agent-wide transitions, in
    /// registration order.
    pub fn global_transitions(&self, species: SpeciesTag) -> Result<TransitionList, RegistryError> {
        let table = self
            .species
            .get(&species)
            .ok_or(RegistryError::UnknownSpecies(species))?;
        let mut list = TransitionList::new();
        for key in &table.globals {
            match self.lookup(key.as_str(), species)? {
                Resolved::Transition(_, factory) => list.push(factory()),
                Resolved::State(key, _) => {
                    return Err(RegistryError::NotATransition { name: key.as_str() });
                }
            }
        }
        Ok(list)
    }

    pub fn knows_species(&self, species: SpeciesTag) -> bool {
        self.species.contains_key(&species)
    }

    /// Number of distinct names visible to `species`.
    pub fn len_for(&self, species: SpeciesTag) -> usize {
        let own = self.species.get(&species).map_or(0, |table| table.entries.len());
        own + self.shared.len()
    }
}

impl std::fmt::Debug for StateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateRegistry")
            .field("species", &self.species.keys().collect::<Vec<_>>())
            .field("shared", &self.shared.len())
            .finish()
    }
}

/// Collects registrations and validates them in [`RegistryBuilder::build`].
///
/// Names are read from a probe instance produced by each factory, so a
/// state cannot be registered under a name it does not report itself.
#[derive(Default)]
pub struct RegistryBuilder {
    species: HashMap<SpeciesTag, SpeciesTable>,
    shared: Table,
    errors: Vec<RegistryError>,
}

impl RegistryBuilder {
    /// Registers the behavior of one species.
    pub fn species(
        mut self,
        tag: SpeciesTag,
        register: impl FnOnce(SpeciesBuilder) -> SpeciesBuilder,
    ) -> Self {
        let built = register(SpeciesBuilder::new(tag));
        self.errors.extend(built.errors);
        match self.species.entry(tag) {
            Entry::Occupied(_) => self.errors.push(RegistryError::Duplicate {
                name: tag.as_str(),
                scope: "species".to_owned(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(SpeciesTable {
                    initial: built.initial,
                    globals: built.globals,
                    entries: built.entries,
                });
            }
        }
        self
    }

    /// Registers a state visible to every species.
    pub fn shared_state<S, F>(mut self, factory: F) -> Self
    where
        S: BehaviorState + 'static,
        F: Fn() -> S + Send + Sync + 'static,
    {
        let resolved = state_entry(factory);
        insert(&mut self.shared, resolved, "shared", &mut self.errors);
        self
    }

    /// Registers a transition visible to every species.
    pub fn shared_transition<T, F>(mut self, factory: F) -> Self
    where
        T: Transition + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let resolved = transition_entry(factory);
        insert(&mut self.shared, resolved, "shared", &mut self.errors);
        self
    }

    pub fn build(self) -> Result<StateRegistry, RegistryError> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }

        for (tag, table) in &self.species {
            // A species name may not hide a shared one, whatever its kind.
            if let Some(clash) = table
                .entries
                .values()
                .find(|entry| self.shared.contains_key(entry.name()))
            {
                return Err(RegistryError::Duplicate {
                    name: clash.name(),
                    scope: format!("{tag} and shared"),
                });
            }

            let initial = table.initial.ok_or(RegistryError::MissingInitial(*tag))?;
            let resolved = table
                .entries
                .get(initial.as_str())
                .or_else(|| self.shared.get(initial.as_str()))
                .ok_or_else(|| RegistryError::Unknown {
                    name: initial.as_str().to_owned(),
                    species: *tag,
                })?;
            if resolved.is_transition() {
                return Err(RegistryError::NotAState {
                    name: initial.as_str(),
                });
            }
        }

        tracing::debug!(
            target: "fsm::registry",
            species = self.species.len(),
            shared = self.shared.len(),
            "state registry built"
        );

        Ok(StateRegistry {
            species: self.species,
            shared: self.shared,
        })
    }
}

/// Registrations scoped to a single species.
pub struct SpeciesBuilder {
    tag: SpeciesTag,
    initial: Option<StateKey>,
    globals: Vec<TransitionKey>,
    entries: Table,
    errors: Vec<RegistryError>,
}

impl SpeciesBuilder {
    fn new(tag: SpeciesTag) -> Self {
        Self {
            tag,
            initial: None,
            globals: Vec::new(),
            entries: Table::new(),
            errors: Vec::new(),
        }
    }

    pub fn state<S, F>(mut self, factory: F) -> Self
    where
        S: BehaviorState + 'static,
        F: Fn() -> S + Send + Sync + 'static,
    {
        let resolved = state_entry(factory);
        insert(&mut self.entries, resolved, self.tag.as_str(), &mut self.errors);
        self
    }

    /// Registers the state a freshly spawned agent starts in.
    pub fn initial_state<S, F>(mut self, factory: F) -> Self
    where
        S: BehaviorState + 'static,
        F: Fn() -> S + Send + Sync + 'static,
    {
        self.initial = Some(factory().key());
        self.state(factory)
    }

    pub fn transition<T, F>(mut self, factory: F) -> Self
    where
        T: Transition + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let resolved = transition_entry(factory);
        insert(&mut self.entries, resolved, self.tag.as_str(), &mut self.errors);
        self
    }

    /// Registers a transition checked before any state's own transitions,
    /// whatever state is active.
    pub fn global_transition<T, F>(mut self, factory: F) -> Self
    where
        T: Transition + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.globals.push(factory().key());
        self.transition(factory)
    }
}

fn state_entry<S, F>(factory: F) -> Resolved
where
    S: BehaviorState + 'static,
    F: Fn() -> S + Send + Sync + 'static,
{
    let key = factory().key();
    Resolved::State(key, Arc::new(move || Box::new(factory()) as Box<dyn BehaviorState>))
}

fn transition_entry<T, F>(factory: F) -> Resolved
where
    T: Transition + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    let key = factory().key();
    Resolved::Transition(key, Arc::new(move || Box::new(factory()) as Box<dyn Transition>))
}

fn insert(table: &mut Table, resolved: Resolved, scope: &str, errors: &mut Vec<RegistryError>) {
    match table.entry(resolved.name()) {
        Entry::Occupied(slot) => errors.push(RegistryError::Duplicate {
            name: slot.get().name(),
            scope: scope.to_owned(),
        }),
        Entry::Vacant(slot) => {
            slot.insert(resolved);
        }
    }
}

/// Per-agent memo of `(species, name)` lookups.
#[derive(Debug)]
pub struct ResolutionCache {
    registry: Arc<StateRegistry>,
    entries: HashMap<SpeciesTag, HashMap<String, Resolved>>,
    misses: u64,
}

impl ResolutionCache {
    pub fn new(registry: Arc<StateRegistry>) -> Self {
        Self {
            registry,
            entries: HashMap::new(),
            misses: 0,
        }
    }

    pub fn registry(&self) -> &Arc<StateRegistry> {
        &self.registry
    }

    /// Resolves `name` for `species`, consulting the registry on first use.
    ///
    /// Unknown names are not cached.
    pub fn resolve(&mut self, name: &str, species: SpeciesTag) -> Result<Resolved, RegistryError> {
        let per_species = self.entries.entry(species).or_default();
        if let Some(hit) = per_species.get(name) {
            return Ok(hit.clone());
        }

        self.misses += 1;
        let resolved = self.registry.lookup(name, species)?;
        per_species.insert(name.to_owned(), resolved.clone());
        Ok(resolved)
    }

    /// Resolves `key` and builds a fresh state instance.
    pub fn instantiate_state(
        &mut self,
        key: StateKey,
        species: SpeciesTag,
    ) -> Result<Box<dyn BehaviorState>, RegistryError> {
        match self.resolve(key.as_str(), species)? {
            Resolved::State(_, factory) => Ok(factory()),
            Resolved::Transition(key, _) => Err(RegistryError::NotAState { name: key.as_str() }),
        }
    }

    /// Number of lookups that had to go to the registry.
    pub fn misses(&self) -> u64 {
        self.misses
    }
}
