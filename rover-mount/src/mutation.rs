use crate::error::MountError;
use crate::layout::LayoutMetrics;
use crate::props::{Props, State};
use crate::tag::Tag;
use serde::{Deserialize, Serialize};
use smartstring::{LazyCompact, SmartString};
use std::collections::HashMap;

/// Component type identifier, e.g. `View` or `ModalHostView`
pub type ComponentType = SmartString<LazyCompact>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    Create {
        tag: Tag,
        component: ComponentType,
    },
    Delete {
        tag: Tag,
    },
    Insert {
        parent: Tag,
        child: Tag,
        index: usize,
    },
    Remove {
        parent: Tag,
        child: Tag,
        index: usize,
    },
    UpdateProps {
        tag: Tag,
        props: Props,
    },
    UpdateLayout {
        tag: Tag,
        metrics: LayoutMetrics,
    },
    UpdateState {
        tag: Tag,
        state: State,
    },
}

/// Order in which the coordinator applies mutation kinds inside one
/// transaction. Leaving nodes detach before entering nodes attach, and a
/// node's own updates land before its children are inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Remove,
    Delete,
    Create,
    Update,
    Insert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    Props,
    Layout,
    State,
}

impl Mutation {
    pub fn create(tag: Tag, component: &str) -> Self {
        Mutation::Create {
            tag,
            component: component.into(),
        }
    }

    pub fn delete(tag: Tag) -> Self {
        Mutation::Delete { tag }
    }

    pub fn insert(parent: Tag, child: Tag, index: usize) -> Self {
        Mutation::Insert {
            parent,
            child,
            index,
        }
    }

    pub fn remove(parent: Tag, child: Tag, index: usize) -> Self {
        Mutation::Remove {
            parent,
            child,
            index,
        }
    }

    pub fn update_props(tag: Tag, props: Props) -> Self {
        Mutation::UpdateProps { tag, props }
    }

    pub fn update_layout(tag: Tag, metrics: LayoutMetrics) -> Self {
        Mutation::UpdateLayout { tag, metrics }
    }

    pub fn update_state(tag: Tag, state: State) -> Self {
        Mutation::UpdateState { tag, state }
    }

    /// The node this mutation acts on (the child for Insert/Remove)
    pub fn target(&self) -> Tag {
        match self {
            Mutation::Create { tag, .. }
            | Mutation::Delete { tag }
            | Mutation::UpdateProps { tag, .. }
            | Mutation::UpdateLayout { tag, .. }
            | Mutation::UpdateState { tag, .. } => *tag,
            Mutation::Insert { child, .. } | Mutation::Remove { child, .. } => *child,
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            Mutation::Remove { .. } => Phase::Remove,
            Mutation::Delete { .. } => Phase::Delete,
            Mutation::Create { .. } => Phase::Create,
            Mutation::UpdateProps { .. }
            | Mutation::UpdateLayout { .. }
            | Mutation::UpdateState { .. } => Phase::Update,
            Mutation::Insert { .. } => Phase::Insert,
        }
    }

    pub fn update_kind(&self) -> Option<UpdateKind> {
        match self {
            Mutation::UpdateProps { .. } => Some(UpdateKind::Props),
            Mutation::UpdateLayout { .. } => Some(UpdateKind::Layout),
            Mutation::UpdateState { .. } => Some(UpdateKind::State),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mutation::Create { .. } => "create",
            Mutation::Delete { .. } => "delete",
            Mutation::Insert { .. } => "insert",
            Mutation::Remove { .. } => "remove",
            Mutation::UpdateProps { .. } => "update_props",
            Mutation::UpdateLayout { .. } => "update_layout",
            Mutation::UpdateState { .. } => "update_state",
        }
    }
}

/// Ordered mutations for one revision-to-revision diff
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub revision: u64,
    pub mutations: Vec<Mutation>,
}

impl Transaction {
    pub fn new(revision: u64) -> Self {
        Self {
            revision,
            mutations: Vec::new(),
        }
    }

    pub fn with_mutations(revision: u64, mutations: Vec<Mutation>) -> Self {
        Self {
            revision,
            mutations,
        }
    }

    pub fn push(&mut self, mutation: Mutation) {
        self.mutations.push(mutation);
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Mutations in application order: stable within each phase
    pub fn phased(&self) -> Vec<&Mutation> {
        let mut ordered: Vec<&Mutation> = self.mutations.iter().collect();
        ordered.sort_by_key(|m| m.phase());
        ordered
    }

    /// Reports ordering violations in the producer's sequence. The
    /// coordinator applies transactions in phase order, so these are
    /// diagnostics for the diff engine rather than hard failures.
    pub fn validate(&self) -> Vec<MountError> {
        let mut created_at: HashMap<Tag, usize> = HashMap::new();
        let mut removed_at: HashMap<Tag, usize> = HashMap::new();
        for (i, mutation) in self.mutations.iter().enumerate() {
            match mutation {
                Mutation::Create { tag, .. } => {
                    created_at.insert(*tag, i);
                }
                Mutation::Remove { child, .. } => {
                    removed_at.insert(*child, i);
                }
                _ => {}
            }
        }

        let mut violations = Vec::new();
        for (i, mutation) in self.mutations.iter().enumerate() {
            match mutation {
                Mutation::Insert { child, .. } => {
                    if created_at.get(child).is_some_and(|&at| at > i) {
                        violations.push(MountError::InsertBeforeCreate(*child));
                    }
                }
                Mutation::Delete { tag } => {
                    if removed_at.get(tag).is_some_and(|&at| at > i) {
                        violations.push(MountError::DeleteBeforeRemove(*tag));
                    }
                }
                _ => {}
            }
        }
        violations
    }
}
