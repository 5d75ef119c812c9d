use crate::component::VIEW;
use crate::diff::{Differ, ReferenceDiffer};
use crate::layout::LayoutMetrics;
use crate::mutation::{ComponentType, Transaction};
use crate::props::{Props, State};
use crate::tag::Tag;
use std::collections::BTreeSet;
use std::sync::Arc;

/// One node of an immutable tree revision. Subtrees are shared between
/// revisions through `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub tag: Tag,
    pub component: ComponentType,
    pub props: Props,
    pub layout: LayoutMetrics,
    pub state: State,
    pub children: Vec<Arc<TreeNode>>,
}

impl TreeNode {
    pub fn new(tag: Tag, component: &str) -> Self {
        Self {
            tag,
            component: component.into(),
            props: Props::empty(),
            layout: LayoutMetrics::default(),
            state: State::default(),
            children: Vec::new(),
        }
    }

    pub fn with_props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }

    pub fn with_layout(mut self, layout: LayoutMetrics) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_state(mut self, state: State) -> Self {
        self.state = state;
        self
    }

    pub fn with_children(mut self, children: Vec<TreeNode>) -> Self {
        self.children = children.into_iter().map(Arc::new).collect();
        self
    }

    pub fn child_tags(&self) -> Vec<Tag> {
        self.children.iter().map(|c| c.tag).collect()
    }

    /// Pre-order walk, yielding each node with its parent tag
    pub fn walk<'a>(
        &'a self,
        parent: Option<Tag>,
        visit: &mut impl FnMut(&'a TreeNode, Option<Tag>),
    ) {
        visit(self, parent);
        for child in &self.children {
            child.walk(Some(self.tag), visit);
        }
    }
}

/// Immutable snapshot of the whole declarative tree
#[derive(Debug, Clone, PartialEq)]
pub struct TreeRevision {
    pub number: u64,
    pub root: Arc<TreeNode>,
}

impl TreeRevision {
    pub fn new(number: u64, root: TreeNode) -> Self {
        Self {
            number,
            root: Arc::new(root),
        }
    }

    /// Revision 0: the bare surface root
    pub fn empty(root: Tag) -> Self {
        Self::new(0, TreeNode::new(root, VIEW))
    }

    pub fn root_tag(&self) -> Tag {
        self.root.tag
    }

    /// Every tag in the revision, root included
    pub fn tags(&self) -> BTreeSet<Tag> {
        let mut tags = BTreeSet::new();
        self.root.walk(None, &mut |node, _| {
            tags.insert(node.tag);
        });
        tags
    }

    pub fn find(&self, tag: Tag) -> Option<&TreeNode> {
        let mut found = None;
        self.root.walk(None, &mut |node, _| {
            if node.tag == tag {
                found = Some(node);
            }
        });
        found
    }

    /// Transaction that mounts this revision onto an empty surface
    pub fn initial_transaction(&self) -> Transaction {
        ReferenceDiffer.diff(&TreeRevision::empty(self.root_tag()), self)
    }
}
