use crate::layout::LayoutMetrics;
use crate::mutation::{Mutation, Transaction};
use crate::revision::{TreeNode, TreeRevision};
use crate::tag::Tag;
use std::collections::{HashMap, HashSet};

/// Produces the transaction that turns one revision into another
pub trait Differ {
    fn diff(&self, old: &TreeRevision, new: &TreeRevision) -> Transaction;
}

/// Straightforward differ used by tests and the replay tool.
///
/// Any parent whose child list changed has all old children removed and all
/// new children inserted. A tag whose component type changed is deleted and
/// created again. The root tag is never created or deleted.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceDiffer;

struct Indexed<'a> {
    order: Vec<&'a TreeNode>,
    nodes: HashMap<Tag, &'a TreeNode>,
}

fn index(revision: &TreeRevision) -> Indexed<'_> {
    let mut order = Vec::new();
    revision.root.walk(None, &mut |node, _| order.push(node));
    let nodes = order.iter().map(|node| (node.tag, *node)).collect();
    Indexed { order, nodes }
}

impl Differ for ReferenceDiffer {
    fn diff(&self, old: &TreeRevision, new: &TreeRevision) -> Transaction {
        let root = new.root_tag();
        let before = index(old);
        let after = index(new);
        let mut tx = Transaction::new(new.number);

        let replaced: HashSet<Tag> = after
            .order
            .iter()
            .filter(|node| node.tag != root)
            .filter(|node| {
                before
                    .nodes
                    .get(&node.tag)
                    .is_some_and(|prev| prev.component != node.component)
            })
            .map(|node| node.tag)
            .collect();
        let survives = |tag: Tag| after.nodes.contains_key(&tag) && !replaced.contains(&tag);
        let existed = |tag: Tag| before.nodes.contains_key(&tag) && !replaced.contains(&tag);
        let children_changed = |node: &TreeNode| -> bool {
            let Some(prev) = before.nodes.get(&node.tag) else {
                return true;
            };
            prev.child_tags() != node.child_tags()
                || node.children.iter().any(|c| replaced.contains(&c.tag))
        };

        // Detach
        for parent in &before.order {
            let rebuilt = match after.nodes.get(&parent.tag) {
                Some(next) if survives(parent.tag) => children_changed(*next),
                _ => true,
            };
            if !rebuilt {
                continue;
            }
            for (index, child) in parent.children.iter().enumerate().rev() {
                tx.push(Mutation::remove(parent.tag, child.tag, index));
            }
        }

        // Delete, leaves first
        for node in before.order.iter().rev() {
            if node.tag != root && !survives(node.tag) {
                tx.push(Mutation::delete(node.tag));
            }
        }

        // Create and update
        for node in &after.order {
            if node.tag != root && !existed(node.tag) {
                tx.push(Mutation::create(node.tag, &node.component));
                if !node.props.is_empty() {
                    tx.push(Mutation::update_props(node.tag, node.props.clone()));
                }
                if node.layout != LayoutMetrics::default() {
                    tx.push(Mutation::update_layout(node.tag, node.layout));
                }
                if !node.state.is_null() {
                    tx.push(Mutation::update_state(node.tag, node.state.clone()));
                }
                continue;
            }
            let Some(prev) = before.nodes.get(&node.tag) else {
                continue;
            };
            if prev.props != node.props {
                tx.push(Mutation::update_props(node.tag, node.props.clone()));
            }
            if prev.layout != node.layout {
                tx.push(Mutation::update_layout(node.tag, node.layout));
            }
            if prev.state != node.state {
                tx.push(Mutation::update_state(node.tag, node.state.clone()));
            }
        }

        // Attach
        for parent in &after.order {
            let rebuilt = !existed(parent.tag) || children_changed(*parent);
            if !rebuilt {
                continue;
            }
            for (index, child) in parent.children.iter().enumerate() {
                tx.push(Mutation::insert(parent.tag, child.tag, index));
            }
        }

        tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::VIEW;
    use crate::layout::Rect;
    use crate::props::Props;
    use serde_json::json;

    fn leaf(tag: u32) -> TreeNode {
        TreeNode::new(Tag(tag), VIEW)
    }

    fn rev(number: u64, children: Vec<TreeNode>) -> TreeRevision {
        TreeRevision::new(number, leaf(1).with_children(children))
    }

    #[test]
    fn test_identical_revisions_produce_nothing() {
        let a = rev(1, vec![leaf(2), leaf(3)]);
        let b = TreeRevision {
            number: 2,
            ..a.clone()
        };
        assert!(ReferenceDiffer.diff(&a, &b).is_empty());
    }

    #[test]
    fn test_prop_change_only() {
        let a = rev(1, vec![leaf(2)]);
        let props = Props::from_json(json!({"opacity": 0.5})).unwrap();
        let b = rev(2, vec![leaf(2).with_props(props.clone())]);

        let tx = ReferenceDiffer.diff(&a, &b);
        assert_eq!(tx.mutations, vec![Mutation::update_props(Tag(2), props)]);
    }

    #[test]
    fn test_add_and_remove_child() {
        let frame = LayoutMetrics::with_frame(Rect::sized(5.0, 5.0));
        let a = rev(1, vec![leaf(2), leaf(3)]);
        let b = rev(2, vec![leaf(3), leaf(4).with_layout(frame)]);

        let tx = ReferenceDiffer.diff(&a, &b);
        assert_eq!(
            tx.mutations,
            vec![
                Mutation::remove(Tag(1), Tag(3), 1),
                Mutation::remove(Tag(1), Tag(2), 0),
                Mutation::delete(Tag(2)),
                Mutation::create(Tag(4), VIEW),
                Mutation::update_layout(Tag(4), frame),
                Mutation::insert(Tag(1), Tag(3), 0),
                Mutation::insert(Tag(1), Tag(4), 1),
            ]
        );
        assert!(tx.validate().is_empty());
    }

    #[test]
    fn test_component_change_recreates() {
        let a = rev(1, vec![leaf(2)]);
        let b = rev(2, vec![TreeNode::new(Tag(2), "ModalHostView")]);

        let tx = ReferenceDiffer.diff(&a, &b);
        assert_eq!(
            tx.mutations,
            vec![
                Mutation::remove(Tag(1), Tag(2), 0),
                Mutation::delete(Tag(2)),
                Mutation::create(Tag(2), "ModalHostView"),
                Mutation::insert(Tag(1), Tag(2), 0),
            ]
        );
    }

    #[test]
    fn test_removed_subtree_is_deleted_leaves_first() {
        let a = rev(1, vec![leaf(2).with_children(vec![leaf(3)])]);
        let b = rev(2, vec![]);

        let tx = ReferenceDiffer.diff(&a, &b);
        assert_eq!(
            tx.mutations,
            vec![
                Mutation::remove(Tag(1), Tag(2), 0),
                Mutation::remove(Tag(2), Tag(3), 0),
                Mutation::delete(Tag(3)),
                Mutation::delete(Tag(2)),
            ]
        );
    }
}
