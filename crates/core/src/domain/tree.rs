use std::collections::{HashMap, VecDeque};

use crate::domain::Id;
use crate::domain::comments::Comment;
use crate::error::CoreError;

/// Materializes the reply tree under `root_id` from its flat descendant rows.
///
/// `rows` is the closed descendant set of the root, root inclusive. The result
/// holds the root's direct replies, each carrying its own replies, with every
/// level ordered by ascending id. Rows whose parent is not part of the set are
/// ignored. Fails with [`CoreError::CommentNotFound`] when the root row is
/// missing.
pub fn build_reply_tree<I>(root_id: Id, rows: I) -> Result<Vec<Comment>, CoreError>
where
    I: IntoIterator<Item = Comment>,
{
    let mut nodes: HashMap<Id, Comment> = HashMap::new();
    for mut row in rows {
        row.children.clear();
        nodes.insert(row.id, row);
    }
    if !nodes.contains_key(&root_id) {
        return Err(CoreError::CommentNotFound(root_id));
    }

    let mut children: HashMap<Id, Vec<Id>> = HashMap::new();
    for node in nodes.values() {
        let Some(parent_id) = node.parent_id else {
            continue;
        };
        if node.id != root_id && nodes.contains_key(&parent_id) {
            children.entry(parent_id).or_default().push(node.id);
        }
    }
    for ids in children.values_mut() {
        ids.sort_unstable();
    }

    // Breadth-first order puts every parent before its replies; assembling in
    // reverse therefore always finds a node's replies already complete.
    let mut order = Vec::with_capacity(nodes.len());
    let mut queue = VecDeque::from([root_id]);
    while let Some(id) = queue.pop_front() {
        order.push(id);
        if let Some(ids) = children.get(&id) {
            queue.extend(ids.iter().copied());
        }
    }

    for id in order.iter().rev() {
        let Some(child_ids) = children.get(id) else {
            continue;
        };
        let assembled: Vec<Comment> = child_ids
            .iter()
            .filter_map(|child_id| nodes.remove(child_id))
            .collect();
        if let Some(node) = nodes.get_mut(id) {
            node.children = assembled;
        }
    }

    Ok(nodes
        .remove(&root_id)
        .map(|root| root.children)
        .unwrap_or_default())
}
