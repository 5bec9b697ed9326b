//! Assembles the flat todo list returned by the backend into a forest.
//!
//! A todo is a root when it has no `parent_id`, or when its parent is not
//! part of the same batch. Every other todo ends up owned by exactly one
//! parent. Roots and siblings keep their input order.

use crate::models::Todo;
use thiserror::Error;
use std::collections::{HashMap, HashSet};

#[derive(Clone, Debug, PartialEq)]
pub struct TodoNode {
    pub todo: Todo,
    pub children: Vec<TodoNode>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("todo id {0} appears more than once")]
    DuplicateId(u64),

    /// The parent chain of this todo never reaches a root.
    #[error("todo {0} is part of a parent cycle")]
    Cycle(u64),
}

/// Builds the forest for one fetched batch.
pub fn build_forest(todos: Vec<Todo>) -> Result<Vec<TodoNode>, TreeError> {
    let mut index_of: HashMap<u64, usize> = HashMap::with_capacity(todos.len());
    for (index, todo) in todos.iter().enumerate() {
        if index_of.insert(todo.id, index).is_some() {
            return Err(TreeError::DuplicateId(todo.id));
        }
    }

    let mut roots = Vec::new();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); todos.len()];
    for (index, todo) in todos.iter().enumerate() {
        match todo.parent_id.and_then(|parent| index_of.get(&parent)) {
            Some(&parent) => children[parent].push(index),
            None => roots.push(index),
        }
    }

    // Post-order walk with an explicit stack so long chains stay off the call stack.
    let mut slots: Vec<Option<Todo>> = todos.into_iter().map(Some).collect();
    let mut built: Vec<Option<TodoNode>> = vec![None; slots.len()];
    let mut placed = 0;
    let mut stack: Vec<(usize, bool)> = roots.iter().rev().map(|&root| (root, false)).collect();

    while let Some((index, expanded)) = stack.pop() {
        if expanded {
            let Some(todo) = slots[index].take() else {
                continue;
            };
            let node_children = children[index]
                .iter()
                .filter_map(|&child| built[child].take())
                .collect();
            built[index] = Some(TodoNode {
                todo,
                children: node_children,
            });
            placed += 1;
        } else {
            stack.push((index, true));
            stack.extend(children[index].iter().rev().map(|&child| (child, false)));
        }
    }

    if placed != slots.len() {
        return Err(TreeError::Cycle(cycle_member(&slots, &index_of)));
    }

    Ok(roots
        .into_iter()
        .filter_map(|root| built[root].take())
        .collect())
}

/// Follows parent links from the first unplaced todo until an index repeats.
/// Unplaced todos only point at other unplaced todos, so the repeat is on the cycle.
fn cycle_member(slots: &[Option<Todo>], index_of: &HashMap<u64, usize>) -> u64 {
    let mut seen = HashSet::new();
    let mut last = 0;
    let mut current = slots.iter().position(Option::is_some);
    while let Some(index) = current {
        let Some(todo) = &slots[index] else {
            break;
        };
        if !seen.insert(index) {
            return todo.id;
        }
        last = todo.id;
        current = todo.parent_id.and_then(|parent| index_of.get(&parent).copied());
    }
    last
}

/// Total number of todos held by a forest.
pub fn count(forest: &[TodoNode]) -> usize {
    let mut total = 0;
    let mut pending = vec![forest];
    while let Some(level) = pending.pop() {
        total += level.len();
        pending.extend(level.iter().map(|node| node.children.as_slice()));
    }
    total
}

/// One line of a flattened forest.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeRow<'a> {
    pub todo: &'a Todo,
    pub depth: usize,
    /// Whether this row is the last among its siblings.
    pub is_last: bool,
}

/// Depth-first, pre-order listing of the forest for display.
pub fn flatten(forest: &[TodoNode]) -> Vec<TreeRow<'_>> {
    let mut rows = Vec::new();
    let mut stack: Vec<(&TodoNode, usize, bool)> = Vec::new();
    push_siblings(&mut stack, forest, 0);

    while let Some((node, depth, is_last)) = stack.pop() {
        rows.push(TreeRow {
            todo: &node.todo,
            depth,
            is_last,
        });
        push_siblings(&mut stack, &node.children, depth + 1);
    }
    rows
}

fn push_siblings<'a>(stack: &mut Vec<(&'a TodoNode, usize, bool)>, nodes: &'a [TodoNode], depth: usize) {
    let last = nodes.len().saturating_sub(1);
    stack.extend(
        nodes
            .iter()
            .enumerate()
            .rev()
            .map(|(i, node)| (node, depth, i == last)),
    );
}
