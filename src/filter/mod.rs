//! Filter tree model
//!
//! A recursive AND/OR tree of rules and nested groups, edited through pure
//! operations that return a new tree.
//!
//! # Design Principles
//!
//! - Trees are values: no operation mutates its input
//! - Untouched subtrees are shared between versions
//! - Unknown ids are no-ops, never errors
//! - Incomplete rules live in the tree but never reach a request

mod ops;
mod tree;

pub use ops::{
    add_group, add_rule, contains, depth_of, find_group, find_node, find_rule, insert_node,
    prune, prune_incomplete, remove_node, rule_count, toggle_logic, update_rule,
};
pub use tree::{FilterGroup, FilterNode, FilterRule, Logic, RulePatch};
