//! Pure filter tree operations
//!
//! Every mutation takes a tree and returns a new one; the input is never
//! touched. Only the path from the root to the affected node is rebuilt,
//! and sibling subtrees are shared by `Arc`. An id that is not in the tree
//! makes the operation a no-op: the returned tree equals the input.

use std::sync::Arc;

use super::tree::{FilterGroup, FilterNode, FilterRule, RulePatch};
use crate::id::ModelId;

/// Appends an empty rule to the group `group_id`
pub fn add_rule(tree: &FilterGroup, group_id: &ModelId) -> FilterGroup {
    insert_node(tree, group_id, FilterNode::Rule(FilterRule::empty()))
}

/// Appends an empty `AND` group to the group `group_id`
pub fn add_group(tree: &FilterGroup, group_id: &ModelId) -> FilterGroup {
    insert_node(tree, group_id, FilterNode::Group(FilterGroup::empty()))
}

/// Appends `node` to the group `group_id`
///
/// Lets the caller learn the new node's id before it is inserted.
pub fn insert_node(tree: &FilterGroup, group_id: &ModelId, node: FilterNode) -> FilterGroup {
    let node = Arc::new(node);
    rewrite_group(tree, group_id, &|group| {
        let mut rules = group.rules.clone();
        rules.push(Arc::clone(&node));
        group.with_rules(rules)
    })
    .unwrap_or_else(|| tree.clone())
}

/// Removes the rule or group `node_id` from wherever it occurs
///
/// The root has no parent and cannot be removed this way.
pub fn remove_node(tree: &FilterGroup, node_id: &ModelId) -> FilterGroup {
    rewrite_child(tree, node_id, &|_| Rewrite::Remove).unwrap_or_else(|| tree.clone())
}

/// Merges `patch` into the rule `rule_id`
///
/// Only `field`, `operator` and `value` change. Changing the field does not
/// reset operator or value here; callers that change a rule's field do that
/// themselves, since this operation also serves value-only edits.
pub fn update_rule(tree: &FilterGroup, rule_id: &ModelId, patch: &RulePatch) -> FilterGroup {
    if patch.is_empty() {
        return tree.clone();
    }
    rewrite_child(tree, rule_id, &|node| match node {
        FilterNode::Rule(rule) => Rewrite::Replace(FilterNode::Rule(rule.patched(patch))),
        FilterNode::Group(_) => Rewrite::Keep,
    })
    .unwrap_or_else(|| tree.clone())
}

/// Flips `AND`/`OR` on the group `group_id` only
pub fn toggle_logic(tree: &FilterGroup, group_id: &ModelId) -> FilterGroup {
    rewrite_group(tree, group_id, &|group| {
        let mut toggled = group.with_rules(group.rules.clone());
        toggled.logic = group.logic.toggled();
        toggled
    })
    .unwrap_or_else(|| tree.clone())
}

/// Returns a copy without the rules `keep` rejects
///
/// Sub-groups left without children are dropped as well; the root is always
/// kept. Used to derive the serialized form of a tree.
pub fn prune(tree: &FilterGroup, keep: &dyn Fn(&FilterRule) -> bool) -> FilterGroup {
    let rules = tree
        .rules
        .iter()
        .filter_map(|child| match child.as_ref() {
            FilterNode::Rule(rule) => keep(rule).then(|| Arc::clone(child)),
            FilterNode::Group(group) => {
                let pruned = prune(group, keep);
                if pruned.is_empty() {
                    None
                } else if pruned == *group {
                    Some(Arc::clone(child))
                } else {
                    Some(Arc::new(FilterNode::Group(pruned)))
                }
            }
        })
        .collect();
    tree.with_rules(rules)
}

/// Copy with incomplete rules and rules `accept` rejects removed
pub fn prune_incomplete(tree: &FilterGroup, accept: &dyn Fn(&FilterRule) -> bool) -> FilterGroup {
    prune(tree, &|rule| !rule.is_incomplete() && accept(rule))
}

/// Finds a node anywhere below the root
pub fn find_node<'a>(tree: &'a FilterGroup, node_id: &ModelId) -> Option<&'a FilterNode> {
    tree.rules.iter().find_map(|child| {
        if child.id() == node_id {
            return Some(child.as_ref());
        }
        child.as_group().and_then(|group| find_node(group, node_id))
    })
}

/// Finds a rule anywhere in the tree
pub fn find_rule<'a>(tree: &'a FilterGroup, rule_id: &ModelId) -> Option<&'a FilterRule> {
    tree.rules.iter().find_map(|child| match child.as_ref() {
        FilterNode::Rule(rule) if &rule.id == rule_id => Some(rule),
        FilterNode::Rule(_) => None,
        FilterNode::Group(group) => find_rule(group, rule_id),
    })
}

/// Finds a group anywhere in the tree, the root included
pub fn find_group<'a>(tree: &'a FilterGroup, group_id: &ModelId) -> Option<&'a FilterGroup> {
    if &tree.id == group_id {
        return Some(tree);
    }
    tree.rules
        .iter()
        .filter_map(|child| child.as_group())
        .find_map(|group| find_group(group, group_id))
}

/// Whether any node in the tree has this id
pub fn contains(tree: &FilterGroup, node_id: &ModelId) -> bool {
    depth_of(tree, node_id).is_some()
}

/// Nesting depth of a node; the root is at depth 1
pub fn depth_of(tree: &FilterGroup, node_id: &ModelId) -> Option<usize> {
    if &tree.id == node_id {
        return Some(1);
    }
    tree.rules.iter().find_map(|child| match child.as_ref() {
        FilterNode::Rule(rule) => (&rule.id == node_id).then_some(2),
        FilterNode::Group(group) => depth_of(group, node_id).map(|d| d + 1),
    })
}

/// Number of rules in the whole tree, incomplete ones included
pub fn rule_count(tree: &FilterGroup) -> usize {
    tree.rules
        .iter()
        .map(|child| match child.as_ref() {
            FilterNode::Rule(_) => 1,
            FilterNode::Group(group) => rule_count(group),
        })
        .sum()
}

enum Rewrite {
    Replace(FilterNode),
    Remove,
    Keep,
}

/// Applies `f` to the group `target` and rebuilds the path above it.
/// Returns `None` when `target` is not in the tree.
fn rewrite_group(
    group: &FilterGroup,
    target: &ModelId,
    f: &dyn Fn(&FilterGroup) -> FilterGroup,
) -> Option<FilterGroup> {
    if &group.id == target {
        return Some(f(group));
    }

    group.rules.iter().enumerate().find_map(|(idx, child)| {
        let sub = child.as_group()?;
        let rewritten = rewrite_group(sub, target, f)?;
        let mut rules = group.rules.clone();
        rules[idx] = Arc::new(FilterNode::Group(rewritten));
        Some(group.with_rules(rules))
    })
}

/// Applies `f` to the child node `target` of whichever group holds it.
/// Returns `None` when `target` is not a descendant or `f` keeps it.
fn rewrite_child(
    group: &FilterGroup,
    target: &ModelId,
    f: &dyn Fn(&FilterNode) -> Rewrite,
) -> Option<FilterGroup> {
    for (idx, child) in group.rules.iter().enumerate() {
        if child.id() == target {
            let mut rules = group.rules.clone();
            match f(child) {
                Rewrite::Replace(node) => rules[idx] = Arc::new(node),
                Rewrite::Remove => {
                    rules.remove(idx);
                }
                Rewrite::Keep => return None,
            }
            return Some(group.with_rules(rules));
        }

        if let FilterNode::Group(sub) = child.as_ref() {
            if let Some(rewritten) = rewrite_child(sub, target, f) {
                let mut rules = group.rules.clone();
                rules[idx] = Arc::new(FilterNode::Group(rewritten));
                return Some(group.with_rules(rules));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Logic;
    use crate::schema::Operator;
    use serde_json::json;

    /// root(AND)
    ///  ├── rule status = missed
    ///  └── group(OR)
    ///       ├── rule duration > 30
    ///       └── rule empty
    fn sample_tree() -> FilterGroup {
        let inner = FilterGroup::with_logic(Logic::Or)
            .with_child(FilterRule::new("duration", Operator::Gt, json!(30)).into())
            .with_child(FilterRule::empty().into());
        FilterGroup::empty()
            .with_child(FilterRule::new("status", Operator::Eq, json!("missed")).into())
            .with_child(inner.into())
    }

    fn inner_group(tree: &FilterGroup) -> &FilterGroup {
        tree.rules[1].as_group().unwrap()
    }

    #[test]
    fn test_add_rule_to_root() {
        let root = FilterGroup::empty();
        let updated = add_rule(&root, &root.id);

        assert!(root.rules.is_empty());
        assert_eq!(updated.rules.len(), 1);
        let rule = updated.rules[0].as_rule().unwrap();
        assert!(rule.is_incomplete());
        assert_eq!(rule.operator, Operator::Eq);
        assert_eq!(rule.value, json!(""));
    }

    #[test]
    fn test_add_rule_to_nested_group() {
        let tree = sample_tree();
        let inner_id = inner_group(&tree).id.clone();

        let updated = add_rule(&tree, &inner_id);
        assert_eq!(inner_group(&updated).rules.len(), 3);
        assert_eq!(inner_group(&tree).rules.len(), 2);
    }

    #[test]
    fn test_add_group_appends_empty_and_group() {
        let tree = sample_tree();
        let updated = add_group(&tree, &tree.id);

        let added = updated.rules[2].as_group().unwrap();
        assert_eq!(added.logic, Logic::And);
        assert!(added.rules.is_empty());
    }

    #[test]
    fn test_untouched_siblings_are_shared() {
        let tree = sample_tree();
        let inner_id = inner_group(&tree).id.clone();

        let updated = add_rule(&tree, &inner_id);
        assert!(Arc::ptr_eq(&tree.rules[0], &updated.rules[0]));
        assert!(!Arc::ptr_eq(&tree.rules[1], &updated.rules[1]));
    }

    #[test]
    fn test_input_unchanged_after_every_operation() {
        let tree = sample_tree();
        let before = tree.clone();
        let inner_id = inner_group(&tree).id.clone();
        let rule_id = tree.rules[0].id().clone();

        let _ = add_rule(&tree, &inner_id);
        let _ = add_group(&tree, &tree.id);
        let _ = remove_node(&tree, &inner_id);
        let _ = update_rule(&tree, &rule_id, &RulePatch::value(json!("answered")));
        let _ = toggle_logic(&tree, &inner_id);

        assert_eq!(tree, before);
    }

    #[test]
    fn test_add_then_remove_round_trips() {
        let tree = sample_tree();
        let inner_id = inner_group(&tree).id.clone();
        let rule = FilterRule::empty();
        let rule_id = rule.id.clone();

        let added = insert_node(&tree, &inner_id, rule.into());
        assert_ne!(added, tree);
        let removed = remove_node(&added, &rule_id);
        assert_eq!(removed, tree);
    }

    #[test]
    fn test_missing_id_is_noop() {
        let tree = sample_tree();
        let missing = ModelId::from("nonexistent");

        assert_eq!(remove_node(&tree, &missing), tree);
        assert_eq!(add_rule(&tree, &missing), tree);
        assert_eq!(add_group(&tree, &missing), tree);
        assert_eq!(toggle_logic(&tree, &missing), tree);
        assert_eq!(update_rule(&tree, &missing, &RulePatch::field("x")), tree);
    }

    #[test]
    fn test_add_rule_to_rule_id_is_noop() {
        let tree = sample_tree();
        let rule_id = tree.rules[0].id().clone();
        assert_eq!(add_rule(&tree, &rule_id), tree);
    }

    #[test]
    fn test_remove_root_is_noop() {
        let tree = sample_tree();
        assert_eq!(remove_node(&tree, &tree.id), tree);
    }

    #[test]
    fn test_remove_nested_group_removes_subtree() {
        let tree = sample_tree();
        let inner_id = inner_group(&tree).id.clone();

        let updated = remove_node(&tree, &inner_id);
        assert_eq!(updated.rules.len(), 1);
        assert_eq!(rule_count(&updated), 1);
    }

    #[test]
    fn test_remove_after_ancestor_removed_is_noop() {
        let tree = sample_tree();
        let inner = inner_group(&tree);
        let inner_id = inner.id.clone();
        let nested_rule = inner.rules[0].id().clone();

        let without_group = remove_node(&tree, &inner_id);
        assert_eq!(remove_node(&without_group, &nested_rule), without_group);
    }

    #[test]
    fn test_update_rule_merges_patch_only() {
        let tree = sample_tree();
        let inner = inner_group(&tree);
        let rule_id = inner.rules[0].id().clone();

        let updated = update_rule(&tree, &rule_id, &RulePatch::value(json!(60)));
        let rule = find_rule(&updated, &rule_id).unwrap();
        assert_eq!(rule.field, "duration");
        assert_eq!(rule.operator, Operator::Gt);
        assert_eq!(rule.value, json!(60));
    }

    #[test]
    fn test_update_rule_does_not_reset_operator_on_field_change() {
        let tree = sample_tree();
        let rule_id = tree.rules[0].id().clone();

        let updated = update_rule(&tree, &rule_id, &RulePatch::field("region"));
        let rule = find_rule(&updated, &rule_id).unwrap();
        assert_eq!(rule.field, "region");
        assert_eq!(rule.operator, Operator::Eq);
        assert_eq!(rule.value, json!("missed"));
    }

    #[test]
    fn test_update_rule_on_group_id_is_noop() {
        let tree = sample_tree();
        let inner_id = inner_group(&tree).id.clone();
        assert_eq!(update_rule(&tree, &inner_id, &RulePatch::field("x")), tree);
    }

    #[test]
    fn test_toggle_logic_is_not_recursive() {
        let tree = sample_tree();

        let toggled = toggle_logic(&tree, &tree.id);
        assert_eq!(toggled.logic, Logic::Or);
        assert_eq!(inner_group(&toggled).logic, Logic::Or);

        let twice = toggle_logic(&toggled, &tree.id);
        assert_eq!(twice, tree);
    }

    #[test]
    fn test_prune_drops_incomplete_rules_and_empty_groups() {
        let tree = sample_tree();
        let pruned = prune_incomplete(&tree, &|_| true);

        assert_eq!(rule_count(&pruned), 2);
        assert_eq!(inner_group(&pruned).rules.len(), 1);

        let only_empty = FilterGroup::empty().with_child(
            FilterGroup::empty()
                .with_child(FilterRule::empty().into())
                .into(),
        );
        let pruned = prune(&only_empty, &|rule| !rule.is_incomplete());
        assert!(pruned.rules.is_empty());
        assert_eq!(pruned.id, only_empty.id);
    }

    #[test]
    fn test_prune_incomplete_applies_predicate() {
        let tree = sample_tree();
        let pruned = prune_incomplete(&tree, &|rule| rule.field != "duration");

        assert_eq!(rule_count(&pruned), 1);
        assert_eq!(pruned.rules.len(), 1);
    }

    #[test]
    fn test_prune_shares_unchanged_groups() {
        let tree = FilterGroup::empty().with_child(
            FilterGroup::empty()
                .with_child(FilterRule::new("a", Operator::Eq, json!(1)).into())
                .into(),
        );
        let pruned = prune(&tree, &|_| true);
        assert!(Arc::ptr_eq(&tree.rules[0], &pruned.rules[0]));
    }

    #[test]
    fn test_depth_and_lookup() {
        let tree = sample_tree();
        let inner = inner_group(&tree);

        assert_eq!(depth_of(&tree, &tree.id), Some(1));
        assert_eq!(depth_of(&tree, &inner.id), Some(2));
        assert_eq!(depth_of(&tree, inner.rules[0].id()), Some(3));
        assert_eq!(depth_of(&tree, &ModelId::from("missing")), None);

        assert!(find_group(&tree, &inner.id).is_some());
        assert!(find_node(&tree, inner.rules[1].id()).unwrap().as_rule().is_some());
        assert!(find_node(&tree, &tree.id).is_none());
        assert!(find_group(&tree, inner.rules[0].id()).is_none());
        assert!(contains(&tree, inner.rules[1].id()));
        assert_eq!(rule_count(&tree), 3);
    }
}
