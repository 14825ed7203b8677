//! Permission scoping of a menu tree.

use navshell_auth::Grants;

use crate::model::MenuNode;

/// Copy of `nodes` restricted to what `grants` allows.
///
/// A hidden node hides its whole subtree. A grouping node (no route of its
/// own) whose children were all hidden is dropped as well.
pub fn scope_nodes(nodes: &[MenuNode], grants: &Grants) -> Vec<MenuNode> {
    nodes.iter().filter_map(|node| scope_node(node, grants)).collect()
}

fn scope_node(node: &MenuNode, grants: &Grants) -> Option<MenuNode> {
    if !grants.allows(node.permission.as_ref()) {
        return None;
    }

    let children = scope_nodes(&node.children, grants);
    if !node.children.is_empty() && children.is_empty() && !node.has_explicit_route() {
        tracing::debug!(key = %node.key, "dropping menu group with no visible children");
        return None;
    }

    Some(MenuNode {
        key: node.key.clone(),
        label: node.label.clone(),
        route: node.route.clone(),
        icon: node.icon.clone(),
        description: node.description.clone(),
        badge: node.badge.clone(),
        permission: node.permission.clone(),
        children,
    })
}
