//! Route resolution over a menu tree.
//!
//! Free functions taking `(nodes, ...)` and returning plain data: node -> path
//! (`build_route`) and path -> node (`match_path_segments`). Both directions
//! derive URL segments through `resolve_path_segment` only.
//!
//! Keys are assumed unique across the tree. With duplicates, the first node
//! found depth-first wins; nothing is corrected or reported.

use navshell_core::MenuKey;

use crate::model::MenuNode;

/// Depth-first search for `key` across the whole subtree.
pub fn find_by_key<'a>(nodes: &'a [MenuNode], key: &str) -> Option<&'a MenuNode> {
    nodes.iter().find_map(|node| {
        if node.key.as_str() == key {
            Some(node)
        } else {
            find_by_key(&node.children, key)
        }
    })
}

/// Ancestor keys of `target` from root to immediate parent (target excluded).
///
/// `Some(vec![])` for a top-level node, `None` when `target` is absent.
pub fn ancestor_chain(nodes: &[MenuNode], target: &str) -> Option<Vec<MenuKey>> {
    let mut path = node_path(nodes, target)?;
    path.pop();
    Some(path.into_iter().map(|node| node.key.clone()).collect())
}

/// Route slug of a node: its trimmed `route`, or its key when the route is
/// missing or blank.
pub fn resolve_path_segment(node: &MenuNode) -> &str {
    match node.route.as_deref().map(route_slug) {
        Some(slug) if !slug.is_empty() => slug,
        _ => node.key.as_str(),
    }
}

/// Full route to `target`: `base_prefix` followed by the slug of every
/// ancestor and of the target itself.
///
/// The result starts with exactly one `/` and never contains `//`.
pub fn build_route(nodes: &[MenuNode], target: &str, base_prefix: &str) -> Option<String> {
    let path = node_path(nodes, target)?;
    let mut parts = vec![base_prefix];
    parts.extend(path.into_iter().map(resolve_path_segment));
    Some(join_route(parts))
}

/// Inverse of `build_route`: resolve URL segments (base prefix already
/// removed) to a node, starting at `segments[depth]`.
///
/// When a matched node has no children but segments remain, that node is
/// returned: the rest of the path belongs to whatever the node mounts.
pub fn match_path_segments<'a>(
    nodes: &'a [MenuNode],
    segments: &[&str],
    depth: usize,
) -> Option<&'a MenuNode> {
    let remaining = segments.get(depth..).filter(|rest| !rest.is_empty())?;

    // Longest slug first, so `reports` cannot shadow a sibling routed at
    // `reports/daily`. Ties keep sibling order.
    let mut candidates: Vec<(usize, &MenuNode)> = nodes
        .iter()
        .filter_map(|node| slug_prefix_len(node, remaining).map(|consumed| (consumed, node)))
        .collect();
    candidates.sort_by(|a, b| b.0.cmp(&a.0));

    candidates.into_iter().find_map(|(consumed, node)| {
        let next = depth + consumed;
        if next == segments.len() || node.is_leaf() {
            Some(node)
        } else {
            match_path_segments(&node.children, segments, next)
        }
    })
}

/// First genuinely navigable node, depth-first: a node with its own route or
/// with no children. Pure groupings are descended into.
pub fn first_navigable(nodes: &[MenuNode]) -> Option<&MenuNode> {
    nodes.iter().find_map(|node| {
        if node.is_navigable() {
            Some(node)
        } else {
            first_navigable(&node.children)
        }
    })
}

/// Non-empty `/`-separated segments of a path.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Segments of `path` below `base_prefix`, or `None` if `path` is not under it.
///
/// Compared segment by segment, so `/apps/ab` is not under `/apps/a`.
pub fn relative_segments<'p>(path: &'p str, base_prefix: &str) -> Option<Vec<&'p str>> {
    let segments = split_path(path);
    let base = split_path(base_prefix);
    if segments.len() < base.len() || segments[..base.len()] != base[..] {
        return None;
    }
    Some(segments[base.len()..].to_vec())
}

/// Join route parts with single slashes and one leading `/`.
pub fn join_route<'s>(parts: impl IntoIterator<Item = &'s str>) -> String {
    let joined = parts
        .into_iter()
        .flat_map(split_path)
        .collect::<Vec<_>>()
        .join("/");
    format!("/{joined}")
}

/// Nodes from the root down to `target` (inclusive).
fn node_path<'a>(nodes: &'a [MenuNode], target: &str) -> Option<Vec<&'a MenuNode>> {
    fn walk<'a>(nodes: &'a [MenuNode], target: &str, path: &mut Vec<&'a MenuNode>) -> bool {
        for node in nodes {
            path.push(node);
            if node.key.as_str() == target || walk(&node.children, target, path) {
                return true;
            }
            path.pop();
        }
        false
    }

    let mut path = Vec::new();
    walk(nodes, target, &mut path).then_some(path)
}

/// How many of `remaining` the node's slug covers, if it is a prefix.
fn slug_prefix_len(node: &MenuNode, remaining: &[&str]) -> Option<usize> {
    let slug = split_path(resolve_path_segment(node));
    let n = slug.len();
    (n > 0 && remaining.len() >= n && remaining[..n] == slug[..]).then_some(n)
}

pub(crate) fn route_slug(route: &str) -> &str {
    route.trim().trim_matches('/').trim()
}
