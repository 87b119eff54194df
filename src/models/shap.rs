//! Path-dependent TreeSHAP (Lundberg et al., "Consistent Individualized
//! Feature Attribution for Tree Ensembles", Algorithm 2).
//!
//! Contributions are in the tree's output units (log-odds) and satisfy
//! `expected_value + sum(phi) == tree output` for every input.

use crate::models::ensemble::{Node, Tree};

#[derive(Debug, Clone, Copy)]
struct PathElement {
    /// `None` for the root sentinel
    feature: Option<usize>,
    zero_fraction: f64,
    one_fraction: f64,
    weight: f64,
}

/// Add the contributions of `tree` for input `x` into `phi`
pub(crate) fn tree_shap(tree: &Tree, x: &[f64], phi: &mut [f64]) -> Result<(), String> {
    recurse(tree, 0, x, phi, &[], 1.0, 1.0, None)
}

#[allow(clippy::too_many_arguments)]
fn recurse(
    tree: &Tree,
    idx: usize,
    x: &[f64],
    phi: &mut [f64],
    parent_path: &[PathElement],
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<usize>,
) -> Result<(), String> {
    let mut path = parent_path.to_vec();
    extend(&mut path, zero_fraction, one_fraction, feature);

    match tree.nodes[idx] {
        Node::Leaf { value, .. } => {
            for i in 1..path.len() {
                let element = path[i];
                if let Some(f) = element.feature {
                    let weight = unwound_sum(&path, i);
                    phi[f] += weight * (element.one_fraction - element.zero_fraction) * value;
                }
            }
        }
        Node::Split {
            feature: split_feature,
            yes,
            no,
            cover,
            ..
        } => {
            if cover <= 0.0 {
                return Err(format!("node {} has no cover statistics", idx));
            }

            let hot = tree.next(idx, x);
            let cold = if hot == yes { no } else { yes };

            // A feature seen earlier on the path is folded into this split
            let mut incoming_zero = 1.0;
            let mut incoming_one = 1.0;
            if let Some(k) = (1..path.len()).find(|&k| path[k].feature == Some(split_feature)) {
                incoming_zero = path[k].zero_fraction;
                incoming_one = path[k].one_fraction;
                unwind(&mut path, k);
            }

            let hot_zero = incoming_zero * tree.nodes[hot].cover() / cover;
            let cold_zero = incoming_zero * tree.nodes[cold].cover() / cover;

            recurse(tree, hot, x, phi, &path, hot_zero, incoming_one, Some(split_feature))?;
            // An empty cold branch contributes nothing
            if cold_zero > 0.0 {
                recurse(tree, cold, x, phi, &path, cold_zero, 0.0, Some(split_feature))?;
            }
        }
    }

    Ok(())
}

fn extend(path: &mut Vec<PathElement>, zero_fraction: f64, one_fraction: f64, feature: Option<usize>) {
    let depth = path.len();
    path.push(PathElement {
        feature,
        zero_fraction,
        one_fraction,
        weight: if depth == 0 { 1.0 } else { 0.0 },
    });

    let scale = (depth + 1) as f64;
    for i in (0..depth).rev() {
        path[i + 1].weight += one_fraction * path[i].weight * (i + 1) as f64 / scale;
        path[i].weight = zero_fraction * path[i].weight * (depth - i) as f64 / scale;
    }
}

fn unwind(path: &mut Vec<PathElement>, index: usize) {
    let depth = path.len() - 1;
    let one_fraction = path[index].one_fraction;
    let zero_fraction = path[index].zero_fraction;
    let scale = (depth + 1) as f64;
    let mut next = path[depth].weight;

    for j in (0..depth).rev() {
        if one_fraction != 0.0 {
            let tmp = path[j].weight;
            path[j].weight = next * scale / ((j + 1) as f64 * one_fraction);
            next = tmp - path[j].weight * zero_fraction * (depth - j) as f64 / scale;
        } else {
            path[j].weight = path[j].weight * scale / (zero_fraction * (depth - j) as f64);
        }
    }

    for j in index..depth {
        path[j].feature = path[j + 1].feature;
        path[j].zero_fraction = path[j + 1].zero_fraction;
        path[j].one_fraction = path[j + 1].one_fraction;
    }
    path.pop();
}

/// Total path weight after unwinding `index`, without modifying the path
fn unwound_sum(path: &[PathElement], index: usize) -> f64 {
    let depth = path.len() - 1;
    let one_fraction = path[index].one_fraction;
    let zero_fraction = path[index].zero_fraction;
    let scale = (depth + 1) as f64;
    let mut next = path[depth].weight;
    let mut total = 0.0;

    for j in (0..depth).rev() {
        if one_fraction != 0.0 {
            let tmp = next * scale / ((j + 1) as f64 * one_fraction);
            total += tmp;
            next = path[j].weight - tmp * zero_fraction * (depth - j) as f64 / scale;
        } else if zero_fraction != 0.0 {
            total += path[j].weight / zero_fraction * scale / (depth - j) as f64;
        }
    }

    total
}
