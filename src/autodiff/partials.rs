//! # Partial Derivative Algebra
//!
//! Sparse maps of partial derivatives with a defined zero default, and the
//! combinators every operator and elementary function is built from.
//!
//! - first-order map `Der`: variable name -> vector of partials (one entry per evaluation point)
//! - second-order map `Der2`: ordered pair of names -> vector of second partials,
//!   stored symmetrically, so both `(x, y)` and `(y, x)` are present with equal values
//!
//! A key that is absent means "zero". Maps are built fresh by each operation and
//! frozen inside the resulting node.
use itertools::Itertools;
use nalgebra::DVector;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// first-order partials: d(value)/d(name)
pub type Der = HashMap<String, DVector<f64>>;
/// key of a second-order partial
pub type PairKey = (String, String);
/// second-order partials: d2(value)/d(x)d(y)
pub type Der2 = HashMap<PairKey, DVector<f64>>;

pub fn pair_key(x: &str, y: &str) -> PairKey {
    (x.to_string(), y.to_string())
}

/// zero-default lookup: returns the stored partial or the additive identity of length `n`
pub fn get_or_zero<K>(map: &HashMap<K, DVector<f64>>, key: &K, n: usize) -> DVector<f64>
where
    K: Eq + Hash,
{
    match map.get(key) {
        Some(d) => d.clone(),
        None => DVector::zeros(n),
    }
}

/// for each key in keys(a) ∪ keys(b) returns f(a[key] or 0, b[key] or 0)
pub fn zip_union<K, F>(
    a: &HashMap<K, DVector<f64>>,
    b: &HashMap<K, DVector<f64>>,
    n: usize,
    f: F,
) -> HashMap<K, DVector<f64>>
where
    K: Eq + Hash + Clone,
    F: Fn(&DVector<f64>, &DVector<f64>) -> DVector<f64>,
{
    let zero = DVector::zeros(n);
    let keys: HashSet<&K> = a.keys().chain(b.keys()).collect();
    keys.into_iter()
        .map(|key| {
            let da = a.get(key).unwrap_or(&zero);
            let db = b.get(key).unwrap_or(&zero);
            (key.clone(), f(da, db))
        })
        .collect()
}

/// applies f to every partial of the map
pub fn map_values<K, F>(map: &HashMap<K, DVector<f64>>, f: F) -> HashMap<K, DVector<f64>>
where
    K: Eq + Hash + Clone,
    F: Fn(&DVector<f64>) -> DVector<f64>,
{
    map.iter().map(|(k, d)| (k.clone(), f(d))).collect()
}

/// sorted union of the variable names two operands depend on
pub fn support(a: &Der, b: &Der) -> Vec<String> {
    a.keys().chain(b.keys()).cloned().sorted().dedup().collect()
}

/// Materializes the full second-order support of a binary operation.
///
/// For every pair (x, y) in (keys(a) ∪ keys(b))² the returned copies of `a2` and `b2`
/// hold an entry, zero where the operand had none. Product, quotient and power rules
/// need these cross terms even for variables only one operand depends on.
pub fn expand_pairs(a: &Der, b: &Der, a2: &Der2, b2: &Der2, n: usize) -> (Der2, Der2) {
    let names = support(a, b);
    let mut a2 = a2.clone();
    let mut b2 = b2.clone();
    for (x, y) in names.iter().cartesian_product(names.iter()) {
        a2.entry(pair_key(x, y)).or_insert_with(|| DVector::zeros(n));
        b2.entry(pair_key(x, y)).or_insert_with(|| DVector::zeros(n));
    }
    (a2, b2)
}

/// Builds a second-order map over all pairs of `names`.
///
/// `f` is evaluated once per unordered pair and the result is stored under both
/// orderings, so the map is symmetric exactly, not up to rounding.
pub fn symmetric_pairs<F>(names: &[String], mut f: F) -> Der2
where
    F: FnMut(&str, &str) -> DVector<f64>,
{
    let mut der2 = Der2::with_capacity(names.len() * names.len());
    for pair in names.iter().combinations_with_replacement(2) {
        let (x, y) = (pair[0], pair[1]);
        let d = f(x, y);
        if x != y {
            der2.insert(pair_key(y, x), d.clone());
        }
        der2.insert(pair_key(x, y), d);
    }
    der2
}

/// length of the result of combining operands of lengths n1 and n2
/// (equal lengths, or one of them is 1 and gets repeated); an empty operand has no result
pub fn common_len(n1: usize, n2: usize) -> Option<usize> {
    if n1 == 0 || n2 == 0 {
        None
    } else if n1 == n2 {
        Some(n1)
    } else if n1 == 1 {
        Some(n2)
    } else if n2 == 1 {
        Some(n1)
    } else {
        None
    }
}

/// repeats a length-1 vector up to length n; other vectors are returned as they are
pub fn broadcast(v: &DVector<f64>, n: usize) -> DVector<f64> {
    if v.len() == 1 && n != 1 {
        DVector::from_element(n, v[0])
    } else {
        v.clone()
    }
}

pub fn has_nan(v: &DVector<f64>) -> bool {
    v.iter().any(|x| x.is_nan())
}
