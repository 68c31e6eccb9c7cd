use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeSet;

fn validate_tree(t: &AvlTree<i32>) {
    assert_eq!(t.check_invariants(), Ok(()));

    let n = t.len();
    let bound = (1.44 * ((n + 2) as f64).log2()).ceil() as usize;
    assert!(
        t.height() <= bound,
        "height {} exceeds AVL bound {} for {} nodes",
        t.height(),
        bound,
        n
    );
}

/// Values are drawn from a narrow range so inserts collide and removes hit.
#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 5)]
    Insert(#[proptest(strategy = "-200i32..200")] i32),
    #[proptest(weight = 3)]
    Remove(#[proptest(strategy = "-200i32..200")] i32),
    #[proptest(weight = 2)]
    Contains(#[proptest(strategy = "-200i32..200")] i32),
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_with_btreeset(ops in prop::collection::vec(any::<Op>(), 0..=1000)) {
        let mut t: AvlTree<i32> = AvlTree::new();
        let mut m: BTreeSet<i32> = BTreeSet::new();

        for op in ops {
            match op {
                Op::Insert(v) => {
                    prop_assert_eq!(t.insert(v), m.insert(v));
                }
                Op::Remove(v) => {
                    prop_assert_eq!(t.remove(&v), m.remove(&v));
                }
                Op::Contains(v) => {
                    prop_assert_eq!(t.contains(&v), m.contains(&v));
                }
            }
            prop_assert_eq!(t.len(), m.len());
        }

        validate_tree(&t);
        let got: Vec<i32> = t.iter().copied().collect();
        let expected: Vec<i32> = m.iter().copied().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_every_step_keeps_invariants(values in prop::collection::vec(-50i32..50, 0..=120)) {
        let mut t: AvlTree<i32> = AvlTree::new();
        for &v in &values {
            t.insert(v);
            validate_tree(&t);
        }
        for &v in values.iter().rev() {
            t.remove(&v);
            validate_tree(&t);
        }
        prop_assert!(t.is_empty());
    }

    #[test]
    fn prop_duplicate_insert_is_idempotent(values in prop::collection::vec(any::<i32>(), 1..=200), pick in any::<prop::sample::Index>()) {
        let mut t: AvlTree<i32> = values.iter().copied().collect();
        let before = t.to_display_string();
        let len = t.len();

        let dup = values[pick.index(values.len())];
        prop_assert!(!t.insert(dup));
        prop_assert_eq!(t.len(), len);
        prop_assert_eq!(t.to_display_string(), before);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let values: Vec<i32> = (1..=7).collect();

    for_each_permutation(&values, |perm| {
        let mut t: AvlTree<i32> = AvlTree::new();
        for &v in &perm {
            assert!(t.insert(v));
            validate_tree(&t);
        }
        assert_eq!(t.len(), values.len());
        assert!(t.iter().eq(values.iter()), "order broken for {perm:?}");
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let values: Vec<i32> = (1..=7).collect();

    // Insert in a fixed order, then remove in all permutations.
    let base: AvlTree<i32> = [4, 2, 6, 1, 3, 5, 7, 8].into_iter().collect();
    validate_tree(&base);

    for_each_permutation(&values, |perm| {
        let mut t = base.clone();
        let mut m: BTreeSet<i32> = base.iter().copied().collect();

        for v in perm {
            assert_eq!(t.remove(&v), m.remove(&v));
            assert_eq!(t.len(), m.len());
            validate_tree(&t);
        }
        assert_eq!(t.len(), 1);
        assert_eq!(t.root().map(|n| *n.value()), Some(8));
    });
}
