use crate::order::{Compare, Fallible, TryLess};
use crate::tree::{Search, Tree};
use crate::{ComparisonError, FunctionMaxima, LookupError};
use rand::*;
use slotmap::DefaultKey;
use std::cell::Cell;
use std::collections::BTreeMap;

/// Lets a fixed number of comparisons through, then fails every one after that.
#[derive(Clone, Default)]
struct Fuse {
    budget: Cell<Option<usize>>,
}

impl Fuse {
    fn arm(&self, budget: usize) {
        self.budget.set(Some(budget));
    }

    fn disarm(&self) {
        self.budget.set(None);
    }
}

impl<T: Ord> Compare<T> for Fuse {
    fn less(&self, lhs: &T, rhs: &T) -> Result<bool, ComparisonError> {
        match self.budget.get() {
            Some(0) => Err(ComparisonError::new("fuse blown")),
            Some(n) => {
                self.budget.set(Some(n - 1));
                Ok(lhs < rhs)
            }
            None => Ok(lhs < rhs),
        }
    }
}

/// Readings that cannot be ordered while absent.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Gauge(Option<u32>);

impl TryLess for Gauge {
    fn try_less(&self, other: &Self) -> Result<bool, ComparisonError> {
        match (self.0, other.0) {
            (Some(x), Some(y)) => Ok(x < y),
            _ => Err(ComparisonError::new("gauge has no reading")),
        }
    }
}

type Snapshot = (Vec<(i32, i32)>, Vec<(i32, i32)>, usize);

fn points<C>(f: &FunctionMaxima<i32, i32, C>) -> Vec<(i32, i32)> {
    f.iter().map(|p| (*p.arg(), *p.value())).collect()
}

fn maxima<C>(f: &FunctionMaxima<i32, i32, C>) -> Vec<(i32, i32)> {
    f.maxima_iter().map(|p| (*p.arg(), *p.value())).collect()
}

fn snapshot<C>(f: &FunctionMaxima<i32, i32, C>) -> Snapshot {
    (points(f), maxima(f), f.size())
}

fn build(points: &[(i32, i32)]) -> FunctionMaxima<i32, i32> {
    let mut f = FunctionMaxima::new();
    for &(a, v) in points {
        f.set_value(a, v).unwrap();
    }
    f
}

/// Linear scan for local maxima, ranked by descending value then ascending argument.
fn brute_force_maxima(model: &BTreeMap<i32, i32>) -> Vec<(i32, i32)> {
    let points: Vec<(i32, i32)> = model.iter().map(|(a, v)| (*a, *v)).collect();
    let mut maxima: Vec<(i32, i32)> = (0..points.len())
        .filter(|&i| {
            let v = points[i].1;
            (i == 0 || points[i - 1].1 <= v) && (i + 1 == points.len() || points[i + 1].1 <= v)
        })
        .map(|i| points[i])
        .collect();
    maxima.sort_by(|x, y| y.1.cmp(&x.1).then(x.0.cmp(&y.0)));
    maxima
}

#[test]
fn test_valley_between_equal_peaks() {
    let f = build(&[(1, 10), (2, 5), (3, 10)]);
    f.audit().unwrap();
    assert_eq!(maxima(&f), vec![(1, 10), (3, 10)]);
}

#[test]
fn test_strictly_increasing_run() {
    let f = build(&[(1, 1), (2, 2), (3, 3)]);
    f.audit().unwrap();
    assert_eq!(maxima(&f), vec![(3, 3)]);
}

#[test]
fn test_erase_inside_plateau() {
    let mut f = build(&[(1, 5), (2, 5), (3, 5)]);
    assert_eq!(maxima(&f), vec![(1, 5), (2, 5), (3, 5)]);
    f.erase(&2).unwrap();
    f.audit().unwrap();
    assert_eq!(points(&f), vec![(1, 5), (3, 5)]);
    assert_eq!(maxima(&f), vec![(1, 5), (3, 5)]);
}

#[test]
fn test_raise_valley_above_neighbours() {
    let mut f = build(&[(1, 5), (2, 1), (3, 5)]);
    assert_eq!(maxima(&f), vec![(1, 5), (3, 5)]);
    f.set_value(2, 10).unwrap();
    f.audit().unwrap();
    assert_eq!(maxima(&f), vec![(2, 10)]);
}

#[test]
fn test_erase_exposes_neighbour() {
    let mut f = build(&[(1, 5), (2, 10), (3, 1)]);
    assert_eq!(maxima(&f), vec![(2, 10)]);
    f.erase(&2).unwrap();
    f.audit().unwrap();
    assert_eq!(maxima(&f), vec![(1, 5)]);
}

#[test]
fn test_round_trip_and_removal() {
    let mut f = FunctionMaxima::new();
    assert!(matches!(f.value_at(&7), Err(LookupError::NotFound)));
    f.set_value(7, -3).unwrap();
    assert_eq!(*f.value_at(&7).unwrap(), -3);
    assert_eq!(f.size(), 1);

    f.erase(&8).unwrap();
    assert_eq!(f.size(), 1);
    f.erase(&7).unwrap();
    assert_eq!(f.size(), 0);
    assert!(f.is_empty());
    assert!(matches!(f.value_at(&7), Err(LookupError::NotFound)));
    assert_eq!(f.maxima_iter().count(), 0);
    f.audit().unwrap();
}

#[test]
fn test_equivalent_overwrite_is_idempotent() {
    let mut f = build(&[(1, 4), (2, 9), (3, 2)]);
    let before = snapshot(&f);
    f.set_value(2, 9).unwrap();
    f.set_value(2, 9).unwrap();
    assert_eq!(snapshot(&f), before);
    f.audit().unwrap();
}

#[test]
fn test_lookup_and_membership_queries() {
    let f = build(&[(1, 10), (2, 5), (3, 10)]);
    assert!(f.is_local_maximum(&1).unwrap());
    assert!(!f.is_local_maximum(&2).unwrap());
    assert!(matches!(f.is_local_maximum(&4), Err(LookupError::NotFound)));

    let point = f.find(&2).unwrap().unwrap();
    assert_eq!((*point.arg(), *point.value()), (2, 5));
    assert!(f.find(&0).unwrap().is_none());
}

#[test]
fn test_iterators_run_both_ways() {
    let f = build(&[(4, 1), (1, 3), (3, 8), (2, 0), (5, 8)]);
    assert_eq!(f.iter().len(), 5);
    let args: Vec<i32> = (&f).into_iter().map(|p| *p.arg()).collect();
    assert_eq!(args, vec![1, 2, 3, 4, 5]);
    let reversed: Vec<i32> = f.iter().rev().map(|p| *p.arg()).collect();
    assert_eq!(reversed, vec![5, 4, 3, 2, 1]);

    assert_eq!(maxima(&f), vec![(3, 8), (5, 8), (1, 3)]);
    assert_eq!(f.maxima_iter().len(), 3);
    let last = f.maxima_iter().next_back().unwrap();
    assert_eq!((*last.arg(), *last.value()), (1, 3));
}

#[test]
fn test_clone_is_independent() {
    let f = build(&[(1, 5), (2, 1), (3, 5)]);
    let before = snapshot(&f);
    let mut g = f.clone();
    g.set_value(2, 10).unwrap();
    g.erase(&1).unwrap();
    assert_eq!(snapshot(&f), before);
    assert_eq!(maxima(&g), vec![(2, 10)]);
    f.audit().unwrap();
    g.audit().unwrap();
}

#[test]
fn test_debug_lists_domain_and_maxima() {
    let f = build(&[(1, 10), (2, 5)]);
    assert_eq!(
        format!("{:?}", f),
        "FunctionMaxima { domain: [(1, 10), (2, 5)], maxima: [(1, 10)] }"
    );
}

#[test]
fn test_lookup_reports_comparison_failure() {
    let mut f: FunctionMaxima<i32, i32, Fuse> = FunctionMaxima::default();
    f.set_value(1, 1).unwrap();
    f.comparator().arm(0);
    assert!(matches!(f.value_at(&1), Err(LookupError::Comparison(_))));
    assert!(f.find(&1).is_err());
    f.comparator().disarm();
    assert_eq!(*f.value_at(&1).unwrap(), 1);
    assert!(matches!(f.value_at(&2), Err(LookupError::NotFound)));
}

#[test]
fn test_self_ordered_types() {
    let mut f = FunctionMaxima::with_comparator(Fallible);
    f.set_value(Gauge(Some(1)), Gauge(Some(3))).unwrap();
    f.set_value(Gauge(Some(2)), Gauge(Some(7))).unwrap();
    let before: Vec<_> = f.iter().map(|p| (*p.arg(), *p.value())).collect();

    assert!(f.set_value(Gauge(Some(3)), Gauge(None)).is_err());
    assert!(f.set_value(Gauge(None), Gauge(Some(1))).is_err());
    assert!(f.erase(&Gauge(None)).is_err());

    let after: Vec<_> = f.iter().map(|p| (*p.arg(), *p.value())).collect();
    assert_eq!(before, after);
    let peaks: Vec<_> = f.maxima_iter().map(|p| *p.arg()).collect();
    assert_eq!(peaks, vec![Gauge(Some(2))]);
    f.audit().unwrap();
}

#[test]
fn test_comparison_error_keeps_source() {
    let err = ComparisonError::new("out of range");
    assert_eq!(err.to_string(), "ordering comparison failed: out of range");
    assert_eq!(err.into_inner().to_string(), "out of range");
}

#[test]
fn test_tree_positional_updates() {
    let mut rng = thread_rng();
    let mut tree: Tree<DefaultKey, u32> = Tree::new();
    let mut model: BTreeMap<u32, DefaultKey> = BTreeMap::new();
    for _ in 0..4000 {
        let x = rng.gen_range(0..500u32);
        match tree.search(|item| Ok::<_, ()>(x.cmp(item))).unwrap() {
            Search::Found(id) => {
                assert_eq!(model.remove(&x), Some(id));
                assert_eq!(tree.remove(id), Some(x));
            }
            Search::Vacant { pred, succ } => {
                assert_eq!(pred, model.range(..x).next_back().map(|(_, id)| *id));
                assert_eq!(succ, model.range(x + 1..).next().map(|(_, id)| *id));
                let id = tree.insert_after(pred, x);
                model.insert(x, id);
            }
        }
        tree.check().unwrap();
        assert_eq!(tree.len(), model.len());
        assert!(tree.iter().map(|(_, x)| *x).eq(model.keys().copied()));
    }
    assert!(tree
        .iter()
        .rev()
        .map(|(_, x)| *x)
        .eq(model.keys().rev().copied()));
}

#[test]
fn test_tree_front_insertion() {
    let mut tree: Tree<DefaultKey, u32> = Tree::new();
    for x in (0..256).rev() {
        tree.insert_after(None, x);
        tree.check().unwrap();
    }
    assert!(tree.iter().map(|(_, x)| *x).eq(0..256));
    let first = tree.first().unwrap();
    assert_eq!(tree.remove(first), Some(0));
    assert_eq!(tree.remove(first), None);
    tree.check().unwrap();
}

#[test]
fn test_random_against_oracle() {
    let _ = env_logger::try_init();
    let mut rng = thread_rng();
    let mut f = FunctionMaxima::new();
    let mut model = BTreeMap::new();
    for _ in 0..20000 {
        let a = rng.gen_range(0..64);
        if rng.gen_bool(0.3) {
            f.erase(&a).unwrap();
            model.remove(&a);
        } else {
            let v = rng.gen_range(0..8);
            f.set_value(a, v).unwrap();
            model.insert(a, v);
        }
        f.audit().unwrap();
        assert_eq!(f.size(), model.len());
        assert_eq!(
            points(&f),
            model.iter().map(|(a, v)| (*a, *v)).collect::<Vec<_>>()
        );
        assert_eq!(maxima(&f), brute_force_maxima(&model));
    }
}

#[test]
fn test_failed_mutation_leaves_no_trace() {
    let _ = env_logger::try_init();
    let mut rng = thread_rng();
    let mut f = FunctionMaxima::with_comparator(Fuse::default());
    let mut model = BTreeMap::new();
    for _ in 0..600 {
        let a = rng.gen_range(0..32);
        let v = rng.gen_range(0..6);
        let erase = rng.gen_bool(0.25);
        let mut budget = 0;
        loop {
            let before = snapshot(&f);
            f.comparator().arm(budget);
            let outcome = if erase {
                f.erase(&a)
            } else {
                f.set_value(a, v)
            };
            f.comparator().disarm();
            if outcome.is_ok() {
                break;
            }
            assert_eq!(snapshot(&f), before, "state leaked with budget {}", budget);
            f.audit().unwrap();
            budget += 1;
        }
        if erase {
            model.remove(&a);
        } else {
            model.insert(a, v);
        }
        f.audit().unwrap();
        assert_eq!(maxima(&f), brute_force_maxima(&model));
    }
}
