use polysparse_core::{NonSymmetric, Rational, SparseMatrix, Symmetric};
use proptest::prelude::*;

fn rational() -> impl Strategy<Value = Rational> {
    (-20i64..20, 1i64..6).prop_map(|(n, d)| Rational::from_pair(n, d).unwrap())
}

fn triples(rows: usize, cols: usize) -> impl Strategy<Value = Vec<(usize, usize, Rational)>> {
    prop::collection::vec((0..rows, 0..cols, rational()), 0..12)
}

fn matrix(rows: usize, cols: usize) -> impl Strategy<Value = SparseMatrix<Rational, NonSymmetric>> {
    triples(rows, cols).prop_map(move |t| SparseMatrix::from_triples(rows, cols, t).unwrap())
}

fn symmetric(n: usize) -> impl Strategy<Value = SparseMatrix<Rational, Symmetric>> {
    triples(n, n).prop_map(move |t| SparseMatrix::from_triples(n, n, t).unwrap())
}

proptest! {
    #[test]
    fn scaling_composes(a in matrix(3, 4), s in -5i64..5, t in -5i64..5) {
        prop_assert_eq!(a.scale(&s).scale(&t), a.scale(&(s * t)));
    }

    #[test]
    fn scaling_identities(a in matrix(3, 4)) {
        prop_assert_eq!(a.scale(&1i64), a.clone());
        prop_assert_eq!(a.scale(&0i64), SparseMatrix::new(3, 4).unwrap());
    }

    #[test]
    fn rational_scaling_composes(a in matrix(2, 3), s in rational(), t in rational()) {
        prop_assert_eq!(a.scale(&s).scale(&t), a.scale(&(&s * &t)));
    }

    #[test]
    fn addition_is_commutative_and_associative(
        a in matrix(3, 3),
        b in matrix(3, 3),
        c in matrix(3, 3),
    ) {
        prop_assert_eq!(a.add(&b).unwrap(), b.add(&a).unwrap());
        prop_assert_eq!(
            a.add(&b).unwrap().add(&c).unwrap(),
            a.add(&b.add(&c).unwrap()).unwrap()
        );
        prop_assert_eq!(a.add(&SparseMatrix::<Rational>::new(3, 3).unwrap()).unwrap(), a);
    }

    #[test]
    fn scaling_commutes_with_product(a in matrix(2, 3), b in matrix(3, 4), s in -4i64..4) {
        let left = a.scale(&s).mul(&b).unwrap();
        let right = a.mul(&b).unwrap().scale(&s);
        prop_assert_eq!(left.shape(), (2, 4));
        prop_assert_eq!(left, right);
    }

    #[test]
    fn entries_round_trip(a in matrix(4, 3)) {
        let rebuilt = SparseMatrix::<Rational>::from_triples(4, 3, a.to_triples()).unwrap();
        prop_assert_eq!(rebuilt, a);
    }

    #[test]
    fn symmetric_entries_round_trip(a in symmetric(4)) {
        let rebuilt =
            SparseMatrix::<Rational, Symmetric>::from_triples(4, 4, a.to_triples()).unwrap();
        prop_assert_eq!(rebuilt, a);
    }

    #[test]
    fn symmetric_reads_are_mirrored(a in symmetric(4), i in 0usize..4, j in 0usize..4) {
        prop_assert_eq!(a.get(i, j).unwrap(), a.get(j, i).unwrap());
    }

    #[test]
    fn symmetric_scaling_matches_materialized(a in symmetric(3), s in -3i64..3) {
        prop_assert_eq!(a.scale(&s).to_nonsymmetric(), a.to_nonsymmetric().scale(&s));
    }

    #[test]
    fn symmetric_product_matches_materialized(a in symmetric(3), b in matrix(3, 2)) {
        prop_assert_eq!(a.mul(&b).unwrap(), a.to_nonsymmetric().mul(&b).unwrap());
    }

    #[test]
    fn no_zero_is_ever_stored(a in matrix(3, 3), b in matrix(3, 3)) {
        let sum = a.sub(&b).unwrap();
        prop_assert!(sum.entries().all(|(_, _, v)| v.signum() != 0));
    }
}
