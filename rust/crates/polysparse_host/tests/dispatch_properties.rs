use polysparse_core::{NonSymmetric, Rational, SparseMatrix, Symmetric};
use polysparse_host::{HostType, OperatorKind, Session};
use proptest::prelude::*;

type M = SparseMatrix<Rational, NonSymmetric>;
type S = SparseMatrix<Rational, Symmetric>;

fn triples(n: usize) -> impl Strategy<Value = Vec<(usize, usize, i64)>> {
    prop::collection::vec((0..n, 0..n, -6i64..6), 0..10)
}

fn kernel_matrix<Sym: polysparse_core::Symmetry>(
    n: usize,
    cells: &[(usize, usize, i64)],
) -> SparseMatrix<Rational, Sym> {
    let cells = cells.iter().map(|&(i, j, v)| (i, j, Rational::from_int(v)));
    SparseMatrix::from_triples(n, n, cells).unwrap()
}

proptest! {
    #[test]
    fn dispatch_matches_kernel(a in triples(3), b in triples(3), k in -5i64..5) {
        let session = Session::default();
        let (ka, kb) = (kernel_matrix::<NonSymmetric>(3, &a), kernel_matrix::<NonSymmetric>(3, &b));
        let ha = session.put(ka.clone()).unwrap();
        let hb = session.put(kb.clone()).unwrap();
        let hk = session.put(k).unwrap();

        let sum = session.call(OperatorKind::BinaryAdd, &[ha, hb]).unwrap();
        prop_assert_eq!(&*session.table().resolve::<M>(sum).unwrap(), &ka.add(&kb).unwrap());

        let product = session.call(OperatorKind::BinaryMul, &[ha, hb]).unwrap();
        prop_assert_eq!(&*session.table().resolve::<M>(product).unwrap(), &ka.mul(&kb).unwrap());

        let scaled = session.call(OperatorKind::BinaryMul, &[ha, hk]).unwrap();
        prop_assert_eq!(&*session.table().resolve::<M>(scaled).unwrap(), &ka.scale(&k));
    }

    #[test]
    fn symmetric_results_keep_their_tag(a in triples(3), b in triples(3)) {
        let session = Session::default();
        let ha = session.put(kernel_matrix::<Symmetric>(3, &a)).unwrap();
        let hb = session.put(kernel_matrix::<Symmetric>(3, &b)).unwrap();

        let sum = session.call(OperatorKind::BinaryAdd, &[ha, hb]).unwrap();
        prop_assert_eq!(sum.tag(), <S as HostType>::TAG);
        let product = session.call(OperatorKind::BinaryMul, &[ha, hb]).unwrap();
        prop_assert_eq!(product.tag(), <M as HostType>::TAG);
    }

    #[test]
    fn handles_balance_after_release(n in 1usize..6) {
        let session = Session::default();
        let k = session.put(2i64).unwrap();
        let m = session.put(M::identity(n).unwrap()).unwrap();
        let outs: Vec<_> = (0..n)
            .map(|_| session.call(OperatorKind::BinaryMul, &[k, m]).unwrap())
            .collect();
        prop_assert_eq!(session.live(), n + 2);
        for h in outs.into_iter().chain([k, m]) {
            prop_assert!(session.release(h).unwrap());
        }
        prop_assert_eq!(session.live(), 0);
    }
}
