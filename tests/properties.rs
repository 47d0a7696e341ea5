use ndarray::{arr1, Array1};

use exemplar::{
    AffinityPropagation, ClusterError, NegAbsolute, NegEuclidean, Parallelism, RunOptions,
};

fn points() -> Vec<Array1<f64>> {
    vec![
        arr1(&[0., 0.]),
        arr1(&[0.1, 0.1]),
        arr1(&[0.2, 0.]),
        arr1(&[10., 10.]),
        arr1(&[10.1, 10.1]),
        arr1(&[10.2, 10.]),
        arr1(&[20., 0.]),
        arr1(&[20.1, 0.2]),
        arr1(&[20.3, 0.1]),
    ]
}

#[test]
fn median_diagonal() {
    let ap = AffinityPropagation::builder(vec![0_u8, 1])
        .similarity_fn(|_item: &u8, exemplar: &u8| f64::from(*exemplar))
        .build()
        .unwrap();
    // Flattened [0, 0, 1, 1] -> mean of the middle pair
    assert_eq!(ap.similarity().diag().to_vec(), vec![0.5, 0.5]);
    assert_eq!(ap.similarity()[[0, 1]], 0.);
    assert_eq!(ap.similarity()[[1, 0]], 1.);

    let ap = AffinityPropagation::builder(vec![1_i32, 2, 3])
        .similarity_fn(|item: &i32, exemplar: &i32| f64::from(item * 10 + exemplar))
        .build()
        .unwrap();
    // 11 12 13 21 22 23 31 32 33 -> 22
    assert_eq!(ap.similarity().diag().to_vec(), vec![22., 22., 22.]);
}

#[test]
fn matrices_stay_square() {
    let mut ap = AffinityPropagation::builder(points())
        .damping(0.5)
        .similarity(NegEuclidean)
        .build()
        .unwrap();
    for _ in 0..5 {
        ap.iterate().unwrap();
        assert_eq!(ap.similarity().dim(), (9, 9));
        assert_eq!(ap.availability().dim(), (9, 9));
        assert_eq!(ap.responsibility().dim(), (9, 9));
    }

    // Asymmetric similarity: S[k, i] and S[i, k] differ
    let mut ap = AffinityPropagation::builder((0..7).map(f64::from).collect())
        .damping(0.5)
        .similarity_fn(|item: &f64, exemplar: &f64| exemplar - 2. * item)
        .build()
        .unwrap();
    assert_eq!(ap.similarity()[[3, 1]], 1.);
    assert_eq!(ap.similarity()[[1, 3]], -5.);
    for _ in 0..5 {
        ap.iterate().unwrap();
        assert_eq!(ap.similarity().dim(), (7, 7));
        assert_eq!(ap.availability().dim(), (7, 7));
        assert_eq!(ap.responsibility().dim(), (7, 7));
        assert_eq!(ap.exemplar_map().values().map(Vec::len).sum::<usize>(), 7);
    }
}

#[test]
fn reset_clears_clusters() {
    for n in 0..5 {
        let mut ap = AffinityPropagation::new((0..n).map(f64::from).collect(), NegAbsolute)
            .unwrap();
        ap.run(RunOptions::default()).unwrap();
        ap.reset();
        assert!(ap.clusters().is_empty());
        assert_eq!(ap.total_iterations(), 0);
    }
}

#[test]
fn separated_groups_never_share_a_cluster() {
    let mut ap = AffinityPropagation::new(points(), NegEuclidean).unwrap();
    let summary = ap.run(RunOptions::default()).unwrap();
    assert!(summary.converged);
    for (exemplar, members) in ap.exemplar_map() {
        for member in members {
            assert_eq!(exemplar / 3, member / 3);
        }
    }
    let assigned: usize = ap.exemplar_map().values().map(|m| m.len()).sum();
    assert_eq!(assigned, 9);
}

#[test]
fn runs_are_reproducible() {
    let run = |parallelism: Parallelism| {
        let mut ap = AffinityPropagation::builder(points())
            .parallelism(parallelism)
            .similarity(NegEuclidean)
            .build()
            .unwrap();
        ap.run(RunOptions {
            max_iterations: 50,
            stability_threshold: 5,
        })
        .unwrap();
        ap
    };
    let first = run(Parallelism::Threads(4));
    for parallelism in [Parallelism::Threads(4), Parallelism::Threads(1), Parallelism::Serial] {
        let other = run(parallelism);
        assert_eq!(first.exemplar_map(), other.exemplar_map());
        assert_eq!(first.similarity(), other.similarity());
        assert_eq!(first.availability(), other.availability());
        assert_eq!(first.responsibility(), other.responsibility());
    }
}

#[test]
fn run_halts_once_stable() {
    let mut ap = AffinityPropagation::new(vec![1., 2., 10.], NegAbsolute).unwrap();
    let options = RunOptions {
        max_iterations: 100,
        stability_threshold: 3,
    };
    let summary = ap.run(options).unwrap();
    assert!(summary.converged);
    assert_eq!(summary.stable_iterations, 3);
    let availability = ap.availability().clone();
    let responsibility = ap.responsibility().clone();
    // Already stable, so a second run does nothing
    let again = ap.run(options).unwrap();
    assert_eq!(again, summary);
    assert_eq!(ap.availability(), &availability);
    assert_eq!(ap.responsibility(), &responsibility);
    // Manual iteration still advances
    ap.iterate().unwrap();
    assert_eq!(ap.total_iterations(), summary.iterations + 1);
}

#[test]
fn run_bounded_by_max_iterations() {
    let mut ap = AffinityPropagation::new(vec![1., 2., 10.], NegAbsolute).unwrap();
    let summary = ap
        .run(RunOptions {
            max_iterations: 4,
            stability_threshold: 10,
        })
        .unwrap();
    assert_eq!(summary.iterations, 4);
    assert!(!summary.converged);
}

#[test]
fn failing_similarity_aborts_build() {
    let result = AffinityPropagation::builder(vec![1., 2., 3.])
        .try_similarity_fn(|item: &f64, exemplar: &f64| {
            if item > exemplar {
                Err(format!("no similarity from {} to {}", item, exemplar))
            } else {
                Ok(-(item - exemplar).abs())
            }
        })
        .build();
    match result {
        Err(ClusterError::Similarity { item, exemplar, .. }) => assert!(item > exemplar),
        _ => panic!("expected a similarity failure"),
    }
}

#[test]
fn serial_evaluation_accepts_order_sensitive_callbacks() {
    use std::sync::Mutex;

    let seen = Mutex::new(Vec::new());
    let ap = AffinityPropagation::builder(vec![1., 2.])
        .parallelism(Parallelism::Serial)
        .similarity_fn(|item: &f64, exemplar: &f64| {
            seen.lock().unwrap().push((*item, *exemplar));
            -(item - exemplar).abs()
        })
        .build()
        .unwrap();
    assert_eq!(ap.len(), 2);
    // Row-major over (exemplar, item)
    assert_eq!(
        *seen.lock().unwrap(),
        vec![(1., 1.), (2., 1.), (1., 2.), (2., 2.)]
    );
}
