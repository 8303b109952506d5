//! Worked scenarios: dice sums, correlated sums, opposed rolls and
//! infinite supports.

use std::sync::Arc;

use drv::{
    combine, geometric, poisson, uniform, Drv, DrvError, EngineConfig, FiniteDrv,
    NumericIntegrator, Operator, PSpace, Pool, PoolCache, Real,
};

fn die(sides: i64) -> FiniteDrv<i64> {
    uniform(format!("d{}", sides), (1..=sides).collect()).unwrap()
}

#[test]
fn three_six_sided_dice() {
    let pool = [die(6), die(6), die(6)];
    let total = combine(&pool, &Operator::sum(), "{0}+{1}+{2}").unwrap();

    assert_eq!(total.name(), "d6+d6+d6");
    assert_eq!(*total.min(), 3);
    assert_eq!(*total.max(), 18);
    assert!((total.mean() - 10.5).abs() < 1e-12);
    let at_least_13 = total.pr(|&x| x >= 13);
    assert!((at_least_13 - 0.2593).abs() < 1e-4);
    assert!((at_least_13 - 56.0 / 216.0).abs() < 1e-12);
}

#[test]
fn two_distinct_dice_are_not_one_die_doubled() {
    let a = die(6);
    let b = die(6);
    let two = (&a + &b).unwrap();
    assert!((two.pmf(&7) - 6.0 / 36.0).abs() < 1e-12);

    let doubled = (&a + &a).unwrap();
    assert_eq!(doubled.pmf(&7), 0.0);
    assert!((doubled.pmf(&12) - 1.0 / 6.0).abs() < 1e-12);
}

#[test]
fn opposed_roll() {
    let a = (&die(20) + 11).unwrap();
    let b = (&die(20) + 17).unwrap();
    let outcome = a.compare(&b).unwrap();
    let total = outcome.pmf(&1) + outcome.pmf(&0) + outcome.pmf(&-1);
    assert!((total - 1.0).abs() < 1e-12);
    assert_eq!(outcome.support(), &[-1, 0, 1]);
}

#[test]
fn correlated_expressions() {
    // x + y and x - y share x, so they are not independent
    let x = die(6);
    let y = die(6);
    let s = (&x + &y).unwrap();
    let d = (&x - &y).unwrap();
    let product = (&s * &d).unwrap();
    // (x+y)(x-y) = x^2 - y^2 has mean 0
    assert!(product.mean().abs() < 1e-12);

    let both = (&s + &d).unwrap();
    // (x+y) + (x-y) = 2x
    assert!(both.distribution().tv_distance((&x * 2).unwrap().distribution()) < 1e-12);
}

#[test]
fn keep_highest_of_four() {
    let pool = Pool::independent(&die(6), 4).unwrap();
    let stat = pool.highest(3).unwrap();
    assert!((stat.mean() - 15869.0 / 1296.0).abs() < 1e-9);
    assert_eq!(*stat.min(), 3);
}

#[test]
fn custom_operator_must_stay_integral() {
    let pool = [die(4), die(4)];
    let mean = Operator::from_real("avg", |v| v.iter().sum::<f64>() / v.len() as f64);
    let err = combine(&pool, &mean, "avg").unwrap_err();
    assert!(matches!(err, DrvError::InvalidOperatorResult { .. }));
}

#[test]
fn real_valued_average() {
    let faces: Vec<Real> = (1..=4).map(|k| Real::new(k as f64).unwrap()).collect();
    let a = uniform("a", faces.clone()).unwrap();
    let b = uniform("b", faces).unwrap();
    let mean = Operator::from_real("avg", |v| v.iter().sum::<f64>() / v.len() as f64);
    let avg = combine(&[a, b], &mean, "avg").unwrap();
    assert!((avg.mean() - 2.5).abs() < 1e-12);
    assert_eq!(avg.support().len(), 7);
}

#[test]
fn variables_on_a_shared_space() {
    // One d6 read by two functions: parity and whether it is high.
    let space = PSpace::uniform(6).unwrap();
    let parity = FiniteDrv::new("odd", space.clone(), |w| (w[0] % 2) as i64).unwrap();
    let high = FiniteDrv::new("high", space, |w| i64::from(w[0] >= 3)).unwrap();
    let both = (&parity * &high).unwrap();
    // faces 4 and 6 are odd-indexed (w = 3, 5) and high
    assert!((both.pmf(&1) - 2.0 / 6.0).abs() < 1e-12);
}

#[test]
fn infinite_supports() {
    let config = EngineConfig::default();
    let integrator = Arc::new(NumericIntegrator::from_config(&config));

    let waits = geometric(1.0 / 6.0, integrator.clone(), &config).unwrap();
    assert!((waits.mean().unwrap() - 5.0).abs() < 1e-6);
    assert!(matches!(waits.support(), Err(DrvError::UnsupportedOperation { .. })));

    let arrivals = poisson(4.0, integrator, &config).unwrap();
    assert!((arrivals.mean().unwrap() - 4.0).abs() < 1e-9);
    let even: Drv<i64> = arrivals.map("even", |k| i64::from(k % 2 == 0));
    let p_even = even.pmf(&1).unwrap();
    assert!((p_even - (1.0 + (-8.0_f64).exp()) / 2.0).abs() < 1e-9);
}

#[test]
fn undetermined_sums_surface_as_errors() {
    let config = EngineConfig {
        max_terms: 256,
        ..EngineConfig::default()
    };
    let integrator = Arc::new(NumericIntegrator::from_config(&config));
    // 1/(k+1)^2 converges far too slowly for 256 terms
    let space = PSpace::infinite(|k| 1.0 / ((k + 1) as f64).powi(2), integrator, &config).unwrap();
    assert!(space.assumes_normalized());
    let slow = Drv::new("slow", space, |w| w[0] as i64);
    assert!(matches!(slow.mean(), Err(DrvError::Undetermined { .. })));
}

#[test]
fn mass_beyond_a_run_of_zero_terms_is_counted() {
    let config = EngineConfig::default();
    let integrator = Arc::new(NumericIntegrator::from_config(&config));
    let space = PSpace::infinite(
        |k| if k == 0 || k == 200 { 1.0 } else { 0.0 },
        integrator,
        &config,
    )
    .unwrap();
    let far = Drv::new("far", space, |w| w[0] as i64);
    assert!((far.pmf(&0).unwrap() - 0.5).abs() < 1e-12);
    assert!((far.mean().unwrap() - 100.0).abs() < 1e-9);
}

#[test]
fn cache_shares_pools_by_parameters() {
    let mut cache: PoolCache<(u32, i64), FiniteDrv<i64>> = PoolCache::new();
    let mut build = |n: u32, k: i64| -> Result<FiniteDrv<i64>, DrvError> {
        cache
            .get_or_try_insert_with((n, k), || Pool::independent(&die(k), n as usize)?.sum())
            .cloned()
    };
    let a = build(3, 6).unwrap();
    let b = build(3, 6).unwrap();
    let c = build(2, 6).unwrap();
    assert!(a.same(&b));
    assert!(!a.same(&c));
}
