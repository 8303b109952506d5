//! End-to-end checks of the dice builders against hand-counted odds.

use drv::{Curve, Report};
use drv_dice::misc::{success_pool, SuccessCache};
use drv_dice::{d20, dk, fudge, harn_master, ndk, risk, west_end, DiceError};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn three_dice_scenario() {
    let three = ndk(3, 6).unwrap();
    assert_eq!(three.name(), "3d6");
    assert_eq!(*three.min(), 3);
    assert_eq!(*three.max(), 18);
    assert!((three.mean() - 10.5).abs() < 1e-12);
    assert!((three.sf(&12) - 56.0 / 216.0).abs() < 1e-12);
}

#[test]
fn every_builder_is_normalized() {
    let built = vec![
        d20::test(3, 12).unwrap(),
        d20::opposed_test(2, 4).unwrap(),
        fudge::test(1, 2).unwrap(),
        harn_master::test(45).unwrap(),
        west_end::test(3, 12).unwrap(),
        risk::attack(2, 2).unwrap(),
    ];
    for rv in built {
        let total: f64 = rv.distribution().probabilities().iter().sum();
        assert!((total - 1.0).abs() < 1e-9, "{} sums to {}", rv.name(), total);
        assert!(rv.mask().is_some(), "{} has no labels", rv.name());
    }
}

#[test]
fn opposed_test_uses_two_dice() {
    let duel = d20::opposed_test(0, 0).unwrap();
    // With a single shared die every duel would tie.
    assert!(duel.pmf(&0) < 0.1);
}

#[test]
fn report_of_a_labelled_check() {
    let check = d20::test(0, 15).unwrap();
    let report = Report::of(&check, Curve::Pmf);
    assert_eq!(report.points.len(), 2);
    assert_eq!(report.labels.get(&1).map(String::as_str), Some("Success"));
    let json = report.to_json().unwrap();
    assert!(json.contains("\"Failure\""));
}

#[test]
fn rolls_land_in_support() {
    let mut rng = StdRng::seed_from_u64(7);
    let die = dk(20).unwrap();
    let rolls = die.rolls(500, &mut rng);
    assert!(rolls.iter().all(|r| (1..=20).contains(r)));
    // Every face shows up in 500 rolls of a d20 with overwhelming odds.
    for face in 1..=20 {
        assert!(rolls.contains(&face), "face {} never rolled", face);
    }
}

#[test]
fn cached_pools_grow_incrementally() {
    let mut cache = SuccessCache::new();
    for n in 1..=8 {
        let pool = success_pool(n, 6, 6, &mut cache).unwrap();
        let expected = f64::from(n) / 6.0;
        assert!((pool.mean() - expected).abs() < 1e-9);
    }
    assert_eq!(cache.len(), 8);
}

#[test]
fn errors_surface_from_both_crates() {
    assert_eq!(dk(0).unwrap_err(), DiceError::InvalidDie { sides: 0 });
    let err = drv_dice::custom_die("empty", vec![]).unwrap_err();
    assert!(matches!(err, DiceError::InvalidDie { .. }));
    assert!(matches!(
        risk::attack(0, 1),
        Err(DiceError::InvalidSkill { .. })
    ));
}
