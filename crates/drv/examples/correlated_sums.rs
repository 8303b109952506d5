//! Random variables as functions on shared probability spaces
//!
//! Run with: cargo run -p drv --example correlated_sums
//!
//! This example demonstrates:
//! - Variables on the same space are dependent
//! - Products of spaces deduplicate shared atoms
//! - Pool reduction strategies agree with full enumeration

use drv::{combine, uniform, DrvError, FiniteDrv, Operator, PSpace, Pool};

fn summary(rv: &FiniteDrv<i64>) {
    println!(
        "  {:<24} mean {:>7.3}  var {:>7.3}  support {:?}",
        rv.name(),
        rv.mean(),
        rv.variance(),
        rv.range()
    );
}

fn main() -> Result<(), DrvError> {
    println!("=== Correlated Sums ===\n");

    // -------------------------------------------------------------------------
    // 1. One die, two functions
    // -------------------------------------------------------------------------
    println!("1. Two functions of one roll");
    println!("----------------------------");
    let space = PSpace::uniform(6)?;
    let face = FiniteDrv::new("face", space.clone(), |w| w[0] as i64 + 1)?;
    let odd = FiniteDrv::new("odd", space, |w| (w[0] % 2 == 0) as i64)?;
    let odd_face = (&face * &odd)?;
    summary(&face);
    summary(&odd);
    summary(&odd_face);
    println!();

    // -------------------------------------------------------------------------
    // 2. Identity matters
    // -------------------------------------------------------------------------
    println!("2. X + X versus X + Y");
    println!("---------------------");
    let x = uniform("x", (1..=6).collect())?;
    let y = uniform("y", (1..=6).collect())?;
    summary(&(&x + &x)?);
    summary(&(&x + &y)?);
    let s = (&x + &y)?;
    let back = (&s - &y)?;
    println!(
        "  (x + y) - y equals x: {}",
        back.distribution().tv_distance(x.distribution()) < 1e-12
    );
    println!();

    // -------------------------------------------------------------------------
    // 3. Reduction strategies
    // -------------------------------------------------------------------------
    println!("3. Keep the highest three of four");
    println!("---------------------------------");
    let pool = Pool::independent(&x, 4)?;
    let fast = pool.highest(3)?;
    let slow = combine(
        pool.members(),
        &Operator::custom("sorted", |v: &[i64]| {
            let mut v = v.to_vec();
            v.sort_unstable();
            Some(v[1..].iter().sum())
        }),
        "sorted",
    )?;
    summary(&fast);
    summary(&slow);
    println!(
        "  total variation distance: {:.2e}",
        fast.distribution().tv_distance(slow.distribution())
    );

    Ok(())
}
