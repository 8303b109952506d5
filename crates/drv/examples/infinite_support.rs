//! Random variables with unbounded support
//!
//! Run with: cargo run -p drv --example infinite_support
//!
//! Statistics of variables on infinite spaces are series. The integrator
//! sums them until a window of terms is negligible, and reports when it
//! cannot tell.

use std::sync::Arc;

use drv::{geometric, poisson, Drv, DrvError, EngineConfig, NumericIntegrator, PSpace};

fn main() -> Result<(), DrvError> {
    println!("=== Infinite Support ===\n");

    let config = EngineConfig::default();
    let integrator = Arc::new(NumericIntegrator::from_config(&config));

    let waits = geometric(1.0 / 6.0, integrator.clone(), &config)?;
    println!("{:?}", waits);
    println!("  mean     {:.6}", waits.mean()?);
    println!("  variance {:.6}", waits.variance()?);
    println!("  P(X <= 5) {:.6}", waits.cdf(&5)?);

    let arrivals = poisson(2.5, integrator.clone(), &config)?;
    println!("\n{:?}", arrivals);
    println!("  mean     {:.6}", arrivals.mean()?);
    println!("  P(X = 2) {:.6}", arrivals.pmf(&2)?);
    let capped = arrivals.map("min(X, 4)", |k| (*k).min(4));
    println!("  E[min(X, 4)] {:.6}", capped.mean()?);

    println!("\nA heavy tail:");
    let space = PSpace::infinite(|k| 1.0 / ((k + 1) as f64).powi(2), integrator, &config)?;
    let heavy = Drv::new("heavy", space, |w| w[0] as i64);
    match heavy.mean() {
        Ok(m) => println!("  mean {:.6}", m),
        Err(e) => println!("  mean: {}", e),
    }
    match heavy.support() {
        Ok(s) => println!("  support {:?}", s),
        Err(e) => println!("  support: {}", e),
    }

    Ok(())
}
