//! Three six-sided dice, the hard way and the easy way.
//!
//! Run with: cargo run -p drv-dice --example three_dice

use drv::{Curve, Report};
use drv_dice::{dk, ndk};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Three Dice ===\n");

    let three = ndk(3, 6)?;
    println!("{}: mean {:.3}, std {:.3}", three, three.mean(), three.std());
    println!("P({} >= 13) = {:.4}", three, three.sf(&12));
    println!("median {}, mode {}\n", three.median(), three.mode());

    println!("Distribution:");
    for (x, p) in three.graph(Curve::Pmf) {
        println!("  {:>2}  {:<40} {:.4}", x, "#".repeat((p * 300.0).round() as usize), p);
    }

    println!("\n=== Same Die vs Independent Dice ===\n");
    let x = dk(6)?;
    let y = dk(6)?;
    let doubled = (&x + &x)?;
    let pair = (&x + &y)?;
    println!("x + x: P(7) = {:.4}, variance {:.3}", doubled.pmf(&7), doubled.variance());
    println!("x + y: P(7) = {:.4}, variance {:.3}", pair.pmf(&7), pair.variance());

    println!("\n=== Report ===\n");
    println!("{}", Report::of(&three, Curve::Cdf).to_json()?);

    Ok(())
}
