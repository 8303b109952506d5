//! Opposed checks and other labelled mechanics.
//!
//! Run with: cargo run -p drv-dice --example opposed_roll

use drv::FiniteDrv;
use drv_dice::{d20, harn_master, risk};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn show(rv: &FiniteDrv<i64>) {
    println!("{}", rv);
    for x in rv.support() {
        let label = rv.label(x).unwrap_or("?");
        println!("  {:>3} {:<20} {:.4}", x, label, rv.pmf(x));
    }
    println!();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let duel = d20::opposed_test(11, 17)?;
    show(&duel);

    show(&harn_master::test(65)?);
    show(&risk::attack(3, 2)?);

    let mut rng = StdRng::seed_from_u64(42);
    let rolls = duel.rolls(10, &mut rng);
    let named: Vec<&str> = rolls.iter().map(|r| duel.label(r).unwrap_or("?")).collect();
    println!("Ten duels: {}", named.join(" "));

    Ok(())
}
