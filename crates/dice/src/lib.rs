//! # Drv Dice - Tabletop Mechanics on the Random Variable Algebra
//!
//! Thin builders over [`drv`]: each function rolls some dice, applies the
//! rules of a game system through the public operators, and returns a
//! [`FiniteDrv`](drv::FiniteDrv) with a descriptive name and, where the
//! values mean something, a mask of labels.
//!
//! ## Systems
//!
//! - [`dk`], [`ndk`], [`percentile`], [`fudge_die`]: plain dice
//! - [`d20`]: d20 checks and opposed checks
//! - [`fudge`]: four Fudge dice against a target
//! - [`harn_master`]: d100 roll-under with criticals
//! - [`west_end`]: skill d6 plus skill
//! - [`misc`]: success counting, with a cached pool builder
//! - [`risk`]: one Risk attack
//! - [`cortex`]: Cortex Plus roll-and-keep
//!
//! ## Example
//!
//! ```rust
//! use drv_dice::{d20, ndk};
//!
//! let damage = ndk(2, 6).unwrap();
//! assert!((damage.mean() - 7.0).abs() < 1e-12);
//!
//! let duel = d20::opposed_test(11, 17).unwrap();
//! let total = duel.pmf(&-1) + duel.pmf(&0) + duel.pmf(&1);
//! assert!((total - 1.0).abs() < 1e-12);
//! ```

pub mod cortex;
pub mod d20;
mod dice;
mod error;
pub mod fudge;
pub mod harn_master;
pub mod misc;
pub mod risk;
pub mod west_end;

pub use dice::{custom_die, dk, fudge_die, ndk, percentile};
pub use error::DiceError;
