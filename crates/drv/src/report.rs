//! Plot-ready summaries of integer random variables.
//!
//! A [`Report`] is what a plotting or reporting collaborator consumes: a
//! curve sampled at every integer between the minimum and maximum, the
//! first two moments and any value labels.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::DrvError;
use crate::rv::FiniteDrv;

/// Which function of the distribution to sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Curve {
    Pmf,
    Cdf,
    Sf,
    LogPmf,
}

impl FiniteDrv<i64> {
    /// `(x, curve(x))` for every integer in [`FiniteDrv::range`].
    ///
    /// ```rust
    /// use drv::{uniform, Curve};
    ///
    /// let gappy = uniform("gappy", vec![1_i64, 3]).unwrap();
    /// assert_eq!(gappy.graph(Curve::Pmf), vec![(1, 0.5), (2, 0.0), (3, 0.5)]);
    /// ```
    pub fn graph(&self, curve: Curve) -> Vec<(i64, f64)> {
        self.range()
            .map(|x| {
                let y = match curve {
                    Curve::Pmf => self.pmf(&x),
                    Curve::Cdf => self.cdf(&x),
                    Curve::Sf => self.sf(&x),
                    Curve::LogPmf => self.log_pmf(&x),
                };
                (x, y)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub name: String,
    pub curve: Curve,
    pub points: Vec<(i64, f64)>,
    pub mean: f64,
    pub std: f64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<i64, String>,
}

impl Report {
    pub fn of(rv: &FiniteDrv<i64>, curve: Curve) -> Self {
        Self {
            name: rv.name().to_string(),
            curve,
            points: rv.graph(curve),
            mean: rv.mean(),
            std: rv.std(),
            labels: rv.mask().cloned().unwrap_or_default(),
        }
    }

    /// Serialize for a plotting collaborator.
    ///
    /// `log_pmf` curves contain `-inf` at zero-mass points, which JSON
    /// cannot carry; those points become `null`.
    pub fn to_json(&self) -> Result<String, DrvError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dists::primitive;
    use crate::rv::Mask;

    fn coin() -> FiniteDrv<i64> {
        let mut mask = Mask::new();
        mask.insert(0, "Failure".to_string());
        mask.insert(1, "Success".to_string());
        primitive("coin", vec![0_i64, 1], &[1.0, 3.0])
            .unwrap()
            .with_mask(mask)
    }

    #[test]
    fn test_graph_curves() {
        let rv = coin();
        assert_eq!(rv.graph(Curve::Cdf), vec![(0, 0.25), (1, 1.0)]);
        assert_eq!(rv.graph(Curve::Sf), vec![(0, 0.75), (1, 0.0)]);
        let log = rv.graph(Curve::LogPmf);
        assert!((log[1].1 - 0.75_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_report_carries_labels() {
        let report = Report::of(&coin(), Curve::Pmf);
        assert_eq!(report.name, "coin");
        assert!((report.mean - 0.75).abs() < 1e-12);
        assert_eq!(report.labels.get(&1).map(String::as_str), Some("Success"));
    }

    #[test]
    fn test_to_json() {
        let json = Report::of(&coin(), Curve::Pmf).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["name"], "coin");
        assert_eq!(value["curve"], "pmf");
        assert_eq!(value["points"][1][0], 1);
        assert_eq!(value["points"][1][1], 0.75);
        assert_eq!(value["labels"]["1"], "Success");
    }

    #[test]
    fn test_json_errors_are_serialization_errors() {
        let err: DrvError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, DrvError::Serialization { .. }));
    }
}
