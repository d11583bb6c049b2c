//! Benchmark Result
//!
//! An ordered collection of samples together with an optional name and a
//! string metadata map describing where the samples came from (loop count,
//! process count, ...). Results from independent runs are folded together
//! with [`BenchResult::merge`].

use crate::summary::{StatsError, mean, stdev};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

/// Renders a mean and an optional standard deviation as text.
///
/// Implemented by marker types so that the rendering policy is part of the
/// result's type: timing results render with time units, plain results with
/// bare numbers.
pub trait SampleFormat {
    /// Format `mean`, and `stdev` when the result has at least two samples
    fn format(mean: f64, stdev: Option<f64>) -> String;
}

/// Bare numeric rendering: `"<mean>"` or `"<mean> +- <stdev>"`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlainFormat;

impl SampleFormat for PlainFormat {
    fn format(mean: f64, stdev: Option<f64>) -> String {
        match stdev {
            Some(stdev) => format!("{} +- {}", mean, stdev),
            None => mean.to_string(),
        }
    }
}

/// Ordered samples, optional name and provenance metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "", try_from = "RawBenchResult")]
pub struct BenchResult<F = PlainFormat> {
    values: Vec<f64>,
    name: Option<String>,
    metadata: BTreeMap<String, String>,
    #[serde(skip)]
    format: PhantomData<F>,
}

impl<F> Default for BenchResult<F> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            name: None,
            metadata: BTreeMap::new(),
            format: PhantomData,
        }
    }
}

/// Unvalidated wire form of [`BenchResult`]
#[derive(Deserialize)]
struct RawBenchResult {
    values: Vec<f64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

impl<F> TryFrom<RawBenchResult> for BenchResult<F> {
    type Error = StatsError;

    fn try_from(raw: RawBenchResult) -> Result<Self, Self::Error> {
        let mut result = Self::with_metadata(raw.metadata)?;
        for value in raw.values {
            result.push(value)?;
        }
        result.name = raw.name;
        Ok(result)
    }
}

fn check_sample(value: f64) -> Result<(), StatsError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(StatsError::InvalidSample(value))
    }
}

impl<F> BenchResult<F> {
    /// Create an empty, unnamed result
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a result pre-seeded with `values`
    pub fn from_values(values: Vec<f64>) -> Result<Self, StatsError> {
        for &value in &values {
            check_sample(value)?;
        }
        Ok(Self {
            values,
            ..Self::default()
        })
    }

    /// Create an empty result carrying `metadata`
    pub fn with_metadata<K, V>(
        metadata: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, StatsError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut result = Self::default();
        for (key, value) in metadata {
            result.insert_metadata(key, value)?;
        }
        Ok(result)
    }

    /// Builder-style name assignment
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Samples in arrival order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no samples have been recorded yet
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Result name, if any
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set or replace the result name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Provenance metadata
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Insert a metadata entry, replacing any previous value for `key`
    pub fn insert_metadata(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), StatsError> {
        let key = key.into();
        let value = value.into();
        if key.is_empty() || value.is_empty() {
            return Err(StatsError::EmptyMetadata { key });
        }
        self.metadata.insert(key, value);
        Ok(())
    }

    /// Append one sample
    pub fn push(&mut self, value: f64) -> Result<(), StatsError> {
        check_sample(value)?;
        self.values.push(value);
        Ok(())
    }

    /// Mean of all samples
    pub fn mean(&self) -> Result<f64, StatsError> {
        mean(&self.values)
    }

    /// Sample standard deviation of all samples
    pub fn stdev(&self) -> Result<f64, StatsError> {
        stdev(&self.values)
    }

    /// Fold `other` into this result.
    ///
    /// Samples are appended after the existing ones in `other`'s order. The
    /// name is adopted only when this result has none. Every metadata key of
    /// `other` overwrites the same key here; keys unique to `self` remain.
    pub fn merge<G>(&mut self, other: &BenchResult<G>) {
        self.values.extend_from_slice(&other.values);
        if self.name.is_none() {
            self.name.clone_from(&other.name);
        }
        self.metadata.extend(
            other
                .metadata
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
    }
}

impl<F: SampleFormat> BenchResult<F> {
    /// Render the statistics, without the name prefix.
    ///
    /// The standard deviation is included once two or more samples exist.
    pub fn format_values(&self) -> Result<String, StatsError> {
        let mean = self.mean()?;
        let stdev = if self.values.len() >= crate::MIN_STDEV_SAMPLES {
            Some(self.stdev()?)
        } else {
            None
        };
        Ok(F::format(mean, stdev))
    }

    /// Render as `"<name>: <stats>"`, or just `"<stats>"` when unnamed
    pub fn render(&self) -> Result<String, StatsError> {
        let text = self.format_values()?;
        Ok(match self.name.as_deref() {
            Some(name) if !name.is_empty() => format!("{}: {}", name, text),
            _ => text,
        })
    }
}

impl<F: SampleFormat> fmt::Display for BenchResult<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render() {
            Ok(text) => f.write_str(&text),
            Err(_) => match self.name.as_deref() {
                Some(name) if !name.is_empty() => write!(f, "{}: <no values>", name),
                _ => f.write_str("<no values>"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn plain(values: &[f64]) -> BenchResult {
        BenchResult::from_values(values.to_vec()).unwrap()
    }

    #[test]
    fn test_merge_concatenates_in_order() {
        let mut a = plain(&[1.0, 2.0]);
        let b = plain(&[3.0, 4.0, 5.0]);
        a.merge(&b);
        assert_eq!(a.values(), &[1.0, 2.0, 3.0, 4.0, 5.0]);
        // The source is left untouched
        assert_eq!(b.values(), &[3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_merge_mean_matches_concatenation() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..5 {
            let left: Vec<f64> = (0..rng.gen_range(1..20))
                .map(|_| rng.gen_range(1e-9..1e-2))
                .collect();
            let right: Vec<f64> = (0..rng.gen_range(1..20))
                .map(|_| rng.gen_range(1e-9..1e-2))
                .collect();

            let mut merged = plain(&left);
            merged.merge(&plain(&right));

            let all: Vec<f64> = left.iter().chain(right.iter()).copied().collect();
            assert_eq!(merged.values(), all.as_slice());
            let direct = all.iter().sum::<f64>() / all.len() as f64;
            assert!((merged.mean().unwrap() - direct).abs() <= direct * 1e-12);
        }
    }

    #[test]
    fn test_merge_metadata_overwrites() {
        let mut target: BenchResult = BenchResult::with_metadata([("a", "0"), ("b", "2")]).unwrap();
        let source: BenchResult = BenchResult::with_metadata([("a", "1")]).unwrap();
        target.merge(&source);

        let expected: BTreeMap<String, String> = [("a", "1"), ("b", "2")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(target.metadata(), &expected);
    }

    #[test]
    fn test_merge_adopts_name_only_when_unset() {
        let source: BenchResult = BenchResult::new().named("X");

        let mut unnamed: BenchResult = BenchResult::new();
        unnamed.merge(&source);
        assert_eq!(unnamed.name(), Some("X"));

        let mut named: BenchResult = BenchResult::new().named("Y");
        named.merge(&source);
        assert_eq!(named.name(), Some("Y"));
    }

    #[test]
    fn test_merge_unnamed_source_keeps_none() {
        let mut target: BenchResult = BenchResult::new();
        target.merge(&plain(&[1.0]));
        assert_eq!(target.name(), None);
    }

    #[test]
    fn test_render_plain() {
        assert_eq!(plain(&[0.5]).render().unwrap(), "0.5");
        assert_eq!(plain(&[1.0, 3.0]).render().unwrap(), "2 +- 1.4142135623730951");
        assert_eq!(plain(&[2.0]).named("x").render().unwrap(), "x: 2");
    }

    #[test]
    fn test_render_empty_fails() {
        let empty: BenchResult = BenchResult::new();
        assert_eq!(empty.render(), Err(StatsError::EmptyData));
        assert_eq!(empty.to_string(), "<no values>");
    }

    #[test]
    fn test_empty_name_is_not_rendered() {
        assert_eq!(plain(&[4.0]).named("").to_string(), "4");
    }

    #[test]
    fn test_rejects_invalid_samples() {
        let mut result: BenchResult = BenchResult::new();
        assert_eq!(result.push(-1.0), Err(StatsError::InvalidSample(-1.0)));
        assert!(result.push(f64::NAN).is_err());
        assert!(result.push(f64::INFINITY).is_err());
        assert!(BenchResult::<PlainFormat>::from_values(vec![0.1, -0.1]).is_err());
        assert!(result.is_empty());
    }

    #[test]
    fn test_rejects_empty_metadata() {
        let mut result: BenchResult = BenchResult::new();
        assert!(result.insert_metadata("", "x").is_err());
        assert!(result.insert_metadata("loops", "").is_err());
        result.insert_metadata("loops", "1000").unwrap();
        assert_eq!(result.metadata()["loops"], "1000");
    }

    #[test]
    fn test_deserialize_validates_samples_and_metadata() {
        let result: BenchResult = serde_json::from_str(
            r#"{"values":[0.001,0.002],"name":"sort","metadata":{"loops":"1000"}}"#,
        )
        .unwrap();
        assert_eq!(result.values(), &[0.001, 0.002]);
        assert_eq!(result.name(), Some("sort"));
        assert_eq!(result.metadata()["loops"], "1000");

        let negative = serde_json::from_str::<BenchResult>(r#"{"values":[0.1,-0.1]}"#);
        assert!(negative.unwrap_err().to_string().contains("invalid sample -0.1"));

        let empty_key =
            serde_json::from_str::<BenchResult>(r#"{"values":[0.1],"metadata":{"":"x"}}"#);
        assert!(empty_key.is_err());
    }
}
