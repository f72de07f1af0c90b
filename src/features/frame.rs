//! Column-oriented feature store. Columns are named f64 vectors of series
//! length; insertion order is preserved and load-bearing — the trained model
//! layout and the deterministic correlation prune both depend on it.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct FeatureFrame {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    index: HashMap<String, usize>,
    len: usize,
}

impl FeatureFrame {
    pub fn new(len: usize) -> Self {
        Self {
            names: Vec::new(),
            columns: Vec::new(),
            index: HashMap::new(),
            len,
        }
    }

    /// Number of rows (samples).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Column names in insertion order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.index.get(name).map(|&i| self.columns[i].as_slice())
    }

    /// Insert a column, replacing any existing column of the same name in
    /// place (its position in the order is kept).
    ///
    /// Panics if the column length does not match the frame length.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        let name = name.into();
        assert_eq!(values.len(), self.len, "column '{}' length mismatch", name);
        if let Some(&i) = self.index.get(&name) {
            self.columns[i] = values;
        } else {
            self.index.insert(name.clone(), self.columns.len());
            self.names.push(name);
            self.columns.push(values);
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<f64>> {
        let i = self.index.remove(name)?;
        self.names.remove(i);
        let col = self.columns.remove(i);
        for v in self.index.values_mut() {
            if *v > i {
                *v -= 1;
            }
        }
        Some(col)
    }
}

/// Median over the non-NaN entries; NaN when none exist.
pub fn median(values: &[f64]) -> f64 {
    let mut v: Vec<f64> = values.iter().copied().filter(|x| !x.is_nan()).collect();
    if v.is_empty() {
        return f64::NAN;
    }
    v.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = v.len() / 2;
    if v.len() % 2 == 0 {
        (v[mid - 1] + v[mid]) / 2.0
    } else {
        v[mid]
    }
}

/// Linearly interpolated percentile over non-NaN entries, `p` in [0, 100].
pub fn percentile(values: &[f64], p: f64) -> f64 {
    let mut v: Vec<f64> = values.iter().copied().filter(|x| !x.is_nan()).collect();
    if v.is_empty() {
        return f64::NAN;
    }
    v.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let rank = p / 100.0 * (v.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        v[lo]
    } else {
        v[lo] + (rank - lo as f64) * (v[hi] - v[lo])
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation; 0 for a single value, NaN when empty.
pub fn sample_std(values: &[f64]) -> f64 {
    match values.len() {
        0 => f64::NAN,
        1 => 0.0,
        n => {
            let m = mean(values);
            let ss: f64 = values.iter().map(|x| (x - m) * (x - m)).sum();
            (ss / (n - 1) as f64).sqrt()
        }
    }
}

/// Pearson correlation; 0 when either side is constant.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let ma = mean(&a[..n]);
    let mb = mean(&b[..n]);
    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for i in 0..n {
        let da = a[i] - ma;
        let db = b[i] - mb;
        cov += da * db;
        va += da * da;
        vb += db * db;
    }
    if va == 0.0 || vb == 0.0 {
        0.0
    } else {
        cov / (va.sqrt() * vb.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_preserves_order_and_replaces_in_place() {
        let mut f = FeatureFrame::new(2);
        f.insert("a", vec![1.0, 2.0]);
        f.insert("b", vec![3.0, 4.0]);
        f.insert("a", vec![5.0, 6.0]);
        assert_eq!(f.names(), &["a".to_string(), "b".to_string()]);
        assert_eq!(f.column("a").unwrap(), &[5.0, 6.0]);
    }

    #[test]
    fn remove_reindexes() {
        let mut f = FeatureFrame::new(1);
        f.insert("a", vec![1.0]);
        f.insert("b", vec![2.0]);
        f.insert("c", vec![3.0]);
        f.remove("b");
        assert_eq!(f.column("c").unwrap(), &[3.0]);
        assert_eq!(f.names(), &["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn percentile_interpolates() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert!((percentile(&v, 50.0) - 2.5).abs() < 1e-12);
        assert_eq!(percentile(&v, 100.0), 4.0);
    }

    #[test]
    fn median_skips_nan() {
        assert_eq!(median(&[1.0, f64::NAN, 3.0]), 2.0);
    }

    #[test]
    fn single_sample_std_is_zero() {
        assert_eq!(sample_std(&[5.0]), 0.0);
    }

    #[test]
    fn pearson_of_identical_columns_is_one() {
        let a = [1.0, 2.0, 3.0, 4.0];
        assert!((pearson(&a, &a) - 1.0).abs() < 1e-12);
    }
}
