use std::collections::HashMap;

/// Canonical, ordered set of interest names. Fixed at startup; defines the
/// vector dimensionality and the position of every interest in it. The same
/// schema instance must be used wherever vectors are built or compared.
#[derive(Debug, Clone)]
pub struct InterestSchema {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl InterestSchema {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let positions = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();

        InterestSchema { names, positions }
    }

    /// Vector dimensionality.
    pub fn dim(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// Project a sparse ratings mapping onto the schema order.
    ///
    /// Total and pure: unknown names are ignored, missing or non-finite
    /// ratings become 0.0, an empty mapping yields the zero vector. Callers
    /// that need validation validate before calling.
    pub fn build_vector(&self, ratings: &HashMap<String, f32>) -> Vec<f32> {
        self.names
            .iter()
            .map(|name| match ratings.get(name) {
                Some(v) if v.is_finite() => *v,
                _ => 0.0,
            })
            .collect()
    }
}
