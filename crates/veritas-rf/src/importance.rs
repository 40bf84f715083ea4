//! Ranking of forest feature importances against column names.

/// One feature with its importance and rank.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedFeature {
    /// Column name.
    pub name: String,
    /// Normalized MDI importance.
    pub importance: f64,
    /// 1-based rank (1 = most important).
    pub rank: usize,
}

impl crate::forest::RandomForest {
    /// Feature importances paired with `names` and sorted most important
    /// first. Equal importances keep column order.
    ///
    /// Features beyond the end of `names` are called `f{index}`.
    #[must_use]
    pub fn ranked_importances(&self, names: &[String]) -> Vec<RankedFeature> {
        let mut ranked: Vec<RankedFeature> = self
            .feature_importances()
            .into_iter()
            .enumerate()
            .map(|(i, importance)| RankedFeature {
                name: names.get(i).cloned().unwrap_or_else(|| format!("f{i}")),
                importance,
                rank: 0,
            })
            .collect();

        ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        for (i, feature) in ranked.iter_mut().enumerate() {
            feature.rank = i + 1;
        }
        ranked
    }
}

#[cfg(test)]
mod tests {
    use crate::config::RandomForestConfig;

    #[test]
    fn informative_column_ranks_first() {
        let features: Vec<Vec<f64>> = (0..40)
            .map(|i| vec![0.25, (i / 10) as f64, (i % 3) as f64])
            .collect();
        let labels: Vec<usize> = (0..40).map(|i| (i / 10) % 3).collect();
        let forest = RandomForestConfig::new(10)
            .unwrap()
            .with_seed(5)
            .fit(&features, &labels)
            .unwrap();
        let names = vec!["const".to_string(), "signal".to_string()];
        let ranked = forest.ranked_importances(&names);

        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].name, "signal");
        assert_eq!(ranked[0].rank, 1);
        assert!(ranked.iter().any(|f| f.name == "f2"));
        let ranks: Vec<usize> = ranked.iter().map(|f| f.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        let total: f64 = ranked.iter().map(|f| f.importance).sum();
        assert!((total - 1.0).abs() < 1e-10);
    }
}
