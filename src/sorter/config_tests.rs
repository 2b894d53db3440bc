#[cfg(test)]
mod tests {
    use super::super::config::*;
    use super::super::error::SortError;
    use super::super::features::Feature;
    use approx::assert_relative_eq;
    use std::collections::HashMap;
    use std::time::Duration;

    fn create_test_config() -> SortConfig {
        SortConfig {
            weights: WeightConfig::recommended(),
            scoring: ScoringMode::Linear,
            optimizer: OptimizerOptions {
                num_particles: 10,
                iterations: 20,
                random_seed: Some(7),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_default_optimizer_options() {
        let options = OptimizerOptions::default();
        assert_eq!(options.num_particles, 30);
        assert_eq!(options.iterations, 100);
        assert_relative_eq!(options.c1, 0.5);
        assert_relative_eq!(options.c2, 0.6);
        assert_relative_eq!(options.w_start, 0.9);
        assert_relative_eq!(options.w_end, 0.4);
        assert_eq!(options.seeding, SeedingMode::Random);
        assert!(options.seed_with_tour);
        assert!(options.random_seed.is_none());
        assert!(options.time_limit().is_none());
    }

    #[test]
    fn test_recommended_weights() {
        let weights = WeightConfig::recommended();
        assert_relative_eq!(weights.energy, 3.0);
        assert_relative_eq!(weights.valence, 4.0);
        assert_relative_eq!(weights.danceability, 2.0);
        assert_relative_eq!(weights.key, 3.0);
        assert_relative_eq!(weights.tempo, 0.0);
        assert_relative_eq!(weights.total(), 12.0);
        assert!(!weights.is_all_zero());
        assert!(WeightConfig::default().is_all_zero());
    }

    #[test]
    fn test_weights_from_loose_mapping() {
        let mut map = HashMap::new();
        map.insert("Energy".to_string(), 2.0);
        map.insert(" tempo ".to_string(), 0.5);
        map.insert("acousticness".to_string(), 9.0);

        let weights = WeightConfig::from_map(&map);
        assert_relative_eq!(weights.get(Feature::Energy), 2.0);
        assert_relative_eq!(weights.get(Feature::Tempo), 0.5);
        assert_relative_eq!(weights.total(), 2.5);
    }

    #[test]
    fn test_negative_or_nan_weight_rejected() {
        let mut config = create_test_config();
        assert!(config.validate().is_ok());

        config.weights.set(Feature::Loudness, -0.1);
        assert!(matches!(config.validate(), Err(SortError::Configuration(_))));

        config.weights.set(Feature::Loudness, f64::NAN);
        assert!(matches!(config.validate(), Err(SortError::Configuration(_))));
    }

    #[test]
    fn test_optimizer_bounds() {
        let mut config = create_test_config();
        config.optimizer.num_particles = 0;
        assert!(config.validate().is_err());

        let mut config = create_test_config();
        config.optimizer.w_start = 1.5;
        assert!(config.validate().is_err());

        let mut config = create_test_config();
        config.optimizer.c2 = -0.2;
        assert!(config.validate().is_err());

        let mut config = create_test_config();
        config.optimizer.stall_iterations = Some(0);
        assert!(config.validate().is_err());

        let mut config = create_test_config();
        config.optimizer.stall_iterations = Some(5);
        config.optimizer.time_limit_ms = Some(250);
        assert!(config.validate().is_ok());
        assert_eq!(config.optimizer.time_limit(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let json = r#"{
            "weights": { "energy": 1.5, "key": 2 },
            "scoring": "squared",
            "optimizer": { "iterations": 40, "seeding": "feature_sum", "random_seed": 3 }
        }"#;
        let config: SortConfig = serde_json::from_str(json).unwrap();

        assert_relative_eq!(config.weights.energy, 1.5);
        assert_relative_eq!(config.weights.key, 2.0);
        assert_relative_eq!(config.weights.valence, 0.0);
        assert_eq!(config.scoring, ScoringMode::Squared);
        assert_eq!(config.optimizer.iterations, 40);
        assert_eq!(config.optimizer.num_particles, 30);
        assert_eq!(config.optimizer.seeding, SeedingMode::FeatureSum);
        assert_eq!(config.optimizer.random_seed, Some(3));
    }

    #[test]
    fn test_unknown_weight_keys_in_json_are_skipped() {
        let json = r#"{ "weights": { "acousticness": 2, "Tempo": 1.25, "mode": 0.5 } }"#;
        let config: SortConfig = serde_json::from_str(json).unwrap();

        let expected = WeightConfig {
            tempo: 1.25,
            mode: 0.5,
            ..Default::default()
        };
        assert_eq!(config.weights, expected);
        assert_relative_eq!(config.weights.total(), 1.75);
    }

    #[test]
    fn test_empty_json_is_default_config() {
        let config: SortConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SortConfig::default());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = create_test_config();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: SortConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
