//! Distribution defaults for metrics without an explicit request.

use super::MetadataProvider;
use crate::models::DistributionSpec;

pub const DEFAULT_BUCKETS: u32 = 20;
pub const DEFAULT_RANGE_MIN: i64 = 0;
pub const DEFAULT_RANGE_MAX: i64 = 200;

/// Effective distribution for `metric_code`.
///
/// An explicit spec wins; otherwise each of bucket count, min and max falls
/// back independently from the catalog profile to `(20, 0, 200)`. A zero
/// bucket count from the catalog is treated as missing. The result always has
/// `min_value <= max_value`.
pub fn derive_distribution(
    provider: &dyn MetadataProvider,
    metric_code: &str,
    explicit: Option<DistributionSpec>,
) -> DistributionSpec {
    if let Some(spec) = explicit {
        return spec.normalized();
    }

    let profile = provider.numeric_profile(metric_code).unwrap_or_default();
    DistributionSpec::new(
        profile
            .default_buckets
            .filter(|b| *b > 0)
            .unwrap_or(DEFAULT_BUCKETS),
        profile.range_min.unwrap_or(DEFAULT_RANGE_MIN),
        profile.range_max.unwrap_or(DEFAULT_RANGE_MAX),
    )
    .normalized()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{MetricCatalog, NoMetadata};

    #[test]
    fn test_no_metadata_yields_fixed_default() {
        let spec = derive_distribution(&NoMetadata, "DTN", None);
        assert_eq!(spec, DistributionSpec::new(20, 0, 200));
    }

    #[test]
    fn test_explicit_override_wins_and_is_normalized() {
        let spec = derive_distribution(&NoMetadata, "DTN", Some(DistributionSpec::new(5, 90, 10)));
        assert_eq!(spec, DistributionSpec::new(5, 10, 90));
    }

    #[test]
    fn test_catalog_profile_with_inverted_range() {
        let catalog: MetricCatalog = r#"
[[metrics]]
code = "ODT"
data_type = "numeric"
[metrics.numeric]
range_min = 300
range_max = 30
default_buckets = 0
"#
        .parse()
        .unwrap();
        let spec = derive_distribution(&catalog, "odt", None);
        assert_eq!(spec, DistributionSpec::new(20, 30, 300));
    }

    #[test]
    fn test_partial_profile_fills_gaps() {
        let catalog: MetricCatalog = r#"
[[metrics]]
code = "AGE"
[metrics.numeric]
range_min = 18
"#
        .parse()
        .unwrap();
        assert_eq!(
            derive_distribution(&catalog, "AGE", None),
            DistributionSpec::new(20, 18, 200)
        );
    }
}
