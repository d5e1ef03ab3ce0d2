mod support;

use std::sync::Arc;

use proptest::prelude::*;

use plan_engine::api::{
    AnalysisPlan, Bucket, ChartSpec, FilterNode, GroupBySpec, MetricSpec, NumericProperty,
    Operator, PlanExecutor, SexType, StrokeType,
};
use plan_engine::graphql::{BackendFilter, LogicalOperator};
use plan_engine::metadata::{derive_distribution, NoMetadata};
use plan_engine::models::DistributionSpec;
use plan_engine::services::translate;

use support::{distribution_json, fixed_options, MockClient, Reply};

fn leaf() -> impl Strategy<Value = FilterNode> {
    prop_oneof![
        (0i64..120).prop_map(|v| FilterNode::integer(NumericProperty::Age, Operator::Ge, v)),
        any::<bool>().prop_map(|value| FilterNode::Boolean {
            property: "THROMBOLYSIS".to_string(),
            value,
        }),
        prop::sample::select(SexType::ALL.to_vec()).prop_map(FilterNode::sex),
        prop::sample::select(StrokeType::ALL.to_vec()).prop_map(FilterNode::stroke),
    ]
}

fn filter_tree() -> impl Strategy<Value = FilterNode> {
    leaf().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(FilterNode::and),
            prop::collection::vec(inner.clone(), 0..4).prop_map(FilterNode::or),
            inner.prop_map(FilterNode::not),
        ]
    })
}

/// Walks source and translation side by side.
fn assert_structure(node: &FilterNode, translated: Option<&BackendFilter>) {
    match node {
        FilterNode::And { children } | FilterNode::Or { children } => {
            let expected_op = if matches!(node, FilterNode::And { .. }) {
                LogicalOperator::And
            } else {
                LogicalOperator::Or
            };
            let Some(BackendFilter::Logical { operator, children: out }) = translated else {
                panic!("logical node must translate to a logical node");
            };
            assert_eq!(*operator, expected_op);
            let kept: Vec<&FilterNode> = children.iter().filter(|c| translate(c).is_some()).collect();
            assert_eq!(out.len(), kept.len());
            for (child, result) in kept.into_iter().zip(out) {
                assert_structure(child, Some(result));
            }
        }
        FilterNode::Not { child } => {
            let inner = translate(child);
            assert_eq!(translated.is_none(), inner.is_none());
            if let Some(BackendFilter::Logical { operator, children }) = translated {
                assert_eq!(*operator, LogicalOperator::Not);
                assert_eq!(children.len(), 1);
                assert_structure(child, children.first());
            }
        }
        FilterNode::Boolean { .. } => assert!(translated.is_none()),
        _ => assert!(translated.is_some()),
    }
}

proptest! {
    #[test]
    fn prop_translate_preserves_structure(tree in filter_tree()) {
        let translated = translate(&tree);
        assert_structure(&tree, translated.as_ref());
    }

    #[test]
    fn prop_derived_distribution_is_ordered(min in -500i64..500, max in -500i64..500, buckets in 1u32..50) {
        let explicit = DistributionSpec::new(buckets, min, max);
        let derived = derive_distribution(&NoMetadata, "ODT", Some(explicit));
        prop_assert!(derived.min_value <= derived.max_value);
        prop_assert_eq!(derived.min_value, min.min(max));
        prop_assert_eq!(derived.num_buckets, buckets);
    }

    #[test]
    fn prop_query_count_is_product_of_category_counts(
        sexes in prop::sample::subsequence(SexType::ALL.to_vec(), 1..=2),
        strokes in prop::sample::subsequence(StrokeType::ALL.to_vec(), 1..=3),
        bucket_count in 0usize..4,
        with_region in any::<bool>(),
    ) {
        let mut groups = vec![
            GroupBySpec::Sex { categories: Some(sexes.clone()) },
            GroupBySpec::StrokeType { categories: Some(strokes.clone()) },
        ];
        if bucket_count > 0 {
            groups.push(GroupBySpec::Age {
                buckets: (0..bucket_count as i64).map(|i| Bucket::new(i * 20, i * 20 + 20)).collect(),
            });
        }
        if with_region {
            groups.push(GroupBySpec::canonical("REGION"));
        }
        let plan = AnalysisPlan::new(vec![
            ChartSpec::new("BAR", vec![MetricSpec::new("DTN")]).with_group_by(groups),
        ]);

        let client = Arc::new(MockClient::new(Reply::Json(distribution_json(&["DTN"], &[1]))));
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime
            .block_on(
                PlanExecutor::new(client.clone(), Arc::new(NoMetadata))
                    .with_options(fixed_options())
                    .execute(&plan, "token", 3, None),
            )
            .unwrap();

        let expected = sexes.len() * strokes.len() * bucket_count.max(1);
        prop_assert_eq!(client.queries().len(), expected);
        prop_assert!(client.peak_in_flight() <= 3);
    }
}
