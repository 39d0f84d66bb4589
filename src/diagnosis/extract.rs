//! Performance block and flattened stage list extraction.

use crate::diagnosis::plan::{COLLECTION_SCAN_STAGE, ExplainPlan, ExplainSummary, RawStageNode};
use crate::models::{FlatStage, Performance};

const BLOCKING_SORT_STAGE: &str = "SORT";
const COVERED_PROJECTION_STAGE: &str = "PROJECTION_COVERED";

/// Output of a single pass over the stage tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extracted {
    pub performance: Performance,
    pub stages: Vec<FlatStage>,
}

/// Walk the plan once, collecting the flattened stages and plan-wide flags.
pub fn extract(plan: &ExplainPlan) -> Extracted {
    let mut stages = Vec::new();
    let mut indexes_used: Vec<String> = Vec::new();
    let mut is_full_scan = false;
    let mut has_blocking_sort = false;
    let mut has_covered_projection = false;

    plan.root.walk(&mut |node: &RawStageNode, depth| {
        stages.push(flat_stage(node, depth));
        if let Some(index) = &node.index_name
            && !indexes_used.contains(index)
        {
            indexes_used.push(index.clone());
        }
        is_full_scan |= node.stage == COLLECTION_SCAN_STAGE;
        has_blocking_sort |= node.stage == BLOCKING_SORT_STAGE;
        has_covered_projection |= node.stage == COVERED_PROJECTION_STAGE;
    });

    let ExplainSummary { n_returned, docs_examined, keys_examined, execution_time_ms } =
        plan.summary;
    let is_covered = has_covered_projection
        || (!indexes_used.is_empty() && docs_examined == 0 && keys_examined > 0);

    Extracted {
        performance: Performance {
            execution_time_ms,
            total_keys_examined: keys_examined,
            total_docs_examined: docs_examined,
            total_docs_returned: n_returned,
            indexes_used,
            is_full_scan,
            efficiency: efficiency(n_returned, docs_examined),
            has_blocking_sort,
            is_covered,
        },
        stages,
    }
}

/// Percentage of examined documents that were returned, rounded and clamped
/// to [0, 100]. Nothing examined counts as fully efficient.
pub fn efficiency(docs_returned: u64, docs_examined: u64) -> u8 {
    if docs_examined == 0 {
        return 100;
    }
    if docs_returned == 0 {
        return 0;
    }
    let percent = (100.0 * docs_returned as f64 / docs_examined as f64).round();
    percent.clamp(0.0, 100.0) as u8
}

fn flat_stage(node: &RawStageNode, depth: usize) -> FlatStage {
    FlatStage {
        stage: node.stage.clone(),
        depth,
        n_returned: node.n_returned,
        docs_examined: node.docs_examined,
        keys_examined: node.keys_examined,
        works: node.works,
        advanced: node.advanced,
        is_eof: node.is_eof,
        execution_time_ms: node.execution_time_ms,
        index_name: node.index_name.clone(),
        direction: node.direction.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_scan(name: &str) -> RawStageNode {
        RawStageNode { index_name: Some(name.to_string()), ..RawStageNode::new("IXSCAN") }
    }

    fn plan(root: RawStageNode, n_returned: u64, docs_examined: u64) -> ExplainPlan {
        ExplainPlan {
            root,
            summary: ExplainSummary {
                n_returned,
                docs_examined,
                keys_examined: 0,
                execution_time_ms: Some(7),
            },
        }
    }

    #[test]
    fn efficiency_edges() {
        assert_eq!(efficiency(0, 0), 100);
        assert_eq!(efficiency(500, 0), 100);
        assert_eq!(efficiency(0, 10), 0);
        assert_eq!(efficiency(3, 50_000), 0);
        assert_eq!(efficiency(1, 3), 33);
        assert_eq!(efficiency(2, 3), 67);
        assert_eq!(efficiency(3, 3), 100);
        // returned can exceed examined for covered or index-only plans
        assert_eq!(efficiency(40, 4), 100);
    }

    #[test]
    fn efficiency_stays_in_range_across_inputs() {
        for examined in [0_u64, 1, 2, 7, 100, 9_999, u64::MAX] {
            for returned in [0_u64, 1, 5, 100, 10_000, u64::MAX] {
                assert!(efficiency(returned, examined) <= 100);
            }
        }
    }

    #[test]
    fn flattening_is_preorder_with_depths() {
        let root = RawStageNode::new("SHARD_MERGE").with_children(vec![
            RawStageNode::new("FETCH").with_children(vec![index_scan("a_1")]),
            RawStageNode::new("SORT").with_children(vec![
                RawStageNode::new("COLLSCAN"),
                index_scan("b_1"),
            ]),
            index_scan("a_1"),
        ]);
        let extracted = extract(&plan(root.clone(), 1, 1));

        let labels: Vec<_> =
            extracted.stages.iter().map(|s| (s.stage.as_str(), s.depth)).collect();
        assert_eq!(
            labels,
            vec![
                ("SHARD_MERGE", 0),
                ("FETCH", 1),
                ("IXSCAN", 2),
                ("SORT", 1),
                ("COLLSCAN", 2),
                ("IXSCAN", 2),
                ("IXSCAN", 1),
            ]
        );
        assert_eq!(extracted.stages.len(), root.node_count());
        assert_eq!(extracted.performance.indexes_used, vec!["a_1", "b_1"]);
        assert!(extracted.performance.is_full_scan);
        assert!(extracted.performance.has_blocking_sort);
    }

    #[test]
    fn index_only_plan_is_covered_and_not_full_scan() {
        let root =
            RawStageNode::new("PROJECTION_DEFAULT").with_children(vec![index_scan("status_1")]);
        let mut explain = plan(root, 3, 0);
        explain.summary.keys_examined = 3;
        let extracted = extract(&explain);
        assert!(!extracted.performance.is_full_scan);
        assert!(extracted.performance.is_covered);
        assert_eq!(extracted.performance.efficiency, 100);
        assert_eq!(extracted.performance.execution_time_ms, Some(7));
    }

    #[test]
    fn scan_stage_match_is_exact() {
        let extracted = extract(&plan(RawStageNode::new("COLLSCAN_LIKE"), 1, 10));
        assert!(!extracted.performance.is_full_scan);
        assert_eq!(extracted.performance.efficiency, 10);
    }
}
