//! Stage trees parsed from `explain` output.

use mongodb::bson::{Bson, Document};

use crate::bson::{first_u64, read_bool, read_str, read_u64};
use crate::error::{Error, Result};

/// Stage name the engine uses for a full collection scan.
pub const COLLECTION_SCAN_STAGE: &str = "COLLSCAN";

/// Synthetic root for aggregation explains reported as a `stages` array.
pub const PIPELINE_STAGE: &str = "PIPELINE";

const EXECUTION_TIME_ALIASES: &[&str] = &["executionTimeMillisEstimate", "executionTimeMillis"];

/// One physical operation of an execution plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawStageNode {
    pub stage: String,
    pub n_returned: Option<u64>,
    pub docs_examined: Option<u64>,
    pub keys_examined: Option<u64>,
    pub works: Option<u64>,
    pub advanced: Option<u64>,
    pub is_eof: Option<bool>,
    pub execution_time_ms: Option<u64>,
    pub index_name: Option<String>,
    pub direction: Option<String>,
    pub children: Vec<RawStageNode>,
}

impl RawStageNode {
    pub fn new(stage: impl Into<String>) -> Self {
        Self { stage: stage.into(), ..Self::default() }
    }

    pub fn with_children(mut self, children: Vec<RawStageNode>) -> Self {
        self.children = children;
        self
    }

    /// Visit every node in pre-order with its depth.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a RawStageNode, usize)) {
        self.walk_at(0, visit);
    }

    fn walk_at<'a>(&'a self, depth: usize, visit: &mut impl FnMut(&'a RawStageNode, usize)) {
        visit(self, depth);
        for child in &self.children {
            child.walk_at(depth + 1, visit);
        }
    }

    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_, _| count += 1);
        count
    }
}

/// Top-level counters reported next to the stage tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExplainSummary {
    pub n_returned: u64,
    pub docs_examined: u64,
    pub keys_examined: u64,
    pub execution_time_ms: Option<u64>,
}

/// A parsed explain result.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainPlan {
    pub root: RawStageNode,
    pub summary: ExplainSummary,
}

/// Parse raw `explain` output into a stage tree and summary counters.
pub fn parse_explain(explain: &Document) -> Result<ExplainPlan> {
    let root = stage_tree(explain)
        .ok_or_else(|| Error::Parse("explain output carries no stage tree".to_string()))?;
    let summary = build_summary(explain, &root);
    Ok(ExplainPlan { root, summary })
}

fn stage_tree(explain: &Document) -> Option<RawStageNode> {
    let winning = explain
        .get_document("queryPlanner")
        .ok()
        .and_then(|planner| planner.get_document("winningPlan").ok());

    // SBE execution trees use engine-internal stage names (scan, project, ...);
    // the planner's classic tree is the one that names COLLSCAN/IXSCAN.
    if let Some(winning) = winning
        && is_slot_based(explain, winning)
    {
        return Some(parse_stage(winning));
    }
    // Otherwise executionStats carries per-stage counters; prefer it.
    if let Some(exec) = explain
        .get_document("executionStats")
        .ok()
        .and_then(|stats| stats.get_document("executionStages").ok())
    {
        return Some(parse_stage(exec));
    }
    if let Some(winning) = winning {
        return Some(parse_stage(winning));
    }
    let stages = explain.get_array("stages").ok()?;
    let children: Vec<_> =
        stages.iter().filter_map(Bson::as_document).map(parse_pipeline_stage).collect();
    if children.is_empty() {
        return None;
    }
    Some(RawStageNode::new(PIPELINE_STAGE).with_children(children))
}

fn is_slot_based(explain: &Document, winning: &Document) -> bool {
    read_str(explain, "explainVersion") == Some("2")
        || (winning.get("stage").is_none() && winning.contains_key("slotBasedPlan"))
}

fn parse_pipeline_stage(stage_doc: &Document) -> RawStageNode {
    let Some((name, value)) = stage_doc.iter().next() else {
        return RawStageNode::new("Stage");
    };
    let mut node = RawStageNode::new(name.clone());
    node.n_returned = read_u64(stage_doc, "nReturned");
    node.execution_time_ms = first_u64(stage_doc, EXECUTION_TIME_ALIASES);

    let Some(inner) = value.as_document() else {
        return node;
    };
    if name == "$cursor"
        && let Some(tree) = stage_tree(inner)
    {
        if let Ok(stats) = inner.get_document("executionStats") {
            node.n_returned = node.n_returned.or_else(|| read_u64(stats, "nReturned"));
            node.docs_examined = read_u64(stats, "totalDocsExamined");
            node.keys_examined = read_u64(stats, "totalKeysExamined");
            node.execution_time_ms =
                node.execution_time_ms.or_else(|| read_u64(stats, "executionTimeMillis"));
        }
        node.children.push(tree);
        return node;
    }

    node.docs_examined = first_u64(inner, &["docsExamined", "totalDocsExamined"]);
    node.keys_examined = first_u64(inner, &["keysExamined", "totalKeysExamined"]);
    node.index_name = read_str(inner, "indexName").map(ToString::to_string);
    node
}

fn parse_stage(doc: &Document) -> RawStageNode {
    // SBE plans wrap the classic tree: { queryPlan: {...}, slotBasedPlan: {...} }
    if doc.get("stage").is_none()
        && let Ok(query_plan) = doc.get_document("queryPlan")
    {
        return parse_stage(query_plan);
    }

    let mut node = RawStageNode::new(stage_label(doc));
    node.n_returned = read_u64(doc, "nReturned");
    node.docs_examined = first_u64(doc, &["docsExamined", "totalDocsExamined"]);
    node.keys_examined = first_u64(doc, &["keysExamined", "totalKeysExamined"]);
    node.works = read_u64(doc, "works");
    node.advanced = read_u64(doc, "advanced");
    node.is_eof = read_bool(doc, "isEOF").or_else(|| read_u64(doc, "isEOF").map(|v| v != 0));
    node.execution_time_ms = first_u64(doc, EXECUTION_TIME_ALIASES);
    node.index_name = read_str(doc, "indexName").map(ToString::to_string);
    node.direction = read_str(doc, "direction").map(ToString::to_string);

    for key in ["inputStage", "outerStage", "innerStage", "thenStage", "elseStage"] {
        if let Ok(child) = doc.get_document(key) {
            node.children.push(parse_stage(child));
        }
    }
    if let Ok(children) = doc.get_array("inputStages") {
        node.children.extend(children.iter().filter_map(Bson::as_document).map(parse_stage));
    }
    if let Ok(shards) = doc.get_array("shards") {
        for shard in shards.iter().filter_map(Bson::as_document) {
            let plan = ["executionStages", "winningPlan", "queryPlan"]
                .iter()
                .find_map(|key| shard.get_document(key).ok())
                .unwrap_or(shard);
            node.children.push(parse_stage(plan));
        }
    }
    node
}

fn stage_label(doc: &Document) -> String {
    ["stage", "planNodeType", "strategy"]
        .iter()
        .find_map(|key| read_str(doc, key))
        .unwrap_or("Stage")
        .to_string()
}

fn build_summary(explain: &Document, root: &RawStageNode) -> ExplainSummary {
    let stats = explain.get_document("executionStats").ok().or_else(|| cursor_stats(explain));

    let mut max_docs = None;
    let mut max_keys = None;
    let mut max_time = None;
    root.walk(&mut |node, _| {
        max_docs = max_docs.max(node.docs_examined);
        max_keys = max_keys.max(node.keys_examined);
        max_time = max_time.max(node.execution_time_ms);
    });

    let stat = |key: &str| stats.and_then(|stats| read_u64(stats, key));
    ExplainSummary {
        n_returned: stat("nReturned").or(root.n_returned).unwrap_or(0),
        docs_examined: stat("totalDocsExamined").or(max_docs).unwrap_or(0),
        keys_examined: stat("totalKeysExamined").or(max_keys).unwrap_or(0),
        execution_time_ms: stat("executionTimeMillis")
            .or_else(|| read_u64(explain, "executionTimeMillis"))
            .or(max_time),
    }
}

fn cursor_stats(explain: &Document) -> Option<&Document> {
    explain.get_array("stages").ok()?.iter().filter_map(Bson::as_document).find_map(|stage| {
        let cursor = stage.get_document("$cursor").ok()?;
        cursor.get_document("executionStats").ok()
    })
}
