//! The assessment DAG: which stage depends on which, and which state slots each
//! stage reads and writes. Barrier groups are derived from it by Kahn layering.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Loading,
    Parsing,
    Analyzing,
    Matching,
    Evaluating,
    Assessing,
    Scoring,
}

impl Stage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Stage::Loading => "LOADING",
            Stage::Parsing => "PARSING",
            Stage::Analyzing => "ANALYZING",
            Stage::Matching => "MATCHING",
            Stage::Evaluating => "EVALUATING",
            Stage::Assessing => "ASSESSING",
            Stage::Scoring => "SCORING",
        }
    }

    /// Name of the component that does this stage's work.
    pub const fn agent_name(self) -> &'static str {
        match self {
            Stage::Loading => "document_loader",
            Stage::Parsing => "cv_parser",
            Stage::Analyzing => "job_analyzer",
            Stage::Matching => "skills_matcher",
            Stage::Evaluating => "experience_evaluator",
            Stage::Assessing => "culture_fit",
            Stage::Scoring => "final_scorer",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, write-once field of the workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    CvText,
    JobText,
    CvData,
    JobDescription,
    SkillMatch,
    ExperienceEvaluation,
    CultureFit,
    AssessmentResult,
}

impl Slot {
    pub const fn as_str(self) -> &'static str {
        match self {
            Slot::CvText => "cv_text",
            Slot::JobText => "job_text",
            Slot::CvData => "cv_data",
            Slot::JobDescription => "job_description",
            Slot::SkillMatch => "skill_match",
            Slot::ExperienceEvaluation => "experience_evaluation",
            Slot::CultureFit => "culture_fit",
            Slot::AssessmentResult => "assessment_result",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageNode {
    pub stage: Stage,
    pub depends_on: &'static [Stage],
    pub reads: &'static [Slot],
    pub writes: &'static [Slot],
}

const COMPARISON_READS: &[Slot] = &[Slot::CvData, Slot::JobDescription];

pub const ASSESSMENT_NODES: &[StageNode] = &[
    StageNode {
        stage: Stage::Loading,
        depends_on: &[],
        reads: &[],
        writes: &[Slot::CvText, Slot::JobText],
    },
    StageNode {
        stage: Stage::Parsing,
        depends_on: &[Stage::Loading],
        reads: &[Slot::CvText],
        writes: &[Slot::CvData],
    },
    StageNode {
        stage: Stage::Analyzing,
        depends_on: &[Stage::Loading],
        reads: &[Slot::JobText],
        writes: &[Slot::JobDescription],
    },
    StageNode {
        stage: Stage::Matching,
        depends_on: &[Stage::Parsing, Stage::Analyzing],
        reads: COMPARISON_READS,
        writes: &[Slot::SkillMatch],
    },
    StageNode {
        stage: Stage::Evaluating,
        depends_on: &[Stage::Parsing, Stage::Analyzing],
        reads: COMPARISON_READS,
        writes: &[Slot::ExperienceEvaluation],
    },
    StageNode {
        stage: Stage::Assessing,
        depends_on: &[Stage::Parsing, Stage::Analyzing],
        reads: COMPARISON_READS,
        writes: &[Slot::CultureFit],
    },
    StageNode {
        stage: Stage::Scoring,
        depends_on: &[Stage::Matching, Stage::Evaluating, Stage::Assessing],
        reads: &[
            Slot::CvData,
            Slot::JobDescription,
            Slot::SkillMatch,
            Slot::ExperienceEvaluation,
            Slot::CultureFit,
        ],
        writes: &[Slot::AssessmentResult],
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Stage {0} is declared more than once")]
    DuplicateStage(Stage),

    #[error("Stage {stage} depends on undeclared stage {dependency}")]
    UnknownDependency { stage: Stage, dependency: Stage },

    #[error("Stage {0} depends on itself")]
    SelfDependency(Stage),

    #[error("Slot '{slot}' is written by both {first} and {second}")]
    DuplicateWriter { slot: Slot, first: Stage, second: Stage },

    #[error("Stage {stage} reads '{slot}' which no upstream stage writes")]
    UnsatisfiedRead { stage: Stage, slot: Slot },

    #[error("Dependency cycle among stages: {}", .0.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", "))]
    Cycle(Vec<Stage>),
}

/// A validated stage graph together with its barrier groups.
#[derive(Debug, Clone)]
pub struct AssessmentGraph {
    nodes: Vec<StageNode>,
    groups: Vec<Vec<Stage>>,
}

impl AssessmentGraph {
    /// The standard assessment graph.
    pub fn standard() -> Result<Self, GraphError> {
        Self::new(ASSESSMENT_NODES.to_vec())
    }

    pub fn new(nodes: Vec<StageNode>) -> Result<Self, GraphError> {
        validate_nodes(&nodes)?;
        let groups = layer(&nodes)?;
        check_reads(&nodes)?;
        Ok(Self { nodes, groups })
    }

    /// Stages grouped so that every member of a group depends only on earlier groups.
    /// Declaration order is kept within a group.
    pub fn barrier_groups(&self) -> &[Vec<Stage>] {
        &self.groups
    }

    pub fn node(&self, stage: Stage) -> Option<&StageNode> {
        self.nodes.iter().find(|n| n.stage == stage)
    }
}

fn validate_nodes(nodes: &[StageNode]) -> Result<(), GraphError> {
    let mut declared = HashSet::new();
    for node in nodes {
        if !declared.insert(node.stage) {
            return Err(GraphError::DuplicateStage(node.stage));
        }
    }

    let mut writers: HashMap<Slot, Stage> = HashMap::new();
    for node in nodes {
        for &dependency in node.depends_on {
            if dependency == node.stage {
                return Err(GraphError::SelfDependency(node.stage));
            }
            if !declared.contains(&dependency) {
                return Err(GraphError::UnknownDependency {
                    stage: node.stage,
                    dependency,
                });
            }
        }
        for &slot in node.writes {
            if let Some(&first) = writers.get(&slot) {
                return Err(GraphError::DuplicateWriter {
                    slot,
                    first,
                    second: node.stage,
                });
            }
            writers.insert(slot, node.stage);
        }
    }
    Ok(())
}

/// Kahn's algorithm, emitting one layer per round instead of one node.
fn layer(nodes: &[StageNode]) -> Result<Vec<Vec<Stage>>, GraphError> {
    let mut done: HashSet<Stage> = HashSet::new();
    let mut remaining: Vec<&StageNode> = nodes.iter().collect();
    let mut groups = Vec::new();

    while !remaining.is_empty() {
        let (ready, blocked): (Vec<&StageNode>, Vec<&StageNode>) = remaining
            .into_iter()
            .partition(|n| n.depends_on.iter().all(|d| done.contains(d)));

        if ready.is_empty() {
            return Err(GraphError::Cycle(blocked.iter().map(|n| n.stage).collect()));
        }

        let group: Vec<Stage> = ready.iter().map(|n| n.stage).collect();
        done.extend(group.iter().copied());
        groups.push(group);
        remaining = blocked;
    }
    Ok(groups)
}

/// Every slot a stage reads must be written by one of its transitive dependencies.
fn check_reads(nodes: &[StageNode]) -> Result<(), GraphError> {
    let by_stage: HashMap<Stage, &StageNode> = nodes.iter().map(|n| (n.stage, n)).collect();

    for node in nodes {
        let mut upstream_writes: HashSet<Slot> = HashSet::new();
        let mut seen: HashSet<Stage> = HashSet::new();
        let mut stack: Vec<Stage> = node.depends_on.to_vec();
        while let Some(stage) = stack.pop() {
            if !seen.insert(stage) {
                continue;
            }
            if let Some(dep) = by_stage.get(&stage) {
                upstream_writes.extend(dep.writes.iter().copied());
                stack.extend(dep.depends_on.iter().copied());
            }
        }
        if let Some(&slot) = node.reads.iter().find(|s| !upstream_writes.contains(s)) {
            return Err(GraphError::UnsatisfiedRead {
                stage: node.stage,
                slot,
            });
        }
    }
    Ok(())
}
