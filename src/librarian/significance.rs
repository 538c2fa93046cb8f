//! Significance engine
//!
//! Reads the whole graph, classifies findings, scores them, and decides
//! whether accumulated signals warrant generating evolution proposals. Each
//! finding query is isolated: a failure degrades that one finding to an empty
//! list and a report line, never aborting the check.

use super::proposal::ProposalStore;
use crate::graph::{snippet, EntityKind, RelationshipKind};
use crate::storage::{EntityFilter, GraphStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

pub const FRICTION_RECURRENCE_THRESHOLD: i64 = 3;
pub const HIGH_SEVERITY_THRESHOLD: i64 = 5;
pub const PATTERN_EMERGENCE_THRESHOLD: i64 = 2;
pub const PATTERN_CONFIRMATION_THRESHOLD: i64 = 5;
/// Per-finding result cap.
pub const FINDING_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecurringFriction {
    pub id: String,
    pub description: String,
    pub category: String,
    pub recurrence_count: i64,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternFinding {
    pub id: String,
    pub name: String,
    pub occurrence_count: i64,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BeliefContradiction {
    pub belief_a: String,
    pub belief_b: String,
    pub content_a: String,
    pub content_b: String,
    pub resolved: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnresolvedQuestion {
    pub id: String,
    pub content: String,
    pub raised_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LearningChain {
    pub friction_id: String,
    pub insight_id: String,
    pub friction: String,
    pub insight: String,
}

/// Everything one check observed, plus report lines for degraded queries.
#[derive(Debug, Default, Serialize)]
pub struct Findings {
    pub recurring_friction: Vec<RecurringFriction>,
    pub emerging_patterns: Vec<PatternFinding>,
    pub confirmed_patterns: Vec<PatternFinding>,
    pub contradictions: Vec<BeliefContradiction>,
    pub unresolved_questions: Vec<UnresolvedQuestion>,
    pub learning_chains: Vec<LearningChain>,
    pub report: Vec<String>,
}

impl Findings {
    pub fn collect(store: &dyn GraphStore) -> Self {
        let mut findings = Findings::default();

        match collect_friction(store) {
            Ok(list) => findings.recurring_friction = list,
            Err(e) => findings.report.push(format!("recurring friction query failed: {}", e)),
        }
        match collect_patterns(store) {
            Ok((emerging, confirmed)) => {
                findings.emerging_patterns = emerging;
                findings.confirmed_patterns = confirmed;
            }
            Err(e) => findings.report.push(format!("pattern query failed: {}", e)),
        }
        match collect_contradictions(store) {
            Ok(list) => findings.contradictions = list,
            Err(e) => findings.report.push(format!("contradiction query failed: {}", e)),
        }
        match collect_unresolved_questions(store) {
            Ok(list) => findings.unresolved_questions = list,
            Err(e) => findings.report.push(format!("question query failed: {}", e)),
        }
        match collect_learning_chains(store) {
            Ok(list) => findings.learning_chains = list,
            Err(e) => findings.report.push(format!("learning chain query failed: {}", e)),
        }

        for line in &findings.report {
            warn!("{}", line);
        }
        findings
    }

    pub fn high_severity_friction(&self) -> impl Iterator<Item = &RecurringFriction> {
        self.recurring_friction
            .iter()
            .filter(|f| f.severity == Severity::High)
    }

    pub fn unresolved_contradictions(&self) -> impl Iterator<Item = &BeliefContradiction> {
        self.contradictions.iter().filter(|c| !c.resolved)
    }
}

fn collect_friction(store: &dyn GraphStore) -> crate::storage::StorageResult<Vec<RecurringFriction>> {
    let frictions = store.find_entities(&EntityFilter::new().with_kind(EntityKind::Friction))?;
    let mut list: Vec<RecurringFriction> = frictions
        .into_iter()
        .filter_map(|f| {
            let count = f.int_prop("recurrence_count").unwrap_or(1);
            if count < FRICTION_RECURRENCE_THRESHOLD {
                return None;
            }
            Some(RecurringFriction {
                id: f.id.to_string(),
                description: snippet(&f.content, 120),
                category: f.str_prop("category").unwrap_or("uncategorized").to_string(),
                recurrence_count: count,
                severity: if count >= HIGH_SEVERITY_THRESHOLD {
                    Severity::High
                } else {
                    Severity::Medium
                },
            })
        })
        .collect();
    list.sort_by(|a, b| b.recurrence_count.cmp(&a.recurrence_count));
    list.truncate(FINDING_LIMIT);
    Ok(list)
}

fn collect_patterns(
    store: &dyn GraphStore,
) -> crate::storage::StorageResult<(Vec<PatternFinding>, Vec<PatternFinding>)> {
    let patterns = store.find_entities(&EntityFilter::new().with_kind(EntityKind::Pattern))?;
    let mut emerging = Vec::new();
    let mut confirmed = Vec::new();
    for p in patterns {
        let count = p.int_prop("occurrence_count").unwrap_or(0);
        let status = p.str_prop("status").unwrap_or("emerging").to_string();
        let finding = PatternFinding {
            id: p.id.to_string(),
            name: p.str_prop("name").unwrap_or(&p.content).to_string(),
            occurrence_count: count,
            status: status.clone(),
        };
        if count >= PATTERN_CONFIRMATION_THRESHOLD {
            confirmed.push(finding);
        } else if count >= PATTERN_EMERGENCE_THRESHOLD && status != "confirmed" {
            emerging.push(finding);
        }
    }
    emerging.sort_by(|a, b| b.occurrence_count.cmp(&a.occurrence_count));
    confirmed.sort_by(|a, b| b.occurrence_count.cmp(&a.occurrence_count));
    emerging.truncate(FINDING_LIMIT);
    confirmed.truncate(FINDING_LIMIT);
    Ok((emerging, confirmed))
}

fn collect_contradictions(
    store: &dyn GraphStore,
) -> crate::storage::StorageResult<Vec<BeliefContradiction>> {
    let mut list = Vec::new();
    for edge in store.relationships_of_kind(RelationshipKind::Contradicts)? {
        let (Some(a), Some(b)) = (
            store.load_entity(&edge.source)?,
            store.load_entity(&edge.target)?,
        ) else {
            continue;
        };
        if a.kind != EntityKind::Belief || b.kind != EntityKind::Belief {
            continue;
        }
        list.push(BeliefContradiction {
            belief_a: a.id.to_string(),
            belief_b: b.id.to_string(),
            content_a: snippet(&a.content, 60),
            content_b: snippet(&b.content, 60),
            resolved: edge.str_prop("resolution").is_some(),
        });
        if list.len() >= FINDING_LIMIT {
            break;
        }
    }
    Ok(list)
}

fn collect_unresolved_questions(
    store: &dyn GraphStore,
) -> crate::storage::StorageResult<Vec<UnresolvedQuestion>> {
    let questions = store.find_entities(&EntityFilter::new().with_kind(EntityKind::Question))?;
    let mut list: Vec<UnresolvedQuestion> = questions
        .into_iter()
        .filter(|q| q.time_prop("resolved_at").is_none())
        .map(|q| UnresolvedQuestion {
            raised_at: q.time_prop("raised_at"),
            id: q.id.to_string(),
            content: snippet(&q.content, 120),
        })
        .collect();
    list.sort_by(|a, b| b.raised_at.cmp(&a.raised_at));
    list.truncate(FINDING_LIMIT);
    Ok(list)
}

fn collect_learning_chains(
    store: &dyn GraphStore,
) -> crate::storage::StorageResult<Vec<LearningChain>> {
    let mut list = Vec::new();
    for edge in store.relationships_of_kind(RelationshipKind::LedTo)? {
        let (Some(source), Some(target)) = (
            store.load_entity(&edge.source)?,
            store.load_entity(&edge.target)?,
        ) else {
            continue;
        };
        if source.kind != EntityKind::Friction || target.kind != EntityKind::Insight {
            continue;
        }
        list.push(LearningChain {
            friction_id: source.id.to_string(),
            insight_id: target.id.to_string(),
            friction: snippet(&source.content, 80),
            insight: snippet(&target.content, 80),
        });
        if list.len() >= FINDING_LIMIT {
            break;
        }
    }
    Ok(list)
}

/// Recommendation bands over the significance score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Urgent,
    Attention,
    Review,
    Monitor,
    Stable,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Recommendation::Urgent => "urgent: multiple acute signals, act now",
            Recommendation::Attention => "attention: significant signals accumulating",
            Recommendation::Review => "review: an acute signal warrants a look",
            Recommendation::Monitor => "monitor: some signals, below action threshold",
            Recommendation::Stable => "stable: nothing notable",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Serialize)]
pub struct Significance {
    pub score: i64,
    pub warrants_evolution: bool,
    pub recommendation: Recommendation,
}

impl Significance {
    /// Per-category contributions are clamped, then summed. The evolution
    /// decision is a disjunction independent of the score so a single acute
    /// signal can trigger action even when the aggregate stays low.
    pub fn from_findings(findings: &Findings) -> Self {
        let high = findings.high_severity_friction().count() as i64;
        let recurring = findings.recurring_friction.len() as i64;
        let emerging = findings.emerging_patterns.len() as i64;
        let confirmed = findings.confirmed_patterns.len() as i64;
        let contradictions = findings.unresolved_contradictions().count() as i64;
        let questions = findings.unresolved_questions.len() as i64;

        let score = (high * 15).min(30)
            + (recurring * 5).min(20)
            + (emerging * 5).min(15)
            + (confirmed * 3).min(10)
            + (contradictions * 10).min(20)
            + (questions * 2).min(5);

        let warrants_evolution =
            high >= 1 || recurring >= 2 || contradictions >= 1 || emerging >= 3;

        let recommendation = if score >= 50 {
            Recommendation::Urgent
        } else if score >= 30 {
            Recommendation::Attention
        } else if warrants_evolution {
            Recommendation::Review
        } else if score >= 15 {
            Recommendation::Monitor
        } else {
            Recommendation::Stable
        };

        Self {
            score,
            warrants_evolution,
            recommendation,
        }
    }
}

/// Outcome of a full significance check.
#[derive(Debug, Serialize)]
pub struct PatternCheck {
    pub findings: Findings,
    pub significance: Significance,
    pub proposals_generated: Vec<String>,
    pub summary: String,
}

/// Run a significance check; when warranted and enabled, write up to three
/// proposal documents (one per triggering category).
pub fn pattern_check(
    store: &dyn GraphStore,
    proposals: &dyn ProposalStore,
    session_id: Option<&str>,
    generate_proposals: bool,
) -> PatternCheck {
    let findings = Findings::collect(store);
    let significance = Significance::from_findings(&findings);

    let mut generated = Vec::new();
    if generate_proposals && significance.warrants_evolution {
        for doc in proposal_documents(&findings, session_id) {
            match write_proposal(proposals, &doc) {
                Ok(path) => generated.push(path),
                Err(e) => warn!("proposal write failed: {}", e),
            }
        }
    }

    let summary = format!(
        "score {} ({}), {} recurring friction, {} emerging / {} confirmed patterns, \
         {} contradictions, {} open questions, {} proposal(s) written",
        significance.score,
        significance.recommendation,
        findings.recurring_friction.len(),
        findings.emerging_patterns.len(),
        findings.confirmed_patterns.len(),
        findings.contradictions.len(),
        findings.unresolved_questions.len(),
        generated.len(),
    );

    PatternCheck {
        findings,
        significance,
        proposals_generated: generated,
        summary,
    }
}

struct ProposalDoc {
    slug: &'static str,
    title: String,
    observation: String,
    rationale: String,
    direction: String,
    evidence: Vec<String>,
    session: String,
}

const EVIDENCE_LIMIT: usize = 5;

fn proposal_documents(findings: &Findings, session_id: Option<&str>) -> Vec<ProposalDoc> {
    let session = session_id.unwrap_or("none").to_string();
    let mut docs = Vec::new();

    let high: Vec<&RecurringFriction> = findings.high_severity_friction().collect();
    if !high.is_empty() {
        docs.push(ProposalDoc {
            slug: "recurring-friction",
            title: format!("Address {} high-severity recurring friction point(s)", high.len()),
            observation: "The same friction keeps recurring past the high-severity threshold."
                .to_string(),
            rationale: "Friction that recurs five or more times is a structural problem, \
                        not bad luck; each recurrence costs a session time."
                .to_string(),
            direction: "Pick the top friction by recurrence count and eliminate its root cause."
                .to_string(),
            evidence: high
                .iter()
                .take(EVIDENCE_LIMIT)
                .map(|f| format!("{} (x{}): {}", f.category, f.recurrence_count, snippet(&f.description, 80)))
                .collect(),
            session: session.clone(),
        });
    }

    let contradictions: Vec<&BeliefContradiction> = findings.unresolved_contradictions().collect();
    if !contradictions.is_empty() {
        docs.push(ProposalDoc {
            slug: "belief-contradictions",
            title: format!("Resolve {} unresolved belief contradiction(s)", contradictions.len()),
            observation: "Held beliefs contradict each other without a recorded resolution."
                .to_string(),
            rationale: "Contradictory operating assumptions produce inconsistent decisions \
                        until one is superseded or refined."
                .to_string(),
            direction: "Review each pair and record a resolution, supersession, or refinement."
                .to_string(),
            evidence: contradictions
                .iter()
                .take(EVIDENCE_LIMIT)
                .map(|c| format!("'{}' vs '{}'", c.content_a, c.content_b))
                .collect(),
            session: session.clone(),
        });
    }

    if !findings.confirmed_patterns.is_empty() {
        docs.push(ProposalDoc {
            slug: "codify-patterns",
            title: format!(
                "Codify {} confirmed pattern(s) into guidance",
                findings.confirmed_patterns.len()
            ),
            observation: "Patterns have crossed the confirmation threshold but carry no \
                          codified guidance."
                .to_string(),
            rationale: "A confirmed pattern that stays implicit keeps being rediscovered \
                        instead of applied."
                .to_string(),
            direction: "Write each pattern up as an explicit protocol or belief.".to_string(),
            evidence: findings
                .confirmed_patterns
                .iter()
                .take(EVIDENCE_LIMIT)
                .map(|p| format!("{} (x{})", p.name, p.occurrence_count))
                .collect(),
            session,
        });
    }

    docs
}

fn write_proposal(
    proposals: &dyn ProposalStore,
    doc: &ProposalDoc,
) -> Result<String, super::proposal::ProposalError> {
    let date = Utc::now().format("%Y%m%d").to_string();
    let seq = proposals.next_sequence(&date)?;
    let filename = format!("evo-{}-{:02}-{}.md", date, seq, doc.slug);

    let mut body = String::new();
    body.push_str(&format!("# {}\n\n", doc.title));
    body.push_str("## Metadata\n\n");
    body.push_str(&format!("- Proposal: evo-{}-{:02}-{}\n", date, seq, doc.slug));
    body.push_str(&format!("- Date: {}\n", Utc::now().format("%Y-%m-%d")));
    body.push_str(&format!("- Originating Session: {}\n", doc.session));
    body.push_str("- Generated By: mnema pattern_check\n");
    body.push_str("- Stage: observation\n\n");
    body.push_str("## The Observation\n\n");
    body.push_str(&doc.observation);
    body.push_str("\n\nEvidence:\n");
    for item in &doc.evidence {
        body.push_str(&format!("- {}\n", item));
    }
    body.push_str("\n## Why This Matters\n\n");
    body.push_str(&doc.rationale);
    body.push_str("\n\n## Initial Direction\n\n");
    body.push_str(&doc.direction);
    body.push_str("\n\n## Stage History\n\n");
    body.push_str(&format!(
        "- {}: observation (auto-generated)\n",
        Utc::now().format("%Y-%m-%d")
    ));

    proposals.write(&filename, &body)
}
