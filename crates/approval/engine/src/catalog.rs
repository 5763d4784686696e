//! Built-in stage graphs for every supported request type
//!
//! The catalog is assembled once at startup and validated eagerly, so a
//! malformed graph fails service construction instead of the first
//! request that routes through it.

use approval_types::{
    ApprovalError, ApprovalResult, AssigneeRule, RequestType, SkipRule, StageDefinition, StageGraph,
};
use org_types::Scope;
use std::collections::HashMap;

/// Immutable set of stage graphs keyed by request type
pub struct StageGraphCatalog {
    graphs: HashMap<RequestType, StageGraph>,
}

impl StageGraphCatalog {
    /// Build the catalog of built-in graphs
    pub fn builtin() -> ApprovalResult<Self> {
        let mut graphs = HashMap::new();
        for graph in [
            bid_graph()?,
            worker_bid_graph()?,
            technical_request_graph()?,
            cleaning_request_graph()?,
            it_bid_graph()?,
        ] {
            graph.validate()?;
            graphs.insert(graph.request_type, graph);
        }
        Ok(Self { graphs })
    }

    /// Look up the graph for a request type
    pub fn get(&self, request_type: RequestType) -> ApprovalResult<&StageGraph> {
        self.graphs.get(&request_type).ok_or_else(|| {
            ApprovalError::Configuration(format!("no stage graph for {request_type}"))
        })
    }

    /// Number of registered graphs
    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}

/// Payment bid: a linear chain of nine review columns.
///
/// The first three reviewers are pinned per request at creation; the
/// rest are resolved by scope. Card and cash payments diverge at the
/// accountant stages, and small amounts bypass the owner entirely.
fn bid_graph() -> ApprovalResult<StageGraph> {
    StageGraph::new(RequestType::Bid)
        .with_stage(
            StageDefinition::new("fac", Scope::BidFac, 1).with_assignee(AssigneeRule::Pinned),
        )?
        .with_stage(
            StageDefinition::new("cc", Scope::BidCostCenter, 2)
                .with_assignee(AssigneeRule::Pinned),
        )?
        .with_stage(
            StageDefinition::new("paralegal", Scope::BidParalegal, 3)
                .with_assignee(AssigneeRule::Pinned)
                .with_skip(SkipRule::UnlessCardPayment),
        )?
        .with_stage(
            StageDefinition::new("edm", Scope::BidEdm, 4).with_skip(SkipRule::UnlessEdmRequired),
        )?
        .with_stage(StageDefinition::new("kru", Scope::BidKru, 5))?
        .with_stage(
            StageDefinition::new("owner", Scope::BidOwner, 6)
                .with_skip(SkipRule::AmountAtMost(30_000)),
        )?
        .with_stage(
            StageDefinition::new("accountant_card", Scope::BidAccountantCard, 7)
                .with_skip(SkipRule::UnlessCardPayment),
        )?
        .with_stage(
            StageDefinition::new("accountant_cash", Scope::BidAccountantCash, 8)
                .with_skip(SkipRule::UnlessCashPayment),
        )?
        .with_stage(StageDefinition::new("teller", Scope::BidTeller, 9))
}

/// Hiring request: manager sign-off, then security and accounting in
/// parallel, onboarding, and a financial-director gate that only
/// applies to officially employed hires.
fn worker_bid_graph() -> ApprovalResult<StageGraph> {
    StageGraph::new(RequestType::WorkerBid)
        .with_stage(
            StageDefinition::new("manager_review", Scope::HiringManager, 1)
                .with_assignee(AssigneeRule::DepartmentChief),
        )?
        .with_stage(StageDefinition::new("security_check", Scope::HiringSecurity, 2))?
        .with_stage(StageDefinition::new(
            "accounting_check",
            Scope::HiringAccounting,
            2,
        ))?
        .with_stage(StageDefinition::new("onboarding", Scope::HiringOnboarding, 3))?
        .with_stage(
            StageDefinition::new("financial_director", Scope::HiringFinancialDirector, 4)
                .with_skip(SkipRule::UnlessOfficialEmployment),
        )
}

/// Technical incident: the assigned repairman fixes, the chief
/// technician verifies, and the territorial manager appraises. The
/// appraisal is informational, so its denial does not close the request.
fn technical_request_graph() -> ApprovalResult<StageGraph> {
    StageGraph::new(RequestType::TechnicalRequest)
        .with_stage(
            StageDefinition::new("repairman", Scope::TechRepairman, 1)
                .with_assignee(AssigneeRule::Pinned),
        )?
        .with_stage(
            StageDefinition::new("chief_technician", Scope::TechChiefTechnician, 2)
                .with_assignee(AssigneeRule::DepartmentChief),
        )?
        .with_stage(
            StageDefinition::new("appraiser", Scope::TechAppraiser, 3)
                .with_assignee(AssigneeRule::TerritorialManager)
                .non_terminal_deny(),
        )
}

/// Cleaning incident: executor then territorial appraisal
fn cleaning_request_graph() -> ApprovalResult<StageGraph> {
    StageGraph::new(RequestType::CleaningRequest)
        .with_stage(
            StageDefinition::new("cleaner", Scope::CleaningExecutor, 1)
                .with_assignee(AssigneeRule::Pinned),
        )?
        .with_stage(
            StageDefinition::new("appraiser", Scope::CleaningAppraiser, 2)
                .with_assignee(AssigneeRule::TerritorialManager)
                .non_terminal_deny(),
        )
}

/// IT incident: pinned repairman then territorial manager sign-off
fn it_bid_graph() -> ApprovalResult<StageGraph> {
    StageGraph::new(RequestType::ItBid)
        .with_stage(
            StageDefinition::new("it_repairman", Scope::ItRepairman, 1)
                .with_assignee(AssigneeRule::Pinned),
        )?
        .with_stage(
            StageDefinition::new("territorial_manager", Scope::ItTerritorialManager, 2)
                .with_assignee(AssigneeRule::TerritorialManager),
        )
}
