//! Pipeline record model shared by every aggregator.
//!
//! A `Record` is one intro/deal row owned by exactly one view. Optional
//! columns are explicit `Option`s so each aggregator states which of them it
//! reads; nothing is looked up dynamically.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier of a view (an isolated record set, or the synthetic Master).
pub type ViewId = String;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Pipeline stage. Open stages are ordered by progress toward close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    Inbox,
    #[serde(rename = "POA Booked")]
    PoaBooked,
    #[serde(rename = "Proposal Sent")]
    ProposalSent,
    Legals,
    Closed,
    Lost,
    #[serde(rename = "Not Relevant")]
    NotRelevant,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Inbox,
        Stage::PoaBooked,
        Stage::ProposalSent,
        Stage::Legals,
        Stage::Closed,
        Stage::Lost,
        Stage::NotRelevant,
    ];

    /// Stages still being worked. Closed/Lost/NotRelevant are terminal.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            Stage::Inbox | Stage::PoaBooked | Stage::ProposalSent | Stage::Legals
        )
    }

    /// Lost and NotRelevant: dead volume that never counts as active pipe.
    pub fn is_dead(&self) -> bool {
        matches!(self, Stage::Lost | Stage::NotRelevant)
    }

    /// String label for SQL storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Inbox => "Inbox",
            Stage::PoaBooked => "POA Booked",
            Stage::ProposalSent => "Proposal Sent",
            Stage::Legals => "Legals",
            Stage::Closed => "Closed",
            Stage::Lost => "Lost",
            Stage::NotRelevant => "Not Relevant",
        }
    }

    /// Parse from SQL string.
    pub fn parse(s: &str) -> Option<Self> {
        Stage::ALL.iter().copied().find(|stage| stage.as_str() == s)
    }
}

/// Where an intro came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceType {
    Outbound,
    Inbound,
    #[serde(rename = "Client Referral")]
    ClientReferral,
    #[serde(rename = "Internal Referral")]
    InternalReferral,
    #[serde(rename = "Partnership/Event")]
    PartnershipEvent,
    Unassigned,
    #[serde(rename = "Upsell/Cross-sell")]
    UpsellCrossSell,
}

impl SourceType {
    pub const ALL: [SourceType; 7] = [
        SourceType::Outbound,
        SourceType::Inbound,
        SourceType::ClientReferral,
        SourceType::InternalReferral,
        SourceType::PartnershipEvent,
        SourceType::Unassigned,
        SourceType::UpsellCrossSell,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Outbound => "Outbound",
            SourceType::Inbound => "Inbound",
            SourceType::ClientReferral => "Client Referral",
            SourceType::InternalReferral => "Internal Referral",
            SourceType::PartnershipEvent => "Partnership/Event",
            SourceType::Unassigned => "Unassigned",
            SourceType::UpsellCrossSell => "Upsell/Cross-sell",
        }
    }

    /// Unknown labels land in `Unassigned`, the same bucket ingestion uses
    /// for blank source cells.
    pub fn from_str_lossy(s: &str) -> Self {
        SourceType::ALL
            .iter()
            .copied()
            .find(|source| source.as_str() == s)
            .unwrap_or(SourceType::Unassigned)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attendance {
    Show,
    #[serde(rename = "No Show")]
    NoShow,
    Scheduled,
}

impl Attendance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Attendance::Show => "Show",
            Attendance::NoShow => "No Show",
            Attendance::Scheduled => "Scheduled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Show" => Some(Attendance::Show),
            "No Show" => Some(Attendance::NoShow),
            "Scheduled" => Some(Attendance::Scheduled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DealType {
    Upsell,
    #[serde(rename = "Cross-sell")]
    CrossSell,
    Renewal,
    #[serde(rename = "New Business")]
    NewBusiness,
}

impl DealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DealType::Upsell => "Upsell",
            DealType::CrossSell => "Cross-sell",
            DealType::Renewal => "Renewal",
            DealType::NewBusiness => "New Business",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Upsell" => Some(DealType::Upsell),
            "Cross-sell" => Some(DealType::CrossSell),
            "Renewal" => Some(DealType::Renewal),
            "New Business" => Some(DealType::NewBusiness),
            _ => None,
        }
    }

    pub fn is_expansion(&self) -> bool {
        matches!(self, DealType::Upsell | DealType::CrossSell)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relevance {
    Relevant,
    Questionable,
    #[serde(rename = "Not Relevant")]
    NotRelevant,
}

impl Relevance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relevance::Relevant => "Relevant",
            Relevance::Questionable => "Questionable",
            Relevance::NotRelevant => "Not Relevant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Relevant" => Some(Relevance::Relevant),
            "Questionable" => Some(Relevance::Questionable),
            "Not Relevant" => Some(Relevance::NotRelevant),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One intro/deal row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub client: String,
    pub stage: Stage,
    pub source_type: SourceType,
    /// Missing only on malformed imports; such rows are excluded from
    /// period- and age-dependent metrics and counted in `DataQuality`.
    pub discovery_date: Option<NaiveDate>,
    pub poa_date: Option<NaiveDate>,
    pub billing_start: Option<NaiveDate>,
    /// Date the deal moved to Closed. Deals Closed falls back to
    /// `billing_start` when this is empty.
    #[serde(default)]
    pub closed_date: Option<NaiveDate>,
    #[serde(default)]
    pub expected_mrr: f64,
    #[serde(default)]
    pub expected_arr: f64,
    #[serde(default)]
    pub pipeline_value: f64,
    pub owner: String,
    pub bdr: String,
    pub attendance: Option<Attendance>,
    pub type_of_deal: Option<DealType>,
    pub relevance: Option<Relevance>,
    #[serde(default)]
    pub partner: Option<String>,
    /// Columns whose stored value could not be read. Such a record is kept
    /// for `DataQuality` but excluded from every metric.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unreadable_columns: Vec<String>,
}

impl Record {
    /// Has a discovery date and every stored value was readable.
    pub fn is_well_formed(&self) -> bool {
        self.discovery_date.is_some() && self.unreadable_columns.is_empty()
    }

    /// Monetary value used for pipeline sums and weighting:
    /// pipeline value, else ARR, else 12 × MRR.
    pub fn pipeline_or_arr_value(&self) -> f64 {
        if self.pipeline_value > 0.0 {
            self.pipeline_value
        } else if self.expected_arr > 0.0 {
            self.expected_arr
        } else {
            (self.expected_mrr * 12.0).max(0.0)
        }
    }

    /// Annual value of a closed deal: ARR, else 12 × MRR.
    pub fn annual_value(&self) -> f64 {
        if self.expected_arr > 0.0 {
            self.expected_arr
        } else {
            (self.expected_mrr * 12.0).max(0.0)
        }
    }

    /// Monthly value of a closed deal: MRR, else ARR / 12.
    pub fn monthly_value(&self) -> f64 {
        if self.expected_mrr > 0.0 {
            self.expected_mrr
        } else {
            (self.expected_arr / 12.0).max(0.0)
        }
    }

    /// Effective close date for a Closed record.
    pub fn close_date(&self) -> Option<NaiveDate> {
        self.closed_date.or(self.billing_start)
    }
}

/// Half-open date range `[start, end)` used for store-side filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }
}
