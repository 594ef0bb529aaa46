use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Locally generated record identifier. Random, not collision-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoanId(Uuid);

impl LoanId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Option<Self> {
        Uuid::try_parse(s).ok().map(Self)
    }
}

impl fmt::Display for LoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    Active,
    Pending,
    Review,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentStep {
    pub date: String,
    pub amount: f64,
    pub principal: f64,
    pub interest: f64,
}

/// A normalized extraction result. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRecord {
    pub id: LoanId,
    pub lender_name: String,
    pub loan_type: String,
    pub principal_amount: f64,
    /// Annual rate in percent (5.25 means 5.25%).
    pub interest_rate: f64,
    pub tenure_months: u32,
    pub start_date: String,
    pub next_payment_date: Option<String>,
    pub monthly_payment: f64,
    pub total_payable: Option<f64>,
    pub total_interest: Option<f64>,
    pub risk_score: u8,
    pub risk_analysis: String,
    pub key_clauses: Vec<String>,
    pub repayment_schedule: Vec<RepaymentStep>,
    pub status: LoanStatus,
}

impl LoanRecord {
    pub fn risk_band(&self) -> RiskBand {
        RiskBand::from_score(self.risk_score)
    }
}

/// Display grouping of the model-assigned risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=29 => Self::Low,
            30..=69 => Self::Medium,
            _ => Self::High,
        }
    }
}
