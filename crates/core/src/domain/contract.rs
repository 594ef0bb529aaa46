use crate::domain::loan::{LoanId, LoanRecord, LoanStatus, RepaymentStep};
use anyhow::ensure;
use serde::{Deserialize, Serialize};

/// Loan terms as emitted by the model, before validation.
///
/// Required keys are plain fields, so a missing one fails deserialization.
/// Unknown keys (including any `id` or `status` the model invents) are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmLoanExtraction {
    pub lender_name: String,
    pub loan_type: String,
    pub principal_amount: f64,
    pub interest_rate: f64,
    pub tenure_months: f64,
    pub start_date: String,
    pub monthly_payment: f64,
    pub risk_score: f64,

    #[serde(default)]
    pub next_payment_date: Option<String>,
    #[serde(default)]
    pub total_payable: Option<f64>,
    #[serde(default)]
    pub total_interest: Option<f64>,
    #[serde(default)]
    pub risk_analysis: Option<String>,
    #[serde(default)]
    pub key_clauses: Option<Vec<String>>,
    #[serde(default)]
    pub repayment_schedule: Option<Vec<LlmRepaymentStep>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmRepaymentStep {
    pub date: Option<String>,
    pub amount: Option<f64>,
    pub principal: Option<f64>,
    pub interest: Option<f64>,
}

impl LlmLoanExtraction {
    pub fn validate_and_into_record(self, id: LoanId) -> anyhow::Result<LoanRecord> {
        let lender_name = self.lender_name.trim().to_string();
        let loan_type = self.loan_type.trim().to_string();
        let start_date = self.start_date.trim().to_string();

        let principal_amount = non_negative("principalAmount", self.principal_amount)?;
        let monthly_payment = non_negative("monthlyPayment", self.monthly_payment)?;
        ensure!(
            self.interest_rate.is_finite(),
            "interestRate must be finite (got {})",
            self.interest_rate
        );

        ensure!(
            self.tenure_months.is_finite()
                && self.tenure_months.fract() == 0.0
                && self.tenure_months >= 1.0
                && self.tenure_months <= u32::MAX as f64,
            "tenureMonths must be a positive whole number (got {})",
            self.tenure_months
        );
        let tenure_months = self.tenure_months as u32;

        ensure!(
            self.risk_score.is_finite(),
            "riskScore must be finite (got {})",
            self.risk_score
        );
        let rounded = self.risk_score.round();
        ensure!(
            (1.0..=100.0).contains(&rounded),
            "riskScore must be between 1 and 100 (got {})",
            self.risk_score
        );
        let risk_score = rounded as u8;

        let total_payable = self
            .total_payable
            .map(|v| non_negative("totalPayable", v))
            .transpose()?;
        let total_interest = self
            .total_interest
            .map(|v| non_negative("totalInterest", v))
            .transpose()?;

        let next_payment_date = self
            .next_payment_date
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let risk_analysis = self
            .risk_analysis
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        let key_clauses = self
            .key_clauses
            .unwrap_or_default()
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let mut repayment_schedule = Vec::new();
        for step in self.repayment_schedule.unwrap_or_default() {
            repayment_schedule.push(step.validate_and_into_step()?);
        }

        Ok(LoanRecord {
            id,
            lender_name,
            loan_type,
            principal_amount,
            interest_rate: self.interest_rate,
            tenure_months,
            start_date,
            next_payment_date,
            monthly_payment,
            total_payable,
            total_interest,
            risk_score,
            risk_analysis,
            key_clauses,
            repayment_schedule,
            status: LoanStatus::Active,
        })
    }
}

impl LlmRepaymentStep {
    fn validate_and_into_step(self) -> anyhow::Result<RepaymentStep> {
        Ok(RepaymentStep {
            date: self.date.map(|s| s.trim().to_string()).unwrap_or_default(),
            amount: non_negative("repaymentSchedule.amount", self.amount.unwrap_or(0.0))?,
            principal: non_negative(
                "repaymentSchedule.principal",
                self.principal.unwrap_or(0.0),
            )?,
            interest: non_negative("repaymentSchedule.interest", self.interest.unwrap_or(0.0))?,
        })
    }
}

fn non_negative(field: &str, value: f64) -> anyhow::Result<f64> {
    ensure!(
        value.is_finite() && value >= 0.0,
        "{field} must be a non-negative amount (got {value})"
    );
    Ok(value)
}
