//! In-memory session: the signed-in user, the loans analyzed so far, and the
//! loan currently open in the detail view.
//!
//! State only changes through [`SessionState::apply`]. Records are shared as
//! `Arc`s and are never modified once added.

pub mod store;
pub mod user;

use crate::domain::loan::{LoanId, LoanRecord};
use serde::Serialize;
use std::sync::Arc;
use user::UserProfile;

pub use store::{upload, SessionStore};

#[derive(Debug, Clone)]
pub enum SessionAction {
    LoggedIn(UserProfile),
    LoggedOut,
    /// Prepends the record and opens it in the detail view.
    RecordAdded(LoanRecord),
    /// Ignored when the id is unknown.
    RecordSelected(LoanId),
    SelectionCleared,
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    user: Option<UserProfile>,
    // Most recent first.
    loans: Vec<Arc<LoanRecord>>,
    selected: Option<LoanId>,
    // Bumped on logout so in-flight uploads can tell their session has ended.
    generation: u64,
}

impl SessionState {
    pub fn apply(mut self, action: SessionAction) -> Self {
        match action {
            SessionAction::LoggedIn(user) => {
                self.user = Some(user);
            }
            SessionAction::LoggedOut => {
                self = Self {
                    generation: self.generation + 1,
                    ..Self::default()
                };
            }
            SessionAction::RecordAdded(record) => {
                self.selected = Some(record.id);
                self.loans.insert(0, Arc::new(record));
            }
            SessionAction::RecordSelected(id) => {
                if self.find(id).is_some() {
                    self.selected = Some(id);
                }
            }
            SessionAction::SelectionCleared => {
                self.selected = None;
            }
        }
        self
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn loans(&self) -> &[Arc<LoanRecord>] {
        &self.loans
    }

    pub fn find(&self, id: LoanId) -> Option<&Arc<LoanRecord>> {
        self.loans.iter().find(|l| l.id == id)
    }

    pub fn selected(&self) -> Option<&Arc<LoanRecord>> {
        self.selected.and_then(|id| self.find(id))
    }

    pub fn total_principal(&self) -> f64 {
        self.loans.iter().map(|l| l.principal_amount).sum()
    }

    pub fn average_interest_rate(&self) -> f64 {
        if self.loans.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.loans.iter().map(|l| l.interest_rate).sum();
        sum / self.loans.len() as f64
    }

    pub fn summary(&self) -> PortfolioSummary {
        PortfolioSummary {
            loan_count: self.loans.len(),
            total_principal: self.total_principal(),
            average_interest_rate: self.average_interest_rate(),
            latest: self.loans.first().cloned(),
        }
    }
}

/// Profile-page aggregates. Derived on demand, never stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub loan_count: usize,
    pub total_principal: f64,
    pub average_interest_rate: f64,
    pub latest: Option<Arc<LoanRecord>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::LlmLoanExtraction;
    use serde_json::json;

    fn loan(principal: f64, rate: f64) -> LoanRecord {
        serde_json::from_value::<LlmLoanExtraction>(json!({
            "lenderName": "Lender",
            "loanType": "Personal",
            "principalAmount": principal,
            "interestRate": rate,
            "tenureMonths": 12,
            "startDate": "2025-01-01",
            "monthlyPayment": 100,
            "riskScore": 50,
        }))
        .unwrap()
        .validate_and_into_record(LoanId::generate())
        .unwrap()
    }

    #[test]
    fn empty_session_aggregates_to_zero() {
        let state = SessionState::default();
        assert_eq!(state.total_principal(), 0.0);
        assert_eq!(state.average_interest_rate(), 0.0);
        assert!(state.summary().latest.is_none());
    }

    #[test]
    fn aggregates_over_records() {
        let state = SessionState::default()
            .apply(SessionAction::RecordAdded(loan(10000.0, 5.0)))
            .apply(SessionAction::RecordAdded(loan(5000.0, 7.0)));
        assert_eq!(state.total_principal(), 15000.0);
        assert_eq!(state.average_interest_rate(), 6.0);

        let summary = state.summary();
        assert_eq!(summary.loan_count, 2);
        assert_eq!(summary.latest.unwrap().principal_amount, 5000.0);
    }

    #[test]
    fn records_are_most_recent_first_and_selected() {
        let created: Vec<LoanRecord> = (1..=5).map(|i| loan(i as f64 * 1000.0, 4.0)).collect();
        let mut state = SessionState::default();
        for record in &created {
            state = state.apply(SessionAction::RecordAdded(record.clone()));
            assert_eq!(state.selected().unwrap().id, record.id);
        }

        let n = created.len();
        assert_eq!(state.loans().len(), n);
        for (k, record) in state.loans().iter().enumerate() {
            // k-th most recent (0-indexed) was created (n - k)-th.
            assert_eq!(record.id, created[n - k - 1].id);
        }
    }

    #[test]
    fn selecting_unknown_id_keeps_selection() {
        let record = loan(1000.0, 3.0);
        let id = record.id;
        let state = SessionState::default()
            .apply(SessionAction::RecordAdded(record))
            .apply(SessionAction::RecordSelected(LoanId::generate()));
        assert_eq!(state.selected().unwrap().id, id);

        let state = state.apply(SessionAction::SelectionCleared);
        assert!(state.selected().is_none());

        let state = state.apply(SessionAction::RecordSelected(id));
        assert_eq!(state.selected().unwrap().id, id);
    }

    #[test]
    fn logout_clears_everything() {
        let user = UserProfile {
            email: "a@b.c".to_string(),
            display_name: "a".to_string(),
        };
        let state = SessionState::default()
            .apply(SessionAction::LoggedIn(user.clone()))
            .apply(SessionAction::RecordAdded(loan(1000.0, 3.0)));
        assert_eq!(state.user(), Some(&user));

        let state = state.apply(SessionAction::LoggedOut);
        assert!(state.user().is_none());
        assert!(state.loans().is_empty());
        assert!(state.selected().is_none());
        assert_eq!(state.generation(), 1);
    }
}
