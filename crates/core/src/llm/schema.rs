use serde_json::{json, Value};

/// Keys every extraction must carry. Everything else is best-effort.
pub const REQUIRED_FIELDS: [&str; 8] = [
    "lenderName",
    "loanType",
    "principalAmount",
    "interestRate",
    "tenureMonths",
    "startDate",
    "monthlyPayment",
    "riskScore",
];

/// Structured-output schema sent with every request, in the provider's
/// OpenAPI-subset dialect. `id` and `status` are assigned locally and never asked for.
pub fn loan_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "lenderName": {"type": "STRING", "description": "Name of the financial institution"},
            "loanType": {"type": "STRING", "description": "Type of loan (Mortgage, Personal, Auto, etc.)"},
            "principalAmount": {"type": "NUMBER", "description": "Total loan amount"},
            "interestRate": {"type": "NUMBER", "description": "Annual interest rate percentage"},
            "tenureMonths": {"type": "NUMBER", "description": "Loan duration in months"},
            "startDate": {"type": "STRING", "description": "Loan start date (YYYY-MM-DD)"},
            "nextPaymentDate": {"type": "STRING", "description": "Next upcoming payment date (YYYY-MM-DD)"},
            "monthlyPayment": {"type": "NUMBER", "description": "Monthly repayment amount"},
            "totalPayable": {"type": "NUMBER", "description": "Total amount paid back over the life of the loan"},
            "totalInterest": {"type": "NUMBER", "description": "Total interest cost"},
            "riskScore": {"type": "NUMBER", "description": "Risk score from 1-100 based on the terms; higher is riskier"},
            "riskAnalysis": {"type": "STRING", "description": "Brief analysis of the loan risks or predatory terms"},
            "keyClauses": {
                "type": "ARRAY",
                "items": {"type": "STRING"},
                "description": "Critical legal clauses (e.g. prepayment penalties), most significant first"
            },
            "repaymentSchedule": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "date": {"type": "STRING"},
                        "amount": {"type": "NUMBER"},
                        "principal": {"type": "NUMBER"},
                        "interest": {"type": "NUMBER"}
                    }
                },
                "description": "Estimated first 6 months of the repayment schedule, in date order"
            }
        },
        "required": REQUIRED_FIELDS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_never_asks_for_local_fields() {
        let schema = loan_response_schema();
        let props = schema["properties"].as_object().unwrap();
        assert!(!props.contains_key("id"));
        assert!(!props.contains_key("status"));
        assert_eq!(props.len(), 14);
    }

    #[test]
    fn required_fields_are_declared_properties() {
        let schema = loan_response_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(required, REQUIRED_FIELDS);
        for field in REQUIRED_FIELDS {
            assert!(schema["properties"].get(field).is_some(), "{field}");
        }
    }
}
