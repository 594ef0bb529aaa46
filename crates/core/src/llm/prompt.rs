use chrono::NaiveDate;

pub fn instruction(today: NaiveDate) -> String {
    [
        "Analyze this loan document carefully. Extract all critical financial terms.".to_string(),
        "Look for interest rates, hidden fees, penalties, repayment schedules, and risk factors."
            .to_string(),
        format!(
            "If specific dates are not found, estimate them based on today's date ({}).",
            today.format("%Y-%m-%d")
        ),
        "Calculate the total payable and total interest if they are not explicitly stated."
            .to_string(),
        "Identify any risky or predatory clauses such as high late fees or prepayment penalties."
            .to_string(),
        "Respond with JSON only, matching the provided schema.".to_string(),
    ]
    .join("\n")
}
