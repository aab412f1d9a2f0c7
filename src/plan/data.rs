//! Household plan records: scenarios and out-of-band contributions

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PlannerError, PlannerResult};
use crate::money::{is_compoundable, Money, Rate};

/// One household's retirement plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetirementScenario {
    /// Opaque scenario identifier
    pub scenario_id: Uuid,

    pub name: String,

    /// Ages in whole years
    pub current_age: u32,
    pub retirement_age: u32,
    pub life_expectancy_age: u32,

    pub current_savings: Money,

    /// Recurring contribution, deposited at each year end before retirement
    pub annual_contribution: Money,

    /// Blended nominal return, percent
    pub expected_return_rate: Rate,

    /// Blended inflation, percent
    pub inflation_rate: Rate,

    /// Post-retirement income (pensions, annuities, part-time work)
    pub projected_annual_income: Money,

    /// Post-retirement spending
    pub projected_annual_expenses: Money,

    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Default for RetirementScenario {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            scenario_id: Uuid::new_v4(),
            name: String::new(),
            current_age: 0,
            retirement_age: 0,
            life_expectancy_age: 0,
            current_savings: Decimal::ZERO,
            annual_contribution: Decimal::ZERO,
            expected_return_rate: Decimal::ZERO,
            inflation_rate: Decimal::ZERO,
            projected_annual_income: Decimal::ZERO,
            projected_annual_expenses: Decimal::ZERO,
            notes: None,
            created_at: now,
            last_updated: now,
        }
    }
}

impl RetirementScenario {
    /// Create a named scenario with the core ages and savings inputs
    pub fn new(
        name: impl Into<String>,
        current_age: u32,
        retirement_age: u32,
        life_expectancy_age: u32,
        current_savings: Money,
        annual_contribution: Money,
    ) -> Self {
        Self {
            name: name.into(),
            current_age,
            retirement_age,
            life_expectancy_age,
            current_savings,
            annual_contribution,
            ..Self::default()
        }
    }

    /// The only sanctioned mutation; stamps `last_updated`
    pub fn update_parameters(
        &mut self,
        retirement_age: u32,
        annual_contribution: Money,
        expected_return_rate: Rate,
    ) {
        self.retirement_age = retirement_age;
        self.annual_contribution = annual_contribution;
        self.expected_return_rate = expected_return_rate;
        self.last_updated = Utc::now().max(self.last_updated);
    }

    /// Check the scenario invariants
    pub fn validate(&self) -> PlannerResult<()> {
        if self.retirement_age < self.current_age {
            return Err(PlannerError::invalid(
                "retirement_age",
                format!(
                    "Retirement age {} is before current age {}",
                    self.retirement_age, self.current_age
                ),
            ));
        }
        if self.life_expectancy_age < self.retirement_age {
            return Err(PlannerError::invalid(
                "life_expectancy_age",
                format!(
                    "Life expectancy age {} is before retirement age {}",
                    self.life_expectancy_age, self.retirement_age
                ),
            ));
        }

        let monetary = [
            ("current_savings", self.current_savings),
            ("annual_contribution", self.annual_contribution),
            ("projected_annual_income", self.projected_annual_income),
            ("projected_annual_expenses", self.projected_annual_expenses),
        ];
        for (field, value) in monetary {
            if value < Decimal::ZERO {
                return Err(PlannerError::invalid(field, "Amount cannot be negative"));
            }
        }

        for (field, rate) in [
            ("expected_return_rate", self.expected_return_rate),
            ("inflation_rate", self.inflation_rate),
        ] {
            if !is_compoundable(rate) {
                return Err(PlannerError::invalid(
                    field,
                    "Rate must be greater than -100%",
                ));
            }
        }

        Ok(())
    }

    pub fn years_to_retirement(&self) -> u32 {
        self.retirement_age.saturating_sub(self.current_age)
    }

    pub fn years_in_retirement(&self) -> u32 {
        self.life_expectancy_age.saturating_sub(self.retirement_age)
    }

    /// Expenses minus income
    ///
    /// Positive: savings must cover the shortfall. Negative: income alone
    /// covers expenses. Reported as-is so callers can tell the two apart.
    pub fn annual_withdrawal_gap(&self) -> Money {
        self.projected_annual_expenses - self.projected_annual_income
    }
}

/// An out-of-band deposit recorded against a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub contribution_id: Uuid,

    /// Back-reference to the owning scenario
    pub scenario_id: Uuid,

    /// Must be strictly positive; checked by `validate_amount`, not on construction
    pub amount: Money,

    pub contribution_date: NaiveDate,

    /// e.g. "401(k)", "IRA"
    pub account_name: String,

    pub is_employer_match: bool,

    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Contribution {
    pub fn new(
        scenario_id: Uuid,
        amount: Money,
        contribution_date: NaiveDate,
        account_name: impl Into<String>,
    ) -> Self {
        Self {
            contribution_id: Uuid::new_v4(),
            scenario_id,
            amount,
            contribution_date,
            account_name: account_name.into(),
            is_employer_match: false,
            notes: None,
            created_at: Utc::now(),
        }
    }

    pub fn validate_amount(&self) -> PlannerResult<()> {
        if self.amount <= Decimal::ZERO {
            return Err(PlannerError::invalid(
                "amount",
                "Amount must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Totals over a contribution history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContributionSummary {
    pub count: usize,
    pub personal_total: Money,
    pub employer_match_total: Money,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl ContributionSummary {
    /// Summarize contributions, skipping any that fail `validate_amount`
    pub fn from_contributions<'a, I>(contributions: I) -> Self
    where
        I: IntoIterator<Item = &'a Contribution>,
    {
        let mut summary = Self::default();
        for contribution in contributions {
            if let Err(e) = contribution.validate_amount() {
                log::warn!(
                    "Skipping contribution {}: {}",
                    contribution.contribution_id,
                    e
                );
                continue;
            }

            summary.count += 1;
            if contribution.is_employer_match {
                summary.employer_match_total += contribution.amount;
            } else {
                summary.personal_total += contribution.amount;
            }

            let date = contribution.contribution_date;
            summary.first_date = Some(summary.first_date.map_or(date, |d| d.min(date)));
            summary.last_date = Some(summary.last_date.map_or(date, |d| d.max(date)));
        }
        summary
    }

    pub fn total(&self) -> Money {
        self.personal_total + self.employer_match_total
    }
}
