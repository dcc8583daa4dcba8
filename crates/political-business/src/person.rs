//! Personal data of a candidate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use votebasis_core::{DomainError, DomainResult, Translations, ValueObject};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SexType {
    Female,
    Male,
    Undefined,
}

/// Who a candidate is, as printed on ballots and reports.
///
/// Every field may still change after the testing phase has ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidatePerson {
    pub first_name: String,
    pub last_name: String,
    pub political_first_name: String,
    pub political_last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub sex: SexType,
    pub occupation: Translations,
    pub title: String,
    pub incumbent: bool,
    pub zip_code: String,
    pub locality: String,
    pub origin: String,
}

impl ValueObject for CandidatePerson {}

impl CandidatePerson {
    pub fn validate(&self) -> DomainResult<()> {
        if self.political_first_name.trim().is_empty() || self.political_last_name.trim().is_empty()
        {
            return Err(DomainError::validation("candidate needs a political name"));
        }
        Ok(())
    }
}
