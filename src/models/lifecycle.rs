use chrono::NaiveDate;
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Calendar age of a pet. Always derived from `(birth_date, today)`, never stored.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct Age {
    pub years: i64,
    pub months: i64,
    pub days: i64,
    pub total_days: i64,
    pub total_months: i64,
}

impl Age {
    pub fn is_before_birth(&self) -> bool {
        self.total_days < 0
    }
}

#[derive(Debug, Display, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum LifecycleStage {
    #[display("puppy")]
    #[serde(rename = "puppy")]
    Puppy,
    #[display("kitten")]
    #[serde(rename = "kitten")]
    Kitten,
    #[display("juvenile")]
    #[serde(rename = "juvenile")]
    Juvenile,
    #[display("junior")]
    #[serde(rename = "junior")]
    Junior,
    #[display("adult")]
    #[serde(rename = "adult")]
    Adult,
    #[display("mature_adult")]
    #[serde(rename = "mature_adult")]
    MatureAdult,
    #[display("senior")]
    #[serde(rename = "senior")]
    Senior,
    #[display("geriatric")]
    #[serde(rename = "geriatric")]
    Geriatric,
}

impl LifecycleStage {
    /// Position in the life cycle, shared by every species.
    pub fn ordinal(&self) -> u8 {
        match self {
            LifecycleStage::Puppy | LifecycleStage::Kitten | LifecycleStage::Juvenile => 0,
            LifecycleStage::Junior => 1,
            LifecycleStage::Adult => 2,
            LifecycleStage::MatureAdult => 3,
            LifecycleStage::Senior => 4,
            LifecycleStage::Geriatric => 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LifecycleInfo {
    pub stage: LifecycleStage,
    pub age: Age,
    /// Estimated date of the next stage, `None` at the last stage.
    pub next_stage_transition: Option<NaiveDate>,
}
