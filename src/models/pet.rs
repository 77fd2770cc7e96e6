use chrono::NaiveDate;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Display, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum Species {
    #[display("dog")]
    #[serde(rename = "dog")]
    Dog,
    #[display("cat")]
    #[serde(rename = "cat")]
    Cat,
    #[default]
    #[display("other")]
    #[serde(rename = "other")]
    Other,
}

impl FromStr for Species {
    type Err = std::convert::Infallible;

    /// Anything that is not a dog or a cat falls back to [`Species::Other`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "dog" | "canine" => Species::Dog,
            "cat" | "feline" => Species::Cat,
            _ => Species::Other,
        })
    }
}

/// Pet data read from the surrounding application. Never mutated here.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct PetProfile {
    pub id: i64,
    pub user_app_id: i64,
    pub pet_name: String,
    pub species: Option<Species>,
    pub birthday: Option<NaiveDate>,
}

impl PetProfile {
    /// Species and birthday, only when both are known.
    pub fn lifecycle_inputs(&self) -> Option<(Species, NaiveDate)> {
        Some((self.species?, self.birthday?))
    }
}
