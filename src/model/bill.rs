use crate::model::Figure;
use serde::{Deserialize, Serialize};

/// Identifies one of the two people sharing the bill.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    First,
    Second,
}

serde_plain::derive_display_from_serialize!(Side);
serde_plain::derive_fromstr_from_deserialize!(Side);

/// One person's name and their two meter readings.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Person {
    name: String,
    previous_unit: Figure,
    current_unit: Figure,
}

impl Person {
    pub fn new(name: impl Into<String>, previous_unit: Figure, current_unit: Figure) -> Self {
        Self {
            name: name.into(),
            previous_unit,
            current_unit,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn previous_unit(&self) -> Figure {
        self.previous_unit
    }

    pub fn current_unit(&self) -> Figure {
        self.current_unit
    }
}

/// Everything needed to split one bill. Built once per run from the collected input.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct BillRecord {
    first_person: Person,
    second_person: Person,
    total_money: Figure,
}

impl BillRecord {
    pub fn new(first_person: Person, second_person: Person, total_money: Figure) -> Self {
        Self {
            first_person,
            second_person,
            total_money,
        }
    }

    pub fn first_person(&self) -> &Person {
        &self.first_person
    }

    pub fn second_person(&self) -> &Person {
        &self.second_person
    }

    pub fn person(&self, side: Side) -> &Person {
        match side {
            Side::First => &self.first_person,
            Side::Second => &self.second_person,
        }
    }

    pub fn total_money(&self) -> Figure {
        self.total_money
    }

    /// The base of the output file name: `<first name>_<second name>`.
    pub fn file_stem(&self) -> String {
        format!("{}_{}", self.first_person.name, self.second_person.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_side_display() {
        assert_eq!(Side::First.to_string(), "first");
        assert_eq!(Side::from_str("second").unwrap(), Side::Second);
    }

    #[test]
    fn test_person_lookup_and_stem() {
        let bill = BillRecord::new(
            Person::new("Rahim", Figure::ZERO, Figure::ZERO),
            Person::new("Karim Uddin", Figure::ZERO, Figure::ZERO),
            Figure::ZERO,
        );
        assert_eq!(bill.person(Side::First).name(), "Rahim");
        assert_eq!(bill.person(Side::Second).name(), "Karim Uddin");
        assert_eq!(bill.file_stem(), "Rahim_Karim Uddin");
    }
}
