//! The closed set of update operators.

use std::fmt;
use std::str::FromStr;

use crate::schema::ValidationError;

/// Update operators accepted by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateOperator {
    Set,
    SetOnInsert,
    Unset,
    Inc,
    Min,
    Max,
    Mul,
    Rename,
    CurrentDate,
    AddToSet,
    Pop,
    Pull,
    Push,
    PullAll,
    Bit,
}

impl UpdateOperator {
    pub const ALL: [UpdateOperator; 15] = [
        UpdateOperator::Set,
        UpdateOperator::SetOnInsert,
        UpdateOperator::Unset,
        UpdateOperator::Inc,
        UpdateOperator::Min,
        UpdateOperator::Max,
        UpdateOperator::Mul,
        UpdateOperator::Rename,
        UpdateOperator::CurrentDate,
        UpdateOperator::AddToSet,
        UpdateOperator::Pop,
        UpdateOperator::Pull,
        UpdateOperator::Push,
        UpdateOperator::PullAll,
        UpdateOperator::Bit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateOperator::Set => "$set",
            UpdateOperator::SetOnInsert => "$setOnInsert",
            UpdateOperator::Unset => "$unset",
            UpdateOperator::Inc => "$inc",
            UpdateOperator::Min => "$min",
            UpdateOperator::Max => "$max",
            UpdateOperator::Mul => "$mul",
            UpdateOperator::Rename => "$rename",
            UpdateOperator::CurrentDate => "$currentDate",
            UpdateOperator::AddToSet => "$addToSet",
            UpdateOperator::Pop => "$pop",
            UpdateOperator::Pull => "$pull",
            UpdateOperator::Push => "$push",
            UpdateOperator::PullAll => "$pullAll",
            UpdateOperator::Bit => "$bit",
        }
    }
}

impl fmt::Display for UpdateOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateOperator {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UpdateOperator::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| ValidationError::unknown_operator(s))
    }
}
