//! Chronological train/test partitioning

use crate::data::ObservationTable;
use crate::error::{AnalysisError, Result};
use chrono::NaiveDate;
use std::fmt;
use tracing::debug;

/// Which side of the cutoff a table belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subset {
    Training,
    Test,
}

impl Subset {
    pub const ALL: [Subset; 2] = [Subset::Training, Subset::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            Subset::Training => "training",
            Subset::Test => "test",
        }
    }
}

impl fmt::Display for Subset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Two disjoint tables separated at a cutoff date
#[derive(Debug, Clone, PartialEq)]
pub struct ChronologicalSplit {
    pub training: ObservationTable,
    pub test: ObservationTable,
    pub training_end: NaiveDate,
}

impl ChronologicalSplit {
    pub fn get(&self, subset: Subset) -> &ObservationTable {
        match subset {
            Subset::Training => &self.training,
            Subset::Test => &self.test,
        }
    }

    /// Fail if either side of the split is empty
    pub fn require_non_empty(&self) -> Result<()> {
        for subset in Subset::ALL {
            if self.get(subset).is_empty() {
                return Err(AnalysisError::EmptyResult(format!(
                    "{} subset is empty for cutoff {}",
                    subset, self.training_end
                )));
            }
        }
        Ok(())
    }
}

/// Split a table so that training holds `date <= training_end` and test
/// holds every later date. A row dated exactly on the cutoff is training only.
pub fn split_at(table: &ObservationTable, training_end: NaiveDate) -> Result<ChronologicalSplit> {
    if table.is_empty() {
        return Err(AnalysisError::EmptyResult(
            "cannot split an empty table".to_string(),
        ));
    }

    let training = table.filter(|o| o.date <= training_end);
    let test = table.filter(|o| o.date > training_end);

    debug!(
        %training_end,
        training_rows = training.len(),
        test_rows = test.len(),
        "split observations"
    );

    Ok(ChronologicalSplit {
        training,
        test,
        training_end,
    })
}
