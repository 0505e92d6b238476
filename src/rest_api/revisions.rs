//! # Revision Resolution
//!
//! Turns the revision parameters of a request into the ordered list of
//! revision numbers to read. Precedence, highest first:
//!
//! 1. `start-revision` + `end-revision`
//! 2. `start-revision-timestamp` + `end-revision-timestamp`
//! 3. `revision`
//! 4. `revision-timestamp`
//! 5. the most recent revision
//!
//! Instants map to the revision nearest to them; an instant before the
//! first revision maps to revision 1.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::store::ResourceManager;

use super::errors::{RestError, RestResult};
use super::parser::{
    ReadParams, PARAM_END_REVISION, PARAM_END_REVISION_TIMESTAMP, PARAM_REVISION,
    PARAM_REVISION_TIMESTAMP, PARAM_START_REVISION, PARAM_START_REVISION_TIMESTAMP,
};

/// Which revisions a request reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionSelector {
    NumberRange { start: u32, end: u32 },
    TimestampRange { start: DateTime<Utc>, end: DateTime<Utc> },
    Number(u32),
    Timestamp(DateTime<Utc>),
    MostRecent,
}

impl RevisionSelector {
    /// Selector over every parameter form, ranges included
    pub fn from_params(params: &ReadParams) -> RestResult<Self> {
        match (&params.start_revision, &params.end_revision) {
            (Some(start), Some(end)) => {
                return Ok(RevisionSelector::NumberRange {
                    start: parse_number(PARAM_START_REVISION, start)?,
                    end: parse_number(PARAM_END_REVISION, end)?,
                })
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(RestError::InvalidRevisionSpec(format!(
                    "{} and {} must be given together",
                    PARAM_START_REVISION, PARAM_END_REVISION
                )))
            }
            (None, None) => {}
        }

        match (&params.start_revision_timestamp, &params.end_revision_timestamp) {
            (Some(start), Some(end)) => {
                return Ok(RevisionSelector::TimestampRange {
                    start: parse_timestamp(PARAM_START_REVISION_TIMESTAMP, start)?,
                    end: parse_timestamp(PARAM_END_REVISION_TIMESTAMP, end)?,
                })
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(RestError::InvalidRevisionSpec(format!(
                    "{} and {} must be given together",
                    PARAM_START_REVISION_TIMESTAMP, PARAM_END_REVISION_TIMESTAMP
                )))
            }
            (None, None) => {}
        }

        Self::single_from_params(params)
    }

    /// Selector naming exactly one revision; range parameters are ignored
    pub fn single_from_params(params: &ReadParams) -> RestResult<Self> {
        if let Some(revision) = &params.revision {
            return Ok(RevisionSelector::Number(parse_number(PARAM_REVISION, revision)?));
        }
        if let Some(timestamp) = &params.revision_timestamp {
            return Ok(RevisionSelector::Timestamp(parse_timestamp(
                PARAM_REVISION_TIMESTAMP,
                timestamp,
            )?));
        }
        Ok(RevisionSelector::MostRecent)
    }

    /// Revision numbers in ascending order
    pub fn resolve(&self, manager: &ResourceManager) -> RestResult<Vec<u32>> {
        match *self {
            RevisionSelector::NumberRange { start, end } => {
                if start > end {
                    return Err(RestError::InvalidRevisionSpec(format!(
                        "start revision {} is after end revision {}",
                        start, end
                    )));
                }
                manager.check_revision(start)?;
                manager.check_revision(end)?;
                Ok((start..=end).collect())
            }
            RevisionSelector::TimestampRange { start, end } => {
                if start > end {
                    return Err(RestError::InvalidRevisionSpec(format!(
                        "start timestamp {} is after end timestamp {}",
                        start.to_rfc3339(),
                        end.to_rfc3339()
                    )));
                }
                let first = revision_at(manager, start);
                let last = revision_at(manager, end);
                Ok((first..=last).collect())
            }
            RevisionSelector::Number(revision) => {
                manager.check_revision(revision)?;
                Ok(vec![revision])
            }
            RevisionSelector::Timestamp(instant) => Ok(vec![revision_at(manager, instant)]),
            RevisionSelector::MostRecent => Ok(vec![manager.most_recent_revision_number()]),
        }
    }

    /// Resolve to exactly one revision number
    pub fn resolve_single(&self, manager: &ResourceManager) -> RestResult<u32> {
        let revisions = self.resolve(manager)?;
        match revisions.as_slice() {
            [revision] => Ok(*revision),
            _ => Err(RestError::InvalidRevisionSpec(
                "a single revision is required".to_string(),
            )),
        }
    }
}

/// Revision as of `instant`; instants before the first revision map to 1
fn revision_at(manager: &ResourceManager, instant: DateTime<Utc>) -> u32 {
    manager.revision_number_at(instant).max(1)
}

fn parse_number(name: &str, value: &str) -> RestResult<u32> {
    value.trim().parse::<u32>().map_err(|_| {
        RestError::InvalidRevisionSpec(format!("{} must be a revision number, got '{}'", name, value))
    })
}

/// Parse an RFC 3339 instant, or a date-time without zone taken as UTC
pub fn parse_timestamp(name: &str, value: &str) -> RestResult<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|_| {
            RestError::InvalidRevisionSpec(format!("{} must be a timestamp, got '{}'", name, value))
        })
}
