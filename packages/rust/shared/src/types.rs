//! Core domain types for hot-dog jobs.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{HotdogError, Result};

/// Complements served with every Brazilian-style hot dog, in serving order.
pub const BRAZILIAN_COMPLEMENTS: [Complement; 6] = [
    Complement::Cheddar,
    Complement::Ketchup,
    Complement::Mustard,
    Complement::Corn,
    Complement::Onions,
    Complement::Tomatoes,
];

/// Generate a new time-sortable job identifier (UUID v7).
pub fn new_job_id() -> String {
    Uuid::now_v7().to_string()
}

// ---------------------------------------------------------------------------
// Enrichment enums
// ---------------------------------------------------------------------------

/// Bread chosen by the bread stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BreadType {
    Whole,
    Milk,
}

impl BreadType {
    /// Whole bread for healthy jobs, milk bread otherwise.
    pub fn for_health(health: bool) -> Self {
        if health { Self::Whole } else { Self::Milk }
    }
}

/// Sausage chosen by the sausage stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SausageType {
    Vegan,
    Pork,
}

impl SausageType {
    /// Vegan sausage for healthy jobs, pork otherwise.
    pub fn for_health(health: bool) -> Self {
        if health { Self::Vegan } else { Self::Pork }
    }
}

/// Serving style chosen by the style stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Style {
    American,
    Brazilian,
}

impl Style {
    /// American style for healthy jobs, Brazilian otherwise.
    pub fn for_health(health: bool) -> Self {
        if health { Self::American } else { Self::Brazilian }
    }

    /// Complements that come with this style. Empty for American.
    pub fn complements(self) -> &'static [Complement] {
        match self {
            Self::American => &[],
            Self::Brazilian => &BRAZILIAN_COMPLEMENTS,
        }
    }
}

/// A single topping on a Brazilian hot dog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Complement {
    Cheddar,
    Ketchup,
    Mustard,
    Corn,
    Onions,
    Tomatoes,
}

macro_rules! display_as_debug {
    ($($ty:ty),+) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Debug::fmt(self, f)
            }
        })+
    };
}

display_as_debug!(BreadType, SausageType, Style, Complement);

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// A hot-dog job flowing through the pipeline.
///
/// Only `health` is set at construction. Every other field is assigned exactly
/// once by the stage that owns it; the `assign_*` methods refuse to overwrite.
/// Unset fields serialize as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Drives every enrichment decision. Fixed at construction.
    health: bool,
    /// Store key, assigned by the ingestion stage.
    #[serde(default)]
    id: Option<String>,
    /// Assigned together with `id`.
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    bread_type: Option<BreadType>,
    #[serde(default)]
    sausage_type: Option<SausageType>,
    #[serde(default)]
    style: Option<Style>,
    /// Only present for Brazilian style.
    #[serde(default)]
    complements: Option<Vec<Complement>>,
    #[serde(default)]
    finished_at: Option<DateTime<Utc>>,
}

fn set_once<T>(slot: &mut Option<T>, value: T, field: &'static str) -> Result<()> {
    if slot.is_some() {
        return Err(HotdogError::AlreadyAssigned { field });
    }
    *slot = Some(value);
    Ok(())
}

impl Job {
    /// Create a fresh job with only `health` populated.
    pub fn new(health: bool) -> Self {
        Self {
            health,
            id: None,
            created_at: None,
            bread_type: None,
            sausage_type: None,
            style: None,
            complements: None,
            finished_at: None,
        }
    }

    pub fn health(&self) -> bool {
        self.health
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn bread_type(&self) -> Option<BreadType> {
        self.bread_type
    }

    pub fn sausage_type(&self) -> Option<SausageType> {
        self.sausage_type
    }

    pub fn style(&self) -> Option<Style> {
        self.style
    }

    /// Complements, or an empty slice when none were assigned.
    pub fn complements(&self) -> &[Complement] {
        self.complements.as_deref().unwrap_or_default()
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Assign identity and creation time in one step.
    ///
    /// Both are checked before either is written, so a failure leaves the job
    /// untouched.
    pub fn assign_identity(&mut self, id: impl Into<String>, at: DateTime<Utc>) -> Result<()> {
        if self.created_at.is_some() {
            return Err(HotdogError::AlreadyAssigned { field: "createdAt" });
        }
        set_once(&mut self.id, id.into(), "id")?;
        self.created_at = Some(at);
        Ok(())
    }

    pub fn assign_bread_type(&mut self, bread: BreadType) -> Result<()> {
        set_once(&mut self.bread_type, bread, "breadType")
    }

    pub fn assign_sausage_type(&mut self, sausage: SausageType) -> Result<()> {
        set_once(&mut self.sausage_type, sausage, "sausageType")
    }

    pub fn assign_style(&mut self, style: Style) -> Result<()> {
        set_once(&mut self.style, style, "style")
    }

    pub fn assign_complements(&mut self, complements: Vec<Complement>) -> Result<()> {
        set_once(&mut self.complements, complements, "complements")
    }

    pub fn assign_finished_at(&mut self, at: DateTime<Utc>) -> Result<()> {
        set_once(&mut self.finished_at, at, "finishedAt")
    }

    /// True when nothing but `health` has been set.
    pub fn is_fresh(&self) -> bool {
        self.id.is_none()
            && self.created_at.is_none()
            && self.bread_type.is_none()
            && self.sausage_type.is_none()
            && self.style.is_none()
            && self.complements.is_none()
            && self.finished_at.is_none()
    }

    /// Reject records that arrive from outside with derived fields already set.
    pub fn ensure_fresh(&self) -> Result<()> {
        if self.is_fresh() {
            Ok(())
        } else {
            Err(HotdogError::validation(
                "only `health` may be set on a submitted job",
            ))
        }
    }

    /// True when every field except possibly `complements` is set.
    pub fn is_complete(&self) -> bool {
        self.id.is_some()
            && self.created_at.is_some()
            && self.bread_type.is_some()
            && self.sausage_type.is_some()
            && self.style.is_some()
            && self.finished_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_job_is_fresh() {
        let job = Job::new(true);
        assert!(job.is_fresh());
        assert!(!job.is_complete());
        assert!(job.ensure_fresh().is_ok());
        assert!(job.complements().is_empty());
    }

    #[test]
    fn assignments_never_overwrite() {
        let mut job = Job::new(false);
        job.assign_bread_type(BreadType::Milk).unwrap();
        let err = job.assign_bread_type(BreadType::Whole).unwrap_err();
        assert!(matches!(err, HotdogError::AlreadyAssigned { field: "breadType" }));
        assert_eq!(job.bread_type(), Some(BreadType::Milk));
        assert!(job.ensure_fresh().is_err());
    }

    #[test]
    fn identity_is_assigned_once() {
        let mut job = Job::new(true);
        let now = Utc::now();
        job.assign_identity("a", now).unwrap();
        assert!(job.assign_identity("b", now).is_err());
        assert_eq!(job.id(), Some("a"));
        assert_eq!(job.created_at(), Some(now));
    }

    #[test]
    fn derivations_follow_health() {
        assert_eq!(BreadType::for_health(true), BreadType::Whole);
        assert_eq!(BreadType::for_health(false), BreadType::Milk);
        assert_eq!(SausageType::for_health(true), SausageType::Vegan);
        assert_eq!(SausageType::for_health(false), SausageType::Pork);
        assert_eq!(Style::for_health(true), Style::American);
        assert_eq!(Style::for_health(false), Style::Brazilian);
        assert!(Style::American.complements().is_empty());
        assert_eq!(Style::Brazilian.complements(), &BRAZILIAN_COMPLEMENTS);
    }

    #[test]
    fn json_uses_camel_case_and_nulls() {
        let job = Job::new(true);
        let value = serde_json::to_value(&job).expect("serialize");
        assert_eq!(value["health"], true);
        assert!(value["breadType"].is_null());
        assert!(value["createdAt"].is_null());
        assert!(value.get("bread_type").is_none());
    }

    #[test]
    fn complete_job_serializes_enum_names() {
        let mut job = Job::new(false);
        job.assign_identity(new_job_id(), Utc::now()).unwrap();
        job.assign_bread_type(BreadType::Milk).unwrap();
        job.assign_sausage_type(SausageType::Pork).unwrap();
        job.assign_style(Style::Brazilian).unwrap();
        job.assign_complements(BRAZILIAN_COMPLEMENTS.to_vec()).unwrap();
        job.assign_finished_at(Utc::now()).unwrap();
        assert!(job.is_complete());

        let value = serde_json::to_value(&job).expect("serialize");
        assert_eq!(value["breadType"], "Milk");
        assert_eq!(value["style"], "Brazilian");
        assert_eq!(
            value["complements"],
            serde_json::json!(["Cheddar", "Ketchup", "Mustard", "Corn", "Onions", "Tomatoes"])
        );

        let parsed: Job = serde_json::from_value(value).expect("deserialize");
        assert_eq!(parsed, job);
    }

    #[test]
    fn health_is_fixed_through_enrichment() {
        let mut job = Job::new(false);
        job.assign_bread_type(BreadType::for_health(job.health())).unwrap();
        job.assign_style(Style::Brazilian).unwrap();
        assert!(!job.health());

        let value = serde_json::to_value(&job).expect("serialize");
        assert_eq!(value["health"], false);
    }

    #[test]
    fn submitted_record_only_needs_health() {
        let job: Job = serde_json::from_str(r#"{"health": false}"#).expect("parse");
        assert!(job.is_fresh());
        assert!(!job.health());

        let job: Job =
            serde_json::from_str(r#"{"health": true, "style": "American"}"#).expect("parse");
        assert!(job.ensure_fresh().is_err());
    }

    #[test]
    fn job_ids_are_unique() {
        assert_ne!(new_job_id(), new_job_id());
    }
}
