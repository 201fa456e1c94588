use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

/// The three entity collections of the catalog, in parent → child order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Sports,
    Events,
    Selections,
}

impl Collection {
    /// Backing table name. Always a static identifier, safe to splice into SQL.
    pub fn table(self) -> &'static str {
        match self {
            Collection::Sports => "sports",
            Collection::Events => "events",
            Collection::Selections => "selections",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.table())
    }
}

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum EventStatus {
    Pending,
    Started,
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventStatus::Pending => "Pending",
            EventStatus::Started => "Started",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum Outcome {
    Unsettled,
    Win,
    Lose,
    Void,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Outcome::Unsettled => "Unsettled",
            Outcome::Win => "Win",
            Outcome::Lose => "Lose",
            Outcome::Void => "Void",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Sport {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub active: bool,
    /// Free-text category such as "preplay" or "inplay".
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub event_type: String,
    pub sport_id: i64,
    pub status: EventStatus,
    pub scheduled_start: DateTime<Utc>,
    /// Set when the event first moves to `Started`, never cleared afterwards.
    pub actual_start: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Selection {
    pub id: i64,
    pub name: String,
    pub event_id: i64,
    pub price: f64,
    pub active: bool,
    pub outcome: Outcome,
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SportCreate {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SportUpdate {
    pub name: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventCreate {
    pub name: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub sport_id: i64,
    pub scheduled_start: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventUpdate {
    pub name: Option<String>,
    pub active: Option<bool>,
    pub status: Option<EventStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectionCreate {
    pub name: String,
    pub event_id: i64,
    pub price: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectionUpdate {
    pub name: Option<String>,
    pub active: Option<bool>,
    pub outcome: Option<Outcome>,
    pub price: Option<f64>,
}

fn check_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("name must not be empty"));
    }
    Ok(())
}

fn check_price(price: f64) -> Result<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::validation(format!(
            "price must be a non-negative number, got {price}"
        )));
    }
    Ok(())
}

impl SportCreate {
    pub fn validate(&self) -> Result<()> {
        check_name(&self.name)
    }
}

impl SportUpdate {
    pub fn validate(&self) -> Result<()> {
        self.name.as_deref().map_or(Ok(()), check_name)
    }
}

impl EventCreate {
    pub fn validate(&self) -> Result<()> {
        check_name(&self.name)?;
        if self.event_type.trim().is_empty() {
            return Err(AppError::validation("type must not be empty"));
        }
        Ok(())
    }
}

impl EventUpdate {
    pub fn validate(&self) -> Result<()> {
        self.name.as_deref().map_or(Ok(()), check_name)
    }
}

impl SelectionCreate {
    pub fn validate(&self) -> Result<()> {
        check_name(&self.name)?;
        check_price(self.price)
    }
}

impl SelectionUpdate {
    pub fn validate(&self) -> Result<()> {
        self.name.as_deref().map_or(Ok(()), check_name)?;
        self.price.map_or(Ok(()), check_price)
    }
}
