//! Content resources served by the portal.
//!
//! Maps URL slugs to backend tables and the queries the public pages and
//! the admin console run against them.

use crate::backend::Query;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Athletes,
    News,
    Events,
    Gallery,
    BoardMembers,
    TechnicalStaff,
    TravelRecords,
}

impl Resource {
    pub const ALL: [Resource; 7] = [
        Resource::Athletes,
        Resource::News,
        Resource::Events,
        Resource::Gallery,
        Resource::BoardMembers,
        Resource::TechnicalStaff,
        Resource::TravelRecords,
    ];

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.slug() == slug)
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Resource::Athletes => "athletes",
            Resource::News => "news",
            Resource::Events => "events",
            Resource::Gallery => "gallery",
            Resource::BoardMembers => "board-members",
            Resource::TechnicalStaff => "technical-staff",
            Resource::TravelRecords => "travel-records",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            Resource::Athletes => "athletes",
            Resource::News => "news",
            Resource::Events => "events",
            Resource::Gallery => "gallery",
            Resource::BoardMembers => "board_members",
            Resource::TechnicalStaff => "technical_staff",
            Resource::TravelRecords => "travel_records",
        }
    }

    /// Query behind the public page listing for this resource.
    pub fn featured_query(&self) -> Query {
        let query = Query::new(self.table());
        match self {
            Resource::Athletes => query.eq("featured", "true").order_by("name", true).limit(8),
            Resource::News => query.order_by("published_at", false).limit(6),
            Resource::Events => query.order_by("starts_at", true).limit(6),
            Resource::Gallery => query.order_by("created_at", false).limit(12),
            Resource::BoardMembers => query.order_by("position", true),
            Resource::TechnicalStaff => query.order_by("name", true),
            Resource::TravelRecords => query.order_by("departure_date", false).limit(20),
        }
    }

    /// Full listing for the admin tables, newest first.
    pub fn admin_query(&self) -> Query {
        Query::new(self.table()).order_by("created_at", false)
    }

    /// Regular expression matching every cache key built from this table.
    pub fn cache_pattern(&self) -> String {
        format!(r"^{}(\?|$)", regex::escape(self.table()))
    }
}
