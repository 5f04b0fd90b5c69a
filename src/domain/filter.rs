//! Multi-field filtering of already-fetched lists.
//!
//! A [`Filter`] is a set of criterion groups. A candidate passes when every
//! group matches; inside a group holding several values any one of them is
//! enough. Results keep the order they were given in.

use chrono::{DateTime, Utc};

use crate::db::models::{Community, Event, EventType, Profile, Role};
use crate::domain::status::EventStatus;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Community,
    Person,
    Event,
}

/// Something the filter can look into. Only the text fields and the kind are
/// required; everything else defaults to "not applicable", which never
/// matches a group asking for it.
pub trait Searchable {
    fn kind(&self) -> Kind;

    /// Fields searched by free text
    fn text_fields(&self) -> Vec<&str>;

    fn categories(&self) -> &[String] {
        &[]
    }

    fn skills(&self) -> &[String] {
        &[]
    }

    fn role(&self) -> Option<Role> {
        None
    }

    fn event_type(&self) -> Option<EventType> {
        None
    }

    fn status_at(&self, _now: DateTime<Utc>) -> Option<EventStatus> {
        None
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Criterion {
    /// Lowercased needle matched as a substring of any text field
    Text(String),
    Categories(Vec<String>),
    /// Lowercased needle matched as a substring of any skill
    Skill(String),
    Roles(Vec<Role>),
    EventTypes(Vec<EventType>),
    Statuses {
        statuses: Vec<EventStatus>,
        now: DateTime<Utc>,
    },
    Kinds(Vec<Kind>),
}

impl Criterion {
    fn is_empty(&self) -> bool {
        match self {
            Criterion::Text(s) | Criterion::Skill(s) => s.is_empty(),
            Criterion::Categories(v) => v.is_empty(),
            Criterion::Roles(v) => v.is_empty(),
            Criterion::EventTypes(v) => v.is_empty(),
            Criterion::Statuses { statuses, .. } => statuses.is_empty(),
            Criterion::Kinds(v) => v.is_empty(),
        }
    }

    pub fn matches<T: Searchable + ?Sized>(&self, item: &T) -> bool {
        match self {
            Criterion::Text(needle) => item
                .text_fields()
                .iter()
                .any(|field| contains_ignore_case(field, needle)),
            Criterion::Categories(wanted) => item
                .categories()
                .iter()
                .any(|c| wanted.iter().any(|w| w.eq_ignore_ascii_case(c))),
            Criterion::Skill(needle) => item
                .skills()
                .iter()
                .any(|skill| contains_ignore_case(skill, needle)),
            Criterion::Roles(roles) => item.role().is_some_and(|r| roles.contains(&r)),
            Criterion::EventTypes(types) => item.event_type().is_some_and(|t| types.contains(&t)),
            Criterion::Statuses { statuses, now } => item
                .status_at(*now)
                .is_some_and(|s| statuses.contains(&s)),
            Criterion::Kinds(kinds) => kinds.contains(&item.kind()),
        }
    }
}

fn contains_ignore_case(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    criteria: Vec<Criterion>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a group. Groups without values are dropped so they never exclude
    /// anything.
    pub fn with(mut self, criterion: Criterion) -> Self {
        if !criterion.is_empty() {
            self.criteria.push(criterion);
        }
        self
    }

    pub fn text(self, query: &str) -> Self {
        self.with(Criterion::Text(query.trim().to_lowercase()))
    }

    pub fn categories<I, S>(self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(Criterion::Categories(
            categories.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn skill(self, skill: &str) -> Self {
        self.with(Criterion::Skill(skill.trim().to_lowercase()))
    }

    pub fn roles(self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.with(Criterion::Roles(roles.into_iter().collect()))
    }

    pub fn event_types(self, types: impl IntoIterator<Item = EventType>) -> Self {
        self.with(Criterion::EventTypes(types.into_iter().collect()))
    }

    pub fn statuses(
        self,
        statuses: impl IntoIterator<Item = EventStatus>,
        now: DateTime<Utc>,
    ) -> Self {
        self.with(Criterion::Statuses {
            statuses: statuses.into_iter().collect(),
            now,
        })
    }

    pub fn kinds(self, kinds: impl IntoIterator<Item = Kind>) -> Self {
        self.with(Criterion::Kinds(kinds.into_iter().collect()))
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn matches<T: Searchable + ?Sized>(&self, item: &T) -> bool {
        self.criteria.iter().all(|c| c.matches(item))
    }

    pub fn apply<'a, T: Searchable>(&self, items: &'a [T]) -> Vec<&'a T> {
        items.iter().filter(|item| self.matches(*item)).collect()
    }
}

impl Searchable for Profile {
    fn kind(&self) -> Kind {
        Kind::Person
    }

    fn text_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::with_capacity(2 + self.skills.len());
        fields.extend(self.name.as_deref());
        fields.extend(self.bio.as_deref());
        fields.extend(self.skills.iter().map(String::as_str));
        fields
    }

    // People are grouped by what they are interested in
    fn categories(&self) -> &[String] {
        &self.interests
    }

    fn skills(&self) -> &[String] {
        &self.skills
    }

    fn role(&self) -> Option<Role> {
        Some(self.role)
    }
}

impl Searchable for Community {
    fn kind(&self) -> Kind {
        Kind::Community
    }

    fn text_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.description.as_str()];
        fields.extend(self.categories.iter().map(String::as_str));
        fields
    }

    fn categories(&self) -> &[String] {
        &self.categories
    }
}

impl Searchable for Event {
    fn kind(&self) -> Kind {
        Kind::Event
    }

    fn text_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.title.as_str(),
            self.description.as_str(),
            self.location.as_str(),
        ];
        fields.extend(self.tags.iter().map(String::as_str));
        fields
    }

    fn categories(&self) -> &[String] {
        &self.tags
    }

    fn event_type(&self) -> Option<EventType> {
        Some(self.event_type)
    }

    fn status_at(&self, now: DateTime<Utc>) -> Option<EventStatus> {
        Some(Event::status_at(self, now))
    }
}

/// One row of the combined search results
#[derive(Clone, Copy, Debug)]
pub enum SearchHit<'a> {
    Community(&'a Community),
    Person(&'a Profile),
}

impl Searchable for SearchHit<'_> {
    fn kind(&self) -> Kind {
        match self {
            SearchHit::Community(c) => c.kind(),
            SearchHit::Person(p) => p.kind(),
        }
    }

    fn text_fields(&self) -> Vec<&str> {
        match self {
            SearchHit::Community(c) => c.text_fields(),
            SearchHit::Person(p) => p.text_fields(),
        }
    }

    fn categories(&self) -> &[String] {
        match self {
            SearchHit::Community(c) => Searchable::categories(*c),
            SearchHit::Person(p) => Searchable::categories(*p),
        }
    }

    fn skills(&self) -> &[String] {
        match self {
            SearchHit::Community(_) => &[],
            SearchHit::Person(p) => Searchable::skills(*p),
        }
    }

    fn role(&self) -> Option<Role> {
        match self {
            SearchHit::Community(_) => None,
            SearchHit::Person(p) => Some(p.role),
        }
    }
}
