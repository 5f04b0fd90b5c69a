use askama::Template;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::db::models::{Community, Profile, Role};
use crate::domain::text::parse_list;
use crate::domain::{Filter, Kind, SearchHit};
use crate::error::AppResult;
use crate::extractors::{CurrentUser, MaybeUser};
use crate::routes::home::Html;
use crate::state::AppState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchTab {
    All,
    Communities,
    Mentors,
    Mentees,
}

impl SearchTab {
    pub const ALL: [SearchTab; 4] = [
        SearchTab::All,
        SearchTab::Communities,
        SearchTab::Mentors,
        SearchTab::Mentees,
    ];

    /// Unknown names fall back to `All`
    pub fn parse(raw: &str) -> Self {
        match raw {
            "communities" => SearchTab::Communities,
            "mentors" => SearchTab::Mentors,
            "mentees" => SearchTab::Mentees,
            _ => SearchTab::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchTab::All => "all",
            SearchTab::Communities => "communities",
            SearchTab::Mentors => "mentors",
            SearchTab::Mentees => "mentees",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SearchTab::All => "All",
            SearchTab::Communities => "Communities",
            SearchTab::Mentors => "Mentors",
            SearchTab::Mentees => "Mentees",
        }
    }

    fn filter(&self) -> Filter {
        match self {
            SearchTab::All => Filter::new(),
            SearchTab::Communities => Filter::new().kinds([Kind::Community]),
            SearchTab::Mentors => Filter::new()
                .kinds([Kind::Person])
                .roles(Role::Mentor.accepted_by_search()),
            SearchTab::Mentees => Filter::new()
                .kinds([Kind::Person])
                .roles(Role::Mentee.accepted_by_search()),
        }
    }
}

pub struct TabView {
    pub tab: SearchTab,
    pub count: usize,
    pub active: bool,
}

pub struct CategoryChip {
    pub name: String,
    pub selected: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub categories: Option<String>,
    pub tab: Option<String>,
}

#[derive(Template)]
#[template(path = "pages/search.html")]
pub struct SearchTemplate {
    pub viewer: Option<CurrentUser>,
    pub q: String,
    pub categories: String,
    pub chips: Vec<CategoryChip>,
    pub tab: SearchTab,
    pub tabs: Vec<TabView>,
    pub communities: Vec<Community>,
    pub people: Vec<Profile>,
}

/// Categories offered as chips: every category of the matched communities
/// plus the ones already selected, sorted
fn category_chips(communities: &[Community], selected: &[String]) -> Vec<CategoryChip> {
    let mut names: Vec<String> = Vec::new();
    for name in communities
        .iter()
        .flat_map(|c| c.categories.iter())
        .chain(selected.iter())
    {
        if !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
            names.push(name.clone());
        }
    }
    names.sort_by_key(|n| n.to_lowercase());

    names
        .into_iter()
        .map(|name| CategoryChip {
            selected: selected.iter().any(|s| s.eq_ignore_ascii_case(&name)),
            name,
        })
        .collect()
}

pub async fn search(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Query(params): Query<SearchParams>,
) -> AppResult<Response> {
    let q = params.q.unwrap_or_default();
    let categories = parse_list(params.categories.as_deref().unwrap_or_default());
    let tab = SearchTab::parse(params.tab.as_deref().unwrap_or_default());

    let results = state.gateway.search(&q).await?;

    let by_category = Filter::new().categories(categories.iter().cloned());
    let hits: Vec<SearchHit<'_>> = results
        .communities
        .iter()
        .map(SearchHit::Community)
        .chain(results.people.iter().map(SearchHit::Person))
        .filter(|hit| by_category.matches(hit))
        .collect();

    let tabs = SearchTab::ALL
        .iter()
        .map(|t| {
            let filter = t.filter();
            TabView {
                tab: *t,
                count: hits.iter().filter(|hit| filter.matches(*hit)).count(),
                active: *t == tab,
            }
        })
        .collect();

    let shown = tab.filter();
    let mut communities = Vec::new();
    let mut people = Vec::new();
    for hit in hits.iter().filter(|hit| shown.matches(*hit)) {
        match hit {
            SearchHit::Community(c) => communities.push((*c).clone()),
            SearchHit::Person(p) => people.push((*p).clone()),
        }
    }

    Ok(Html(SearchTemplate {
        viewer: maybe_user.0,
        chips: category_chips(&results.communities, &categories),
        categories: categories.join(","),
        q,
        tab,
        tabs,
        communities,
        people,
    })
    .into_response())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/search", get(search))
}
