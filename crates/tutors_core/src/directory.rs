//! crates/tutors_core/src/directory.rs
//!
//! The tutor directory: approved tutors filtered in memory, profile lookup and
//! tutor applications.

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::domain::{NewTutorApplication, Tutor, MAX_HOURLY_RATE_CENTS};
use crate::ports::{DatabaseService, PortError, PortResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TutorSort {
    #[default]
    Rating,
    PriceAsc,
    PriceDesc,
}

impl std::str::FromStr for TutorSort {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rating" => Ok(TutorSort::Rating),
            "price_asc" => Ok(TutorSort::PriceAsc),
            "price_desc" => Ok(TutorSort::PriceDesc),
            other => Err(PortError::Validation(format!("unknown sort '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TutorFilter {
    pub language: Option<String>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    pub search: Option<String>,
    pub sort: TutorSort,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

impl TutorFilter {
    pub fn matches(&self, tutor: &Tutor) -> bool {
        let language_ok = match self.language.as_deref().map(str::trim) {
            Some(lang) if !lang.is_empty() => {
                tutor.language.eq_ignore_ascii_case(lang)
                    || tutor.native_language.eq_ignore_ascii_case(lang)
            }
            _ => true,
        };
        let price_ok = self.min_price_cents.map_or(true, |min| tutor.hourly_rate_cents >= min)
            && self.max_price_cents.map_or(true, |max| tutor.hourly_rate_cents <= max);
        let search_ok = match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                [
                    &tutor.display_name,
                    &tutor.headline,
                    &tutor.bio,
                    &tutor.language,
                    &tutor.native_language,
                ]
                .iter()
                .any(|field| contains_ci(field, &term))
            }
            _ => true,
        };
        language_ok && price_ok && search_ok
    }
}

/// Applies `filter` to an already-loaded list of tutors and sorts the result.
pub fn filter_tutors(tutors: &[Tutor], filter: &TutorFilter) -> Vec<Tutor> {
    let mut matched: Vec<Tutor> = tutors.iter().filter(|t| filter.matches(t)).cloned().collect();
    match filter.sort {
        TutorSort::Rating => matched.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
        TutorSort::PriceAsc => matched.sort_by_key(|t| t.hourly_rate_cents),
        TutorSort::PriceDesc => matched.sort_by(|a, b| b.hourly_rate_cents.cmp(&a.hourly_rate_cents)),
    }
    matched
}

pub struct TutorDirectory {
    db: Arc<dyn DatabaseService>,
}

impl TutorDirectory {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    pub async fn search(&self, filter: &TutorFilter) -> PortResult<Vec<Tutor>> {
        let tutors = self.db.list_approved_tutors().await?;
        Ok(filter_tutors(&tutors, filter))
    }

    /// Approved profiles are public; unapproved ones are visible to their owner only.
    pub async fn profile(&self, tutor_id: Uuid, viewer: Option<Uuid>) -> PortResult<Tutor> {
        let tutor = self.db.get_tutor(tutor_id).await?;
        if tutor.approved || viewer == Some(tutor.user_id) {
            Ok(tutor)
        } else {
            Err(PortError::NotFound(format!("Tutor {} not found", tutor_id)))
        }
    }

    pub async fn submit_application(
        &self,
        user_id: Uuid,
        application: NewTutorApplication,
    ) -> PortResult<Tutor> {
        if application.display_name.trim().is_empty() {
            return Err(PortError::Validation("Display name is required".to_string()));
        }
        if application.language.trim().is_empty() {
            return Err(PortError::Validation("Taught language is required".to_string()));
        }
        if application.hourly_rate_cents <= 0 || application.hourly_rate_cents > MAX_HOURLY_RATE_CENTS {
            return Err(PortError::Validation(format!(
                "Hourly rate must be between 1 and {} cents",
                MAX_HOURLY_RATE_CENTS
            )));
        }
        let tutor = self.db.create_tutor_application(user_id, application).await?;
        info!("Tutor application {} submitted by {}", tutor.id, user_id);
        Ok(tutor)
    }

    /// `None` if the user has not applied yet.
    pub async fn my_application(&self, user_id: Uuid) -> PortResult<Option<Tutor>> {
        self.db.find_tutor_by_user(user_id).await
    }
}
