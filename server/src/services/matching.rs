//! Candidate/job compatibility score.
//!
//! A fixed rule table over four signals, summed to a 0..=100 percentage:
//!
//! | signal     | weight |
//! |------------|--------|
//! | skills     | 40     |
//! | location   | 20     |
//! | industry   | 20     |
//! | experience | 20     |
//!
//! Unknown location, industry or candidate experience earns half the weight.
//! Without skills on both sides there is nothing to compare, and the score is
//! [`DEFAULT_SCORE`].

use std::collections::HashSet;

use serde::Serialize;

use super::accounts::UserProfile;
use super::jobs::JobOffer;

pub const DEFAULT_SCORE: u8 = 50;

const SKILLS_WEIGHT: u32 = 40;
const LOCATION_WEIGHT: u32 = 20;
const INDUSTRY_WEIGHT: u32 = 20;
const EXPERIENCE_WEIGHT: u32 = 20;

#[derive(Debug, Clone, Copy)]
pub struct CandidateSignals<'a> {
    pub skills: &'a [String],
    pub city: Option<&'a str>,
    pub industry: Option<&'a str>,
    pub experience_years: Option<i32>,
}

#[derive(Debug, Clone, Copy)]
pub struct JobSignals<'a> {
    pub required_skills: &'a [String],
    pub city: Option<&'a str>,
    pub remote: bool,
    pub industry: Option<&'a str>,
    pub min_experience_years: Option<i32>,
}

impl<'a> From<&'a UserProfile> for CandidateSignals<'a> {
    fn from(user: &'a UserProfile) -> Self {
        Self {
            skills: &user.skills,
            city: user.city.as_deref(),
            industry: user.industry.as_deref(),
            experience_years: user.experience_years,
        }
    }
}

impl<'a> From<&'a JobOffer> for JobSignals<'a> {
    fn from(job: &'a JobOffer) -> Self {
        Self {
            required_skills: &job.required_skills,
            city: job.city.as_deref(),
            remote: job.remote,
            industry: job.industry.as_deref(),
            min_experience_years: job.min_experience_years,
        }
    }
}

/// Per-signal points. `complete == false` means the default score was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchBreakdown {
    pub skills: u8,
    pub location: u8,
    pub industry: u8,
    pub experience: u8,
    pub score: u8,
    pub complete: bool,
}

fn normalized_set(values: &[String]) -> HashSet<String> {
    values
        .iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

fn same_text(a: Option<&str>, b: Option<&str>) -> Option<bool> {
    let a = a.map(str::trim).filter(|v| !v.is_empty())?;
    let b = b.map(str::trim).filter(|v| !v.is_empty())?;
    Some(a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase())
}

fn skills_points(candidate: &HashSet<String>, required: &HashSet<String>) -> u32 {
    let matched = required.intersection(candidate).count();
    let matched = u32::try_from(matched).unwrap_or(u32::MAX);
    let total = u32::try_from(required.len()).unwrap_or(u32::MAX);
    SKILLS_WEIGHT * matched / total
}

fn location_points(candidate: &CandidateSignals<'_>, job: &JobSignals<'_>) -> u32 {
    if job.remote {
        return LOCATION_WEIGHT;
    }
    match same_text(candidate.city, job.city) {
        Some(true) => LOCATION_WEIGHT,
        Some(false) => 0,
        None => LOCATION_WEIGHT / 2,
    }
}

fn industry_points(candidate: &CandidateSignals<'_>, job: &JobSignals<'_>) -> u32 {
    match same_text(candidate.industry, job.industry) {
        Some(true) => INDUSTRY_WEIGHT,
        Some(false) => 0,
        None => INDUSTRY_WEIGHT / 2,
    }
}

fn experience_points(candidate: &CandidateSignals<'_>, job: &JobSignals<'_>) -> u32 {
    let Some(required) = job.min_experience_years.filter(|y| *y > 0) else {
        return EXPERIENCE_WEIGHT;
    };
    let Some(years) = candidate.experience_years else {
        return EXPERIENCE_WEIGHT / 2;
    };
    if years >= required {
        return EXPERIENCE_WEIGHT;
    }
    let years = u32::try_from(years.max(0)).unwrap_or(0);
    let required = u32::try_from(required).unwrap_or(1);
    EXPERIENCE_WEIGHT * years / required
}

fn to_points(value: u32) -> u8 {
    u8::try_from(value.min(100)).unwrap_or(100)
}

/// Score with the per-signal breakdown.
#[must_use]
pub fn breakdown(candidate: &CandidateSignals<'_>, job: &JobSignals<'_>) -> MatchBreakdown {
    let candidate_skills = normalized_set(candidate.skills);
    let required_skills = normalized_set(job.required_skills);
    if candidate_skills.is_empty() || required_skills.is_empty() {
        return MatchBreakdown {
            skills: 0,
            location: 0,
            industry: 0,
            experience: 0,
            score: DEFAULT_SCORE,
            complete: false,
        };
    }

    let skills = skills_points(&candidate_skills, &required_skills);
    let location = location_points(candidate, job);
    let industry = industry_points(candidate, job);
    let experience = experience_points(candidate, job);

    MatchBreakdown {
        skills: to_points(skills),
        location: to_points(location),
        industry: to_points(industry),
        experience: to_points(experience),
        score: to_points(skills + location + industry + experience),
        complete: true,
    }
}

/// Compatibility percentage in `0..=100`.
#[must_use]
pub fn match_score(candidate: &CandidateSignals<'_>, job: &JobSignals<'_>) -> u8 {
    breakdown(candidate, job).score
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredJob {
    #[serde(flatten)]
    pub job: JobOffer,
    pub score: u8,
}

/// Best `limit` offers for a candidate. Equal scores put newer offers first.
#[must_use]
pub fn recommend(candidate: &UserProfile, jobs: Vec<JobOffer>, limit: usize) -> Vec<ScoredJob> {
    let signals = CandidateSignals::from(candidate);
    let mut scored: Vec<ScoredJob> = jobs
        .into_iter()
        .map(|job| {
            let score = match_score(&signals, &JobSignals::from(&job));
            ScoredJob { job, score }
        })
        .collect();
    scored.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| b.job.created_at.cmp(&a.job.created_at)));
    scored.truncate(limit);
    scored
}

#[cfg(test)]
#[path = "matching_test.rs"]
mod tests;
