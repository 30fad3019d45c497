//! Mock data the dashboard ships with: five job boards and twelve saved
//! offers spread over November 2023.

use chrono::{DateTime, Utc};
use jobdash_core::types::Timestamp;

use crate::models::offer::JobOffer;
use crate::models::source::JobSource;

struct SourceSeed {
    id: &'static str,
    name: &'static str,
    url: &'static str,
    logo: &'static str,
    description: &'static str,
    active: bool,
    offers_count: u32,
}

struct OfferSeed {
    id: &'static str,
    title: &'static str,
    company: &'static str,
    location: &'static str,
    salary: Option<&'static str>,
    description: &'static str,
    source_id: &'static str,
    applied_at: Option<&'static str>,
    created_at: &'static str,
    updated_at: &'static str,
}

const SOURCES: &[SourceSeed] = &[
    SourceSeed {
        id: "1",
        name: "LinkedIn",
        url: "https://www.linkedin.com/jobs",
        logo: "logos:linkedin-icon",
        description: "Professional networking platform with job listings",
        active: true,
        offers_count: 124,
    },
    SourceSeed {
        id: "2",
        name: "Indeed",
        url: "https://www.indeed.com",
        logo: "logos:indeed",
        description: "Job search engine for job listings",
        active: true,
        offers_count: 87,
    },
    SourceSeed {
        id: "3",
        name: "Glassdoor",
        url: "https://www.glassdoor.com",
        logo: "logos:glassdoor",
        description: "Company reviews and job listings",
        active: false,
        offers_count: 42,
    },
    SourceSeed {
        id: "4",
        name: "AngelList",
        url: "https://angel.co",
        logo: "logos:angellist",
        description: "Startup jobs and recruiting platform",
        active: true,
        offers_count: 35,
    },
    SourceSeed {
        id: "5",
        name: "Stack Overflow",
        url: "https://stackoverflow.com/jobs",
        logo: "logos:stackoverflow-icon",
        description: "Developer jobs and careers",
        active: true,
        offers_count: 18,
    },
];

const OFFERS: &[OfferSeed] = &[
    OfferSeed {
        id: "1",
        title: "Senior Frontend Developer",
        company: "Tech Innovations Inc.",
        location: "San Francisco, CA (Remote)",
        salary: Some("$120,000 - $150,000"),
        description: "We are looking for a skilled Senior Frontend Developer...",
        source_id: "1",
        applied_at: Some("2023-11-15T10:30:00Z"),
        created_at: "2023-11-10T08:20:00Z",
        updated_at: "2023-11-15T10:35:00Z",
    },
    OfferSeed {
        id: "2",
        title: "Backend Engineer",
        company: "Data Systems LLC",
        location: "New York, NY",
        salary: Some("$130,000 - $160,000"),
        description: "Join our team as a Backend Engineer working on...",
        source_id: "2",
        applied_at: Some("2023-11-18T14:45:00Z"),
        created_at: "2023-11-05T11:15:00Z",
        updated_at: "2023-11-18T14:50:00Z",
    },
    OfferSeed {
        id: "3",
        title: "Full Stack Developer",
        company: "WebSolutions Co.",
        location: "Austin, TX (Hybrid)",
        salary: Some("$100,000 - $130,000"),
        description: "Looking for a Full Stack Developer with experience in...",
        source_id: "1",
        applied_at: None,
        created_at: "2023-11-12T09:40:00Z",
        updated_at: "2023-11-12T09:40:00Z",
    },
    OfferSeed {
        id: "4",
        title: "DevOps Engineer",
        company: "Cloud Services Inc.",
        location: "Remote",
        salary: Some("$110,000 - $140,000"),
        description: "We are seeking a DevOps Engineer to join our team...",
        source_id: "4",
        applied_at: None,
        created_at: "2023-11-08T13:20:00Z",
        updated_at: "2023-11-08T13:20:00Z",
    },
    OfferSeed {
        id: "5",
        title: "UI/UX Designer",
        company: "Creative Design Studio",
        location: "Los Angeles, CA",
        salary: Some("$90,000 - $120,000"),
        description: "Join our creative team as a UI/UX Designer...",
        source_id: "2",
        applied_at: Some("2023-11-20T11:10:00Z"),
        created_at: "2023-11-14T10:30:00Z",
        updated_at: "2023-11-20T11:15:00Z",
    },
    OfferSeed {
        id: "6",
        title: "Product Manager",
        company: "Tech Solutions Ltd.",
        location: "Chicago, IL (Hybrid)",
        salary: Some("$130,000 - $160,000"),
        description: "We are looking for an experienced Product Manager...",
        source_id: "3",
        applied_at: None,
        created_at: "2023-11-16T15:45:00Z",
        updated_at: "2023-11-16T15:45:00Z",
    },
    OfferSeed {
        id: "7",
        title: "Data Scientist",
        company: "Analytics Innovations",
        location: "Remote",
        salary: Some("$120,000 - $150,000"),
        description: "Seeking a Data Scientist with strong analytical skills...",
        source_id: "5",
        applied_at: Some("2023-11-22T09:30:00Z"),
        created_at: "2023-11-17T14:20:00Z",
        updated_at: "2023-11-22T09:35:00Z",
    },
    OfferSeed {
        id: "8",
        title: "Mobile Developer (iOS)",
        company: "App Creations Inc.",
        location: "Seattle, WA",
        salary: Some("$115,000 - $145,000"),
        description: "Join our mobile development team as an iOS Developer...",
        source_id: "1",
        applied_at: None,
        created_at: "2023-11-18T11:10:00Z",
        updated_at: "2023-11-18T11:10:00Z",
    },
    OfferSeed {
        id: "9",
        title: "QA Engineer",
        company: "Software Testing Ltd.",
        location: "Denver, CO (Remote)",
        salary: Some("$90,000 - $110,000"),
        description: "We are seeking a detail-oriented QA Engineer...",
        source_id: "2",
        applied_at: Some("2023-11-19T13:40:00Z"),
        created_at: "2023-11-15T10:30:00Z",
        updated_at: "2023-11-19T13:45:00Z",
    },
    OfferSeed {
        id: "10",
        title: "Cybersecurity Specialist",
        company: "SecureTech Systems",
        location: "Washington, DC",
        salary: Some("$130,000 - $160,000"),
        description: "Join our security team as a Cybersecurity Specialist...",
        source_id: "4",
        applied_at: None,
        created_at: "2023-11-20T09:15:00Z",
        updated_at: "2023-11-20T09:15:00Z",
    },
    OfferSeed {
        id: "11",
        title: "Cloud Architect",
        company: "Infrastructure Solutions",
        location: "Remote",
        salary: Some("$140,000 - $170,000"),
        description: "We are looking for an experienced Cloud Architect...",
        source_id: "5",
        applied_at: Some("2023-11-21T14:30:00Z"),
        created_at: "2023-11-16T11:20:00Z",
        updated_at: "2023-11-21T14:35:00Z",
    },
    OfferSeed {
        id: "12",
        title: "Technical Writer",
        company: "Documentation Services",
        location: "Portland, OR (Hybrid)",
        salary: Some("$80,000 - $100,000"),
        description: "Seeking a skilled Technical Writer to create documentation...",
        source_id: "3",
        applied_at: None,
        created_at: "2023-11-19T10:45:00Z",
        updated_at: "2023-11-19T10:45:00Z",
    },
];

fn parse_timestamp(value: &str) -> Result<Timestamp, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc))
}

/// The five seeded job boards, in display order.
pub fn job_sources() -> Vec<JobSource> {
    SOURCES
        .iter()
        .map(|s| JobSource {
            id: s.id.to_string(),
            name: s.name.to_string(),
            url: s.url.to_string(),
            logo: s.logo.to_string(),
            description: s.description.to_string(),
            active: s.active,
            offers_count: s.offers_count,
        })
        .collect()
}

/// The twelve seeded offers, all saved, half of them applied to.
pub fn job_offers() -> Result<Vec<JobOffer>, chrono::ParseError> {
    OFFERS
        .iter()
        .map(|o| {
            Ok(JobOffer {
                id: o.id.to_string(),
                title: o.title.to_string(),
                company: o.company.to_string(),
                location: o.location.to_string(),
                salary: o.salary.map(str::to_string),
                description: o.description.to_string(),
                source_id: o.source_id.to_string(),
                url: format!("https://example.com/job/{}", o.id),
                is_saved: true,
                applied_at: o.applied_at.map(parse_timestamp).transpose()?,
                created_at: parse_timestamp(o.created_at)?,
                updated_at: parse_timestamp(o.updated_at)?,
            })
        })
        .collect()
}
