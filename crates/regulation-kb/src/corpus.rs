//! Built-in regulation corpus and external corpus loading
//!
//! The built-in corpus covers five statutes that commonly apply to social and
//! video platforms. Each statute is split into short clauses tagged with a
//! single [`Category`], which is the unit the index matches against.

use std::path::Path;

use serde::{Deserialize, Serialize};
use shared_types::{Category, RegulationClause};
use tracing::info;

use crate::error::{KnowledgeBaseError, Result};

/// A statute with its clauses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Regulation {
    pub id: String,
    pub name: String,
    pub jurisdiction: String,
    pub citation: String,
    pub clauses: Vec<RegulationClause>,
}

struct BuiltinRegulation {
    id: &'static str,
    name: &'static str,
    jurisdiction: &'static str,
    citation: &'static str,
    clauses: &'static [(Category, &'static str)],
}

const BUILTIN: &[BuiltinRegulation] = &[
    BuiltinRegulation {
        id: "eu_dsa_2022",
        name: "EU Digital Services Act (DSA)",
        jurisdiction: "European Union",
        citation: "Regulation (EU) 2022/2065",
        clauses: &[
            (
                Category::ContentModeration,
                "Online platforms must publish content moderation transparency reports and notify users of content removal decisions with a statement of reasons.",
            ),
            (
                Category::ContentModeration,
                "Platforms must provide an internal appeals process for content moderation decisions and act expeditiously to remove illegal and harmful content.",
            ),
            (
                Category::DataPrivacy,
                "Very large platforms must assess systemic risks from recommendation systems and algorithmic ranking, and offer a feed option that is not based on profiling of personal data.",
            ),
            (
                Category::ChildSafety,
                "Platforms accessible to minors must ensure a high level of privacy, safety and security for minors and must not present advertising based on profiling to minors.",
            ),
        ],
    },
    BuiltinRegulation {
        id: "ca_ccpa_2020",
        name: "California Consumer Privacy Act (CCPA)",
        jurisdiction: "California, US",
        citation: "Cal. Civ. Code § 1798.100 et seq.",
        clauses: &[
            (
                Category::DataPrivacy,
                "Businesses must disclose the categories of personal information collected and the purposes of personal data collection in a privacy policy.",
            ),
            (
                Category::DataPrivacy,
                "Consumers have the right to know, delete and opt out of the sale or sharing of their personal information, including data used for targeted advertising and cross-context behavioral tracking.",
            ),
            (
                Category::DataPrivacy,
                "Businesses must not sell the personal information of consumers under 16 without affirmative opt-in consent, and parental consent is required for consumers under 13.",
            ),
            (
                Category::DataPrivacy,
                "Precise geolocation, device location and device identifiers are sensitive personal information, and consumers may limit the use and disclosure of sensitive personal information.",
            ),
        ],
    },
    BuiltinRegulation {
        id: "ut_social_media_2023",
        name: "Utah Social Media Regulation Act",
        jurisdiction: "Utah, US",
        citation: "Utah Code § 13-63-101 et seq.",
        clauses: &[
            (
                Category::ChildSafety,
                "Social media platforms must perform age verification for account holders and obtain parental consent before a minor under 18 opens or keeps an account.",
            ),
            (
                Category::ChildSafety,
                "Platforms must enforce a default curfew that blocks minor account access between 10:30 pm and 6:30 am unless a parent or guardian changes the time-based restriction.",
            ),
            (
                Category::ChildSafety,
                "Parental controls must give a parent or guardian access to a minor account, and platforms must not use addictive design features that cause a minor to spend excessive time on the service.",
            ),
            (
                Category::DataPrivacy,
                "Minor accounts must default to the most private settings, including disabled location sharing and hidden search visibility, and platforms must not use the personal data of a minor for targeted advertising.",
            ),
        ],
    },
    BuiltinRegulation {
        id: "fl_social_media_2021",
        name: "Florida Social Media Law",
        jurisdiction: "Florida, US",
        citation: "Fla. Stat. § 501.2041",
        clauses: &[
            (
                Category::ContentModeration,
                "Social media platforms may not deplatform political candidates and must apply community standards for content moderation in a consistent manner.",
            ),
            (
                Category::ContentModeration,
                "Platforms must publish content moderation standards and notify users before censoring, shadow banning or removing their content.",
            ),
            (
                Category::ContentModeration,
                "Users must be able to opt out of post-prioritization and shadow banning algorithms and view content in sequential or chronological order.",
            ),
        ],
    },
    BuiltinRegulation {
        id: "us_ncmec_reporting",
        name: "NCMEC Reporting Requirements",
        jurisdiction: "United States",
        citation: "18 U.S.C. § 2258A",
        clauses: &[
            (
                Category::ChildSafety,
                "Electronic service providers must report apparent child sexual abuse material to the NCMEC CyberTipline as soon as reasonably possible after obtaining actual knowledge.",
            ),
            (
                Category::ChildSafety,
                "Providers must preserve the contents of a CyberTipline report for one year and provide technical assistance to law enforcement investigations.",
            ),
            (
                Category::ChildSafety,
                "Hash matching and detection systems used to identify child sexual abuse material must follow documented reporting procedures.",
            ),
        ],
    },
];

/// The statutes shipped with the engine
pub fn builtin_regulations() -> Vec<Regulation> {
    BUILTIN
        .iter()
        .map(|reg| Regulation {
            id: reg.id.to_string(),
            name: reg.name.to_string(),
            jurisdiction: reg.jurisdiction.to_string(),
            citation: reg.citation.to_string(),
            clauses: reg
                .clauses
                .iter()
                .map(|(category, text)| RegulationClause {
                    regulation_id: reg.id.to_string(),
                    regulation_name: reg.name.to_string(),
                    jurisdiction: reg.jurisdiction.to_string(),
                    clause_text: text.to_string(),
                    category: *category,
                })
                .collect(),
        })
        .collect()
}

/// Every built-in clause, in statute order
pub fn builtin_clauses() -> Vec<RegulationClause> {
    builtin_regulations()
        .into_iter()
        .flat_map(|reg| reg.clauses)
        .collect()
}

/// Load clauses from a JSON file holding an array of clause objects
pub fn load_clauses(path: impl AsRef<Path>) -> Result<Vec<RegulationClause>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| KnowledgeBaseError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let clauses: Vec<RegulationClause> =
        serde_json::from_str(&raw).map_err(|source| KnowledgeBaseError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    if clauses.is_empty() {
        return Err(KnowledgeBaseError::EmptyCorpus(path.to_path_buf()));
    }

    info!(path = %path.display(), clauses = clauses.len(), "Loaded regulation corpus");
    Ok(clauses)
}
