//! General API information read once from the main annotation file.
//!
//! ```text
//! //! @APIVersion 1.0.0
//! //! @APITitle Petstore
//! //! @BasePath http://127.0.0.1:3000
//! ```

use super::{match_tag, strip_comment};
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Global metadata for the resource listing. Every value is the trimmed
/// text after its tag; a repeated tag keeps the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiInfo {
    pub api_version: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub base_path: Option<String>,
    pub contact: Option<String>,
    pub terms_of_service_url: Option<String>,
    pub license: Option<String>,
    pub license_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GeneralTag {
    ApiVersion,
    ApiTitle,
    ApiDescription,
    BasePath,
    Contact,
    TermsOfServiceUrl,
    License,
    LicenseUrl,
}

impl GeneralTag {
    const ALL: [GeneralTag; 8] = [
        GeneralTag::ApiVersion,
        GeneralTag::ApiTitle,
        GeneralTag::ApiDescription,
        GeneralTag::BasePath,
        GeneralTag::Contact,
        GeneralTag::TermsOfServiceUrl,
        GeneralTag::License,
        GeneralTag::LicenseUrl,
    ];

    fn tag(self) -> &'static str {
        match self {
            GeneralTag::ApiVersion => "@APIVersion",
            GeneralTag::ApiTitle => "@APITitle",
            GeneralTag::ApiDescription => "@APIDescription",
            GeneralTag::BasePath => "@BasePath",
            GeneralTag::Contact => "@Contact",
            GeneralTag::TermsOfServiceUrl => "@TermsOfServiceUrl",
            GeneralTag::License => "@License",
            GeneralTag::LicenseUrl => "@LicenseUrl",
        }
    }

    fn slot(self, info: &mut ApiInfo) -> &mut Option<String> {
        match self {
            GeneralTag::ApiVersion => &mut info.api_version,
            GeneralTag::ApiTitle => &mut info.title,
            GeneralTag::ApiDescription => &mut info.description,
            GeneralTag::BasePath => &mut info.base_path,
            GeneralTag::Contact => &mut info.contact,
            GeneralTag::TermsOfServiceUrl => &mut info.terms_of_service_url,
            GeneralTag::License => &mut info.license,
            GeneralTag::LicenseUrl => &mut info.license_url,
        }
    }
}

impl ApiInfo {
    /// Collect general-info tags from comment lines. Other lines are ignored.
    pub fn parse<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut info = ApiInfo::default();
        for raw in lines {
            let line = strip_comment(raw.as_ref());
            let matched = GeneralTag::ALL
                .iter()
                .find_map(|&tag| match_tag(line, tag.tag()).map(|rest| (tag, rest.trim())));
            if let Some((tag, value)) = matched {
                debug!("{} = {}", tag.tag(), value);
                *tag.slot(&mut info) = Some(value.to_string());
            }
        }
        info
    }

    /// Read general-info tags from a source file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read main API file: {}", path.display()))?;
        Ok(Self::parse(content.lines()))
    }
}
