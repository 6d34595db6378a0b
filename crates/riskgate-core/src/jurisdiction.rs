//! Regions, industries and compliance frameworks
//!
//! These three axes scope both regional policies and validation rules.
//! `Region::Global` and `Industry::General` act as wildcards during rule
//! selection and policy fallback.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::RiskError;

/// Regulatory region
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Region {
    /// Applies everywhere; fallback for policy resolution
    #[serde(rename = "GLOBAL")]
    Global,
    /// European Union
    #[serde(rename = "EU")]
    Eu,
    /// United States
    #[serde(rename = "US")]
    Us,
    /// United Kingdom
    #[serde(rename = "UK")]
    Uk,
    /// Brazil
    #[serde(rename = "BR")]
    Brazil,
    /// Canada
    #[serde(rename = "CA")]
    Canada,
    /// China
    #[serde(rename = "CN")]
    China,
    /// India
    #[serde(rename = "IN")]
    India,
    /// Singapore
    #[serde(rename = "SG")]
    Singapore,
    /// Japan
    #[serde(rename = "JP")]
    Japan,
    /// Australia
    #[serde(rename = "AU")]
    Australia,
}

impl Region {
    /// Wire code, also used in policy store keys
    pub fn code(&self) -> &'static str {
        match self {
            Region::Global => "GLOBAL",
            Region::Eu => "EU",
            Region::Us => "US",
            Region::Uk => "UK",
            Region::Brazil => "BR",
            Region::Canada => "CA",
            Region::China => "CN",
            Region::India => "IN",
            Region::Singapore => "SG",
            Region::Japan => "JP",
            Region::Australia => "AU",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Region {
    type Err = RiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GLOBAL" => Ok(Region::Global),
            "EU" => Ok(Region::Eu),
            "US" => Ok(Region::Us),
            "UK" | "GB" => Ok(Region::Uk),
            "BR" => Ok(Region::Brazil),
            "CA" => Ok(Region::Canada),
            "CN" => Ok(Region::China),
            "IN" => Ok(Region::India),
            "SG" => Ok(Region::Singapore),
            "JP" => Ok(Region::Japan),
            "AU" => Ok(Region::Australia),
            other => Err(RiskError::invalid(format!("unknown region '{other}'"))),
        }
    }
}

/// Industry vertical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Industry {
    /// Applies to every industry; wildcard for rule selection
    General,
    /// Healthcare providers and payers
    Healthcare,
    /// Banking, payments and insurance
    Finance,
    /// Public sector
    Government,
    /// Schools and universities
    Education,
    /// Retail and e-commerce
    Retail,
    /// Software and technology
    Technology,
}

impl Industry {
    /// Stable lower-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Industry::General => "general",
            Industry::Healthcare => "healthcare",
            Industry::Finance => "finance",
            Industry::Government => "government",
            Industry::Education => "education",
            Industry::Retail => "retail",
            Industry::Technology => "technology",
        }
    }
}

impl fmt::Display for Industry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Industry {
    type Err = RiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(Industry::General),
            "healthcare" => Ok(Industry::Healthcare),
            "finance" | "financial" => Ok(Industry::Finance),
            "government" => Ok(Industry::Government),
            "education" => Ok(Industry::Education),
            "retail" => Ok(Industry::Retail),
            "technology" => Ok(Industry::Technology),
            other => Err(RiskError::invalid(format!("unknown industry '{other}'"))),
        }
    }
}

/// Compliance framework
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Framework {
    /// EU General Data Protection Regulation
    #[serde(rename = "GDPR")]
    Gdpr,
    /// Brazil Lei Geral de Proteção de Dados
    #[serde(rename = "LGPD")]
    Lgpd,
    /// US Health Insurance Portability and Accountability Act
    #[serde(rename = "HIPAA")]
    Hipaa,
    /// Persons-with-disabilities accessibility standard
    #[serde(rename = "PNDSB")]
    Pndsb,
    /// Payment Card Industry Data Security Standard
    #[serde(rename = "PCI_DSS")]
    PciDss,
    /// SOC 2 trust services criteria
    #[serde(rename = "SOC2")]
    Soc2,
    /// California Consumer Privacy Act
    #[serde(rename = "CCPA")]
    Ccpa,
    /// China Personal Information Protection Law
    #[serde(rename = "PIPL")]
    Pipl,
}

impl Framework {
    /// Wire code, also used in policy store keys
    pub fn code(&self) -> &'static str {
        match self {
            Framework::Gdpr => "GDPR",
            Framework::Lgpd => "LGPD",
            Framework::Hipaa => "HIPAA",
            Framework::Pndsb => "PNDSB",
            Framework::PciDss => "PCI_DSS",
            Framework::Soc2 => "SOC2",
            Framework::Ccpa => "CCPA",
            Framework::Pipl => "PIPL",
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Framework {
    type Err = RiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "GDPR" => Ok(Framework::Gdpr),
            "LGPD" => Ok(Framework::Lgpd),
            "HIPAA" => Ok(Framework::Hipaa),
            "PNDSB" => Ok(Framework::Pndsb),
            "PCI_DSS" | "PCIDSS" => Ok(Framework::PciDss),
            "SOC2" => Ok(Framework::Soc2),
            "CCPA" => Ok(Framework::Ccpa),
            "PIPL" => Ok(Framework::Pipl),
            other => Err(RiskError::invalid(format!("unknown framework '{other}'"))),
        }
    }
}
