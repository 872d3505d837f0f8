//! Static catalog: protected system roots and cleanable targets.
//!
//! The engine itself never reads the catalog; callers pick targets from
//! it and feed their paths through the engine one by one. Target paths
//! keep their environment-variable references so the catalog is valid
//! on any machine.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Absolute roots the engine must never remove, whatever the whitelist
/// says. Ancestors of these are equally off limits.
pub fn never_delete_paths() -> &'static [&'static str] {
    &[
        r"C:\Windows",
        r"C:\Windows\System32",
        r"C:\Windows\SysWOW64",
        r"C:\Users",
        r"C:\ProgramData",
        r"C:\Recovery",
        r"C:\Program Files",
        r"C:\Program Files (x86)",
        r"C:\Boot",
        r"C:\EFI",
        r"C:\System Volume Information",
        r"C:\$Recycle.Bin",
    ]
}

/// Grouping used by scan and clean filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    User,
    System,
    Browser,
    Dev,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::User,
        Category::System,
        Category::Browser,
        Category::Dev,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::User => "user",
            Category::System => "system",
            Category::Browser => "browser",
            Category::Dev => "dev",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(Category::User),
            "system" => Ok(Category::System),
            "browser" => Ok(Category::Browser),
            "dev" => Ok(Category::Dev),
            other => Err(format!(
                "unknown category {other:?}, expected user, system, browser, or dev"
            )),
        }
    }
}

/// How likely removing a target is to surprise the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cleanable location.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CleanTarget {
    /// Unique identifier shown in reports.
    pub name: &'static str,
    pub category: Category,
    pub risk: RiskLevel,
    /// Glob patterns, environment references allowed, expanded at use
    /// time.
    pub paths: &'static [&'static str],
}

const CATALOG: &[CleanTarget] = &[
    CleanTarget {
        name: "UserTemp",
        category: Category::User,
        risk: RiskLevel::Low,
        paths: &[r"%TEMP%\*"],
    },
    CleanTarget {
        name: "CrashDumps",
        category: Category::User,
        risk: RiskLevel::Low,
        paths: &[r"%LOCALAPPDATA%\CrashDumps\*"],
    },
    CleanTarget {
        name: "ThumbnailCache",
        category: Category::User,
        risk: RiskLevel::Low,
        paths: &[r"%LOCALAPPDATA%\Microsoft\Windows\Explorer\thumbcache_*.db"],
    },
    CleanTarget {
        name: "RecentItems",
        category: Category::User,
        risk: RiskLevel::Medium,
        paths: &[r"%APPDATA%\Microsoft\Windows\Recent\*"],
    },
    CleanTarget {
        name: "WindowsTemp",
        category: Category::System,
        risk: RiskLevel::Medium,
        paths: &[r"C:\Windows\Temp\*"],
    },
    CleanTarget {
        name: "Prefetch",
        category: Category::System,
        risk: RiskLevel::Medium,
        paths: &[r"C:\Windows\Prefetch\*.pf"],
    },
    CleanTarget {
        name: "UpdateDownloads",
        category: Category::System,
        risk: RiskLevel::Medium,
        paths: &[r"C:\Windows\SoftwareDistribution\Download\*"],
    },
    CleanTarget {
        name: "EdgeCache",
        category: Category::Browser,
        risk: RiskLevel::Low,
        paths: &[
            r"%LOCALAPPDATA%\Microsoft\Edge\User Data\Default\Cache\*",
            r"%LOCALAPPDATA%\Microsoft\Edge\User Data\Default\Code Cache\*",
        ],
    },
    CleanTarget {
        name: "ChromeCache",
        category: Category::Browser,
        risk: RiskLevel::Low,
        paths: &[
            r"%LOCALAPPDATA%\Google\Chrome\User Data\Default\Cache\*",
            r"%LOCALAPPDATA%\Google\Chrome\User Data\Default\Code Cache\*",
        ],
    },
    CleanTarget {
        name: "InternetCache",
        category: Category::Browser,
        risk: RiskLevel::Low,
        paths: &[r"%LOCALAPPDATA%\Microsoft\Windows\INetCache\*"],
    },
    CleanTarget {
        name: "NpmCache",
        category: Category::Dev,
        risk: RiskLevel::Low,
        paths: &[r"%LOCALAPPDATA%\npm-cache\*"],
    },
    CleanTarget {
        name: "PipCache",
        category: Category::Dev,
        risk: RiskLevel::Low,
        paths: &[r"%LOCALAPPDATA%\pip\cache\*"],
    },
    CleanTarget {
        name: "NugetCache",
        category: Category::Dev,
        risk: RiskLevel::Medium,
        paths: &[r"%USERPROFILE%\.nuget\packages\*"],
    },
    CleanTarget {
        name: "CargoRegistryCache",
        category: Category::Dev,
        risk: RiskLevel::Medium,
        paths: &[r"%USERPROFILE%\.cargo\registry\cache\*"],
    },
    CleanTarget {
        name: "GradleCache",
        category: Category::Dev,
        risk: RiskLevel::Medium,
        paths: &[r"%USERPROFILE%\.gradle\caches\*"],
    },
];

/// The full catalog, in display order.
pub fn clean_targets() -> &'static [CleanTarget] {
    CATALOG
}

/// Catalog entries in the given category.
pub fn targets_by_category(category: Category) -> Vec<CleanTarget> {
    CATALOG
        .iter()
        .filter(|target| target.category == category)
        .copied()
        .collect()
}
