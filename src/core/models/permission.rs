use serde::{Deserialize, Serialize};

/// Record categories a provider can grant access to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    Nutrition,
    Hydration,
    Weight,
    SleepSession,
}

impl RecordType {
    pub fn from_id(id: &str) -> Option<Self> {
        match id.to_lowercase().as_str() {
            "nutrition" => Some(Self::Nutrition),
            "hydration" => Some(Self::Hydration),
            "weight" => Some(Self::Weight),
            "sleepsession" | "sleep_session" | "sleep" => Some(Self::SleepSession),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Nutrition => "Nutrition",
            Self::Hydration => "Hydration",
            Self::Weight => "Weight",
            Self::SleepSession => "SleepSession",
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    Read,
    Write,
}

impl AccessType {
    pub fn from_id(id: &str) -> Option<Self> {
        match id.to_lowercase().as_str() {
            "read" => Some(Self::Read),
            "write" => Some(Self::Write),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

/// A single capability: one record type in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub record_type: RecordType,
    pub access_type: AccessType,
}

impl Permission {
    pub const fn read(record_type: RecordType) -> Self {
        Self {
            record_type,
            access_type: AccessType::Read,
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.record_type, self.access_type.id())
    }
}

/// Ordered set of permissions that must all be granted before polling starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRequirement(Vec<Permission>);

impl Default for PermissionRequirement {
    fn default() -> Self {
        Self(vec![
            Permission::read(RecordType::Nutrition),
            Permission::read(RecordType::Hydration),
        ])
    }
}

impl PermissionRequirement {
    pub fn new(permissions: Vec<Permission>) -> Self {
        let mut unique: Vec<Permission> = Vec::with_capacity(permissions.len());
        for p in permissions {
            if !unique.contains(&p) {
                unique.push(p);
            }
        }
        Self(unique)
    }

    pub fn permissions(&self) -> &[Permission] {
        &self.0
    }

    /// Required permissions absent from `granted`, in requirement order.
    pub fn missing(&self, granted: &[Permission]) -> Vec<Permission> {
        self.0
            .iter()
            .filter(|required| !granted.contains(required))
            .copied()
            .collect()
    }
}

/// Provider platform availability as reported by the provider itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Availability {
    Available,
    Unavailable { reason: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DenialReason {
    /// Provider not installed or not supported on this device.
    Unavailable(Option<String>),
    Missing(Vec<Permission>),
    Error(String),
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(_) => write!(f, "unavailable"),
            Self::Missing(perms) => {
                let list: Vec<String> = perms.iter().map(|p| p.to_string()).collect();
                write!(f, "missing: {}", list.join(", "))
            }
            Self::Error(msg) => write!(f, "error: {}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum AuthorizationState {
    #[default]
    Unchecked,
    Granted,
    Denied(DenialReason),
}

impl AuthorizationState {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied(_))
    }
}

impl std::fmt::Display for AuthorizationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unchecked => write!(f, "unchecked"),
            Self::Granted => write!(f, "granted"),
            Self::Denied(reason) => write!(f, "denied ({})", reason),
        }
    }
}
