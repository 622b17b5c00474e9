use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::{CoreError, CoreErrorKind, CoreResult};

pub const SUBSCRIPTIONS_SEGMENT: &str = "subscriptions";
pub const RESOURCE_GROUPS_SEGMENT: &str = "resourceGroups";
pub const PROVIDERS_SEGMENT: &str = "providers";

/// Hierarchy level implied by the number of (type, name) segments.
///
/// `/subscriptions/{s}/resourceGroups/{rg}/providers/{ns}/{type}/{account}/{dbType}/{db}/{cType}/{c}`
/// holds six segments; the provider namespace pair never stands on its own.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum AddressLevel {
    Subscription,
    ResourceGroup,
    Account,
    Database,
    Container,
}

impl AddressLevel {
    pub fn depth(self) -> usize {
        match self {
            Self::Subscription => 1,
            Self::ResourceGroup => 2,
            Self::Account => 4,
            Self::Database => 5,
            Self::Container => 6,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct AddressSegment {
    pub kind: String,
    pub name: String,
}

impl AddressSegment {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ResourceAddress {
    segments: Vec<AddressSegment>,
}

impl ResourceAddress {
    pub fn parse(text: &str) -> CoreResult<Self> {
        let trimmed = text.trim().trim_end_matches('/');
        let Some(body) = trimmed.strip_prefix('/') else {
            return Err(malformed(text, "address must start with '/'"));
        };
        if body.is_empty() {
            return Err(malformed(text, "address has no segments"));
        }

        let parts: Vec<&str> = body.split('/').collect();
        if parts.len() % 2 != 0 {
            return Err(malformed(text, "every segment type must be followed by a name"));
        }

        let segments = parts
            .chunks(2)
            .map(|pair| AddressSegment::new(pair[0], pair[1]))
            .collect();
        Self::from_segments(segments)
    }

    pub fn from_segments(segments: Vec<AddressSegment>) -> CoreResult<Self> {
        validate_segments(&segments)?;
        Ok(Self { segments })
    }

    pub fn subscription(subscription_id: &str) -> CoreResult<Self> {
        Self::from_segments(vec![AddressSegment::new(
            SUBSCRIPTIONS_SEGMENT,
            subscription_id,
        )])
    }

    pub fn build(&self) -> String {
        let mut text = String::new();
        for segment in &self.segments {
            text.push('/');
            text.push_str(&segment.kind);
            text.push('/');
            text.push_str(&segment.name);
        }
        text
    }

    pub fn segments(&self) -> &[AddressSegment] {
        &self.segments
    }

    pub fn level(&self) -> AddressLevel {
        match self.segments.len() {
            1 => AddressLevel::Subscription,
            2 => AddressLevel::ResourceGroup,
            4 => AddressLevel::Account,
            5 => AddressLevel::Database,
            _ => AddressLevel::Container,
        }
    }

    /// Name of the deepest segment.
    pub fn name(&self) -> &str {
        self.segments
            .last()
            .map(|segment| segment.name.as_str())
            .unwrap_or_default()
    }

    /// Type of the deepest segment, e.g. `sqlDatabases` or `tables`.
    pub fn kind(&self) -> &str {
        self.segments
            .last()
            .map(|segment| segment.kind.as_str())
            .unwrap_or_default()
    }

    pub fn subscription_id(&self) -> &str {
        self.segment_name(0).unwrap_or_default()
    }

    pub fn resource_group(&self) -> Option<&str> {
        self.segment_name(1)
    }

    pub fn namespace(&self) -> Option<&str> {
        self.segment_name(2)
    }

    pub fn account_name(&self) -> Option<&str> {
        self.segment_name(3)
    }

    pub fn database_name(&self) -> Option<&str> {
        self.segment_name(4)
    }

    pub fn container_name(&self) -> Option<&str> {
        self.segment_name(5)
    }

    pub fn with_child(&self, kind: &str, name: &str) -> CoreResult<Self> {
        let mut segments = self.segments.clone();
        segments.push(AddressSegment::new(kind, name));
        Self::from_segments(segments)
    }

    pub fn ancestor(&self, level: AddressLevel) -> CoreResult<Self> {
        let depth = level.depth();
        if depth > self.segments.len() {
            return Err(malformed(
                &self.build(),
                &format!("address has no {level:?} ancestor"),
            ));
        }
        Self::from_segments(self.segments[..depth].to_vec())
    }

    /// Moves a resource that sits directly under its account into a
    /// database-level parent: `{account}/{t}/{name}` becomes
    /// `{account}/{database.kind}/{database.name}/{container_kind}/{name}`.
    pub fn reparent(&self, database: &AddressSegment, container_kind: &str) -> CoreResult<Self> {
        if self.level() != AddressLevel::Database {
            return Err(malformed(
                &self.build(),
                "only account-level children can be re-parented",
            ));
        }
        self.ancestor(AddressLevel::Account)?
            .with_child(&database.kind, &database.name)?
            .with_child(container_kind, self.name())
    }

    fn segment_name(&self, index: usize) -> Option<&str> {
        self.segments
            .get(index)
            .map(|segment| segment.name.as_str())
    }
}

fn validate_segments(segments: &[AddressSegment]) -> CoreResult<()> {
    let rendered = || {
        segments
            .iter()
            .map(|segment| format!("/{}/{}", segment.kind, segment.name))
            .collect::<String>()
    };

    if segments.is_empty() {
        return Err(malformed("", "address has no segments"));
    }
    if segments.len() > AddressLevel::Container.depth() {
        return Err(malformed(&rendered(), "address is deeper than a container"));
    }
    if segments.len() == 3 {
        return Err(malformed(
            &rendered(),
            "provider namespace must be followed by a resource",
        ));
    }

    if let Some(segment) = segments
        .iter()
        .find(|segment| segment.kind.is_empty() || segment.name.is_empty())
    {
        return Err(malformed(
            &rendered(),
            &format!(
                "segment '{}/{}' must have a non-empty type and name",
                segment.kind, segment.name
            ),
        ));
    }
    if segments
        .iter()
        .any(|segment| segment.kind.contains('/') || segment.name.contains('/'))
    {
        return Err(malformed(&rendered(), "segments must not contain '/'"));
    }
    if segments.iter().any(|segment| {
        has_edge_whitespace(&segment.kind) || has_edge_whitespace(&segment.name)
    }) {
        return Err(malformed(
            &rendered(),
            "segments must not start or end with whitespace",
        ));
    }

    let expected = [
        SUBSCRIPTIONS_SEGMENT,
        RESOURCE_GROUPS_SEGMENT,
        PROVIDERS_SEGMENT,
    ];
    for (segment, expected_kind) in segments.iter().zip(expected) {
        if !segment.kind.eq_ignore_ascii_case(expected_kind) {
            return Err(malformed(
                &rendered(),
                &format!("expected '{expected_kind}' segment, found '{}'", segment.kind),
            ));
        }
    }

    Ok(())
}

fn has_edge_whitespace(text: &str) -> bool {
    text.trim() != text
}

fn malformed(address: &str, reason: &str) -> CoreError {
    CoreError::new(
        CoreErrorKind::MalformedAddress,
        format!("malformed resource address '{address}': {reason}"),
    )
}

impl Display for ResourceAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.build())
    }
}

impl FromStr for ResourceAddress {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Serialize for ResourceAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.build())
    }
}

impl<'de> Deserialize<'de> for ResourceAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(|error| serde::de::Error::custom(error.message))
    }
}
