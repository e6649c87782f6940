// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Role sets extracted from token claims.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

/// Lowercased, deduplicated set of role names.
///
/// Identity providers disagree on the claim format: some emit a JSON list,
/// others a comma-separated string. Both normalize to the same set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[schema(value_type = Vec<String>)]
pub struct RoleSet(BTreeSet<String>);

impl RoleSet {
    /// Parse a role claim value. Anything else yields an empty set.
    pub fn from_claim(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .collect(),
            Some(Value::String(s)) => s.split(',').collect(),
            _ => Self::default(),
        }
    }

    /// Parse a comma-separated list, as used in configuration.
    pub fn parse_list(s: &str) -> Self {
        s.split(',').collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, role: &str) -> bool {
        self.0.contains(&role.trim().to_lowercase())
    }

    /// True when the two sets share at least one role.
    pub fn intersects(&self, other: &RoleSet) -> bool {
        !self.0.is_disjoint(&other.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<'a> FromIterator<&'a str> for RoleSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        RoleSet(
            iter.into_iter()
                .map(|role| role.trim().to_lowercase())
                .filter(|role| !role.is_empty())
                .collect(),
        )
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        f.write_str(&joined.join(","))
    }
}
