// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path policy: which request paths need a credential.

/// Outcome of classifying a request path against the [`PathPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    /// Never requires a credential.
    Public,
    /// Always requires a valid credential.
    Secured,
    /// Matches no configured prefix; forwarded without authentication.
    Unspecified,
}

impl PathClass {
    pub fn requires_credential(self) -> bool {
        self == PathClass::Secured
    }
}

/// Ordered public and secured path prefixes.
///
/// Matching is a plain string prefix test on the request path. A path that
/// matches a public prefix is `Public` even if it also matches a secured
/// prefix, so a misconfigured secured list can never lock out login routes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathPolicy {
    public: Vec<String>,
    secured: Vec<String>,
}

impl PathPolicy {
    pub fn new<P, S>(public: P, secured: S) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        Self {
            public: public.into_iter().map(Into::into).collect(),
            secured: secured.into_iter().map(Into::into).collect(),
        }
    }

    pub fn public_prefixes(&self) -> &[String] {
        &self.public
    }

    pub fn secured_prefixes(&self) -> &[String] {
        &self.secured
    }

    /// Classify a request path.
    pub fn classify(&self, path: &str) -> PathClass {
        if self.public.iter().any(|p| path.starts_with(p.as_str())) {
            PathClass::Public
        } else if self.secured.iter().any(|p| path.starts_with(p.as_str())) {
            PathClass::Secured
        } else {
            PathClass::Unspecified
        }
    }
}

/// Whether `path` contains a `.` or `..` segment, literal or
/// percent-encoded (`%2e`, any case).
///
/// Such paths are resolved differently by prefix matching here and by URL
/// normalisation downstream, so they cannot be classified reliably.
pub fn has_dot_segment(path: &str) -> bool {
    path.split('/').any(|segment| {
        let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
        decoded == "." || decoded == ".."
    })
}
