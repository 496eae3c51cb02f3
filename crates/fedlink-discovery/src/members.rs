// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collection member normalization.

use std::collections::HashSet;

use fedlink_core::types::CollectionMember;
use fedlink_storage::{identity_key, normalize_url};

/// Distinct member URLs in first-seen order.
///
/// Members without a URL are dropped; URLs differing only in scheme
/// (`http`/`https`), host case, or a trailing slash count as one.
pub fn member_urls(members: &[CollectionMember]) -> Vec<String> {
    let mut seen = HashSet::new();
    members
        .iter()
        .filter_map(CollectionMember::url)
        .map(normalize_url)
        .filter(|url| !url.is_empty())
        .filter(|url| seen.insert(identity_key(url)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixes_urls_and_records() {
        let members = vec![
            CollectionMember::Url("https://a.example/u/1".into()),
            CollectionMember::Record {
                url: Some("https://b.example/u/2".into()),
            },
            CollectionMember::Record { url: None },
            CollectionMember::Url("   ".into()),
        ];
        assert_eq!(
            member_urls(&members),
            vec!["https://a.example/u/1", "https://b.example/u/2"]
        );
    }

    #[test]
    fn deduplicates_equivalent_urls() {
        let members = vec![
            CollectionMember::Url("https://A.example/u/1/".into()),
            CollectionMember::Url("http://a.example/u/1".into()),
            CollectionMember::Record {
                url: Some("https://a.example/u/1".into()),
            },
        ];
        assert_eq!(member_urls(&members), vec!["https://a.example/u/1"]);
    }
}
