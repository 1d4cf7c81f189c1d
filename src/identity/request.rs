//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


use std::collections::BTreeMap;

/// What the core gets to see of an inbound request
///
/// Header names are case-insensitive.
#[derive(Clone, Debug, Default)]
pub struct Request {
    headers: BTreeMap<String, String>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header<K: AsRef<str>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.insert_header(name, value);
        self
    }

    pub fn insert_header<K: AsRef<str>, V: Into<String>>(&mut self, name: K, value: V) {
        self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_ignores_case() {
        let r = Request::new().with_header("X-Disraptor-User", "alice");
        assert_eq!(r.header("x-disraptor-user"), Some("alice"));
        assert_eq!(r.header("X-DISRAPTOR-USER"), Some("alice"));
        assert_eq!(r.header("X-Other"), None);
    }
}
