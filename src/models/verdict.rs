//! Per-layer verdicts and the ordered verdict map.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Binary outcome of the spatial relation test for one layer.
///
/// Rendered on the wire as the tokens `"OUI"` / `"NON"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "OUI")]
    Found,
    #[serde(rename = "NON")]
    NotFound,
}

impl Verdict {
    pub fn from_found(found: bool) -> Self {
        if found {
            Verdict::Found
        } else {
            Verdict::NotFound
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Verdict::Found)
    }

    pub fn token(&self) -> &'static str {
        match self {
            Verdict::Found => "OUI",
            Verdict::NotFound => "NON",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// Layer name -> verdict, in catalog enumeration order.
///
/// Serializes as a JSON object whose keys keep that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerdictMap {
    entries: Vec<(String, Verdict)>,
}

impl VerdictMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: String, verdict: Verdict) {
        self.entries.push((name, verdict));
    }

    pub fn get(&self, name: &str) -> Option<Verdict> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Verdict)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }
}

impl FromIterator<(String, Verdict)> for VerdictMap {
    fn from_iter<I: IntoIterator<Item = (String, Verdict)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Serialize for VerdictMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, verdict) in &self.entries {
            map.serialize_entry(name, verdict)?;
        }
        map.end()
    }
}
