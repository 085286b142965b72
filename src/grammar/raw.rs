use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{Error, GrammarResult};

/// A rule of a JSON grammar, kept as plain JSON so that unknown fields and badly typed
/// values reach the importer instead of failing deserialization.
///
/// # Examples
/// ```json
/// {
///   "begin": "\"",
///   "end": "\"",
///   "name": "string.quoted.double.js",
///   "patterns": [{ "match": "\\\\.", "name": "constant.character.escape.js" }]
/// }
/// ```
pub type RawScope = Map<String, Value>;

/// The `repository` of a JSON grammar.
///
/// Unlike a JSON map it keeps duplicate keys so that they can be reported as collisions.
///
/// # Examples
/// ```json
/// {
///   "repository": {
///     "num": { "match": "[0-9]+", "name": "constant.numeric.foo" },
///     "strings": { "patterns": [{ "include": "#string-double" }] }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRepository(pub Vec<(String, RawScope)>);

impl RawRepository {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawScope)> {
        self.0.iter().map(|(name, scope)| (name.as_str(), scope))
    }
}

impl<'de> Deserialize<'de> for RawRepository {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RepositoryVisitor;

        impl<'de> Visitor<'de> for RepositoryVisitor {
            type Value = RawRepository;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of rule names to rules")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, scope)) = map.next_entry::<String, RawScope>()? {
                    entries.push((name, scope));
                }
                Ok(RawRepository(entries))
            }
        }

        deserializer.deserialize_map(RepositoryVisitor)
    }
}

impl Serialize for RawRepository {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, scope) in &self.0 {
            map.serialize_entry(name, scope)?;
        }
        map.end()
    }
}

/// Top-level structure of a JSON grammar
///
/// # Examples
/// ```json
/// {
///   "name": "Foo",
///   "scopeName": "source.foo",
///   "fileTypes": ["foo"],
///   "patterns": [{ "include": "#num" }],
///   "repository": {
///     "num": { "match": "[0-9]+", "name": "constant.numeric.foo" }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGrammar {
    /// Human-readable name of the language
    pub name: String,
    /// Unique identifier for this grammar's scope
    /// Example: "source.js", "text.html.markdown"
    pub scope_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub injection_selector: Option<String>,
    /// Root rules, in priority order
    #[serde(default)]
    pub patterns: Vec<RawScope>,
    #[serde(default, skip_serializing_if = "RawRepository::is_empty")]
    pub repository: RawRepository,
    /// Every other root field, eg `fileTypes`, `firstLineMatch`, `$schema`
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawGrammar {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> GrammarResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let raw_grammar = serde_json::from_reader(BufReader::new(file))?;
        Ok(raw_grammar)
    }

    pub fn from_json(json: &str) -> GrammarResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Pretty prints the grammar, indented with tabs.
    pub fn to_json(&self) -> GrammarResult<String> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        // serde_json only writes valid UTF-8
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}
