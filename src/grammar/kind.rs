/// What a grammar field holds, decided from its name only.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// A regular expression: `match`, `begin`, `end`, `while`
    Pattern,
    /// A plain string: scope names and references
    Label,
    /// A map of capture group index to rule
    Captures,
    /// An ordered list of nested rules
    Children,
}

/// Classifies a grammar field name, returning `None` for names we don't handle.
///
/// This is a fixed lookup: the value is never looked at.
pub fn classify(key: &str) -> Option<FieldKind> {
    match key {
        "match" | "begin" | "end" | "while" => Some(FieldKind::Pattern),
        "name" | "contentName" | "include" | "scopeName" | "injectionSelector" => {
            Some(FieldKind::Label)
        }
        "captures" | "beginCaptures" | "endCaptures" | "whileCaptures" => {
            Some(FieldKind::Captures)
        }
        "patterns" => Some(FieldKind::Children),
        _ => None,
    }
}

/// The fields a rule can carry.
///
/// `Field::ALL` is the canonical order: both the exporter and the source renderer walk
/// fields in that order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    Include,
    Match,
    Begin,
    End,
    While,
    Name,
    ContentName,
    Captures,
    BeginCaptures,
    EndCaptures,
    WhileCaptures,
    Patterns,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::Include,
        Field::Match,
        Field::Begin,
        Field::End,
        Field::While,
        Field::Name,
        Field::ContentName,
        Field::Captures,
        Field::BeginCaptures,
        Field::EndCaptures,
        Field::WhileCaptures,
        Field::Patterns,
    ];

    /// Only rule fields: `scopeName` and `injectionSelector` are labels but live on the
    /// grammar root.
    pub fn from_key(key: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.key() == key)
    }

    /// The name of the field in a JSON grammar.
    pub fn key(self) -> &'static str {
        match self {
            Field::Include => "include",
            Field::Match => "match",
            Field::Begin => "begin",
            Field::End => "end",
            Field::While => "while",
            Field::Name => "name",
            Field::ContentName => "contentName",
            Field::Captures => "captures",
            Field::BeginCaptures => "beginCaptures",
            Field::EndCaptures => "endCaptures",
            Field::WhileCaptures => "whileCaptures",
            Field::Patterns => "patterns",
        }
    }

    /// The name of the matching `Scope` struct field.
    pub fn ident(self) -> &'static str {
        match self {
            Field::Include => "include",
            Field::Match => "match_",
            Field::Begin => "begin",
            Field::End => "end",
            Field::While => "while_",
            Field::Name => "name",
            Field::ContentName => "content_name",
            Field::Captures => "captures",
            Field::BeginCaptures => "begin_captures",
            Field::EndCaptures => "end_captures",
            Field::WhileCaptures => "while_captures",
            Field::Patterns => "patterns",
        }
    }

    pub fn kind(self) -> FieldKind {
        // every rule field is in the lookup table
        classify(self.key()).unwrap_or(FieldKind::Label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_keys() {
        assert_eq!(classify("match"), Some(FieldKind::Pattern));
        assert_eq!(classify("begin"), Some(FieldKind::Pattern));
        assert_eq!(classify("end"), Some(FieldKind::Pattern));
        assert_eq!(classify("name"), Some(FieldKind::Label));
        assert_eq!(classify("contentName"), Some(FieldKind::Label));
        assert_eq!(classify("include"), Some(FieldKind::Label));
        assert_eq!(classify("scopeName"), Some(FieldKind::Label));
        assert_eq!(classify("injectionSelector"), Some(FieldKind::Label));
        assert_eq!(classify("captures"), Some(FieldKind::Captures));
        assert_eq!(classify("beginCaptures"), Some(FieldKind::Captures));
        assert_eq!(classify("endCaptures"), Some(FieldKind::Captures));
        assert_eq!(classify("patterns"), Some(FieldKind::Children));
    }

    #[test]
    fn test_classify_is_case_sensitive_and_closed() {
        assert_eq!(classify("Match"), None);
        assert_eq!(classify("comment"), None);
        assert_eq!(classify("repository"), None);
        assert_eq!(classify(""), None);
    }

    #[test]
    fn test_every_field_round_trips_through_its_key() {
        for field in Field::ALL {
            assert_eq!(Field::from_key(field.key()), Some(field));
            assert_eq!(classify(field.key()), Some(field.kind()));
        }
        assert_eq!(Field::from_key("scopeName"), None);
    }
}
