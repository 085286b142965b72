use tmgrammar::{Pattern, Scope};

pub fn string_double() -> Scope {
    Scope {
        begin: Some(Pattern::new(r#"""#).into()),
        end: Some(Pattern::new(r#"""#).into()),
        name: Some("string.quoted.double.foo".into()),
        patterns: Some(vec![
            Scope {
                match_: Some(Pattern::new(r"\\.").into()),
                name: Some("constant.character.escape.foo".into()),
                ..Scope::default()
            },
        ]),
        ..Scope::default()
    }
}
