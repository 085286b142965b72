use tmgrammar::{Captures, Pattern, Scope};

pub fn heredoc() -> Scope {
    Scope {
        begin: Some(Pattern::new(r"(<<)(\w+)").into()),
        end: Some(Pattern::new(r"^\2$").into()),
        content_name: Some("string.unquoted.heredoc.foo".into()),
        begin_captures: Some(Captures::from([
            (1, Scope {
                name: Some("keyword.operator.heredoc.foo".into()),
                ..Scope::default()
            }),
            (2, Scope {
                name: Some("entity.name.tag.foo".into()),
                ..Scope::default()
            }),
        ])),
        ..Scope::default()
    }
}
