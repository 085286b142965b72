use tmgrammar::{Error, ExtraValue, Grammar, Repository, Scope};

pub mod repository;

pub fn grammar() -> Result<Grammar, Error> {
    Ok(Grammar {
        name: "Foo".into(),
        scope_name: "source.foo".into(),
        patterns: vec![
            Scope {
                include: Some("#num".into()),
                ..Scope::default()
            },
            Scope {
                include: Some("#string-double".into()),
                ..Scope::default()
            },
            Scope {
                include: Some("#heredoc".into()),
                ..Scope::default()
            },
        ],
        repository: Repository::merge([
            ("num", repository::num()),
            ("string-double", repository::string_double()),
            ("heredoc", repository::heredoc()),
        ])?,
        extra: vec![
            ("fileTypes".into(), ExtraValue::List(vec!["foo".into()])),
        ],
        ..Grammar::default()
    })
}
