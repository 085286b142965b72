use tmgrammar::{Pattern, Scope};

pub fn num() -> Scope {
    Scope {
        match_: Some(Pattern::new(r"[0-9]+").into()),
        name: Some("constant.numeric.foo".into()),
        ..Scope::default()
    }
}
