use std::sync::OnceLock;

use kopi_core::{Token, TokenKind};
use kopi_types::ClassKind;
use regex::Regex;

/// A type declaration found by [`extract_type_skeletons`], before any real parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSkeleton {
    /// Dotted package name; empty for the default package.
    pub package: String,
    /// Index of the enclosing skeleton in the returned list.
    pub outer: Option<usize>,
    pub name: String,
    pub kind: ClassKind,
    /// Token index of the `class`/`enum`/`interface` keyword.
    pub kind_token: Option<usize>,
    /// Token index of the declared name.
    pub name_token: Option<usize>,
}

struct OpenType {
    skeleton: usize,
    body_open: bool,
}

/// Finds the package and the named (non-local) type declarations of a
/// document with a brace-balance scan.
///
/// Literals and comments are blanked out first so their content can't look
/// like a declaration. Braces inside method bodies, initializers and array
/// literals are balanced against each other and never close a type. Outer
/// types precede the types nested in them.
pub fn extract_type_skeletons(tokens: &[Token]) -> Vec<TypeSkeleton> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(
            r"(\{)|(\})|\bpackage +(\w+(?: *\. *\w+)*)|(\bclass|\benum|\binterface|@ *interface) +(\w+)",
        )
        .expect("valid regex")
    });

    let normalized: String = tokens
        .iter()
        .map(|t| match t.kind {
            TokenKind::LineComment
            | TokenKind::BlockComment
            | TokenKind::StringLiteral
            | TokenKind::CharLiteral
            | TokenKind::Invalid => " ".repeat(t.text.len()),
            _ => t.text.to_string(),
        })
        .collect();

    let token_at = |offset: usize| -> Option<usize> {
        let idx = tokens.partition_point(|t| usize::from(t.range.start()) < offset);
        (idx < tokens.len() && usize::from(tokens[idx].range.start()) == offset).then_some(idx)
    };

    let mut package: Option<String> = None;
    let mut stack: Vec<OpenType> = Vec::new();
    let mut code_balance = 0u32;
    let mut skeletons = Vec::new();

    for caps in re.captures_iter(&normalized) {
        if code_balance > 0 {
            if caps.get(1).is_some() {
                code_balance += 1;
            } else if caps.get(2).is_some() {
                code_balance -= 1;
            }
            continue;
        }

        if caps.get(1).is_some() {
            match stack.last_mut() {
                None => {}
                Some(top) if !top.body_open => top.body_open = true,
                // Method body, initializer or array literal.
                Some(_) => code_balance = 1,
            }
        } else if caps.get(2).is_some() {
            stack.pop();
        } else if let Some(name) = caps.get(3) {
            if package.is_none() {
                package = Some(name.as_str().split_whitespace().collect());
            }
        } else if let (Some(keyword), Some(name)) = (caps.get(4), caps.get(5)) {
            let package = package.get_or_insert_with(String::new).clone();
            let keyword_text: String = keyword.as_str().split_whitespace().collect();
            let kind = ClassKind::from_keyword(&keyword_text).unwrap_or(ClassKind::Class);
            let skeleton = TypeSkeleton {
                package,
                outer: stack.last().map(|open| open.skeleton),
                name: name.as_str().to_string(),
                kind,
                kind_token: token_at(keyword.start()),
                name_token: token_at(name.start()),
            };
            tracing::trace!(name = %skeleton.name, kind = kind.keyword(), "found type skeleton");
            stack.push(OpenType {
                skeleton: skeletons.len(),
                body_open: false,
            });
            skeletons.push(skeleton);
        }
    }
    skeletons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex;
    use pretty_assertions::assert_eq;

    fn names(src: &str) -> Vec<(String, String, Option<usize>, ClassKind)> {
        extract_type_skeletons(&lex(src))
            .into_iter()
            .map(|s| (s.package, s.name, s.outer, s.kind))
            .collect()
    }

    #[test]
    fn finds_nested_types_and_package() {
        let src = r#"
            package com . example;
            public class Outer {
                void m() { if (x) { } int[] a = {1, 2}; }
                static class Inner { interface Deep {} }
                enum E { A, B }
            }
            @interface Ann {}
        "#;
        assert_eq!(
            names(src),
            vec![
                ("com.example".into(), "Outer".into(), None, ClassKind::Class),
                ("com.example".into(), "Inner".into(), Some(0), ClassKind::Class),
                ("com.example".into(), "Deep".into(), Some(1), ClassKind::Interface),
                ("com.example".into(), "E".into(), Some(0), ClassKind::Enum),
                ("com.example".into(), "Ann".into(), None, ClassKind::Annotation),
            ]
        );
    }

    #[test]
    fn ignores_local_classes_comments_and_strings() {
        let src = r#"
            class A {
                // class Commented {}
                String s = "class InString {}";
                void m() { class Local {} }
            }
        "#;
        let found = names(src);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].1, "A");
        assert_eq!(found[0].0, "");
    }

    #[test]
    fn anchors_point_at_keyword_and_name_tokens() {
        let tokens = lex("class Foo {}");
        let skeletons = extract_type_skeletons(&tokens);
        let kind_token = skeletons[0].kind_token.expect("kind token");
        let name_token = skeletons[0].name_token.expect("name token");
        assert_eq!(tokens[kind_token].text, "class");
        assert_eq!(tokens[name_token].text, "Foo");
    }
}
