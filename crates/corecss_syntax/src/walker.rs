use crate::errors::ParseError;
use crate::stylesheet::{Declaration, Rule, Stylesheet};
use crate::tokenizer::{Token, TokenType};
use std::io::Write;

/// The walker is used to walk the parse results and print them to stdout.
pub struct Walker<'a> {
    root: Root<'a>,
    errors: &'a [ParseError],
}

enum Root<'a> {
    Rules(&'a [Rule]),
    Declarations(&'a [Declaration]),
}

impl<'a> Walker<'a> {
    #[must_use]
    pub fn new(stylesheet: &'a Stylesheet) -> Self {
        Self {
            root: Root::Rules(&stylesheet.rules),
            errors: &stylesheet.errors,
        }
    }

    /// Walker for the results of a style attribute
    #[must_use]
    pub fn new_style_attr(declarations: &'a [Declaration], errors: &'a [ParseError]) -> Self {
        Self {
            root: Root::Declarations(declarations),
            errors,
        }
    }

    pub fn walk_stdout(&self) {
        if let Err(e) = self.walk(&mut std::io::stdout()) {
            log::warn!("could not write to stdout: {e}");
        }
    }

    #[must_use]
    pub fn walk_to_string(&self) -> String {
        let mut output: Vec<u8> = Vec::new();

        // writing to a Vec does not fail
        let _ = self.walk(&mut output);

        String::from_utf8_lossy(&output).into_owned()
    }

    fn walk(&self, f: &mut dyn Write) -> Result<(), std::io::Error> {
        match self.root {
            Root::Rules(rules) => {
                writeln!(f, "[Stylesheet ({})]", rules.len())?;
                for rule in rules {
                    walk_rule(rule, 1, f)?;
                }
            }
            Root::Declarations(declarations) => {
                writeln!(f, "[StyleAttribute ({})]", declarations.len())?;
                for declaration in declarations {
                    walk_declaration(declaration, 1, f)?;
                }
            }
        }

        if !self.errors.is_empty() {
            writeln!(f, "[Errors ({})]", self.errors.len())?;
            for error in self.errors {
                writeln!(f, "  {error}")?;
            }
        }

        Ok(())
    }
}

fn walk_rule(rule: &Rule, depth: usize, f: &mut dyn Write) -> Result<(), std::io::Error> {
    let prefix = " ".repeat(depth * 2);

    match rule {
        Rule::AtRule(at_rule) => {
            writeln!(f, "{}[AtRule] {} at {}", prefix, at_rule.at_keyword, rule.location())?;
            for token in &at_rule.head {
                walk_token(token, depth + 1, f)?;
            }
            if let Some(body) = &at_rule.body {
                walk_token(body, depth + 1, f)?;
            }
        }
        Rule::RuleSet(ruleset) => {
            let selector = ruleset.selector.as_css();
            writeln!(f, "{}[RuleSet] {} at {}", prefix, selector.trim(), rule.location())?;
            for declaration in &ruleset.declarations {
                walk_declaration(declaration, depth + 1, f)?;
            }
        }
    }

    Ok(())
}

fn walk_declaration(
    declaration: &Declaration,
    depth: usize,
    f: &mut dyn Write,
) -> Result<(), std::io::Error> {
    let prefix = " ".repeat(depth * 2);

    writeln!(f, "{}[Declaration] {}", prefix, declaration.name)?;
    for token in declaration.values() {
        walk_token(token, depth + 1, f)?;
    }

    Ok(())
}

fn walk_token(token: &Token, depth: usize, f: &mut dyn Write) -> Result<(), std::io::Error> {
    let prefix = " ".repeat(depth * 2);

    match &token.token_type {
        TokenType::Whitespace => writeln!(f, "{}[S]", prefix)?,
        TokenType::FunctionCall { name, content } => {
            writeln!(f, "{}[FUNCTION] {}", prefix, name)?;
            for child in content {
                walk_token(child, depth + 1, f)?;
            }
        }
        _ if token.is_container() => {
            writeln!(f, "{}[{}]", prefix, token.type_name())?;
            for child in token.content() {
                walk_token(child, depth + 1, f)?;
            }
        }
        _ => writeln!(f, "{}[{}] {}", prefix, token.type_name(), token.raw)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CoreParser;

    #[test]
    fn walk_stylesheet() {
        let css = "@charset \"utf-8\";\nh1 { color: rgb(1, 2) }\n@foo;";
        let stylesheet = CoreParser::default().parse_stylesheet(css);

        let expected = "\
[Stylesheet (2)]
  [AtRule] @charset at 1:1
    [STRING] \"utf-8\"
  [RuleSet] h1 at 2:1
    [Declaration] color
      [FUNCTION] rgb
        [NUMBER] 1
        [DELIM] ,
        [S]
        [NUMBER] 2
[Errors (1)]
  Parse error at 3:1, unknown at-rule: @foo
";
        assert_eq!(Walker::new(&stylesheet).walk_to_string(), expected);
    }

    #[test]
    fn walk_style_attr() {
        let (declarations, errors) = CoreParser::default().parse_style_attr("margin: 0 [auto]");

        let expected = "\
[StyleAttribute (1)]
  [Declaration] margin
    [NUMBER] 0
    [S]
    [[]
      [IDENT] auto
";
        assert!(errors.is_empty());
        assert_eq!(Walker::new_style_attr(&declarations, &errors).walk_to_string(), expected);
    }
}
