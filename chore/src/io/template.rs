//! Command line templating.

use std::collections::BTreeMap;

use minijinja::{Environment, UndefinedBehavior};

/// Renders command lines and artifact patterns against the config vars.
///
/// Undefined variables are errors so a typo never turns into an empty argument.
pub struct CommandRenderer {
    env: Environment<'static>,
    vars: BTreeMap<String, String>,
}

impl CommandRenderer {
    pub fn new(vars: BTreeMap<String, String>) -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        Self { env, vars }
    }

    pub fn render(&self, line: &str) -> Result<String, minijinja::Error> {
        if !line.contains("{{") && !line.contains("{%") {
            return Ok(line.to_string());
        }
        self.env.render_str(line, &self.vars)
    }
}
